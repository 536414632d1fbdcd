//! Snapshot fetch gateway
//!
//! Every request is tagged with a fresh [`TickId`]. The gateway tracks the
//! newest outstanding tick so the playback driver never issues a second
//! request while one is in flight; the tick travels with the response so
//! the synchronizer can drop anything that was superseded.

use crate::domain::types::{TickId, TickSnapshot};
use crate::infra::metrics::Metrics;
use crate::io::api::{ApiError, SimulationApi};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A snapshot request that has been issued but not yet sent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotRequest {
    pub tick: TickId,
    pub elapsed_seconds: f64,
    pub radius_km: f64,
}

impl SnapshotRequest {
    /// Perform the fetch. Safe to run on a spawned task.
    pub async fn send(self, api: &dyn SimulationApi) -> SnapshotResponse {
        let started = Instant::now();
        let result = api
            .position(self.elapsed_seconds, self.radius_km)
            .await
            .map(|snapshot| TickSnapshot { tick: self.tick, snapshot });
        SnapshotResponse { tick: self.tick, result, latency: started.elapsed() }
    }
}

#[derive(Debug)]
pub struct SnapshotResponse {
    pub tick: TickId,
    pub result: Result<TickSnapshot, ApiError>,
    pub latency: Duration,
}

pub struct SnapshotGateway {
    last_issued: TickId,
    in_flight: Option<TickId>,
    metrics: Arc<Metrics>,
}

impl SnapshotGateway {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { last_issued: TickId::default(), in_flight: None, metrics }
    }

    /// Issue the next tick. The new tick becomes the one in flight.
    pub fn begin(&mut self, elapsed_seconds: f64, radius_km: f64) -> SnapshotRequest {
        self.last_issued = self.last_issued.next();
        self.in_flight = Some(self.last_issued);
        self.metrics.record_snapshot_requested();
        debug!(tick = %self.last_issued, elapsed_seconds = %elapsed_seconds, "snapshot_requested");
        SnapshotRequest { tick: self.last_issued, elapsed_seconds, radius_km }
    }

    /// Record a finished fetch. Returns true if it was the tick in flight.
    pub fn complete(&mut self, response: &SnapshotResponse) -> bool {
        self.metrics.record_fetch_latency(response.latency.as_millis() as u64);
        if let Err(e) = &response.result {
            self.metrics.record_snapshot_failed();
            warn!(tick = %response.tick, error = %e, "snapshot_fetch_failed");
        }

        if self.in_flight == Some(response.tick) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<TickId> {
        self.in_flight
    }

    pub fn last_issued(&self) -> TickId {
        self.last_issued
    }
}
