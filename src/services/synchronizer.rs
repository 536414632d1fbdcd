//! Scene synchronizer - applies fetched snapshots to the scene
//!
//! A snapshot is applied as one synchronous unit: satellite and trail,
//! spotbeam, trail line, globe rotation, then the text readouts. Snapshots
//! tagged with a tick older than the newest applied one, or issued before
//! the last session reset, are dropped.

use crate::domain::format;
use crate::domain::types::{TickId, TickSnapshot};
use crate::infra::metrics::Metrics;
use crate::services::scene::Scene;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Superseded by a newer tick or issued before a reset
    Stale,
    /// Missing or non-finite position; scene untouched
    Malformed,
}

pub struct SceneSynchronizer {
    newest_applied: Option<TickId>,
    /// Ticks below this were issued before the last reset
    floor: TickId,
    last_data: Option<TickSnapshot>,
    metrics: Arc<Metrics>,
}

impl SceneSynchronizer {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { newest_applied: None, floor: TickId::default(), last_data: None, metrics }
    }

    pub fn is_stale(&self, tick: TickId) -> bool {
        tick < self.floor || self.newest_applied.is_some_and(|newest| tick < newest)
    }

    pub fn apply(&mut self, scene: &mut Scene, update: TickSnapshot) -> ApplyOutcome {
        if self.is_stale(update.tick) {
            self.metrics.record_snapshot_stale();
            debug!(
                tick = %update.tick,
                floor = %self.floor,
                newest = ?self.newest_applied.map(|t| t.0),
                "snapshot_stale_dropped"
            );
            return ApplyOutcome::Stale;
        }

        let snapshot = &update.snapshot;
        let Some(position) = snapshot.position() else {
            self.metrics.record_snapshot_malformed();
            warn!(
                tick = %update.tick,
                latitude = ?snapshot.latitude,
                longitude = ?snapshot.longitude,
                "snapshot_malformed"
            );
            return ApplyOutcome::Malformed;
        };

        scene.set_satellite(position);
        scene.set_spotbeam(snapshot.spotbeam_outline());
        scene.rebuild_trail_line();
        scene.set_globe_rotation(snapshot.elapsed_seconds);
        scene.set_readouts(
            format::time_display(snapshot.elapsed_seconds),
            format::utc_display(snapshot.simulation_time_iso.as_deref()),
        );

        self.metrics.record_snapshot_applied();
        debug!(tick = %update.tick, lat = %position.lat, lon = %position.lon, "snapshot_applied");
        self.newest_applied = Some(update.tick);
        self.last_data = Some(update);
        ApplyOutcome::Applied
    }

    /// Drop every response tagged below `floor` and forget the last snapshot
    pub fn discard_before(&mut self, floor: TickId) {
        self.floor = floor;
        self.last_data = None;
    }

    /// Most recent snapshot that was applied
    pub fn last_data(&self) -> Option<&TickSnapshot> {
        self.last_data.as_ref()
    }
}
