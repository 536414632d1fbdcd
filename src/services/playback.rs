//! Playback driver - advances simulated time and issues snapshot requests
//!
//! One request is outstanding at a time. While it is in flight the frame
//! timestamp is left alone, so the next delta spans the whole round-trip
//! and simulated time keeps pace with the wall clock.

use crate::domain::clock::{Direction, SimulationClock};
use crate::services::gateway::{SnapshotGateway, SnapshotRequest, SnapshotResponse};
use std::time::Instant;
use tracing::{info, warn};

pub struct Playback {
    clock: SimulationClock,
    gateway: SnapshotGateway,
    radius_km: f64,
}

impl Playback {
    pub fn new(clock: SimulationClock, gateway: SnapshotGateway, radius_km: f64) -> Self {
        Self { clock, gateway, radius_km }
    }

    /// Per-frame step. Returns a request to send when time advanced.
    pub fn on_frame(&mut self, now: Instant) -> Option<SnapshotRequest> {
        if self.gateway.is_busy() {
            return None;
        }
        let delta = self.clock.frame_delta(now);
        if !self.clock.is_playing() {
            return None;
        }
        let elapsed = self.clock.advance(delta);
        Some(self.gateway.begin(elapsed, self.radius_km))
    }

    /// Request the snapshot for the current time regardless of play state
    pub fn request_now(&mut self) -> SnapshotRequest {
        self.gateway.begin(self.clock.elapsed_seconds(), self.radius_km)
    }

    /// Settle a finished fetch. A failure of the tick in flight pauses playback.
    ///
    /// Returns true if the response was the one in flight.
    pub fn on_response(&mut self, response: &SnapshotResponse) -> bool {
        let current = self.gateway.complete(response);
        if current && response.result.is_err() && self.clock.is_playing() {
            self.clock.pause();
            warn!(tick = %response.tick, "playback_paused_on_fetch_failure");
        }
        current
    }

    pub fn toggle_play(&mut self) -> bool {
        let playing = self.clock.toggle_play();
        info!(playing = %playing, "playback_toggled");
        playing
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.clock.set_direction(direction);
        info!(direction = %direction.as_str(), "playback_direction_set");
    }

    pub fn set_speed(&mut self, multiplier: f64) -> bool {
        let accepted = self.clock.set_speed(multiplier);
        if accepted {
            info!(speed = %multiplier, "playback_speed_set");
        }
        accepted
    }

    /// Back to epoch for a new satellite definition
    pub fn rewind(&mut self) {
        self.clock.rewind();
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn gateway(&self) -> &SnapshotGateway {
        &self.gateway
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::metrics::Metrics;
    use crate::services::test_support::StubApi;
    use std::sync::Arc;
    use std::time::Duration;

    fn playback(playing: bool) -> Playback {
        let clock = SimulationClock::new(100.0, Direction::Forward, playing);
        Playback::new(clock, SnapshotGateway::new(Arc::new(Metrics::new())), 1300.0)
    }

    #[test]
    fn test_first_frame_issues_at_current_time() {
        let mut playback = playback(true);
        let request = playback.on_frame(Instant::now()).unwrap();
        assert_eq!(request.elapsed_seconds, 0.0);
        assert_eq!(request.radius_km, 1300.0);
    }

    #[test]
    fn test_no_second_request_while_in_flight() {
        let mut playback = playback(true);
        let start = Instant::now();
        assert!(playback.on_frame(start).is_some());
        assert!(playback.on_frame(start + Duration::from_millis(16)).is_none());
        assert!(playback.on_frame(start + Duration::from_millis(32)).is_none());
    }

    #[tokio::test]
    async fn test_delta_spans_round_trip() {
        let api = StubApi::new();
        let mut playback = playback(true);
        let start = Instant::now();

        let request = playback.on_frame(start).unwrap();
        let _ = playback.on_frame(start + Duration::from_millis(500));
        let response = request.send(&api).await;
        assert!(playback.on_response(&response));

        let next = playback.on_frame(start + Duration::from_secs(1)).unwrap();
        assert!((next.elapsed_seconds - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_paused_playback_issues_nothing() {
        let mut playback = playback(false);
        let start = Instant::now();
        assert!(playback.on_frame(start).is_none());
        assert!(playback.on_frame(start + Duration::from_secs(5)).is_none());
        assert_eq!(playback.clock().elapsed_seconds(), 0.0);
    }

    #[tokio::test]
    async fn test_fetch_failure_pauses() {
        let api = StubApi::new();
        api.fail_position(true);
        let mut playback = playback(true);

        let request = playback.on_frame(Instant::now()).unwrap();
        let response = request.send(&api).await;
        assert!(playback.on_response(&response));
        assert!(!playback.clock().is_playing());
        assert!(!playback.gateway().is_busy());
    }

    #[tokio::test]
    async fn test_superseded_failure_does_not_pause() {
        let api = StubApi::new();
        api.fail_position(true);
        let mut playback = playback(true);

        let old = playback.request_now();
        let _current = playback.request_now();
        let response = old.send(&api).await;
        assert!(!playback.on_response(&response));
        assert!(playback.clock().is_playing());
    }

    #[test]
    fn test_toggle_keeps_elapsed() {
        let mut playback = playback(true);
        let start = Instant::now();
        let _ = playback.on_frame(start);
        playback.rewind();
        assert!(!playback.toggle_play());
        assert!(playback.toggle_play());
        assert_eq!(playback.clock().elapsed_seconds(), 0.0);
        assert!(!playback.set_speed(-1.0));
        assert_eq!(playback.clock().speed_multiplier(), 100.0);
    }
}
