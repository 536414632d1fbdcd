//! Simulated time: elapsed seconds, direction, speed and play/pause
//!
//! Elapsed time only moves through [`SimulationClock::advance`], scaled by
//! speed and direction, and only while playing.

use serde::Deserialize;
use std::time::Instant;

/// Playback direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    elapsed_seconds: f64,
    direction: Direction,
    speed_multiplier: f64,
    is_playing: bool,
    last_frame: Option<Instant>,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(100.0, Direction::Forward, true)
    }
}

impl SimulationClock {
    pub fn new(speed_multiplier: f64, direction: Direction, is_playing: bool) -> Self {
        let speed_multiplier = if speed_multiplier.is_finite() && speed_multiplier > 0.0 {
            speed_multiplier
        } else {
            1.0
        };
        Self { elapsed_seconds: 0.0, direction, speed_multiplier, is_playing, last_frame: None }
    }

    /// Advance by a wall-clock delta; a no-op while paused
    pub fn advance(&mut self, delta_wall_seconds: f64) -> f64 {
        if self.is_playing {
            self.elapsed_seconds +=
                delta_wall_seconds * self.speed_multiplier * self.direction.sign();
        }
        self.elapsed_seconds
    }

    /// Wall-clock seconds since the previous frame. The first call returns 0.
    pub fn frame_delta(&mut self, now: Instant) -> f64 {
        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        delta
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Returns false and keeps the current speed for non-positive or non-finite values
    pub fn set_speed(&mut self, multiplier: f64) -> bool {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return false;
        }
        self.speed_multiplier = multiplier;
        true
    }

    pub fn toggle_play(&mut self) -> bool {
        self.is_playing = !self.is_playing;
        self.is_playing
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    /// Back to epoch, keeping direction, speed and play state
    pub fn rewind(&mut self) {
        self.elapsed_seconds = 0.0;
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_advance_scales_by_speed_and_direction() {
        for &(speed, direction) in
            &[(1.0, Direction::Forward), (100.0, Direction::Forward), (37.5, Direction::Reverse)]
        {
            for &delta in &[0.0, 0.016, 0.5, 3.0] {
                let mut clock = SimulationClock::new(speed, direction, true);
                clock.advance(10.0);
                let before = clock.elapsed_seconds();
                let after = clock.advance(delta);
                let expected = delta * speed * direction.sign();
                assert!((after - before - expected).abs() < 1e-9, "speed={speed} delta={delta}");
            }
        }
    }

    #[test]
    fn test_paused_clock_ignores_delta() {
        let mut clock = SimulationClock::new(100.0, Direction::Forward, false);
        assert_eq!(clock.advance(5.0), 0.0);
        assert_eq!(clock.advance(1e6), 0.0);
    }

    #[test]
    fn test_toggle_does_not_reset_elapsed() {
        let mut clock = SimulationClock::new(10.0, Direction::Forward, true);
        clock.advance(2.0);
        assert!(!clock.toggle_play());
        assert_eq!(clock.elapsed_seconds(), 20.0);
        assert!(clock.toggle_play());
        assert_eq!(clock.elapsed_seconds(), 20.0);
    }

    #[test]
    fn test_direction_change_applies_to_next_advance_only() {
        let mut clock = SimulationClock::new(10.0, Direction::Forward, true);
        clock.advance(1.0);
        clock.set_direction(Direction::Reverse);
        assert_eq!(clock.elapsed_seconds(), 10.0);
        assert_eq!(clock.advance(3.0), -20.0);
    }

    #[test]
    fn test_set_speed_rejects_non_positive() {
        let mut clock = SimulationClock::new(10.0, Direction::Forward, true);
        assert!(!clock.set_speed(0.0));
        assert!(!clock.set_speed(-5.0));
        assert!(!clock.set_speed(f64::INFINITY));
        assert_eq!(clock.speed_multiplier(), 10.0);
        assert!(clock.set_speed(250.0));
        assert_eq!(clock.advance(1.0), 250.0);
    }

    #[test]
    fn test_frame_delta_measures_wall_time() {
        let mut clock = SimulationClock::default();
        let start = Instant::now();
        assert_eq!(clock.frame_delta(start), 0.0);
        let delta = clock.frame_delta(start + Duration::from_millis(250));
        assert!((delta - 0.25).abs() < 1e-9);
    }
}
