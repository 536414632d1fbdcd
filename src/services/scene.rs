//! Scene state drawn by the render loop
//!
//! Visual objects (trail line, spotbeam loop, pin marker) hold a
//! [`ResourceHandle`] while alive. They live in a [`Slot`], whose `replace`
//! and `clear` drop the previous object, so the live count reported by
//! [`ResourceTracker`] never grows with replacements.

use crate::domain::format;
use crate::domain::trail::TrailBuffer;
use crate::domain::types::{LatLon, SECONDS_PER_DAY};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts visual resources currently held by the scene
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    live: Arc<AtomicUsize>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> ResourceHandle {
        self.live.fetch_add(1, Ordering::Relaxed);
        ResourceHandle { live: self.live.clone() }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

/// Released on drop
#[derive(Debug)]
pub struct ResourceHandle {
    live: Arc<AtomicUsize>,
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Ground-track polyline built from the trail buffer
#[derive(Debug)]
pub struct TrailLine {
    pub points: Vec<LatLon>,
    _handle: ResourceHandle,
}

/// Spotbeam outline
#[derive(Debug)]
pub struct SpotbeamLoop {
    pub outline: Vec<LatLon>,
    _handle: ResourceHandle,
}

/// Operator-placed marker
#[derive(Debug)]
pub struct PinMarker {
    pub at: LatLon,
    _handle: ResourceHandle,
}

/// Holds at most one resource; replacing it releases the previous one
#[derive(Debug)]
pub struct Slot<T> {
    current: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `value`, dropping whatever was there first
    pub fn replace(&mut self, value: T) {
        self.current.take();
        self.current = Some(value);
    }

    pub fn clear(&mut self) {
        self.current.take();
    }

    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn is_some(&self) -> bool {
        self.current.is_some()
    }
}

pub struct Scene {
    resources: ResourceTracker,
    satellite: Option<LatLon>,
    trail: TrailBuffer,
    trail_line: Slot<TrailLine>,
    spotbeam: Slot<SpotbeamLoop>,
    pin: Slot<PinMarker>,
    /// Radians, grows without wrapping
    globe_rotation: f64,
    time_display: String,
    utc_display: String,
}

impl Scene {
    pub fn new(trail_capacity: usize) -> Self {
        Self {
            resources: ResourceTracker::new(),
            satellite: None,
            trail: TrailBuffer::with_capacity(trail_capacity),
            trail_line: Slot::new(),
            spotbeam: Slot::new(),
            pin: Slot::new(),
            globe_rotation: 0.0,
            time_display: format::time_display(0.0),
            utc_display: String::new(),
        }
    }

    pub fn set_satellite(&mut self, position: LatLon) {
        self.satellite = Some(position);
        self.trail.push(position);
    }

    /// Rebuild the trail line from the buffer, or drop it below two points
    pub fn rebuild_trail_line(&mut self) {
        if self.trail.len() < 2 {
            self.trail_line.clear();
            return;
        }
        let line = TrailLine {
            points: self.trail.iter().copied().collect(),
            _handle: self.resources.acquire(),
        };
        self.trail_line.replace(line);
    }

    pub fn set_spotbeam(&mut self, outline: Vec<LatLon>) {
        if outline.is_empty() {
            self.spotbeam.clear();
            return;
        }
        let spotbeam = SpotbeamLoop { outline, _handle: self.resources.acquire() };
        self.spotbeam.replace(spotbeam);
    }

    pub fn set_globe_rotation(&mut self, elapsed_seconds: f64) {
        self.globe_rotation = elapsed_seconds / SECONDS_PER_DAY * TAU;
    }

    pub fn set_readouts(&mut self, time_display: String, utc_display: String) {
        self.time_display = time_display;
        self.utc_display = utc_display;
    }

    pub fn place_pin(&mut self, at: LatLon) {
        let pin = PinMarker { at, _handle: self.resources.acquire() };
        self.pin.replace(pin);
    }

    /// Drop every accumulated visual and return to epoch readouts
    pub fn reset(&mut self) {
        self.satellite = None;
        self.trail.clear();
        self.trail_line.clear();
        self.spotbeam.clear();
        self.pin.clear();
        self.globe_rotation = 0.0;
        self.time_display = format::time_display(0.0);
        self.utc_display.clear();
    }

    pub fn satellite(&self) -> Option<LatLon> {
        self.satellite
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    pub fn trail_line(&self) -> Option<&TrailLine> {
        self.trail_line.get()
    }

    pub fn spotbeam(&self) -> Option<&SpotbeamLoop> {
        self.spotbeam.get()
    }

    pub fn pin(&self) -> Option<&PinMarker> {
        self.pin.get()
    }

    pub fn globe_rotation(&self) -> f64 {
        self.globe_rotation
    }

    pub fn time_display(&self) -> &str {
        &self.time_display
    }

    pub fn utc_display(&self) -> &str {
        &self.utc_display
    }

    /// Visual resources currently alive
    pub fn live_resources(&self) -> usize {
        self.resources.live()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline() -> Vec<LatLon> {
        vec![LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0), LatLon::new(0.0, 0.0)]
    }

    #[test]
    fn test_slot_replace_releases_previous() {
        let tracker = ResourceTracker::new();
        let mut slot = Slot::new();
        slot.replace(tracker.acquire());
        slot.replace(tracker.acquire());
        slot.replace(tracker.acquire());
        assert_eq!(tracker.live(), 1);
        slot.clear();
        assert_eq!(tracker.live(), 0);
        assert!(!slot.is_some());
    }

    #[test]
    fn test_trail_line_needs_two_points() {
        let mut scene = Scene::new(1000);
        scene.set_satellite(LatLon::new(1.0, 2.0));
        scene.rebuild_trail_line();
        assert!(scene.trail_line().is_none());

        scene.set_satellite(LatLon::new(1.5, 2.5));
        scene.rebuild_trail_line();
        assert_eq!(scene.trail_line().map(|l| l.points.len()), Some(2));
    }

    #[test]
    fn test_repeated_updates_do_not_leak() {
        let mut scene = Scene::new(1000);
        for i in 0..50 {
            scene.set_satellite(LatLon::new(i as f64 * 0.1, 0.0));
            scene.rebuild_trail_line();
            scene.set_spotbeam(outline());
            scene.place_pin(LatLon::new(10.0, 10.0));
        }
        // trail line + spotbeam + pin
        assert_eq!(scene.live_resources(), 3);

        scene.reset();
        assert_eq!(scene.live_resources(), 0);
        assert!(scene.trail().is_empty());
        assert_eq!(scene.time_display(), "Day 00 / Hour 00:00:00");
    }

    #[test]
    fn test_globe_rotation_full_turn_per_day() {
        let mut scene = Scene::new(10);
        scene.set_globe_rotation(43_200.0);
        assert!((scene.globe_rotation() - std::f64::consts::PI).abs() < 1e-12);
        scene.set_globe_rotation(-86_400.0);
        assert!((scene.globe_rotation() + TAU).abs() < 1e-12);
    }

    #[test]
    fn test_empty_outline_clears_spotbeam() {
        let mut scene = Scene::new(10);
        scene.set_spotbeam(outline());
        assert!(scene.spotbeam().is_some());
        scene.set_spotbeam(Vec::new());
        assert!(scene.spotbeam().is_none());
        assert_eq!(scene.live_resources(), 0);
    }
}
