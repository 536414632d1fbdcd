//! Ground-track sample buffer (FIFO, bounded)

use crate::domain::types::LatLon;
use std::collections::VecDeque;

/// Default number of sub-satellite points kept for the ground track
pub const DEFAULT_TRAIL_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<LatLon>,
    capacity: usize,
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRAIL_CAPACITY)
    }
}

impl TrailBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { points: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append a sample, evicting the oldest once over capacity
    pub fn push(&mut self, point: LatLon) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LatLon> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&LatLon> {
        self.points.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut trail = TrailBuffer::default();
        for i in 0..1001 {
            trail.push(LatLon::new(0.0, i as f64 * 0.1));
        }
        assert_eq!(trail.len(), 1000);
        assert!(trail.iter().all(|p| p.lon != 0.0));

        let lons: Vec<f64> = trail.iter().map(|p| p.lon).collect();
        let expected: Vec<f64> = (1..1001).map(|i| i as f64 * 0.1).collect();
        assert_eq!(lons, expected);
    }

    #[test]
    fn test_clear_empties_buffer() {
        let mut trail = TrailBuffer::with_capacity(3);
        trail.push(LatLon::new(1.0, 1.0));
        trail.push(LatLon::new(2.0, 2.0));
        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.latest(), None);
    }

    #[test]
    fn test_duplicate_samples_are_kept() {
        let mut trail = TrailBuffer::with_capacity(10);
        let point = LatLon::new(5.0, 5.0);
        trail.push(point);
        trail.push(point);
        assert_eq!(trail.len(), 2);
    }
}
