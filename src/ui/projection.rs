//! Orthographic globe projection and the orbiting camera
//!
//! Canvas coordinates put the globe at the origin with radius 1. Geographic
//! points are earth-fixed; the globe spins by the scene's rotation angle and
//! the camera adds its own yaw and pitch on top.

use crate::domain::types::{wrap_longitude, LatLon};
use ratatui::layout::Rect;

/// Fraction of the remaining distance covered per frame
const DAMPING: f64 = 0.15;
const MAX_PITCH: f64 = 80.0 * std::f64::consts::PI / 180.0;
/// Margin around the globe in canvas units
const MARGIN: f64 = 1.1;
/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 0.5;

/// Damped orbit camera
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    yaw: f64,
    pitch: f64,
    target_yaw: f64,
    target_pitch: f64,
}

impl Camera {
    /// Nudge the target orientation (radians)
    pub fn rotate(&mut self, delta_yaw: f64, delta_pitch: f64) {
        self.target_yaw += delta_yaw;
        self.target_pitch = (self.target_pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Ease towards the target; called once per frame
    pub fn update(&mut self) {
        self.yaw += (self.target_yaw - self.yaw) * DAMPING;
        self.pitch += (self.target_pitch - self.pitch) * DAMPING;
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }
}

/// Globe orientation for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Globe {
    /// Angle added to every longitude (radians)
    spin: f64,
    pitch: f64,
}

impl Globe {
    pub fn new(camera: &Camera, globe_rotation: f64) -> Self {
        Self { spin: globe_rotation - camera.yaw(), pitch: camera.pitch() }
    }

    /// Canvas position of `point`, or None when it faces away
    pub fn project(&self, point: LatLon) -> Option<(f64, f64)> {
        let lat = point.lat.to_radians();
        let lon = point.lon.to_radians() + self.spin;
        let x = lat.cos() * lon.sin();
        let y = lat.sin();
        let z = lat.cos() * lon.cos();

        let (sin_p, cos_p) = self.pitch.sin_cos();
        let y_view = y * cos_p - z * sin_p;
        let z_view = y * sin_p + z * cos_p;
        (z_view >= 0.0).then_some((x, y_view))
    }

    /// Globe point under a canvas position, if the ray hits the sphere
    pub fn unproject(&self, x: f64, y_view: f64) -> Option<LatLon> {
        let r2 = x * x + y_view * y_view;
        if r2 > 1.0 {
            return None;
        }
        let z_view = (1.0 - r2).sqrt();

        let (sin_p, cos_p) = self.pitch.sin_cos();
        let y = y_view * cos_p + z_view * sin_p;
        let z = -y_view * sin_p + z_view * cos_p;

        let lat = y.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = (x.atan2(z) - self.spin).to_degrees();
        Some(LatLon::new(lat, wrap_longitude(lon)))
    }
}

/// Canvas bounds fitted to a terminal area so the globe stays round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub area: Rect,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl Viewport {
    pub fn fit(area: Rect) -> Self {
        let width = f64::from(area.width.max(1)) * CELL_ASPECT;
        let height = f64::from(area.height.max(1));
        let aspect = width / height;
        let (half_x, half_y) =
            if aspect >= 1.0 { (MARGIN * aspect, MARGIN) } else { (MARGIN, MARGIN / aspect) };
        Self { area, x_bounds: [-half_x, half_x], y_bounds: [-half_y, half_y] }
    }

    /// Canvas position at the center of a terminal cell inside the area
    pub fn cell_to_canvas(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.area;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        let x = self.x_bounds[0] + fx * (self.x_bounds[1] - self.x_bounds[0]);
        let y = self.y_bounds[1] - fy * (self.y_bounds[1] - self.y_bounds[0]);
        Some((x, y))
    }

    /// Resolve a terminal cell to a point on the globe
    pub fn point_at(&self, globe: &Globe, column: u16, row: u16) -> Option<LatLon> {
        let (x, y) = self.cell_to_canvas(column, row)?;
        globe.unproject(x, y)
    }
}
