//! Shared types for the orbit viewer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds in one simulated day (globe rotation period and day counter)
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Wrap a longitude into [-180, 180], keeping +180 as given
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Clamp latitude to [-90, 90] and wrap longitude into [-180, 180]
    pub fn normalized(self) -> Self {
        Self { lat: self.lat.clamp(-90.0, 90.0), lon: wrap_longitude(self.lon) }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl std::fmt::Display for LatLon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lat: {:.2}, Lon: {:.2}", self.lat, self.lon)
    }
}

/// Newtype wrapper for snapshot request ids, monotonically increasing per process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct TickId(pub u64);

impl TickId {
    pub fn next(self) -> Self {
        TickId(self.0 + 1)
    }
}

impl std::fmt::Display for TickId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Satellite sample served by `/api/position`
///
/// Position fields are optional so a malformed payload still decodes and is
/// rejected by the synchronizer instead of failing the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Closed loop of `[lon, lat]` pairs
    #[serde(default)]
    pub spotbeam_polygon: Vec<[f64; 2]>,
    #[serde(default)]
    pub simulation_time_iso: Option<String>,
}

impl Snapshot {
    /// Sub-satellite point, if both coordinates are present and finite.
    /// Longitude is wrapped and latitude clamped into range.
    pub fn position(&self) -> Option<LatLon> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(LatLon::new(lat, lon).normalized())
            }
            _ => None,
        }
    }

    /// Spotbeam outline converted from `[lon, lat]` pairs
    pub fn spotbeam_outline(&self) -> Vec<LatLon> {
        self.spotbeam_polygon
            .iter()
            .map(|[lon, lat]| LatLon::new(*lat, *lon).normalized())
            .collect()
    }
}

/// Snapshot tagged with the tick that requested it
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    pub tick: TickId,
    pub snapshot: Snapshot,
}

/// Three-line TLE as accepted by `/api/update-tle`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TleLines {
    pub line1: String,
    pub line2: String,
    pub line3: String,
}

impl TleLines {
    /// Parse operator input: exactly three non-empty lines (name, line 1, line 2)
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let lines: Vec<&str> = text.trim().lines().map(str::trim).collect();
        match lines.as_slice() {
            [name, first, second] if lines.iter().all(|line| !line.is_empty()) => Ok(Self {
                line1: name.to_string(),
                line2: first.to_string(),
                line3: second.to_string(),
            }),
            _ => Err(InputError::TleLineCount(lines.len())),
        }
    }
}

/// Parameters for `/api/economic-analysis`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EconomicParams {
    pub population: f64,
    pub area_km2: f64,
    /// Fraction in [0, 1]
    pub adoption_rate: f64,
    pub arpu_monthly: f64,
}

/// Metric name to value, in the order the service returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EconomicReport {
    pub metrics: Vec<(String, f64)>,
}

/// Operator input rejected before any network call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Invalid TLE format. Please provide 3 lines: Name, Line 1, and Line 2.")]
    TleLineCount(usize),
    #[error(
        "Invalid input. Please enter a valid latitude (-90 to 90) and longitude (-180 to 180)."
    )]
    InvalidPin,
    #[error("Please calculate both \"by Population\" and \"by Area\" scores first.")]
    CoverageIncomplete,
    #[error("{0} is already running")]
    Busy(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_decodes_server_payload() {
        let json = r#"{
            "elapsed_seconds": 120.5,
            "latitude": 12.5,
            "longitude": -45.0,
            "spotbeam_polygon": [[-46.0, 12.0], [-44.0, 12.0], [-45.0, 13.0], [-46.0, 12.0]],
            "simulation_time_iso": "2030-01-01T00:02:00.500000+00:00"
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.position(), Some(LatLon::new(12.5, -45.0)));
        assert_eq!(snapshot.spotbeam_outline()[0], LatLon::new(12.0, -46.0));
        assert_eq!(snapshot.spotbeam_polygon.len(), 4);
    }

    #[test]
    fn test_snapshot_missing_latitude_still_decodes() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"elapsed_seconds": 10, "longitude": 3.0}"#).unwrap();
        assert_eq!(snapshot.latitude, None);
        assert_eq!(snapshot.position(), None);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(200.0), -160.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
    }

    #[test]
    fn test_normalized_brings_coordinates_in_range() {
        assert_eq!(LatLon::new(10.0, 200.0).normalized(), LatLon::new(10.0, -160.0));
        assert_eq!(LatLon::new(90.000001, 359.5).normalized(), LatLon::new(90.0, -0.5));
        assert!(LatLon::new(-95.0, -540.0).normalized().is_valid());
    }

    #[test]
    fn test_latlon_validity() {
        assert!(LatLon::new(90.0, -180.0).is_valid());
        assert!(!LatLon::new(90.1, 0.0).is_valid());
        assert!(!LatLon::new(0.0, 180.5).is_valid());
        assert!(!LatLon::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_tle_parse_trims_lines() {
        let text = "  ISS (ZARYA)  \n1 25544U 98067A   24001.00000000  .00016717  00000-0  10270-3 0  9002 \n 2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.50377579999999\n";
        let tle = TleLines::parse(text).unwrap();
        assert_eq!(tle.line1, "ISS (ZARYA)");
        assert!(tle.line2.starts_with("1 25544U"));
        assert!(tle.line3.starts_with("2 25544"));
    }

    #[test]
    fn test_tle_parse_rejects_wrong_line_count() {
        assert_eq!(TleLines::parse("only one line"), Err(InputError::TleLineCount(1)));
        assert_eq!(TleLines::parse("a\nb\nc\nd"), Err(InputError::TleLineCount(4)));
    }

    #[test]
    fn test_tle_parse_rejects_blank_line() {
        assert_eq!(
            TleLines::parse("ISS\n\n2 25544  51.6416"),
            Err(InputError::TleLineCount(3))
        );
        assert_eq!(
            TleLines::parse("ISS\n   \n2 25544  51.6416"),
            Err(InputError::TleLineCount(3))
        );
    }

    #[test]
    fn test_tick_id_ordering() {
        let first = TickId(1);
        assert!(first.next() > first);
        assert_eq!(first.next(), TickId(2));
    }
}
