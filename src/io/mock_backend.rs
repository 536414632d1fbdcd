//! In-process mock of the orbit simulation service
//!
//! Serves every `/api` route the viewer consumes with a circular-orbit
//! model, so the client can run without the real propagation service.
//! Used by the `mock-backend` binary and the HTTP integration tests.
//! Uses hyper for the HTTP server.

use crate::domain::types::{wrap_longitude, LatLon, Snapshot, TleLines};
use bytes::Bytes;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

const EARTH_RADIUS_KM: f64 = 6371.0;
/// Sidereal rotation rate (degrees per second)
const EARTH_ROTATION_DEG_PER_SEC: f64 = 360.0 / 86_164.0;
const SPOTBEAM_VERTICES: usize = 36;
/// Flat population density used for coverage estimates (people per km²)
const MOCK_DENSITY_PER_KM2: f64 = 48.0;

/// Circular orbit described by inclination, node and period
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitModel {
    pub name: String,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub period_seconds: f64,
}

impl Default for OrbitModel {
    fn default() -> Self {
        Self {
            name: "MOCKSAT-1".to_string(),
            inclination_deg: 53.0,
            raan_deg: 0.0,
            period_seconds: 5_736.0,
        }
    }
}

impl OrbitModel {
    /// Inclination, RAAN and mean motion from TLE line 2 (fixed columns)
    pub fn from_tle(tle: &TleLines) -> Result<Self, String> {
        if tle.line1.is_empty() {
            return Err("Invalid TLE: missing satellite name".to_string());
        }
        if !tle.line2.starts_with('1') || !tle.line3.starts_with('2') {
            return Err("Invalid TLE: lines must start with 1 and 2".to_string());
        }

        let field = |range: std::ops::Range<usize>, what: &str| -> Result<f64, String> {
            tle.line3
                .get(range)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .ok_or_else(|| format!("Invalid TLE: bad {}", what))
        };
        let inclination_deg = field(8..16, "inclination")?;
        let raan_deg = field(17..25, "right ascension")?;
        let mean_motion = field(52..63, "mean motion")?;
        if mean_motion <= 0.0 {
            return Err("Invalid TLE: mean motion must be positive".to_string());
        }

        Ok(Self {
            name: tle.line1.clone(),
            inclination_deg,
            raan_deg,
            period_seconds: 86_400.0 / mean_motion,
        })
    }

    /// Sub-satellite point after `elapsed_seconds`
    pub fn subpoint(&self, elapsed_seconds: f64) -> LatLon {
        let inclination = self.inclination_deg.to_radians();
        let u = 2.0 * PI * elapsed_seconds / self.period_seconds;
        let lat = (inclination.sin() * u.sin()).asin().to_degrees();
        let lon = self.raan_deg + (inclination.cos() * u.sin()).atan2(u.cos()).to_degrees()
            - EARTH_ROTATION_DEG_PER_SEC * elapsed_seconds;
        LatLon::new(lat, wrap_longitude(lon))
    }
}

/// Closed circle of `[lon, lat]` pairs at great-circle distance `radius_km`
pub fn spotbeam_polygon(center: LatLon, radius_km: f64) -> Vec<[f64; 2]> {
    let angular = radius_km / EARTH_RADIUS_KM;
    let lat1 = center.lat.to_radians();
    let lon1 = center.lon.to_radians();

    let mut polygon: Vec<[f64; 2]> = (0..SPOTBEAM_VERTICES)
        .map(|i| {
            let bearing = 2.0 * PI * i as f64 / SPOTBEAM_VERTICES as f64;
            let lat2 =
                (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
            let lon2 = lon1
                + (bearing.sin() * angular.sin() * lat1.cos())
                    .atan2(angular.cos() - lat1.sin() * lat2.sin());
            [wrap_longitude(lon2.to_degrees()), lat2.to_degrees()]
        })
        .collect();
    if let Some(first) = polygon.first().copied() {
        polygon.push(first);
    }
    polygon
}

/// Shared state behind the mock routes
pub struct MockBackend {
    orbit: Mutex<OrbitModel>,
    last_radius_km: Mutex<f64>,
    epoch: DateTime<Utc>,
    fail_position: AtomicBool,
    position_requests: AtomicU64,
    estimate_requests: AtomicU64,
    economics_requests: AtomicU64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            orbit: Mutex::new(OrbitModel::default()),
            last_radius_km: Mutex::new(1300.0),
            epoch: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            fail_position: AtomicBool::new(false),
            position_requests: AtomicU64::new(0),
            estimate_requests: AtomicU64::new(0),
            economics_requests: AtomicU64::new(0),
        }
    }

    /// Make `/api/position` answer 503 until cleared
    pub fn set_fail_position(&self, fail: bool) {
        self.fail_position.store(fail, Ordering::Relaxed);
    }

    pub fn position_requests(&self) -> u64 {
        self.position_requests.load(Ordering::Relaxed)
    }

    pub fn estimate_requests(&self) -> u64 {
        self.estimate_requests.load(Ordering::Relaxed)
    }

    pub fn economics_requests(&self) -> u64 {
        self.economics_requests.load(Ordering::Relaxed)
    }

    pub fn satellite_name(&self) -> String {
        self.orbit.lock().name.clone()
    }

    pub fn snapshot(&self, elapsed_seconds: f64, radius_km: f64) -> Snapshot {
        *self.last_radius_km.lock() = radius_km;
        let position = self.orbit.lock().subpoint(elapsed_seconds);
        let offset = ChronoDuration::milliseconds((elapsed_seconds * 1000.0).round() as i64);
        Snapshot {
            elapsed_seconds,
            latitude: Some(position.lat),
            longitude: Some(position.lon),
            spotbeam_polygon: spotbeam_polygon(position, radius_km),
            simulation_time_iso: Some((self.epoch + offset).to_rfc3339()),
        }
    }

    fn coverage_area_km2(&self) -> f64 {
        let radius = *self.last_radius_km.lock();
        PI * radius * radius
    }
}

fn query_params(req: &Request<hyper::body::Incoming>) -> HashMap<String, String> {
    req.uri()
        .query()
        .unwrap_or("")
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn number(params: &HashMap<String, String>, key: &str) -> Result<f64, String> {
    params
        .get(key)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("missing or invalid parameter: {}", key))
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("static response should not fail")
}

fn bad_request(message: String) -> Response<Full<Bytes>> {
    json_response(StatusCode::BAD_REQUEST, json!({ "error": message }))
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    backend: Arc<MockBackend>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let params = query_params(&req);
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/api/position") => {
            backend.position_requests.fetch_add(1, Ordering::Relaxed);
            if backend.fail_position.load(Ordering::Relaxed) {
                json_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "propagation unavailable" }),
                )
            } else {
                match (number(&params, "elapsed_seconds"), number(&params, "radius_km")) {
                    (Ok(elapsed), Ok(radius)) => {
                        let snapshot = backend.snapshot(elapsed, radius);
                        json_response(StatusCode::OK, json!(snapshot))
                    }
                    (Err(e), _) | (_, Err(e)) => bad_request(e),
                }
            }
        }
        (&Method::GET, "/api/population-density") => json_response(
            StatusCode::OK,
            json!({ "map_url": "/static/maps/population_density.png" }),
        ),
        (&Method::GET, "/api/population-estimate") => {
            backend.estimate_requests.fetch_add(1, Ordering::Relaxed);
            match (number(&params, "lat"), number(&params, "lon"), number(&params, "radius_km")) {
                (Ok(lat), Ok(lon), Ok(radius)) => {
                    // Denser near the equator, plus a longitude ripple
                    let density = MOCK_DENSITY_PER_KM2
                        * lat.to_radians().cos().max(0.0)
                        * (1.5 + lon.to_radians().sin());
                    let estimate = (density * PI * radius * radius).round();
                    json_response(StatusCode::OK, json!({ "estimated_population": estimate }))
                }
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => bad_request(e),
            }
        }
        (&Method::GET, "/api/coverage-score") => {
            let score = (backend.coverage_area_km2() * MOCK_DENSITY_PER_KM2).round();
            json_response(StatusCode::OK, json!({ "coverage_score": score }))
        }
        (&Method::GET, "/api/coverage-area") => {
            let area = backend.coverage_area_km2().round();
            json_response(StatusCode::OK, json!({ "coverage_area_km2": area }))
        }
        (&Method::GET, "/api/economic-analysis") => {
            backend.economics_requests.fetch_add(1, Ordering::Relaxed);
            let inputs = (
                number(&params, "population"),
                number(&params, "area_km2"),
                number(&params, "adoption_rate"),
                number(&params, "arpu_monthly"),
            );
            match inputs {
                (Ok(population), Ok(area), Ok(adoption), Ok(arpu)) => {
                    let subscribers = (population * adoption).round();
                    let monthly = subscribers * arpu;
                    let per_km2 = if area > 0.0 { monthly * 12.0 / area } else { 0.0 };
                    json_response(
                        StatusCode::OK,
                        json!({
                            "Potential Subscribers": subscribers,
                            "Monthly Revenue ($)": monthly,
                            "Annual Revenue ($)": monthly * 12.0,
                            "Revenue per km² ($/yr)": per_km2,
                        }),
                    )
                }
                (Err(e), ..) | (_, Err(e), ..) | (_, _, Err(e), _) | (.., Err(e)) => bad_request(e),
            }
        }
        (&Method::POST, "/api/update-tle") => {
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => return Ok(bad_request(format!("failed to read body: {}", e))),
            };
            match serde_json::from_slice::<TleLines>(&body) {
                Ok(tle) => match OrbitModel::from_tle(&tle) {
                    Ok(orbit) => {
                        let name = orbit.name.clone();
                        info!(name = %name, period_s = %orbit.period_seconds, "mock_tle_loaded");
                        *backend.orbit.lock() = orbit;
                        json_response(StatusCode::OK, json!({ "name": name }))
                    }
                    Err(message) => {
                        warn!(error = %message, "mock_tle_rejected");
                        bad_request(message)
                    }
                },
                Err(e) => bad_request(format!("invalid JSON body: {}", e)),
            }
        }
        (&Method::GET, "/health") => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail"),
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response should not fail"),
    };
    Ok(response)
}

/// Serve the mock API on an already-bound listener until shutdown
pub async fn serve(
    listener: TcpListener,
    backend: Arc<MockBackend>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "mock_backend_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let backend = backend.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let backend = backend.clone();
                                async move { handle_request(req, backend).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, service)
                                .await
                            {
                                error!(error = %e, "mock_backend_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "mock_backend_accept_error");
                    }
                }
            }
            changed = shutdown.changed() => {
                // A dropped sender also ends the server
                if changed.is_err() || *shutdown.borrow() {
                    info!("mock_backend_shutdown");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iss_tle() -> TleLines {
        TleLines {
            line1: "ISS (ZARYA)".to_string(),
            line2: "1 25544U 98067A   24001.00000000  .00016717  00000-0  10270-3 0  9002"
                .to_string(),
            line3: "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.50377579999999"
                .to_string(),
        }
    }

    #[test]
    fn test_orbit_from_tle() {
        let orbit = OrbitModel::from_tle(&iss_tle()).unwrap();
        assert_eq!(orbit.name, "ISS (ZARYA)");
        assert!((orbit.inclination_deg - 51.6416).abs() < 1e-9);
        assert!((orbit.raan_deg - 247.4627).abs() < 1e-9);
        assert!((orbit.period_seconds - 86_400.0 / 15.50377579).abs() < 1e-3);
    }

    #[test]
    fn test_orbit_from_tle_rejects_garbage() {
        let mut tle = iss_tle();
        tle.line3 = "2 25544 garbage".to_string();
        assert!(OrbitModel::from_tle(&tle).is_err());

        let mut tle = iss_tle();
        tle.line2 = "X bad".to_string();
        assert!(OrbitModel::from_tle(&tle).is_err());
    }

    #[test]
    fn test_subpoint_respects_inclination() {
        let orbit = OrbitModel::default();
        assert_eq!(orbit.subpoint(0.0), LatLon::new(0.0, 0.0));
        let max_lat = (0..200)
            .map(|i| orbit.subpoint(i as f64 * 60.0).lat.abs())
            .fold(0.0f64, f64::max);
        assert!(max_lat <= orbit.inclination_deg + 1e-9);
        assert!(max_lat > orbit.inclination_deg - 1.0);
    }

    #[test]
    fn test_spotbeam_polygon_is_closed_loop() {
        let polygon = spotbeam_polygon(LatLon::new(10.0, 20.0), 1300.0);
        assert_eq!(polygon.len(), SPOTBEAM_VERTICES + 1);
        assert_eq!(polygon.first(), polygon.last());
        // Due north vertex sits ~11.7 degrees above the center
        assert!((polygon[0][1] - (10.0 + 1300.0 / EARTH_RADIUS_KM * 180.0 / PI)).abs() < 1e-6);
    }

    #[test]
    fn test_snapshot_time_offsets_epoch() {
        let backend = MockBackend::new();
        let snapshot = backend.snapshot(90061.0, 1300.0);
        assert_eq!(snapshot.simulation_time_iso.as_deref(), Some("2030-01-02T01:01:01+00:00"));
        assert!(snapshot.latitude.is_some());
    }
}
