//! Scripted in-memory API used by the service unit tests

use crate::domain::types::{EconomicParams, EconomicReport, LatLon, Snapshot, TleLines};
use crate::io::api::{ApiError, SimulationApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub struct StubApi {
    fail_position: AtomicBool,
    position_calls: AtomicUsize,
    estimate_calls: Mutex<Vec<LatLon>>,
    density_calls: AtomicUsize,
    economics_calls: AtomicUsize,
    coverage_score: Mutex<Result<f64, String>>,
    coverage_area: Mutex<Result<f64, String>>,
    map_url: Mutex<Result<String, String>>,
    tle_result: Mutex<Result<String, String>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self {
            fail_position: AtomicBool::new(false),
            position_calls: AtomicUsize::new(0),
            estimate_calls: Mutex::new(Vec::new()),
            density_calls: AtomicUsize::new(0),
            economics_calls: AtomicUsize::new(0),
            coverage_score: Mutex::new(Ok(1234.4)),
            coverage_area: Mutex::new(Ok(5_309_291.6)),
            map_url: Mutex::new(Ok("/static/maps/population_density.png".to_string())),
            tle_result: Mutex::new(Ok("STUBSAT".to_string())),
        }
    }

    pub fn fail_position(&self, fail: bool) {
        self.fail_position.store(fail, Ordering::SeqCst);
    }

    pub fn set_coverage_score(&self, result: Result<f64, &str>) {
        *self.coverage_score.lock() = result.map_err(str::to_string);
    }

    pub fn set_map_url(&self, result: Result<&str, &str>) {
        *self.map_url.lock() = result.map(str::to_string).map_err(str::to_string);
    }

    pub fn set_tle_result(&self, result: Result<&str, &str>) {
        *self.tle_result.lock() = result.map(str::to_string).map_err(str::to_string);
    }

    pub fn position_calls(&self) -> usize {
        self.position_calls.load(Ordering::SeqCst)
    }

    pub fn estimate_calls(&self) -> Vec<LatLon> {
        self.estimate_calls.lock().clone()
    }

    pub fn density_calls(&self) -> usize {
        self.density_calls.load(Ordering::SeqCst)
    }

    pub fn economics_calls(&self) -> usize {
        self.economics_calls.load(Ordering::SeqCst)
    }

    /// Snapshot the stub serves for `elapsed_seconds`
    pub fn snapshot_at(elapsed_seconds: f64) -> Snapshot {
        let lat = (elapsed_seconds / 100.0).sin() * 50.0;
        let lon = (elapsed_seconds / 50.0) % 180.0;
        Snapshot {
            elapsed_seconds,
            latitude: Some(lat),
            longitude: Some(lon),
            spotbeam_polygon: vec![
                [lon - 1.0, lat - 1.0],
                [lon + 1.0, lat - 1.0],
                [lon, lat + 1.0],
                [lon - 1.0, lat - 1.0],
            ],
            simulation_time_iso: Some("2030-01-01T00:00:00+00:00".to_string()),
        }
    }
}

fn server_error(message: &str) -> ApiError {
    ApiError::Status { status: 500, message: Some(message.to_string()) }
}

#[async_trait]
impl SimulationApi for StubApi {
    async fn position(&self, elapsed_seconds: f64, _radius_km: f64) -> Result<Snapshot, ApiError> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_position.load(Ordering::SeqCst) {
            return Err(ApiError::Status { status: 503, message: None });
        }
        Ok(Self::snapshot_at(elapsed_seconds))
    }

    async fn population_density(&self) -> Result<String, ApiError> {
        self.density_calls.fetch_add(1, Ordering::SeqCst);
        self.map_url.lock().clone().map_err(|e| server_error(&e))
    }

    async fn population_estimate(&self, at: LatLon, _radius_km: f64) -> Result<f64, ApiError> {
        self.estimate_calls.lock().push(at);
        Ok(1500.0)
    }

    async fn coverage_score(&self) -> Result<f64, ApiError> {
        self.coverage_score.lock().clone().map_err(ApiError::Server)
    }

    async fn coverage_area(&self) -> Result<f64, ApiError> {
        self.coverage_area.lock().clone().map_err(ApiError::Server)
    }

    async fn economic_analysis(&self, params: EconomicParams) -> Result<EconomicReport, ApiError> {
        self.economics_calls.fetch_add(1, Ordering::SeqCst);
        let subscribers = (params.population * params.adoption_rate).round();
        Ok(EconomicReport {
            metrics: vec![
                ("Potential Subscribers".to_string(), subscribers),
                ("Monthly Revenue ($)".to_string(), subscribers * params.arpu_monthly),
            ],
        })
    }

    async fn update_tle(&self, _tle: &TleLines) -> Result<String, ApiError> {
        self.tle_result.lock().clone().map_err(|e| server_error(&e))
    }
}
