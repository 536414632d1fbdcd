//! Interaction controller - operator input to local state or async queries
//!
//! Queries run on spawned tasks and report back through the viewer event
//! channel as [`QueryResult`]s; [`Interaction::handle_result`] applies them on
//! the owning task. Each trigger control is disabled while its query runs.

use crate::domain::coverage::CoverageCache;
use crate::domain::format;
use crate::domain::types::{EconomicParams, EconomicReport, InputError, LatLon, TleLines};
use crate::infra::metrics::Metrics;
use crate::io::api::{ApiError, SimulationApi};
use crate::services::viewer::ViewerEvent;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const ADOPTION_RATE_RANGE: (u32, u32) = (1, 100);
pub const ARPU_RANGE: (u32, u32) = (1, 500);

/// Cancellable delayed task; scheduling again cancels the pending one
pub struct Debouncer {
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, pending: None }
    }

    /// Run `task` after the quiet period unless rescheduled first.
    ///
    /// Once the quiet period has passed, `task` runs detached and is no
    /// longer affected by `cancel`.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            tokio::spawn(task);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug)]
pub enum QueryResult {
    PopulationEstimate { at: LatLon, result: Result<f64, ApiError> },
    CoverageScore(Result<f64, ApiError>),
    CoverageArea(Result<f64, ApiError>),
    Economics(Result<EconomicReport, ApiError>),
    PopulationMap(Result<String, ApiError>),
    TleUpdated(Result<String, ApiError>),
}

/// What the viewer must do after a query result was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Updated,
    /// The service now simulates a different satellite
    SatelliteReplaced(String),
}

/// Trigger controls that disable themselves while their query runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    CoverageScore,
    CoverageArea,
    Economics,
    PopulationMap,
    LoadTle,
}

impl Control {
    pub fn idle_label(self) -> &'static str {
        match self {
            Control::CoverageScore => "by Population",
            Control::CoverageArea => "by Area (km²)",
            Control::Economics => "Calculate Economics",
            Control::PopulationMap => "View Population Density",
            Control::LoadTle => "Load TLE",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Control::CoverageScore | Control::CoverageArea | Control::Economics => "Calculating...",
            Control::PopulationMap | Control::LoadTle => "Loading...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TooltipStatus {
    Calculating,
    Fetching,
    Population(f64),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub at: LatLon,
    pub status: TooltipStatus,
}

impl Tooltip {
    pub fn lines(&self) -> [String; 2] {
        let detail = match self.status {
            TooltipStatus::Calculating => "Calculating...".to_string(),
            TooltipStatus::Fetching => "Fetching...".to_string(),
            TooltipStatus::Population(value) => {
                format!("Pop. (~1km): {}", format::group_thousands(value.round(), 0))
            }
            TooltipStatus::Failed => "Could not load data.".to_string(),
        };
        [self.at.to_string(), detail]
    }
}

/// Status text for a failed request, with a fallback when the server sent none
fn error_text(error: &ApiError, fallback: &str) -> String {
    match error {
        ApiError::Status { message: None, .. } => fallback.to_string(),
        other => other.user_message(),
    }
}

pub struct Interaction {
    api: Arc<dyn SimulationApi>,
    events: mpsc::Sender<ViewerEvent>,
    metrics: Arc<Metrics>,
    debouncer: Debouncer,
    population_radius_km: f64,
    coverage: CoverageCache,
    busy: HashSet<Control>,
    tooltip: Option<Tooltip>,
    score_display: String,
    economic_display: String,
    notice: Option<String>,
    population_map_active: bool,
    map_url: Option<String>,
    adoption_rate_percent: u32,
    arpu_monthly: u32,
}

impl Interaction {
    pub fn new(
        api: Arc<dyn SimulationApi>,
        events: mpsc::Sender<ViewerEvent>,
        metrics: Arc<Metrics>,
        hover_debounce: Duration,
        population_radius_km: f64,
        adoption_rate_percent: u32,
        arpu_monthly: u32,
    ) -> Self {
        Self {
            api,
            events,
            metrics,
            debouncer: Debouncer::new(hover_debounce),
            population_radius_km,
            coverage: CoverageCache::default(),
            busy: HashSet::new(),
            tooltip: None,
            score_display: String::new(),
            economic_display: String::new(),
            notice: None,
            population_map_active: false,
            map_url: None,
            adoption_rate_percent: adoption_rate_percent
                .clamp(ADOPTION_RATE_RANGE.0, ADOPTION_RATE_RANGE.1),
            arpu_monthly: arpu_monthly.clamp(ARPU_RANGE.0, ARPU_RANGE.1),
        }
    }

    /// Wrap a query so its result is delivered to the viewer
    fn query_task<F>(&self, query: F) -> impl Future<Output = ()> + Send + 'static
    where
        F: Future<Output = QueryResult> + Send + 'static,
    {
        let events = self.events.clone();
        let metrics = self.metrics.clone();
        async move {
            metrics.record_query();
            let result = query.await;
            if events.send(ViewerEvent::Query(result)).await.is_err() {
                debug!("query_result_dropped");
            }
        }
    }

    fn spawn_query<F>(&self, query: F)
    where
        F: Future<Output = QueryResult> + Send + 'static,
    {
        tokio::spawn(self.query_task(query));
    }

    fn estimate_query(&self, at: LatLon) -> impl Future<Output = QueryResult> + Send + 'static {
        let api = self.api.clone();
        let radius_km = self.population_radius_km;
        async move {
            let result = api.population_estimate(at, radius_km).await;
            QueryResult::PopulationEstimate { at, result }
        }
    }

    /// Pointer moved; `at` is the globe point under it, if any
    pub fn hover(&mut self, at: Option<LatLon>) {
        if !self.population_map_active {
            self.tooltip = None;
            return;
        }
        match at {
            Some(at) => {
                self.tooltip = Some(Tooltip { at, status: TooltipStatus::Calculating });
                let task = self.query_task(self.estimate_query(at));
                self.debouncer.schedule(task);
            }
            None => {
                self.tooltip = None;
                self.debouncer.cancel();
            }
        }
    }

    /// Pointer clicked; queries immediately
    pub fn click(&mut self, at: Option<LatLon>) {
        if !self.population_map_active {
            return;
        }
        if let Some(at) = at {
            self.debouncer.cancel();
            self.tooltip = Some(Tooltip { at, status: TooltipStatus::Fetching });
            self.spawn_query(self.estimate_query(at));
        }
    }

    /// Mark `control` busy; false if it already was
    fn start(&mut self, control: Control) -> bool {
        if !self.busy.insert(control) {
            debug!(control = ?control, "control_busy_ignored");
            return false;
        }
        true
    }

    fn finish(&mut self, control: Control) {
        self.busy.remove(&control);
    }

    pub fn request_coverage_score(&mut self) {
        if !self.start(Control::CoverageScore) {
            return;
        }
        self.score_display.clear();
        let api = self.api.clone();
        self.spawn_query(async move { QueryResult::CoverageScore(api.coverage_score().await) });
    }

    pub fn request_coverage_area(&mut self) {
        if !self.start(Control::CoverageArea) {
            return;
        }
        self.score_display.clear();
        let api = self.api.clone();
        self.spawn_query(async move { QueryResult::CoverageArea(api.coverage_area().await) });
    }

    /// Runs only once both coverage values are cached
    pub fn request_economics(&mut self) {
        if self.busy.contains(&Control::Economics) {
            return;
        }
        let (population, area_km2) = match self.coverage.economics_inputs() {
            Ok(inputs) => inputs,
            Err(e) => {
                info!(reason = %e, "economics_blocked");
                self.notice = Some(e.to_string());
                return;
            }
        };
        self.start(Control::Economics);
        self.economic_display = "Calculating...".to_string();

        let params = EconomicParams {
            population,
            area_km2,
            adoption_rate: f64::from(self.adoption_rate_percent) / 100.0,
            arpu_monthly: f64::from(self.arpu_monthly),
        };
        let api = self.api.clone();
        self.spawn_query(async move {
            QueryResult::Economics(api.economic_analysis(params).await)
        });
    }

    pub fn toggle_population_map(&mut self) {
        if self.busy.contains(&Control::PopulationMap) {
            return;
        }
        if self.population_map_active {
            self.population_map_active = false;
            self.tooltip = None;
            self.debouncer.cancel();
            return;
        }
        if self.map_url.is_some() {
            self.population_map_active = true;
            return;
        }
        self.start(Control::PopulationMap);
        let api = self.api.clone();
        self.spawn_query(async move { QueryResult::PopulationMap(api.population_density().await) });
    }

    /// Validate pin input; the caller places the marker
    pub fn submit_pin(&mut self, lat: &str, lon: &str) -> Option<LatLon> {
        let parsed = match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
            (Ok(lat), Ok(lon)) => Some(LatLon::new(lat, lon)),
            _ => None,
        };
        match parsed.filter(LatLon::is_valid) {
            Some(at) => Some(at),
            None => {
                self.notice = Some(InputError::InvalidPin.to_string());
                None
            }
        }
    }

    pub fn submit_tle(&mut self, text: &str) {
        if self.busy.contains(&Control::LoadTle) {
            return;
        }
        let tle = match TleLines::parse(text) {
            Ok(tle) => tle,
            Err(e) => {
                self.notice = Some(e.to_string());
                return;
            }
        };
        self.start(Control::LoadTle);
        let api = self.api.clone();
        self.spawn_query(async move { QueryResult::TleUpdated(api.update_tle(&tle).await) });
    }

    pub fn adjust_adoption_rate(&mut self, delta: i32) {
        let (min, max) = ADOPTION_RATE_RANGE;
        self.adoption_rate_percent =
            (self.adoption_rate_percent as i64 + delta as i64).clamp(min as i64, max as i64) as u32;
    }

    pub fn adjust_arpu(&mut self, delta: i32) {
        let (min, max) = ARPU_RANGE;
        self.arpu_monthly =
            (self.arpu_monthly as i64 + delta as i64).clamp(min as i64, max as i64) as u32;
    }

    pub fn handle_result(&mut self, result: QueryResult) -> QueryOutcome {
        let failed = match &result {
            QueryResult::PopulationEstimate { result, .. } => result.is_err(),
            QueryResult::CoverageScore(r) | QueryResult::CoverageArea(r) => r.is_err(),
            QueryResult::Economics(r) => r.is_err(),
            QueryResult::PopulationMap(r) | QueryResult::TleUpdated(r) => r.is_err(),
        };
        if failed {
            self.metrics.record_query_failed();
        }

        match result {
            QueryResult::PopulationEstimate { at, result } => {
                // Only the point still under the tooltip gets its value
                if let Some(tooltip) = self.tooltip.as_mut().filter(|t| t.at == at) {
                    tooltip.status = match result {
                        Ok(population) => TooltipStatus::Population(population),
                        Err(e) => {
                            warn!(
                                lat = %at.lat,
                                lon = %at.lon,
                                error = %e,
                                "population_estimate_failed"
                            );
                            TooltipStatus::Failed
                        }
                    };
                }
            }
            QueryResult::CoverageScore(result) => {
                self.finish(Control::CoverageScore);
                match result {
                    Ok(score) => {
                        self.coverage.set_population_score(score);
                        self.score_display = format::population_score_text(score);
                    }
                    Err(e) => {
                        warn!(error = %e, "coverage_score_failed");
                        self.score_display = "Error calculating score.".to_string();
                    }
                }
            }
            QueryResult::CoverageArea(result) => {
                self.finish(Control::CoverageArea);
                match result {
                    Ok(area_km2) => {
                        self.coverage.set_area_km2(area_km2);
                        self.score_display = format::coverage_area_text(area_km2);
                    }
                    Err(e) => {
                        warn!(error = %e, "coverage_area_failed");
                        self.score_display = "Error calculating area.".to_string();
                    }
                }
            }
            QueryResult::Economics(result) => {
                self.finish(Control::Economics);
                match result {
                    Ok(report) => self.economic_display = format::economic_report_text(&report),
                    Err(e) => {
                        warn!(error = %e, "economic_analysis_failed");
                        self.economic_display = "Error calculating economics.".to_string();
                    }
                }
            }
            QueryResult::PopulationMap(result) => {
                self.finish(Control::PopulationMap);
                match result {
                    Ok(map_url) => {
                        info!(map_url = %map_url, "population_map_loaded");
                        self.map_url = Some(map_url);
                        self.population_map_active = true;
                    }
                    Err(e) => {
                        warn!(error = %e, "population_map_failed");
                        self.notice =
                            Some("Could not load the population density map.".to_string());
                    }
                }
            }
            QueryResult::TleUpdated(result) => {
                self.finish(Control::LoadTle);
                match result {
                    Ok(name) => {
                        info!(name = %name, "satellite_loaded");
                        self.notice = Some(format!("Successfully loaded satellite: {}", name));
                        return QueryOutcome::SatelliteReplaced(name);
                    }
                    Err(e) => {
                        warn!(error = %e, "tle_update_failed");
                        self.notice =
                            Some(format!("Error: {}", error_text(&e, "Failed to update TLE.")));
                    }
                }
            }
        }
        QueryOutcome::Updated
    }

    /// Forget coverage results and clear result texts
    pub fn reset(&mut self) {
        self.coverage.clear();
        self.score_display.clear();
        self.economic_display.clear();
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy.contains(&control)
    }

    /// Current label of a trigger control
    pub fn label(&self, control: Control) -> &'static str {
        if self.is_busy(control) {
            control.busy_label()
        } else {
            control.idle_label()
        }
    }

    pub fn coverage(&self) -> &CoverageCache {
        &self.coverage
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn score_display(&self) -> &str {
        &self.score_display
    }

    pub fn economic_display(&self) -> &str {
        &self.economic_display
    }

    pub fn population_map_active(&self) -> bool {
        self.population_map_active
    }

    pub fn map_url(&self) -> Option<&str> {
        self.map_url.as_deref()
    }

    pub fn adoption_rate_percent(&self) -> u32 {
        self.adoption_rate_percent
    }

    pub fn arpu_monthly(&self) -> u32 {
        self.arpu_monthly
    }

    pub fn hover_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}
