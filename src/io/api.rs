//! HTTP client for the orbit simulation service
//!
//! All routes live under `{base_url}/api`. Non-2xx responses become
//! [`ApiError::Status`] carrying the server's `{ "error": ... }` message when
//! one is present; 2xx bodies that only carry `error` become
//! [`ApiError::Server`].

use crate::domain::types::{EconomicParams, EconomicReport, LatLon, Snapshot, TleLines};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {status}")]
    Status { status: u16, message: Option<String> },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Server(String),
}

impl ApiError {
    /// Message suitable for an operator notice
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message: Some(message), .. } => message.clone(),
            ApiError::Server(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Contract the viewer needs from the simulation service
#[async_trait]
pub trait SimulationApi: Send + Sync {
    async fn position(&self, elapsed_seconds: f64, radius_km: f64) -> Result<Snapshot, ApiError>;

    /// Path of the population density overlay image
    async fn population_density(&self) -> Result<String, ApiError>;

    async fn population_estimate(&self, at: LatLon, radius_km: f64) -> Result<f64, ApiError>;

    async fn coverage_score(&self) -> Result<f64, ApiError>;

    async fn coverage_area(&self) -> Result<f64, ApiError>;

    async fn economic_analysis(&self, params: EconomicParams) -> Result<EconomicReport, ApiError>;

    /// Replace the simulated satellite; returns its name
    async fn update_tle(&self, tle: &TleLines) -> Result<String, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct PopulationDensityBody {
    map_url: String,
}

#[derive(Deserialize)]
struct PopulationEstimateBody {
    estimated_population: f64,
}

#[derive(Deserialize)]
struct CoverageScoreBody {
    coverage_score: Option<f64>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct CoverageAreaBody {
    coverage_area_km2: Option<f64>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct UpdateTleBody {
    name: Option<String>,
    error: Option<String>,
}

fn value_or_error<T>(value: Option<T>, error: Option<String>, field: &str) -> Result<T, ApiError> {
    match (value, error) {
        (Some(value), _) => Ok(value),
        (None, Some(error)) => Err(ApiError::Server(error)),
        (None, None) => Err(ApiError::Server(format!("response missing {}", field))),
    }
}

/// Economic analysis body: numeric metrics in server order, or `{ "error": ... }`
fn parse_economic_report(body: &[u8]) -> Result<EconomicReport, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let serde_json::Value::Object(map) = value else {
        return Err(ApiError::Server("economic analysis returned a non-object body".to_string()));
    };
    if let Some(serde_json::Value::String(error)) = map.get("error") {
        return Err(ApiError::Server(error.clone()));
    }
    let metrics = map
        .into_iter()
        .filter_map(|(key, value)| value.as_f64().map(|number| (key, number)))
        .collect();
    Ok(EconomicReport { metrics })
}

/// reqwest-backed implementation
#[derive(Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        // Client is built once for reuse (connection pooling)
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::check(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let body = self.get_bytes(path, query).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Body bytes of a 2xx response, otherwise a status error
    async fn check(response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body).ok().map(|b| b.error);
            debug!(status = %status.as_u16(), message = ?message, "api_status_error");
            return Err(ApiError::Status { status: status.as_u16(), message });
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl SimulationApi for HttpApi {
    async fn position(&self, elapsed_seconds: f64, radius_km: f64) -> Result<Snapshot, ApiError> {
        self.get_json(
            "/position",
            &[
                ("elapsed_seconds", elapsed_seconds.to_string()),
                ("radius_km", radius_km.to_string()),
            ],
        )
        .await
    }

    async fn population_density(&self) -> Result<String, ApiError> {
        let body: PopulationDensityBody = self.get_json("/population-density", &[]).await?;
        Ok(body.map_url)
    }

    async fn population_estimate(&self, at: LatLon, radius_km: f64) -> Result<f64, ApiError> {
        let body: PopulationEstimateBody = self
            .get_json(
                "/population-estimate",
                &[
                    ("lat", at.lat.to_string()),
                    ("lon", at.lon.to_string()),
                    ("radius_km", radius_km.to_string()),
                ],
            )
            .await?;
        Ok(body.estimated_population)
    }

    async fn coverage_score(&self) -> Result<f64, ApiError> {
        let body: CoverageScoreBody = self.get_json("/coverage-score", &[]).await?;
        value_or_error(body.coverage_score, body.error, "coverage_score")
    }

    async fn coverage_area(&self) -> Result<f64, ApiError> {
        let body: CoverageAreaBody = self.get_json("/coverage-area", &[]).await?;
        value_or_error(body.coverage_area_km2, body.error, "coverage_area_km2")
    }

    async fn economic_analysis(&self, params: EconomicParams) -> Result<EconomicReport, ApiError> {
        let body = self
            .get_bytes(
                "/economic-analysis",
                &[
                    ("population", params.population.to_string()),
                    ("area_km2", params.area_km2.to_string()),
                    ("adoption_rate", params.adoption_rate.to_string()),
                    ("arpu_monthly", params.arpu_monthly.to_string()),
                ],
            )
            .await?;
        parse_economic_report(&body)
    }

    async fn update_tle(&self, tle: &TleLines) -> Result<String, ApiError> {
        let response = self.client.post(self.url("/update-tle")).json(tle).send().await?;
        let body = Self::check(response).await?;
        let body: UpdateTleBody = serde_json::from_slice(&body)?;
        value_or_error(body.name, body.error, "name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ApiError::Status { status: 400, message: Some("Invalid TLE".to_string()) };
        assert_eq!(err.user_message(), "Invalid TLE");

        let err = ApiError::Status { status: 503, message: None };
        assert_eq!(err.user_message(), "HTTP error! status: 503");

        assert_eq!(ApiError::Server("no satellite".to_string()).user_message(), "no satellite");
    }

    #[test]
    fn test_value_or_error() {
        assert_eq!(value_or_error(Some(3.0), None, "x").unwrap(), 3.0);
        let err = value_or_error::<f64>(None, Some("not ready".to_string()), "x").unwrap_err();
        assert_eq!(err.user_message(), "not ready");
        let err = value_or_error::<f64>(None, None, "coverage_score").unwrap_err();
        assert_eq!(err.user_message(), "response missing coverage_score");
    }

    #[test]
    fn test_parse_economic_report_keeps_numeric_metrics() {
        let body = br#"{"subscribers": 1500, "monthly_revenue_usd": 75000.5, "currency": "USD"}"#;
        let report = parse_economic_report(body).unwrap();
        assert_eq!(
            report.metrics,
            vec![
                ("subscribers".to_string(), 1500.0),
                ("monthly_revenue_usd".to_string(), 75000.5),
            ]
        );
    }

    #[test]
    fn test_parse_economic_report_keeps_server_order() {
        let body = br#"{"Zeta": 1, "Alpha": 2, "Mid": 3.5}"#;
        let report = parse_economic_report(body).unwrap();
        let names: Vec<&str> = report.metrics.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_parse_economic_report_error_body() {
        let err =
            parse_economic_report(br#"{"error": "population must be positive"}"#).unwrap_err();
        assert_eq!(err.user_message(), "population must be positive");
    }

    #[test]
    fn test_url_joins_api_prefix() {
        let api = HttpApi::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("/position"), "http://localhost:5000/api/position");
    }
}
