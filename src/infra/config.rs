//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/viewer.toml
//!
//! Every section is optional; missing keys fall back to the defaults below.

use crate::domain::clock::Direction;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "config/viewer.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Simulation service root; routes live under `/api`
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:5000".to_string(), timeout_ms: 10_000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub speed_multiplier: f64,
    pub direction: Direction,
    pub start_playing: bool,
    pub spotbeam_radius_km: f64,
    /// Render loop frame rate
    pub frame_rate_hz: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 100.0,
            direction: Direction::Forward,
            start_playing: true,
            spotbeam_radius_km: 1300.0,
            frame_rate_hz: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Quiet period before a hover triggers a population estimate
    pub hover_debounce_ms: u64,
    pub population_radius_km: f64,
    pub adoption_rate_percent: u32,
    pub arpu_monthly: u32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_debounce_ms: 200,
            population_radius_km: 1.0,
            adoption_rate_percent: 5,
            arpu_monthly: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub max_points: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self { max_points: 1000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file for the TUI (the terminal itself is owned by the UI)
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: "orbit-viewer.log".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub api: ApiConfig,
    pub playback: PlaybackConfig,
    pub interaction: InteractionConfig,
    pub trail: TrailConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    api_base_url: String,
    api_timeout_ms: u64,
    speed_multiplier: f64,
    direction: Direction,
    start_playing: bool,
    spotbeam_radius_km: f64,
    frame_rate_hz: u32,
    hover_debounce_ms: u64,
    population_radius_km: f64,
    adoption_rate_percent: u32,
    arpu_monthly: u32,
    trail_max_points: usize,
    log_file: String,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            api_base_url: toml_config.api.base_url.trim_end_matches('/').to_string(),
            api_timeout_ms: toml_config.api.timeout_ms,
            speed_multiplier: toml_config.playback.speed_multiplier,
            direction: toml_config.playback.direction,
            start_playing: toml_config.playback.start_playing,
            spotbeam_radius_km: toml_config.playback.spotbeam_radius_km,
            frame_rate_hz: toml_config.playback.frame_rate_hz.max(1),
            hover_debounce_ms: toml_config.interaction.hover_debounce_ms,
            population_radius_km: toml_config.interaction.population_radius_km,
            adoption_rate_percent: toml_config.interaction.adoption_rate_percent.min(100),
            arpu_monthly: toml_config.interaction.arpu_monthly,
            trail_max_points: toml_config.trail.max_points.max(1),
            log_file: toml_config.logging.file,
            metrics_interval_secs: toml_config.metrics.interval_secs.max(1),
            config_file,
        }
    }

    /// Determine config file path from the CLI value or environment
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                // Logging is not initialised yet (the log file comes from this config)
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn api_timeout_ms(&self) -> u64 {
        self.api_timeout_ms
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn start_playing(&self) -> bool {
        self.start_playing
    }

    pub fn spotbeam_radius_km(&self) -> f64 {
        self.spotbeam_radius_km
    }

    pub fn frame_rate_hz(&self) -> u32 {
        self.frame_rate_hz
    }

    pub fn hover_debounce_ms(&self) -> u64 {
        self.hover_debounce_ms
    }

    pub fn population_radius_km(&self) -> f64 {
        self.population_radius_km
    }

    pub fn adoption_rate_percent(&self) -> u32 {
        self.adoption_rate_percent
    }

    pub fn arpu_monthly(&self) -> u32 {
        self.arpu_monthly
    }

    pub fn trail_max_points(&self) -> usize {
        self.trail_max_points
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to point the client at a local backend
    pub fn with_api_base_url(mut self, base_url: &str) -> Self {
        self.api_base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Builder method for tests to start paused or playing
    pub fn with_start_playing(mut self, playing: bool) -> Self {
        self.start_playing = playing;
        self
    }
}
