//! Integration tests for configuration loading

use orbit_viewer::domain::clock::Direction;
use orbit_viewer::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[api]
base_url = "http://sim.internal:8080/"
timeout_ms = 2500

[playback]
speed_multiplier = 500.0
direction = "reverse"
start_playing = false
spotbeam_radius_km = 900.0
frame_rate_hz = 60

[interaction]
hover_debounce_ms = 350
population_radius_km = 2.5
adoption_rate_percent = 12
arpu_monthly = 80

[trail]
max_points = 250

[logging]
file = "/tmp/viewer-test.log"

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.api_base_url(), "http://sim.internal:8080");
    assert_eq!(config.api_timeout_ms(), 2500);
    assert_eq!(config.speed_multiplier(), 500.0);
    assert_eq!(config.direction(), Direction::Reverse);
    assert!(!config.start_playing());
    assert_eq!(config.spotbeam_radius_km(), 900.0);
    assert_eq!(config.frame_rate_hz(), 60);
    assert_eq!(config.hover_debounce_ms(), 350);
    assert_eq!(config.population_radius_km(), 2.5);
    assert_eq!(config.adoption_rate_percent(), 12);
    assert_eq!(config.arpu_monthly(), 80);
    assert_eq!(config.trail_max_points(), 250);
    assert_eq!(config.log_file(), "/tmp/viewer-test.log");
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.api_base_url(), "http://127.0.0.1:5000");
    assert_eq!(config.speed_multiplier(), 100.0);
    assert_eq!(config.direction(), Direction::Forward);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_malformed_file_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[playback]\ndirection = \"sideways\"\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
    // The lenient loader falls back instead
    assert_eq!(Config::load_from_path(temp_file.path()).direction(), Direction::Forward);
}

#[test]
fn test_out_of_range_values_are_clamped() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(
            b"[playback]\nframe_rate_hz = 0\n[interaction]\nadoption_rate_percent = 250\n[trail]\nmax_points = 0\n",
        )
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.frame_rate_hz(), 1);
    assert_eq!(config.adoption_rate_percent(), 100);
    assert_eq!(config.trail_max_points(), 1);
}

#[test]
fn test_shipped_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/viewer.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.spotbeam_radius_km(), 1300.0);
    assert_eq!(config.hover_debounce_ms(), 200);
}
