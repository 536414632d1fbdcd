//! Orbit viewer - terminal client for the satellite orbit simulation service
//!
//! Renders the globe, the satellite's ground track and spotbeam footprint,
//! and drives simulated time against the service's `/api` routes.
//!
//! Module structure:
//! - `domain/` - Clock, snapshot types, trail buffer, text formatting
//! - `io/` - HTTP client for the service (and an in-process mock)
//! - `services/` - Playback, fetch gateway, synchronizer, interaction, reset
//! - `infra/` - Config, metrics, logging
//! - `ui/` - Terminal rendering and input

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use orbit_viewer::infra::{logging, Config, Metrics};
use orbit_viewer::io::HttpApi;
use orbit_viewer::services::{Viewer, ViewerEvent};
use orbit_viewer::ui::{draw_ui, App};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

/// Orbit viewer - satellite ground track and coverage explorer
#[derive(Parser, Debug)]
#[command(name = "orbit-viewer", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/viewer.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Simulation service base URL, overriding the config file
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = Config::resolve_config_path(args.config.as_deref());
    let mut config = Config::load_from_path(&config_path);
    if let Some(url) = args.api_url.as_deref() {
        config = config.with_api_base_url(url);
    }

    // The terminal belongs to the UI, so logs go to a file
    logging::init_file(config.log_file())?;
    info!(
        git_hash = env!("GIT_HASH"),
        config_file = %config.config_file(),
        api_base_url = %config.api_base_url(),
        speed = %config.speed_multiplier(),
        direction = %config.direction().as_str(),
        spotbeam_radius_km = %config.spotbeam_radius_km(),
        frame_rate_hz = %config.frame_rate_hz(),
        "orbit_viewer_starting"
    );

    let metrics = Arc::new(Metrics::new());
    let api = HttpApi::new(config.api_base_url(), Duration::from_millis(config.api_timeout_ms()))
        .context("Failed to build HTTP client")?;

    // Start metrics reporter (lock-free reads with full summary)
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        interval.tick().await;
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    let (mut viewer, mut event_rx) = Viewer::new(&config, Arc::new(api), metrics.clone());
    viewer.start();
    let mut app = App::new(viewer);
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(config.frame_rate_hz()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_ui(&mut terminal, &mut app, &mut event_rx, frame_interval);

    reporter.abort();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    metrics.report().log();
    info!("orbit_viewer_shutdown");
    result
}

/// Render loop: apply arrived results, step, draw, then read input until the next frame
fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_rx: &mut mpsc::Receiver<ViewerEvent>,
    frame_interval: Duration,
) -> anyhow::Result<()> {
    loop {
        let frame_start = Instant::now();
        app.viewer.drain_events(event_rx);
        app.on_frame(frame_start);
        terminal.draw(|f| draw_ui(f, app))?;

        let mut timeout = frame_interval.saturating_sub(frame_start.elapsed());
        while event::poll(timeout)? {
            app.handle_event(event::read()?);
            if app.should_quit {
                return Ok(());
            }
            timeout = frame_interval.saturating_sub(frame_start.elapsed());
        }
    }
}
