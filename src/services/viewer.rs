//! Viewer - owns all client state and routes results back into it
//!
//! Network work runs on spawned tasks that report through one mpsc
//! channel. The render loop drains that channel once per frame, so every
//! mutation happens on the task that owns the viewer and a frame never
//! sees a half-applied snapshot.

use crate::domain::clock::{Direction, SimulationClock};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::api::SimulationApi;
use crate::services::gateway::{SnapshotGateway, SnapshotRequest, SnapshotResponse};
use crate::services::interaction::{Interaction, QueryOutcome, QueryResult};
use crate::services::playback::Playback;
use crate::services::scene::Scene;
use crate::services::session::Session;
use crate::services::synchronizer::{ApplyOutcome, SceneSynchronizer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Results delivered to the owning task
#[derive(Debug)]
pub enum ViewerEvent {
    Snapshot(SnapshotResponse),
    Query(QueryResult),
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct Viewer {
    api: Arc<dyn SimulationApi>,
    events: mpsc::Sender<ViewerEvent>,
    playback: Playback,
    scene: Scene,
    synchronizer: SceneSynchronizer,
    interaction: Interaction,
    session: Session,
    metrics: Arc<Metrics>,
}

impl Viewer {
    pub fn new(
        config: &Config,
        api: Arc<dyn SimulationApi>,
        metrics: Arc<Metrics>,
    ) -> (Self, mpsc::Receiver<ViewerEvent>) {
        let (events, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let clock = SimulationClock::new(
            config.speed_multiplier(),
            config.direction(),
            config.start_playing(),
        );
        let playback = Playback::new(
            clock,
            SnapshotGateway::new(metrics.clone()),
            config.spotbeam_radius_km(),
        );
        let interaction = Interaction::new(
            api.clone(),
            events.clone(),
            metrics.clone(),
            Duration::from_millis(config.hover_debounce_ms()),
            config.population_radius_km(),
            config.adoption_rate_percent(),
            config.arpu_monthly(),
        );
        let viewer = Self {
            api,
            events,
            playback,
            scene: Scene::new(config.trail_max_points()),
            synchronizer: SceneSynchronizer::new(metrics.clone()),
            interaction,
            session: Session::new(metrics.clone()),
            metrics,
        };
        (viewer, event_rx)
    }

    /// Fetch the snapshot for the starting time
    pub fn start(&mut self) {
        info!(
            session = %self.session.id(),
            speed = %self.playback.clock().speed_multiplier(),
            direction = %self.playback.clock().direction().as_str(),
            playing = %self.playback.clock().is_playing(),
            "viewer_started"
        );
        let request = self.playback.request_now();
        self.spawn_snapshot(request);
    }

    fn spawn_snapshot(&self, request: SnapshotRequest) {
        let api = self.api.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let response = request.send(api.as_ref()).await;
            if events.send(ViewerEvent::Snapshot(response)).await.is_err() {
                debug!(tick = %request.tick, "snapshot_dropped");
            }
        });
    }

    /// Per-frame simulation step; never waits on the network
    pub fn on_frame(&mut self, now: Instant) {
        self.metrics.record_frame();
        if let Some(request) = self.playback.on_frame(now) {
            self.spawn_snapshot(request);
        }
    }

    pub fn handle_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::Snapshot(response) => {
                self.playback.on_response(&response);
                // A failed fetch leaves the scene as it was
                if let Ok(update) = response.result {
                    if self.synchronizer.apply(&mut self.scene, update) == ApplyOutcome::Applied {
                        debug!(tick = %response.tick, "scene_synchronized");
                    }
                }
            }
            ViewerEvent::Query(result) => {
                let outcome = self.interaction.handle_result(result);
                if let QueryOutcome::SatelliteReplaced(name) = outcome {
                    self.session.reset(
                        &mut self.playback,
                        &mut self.scene,
                        &mut self.synchronizer,
                        &mut self.interaction,
                    );
                    info!(name = %name, "fetching_initial_snapshot");
                    let request = self.playback.request_now();
                    self.spawn_snapshot(request);
                }
            }
        }
    }

    /// Apply every result that has arrived so far
    pub fn drain_events(&mut self, event_rx: &mut mpsc::Receiver<ViewerEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = event_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn toggle_play(&mut self) -> bool {
        self.playback.toggle_play()
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.playback.set_direction(direction);
    }

    pub fn set_speed(&mut self, multiplier: f64) -> bool {
        self.playback.set_speed(multiplier)
    }

    /// Validate pin input and place the marker
    pub fn place_pin(&mut self, lat: &str, lon: &str) -> bool {
        match self.interaction.submit_pin(lat, lon) {
            Some(at) => {
                info!(lat = %at.lat, lon = %at.lon, "pin_placed");
                self.scene.place_pin(at);
                true
            }
            None => false,
        }
    }

    pub fn clock(&self) -> &SimulationClock {
        self.playback.clock()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn synchronizer(&self) -> &SceneSynchronizer {
        &self.synchronizer
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut Interaction {
        &mut self.interaction
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TickId;
    use crate::services::test_support::StubApi;

    fn viewer(config: Config) -> (Viewer, mpsc::Receiver<ViewerEvent>, Arc<StubApi>) {
        let api = Arc::new(StubApi::new());
        let (viewer, rx) = Viewer::new(&config, api.clone(), Arc::new(Metrics::new()));
        (viewer, rx, api)
    }

    async fn pump(viewer: &mut Viewer, rx: &mut mpsc::Receiver<ViewerEvent>) {
        if let Some(event) = rx.recv().await {
            viewer.handle_event(event);
        }
    }

    #[tokio::test]
    async fn test_start_fetches_initial_snapshot() {
        let (mut viewer, mut rx, api) = viewer(Config::default().with_start_playing(false));
        viewer.start();
        pump(&mut viewer, &mut rx).await;
        assert_eq!(api.position_calls(), 1);
        assert!(viewer.scene().satellite().is_some());
        assert_eq!(viewer.scene().time_display(), "Day 00 / Hour 00:00:00");
        assert_eq!(viewer.scene().utc_display(), "UTC: Tue, 01 Jan 2030 00:00:00 GMT");
    }

    #[tokio::test]
    async fn test_fetch_failure_pauses_and_skips_sync() {
        let (mut viewer, mut rx, api) = viewer(Config::default());
        api.fail_position(true);
        viewer.on_frame(Instant::now());
        pump(&mut viewer, &mut rx).await;

        assert!(!viewer.clock().is_playing());
        assert!(viewer.scene().satellite().is_none());
        assert_eq!(viewer.metrics().snapshots_applied(), 0);
        assert_eq!(viewer.metrics().snapshots_failed(), 1);

        // Paused: frames keep rendering without new requests
        viewer.on_frame(Instant::now());
        assert_eq!(api.position_calls(), 1);
        assert_eq!(viewer.metrics().frames_total(), 2);
    }

    #[tokio::test]
    async fn test_frames_drive_ticks_one_at_a_time() {
        let (mut viewer, mut rx, api) = viewer(Config::default());
        let start = Instant::now();
        viewer.on_frame(start);
        viewer.on_frame(start + Duration::from_millis(16));
        pump(&mut viewer, &mut rx).await;
        assert_eq!(api.position_calls(), 1);

        viewer.on_frame(start + Duration::from_millis(33));
        pump(&mut viewer, &mut rx).await;
        assert_eq!(api.position_calls(), 2);
        assert_eq!(viewer.scene().trail().len(), 2);
        assert_eq!(viewer.synchronizer().last_data().map(|d| d.tick), Some(TickId(2)));
    }

    #[tokio::test]
    async fn test_satellite_replacement_resets_and_refetches() {
        let (mut viewer, mut rx, api) = viewer(Config::default());
        let start = Instant::now();
        viewer.on_frame(start);
        pump(&mut viewer, &mut rx).await;
        viewer.on_frame(start + Duration::from_secs(2));
        pump(&mut viewer, &mut rx).await;
        assert!(viewer.place_pin("10", "20"));
        assert_eq!(viewer.scene().trail().len(), 2);

        let first_session = viewer.session().id();
        viewer.interaction_mut().submit_tle("STUBSAT\n1 00001U\n2 00001");
        pump(&mut viewer, &mut rx).await;

        assert_ne!(viewer.session().id(), first_session);
        assert_eq!(viewer.clock().elapsed_seconds(), 0.0);
        assert!(viewer.scene().trail().is_empty());
        assert!(viewer.scene().pin().is_none());
        assert_eq!(viewer.interaction().notice(), Some("Successfully loaded satellite: STUBSAT"));

        // T=0 snapshot for the new satellite
        pump(&mut viewer, &mut rx).await;
        assert_eq!(viewer.scene().trail().len(), 1);
        let last = viewer.synchronizer().last_data().map(|d| d.snapshot.elapsed_seconds);
        assert_eq!(last, Some(0.0));
        assert_eq!(api.position_calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_pin_leaves_scene_untouched() {
        let (mut viewer, _rx, _api) = viewer(Config::default());
        assert!(!viewer.place_pin("100", "0"));
        assert!(viewer.scene().pin().is_none());
        assert!(viewer.interaction().notice().is_some());
    }
}
