//! Session reset after the satellite definition changes
//!
//! Rewinds the clock, drops every accumulated visual, clears the coverage
//! cache and result texts, and tells the synchronizer to discard responses
//! to requests issued before the reset.

use crate::infra::metrics::Metrics;
use crate::services::interaction::Interaction;
use crate::services::playback::Playback;
use crate::services::scene::Scene;
use crate::services::synchronizer::SceneSynchronizer;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct Session {
    id: Uuid,
    metrics: Arc<Metrics>,
}

impl Session {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { id: Uuid::now_v7(), metrics }
    }

    /// Start a fresh session; completes before any new snapshot is applied
    pub fn reset(
        &mut self,
        playback: &mut Playback,
        scene: &mut Scene,
        synchronizer: &mut SceneSynchronizer,
        interaction: &mut Interaction,
    ) {
        let previous = self.id;
        playback.rewind();
        scene.reset();
        interaction.reset();
        let floor = playback.gateway().last_issued().next();
        synchronizer.discard_before(floor);

        self.id = Uuid::now_v7();
        self.metrics.record_session_reset();
        info!(
            previous_session = %previous,
            session = %self.id,
            discard_before_tick = %floor,
            "session_reset"
        );
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}
