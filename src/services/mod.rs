//! Services - playback state machine and interaction logic
//!
//! This module contains the core client services:
//! - `viewer` - Owns all state and routes async results back into it
//! - `playback` - Advances simulated time and drives snapshot requests
//! - `gateway` - Tick-tagged snapshot fetches, one in flight
//! - `synchronizer` - Applies snapshots to the scene, drops stale ticks
//! - `scene` - Visual state and owned resource slots
//! - `interaction` - Hover/click/query handling with debounced estimates
//! - `session` - Reset after a satellite definition change

pub mod gateway;
pub mod interaction;
pub mod playback;
pub mod scene;
pub mod session;
pub mod synchronizer;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use gateway::{SnapshotGateway, SnapshotRequest, SnapshotResponse};
pub use interaction::{Control, Debouncer, Interaction, QueryOutcome, QueryResult};
pub use playback::Playback;
pub use scene::{Scene, Slot};
pub use session::Session;
pub use synchronizer::{ApplyOutcome, SceneSynchronizer};
pub use viewer::{Viewer, ViewerEvent};
