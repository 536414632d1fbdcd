//! Domain models - playback state and snapshot types
//!
//! This module contains the canonical data types used throughout the viewer:
//! - `SimulationClock` - simulated elapsed time, direction, speed, play state
//! - `Snapshot` - one server sample of satellite position and footprint
//! - `TrailBuffer` - bounded ground-track history
//! - `CoverageCache` - coverage results that gate the economic analysis
//! - `format` - text readouts (day counter, UTC, thousands grouping)

pub mod clock;
pub mod coverage;
pub mod format;
pub mod trail;
pub mod types;

// Re-export commonly used types at module level
pub use clock::{Direction, SimulationClock};
pub use coverage::CoverageCache;
pub use trail::TrailBuffer;
pub use types::{
    EconomicParams, EconomicReport, InputError, LatLon, Snapshot, TickId, TickSnapshot, TleLines,
};
