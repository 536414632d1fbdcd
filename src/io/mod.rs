//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `api` - HTTP client for the orbit simulation service
//! - `mock_backend` - In-process mock of that service (hyper server)

pub mod api;
pub mod mock_backend;

// Re-export commonly used types
pub use api::{ApiError, HttpApi, SimulationApi};
pub use mock_backend::MockBackend;
