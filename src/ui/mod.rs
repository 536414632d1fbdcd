//! Terminal UI - render loop surface for the viewer
//!
//! - `app` - Application state, key and mouse handling
//! - `draw` - Frame rendering with ratatui
//! - `projection` - Orthographic globe projection and camera

pub mod app;
pub mod draw;
pub mod projection;

pub use app::App;
pub use draw::draw_ui;
