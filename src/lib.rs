//! Melon Merge - a merge-fruits drop game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, collisions, merges, game over)
//! - `session`: Session controller and host collaborator traits
//! - `persistence`: Best-score storage
//! - `tuning`: Data-driven game balance
//! - `web`: Browser bindings (wasm32 only)

pub mod error;
pub mod persistence;
pub mod session;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{Error, Result};
pub use session::{Collaborators, FrameView, Session, Snapshot};
pub use tuning::{BroadPhase, Tuning};

/// Game configuration constants
pub mod consts {
    /// Duration of one simulation tick (one animation frame at 60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Reference field dimensions (2:3 portrait well)
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
}
