//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed step per tick
//! - Seeded RNG only
//! - Stable iteration order (insertion order, row-major grid cells)
//! - No rendering or platform dependencies

pub mod collision;
pub mod integrate;
pub mod math;
pub mod merge;
pub mod ranks;
pub mod sentinel;
pub mod spatial;
pub mod state;
pub mod tick;

pub use collision::{MergeCandidate, resolve, resolve_pair};
pub use integrate::{integrate, is_supported, wake_unsupported};
pub use merge::apply_merges;
pub use ranks::{RankDefinition, RankTable};
pub use sentinel::crossed_danger_line;
pub use spatial::UniformGrid;
pub use state::{AimingBody, Body, Field, GameEvent, GamePhase, GameState, Motion};
pub use tick::{TickInput, tick};
