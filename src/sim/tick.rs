//! Fixed-step simulation tick
//!
//! One call advances the game by one animation frame:
//! aim -> drop -> integrate -> resolve -> merge -> support -> sentinel -> spawn.

use super::collision::resolve;
use super::integrate::{clamp_all, cull_escaped, integrate, wake_unsupported};
use super::merge::apply_merges;
use super::sentinel::crossed_danger_line;
use super::state::{GamePhase, GameState};

/// Input sampled for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Latest horizontal aim coordinate (field space)
    pub aim_x: Option<f32>,
    /// A drop was requested since the last tick
    pub drop: bool,
    /// Timestamp of this frame, used for the drop cooldown
    pub now_ms: f64,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Only a running game simulates
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    if let Some(x) = input.aim_x {
        state.set_aim(x);
    }
    if input.drop {
        if let Some(id) = state.try_drop(input.now_ms) {
            log::trace!("Dropped body {id}");
        }
    }

    let field = state.field;
    integrate(&mut state.bodies, field, &state.tuning);
    cull_escaped(&mut state.bodies, field, state.tuning.escape_margin);
    clamp_all(&mut state.bodies, field);

    let candidates = resolve(&mut state.bodies, field, &state.tuning, &state.ranks);
    apply_merges(state, &candidates);

    // Only material that is actually held up may count against the line
    wake_unsupported(&mut state.bodies, field, state.tuning.support_gap);

    if let Some(id) = crossed_danger_line(&state.bodies, state.danger_y()) {
        log::info!("Body {id} rests above the danger line, final score {}", state.score);
        state.game_over();
        return;
    }

    state.spawn_aiming();
}
