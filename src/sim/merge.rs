//! Merge reducer
//!
//! Applies the tick's queued merge candidates as one batch. Each body takes
//! part in at most one merge per tick; the first candidate that names it wins.

use std::collections::HashSet;

use glam::Vec2;

use super::collision::MergeCandidate;
use super::state::{GameEvent, GameState, Motion};

/// Apply merges and return the ids of the bodies they produced
pub fn apply_merges(state: &mut GameState, candidates: &[MergeCandidate]) -> Vec<u32> {
    let mut consumed: HashSet<u32> = HashSet::new();
    let mut accepted: Vec<(usize, Vec2)> = Vec::new();

    for candidate in candidates {
        if candidate.a == candidate.b
            || consumed.contains(&candidate.a)
            || consumed.contains(&candidate.b)
        {
            continue;
        }
        // Stale candidate: one side no longer exists
        let (Some(a), Some(b)) = (state.body(candidate.a), state.body(candidate.b)) else {
            continue;
        };
        if a.rank != b.rank || !state.ranks.can_merge(a.rank) {
            continue;
        }

        accepted.push((a.rank + 1, (a.pos + b.pos) * 0.5));
        consumed.insert(candidate.a);
        consumed.insert(candidate.b);
    }

    if accepted.is_empty() {
        return Vec::new();
    }

    state.bodies.retain(|b| !consumed.contains(&b.id));

    let mut produced = Vec::with_capacity(accepted.len());
    for (rank, midpoint) in accepted {
        let id = state.spawn_body(rank, midpoint, Vec2::ZERO, Motion::Settled);
        let points = state.ranks.score(rank);
        state.award(points);

        let pos = state.body(id).map(|b| b.pos).unwrap_or(midpoint);
        state.events.push(GameEvent::Merged {
            id,
            rank,
            pos,
            points,
        });
        log::debug!("Merged into rank {rank} at ({:.1}, {:.1}) for {points}", pos.x, pos.y);
        produced.push(id);
    }

    produced
}
