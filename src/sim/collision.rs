//! Pairwise overlap resolution and merge detection
//!
//! Every pass separates overlapping circles, transfers momentum when at
//! least one of them is moving, and queues equal-rank pairs as merge
//! candidates. Candidates are never applied here: the live set is not
//! restructured while a scan is in progress.

use glam::Vec2;

use super::integrate::clamp_all;
use super::math::{elastic_exchange, mass_of, rotate_into, rotate_out_of};
use super::ranks::RankTable;
use super::spatial::{UniformGrid, all_pairs};
use super::state::{Body, Field, Motion};
use crate::tuning::{BroadPhase, Tuning};

/// Two body ids queued for merging at the end of the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCandidate {
    pub a: u32,
    pub b: u32,
}

/// Run all resolver passes over the live set
///
/// Returns merge candidates in discovery order, without exact duplicates.
pub fn resolve(
    bodies: &mut [Body],
    field: Field,
    tuning: &Tuning,
    ranks: &RankTable,
) -> Vec<MergeCandidate> {
    let mut candidates = Vec::new();
    if bodies.len() < 2 {
        return candidates;
    }

    for _ in 0..tuning.collision_iterations {
        let pairs = match tuning.broad_phase {
            BroadPhase::BruteForce => all_pairs(bodies.len()),
            BroadPhase::UniformGrid => UniformGrid::build(bodies, field).potential_pairs(),
        };

        for (i, j) in pairs {
            let (a, b) = pair_mut(bodies, i, j);
            if resolve_pair(a, b, tuning, ranks) {
                let candidate = MergeCandidate { a: a.id, b: b.id };
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        clamp_all(bodies, field);
    }

    candidates
}

/// Resolve one pair; returns true when it should be queued for merging
pub fn resolve_pair(a: &mut Body, b: &mut Body, tuning: &Tuning, ranks: &RankTable) -> bool {
    let delta = a.pos - b.pos;
    let distance = delta.length();
    let reach = a.radius + b.radius;

    // Coincident centers have no collision normal
    if distance >= reach || distance <= 0.0 {
        return false;
    }

    let overlap = reach - distance;
    let normal = delta / distance;

    // Larger body moves less
    let push = overlap.max(tuning.min_separation);
    a.pos += normal * push * (b.radius / reach);
    b.pos -= normal * push * (a.radius / reach);

    if a.is_falling() || b.is_falling() {
        exchange_momentum(a, b, normal);
        if a.is_falling() && b.is_settled() {
            react_settled(b, a, tuning);
        } else if b.is_falling() && a.is_settled() {
            react_settled(a, b, tuning);
        }
    }

    is_merge_candidate(a, b, overlap, tuning, ranks)
}

/// Elastic exchange along the collision normal (mass ∝ r²)
///
/// Only falling bodies take the result; a settled body acts as a resting
/// mass. Pairs that are already separating are left alone.
fn exchange_momentum(a: &mut Body, b: &mut Body, normal: Vec2) {
    let angle = normal.y.atan2(normal.x);
    let ua = rotate_into(a.vel, angle);
    let ub = rotate_into(b.vel, angle);

    // normal points from b to a, so closing means a moves toward -normal
    if ua.x - ub.x >= 0.0 {
        return;
    }

    let (va, vb) = elastic_exchange(ua.x, mass_of(a.radius), ub.x, mass_of(b.radius));
    if a.is_falling() {
        a.vel = rotate_out_of(Vec2::new(va, ua.y), angle);
    }
    if b.is_falling() {
        b.vel = rotate_out_of(Vec2::new(vb, ub.y), angle);
    }
}

/// Settled neighbor of a falling body: nudge it loose, or let the falling
/// body come to rest on it
fn react_settled(settled: &mut Body, falling: &mut Body, tuning: &Tuning) {
    let threshold = tuning.velocity_threshold;

    // Equal ranks are left undisturbed so merge detection sees them at rest
    if settled.rank != falling.rank {
        let nudge = falling.vel * tuning.settled_nudge_ratio;
        if nudge.length() > threshold {
            settled.vel = nudge;
            settled.motion = Motion::Falling;
            return;
        }
    }

    // Resting on top of settled material
    let supported = settled.pos.y > falling.pos.y;
    if supported && falling.vel.x.abs() < threshold && falling.vel.y.abs() < threshold {
        falling.settle();
    }
}

fn is_merge_candidate(
    a: &Body,
    b: &Body,
    overlap: f32,
    tuning: &Tuning,
    ranks: &RankTable,
) -> bool {
    if a.rank != b.rank || !ranks.can_merge(a.rank) {
        return false;
    }

    let relative_speed = (a.vel - b.vel).length();
    let both_resting = a.vel.length() < tuning.rest_speed_threshold
        && b.vel.length() < tuning.rest_speed_threshold;
    let deep = overlap / (a.radius + b.radius) > tuning.merge_overlap_ratio;

    relative_speed < tuning.merge_speed_threshold || both_resting || deep
}

/// Two distinct mutable bodies out of one slice
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert_ne!(i, j);
    if i < j {
        let (lo, hi) = bodies.split_at_mut(j);
        (&mut lo[i], &mut hi[0])
    } else {
        let (lo, hi) = bodies.split_at_mut(i);
        (&mut hi[0], &mut lo[j])
    }
}
