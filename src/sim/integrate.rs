//! Per-tick integration of falling bodies
//!
//! Gravity, damping, wall and floor reflection. A body only comes to rest on
//! a floor contact; slowing down in open air never freezes it. Settled
//! bodies that lose what held them up fall again.

use glam::Vec2;

use super::state::{Body, Field, Motion};
use crate::tuning::Tuning;

/// Advance every falling body by one tick
pub fn integrate(bodies: &mut [Body], field: Field, tuning: &Tuning) {
    for body in bodies.iter_mut().filter(|b| b.is_falling()) {
        step_body(body, field, tuning);
    }
}

/// Integrate a single body and apply the field boundaries
pub fn step_body(body: &mut Body, field: Field, tuning: &Tuning) {
    body.vel.y += tuning.gravity;
    body.vel *= tuning.damping;
    body.pos += body.vel;

    let r = body.radius;

    // Walls
    if body.pos.x - r < 0.0 {
        body.pos.x = r;
        body.vel.x = -body.vel.x * tuning.wall_restitution;
    }
    if body.pos.x + r > field.width {
        body.pos.x = field.width - r;
        body.vel.x = -body.vel.x * tuning.wall_restitution;
    }

    // Floor
    if body.pos.y + r > field.height {
        body.pos.y = field.height - r;
        body.vel.y = -body.vel.y * tuning.floor_restitution;

        let threshold = tuning.velocity_threshold;
        if body.vel.x.abs() < threshold && body.vel.y.abs() < threshold {
            body.settle();
        }
    }
}

/// Drop bodies that escaped the field (or went non-finite)
///
/// Returns how many were removed.
pub fn cull_escaped(bodies: &mut Vec<Body>, field: Field, margin: f32) -> usize {
    let before = bodies.len();
    bodies.retain(|b| !field.escaped(b.pos, b.radius, margin));
    let removed = before - bodies.len();
    if removed > 0 {
        log::warn!("Discarded {removed} bodies that left the field");
    }
    removed
}

/// Clamp every body center into the field
pub fn clamp_all(bodies: &mut [Body], field: Field) {
    for body in bodies.iter_mut() {
        body.pos = field.clamp(body.pos, body.radius);
        if !body.vel.is_finite() {
            body.vel = Vec2::ZERO;
        }
    }
}

/// Whether settled body `index` rests on the floor or on settled material
/// below it, allowing `gap` of slack on every contact
pub fn is_supported(bodies: &[Body], index: usize, field: Field, gap: f32) -> bool {
    let body = &bodies[index];
    if body.pos.y + body.radius >= field.height - gap {
        return true;
    }
    bodies.iter().enumerate().any(|(j, other)| {
        j != index
            && other.is_settled()
            && other.pos.y > body.pos.y
            && body.pos.distance(other.pos) <= body.radius + other.radius + gap
    })
}

/// Release settled bodies that lost their support (the body under them
/// merged away or was nudged loose)
///
/// Repeats until stable so a whole column above a gap falls together.
/// Returns how many bodies were woken.
pub fn wake_unsupported(bodies: &mut [Body], field: Field, gap: f32) -> usize {
    let mut woken = 0;
    loop {
        let mut changed = false;
        for i in 0..bodies.len() {
            if bodies[i].is_settled() && !is_supported(bodies, i, field, gap) {
                bodies[i].motion = Motion::Falling;
                changed = true;
                woken += 1;
            }
        }
        if !changed {
            break;
        }
    }
    if woken > 0 {
        log::trace!("Woke {woken} unsupported bodies");
    }
    woken
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(pos: Vec2, vel: Vec2) -> Body {
        Body {
            id: 1,
            pos,
            vel,
            radius: 15.0,
            rank: 0,
            motion: Motion::Falling,
        }
    }

    fn field() -> Field {
        Field::new(400.0, 600.0)
    }

    #[test]
    fn test_gravity_and_damping() {
        let tuning = Tuning::default();
        let mut body = body_at(Vec2::new(200.0, 100.0), Vec2::new(2.0, 0.0));
        step_body(&mut body, field(), &tuning);
        assert!((body.vel.y - 0.5 * 0.98).abs() < 1e-6);
        assert!((body.vel.x - 2.0 * 0.98).abs() < 1e-6);
        assert!((body.pos.y - (100.0 + 0.49)).abs() < 1e-4);
    }

    #[test]
    fn test_open_air_never_settles() {
        let tuning = Tuning::default();
        // Practically zero velocity, far above the floor
        let mut body = body_at(Vec2::new(200.0, 100.0), Vec2::ZERO);
        step_body(&mut body, field(), &tuning);
        assert!(body.is_falling());
    }

    #[test]
    fn test_wall_reflection() {
        let tuning = Tuning::default();
        let mut body = body_at(Vec2::new(16.0, 100.0), Vec2::new(-10.0, 0.0));
        step_body(&mut body, field(), &tuning);
        assert_eq!(body.pos.x, 15.0);
        assert!(body.vel.x > 0.0);
        assert!((body.vel.x - 10.0 * 0.98 * 0.4).abs() < 1e-4);

        let mut body = body_at(Vec2::new(384.0, 100.0), Vec2::new(10.0, 0.0));
        step_body(&mut body, field(), &tuning);
        assert_eq!(body.pos.x, 385.0);
        assert!(body.vel.x < 0.0);
    }

    #[test]
    fn test_fast_floor_hit_bounces() {
        let tuning = Tuning::default();
        let mut body = body_at(Vec2::new(200.0, 580.0), Vec2::new(0.0, 10.0));
        step_body(&mut body, field(), &tuning);
        assert_eq!(body.pos.y, 585.0);
        assert!(body.vel.y < 0.0);
        assert!(body.is_falling());
    }

    #[test]
    fn test_slow_floor_hit_settles() {
        let tuning = Tuning::default();
        let mut body = body_at(Vec2::new(200.0, 584.9), Vec2::new(0.0, 0.3));
        step_body(&mut body, field(), &tuning);
        assert!(body.is_settled());
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_sliding_body_does_not_settle() {
        let tuning = Tuning::default();
        let mut body = body_at(Vec2::new(200.0, 584.9), Vec2::new(3.0, 0.3));
        step_body(&mut body, field(), &tuning);
        assert!(body.is_falling(), "horizontal speed keeps it moving");
    }

    #[test]
    fn test_settled_bodies_are_not_integrated() {
        let tuning = Tuning::default();
        let mut bodies = vec![body_at(Vec2::new(200.0, 100.0), Vec2::ZERO)];
        bodies[0].motion = Motion::Settled;
        integrate(&mut bodies, field(), &tuning);
        assert_eq!(bodies[0].pos, Vec2::new(200.0, 100.0));
    }

    #[test]
    fn test_cull_and_clamp() {
        let mut bodies = vec![
            body_at(Vec2::new(200.0, 900.0), Vec2::ZERO),
            body_at(Vec2::new(f32::NAN, 10.0), Vec2::ZERO),
            body_at(Vec2::new(-5.0, 650.0), Vec2::ZERO),
        ];
        assert_eq!(cull_escaped(&mut bodies, field(), 100.0), 2);
        clamp_all(&mut bodies, field());
        assert_eq!(bodies[0].pos, Vec2::new(15.0, 585.0));
    }

    fn settled_at(id: u32, radius: f32, pos: Vec2) -> Body {
        Body {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            rank: 0,
            motion: Motion::Settled,
        }
    }

    #[test]
    fn test_floor_and_stack_support() {
        let bodies = vec![
            settled_at(1, 20.0, Vec2::new(200.0, 580.0)),
            // Diagonally on top of the first, touching
            settled_at(2, 15.0, Vec2::new(170.0, 580.0 - (35.0_f32 * 35.0 - 900.0).sqrt())),
            // Hovering well clear of everything
            settled_at(3, 15.0, Vec2::new(350.0, 300.0)),
        ];
        assert!(is_supported(&bodies, 0, field(), 1.0));
        assert!(is_supported(&bodies, 1, field(), 1.0));
        assert!(!is_supported(&bodies, 2, field(), 1.0));
    }

    #[test]
    fn test_neighbor_above_is_not_support() {
        let bodies = vec![
            settled_at(1, 15.0, Vec2::new(200.0, 400.0)),
            settled_at(2, 15.0, Vec2::new(200.0, 370.0)),
        ];
        assert!(!is_supported(&bodies, 0, field(), 1.0));
    }

    #[test]
    fn test_falling_neighbor_is_not_support() {
        let mut bodies = vec![
            settled_at(1, 20.0, Vec2::new(200.0, 580.0)),
            settled_at(2, 15.0, Vec2::new(200.0, 545.0)),
        ];
        bodies[0].motion = Motion::Falling;
        assert!(!is_supported(&bodies, 1, field(), 1.0));
    }

    #[test]
    fn test_wake_releases_whole_column() {
        // A column standing on a body that is no longer settled
        let mut bodies = vec![
            settled_at(1, 15.0, Vec2::new(200.0, 500.0)),
            settled_at(2, 15.0, Vec2::new(200.0, 470.0)),
            settled_at(3, 15.0, Vec2::new(200.0, 440.0)),
            settled_at(4, 15.0, Vec2::new(100.0, 585.0)),
        ];
        bodies[0].motion = Motion::Falling;
        // Listed top-down so one sweep is not enough
        bodies.swap(0, 2);

        assert_eq!(wake_unsupported(&mut bodies, field(), 1.0), 2);
        assert!(bodies.iter().filter(|b| b.id != 4).all(|b| b.is_falling()));
        assert!(bodies.iter().find(|b| b.id == 4).unwrap().is_settled());
    }

    #[test]
    fn test_supported_stack_stays_put() {
        let mut bodies = vec![
            settled_at(1, 20.0, Vec2::new(200.0, 580.0)),
            settled_at(2, 15.0, Vec2::new(200.0, 545.0)),
        ];
        let before = bodies.clone();
        assert_eq!(wake_unsupported(&mut bodies, field(), 1.0), 0);
        assert_eq!(bodies, before);
    }
}
