//! Small vector helpers used by collision response

use glam::Vec2;

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Penetration depth of two circles (positive when overlapping)
#[inline]
pub fn overlap(p1: Vec2, r1: f32, p2: Vec2, r2: f32) -> f32 {
    (r1 + r2) - distance(p1, p2)
}

/// Express `v` in a frame rotated by `angle` (x axis along the angle)
#[inline]
pub fn rotate_into(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos + v.y * sin, v.y * cos - v.x * sin)
}

/// Inverse of [`rotate_into`]
#[inline]
pub fn rotate_out_of(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.y * cos + v.x * sin)
}

/// 1-D elastic collision: returns the post-collision speeds of both bodies
#[inline]
pub fn elastic_exchange(u1: f32, m1: f32, u2: f32, m2: f32) -> (f32, f32) {
    let total = m1 + m2;
    let v1 = ((m1 - m2) * u1 + 2.0 * m2 * u2) / total;
    let v2 = ((m2 - m1) * u2 + 2.0 * m1 * u1) / total;
    (v1, v2)
}

/// Collision mass of a circle (area-proportional)
#[inline]
pub fn mass_of(radius: f32) -> f32 {
    radius * radius
}
