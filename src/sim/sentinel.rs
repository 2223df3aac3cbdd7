//! Game-over detection

use super::state::Body;

/// First settled body whose top edge is above the danger line
///
/// Falling bodies are ignored: passing the line on the way down is fine.
pub fn crossed_danger_line(bodies: &[Body], danger_y: f32) -> Option<u32> {
    bodies
        .iter()
        .find(|b| b.is_settled() && b.top() < danger_y)
        .map(|b| b.id)
}
