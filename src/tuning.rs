//! Data-driven game balance
//!
//! Every physics and gameplay constant lives in [`Tuning`]. Defaults match the
//! shipped game; a JSON document can override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Broad-phase strategy used by the collision resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BroadPhase {
    /// Test every unordered pair
    BruteForce,
    /// Bucket bodies into a uniform grid and test same/adjacent cells only
    #[default]
    UniformGrid,
}

/// Physics and gameplay constants (per-frame units: px/frame, px/frame²)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Integration ===
    /// Downward acceleration added to vy every tick
    pub gravity: f32,
    /// Velocity multiplier applied to both axes every tick
    pub damping: f32,
    /// Fraction of vy kept (and inverted) on floor contact
    pub floor_restitution: f32,
    /// Fraction of vx kept (and inverted) on wall contact
    pub wall_restitution: f32,
    /// Both velocity components must be below this to settle on contact
    pub velocity_threshold: f32,

    // === Collision ===
    /// Resolver passes per tick
    pub collision_iterations: u32,
    /// Smallest separation applied to an overlapping pair
    pub min_separation: f32,
    /// Fraction of a falling body's velocity handed to a settled neighbor
    pub settled_nudge_ratio: f32,
    pub broad_phase: BroadPhase,
    /// Contact slack when deciding whether a settled body is still held up
    /// by the floor or by settled material below it
    pub support_gap: f32,

    // === Merging ===
    /// Same-rank pairs slower than this relative to each other merge
    pub merge_speed_threshold: f32,
    /// Same-rank pairs where both are slower than this merge
    pub rest_speed_threshold: f32,
    /// Same-rank pairs overlapping by more than this fraction of r1 + r2 merge
    pub merge_overlap_ratio: f32,

    // === Field ===
    /// Danger line position as a fraction of field height from the top
    pub danger_line_ratio: f32,
    /// Bodies further than this outside the field are discarded
    pub escape_margin: f32,

    // === Dropping ===
    /// Minimum time between two drops
    pub drop_cooldown_ms: f64,
    /// Initial downward speed of a dropped body
    pub drop_speed: f32,
    /// Gap between the top of the field and the aiming body's top edge
    pub spawn_gap: f32,
    /// Aiming bodies are drawn from ranks 0..spawn_rank_count
    pub spawn_rank_count: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            damping: 0.98,
            floor_restitution: 0.3,
            wall_restitution: 0.4,
            velocity_threshold: 0.5,

            collision_iterations: 8,
            min_separation: 0.05,
            settled_nudge_ratio: 0.1,
            broad_phase: BroadPhase::UniformGrid,
            support_gap: 1.0,

            merge_speed_threshold: 2.0,
            rest_speed_threshold: 0.2,
            merge_overlap_ratio: 0.3,

            danger_line_ratio: 0.15,
            escape_margin: 100.0,

            drop_cooldown_ms: 300.0,
            drop_speed: 0.5,
            spawn_gap: 10.0,
            spawn_rank_count: 3,
        }
    }
}

impl Tuning {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "melon_merge_tuning";

    /// Parse a (possibly partial) JSON override on top of the defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the simulation invariants
    pub fn validate(&self) -> Result<()> {
        let fraction = |name: &str, v: f32| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(Error::InvalidTuning(format!("{name} must be within [0, 1], got {v}")))
            }
        };
        fraction("damping", self.damping)?;
        fraction("floor_restitution", self.floor_restitution)?;
        fraction("wall_restitution", self.wall_restitution)?;
        fraction("settled_nudge_ratio", self.settled_nudge_ratio)?;
        fraction("merge_overlap_ratio", self.merge_overlap_ratio)?;
        fraction("danger_line_ratio", self.danger_line_ratio)?;

        if self.gravity < 0.0 || !self.gravity.is_finite() {
            return Err(Error::InvalidTuning(format!(
                "gravity must be finite and non-negative, got {}",
                self.gravity
            )));
        }
        if self.velocity_threshold <= 0.0 {
            return Err(Error::InvalidTuning("velocity_threshold must be positive".into()));
        }
        if self.collision_iterations == 0 {
            return Err(Error::InvalidTuning("collision_iterations must be at least 1".into()));
        }
        if self.min_separation < 0.0 {
            return Err(Error::InvalidTuning("min_separation must be non-negative".into()));
        }
        if !(self.support_gap >= 0.0 && self.support_gap.is_finite()) {
            return Err(Error::InvalidTuning(
                "support_gap must be finite and non-negative".into(),
            ));
        }
        if self.spawn_rank_count == 0 {
            return Err(Error::InvalidTuning("spawn_rank_count must be at least 1".into()));
        }
        if self.drop_cooldown_ms < 0.0 {
            return Err(Error::InvalidTuning("drop_cooldown_ms must be non-negative".into()));
        }
        Ok(())
    }

    /// Load tuning overrides from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning overrides from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {e}"),
                }
            }
        }

        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 0.8, "broad_phase": "BruteForce" }"#)
            .expect("valid override");
        assert_eq!(tuning.gravity, 0.8);
        assert_eq!(tuning.broad_phase, BroadPhase::BruteForce);
        assert_eq!(tuning.collision_iterations, Tuning::default().collision_iterations);
    }

    #[test]
    fn test_rejects_out_of_range_restitution() {
        let err = Tuning::from_json(r#"{ "floor_restitution": 1.5 }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidTuning(_)));
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let tuning = Tuning {
            collision_iterations: 0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_rejects_negative_support_gap() {
        let tuning = Tuning {
            support_gap: -1.0,
            ..Default::default()
        };
        assert!(matches!(tuning.validate(), Err(Error::InvalidTuning(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let tuning = Tuning {
            drop_cooldown_ms: 120.0,
            ..Default::default()
        };
        let back = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(back, tuning);
    }
}
