//! Piece registry: the ordered rank ladder
//!
//! Radii are stored as a fraction of the field width so the whole ladder
//! rescales with the play field.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One rung of the merge ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankDefinition {
    /// Radius as a fraction of field width
    pub radius_scale: f32,
    /// Points awarded when a merge produces this rank
    pub score: u64,
    /// Visual tag (fruit name)
    pub tag: String,
    /// CSS color used by the renderer
    pub color: String,
}

impl RankDefinition {
    fn new(radius_at_400: f32, score: u64, tag: &str, color: &str) -> Self {
        Self {
            radius_scale: radius_at_400 / 400.0,
            score,
            tag: tag.to_string(),
            color: color.to_string(),
        }
    }
}

/// Immutable rank table, indexed 0..len ascending
///
/// Only built through [`RankTable::new`] / [`RankTable::from_json`], which
/// validate the ladder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTable {
    ranks: Vec<RankDefinition>,
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            ranks: vec![
                RankDefinition::new(15.0, 1, "grape", "#9b59b6"),
                RankDefinition::new(20.0, 2, "cherry", "#e74c3c"),
                RankDefinition::new(25.0, 4, "orange", "#f39c12"),
                RankDefinition::new(30.0, 8, "lemon", "#f1c40f"),
                RankDefinition::new(35.0, 16, "kiwi", "#2ecc71"),
                RankDefinition::new(40.0, 32, "tomato", "#e67e22"),
                RankDefinition::new(45.0, 64, "peach", "#ff9ff3"),
                RankDefinition::new(50.0, 128, "pineapple", "#fdcb6e"),
                RankDefinition::new(55.0, 256, "coconut", "#dfe6e9"),
                RankDefinition::new(60.0, 512, "watermelon", "#27ae60"),
            ],
        }
    }
}

impl RankTable {
    /// Build a table, enforcing strictly increasing radius and score
    pub fn new(ranks: Vec<RankDefinition>) -> Result<Self> {
        if ranks.is_empty() {
            return Err(Error::InvalidRanks("table is empty".into()));
        }
        if ranks.iter().any(|r| !(r.radius_scale > 0.0 && r.radius_scale < 0.5)) {
            return Err(Error::InvalidRanks("radius_scale must be within (0, 0.5)".into()));
        }
        for (i, pair) in ranks.windows(2).enumerate() {
            if pair[1].radius_scale <= pair[0].radius_scale {
                return Err(Error::InvalidRanks(format!(
                    "radius of rank {} does not exceed rank {}",
                    i + 1,
                    i
                )));
            }
            if pair[1].score <= pair[0].score {
                return Err(Error::InvalidRanks(format!(
                    "score of rank {} does not exceed rank {}",
                    i + 1,
                    i
                )));
            }
        }
        Ok(Self { ranks })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let ranks: Vec<RankDefinition> = serde_json::from_str(json)?;
        Self::new(ranks)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn get(&self, rank: usize) -> Option<&RankDefinition> {
        self.ranks.get(rank)
    }

    /// Highest rank; bodies of this rank never merge
    #[inline]
    pub fn final_rank(&self) -> usize {
        self.ranks.len() - 1
    }

    /// Whether two bodies of `rank` may merge into `rank + 1`
    #[inline]
    pub fn can_merge(&self, rank: usize) -> bool {
        rank < self.final_rank()
    }

    /// Radius of `rank` on a field of the given width
    pub fn radius(&self, rank: usize, field_width: f32) -> f32 {
        let rank = rank.min(self.final_rank());
        self.ranks[rank].radius_scale * field_width
    }

    /// Merge value of `rank` (0 for unknown ranks)
    pub fn score(&self, rank: usize) -> u64 {
        self.ranks.get(rank).map(|r| r.score).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankDefinition> {
        self.ranks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = RankTable::default();
        assert_eq!(table.len(), 10);
        assert!(RankTable::new(table.iter().cloned().collect()).is_ok());
        assert_eq!(table.final_rank(), 9);
    }

    #[test]
    fn test_radius_follows_width() {
        let table = RankTable::default();
        assert!((table.radius(0, 400.0) - 15.0).abs() < 1e-4);
        assert!((table.radius(9, 400.0) - 60.0).abs() < 1e-4);
        assert!((table.radius(0, 600.0) - 22.5).abs() < 1e-4);
    }

    #[test]
    fn test_final_rank_never_merges() {
        let table = RankTable::default();
        assert!(table.can_merge(8));
        assert!(!table.can_merge(9));
    }

    #[test]
    fn test_rejects_non_increasing_radius() {
        let ranks = vec![
            RankDefinition::new(20.0, 1, "a", "#000"),
            RankDefinition::new(20.0, 2, "b", "#000"),
        ];
        assert!(matches!(RankTable::new(ranks), Err(Error::InvalidRanks(_))));
    }

    #[test]
    fn test_rejects_non_increasing_score() {
        let ranks = vec![
            RankDefinition::new(10.0, 4, "a", "#000"),
            RankDefinition::new(20.0, 4, "b", "#000"),
        ];
        assert!(RankTable::new(ranks).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r##"[
            { "radius_scale": 0.05, "score": 1, "tag": "small", "color": "#111" },
            { "radius_scale": 0.10, "score": 3, "tag": "big", "color": "#222" }
        ]"##;
        let table = RankTable::from_json(json).unwrap();
        assert_eq!(table.score(1), 3);
        assert_eq!(table.score(7), 0);
    }
}
