//! Uniform grid broad phase
//!
//! Divides the field into square cells at least one body diameter wide, so
//! any two overlapping bodies share a cell or sit in adjacent cells. Pair
//! queries only check the current cell and a half stencil of neighbors.

use super::state::{Body, Field};

/// Neighbor offsets visited from each cell (the other half is covered when
/// the neighbor visits us)
const HALF_STENCIL: [(i32, i32); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Dense grid of body indices over the field
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f32,
    inv_cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl UniformGrid {
    /// Create an empty grid with the given cell size
    pub fn new(field: Field, cell_size: f32) -> Self {
        let cell_size = cell_size.max(1.0);
        let cols = ((field.width / cell_size).ceil() as usize).max(1);
        let rows = ((field.height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    /// Build a grid sized to the largest body diameter and insert all bodies
    pub fn build(bodies: &[Body], field: Field) -> Self {
        let max_radius = bodies.iter().map(|b| b.radius).fold(0.0_f32, f32::max);
        let mut grid = Self::new(field, max_radius * 2.0);
        for (index, body) in bodies.iter().enumerate() {
            grid.insert(index, body);
        }
        grid
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    fn cell_coords(&self, body: &Body) -> (usize, usize) {
        let cx = (body.pos.x * self.inv_cell_size).floor().max(0.0) as usize;
        let cy = (body.pos.y * self.inv_cell_size).floor().max(0.0) as usize;
        (cx.min(self.cols - 1), cy.min(self.rows - 1))
    }

    /// Insert body `index` into the cell containing its center
    pub fn insert(&mut self, index: usize, body: &Body) {
        let (cx, cy) = self.cell_coords(body);
        self.cells[cy * self.cols + cx].push(index);
    }

    fn cell(&self, cx: i32, cy: i32) -> Option<&[usize]> {
        if cx < 0 || cy < 0 || cx as usize >= self.cols || cy as usize >= self.rows {
            return None;
        }
        Some(&self.cells[cy as usize * self.cols + cx as usize])
    }

    /// Visit every unordered pair of indices in the same or adjacent cells,
    /// each exactly once, in row-major cell order
    pub fn for_each_potential_pair<F>(&self, mut callback: F)
    where
        F: FnMut(usize, usize),
    {
        for cy in 0..self.rows {
            for cx in 0..self.cols {
                let entities = &self.cells[cy * self.cols + cx];
                if entities.is_empty() {
                    continue;
                }

                // Pairs within the same cell
                for i in 0..entities.len() {
                    for j in (i + 1)..entities.len() {
                        callback(entities[i], entities[j]);
                    }
                }

                for &(dx, dy) in &HALF_STENCIL {
                    if let Some(neighbor) = self.cell(cx as i32 + dx, cy as i32 + dy) {
                        for &a in entities {
                            for &b in neighbor {
                                callback(a, b);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Collect potential pairs into a vector
    pub fn potential_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        self.for_each_potential_pair(|a, b| pairs.push((a, b)));
        pairs
    }
}

/// Every unordered index pair, for the brute-force broad phase
pub fn all_pairs(count: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(count * count.saturating_sub(1) / 2);
    for i in 0..count {
        for j in (i + 1)..count {
            pairs.push((i, j));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::math::distance;
    use crate::sim::state::Motion;
    use glam::Vec2;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn body(pos: Vec2, radius: f32) -> Body {
        Body {
            id: 0,
            pos,
            vel: Vec2::ZERO,
            radius,
            rank: 0,
            motion: Motion::Settled,
        }
    }

    fn normalized(pairs: &[(usize, usize)]) -> HashSet<(usize, usize)> {
        pairs.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect()
    }

    fn overlapping(bodies: &[Body], pairs: &[(usize, usize)]) -> HashSet<(usize, usize)> {
        let hits: Vec<(usize, usize)> = pairs
            .iter()
            .copied()
            .filter(|&(a, b)| {
                distance(bodies[a].pos, bodies[b].pos) < bodies[a].radius + bodies[b].radius
            })
            .collect();
        normalized(&hits)
    }

    #[test]
    fn test_all_pairs_count() {
        assert_eq!(all_pairs(0).len(), 0);
        assert_eq!(all_pairs(1).len(), 0);
        assert_eq!(all_pairs(5).len(), 10);
    }

    #[test]
    fn test_cell_size_tracks_largest_body() {
        let field = Field::new(400.0, 600.0);
        let bodies = vec![body(Vec2::new(50.0, 50.0), 15.0), body(Vec2::new(200.0, 300.0), 40.0)];
        let grid = UniformGrid::build(&bodies, field);
        assert_eq!(grid.cell_size(), 80.0);
    }

    #[test]
    fn test_far_apart_bodies_are_not_paired() {
        let field = Field::new(400.0, 600.0);
        let bodies = vec![body(Vec2::new(20.0, 20.0), 15.0), body(Vec2::new(380.0, 580.0), 15.0)];
        let grid = UniformGrid::build(&bodies, field);
        assert!(grid.potential_pairs().is_empty());
    }

    #[test]
    fn test_neighbors_across_cell_boundary() {
        let field = Field::new(400.0, 600.0);
        // Straddling the x = 30 boundary diagonally
        let bodies = vec![body(Vec2::new(29.0, 29.0), 15.0), body(Vec2::new(31.0, 31.0), 15.0)];
        let grid = UniformGrid::build(&bodies, field);
        assert_eq!(normalized(&grid.potential_pairs()), HashSet::from([(0, 1)]));
    }

    #[test]
    fn test_empty_grid() {
        let grid = UniformGrid::build(&[], Field::new(400.0, 600.0));
        assert!(grid.potential_pairs().is_empty());
    }

    proptest! {
        #[test]
        fn grid_finds_every_overlapping_pair(
            specs in prop::collection::vec((15.0f32..385.0, 15.0f32..585.0, 0usize..4), 0..40)
        ) {
            let field = Field::new(400.0, 600.0);
            let radii = [15.0, 20.0, 25.0, 30.0];
            let bodies: Vec<Body> = specs
                .iter()
                .map(|&(x, y, r)| body(Vec2::new(x, y), radii[r]))
                .collect();

            let grid_pairs = UniformGrid::build(&bodies, field).potential_pairs();
            let brute_pairs = all_pairs(bodies.len());

            // No pair is reported twice
            prop_assert_eq!(normalized(&grid_pairs).len(), grid_pairs.len());
            prop_assert_eq!(
                overlapping(&bodies, &grid_pairs),
                overlapping(&bodies, &brute_pairs)
            );
        }
    }
}
