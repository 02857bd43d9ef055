//! RRT* planner: adaptive goal bias, adaptive step, validated edges.
//!
//! Differs from the plain RRT in three ways: the goal bias grows as the
//! tree approaches the goal (clamped to [`BIAS_MIN`, `BIAS_MAX`]), the step
//! shrinks near the sampled point, and the whole parent-to-candidate edge
//! is collision-checked, not just the candidate. An invalid candidate or
//! edge consumes its iteration; the loop moves on to the next sample rather
//! than retrying within the same iteration.

use crate::grid::WorldGrid;
use crate::models::GridCell;
use crate::rrt::{distance, nearest_node, reconstruct};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const BIAS_MIN: f64 = 0.4;
const BIAS_MAX: f64 = 0.95;

/// Fraction of the distance to the sample used as the adaptive step cap.
const STEP_FRACTION: f64 = 0.7;

/// Uniform-sample retries before falling back to the start point.
const MAX_SAMPLE_ATTEMPTS: usize = 10;

/// Edge samples per unit of segment length.
const EDGE_SAMPLES_PER_CELL: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct RrtStar {
    delta: f64,
    target_radius: f64,
    max_iterations: usize,
    seed: Option<u64>,
}

impl RrtStar {
    pub fn new(delta: f64, target_radius: f64, max_iterations: usize, seed: Option<u64>) -> Self {
        Self {
            delta,
            target_radius,
            max_iterations,
            seed,
        }
    }

    /// Grow the tree until a node lands within `target_radius` of `goal`;
    /// the returned path ends at the goal cell itself. `None` once the
    /// iteration budget is spent.
    pub fn find_path(
        &self,
        grid: &WorldGrid,
        start: GridCell,
        goal: GridCell,
    ) -> Option<Vec<GridCell>> {
        let start_pt = (start.row as f64, start.col as f64);
        let goal_pt = (goal.row as f64, goal.col as f64);

        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let mut nodes: Vec<(f64, f64)> = vec![start_pt];
        let mut parents: Vec<Option<usize>> = vec![None];

        for _ in 0..self.max_iterations {
            let sampled = self.sample_point(grid, start_pt, goal_pt, &nodes, &mut rng);
            let nearest = nearest_node(&nodes, sampled);
            let nearest_pt = nodes[nearest];

            let length = distance(nearest_pt, sampled);
            if length <= f64::EPSILON {
                // Degenerate steering vector: no movement this iteration.
                continue;
            }
            let step = self.delta.min(length * STEP_FRACTION);
            let candidate = (
                nearest_pt.0 + (sampled.0 - nearest_pt.0) / length * step,
                nearest_pt.1 + (sampled.1 - nearest_pt.1) / length * step,
            );

            if !grid.is_free_at(candidate.0, candidate.1) {
                continue;
            }
            if !edge_is_clear(grid, nearest_pt, candidate) {
                continue;
            }

            nodes.push(candidate);
            parents.push(Some(nearest));

            if distance(candidate, goal_pt) <= self.target_radius {
                let mut path = reconstruct(grid, &nodes, &parents, nodes.len() - 1);
                if path.last() != Some(&goal) {
                    path.push(goal);
                }
                return Some(path);
            }
        }
        None
    }

    /// Goal with probability growing as the tree closes in, otherwise a
    /// uniformly sampled free point (falling back to the start when every
    /// attempt lands on an obstacle).
    fn sample_point(
        &self,
        grid: &WorldGrid,
        start: (f64, f64),
        goal: (f64, f64),
        nodes: &[(f64, f64)],
        rng: &mut SmallRng,
    ) -> (f64, f64) {
        let closest = nodes
            .iter()
            .map(|node| distance(*node, goal))
            .fold(f64::INFINITY, f64::min);
        let extent = grid.rows().max(grid.cols()) as f64;
        let bias = (1.0 - closest / extent).clamp(BIAS_MIN, BIAS_MAX);

        if rng.random::<f64>() < bias {
            return goal;
        }
        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let point = (
                rng.random_range(0.0..grid.rows() as f64),
                rng.random_range(0.0..grid.cols() as f64),
            );
            if grid.is_free_at(point.0, point.1) {
                return point;
            }
        }
        start
    }
}

/// Sample the segment at a resolution proportional to its length and
/// require every sample to be in-bounds free space.
fn edge_is_clear(grid: &WorldGrid, from: (f64, f64), to: (f64, f64)) -> bool {
    let length = distance(from, to);
    let samples = ((length * EDGE_SAMPLES_PER_CELL).ceil() as usize).max(1);
    for i in 0..=samples {
        let t = i as f64 / samples as f64;
        let row = from.0 + (to.0 - from.0) * t;
        let col = from.1 + (to.1 - from.1) * t;
        if !grid.is_free_at(row, col) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridTransform;

    fn test_transform() -> GridTransform {
        GridTransform::north_up(-117.84, 33.69, 0.0001, -0.0001).unwrap()
    }

    fn open_grid(rows: usize, cols: usize) -> WorldGrid {
        WorldGrid::open(rows, cols, test_transform()).unwrap()
    }

    #[test]
    fn reaches_goal_and_ends_on_goal_cell() {
        let grid = open_grid(20, 20);
        let planner = RrtStar::new(3.0, 1.5, 3000, Some(5));
        let start = GridCell::new(1, 1);
        let goal = GridCell::new(17, 16);
        let path = planner.find_path(&grid, start, goal).expect("seeded run should reach goal");

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for cell in &path {
            assert!(grid.is_free(cell.row, cell.col), "node {cell:?} not in free space");
        }
    }

    #[test]
    fn wall_exhausts_budget() {
        let rows = 14;
        let cols = 14;
        let mut occupancy = vec![0u8; rows * cols];
        for row in 0..rows {
            occupancy[row * cols + 7] = 1;
        }
        let grid = WorldGrid::new(rows, cols, occupancy, None, test_transform()).unwrap();
        let planner = RrtStar::new(2.0, 1.0, 500, Some(3));
        let path = planner.find_path(&grid, GridCell::new(2, 2), GridCell::new(11, 12));
        assert!(path.is_none());
    }

    #[test]
    fn invalid_edge_consumes_iteration() {
        // A wall column splits the grid. Every proposed edge toward the
        // goal side fails edge validation; each failure must consume its
        // iteration (no within-iteration resampling), so a tiny budget
        // runs to exhaustion.
        let rows = 3;
        let cols = 9;
        let mut occupancy = vec![0u8; rows * cols];
        for row in 0..rows {
            occupancy[row * cols + 4] = 1;
        }
        let grid = WorldGrid::new(rows, cols, occupancy, None, test_transform()).unwrap();
        // delta large enough that the steered edge always spans the wall.
        let planner = RrtStar::new(8.0, 0.5, 25, Some(9));
        let path = planner.find_path(&grid, GridCell::new(1, 1), GridCell::new(1, 7));
        assert!(path.is_none(), "blocked edge must not be bypassed by retries");
    }

    #[test]
    fn edge_validation_rejects_blocked_midpoint() {
        let rows = 5;
        let cols = 5;
        let mut occupancy = vec![0u8; rows * cols];
        occupancy[2 * cols + 2] = 1;
        let grid = WorldGrid::new(rows, cols, occupancy, None, test_transform()).unwrap();
        assert!(!edge_is_clear(&grid, (2.2, 0.5), (2.2, 4.5)));
        assert!(edge_is_clear(&grid, (0.5, 0.5), (0.5, 4.5)));
    }
}
