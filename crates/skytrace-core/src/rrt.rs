//! Rapidly-exploring random tree planner.
//!
//! Samples the grid's coordinate extent with a fixed goal bias and grows a
//! tree in continuous (row, col) space. Tree nodes live in an arena and
//! reference their parent by index, so reconstruction never compares
//! floating-point keys. Without a seed the planner draws OS entropy and is
//! not deterministic between runs.

use crate::grid::WorldGrid;
use crate::models::GridCell;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Fraction of iterations that sample the goal directly.
const GOAL_BIAS: f64 = 0.1;

/// Sampling-tree planner over the occupancy grid.
#[derive(Debug, Clone)]
pub struct Rrt {
    step_size: f64,
    max_iterations: usize,
    seed: Option<u64>,
}

impl Rrt {
    pub fn new(step_size: f64, max_iterations: usize, seed: Option<u64>) -> Self {
        Self {
            step_size,
            max_iterations,
            seed,
        }
    }

    /// Grow a tree from `start` until a node lands within `step_size` of
    /// `goal`, or the iteration budget runs out (`None`).
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
            let sampled = self.sample_point(grid, goal_pt, &mut rng);
            let nearest = nearest_node(&nodes, sampled);
            let new_point = self.steer(nodes[nearest], sampled);

            if !grid.is_free_at(new_point.0, new_point.1) {
                continue;
            }
            nodes.push(new_point);
            parents.push(Some(nearest));

            if distance(new_point, goal_pt) < self.step_size {
                return Some(reconstruct(grid, &nodes, &parents, nodes.len() - 1));
            }
        }
        None
    }

    fn sample_point(
        &self,
        grid: &WorldGrid,
        goal: (f64, f64),
        rng: &mut SmallRng,
    ) -> (f64, f64) {
        if rng.random::<f64>() < GOAL_BIAS {
            return goal;
        }
        (
            rng.random_range(0.0..grid.rows() as f64),
            rng.random_range(0.0..grid.cols() as f64),
        )
    }

    /// Move from `nearest` toward `sampled` by at most `step_size`. A
    /// zero-length direction is no movement, never a division by zero.
    fn steer(&self, nearest: (f64, f64), sampled: (f64, f64)) -> (f64, f64) {
        let drow = sampled.0 - nearest.0;
        let dcol = sampled.1 - nearest.1;
        let dist = (drow * drow + dcol * dcol).sqrt();
        if dist <= self.step_size {
            return sampled;
        }
        (
            nearest.0 + drow / dist * self.step_size,
            nearest.1 + dcol / dist * self.step_size,
        )
    }
}

/// Index of the tree node closest to `point`; first-found wins exact ties.
pub(crate) fn nearest_node(nodes: &[(f64, f64)], point: (f64, f64)) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, node) in nodes.iter().enumerate() {
        let d = distance(*node, point);
        if d < best_dist {
            best_dist = d;
            best = idx;
        }
    }
    best
}

pub(crate) fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let drow = a.0 - b.0;
    let dcol = a.1 - b.1;
    (drow * drow + dcol * dcol).sqrt()
}

/// Walk parent indices from `tail` to the root, reverse, and snap the
/// continuous tree points to grid cells, dropping consecutive duplicates.
pub(crate) fn reconstruct(
    grid: &WorldGrid,
    nodes: &[(f64, f64)],
    parents: &[Option<usize>],
    tail: usize,
) -> Vec<GridCell> {
    let mut indices = vec![tail];
    let mut current = tail;
    while let Some(parent) = parents[current] {
        indices.push(parent);
        current = parent;
    }
    indices.reverse();

    let mut path: Vec<GridCell> = Vec::with_capacity(indices.len());
    for idx in indices {
        let (row, col) = nodes[idx];
        let cell = GridCell::new(
            (row.round() as usize).min(grid.rows() - 1),
            (col.round() as usize).min(grid.cols() - 1),
        );
        if path.last() != Some(&cell) {
            path.push(cell);
        }
    }
    path
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
    fn finds_path_on_open_grid() {
        let grid = open_grid(20, 20);
        let planner = Rrt::new(2.0, 2000, Some(7));
        let start = GridCell::new(1, 1);
        let goal = GridCell::new(18, 18);
        let path = planner.find_path(&grid, start, goal).expect("seeded run should reach goal");

        assert_eq!(path.first(), Some(&start));
        // Termination is "within step_size of goal", so the tail may stop
        // short of the goal cell itself.
        let tail = *path.last().unwrap();
        let tail_dist = distance(
            (tail.row as f64, tail.col as f64),
            (goal.row as f64, goal.col as f64),
        );
        assert!(tail_dist <= 2.0 + 1.0, "tail {tail:?} too far from goal");
        for cell in &path {
            assert!(grid.is_free(cell.row, cell.col));
        }
        for pair in path.windows(2) {
            assert_ne!(pair[0], pair[1], "duplicate consecutive cell");
        }
    }

    #[test]
    fn wall_exhausts_budget() {
        let rows = 12;
        let cols = 12;
        let mut occupancy = vec![0u8; rows * cols];
        for row in 0..rows {
            occupancy[row * cols + 6] = 1;
        }
        let grid = WorldGrid::new(rows, cols, occupancy, None, test_transform()).unwrap();
        let planner = Rrt::new(1.0, 400, Some(11));
        let path = planner.find_path(&grid, GridCell::new(2, 2), GridCell::new(9, 10));
        assert!(path.is_none());
    }

    #[test]
    fn same_seed_same_path() {
        let grid = open_grid(16, 16);
        let start = GridCell::new(0, 0);
        let goal = GridCell::new(14, 14);
        let a = Rrt::new(1.5, 3000, Some(42)).find_path(&grid, start, goal);
        let b = Rrt::new(1.5, 3000, Some(42)).find_path(&grid, start, goal);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_length_steer_is_no_movement() {
        let planner = Rrt::new(1.0, 10, Some(1));
        let steered = planner.steer((3.0, 3.0), (3.0, 3.0));
        assert_eq!(steered, (3.0, 3.0));
    }
}
