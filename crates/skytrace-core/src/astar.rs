//! Grid A* planner.
//!
//! 8-connected search over the occupancy grid with an optional elevation
//! cost term. The straight-line heuristic stays a lower bound because the
//! elevation term only ever adds non-negative cost to an edge, so the
//! search remains optimal.

use crate::grid::WorldGrid;
use crate::models::GridCell;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Orthogonal + diagonal neighbor offsets.
const DIRECTIONS: [(i64, i64); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f_score: FloatOrd,
    g_score: FloatOrd,
    cell: GridCell,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // f, then g, then cell index: deterministic expansion order for
        // reproducible paths on equal scores.
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.cell.row.cmp(&other.cell.row))
            .then_with(|| self.cell.col.cmp(&other.cell.col))
    }
}

/// Grid-search planner over the occupancy field.
#[derive(Debug, Clone)]
pub struct AStarPlanner {
    elevation_penalty: f64,
}

impl AStarPlanner {
    /// `elevation_penalty` scales the |Δelevation| term added to each edge.
    pub fn new(elevation_penalty: f64) -> Self {
        Self { elevation_penalty }
    }

    /// Find the cheapest 8-connected path, or `None` when the frontier is
    /// exhausted without reaching the goal.
    pub fn find_path(
        &self,
        grid: &WorldGrid,
        start: GridCell,
        goal: GridCell,
    ) -> Option<Vec<GridCell>> {
        if start == goal {
            return Some(vec![start]);
        }

        let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
        let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
        let mut g_score: HashMap<GridCell, f64> = HashMap::new();
        let mut visited: HashSet<GridCell> = HashSet::new();

        g_score.insert(start, 0.0);
        open_set.push(Reverse(OpenNode {
            f_score: FloatOrd(heuristic(start, goal)),
            g_score: FloatOrd(0.0),
            cell: start,
        }));

        while let Some(Reverse(current)) = open_set.pop() {
            if current.cell == goal {
                return Some(reconstruct_path(&came_from, start, goal));
            }
            if !visited.insert(current.cell) {
                continue;
            }

            let current_g = g_score.get(&current.cell).copied().unwrap_or(f64::INFINITY);

            for (drow, dcol) in DIRECTIONS {
                let nrow = current.cell.row as i64 + drow;
                let ncol = current.cell.col as i64 + dcol;
                if !grid.in_bounds(nrow, ncol) || !grid.is_free(nrow as usize, ncol as usize) {
                    continue;
                }
                let neighbor = GridCell::new(nrow as usize, ncol as usize);
                if visited.contains(&neighbor) {
                    continue;
                }

                let base_cost = (((drow * drow) + (dcol * dcol)) as f64).sqrt();
                let elevation_cost = if grid.has_elevation() {
                    let current_elev = grid.elevation_at(current.cell.row, current.cell.col);
                    let neighbor_elev = grid.elevation_at(neighbor.row, neighbor.col);
                    self.elevation_penalty * (neighbor_elev - current_elev).abs()
                } else {
                    0.0
                };

                let tentative_g = current_g + base_cost + elevation_cost;
                if tentative_g < g_score.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                    came_from.insert(neighbor, current.cell);
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(Reverse(OpenNode {
                        f_score: FloatOrd(tentative_g + heuristic(neighbor, goal)),
                        g_score: FloatOrd(tentative_g),
                        cell: neighbor,
                    }));
                }
            }
        }

        None
    }
}

/// Straight-line distance in grid-cell units, ignoring elevation.
fn heuristic(a: GridCell, b: GridCell) -> f64 {
    let drow = a.row as f64 - b.row as f64;
    let dcol = a.col as f64 - b.col as f64;
    (drow * drow + dcol * dcol).sqrt()
}

fn reconstruct_path(
    came_from: &HashMap<GridCell, GridCell>,
    start: GridCell,
    goal: GridCell,
) -> Vec<GridCell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&parent) = came_from.get(&current) {
        path.push(parent);
        current = parent;
        if current == start {
            break;
        }
    }
    path.reverse();
    path
}
