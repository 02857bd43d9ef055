//! Planner façade: variant selection and a uniform planning contract.
//!
//! Callers pick a variant by name once, at construction, and then issue
//! `plan(grid, start, goal)` calls without caring which algorithm runs
//! underneath. Grid-search and sampling variants return grid-space paths;
//! the geo-aware variants return geographic paths with per-point terrain
//! altitude attached.

use crate::astar::AStarPlanner;
use crate::error::PlanError;
use crate::grid::WorldGrid;
use crate::models::{GeoPoint, GridCell, PlannedPath};
use crate::rrt::Rrt;
use crate::rrt_star::RrtStar;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Algorithm selector. Parsed from the configuration surface; unknown
/// names fail at construction, never at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerVariant {
    AStar,
    Rrt,
    RrtStar,
    GeoRrt,
    GeoRrtStar,
}

impl PlannerVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlannerVariant::AStar => "astar",
            PlannerVariant::Rrt => "rrt",
            PlannerVariant::RrtStar => "rrt*",
            PlannerVariant::GeoRrt => "geo_rrt",
            PlannerVariant::GeoRrtStar => "geo_rrt*",
        }
    }

    /// True for the variants that report paths in geographic coordinates.
    pub fn is_geo(&self) -> bool {
        matches!(self, PlannerVariant::GeoRrt | PlannerVariant::GeoRrtStar)
    }
}

impl FromStr for PlannerVariant {
    type Err = PlanError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "astar" => Ok(PlannerVariant::AStar),
            "rrt" => Ok(PlannerVariant::Rrt),
            "rrt*" => Ok(PlannerVariant::RrtStar),
            "geo_rrt" => Ok(PlannerVariant::GeoRrt),
            "geo_rrt*" => Ok(PlannerVariant::GeoRrtStar),
            other => Err(PlanError::UnsupportedVariant(other.to_string())),
        }
    }
}

/// Tuning knobs shared by all variants. Fields a variant does not use are
/// ignored by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOptions {
    /// Cost multiplier per meter of elevation change (A*).
    pub elevation_penalty: f64,
    /// Steering step in grid cells (RRT family).
    pub step_size: f64,
    /// Sampling budget per query (RRT family).
    pub max_iterations: usize,
    /// Goal acceptance radius in grid cells (RRT*).
    pub target_radius: f64,
    /// Seed for the sampling RNG; `None` draws OS entropy.
    pub seed: Option<u64>,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            elevation_penalty: 1.0,
            step_size: 1.0,
            max_iterations: 1000,
            target_radius: 1.0,
            seed: None,
        }
    }
}

/// A start or goal in either coordinate space. The façade converts through
/// the grid transform as needed, so any variant accepts either form.
#[derive(Debug, Clone, Copy)]
pub enum PlanPoint {
    Cell(GridCell),
    Geo { lat: f64, lon: f64 },
}

impl From<GridCell> for PlanPoint {
    fn from(cell: GridCell) -> Self {
        PlanPoint::Cell(cell)
    }
}

impl PlanPoint {
    pub fn geo(lat: f64, lon: f64) -> Self {
        PlanPoint::Geo { lat, lon }
    }

    fn to_cell(self, grid: &WorldGrid) -> GridCell {
        match self {
            PlanPoint::Cell(cell) => cell,
            PlanPoint::Geo { lat, lon } => grid.cell_for_position(lat, lon),
        }
    }
}

/// Stateless planning façade: a variant plus its configuration.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    variant: PlannerVariant,
    options: PlannerOptions,
}

impl PathPlanner {
    /// Select a variant by name. Unsupported names are rejected here so
    /// misconfiguration never reaches the planning loop.
    pub fn new(variant_name: &str, options: PlannerOptions) -> Result<Self, PlanError> {
        Ok(Self {
            variant: variant_name.parse()?,
            options,
        })
    }

    pub fn from_variant(variant: PlannerVariant, options: PlannerOptions) -> Self {
        Self { variant, options }
    }

    pub fn variant(&self) -> PlannerVariant {
        self.variant
    }

    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Plan one segment. `None` means the variant exhausted its search
    /// without reaching the goal; the caller decides what to do with that.
    pub fn plan(&self, grid: &WorldGrid, start: PlanPoint, goal: PlanPoint) -> Option<PlannedPath> {
        let start_cell = start.to_cell(grid);
        let goal_cell = goal.to_cell(grid);

        let cells = match self.variant {
            PlannerVariant::AStar => AStarPlanner::new(self.options.elevation_penalty)
                .find_path(grid, start_cell, goal_cell)?,
            PlannerVariant::Rrt | PlannerVariant::GeoRrt => Rrt::new(
                self.options.step_size,
                self.options.max_iterations,
                self.options.seed,
            )
            .find_path(grid, start_cell, goal_cell)?,
            PlannerVariant::RrtStar | PlannerVariant::GeoRrtStar => RrtStar::new(
                self.options.step_size,
                self.options.target_radius,
                self.options.max_iterations,
                self.options.seed,
            )
            .find_path(grid, start_cell, goal_cell)?,
        };

        if self.variant.is_geo() {
            let points = cells
                .into_iter()
                .map(|cell| {
                    let (lat, lon) = grid.cell_to_latlon(cell);
                    let altitude_m = grid
                        .has_elevation()
                        .then(|| grid.elevation_at(cell.row, cell.col));
                    GeoPoint {
                        lat,
                        lon,
                        altitude_m,
                    }
                })
                .collect();
            Some(PlannedPath::Geo(points))
        } else {
            Some(PlannedPath::Grid(cells))
        }
    }
}
