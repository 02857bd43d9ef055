//! Core data models for route planning and trace synthesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point of interest to visit, supplied by the geodata collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, alias = "alt", skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
}

impl Waypoint {
    /// Create a waypoint without an altitude.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            altitude_m: None,
        }
    }
}

/// A cell in the occupancy grid (row-major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A geographic path point produced by a geo-aware planner variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
}

/// A planned route, tagged by the coordinate space its points live in.
///
/// Paths are terminal artifacts: built once by a planner, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "space", content = "points", rename_all = "snake_case")]
pub enum PlannedPath {
    /// Grid-space path of occupancy cells.
    Grid(Vec<GridCell>),
    /// Geographic path of (lat, lon) points with optional terrain altitude.
    Geo(Vec<GeoPoint>),
}

impl PlannedPath {
    pub fn len(&self) -> usize {
        match self {
            PlannedPath::Grid(cells) => cells.len(),
            PlannedPath::Geo(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Visiting order over a waypoint set plus the total cycle cost under the
/// metric it was computed with (meters for geodesic, coordinate units for
/// euclidean).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub order: Vec<usize>,
    pub cost: f64,
}

/// One time-stamped GPS sample of a synthesized trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub ts: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    #[serde(alias = "alt")]
    pub altitude_m: f64,
    pub heading_deg: f64,
}

/// Ordered batch of trace points keyed by drone, handed off to the
/// ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceBatch {
    pub drone_id: String,
    pub data: Vec<TrajectoryPoint>,
}
