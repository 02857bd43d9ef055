//! Occupancy/elevation grid and its geographic transform.
//!
//! The grid is the leaf input of every planner: a row-major occupancy field
//! (0 = free, nonzero = blocked), an optional elevation field of identical
//! shape, and an invertible affine transform between grid (col, row) and
//! geographic (lon, lat) coordinates, the convention elevation rasters
//! arrive with.

use crate::error::PlanError;
use crate::models::GridCell;
use serde::{Deserialize, Serialize};

/// Affine transform `(col, row) -> (lon, lat)`:
///
/// ```text
/// lon = a * col + b * row + c
/// lat = d * col + e * row + f
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GridTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GridTransform {
    /// Build a transform from its six coefficients, rejecting
    /// non-invertible ones.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<Self, PlanError> {
        let transform = Self { a, b, c, d, e, f };
        if transform.det().abs() < f64::EPSILON || !transform.det().is_finite() {
            return Err(PlanError::InvalidGeometry(
                "grid transform is not invertible".to_string(),
            ));
        }
        Ok(transform)
    }

    /// Axis-aligned transform anchored at the grid's north-west corner.
    ///
    /// `lat_step` is usually negative: row indices grow southward.
    pub fn north_up(
        origin_lon: f64,
        origin_lat: f64,
        lon_step: f64,
        lat_step: f64,
    ) -> Result<Self, PlanError> {
        Self::new(lon_step, 0.0, origin_lon, 0.0, lat_step, origin_lat)
    }

    fn det(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Forward transform: fractional (col, row) to (lon, lat).
    pub fn cell_to_lonlat(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// Inverse transform: (lon, lat) to fractional (col, row).
    pub fn lonlat_to_cell(&self, lon: f64, lat: f64) -> (f64, f64) {
        let det = self.det();
        let x = lon - self.c;
        let y = lat - self.f;
        (
            (self.e * x - self.b * y) / det,
            (self.a * y - self.d * x) / det,
        )
    }
}

/// Immutable world model shared by all planner variants.
#[derive(Debug, Clone)]
pub struct WorldGrid {
    rows: usize,
    cols: usize,
    occupancy: Vec<u8>,
    elevation: Option<Vec<f64>>,
    transform: GridTransform,
}

impl WorldGrid {
    /// Build a grid, validating field shapes up front.
    pub fn new(
        rows: usize,
        cols: usize,
        occupancy: Vec<u8>,
        elevation: Option<Vec<f64>>,
        transform: GridTransform,
    ) -> Result<Self, PlanError> {
        if rows == 0 || cols == 0 {
            return Err(PlanError::InvalidGeometry(
                "grid must have at least one row and one column".to_string(),
            ));
        }
        if occupancy.len() != rows * cols {
            return Err(PlanError::InvalidGeometry(format!(
                "occupancy has {} cells, expected {}x{}",
                occupancy.len(),
                rows,
                cols
            )));
        }
        if let Some(elevation) = &elevation {
            if elevation.len() != rows * cols {
                return Err(PlanError::InvalidGeometry(format!(
                    "elevation has {} cells, expected {}x{}",
                    elevation.len(),
                    rows,
                    cols
                )));
            }
        }
        Ok(Self {
            rows,
            cols,
            occupancy,
            elevation,
            transform,
        })
    }

    /// All-free grid with no elevation field.
    pub fn open(rows: usize, cols: usize, transform: GridTransform) -> Result<Self, PlanError> {
        Self::new(rows, cols, vec![0; rows * cols], None, transform)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    pub fn has_elevation(&self) -> bool {
        self.elevation.is_some()
    }

    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// True if the cell exists and is unoccupied.
    pub fn is_free(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.occupancy[row * self.cols + col] == 0
    }

    /// Continuous-space freeness check used by the sampling planners: the
    /// containing cell must exist and be unoccupied.
    pub fn is_free_at(&self, row: f64, col: f64) -> bool {
        if !row.is_finite() || !col.is_finite() || row < 0.0 || col < 0.0 {
            return false;
        }
        self.is_free(row as usize, col as usize)
    }

    /// Elevation at a cell, 0.0 outside the grid or without an elevation
    /// field. Terrain sampling is best-effort by contract.
    pub fn elevation_at(&self, row: usize, col: usize) -> f64 {
        match &self.elevation {
            Some(elevation) if row < self.rows && col < self.cols => {
                elevation[row * self.cols + col]
            }
            _ => 0.0,
        }
    }

    /// Elevation under a geographic position, with the same 0.0 fallback.
    pub fn sample_elevation(&self, lat: f64, lon: f64) -> f64 {
        if !lat.is_finite() || !lon.is_finite() {
            return 0.0;
        }
        let (colf, rowf) = self.transform.lonlat_to_cell(lon, lat);
        if rowf < 0.0 || colf < 0.0 {
            return 0.0;
        }
        self.elevation_at(rowf.floor() as usize, colf.floor() as usize)
    }

    /// Grid cell for a geographic position: inverse transform, floored,
    /// clamped into bounds.
    pub fn cell_for_position(&self, lat: f64, lon: f64) -> GridCell {
        let (colf, rowf) = self.transform.lonlat_to_cell(lon, lat);
        let row = (rowf.floor() as i64).clamp(0, self.rows as i64 - 1) as usize;
        let col = (colf.floor() as i64).clamp(0, self.cols as i64 - 1) as usize;
        GridCell::new(row, col)
    }

    /// Geographic position of a grid cell.
    pub fn cell_to_latlon(&self, cell: GridCell) -> (f64, f64) {
        let (lon, lat) = self
            .transform
            .cell_to_lonlat(cell.col as f64, cell.row as f64);
        (lat, lon)
    }
}
