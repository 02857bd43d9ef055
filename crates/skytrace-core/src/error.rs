//! Error taxonomy for planner and tour configuration.
//!
//! A planner that exhausts its budget is not an error: `find_path` returns
//! `None` so callers can apply their own per-segment policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    /// Planner variant name not recognized. Raised at construction time.
    #[error("unsupported planner variant: {0}")]
    UnsupportedVariant(String),

    /// Tour metric name not recognized. Raised at selection time.
    #[error("unsupported tour metric: {0}")]
    UnsupportedMetric(String),

    /// Malformed grid or non-invertible geographic transform.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Trace synthesis needs at least two waypoints to form a segment.
    #[error("need at least 2 waypoints to synthesize a trace, got {0}")]
    InsufficientWaypoints(usize),
}
