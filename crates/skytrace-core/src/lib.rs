pub mod astar;
pub mod error;
pub mod grid;
pub mod models;
pub mod planner;
pub mod rrt;
pub mod rrt_star;
pub mod spatial;
pub mod tour;
pub mod trajectory;

pub use astar::AStarPlanner;
pub use error::PlanError;
pub use grid::{GridTransform, WorldGrid};
pub use models::{
    GeoPoint, GridCell, PlannedPath, Tour, TraceBatch, TrajectoryPoint, Waypoint,
};
pub use planner::{PathPlanner, PlanPoint, PlannerOptions, PlannerVariant};
pub use rrt::Rrt;
pub use rrt_star::RrtStar;
pub use spatial::haversine_distance;
pub use tour::{compute_cost_matrix, order_waypoints, solve_tour, TourMetric};
pub use trajectory::{SynthesisConfig, TrajectorySynthesizer};
