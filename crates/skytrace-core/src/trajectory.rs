//! GPS trace synthesis along a planned multi-segment route.
//!
//! Walks the drone through the ordered waypoint list: plans each
//! consecutive pair through the planner façade, converts the path to
//! geographic legs, and emits time-stamped samples eased along each leg
//! with positional noise and terrain-resampled altitude. A segment the
//! planner cannot solve is logged and skipped; the trace simply omits it.

use crate::error::PlanError;
use crate::grid::WorldGrid;
use crate::models::{PlannedPath, TraceBatch, TrajectoryPoint, Waypoint};
use crate::planner::PathPlanner;
use crate::spatial::{haversine_distance, initial_azimuth_deg};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Interpolation fractions are eased with a logistic curve over this
/// symmetric domain, giving smooth acceleration and deceleration.
const SIGMOID_SPAN: f64 = 6.0;

/// Synthesis tuning owned by the host and passed in whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Cruise speed along the route.
    pub speed_mps: f64,
    /// Sample spacing on the trace clock.
    pub interval_ms: u64,
    /// Standard deviation of the positional noise, in degrees.
    pub gps_noise_std: f64,
    /// Seed for the noise RNG; `None` draws OS entropy.
    pub seed: Option<u64>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            speed_mps: 5.0,
            interval_ms: 1000,
            gps_noise_std: 1e-5,
            seed: None,
        }
    }
}

/// Builds noisy GPS traces from ordered waypoints and a planner.
#[derive(Debug, Clone)]
pub struct TrajectorySynthesizer {
    planner: PathPlanner,
    config: SynthesisConfig,
}

impl TrajectorySynthesizer {
    pub fn new(planner: PathPlanner, config: SynthesisConfig) -> Self {
        Self { planner, config }
    }

    /// Synthesize the full trace for `waypoints`, stamping samples from
    /// `start_time` onward on one strictly increasing clock.
    ///
    /// Identical inputs and a fixed seed reproduce the trace bit for bit;
    /// without a seed the noise stream is not reproducible.
    pub fn synthesize(
        &self,
        grid: &WorldGrid,
        drone_id: &str,
        waypoints: &[Waypoint],
        start_time: DateTime<Utc>,
    ) -> Result<TraceBatch, PlanError> {
        if waypoints.len() < 2 {
            return Err(PlanError::InsufficientWaypoints(waypoints.len()));
        }

        let cells: Vec<_> = waypoints
            .iter()
            .map(|wp| grid.cell_for_position(wp.lat, wp.lon))
            .collect();

        let mut rng = match self.config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let mut data: Vec<TrajectoryPoint> = Vec::new();
        let mut elapsed_ms: i64 = 0;

        for (segment, pair) in cells.windows(2).enumerate() {
            let Some(path) = self.planner.plan(grid, pair[0].into(), pair[1].into()) else {
                tracing::warn!(
                    segment,
                    from = ?pair[0],
                    to = ?pair[1],
                    "skipping unreachable segment"
                );
                continue;
            };

            let leg_points: Vec<(f64, f64)> = match path {
                PlannedPath::Grid(cells) => {
                    cells.iter().map(|&cell| grid.cell_to_latlon(cell)).collect()
                }
                PlannedPath::Geo(points) => {
                    points.iter().map(|p| (p.lat, p.lon)).collect()
                }
            };

            for leg in leg_points.windows(2) {
                self.interpolate_leg(
                    grid,
                    leg[0],
                    leg[1],
                    start_time,
                    &mut elapsed_ms,
                    &mut rng,
                    &mut data,
                );
            }
        }

        Ok(TraceBatch {
            drone_id: drone_id.to_string(),
            data,
        })
    }

    /// Emit the eased, noise-perturbed samples for one geographic leg.
    #[allow(clippy::too_many_arguments)]
    fn interpolate_leg(
        &self,
        grid: &WorldGrid,
        from: (f64, f64),
        to: (f64, f64),
        start_time: DateTime<Utc>,
        elapsed_ms: &mut i64,
        rng: &mut SmallRng,
        data: &mut Vec<TrajectoryPoint>,
    ) {
        let (lat1, lon1) = from;
        let (lat2, lon2) = to;

        let distance_m = haversine_distance(lat1, lon1, lat2, lon2);
        let duration_ms = distance_m / self.config.speed_mps * 1000.0;
        let steps = (duration_ms / self.config.interval_ms as f64) as usize;
        if steps == 0 {
            return;
        }

        // Heading is the leg's departure bearing, constant across its
        // samples.
        let heading_deg = initial_azimuth_deg(lat1, lon1, lat2, lon2);

        for k in 0..steps {
            let t = if steps == 1 {
                -SIGMOID_SPAN
            } else {
                -SIGMOID_SPAN + 2.0 * SIGMOID_SPAN * k as f64 / (steps - 1) as f64
            };
            let eased = sigmoid(t);

            let noise_lat: f64 = rng.sample::<f64, _>(StandardNormal) * self.config.gps_noise_std;
            let noise_lon: f64 = rng.sample::<f64, _>(StandardNormal) * self.config.gps_noise_std;
            let lat = lat1 + (lat2 - lat1) * eased + noise_lat;
            let lon = lon1 + (lon2 - lon1) * eased + noise_lon;

            // Altitude tracks the terrain under the noisy position, not an
            // interpolation between endpoints.
            let altitude_m = grid.sample_elevation(lat, lon);

            data.push(TrajectoryPoint {
                ts: start_time + Duration::milliseconds(*elapsed_ms),
                lat,
                lon,
                altitude_m,
                heading_deg,
            });
            *elapsed_ms += self.config.interval_ms as i64;
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridTransform;
    use crate::models::GridCell;
    use crate::planner::PlannerOptions;

    /// Cells sized to ~10.5 haversine-meters per axis, so a ten-cell leg is
    /// comfortably above the 2-sample interpolation threshold at 5 m/s.
    fn world(rows: usize, cols: usize, blocked: &[(usize, usize)]) -> WorldGrid {
        let meters_per_deg = crate::spatial::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        let lat_step = 10.5 / meters_per_deg;
        let lon_step = 10.5 / (meters_per_deg * 33.7_f64.to_radians().cos());
        let transform =
            GridTransform::north_up(-117.84, 33.7, lon_step, -lat_step).unwrap();
        let mut occupancy = vec![0u8; rows * cols];
        for &(row, col) in blocked {
            occupancy[row * cols + col] = 1;
        }
        let elevation: Vec<f64> = (0..rows * cols).map(|i| (i % 7) as f64 + 40.0).collect();
        WorldGrid::new(rows, cols, occupancy, Some(elevation), transform).unwrap()
    }

    fn synthesizer(seed: u64) -> TrajectorySynthesizer {
        let planner = PathPlanner::new("astar", PlannerOptions::default()).unwrap();
        TrajectorySynthesizer::new(
            planner,
            SynthesisConfig {
                speed_mps: 5.0,
                interval_ms: 1000,
                gps_noise_std: 1e-6,
                seed: Some(seed),
            },
        )
    }

    fn waypoint_at(grid: &WorldGrid, cell: GridCell) -> Waypoint {
        let (lat, lon) = grid.cell_to_latlon(cell);
        Waypoint::new(lat, lon)
    }

    #[test]
    fn too_few_waypoints_is_an_error() {
        let grid = world(8, 8, &[]);
        let result = synthesizer(1).synthesize(
            &grid,
            "drone_1",
            &[waypoint_at(&grid, GridCell::new(1, 1))],
            Utc::now(),
        );
        assert!(matches!(result, Err(PlanError::InsufficientWaypoints(1))));
    }

    #[test]
    fn timestamps_strictly_increase_and_headings_in_range() {
        let grid = world(12, 12, &[]);
        let waypoints = vec![
            waypoint_at(&grid, GridCell::new(1, 1)),
            waypoint_at(&grid, GridCell::new(10, 2)),
            waypoint_at(&grid, GridCell::new(4, 10)),
        ];
        let batch = synthesizer(2)
            .synthesize(&grid, "drone_1", &waypoints, Utc::now())
            .unwrap();
        assert!(!batch.data.is_empty());
        for pair in batch.data.windows(2) {
            assert!(pair[1].ts > pair[0].ts, "timestamps must strictly increase");
        }
        for point in &batch.data {
            assert!(
                (0.0..360.0).contains(&point.heading_deg),
                "heading out of range: {}",
                point.heading_deg
            );
        }
    }

    #[test]
    fn hundred_meters_at_five_mps_yields_about_twenty_points() {
        // Two waypoints ten cells (~100 m) apart in one column: 5 m/s and
        // 1000 ms sampling gives ~20 points spaced exactly one interval.
        let grid = world(14, 6, &[]);
        let waypoints = vec![
            waypoint_at(&grid, GridCell::new(1, 2)),
            waypoint_at(&grid, GridCell::new(11, 2)),
        ];
        let batch = synthesizer(3)
            .synthesize(&grid, "drone_1", &waypoints, Utc::now())
            .unwrap();

        let count = batch.data.len();
        assert!(
            (18..=22).contains(&count),
            "expected ~20 samples, got {count}"
        );
        for pair in batch.data.windows(2) {
            let delta_ms = (pair[1].ts - pair[0].ts).num_milliseconds();
            assert_eq!(delta_ms, 1000);
        }
    }

    #[test]
    fn unreachable_segment_is_skipped_not_fatal() {
        // A wall splits the grid: waypoint 0 is on the left, 1 and 2 on the
        // right. Segment 0->1 cannot be planned and is dropped; segment
        // 1->2 still produces samples.
        let blocked: Vec<(usize, usize)> = (0..12).map(|row| (row, 6)).collect();
        let grid = world(12, 12, &blocked);
        let waypoints = vec![
            waypoint_at(&grid, GridCell::new(5, 2)),
            waypoint_at(&grid, GridCell::new(2, 9)),
            waypoint_at(&grid, GridCell::new(10, 9)),
        ];
        let batch = synthesizer(4)
            .synthesize(&grid, "drone_1", &waypoints, Utc::now())
            .unwrap();
        assert!(!batch.data.is_empty(), "reachable segment must still be traced");
        // Every sample lies on the right half: the skipped segment left no
        // points near waypoint 0.
        let (_, wall_lon) = grid.cell_to_latlon(GridCell::new(0, 6));
        for point in &batch.data {
            assert!(point.lon > wall_lon, "sample leaked from skipped segment");
        }
    }

    #[test]
    fn altitude_resampled_from_terrain() {
        let grid = world(10, 10, &[]);
        let waypoints = vec![
            waypoint_at(&grid, GridCell::new(1, 1)),
            waypoint_at(&grid, GridCell::new(8, 8)),
        ];
        let batch = synthesizer(5)
            .synthesize(&grid, "drone_1", &waypoints, Utc::now())
            .unwrap();
        for point in &batch.data {
            // The synthetic elevation field lives in [40, 47); anything
            // outside means altitude was interpolated instead of sampled.
            assert!((40.0..47.0).contains(&point.altitude_m));
        }
    }

    #[test]
    fn fixed_seed_reproduces_trace() {
        let grid = world(10, 10, &[]);
        let waypoints = vec![
            waypoint_at(&grid, GridCell::new(1, 1)),
            waypoint_at(&grid, GridCell::new(8, 3)),
        ];
        let start = Utc::now();
        let a = synthesizer(6).synthesize(&grid, "drone_1", &waypoints, start).unwrap();
        let b = synthesizer(6).synthesize(&grid, "drone_1", &waypoints, start).unwrap();
        let a_json = serde_json::to_string(&a).unwrap();
        let b_json = serde_json::to_string(&b).unwrap();
        assert_eq!(a_json, b_json);
    }
}
