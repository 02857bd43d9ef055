//! Record a synthetic drone trace end to end.
//!
//! Builds a procedural world grid around an origin (standing in for the
//! external DEM/building pipeline), generates a waypoint ring, orders it
//! with the tour solver, synthesizes the GPS trace, and writes the batch
//! as JSON.
//!
//! Usage:
//!   cargo run -p skytrace-cli --bin record_trace -- --planner astar

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use skytrace_core::spatial::{meters_to_lat, meters_to_lon};
use skytrace_core::{
    GridTransform, PathPlanner, PlannerOptions, SynthesisConfig, TourMetric,
    TrajectorySynthesizer, Waypoint, WorldGrid,
};
use std::f64::consts::TAU;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Irvine coordinates (flight hub)
const DEFAULT_LAT: f64 = 33.6846;
const DEFAULT_LON: f64 = -117.8265;

/// World grid parameters
const GRID_ROWS: usize = 96;
const GRID_COLS: usize = 96;
const CELL_SIZE_M: f64 = 10.0;

/// Waypoint ring radius around the origin
const RING_RADIUS_M: f64 = 350.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthesize a drone GPS trace over a procedural world")]
struct Args {
    /// Drone ID stamped on the emitted batch
    #[arg(long, default_value = "drone_1")]
    drone_id: String,

    /// World origin latitude
    #[arg(long, default_value_t = DEFAULT_LAT)]
    origin_lat: f64,

    /// World origin longitude
    #[arg(long, default_value_t = DEFAULT_LON)]
    origin_lon: f64,

    /// Planner variant: astar, rrt, rrt*, geo_rrt, geo_rrt*
    #[arg(long, default_value = "astar")]
    planner: String,

    /// Tour metric: euclidean or geodesic
    #[arg(long, default_value = "geodesic")]
    metric: String,

    /// Number of waypoints to visit
    #[arg(long, default_value_t = 8)]
    waypoints: usize,

    /// Cruise speed in m/s
    #[arg(long, default_value_t = 5.0)]
    speed_mps: f64,

    /// Trace sample interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// GPS noise standard deviation in degrees
    #[arg(long, default_value_t = 1e-5)]
    noise_std: f64,

    /// Elevation penalty for the grid-search planner
    #[arg(long, default_value_t = 0.01)]
    elevation_penalty: f64,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write the JSON batch here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let grid = build_world(args.origin_lat, args.origin_lon)?;
    let raw_waypoints = ring_waypoints(args.origin_lat, args.origin_lon, args.waypoints);
    tracing::info!(count = raw_waypoints.len(), "generated waypoint ring");

    let metric: TourMetric = args.metric.parse()?;
    let (ordered, tour) = skytrace_core::order_waypoints(&raw_waypoints, metric);
    tracing::info!(cost = tour.cost, "ordered waypoints");

    let planner = PathPlanner::new(
        &args.planner,
        PlannerOptions {
            elevation_penalty: args.elevation_penalty,
            step_size: 1.5,
            max_iterations: 1500,
            target_radius: 1.5,
            seed: args.seed,
        },
    )?;

    let synthesizer = TrajectorySynthesizer::new(
        planner,
        SynthesisConfig {
            speed_mps: args.speed_mps,
            interval_ms: args.interval_ms,
            gps_noise_std: args.noise_std,
            seed: args.seed,
        },
    );

    let batch = synthesizer.synthesize(&grid, &args.drone_id, &ordered, Utc::now())?;
    tracing::info!(points = batch.data.len(), "synthesized trace");

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(file, &batch)?;
            tracing::info!(path = %path.display(), "wrote trace batch");
        }
        None => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &batch)?;
            println!();
        }
    }

    Ok(())
}

/// Procedural world: rolling terrain plus a few block obstacles, anchored
/// so the origin sits at the grid center.
fn build_world(origin_lat: f64, origin_lon: f64) -> Result<WorldGrid> {
    let half_rows_m = GRID_ROWS as f64 / 2.0 * CELL_SIZE_M;
    let half_cols_m = GRID_COLS as f64 / 2.0 * CELL_SIZE_M;
    let lat_step = -meters_to_lat(CELL_SIZE_M, origin_lat);
    let lon_step = meters_to_lon(CELL_SIZE_M, origin_lat);
    let nw_lat = origin_lat + meters_to_lat(half_rows_m, origin_lat);
    let nw_lon = origin_lon - meters_to_lon(half_cols_m, origin_lat);
    let transform = GridTransform::north_up(nw_lon, nw_lat, lon_step, lat_step)?;

    let mut occupancy = vec![0u8; GRID_ROWS * GRID_COLS];
    let mut elevation = vec![0.0f64; GRID_ROWS * GRID_COLS];
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let idx = row * GRID_COLS + col;
            elevation[idx] = 55.0
                + 14.0 * (row as f64 * 0.13).sin() * (col as f64 * 0.11).cos()
                + 4.0 * (row as f64 * 0.31).cos();
        }
    }

    // A few city-block obstacles near the middle of the grid.
    for (top, left, height, width) in [
        (30usize, 40usize, 6usize, 10usize),
        (52, 22, 8, 6),
        (60, 60, 5, 12),
    ] {
        for row in top..top + height {
            for col in left..left + width {
                occupancy[row * GRID_COLS + col] = 1;
            }
        }
    }

    Ok(WorldGrid::new(
        GRID_ROWS,
        GRID_COLS,
        occupancy,
        Some(elevation),
        transform,
    )?)
}

/// Waypoints on an irregular ring around the origin, the shape the
/// building-survey pipeline tends to produce.
fn ring_waypoints(origin_lat: f64, origin_lon: f64, count: usize) -> Vec<Waypoint> {
    (0..count)
        .map(|k| {
            let angle = TAU * k as f64 / count.max(1) as f64;
            let radius = RING_RADIUS_M * if k % 2 == 0 { 1.0 } else { 0.72 };
            let north_m = radius * angle.cos();
            let east_m = radius * angle.sin();
            Waypoint::new(
                origin_lat + meters_to_lat(north_m, origin_lat),
                origin_lon + meters_to_lon(east_m, origin_lat),
            )
        })
        .collect()
}
