//! Spatial math for distance, scaling, and heading calculations.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Calculate distance between two points in meters using the Haversine
/// formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Great-circle distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial forward azimuth from point 1 to point 2 in degrees, [0, 360).
///
/// Computed on the WGS84 ellipsoid using reduced latitudes, so headings
/// match what a geodesic inverse solution reports for the departure bearing.
/// Coincident points yield 0.0.
pub fn initial_azimuth_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if (lat1 - lat2).abs() < f64::EPSILON && (lon1 - lon2).abs() < f64::EPSILON {
        return 0.0;
    }

    let u1 = ((1.0 - WGS84_F) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * lat2.to_radians().tan()).atan();
    let dlambda = (lon2 - lon1).to_radians();

    let x = dlambda.sin() * u2.cos();
    let y = u1.cos() * u2.sin() - u1.sin() * u2.cos() * dlambda.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

// ==== Degree/meter scaling (WGS84 series approximations) ====

/// Meters per degree of latitude at a given latitude.
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude.
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lat(ref_lat_deg).max(1e-9)
}

/// Convert an east/west offset in meters to degrees longitude.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lon(ref_lat_deg).max(1e-9)
}
