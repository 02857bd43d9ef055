//! Waypoint visiting-order solver.
//!
//! Builds a symmetric cost matrix over the waypoint set, then computes an
//! approximate minimum-weight Hamiltonian cycle Christofides-style: minimum
//! spanning tree, minimum-weight pairing of the odd-degree vertices, Euler
//! circuit, shortcut. Both supported metrics satisfy the triangle
//! inequality, which the shortcut step relies on.

use crate::error::PlanError;
use crate::models::{Tour, Waypoint};
use crate::spatial::haversine_distance;
use petgraph::algo::min_spanning_tree;
use petgraph::data::FromElements;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Distance metric for the cost matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourMetric {
    /// Straight-line distance over raw (lat, lon) coordinates.
    Euclidean,
    /// Great-circle distance in meters.
    Geodesic,
}

impl FromStr for TourMetric {
    type Err = PlanError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(TourMetric::Euclidean),
            "geodesic" => Ok(TourMetric::Geodesic),
            other => Err(PlanError::UnsupportedMetric(other.to_string())),
        }
    }
}

impl TourMetric {
    fn distance(&self, a: &Waypoint, b: &Waypoint) -> f64 {
        match self {
            TourMetric::Euclidean => {
                let dlat = a.lat - b.lat;
                let dlon = a.lon - b.lon;
                (dlat * dlat + dlon * dlon).sqrt()
            }
            TourMetric::Geodesic => haversine_distance(a.lat, a.lon, b.lat, b.lon),
        }
    }
}

/// Symmetric zero-diagonal cost matrix between all waypoint pairs.
pub fn compute_cost_matrix(waypoints: &[Waypoint], metric: TourMetric) -> Vec<Vec<f64>> {
    let n = waypoints.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..i {
            let dist = metric.distance(&waypoints[i], &waypoints[j]);
            matrix[i][j] = dist;
            matrix[j][i] = dist;
        }
    }
    matrix
}

/// Approximate minimum-weight visiting cycle over a cost matrix.
pub fn solve_tour(matrix: &[Vec<f64>]) -> Tour {
    let n = matrix.len();
    if n == 0 {
        return Tour {
            order: Vec::new(),
            cost: 0.0,
        };
    }
    if n == 1 {
        return Tour {
            order: vec![0],
            cost: 0.0,
        };
    }

    // Complete undirected weighted graph, then its MST.
    let mut graph: UnGraph<(), f64> = UnGraph::new_undirected();
    let indices: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
    for i in 0..n {
        for j in 0..i {
            graph.add_edge(indices[i], indices[j], matrix[i][j]);
        }
    }
    let mst: UnGraph<(), f64> = UnGraph::from_elements(min_spanning_tree(&graph));

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in mst.edge_references() {
        let a = edge.source().index();
        let b = edge.target().index();
        adjacency[a].push(b);
        adjacency[b].push(a);
    }

    // Pair up the odd-degree vertices by ascending edge weight so the
    // augmented multigraph becomes Eulerian.
    let odd: Vec<usize> = (0..n).filter(|&v| adjacency[v].len() % 2 == 1).collect();
    let mut candidate_pairs: Vec<(f64, usize, usize)> = Vec::new();
    for (i, &u) in odd.iter().enumerate() {
        for &v in &odd[i + 1..] {
            candidate_pairs.push((matrix[u][v], u, v));
        }
    }
    candidate_pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut matched = vec![false; n];
    for (_, u, v) in candidate_pairs {
        if !matched[u] && !matched[v] {
            matched[u] = true;
            matched[v] = true;
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
    }

    let circuit = euler_circuit(adjacency);

    // Shortcut repeated vertices; the triangle inequality guarantees this
    // never lengthens the cycle.
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for v in circuit {
        if !seen[v] {
            seen[v] = true;
            order.push(v);
        }
    }

    let mut cost = 0.0;
    for pair in order.windows(2) {
        cost += matrix[pair[0]][pair[1]];
    }
    cost += matrix[order[n - 1]][order[0]];

    Tour { order, cost }
}

/// Order a waypoint list: returns the reordered waypoints and the tour.
pub fn order_waypoints(
    waypoints: &[Waypoint],
    metric: TourMetric,
) -> (Vec<Waypoint>, Tour) {
    let matrix = compute_cost_matrix(waypoints, metric);
    let tour = solve_tour(&matrix);
    let ordered = tour
        .order
        .iter()
        .map(|&i| waypoints[i].clone())
        .collect();
    (ordered, tour)
}

/// Hierholzer's algorithm over a connected even-degree multigraph.
fn euler_circuit(mut adjacency: Vec<Vec<usize>>) -> Vec<usize> {
    let mut stack = vec![0usize];
    let mut circuit = Vec::new();
    while let Some(&v) = stack.last() {
        if let Some(u) = adjacency[v].pop() {
            // Remove one copy of the reverse edge.
            if let Some(pos) = adjacency[u].iter().position(|&w| w == v) {
                adjacency[u].swap_remove(pos);
            }
            stack.push(u);
        } else {
            circuit.push(v);
            stack.pop();
        }
    }
    circuit
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_waypoints(count: usize, seed: u64) -> Vec<Waypoint> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Waypoint::new(
                    33.6 + rng.random_range(-0.05..0.05),
                    -117.8 + rng.random_range(-0.05..0.05),
                )
            })
            .collect()
    }

    /// Prim's MST weight, the lower bound used by the approximation test.
    fn mst_weight(matrix: &[Vec<f64>]) -> f64 {
        let n = matrix.len();
        let mut in_tree = vec![false; n];
        let mut best = vec![f64::INFINITY; n];
        best[0] = 0.0;
        let mut total = 0.0;
        for _ in 0..n {
            let v = (0..n)
                .filter(|&v| !in_tree[v])
                .min_by(|&a, &b| best[a].total_cmp(&best[b]))
                .unwrap();
            in_tree[v] = true;
            total += best[v];
            for u in 0..n {
                if !in_tree[u] && matrix[v][u] < best[u] {
                    best[u] = matrix[v][u];
                }
            }
        }
        total
    }

    #[test]
    fn unsupported_metric_is_rejected() {
        let result = "chebyshev".parse::<TourMetric>();
        assert!(matches!(result, Err(PlanError::UnsupportedMetric(name)) if name == "chebyshev"));
    }

    #[test]
    fn tour_is_a_permutation() {
        for seed in [1, 2, 3] {
            let waypoints = random_waypoints(12, seed);
            let matrix = compute_cost_matrix(&waypoints, TourMetric::Geodesic);
            let tour = solve_tour(&matrix);
            assert_eq!(tour.order.len(), waypoints.len());
            let mut sorted = tour.order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..waypoints.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn tour_cost_within_approximation_bound() {
        // The tour is an MST walk with shortcuts, so its cost never exceeds
        // twice the MST weight, itself a lower bound on the optimal cycle.
        for seed in [5, 6, 7, 8] {
            let waypoints = random_waypoints(15, seed);
            let matrix = compute_cost_matrix(&waypoints, TourMetric::Geodesic);
            let tour = solve_tour(&matrix);
            let lower_bound = mst_weight(&matrix);
            assert!(
                tour.cost <= 2.0 * lower_bound + 1e-6,
                "tour cost {} exceeds 2x MST bound {}",
                tour.cost,
                lower_bound
            );
        }
    }

    #[test]
    fn two_waypoints_tour_is_out_and_back() {
        let waypoints = vec![
            Waypoint::new(33.0, -117.0),
            Waypoint::new(33.01, -117.0),
        ];
        let matrix = compute_cost_matrix(&waypoints, TourMetric::Geodesic);
        let tour = solve_tour(&matrix);
        assert_eq!(tour.order.len(), 2);
        assert!((tour.cost - 2.0 * matrix[0][1]).abs() < 1e-9);
    }

    #[test]
    fn cost_matrix_is_symmetric_with_zero_diagonal() {
        let waypoints = random_waypoints(6, 9);
        for metric in [TourMetric::Euclidean, TourMetric::Geodesic] {
            let matrix = compute_cost_matrix(&waypoints, metric);
            for i in 0..waypoints.len() {
                assert_eq!(matrix[i][i], 0.0);
                for j in 0..waypoints.len() {
                    assert_eq!(matrix[i][j], matrix[j][i]);
                }
            }
        }
    }

    #[test]
    fn ordered_waypoints_follow_tour_order() {
        let waypoints = random_waypoints(8, 21);
        let (ordered, tour) = order_waypoints(&waypoints, TourMetric::Euclidean);
        assert_eq!(ordered.len(), waypoints.len());
        for (position, &index) in tour.order.iter().enumerate() {
            assert_eq!(ordered[position].lat, waypoints[index].lat);
            assert_eq!(ordered[position].lon, waypoints[index].lon);
        }
    }
}
