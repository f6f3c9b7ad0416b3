use log::{debug, warn};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

mod error;
pub mod map;
pub mod solution;
pub mod stations;
pub mod validation;

pub use error::{Error, Result};
pub use solution::{Edge, Solution, VehicleId};
pub use stations::{Coordinate, Station, StationKind, StationTable};
pub use validation::{validate, RouteStatus, ValidationReport, VehicleReport};

/// Name of the depot every route starts from
pub const ORIGIN: &str = "Warehouse";

/// An ordered list of station names, starting at the origin
pub type Route = Vec<String>;

/// The used edges of one vehicle as a directed graph
/// Edge indices follow input order, so the smallest remaining index out of a station
/// is the first eligible edge in the input. Consumed edges are removed from the graph.
#[derive(Clone, Debug)]
pub struct VehicleGraph {
    graph: StableDiGraph<String, ()>,
    station_node_id: HashMap<String, NodeIndex>,
}

impl VehicleGraph {
    pub fn new(edges: &[Edge]) -> VehicleGraph {
        let mut graph = StableDiGraph::new();
        let mut station_node_id: HashMap<String, NodeIndex> = HashMap::new();

        for edge in edges {
            let source = *station_node_id
                .entry(edge.from.clone())
                .or_insert_with(|| graph.add_node(edge.from.clone()));
            let target = *station_node_id
                .entry(edge.to.clone())
                .or_insert_with(|| graph.add_node(edge.to.clone()));
            graph.add_edge(source, target, ());
        }

        VehicleGraph {
            graph,
            station_node_id,
        }
    }

    /// Follow the first unused outgoing edge until none is left
    fn walk(mut self, origin: &str) -> Route {
        let mut route = vec![origin.to_string()];
        let Some(mut current) = self.station_node_id.get(origin).copied() else {
            return route;
        };

        loop {
            let next = self
                .graph
                .edges(current)
                .min_by_key(|edge| edge.id())
                .map(|edge| edge.target());
            let Some(next) = next else {
                break;
            };

            // The pair is consumed as a whole, repeated rows of the same edge go with it
            while let Some(edge) = self.graph.find_edge(current, next) {
                self.graph.remove_edge(edge);
            }

            route.push(self.graph[next].clone());
            current = next;
        }

        route
    }
}

/// Reconstruct the route of one vehicle from its used edges
/// The walk starts at `origin` and stops at the first station without an unused outgoing
/// edge. Edges that are not reachable that way are not part of the result.
pub fn reconstruct(origin: &str, edges: &[Edge]) -> Route {
    VehicleGraph::new(edges).walk(origin)
}

/// The used edges that the route does not traverse, in input order
pub fn unvisited_edges(route: &[String], edges: &[Edge]) -> Vec<Edge> {
    let traversed: HashSet<(&str, &str)> = route
        .windows(2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .collect();
    edges
        .iter()
        .filter(|edge| !traversed.contains(&(edge.from.as_str(), edge.to.as_str())))
        .cloned()
        .collect()
}

/// Coordinates of a vehicle's route. A vehicle without used edges gets an empty list
/// and its route is not looked up.
pub fn route_coordinates(
    table: &StationTable,
    solution: &Solution,
    vehicle: &str,
    route: &[String],
) -> Result<Vec<Coordinate>> {
    if solution.used_edges(vehicle).is_empty() {
        return Ok(Vec::new());
    }
    table.coordinates(route)
}

/// Reconstruct the routes of every vehicle in the solution, in vehicle order
pub fn reconstruct_all(solution: &Solution, origin: &str, parallel: bool) -> Vec<(VehicleId, Route)> {
    let rebuild = |vehicle: &VehicleId| {
        let route = reconstruct(origin, solution.used_edges(vehicle));
        debug!("{}: {} stations in reconstructed route", vehicle, route.len());
        (vehicle.clone(), route)
    };

    if parallel {
        debug!(
            "Reconstructing {} routes in parallel",
            solution.vehicles().len()
        );
        solution.vehicles().par_iter().map(rebuild).collect()
    } else {
        warn!("Not using parallel processing!");
        solution.vehicles().iter().map(rebuild).collect()
    }
}

/// Validate every reconstructed route against the used edges of its vehicle
pub fn validate_all(solution: &Solution, routes: &[(VehicleId, Route)]) -> Vec<VehicleReport> {
    routes
        .iter()
        .map(|(vehicle, route)| {
            let edges = solution.used_edges(vehicle);
            let report = VehicleReport {
                vehicle: vehicle.clone(),
                route: route.clone(),
                validation: validate(route, edges.len()),
                unvisited: unvisited_edges(route, edges),
            };
            if report.validation.mismatch {
                warn!(
                    "{}: route covers {} of {} used edges",
                    vehicle, report.validation.expected_edges, report.validation.edge_count
                );
            }
            report
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS_PATH: &str = "test/stations_small.csv";
    const SOLUTION_PATH: &str = "test/solution_small.csv";
    const ZERO_FLOW_PATH: &str = "test/solution_zero_flow.csv";

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs.iter().map(|(from, to)| Edge::new(from, to)).collect()
    }

    fn names(route: &[&str]) -> Route {
        route.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_path() {
        let edges = edges(&[("Warehouse", "B"), ("B", "A")]);
        let route = reconstruct(ORIGIN, &edges);
        assert_eq!(route, names(&["Warehouse", "B", "A"]));
        assert!(!validate(&route, edges.len()).mismatch);
    }

    #[test]
    fn test_path_given_out_of_order() {
        let edges = edges(&[("C", "Warehouse"), ("B", "C"), ("A", "B"), ("Warehouse", "A")]);
        let route = reconstruct(ORIGIN, &edges);
        assert_eq!(route, names(&["Warehouse", "A", "B", "C", "Warehouse"]));
        assert!(unvisited_edges(&route, &edges).is_empty());
    }

    #[test]
    fn test_no_edges() {
        let route = reconstruct(ORIGIN, &[]);
        assert_eq!(route, names(&["Warehouse"]));
        let report = validate(&route, 0);
        assert_eq!(report.expected_edges, 0);
        assert_eq!(report.status(), RouteStatus::Unused);
    }

    #[test]
    fn test_no_edge_from_origin() {
        let edges = edges(&[("A", "B")]);
        assert_eq!(reconstruct(ORIGIN, &edges), names(&["Warehouse"]));
    }

    #[test]
    fn test_disconnected_edge() {
        let edges = edges(&[("Warehouse", "A"), ("A", "B"), ("C", "D")]);
        let route = reconstruct(ORIGIN, &edges);
        assert!(route.len() - 1 < edges.len());
        let report = validate(&route, edges.len());
        assert!(report.mismatch);
        assert_eq!(report.missing_count, 1);
        assert_eq!(unvisited_edges(&route, &edges), vec![Edge::new("C", "D")]);
    }

    #[test]
    fn test_branch_takes_first_in_input_order() {
        let edges = edges(&[("Warehouse", "A"), ("A", "C"), ("A", "B"), ("C", "A")]);
        let route = reconstruct(ORIGIN, &edges);
        assert_eq!(route, names(&["Warehouse", "A", "C", "A", "B"]));
    }

    #[test]
    fn test_cycle_stops_at_consumed_edge() {
        let edges = edges(&[("Warehouse", "A"), ("A", "B"), ("B", "A"), ("X", "Y")]);
        let route = reconstruct(ORIGIN, &edges);
        assert_eq!(route, names(&["Warehouse", "A", "B", "A"]));
        assert_eq!(validate(&route, edges.len()).missing_count, 1);
    }

    #[test]
    fn test_duplicate_edges_consumed_together() {
        let edges = edges(&[("Warehouse", "A"), ("A", "Warehouse"), ("Warehouse", "A")]);
        let route = reconstruct(ORIGIN, &edges);
        assert_eq!(route, names(&["Warehouse", "A", "Warehouse"]));
        assert!(validate(&route, edges.len()).mismatch);
    }

    #[test]
    fn test_reconstruct_is_deterministic() {
        let edges = edges(&[("Warehouse", "A"), ("A", "B"), ("A", "C"), ("B", "Warehouse")]);
        assert_eq!(reconstruct(ORIGIN, &edges), reconstruct(ORIGIN, &edges));
    }

    #[test]
    fn test_concrete_scenario() {
        let table = StationTable::from_stations(
            vec![
                Station {
                    name: "Warehouse".to_string(),
                    latitude: 0.0,
                    longitude: 0.0,
                    net_flow: 0.0,
                },
                Station {
                    name: "A".to_string(),
                    latitude: 1.0,
                    longitude: 1.0,
                    net_flow: -5.0,
                },
                Station {
                    name: "B".to_string(),
                    latitude: 2.0,
                    longitude: 2.0,
                    net_flow: 3.0,
                },
            ],
            ORIGIN,
        );
        let mut solution = Solution::default();
        solution.push("X", Edge::new("Warehouse", "B"), true);
        solution.push("X", Edge::new("B", "A"), true);

        let routes = reconstruct_all(&solution, ORIGIN, false);
        assert_eq!(routes, vec![("X".to_string(), names(&["Warehouse", "B", "A"]))]);

        let coords = table.coordinates(&routes[0].1).unwrap();
        assert_eq!(coords, vec![(0.0, 0.0), (2.0, 2.0), (1.0, 1.0)]);

        let report = validate(&routes[0].1, solution.used_edges("X").len());
        assert_eq!(report.expected_edges, 2);
        assert_eq!(report.edge_count, 2);
        assert!(!report.mismatch);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let solution = Solution::load(SOLUTION_PATH).unwrap();
        assert_eq!(
            reconstruct_all(&solution, ORIGIN, true),
            reconstruct_all(&solution, ORIGIN, false)
        );
    }

    #[test]
    fn test_validate_small_solution() {
        let solution = Solution::load(SOLUTION_PATH).unwrap();
        let routes = reconstruct_all(&solution, ORIGIN, true);
        let reports = validate_all(&solution, &routes);

        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports[0].route,
            names(&["Warehouse", "Riverside", "North Gate", "Warehouse"])
        );
        assert_eq!(reports[0].validation.status(), RouteStatus::Consistent);

        assert_eq!(reports[1].route, names(&["Warehouse", "Market Square", "Hillside"]));
        assert_eq!(reports[1].validation.status(), RouteStatus::Missing(1));
        assert_eq!(reports[1].unvisited, vec![Edge::new("Riverside", "Hillside")]);

        assert_eq!(reports[2].validation.status(), RouteStatus::Unused);
    }

    #[test]
    fn test_unused_vehicle_needs_no_origin_row() {
        let table = StationTable::from_stations(
            vec![Station {
                name: "A".to_string(),
                latitude: 1.0,
                longitude: 1.0,
                net_flow: -2.0,
            }],
            ORIGIN,
        );
        let mut solution = Solution::default();
        solution.push("X", Edge::new("Warehouse", "A"), false);

        let routes = reconstruct_all(&solution, ORIGIN, false);
        assert_eq!(routes[0].1, names(&["Warehouse"]));
        let coords = route_coordinates(&table, &solution, "X", &routes[0].1).unwrap();
        assert!(coords.is_empty());
    }

    #[test]
    fn test_zero_flow_station_on_route() {
        let table = StationTable::load(STATIONS_PATH, ORIGIN).unwrap();
        let solution = Solution::load(ZERO_FLOW_PATH).unwrap();
        let routes = reconstruct_all(&solution, ORIGIN, false);
        match table.coordinates(&routes[0].1) {
            Err(Error::StationNotFound { station }) => assert_eq!(station, "Depot Annex"),
            other => panic!("Expected StationNotFound, got {:?}", other),
        }
    }
}
