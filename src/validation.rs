//! Diagnostics comparing a reconstructed route with the edges the solver marked as used.
//!
//! A route of `n` stations accounts for `n - 1` edges. Any difference to the number of
//! used edges means part of the vehicle's edges could not be reached from the origin.
//! Nothing here rejects or corrects a route, it is only reported.

use crate::solution::{Edge, VehicleId};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

const BANNER_WIDTH: usize = 80;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    /// Used edges of the vehicle in the solution
    pub edge_count: usize,
    /// Stations in the reconstructed route, origin included
    pub station_count: usize,
    pub expected_edges: usize,
    pub mismatch: bool,
    /// Positive if edges were left out of the route, negative if the route has more
    pub missing_count: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteStatus {
    Unused,
    Consistent,
    Missing(usize),
    Extra(usize),
}

impl ValidationReport {
    pub fn status(&self) -> RouteStatus {
        if self.edge_count == 0 {
            RouteStatus::Unused
        } else if !self.mismatch {
            RouteStatus::Consistent
        } else if self.missing_count > 0 {
            RouteStatus::Missing(self.missing_count.unsigned_abs() as usize)
        } else {
            RouteStatus::Extra(self.missing_count.unsigned_abs() as usize)
        }
    }
}

/// Compare a route with the number of used edges of its vehicle
pub fn validate(route: &[String], used_edge_count: usize) -> ValidationReport {
    let expected_edges = route.len().saturating_sub(1);
    ValidationReport {
        edge_count: used_edge_count,
        station_count: route.len(),
        expected_edges,
        mismatch: expected_edges != used_edge_count,
        missing_count: used_edge_count as i64 - expected_edges as i64,
    }
}

/// Everything printed about one vehicle
#[derive(Clone, Debug)]
pub struct VehicleReport {
    pub vehicle: VehicleId,
    pub route: Vec<String>,
    pub validation: ValidationReport,
    pub unvisited: Vec<Edge>,
}

impl fmt::Display for VehicleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.validation.status();
        if status == RouteStatus::Unused {
            return writeln!(f, "\n{}: Not used (0 edges)", self.vehicle);
        }

        writeln!(f, "\n{}:", self.vehicle)?;
        writeln!(f, "  Total edges in solution: {}", self.validation.edge_count)?;
        writeln!(
            f,
            "  Stations in reconstructed route: {}",
            self.validation.station_count
        )?;
        writeln!(
            f,
            "  Expected edges from route: {}",
            self.validation.expected_edges
        )?;
        writeln!(f, "  Route: {}", self.route.join(" → "))?;

        match status {
            RouteStatus::Missing(n) => writeln!(f, "  WARNING: Mismatch! Missing {} edges", n)?,
            RouteStatus::Extra(n) => writeln!(f, "  WARNING: Mismatch! {} extra edges", n)?,
            RouteStatus::Unused | RouteStatus::Consistent => {}
        }

        if !self.unvisited.is_empty() {
            let edges: Vec<String> = self
                .unvisited
                .iter()
                .map(|edge| format!("{} → {}", edge.from, edge.to))
                .collect();
            writeln!(f, "  Unvisited edges: {}", edges.join(", "))?;
        }

        Ok(())
    }
}

/// Write the validation summary of all vehicles, framed by a banner
pub fn write_report<W: Write>(mut out: W, reports: &[VehicleReport]) -> io::Result<()> {
    let rule = "=".repeat(BANNER_WIDTH);
    writeln!(out, "\n{}", rule)?;
    writeln!(out, "ROUTE VALIDATION")?;
    writeln!(out, "{}", rule)?;
    for report in reports {
        write!(out, "{}", report)?;
    }
    writeln!(out, "{}\n", rule)?;
    Ok(())
}
