use crate::error::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub type VehicleId = String;

/// How far a solver value may drift from 0 or 1 and still count as a flag
const FLAG_TOLERANCE: f64 = 1e-6;

/// A directed edge between two stations, identified by name
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: &str, to: &str) -> Edge {
        Edge {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// A row of the results CSV (`bus,from,to,value`)
#[derive(Deserialize, Debug)]
struct ResultRow {
    bus: VehicleId,
    from: String,
    to: String,
    value: f64,
}

/// The solver output: every vehicle that appears in the results, and the edges each one uses
#[derive(Clone, Debug, Default)]
pub struct Solution {
    vehicles: Vec<VehicleId>,
    used_edges: HashMap<VehicleId, Vec<Edge>>,
}

impl Solution {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Solution> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let solution = read_solution(BufReader::new(file), path)?;
        info!(
            "Read {} vehicles with {} used edges from {}",
            solution.vehicles.len(),
            solution.used_edge_count(),
            path.display()
        );
        Ok(solution)
    }

    /// Adds one row of the results table. Vehicles are remembered even if the edge is unused.
    pub fn push(&mut self, vehicle: &str, edge: Edge, used: bool) {
        if !self.used_edges.contains_key(vehicle) {
            self.vehicles.push(vehicle.to_string());
            self.used_edges.insert(vehicle.to_string(), Vec::new());
        }
        if used {
            if let Some(edges) = self.used_edges.get_mut(vehicle) {
                edges.push(edge);
            }
        }
    }

    /// Vehicle ids in order of first appearance
    pub fn vehicles(&self) -> &[VehicleId] {
        &self.vehicles
    }

    /// The used edges of a vehicle in input order, duplicates included
    pub fn used_edges(&self, vehicle: &str) -> &[Edge] {
        self.used_edges
            .get(vehicle)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn used_edge_count(&self) -> usize {
        self.used_edges.values().map(Vec::len).sum()
    }
}

/// Maps a solver value onto the 0/1 flag, `None` if it is neither
fn parse_flag(value: f64) -> Option<bool> {
    if (value - 1.0).abs() <= FLAG_TOLERANCE {
        Some(true)
    } else if value.abs() <= FLAG_TOLERANCE {
        Some(false)
    } else {
        None
    }
}

fn read_solution<R: Read>(reader: R, path: &Path) -> Result<Solution> {
    let csv_error = |source: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();

    let mut solution = Solution::default();
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        let row: ResultRow = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let used = parse_flag(row.value).ok_or_else(|| Error::InvalidFlag {
            line: record.position().map(|p| p.line()).unwrap_or_default(),
            bus: row.bus.clone(),
            value: row.value,
        })?;
        solution.push(&row.bus, Edge::new(&row.from, &row.to), used);
    }

    Ok(solution)
}
