use crate::error::{Error, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub type Coordinate = (f64, f64);

/// One row of the station table
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Station {
    #[serde(rename = "station_name")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub net_flow: f64,
}

impl Station {
    pub fn coordinate(&self) -> Coordinate {
        (self.latitude, self.longitude)
    }

    /// The depot is recognized by name, whatever its flow.
    /// Stations with zero flow have no kind and are left out of the table.
    pub fn kind(&self, origin: &str) -> Option<StationKind> {
        if self.name == origin {
            Some(StationKind::Warehouse)
        } else if self.net_flow < 0.0 {
            Some(StationKind::Consumer)
        } else if self.net_flow > 0.0 {
            Some(StationKind::Supplier)
        } else {
            None
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Consumer,
    Supplier,
    Warehouse,
}

impl StationKind {
    pub fn label(self) -> &'static str {
        match self {
            StationKind::Consumer => "Consumer",
            StationKind::Supplier => "Supplier",
            StationKind::Warehouse => "Warehouse",
        }
    }
}

/// The stations a route may visit: consumers, suppliers and the warehouse.
/// Rows keep their file order, the lookup maps a name to its first row.
#[derive(Clone, Debug)]
pub struct StationTable {
    stations: Vec<Station>,
    kinds: Vec<StationKind>,
    by_name: HashMap<String, usize>,
}

impl StationTable {
    /// Reads the station CSV (`station_name,latitude,longitude,net_flow`)
    pub fn load<P: AsRef<Path>>(path: P, origin: &str) -> Result<StationTable> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stations = read_stations(BufReader::new(file)).map_err(|source| Error::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Read {} stations from {}", stations.len(), path.display());

        Ok(StationTable::from_stations(stations, origin))
    }

    pub fn from_stations(rows: Vec<Station>, origin: &str) -> StationTable {
        let mut stations = Vec::new();
        let mut kinds = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for station in rows {
            let Some(kind) = station.kind(origin) else {
                warn!("Skipping station '{}' with zero net flow", station.name);
                continue;
            };
            if by_name.contains_key(&station.name) {
                warn!(
                    "Duplicate station '{}' in station table, keeping the first row",
                    station.name
                );
                continue;
            }
            by_name.insert(station.name.clone(), stations.len());
            stations.push(station);
            kinds.push(kind);
        }

        StationTable {
            stations,
            kinds,
            by_name,
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Station> {
        self.by_name.get(name).map(|&i| &self.stations[i])
    }

    pub fn kind_of(&self, name: &str) -> Option<StationKind> {
        self.by_name.get(name).map(|&i| self.kinds[i])
    }

    /// All stations of one kind, in file order
    pub fn subset(&self, kind: StationKind) -> Vec<&Station> {
        self.stations
            .iter()
            .zip(&self.kinds)
            .filter(|(_, k)| **k == kind)
            .map(|(s, _)| s)
            .collect()
    }

    pub fn consumers(&self) -> Vec<&Station> {
        self.subset(StationKind::Consumer)
    }

    pub fn suppliers(&self) -> Vec<&Station> {
        self.subset(StationKind::Supplier)
    }

    pub fn warehouse(&self) -> Vec<&Station> {
        self.subset(StationKind::Warehouse)
    }

    /// Mean latitude and longitude of all stations in the table
    pub fn center(&self) -> Option<Coordinate> {
        if self.stations.is_empty() {
            return None;
        }
        let n = self.stations.len() as f64;
        let (lat_sum, lon_sum) = self
            .stations
            .iter()
            .fold((0.0, 0.0), |(lat, lon), s| (lat + s.latitude, lon + s.longitude));
        Some((lat_sum / n, lon_sum / n))
    }

    /// Turns a route into coordinates, failing on the first station the table doesn't know
    pub fn coordinates(&self, route: &[String]) -> Result<Vec<Coordinate>> {
        route
            .iter()
            .map(|name| {
                self.get(name)
                    .map(Station::coordinate)
                    .ok_or_else(|| Error::StationNotFound {
                        station: name.clone(),
                    })
            })
            .collect()
    }
}

fn read_stations<R: Read>(reader: R) -> std::result::Result<Vec<Station>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    rdr.deserialize().collect()
}
