use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed CSV in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid used flag {value} for bus '{bus}' on line {line} (expected 0 or 1)")]
    InvalidFlag { line: u64, bus: String, value: f64 },
    /// A route visits a station that is neither a consumer, a supplier nor the warehouse
    #[error("Station '{station}' is on a route but missing from the station table")]
    StationNotFound { station: String },
    #[error("Station table is empty, cannot center the map")]
    EmptyStationTable,
    #[error("Could not serialize map data: {0}")]
    Json(#[from] serde_json::Error),
}
