use crate::error::{Error, Result};
use crate::solution::VehicleId;
use crate::stations::{Coordinate, StationKind, StationTable};
use log::info;
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_ZOOM: u8 = 12;

/// Route colors, assigned by the position of the vehicle in the solution
pub const PALETTE: [&str; 8] = [
    "blue",
    "red",
    "green",
    "purple",
    "orange",
    "darkred",
    "darkblue",
    "darkgreen",
];

/// Number of direction markers aimed for on each route
const DIRECTION_MARKERS: usize = 5;

const HTML_TEMPLATE: &str = include_str!("map_template.html");
const DATA_PLACEHOLDER: &str = "__MAP_DATA__";

#[derive(Serialize, Clone, Debug)]
pub struct StationMarker {
    pub name: String,
    pub kind: StationKind,
    pub net_flow: f64,
    pub position: Coordinate,
    pub color: &'static str,
    pub popup: String,
}

/// Marks the direction of travel: the segment from stop `stop` to the next one
#[derive(Serialize, Clone, Debug)]
pub struct DirectionMarker {
    pub stop: usize,
    pub segment: [Coordinate; 2],
    pub segment_popup: String,
    pub stop_popup: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct RouteLayer {
    pub vehicle: VehicleId,
    pub color: &'static str,
    pub path: Vec<Coordinate>,
    pub popup: String,
    pub direction: Vec<DirectionMarker>,
}

/// Everything the map page draws
#[derive(Serialize, Clone, Debug)]
pub struct MapData {
    pub center: Coordinate,
    pub zoom: u8,
    pub stations: Vec<StationMarker>,
    pub routes: Vec<RouteLayer>,
}

impl MapData {
    /// `routes` holds the coordinates of every vehicle, in solution order. Routes with less
    /// than two points are not drawn but still take up a palette slot.
    pub fn build(
        table: &StationTable,
        routes: &[(VehicleId, Vec<Coordinate>)],
        zoom: u8,
    ) -> Result<MapData> {
        let center = table.center().ok_or(Error::EmptyStationTable)?;
        info!("Average location (lat, long): {:?}", center);

        let mut stations = Vec::with_capacity(table.len());
        for kind in [
            StationKind::Consumer,
            StationKind::Supplier,
            StationKind::Warehouse,
        ] {
            for station in table.subset(kind) {
                stations.push(StationMarker {
                    name: station.name.clone(),
                    kind,
                    net_flow: station.net_flow,
                    position: station.coordinate(),
                    color: marker_color(kind),
                    popup: format!(
                        "{} Station: {}<br>Net Flow: {}",
                        kind.label(),
                        station.name,
                        station.net_flow
                    ),
                });
            }
        }

        let routes = routes
            .iter()
            .enumerate()
            .filter(|(_, (_, path))| path.len() > 1)
            .map(|(i, (vehicle, path))| route_layer(vehicle, path, PALETTE[i % PALETTE.len()]))
            .collect();

        Ok(MapData {
            center,
            zoom,
            stations,
            routes,
        })
    }

    /// A standalone Leaflet page with the map data embedded
    pub fn render_html(&self) -> Result<String> {
        // Keep the payload from closing the surrounding script tag
        let json = serde_json::to_string(self)?.replace("</", "<\\/");
        Ok(HTML_TEMPLATE.replace(DATA_PLACEHOLDER, &json))
    }

    pub fn write_html<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file(path.as_ref(), &self.render_html()?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file(path.as_ref(), &serde_json::to_string_pretty(self)?)
    }
}

fn marker_color(kind: StationKind) -> &'static str {
    match kind {
        StationKind::Consumer => "blue",
        StationKind::Supplier => "green",
        StationKind::Warehouse => "red",
    }
}

fn route_layer(vehicle: &str, path: &[Coordinate], color: &'static str) -> RouteLayer {
    let step = (path.len() / DIRECTION_MARKERS).max(1);
    let direction = (0..path.len() - 1)
        .step_by(step)
        .map(|i| DirectionMarker {
            stop: i,
            segment: [path[i], path[i + 1]],
            segment_popup: format!("{}: Stop {} → {}", vehicle, i, i + 1),
            stop_popup: format!("{} - Stop #{}", vehicle, i),
        })
        .collect();

    RouteLayer {
        vehicle: vehicle.to_string(),
        color,
        path: path.to_vec(),
        popup: format!("{} route ({} stops)", vehicle, path.len()),
        direction,
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {}", path.display());
    Ok(())
}
