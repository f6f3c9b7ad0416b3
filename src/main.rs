use anyhow::Context;
use clap::Parser;
use log::error;
use route_view::map::{MapData, DEFAULT_ZOOM};
use route_view::validation::write_report;
use route_view::{
    reconstruct_all, route_coordinates, validate_all, Coordinate, Solution, StationTable,
    VehicleId, ORIGIN,
};
use std::io::Write;
use std::path::PathBuf;

/// Rebuild vehicle routes from a solver solution, validate them and draw them on a map
#[derive(Parser)]
#[command(name = "route-view")]
struct Args {
    /// Station CSV (station_name, latitude, longitude, net_flow)
    #[arg(long)]
    stations: PathBuf,

    /// Solution CSV (bus, from, to, value)
    #[arg(long)]
    results: PathBuf,

    /// Where to write the HTML map
    #[arg(short, long, default_value = "street_view.html")]
    output: PathBuf,

    /// Also write the map data as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Station every route starts from
    #[arg(long, default_value = ORIGIN)]
    origin: String,

    /// Initial zoom level of the map
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    zoom: u8,

    /// Reconstruct routes one vehicle at a time
    #[arg(long)]
    sequential: bool,

    /// Only print the validation report
    #[arg(long)]
    no_map: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(Args::parse(), std::io::stdout().lock()) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run<W: Write>(args: Args, out: W) -> anyhow::Result<()> {
    let table = StationTable::load(&args.stations, &args.origin)?;
    let solution = Solution::load(&args.results)?;

    let routes = reconstruct_all(&solution, &args.origin, !args.sequential);

    let reports = validate_all(&solution, &routes);
    write_report(out, &reports).context("Could not write the report")?;

    if args.no_map {
        return Ok(());
    }

    // Every station of a used route must be in the table
    let coordinates = routes
        .iter()
        .map(|(vehicle, route)| {
            route_coordinates(&table, &solution, vehicle, route)
                .map(|coords| (vehicle.clone(), coords))
                .with_context(|| format!("Could not place the route of {vehicle}"))
        })
        .collect::<anyhow::Result<Vec<(VehicleId, Vec<Coordinate>)>>>()?;

    let map = MapData::build(&table, &coordinates, args.zoom)?;
    map.write_html(&args.output)?;
    if let Some(json) = &args.json {
        map.write_json(json)?;
    }

    Ok(())
}
