use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use fuelroute_cli::commands::plan::{handle_plan_command, PlanCommandArgs};
use fuelroute_cli::commands::stations::handle_stations_command;
use fuelroute_cli::logging::{init_logging, LoggingConfig};
use fuelroute_cli::output::OutputFormat;
use fuelroute_lib::{PlanStrategy, PlannerConfig, RefuelPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan the cheapest fuel stops along a driving route")]
struct Cli {
    /// Station catalog CSV (truckstop price export with coordinates).
    #[arg(long, env = "FUELROUTE_STATIONS", global = true)]
    stations: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan fuel stops along a route.
    Plan(PlanArgs),
    /// Load the station catalog and report accepted and rejected records.
    Stations {
        /// List every rejected record with its reason.
        #[arg(long)]
        show_rejected: bool,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// JSON route file: {"points": [[lat, lon], ...]} or {"polyline": "..."}.
    #[arg(long, conflicts_with = "polyline")]
    route: Option<PathBuf>,
    /// Encoded polyline of the route.
    #[arg(long)]
    polyline: Option<String>,
    /// Polyline precision (5 for Google/OSRM, 6 for Valhalla).
    #[arg(long)]
    precision: Option<u32>,
    /// Road distance in miles, overriding the length of the geometry.
    #[arg(long)]
    distance: Option<f64>,
    /// Fuel efficiency in miles per gallon.
    #[arg(long)]
    mpg: Option<f64>,
    /// Maximum range on a full tank, in miles.
    #[arg(long)]
    range: Option<f64>,
    /// Tank capacity in gallons.
    #[arg(long)]
    tank: Option<f64>,
    /// Stop selection strategy: greedy or optimal.
    #[arg(long)]
    strategy: Option<PlanStrategy>,
    /// How much to buy at each stop: minimum or fill.
    #[arg(long)]
    refuel: Option<RefuelPolicy>,
    /// Maximum distance of a station from the route, in miles.
    #[arg(long)]
    corridor: Option<f64>,
    /// Fraction of the range to plan with, in (0, 1].
    #[arg(long)]
    safety_factor: Option<f64>,
}

impl From<PlanArgs> for PlanCommandArgs {
    fn from(args: PlanArgs) -> Self {
        Self {
            route: args.route,
            polyline: args.polyline,
            precision: args.precision,
            distance: args.distance,
            mpg: args.mpg,
            range: args.range,
            tank: args.tank,
            strategy: args.strategy,
            refuel: args.refuel,
            corridor: args.corridor,
            safety_factor: args.safety_factor,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env().verbose(cli.verbose));

    let config = PlannerConfig::from_env();
    let stations = cli.stations.ok_or_else(|| {
        anyhow::anyhow!("no station catalog: pass --stations <CSV> or set FUELROUTE_STATIONS")
    })?;

    let output = match cli.command {
        Command::Plan(args) => {
            handle_plan_command(&stations, cli.format, config, &PlanCommandArgs::from(args))?
        }
        Command::Stations { show_rejected } => {
            handle_stations_command(&stations, cli.format, &config.validation, show_rejected)?
        }
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
