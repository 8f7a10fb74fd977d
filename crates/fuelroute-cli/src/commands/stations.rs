//! Stations command handler: load a catalog and report what was accepted.

use std::path::Path;

use anyhow::Result;
use fuelroute_lib::ValidationRules;

use crate::commands::load_catalog;
use crate::output::{format_load_report, OutputFormat};

/// Handle the stations subcommand.
pub fn handle_stations_command(
    stations: &Path,
    format: OutputFormat,
    rules: &ValidationRules,
    show_rejected: bool,
) -> Result<String> {
    let catalog = load_catalog(stations, rules)?;
    format_load_report(catalog.load_report(), show_rejected, format)
}
