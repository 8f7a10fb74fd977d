//! Output formatting for plans and catalog reports.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use fuelroute_lib::{CatalogLoadReport, FuelStopPlan, PlanRenderMode};

/// Output formats supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain text.
    #[default]
    Text,
    /// Markdown suitable for chat or notes.
    Rich,
    /// Machine-readable JSON on stdout.
    Json,
}

impl OutputFormat {
    fn render_mode(self) -> PlanRenderMode {
        match self {
            OutputFormat::Rich => PlanRenderMode::RichText,
            _ => PlanRenderMode::PlainText,
        }
    }
}

/// JSON envelope for the `plan` command.
#[derive(Debug, Serialize)]
struct PlanDocument<'a> {
    route_distance_miles: f64,
    catalog_stations: usize,
    #[serde(flatten)]
    plan: &'a FuelStopPlan,
}

/// Render a fuel plan to a string in the requested format.
pub fn format_plan(plan: &FuelStopPlan, catalog_stations: usize, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let document = PlanDocument {
                route_distance_miles: plan.summary.total_distance,
                catalog_stations,
                plan,
            };
            Ok(serde_json::to_string_pretty(&document)?)
        }
        _ => Ok(plan.render(format.render_mode())),
    }
}

/// Render a catalog load report to a string in the requested format.
pub fn format_load_report(
    report: &CatalogLoadReport,
    show_rejected: bool,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        _ => Ok(report.render(show_rejected)),
    }
}
