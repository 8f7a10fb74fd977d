// Each module handles one CLI subcommand; main.rs parses arguments and dispatches.

pub mod plan;
pub mod stations;

use std::path::Path;

use anyhow::{Context, Result};
use fuelroute_lib::{StationCatalog, ValidationRules};

/// Load the station catalog, attaching the path to any error.
pub fn load_catalog(path: &Path, rules: &ValidationRules) -> Result<StationCatalog> {
    StationCatalog::from_path(path, rules)
        .with_context(|| format!("failed to load station catalog from {}", path.display()))
}
