//! Fuel station catalog loading and snapshot management.
//!
//! Stations are imported in bulk from CSV (the truckstop price export plus
//! geocoded coordinates), validated once, and published as an immutable
//! [`StationCatalog`]. Reloads replace the published snapshot wholesale through
//! [`CatalogHandle`], so a plan in flight never observes a half-updated catalog.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::CandidateIndex;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::validation::{validate_station, ValidationRules};

/// Identifier of a fuel station (the OPIS truckstop id).
pub type StationId = i64;

/// A fuel station with location and retail price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelStation {
    pub id: StationId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_id: Option<i64>,
    pub location: Coordinate,
    /// Retail price per gallon in USD.
    pub price: f64,
}

/// A CSV row or in-memory station excluded during catalog load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedStation {
    /// One-based CSV line number (header is line 1); `None` for in-memory loads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<StationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub reason: String,
}

/// Outcome of a catalog import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogLoadReport {
    pub processed: usize,
    pub accepted: usize,
    pub rejected: Vec<RejectedStation>,
}

/// Canonical CSV fields and the header spellings accepted for each.
const FIELD_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "id",
        &["opis_truckstop_id", "opis_id", "truckstop_id", "station_id", "id"],
    ),
    ("name", &["truckstop_name", "station_name", "name"]),
    ("address", &["address", "street_address"]),
    ("city", &["city"]),
    ("state", &["state", "state_code"]),
    ("rack_id", &["rack_id", "rack"]),
    (
        "price",
        &["retail_price", "price", "price_per_gallon", "price_usd"],
    ),
    ("latitude", &["latitude", "lat"]),
    ("longitude", &["longitude", "lon", "lng"]),
];

const REQUIRED_FIELDS: &[&str] = &["id", "name", "city", "state", "price", "latitude", "longitude"];

/// Validated, immutable set of fuel stations indexed for corridor queries.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    index: CandidateIndex,
    by_id: HashMap<StationId, usize>,
    report: CatalogLoadReport,
    source: Option<PathBuf>,
}

impl StationCatalog {
    /// Load a catalog from a CSV file, validating each record with `rules`.
    pub fn from_path(path: &Path, rules: &ValidationRules) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut catalog = Self::from_reader(file, rules)?;
        catalog.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            accepted = catalog.report.accepted,
            rejected = catalog.report.rejected.len(),
            "loaded station catalog"
        );
        Ok(catalog)
    }

    /// Load a catalog from CSV data (e.g., a file or in-memory buffer).
    ///
    /// Malformed rows, rows without coordinates, duplicate ids (first wins) and
    /// records failing validation are skipped and listed in the load report. A
    /// missing required column fails the whole import.
    pub fn from_reader<R: Read>(reader: R, rules: &ValidationRules) -> Result<Self> {
        rules.validate()?;

        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|err| Error::StationDataValidation {
                message: format!("failed to read station catalog headers: {err}"),
            })?
            .clone();

        let index_map = resolve_columns(&headers)?;

        let mut stations = Vec::new();
        let mut seen = HashSet::new();
        let mut report = CatalogLoadReport::default();

        let mut row_num: u64 = 1;
        for result in csv_reader.records() {
            row_num += 1;
            report.processed += 1;

            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    reject(
                        &mut report,
                        RejectedStation {
                            row: Some(row_num),
                            station_id: None,
                            name: None,
                            reason: err.to_string(),
                        },
                    );
                    continue;
                }
            };

            let station = match parse_record(&record, &index_map) {
                Ok(station) => station,
                Err(reason) => {
                    let get = |field: &str| field_value(&record, &index_map, field);
                    reject(
                        &mut report,
                        RejectedStation {
                            row: Some(row_num),
                            station_id: get("id").and_then(|v| v.parse().ok()),
                            name: get("name").map(str::to_string),
                            reason,
                        },
                    );
                    continue;
                }
            };

            if let Err(err) = admit(&station, rules, &mut seen) {
                reject(
                    &mut report,
                    RejectedStation {
                        row: Some(row_num),
                        station_id: Some(station.id),
                        name: Some(station.name.clone()),
                        reason: err.to_string(),
                    },
                );
                continue;
            }
            stations.push(station);
        }

        Ok(Self::assemble(stations, report))
    }

    /// Build a catalog from in-memory stations, applying the same validation as CSV imports.
    pub fn from_stations(
        candidates: impl IntoIterator<Item = FuelStation>,
        rules: &ValidationRules,
    ) -> Result<Self> {
        rules.validate()?;

        let mut stations = Vec::new();
        let mut seen = HashSet::new();
        let mut report = CatalogLoadReport::default();

        for station in candidates {
            report.processed += 1;
            if let Err(err) = admit(&station, rules, &mut seen) {
                reject(
                    &mut report,
                    RejectedStation {
                        row: None,
                        station_id: Some(station.id),
                        name: Some(station.name.clone()),
                        reason: err.to_string(),
                    },
                );
                continue;
            }
            stations.push(station);
        }

        Ok(Self::assemble(stations, report))
    }

    fn assemble(stations: Vec<FuelStation>, mut report: CatalogLoadReport) -> Self {
        report.accepted = stations.len();
        let index = CandidateIndex::new(stations);
        let by_id = index
            .stations()
            .iter()
            .enumerate()
            .map(|(position, station)| (station.id, position))
            .collect();

        Self {
            index,
            by_id,
            report,
            source: None,
        }
    }

    /// All validated stations, ordered by latitude.
    pub fn stations(&self) -> &[FuelStation] {
        self.index.stations()
    }

    /// Corridor pre-filter index over the catalog.
    pub fn index(&self) -> &CandidateIndex {
        &self.index
    }

    /// Look up a station by id.
    pub fn get(&self, id: StationId) -> Option<&FuelStation> {
        self.by_id.get(&id).map(|&position| &self.index.stations()[position])
    }

    /// Number of validated stations.
    pub fn len(&self) -> usize {
        self.index.stations().len()
    }

    /// Returns true when no station passed validation.
    pub fn is_empty(&self) -> bool {
        self.index.stations().is_empty()
    }

    /// Summary of the import that produced this catalog.
    pub fn load_report(&self) -> &CatalogLoadReport {
        &self.report
    }

    /// Source path if the catalog was loaded from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn admit(
    station: &FuelStation,
    rules: &ValidationRules,
    seen: &mut HashSet<StationId>,
) -> Result<()> {
    if seen.contains(&station.id) {
        return Err(Error::StationDataValidation {
            message: format!("duplicate station id {}", station.id),
        });
    }
    validate_station(station, rules)?;
    seen.insert(station.id);
    Ok(())
}

fn reject(report: &mut CatalogLoadReport, rejected: RejectedStation) {
    warn!(
        row = rejected.row,
        station_id = rejected.station_id,
        reason = %rejected.reason,
        "excluding station from catalog"
    );
    report.rejected.push(rejected);
}

/// Normalize a header for robust matching: lowercase alphanumerics only.
fn normalize_header(header: &str) -> String {
    header
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn resolve_columns(headers: &StringRecord) -> Result<BTreeMap<&'static str, usize>> {
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

    let mut index_map = BTreeMap::new();
    for (canon, alternatives) in FIELD_SYNONYMS {
        let found = alternatives.iter().find_map(|alt| {
            let alt = normalize_header(alt);
            normalized.iter().position(|header| *header == alt)
        });
        if let Some(position) = found {
            index_map.insert(*canon, position);
        }
    }

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !index_map.contains_key(field))
        .collect();

    if !missing.is_empty() {
        return Err(Error::StationDataValidation {
            message: format!(
                "station catalog missing required columns: {}. Available: {}",
                missing.join(", "),
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    Ok(index_map)
}

fn field_value<'r>(
    record: &'r StringRecord,
    index_map: &BTreeMap<&'static str, usize>,
    field: &str,
) -> Option<&'r str> {
    index_map
        .get(field)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_record(
    record: &StringRecord,
    index_map: &BTreeMap<&'static str, usize>,
) -> std::result::Result<FuelStation, String> {
    let get = |field: &str| field_value(record, index_map, field);

    let id: StationId = get("id")
        .ok_or("missing station id")?
        .parse()
        .map_err(|e| format!("invalid station id: {e}"))?;
    let name = get("name").unwrap_or_default().to_string();
    let price: f64 = get("price")
        .ok_or("missing retail price")?
        .parse()
        .map_err(|e| format!("invalid retail price: {e}"))?;
    let rack_id = match get("rack_id") {
        Some(value) => Some(
            value
                .parse::<i64>()
                .map_err(|e| format!("invalid rack id: {e}"))?,
        ),
        None => None,
    };

    let (Some(lat), Some(lon)) = (get("latitude"), get("longitude")) else {
        return Err("missing coordinates".to_string());
    };
    let latitude: f64 = lat.parse().map_err(|e| format!("invalid latitude: {e}"))?;
    let longitude: f64 = lon.parse().map_err(|e| format!("invalid longitude: {e}"))?;
    let location = Coordinate::new(latitude, longitude).map_err(|e| e.to_string())?;

    Ok(FuelStation {
        id,
        name,
        address: get("address").unwrap_or_default().to_string(),
        city: get("city").unwrap_or_default().to_string(),
        state: get("state").unwrap_or_default().to_ascii_uppercase(),
        rack_id,
        location,
        price,
    })
}

/// A published catalog together with its generation number.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub catalog: Arc<StationCatalog>,
}

/// Shared handle to the current catalog, replaced atomically on reload.
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<CatalogSnapshot>,
}

impl CatalogHandle {
    /// Publish an initial catalog as generation 1.
    pub fn new(catalog: StationCatalog) -> Self {
        Self {
            current: RwLock::new(CatalogSnapshot {
                generation: 1,
                catalog: Arc::new(catalog),
            }),
        }
    }

    /// The currently published catalog. Callers keep this snapshot for the
    /// whole request even if a reload happens meanwhile.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the published catalog, returning the new generation number.
    pub fn replace(&self, catalog: StationCatalog) -> u64 {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let generation = current.generation + 1;
        *current = CatalogSnapshot {
            generation,
            catalog: Arc::new(catalog),
        };
        info!(generation, "published new station catalog");
        generation
    }
}
