use crate::config::Config;
use crate::constants::ALPHA3_ORDER;
use crate::error::Result;
use crate::extract::{self, RawAdjacencyEntry};
use crate::flights;
use crate::matrix::ResolvedAdjacencyEntry;
use crate::registry::{CanonicalCountry, CodeKey, CountryRegistry};
use crate::resolver::NameResolver;
use crate::serialize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use tracing::{info, warn};

/// The JSON/data-module shape of the adjacency artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyData {
    pub neighbours: Vec<AdjacencyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyEntry {
    pub country: String,
    pub neighbours: Vec<String>,
}

impl AdjacencyData {
    fn from_resolved(entries: &[ResolvedAdjacencyEntry]) -> Self {
        Self {
            neighbours: entries
                .iter()
                .map(|e| AdjacencyEntry {
                    country: e.country.clone(),
                    neighbours: e.neighbors.iter().cloned().collect(),
                })
                .collect(),
        }
    }
}

/// The data-module shape of the travel artifact.
#[derive(Debug, Serialize)]
pub struct TravelData {
    /// Per origin country, a row of (alpha-3, volume, numeric code) triples.
    pub travel: Vec<Vec<(String, f64, u32)>>,
    /// Per country, the spectral centrality score.
    pub series: Vec<(String, i64)>,
    pub countries: Vec<CountryMeta>,
}

#[derive(Debug, Serialize)]
pub struct CountryMeta {
    pub name: String,
    pub iso_n3: String,
    pub iso_a3: String,
    /// (latitude, longitude) from the coordinates CSV, when known.
    pub coordinates: Option<(f64, f64)>,
    pub population: Option<u64>,
}

#[derive(Debug)]
pub struct AdjacencyReport {
    pub entries_extracted: usize,
    pub entries_resolved: usize,
    pub entries_dropped: usize,
}

#[derive(Debug)]
pub struct TravelReport {
    pub matrix_size: usize,
    pub countries_emitted: usize,
    pub countries_skipped: usize,
}

/// Resolves raw extracted entries to canonical codes. Entries whose country
/// name stays unresolved are dropped entirely; unresolved neighbors are
/// dropped from the neighbor set only.
pub fn resolve_entries(
    raw_entries: &[RawAdjacencyEntry],
    resolver: &NameResolver,
    key: CodeKey,
) -> Vec<ResolvedAdjacencyEntry> {
    let mut resolved = Vec::new();
    for raw in raw_entries {
        let Some(country) = resolver.resolve_or_warn(&raw.country, key) else {
            info!("Dropping entry for unresolved country: {}", raw.country);
            continue;
        };
        let neighbors: BTreeSet<String> = raw
            .neighbors
            .iter()
            .filter_map(|name| resolver.resolve_or_warn(name, key))
            .map(str::to_string)
            .collect();
        resolved.push(ResolvedAdjacencyEntry {
            country: country.to_string(),
            neighbors,
        });
    }
    resolved
}

/// Builds the adjacency artifacts: the numeric-coded data module, the
/// alpha-3-coded JSON file and the 0/1 CSV grid. Outputs are written only
/// after the full dataset is resolved in memory.
pub fn run_adjacency(config: &Config) -> Result<AdjacencyReport> {
    let html = fs::read_to_string(&config.inputs.borders_html)?;
    let raw_entries = extract::extract_neighbors(&html)?;

    let registry = CountryRegistry::load(&config.inputs.countryinfo)?;
    let resolver = NameResolver::new(&registry);

    let numeric = resolve_entries(&raw_entries, &resolver, CodeKey::Numeric);
    let alpha3 = resolve_entries(&raw_entries, &resolver, CodeKey::Alpha3);

    serialize::write_data_module(
        &config.outputs.adjacency_module,
        &AdjacencyData::from_resolved(&numeric),
    )?;
    serialize::write_json(
        &config.outputs.adjacency_json,
        &AdjacencyData::from_resolved(&alpha3),
    )?;
    serialize::write_adjacency_csv(&config.outputs.adjacency_csv, &alpha3, ALPHA3_ORDER)?;

    Ok(AdjacencyReport {
        entries_extracted: raw_entries.len(),
        entries_resolved: numeric.len(),
        entries_dropped: raw_entries.len() - numeric.len(),
    })
}

/// Builds the travel artifact: accumulate the directed route matrix,
/// symmetrize it, rank countries by the dominant eigenpair and join country
/// metadata from the registry. Spreadsheet codes the registry does not know
/// are skipped with a warning.
pub fn run_travel(config: &Config) -> Result<TravelReport> {
    let registry = CountryRegistry::load_with_coordinates(
        &config.inputs.countryinfo,
        &config.inputs.coordinates_csv,
    )?;

    let (mut matrix, alpha2_from_index) = flights::load_flight_matrix(&config.inputs.flights_xlsx)?;
    matrix.symmetrize();

    let data = assemble_travel_data(&registry, &matrix, &alpha2_from_index);
    let countries_emitted = data.countries.len();
    serialize::write_data_module(&config.outputs.travel_module, &data)?;

    Ok(TravelReport {
        matrix_size: alpha2_from_index.len(),
        countries_emitted,
        countries_skipped: alpha2_from_index.len() - countries_emitted,
    })
}

/// Joins the symmetrized matrix with registry metadata. Spreadsheet codes the
/// registry does not know lose their row and column in the emitted dataset,
/// with a warning; the matrix itself keeps its full index.
pub fn assemble_travel_data(
    registry: &CountryRegistry,
    matrix: &crate::matrix::TravelMatrix,
    alpha2_from_index: &[String],
) -> TravelData {
    let scores = matrix.centrality();

    let mut kept: Vec<(usize, &CanonicalCountry)> = Vec::new();
    for (i, alpha2) in alpha2_from_index.iter().enumerate() {
        match registry.get_by_alpha2(alpha2) {
            Some(country) => kept.push((i, country)),
            None => warn!("Spreadsheet code {} not in the registry, skipping", alpha2),
        }
    }

    let travel = kept
        .iter()
        .map(|&(i, _)| {
            kept.iter()
                .map(|&(j, country)| {
                    (
                        country.alpha3.clone(),
                        matrix.get(i, j),
                        country.numeric_code.parse::<u32>().unwrap_or(0),
                    )
                })
                .collect()
        })
        .collect();

    let series = kept
        .iter()
        .map(|&(i, country)| (country.alpha3.clone(), scores[i]))
        .collect();

    let countries = kept
        .iter()
        .map(|&(_, country)| CountryMeta {
            name: country.name.clone(),
            iso_n3: country.numeric_code.clone(),
            iso_a3: country.alpha3.clone(),
            coordinates: country.latitude.zip(country.longitude),
            population: country.population,
        })
        .collect();

    TravelData {
        travel,
        series,
        countries,
    }
}

/// Diagnostic pass listing every distinct name in the border table together
/// with its resolution, in first-seen order.
pub fn check_names(config: &Config) -> Result<Vec<(String, Option<String>)>> {
    let html = fs::read_to_string(&config.inputs.borders_html)?;
    let raw_entries = extract::extract_neighbors(&html)?;

    let registry = CountryRegistry::load(&config.inputs.countryinfo)?;
    let resolver = NameResolver::new(&registry);

    let mut names: Vec<String> = Vec::new();
    for entry in &raw_entries {
        if !names.contains(&entry.country) {
            names.push(entry.country.clone());
        }
        for name in &entry.neighbors {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }

    Ok(names
        .into_iter()
        .map(|name| {
            let code = resolver
                .resolve(&name, CodeKey::Numeric)
                .map(str::to_string);
            (name, code)
        })
        .collect())
}
