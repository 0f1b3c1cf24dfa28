use crate::config::{Config, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Color, Table as ComfyTable};
use nearby_cache::{CacheTable, JsonFileCacheTable, QueryCache};
use nearby_core::{Coordinate, CuisineFilter, RankedResult, ServiceRegion};
use nearby_search::{NearbySearch, QueryOutcome, ResultSource};
use nearby_storage::JsonLinesSource;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Label shown for restaurants without a cuisine
const NO_CUISINE: &str = "Not specified";

/// Most cuisines suggested for a misspelled filter
const MAX_SUGGESTIONS: usize = 3;

/// Minimum similarity for a known cuisine to be suggested
const SUGGESTION_CUTOFF: f64 = 0.6;

pub struct SearchRequest<'a> {
    pub latitude: f64,
    pub longitude: f64,
    pub cuisine: Option<&'a str>,
    pub data: &'a Path,
    pub cache: &'a Path,
    pub output: OutputFormat,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    latitude: f64,
    longitude: f64,
    cuisine: Option<&'a str>,
    results: &'a [RankedResult],
    source: &'a ResultSource,
    /// Only live scans know how many restaurants matched
    #[serde(skip_serializing_if = "Option::is_none")]
    match_count: Option<usize>,
    elapsed_ms: f64,
}

impl<'a> SearchReport<'a> {
    fn new(coordinate: Coordinate, filter: &'a CuisineFilter, outcome: &'a QueryOutcome) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            cuisine: filter.as_option(),
            results: &outcome.results,
            source: &outcome.source,
            match_count: (outcome.source == ResultSource::Live).then_some(outcome.match_count),
            elapsed_ms: outcome.elapsed.as_secs_f64() * 1000.0,
        }
    }
}

fn open_cache(config: &Config, path: &Path) -> QueryCache {
    QueryCache::new(Arc::new(JsonFileCacheTable::new(path)), config.cache_config())
}

fn open_search(config: &Config, data: &Path, cache: &Path) -> NearbySearch {
    NearbySearch::new(
        Arc::new(JsonLinesSource::new(data)),
        Arc::new(open_cache(config, cache)),
    )
}

pub fn search(config: &Config, request: SearchRequest<'_>) -> Result<()> {
    let region = ServiceRegion::default();
    let coordinate = region.validate(request.latitude, request.longitude).map_err(|e| {
        anyhow::anyhow!(
            "{} (latitude {} to {}, longitude {} to {})",
            e,
            region.lat_min,
            region.lat_max,
            region.lon_min,
            region.lon_max
        )
    })?;

    let search = open_search(config, request.data, request.cache);

    let requested = CuisineFilter::new(request.cuisine.unwrap_or_default());
    let (filter, warning) = resolve_filter(requested, || search.known_cuisines());
    if let Some(warning) = warning {
        eprintln!("{} {}", "!".bright_yellow(), warning.yellow());
    }

    if request.output == OutputFormat::Table {
        println!(
            "{} Searching near {} ({})...",
            "→".bright_blue(),
            coordinate.to_string().bright_cyan(),
            filter_label(&filter)
        );
    }

    let outcome = search.run_query(coordinate, &filter);

    match request.output {
        OutputFormat::Json => print_json(coordinate, &filter, &outcome)?,
        OutputFormat::Table => print_outcome(config, &outcome),
    }

    if let ResultSource::Unavailable { reason } = &outcome.source {
        anyhow::bail!("Restaurant collection unavailable: {}", reason);
    }

    Ok(())
}

/// Keep `requested` only if the collection knows that cuisine. An unknown
/// cuisine falls back to no filter with a warning naming the closest known
/// cuisines. When the cuisine list cannot be read the filter is kept as is.
fn resolve_filter<F>(requested: CuisineFilter, known_cuisines: F) -> (CuisineFilter, Option<String>)
where
    F: FnOnce() -> nearby_core::Result<Vec<String>>,
{
    if requested.is_any() {
        return (requested, None);
    }

    match known_cuisines() {
        Ok(known) if known.iter().any(|c| c == requested.as_str()) => (requested, None),
        Ok(known) => {
            let mut warning = format!(
                "Unknown cuisine '{}', searching all cuisines instead",
                requested
            );
            let suggestions = suggest_cuisines(requested.as_str(), &known);
            if !suggestions.is_empty() {
                warning.push_str(&format!(" (did you mean: {}?)", suggestions.join(", ")));
            }
            (CuisineFilter::any(), Some(warning))
        }
        Err(e) => {
            warn!("Cannot list cuisines: {}", e);
            (requested, None)
        }
    }
}

/// Known cuisines most similar to `input`, best first.
fn suggest_cuisines(input: &str, known: &[String]) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = known
        .iter()
        .map(|cuisine| (strsim::normalized_levenshtein(input, cuisine), cuisine))
        .filter(|(score, _)| *score >= SUGGESTION_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, cuisine)| cuisine.clone())
        .collect()
}

fn filter_label(filter: &CuisineFilter) -> String {
    if filter.is_any() {
        "all cuisines".to_string()
    } else {
        format!("cuisine: {}", filter)
    }
}

fn cuisine_label(cuisine: Option<&str>) -> &str {
    match cuisine {
        Some(c) if !c.trim().is_empty() => c,
        _ => NO_CUISINE,
    }
}

fn results_table(results: &[RankedResult]) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Cuisine").fg(Color::Yellow),
        Cell::new("Distance (km)").fg(Color::Green),
    ]);

    for (rank, result) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&result.name),
            Cell::new(cuisine_label(result.cuisine.as_deref())),
            Cell::new(format!("{:.2}", result.distance_km)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

fn print_outcome(config: &Config, outcome: &QueryOutcome) {
    match &outcome.source {
        ResultSource::Unavailable { .. } => {
            println!("{} No results: the restaurant collection could not be read", "✗".bright_red());
        }
        _ if outcome.results.is_empty() => {
            println!("{} No restaurant found", "✗".bright_yellow());
        }
        _ => {
            println!("{}", results_table(&outcome.results));
        }
    }

    if outcome.is_available() {
        let source = match outcome.source {
            ResultSource::Cache => outcome.source.to_string().bright_magenta(),
            _ => outcome.source.to_string().bright_green(),
        };
        println!("{} {}", "Source:".bright_yellow(), source);
    }

    if outcome.source == ResultSource::Live {
        println!(
            "{} {}",
            "Matching restaurants:".bright_yellow(),
            outcome.match_count
        );
    }

    if config.show_timing {
        println!(
            "{} {:.2}ms",
            "Processing time:".bright_yellow(),
            outcome.elapsed.as_secs_f64() * 1000.0
        );
    }
}

fn print_json(coordinate: Coordinate, filter: &CuisineFilter, outcome: &QueryOutcome) -> Result<()> {
    let report = SearchReport::new(coordinate, filter, outcome);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn list_cuisines(config: &Config, data: &Path) -> Result<()> {
    let search = open_search(config, data, &config.cache_path);
    let cuisines = search.known_cuisines()?;

    println!(
        "{} {} cuisines in {}",
        "✓".bright_green(),
        cuisines.len(),
        data.display()
    );
    for cuisine in cuisines {
        println!("  {}", cuisine.bright_cyan());
    }
    Ok(())
}

pub fn cache_stats(config: &Config, path: &Path) -> Result<()> {
    let cache = open_cache(config, path);
    let settings = cache.config();

    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("Metric").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Green),
    ]);
    table.add_row(vec![Cell::new("Cache file"), Cell::new(path.display())]);
    table.add_row(vec![Cell::new("Enabled"), Cell::new(settings.enabled)]);
    table.add_row(vec![Cell::new("Entries"), Cell::new(cache.len())]);
    table.add_row(vec![Cell::new("Capacity"), Cell::new(settings.capacity)]);
    table.add_row(vec![
        Cell::new("Tolerance (degrees)"),
        Cell::new(settings.tolerance_degrees),
    ]);

    println!("{}", "Query Cache:".bright_yellow().bold());
    println!("{}", table);
    Ok(())
}

pub fn cache_clear(path: &Path) -> Result<()> {
    let removed = JsonFileCacheTable::new(path).clear()?;
    println!("{} Removed {} cached queries", "✓".bright_green(), removed);
    Ok(())
}

pub fn init_config(config: &Config, path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
    }
    config.save(path)?;
    println!("{} Wrote configuration to {}", "✓".bright_green(), path.display());
    Ok(())
}
