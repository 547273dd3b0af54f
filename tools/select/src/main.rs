//! Carbon parcel selection: load parcels, drop small ones, build the
//! touching relation, solve, report, and write the selection as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use carbon_core::geojson::{load_parcels, PropertyNames};
use carbon_core::parcel::ParcelRanges;
use carbon_core::{build_adjacency, filter_by_min_area, optimize, Selection, SelectionParams};
use clap::Parser;
use log::info;
use serde::Serialize;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "select", about = "Select non-touching parcels maximizing carbon storage within a budget")]
struct Args {
    /// GeoJSON FeatureCollection of parcels in a projected CRS (metres).
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the selection JSON.
    #[arg(short, long, default_value = "selection.json")]
    output: PathBuf,

    /// JSON file with selection parameters; flags below override it.
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Fraction of total cost the selection may spend.
    #[arg(short, long)]
    budget_fraction: Option<f64>,

    /// Fraction of total area the selection must cover.
    #[arg(short, long)]
    area_fraction: Option<f64>,

    /// Parcels smaller than this many km² are dropped.
    #[arg(long)]
    min_area: Option<f64>,

    /// Give up on the solve after this many seconds.
    #[arg(long)]
    time_limit: Option<f64>,

    /// Feature property holding carbon storage.
    #[arg(long, default_value = "carbon_sto")]
    carbon_field: String,

    /// Feature property holding acquisition cost.
    #[arg(long, default_value = "cost")]
    cost_field: String,
}

// ── Output schema ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SelectionReport<'a> {
    input: String,
    params: &'a SelectionParams,
    parcels_loaded: usize,
    parcels_removed: usize,
    touching_pairs: usize,
    /// Feature positions in the input file, aligned with `selection.selected`.
    source_indices: Vec<usize>,
    selection: &'a Selection,
}

fn resolve_params(args: &Args) -> Result<SelectionParams> {
    let mut params = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SelectionParams::default(),
    };
    if let Some(v) = args.budget_fraction {
        params.budget_fraction = v;
    }
    if let Some(v) = args.area_fraction {
        params.area_fraction = v;
    }
    if let Some(v) = args.min_area {
        params.min_parcel_area_km2 = v;
    }
    if args.time_limit.is_some() {
        params.time_limit_secs = args.time_limit;
    }
    params.validate()?;
    Ok(params)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let params = resolve_params(&args)?;

    let names = PropertyNames { carbon: args.carbon_field.clone(), cost: args.cost_field.clone() };
    let parcels = load_parcels(&args.input, &names)
        .with_context(|| format!("loading parcels from {}", args.input.display()))?;
    let parcels_loaded = parcels.len();

    if let Some(r) = ParcelRanges::of(&parcels) {
        info!("carbon ranges from {} to {}", r.carbon.min, r.carbon.max);
        info!("cost ranges from {} to {}", r.cost.min, r.cost.max);
        info!("area ranges from {:.4} to {:.4} km²", r.area_km2.min, r.area_km2.max);
    }

    let filtered = filter_by_min_area(parcels, params.min_parcel_area_km2);
    let parcels = filtered.kept;

    let geometries: Vec<_> = parcels.iter().map(|p| p.geometry.clone()).collect();
    let adjacency = build_adjacency(&geometries).context("building parcel adjacency")?;
    let selection = optimize(&parcels, &adjacency, &params).context("selecting parcels")?;

    println!("{selection}");

    let report = SelectionReport {
        input: args.input.display().to_string(),
        params: &params,
        parcels_loaded,
        parcels_removed: filtered.removed,
        touching_pairs: adjacency.pair_count(),
        source_indices: selection.selected.iter().map(|&i| parcels[i].source_index).collect(),
        selection: &selection,
    };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(&args.output, json)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    Ok(())
}
