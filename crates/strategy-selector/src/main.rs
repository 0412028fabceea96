//! Race Strategy Planner CLI
//!
//! Ranks pit-stop strategies for one race from trained model artifacts,
//! or from built-in fallback tables when no artifacts are supplied.
//!
//! Usage:
//!   plan-strategy --circuit Monza --track-temp 38 \
//!                 --survival models/survival_models.json \
//!                 --classifier models/transition_classifier.json \
//!                 --output reports/monza.json

use anyhow::Result;
use clap::Parser;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;
use strategy_selector::{
    loader, CircuitCatalog, DurabilityLimits, PredictionReport, SearchConfig, StrategyArtifacts,
    StrategyPredictor, StrategyRequest, DEFAULT_SIMS,
};
use tire_degradation::TransitionModel;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "plan-strategy", about = "Rank pit-stop strategies for a race")]
struct Args {
    /// Circuit name, e.g. Monza
    #[arg(short, long)]
    circuit: String,

    /// Track surface temperature in Celsius
    #[arg(long, default_value_t = 35.0)]
    track_temp: f64,

    /// Air temperature in Celsius
    #[arg(long, default_value_t = 24.0)]
    air_temp: f64,

    /// Compounds available for the race
    #[arg(long, value_delimiter = ',', default_value = "SOFT,MEDIUM,HARD")]
    compounds: Vec<String>,

    /// Maximum pit stops to plan for
    #[arg(long, default_value_t = 2)]
    max_stops: u32,

    /// Drop the requirement to run two distinct compounds
    #[arg(long)]
    no_fia_rule: bool,

    /// Number of ranked strategies to report
    #[arg(short = 'k', long, default_value_t = 5)]
    top_k: usize,

    /// Monte Carlo runs per strategy template
    #[arg(long, default_value_t = DEFAULT_SIMS)]
    sims: usize,

    /// RNG seed for reproducible recommendations
    #[arg(long)]
    seed: Option<u64>,

    /// Wall-clock budget for the search, in milliseconds
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Path to per-compound survival models JSON
    #[arg(long)]
    survival: Option<PathBuf>,

    /// Path to transition classifier JSON
    #[arg(long)]
    classifier: Option<PathBuf>,

    /// Path to circuit parameters JSON, replaces the built-in catalog
    #[arg(long)]
    circuits: Option<PathBuf>,

    /// Write the full prediction report to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{}", "=".repeat(60));
    info!("Race Strategy Planner");
    info!("{}", "=".repeat(60));

    // Load artifacts
    let survival = match &args.survival {
        Some(path) => loader::load_survival_bundles(path)?,
        None => {
            info!("No survival models supplied, using fallback stint quantiles");
            HashMap::new()
        }
    };
    let classifier: Option<Box<dyn TransitionModel>> = match &args.classifier {
        Some(path) => Some(Box::new(loader::load_classifier(path)?)),
        None => None,
    };
    let circuits = match &args.circuits {
        Some(path) => loader::load_circuits(path)?,
        None => CircuitCatalog::with_defaults(),
    };
    let artifacts = StrategyArtifacts {
        survival,
        classifier,
        circuits,
        durability: DurabilityLimits::with_defaults(),
    };

    let config = SearchConfig {
        sims: args.sims,
        time_budget: args.budget_ms.map(Duration::from_millis),
        ..SearchConfig::default()
    };

    let mut request = StrategyRequest::new(args.circuit.clone(), args.track_temp, args.air_temp);
    request.compounds = args.compounds.clone();
    request.max_stops = args.max_stops;
    request.fia_rule = !args.no_fia_rule;
    request.top_k = args.top_k;
    request.seed = args.seed;

    let predictor = StrategyPredictor::new(artifacts, config);
    let candidates = predictor.predict(&request);

    info!("\n{}", "=".repeat(60));
    info!("RANKED STRATEGIES");
    info!("{}", "=".repeat(60));
    if candidates.is_empty() {
        info!("No viable strategy under the given constraints");
    }
    for (rank, candidate) in candidates.iter().enumerate() {
        info!(
            "  #{} {:24} p={:.3} t={:.1}s",
            rank + 1,
            candidate.template.join("-"),
            candidate.prob,
            candidate.expected_total_race_time
        );
        for stint in &candidate.stints {
            info!(
                "      laps {:>3}-{:<3} {}",
                stint.start_lap,
                stint.end_lap - 1,
                stint.compound
            );
        }
        if !candidate.windows.is_empty() {
            let windows: Vec<String> = candidate
                .windows
                .iter()
                .map(|w| format!("L{}-L{}", w.p25, w.p75))
                .collect();
            info!("      pit windows: {}", windows.join(", "));
        }
    }

    // Summary
    let diagnostics = predictor.diagnostics();
    info!("\n{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!(
        "Templates: {} enumerated, {} gated, {} dropped, {} skipped on budget",
        diagnostics.templates_enumerated,
        diagnostics.templates_gated,
        diagnostics.templates_dropped,
        diagnostics.budget_skips
    );
    info!(
        "Quantiles: {} cache hits, {} fallbacks; {} early stops",
        diagnostics.quantile_cache_hits,
        diagnostics.missing_model_fallbacks + diagnostics.model_query_fallbacks,
        diagnostics.early_stops
    );

    // Write report if requested
    if let Some(output) = &args.output {
        info!("\nWriting report to {:?}", output);
        let report = PredictionReport {
            request,
            candidates,
            diagnostics,
            generated_at: chrono::Utc::now().to_rfc3339(),
        };
        let file = File::create(output)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &report)?;
    }

    Ok(())
}
