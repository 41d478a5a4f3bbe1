//! Options analytics binary
//!
//! Loads daily option-chain snapshots from disk, computes the metrics
//! record for each requested symbol, and writes one JSON line per symbol.

use analytics::{AssembledMetrics, MetricsAssembler};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use cli::{Cli, Commands};
use config::{generate_default_config, load_config, save_config, validate_config, AnalyticsConfig};
use ingest::{DirectorySource, SnapshotReport, SnapshotSource};
use observability::{init_logging, init_metrics, EngineMetrics};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

/// One output line
#[derive(Serialize)]
struct OutputLine<'a> {
    run_id: &'a Uuid,
    #[serde(flatten)]
    record: &'a analytics::MetricsRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    gex: Option<&'a analytics::GexDistribution>,
    diagnostics: &'a analytics::Diagnostics,
    ingest: &'a SnapshotReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging("optx", cli.log_format)?;
    debug!(?cli, "CLI arguments parsed");

    if let Some(port) = cli.metrics_port {
        init_metrics(port).context("Failed to start metrics exporter")?;
    }

    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id);

    match cli.command {
        Commands::Compute {
            input,
            symbols,
            date,
            config,
            gex,
            output,
        } => {
            compute_command(run_id, input, symbols, date, config, gex, output)
                .instrument(span)
                .await
        }
        Commands::Validate { config } => {
            let _guard = span.enter();
            validate_command(config)
        }
        Commands::Init { output } => {
            let _guard = span.enter();
            init_command(output)
        }
    }
}

/// Load the configuration file when given, otherwise defaults, and refuse
/// to run on validation errors
fn resolve_config(path: Option<&Path>) -> Result<AnalyticsConfig> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            info!("No configuration file given, using defaults");
            generate_default_config()
        }
    };

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!(
            "Cannot compute metrics due to {} configuration error(s)",
            report.errors.len()
        );
    }
    Ok(config)
}

async fn compute_command(
    run_id: Uuid,
    input: PathBuf,
    symbols: Vec<String>,
    date: NaiveDate,
    config_path: Option<PathBuf>,
    include_gex: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = resolve_config(config_path.as_deref())?;

    let symbols: Vec<String> = symbols
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        anyhow::bail!("No symbols given");
    }

    info!(input = ?input, %date, symbols = symbols.len(), "Computing metrics");

    let source = Arc::new(DirectorySource::new(input, config.normalizer.clone()));
    let assembler = Arc::new(MetricsAssembler::with_metrics(config, EngineMetrics::new()));

    let mut tasks = JoinSet::new();
    for symbol in symbols.iter().cloned() {
        let source = Arc::clone(&source);
        let assembler = Arc::clone(&assembler);
        let span = Span::current();
        tasks.spawn_blocking(move || {
            let _guard = span.enter();
            let result = compute_symbol(&*source, &assembler, &symbol, date);
            (symbol, result)
        });
    }

    let results = collect_symbols(tasks).await;

    let mut writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output file: {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    // input order, not completion order
    let mut written = 0usize;
    for symbol in &symbols {
        let Some((assembled, report)) = results.get(symbol) else {
            continue;
        };
        let line = OutputLine {
            run_id: &run_id,
            record: &assembled.record,
            gex: include_gex.then_some(&assembled.gex),
            diagnostics: &assembled.diagnostics,
            ingest: report,
        };
        serde_json::to_writer(&mut writer, &line).context("Failed to serialize metrics record")?;
        writeln!(writer).context("Failed to write output")?;
        written += 1;
    }
    writer.flush().context("Failed to flush output")?;

    info!(written, failed = symbols.len() - written, "Run complete");
    if written == 0 {
        anyhow::bail!("No symbol could be computed");
    }
    Ok(())
}

/// Drain per-symbol tasks. Failed and panicked symbols are logged and left
/// out, the rest are returned keyed by symbol.
async fn collect_symbols<T: Send + 'static>(
    mut tasks: JoinSet<(String, Result<T>)>,
) -> HashMap<String, T> {
    let mut results = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (symbol, result) = match joined {
            Ok(done) => done,
            Err(e) => {
                error!(error = %e, "Symbol task panicked, skipping");
                continue;
            }
        };
        match result {
            Ok(out) => {
                results.insert(symbol, out);
            }
            Err(e) => error!(%symbol, error = %format!("{:#}", e), "Skipping symbol"),
        }
    }
    results
}

fn compute_symbol(
    source: &dyn SnapshotSource,
    assembler: &MetricsAssembler,
    symbol: &str,
    date: NaiveDate,
) -> Result<(AssembledMetrics, SnapshotReport)> {
    let (snapshot, report) = source
        .load_snapshot(symbol, date)
        .with_context(|| format!("Failed to load snapshot for {} on {}", symbol, date))?;

    if !report.missing_files.is_empty() {
        warn!(%symbol, missing = ?report.missing_files, "Snapshot is missing option tables");
    }
    debug!(%symbol, dropped = report.dropped_total(), "Snapshot loaded");

    Ok((assembler.assemble(&snapshot), report))
}

fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = load_config(&config_path)?;
    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Contract multiplier: {}", config.engine.contract_multiplier);
    println!(
        "Term buckets: {:?}",
        config
            .term_structure
            .buckets
            .iter()
            .map(|b| b.target_dte)
            .collect::<Vec<_>>()
    );
    println!("Realized vol windows: {:?}", config.realized_vol.windows);

    Ok(())
}

fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("Next steps:");
    println!("  1. Edit thresholds, term buckets and volatility windows as needed");
    println!("  2. Run 'optx validate --config {:?}' to check configuration", output_path);
    println!(
        "  3. Run 'optx compute --config {:?} --input <dir> --symbols SPY --date YYYYMMDD'",
        output_path
    );

    Ok(())
}
