//! windmesh CLI - wind field densification and interpolation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use windmesh_algorithms::export::{export_records, ExportRecord, RunSummary};
use windmesh_algorithms::grid::{native_spacing, native_ticks};
use windmesh_algorithms::suite::{run_suite, ModelStrategy, SuiteConfig};
use windmesh_algorithms::wind::components;
use windmesh_core::PointSet;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "windmesh")]
#[command(author, version, about = "Wind field densification and spatial interpolation", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about an input point file
    Info {
        /// Input points (JSON array)
        input: PathBuf,
    },
    /// Run the interpolation suite for one partition
    Run {
        /// Input points (JSON array)
        input: PathBuf,
        /// Output file (JSON: run summary and one record per mesh node)
        output: PathBuf,
        /// Suite configuration (JSON); every key is optional
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Named validation points to merge into the prediction targets
        #[arg(long)]
        validation: Option<PathBuf>,
        /// Override the refinement factor
        #[arg(short, long)]
        refinement: Option<usize>,
        /// Override the hold-out percentage (0 disables hold-out)
        #[arg(long)]
        test_pct: Option<f64>,
        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Override the model strategy: auto, idw, universal
        #[arg(long)]
        strategy: Option<String>,
    },
}

// ─── Input records ──────────────────────────────────────────────────────

/// One input observation. Wind is given as `u`/`v` or as
/// `wind_speed`/`wind_dir` (degrees, direction the wind blows from).
#[derive(Debug, Deserialize)]
struct InputPoint {
    node_id: String,
    x: f64,
    y: f64,
    u: Option<f64>,
    v: Option<f64>,
    wind_speed: Option<f64>,
    wind_dir: Option<f64>,
    topo: Option<f64>,
}

#[derive(Serialize)]
struct RunOutput {
    summary: RunSummary,
    records: Vec<ExportRecord>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_points(path: &Path) -> Result<PointSet> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records: Vec<InputPoint> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse points from {}", path.display()))?;
    to_point_set(records)
}

fn to_point_set(records: Vec<InputPoint>) -> Result<PointSet> {
    let n = records.len();
    let mut ids = Vec::with_capacity(n);
    let mut xs = Vec::with_capacity(n);
    let mut ys = Vec::with_capacity(n);
    let mut u = Vec::with_capacity(n);
    let mut v = Vec::with_capacity(n);
    let mut topo = Vec::with_capacity(n);
    let mut has_wind = false;
    let mut has_topo = false;

    for r in records {
        let (ui, vi) = match (r.u, r.v, r.wind_speed, r.wind_dir) {
            (Some(a), Some(b), _, _) => (a, b),
            (_, _, Some(s), Some(d)) => components(s, d),
            _ => (f64::NAN, f64::NAN),
        };
        has_wind |= ui.is_finite() || vi.is_finite();
        has_topo |= r.topo.is_some();
        ids.push(r.node_id);
        xs.push(r.x);
        ys.push(r.y);
        u.push(ui);
        v.push(vi);
        topo.push(r.topo.unwrap_or(f64::NAN));
    }

    let mut points = PointSet::new(ids, xs, ys)?;
    if has_wind {
        points.add_column("u", u)?;
        points.add_column("v", v)?;
    }
    if has_topo {
        points.add_column("topo", topo)?;
    }
    Ok(points)
}

fn read_config(path: Option<&Path>) -> Result<SuiteConfig> {
    let Some(path) = path else {
        return Ok(SuiteConfig::default());
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

fn parse_strategy(s: &str) -> Result<ModelStrategy> {
    let strategy = match s.to_lowercase().as_str() {
        "auto" => ModelStrategy::Auto,
        "idw" => ModelStrategy::Idw,
        "universal" | "uk" => ModelStrategy::Universal,
        _ => anyhow::bail!("Unknown strategy: {}. Use auto, idw, or universal.", s),
    };
    Ok(strategy)
}

fn write_output(path: &Path, output: &RunOutput) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, output).context("Failed to write output")?;
    writer.flush().context("Failed to write output")?;
    Ok(())
}

fn done(path: &Path, elapsed: std::time::Duration) {
    println!("Mesh saved to: {}", path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => {
            let points = read_points(&input)?;
            let (xt, yt) = native_ticks(&points)?;

            println!("File: {}", input.display());
            println!("  Points: {}", points.len());
            if let Some((min_x, min_y, max_x, max_y)) = points.extent() {
                println!("  Extent: ({min_x:.1}, {min_y:.1}) - ({max_x:.1}, {max_y:.1})");
            }
            println!("  Native ticks: {} x {}", xt.len(), yt.len());
            if let Some(dx) = native_spacing(&xt) {
                println!("  Native x spacing: {dx:.3}");
            }
            if let Some(dy) = native_spacing(&yt) {
                println!("  Native y spacing: {dy:.3}");
            }
            let columns: Vec<&str> = points.column_names().collect();
            println!("  Columns: {}", columns.join(", "));
        }

        Commands::Run {
            input,
            output,
            config,
            validation,
            refinement,
            test_pct,
            seed,
            strategy,
        } => {
            let mut cfg = read_config(config.as_deref())?;
            if let Some(r) = refinement {
                cfg.refinement_factor = r;
            }
            if let Some(t) = test_pct {
                cfg.test_pct = t;
            }
            if let Some(s) = seed {
                cfg.seed = s;
            }
            if let Some(s) = strategy {
                cfg.model_strategy = parse_strategy(&s)?;
            }

            let data = read_points(&input)?;
            let validation = validation.as_deref().map(read_points).transpose()?;
            info!(points = data.len(), fields = ?cfg.fields, "input loaded");

            let pb = spinner("Interpolating...");
            let start = Instant::now();
            let result = run_suite(&data, validation.as_ref(), &cfg);
            pb.finish_and_clear();
            let suite = result.context("Interpolation run failed")?;
            let elapsed = start.elapsed();

            for (field, report) in &suite.components {
                let holdout = report
                    .holdout
                    .map(|m| format!("hold-out RSR {:.3}, Bias {:.3}", m.rsr, m.bias))
                    .unwrap_or_else(|| "no hold-out".to_string());
                println!("  {field}: {} ({holdout})", report.model());
            }

            let out = RunOutput {
                summary: RunSummary::new(&suite),
                records: export_records(&suite),
            };
            write_output(&output, &out)?;
            done(&output, elapsed);
        }
    }

    Ok(())
}
