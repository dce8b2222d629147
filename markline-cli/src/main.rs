//! Markline CLI: run the chart engine over a candle file.
//!
//! Commands:
//! - `markers` — aggregated markers as JSON (or CSV when `--output` ends in `.csv`)
//! - `series` — every configured indicator series as CSV, one row per candle
//! - `replay` — feed candles one by one as a live stream and check the
//!   windowed recompute against a full recompute

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use markline_core::config::ComponentConfig;
use markline_core::data::{parse_history, read_csv_path, random_walk, SyntheticParams};
use markline_core::domain::{normalize_candles, Candle, Marker};
use markline_core::{ChartConfig, ChartSession, UpdateKind};

#[derive(Parser)]
#[command(
    name = "markline",
    about = "Markline CLI — indicators and reversal markers for candle charts"
)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print aggregated markers.
    Markers {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print indicator series as CSV.
    Series {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Simulate a live feed and compare with a full recompute.
    Replay {
        #[command(flatten)]
        source: SourceArgs,

        /// Bars loaded as history before the feed starts. Defaults to half.
        #[arg(long)]
        history: Option<usize>,

        /// Send a forming version of every bar before the closed one.
        #[arg(long, default_value_t = false)]
        forming: bool,

        /// Largest accepted difference between windowed and full series values.
        #[arg(long, default_value_t = 1e-6)]
        tolerance: f64,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Candle file: `.csv`, anything else is read as a JSON history response.
    #[arg(long, conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Generate this many random-walk candles instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for `--synthetic`.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Chart config (TOML). Defaults to the standard layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy name; repeatable. Replaces the strategies from the config.
    #[arg(long = "strategy")]
    strategies: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Markers { source, output } => run_markers(&source, output.as_deref()),
        Commands::Series { source, output } => run_series(&source, output.as_deref()),
        Commands::Replay {
            source,
            history,
            forming,
            tolerance,
        } => run_replay(&source, history, forming, tolerance),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "markline_cli=debug,markline_core=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

// ─── Inputs ──────────────────────────────────────────────────────────

fn load_config(source: &SourceArgs) -> Result<ChartConfig> {
    let mut config = match &source.config {
        Some(path) => ChartConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ChartConfig::default(),
    };
    if !source.strategies.is_empty() {
        config.strategies = source
            .strategies
            .iter()
            .map(ComponentConfig::new)
            .collect();
        config.validate().context("invalid --strategy")?;
    }
    Ok(config)
}

fn load_candles(source: &SourceArgs) -> Result<Vec<Candle>> {
    let candles = match (&source.input, source.synthetic) {
        (Some(path), _) => read_candle_file(path)?,
        (None, Some(n)) => {
            let params = SyntheticParams {
                seed: source.seed,
                ..SyntheticParams::default()
            };
            random_walk(n, &params)
        }
        (None, None) => bail!("one of --input or --synthetic is required"),
    };
    if candles.is_empty() {
        bail!("no candles to process");
    }
    info!(bars = candles.len(), "candles loaded");
    Ok(candles)
}

fn read_candle_file(path: &Path) -> Result<Vec<Candle>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        let candles = read_csv_path(path)
            .with_context(|| format!("reading CSV {}", path.display()))?;
        Ok(normalize_candles(candles))
    } else {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        parse_history(&body).with_context(|| format!("decoding history {}", path.display()))
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("creating {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn build_session(source: &SourceArgs) -> Result<(ChartSession, Vec<Candle>)> {
    let config = load_config(source)?;
    let candles = load_candles(source)?;
    let session = ChartSession::new(config).context("building chart components")?;
    Ok((session, candles))
}

// ─── Commands ────────────────────────────────────────────────────────

fn run_markers(source: &SourceArgs, output: Option<&Path>) -> Result<()> {
    let (mut session, candles) = build_session(source)?;
    session.load_history(candles);

    let csv_out = output.is_some_and(|p| p.extension().is_some_and(|e| e == "csv"));
    let mut out = open_output(output)?;
    if csv_out {
        write_markers_csv(&mut out, session.markers())?;
    } else {
        serde_json::to_writer_pretty(&mut out, session.markers())
            .context("writing markers")?;
        writeln!(out)?;
    }
    out.flush()?;

    eprintln!(
        "{}: {} bars, {} markers, position {:?}",
        session.symbol(),
        session.candles().len(),
        session.markers().len(),
        session.position()
    );
    Ok(())
}

fn write_markers_csv(out: &mut dyn Write, markers: &[Marker]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["time", "datetime", "index", "side", "price", "rule", "confidence"])?;
    for m in markers {
        writer.write_record([
            m.time.to_string(),
            format_time(m.time),
            m.index.to_string(),
            m.side.to_string(),
            m.price.to_string(),
            m.rule.to_string(),
            format!("{:?}", m.confidence).to_lowercase(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn run_series(source: &SourceArgs, output: Option<&Path>) -> Result<()> {
    let (mut session, candles) = build_session(source)?;
    session.load_history(candles);

    let out = open_output(output)?;
    let mut writer = csv::Writer::from_writer(out);

    let names: Vec<&str> = session.series().names().collect();
    let mut header = vec!["time", "open", "high", "low", "close", "volume"];
    header.extend(names.iter().copied());
    writer.write_record(&header)?;

    for (i, c) in session.candles().iter().enumerate() {
        let mut row = vec![
            c.time.to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ];
        for name in &names {
            // NaN warmup values are written as empty cells.
            let cell = session
                .series()
                .get(name, i)
                .filter(|v| v.is_finite())
                .map(|v| v.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        writer.write_record(&row)?;
    }
    writer.flush().context("writing series")?;
    Ok(())
}

fn run_replay(source: &SourceArgs, history: Option<usize>, forming: bool, tolerance: f64) -> Result<()> {
    let config = load_config(source)?;
    let candles = normalize_candles(load_candles(source)?);
    let split = history.unwrap_or(candles.len() / 2).min(candles.len());

    let mut reference = ChartSession::new(config.clone()).context("building chart components")?;
    reference.load_history(candles.clone());

    let mut live = ChartSession::new(config).context("building chart components")?;
    live.load_history(candles[..split].to_vec());

    let mut replaced = 0usize;
    for c in &candles[split..] {
        if forming {
            live.set_forming(true);
            let partial = Candle::new(c.time, c.open, c.open, c.open, c.open, 0.0);
            live.apply_update(partial);
            live.set_forming(false);
        }
        match live.apply_update(*c) {
            UpdateKind::Replaced => replaced += 1,
            UpdateKind::Appended => {}
            UpdateKind::Stale => bail!("feed produced a stale update at {}", c.time),
        }
    }
    debug!(fed = candles.len() - split, replaced, "replay finished");

    let worst = max_series_diff(&live, &reference)?;
    let markers_match = marker_keys(live.markers()) == marker_keys(reference.markers());

    println!("Bars:            {} ({} history, {} fed)", candles.len(), split, candles.len() - split);
    println!("Replaced bars:   {replaced}");
    println!("Markers:         {} live / {} full", live.markers().len(), reference.markers().len());
    println!("Max series diff: {worst:.3e}");
    println!("Position:        {:?} live / {:?} full", live.position(), reference.position());

    if worst > tolerance {
        bail!("windowed series drifted from the full recompute by {worst:.3e} (tolerance {tolerance:.1e})");
    }
    if !markers_match || live.position() != reference.position() {
        bail!("windowed markers differ from the full recompute");
    }
    println!("OK");
    Ok(())
}

fn max_series_diff(live: &ChartSession, reference: &ChartSession) -> Result<f64> {
    let mut worst = 0.0_f64;
    for (name, expected) in reference.series().iter() {
        let Some(actual) = live.series().get_series(name) else {
            bail!("series {name} missing from the live session");
        };
        if actual.len() != expected.len() {
            bail!("series {name}: {} values live, {} full", actual.len(), expected.len());
        }
        for (i, (a, b)) in actual.iter().zip(expected).enumerate() {
            if a.is_nan() != b.is_nan() {
                bail!("series {name}: warmup mismatch at bar {i}");
            }
            if a.is_finite() && b.is_finite() {
                worst = worst.max((a - b).abs());
            }
        }
    }
    Ok(worst)
}

fn marker_keys(markers: &[Marker]) -> Vec<(i64, String)> {
    markers.iter().map(|m| (m.time, m.label())).collect()
}

fn format_time(time: i64) -> String {
    DateTime::from_timestamp(time, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}
