//! Pinbar CLI: signal evaluation, sizing and protective-order planning.
//!
//! Commands:
//! - `evaluate`: decide on the latest candle of a kline file
//! - `size`: fixed-fraction position size for a balance and price
//! - `plan`: one trading cycle against an exchange snapshot (dry run)
//! - `scan`: evaluate several kline files in parallel

mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};

use pinbar_core::config::EngineConfig;
use pinbar_core::cycle::{CycleOutcome, TradingCycle};
use pinbar_core::domain::{
    parse_klines_csv, parse_klines_json, Candle, CandleWindow, SymbolTradingRules,
};
use pinbar_core::orders::{place_dual_take_profit, DryRunPlacer, ExchangeSnapshot, OrderSource};
use pinbar_core::signals::{SignalEngine, StrategyRegistry};
use pinbar_core::size_position;

#[derive(Parser)]
#[command(name = "pinbar", about = "Pinbar CLI: price-action signals and risk planning")]
struct Cli {
    /// Engine configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the latest candle of a kline file (.json or .csv).
    Evaluate {
        klines: PathBuf,

        /// Print the full analysis as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Size a position with the configured fraction and leverage.
    Size {
        #[arg(long)]
        balance: f64,

        #[arg(long)]
        price: f64,

        #[arg(long, default_value_t = 0.001)]
        step_size: f64,

        #[arg(long, default_value_t = 3)]
        quantity_precision: u32,

        /// Defaults to the step size.
        #[arg(long)]
        min_qty: Option<f64>,

        #[arg(long, default_value_t = 1_000_000.0)]
        max_qty: f64,

        #[arg(long, default_value_t = 5.0)]
        min_notional: f64,
    },
    /// Run one trading cycle for a symbol against an exchange snapshot.
    Plan {
        klines: PathBuf,

        /// Exchange snapshot JSON: balance, symbol rules, positions, open orders.
        #[arg(long)]
        snapshot: PathBuf,

        #[arg(long)]
        symbol: String,
    },
    /// Evaluate several kline files in parallel.
    Scan {
        #[arg(required = true)]
        klines: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    let config = load_config(cli.config.as_deref())?;
    info!(
        strategy = %config.strategy.name,
        fingerprint = %config.fingerprint(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Evaluate { klines, json } => run_evaluate(&config, &klines, json),
        Commands::Size {
            balance,
            price,
            step_size,
            quantity_precision,
            min_qty,
            max_qty,
            min_notional,
        } => {
            let rules = SymbolTradingRules {
                symbol: "CLI".into(),
                price_precision: 8,
                quantity_precision,
                min_qty: min_qty.unwrap_or(step_size),
                max_qty,
                step_size,
                min_notional,
            };
            run_size(&config, balance, price, &rules)
        }
        Commands::Plan {
            klines,
            snapshot,
            symbol,
        } => run_plan(&config, &klines, &snapshot, &symbol),
        Commands::Scan { klines } => run_scan(&config, &klines),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_candles(path: &Path) -> Result<Vec<Candle>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let candles = if is_csv {
        parse_klines_csv(&content)
    } else {
        parse_klines_json(&content)
    };
    candles.with_context(|| format!("parsing klines from {}", path.display()))
}

fn load_window(path: &Path, config: &EngineConfig) -> Result<CandleWindow> {
    let candles = load_candles(path)?;
    let capacity = candles.len().max(config.min_window());
    let window = CandleWindow::from_candles(capacity, candles)
        .with_context(|| format!("building candle window from {}", path.display()))?;
    if !window.has_at_least(config.min_window()) {
        warn!(
            file = %path.display(),
            candles = window.len(),
            required = config.min_window(),
            "kline file is shorter than the strategy window"
        );
    }
    Ok(window)
}

fn engine(config: &EngineConfig) -> Result<SignalEngine> {
    let strategy =
        StrategyRegistry::with_builtins().create_or_default(&config.strategy.name, config)?;
    Ok(SignalEngine::new(strategy))
}

fn run_evaluate(config: &EngineConfig, klines: &Path, json: bool) -> Result<()> {
    let window = load_window(klines, config)?;
    let analysis = engine(config)?.analyze(&window);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let signal = &analysis.signal;
    println!("Signal:   {} (strength {})", signal.direction, signal.strength);
    if let Some(candle) = window.latest() {
        println!("Candle:   {} close {}", candle.timestamp, candle.close);
    }
    let patterns = analysis.patterns.detected_names();
    if patterns.is_empty() {
        println!("Patterns: none");
    } else {
        println!("Patterns: {}", patterns.join(", "));
    }
    for reason in &signal.reasons {
        println!("  - {reason}");
    }
    Ok(())
}

fn run_size(
    config: &EngineConfig,
    balance: f64,
    price: f64,
    rules: &SymbolTradingRules,
) -> Result<()> {
    let risk = &config.risk;
    let plan = size_position(balance, price, risk.leverage, risk.fixed_trade_fraction, rules);
    println!("Balance:   {balance}");
    println!("Price:     {price}");
    println!("Leverage:  {}x", risk.leverage);
    println!("Fraction:  {:.2}%", risk.fixed_trade_fraction * 100.0);
    println!("Quantity:  {}", plan.quantity);
    println!("Margin:    {:.8}", plan.margin_required);
    println!("Notional:  {:.8}", plan.quantity * price);
    if !plan.is_tradeable() {
        println!("No tradeable quantity within the allocation.");
    }
    Ok(())
}

fn run_plan(
    config: &EngineConfig,
    klines: &Path,
    snapshot_path: &Path,
    symbol: &str,
) -> Result<()> {
    let window = load_window(klines, config)?;
    let snapshot = ExchangeSnapshot::load(snapshot_path)
        .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?;

    let mut cycle = TradingCycle::from_config(config, &StrategyRegistry::with_builtins())?;
    let outcome = cycle.run(&snapshot, symbol, &window)?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let CycleOutcome::Opened(plan) = &outcome {
        if let Some(take_profit) = &plan.take_profit {
            let existing = snapshot.open_orders(symbol)?;
            let mut placer = DryRunPlacer::default();
            let placement = place_dual_take_profit(&mut placer, symbol, &existing, take_profit);
            println!("{}", serde_json::to_string_pretty(&placement)?);
        }
    }
    Ok(())
}

struct ScanRow {
    file: PathBuf,
    result: Result<(String, u32, Vec<&'static str>)>,
}

fn scan_one(config: &EngineConfig, file: &Path) -> Result<(String, u32, Vec<&'static str>)> {
    let window = load_window(file, config)?;
    let analysis = engine(config)?.analyze(&window);
    Ok((
        analysis.signal.direction.to_string(),
        analysis.signal.strength,
        analysis.patterns.detected_names(),
    ))
}

fn run_scan(config: &EngineConfig, files: &[PathBuf]) -> Result<()> {
    let rows: Vec<ScanRow> = files
        .par_iter()
        .map(|file| ScanRow {
            file: file.clone(),
            result: scan_one(config, file),
        })
        .collect();

    println!("{:<40} {:>6} {:>8}  PATTERNS", "FILE", "SIGNAL", "STRENGTH");
    let mut failures = 0;
    for row in &rows {
        match &row.result {
            Ok((direction, strength, patterns)) => println!(
                "{:<40} {:>6} {:>8}  {}",
                row.file.display(),
                direction,
                strength,
                patterns.join(", ")
            ),
            Err(e) => {
                failures += 1;
                println!("{:<40} error: {e:#}", row.file.display());
            }
        }
    }
    if failures > 0 {
        warn!(failures, total = rows.len(), "some kline files could not be evaluated");
    }
    Ok(())
}
