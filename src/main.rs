use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use core_types::{PerformanceMetrics, PriceBar, PriceSeries, StrategyId};
use events::SimulationEvent;
use indicatif::{ProgressBar, ProgressStyle};
use simulator::SimulationHandle;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// A deterministic, replay-based strategy simulation engine for crypto
/// price histories.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a price history through a strategy and report performance.
    Run(RunArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "meridian.toml")]
    config: PathBuf,

    /// Path to a JSON file holding the ordered OHLCV bars.
    #[arg(long)]
    bars: PathBuf,

    /// The strategy to run: ma_crossover, rsi_mean_reversion, momentum,
    /// or ensemble.
    #[arg(long, default_value = "ensemble")]
    strategy: String,

    /// Expected hours between bars. When set, missing bars are carried
    /// forward from the last close and flagged.
    #[arg(long)]
    interval_hours: Option<i64>,
}

/// The main entry point for the Meridian simulation engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => handle_run(args).await,
    }
}

fn parse_strategy(name: &str) -> anyhow::Result<StrategyId> {
    match name {
        "ma_crossover" => Ok(StrategyId::MaCrossover),
        "rsi_mean_reversion" => Ok(StrategyId::RsiMeanReversion),
        "momentum" => Ok(StrategyId::Momentum),
        "ensemble" => Ok(StrategyId::Ensemble),
        other => anyhow::bail!("unknown strategy '{other}'"),
    }
}

/// Loads the inputs, runs the simulation to completion, and renders the
/// trade log and performance report.
async fn handle_run(args: RunArgs) -> anyhow::Result<()> {
    let strategy_id = parse_strategy(&args.strategy)?;
    let config = configuration::load_config(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let raw = std::fs::read_to_string(&args.bars)
        .with_context(|| format!("failed to read {}", args.bars.display()))?;
    let bars: Vec<PriceBar> =
        serde_json::from_str(&raw).context("bars file is not a JSON array of OHLCV bars")?;
    let mut series = PriceSeries::new(bars)?;
    if let Some(hours) = args.interval_hours {
        series = series.gap_filled(chrono::Duration::hours(hours));
    }

    println!(
        "Simulating {} over {} bars with strategy '{}'",
        config.simulation.symbol,
        series.len(),
        strategy_id
    );

    let handle = SimulationHandle::create(strategy_id, &config, &series)?;
    let mut events = handle.subscribe();
    handle.start().await?;

    let progress_bar = ProgressBar::new(series.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let metrics = loop {
        match events.recv().await? {
            SimulationEvent::BarProcessed { progress, .. } => {
                progress_bar.set_position(progress.bars_processed);
            }
            SimulationEvent::TradeExecuted(trade) => {
                progress_bar.set_message(format!(
                    "{:?} {} @ {}",
                    trade.side, trade.quantity, trade.price
                ));
            }
            SimulationEvent::GapDetected { timestamp, .. } => {
                tracing::warn!(%timestamp, "carried a missing bar forward");
            }
            SimulationEvent::Completed { metrics } => break metrics,
            SimulationEvent::RunFailed { message } => {
                progress_bar.abandon_with_message("simulation failed");
                anyhow::bail!("simulation failed: {message}");
            }
            SimulationEvent::StatusChanged { .. } => {}
        }
    };
    progress_bar.finish_with_message("simulation complete");

    let state = handle.state().await;
    println!("\nExecuted {} trades:", state.trades.len());
    for trade in &state.trades {
        println!(
            "  bar {:>4}  {:?}  {} @ {}  pnl {}",
            trade.sequence,
            trade.side,
            trade.quantity,
            trade.price,
            trade
                .realized_pnl
                .map(|pnl| pnl.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    println!("\n{}", render_report(&metrics));
    Ok(())
}

/// Renders the performance report as a terminal table.
fn render_report(metrics: &PerformanceMetrics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![Cell::new("Metric"), Cell::new("Value")]);
    table.add_row(vec!["Final Value".to_string(), metrics.final_value.to_string()]);
    table.add_row(vec![
        "Total Return".to_string(),
        format!("{:.4}%", metrics.total_return * rust_decimal::Decimal::ONE_HUNDRED),
    ]);
    table.add_row(vec!["Sharpe Ratio".to_string(), format!("{:.4}", metrics.sharpe_ratio)]);
    table.add_row(vec!["Volatility".to_string(), format!("{:.4}", metrics.volatility)]);
    table.add_row(vec![
        "Max Drawdown".to_string(),
        format!("{:.4}%", metrics.max_drawdown * rust_decimal::Decimal::ONE_HUNDRED),
    ]);
    table.add_row(vec![
        "Win Rate".to_string(),
        format!("{:.4}", metrics.win_rate),
    ]);
    table.add_row(vec![
        "Profit Factor".to_string(),
        metrics
            .profit_factor
            .map(|factor| format!("{factor:.4}"))
            .unwrap_or_else(|| "undefined (no losing trades)".to_string()),
    ]);
    table.add_row(vec![
        "Trades (closed/total)".to_string(),
        format!("{}/{}", metrics.closed_trades, metrics.total_trades),
    ]);
    table.add_row(vec![
        "Winners / Losers".to_string(),
        format!("{}/{}", metrics.winning_trades, metrics.losing_trades),
    ]);
    table.add_row(vec![
        "Avg Trade PnL".to_string(),
        format!("{:.4}", metrics.avg_trade_return),
    ]);
    table.add_row(vec!["Best Trade".to_string(), metrics.best_trade.to_string()]);
    table.add_row(vec!["Worst Trade".to_string(), metrics.worst_trade.to_string()]);
    table.add_row(vec![
        "Total Commission".to_string(),
        format!("{:.4}", metrics.total_commission),
    ]);
    table.add_row(vec![
        "Total Slippage".to_string(),
        format!("{:.4}", metrics.total_slippage),
    ]);
    table
}
