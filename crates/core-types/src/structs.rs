use crate::enums::{SignalDirection, StrategyId, TradeSide};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One OHLCV sample for a fixed time interval. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// A strategy's directional recommendation for the current bar.
///
/// Produced fresh each bar and not persisted beyond the bar that
/// generated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub strategy: StrategyId,
    pub direction: SignalDirection,
    /// Confidence in [0, 1]. A warm-up Hold always carries 0.
    pub confidence: Decimal,
    pub reason: String,
}

impl Signal {
    /// A Hold signal with zero confidence, used during strategy warm-up.
    pub fn hold(strategy: StrategyId, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            direction: SignalDirection::Hold,
            confidence: Decimal::ZERO,
            reason: reason.into(),
        }
    }
}

/// The merged outcome of several strategies voting on the same bar.
/// Derived per bar and consumed immediately by the execution model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleDecision {
    pub direction: SignalDirection,
    /// Mean confidence of the signals voting the winning direction.
    pub aggregate_confidence: Decimal,
    /// Fraction of total voting weight that agreed with the winner.
    pub consensus_ratio: Decimal,
    pub contributing: Vec<Signal>,
}

impl EnsembleDecision {
    /// The Hold decision used when consensus or confidence gates fail.
    pub fn hold(contributing: Vec<Signal>) -> Self {
        Self {
            direction: SignalDirection::Hold,
            aggregate_confidence: Decimal::ZERO,
            consensus_ratio: Decimal::ZERO,
            contributing,
        }
    }
}

/// An executed fill, recorded as an append-only ledger entry.
///
/// Trades are immutable once written; corrections happen by appending an
/// offsetting trade, never by editing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    /// Index of the bar that produced this fill.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    /// Execution price after slippage adjustment.
    pub price: Decimal,
    pub commission: Decimal,
    /// The adverse price movement paid versus the bar close.
    pub slippage_cost: Decimal,
    pub strategy: StrategyId,
    pub confidence: Decimal,
    /// Set on fills that reduce a position; None for opening fills.
    pub realized_pnl: Option<Decimal>,
}

/// A currently open position, owned exclusively by the portfolio ledger.
/// Negative quantity denotes a short position (when shorting is enabled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_entry_price: Decimal,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Marks the position against a new close price.
    pub fn update_unrealized_pnl(&mut self, current_price: Decimal) {
        self.current_price = current_price;
        self.unrealized_pnl = (current_price - self.avg_entry_price) * self.quantity;
    }

    /// Current mark-to-market value of the position.
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }
}

/// Summary statistics for a run, derived on demand.
///
/// Always a pure function of (snapshots, trades, initial capital); never
/// persisted separately, so it can be recomputed at any point mid-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: Decimal,
    /// Standard deviation of per-bar returns, annualized.
    pub volatility: Decimal,
    pub sharpe_ratio: Decimal,
    /// Non-positive; the deepest decline from a running equity peak.
    pub max_drawdown: Decimal,
    pub win_rate: Decimal,
    /// None when there are no losing trades to divide by.
    pub profit_factor: Option<Decimal>,
    pub total_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub avg_trade_return: Decimal,
    pub best_trade: Decimal,
    pub worst_trade: Decimal,
    pub total_commission: Decimal,
    pub total_slippage: Decimal,
    pub final_value: Decimal,
}

/// The portfolio's mark-to-market state at the end of one simulated bar.
///
/// One snapshot is emitted per bar, trade or no trade; the history is
/// append-only and the latest snapshot is the "current state".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Monotonically increasing bar index within the run.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub total_value: Decimal,
    pub cash: Decimal,
    pub positions: Vec<Position>,
    /// Return versus the previous snapshot; zero for the first bar.
    pub daily_return: Decimal,
    pub cumulative_return: Decimal,
    pub running_sharpe: Decimal,
    /// Non-positive drawdown from the running equity peak.
    pub running_max_drawdown: Decimal,
    /// True when this bar was carried forward over a data gap.
    pub gap_carried: bool,
}
