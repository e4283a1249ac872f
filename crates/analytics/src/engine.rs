use core_types::{PerformanceMetrics, PortfolioSnapshot, Trade};
use rust_decimal::{Decimal, MathematicalOps};

/// A stateless calculator deriving summary metrics from a run's history.
///
/// Metrics are always a pure function of (snapshots, trades, initial
/// capital); calling this mid-run over a prefix of the history is as valid
/// as calling it at completion. Degenerate inputs produce sentinel values,
/// never a panic: zero closed trades means a zero win rate, zero
/// volatility means a zero Sharpe, and a loss-free run leaves the profit
/// factor undefined (`None`).
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsEngine {
    periods_per_year: u32,
    risk_free_rate: Decimal,
}

impl AnalyticsEngine {
    pub fn new(periods_per_year: u32, risk_free_rate: Decimal) -> Self {
        Self {
            periods_per_year,
            risk_free_rate,
        }
    }

    pub fn calculate(
        &self,
        snapshots: &[PortfolioSnapshot],
        trades: &[Trade],
        initial_capital: Decimal,
    ) -> PerformanceMetrics {
        let final_value = snapshots
            .last()
            .map(|snapshot| snapshot.total_value)
            .unwrap_or(initial_capital);
        let total_return = if initial_capital.is_zero() {
            Decimal::ZERO
        } else {
            (final_value - initial_capital) / initial_capital
        };

        // Per-bar returns; the first snapshot has no predecessor and is
        // excluded from volatility and Sharpe.
        let returns: Vec<Decimal> = snapshots
            .windows(2)
            .filter(|pair| !pair[0].total_value.is_zero())
            .map(|pair| pair[1].total_value / pair[0].total_value - Decimal::ONE)
            .collect();

        let periods = Decimal::from(self.periods_per_year);
        let annualize = periods.sqrt().unwrap_or(Decimal::ZERO);
        let stdev = sample_stdev(&returns);
        let volatility = stdev * annualize;
        let sharpe_ratio = if stdev.is_zero() {
            Decimal::ZERO
        } else {
            let mean = returns.iter().sum::<Decimal>() / Decimal::from(returns.len());
            let rf_per_bar = self.risk_free_rate / periods;
            (mean - rf_per_bar) / stdev * annualize
        };

        let max_drawdown = max_drawdown(snapshots);

        let realized: Vec<Decimal> = trades
            .iter()
            .filter_map(|trade| trade.realized_pnl)
            .collect();
        let winners = realized.iter().filter(|pnl| **pnl > Decimal::ZERO).count();
        let losers = realized.iter().filter(|pnl| **pnl < Decimal::ZERO).count();
        let gross_profit: Decimal = realized
            .iter()
            .filter(|pnl| **pnl > Decimal::ZERO)
            .sum();
        let gross_loss: Decimal = realized
            .iter()
            .filter(|pnl| **pnl < Decimal::ZERO)
            .map(|pnl| pnl.abs())
            .sum();

        let win_rate = if realized.is_empty() {
            Decimal::ZERO
        } else {
            Decimal::from(winners) / Decimal::from(realized.len())
        };
        let profit_factor = if gross_loss.is_zero() {
            None
        } else {
            Some(gross_profit / gross_loss)
        };
        let avg_trade_return = if realized.is_empty() {
            Decimal::ZERO
        } else {
            realized.iter().sum::<Decimal>() / Decimal::from(realized.len())
        };
        let best_trade = realized.iter().copied().max().unwrap_or(Decimal::ZERO);
        let worst_trade = realized.iter().copied().min().unwrap_or(Decimal::ZERO);
        let total_commission: Decimal = trades.iter().map(|trade| trade.commission).sum();
        let total_slippage: Decimal = trades.iter().map(|trade| trade.slippage_cost).sum();

        tracing::debug!(
            snapshots = snapshots.len(),
            trades = trades.len(),
            %final_value,
            "performance metrics calculated"
        );

        PerformanceMetrics {
            total_return,
            volatility,
            sharpe_ratio,
            max_drawdown,
            win_rate,
            profit_factor,
            total_trades: trades.len(),
            closed_trades: realized.len(),
            winning_trades: winners,
            losing_trades: losers,
            avg_trade_return,
            best_trade,
            worst_trade,
            total_commission,
            total_slippage,
            final_value,
        }
    }
}

/// Sample standard deviation; zero when fewer than two observations.
fn sample_stdev(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let count = Decimal::from(values.len());
    let mean = values.iter().sum::<Decimal>() / count;
    let variance = values
        .iter()
        .map(|value| (*value - mean) * (*value - mean))
        .sum::<Decimal>()
        / (count - Decimal::ONE);
    variance.sqrt().unwrap_or(Decimal::ZERO)
}

/// Deepest decline from a running peak, as a non-positive fraction.
fn max_drawdown(snapshots: &[PortfolioSnapshot]) -> Decimal {
    let mut peak = Decimal::ZERO;
    let mut max_drawdown = Decimal::ZERO;
    for snapshot in snapshots {
        peak = peak.max(snapshot.total_value);
        if !peak.is_zero() {
            let drawdown = (snapshot.total_value - peak) / peak;
            max_drawdown = max_drawdown.min(drawdown);
        }
    }
    max_drawdown
}
