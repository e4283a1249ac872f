use crate::error::ExecutorError;
use configuration::SimulationConfig;
use core_types::{PortfolioSnapshot, Position, PriceBar, Trade, TradeSide};
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::HashMap;

/// Manages the state of the simulated account: cash, open positions, and
/// the running statistics needed for per-bar snapshots.
///
/// Its sole responsibility is to accurately reflect state left by fills.
/// Cash moves only on fills; price movement alone changes unrealized PnL
/// and total value, never cash.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: Decimal,
    pub positions: HashMap<String, Position>,
    initial_capital: Decimal,
    periods_per_year: u32,
    risk_free_rate: Decimal,
    last_total_value: Option<Decimal>,
    returns: Vec<Decimal>,
    peak_value: Decimal,
    max_drawdown: Decimal,
}

impl Portfolio {
    /// Creates a fresh portfolio holding only the starting capital.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            cash: config.initial_capital,
            positions: HashMap::new(),
            initial_capital: config.initial_capital,
            periods_per_year: config.periods_per_year,
            risk_free_rate: config.risk_free_rate,
            last_total_value: None,
            returns: Vec::new(),
            peak_value: config.initial_capital,
            max_drawdown: Decimal::ZERO,
        }
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Equity with every position marked at the given price.
    ///
    /// A run trades the single configured symbol, so one bar price covers
    /// every open position. Marking a multi-symbol book needs per-symbol
    /// prices instead.
    pub fn equity(&self, mark_price: Decimal) -> Decimal {
        let positions_value: Decimal = self
            .positions
            .values()
            .map(|position| position.quantity * mark_price)
            .sum();
        self.cash + positions_value
    }

    /// Applies one fill to cash and positions.
    ///
    /// Returns the trade with `realized_pnl` attached when the fill
    /// reduced an open position. The fill engine clamps quantities, so a
    /// closing overshoot or negative cash here is a sizing bug and fatal.
    pub fn apply_fill(&mut self, mut trade: Trade) -> Result<Trade, ExecutorError> {
        let notional = trade.price * trade.quantity;
        match trade.side {
            TradeSide::Buy => self.cash -= notional + trade.commission,
            TradeSide::Sell => self.cash += notional - trade.commission,
        }
        if self.cash.is_sign_negative() {
            return Err(ExecutorError::InsufficientCash {
                required: (notional + trade.commission).to_string(),
                available: (self.cash + notional + trade.commission).to_string(),
            });
        }

        let position = self
            .positions
            .entry(trade.symbol.clone())
            .or_insert_with(|| Position {
                symbol: trade.symbol.clone(),
                quantity: Decimal::ZERO,
                avg_entry_price: Decimal::ZERO,
                current_price: trade.price,
                unrealized_pnl: Decimal::ZERO,
            });

        let open = position.quantity;
        let is_reducing = match trade.side {
            TradeSide::Buy => open < Decimal::ZERO,
            TradeSide::Sell => open > Decimal::ZERO,
        };

        if is_reducing {
            if trade.quantity > open.abs() {
                return Err(ExecutorError::InvalidClosingQuantity {
                    requested: trade.quantity.to_string(),
                    available: open.abs().to_string(),
                });
            }
            // Realized PnL on the closed quantity, net of this fill's
            // commission. Sign flips for short covers.
            let per_unit = match trade.side {
                TradeSide::Sell => trade.price - position.avg_entry_price,
                TradeSide::Buy => position.avg_entry_price - trade.price,
            };
            trade.realized_pnl = Some(per_unit * trade.quantity - trade.commission);
            position.quantity = match trade.side {
                TradeSide::Sell => open - trade.quantity,
                TradeSide::Buy => open + trade.quantity,
            };
        } else {
            // Opening or increasing: recompute the weighted average entry.
            let total_quantity = open.abs() + trade.quantity;
            position.avg_entry_price =
                (position.avg_entry_price * open.abs() + trade.price * trade.quantity)
                    / total_quantity;
            position.quantity = match trade.side {
                TradeSide::Buy => open + trade.quantity,
                TradeSide::Sell => open - trade.quantity,
            };
        }
        position.update_unrealized_pnl(trade.price);

        if position.quantity.is_zero() {
            self.positions.remove(&trade.symbol);
        }

        tracing::debug!(
            side = ?trade.side,
            quantity = %trade.quantity,
            price = %trade.price,
            cash = %self.cash,
            "fill applied"
        );
        Ok(trade)
    }

    /// Closes out the bar: marks every position at the close, updates the
    /// running statistics, and emits the bar's snapshot.
    pub fn mark_to_market(
        &mut self,
        bar: &PriceBar,
        sequence: u64,
        gap_carried: bool,
    ) -> Result<PortfolioSnapshot, ExecutorError> {
        if self.cash.is_sign_negative() {
            return Err(ExecutorError::InvariantViolation(format!(
                "cash is negative at bar {sequence}: {}",
                self.cash
            )));
        }

        for position in self.positions.values_mut() {
            position.update_unrealized_pnl(bar.close);
        }
        let total_value = self.equity(bar.close);

        let recomputed = self.cash
            + self
                .positions
                .values()
                .map(Position::market_value)
                .sum::<Decimal>();
        if (total_value - recomputed).abs() > Decimal::new(1, 9) {
            return Err(ExecutorError::InvariantViolation(format!(
                "total value {total_value} diverged from components {recomputed} at bar {sequence}"
            )));
        }

        let daily_return = match self.last_total_value {
            Some(previous) if !previous.is_zero() => {
                let r = total_value / previous - Decimal::ONE;
                self.returns.push(r);
                r
            }
            _ => Decimal::ZERO,
        };
        self.last_total_value = Some(total_value);

        let cumulative_return = if self.initial_capital.is_zero() {
            Decimal::ZERO
        } else {
            total_value / self.initial_capital - Decimal::ONE
        };

        self.peak_value = self.peak_value.max(total_value);
        if !self.peak_value.is_zero() {
            let drawdown = (total_value - self.peak_value) / self.peak_value;
            self.max_drawdown = self.max_drawdown.min(drawdown);
        }

        Ok(PortfolioSnapshot {
            sequence,
            timestamp: bar.timestamp,
            total_value,
            cash: self.cash,
            positions: self.positions.values().cloned().collect(),
            daily_return,
            cumulative_return,
            running_sharpe: self.running_sharpe(),
            running_max_drawdown: self.max_drawdown,
            gap_carried,
        })
    }

    /// Annualized Sharpe over the per-bar returns observed so far; zero
    /// until there are enough returns for a meaningful deviation.
    fn running_sharpe(&self) -> Decimal {
        let n = self.returns.len();
        if n < 2 {
            return Decimal::ZERO;
        }
        let count = Decimal::from(n);
        let mean = self.returns.iter().sum::<Decimal>() / count;
        let variance = self
            .returns
            .iter()
            .map(|r| (*r - mean) * (*r - mean))
            .sum::<Decimal>()
            / (count - Decimal::ONE);
        let Some(stdev) = variance.sqrt() else {
            return Decimal::ZERO;
        };
        if stdev.is_zero() {
            return Decimal::ZERO;
        }
        let periods = Decimal::from(self.periods_per_year);
        let rf_per_bar = self.risk_free_rate / periods;
        let annualize = periods.sqrt().unwrap_or(Decimal::ZERO);
        (mean - rf_per_bar) / stdev * annualize
    }
}
