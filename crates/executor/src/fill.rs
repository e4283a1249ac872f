use crate::portfolio::Portfolio;
use configuration::SimulationConfig;
use core_types::{EnsembleDecision, PriceBar, SignalDirection, StrategyId, Trade, TradeSide};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Quantities are rounded down to this many decimal places before filling.
const QUANTITY_PRECISION: u32 = 8;

/// Fills smaller than this are dropped rather than executed.
const MIN_TRADE_QUANTITY: Decimal = dec!(0.001);

/// Why a decision produced no fill. A skip is a recorded no-op, never an
/// error: the run continues and no Trade is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The decision direction was Hold.
    NotActionable,
    /// Opening a new position would exceed `max_positions`.
    MaxPositionsReached,
    /// A Sell arrived with nothing to sell and shorting is disabled.
    NoPositionToSell,
    /// Sizing produced a quantity below the minimum fill size.
    BelowMinimumQuantity,
}

/// The result of presenting one decision to the execution model.
#[derive(Debug)]
pub enum FillOutcome {
    /// A fill to be applied to the portfolio. `realized_pnl` is still
    /// unset; the ledger attaches it when the fill reduces a position.
    Filled(Trade),
    Skipped(SkipReason),
}

/// The "virtual exchange" of the simulation.
///
/// A pure calculator: it turns an accepted decision into a priced fill
/// (slippage, commission, sizing, cash clamp) but never mutates the
/// portfolio. The caller applies the returned `Trade` to the ledger.
pub struct FillEngine {
    config: SimulationConfig,
}

impl FillEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Execution price for the bar: close adjusted against the trader.
    fn execution_price(&self, side: TradeSide, bar: &PriceBar) -> Decimal {
        match side {
            TradeSide::Buy => bar.close * (Decimal::ONE + self.config.slippage_rate),
            TradeSide::Sell => bar.close * (Decimal::ONE - self.config.slippage_rate),
        }
    }

    /// Percentage-of-equity sizing at the execution price.
    fn sized_quantity(&self, equity: Decimal, execution_price: Decimal) -> Decimal {
        let notional = equity * self.config.position_size_fraction;
        (notional / execution_price)
            .round_dp_with_strategy(QUANTITY_PRECISION, RoundingStrategy::ToZero)
    }

    /// Evaluates one decision against the current portfolio state.
    pub fn process(
        &self,
        decision: &EnsembleDecision,
        strategy: StrategyId,
        bar: &PriceBar,
        sequence: u64,
        portfolio: &Portfolio,
    ) -> FillOutcome {
        let side = match decision.direction {
            SignalDirection::Buy => TradeSide::Buy,
            SignalDirection::Sell => TradeSide::Sell,
            SignalDirection::Hold => return FillOutcome::Skipped(SkipReason::NotActionable),
        };

        let symbol = &self.config.symbol;
        let open_quantity = portfolio
            .position(symbol)
            .map(|position| position.quantity)
            .unwrap_or(Decimal::ZERO);

        let execution_price = self.execution_price(side, bar);
        let equity = portfolio.equity(bar.close);
        let sized = self.sized_quantity(equity, execution_price);

        let quantity = match side {
            TradeSide::Buy if open_quantity < Decimal::ZERO => {
                // Covering a short: never buy back more than is owed.
                sized.min(-open_quantity)
            }
            TradeSide::Buy => {
                if open_quantity.is_zero() && portfolio.open_positions() >= self.config.max_positions
                {
                    tracing::debug!(%symbol, sequence, "max positions reached; dropping buy");
                    return FillOutcome::Skipped(SkipReason::MaxPositionsReached);
                }
                // Insufficient cash shrinks the fill instead of failing.
                let unit_cost = execution_price * (Decimal::ONE + self.config.commission_rate);
                let affordable = (portfolio.cash / unit_cost)
                    .round_dp_with_strategy(QUANTITY_PRECISION, RoundingStrategy::ToZero);
                sized.min(affordable)
            }
            TradeSide::Sell if open_quantity > Decimal::ZERO => sized.min(open_quantity),
            TradeSide::Sell => {
                if !self.config.allow_short {
                    tracing::debug!(%symbol, sequence, "no open position; dropping sell");
                    return FillOutcome::Skipped(SkipReason::NoPositionToSell);
                }
                if open_quantity.is_zero() && portfolio.open_positions() >= self.config.max_positions
                {
                    tracing::debug!(%symbol, sequence, "max positions reached; dropping sell");
                    return FillOutcome::Skipped(SkipReason::MaxPositionsReached);
                }
                sized
            }
        };

        if quantity < MIN_TRADE_QUANTITY {
            tracing::debug!(%symbol, sequence, %quantity, "fill below minimum size; dropping");
            return FillOutcome::Skipped(SkipReason::BelowMinimumQuantity);
        }

        let notional = quantity * execution_price;
        let commission = notional * self.config.commission_rate;
        let slippage_cost = (execution_price - bar.close).abs() * quantity;

        FillOutcome::Filled(Trade {
            id: Uuid::new_v4(),
            sequence,
            timestamp: bar.timestamp,
            symbol: symbol.clone(),
            side,
            quantity,
            price: execution_price,
            commission,
            slippage_cost,
            strategy,
            confidence: decision.aggregate_confidence,
            realized_pnl: None,
        })
    }
}
