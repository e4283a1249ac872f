use crate::error::StrategyError;
use crate::indicators::{clamp_confidence, trailing_return};
use crate::Strategy;
use configuration::MomentumParams;
use core_types::{PriceBar, Signal, SignalDirection, StrategyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The Momentum strategy.
///
/// Follows the trailing return over a lookback window: buy when it exceeds
/// the threshold, sell when it falls below the negated threshold.
pub struct Momentum {
    params: MomentumParams,
}

impl Momentum {
    pub fn new(params: MomentumParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl Strategy for Momentum {
    fn id(&self) -> StrategyId {
        StrategyId::Momentum
    }

    fn warm_up_bars(&self) -> usize {
        self.params.lookback_period + 1
    }

    fn generate_signal(&self, window: &[PriceBar]) -> Signal {
        if window.len() < self.warm_up_bars() {
            return Signal::hold(self.id(), "insufficient history for momentum");
        }

        let closes: Vec<Decimal> = window.iter().map(|bar| bar.close).collect();
        let Some(ret) = trailing_return(&closes, self.params.lookback_period) else {
            return Signal::hold(self.id(), "insufficient history for momentum");
        };

        if ret.abs() <= self.params.momentum_threshold {
            return Signal::hold(self.id(), "trailing return inside threshold band");
        }

        // Full confidence once the move doubles the threshold.
        let confidence = clamp_confidence(ret.abs() / (self.params.momentum_threshold * dec!(2)));
        let direction = if ret > Decimal::ZERO {
            SignalDirection::Buy
        } else {
            SignalDirection::Sell
        };

        Signal {
            strategy: self.id(),
            direction,
            confidence,
            reason: format!("trailing return {ret:.4} over {} bars", self.params.lookback_period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bars(closes: &[&str]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| {
                let close: Decimal = close.parse().unwrap();
                PriceBar {
                    timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: dec!(1000),
                }
            })
            .collect()
    }

    fn strategy(lookback_period: usize, momentum_threshold: Decimal) -> Momentum {
        Momentum::new(MomentumParams {
            lookback_period,
            momentum_threshold,
        })
        .unwrap()
    }

    #[test]
    fn rejects_zero_lookback() {
        assert!(Momentum::new(MomentumParams {
            lookback_period: 0,
            momentum_threshold: dec!(0.02),
        })
        .is_err());
    }

    #[test]
    fn holds_during_warm_up() {
        let strategy = strategy(4, dec!(0.02));
        let signal = strategy.generate_signal(&bars(&["100", "101", "102"]));
        assert_eq!(signal.direction, SignalDirection::Hold);
        assert_eq!(signal.confidence, Decimal::ZERO);
    }

    #[test]
    fn buys_above_the_threshold_with_scaled_confidence() {
        // Trailing return over 4 bars: 104 / 100 - 1 = 0.04 = 2x threshold.
        let strategy = strategy(4, dec!(0.02));
        let window = bars(&["100", "101", "102", "103", "104"]);
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert_eq!(signal.confidence, Decimal::ONE);
    }

    #[test]
    fn sells_below_the_negated_threshold() {
        // Trailing return: 97 / 100 - 1 = -0.03, confidence 0.03 / 0.04.
        let strategy = strategy(4, dec!(0.02));
        let window = bars(&["100", "99", "98", "97.5", "97"]);
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Sell);
        assert_eq!(signal.confidence, dec!(0.75));
    }

    #[test]
    fn holds_inside_the_threshold_band() {
        // Trailing return of exactly the threshold does not trigger.
        let strategy = strategy(4, dec!(0.02));
        let window = bars(&["100", "100.5", "101", "101.5", "102"]);
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Hold);
    }
}
