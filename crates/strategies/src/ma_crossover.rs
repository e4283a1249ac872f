use crate::error::StrategyError;
use crate::indicators::{clamp_confidence, ema, sma};
use crate::Strategy;
use configuration::{MaCrossoverParams, MaKind};
use core_types::{PriceBar, Signal, SignalDirection, StrategyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The Moving Average Crossover strategy.
///
/// A Buy signal is generated on the bar where the fast average crosses
/// above the slow average, and a Sell on the inverse cross, provided the
/// normalized gap between the averages meets `min_crossover_strength`.
pub struct MaCrossover {
    params: MaCrossoverParams,
}

impl MaCrossover {
    /// Creates a new `MaCrossover` instance with the given parameters.
    ///
    /// It performs validation to ensure the parameters are logical.
    pub fn new(params: MaCrossoverParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self { params })
    }

    fn average(&self, closes: &[Decimal], period: usize) -> Option<Decimal> {
        match self.params.ma_kind {
            MaKind::Sma => sma(closes, period),
            MaKind::Ema => ema(closes, period),
        }
    }
}

impl Strategy for MaCrossover {
    fn id(&self) -> StrategyId {
        StrategyId::MaCrossover
    }

    /// One extra bar beyond the slow period, so the previous bar's
    /// averages are available for cross detection.
    fn warm_up_bars(&self) -> usize {
        self.params.slow_period + 1
    }

    fn generate_signal(&self, window: &[PriceBar]) -> Signal {
        if window.len() < self.warm_up_bars() {
            return Signal::hold(self.id(), "insufficient history for crossover detection");
        }

        let closes: Vec<Decimal> = window.iter().map(|bar| bar.close).collect();
        let previous = &closes[..closes.len() - 1];

        // Averages at the current bar and at the previous bar. Warm-up is
        // checked above, so all four values exist.
        let (Some(fast), Some(slow), Some(prev_fast), Some(prev_slow)) = (
            self.average(&closes, self.params.fast_period),
            self.average(&closes, self.params.slow_period),
            self.average(previous, self.params.fast_period),
            self.average(previous, self.params.slow_period),
        ) else {
            return Signal::hold(self.id(), "insufficient history for crossover detection");
        };

        let is_bullish_cross = prev_fast <= prev_slow && fast > slow;
        let is_bearish_cross = prev_fast >= prev_slow && fast < slow;
        if !is_bullish_cross && !is_bearish_cross {
            return Signal::hold(self.id(), "no crossover");
        }

        // Normalized gap between the averages at the moment of the cross.
        if slow.is_zero() {
            return Signal::hold(self.id(), "degenerate slow average");
        }
        let strength = (fast - slow).abs() / slow;
        if strength < self.params.min_crossover_strength {
            tracing::debug!(%strength, "crossover below minimum strength; holding");
            return Signal::hold(self.id(), "crossover below minimum strength");
        }

        let confidence = clamp_confidence(dec!(0.5) + strength * dec!(10));
        let (direction, label) = if is_bullish_cross {
            (SignalDirection::Buy, "bullish")
        } else {
            (SignalDirection::Sell, "bearish")
        };

        Signal {
            strategy: self.id(),
            direction,
            confidence,
            reason: format!("{label} MA crossover (strength {strength:.6})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use configuration::MaCrossoverParams;

    fn bars(closes: &[i64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PriceBar {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64),
                open: Decimal::from(*close),
                high: Decimal::from(*close),
                low: Decimal::from(*close),
                close: Decimal::from(*close),
                volume: dec!(1000),
            })
            .collect()
    }

    fn strategy(fast: usize, slow: usize) -> MaCrossover {
        MaCrossover::new(MaCrossoverParams {
            fast_period: fast,
            slow_period: slow,
            min_crossover_strength: Decimal::ZERO,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_fast_period_not_below_slow_period() {
        let result = MaCrossover::new(MaCrossoverParams {
            fast_period: 30,
            slow_period: 10,
            ..Default::default()
        });
        assert!(matches!(result, Err(StrategyError::InvalidParameters(_))));
    }

    #[test]
    fn holds_with_zero_confidence_during_warm_up() {
        let strategy = strategy(2, 4);
        let signal = strategy.generate_signal(&bars(&[100, 102, 104]));
        assert_eq!(signal.direction, SignalDirection::Hold);
        assert_eq!(signal.confidence, Decimal::ZERO);
    }

    #[test]
    fn detects_a_bullish_cross() {
        // Falling then sharply rising: the fast average overtakes the slow
        // one on the final bar.
        let strategy = strategy(2, 4);
        let window = bars(&[110, 108, 106, 104, 102, 100, 101, 110]);
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert!(signal.confidence > dec!(0.5));
    }

    #[test]
    fn detects_a_bearish_cross() {
        let strategy = strategy(2, 4);
        let window = bars(&[100, 102, 104, 106, 108, 110, 109, 100]);
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Sell);
    }

    #[test]
    fn holds_when_no_cross_occurs_in_a_steady_trend() {
        let strategy = strategy(2, 4);
        // Monotonic rise: the fast average stays above the slow average.
        let window = bars(&[100, 102, 104, 103, 105, 108, 107, 110, 112, 115]);
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Hold);
    }

    #[test]
    fn strength_gate_suppresses_weak_crosses() {
        let strict = MaCrossover::new(MaCrossoverParams {
            fast_period: 2,
            slow_period: 4,
            min_crossover_strength: dec!(0.5),
            ..Default::default()
        })
        .unwrap();
        let window = bars(&[110, 108, 106, 104, 102, 100, 101, 110]);
        let signal = strict.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Hold);
    }
}
