use crate::error::StrategyError;
use crate::indicators::{clamp_confidence, wilder_rsi};
use crate::Strategy;
use configuration::RsiMeanReversionParams;
use core_types::{PriceBar, Signal, SignalDirection, StrategyId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// The RSI Mean Reversion strategy.
///
/// Buys when the Wilder-smoothed RSI dips to the oversold threshold and
/// sells when it reaches the overbought threshold. Confidence scales with
/// how far past the threshold the RSI has travelled.
pub struct RsiMeanReversion {
    params: RsiMeanReversionParams,
}

impl RsiMeanReversion {
    pub fn new(params: RsiMeanReversionParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl Strategy for RsiMeanReversion {
    fn id(&self) -> StrategyId {
        StrategyId::RsiMeanReversion
    }

    /// Wilder's RSI needs one delta per period bar.
    fn warm_up_bars(&self) -> usize {
        self.params.rsi_period + 1
    }

    fn generate_signal(&self, window: &[PriceBar]) -> Signal {
        if window.len() < self.warm_up_bars() {
            return Signal::hold(self.id(), "insufficient history for RSI");
        }

        let closes: Vec<Decimal> = window.iter().map(|bar| bar.close).collect();
        let Some(rsi) = wilder_rsi(&closes, self.params.rsi_period) else {
            return Signal::hold(self.id(), "insufficient history for RSI");
        };

        if rsi <= self.params.oversold_threshold {
            let distance = self.params.oversold_threshold - rsi;
            let confidence = clamp_confidence(dec!(0.5) + distance / dec!(40));
            return Signal {
                strategy: self.id(),
                direction: SignalDirection::Buy,
                confidence,
                reason: format!("RSI oversold at {rsi:.1}"),
            };
        }

        if rsi >= self.params.overbought_threshold {
            let distance = rsi - self.params.overbought_threshold;
            let confidence = clamp_confidence(dec!(0.5) + distance / dec!(40));
            return Signal {
                strategy: self.id(),
                direction: SignalDirection::Sell,
                confidence,
                reason: format!("RSI overbought at {rsi:.1}"),
            };
        }

        Signal::hold(self.id(), "RSI inside neutral band")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

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

    #[test]
    fn rejects_inverted_thresholds() {
        let result = RsiMeanReversion::new(RsiMeanReversionParams {
            oversold_threshold: dec!(70),
            overbought_threshold: dec!(30),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn holds_during_warm_up() {
        let strategy = RsiMeanReversion::new(RsiMeanReversionParams::default()).unwrap();
        let signal = strategy.generate_signal(&bars(&[100; 10]));
        assert_eq!(signal.direction, SignalDirection::Hold);
        assert_eq!(signal.confidence, Decimal::ZERO);
    }

    #[test]
    fn never_buys_on_a_strictly_rising_series() {
        // 20 monotonically rising closes keep RSI pinned at 100: the
        // oversold condition can never trigger.
        let strategy = RsiMeanReversion::new(RsiMeanReversionParams::default()).unwrap();
        let closes: Vec<i64> = (0..20).map(|i| 100 + i * 2).collect();
        let window = bars(&closes);

        for end in strategy.warm_up_bars()..=window.len() {
            let signal = strategy.generate_signal(&window[..end]);
            assert_ne!(signal.direction, SignalDirection::Buy);
        }
        // The full window is maximally overbought.
        let signal = strategy.generate_signal(&window);
        assert_eq!(signal.direction, SignalDirection::Sell);
        assert_eq!(signal.confidence, Decimal::ONE);
    }

    #[test]
    fn buys_when_oversold() {
        let strategy = RsiMeanReversion::new(RsiMeanReversionParams::default()).unwrap();
        let closes: Vec<i64> = (0..20).map(|i| 200 - i * 3).collect();
        let signal = strategy.generate_signal(&bars(&closes));
        assert_eq!(signal.direction, SignalDirection::Buy);
        assert_eq!(signal.confidence, Decimal::ONE);
    }
}
