//! Window-based indicator math in `Decimal`.
//!
//! Every function recomputes from the supplied slice, which keeps the
//! strategies pure functions of their window. All return `None` when the
//! window is too short instead of guessing.

use rust_decimal::Decimal;

/// Simple moving average over the last `period` closes.
pub fn sma(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let sum: Decimal = closes[closes.len() - period..].iter().sum();
    Some(sum / Decimal::from(period))
}

/// Exponential moving average seeded with the SMA of the first `period`
/// closes, then smoothed with alpha = 2 / (period + 1) over the rest.
pub fn ema(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let seed: Decimal = closes[..period].iter().sum::<Decimal>() / Decimal::from(period);
    let alpha = Decimal::TWO / Decimal::from(period + 1);
    let mut value = seed;
    for close in &closes[period..] {
        value = (*close - value) * alpha + value;
    }
    Some(value)
}

/// Relative Strength Index with Wilder's smoothing.
///
/// Needs `period + 1` closes: the first `period` deltas seed the average
/// gain/loss, and any remaining deltas are smoothed with weight
/// (period - 1)/period. Returns 100 when the window has no losses.
pub fn wilder_rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let hundred = Decimal::ONE_HUNDRED;
    let p = Decimal::from(period);

    let mut avg_gain = Decimal::ZERO;
    let mut avg_loss = Decimal::ZERO;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > Decimal::ZERO {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= p;
    avg_loss /= p;

    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);
        avg_gain = (avg_gain * (p - Decimal::ONE) + gain) / p;
        avg_loss = (avg_loss * (p - Decimal::ONE) + loss) / p;
    }

    if avg_loss.is_zero() {
        return Some(hundred);
    }
    let rs = avg_gain / avg_loss;
    Some(hundred - hundred / (Decimal::ONE + rs))
}

/// Trailing return over `lookback` bars: close[t] / close[t - lookback] - 1.
pub fn trailing_return(closes: &[Decimal], lookback: usize) -> Option<Decimal> {
    if lookback == 0 || closes.len() < lookback + 1 {
        return None;
    }
    let past = closes[closes.len() - 1 - lookback];
    if past.is_zero() {
        return None;
    }
    Some(closes[closes.len() - 1] / past - Decimal::ONE)
}

/// Clamps a confidence value into [0, 1].
pub fn clamp_confidence(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_averages_the_tail_of_the_window() {
        let closes = vec![dec!(100), dec!(102), dec!(104), dec!(103)];
        assert_eq!(sma(&closes, 2), Some(dec!(103.5)));
        assert_eq!(sma(&closes, 4), Some(dec!(102.25)));
        assert_eq!(sma(&closes, 5), None);
        assert_eq!(sma(&closes, 0), None);
    }

    #[test]
    fn ema_reduces_to_sma_when_window_equals_period() {
        let closes = vec![dec!(10), dec!(20), dec!(30)];
        assert_eq!(ema(&closes, 3), Some(dec!(20)));
    }

    #[test]
    fn rsi_is_one_hundred_on_a_strict_rise_and_zero_on_a_strict_fall() {
        let rising: Vec<Decimal> = (0..16).map(|i| Decimal::from(100 + i)).collect();
        assert_eq!(wilder_rsi(&rising, 14), Some(Decimal::ONE_HUNDRED));

        let falling: Vec<Decimal> = (0..16).map(|i| Decimal::from(200 - i)).collect();
        assert_eq!(wilder_rsi(&falling, 14), Some(Decimal::ZERO));
    }

    #[test]
    fn rsi_requires_period_plus_one_closes() {
        let closes: Vec<Decimal> = (0..14).map(Decimal::from).collect();
        assert_eq!(wilder_rsi(&closes, 14), None);
    }

    #[test]
    fn trailing_return_compares_against_the_lookback_bar() {
        let closes = vec![dec!(100), dec!(105), dec!(110)];
        assert_eq!(trailing_return(&closes, 2), Some(dec!(0.1)));
        assert_eq!(trailing_return(&closes, 3), None);
    }
}
