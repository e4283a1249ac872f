use crate::error::CoreError;
use crate::structs::PriceBar;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// An ordered, validated sequence of price bars.
///
/// Construction enforces the input contract of the simulation engine:
/// the series is non-empty and timestamps are strictly increasing.
/// Bars synthesised over data gaps are tracked per index so downstream
/// snapshots can be flagged.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
    gaps: Vec<bool>,
}

impl PriceSeries {
    /// Validates and wraps a raw bar sequence.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, CoreError> {
        if bars.is_empty() {
            return Err(CoreError::EmptySeries);
        }
        for i in 1..bars.len() {
            if bars[i].timestamp <= bars[i - 1].timestamp {
                return Err(CoreError::OutOfOrderBars(i, i - 1));
            }
        }
        let gaps = vec![false; bars.len()];
        Ok(Self { bars, gaps })
    }

    /// Returns a copy of the series with missing bars for the expected
    /// `interval` filled in by carrying the last close forward.
    ///
    /// A synthetic bar has flat OHLC at the previous close and zero
    /// volume, and is flagged so the snapshot for that bar can expose the
    /// gap downstream. Gaps never abort a run.
    pub fn gap_filled(&self, interval: Duration) -> Self {
        let mut bars = Vec::with_capacity(self.bars.len());
        let mut gaps = Vec::with_capacity(self.bars.len());

        bars.push(self.bars[0].clone());
        gaps.push(false);

        for bar in &self.bars[1..] {
            // bars is never empty here; it starts with the first bar.
            while bar.timestamp > bars[bars.len() - 1].timestamp + interval {
                let prev = &bars[bars.len() - 1];
                let expected = prev.timestamp + interval;
                tracing::warn!(
                    timestamp = %expected,
                    "price series gap detected; carrying last close forward"
                );
                let synthetic = PriceBar {
                    timestamp: expected,
                    open: prev.close,
                    high: prev.close,
                    low: prev.close,
                    close: prev.close,
                    volume: Decimal::ZERO,
                };
                bars.push(synthetic);
                gaps.push(true);
            }
            bars.push(bar.clone());
            gaps.push(false);
        }

        Self { bars, gaps }
    }

    /// Restricts the series to an inclusive date window, preserving gap
    /// flags. `None` bounds leave that side open.
    pub fn between(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, CoreError> {
        let keep = |bar: &PriceBar| {
            let date = bar.timestamp.date_naive();
            start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
        };
        let mut bars = Vec::new();
        let mut gaps = Vec::new();
        for (i, bar) in self.bars.iter().enumerate() {
            if keep(bar) {
                bars.push(bar.clone());
                gaps.push(self.gaps[i]);
            }
        }
        if bars.is_empty() {
            return Err(CoreError::EmptySeries);
        }
        Ok(Self { bars, gaps })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// True when the bar at `index` was synthesised over a data gap.
    pub fn is_gap(&self, index: usize) -> bool {
        self.gaps.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bar(hour: u32, close: Decimal) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(100),
        }
    }

    #[test]
    fn rejects_empty_and_out_of_order_input() {
        assert!(matches!(PriceSeries::new(vec![]), Err(CoreError::EmptySeries)));

        let bars = vec![bar(2, dec!(100)), bar(1, dec!(101))];
        assert!(matches!(
            PriceSeries::new(bars),
            Err(CoreError::OutOfOrderBars(1, 0))
        ));
    }

    #[test]
    fn date_window_is_inclusive_and_rejects_an_empty_result() {
        let series = PriceSeries::new(vec![
            bar(0, dec!(100)),
            bar(1, dec!(101)),
            bar(2, dec!(102)),
        ])
        .unwrap();

        let jan1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().date_naive();
        let windowed = series.between(Some(jan1), Some(jan1)).unwrap();
        assert_eq!(windowed.len(), 3);

        let feb1 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap().date_naive();
        assert!(matches!(
            series.between(Some(feb1), None),
            Err(CoreError::EmptySeries)
        ));
    }

    #[test]
    fn gap_filling_carries_last_close_and_flags_synthetic_bars() {
        let series = PriceSeries::new(vec![bar(0, dec!(100)), bar(3, dec!(110))]).unwrap();
        let filled = series.gap_filled(Duration::hours(1));

        assert_eq!(filled.len(), 4);
        assert!(!filled.is_gap(0));
        assert!(filled.is_gap(1));
        assert!(filled.is_gap(2));
        assert!(!filled.is_gap(3));
        assert_eq!(filled.bars()[1].close, dec!(100));
        assert_eq!(filled.bars()[2].volume, Decimal::ZERO);
        assert_eq!(filled.bars()[3].close, dec!(110));
    }
}
