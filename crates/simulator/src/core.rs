use crate::error::SimulationError;
use analytics::AnalyticsEngine;
use configuration::{Config, SimulationConfig};
use core_types::{
    PerformanceMetrics, PortfolioSnapshot, PriceSeries, StrategyId, Trade,
};
use executor::{FillEngine, FillOutcome, Portfolio};
use rust_decimal::Decimal;
use strategies::{create_strategy, Strategy};

/// What one processed bar produced.
#[derive(Debug, Clone)]
pub struct BarResult {
    pub snapshot: PortfolioSnapshot,
    pub trade: Option<Trade>,
    /// True when the bar was synthesised over a data gap.
    pub gap_carried: bool,
}

/// The sequential bar-by-bar pipeline of one simulation run.
///
/// `step` advances exactly one bar: signal, decision, execution, snapshot.
/// That pipeline is the atomic unit of work; the async driver suspends and
/// cancels only between calls, so pausing can never expose partial-bar
/// state. The core itself is synchronous and deterministic, which is what
/// makes pause/resume and playback speed provably irrelevant to results.
pub struct SimulationCore {
    strategy: Box<dyn Strategy>,
    strategy_id: StrategyId,
    engine: FillEngine,
    portfolio: Portfolio,
    analytics: AnalyticsEngine,
    series: PriceSeries,
    config: SimulationConfig,
    next_bar: usize,
    snapshots: Vec<PortfolioSnapshot>,
    trades: Vec<Trade>,
    skipped_signals: usize,
}

impl SimulationCore {
    /// Validates the configuration and allocates a fresh portfolio.
    ///
    /// All caller-correctable failures (bad parameters, too little data)
    /// surface here, before any state exists; a constructed core cannot
    /// fail for configuration reasons mid-run.
    pub fn new(
        strategy_id: StrategyId,
        config: &Config,
        series: &PriceSeries,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let strategy = create_strategy(strategy_id, &config.strategies)?;
        let series = series.between(
            config.simulation.start_date,
            config.simulation.end_date,
        )?;
        if series.len() < strategy.warm_up_bars() {
            return Err(SimulationError::InsufficientData {
                required: strategy.warm_up_bars(),
                available: series.len(),
            });
        }

        Ok(Self {
            strategy,
            strategy_id,
            engine: FillEngine::new(config.simulation.clone()),
            portfolio: Portfolio::new(&config.simulation),
            analytics: AnalyticsEngine::new(
                config.simulation.periods_per_year,
                config.simulation.risk_free_rate,
            ),
            series,
            config: config.simulation.clone(),
            next_bar: 0,
            snapshots: Vec::new(),
            trades: Vec::new(),
            skipped_signals: 0,
        })
    }

    pub fn total_bars(&self) -> usize {
        self.series.len()
    }

    pub fn bars_processed(&self) -> usize {
        self.next_bar
    }

    pub fn is_finished(&self) -> bool {
        self.next_bar >= self.series.len()
    }

    /// bars_processed / total_bars; reaches exactly 1 at the last bar.
    pub fn progress(&self) -> Decimal {
        Decimal::from(self.next_bar) / Decimal::from(self.series.len())
    }

    pub fn snapshots(&self) -> &[PortfolioSnapshot] {
        &self.snapshots
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Actionable decisions the execution model declined to fill.
    pub fn skipped_signals(&self) -> usize {
        self.skipped_signals
    }

    /// Metrics over the history processed so far.
    pub fn metrics(&self) -> PerformanceMetrics {
        self.analytics
            .calculate(&self.snapshots, &self.trades, self.config.initial_capital)
    }

    /// Processes the next bar end to end.
    ///
    /// An executor error here is an invariant violation: the run must
    /// freeze with its history preserved up to the failing bar.
    pub fn step(&mut self) -> Result<BarResult, SimulationError> {
        let index = self.next_bar;
        let sequence = index as u64;
        let bar = self.series.bars()[index].clone();
        let gap_carried = self.series.is_gap(index);

        let window = &self.series.bars()[..=index];
        let decision = self.strategy.decide(window);

        let mut executed = None;
        if decision.direction.is_actionable() {
            match self
                .engine
                .process(&decision, self.strategy_id, &bar, sequence, &self.portfolio)
            {
                FillOutcome::Filled(trade) => {
                    let trade = self
                        .portfolio
                        .apply_fill(trade)
                        .map_err(|source| SimulationError::FatalRun { sequence, source })?;
                    tracing::info!(
                        side = ?trade.side,
                        quantity = %trade.quantity,
                        price = %trade.price,
                        sequence,
                        "trade executed"
                    );
                    self.trades.push(trade.clone());
                    executed = Some(trade);
                }
                FillOutcome::Skipped(reason) => {
                    self.skipped_signals += 1;
                    tracing::warn!(?reason, sequence, "decision produced no fill");
                }
            }
        }

        let snapshot = self
            .portfolio
            .mark_to_market(&bar, sequence, gap_carried)
            .map_err(|source| SimulationError::FatalRun { sequence, source })?;
        self.snapshots.push(snapshot.clone());
        self.next_bar += 1;

        Ok(BarResult {
            snapshot,
            trade: executed,
            gap_carried,
        })
    }

    /// Runs the remaining bars without suspension.
    pub fn run_to_completion(&mut self) -> Result<PerformanceMetrics, SimulationError> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.metrics())
    }

    /// Discards all history and returns to the pristine post-create state.
    pub fn reset(&mut self) {
        self.portfolio = Portfolio::new(&self.config);
        self.next_bar = 0;
        self.snapshots.clear();
        self.trades.clear();
        self.skipped_signals = 0;
    }
}
