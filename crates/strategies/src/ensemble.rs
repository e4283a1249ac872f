use crate::error::StrategyError;
use crate::Strategy;
use configuration::EnsembleParams;
use core_types::{
    EnsembleDecision, EnsemblePolicy, PriceBar, Signal, SignalDirection, StrategyId,
};
use rust_decimal::Decimal;

/// Merges signals for one bar into a single decision under a voting policy.
///
/// Strategies that vote Hold still count toward the denominator, so a lone
/// actionable voter must clear `min_consensus` against the whole committee.
/// The consensus and confidence gates are independent: a decision is
/// non-Hold only when both pass.
pub struct EnsembleCombiner {
    params: EnsembleParams,
}

impl EnsembleCombiner {
    pub fn new(params: EnsembleParams) -> Result<Self, StrategyError> {
        params.validate()?;
        Ok(Self { params })
    }

    fn vote_weight(&self, signal: &Signal) -> Decimal {
        match self.params.policy {
            EnsemblePolicy::MajorityVoting => Decimal::ONE,
            EnsemblePolicy::WeightedVoting => match signal.strategy {
                StrategyId::MaCrossover => self.params.ma_crossover_weight,
                StrategyId::RsiMeanReversion => self.params.rsi_mean_reversion_weight,
                StrategyId::Momentum => self.params.momentum_weight,
                // Nested ensembles are not configurable; unit weight.
                StrategyId::Ensemble => Decimal::ONE,
            },
            EnsemblePolicy::ConfidenceWeighted => signal.confidence,
        }
    }

    /// Tallies the committee. Ties between Buy and Sell resolve to Hold.
    pub fn combine(&self, signals: &[Signal]) -> EnsembleDecision {
        let mut total_weight = Decimal::ZERO;
        let mut buy_weight = Decimal::ZERO;
        let mut sell_weight = Decimal::ZERO;

        for signal in signals {
            let weight = self.vote_weight(signal);
            total_weight += weight;
            match signal.direction {
                SignalDirection::Buy => buy_weight += weight,
                SignalDirection::Sell => sell_weight += weight,
                SignalDirection::Hold => {}
            }
        }

        if total_weight.is_zero() {
            return EnsembleDecision::hold(signals.to_vec());
        }

        let (direction, winning_weight) = match buy_weight.cmp(&sell_weight) {
            std::cmp::Ordering::Greater => (SignalDirection::Buy, buy_weight),
            std::cmp::Ordering::Less => (SignalDirection::Sell, sell_weight),
            std::cmp::Ordering::Equal => return EnsembleDecision::hold(signals.to_vec()),
        };
        if winning_weight.is_zero() {
            return EnsembleDecision::hold(signals.to_vec());
        }

        let consensus_ratio = winning_weight / total_weight;
        if consensus_ratio < self.params.min_consensus {
            tracing::debug!(%consensus_ratio, ?direction, "consensus gate failed; holding");
            return EnsembleDecision::hold(signals.to_vec());
        }

        // Unweighted mean confidence of the voters that backed the winner.
        let winners: Vec<&Signal> = signals
            .iter()
            .filter(|signal| signal.direction == direction)
            .collect();
        let aggregate_confidence = winners
            .iter()
            .map(|signal| signal.confidence)
            .sum::<Decimal>()
            / Decimal::from(winners.len());

        if aggregate_confidence < self.params.confidence_threshold {
            tracing::debug!(%aggregate_confidence, ?direction, "confidence gate failed; holding");
            return EnsembleDecision::hold(signals.to_vec());
        }

        EnsembleDecision {
            direction,
            aggregate_confidence,
            consensus_ratio,
            contributing: signals.to_vec(),
        }
    }
}

/// An ensemble of sub-strategies, itself presented as one `Strategy`.
///
/// The driver never learns it is running a committee; it sees one strategy
/// whose warm-up is the longest warm-up among its members.
pub struct EnsembleStrategy {
    strategies: Vec<Box<dyn Strategy>>,
    combiner: EnsembleCombiner,
}

impl EnsembleStrategy {
    pub fn new(
        strategies: Vec<Box<dyn Strategy>>,
        params: EnsembleParams,
    ) -> Result<Self, StrategyError> {
        if strategies.is_empty() {
            return Err(StrategyError::InvalidParameters(
                "ensemble requires at least one sub-strategy".to_string(),
            ));
        }
        Ok(Self {
            strategies,
            combiner: EnsembleCombiner::new(params)?,
        })
    }
}

impl Strategy for EnsembleStrategy {
    fn id(&self) -> StrategyId {
        StrategyId::Ensemble
    }

    fn warm_up_bars(&self) -> usize {
        self.strategies
            .iter()
            .map(|strategy| strategy.warm_up_bars())
            .max()
            .unwrap_or(0)
    }

    fn generate_signal(&self, window: &[PriceBar]) -> Signal {
        let decision = self.decide(window);
        if decision.direction == SignalDirection::Hold {
            return Signal::hold(self.id(), "committee holds");
        }
        Signal {
            strategy: self.id(),
            direction: decision.direction,
            confidence: decision.aggregate_confidence,
            reason: format!(
                "committee {:?} with consensus {:.2}",
                decision.direction, decision.consensus_ratio
            ),
        }
    }

    fn decide(&self, window: &[PriceBar]) -> EnsembleDecision {
        let signals: Vec<Signal> = self
            .strategies
            .iter()
            .map(|strategy| strategy.generate_signal(window))
            .collect();
        self.combiner.combine(&signals)
    }
}
