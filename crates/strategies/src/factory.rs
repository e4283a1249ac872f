use crate::ensemble::EnsembleStrategy;
use crate::error::StrategyError;
use crate::ma_crossover::MaCrossover;
use crate::momentum::Momentum;
use crate::rsi_mean_reversion::RsiMeanReversion;
use crate::Strategy;
use configuration::Strategies;
use core_types::StrategyId;

/// Constructs a boxed strategy from its configured parameters.
///
/// The single place where a `StrategyId` is turned into a concrete
/// implementation; everything downstream works through `dyn Strategy`.
/// Parameter validation happens here, before a simulation is created.
pub fn create_strategy(
    id: StrategyId,
    params: &Strategies,
) -> Result<Box<dyn Strategy>, StrategyError> {
    match id {
        StrategyId::MaCrossover => Ok(Box::new(MaCrossover::new(params.ma_crossover.clone())?)),
        StrategyId::RsiMeanReversion => Ok(Box::new(RsiMeanReversion::new(
            params.rsi_mean_reversion.clone(),
        )?)),
        StrategyId::Momentum => Ok(Box::new(Momentum::new(params.momentum.clone())?)),
        StrategyId::Ensemble => {
            let members: Vec<Box<dyn Strategy>> = vec![
                Box::new(MaCrossover::new(params.ma_crossover.clone())?),
                Box::new(RsiMeanReversion::new(params.rsi_mean_reversion.clone())?),
                Box::new(Momentum::new(params.momentum.clone())?),
            ];
            Ok(Box::new(EnsembleStrategy::new(
                members,
                params.ensemble.clone(),
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_strategy_from_defaults() {
        let params = Strategies::default();
        for id in [
            StrategyId::MaCrossover,
            StrategyId::RsiMeanReversion,
            StrategyId::Momentum,
            StrategyId::Ensemble,
        ] {
            let strategy = create_strategy(id, &params).unwrap();
            assert_eq!(strategy.id(), id);
            assert!(strategy.warm_up_bars() > 0);
        }
    }

    #[test]
    fn ensemble_warm_up_is_the_longest_member_warm_up() {
        let params = Strategies::default();
        let ensemble = create_strategy(StrategyId::Ensemble, &params).unwrap();
        // Slow MA period 30 dominates RSI 14 and momentum lookback 20.
        assert_eq!(ensemble.warm_up_bars(), 31);
    }

    #[test]
    fn invalid_parameters_fail_at_construction() {
        let mut params = Strategies::default();
        params.ma_crossover.fast_period = 50;
        assert!(create_strategy(StrategyId::MaCrossover, &params).is_err());
        assert!(create_strategy(StrategyId::Ensemble, &params).is_err());
    }
}
