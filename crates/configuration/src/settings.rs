use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::EnsemblePolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub strategies: Strategies,
}

impl Config {
    /// Validates every section exhaustively. Called once at simulation
    /// creation; nothing is validated lazily mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.strategies.validate()
    }
}

/// Parameters governing one simulation run. Immutable for the life of
/// the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// The symbol the simulated series belongs to (e.g., "BTC-USD").
    #[serde(default = "defaults::symbol")]
    pub symbol: String,
    /// The initial starting capital for the simulation.
    #[serde(default = "defaults::initial_capital")]
    pub initial_capital: Decimal,
    /// Fraction of total equity allocated per new fill (e.g., 0.2 for 20%).
    #[serde(default = "defaults::position_size_fraction")]
    pub position_size_fraction: Decimal,
    /// Commission charged on every fill's notional. 0.001 is 0.1%.
    #[serde(default = "defaults::commission_rate")]
    pub commission_rate: Decimal,
    /// Assumed adverse price movement between decision and fill.
    #[serde(default = "defaults::slippage_rate")]
    pub slippage_rate: Decimal,
    /// Maximum number of concurrently open positions.
    #[serde(default = "defaults::max_positions")]
    pub max_positions: usize,
    /// Allows sells to open short positions. Long-only when false.
    #[serde(default)]
    pub allow_short: bool,
    /// Scales real-time playback pacing only; never affects results.
    #[serde(default = "defaults::speed_multiplier")]
    pub speed_multiplier: Decimal,
    /// Wall-clock delay between bars in playback mode. 0 runs flat out.
    #[serde(default)]
    pub pacing_interval_ms: u64,
    /// Bar periods per year, used to annualize volatility and Sharpe.
    #[serde(default = "defaults::periods_per_year")]
    pub periods_per_year: u32,
    /// Annual risk-free rate used in the Sharpe numerator.
    #[serde(default)]
    pub risk_free_rate: Decimal,
    /// Optional inclusive date window applied to the price series.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            symbol: defaults::symbol(),
            initial_capital: defaults::initial_capital(),
            position_size_fraction: defaults::position_size_fraction(),
            commission_rate: defaults::commission_rate(),
            slippage_rate: defaults::slippage_rate(),
            max_positions: defaults::max_positions(),
            allow_short: false,
            speed_multiplier: defaults::speed_multiplier(),
            pacing_interval_ms: 0,
            periods_per_year: defaults::periods_per_year(),
            risk_free_rate: Decimal::ZERO,
            start_date: None,
            end_date: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "initial_capital must be positive".to_string(),
            ));
        }
        if self.position_size_fraction <= Decimal::ZERO || self.position_size_fraction > Decimal::ONE
        {
            return Err(ConfigError::Validation(
                "position_size_fraction must be in (0, 1]".to_string(),
            ));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(ConfigError::Validation(
                "commission_rate must be in [0, 1)".to_string(),
            ));
        }
        if self.slippage_rate < Decimal::ZERO || self.slippage_rate >= Decimal::ONE {
            return Err(ConfigError::Validation(
                "slippage_rate must be in [0, 1)".to_string(),
            ));
        }
        if self.max_positions == 0 {
            return Err(ConfigError::Validation(
                "max_positions must be at least 1".to_string(),
            ));
        }
        if self.speed_multiplier <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "speed_multiplier must be positive".to_string(),
            ));
        }
        if self.periods_per_year == 0 {
            return Err(ConfigError::Validation(
                "periods_per_year must be positive".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(ConfigError::Validation(
                    "start_date must not be after end_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The parameter sets for all available strategies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Strategies {
    #[serde(default)]
    pub ma_crossover: MaCrossoverParams,
    #[serde(default)]
    pub rsi_mean_reversion: RsiMeanReversionParams,
    #[serde(default)]
    pub momentum: MomentumParams,
    #[serde(default)]
    pub ensemble: EnsembleParams,
}

impl Strategies {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ma_crossover.validate()?;
        self.rsi_mean_reversion.validate()?;
        self.momentum.validate()?;
        self.ensemble.validate()
    }
}

/// The kind of moving average the crossover strategy computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaKind {
    Sma,
    Ema,
}

/// Parameters for the Moving Average Crossover strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaCrossoverParams {
    #[serde(default = "defaults::fast_period")]
    pub fast_period: usize,
    #[serde(default = "defaults::slow_period")]
    pub slow_period: usize,
    #[serde(default = "defaults::ma_kind")]
    pub ma_kind: MaKind,
    /// Minimum normalized gap between the averages for a cross to count.
    #[serde(default)]
    pub min_crossover_strength: Decimal,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            fast_period: defaults::fast_period(),
            slow_period: defaults::slow_period(),
            ma_kind: defaults::ma_kind(),
            min_crossover_strength: Decimal::ZERO,
        }
    }
}

impl MaCrossoverParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_period == 0 {
            return Err(ConfigError::Validation(
                "ma_crossover.fast_period must be positive".to_string(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(ConfigError::Validation(
                "ma_crossover.fast_period must be less than slow_period".to_string(),
            ));
        }
        if self.min_crossover_strength < Decimal::ZERO {
            return Err(ConfigError::Validation(
                "ma_crossover.min_crossover_strength must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the RSI Mean Reversion strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsiMeanReversionParams {
    #[serde(default = "defaults::rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "defaults::oversold_threshold")]
    pub oversold_threshold: Decimal,
    #[serde(default = "defaults::overbought_threshold")]
    pub overbought_threshold: Decimal,
}

impl Default for RsiMeanReversionParams {
    fn default() -> Self {
        Self {
            rsi_period: defaults::rsi_period(),
            oversold_threshold: defaults::oversold_threshold(),
            overbought_threshold: defaults::overbought_threshold(),
        }
    }
}

impl RsiMeanReversionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rsi_period == 0 {
            return Err(ConfigError::Validation(
                "rsi_mean_reversion.rsi_period must be positive".to_string(),
            ));
        }
        if self.oversold_threshold >= self.overbought_threshold {
            return Err(ConfigError::Validation(
                "rsi_mean_reversion.oversold_threshold must be below overbought_threshold"
                    .to_string(),
            ));
        }
        if self.oversold_threshold < Decimal::ZERO || self.overbought_threshold > dec!(100) {
            return Err(ConfigError::Validation(
                "rsi_mean_reversion thresholds must lie within [0, 100]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the trailing-return Momentum strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumParams {
    #[serde(default = "defaults::lookback_period")]
    pub lookback_period: usize,
    #[serde(default = "defaults::momentum_threshold")]
    pub momentum_threshold: Decimal,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            lookback_period: defaults::lookback_period(),
            momentum_threshold: defaults::momentum_threshold(),
        }
    }
}

impl MomentumParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_period == 0 {
            return Err(ConfigError::Validation(
                "momentum.lookback_period must be positive".to_string(),
            ));
        }
        if self.momentum_threshold <= Decimal::ZERO {
            return Err(ConfigError::Validation(
                "momentum.momentum_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters for the ensemble combiner and its sub-strategy weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleParams {
    #[serde(default = "defaults::ensemble_policy")]
    pub policy: EnsemblePolicy,
    /// Minimum fraction of voting weight the winner must hold.
    #[serde(default = "defaults::min_consensus")]
    pub min_consensus: Decimal,
    /// Minimum aggregate confidence for a non-Hold decision.
    #[serde(default = "defaults::confidence_threshold")]
    pub confidence_threshold: Decimal,
    /// Fixed weights for weighted voting. Normalized internally, so they
    /// need not sum to exactly 1.0.
    #[serde(default = "defaults::ma_weight")]
    pub ma_crossover_weight: Decimal,
    #[serde(default = "defaults::rsi_weight")]
    pub rsi_mean_reversion_weight: Decimal,
    #[serde(default = "defaults::momentum_weight")]
    pub momentum_weight: Decimal,
}

impl Default for EnsembleParams {
    fn default() -> Self {
        Self {
            policy: defaults::ensemble_policy(),
            min_consensus: defaults::min_consensus(),
            confidence_threshold: defaults::confidence_threshold(),
            ma_crossover_weight: defaults::ma_weight(),
            rsi_mean_reversion_weight: defaults::rsi_weight(),
            momentum_weight: defaults::momentum_weight(),
        }
    }
}

impl EnsembleParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_consensus < Decimal::ZERO || self.min_consensus > Decimal::ONE {
            return Err(ConfigError::Validation(
                "ensemble.min_consensus must be in [0, 1]".to_string(),
            ));
        }
        if self.confidence_threshold < Decimal::ZERO || self.confidence_threshold > Decimal::ONE {
            return Err(ConfigError::Validation(
                "ensemble.confidence_threshold must be in [0, 1]".to_string(),
            ));
        }
        let total = self.ma_crossover_weight + self.rsi_mean_reversion_weight + self.momentum_weight;
        if self.ma_crossover_weight < Decimal::ZERO
            || self.rsi_mean_reversion_weight < Decimal::ZERO
            || self.momentum_weight < Decimal::ZERO
            || total <= Decimal::ZERO
        {
            return Err(ConfigError::Validation(
                "ensemble strategy weights must be non-negative and sum above zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Documented defaults, kept in one place so the serde attributes and the
/// `Default` impls cannot drift apart. Values mirror the interactive
/// simulator's stock configuration.
mod defaults {
    use super::MaKind;
    use core_types::EnsemblePolicy;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub fn symbol() -> String {
        "BTC-USD".to_string()
    }
    pub fn initial_capital() -> Decimal {
        dec!(10000)
    }
    pub fn position_size_fraction() -> Decimal {
        dec!(0.2)
    }
    pub fn commission_rate() -> Decimal {
        dec!(0.001)
    }
    pub fn slippage_rate() -> Decimal {
        dec!(0.0005)
    }
    pub fn max_positions() -> usize {
        5
    }
    pub fn speed_multiplier() -> Decimal {
        Decimal::ONE
    }
    pub fn periods_per_year() -> u32 {
        365
    }
    pub fn fast_period() -> usize {
        10
    }
    pub fn slow_period() -> usize {
        30
    }
    pub fn ma_kind() -> MaKind {
        MaKind::Sma
    }
    pub fn rsi_period() -> usize {
        14
    }
    pub fn oversold_threshold() -> Decimal {
        dec!(30)
    }
    pub fn overbought_threshold() -> Decimal {
        dec!(70)
    }
    pub fn lookback_period() -> usize {
        20
    }
    pub fn momentum_threshold() -> Decimal {
        dec!(0.02)
    }
    pub fn ensemble_policy() -> EnsemblePolicy {
        EnsemblePolicy::WeightedVoting
    }
    pub fn min_consensus() -> Decimal {
        dec!(0.6)
    }
    pub fn confidence_threshold() -> Decimal {
        dec!(0.5)
    }
    pub fn ma_weight() -> Decimal {
        dec!(0.4)
    }
    pub fn rsi_weight() -> Decimal {
        dec!(0.3)
    }
    pub fn momentum_weight() -> Decimal {
        dec!(0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_sections_validate() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(Strategies::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_ma_periods() {
        let params = MaCrossoverParams {
            fast_period: 30,
            slow_period: 10,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_inverted_rsi_thresholds() {
        let params = RsiMeanReversionParams {
            oversold_threshold: dec!(70),
            overbought_threshold: dec!(30),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn rejects_zero_position_sizing() {
        let config = SimulationConfig {
            position_size_fraction: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
