use serde::{Deserialize, Serialize};

/// The directional recommendation a strategy emits for the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
}

impl SignalDirection {
    /// Returns true for Buy and Sell, false for Hold.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, SignalDirection::Hold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Identifies which strategy implementation produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    MaCrossover,
    RsiMeanReversion,
    Momentum,
    Ensemble,
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyId::MaCrossover => "ma_crossover",
            StrategyId::RsiMeanReversion => "rsi_mean_reversion",
            StrategyId::Momentum => "momentum",
            StrategyId::Ensemble => "ensemble",
        };
        f.write_str(name)
    }
}

/// The policy an ensemble uses to merge its sub-strategies' signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsemblePolicy {
    MajorityVoting,
    WeightedVoting,
    ConfidenceWeighted,
}

/// The lifecycle state of a single simulation run.
///
/// Valid transitions: Idle -> Running, Running <-> Paused,
/// Running | Paused -> Completed, Running | Paused -> Error,
/// and any state -> Idle on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Error,
}
