use core_types::SimulationStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] configuration::ConfigError),

    #[error("Invalid strategy parameters: {0}")]
    Strategy(#[from] strategies::StrategyError),

    #[error("Price series error: {0}")]
    Series(#[from] core_types::CoreError),

    #[error("Price series has {available} bars but the strategy needs {required} to warm up")]
    InsufficientData { required: usize, available: usize },

    #[error("Cannot {action} while the simulation is {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: SimulationStatus,
    },

    #[error("Fatal run error at bar {sequence}: {source}")]
    FatalRun {
        sequence: u64,
        #[source]
        source: executor::ExecutorError,
    },
}
