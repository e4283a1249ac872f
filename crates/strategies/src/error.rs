use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),
}

impl From<configuration::ConfigError> for StrategyError {
    fn from(error: configuration::ConfigError) -> Self {
        StrategyError::InvalidParameters(error.to_string())
    }
}
