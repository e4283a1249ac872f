use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

pub use error::ConfigError;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, EnsembleParams, MaCrossoverParams, MaKind, MomentumParams, RsiMeanReversionParams,
    SimulationConfig, Strategies,
};

/// Loads the application configuration from a TOML file.
///
/// This is the primary entry point for this crate: it reads the file,
/// deserializes it into the strongly-typed `Config`, and validates every
/// section before returning. Callers therefore never see a half-valid
/// configuration.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
