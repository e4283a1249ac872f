pub mod enums;
pub mod error;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{EnsemblePolicy, SignalDirection, SimulationStatus, StrategyId, TradeSide};
pub use error::CoreError;
pub use series::PriceSeries;
pub use structs::{
    EnsembleDecision, PerformanceMetrics, PortfolioSnapshot, Position, PriceBar, Signal, Trade,
};
