//! # Meridian Strategy Library
//!
//! This crate contains the signal-generation logic for the Meridian
//! simulation engine. It defines a universal `Strategy` trait and provides
//! the concrete implementations plus the ensemble combiner.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   portfolios, execution, or the driver loop. It depends only on
//!   `core-types` and `configuration`.
//! - **Window purity:** A strategy is a pure function of the price window it
//!   is handed plus its own immutable parameters. Nothing is carried
//!   between calls, which is what makes pause/resume and replay exact.
//! - **Strategy-agnostic driver:** The simulator operates on `Box<dyn
//!   Strategy>` and never learns which concrete algorithm is running; the
//!   ensemble is itself a `Strategy` wrapping its sub-strategies.
//!
//! ## Public API
//!
//! - `Strategy`: the core trait all strategies implement.
//! - `create_strategy`: the factory constructing an instance from config.
//! - The concrete strategy structs and the `EnsembleCombiner`.

// Declare all the modules that constitute this crate.
pub mod ensemble;
pub mod error;
pub mod factory;
pub mod indicators;
pub mod ma_crossover;
pub mod momentum;
pub mod rsi_mean_reversion;

// Re-export the key components to create a clean, public-facing API.
pub use ensemble::{EnsembleCombiner, EnsembleStrategy};
pub use error::StrategyError;
pub use factory::create_strategy;
pub use ma_crossover::MaCrossover;
pub use momentum::Momentum;
pub use rsi_mean_reversion::RsiMeanReversion;

// Re-export StrategyId from core_types
pub use core_types::StrategyId;

use core_types::{EnsembleDecision, PriceBar, Signal};
use rust_decimal::Decimal;

/// The core trait that all trading strategies must implement.
///
/// A strategy maps an ordered window of bars (oldest first, ending at the
/// current bar) to a directional signal with a confidence score. The
/// contract is strict: given the same window and parameters the output is
/// identical, and a window shorter than `warm_up_bars` yields a Hold
/// signal with confidence 0 rather than an error.
///
/// The `Send + Sync` bounds allow concurrently running simulations to own
/// strategies without further coordination.
pub trait Strategy: Send + Sync {
    /// Identifies this strategy in signals and trade records.
    fn id(&self) -> StrategyId;

    /// The minimum number of bars required before the strategy may emit a
    /// non-Hold signal.
    fn warm_up_bars(&self) -> usize;

    /// Evaluates the window ending at the current bar.
    fn generate_signal(&self, window: &[PriceBar]) -> Signal;

    /// Produces the decision the execution model consumes.
    ///
    /// A standalone strategy is its own one-member committee: full
    /// consensus, aggregate confidence equal to its signal confidence. The
    /// ensemble overrides this with real voting.
    fn decide(&self, window: &[PriceBar]) -> EnsembleDecision {
        let signal = self.generate_signal(window);
        if signal.direction == core_types::SignalDirection::Hold {
            return EnsembleDecision::hold(vec![signal]);
        }
        EnsembleDecision {
            direction: signal.direction,
            aggregate_confidence: signal.confidence,
            consensus_ratio: Decimal::ONE,
            contributing: vec![signal],
        }
    }
}
