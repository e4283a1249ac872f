//! # Meridian Simulator
//!
//! This crate is the orchestrator of the engine: it ties the price
//! series, strategies, execution model, ledger, and analytics into the
//! bar-by-bar replay loop and exposes run/pause/stop/reset semantics to a
//! hosting layer.
//!
//! ## Architectural Principles
//!
//! - **Two layers:** `SimulationCore` is the synchronous, deterministic
//!   pipeline (one `step` per bar, atomic). `SimulationHandle` wraps it in
//!   a tokio task and adds the state machine, pacing, and the event
//!   broadcast. Anything that affects financial results lives in the core;
//!   anything about wall-clock time lives in the driver.
//! - **Isolation:** every handle owns its portfolio and history
//!   exclusively, so concurrent simulations cannot interfere.
//!
//! ## Public API
//!
//! - `SimulationHandle`: create / start / pause / stop / reset / state /
//!   subscribe.
//! - `SimulationCore`: the embeddable synchronous engine.
//! - `SimulationError`: creation-time and fatal-run failures.

// Declare the modules that constitute this crate.
pub mod core;
pub mod driver;
pub mod error;

// Re-export the key components to provide a clean, public-facing API.
pub use crate::core::{BarResult, SimulationCore};
pub use driver::{SimulationHandle, SimulationState};
pub use error::SimulationError;
