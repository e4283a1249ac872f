//! # Meridian Executor Crate
//!
//! This crate provides the execution and cost model plus the portfolio
//! ledger for the simulation engine.
//!
//! ## Architectural Principles
//!
//! - **State vs. Logic Decoupling:** The `FillEngine` is a pure calculator
//!   that prices a decision into a fill (slippage, commission, sizing)
//!   without mutating state. The `Portfolio` struct is the state machine
//!   that applies fills to cash and positions and emits the per-bar
//!   snapshot. This separation is key for testability and clarity.
//! - **Append-only history:** A `Trade` is immutable once applied;
//!   corrections happen by appending an offsetting fill, never by editing
//!   history. Snapshots are emitted one per bar, trade or no trade.
//!
//! ## Public API
//!
//! - `FillEngine`: the cost model turning decisions into fills.
//! - `FillOutcome` / `SkipReason`: what became of one decision.
//! - `Portfolio`: the in-memory ledger for a simulated account.
//! - `ExecutorError`: the specific error types returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod fill;
pub mod portfolio;

// Re-export the key components to provide a clean, public-facing API.
pub use error::ExecutorError;
pub use fill::{FillEngine, FillOutcome, SkipReason};
pub use portfolio::Portfolio;
