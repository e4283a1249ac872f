//! # Meridian Events
//!
//! This crate defines the event structures the simulation driver publishes
//! to subscribers (a hosting API layer, a CLI progress display, tests).
//!
//! As a Layer 0 crate, it depends only on `core-types` and provides the
//! definitive language for incremental run updates: one event per status
//! change, per processed bar, per executed trade, plus a terminal
//! completion or failure event.

// Declare the modules that make up this crate.
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use messages::{Progress, SimulationEvent};
