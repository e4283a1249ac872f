//! # Meridian Analytics Engine
//!
//! This crate derives summary performance statistics from a completed (or
//! in-progress) simulation run. It acts as the "unbiased judge" of the
//! system.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems and depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `AnalyticsEngine` takes the raw
//!   snapshot and trade history as input and produces `PerformanceMetrics`
//!   as output. Nothing is cached between calls, so mid-run and final
//!   reports use the identical code path.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the calculator.
//! - `PerformanceMetrics` (re-exported from `core-types`): its output.

// Declare the modules that constitute this crate.
pub mod engine;

// Re-export the key components to create a clean, public-facing API.
pub use core_types::PerformanceMetrics;
pub use engine::AnalyticsEngine;
