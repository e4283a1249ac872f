use chrono::{DateTime, Utc};
use core_types::{PerformanceMetrics, PortfolioSnapshot, SimulationStatus, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Progress through a run, attached to bar-level events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub bars_processed: u64,
    pub total_bars: u64,
    /// bars_processed / total_bars, in [0, 1], non-decreasing per run.
    pub fraction: Decimal,
}

/// The top-level simulation event enum.
///
/// Every state change a subscriber can observe is one of these variants.
///
/// The `#[serde(tag = "type", content = "payload")]` attribute serializes
/// the enum into a clean JSON object that a streaming consumer can switch
/// on. A `StatusChanged` variant looks like:
/// `{
///   "type": "StatusChanged",
///   "payload": {
///     "status": "running",
///     "message": null
///   }
/// }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SimulationEvent {
    /// The driver's state machine moved to a new status.
    StatusChanged {
        status: SimulationStatus,
        message: Option<String>,
    },
    /// One bar's full pipeline finished; the snapshot is final for that bar.
    BarProcessed {
        snapshot: PortfolioSnapshot,
        progress: Progress,
    },
    /// A fill was executed during the bar being processed.
    TradeExecuted(Trade),
    /// A missing bar was carried forward from the last known price.
    GapDetected {
        sequence: u64,
        timestamp: DateTime<Utc>,
    },
    /// The run finished and final metrics are available.
    Completed { metrics: PerformanceMetrics },
    /// The run hit an unrecoverable invariant violation and froze.
    RunFailed { message: String },
}
