use crate::core::{BarResult, SimulationCore};
use crate::error::SimulationError;
use analytics::AnalyticsEngine;
use chrono::{DateTime, Utc};
use configuration::{Config, SimulationConfig};
use core_types::{
    PerformanceMetrics, PortfolioSnapshot, PriceSeries, SimulationStatus, StrategyId, Trade,
};
use events::{Progress, SimulationEvent};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::time::{sleep, Duration};

/// Control commands sent from the handle to the driver task. The watch
/// channel keeps only the latest command; the driver reacts between bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Hold,
    Run,
    Pause,
    Stop,
    Reset,
}

/// State observable by external readers at any time, including mid-run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    pub status: SimulationStatus,
    pub progress: Progress,
    pub current_timestamp: Option<DateTime<Utc>>,
    pub latest_snapshot: Option<PortfolioSnapshot>,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
    pub error: Option<String>,
}

/// History and status shared between the driver task and its readers.
///
/// The snapshot and trade vectors are append-only logs: the driver pushes
/// a fully-constructed record under the write lock, so a concurrent
/// reader sees a bar either not at all or completely, never partially.
#[derive(Debug)]
struct SharedState {
    status: RwLock<SimulationStatus>,
    snapshots: RwLock<Vec<PortfolioSnapshot>>,
    trades: RwLock<Vec<Trade>>,
    error: RwLock<Option<String>>,
}

impl SharedState {
    fn new() -> Self {
        Self {
            status: RwLock::new(SimulationStatus::Idle),
            snapshots: RwLock::new(Vec::new()),
            trades: RwLock::new(Vec::new()),
            error: RwLock::new(None),
        }
    }
}

/// The owning handle for one simulation.
///
/// Each handle drives an independent run with its own portfolio and
/// history; concurrent simulations share no mutable state. Dropping the
/// handle tears the driver task down at the next bar boundary.
pub struct SimulationHandle {
    shared: Arc<SharedState>,
    control: watch::Sender<Command>,
    events: broadcast::Sender<SimulationEvent>,
    analytics: AnalyticsEngine,
    initial_capital: Decimal,
    total_bars: u64,
}

impl SimulationHandle {
    /// Validates the configuration, allocates a fresh portfolio, and
    /// spawns the driver task. The simulation stays `Idle` until started.
    ///
    /// Must be called within a tokio runtime.
    pub fn create(
        strategy_id: StrategyId,
        config: &Config,
        series: &PriceSeries,
    ) -> Result<Self, SimulationError> {
        let core = SimulationCore::new(strategy_id, config, series)?;
        let shared = Arc::new(SharedState::new());
        let (control, control_rx) = watch::channel(Command::Hold);
        let (events, _) = broadcast::channel(1024);

        let total_bars = core.total_bars() as u64;
        let driver = Driver {
            core,
            shared: Arc::clone(&shared),
            control: control_rx,
            events: events.clone(),
            pacing: pacing_delay(&config.simulation),
        };
        tokio::spawn(driver.run());

        Ok(Self {
            shared,
            control,
            events,
            analytics: AnalyticsEngine::new(
                config.simulation.periods_per_year,
                config.simulation.risk_free_rate,
            ),
            initial_capital: config.simulation.initial_capital,
            total_bars,
        })
    }

    /// Idle or Paused -> Running; begins or resumes bar iteration.
    pub async fn start(&self) -> Result<(), SimulationError> {
        let status = *self.shared.status.read().await;
        if !matches!(status, SimulationStatus::Idle | SimulationStatus::Paused) {
            return Err(SimulationError::InvalidTransition {
                action: "start",
                status,
            });
        }
        self.control.send_replace(Command::Run);
        Ok(())
    }

    /// Running -> Paused; suspends after the in-flight bar completes.
    pub async fn pause(&self) -> Result<(), SimulationError> {
        let status = *self.shared.status.read().await;
        if status != SimulationStatus::Running {
            return Err(SimulationError::InvalidTransition {
                action: "pause",
                status,
            });
        }
        self.control.send_replace(Command::Pause);
        Ok(())
    }

    /// Running or Paused -> Completed; finalizes metrics as of the last
    /// processed bar.
    pub async fn stop(&self) -> Result<(), SimulationError> {
        let status = *self.shared.status.read().await;
        if !matches!(
            status,
            SimulationStatus::Running | SimulationStatus::Paused
        ) {
            return Err(SimulationError::InvalidTransition {
                action: "stop",
                status,
            });
        }
        self.control.send_replace(Command::Stop);
        Ok(())
    }

    /// Any state -> Idle; discards all snapshot and trade history.
    pub async fn reset(&self) -> Result<(), SimulationError> {
        self.control.send_replace(Command::Reset);
        Ok(())
    }

    pub async fn status(&self) -> SimulationStatus {
        *self.shared.status.read().await
    }

    /// A consistent view of the run, safe to call at any time. Metrics
    /// are recomputed over the history visible so far.
    pub async fn state(&self) -> SimulationState {
        let status = *self.shared.status.read().await;
        let snapshots = self.shared.snapshots.read().await.clone();
        let trades = self.shared.trades.read().await.clone();
        let error = self.shared.error.read().await.clone();

        let bars_processed = snapshots.len() as u64;
        let fraction = if self.total_bars == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(bars_processed) / Decimal::from(self.total_bars)
        };
        let metrics = self
            .analytics
            .calculate(&snapshots, &trades, self.initial_capital);

        SimulationState {
            status,
            progress: Progress {
                bars_processed,
                total_bars: self.total_bars,
                fraction,
            },
            current_timestamp: snapshots.last().map(|snapshot| snapshot.timestamp),
            latest_snapshot: snapshots.last().cloned(),
            trades,
            metrics,
            error,
        }
    }

    /// One event per status change, processed bar, trade, and completion.
    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.events.subscribe()
    }
}

/// Wall-clock delay between bars: the configured pacing interval divided
/// by the speed multiplier. Zero runs flat out. Pacing only ever delays;
/// it has no path into the financial pipeline.
fn pacing_delay(config: &SimulationConfig) -> Duration {
    if config.pacing_interval_ms == 0 {
        return Duration::ZERO;
    }
    let millis = (Decimal::from(config.pacing_interval_ms) / config.speed_multiplier)
        .to_u64()
        .unwrap_or(0);
    Duration::from_millis(millis)
}

/// The driver task: owns the core and reacts to control commands
/// strictly between bars.
struct Driver {
    core: SimulationCore,
    shared: Arc<SharedState>,
    control: watch::Receiver<Command>,
    events: broadcast::Sender<SimulationEvent>,
    pacing: Duration,
}

impl Driver {
    async fn run(mut self) {
        loop {
            if self.control.changed().await.is_err() {
                // Handle dropped; tear down.
                return;
            }
            let command = *self.control.borrow_and_update();
            match command {
                Command::Run => {
                    let status = *self.shared.status.read().await;
                    if matches!(status, SimulationStatus::Idle | SimulationStatus::Paused) {
                        self.run_bars().await;
                    }
                }
                Command::Stop => {
                    // Stop while paused finalizes immediately.
                    let status = *self.shared.status.read().await;
                    if status == SimulationStatus::Paused {
                        self.finalize().await;
                    }
                }
                Command::Reset => self.reset().await,
                Command::Pause | Command::Hold => {}
            }
        }
    }

    async fn run_bars(&mut self) {
        self.set_status(SimulationStatus::Running, None).await;

        while !self.core.is_finished() {
            match self.control.has_changed() {
                Ok(false) => {}
                Ok(true) => {
                    let command = *self.control.borrow_and_update();
                    match command {
                        Command::Pause => {
                            self.set_status(SimulationStatus::Paused, None).await;
                            return;
                        }
                        Command::Stop => break,
                        Command::Reset => {
                            self.reset().await;
                            return;
                        }
                        Command::Run | Command::Hold => {}
                    }
                }
                Err(_) => return,
            }

            match self.core.step() {
                Ok(result) => self.publish(result).await,
                Err(error) => {
                    self.fail(error).await;
                    return;
                }
            }

            if !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }
        }

        self.finalize().await;
    }

    async fn publish(&self, result: BarResult) {
        self.shared
            .snapshots
            .write()
            .await
            .push(result.snapshot.clone());
        if let Some(trade) = result.trade {
            self.shared.trades.write().await.push(trade.clone());
            let _ = self.events.send(SimulationEvent::TradeExecuted(trade));
        }
        if result.gap_carried {
            let _ = self.events.send(SimulationEvent::GapDetected {
                sequence: result.snapshot.sequence,
                timestamp: result.snapshot.timestamp,
            });
        }
        let _ = self.events.send(SimulationEvent::BarProcessed {
            snapshot: result.snapshot,
            progress: Progress {
                bars_processed: self.core.bars_processed() as u64,
                total_bars: self.core.total_bars() as u64,
                fraction: self.core.progress(),
            },
        });
    }

    async fn finalize(&mut self) {
        tracing::info!(
            bars = self.core.bars_processed(),
            trades = self.core.trades().len(),
            skipped = self.core.skipped_signals(),
            "simulation finished"
        );
        self.set_status(SimulationStatus::Completed, None).await;
        let _ = self.events.send(SimulationEvent::Completed {
            metrics: self.core.metrics(),
        });
    }

    async fn fail(&mut self, error: SimulationError) {
        let message = error.to_string();
        tracing::error!(%message, "simulation frozen by fatal run error");
        *self.shared.error.write().await = Some(message.clone());
        self.set_status(SimulationStatus::Error, Some(message.clone()))
            .await;
        let _ = self.events.send(SimulationEvent::RunFailed { message });
    }

    async fn reset(&mut self) {
        self.core.reset();
        self.shared.snapshots.write().await.clear();
        self.shared.trades.write().await.clear();
        *self.shared.error.write().await = None;
        self.set_status(SimulationStatus::Idle, None).await;
    }

    async fn set_status(&self, status: SimulationStatus, message: Option<String>) {
        *self.shared.status.write().await = status;
        tracing::info!(?status, "simulation status changed");
        let _ = self
            .events
            .send(SimulationEvent::StatusChanged { status, message });
    }
}
