//! Owns the sweep timer and guarantees at most one sweep in flight.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::config::MonitorConfig;
use super::error::MonitorError;
use super::registry::Registry;
use super::sweep::{SweepReport, SweepRunner};

const COMMAND_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerCommand {
    RunNow,
    Reconfigure { enabled: bool },
}

/// Snapshot published after every scheduler transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerState {
    pub sweep_in_flight: bool,
    pub next_sweep_at: Option<DateTime<Utc>>,
    pub completed_sweeps: u64,
    pub last_report: Option<SweepReport>,
}

#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<SchedulerCommand>,
    state: watch::Receiver<SchedulerState>,
}

impl SchedulerHandle {
    /// Requests a sweep. Ignored by the scheduler if one is already running.
    pub fn run_now(&self) -> Result<(), MonitorError> {
        match self.commands.try_send(SchedulerCommand::RunNow) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Scheduler queue full, sweep request already pending.");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(MonitorError::SchedulerStopped),
        }
    }

    pub async fn reconfigure(&self, enabled: bool) -> Result<(), MonitorError> {
        self.commands
            .send(SchedulerCommand::Reconfigure { enabled })
            .await
            .map_err(|_| MonitorError::SchedulerStopped)
    }

    pub fn state(&self) -> SchedulerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }
}

pub struct Scheduler {
    registry: Arc<dyn Registry>,
    sweeps: Arc<SweepRunner>,
    commands: mpsc::Receiver<SchedulerCommand>,
    state: watch::Sender<SchedulerState>,
    shutdown_rx: watch::Receiver<()>,
    retry_delay: Duration,
}

impl Scheduler {
    pub fn new(
        registry: Arc<dyn Registry>,
        sweeps: Arc<SweepRunner>,
        retry_delay: Duration,
        shutdown_rx: watch::Receiver<()>,
    ) -> (Self, SchedulerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(SchedulerState::default());
        let scheduler = Self {
            registry,
            sweeps,
            commands: command_rx,
            state: state_tx,
            shutdown_rx,
            retry_delay,
        };
        let handle = SchedulerHandle {
            commands: command_tx,
            state: state_rx,
        };
        (scheduler, handle)
    }

    pub async fn run(mut self) {
        info!("Liveness scheduler started.");
        let mut deadline: Option<Instant> = None;
        let mut in_flight: Option<JoinHandle<Result<SweepReport, MonitorError>>> = None;

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    info!("Shutdown signal received, stopping liveness scheduler.");
                    if let Some(handle) = in_flight.take() {
                        handle.abort();
                    }
                    break;
                }

                joined = join_sweep(&mut in_flight) => {
                    in_flight = None;
                    let report = match joined {
                        Ok(Ok(report)) => Some(report),
                        Ok(Err(e)) => {
                            error!(error = %e, "Liveness sweep failed.");
                            None
                        }
                        Err(e) => {
                            error!(error = %e, "Liveness sweep task panicked or was cancelled.");
                            None
                        }
                    };
                    deadline = self.plan_next_sweep().await;
                    let next_sweep_at = wall_clock(deadline);
                    self.state.send_modify(|state| {
                        state.sweep_in_flight = false;
                        state.completed_sweeps += 1;
                        state.next_sweep_at = next_sweep_at;
                        if report.is_some() {
                            state.last_report = report;
                        }
                    });
                }

                command = self.commands.recv() => {
                    match command {
                        Some(SchedulerCommand::RunNow)
                        | Some(SchedulerCommand::Reconfigure { enabled: true }) => {
                            if in_flight.is_some() {
                                debug!("Sweep already in flight, ignoring request.");
                            } else {
                                deadline = None;
                                in_flight = Some(self.start_sweep());
                            }
                        }
                        Some(SchedulerCommand::Reconfigure { enabled: false }) => {
                            info!("Automatic sweeps disabled.");
                            deadline = None;
                            self.state.send_modify(|state| state.next_sweep_at = None);
                        }
                        None => {
                            warn!("All scheduler handles dropped, stopping liveness scheduler.");
                            if let Some(handle) = in_flight.take() {
                                handle.abort();
                            }
                            break;
                        }
                    }
                }

                _ = sleep_until_deadline(deadline) => {
                    deadline = None;
                    if in_flight.is_none() {
                        in_flight = Some(self.start_sweep());
                    }
                }
            }
        }
        info!("Liveness scheduler stopped.");
    }

    fn start_sweep(&self) -> JoinHandle<Result<SweepReport, MonitorError>> {
        self.state.send_modify(|state| {
            state.sweep_in_flight = true;
            state.next_sweep_at = None;
        });
        let sweeps = self.sweeps.clone();
        tokio::spawn(async move { sweeps.run().await })
    }

    /// Reads the stored config after a sweep and returns the next deadline.
    async fn plan_next_sweep(&self) -> Option<Instant> {
        match MonitorConfig::load(self.registry.as_ref()).await {
            Ok(config) if config.enabled => {
                debug!(interval_minutes = config.interval, "Next sweep scheduled.");
                Some(Instant::now() + config.interval_duration())
            }
            Ok(_) => {
                info!("Automatic sweeps disabled, not rescheduling.");
                None
            }
            Err(e) => {
                error!(
                    error = %e,
                    retry_secs = self.retry_delay.as_secs(),
                    "Failed to read monitor config after sweep, retrying later."
                );
                Some(Instant::now() + self.retry_delay)
            }
        }
    }
}

async fn join_sweep(
    handle: &mut Option<JoinHandle<Result<SweepReport, MonitorError>>>,
) -> Result<Result<SweepReport, MonitorError>, JoinError> {
    match handle {
        Some(h) => h.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn wall_clock(deadline: Option<Instant>) -> Option<DateTime<Utc>> {
    deadline.map(|at| {
        let remaining = at.saturating_duration_since(Instant::now());
        Utc::now() + chrono::Duration::from_std(remaining).unwrap_or_default()
    })
}
