//! Liveness monitoring for the IP pool: periodic sweeps plus on-demand probes.
pub mod config;
pub mod error;
pub mod probe_handler;
pub mod prober;
pub mod registry;
pub mod scheduler;
pub mod status;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

pub use config::{MonitorConfig, MonitorStatus};
pub use error::MonitorError;
pub use probe_handler::{ProbeHandler, ProbeOutcome};
pub use prober::{ProbeProfile, ProbeResult, Prober};
pub use registry::{MonitoredTarget, Registry, SeaOrmRegistry};
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerState};
pub use status::LivenessStatus;
pub use sweep::{SweepReport, SweepRunner};

/// Timing knobs that are deployment concerns rather than stored config.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub inter_probe_delay: Duration,
    pub reschedule_retry: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            inter_probe_delay: Duration::from_millis(200),
            reschedule_retry: Duration::from_secs(60),
        }
    }
}

pub struct Monitor {
    registry: Arc<dyn Registry>,
    probes: ProbeHandler,
    scheduler: SchedulerHandle,
    shutdown_tx: watch::Sender<()>,
    scheduler_task: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    /// Seeds missing config, spawns the scheduler and, if sweeps are
    /// enabled, kicks off the first one immediately.
    pub async fn start(
        registry: Arc<dyn Registry>,
        prober: Arc<dyn Prober>,
        settings: MonitorSettings,
    ) -> Result<Self, MonitorError> {
        MonitorConfig::seed_defaults(registry.as_ref()).await?;
        let config = MonitorConfig::load(registry.as_ref()).await?;

        let sweeps = Arc::new(SweepRunner::new(
            registry.clone(),
            prober.clone(),
            settings.inter_probe_delay,
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let (scheduler, handle) = Scheduler::new(
            registry.clone(),
            sweeps,
            settings.reschedule_retry,
            shutdown_rx,
        );
        let scheduler_task = tokio::spawn(scheduler.run());

        info!(
            interval_minutes = config.interval,
            enabled = config.enabled,
            "Liveness monitor started."
        );
        if config.enabled {
            handle.run_now()?;
        }

        Ok(Self {
            probes: ProbeHandler::new(registry.clone(), prober),
            registry,
            scheduler: handle,
            shutdown_tx,
            scheduler_task: Mutex::new(Some(scheduler_task)),
        })
    }

    pub async fn get_status(&self) -> Result<MonitorStatus, MonitorError> {
        let config = MonitorConfig::load(self.registry.as_ref()).await?;
        let last_run = self.registry.latest_check().await?;
        Ok(MonitorStatus::derive(config, last_run))
    }

    /// Validates and persists the config, then tells the scheduler.
    ///
    /// Enabling starts a sweep straight away; disabling only clears the
    /// pending deadline.
    pub async fn update_config(
        &self,
        interval: u32,
        enabled: bool,
    ) -> Result<MonitorConfig, MonitorError> {
        let config = MonitorConfig::new(interval, enabled)?;
        config.store(self.registry.as_ref()).await?;
        info!(
            interval_minutes = config.interval,
            enabled = config.enabled,
            "Monitor config updated."
        );
        self.scheduler.reconfigure(config.enabled).await?;
        Ok(config)
    }

    pub fn run_full_sweep(&self) -> Result<(), MonitorError> {
        self.scheduler.run_now()
    }

    pub async fn probe_one(&self, address: &str) -> Result<ProbeOutcome, MonitorError> {
        self.probes.probe_one(address).await
    }

    pub async fn probe_target(&self, id: i32) -> Result<ProbeOutcome, MonitorError> {
        self.probes.probe_target(id).await
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.scheduler.subscribe()
    }

    /// Stops the scheduler and waits for its task to exit.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.scheduler_task.lock().await.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Liveness scheduler task ended abnormally.");
            }
        }
    }
}
