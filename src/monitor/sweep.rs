//! One pass over every registered target.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::error::MonitorError;
use super::probe_handler::probe_and_record;
use super::prober::{ProbeProfile, Prober};
use super::registry::Registry;
use super::status::LivenessStatus;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub targets: usize,
    pub probed: usize,
    pub up: usize,
    pub down: usize,
    pub reserved: usize,
    pub failed_writes: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SweepReport {
    fn started(targets: usize) -> Self {
        let now = Utc::now();
        Self {
            targets,
            probed: 0,
            up: 0,
            down: 0,
            reserved: 0,
            failed_writes: 0,
            started_at: now,
            finished_at: now,
        }
    }

    fn count(&mut self, status: LivenessStatus) {
        match status {
            LivenessStatus::Up => self.up += 1,
            LivenessStatus::Down => self.down += 1,
            LivenessStatus::Reserved => self.reserved += 1,
        }
    }
}

/// Probes targets one at a time with a fixed pause after each.
pub struct SweepRunner {
    registry: Arc<dyn Registry>,
    prober: Arc<dyn Prober>,
    profile: ProbeProfile,
    inter_probe_delay: Duration,
}

impl SweepRunner {
    pub fn new(
        registry: Arc<dyn Registry>,
        prober: Arc<dyn Prober>,
        inter_probe_delay: Duration,
    ) -> Self {
        Self {
            registry,
            prober,
            profile: ProbeProfile::FAST,
            inter_probe_delay,
        }
    }

    /// Snapshots the target list, then probes and records each entry.
    ///
    /// Only a failure to read the snapshot aborts the run; per-target write
    /// failures are logged and counted.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<SweepReport, MonitorError> {
        let targets = self.registry.list_targets().await?;
        let mut report = SweepReport::started(targets.len());
        info!(targets = targets.len(), "Starting liveness sweep.");

        for target in &targets {
            match probe_and_record(
                self.registry.as_ref(),
                self.prober.as_ref(),
                target,
                self.profile,
            )
            .await
            {
                Ok(record) => {
                    report.probed += 1;
                    report.count(record.status);
                    if !record.row_found {
                        debug!(
                            target_id = target.id,
                            "Target removed during sweep, result discarded."
                        );
                    }
                }
                Err(e) => {
                    report.probed += 1;
                    report.failed_writes += 1;
                    error!(
                        target_id = target.id,
                        address = %target.address,
                        error = %e,
                        "Failed to persist liveness status."
                    );
                }
            }
            tokio::time::sleep(self.inter_probe_delay).await;
        }

        report.finished_at = Utc::now();
        if report.failed_writes > 0 {
            warn!(
                failed_writes = report.failed_writes,
                "Liveness sweep finished with write failures."
            );
        }
        info!(
            up = report.up,
            down = report.down,
            reserved = report.reserved,
            "Liveness sweep finished."
        );
        Ok(report)
    }
}
