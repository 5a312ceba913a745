//! Ad-hoc probes of a single target, outside the sweep cycle.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::MonitorError;
use super::prober::{ProbeProfile, ProbeResult, Prober, validate_address};
use super::registry::{MonitoredTarget, Registry, RegistryError};
use super::status::{LivenessStatus, derive_status, has_hostname};

/// What an on-demand probe hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status: LivenessStatus,
    pub details: ProbeResult,
}

/// One probe plus the liveness write that followed it.
#[derive(Debug, Clone)]
pub(crate) struct ProbeRecord {
    pub status: LivenessStatus,
    pub result: ProbeResult,
    pub checked_at: DateTime<Utc>,
    /// `false` when the row disappeared while the probe was running.
    pub row_found: bool,
}

/// Probes `target`, classifies the result and writes the liveness pair.
///
/// `checked_at` is taken after the probe returns so the stored timestamp is
/// never older than the outcome it describes.
pub(crate) async fn probe_and_record(
    registry: &dyn Registry,
    prober: &dyn Prober,
    target: &MonitoredTarget,
    profile: ProbeProfile,
) -> Result<ProbeRecord, RegistryError> {
    let result = prober.probe(&target.address, profile).await;
    let status = derive_status(result.alive, has_hostname(target.hostname.as_deref()));
    let checked_at = Utc::now();
    let row_found = registry
        .update_liveness_status(target.id, status, checked_at)
        .await?;
    debug!(
        target_id = target.id,
        address = %target.address,
        status = %status,
        row_found,
        "Recorded probe result."
    );
    Ok(ProbeRecord {
        status,
        result,
        checked_at,
        row_found,
    })
}

#[derive(Clone)]
pub struct ProbeHandler {
    registry: Arc<dyn Registry>,
    prober: Arc<dyn Prober>,
}

impl ProbeHandler {
    pub fn new(registry: Arc<dyn Registry>, prober: Arc<dyn Prober>) -> Self {
        Self { registry, prober }
    }

    /// Detailed probe of the target registered under `address`.
    pub async fn probe_one(&self, address: &str) -> Result<ProbeOutcome, MonitorError> {
        validate_address(address)?;
        let target = self
            .registry
            .find_target_by_address(address)
            .await?
            .ok_or_else(|| MonitorError::TargetNotFound(address.to_string()))?;
        self.probe_and_report(&target, ProbeProfile::DETAILED).await
    }

    /// Fast-profile probe of the target with this id.
    pub async fn probe_target(&self, id: i32) -> Result<ProbeOutcome, MonitorError> {
        let target = self
            .registry
            .find_target_by_id(id)
            .await?
            .ok_or_else(|| MonitorError::TargetNotFound(id.to_string()))?;
        self.probe_and_report(&target, ProbeProfile::FAST).await
    }

    async fn probe_and_report(
        &self,
        target: &MonitoredTarget,
        profile: ProbeProfile,
    ) -> Result<ProbeOutcome, MonitorError> {
        let record = probe_and_record(
            self.registry.as_ref(),
            self.prober.as_ref(),
            target,
            profile,
        )
        .await?;
        if !record.row_found {
            return Err(MonitorError::TargetNotFound(target.address.clone()));
        }
        info!(
            target_id = target.id,
            address = %target.address,
            status = %record.status,
            loss = record.result.packet_loss,
            "On-demand probe completed."
        );
        Ok(ProbeOutcome {
            status: record.status,
            details: record.result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::testing::{MemoryRegistry, ScriptedProber, target};

    fn handler(
        registry: &Arc<MemoryRegistry>,
        prober: &Arc<ScriptedProber>,
    ) -> ProbeHandler {
        ProbeHandler::new(registry.clone(), prober.clone())
    }

    #[tokio::test]
    async fn test_probe_one_uses_detailed_profile_and_writes() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(2, "10.0.0.6", "db-1")]));
        let prober = Arc::new(ScriptedProber::new(true));
        let before = Utc::now();

        let outcome = handler(&registry, &prober).probe_one("10.0.0.6").await.unwrap();

        assert_eq!(outcome.status, LivenessStatus::Up);
        assert_eq!(outcome.details.sent, 3);
        assert_eq!(prober.calls()[0].profile, ProbeProfile::DETAILED);
        let (status, checked) = registry.liveness(2);
        assert_eq!(status, Some(LivenessStatus::Up));
        assert!(checked.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_named_target_failure_is_reserved() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(2, "10.0.0.6", "db-1")]));
        let prober = Arc::new(ScriptedProber::new(false));

        let outcome = handler(&registry, &prober).probe_one("10.0.0.6").await.unwrap();

        assert_eq!(outcome.status, LivenessStatus::Reserved);
        assert!(!outcome.details.alive);
        assert_eq!(registry.liveness(2).0, Some(LivenessStatus::Reserved));
    }

    #[tokio::test]
    async fn test_unknown_address_is_not_found_without_probe() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(1, "10.0.0.5", "")]));
        let prober = Arc::new(ScriptedProber::new(true));

        let err = handler(&registry, &prober)
            .probe_one("unregistered-host")
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::TargetNotFound(ref a) if a == "unregistered-host"));
        assert_eq!(prober.call_count(), 0);
        assert_eq!(registry.write_count(), 0);
    }

    #[tokio::test]
    async fn test_injection_attempt_rejected_before_lookup() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(
            1,
            "8.8.8.8; rm -rf /",
            "",
        )]));
        let prober = Arc::new(ScriptedProber::new(true));

        let err = handler(&registry, &prober)
            .probe_one("8.8.8.8; rm -rf /")
            .await
            .unwrap_err();

        assert!(matches!(err, MonitorError::InvalidAddress(_)));
        assert_eq!(prober.call_count(), 0);
        assert_eq!(registry.write_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_target_by_id_uses_fast_profile() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(1, "10.0.0.5", "")]));
        let prober = Arc::new(ScriptedProber::new(false));

        let outcome = handler(&registry, &prober).probe_target(1).await.unwrap();

        assert_eq!(outcome.status, LivenessStatus::Down);
        assert_eq!(prober.calls()[0].profile, ProbeProfile::FAST);
        assert!(matches!(
            handler(&registry, &prober).probe_target(99).await,
            Err(MonitorError::TargetNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_surfaces_as_error() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(1, "10.0.0.5", "")]));
        registry.fail_updates_for(1);
        let prober = Arc::new(ScriptedProber::new(true));

        let err = handler(&registry, &prober).probe_one("10.0.0.5").await.unwrap_err();
        assert!(matches!(err, MonitorError::Registry(_)));
    }

    #[tokio::test]
    async fn test_status_matches_the_probe_that_wrote_it() {
        let registry = Arc::new(MemoryRegistry::with_targets(vec![target(1, "10.0.0.5", "")]));
        let prober = Arc::new(ScriptedProber::new(true));
        let h = handler(&registry, &prober);

        let first = probe_and_record(
            registry.as_ref(),
            prober.as_ref(),
            &target(1, "10.0.0.5", ""),
            ProbeProfile::FAST,
        )
        .await
        .unwrap();
        prober.set_alive("10.0.0.5", false);
        let second = h.probe_target(1).await.unwrap();

        let (status, checked) = registry.liveness(1);
        assert_eq!(first.status, LivenessStatus::Up);
        assert_eq!(second.status, LivenessStatus::Down);
        assert_eq!(status, Some(LivenessStatus::Down));
        assert!(checked.unwrap() >= first.checked_at);
    }
}
