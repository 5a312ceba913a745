//! The persisted monitor configuration and the status view derived from it.
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::warn;

use super::error::MonitorError;
use super::registry::{Registry, RegistryError};

pub const INTERVAL_KEY: &str = "ping_interval";
pub const ENABLED_KEY: &str = "auto_ping_enabled";

pub const DEFAULT_INTERVAL_MINUTES: u32 = 180;
pub const INTERVAL_BOUNDS: RangeInclusive<u32> = 1..=5000;

/// Sweep cadence in minutes and whether sweeps reschedule themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub interval: u32,
    pub enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MINUTES,
            enabled: false,
        }
    }
}

impl MonitorConfig {
    pub fn new(interval: u32, enabled: bool) -> Result<Self, MonitorError> {
        if !INTERVAL_BOUNDS.contains(&interval) {
            return Err(MonitorError::InvalidInterval(interval));
        }
        Ok(Self { interval, enabled })
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval) * 60)
    }

    /// Reads both keys, falling back to the default for anything missing or
    /// unusable.
    pub async fn load(registry: &dyn Registry) -> Result<Self, RegistryError> {
        let defaults = Self::default();

        let interval = match registry.get_config_value(INTERVAL_KEY).await? {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(v) if INTERVAL_BOUNDS.contains(&v) => v,
                _ => {
                    warn!(key = INTERVAL_KEY, value = %raw, "Ignoring invalid stored interval.");
                    defaults.interval
                }
            },
            None => defaults.interval,
        };

        let enabled = match registry.get_config_value(ENABLED_KEY).await? {
            Some(raw) => match raw.trim() {
                "true" => true,
                "false" => false,
                other => {
                    warn!(key = ENABLED_KEY, value = %other, "Ignoring invalid stored enabled flag.");
                    defaults.enabled
                }
            },
            None => defaults.enabled,
        };

        Ok(Self { interval, enabled })
    }

    pub async fn store(&self, registry: &dyn Registry) -> Result<(), RegistryError> {
        registry
            .set_config_value(INTERVAL_KEY, &self.interval.to_string())
            .await?;
        registry
            .set_config_value(ENABLED_KEY, &self.enabled.to_string())
            .await
    }

    /// Inserts the defaults for keys that have never been written.
    pub async fn seed_defaults(registry: &dyn Registry) -> Result<(), RegistryError> {
        let defaults = Self::default();
        if registry.get_config_value(INTERVAL_KEY).await?.is_none() {
            registry
                .set_config_value(INTERVAL_KEY, &defaults.interval.to_string())
                .await?;
        }
        if registry.get_config_value(ENABLED_KEY).await?.is_none() {
            registry
                .set_config_value(ENABLED_KEY, &defaults.enabled.to_string())
                .await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub interval: u32,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

impl MonitorStatus {
    pub fn derive(config: MonitorConfig, last_run: Option<DateTime<Utc>>) -> Self {
        let next_run = match (config.enabled, last_run) {
            (true, Some(last)) => Some(last + ChronoDuration::minutes(i64::from(config.interval))),
            _ => None,
        };
        Self {
            interval: config.interval,
            enabled: config.enabled,
            last_run,
            next_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::testing::MemoryRegistry;
    use chrono::TimeZone;

    #[test]
    fn test_interval_bounds() {
        assert!(MonitorConfig::new(1, true).is_ok());
        assert!(MonitorConfig::new(5000, false).is_ok());
        assert!(matches!(
            MonitorConfig::new(0, true),
            Err(MonitorError::InvalidInterval(0))
        ));
        assert!(matches!(
            MonitorConfig::new(5001, true),
            Err(MonitorError::InvalidInterval(5001))
        ));
    }

    #[test]
    fn test_interval_is_minutes() {
        let config = MonitorConfig::new(5, true).unwrap();
        assert_eq!(config.interval_duration(), Duration::from_secs(300));
    }

    #[test]
    fn test_next_run_only_when_enabled() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let enabled = MonitorStatus::derive(MonitorConfig::new(30, true).unwrap(), Some(last));
        assert_eq!(
            enabled.next_run,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
        );

        let disabled = MonitorStatus::derive(MonitorConfig::new(30, false).unwrap(), Some(last));
        assert_eq!(disabled.next_run, None);

        let never_ran = MonitorStatus::derive(MonitorConfig::new(30, true).unwrap(), None);
        assert_eq!(never_ran.next_run, None);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = MonitorStatus::derive(MonitorConfig::default(), None);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["interval"], 180);
        assert_eq!(json["enabled"], false);
        assert!(json["lastRun"].is_null());
        assert!(json["nextRun"].is_null());
    }

    #[tokio::test]
    async fn test_load_falls_back_on_garbage() {
        let registry = MemoryRegistry::new();
        registry.set_config_value(INTERVAL_KEY, "soon").await.unwrap();
        registry.set_config_value(ENABLED_KEY, "yes").await.unwrap();
        let config = MonitorConfig::load(&registry).await.unwrap();
        assert_eq!(config, MonitorConfig::default());

        registry.set_config_value(INTERVAL_KEY, "0").await.unwrap();
        assert_eq!(
            MonitorConfig::load(&registry).await.unwrap().interval,
            DEFAULT_INTERVAL_MINUTES
        );
    }

    #[tokio::test]
    async fn test_seed_defaults_keeps_existing_values() {
        let registry = MemoryRegistry::new();
        registry.set_config_value(INTERVAL_KEY, "15").await.unwrap();
        MonitorConfig::seed_defaults(&registry).await.unwrap();

        assert_eq!(
            registry.get_config_value(INTERVAL_KEY).await.unwrap().as_deref(),
            Some("15")
        );
        assert_eq!(
            registry.get_config_value(ENABLED_KEY).await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let registry = MemoryRegistry::new();
        let config = MonitorConfig::new(42, true).unwrap();
        config.store(&registry).await.unwrap();
        assert_eq!(MonitorConfig::load(&registry).await.unwrap(), config);
    }
}
