//! The store the monitor reads targets from and writes liveness back to.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::services::{ip_service, settings_service};
use crate::monitor::status::LivenessStatus;

/// The slice of a registry row the monitor needs to probe and classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredTarget {
    pub id: i32,
    pub address: String,
    pub hostname: Option<String>,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Registry: Send + Sync {
    /// Every target, in a stable order.
    async fn list_targets(&self) -> Result<Vec<MonitoredTarget>, RegistryError>;

    async fn find_target_by_address(
        &self,
        address: &str,
    ) -> Result<Option<MonitoredTarget>, RegistryError>;

    async fn find_target_by_id(&self, id: i32) -> Result<Option<MonitoredTarget>, RegistryError>;

    /// Writes `last_status` and `last_checked` in one operation.
    ///
    /// Returns `false` when no row has this id any more.
    async fn update_liveness_status(
        &self,
        id: i32,
        status: LivenessStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<bool, RegistryError>;

    /// The newest `last_checked` across all targets.
    async fn latest_check(&self) -> Result<Option<DateTime<Utc>>, RegistryError>;

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, RegistryError>;

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), RegistryError>;
}

/// Registry backed by the `ips` and `settings` tables.
#[derive(Clone)]
pub struct SeaOrmRegistry {
    db: DatabaseConnection,
}

impl SeaOrmRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Registry for SeaOrmRegistry {
    async fn list_targets(&self) -> Result<Vec<MonitoredTarget>, RegistryError> {
        let rows = ip_service::list_targets(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_target_by_address(
        &self,
        address: &str,
    ) -> Result<Option<MonitoredTarget>, RegistryError> {
        Ok(ip_service::find_by_address(&self.db, address)
            .await?
            .map(Into::into))
    }

    async fn find_target_by_id(&self, id: i32) -> Result<Option<MonitoredTarget>, RegistryError> {
        Ok(ip_service::find_by_id(&self.db, id).await?.map(Into::into))
    }

    async fn update_liveness_status(
        &self,
        id: i32,
        status: LivenessStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        let result = ip_service::update_liveness(&self.db, id, status, checked_at).await?;
        Ok(result.rows_affected > 0)
    }

    async fn latest_check(&self) -> Result<Option<DateTime<Utc>>, RegistryError> {
        Ok(ip_service::latest_check(&self.db).await?)
    }

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, RegistryError> {
        Ok(settings_service::get_setting(&self.db, key)
            .await?
            .map(|s| s.value))
    }

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), RegistryError> {
        settings_service::update_setting(&self.db, key, value).await?;
        Ok(())
    }
}
