use thiserror::Error;

use super::prober::AddressError;
use super::registry::RegistryError;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Invalid IP/Hostname format: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("Interval must be between 1 and 5000 minutes, got {0}")]
    InvalidInterval(u32),
    #[error("Target not found: {0}")]
    TargetNotFound(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Monitor scheduler is not running")]
    SchedulerStopped,
}
