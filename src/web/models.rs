use serde::{Deserialize, Serialize};

use crate::monitor::{LivenessStatus, ProbeOutcome};

#[derive(Deserialize, Debug, Clone)]
pub struct UpdateConfigRequest {
    pub interval: u32,
    pub enabled: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PingOneRequest {
    pub ip: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct PingOneResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

#[derive(Serialize, Debug, Clone)]
pub struct PingTargetResponse {
    pub status: LivenessStatus,
}
