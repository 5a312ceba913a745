//! Liveness classification written back to the registry after every probe.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monitor-owned reachability state of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LivenessStatus {
    Up,
    Down,
    /// Probe failed but the target carries a hostname: a known asset that is
    /// temporarily unreachable rather than a vacant address.
    Reserved,
}

impl LivenessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivenessStatus::Up => "UP",
            LivenessStatus::Down => "DOWN",
            LivenessStatus::Reserved => "RESERVED",
        }
    }
}

impl fmt::Display for LivenessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown liveness status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for LivenessStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(LivenessStatus::Up),
            "DOWN" => Ok(LivenessStatus::Down),
            "RESERVED" => Ok(LivenessStatus::Reserved),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A hostname only counts when it has visible characters.
pub fn has_hostname(hostname: Option<&str>) -> bool {
    hostname.is_some_and(|h| !h.trim().is_empty())
}

/// The transition rule shared by sweeps and on-demand probes.
pub fn derive_status(alive: bool, has_hostname: bool) -> LivenessStatus {
    match (alive, has_hostname) {
        (true, _) => LivenessStatus::Up,
        (false, true) => LivenessStatus::Reserved,
        (false, false) => LivenessStatus::Down,
    }
}
