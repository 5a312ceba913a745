//! Probe execution: one ICMP echo sequence against one target.
//!
//! A [`Prober`] never fails. Anything that goes wrong while probing (a missing
//! binary, a permission error, an address that does not pass validation)
//! is reported as a dead [`ProbeResult`] so that a single bad host cannot
//! abort a sweep.
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod icmp;
pub mod system;

pub use icmp::IcmpProber;
pub use system::SystemPingProber;

const MAX_ADDRESS_LEN: usize = 253;

static ADDRESS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").unwrap());
static LOSS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)% packet loss").unwrap());
static RTT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:rtt|round-trip) min/avg/max/(?:mdev|stddev) = [\d.]+/([\d.]+)/[\d.]+/[\d.]+ ms",
    )
    .unwrap()
});
static SENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) packets? transmitted").unwrap());
static RECEIVED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) (?:packets? )?received").unwrap());

/// How many echo requests to send and how long to wait for each reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeProfile {
    pub count: u32,
    pub timeout_per_packet: Option<Duration>,
}

impl ProbeProfile {
    /// Used by full sweeps: a single packet with a short wait.
    pub const FAST: ProbeProfile = ProbeProfile {
        count: 1,
        timeout_per_packet: Some(Duration::from_secs(1)),
    };

    /// Used by on-demand checks, where the caller wants loss and latency.
    pub const DETAILED: ProbeProfile = ProbeProfile {
        count: 3,
        timeout_per_packet: None,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub alive: bool,
    /// Percentage in `0.0..=100.0`.
    pub packet_loss: f64,
    pub avg_latency_ms: Option<f64>,
    pub sent: u32,
    pub received: u32,
    pub raw_output: String,
    pub command_line: String,
}

impl ProbeResult {
    /// A dead result for a probe that never reached the network.
    pub fn failed(command_line: String, reason: impl Into<String>) -> Self {
        Self {
            alive: false,
            packet_loss: 100.0,
            avg_latency_ms: None,
            sent: 0,
            received: 0,
            raw_output: reason.into(),
            command_line,
        }
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str, profile: ProbeProfile) -> ProbeResult;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("address is longer than {MAX_ADDRESS_LEN} characters")]
    TooLong,
    #[error("address may only contain letters, digits, dots and hyphens")]
    InvalidCharacters,
    #[error("address may not start with a hyphen")]
    LeadingHyphen,
}

/// Permissive hostname-or-IPv4 check applied before anything reaches the OS.
///
/// A leading hyphen is rejected because the address is passed as a
/// positional argument and would otherwise be read as an option.
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(AddressError::TooLong);
    }
    if !ADDRESS_RE.is_match(address) {
        return Err(AddressError::InvalidCharacters);
    }
    if address.starts_with('-') {
        return Err(AddressError::LeadingHyphen);
    }
    Ok(())
}

fn capture<T: std::str::FromStr>(re: &Regex, raw: &str) -> Option<T> {
    re.captures(raw)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Builds a [`ProbeResult`] from ping's combined stdout/stderr.
///
/// `alive` comes from the process outcome; the text only fills in the
/// counters, falling back to values consistent with `alive` when a summary
/// line is missing.
pub fn parse_ping_output(
    raw: String,
    alive: bool,
    profile: ProbeProfile,
    command_line: String,
) -> ProbeResult {
    let packet_loss = capture::<f64>(&LOSS_RE, &raw)
        .map(|loss| loss.clamp(0.0, 100.0))
        .unwrap_or(if alive { 0.0 } else { 100.0 });
    let avg_latency_ms = capture::<f64>(&RTT_RE, &raw);
    let sent = capture::<u32>(&SENT_RE, &raw).unwrap_or(profile.count);
    let received =
        capture::<u32>(&RECEIVED_RE, &raw).unwrap_or(if alive { profile.count } else { 0 });

    ProbeResult {
        alive,
        packet_loss,
        avg_latency_ms,
        sent,
        received,
        raw_output: raw,
        command_line,
    }
}
