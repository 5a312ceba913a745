use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{ProbeProfile, ProbeResult, Prober, parse_ping_output, validate_address};

/// Probes by spawning the platform `ping` binary with an allow-listed
/// argument vector. No shell is involved.
#[derive(Debug, Clone)]
pub struct SystemPingProber {
    binary: String,
    /// Upper bound on the whole process, on top of any per-packet timeout.
    command_timeout: Duration,
}

impl Default for SystemPingProber {
    fn default() -> Self {
        Self::new("ping", Duration::from_secs(30))
    }
}

impl SystemPingProber {
    pub fn new(binary: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            command_timeout,
        }
    }

    fn build_args(address: &str, profile: ProbeProfile) -> Vec<String> {
        let mut args = vec!["-c".to_string(), profile.count.max(1).to_string()];
        if let Some(timeout) = profile.timeout_per_packet {
            args.push("-W".to_string());
            args.push(timeout.as_secs().max(1).to_string());
        }
        args.push(address.to_string());
        args
    }
}

#[async_trait]
impl Prober for SystemPingProber {
    async fn probe(&self, address: &str, profile: ProbeProfile) -> ProbeResult {
        let args = Self::build_args(address, profile);
        let command_line = format!("{} {}", self.binary, args.join(" "));

        if let Err(e) = validate_address(address) {
            warn!(address = %address, error = %e, "Refusing to probe invalid address.");
            return ProbeResult::failed(command_line, format!("Invalid address: {e}"));
        }

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.command_timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(address = %address, error = %e, "Failed to execute ping.");
                return ProbeResult::failed(command_line, format!("Failed to execute ping: {e}"));
            }
            Err(_) => {
                warn!(address = %address, timeout = ?self.command_timeout, "Ping command timed out.");
                return ProbeResult::failed(
                    command_line,
                    format!(
                        "Ping command timed out after {}s",
                        self.command_timeout.as_secs()
                    ),
                );
            }
        };

        let mut raw = String::from_utf8_lossy(&output.stdout).into_owned();
        raw.push_str(&String::from_utf8_lossy(&output.stderr));
        let alive = output.status.success();
        debug!(address = %address, alive, exit = ?output.status.code(), "Ping finished.");

        parse_ping_output(raw, alive, profile, command_line)
    }
}
