use async_trait::async_trait;
use rand::random;
use std::fmt::Write as _;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tracing::{debug, warn};

use super::{ProbeProfile, ProbeResult, Prober, parse_ping_output, validate_address};

const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const PACKET_SPACING: Duration = Duration::from_secs(1);
const PAYLOAD: [u8; 56] = [0; 56];

/// Probes over ICMP sockets directly instead of spawning a process.
///
/// Needs `CAP_NET_RAW` or an unprivileged ICMP socket range
/// (`net.ipv4.ping_group_range`). The raw output mimics the iputils summary
/// so callers see the same diagnostics as with the system binary.
#[derive(Debug, Clone, Default)]
pub struct IcmpProber;

impl IcmpProber {
    pub fn new() -> Self {
        Self
    }

    async fn resolve(address: &str) -> Result<IpAddr, String> {
        if let Ok(ip) = address.parse::<IpAddr>() {
            return Ok(ip);
        }
        let mut addrs = tokio::net::lookup_host((address, 0))
            .await
            .map_err(|e| format!("ping: {address}: {e}"))?;
        addrs
            .next()
            .map(|a| a.ip())
            .ok_or_else(|| format!("ping: {address}: Name or service not known"))
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, address: &str, profile: ProbeProfile) -> ProbeResult {
        let count = profile.count.max(1);
        let reply_timeout = profile.timeout_per_packet.unwrap_or(DEFAULT_REPLY_TIMEOUT);
        let command_line = format!(
            "icmp-echo -c {count} -W {} {address}",
            reply_timeout.as_secs().max(1)
        );

        if let Err(e) = validate_address(address) {
            warn!(address = %address, error = %e, "Refusing to probe invalid address.");
            return ProbeResult::failed(command_line, format!("Invalid address: {e}"));
        }

        let ip = match Self::resolve(address).await {
            Ok(ip) => ip,
            Err(reason) => return ProbeResult::failed(command_line, reason),
        };

        let config = match ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = match Client::new(&config) {
            Ok(client) => client,
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to open ICMP socket.");
                return ProbeResult::failed(command_line, format!("Failed to open ICMP socket: {e}"));
            }
        };

        let mut pinger = client.pinger(ip, PingIdentifier(random())).await;
        pinger.timeout(reply_timeout);

        let mut raw = format!("PING {address} ({ip}) 56 bytes of data.\n");
        let mut rtts: Vec<f64> = Vec::with_capacity(count as usize);
        for seq in 0..count {
            if seq > 0 {
                tokio::time::sleep(PACKET_SPACING).await;
            }
            match pinger.ping(PingSequence(seq as u16), &PAYLOAD).await {
                Ok((_packet, rtt)) => {
                    let ms = rtt.as_secs_f64() * 1000.0;
                    let _ = writeln!(raw, "reply from {ip}: icmp_seq={} time={ms:.3} ms", seq + 1);
                    rtts.push(ms);
                }
                Err(e) => {
                    let _ = writeln!(raw, "no reply from {ip}: icmp_seq={}: {e}", seq + 1);
                }
            }
        }

        let received = rtts.len() as u32;
        let loss = 100.0 * f64::from(count - received) / f64::from(count);
        let _ = writeln!(raw, "\n--- {address} ping statistics ---");
        let _ = writeln!(
            raw,
            "{count} packets transmitted, {received} received, {loss:.0}% packet loss"
        );
        if !rtts.is_empty() {
            let min = rtts.iter().copied().fold(f64::INFINITY, f64::min);
            let max = rtts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = rtts.iter().sum::<f64>() / rtts.len() as f64;
            let mdev = (rtts.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / rtts.len() as f64)
                .sqrt();
            let _ = writeln!(
                raw,
                "rtt min/avg/max/mdev = {min:.3}/{avg:.3}/{max:.3}/{mdev:.3} ms"
            );
        }

        debug!(address = %address, received, count, "ICMP probe finished.");
        parse_ping_output(raw, received > 0, profile, command_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_invalid_address_before_socket() {
        let result = IcmpProber::new()
            .probe("8.8.8.8; rm -rf /", ProbeProfile::FAST)
            .await;
        assert!(!result.alive);
        assert!(result.raw_output.starts_with("Invalid address"));
        assert_eq!(result.command_line, "icmp-echo -c 1 -W 1 8.8.8.8; rm -rf /");
    }

    #[tokio::test]
    async fn test_resolve_literal_skips_dns() {
        let ip = IcmpProber::resolve("10.0.0.5").await.unwrap();
        assert_eq!(ip, "10.0.0.5".parse::<IpAddr>().unwrap());
    }
}
