//! In-memory registry and scripted prober shared by the monitor tests.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::prober::{ProbeProfile, ProbeResult, Prober};
use super::registry::{MonitoredTarget, Registry, RegistryError};
use super::status::LivenessStatus;

#[derive(Debug, Clone)]
struct Row {
    target: MonitoredTarget,
    last_status: Option<LivenessStatus>,
    last_checked: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    rows: Vec<Row>,
    settings: HashMap<String, String>,
    failing_updates: HashSet<i32>,
    fail_config_reads: bool,
    fail_listing: bool,
    writes: usize,
}

#[derive(Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
}

pub fn target(id: i32, address: &str, hostname: &str) -> MonitoredTarget {
    MonitoredTarget {
        id,
        address: address.to_string(),
        hostname: if hostname.is_empty() {
            None
        } else {
            Some(hostname.to_string())
        },
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: Vec<MonitoredTarget>) -> Self {
        let registry = Self::new();
        for t in targets {
            registry.add_target(t);
        }
        registry
    }

    pub fn add_target(&self, target: MonitoredTarget) {
        self.state.lock().unwrap().rows.push(Row {
            target,
            last_status: None,
            last_checked: None,
        });
    }

    pub fn remove_target(&self, id: i32) {
        self.state.lock().unwrap().rows.retain(|r| r.target.id != id);
    }

    pub fn liveness(&self, id: i32) -> (Option<LivenessStatus>, Option<DateTime<Utc>>) {
        let state = self.state.lock().unwrap();
        state
            .rows
            .iter()
            .find(|r| r.target.id == id)
            .map(|r| (r.last_status, r.last_checked))
            .unwrap_or((None, None))
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn fail_updates_for(&self, id: i32) {
        self.state.lock().unwrap().failing_updates.insert(id);
    }

    pub fn set_fail_config_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_config_reads = fail;
    }

    pub fn set_fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn list_targets(&self) -> Result<Vec<MonitoredTarget>, RegistryError> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(RegistryError::Unavailable("listing disabled".to_string()));
        }
        Ok(state.rows.iter().map(|r| r.target.clone()).collect())
    }

    async fn find_target_by_address(
        &self,
        address: &str,
    ) -> Result<Option<MonitoredTarget>, RegistryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .find(|r| r.target.address == address)
            .map(|r| r.target.clone()))
    }

    async fn find_target_by_id(&self, id: i32) -> Result<Option<MonitoredTarget>, RegistryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .find(|r| r.target.id == id)
            .map(|r| r.target.clone()))
    }

    async fn update_liveness_status(
        &self,
        id: i32,
        status: LivenessStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_updates.contains(&id) {
            return Err(RegistryError::Unavailable(format!("write for {id} rejected")));
        }
        state.writes += 1;
        match state.rows.iter_mut().find(|r| r.target.id == id) {
            Some(row) => {
                row.last_status = Some(status);
                row.last_checked = Some(checked_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn latest_check(&self) -> Result<Option<DateTime<Utc>>, RegistryError> {
        let state = self.state.lock().unwrap();
        Ok(state.rows.iter().filter_map(|r| r.last_checked).max())
    }

    async fn get_config_value(&self, key: &str) -> Result<Option<String>, RegistryError> {
        let state = self.state.lock().unwrap();
        if state.fail_config_reads {
            return Err(RegistryError::Unavailable("settings unreadable".to_string()));
        }
        Ok(state.settings.get(key).cloned())
    }

    async fn set_config_value(&self, key: &str, value: &str) -> Result<(), RegistryError> {
        self.state
            .lock()
            .unwrap()
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProbeCall {
    pub address: String,
    pub profile: ProbeProfile,
    pub at: Instant,
}

/// Answers from a script instead of the network.
pub struct ScriptedProber {
    default_alive: bool,
    overrides: Mutex<HashMap<String, bool>>,
    delay: Duration,
    calls: Mutex<Vec<ProbeCall>>,
}

impl ScriptedProber {
    pub fn new(default_alive: bool) -> Self {
        Self {
            default_alive,
            overrides: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_alive(&self, address: &str, alive: bool) {
        self.overrides
            .lock()
            .unwrap()
            .insert(address.to_string(), alive);
    }

    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, address: &str, profile: ProbeProfile) -> ProbeResult {
        self.calls.lock().unwrap().push(ProbeCall {
            address: address.to_string(),
            profile,
            at: Instant::now(),
        });
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let alive = self
            .overrides
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(self.default_alive);
        let received = if alive { profile.count } else { 0 };
        ProbeResult {
            alive,
            packet_loss: if alive { 0.0 } else { 100.0 },
            avg_latency_ms: alive.then_some(1.5),
            sent: profile.count,
            received,
            raw_output: format!("scripted reply for {address}"),
            command_line: format!("ping -c {} {address}", profile.count),
        }
    }
}
