// Copyright (c) 2025 - Cowboy AI, Inc.
//! Liveness Prober
//!
//! Answers one question about a candidate address: does anything answer on
//! the wire? The answer is tri-state:
//!
//! - `Ok(true)`: something responded
//! - `Ok(false)`: nothing responded within the wait
//! - `Err(ProbeError)`: the probe itself could not run or finish, so the
//!   address is neither live nor free as far as the scanner is concerned

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Default per-probe wait handed to `ping -W`
pub const DEFAULT_PROBE_WAIT: Duration = Duration::from_secs(2);

/// Default hard deadline for one probe call, including process startup
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(3);

/// Whole seconds handed to `ping -W` for a wait
///
/// Rounded up and at least one, so ping never waits less than asked.
pub fn ping_wait_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Probe failures (inconclusive results)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("could not launch probe: {0}")]
    Launch(String),

    #[error("probe failed: {0}")]
    Failed(String),
}

/// Tests whether an address is live on the network
#[async_trait]
pub trait LivenessProber: Send + Sync {
    async fn probe(&self, address: Ipv4Addr) -> Result<bool, ProbeError>;
}

/// Run a probe under a hard deadline
///
/// Hitting the deadline is inconclusive, not "silent".
pub async fn probe_with_timeout<P>(
    prober: &P,
    address: Ipv4Addr,
    deadline: Duration,
) -> Result<bool, ProbeError>
where
    P: LivenessProber + ?Sized,
{
    match tokio::time::timeout(deadline, prober.probe(address)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(deadline)),
    }
}

/// ICMP echo via the system `ping` binary
///
/// Exit status 0 means a reply arrived, 1 means none did; anything else
/// (including failing to spawn, e.g. missing binary or permissions) is an error.
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    wait: Duration,
}

impl PingProber {
    pub fn new(wait: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            wait,
        }
    }

    /// Use a different ping executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_WAIT)
    }
}

#[async_trait]
impl LivenessProber for PingProber {
    async fn probe(&self, address: Ipv4Addr) -> Result<bool, ProbeError> {
        let wait_secs = ping_wait_secs(self.wait);

        let status = Command::new(&self.program)
            .arg("-c")
            .arg("1")
            .arg("-W")
            .arg(wait_secs.to_string())
            .arg(address.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| ProbeError::Launch(format!("{}: {}", self.program, e)))?;

        debug!(%address, code = ?status.code(), "ping finished");

        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            Some(code) => Err(ProbeError::Failed(format!(
                "{} exited with status {}",
                self.program, code
            ))),
            None => Err(ProbeError::Failed(format!(
                "{} terminated by signal",
                self.program
            ))),
        }
    }
}

/// Prober with fixed answers, for offline runs and tests
///
/// Addresses not listed anywhere are reported silent. Every probed address
/// is recorded in call order.
#[derive(Debug, Default)]
pub struct StaticProber {
    live: BTreeSet<Ipv4Addr>,
    failing: BTreeSet<Ipv4Addr>,
    hanging: BTreeSet<Ipv4Addr>,
    probed: Mutex<Vec<Ipv4Addr>>,
}

impl StaticProber {
    /// Prober that never sees a response
    pub fn silent() -> Self {
        Self::default()
    }

    /// Report `address` as responding
    pub fn with_live(mut self, address: Ipv4Addr) -> Self {
        self.live.insert(address);
        self
    }

    /// Fail the probe for `address`
    pub fn with_failure(mut self, address: Ipv4Addr) -> Self {
        self.failing.insert(address);
        self
    }

    /// Never complete the probe for `address`
    pub fn with_hang(mut self, address: Ipv4Addr) -> Self {
        self.hanging.insert(address);
        self
    }

    /// Addresses probed so far, in order
    pub fn probed(&self) -> Vec<Ipv4Addr> {
        self.probed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LivenessProber for StaticProber {
    async fn probe(&self, address: Ipv4Addr) -> Result<bool, ProbeError> {
        self.probed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(address);

        if self.hanging.contains(&address) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&address) {
            return Err(ProbeError::Launch("operation not permitted".to_string()));
        }
        Ok(self.live.contains(&address))
    }
}
