// Copyright (c) 2025 - Cowboy AI, Inc.
//! Engine configuration
//!
//! Loaded from the environment by the runner, or deserialized from any serde
//! source. Credentials are never printed by `Debug`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::{IpamError, IpamResult};
use crate::probe::{ping_wait_secs, DEFAULT_PROBE_DEADLINE, DEFAULT_PROBE_WAIT};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpamConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Asset database connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    pub password: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// One invocation issues one statement at a time
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_database() -> String {
    "racktables".to_string()
}

fn default_max_connections() -> u32 {
    1
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            database: default_database(),
            max_connections: default_max_connections(),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Liveness probe timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// How long ping waits for a reply
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,

    /// Hard limit on one probe call, process startup included
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_wait_ms() -> u64 {
    DEFAULT_PROBE_WAIT.as_millis() as u64
}

fn default_deadline_ms() -> u64 {
    DEFAULT_PROBE_DEADLINE.as_millis() as u64
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            wait_ms: default_wait_ms(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl ProbeConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Wait ping actually applies, in whole seconds
    pub fn effective_wait(&self) -> Duration {
        Duration::from_secs(ping_wait_secs(self.wait()))
    }
}

impl IpamConfig {
    /// Load configuration from environment variables
    ///
    /// `IPAM_DB_USER` and `IPAM_DB_PASSWORD` are required. `IPAM_DB_HOST`,
    /// `IPAM_DB_PORT`, `IPAM_DB_NAME`, `IPAM_PROBE_WAIT_MS` and
    /// `IPAM_PROBE_DEADLINE_MS` fall back to defaults.
    pub fn from_env() -> IpamResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> IpamResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| IpamError::Configuration(format!("{} not set", name)))
        };

        let store = StoreConfig {
            host: lookup("IPAM_DB_HOST").unwrap_or_else(default_host),
            port: parse_var(&lookup, "IPAM_DB_PORT")?.unwrap_or_else(default_port),
            username: required("IPAM_DB_USER")?,
            password: required("IPAM_DB_PASSWORD")?,
            database: lookup("IPAM_DB_NAME").unwrap_or_else(default_database),
            max_connections: default_max_connections(),
        };

        let probe = ProbeConfig {
            wait_ms: parse_var(&lookup, "IPAM_PROBE_WAIT_MS")?.unwrap_or_else(default_wait_ms),
            deadline_ms: parse_var(&lookup, "IPAM_PROBE_DEADLINE_MS")?
                .unwrap_or_else(default_deadline_ms),
        };

        let config = Self { store, probe };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> IpamResult<()> {
        if self.probe.wait_ms == 0 || self.probe.deadline_ms == 0 {
            return Err(IpamError::Configuration(
                "probe wait and deadline must be non-zero".to_string(),
            ));
        }
        // ping rounds the wait up to whole seconds
        let effective_wait = self.probe.effective_wait();
        if self.probe.deadline() <= effective_wait {
            return Err(IpamError::Configuration(format!(
                "probe deadline ({} ms) does not exceed the effective probe wait ({} ms)",
                self.probe.deadline_ms,
                effective_wait.as_millis()
            )));
        }
        if self.store.max_connections == 0 {
            return Err(IpamError::Configuration(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> IpamResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            IpamError::Configuration(format!("{} is not a valid number: {}", name, raw))
        }),
    }
}
