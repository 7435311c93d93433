// Copyright (c) 2025 - Cowboy AI, Inc.
//! IPAM Runner
//!
//! Executes one address management request against a RackTables database.
//!
//! Reads a JSON request from stdin, writes a JSON result to stdout. Logs go
//! to stderr so stdout carries only the result.
//!
//! Run with: cargo run --bin cim-ipam --features racktables < request.json
//!
//! Prerequisites:
//! 1. RackTables MySQL database reachable (IPAM_DB_HOST, IPAM_DB_PORT, IPAM_DB_NAME)
//! 2. Credentials set (IPAM_DB_USER, IPAM_DB_PASSWORD)
//! 3. `ping` available to this user for liveness probes

use anyhow::{Context, Result};
use cim_ipam::{
    adapters::RackTablesStore,
    service::{dispatch, ErrorReport, IpamService, Request},
    IpamConfig, IpamResult, PingProber,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info};

async fn execute(input: &str) -> IpamResult<Value> {
    let request: Request = serde_json::from_str(input)?;
    info!("📋 Request: {}", request.operation());

    let config = IpamConfig::from_env()?;
    debug!(?config, "Configuration loaded");

    let store = Arc::new(RackTablesStore::connect(&config.store).await?);
    info!("✅ Connected to RackTables at {}", config.store.host);

    let prober = Arc::new(PingProber::new(config.probe.wait()));
    let service = IpamService::new(store, prober).with_probe_deadline(config.probe.deadline());

    dispatch(&service, request).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;

    match execute(&input).await {
        Ok(result) => {
            let rendered =
                serde_json::to_string_pretty(&result).context("Failed to render result")?;
            println!("{}", rendered);
            Ok(())
        }
        Err(err) => {
            error!(kind = err.kind(), "❌ {}", err);
            let rendered = serde_json::to_string(&ErrorReport::from(&err))
                .context("Failed to render error report")?;
            println!("{}", rendered);
            std::process::exit(1);
        }
    }
}
