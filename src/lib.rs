// Copyright (c) 2025 - Cowboy AI, Inc.
//! IPv4 address allocation and inventory reconciliation
//!
//! This crate manages the address inventory of a datacenter asset database:
//! it finds the next free address in a tagged network pool, with a live
//! network check, and keeps objects, ports, links and allocations
//! idempotently in sync with a desired configuration.
//!
//! # Components
//!
//! - [`store`]: the [`AddressSpaceStore`] capability and an in-memory store
//! - [`resolver`]: tag intersection over networks
//! - [`probe`]: liveness probing ([`PingProber`], [`StaticProber`])
//! - [`scanner`]: next-free-address scan
//! - [`reconcile`]: generic observe/diff/decide/apply
//! - [`service`]: caller-facing operations and the JSON protocol
//! - [`adapters`]: RackTables MySQL store (feature `racktables`)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod probe;
pub mod reconcile;
pub mod resolver;
pub mod scanner;
pub mod service;
pub mod state_machine;
pub mod store;

// Re-export commonly used types
pub use config::{IpamConfig, ProbeConfig, StoreConfig};
pub use errors::{IpamError, IpamResult};
pub use probe::{LivenessProber, PingProber, ProbeError, StaticProber};
pub use reconcile::{Desired, ReconcileOutcome, Reconciler, ResourceDescriptor, ResourceKind};
pub use resolver::{PoolResolution, TagResolver};
pub use scanner::AllocationScanner;
pub use service::{AddressManagement, IpamService, ReconcileReport, ReconcileRequest};
pub use store::{AddressSpaceStore, InMemoryStore, StoreError};
