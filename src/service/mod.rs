// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Address Management
//!
//! This module provides the caller-facing operations, composed from the
//! engine components.
//!
//! # Architecture
//!
//! ```text
//! Client Request (typed, or JSON via `protocol`)
//!     ↓
//! Service Layer (this module)
//!     ├── allocate_next_free ──> AllocationScanner ──> TagResolver
//!     │                                   └──────────> LivenessProber
//!     ├── reconcile ───────────> Reconciler ──> ResourceDescriptor
//!     └── list_networks / list_vlans / describe_object
//!     ↓
//! AddressSpaceStore (in-memory or RackTables)
//! ```
//!
//! # Design Principles
//!
//! 1. **One Operation per Call**: no batch spanning resources
//! 2. **No Retries**: every failure is reported as-is
//! 3. **Store-Enforced Uniqueness**: racing creates surface as conflicts
//! 4. **Async by Default**: All I/O is asynchronous
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_ipam::service::{AddressManagement, IpamService};
//!
//! let service = IpamService::new(store, prober);
//! let next = service.allocate_next_free(&["LAB1".into(), "trust".into()]).await?;
//! println!("{} via {} on VLAN {}", next.address, next.gateway, next.vlan);
//! ```

pub mod ipam;
pub mod protocol;
pub mod request;

pub use ipam::{AddressManagement, IpamService};
pub use protocol::{dispatch, ErrorReport, Request};
pub use request::{ReconcileReport, ReconcileRequest};
