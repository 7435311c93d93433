// Copyright (c) 2025 - Cowboy AI, Inc.
//! Address Space Store Abstraction
//!
//! This module defines the read/write interface to the asset database that
//! backs every allocation scan and reconciliation.
//!
//! # Architecture
//!
//! ```text
//! TagResolver ─┐
//!              ├──> AddressSpaceStore ──> InMemoryStore
//! Scanner ─────┤                     └──> RackTablesStore (feature "racktables")
//! Reconciler ──┘
//! ```
//!
//! # Store Requirements
//!
//! 1. **Atomic mutations**: each create/update/delete lands whole or not at all
//! 2. **Natural-key uniqueness**: a create racing another create on the same
//!    key fails with [`StoreError::Conflict`]
//! 3. **Ambiguity is an error**: a natural-key lookup that matches more than
//!    one row fails with [`StoreError::Duplicate`] instead of picking one
//! 4. **No cross-call transactions**: callers never hold a transaction open
//!    between observe and apply

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

use crate::domain::{
    Allocation, AllocationKey, Link, Network, NetworkId, Object, Port, PortKey, Vlan, VlanId,
};

pub mod memory;

pub use memory::InMemoryStore;

/// Backing store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Statement failed to execute or returned malformed data
    #[error("query failed: {0}")]
    Query(String),

    /// Uniqueness constraint rejected a mutation
    #[error("conflict on {key}: {reason}")]
    Conflict { key: String, reason: String },

    /// Natural-key lookup matched more than one row
    #[error("{key} matched {count} records")]
    Duplicate { key: String, count: usize },

    /// Mutation targeted a row that does not exist
    #[error("{entity} '{key}' does not exist")]
    Missing { entity: &'static str, key: String },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Which compatibility table a pair is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityTable {
    /// (inner interface, outer interface) pairs a port may combine
    PortInterface,
    /// (parent object type, child object type) pairs a link may join
    ObjectParent,
}

impl fmt::Display for CompatibilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatibilityTable::PortInterface => f.write_str("port interface"),
            CompatibilityTable::ObjectParent => f.write_str("object parent"),
        }
    }
}

/// What occupies an address in the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddressUse {
    /// Bound to an object's interface
    Allocated(Allocation),
    /// Recorded in the static address table (reserved or named, no owner)
    Static { name: Option<String> },
}

/// Read/write access to networks, tags, allocations and inventory records
///
/// Lookups are keyed by natural keys. Implementations must be usable
/// concurrently from independent invocations, but the engine itself never
/// issues overlapping calls within one operation.
#[async_trait]
pub trait AddressSpaceStore: Send + Sync {
    // ------------------------------------------------------------------
    // Pools
    // ------------------------------------------------------------------

    /// Networks carrying at least one of `tags`, in stable store order
    ///
    /// Each tag's membership is evaluated independently. The returned
    /// [`Network::tags`] must contain every requested label the network
    /// carries; intersection is left to the caller.
    async fn find_networks_by_tags(&self, tags: &[String]) -> StoreResult<Vec<Network>>;

    /// VLAN bound to a network, if any
    async fn find_vlan_for_network(&self, network_id: NetworkId) -> StoreResult<Option<VlanId>>;

    /// Most specific (longest prefix) network containing `address`
    async fn find_network_containing(&self, address: Ipv4Addr) -> StoreResult<Option<Network>>;

    /// VLANs defined in a VLAN domain
    async fn list_vlans(&self, domain: &str) -> StoreResult<Vec<Vlan>>;

    // ------------------------------------------------------------------
    // Allocations
    // ------------------------------------------------------------------

    /// Any record occupying `address`, across allocations and static addresses
    async fn find_allocation(&self, address: Ipv4Addr) -> StoreResult<Option<AddressUse>>;

    async fn find_allocation_by_key(&self, key: &AllocationKey)
        -> StoreResult<Option<Allocation>>;

    async fn allocations_for_object(&self, object: &str) -> StoreResult<Vec<Allocation>>;

    async fn create_allocation(&self, allocation: &Allocation) -> StoreResult<()>;

    async fn update_allocation(&self, allocation: &Allocation) -> StoreResult<()>;

    async fn delete_allocation(&self, key: &AllocationKey) -> StoreResult<()>;

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    async fn find_object(&self, name: &str) -> StoreResult<Option<Object>>;

    /// Whether the object type dictionary knows `object_type`
    async fn has_object_type(&self, object_type: &str) -> StoreResult<bool>;

    async fn create_object(&self, object: &Object) -> StoreResult<()>;

    async fn update_object(&self, object: &Object) -> StoreResult<()>;

    async fn delete_object(&self, name: &str) -> StoreResult<()>;

    // ------------------------------------------------------------------
    // Ports
    // ------------------------------------------------------------------

    async fn find_port(&self, key: &PortKey) -> StoreResult<Option<Port>>;

    async fn create_port(&self, port: &Port) -> StoreResult<()>;

    async fn update_port(&self, port: &Port) -> StoreResult<()>;

    async fn delete_port(&self, key: &PortKey) -> StoreResult<()>;

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    async fn find_link(&self, link: &Link) -> StoreResult<Option<Link>>;

    async fn create_link(&self, link: &Link) -> StoreResult<()>;

    async fn delete_link(&self, link: &Link) -> StoreResult<()>;

    // ------------------------------------------------------------------
    // Compatibility
    // ------------------------------------------------------------------

    /// Whether `(kind_a, kind_b)` appears in `table`
    async fn check_compatibility(
        &self,
        table: CompatibilityTable,
        kind_a: &str,
        kind_b: &str,
    ) -> StoreResult<bool>;
}

/// Collapse a natural-key lookup result, failing on ambiguity
pub fn at_most_one<T>(mut rows: Vec<T>, key: impl fmt::Display) -> StoreResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        count => Err(StoreError::Duplicate {
            key: key.to_string(),
            count,
        }),
    }
}
