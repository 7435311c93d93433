// Copyright (c) 2025 - Cowboy AI, Inc.
//! IPAM Domain Models
//!
//! Value objects and records for the datacenter address inventory.
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Network`] - Canonical IPv4 network with prefix math
//! - [`MacAddress`] - 48-bit L2 address, compared by octets
//! - [`VlanId`] - IEEE 802.1Q VLAN ID (1-4094)
//!
//! # Store-Owned Records
//!
//! - [`Network`], [`TagSet`], [`Vlan`] - provisioned out-of-band, read-only here
//!
//! # Managed Resources
//!
//! - [`Object`], [`Port`], [`Link`], [`Allocation`] - reconciled by natural key

pub mod network;
pub mod pool;
pub mod resources;
pub mod views;

pub use network::{Ipv4Network, MacAddress, NetworkError, VlanId};
pub use pool::{Network, NetworkId, TagSet, Vlan};
pub use resources::{
    normalize_text, Allocation, AllocationKey, AllocationType, Link, Object, Port, PortKey,
    DEFAULT_INNER_INTERFACE, DEFAULT_OBJECT_TYPE, DEFAULT_OUTER_INTERFACE,
};
pub use views::{AddressDescriptor, AddressView, NetworkView, ObjectView, VlanView};
