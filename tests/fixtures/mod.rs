// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-ipam
//!
//! Provides a deterministic, seeded address space for integration tests.
//! Every network, VLAN, object and compatibility entry is a fixed constant
//! so tests are reproducible.
//!
//! # Seeded Layout
//!
//! | id | network       | tags          | VLAN |
//! |----|---------------|---------------|------|
//! | 1  | 10.0.0.0/24   | LAB1, trust   | 100  |
//! | 2  | 10.0.1.0/24   | LAB1          | 101  |
//! | 3  | 10.0.2.0/30   | tiny          | 102  |
//! | 4  | 10.0.3.0/24   | orphan        | none |
//!
//! In [`lab`], object `h1` (Server) holds `eth0` = 10.0.0.3 and sits in
//! `rack1` (Rack).

#![allow(dead_code)]

use std::net::Ipv4Addr;
use std::sync::Arc;

use cim_ipam::domain::{Allocation, Ipv4Network, Link, Network, Object, Port, Vlan, VlanId};
use cim_ipam::store::CompatibilityTable;
use cim_ipam::{InMemoryStore, IpamService, StaticProber};

pub const VLAN_DOMAIN: &str = "default";

pub const TRUST_VLAN: u16 = 100;
pub const MGMT_VLAN: u16 = 101;
pub const TINY_VLAN: u16 = 102;

/// Parse a fixed address
pub fn addr(s: &str) -> Ipv4Addr {
    s.parse().expect("Invalid address in test fixture")
}

pub fn vlan(id: u16) -> VlanId {
    VlanId::new(id).expect("Invalid VLAN in test fixture")
}

/// Network with a fixed id and tag set
pub fn network(id: u64, cidr: &str, name: &str, tags: &[&str]) -> Network {
    Network::new(
        id,
        Ipv4Network::from_cidr(cidr).expect("Invalid CIDR in test fixture"),
        name,
    )
    .with_tags(tags.iter().copied())
}

/// Networks, VLANs, object types and compatibility rules; no inventory
pub fn empty_lab() -> InMemoryStore {
    InMemoryStore::new()
        .with_network(
            network(1, "10.0.0.0/24", "lab1-trust", &["LAB1", "trust"]),
            Some(vlan(TRUST_VLAN)),
        )
        .with_network(
            network(2, "10.0.1.0/24", "lab1-mgmt", &["LAB1"]),
            Some(vlan(MGMT_VLAN)),
        )
        .with_network(
            network(3, "10.0.2.0/30", "p2p", &["tiny"]),
            Some(vlan(TINY_VLAN)),
        )
        .with_network(network(4, "10.0.3.0/24", "unbound", &["orphan"]), None)
        .with_vlan(Vlan {
            domain: VLAN_DOMAIN.to_string(),
            id: vlan(TRUST_VLAN),
            description: "lab trust".to_string(),
        })
        .with_vlan(Vlan {
            domain: VLAN_DOMAIN.to_string(),
            id: vlan(MGMT_VLAN),
            description: "lab mgmt".to_string(),
        })
        .with_vlan(Vlan {
            domain: "backbone".to_string(),
            id: vlan(TINY_VLAN),
            description: "p2p".to_string(),
        })
        .with_object_type("Server")
        .with_object_type("VM")
        .with_object_type("Rack")
        .with_compatibility(CompatibilityTable::PortInterface, "hardwired", "1000Base-T")
        .with_compatibility(CompatibilityTable::PortInterface, "SFP+", "10GBase-SR")
        .with_compatibility(CompatibilityTable::ObjectParent, "Rack", "Server")
        .with_compatibility(CompatibilityTable::ObjectParent, "Server", "VM")
}

/// The seeded lab with `rack1`, `h1` and h1's first address
pub fn lab() -> InMemoryStore {
    empty_lab()
        .with_object(Object::new("rack1", "Rack"))
        .with_object(
            Object::new("h1", "Server")
                .with_label("web")
                .with_comment("primary"),
        )
        .with_port(Port::new("h1", "eth0"))
        .with_link(Link::new("rack1", "h1"))
        .with_allocation(Allocation::new("h1", "eth0", addr("10.0.0.3")))
}

/// Service over a seeded store and a prober, with handles to both
pub fn service(
    store: InMemoryStore,
    prober: StaticProber,
) -> (
    IpamService<InMemoryStore, StaticProber>,
    Arc<InMemoryStore>,
    Arc<StaticProber>,
) {
    let store = Arc::new(store);
    let prober = Arc::new(prober);
    let service = IpamService::new(Arc::clone(&store), Arc::clone(&prober));
    (service, store, prober)
}

/// Owned tag list
pub fn tags(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|t| t.to_string()).collect()
}
