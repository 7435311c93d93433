// Copyright (c) 2025 - Cowboy AI, Inc.
//! Read models returned to callers

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use super::network::{Ipv4Network, VlanId};

/// The next free address in a pool, with everything needed to configure it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDescriptor {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub network: Ipv4Network,
    #[serde(rename = "netname")]
    pub network_name: String,
    pub vlan: VlanId,
}

/// A network matched by tag query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkView {
    pub network: Ipv4Network,
    pub name: String,
    pub vlan: VlanId,
}

/// A VLAN within a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanView {
    pub tag: VlanId,
    pub name: String,
}

/// An allocation expanded against its most specific network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressView {
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Option<Ipv4Addr>,
    pub netname: String,
    pub ifname: String,
    pub vlan: VlanId,
}

/// An object together with its addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectView {
    pub name: String,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub object_type: String,
    pub asset_tag: Option<String>,
    pub comment: Option<String>,
    pub addresses: Vec<AddressView>,
}
