// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Inventory Records
//!
//! Objects, ports, parent/child links and address allocations are the
//! resources reconciled against the asset database. Each has a natural key
//! that identifies it within its kind.
//!
//! Optional text fields are normalized on construction and deserialization:
//! empty or whitespace-only strings become `None`. An unset field therefore
//! means "empty", and `None` equals `Some("")`. Unknown attributes are
//! rejected, so a misspelled field cannot pass for an unset one.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::network::MacAddress;

/// Default object type for new objects
pub const DEFAULT_OBJECT_TYPE: &str = "VM";

/// Default inner interface for new ports
pub const DEFAULT_INNER_INTERFACE: &str = "hardwired";

/// Default outer interface for new ports
pub const DEFAULT_OUTER_INTERFACE: &str = "1000Base-T";

/// Collapse empty text to `None`
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(normalize_text)
}

fn default_object_type() -> String {
    DEFAULT_OBJECT_TYPE.to_string()
}

fn default_inner_interface() -> String {
    DEFAULT_INNER_INTERFACE.to_string()
}

fn default_outer_interface() -> String {
    DEFAULT_OUTER_INTERFACE.to_string()
}

// ============================================================================
// Object
// ============================================================================

/// A managed asset, keyed by its unique name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Object {
    pub name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub label: Option<String>,
    #[serde(default = "default_object_type", rename = "type")]
    pub object_type: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub asset_tag: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub comment: Option<String>,
}

impl Object {
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            object_type: object_type.into(),
            asset_tag: None,
            comment: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = normalize_text(Some(label.into()));
        self
    }

    pub fn with_asset_tag(mut self, asset_tag: impl Into<String>) -> Self {
        self.asset_tag = normalize_text(Some(asset_tag.into()));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = normalize_text(Some(comment.into()));
        self
    }
}

// ============================================================================
// Port
// ============================================================================

/// Natural key of a port: owning object + port name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortKey {
    pub object: String,
    pub name: String,
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object, self.name)
    }
}

/// A port on an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Port {
    pub object: String,
    pub name: String,
    #[serde(default = "default_inner_interface")]
    pub inner_interface: String,
    #[serde(default = "default_outer_interface")]
    pub outer_interface: String,
    #[serde(default)]
    pub l2_address: Option<MacAddress>,
    #[serde(default, deserialize_with = "optional_text")]
    pub reservation: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub label: Option<String>,
}

impl Port {
    /// Port with the default hardwired / 1000Base-T interface pair
    pub fn new(object: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            name: name.into(),
            inner_interface: default_inner_interface(),
            outer_interface: default_outer_interface(),
            l2_address: None,
            reservation: None,
            label: None,
        }
    }

    pub fn with_interfaces(mut self, inner: impl Into<String>, outer: impl Into<String>) -> Self {
        self.inner_interface = inner.into();
        self.outer_interface = outer.into();
        self
    }

    pub fn with_l2_address(mut self, mac: MacAddress) -> Self {
        self.l2_address = Some(mac);
        self
    }

    pub fn with_reservation(mut self, reservation: impl Into<String>) -> Self {
        self.reservation = normalize_text(Some(reservation.into()));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = normalize_text(Some(label.into()));
        self
    }

    pub fn key(&self) -> PortKey {
        PortKey {
            object: self.object.clone(),
            name: self.name.clone(),
        }
    }
}

// ============================================================================
// Link
// ============================================================================

/// Directed parent → child relationship between two objects
///
/// The pair is both the natural key and the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub parent: String,
    pub child: String,
}

impl Link {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.parent, self.child)
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// How an address is bound to an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationType {
    #[default]
    Regular,
    Shared,
    Virtual,
    Router,
    #[serde(rename = "point2point")]
    PointToPoint,
}

impl AllocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationType::Regular => "regular",
            AllocationType::Shared => "shared",
            AllocationType::Virtual => "virtual",
            AllocationType::Router => "router",
            AllocationType::PointToPoint => "point2point",
        }
    }
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(AllocationType::Regular),
            "shared" => Ok(AllocationType::Shared),
            "virtual" => Ok(AllocationType::Virtual),
            "router" => Ok(AllocationType::Router),
            "point2point" => Ok(AllocationType::PointToPoint),
            other => Err(format!("unknown allocation type: {}", other)),
        }
    }
}

/// Natural key of an allocation: owning object + interface name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationKey {
    pub object: String,
    pub interface: String,
}

impl fmt::Display for AllocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object, self.interface)
    }
}

/// An IPv4 address bound to an object's interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Allocation {
    pub object: String,
    pub interface: String,
    pub address: Ipv4Addr,
    #[serde(default, rename = "type")]
    pub allocation_type: AllocationType,
}

impl Allocation {
    pub fn new(object: impl Into<String>, interface: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            object: object.into(),
            interface: interface.into(),
            address,
            allocation_type: AllocationType::Regular,
        }
    }

    pub fn with_type(mut self, allocation_type: AllocationType) -> Self {
        self.allocation_type = allocation_type;
        self
    }

    pub fn key(&self) -> AllocationKey {
        AllocationKey {
            object: self.object.clone(),
            interface: self.interface.clone(),
        }
    }
}
