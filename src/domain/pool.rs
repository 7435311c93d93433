// Copyright (c) 2025 - Cowboy AI, Inc.
//! Address Pools: tagged networks and their VLAN bindings

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::network::{Ipv4Network, VlanId};

/// Store-assigned network identifier
pub type NetworkId = u64;

/// Set of tag labels carried by a network
///
/// Matching is on exact labels: carrying a child tag in the tag tree does
/// not imply carrying its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        self.0.insert(label.into())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of `required` labels present in this set
    pub fn match_count<S: AsRef<str>>(&self, required: &[S]) -> usize {
        required
            .iter()
            .filter(|label| self.contains(label.as_ref()))
            .count()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A provisioned IPv4 network
///
/// Networks are owned by the store and read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    pub network: Ipv4Network,
    pub name: String,
    #[serde(default)]
    pub tags: TagSet,
}

impl Network {
    pub fn new(id: NetworkId, network: Ipv4Network, name: impl Into<String>) -> Self {
        Self {
            id,
            network,
            name: name.into(),
            tags: TagSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.tags.insert(tag);
        }
        self
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.network, self.name)
    }
}

/// A VLAN within a VLAN domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub domain: String,
    pub id: VlanId,
    pub description: String,
}
