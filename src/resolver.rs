// Copyright (c) 2025 - Cowboy AI, Inc.
//! Tag Resolver
//!
//! Maps a set of required tags to the pool of networks carrying all of them.
//! The store answers each tag's membership independently; the resolver keeps
//! only networks whose match count equals the number of required tags.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::Network;
use crate::errors::{IpamError, IpamResult};
use crate::store::AddressSpaceStore;

/// Outcome of a tag query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolResolution {
    /// Networks carrying every required tag, in store order
    Matched(Vec<Network>),
    /// No network carries every required tag
    Empty,
}

impl PoolResolution {
    pub fn is_empty(&self) -> bool {
        matches!(self, PoolResolution::Empty)
    }

    pub fn networks(&self) -> &[Network] {
        match self {
            PoolResolution::Matched(networks) => networks,
            PoolResolution::Empty => &[],
        }
    }

    pub fn into_networks(self) -> Vec<Network> {
        match self {
            PoolResolution::Matched(networks) => networks,
            PoolResolution::Empty => Vec::new(),
        }
    }
}

/// Canonical required-tag list: trimmed, blanks dropped, first occurrence kept
///
/// An empty result is a configuration error.
pub fn required_tags<S: AsRef<str>>(tags: &[S]) -> IpamResult<Vec<String>> {
    let mut required: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !required.iter().any(|t| t == tag) {
            required.push(tag.to_string());
        }
    }

    if required.is_empty() {
        return Err(IpamError::Configuration(
            "at least one tag is required to select a pool".to_string(),
        ));
    }
    Ok(required)
}

/// Resolves required tags to matching networks
pub struct TagResolver<S: AddressSpaceStore + ?Sized> {
    store: Arc<S>,
}

impl<S: AddressSpaceStore + ?Sized> TagResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Networks whose tag set is a superset of `tags`
    #[instrument(skip(self))]
    pub async fn resolve<T>(&self, tags: &[T]) -> IpamResult<PoolResolution>
    where
        T: AsRef<str> + std::fmt::Debug + Sync,
    {
        let required = required_tags(tags)?;
        let candidates = self.store.find_networks_by_tags(&required).await?;
        let candidate_count = candidates.len();

        let matched: Vec<Network> = candidates
            .into_iter()
            .filter(|n| n.tags.match_count(&required) == required.len())
            .collect();

        debug!(
            candidates = candidate_count,
            matched = matched.len(),
            "resolved pool for tags {:?}",
            required
        );

        if matched.is_empty() {
            Ok(PoolResolution::Empty)
        } else {
            Ok(PoolResolution::Matched(matched))
        }
    }
}
