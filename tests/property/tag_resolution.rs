// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Tag Resolution
//!
//! The store answers with the union of networks carrying any requested
//! tag; the resolver must narrow that to exactly the networks carrying all
//! of them, in store order.

use std::collections::BTreeSet;
use std::sync::Arc;

use cim_ipam::domain::Network;
use cim_ipam::{InMemoryStore, TagResolver};
use proptest::prelude::*;

use crate::fixtures::*;

const LABELS: [&str; 4] = ["LAB1", "LAB2", "trust", "mgmt"];

/// Tag labels picked by index
fn labels(picks: &BTreeSet<usize>) -> Vec<&'static str> {
    picks.iter().map(|i| LABELS[*i]).collect()
}

/// Up to eight networks, each carrying an arbitrary tag subset
fn tagged_networks() -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    prop::collection::vec(prop::collection::btree_set(0..LABELS.len(), 0..=LABELS.len()), 0..8)
}

fn required() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..LABELS.len(), 1..=LABELS.len())
}

fn build(layout: &[BTreeSet<usize>]) -> (InMemoryStore, Vec<Network>) {
    let networks: Vec<Network> = layout
        .iter()
        .enumerate()
        .map(|(i, picks)| {
            network(
                i as u64 + 1,
                &format!("10.{}.0.0/24", i),
                &format!("net{}", i),
                &labels(picks),
            )
        })
        .collect();

    let store = networks
        .iter()
        .cloned()
        .fold(InMemoryStore::new(), |store, n| store.with_network(n, None));
    (store, networks)
}

proptest! {
    /// Property: Resolution is an exact superset filter in store order
    #[test]
    fn prop_resolution_is_superset_filter(layout in tagged_networks(), wanted in required()) {
        let (store, networks) = build(&layout);
        let resolver = TagResolver::new(Arc::new(store));
        let wanted = labels(&wanted);

        let expected: Vec<u64> = networks
            .iter()
            .filter(|n| wanted.iter().all(|t| n.tags.contains(t)))
            .map(|n| n.id)
            .collect();

        let resolution = tokio_test::block_on(resolver.resolve(wanted.as_slice())).unwrap();
        let ids: Vec<u64> = resolution.networks().iter().map(|n| n.id).collect();

        prop_assert_eq!(resolution.is_empty(), expected.is_empty());
        prop_assert_eq!(ids, expected);
    }

    /// Property: Repeating a tag does not change the pool
    #[test]
    fn prop_repeated_tags_are_idempotent(layout in tagged_networks(), wanted in required()) {
        let (store, _) = build(&layout);
        let resolver = TagResolver::new(Arc::new(store));
        let once = labels(&wanted);
        let twice: Vec<&str> = once.iter().chain(once.iter()).copied().collect();

        let a = tokio_test::block_on(resolver.resolve(once.as_slice())).unwrap();
        let b = tokio_test::block_on(resolver.resolve(twice.as_slice())).unwrap();

        prop_assert_eq!(a, b);
    }
}
