// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Next-Free Scan
//!
//! A /27 has 30 usable hosts. Any subset of them may already be recorded;
//! the scan must return the lowest host past the reserved slots that has
//! no record, or report exhaustion when there is none.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use cim_ipam::domain::{Allocation, Object};
use cim_ipam::scanner::{AllocationScanner, RESERVED_HOSTS};
use cim_ipam::{InMemoryStore, IpamError, StaticProber};
use proptest::prelude::*;

use crate::fixtures::*;

const USABLE: usize = 30;

/// Usable host `index` of 10.20.0.0/27, counting from .1
fn host(index: usize) -> Ipv4Addr {
    Ipv4Addr::new(10, 20, 0, 1 + index as u8)
}

fn occupied_store(recorded: &BTreeSet<usize>, statics: &BTreeSet<usize>) -> InMemoryStore {
    let mut store = InMemoryStore::new()
        .with_network(
            network(20, "10.20.0.0/27", "prop", &["prop"]),
            Some(vlan(TRUST_VLAN)),
        )
        .with_object(Object::new("filler", "Server"));

    for index in recorded {
        store = store.with_allocation(Allocation::new(
            "filler",
            format!("eth{}", index),
            host(*index),
        ));
    }
    for index in statics {
        store = store.with_static_address(host(*index), None);
    }
    store
}

/// Subset of host indexes, each present with probability `weight`
fn occupancy(weight: f64) -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::vec(prop::bool::weighted(weight), USABLE).prop_map(|picks| {
        picks
            .into_iter()
            .enumerate()
            .filter_map(|(i, taken)| taken.then_some(i))
            .collect()
    })
}

proptest! {
    /// Property: The scan returns the lowest free, unreserved host
    ///
    /// Reserved and recorded hosts are never returned and never probed.
    #[test]
    fn prop_scan_returns_lowest_free_host(
        recorded in occupancy(0.8),
        statics in occupancy(0.5)
    ) {
        let store = Arc::new(occupied_store(&recorded, &statics));
        let prober = Arc::new(StaticProber::silent());
        let scanner = AllocationScanner::new(Arc::clone(&store), Arc::clone(&prober));

        let expected = (RESERVED_HOSTS..USABLE)
            .find(|i| !recorded.contains(i) && !statics.contains(i))
            .map(host);

        let result = tokio_test::block_on(scanner.allocate_next_free(&["prop"]));

        match expected {
            Some(address) => {
                let next = result.unwrap();
                prop_assert_eq!(next.address, address);
                prop_assert!(next.network.contains(next.address));
                prop_assert_eq!(prober.probed(), vec![address]);
            }
            None => {
                let is_exhausted = matches!(result, Err(IpamError::Exhausted { .. }));
                prop_assert!(is_exhausted);
                prop_assert!(prober.probed().is_empty());
            }
        }
    }

    /// Property: Scanning never writes to the store
    #[test]
    fn prop_scan_is_read_only(recorded in occupancy(0.5)) {
        let store = Arc::new(occupied_store(&recorded, &BTreeSet::new()));
        let scanner = AllocationScanner::new(Arc::clone(&store), Arc::new(StaticProber::silent()));

        let _ = tokio_test::block_on(scanner.allocate_next_free(&["prop"]));

        prop_assert_eq!(store.mutation_count(), 0);
        prop_assert_eq!(store.allocations().len(), recorded.len());
    }
}
