// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for idempotent reconciliation
//!
//! These tests verify the complete flow for each resource kind:
//! 1. Observe the stored record under the natural key
//! 2. Diff it against the desired record
//! 3. Decide create / update / delete / noop
//! 4. Validate, then apply unless dry-running
//!
//! Re-running any converged reconciliation must be a noop.

mod fixtures;

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cim_ipam::domain::{
    Allocation, AllocationKey, AllocationType, Link, MacAddress, Network, NetworkId, Object, Port,
    PortKey, Vlan, VlanId,
};
use cim_ipam::reconcile::{
    AllocationResource, FieldChange, LinkResource, ObjectResource, PortResource,
};
use cim_ipam::state_machine::Action;
use cim_ipam::store::{AddressSpaceStore, AddressUse, CompatibilityTable, StoreResult};
use cim_ipam::{Desired, InMemoryStore, IpamError, Reconciler, ResourceKind, StaticProber};
use pretty_assertions::assert_eq;
use serde_json::json;

use fixtures::*;

// ============================================================================
// Objects
// ============================================================================

/// Test: Create converges, and the second run is a noop
#[tokio::test]
async fn test_object_create_is_idempotent() {
    let (service, store, _) = service(empty_lab(), StaticProber::silent());
    let desired = Object::new("db1", "Server").with_label("database");

    let first = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();

    assert_eq!(first.kind, ResourceKind::Object);
    assert_eq!(first.key, "db1");
    assert_eq!(first.action, Action::Create);
    assert!(first.changed);
    assert_eq!(first.before, None);
    assert_eq!(first.after, Some(desired.clone()));

    let second = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();

    assert_eq!(second.action, Action::Noop);
    assert!(!second.changed);
    assert!(second.changes.is_empty());
    assert_eq!(second.after, Some(desired));
    assert_ne!(first.operation_id, second.operation_id);
    assert_eq!(store.mutation_count(), 1);
}

/// Test: Only the comment differs, so only the comment is reported
#[tokio::test]
async fn test_object_comment_change_is_update() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired = Object::new("h1", "Server")
        .with_label("web")
        .with_comment("secondary");

    let outcome = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Update);
    assert_eq!(
        outcome.changes,
        vec![FieldChange {
            field: "comment".to_string(),
            before: json!("primary"),
            after: json!("secondary"),
        }]
    );
    assert!(store.objects().contains(&desired));
}

/// Test: An unset optional field clears the stored value
#[tokio::test]
async fn test_object_unset_field_clears_stored_value() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired = Object::new("h1", "Server").with_label("web");

    let outcome = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Present(desired), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Update);
    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].after, serde_json::Value::Null);

    let h1 = store.objects().into_iter().find(|o| o.name == "h1").unwrap();
    assert_eq!(h1.comment, None);
}

#[tokio::test]
async fn test_object_dry_run_reports_without_writing() {
    let (service, store, _) = service(empty_lab(), StaticProber::silent());

    let outcome = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Present(Object::new("db1", "VM")), true)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Create);
    assert!(outcome.changed);
    assert!(outcome.dry_run);
    assert_eq!(store.mutation_count(), 0);
    assert!(store.objects().is_empty());
}

/// Test: Validation runs in a dry run too
#[tokio::test]
async fn test_object_unknown_type_fails_even_in_dry_run() {
    let (service, store, _) = service(empty_lab(), StaticProber::silent());

    for dry_run in [true, false] {
        let err = service
            .reconciler()
            .reconcile::<ObjectResource>(Desired::Present(Object::new("t1", "Toaster")), dry_run)
            .await
            .unwrap_err();
        assert!(matches!(err, IpamError::NotFound { entity: "object type", .. }));
    }
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_object_delete_removes_dependents() {
    let (service, store, _) = service(lab(), StaticProber::silent());

    let outcome = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Absent("h1".to_string()), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Delete);
    assert!(outcome.before.is_some());
    assert_eq!(outcome.after, None);
    assert!(store.objects().iter().all(|o| o.name != "h1"));
    assert!(store.allocations().is_empty());
    assert!(store.ports().is_empty());
    assert!(store.links().is_empty());
}

#[tokio::test]
async fn test_delete_of_absent_object_is_noop() {
    let (service, store, _) = service(lab(), StaticProber::silent());

    let outcome = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Absent("ghost".to_string()), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Noop);
    assert!(!outcome.changed);
    assert_eq!(outcome.before, None);
    assert_eq!(store.mutation_count(), 0);
}

/// Test: Two objects share a name, so the key is ambiguous
#[tokio::test]
async fn test_duplicate_object_is_integrity_conflict() {
    let store = lab().with_object(Object::new("h1", "VM"));
    let (service, store, _) = service(store, StaticProber::silent());

    let err = service
        .reconciler()
        .reconcile::<ObjectResource>(Desired::Present(Object::new("h1", "Server")), false)
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::IntegrityConflict { .. }));
    assert_eq!(store.mutation_count(), 0);
}

/// Test: A row written by someone else between observe and apply is a conflict
///
/// The reconciler reports it and does not retry the create.
#[tokio::test]
async fn test_object_created_concurrently_is_integrity_conflict() {
    let rival = Object::new("db1", "VM").with_label("other writer");
    let store = Arc::new(RacingStore::new(empty_lab(), rival.clone()));
    let reconciler = Reconciler::new(Arc::clone(&store));

    let err = reconciler
        .reconcile::<ObjectResource>(Desired::Present(Object::new("db1", "Server")), false)
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::IntegrityConflict { .. }));
    assert!(store.seeded.load(Ordering::SeqCst));
    assert_eq!(store.create_attempts.load(Ordering::SeqCst), 1);
    assert_eq!(store.inner.objects(), vec![rival]);
}

/// Store whose first object lookup lets a rival writer in right after it
///
/// The lookup still answers with what it saw, so the following create
/// collides with the rival's row.
struct RacingStore {
    inner: InMemoryStore,
    rival: Object,
    seeded: AtomicBool,
    create_attempts: AtomicU64,
}

impl RacingStore {
    fn new(inner: InMemoryStore, rival: Object) -> Self {
        Self {
            inner,
            rival,
            seeded: AtomicBool::new(false),
            create_attempts: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl AddressSpaceStore for RacingStore {
    async fn find_networks_by_tags(&self, tags: &[String]) -> StoreResult<Vec<Network>> {
        self.inner.find_networks_by_tags(tags).await
    }

    async fn find_vlan_for_network(&self, network_id: NetworkId) -> StoreResult<Option<VlanId>> {
        self.inner.find_vlan_for_network(network_id).await
    }

    async fn find_network_containing(&self, address: Ipv4Addr) -> StoreResult<Option<Network>> {
        self.inner.find_network_containing(address).await
    }

    async fn list_vlans(&self, domain: &str) -> StoreResult<Vec<Vlan>> {
        self.inner.list_vlans(domain).await
    }

    async fn find_allocation(&self, address: Ipv4Addr) -> StoreResult<Option<AddressUse>> {
        self.inner.find_allocation(address).await
    }

    async fn find_allocation_by_key(
        &self,
        key: &AllocationKey,
    ) -> StoreResult<Option<Allocation>> {
        self.inner.find_allocation_by_key(key).await
    }

    async fn allocations_for_object(&self, object: &str) -> StoreResult<Vec<Allocation>> {
        self.inner.allocations_for_object(object).await
    }

    async fn create_allocation(&self, allocation: &Allocation) -> StoreResult<()> {
        self.inner.create_allocation(allocation).await
    }

    async fn update_allocation(&self, allocation: &Allocation) -> StoreResult<()> {
        self.inner.update_allocation(allocation).await
    }

    async fn delete_allocation(&self, key: &AllocationKey) -> StoreResult<()> {
        self.inner.delete_allocation(key).await
    }

    async fn find_object(&self, name: &str) -> StoreResult<Option<Object>> {
        let seen = self.inner.find_object(name).await?;
        if !self.seeded.swap(true, Ordering::SeqCst) {
            self.inner.create_object(&self.rival).await?;
        }
        Ok(seen)
    }

    async fn has_object_type(&self, object_type: &str) -> StoreResult<bool> {
        self.inner.has_object_type(object_type).await
    }

    async fn create_object(&self, object: &Object) -> StoreResult<()> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.create_object(object).await
    }

    async fn update_object(&self, object: &Object) -> StoreResult<()> {
        self.inner.update_object(object).await
    }

    async fn delete_object(&self, name: &str) -> StoreResult<()> {
        self.inner.delete_object(name).await
    }

    async fn find_port(&self, key: &PortKey) -> StoreResult<Option<Port>> {
        self.inner.find_port(key).await
    }

    async fn create_port(&self, port: &Port) -> StoreResult<()> {
        self.inner.create_port(port).await
    }

    async fn update_port(&self, port: &Port) -> StoreResult<()> {
        self.inner.update_port(port).await
    }

    async fn delete_port(&self, key: &PortKey) -> StoreResult<()> {
        self.inner.delete_port(key).await
    }

    async fn find_link(&self, link: &Link) -> StoreResult<Option<Link>> {
        self.inner.find_link(link).await
    }

    async fn create_link(&self, link: &Link) -> StoreResult<()> {
        self.inner.create_link(link).await
    }

    async fn delete_link(&self, link: &Link) -> StoreResult<()> {
        self.inner.delete_link(link).await
    }

    async fn check_compatibility(
        &self,
        table: CompatibilityTable,
        kind_a: &str,
        kind_b: &str,
    ) -> StoreResult<bool> {
        self.inner.check_compatibility(table, kind_a, kind_b).await
    }
}

// ============================================================================
// Ports
// ============================================================================

#[tokio::test]
async fn test_port_create_is_idempotent() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired = Port::new("h1", "eth1")
        .with_interfaces("SFP+", "10GBase-SR")
        .with_l2_address(MacAddress::new("DE:AD:BE:EF:12:34").unwrap());

    let first = service
        .reconciler()
        .reconcile::<PortResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();
    let second = service
        .reconciler()
        .reconcile::<PortResource>(Desired::Present(desired), false)
        .await
        .unwrap();

    assert_eq!(first.action, Action::Create);
    assert_eq!(first.key, "h1/eth1");
    assert_eq!(second.action, Action::Noop);
    assert_eq!(store.mutation_count(), 1);
}

/// Test: MAC spelling differences are not drift
#[tokio::test]
async fn test_port_mac_spelling_is_not_drift() {
    let stored = Port::new("h1", "eth1").with_l2_address(MacAddress::new("DEADBEEF1234").unwrap());
    let (service, store, _) = service(lab().with_port(stored), StaticProber::silent());

    let desired =
        Port::new("h1", "eth1").with_l2_address(MacAddress::new("de-ad-be-ef-12-34").unwrap());
    let outcome = service
        .reconciler()
        .reconcile::<PortResource>(Desired::Present(desired), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Noop);
    assert_eq!(store.mutation_count(), 0);
}

/// Test: An incompatible interface pair is rejected before any write
#[tokio::test]
async fn test_port_incompatible_interfaces_leave_store_untouched() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired = Port::new("h1", "eth1").with_interfaces("hardwired", "10GBase-SR");

    let err = service
        .reconciler()
        .reconcile::<PortResource>(Desired::Present(desired), false)
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::Validation(_)));
    assert_eq!(store.mutation_count(), 0);
    assert_eq!(store.ports().len(), 1);
}

#[tokio::test]
async fn test_port_on_missing_object_is_not_found() {
    let (service, _, _) = service(lab(), StaticProber::silent());

    let err = service
        .reconciler()
        .reconcile::<PortResource>(Desired::Present(Port::new("ghost", "eth0")), false)
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::NotFound { entity: "object", .. }));
}

#[tokio::test]
async fn test_port_label_change_is_update() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired = Port::new("h1", "eth0").with_label("uplink");

    let outcome = service
        .reconciler()
        .reconcile::<PortResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Update);
    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].field, "label");
    assert_eq!(store.ports(), vec![desired]);
}

// ============================================================================
// Links
// ============================================================================

#[tokio::test]
async fn test_existing_link_is_noop() {
    let (service, store, _) = service(lab(), StaticProber::silent());

    let outcome = service
        .reconciler()
        .reconcile::<LinkResource>(Desired::Present(Link::new("rack1", "h1")), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Noop);
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_compatible_link_is_created() {
    let store = lab().with_object(Object::new("vm1", "VM"));
    let (service, store, _) = service(store, StaticProber::silent());

    let outcome = service
        .reconciler()
        .reconcile::<LinkResource>(Desired::Present(Link::new("h1", "vm1")), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Create);
    assert_eq!(outcome.key, "h1 -> vm1");
    assert!(store.links().contains(&Link::new("h1", "vm1")));
}

/// Test: A server cannot contain a rack
#[tokio::test]
async fn test_incompatible_link_is_validation_error() {
    let (service, store, _) = service(lab(), StaticProber::silent());

    let err = service
        .reconciler()
        .reconcile::<LinkResource>(Desired::Present(Link::new("h1", "rack1")), false)
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::Validation(_)));
    assert_eq!(store.mutation_count(), 0);
}

#[tokio::test]
async fn test_link_delete() {
    let (service, store, _) = service(lab(), StaticProber::silent());

    let outcome = service
        .reconciler()
        .reconcile::<LinkResource>(Desired::Absent(Link::new("rack1", "h1")), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Delete);
    assert!(store.links().is_empty());
}

// ============================================================================
// Allocations
// ============================================================================

#[tokio::test]
async fn test_allocation_address_change_is_update() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired = Allocation::new("h1", "eth0", addr("10.0.0.9"));

    let outcome = service
        .reconciler()
        .reconcile::<AllocationResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Update);
    assert_eq!(
        outcome.changes,
        vec![FieldChange {
            field: "address".to_string(),
            before: json!("10.0.0.3"),
            after: json!("10.0.0.9"),
        }]
    );
    assert_eq!(store.allocations(), vec![desired]);
}

#[tokio::test]
async fn test_allocation_create_then_noop() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let desired =
        Allocation::new("h1", "lo", addr("10.0.1.3")).with_type(AllocationType::Virtual);

    let first = service
        .reconciler()
        .reconcile::<AllocationResource>(Desired::Present(desired.clone()), false)
        .await
        .unwrap();
    let second = service
        .reconciler()
        .reconcile::<AllocationResource>(Desired::Present(desired), false)
        .await
        .unwrap();

    assert_eq!(first.action, Action::Create);
    assert_eq!(second.action, Action::Noop);
    assert_eq!(store.mutation_count(), 1);
}

#[tokio::test]
async fn test_allocation_for_missing_object_is_not_found() {
    let (service, _, _) = service(lab(), StaticProber::silent());

    let err = service
        .reconciler()
        .reconcile::<AllocationResource>(
            Desired::Present(Allocation::new("ghost", "eth0", addr("10.0.0.9"))),
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IpamError::NotFound { entity: "object", .. }));
}

#[tokio::test]
async fn test_allocation_delete_dry_run() {
    let (service, store, _) = service(lab(), StaticProber::silent());
    let key = AllocationKey {
        object: "h1".to_string(),
        interface: "eth0".to_string(),
    };

    let outcome = service
        .reconciler()
        .reconcile::<AllocationResource>(Desired::Absent(key), true)
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Delete);
    assert!(outcome.changed);
    assert_eq!(store.allocations().len(), 1);
}
