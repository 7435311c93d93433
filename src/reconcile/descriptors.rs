// Copyright (c) 2025 - Cowboy AI, Inc.
//! Descriptors for the four managed resource kinds

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ResourceDescriptor, ResourceKind};
use crate::domain::{Allocation, AllocationKey, Link, Object, Port, PortKey};
use crate::errors::{IpamError, IpamResult};
use crate::store::{AddressSpaceStore, CompatibilityTable};

/// Fetch an object that a record refers to, or fail with `NotFound`
async fn require_object(store: &dyn AddressSpaceStore, name: &str) -> IpamResult<Object> {
    store
        .find_object(name)
        .await?
        .ok_or_else(|| IpamError::not_found("object", name))
}

// ============================================================================
// Object
// ============================================================================

/// Objects, keyed by name
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectResource;

#[async_trait]
impl ResourceDescriptor for ObjectResource {
    type Key = String;
    type Record = Object;

    const KIND: ResourceKind = ResourceKind::Object;

    fn key(&self, record: &Object) -> String {
        record.name.clone()
    }

    fn fields(&self, record: &Object) -> Vec<(&'static str, Value)> {
        vec![
            ("label", json!(record.label)),
            ("type", json!(record.object_type)),
            ("asset_tag", json!(record.asset_tag)),
            ("comment", json!(record.comment)),
        ]
    }

    async fn observe(
        &self,
        store: &dyn AddressSpaceStore,
        key: &String,
    ) -> IpamResult<Option<Object>> {
        Ok(store.find_object(key).await?)
    }

    async fn validate(&self, store: &dyn AddressSpaceStore, record: &Object) -> IpamResult<()> {
        if !store.has_object_type(&record.object_type).await? {
            return Err(IpamError::not_found("object type", record.object_type.as_str()));
        }
        Ok(())
    }

    async fn create(&self, store: &dyn AddressSpaceStore, record: &Object) -> IpamResult<()> {
        Ok(store.create_object(record).await?)
    }

    async fn update(&self, store: &dyn AddressSpaceStore, record: &Object) -> IpamResult<()> {
        Ok(store.update_object(record).await?)
    }

    async fn delete(&self, store: &dyn AddressSpaceStore, key: &String) -> IpamResult<()> {
        Ok(store.delete_object(key).await?)
    }
}

// ============================================================================
// Port
// ============================================================================

/// Ports, keyed by owning object and port name
#[derive(Debug, Clone, Copy, Default)]
pub struct PortResource;

#[async_trait]
impl ResourceDescriptor for PortResource {
    type Key = PortKey;
    type Record = Port;

    const KIND: ResourceKind = ResourceKind::Port;

    fn key(&self, record: &Port) -> PortKey {
        record.key()
    }

    fn fields(&self, record: &Port) -> Vec<(&'static str, Value)> {
        vec![
            ("inner_interface", json!(record.inner_interface)),
            ("outer_interface", json!(record.outer_interface)),
            ("l2_address", json!(record.l2_address)),
            ("reservation", json!(record.reservation)),
            ("label", json!(record.label)),
        ]
    }

    async fn observe(
        &self,
        store: &dyn AddressSpaceStore,
        key: &PortKey,
    ) -> IpamResult<Option<Port>> {
        Ok(store.find_port(key).await?)
    }

    async fn validate(&self, store: &dyn AddressSpaceStore, record: &Port) -> IpamResult<()> {
        require_object(store, &record.object).await?;

        let compatible = store
            .check_compatibility(
                CompatibilityTable::PortInterface,
                &record.inner_interface,
                &record.outer_interface,
            )
            .await?;
        if !compatible {
            return Err(IpamError::Validation(format!(
                "port {}: inner interface '{}' cannot carry outer interface '{}'",
                record.key(),
                record.inner_interface,
                record.outer_interface
            )));
        }
        Ok(())
    }

    async fn create(&self, store: &dyn AddressSpaceStore, record: &Port) -> IpamResult<()> {
        Ok(store.create_port(record).await?)
    }

    async fn update(&self, store: &dyn AddressSpaceStore, record: &Port) -> IpamResult<()> {
        Ok(store.update_port(record).await?)
    }

    async fn delete(&self, store: &dyn AddressSpaceStore, key: &PortKey) -> IpamResult<()> {
        Ok(store.delete_port(key).await?)
    }
}

// ============================================================================
// Link
// ============================================================================

/// Parent/child links; the pair is the whole record
///
/// With no mutable fields, an existing link is always in sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkResource;

#[async_trait]
impl ResourceDescriptor for LinkResource {
    type Key = Link;
    type Record = Link;

    const KIND: ResourceKind = ResourceKind::Link;

    fn key(&self, record: &Link) -> Link {
        record.clone()
    }

    fn fields(&self, _record: &Link) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    async fn observe(
        &self,
        store: &dyn AddressSpaceStore,
        key: &Link,
    ) -> IpamResult<Option<Link>> {
        Ok(store.find_link(key).await?)
    }

    async fn validate(&self, store: &dyn AddressSpaceStore, record: &Link) -> IpamResult<()> {
        let parent = require_object(store, &record.parent).await?;
        let child = require_object(store, &record.child).await?;

        let compatible = store
            .check_compatibility(
                CompatibilityTable::ObjectParent,
                &parent.object_type,
                &child.object_type,
            )
            .await?;
        if !compatible {
            return Err(IpamError::Validation(format!(
                "link {}: a {} cannot contain a {}",
                record, parent.object_type, child.object_type
            )));
        }
        Ok(())
    }

    async fn create(&self, store: &dyn AddressSpaceStore, record: &Link) -> IpamResult<()> {
        Ok(store.create_link(record).await?)
    }

    async fn update(&self, _store: &dyn AddressSpaceStore, record: &Link) -> IpamResult<()> {
        // Unreachable through the reconciler: no fields, so never drifted
        Err(IpamError::Validation(format!("link {} has no mutable attributes", record)))
    }

    async fn delete(&self, store: &dyn AddressSpaceStore, key: &Link) -> IpamResult<()> {
        Ok(store.delete_link(key).await?)
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// Address allocations, keyed by owning object and interface
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationResource;

#[async_trait]
impl ResourceDescriptor for AllocationResource {
    type Key = AllocationKey;
    type Record = Allocation;

    const KIND: ResourceKind = ResourceKind::Allocation;

    fn key(&self, record: &Allocation) -> AllocationKey {
        record.key()
    }

    fn fields(&self, record: &Allocation) -> Vec<(&'static str, Value)> {
        vec![
            ("address", json!(record.address)),
            ("type", json!(record.allocation_type)),
        ]
    }

    async fn observe(
        &self,
        store: &dyn AddressSpaceStore,
        key: &AllocationKey,
    ) -> IpamResult<Option<Allocation>> {
        Ok(store.find_allocation_by_key(key).await?)
    }

    async fn validate(&self, store: &dyn AddressSpaceStore, record: &Allocation) -> IpamResult<()> {
        require_object(store, &record.object).await?;
        Ok(())
    }

    async fn create(&self, store: &dyn AddressSpaceStore, record: &Allocation) -> IpamResult<()> {
        Ok(store.create_allocation(record).await?)
    }

    async fn update(&self, store: &dyn AddressSpaceStore, record: &Allocation) -> IpamResult<()> {
        Ok(store.update_allocation(record).await?)
    }

    async fn delete(&self, store: &dyn AddressSpaceStore, key: &AllocationKey) -> IpamResult<()> {
        Ok(store.delete_allocation(key).await?)
    }
}
