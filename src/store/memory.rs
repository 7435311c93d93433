// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory address space store
//!
//! Enforces the same natural-key uniqueness and referential rules as the
//! relational schema. Seeding through the `with_*` builders bypasses those
//! checks so ambiguous states can be constructed deliberately.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::{
    at_most_one, AddressSpaceStore, AddressUse, CompatibilityTable, StoreError, StoreResult,
};
use crate::domain::{
    Allocation, AllocationKey, Link, Network, NetworkId, Object, Port, PortKey, Vlan, VlanId,
};

#[derive(Debug, Default)]
struct State {
    networks: Vec<Network>,
    vlan_bindings: HashMap<NetworkId, VlanId>,
    vlans: Vec<Vlan>,
    static_addresses: BTreeMap<Ipv4Addr, Option<String>>,
    allocations: Vec<Allocation>,
    objects: Vec<Object>,
    object_types: BTreeSet<String>,
    ports: Vec<Port>,
    links: Vec<Link>,
    compatibility: BTreeSet<(CompatibilityTable, String, String)>,
}

impl State {
    fn object_exists(&self, name: &str) -> bool {
        self.objects.iter().any(|o| o.name == name)
    }
}

/// Address space store held entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    mutations: AtomicU64,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a network, optionally bound to a VLAN
    pub fn with_network(mut self, network: Network, vlan: Option<VlanId>) -> Self {
        let state = self.state_mut();
        if let Some(vlan) = vlan {
            state.vlan_bindings.insert(network.id, vlan);
        }
        state.networks.push(network);
        self
    }

    pub fn with_vlan(mut self, vlan: Vlan) -> Self {
        self.state_mut().vlans.push(vlan);
        self
    }

    /// Seed an entry in the static address table
    pub fn with_static_address(mut self, address: Ipv4Addr, name: Option<&str>) -> Self {
        self.state_mut()
            .static_addresses
            .insert(address, name.map(str::to_string));
        self
    }

    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.state_mut().allocations.push(allocation);
        self
    }

    pub fn with_object_type(mut self, object_type: &str) -> Self {
        self.state_mut().object_types.insert(object_type.to_string());
        self
    }

    pub fn with_object(mut self, object: Object) -> Self {
        let state = self.state_mut();
        state.object_types.insert(object.object_type.clone());
        state.objects.push(object);
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.state_mut().ports.push(port);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.state_mut().links.push(link);
        self
    }

    pub fn with_compatibility(mut self, table: CompatibilityTable, a: &str, b: &str) -> Self {
        self.state_mut()
            .compatibility
            .insert((table, a.to_string(), b.to_string()));
        self
    }

    /// Number of successful mutations applied since construction
    pub fn mutation_count(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Simulate loss of connectivity: every call fails with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn objects(&self) -> Vec<Object> {
        self.snapshot(|s| s.objects.clone())
    }

    pub fn ports(&self) -> Vec<Port> {
        self.snapshot(|s| s.ports.clone())
    }

    pub fn links(&self) -> Vec<Link> {
        self.snapshot(|s| s.links.clone())
    }

    pub fn allocations(&self) -> Vec<Allocation> {
        self.snapshot(|s| s.allocations.clone())
    }

    fn snapshot<T>(&self, f: impl FnOnce(&State) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".to_string()));
        }
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }

    fn record_mutation(&self, what: &str) {
        let n = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(mutation = n, "in-memory store: {}", what);
    }
}

fn missing_object(name: &str) -> StoreError {
    StoreError::Missing {
        entity: "object",
        key: name.to_string(),
    }
}

#[async_trait]
impl AddressSpaceStore for InMemoryStore {
    async fn find_networks_by_tags(&self, tags: &[String]) -> StoreResult<Vec<Network>> {
        let state = self.read()?;
        Ok(state
            .networks
            .iter()
            .filter(|n| tags.iter().any(|t| n.tags.contains(t)))
            .cloned()
            .collect())
    }

    async fn find_vlan_for_network(&self, network_id: NetworkId) -> StoreResult<Option<VlanId>> {
        Ok(self.read()?.vlan_bindings.get(&network_id).copied())
    }

    async fn find_network_containing(&self, address: Ipv4Addr) -> StoreResult<Option<Network>> {
        let state = self.read()?;
        Ok(state
            .networks
            .iter()
            .filter(|n| n.network.contains(address))
            .max_by_key(|n| n.network.prefix_len())
            .cloned())
    }

    async fn list_vlans(&self, domain: &str) -> StoreResult<Vec<Vlan>> {
        let state = self.read()?;
        Ok(state
            .vlans
            .iter()
            .filter(|v| v.domain == domain)
            .cloned()
            .collect())
    }

    async fn find_allocation(&self, address: Ipv4Addr) -> StoreResult<Option<AddressUse>> {
        let state = self.read()?;
        if let Some(allocation) = state.allocations.iter().find(|a| a.address == address) {
            return Ok(Some(AddressUse::Allocated(allocation.clone())));
        }
        Ok(state
            .static_addresses
            .get(&address)
            .map(|name| AddressUse::Static { name: name.clone() }))
    }

    async fn find_allocation_by_key(
        &self,
        key: &AllocationKey,
    ) -> StoreResult<Option<Allocation>> {
        let state = self.read()?;
        let rows = state
            .allocations
            .iter()
            .filter(|a| a.object == key.object && a.interface == key.interface)
            .cloned()
            .collect();
        at_most_one(rows, format!("allocation {}", key))
    }

    async fn allocations_for_object(&self, object: &str) -> StoreResult<Vec<Allocation>> {
        let state = self.read()?;
        Ok(state
            .allocations
            .iter()
            .filter(|a| a.object == object)
            .cloned()
            .collect())
    }

    async fn create_allocation(&self, allocation: &Allocation) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.object_exists(&allocation.object) {
            return Err(missing_object(&allocation.object));
        }
        let key = allocation.key();
        if state.allocations.iter().any(|a| a.key() == key) {
            return Err(StoreError::Conflict {
                key: format!("allocation {}", key),
                reason: "duplicate entry for (object, interface)".to_string(),
            });
        }
        state.allocations.push(allocation.clone());
        self.record_mutation("create allocation");
        Ok(())
    }

    async fn update_allocation(&self, allocation: &Allocation) -> StoreResult<()> {
        let mut state = self.write()?;
        let key = allocation.key();
        let slot = state
            .allocations
            .iter_mut()
            .find(|a| a.key() == key)
            .ok_or_else(|| StoreError::Missing {
                entity: "allocation",
                key: key.to_string(),
            })?;
        *slot = allocation.clone();
        self.record_mutation("update allocation");
        Ok(())
    }

    async fn delete_allocation(&self, key: &AllocationKey) -> StoreResult<()> {
        let mut state = self.write()?;
        let before = state.allocations.len();
        state.allocations.retain(|a| &a.key() != key);
        if state.allocations.len() == before {
            return Err(StoreError::Missing {
                entity: "allocation",
                key: key.to_string(),
            });
        }
        self.record_mutation("delete allocation");
        Ok(())
    }

    async fn find_object(&self, name: &str) -> StoreResult<Option<Object>> {
        let state = self.read()?;
        let rows = state
            .objects
            .iter()
            .filter(|o| o.name == name)
            .cloned()
            .collect();
        at_most_one(rows, format!("object {}", name))
    }

    async fn has_object_type(&self, object_type: &str) -> StoreResult<bool> {
        Ok(self.read()?.object_types.contains(object_type))
    }

    async fn create_object(&self, object: &Object) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.object_exists(&object.name) {
            return Err(StoreError::Conflict {
                key: format!("object {}", object.name),
                reason: "duplicate entry for name".to_string(),
            });
        }
        state.objects.push(object.clone());
        self.record_mutation("create object");
        Ok(())
    }

    async fn update_object(&self, object: &Object) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .objects
            .iter_mut()
            .find(|o| o.name == object.name)
            .ok_or_else(|| missing_object(&object.name))?;
        *slot = object.clone();
        self.record_mutation("update object");
        Ok(())
    }

    async fn delete_object(&self, name: &str) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.object_exists(name) {
            return Err(missing_object(name));
        }
        // Dependent rows go with the object, as the schema cascades them
        state.objects.retain(|o| o.name != name);
        state.ports.retain(|p| p.object != name);
        state.allocations.retain(|a| a.object != name);
        state.links.retain(|l| l.parent != name && l.child != name);
        self.record_mutation("delete object");
        Ok(())
    }

    async fn find_port(&self, key: &PortKey) -> StoreResult<Option<Port>> {
        let state = self.read()?;
        let rows = state
            .ports
            .iter()
            .filter(|p| p.object == key.object && p.name == key.name)
            .cloned()
            .collect();
        at_most_one(rows, format!("port {}", key))
    }

    async fn create_port(&self, port: &Port) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.object_exists(&port.object) {
            return Err(missing_object(&port.object));
        }
        let key = port.key();
        if state.ports.iter().any(|p| p.key() == key) {
            return Err(StoreError::Conflict {
                key: format!("port {}", key),
                reason: "duplicate entry for (object, name)".to_string(),
            });
        }
        state.ports.push(port.clone());
        self.record_mutation("create port");
        Ok(())
    }

    async fn update_port(&self, port: &Port) -> StoreResult<()> {
        let mut state = self.write()?;
        let key = port.key();
        let slot = state
            .ports
            .iter_mut()
            .find(|p| p.key() == key)
            .ok_or_else(|| StoreError::Missing {
                entity: "port",
                key: key.to_string(),
            })?;
        *slot = port.clone();
        self.record_mutation("update port");
        Ok(())
    }

    async fn delete_port(&self, key: &PortKey) -> StoreResult<()> {
        let mut state = self.write()?;
        let before = state.ports.len();
        state.ports.retain(|p| &p.key() != key);
        if state.ports.len() == before {
            return Err(StoreError::Missing {
                entity: "port",
                key: key.to_string(),
            });
        }
        self.record_mutation("delete port");
        Ok(())
    }

    async fn find_link(&self, link: &Link) -> StoreResult<Option<Link>> {
        let state = self.read()?;
        let rows = state.links.iter().filter(|l| *l == link).cloned().collect();
        at_most_one(rows, format!("link {}", link))
    }

    async fn create_link(&self, link: &Link) -> StoreResult<()> {
        let mut state = self.write()?;
        for end in [&link.parent, &link.child] {
            if !state.object_exists(end) {
                return Err(missing_object(end));
            }
        }
        if state.links.contains(link) {
            return Err(StoreError::Conflict {
                key: format!("link {}", link),
                reason: "duplicate entry for (parent, child)".to_string(),
            });
        }
        state.links.push(link.clone());
        self.record_mutation("create link");
        Ok(())
    }

    async fn delete_link(&self, link: &Link) -> StoreResult<()> {
        let mut state = self.write()?;
        let before = state.links.len();
        state.links.retain(|l| l != link);
        if state.links.len() == before {
            return Err(StoreError::Missing {
                entity: "link",
                key: link.to_string(),
            });
        }
        self.record_mutation("delete link");
        Ok(())
    }

    async fn check_compatibility(
        &self,
        table: CompatibilityTable,
        kind_a: &str,
        kind_b: &str,
    ) -> StoreResult<bool> {
        let state = self.read()?;
        Ok(state
            .compatibility
            .contains(&(table, kind_a.to_string(), kind_b.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ipv4Network;

    fn net(id: NetworkId, cidr: &str, tags: &[&str]) -> Network {
        Network::new(id, Ipv4Network::from_cidr(cidr).unwrap(), format!("net-{}", id))
            .with_tags(tags.iter().copied())
    }

    #[tokio::test]
    async fn test_find_networks_by_tags_is_union() {
        let store = InMemoryStore::new()
            .with_network(net(1, "10.0.0.0/24", &["a", "b"]), None)
            .with_network(net(2, "10.0.1.0/24", &["a"]), None)
            .with_network(net(3, "10.0.2.0/24", &["c"]), None);

        let found = store
            .find_networks_by_tags(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_find_network_containing_prefers_longest_prefix() {
        let store = InMemoryStore::new()
            .with_network(net(1, "10.0.0.0/16", &[]), None)
            .with_network(net(2, "10.0.4.0/24", &[]), None);

        let found = store
            .find_network_containing("10.0.4.9".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, 2);
    }

    #[tokio::test]
    async fn test_create_object_twice_conflicts() {
        let store = InMemoryStore::new().with_object_type("Server");
        let object = Object::new("h1", "Server");
        store.create_object(&object).await.unwrap();

        let err = store.create_object(&object).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.mutation_count(), 1);
    }

    #[tokio::test]
    async fn test_seeded_duplicates_are_reported() {
        let store = InMemoryStore::new()
            .with_object(Object::new("h1", "Server"))
            .with_object(Object::new("h1", "Server"));

        let err = store.find_object("h1").await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_delete_object_cascades() {
        let store = InMemoryStore::new()
            .with_object(Object::new("h1", "Server"))
            .with_port(Port::new("h1", "eth0"))
            .with_allocation(Allocation::new("h1", "eth0", "10.0.0.5".parse().unwrap()));

        store.delete_object("h1").await.unwrap();
        assert!(store.ports().is_empty());
        assert!(store.allocations().is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_is_unavailable() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        let err = store.find_object("h1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
