// Copyright (c) 2025 - Cowboy AI, Inc.
//! Address Management Service
//!
//! Caller-facing operations over one store and one prober. Every call is
//! self-contained: nothing is cached between invocations.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::request::{ReconcileReport, ReconcileRequest};
use crate::domain::{AddressDescriptor, AddressView, NetworkView, ObjectView, VlanView};
use crate::errors::{IpamError, IpamResult};
use crate::probe::LivenessProber;
use crate::reconcile::{
    AllocationResource, LinkResource, ObjectResource, PortResource, Reconciler, ResourceKind,
};
use crate::resolver::TagResolver;
use crate::scanner::AllocationScanner;
use crate::store::AddressSpaceStore;

/// Address management operations
#[async_trait]
pub trait AddressManagement: Send + Sync {
    /// Next free address in the pool selected by `tags`
    async fn allocate_next_free(&self, tags: &[String]) -> IpamResult<AddressDescriptor>;

    /// Drive one resource toward its desired state
    async fn reconcile(&self, request: ReconcileRequest) -> IpamResult<ReconcileReport>;

    /// VLAN-bound networks carrying every tag in `tags`
    async fn list_networks(&self, tags: &[String]) -> IpamResult<Vec<NetworkView>>;

    /// VLANs in a VLAN domain
    async fn list_vlans(&self, domain: &str) -> IpamResult<Vec<VlanView>>;

    /// An object with its addresses, if it exists
    async fn describe_object(&self, name: &str) -> IpamResult<Option<ObjectView>>;
}

/// [`AddressManagement`] over an [`AddressSpaceStore`] and a [`LivenessProber`]
pub struct IpamService<S: AddressSpaceStore, P: LivenessProber + ?Sized> {
    store: Arc<S>,
    resolver: TagResolver<S>,
    scanner: AllocationScanner<S, P>,
    reconciler: Reconciler<S>,
}

impl<S, P> IpamService<S, P>
where
    S: AddressSpaceStore,
    P: LivenessProber + ?Sized,
{
    pub fn new(store: Arc<S>, prober: Arc<P>) -> Self {
        Self {
            resolver: TagResolver::new(Arc::clone(&store)),
            scanner: AllocationScanner::new(Arc::clone(&store), prober),
            reconciler: Reconciler::new(Arc::clone(&store)),
            store,
        }
    }

    /// Hard deadline applied to each liveness probe
    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.scanner = self.scanner.with_probe_deadline(deadline);
        self
    }

    /// Typed reconciler, for callers that hold records rather than JSON
    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }
}

#[async_trait]
impl<S, P> AddressManagement for IpamService<S, P>
where
    S: AddressSpaceStore,
    P: LivenessProber + ?Sized,
{
    async fn allocate_next_free(&self, tags: &[String]) -> IpamResult<AddressDescriptor> {
        self.scanner.allocate_next_free(tags).await
    }

    #[instrument(skip(self, request), fields(kind = %request.kind, state = %request.state))]
    async fn reconcile(&self, request: ReconcileRequest) -> IpamResult<ReconcileReport> {
        let dry_run = request.dry_run;
        match request.kind {
            ResourceKind::Object => {
                let desired =
                    request.desired::<ObjectResource, _>(ReconcileRequest::object_key)?;
                self.reconciler
                    .reconcile::<ObjectResource>(desired, dry_run)
                    .await?
                    .into_report()
            }
            ResourceKind::Port => {
                let desired = request.desired::<PortResource, _>(ReconcileRequest::port_key)?;
                self.reconciler
                    .reconcile::<PortResource>(desired, dry_run)
                    .await?
                    .into_report()
            }
            ResourceKind::Link => {
                let desired = request.desired::<LinkResource, _>(ReconcileRequest::link_key)?;
                self.reconciler
                    .reconcile::<LinkResource>(desired, dry_run)
                    .await?
                    .into_report()
            }
            ResourceKind::Allocation => {
                let desired =
                    request.desired::<AllocationResource, _>(ReconcileRequest::allocation_key)?;
                self.reconciler
                    .reconcile::<AllocationResource>(desired, dry_run)
                    .await?
                    .into_report()
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_networks(&self, tags: &[String]) -> IpamResult<Vec<NetworkView>> {
        let pool = self.resolver.resolve(tags).await?.into_networks();

        let mut views = Vec::with_capacity(pool.len());
        for network in pool {
            match self.store.find_vlan_for_network(network.id).await? {
                Some(vlan) => views.push(NetworkView {
                    network: network.network,
                    name: network.name,
                    vlan,
                }),
                None => debug!(network = %network, "skipping network without VLAN"),
            }
        }
        Ok(views)
    }

    #[instrument(skip(self))]
    async fn list_vlans(&self, domain: &str) -> IpamResult<Vec<VlanView>> {
        Ok(self
            .store
            .list_vlans(domain)
            .await?
            .into_iter()
            .map(|vlan| VlanView {
                tag: vlan.id,
                name: vlan.description,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn describe_object(&self, name: &str) -> IpamResult<Option<ObjectView>> {
        let Some(object) = self.store.find_object(name).await? else {
            return Ok(None);
        };

        let allocations = self.store.allocations_for_object(name).await?;
        let mut addresses = Vec::with_capacity(allocations.len());

        for allocation in allocations {
            let network = self
                .store
                .find_network_containing(allocation.address)
                .await?
                .ok_or_else(|| {
                    warn!(address = %allocation.address, "allocation outside every known network");
                    IpamError::not_found("network containing", allocation.address.to_string())
                })?;

            let vlan = self
                .store
                .find_vlan_for_network(network.id)
                .await?
                .ok_or_else(|| {
                    IpamError::Configuration(format!(
                        "network {} exists but is not bound to a VLAN",
                        network
                    ))
                })?;

            addresses.push(AddressView {
                address: allocation.address,
                netmask: network.network.netmask(),
                gateway: network.network.gateway(),
                netname: network.name,
                ifname: allocation.interface,
                vlan,
            });
        }

        Ok(Some(ObjectView {
            name: object.name,
            label: object.label,
            object_type: object.object_type,
            asset_tag: object.asset_tag,
            comment: object.comment,
            addresses,
        }))
    }
}
