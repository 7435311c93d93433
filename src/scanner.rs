// Copyright (c) 2025 - Cowboy AI, Inc.
//! Allocation Scanner
//!
//! Finds the next free address in a tagged pool.
//!
//! ```text
//! tags ──> TagResolver ──> [N1, N2, ...]      (store order)
//!                              │
//!                              ▼  for each network, ascending usable hosts
//!                    skip first two usable hosts
//!                              │
//!                    store record at address? ──yes──> next address
//!                              │ no
//!                    probe (bounded by deadline)
//!                      ├─ responds   ──> IntegrityConflict (stop)
//!                      ├─ error      ──> ProbeInconclusive (stop)
//!                      └─ silent     ──> VLAN lookup ──> AddressDescriptor
//! ```
//!
//! The scan is depth-first and stops at the first free address. Nothing is
//! written to the store: the caller records the allocation through the
//! reconciler.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{AddressDescriptor, Network};
use crate::errors::{IpamError, IpamResult};
use crate::probe::{probe_with_timeout, LivenessProber, DEFAULT_PROBE_DEADLINE};
use crate::resolver::{required_tags, PoolResolution, TagResolver};
use crate::store::AddressSpaceStore;

/// Usable hosts at the bottom of every network that are never handed out
pub const RESERVED_HOSTS: usize = 2;

/// Scans tagged pools for the next unused, silent address
pub struct AllocationScanner<S: AddressSpaceStore + ?Sized, P: LivenessProber + ?Sized> {
    store: Arc<S>,
    resolver: TagResolver<S>,
    prober: Arc<P>,
    probe_deadline: Duration,
}

impl<S, P> AllocationScanner<S, P>
where
    S: AddressSpaceStore + ?Sized,
    P: LivenessProber + ?Sized,
{
    pub fn new(store: Arc<S>, prober: Arc<P>) -> Self {
        Self {
            resolver: TagResolver::new(Arc::clone(&store)),
            store,
            prober,
            probe_deadline: DEFAULT_PROBE_DEADLINE,
        }
    }

    /// Hard deadline applied to each probe call
    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.probe_deadline = deadline;
        self
    }

    /// Next free address in the first network carrying every tag in `tags`
    ///
    /// # Errors
    ///
    /// - `Configuration`: no tags, or the chosen network has no VLAN
    /// - `NotFound`: no network carries every tag
    /// - `IntegrityConflict`: an unrecorded address responded to the probe
    /// - `ProbeInconclusive`: the probe failed or hit its deadline
    /// - `Exhausted`: every matching network was scanned without a hit
    #[instrument(skip(self))]
    pub async fn allocate_next_free<T>(&self, tags: &[T]) -> IpamResult<AddressDescriptor>
    where
        T: AsRef<str> + std::fmt::Debug + Sync,
    {
        let required = required_tags(tags)?;

        let pool = match self.resolver.resolve(required.as_slice()).await? {
            PoolResolution::Matched(networks) => networks,
            PoolResolution::Empty => {
                return Err(IpamError::not_found("pool", required.join(",")));
            }
        };

        for network in &pool {
            debug!(network = %network, "scanning network");

            let Some(address) = self.first_free(network).await? else {
                debug!(network = %network, "network has no free address");
                continue;
            };

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

            let gateway = network.network.gateway().ok_or_else(|| {
                IpamError::Configuration(format!("network {} has no usable hosts", network))
            })?;

            info!(%address, network = %network, %vlan, "found free address");

            return Ok(AddressDescriptor {
                address,
                netmask: network.network.netmask(),
                gateway,
                network: network.network,
                network_name: network.name.clone(),
                vlan,
            });
        }

        warn!(tags = ?required, networks = pool.len(), "pool exhausted");
        Err(IpamError::Exhausted { tags: required })
    }

    /// First unrecorded, silent address in `network`, past the reserved slots
    async fn first_free(&self, network: &Network) -> IpamResult<Option<Ipv4Addr>> {
        for address in network.network.usable_hosts().skip(RESERVED_HOSTS) {
            if let Some(usage) = self.store.find_allocation(address).await? {
                debug!(%address, ?usage, "address recorded, skipping");
                continue;
            }

            match probe_with_timeout(&*self.prober, address, self.probe_deadline).await {
                Ok(false) => return Ok(Some(address)),
                Ok(true) => {
                    error!(%address, network = %network, "unrecorded address is live");
                    return Err(IpamError::IntegrityConflict {
                        key: address.to_string(),
                        reason: format!(
                            "address in {} responds on the network but has no allocation record",
                            network
                        ),
                    });
                }
                Err(e) => {
                    warn!(%address, error = %e, "probe inconclusive");
                    return Err(IpamError::ProbeInconclusive {
                        address,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(None)
    }
}
