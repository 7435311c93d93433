// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Reconciler
//!
//! One idempotent apply procedure shared by every managed resource kind.
//! A [`ResourceDescriptor`] tells the reconciler how to find, compare,
//! validate and write one kind of record; the reconciler owns the control
//! flow.
//!
//! ```text
//! desired ──> observe(key) ──> diff(fields) ──> Presence FSM ──> Action
//!                                                                  │
//!                             validate (create/update only) <──────┘
//!                                          │
//!                       dry run? ──yes──> report
//!                          │ no
//!                        apply ──> report
//! ```
//!
//! Validation only reads, so a dry run surfaces precondition failures too.
//!
//! # Guarantees
//!
//! - Reconciling the same desired state twice yields `changed = true`, then
//!   `changed = false`
//! - A dry run never writes to the store
//! - A failed precondition aborts before any write
//! - A natural key matching more than one record aborts before any write
//!
//! Observe and apply are separate store calls. Two reconcilers racing on
//! one key can both observe "absent"; the loser's create fails with
//! [`IpamError::IntegrityConflict`] and is reported, never retried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::IpamResult;
use crate::state_machine::{Action, Presence, PresenceInput, StateMachine};
use crate::store::AddressSpaceStore;

pub mod descriptors;

pub use descriptors::{AllocationResource, LinkResource, ObjectResource, PortResource};

/// Managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Object,
    Port,
    Link,
    Allocation,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Object => "object",
            ResourceKind::Port => "port",
            ResourceKind::Link => "link",
            ResourceKind::Allocation => "allocation",
        };
        f.write_str(name)
    }
}

/// One mutable field whose value differs between before and after
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

/// How to reconcile one resource kind
///
/// Descriptors are stateless; all state lives in the store.
#[async_trait]
pub trait ResourceDescriptor: Default + Send + Sync {
    /// Natural key
    type Key: fmt::Display + fmt::Debug + Clone + Send + Sync;

    /// Full record, keyed by [`Self::Key`]
    type Record: fmt::Debug + Clone + Serialize + Send + Sync;

    const KIND: ResourceKind;

    fn key(&self, record: &Self::Record) -> Self::Key;

    /// Mutable attributes in a fixed order, in canonical comparable form
    ///
    /// Natural-key fields are not listed. Two records with equal field lists
    /// are considered in sync.
    fn fields(&self, record: &Self::Record) -> Vec<(&'static str, Value)>;

    /// Record stored under `key`, failing if more than one matches
    async fn observe(
        &self,
        store: &dyn AddressSpaceStore,
        key: &Self::Key,
    ) -> IpamResult<Option<Self::Record>>;

    /// Preconditions for creating or updating `record`
    async fn validate(&self, store: &dyn AddressSpaceStore, record: &Self::Record)
        -> IpamResult<()>;

    async fn create(&self, store: &dyn AddressSpaceStore, record: &Self::Record) -> IpamResult<()>;

    /// Full replace of every mutable attribute
    async fn update(&self, store: &dyn AddressSpaceStore, record: &Self::Record) -> IpamResult<()>;

    async fn delete(&self, store: &dyn AddressSpaceStore, key: &Self::Key) -> IpamResult<()>;
}

/// Desired state of one resource identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Desired<R, K> {
    /// Record must exist with exactly these attributes
    Present(R),
    /// Nothing may exist under this key
    Absent(K),
}

impl<R, K> Desired<R, K> {
    pub fn presence(&self) -> Presence {
        match self {
            Desired::Present(_) => Presence::Present,
            Desired::Absent(_) => Presence::Absent,
        }
    }
}

/// Desired state for descriptor `D`
pub type DesiredState<D> =
    Desired<<D as ResourceDescriptor>::Record, <D as ResourceDescriptor>::Key>;

/// Uniform result of one reconciliation
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome<R> {
    pub operation_id: Uuid,
    pub kind: ResourceKind,
    pub key: String,
    pub action: Action,
    /// Whether the store was, or in a dry run would be, modified
    pub changed: bool,
    pub dry_run: bool,
    pub before: Option<R>,
    pub after: Option<R>,
    pub changes: Vec<FieldChange>,
    pub observed_at: DateTime<Utc>,
}

/// Field-by-field comparison of two field lists
///
/// A side that is `None` contributes `null` for every field.
pub fn diff_fields(
    before: Option<Vec<(&'static str, Value)>>,
    after: Option<Vec<(&'static str, Value)>>,
) -> Vec<FieldChange> {
    let names: Vec<&'static str> = before
        .as_ref()
        .or(after.as_ref())
        .map(|fields| fields.iter().map(|(name, _)| *name).collect())
        .unwrap_or_default();

    let value_of = |fields: &Option<Vec<(&'static str, Value)>>, name: &str| -> Value {
        fields
            .as_ref()
            .and_then(|fields| fields.iter().find(|(n, _)| *n == name))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null)
    };

    names
        .into_iter()
        .filter_map(|name| {
            let b = value_of(&before, name);
            let a = value_of(&after, name);
            (b != a).then(|| FieldChange {
                field: name.to_string(),
                before: b,
                after: a,
            })
        })
        .collect()
}

/// Drives resources toward their desired state
pub struct Reconciler<S: AddressSpaceStore> {
    store: Arc<S>,
}

impl<S: AddressSpaceStore> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Observe, diff, decide and (unless `dry_run`) apply one resource
    pub async fn reconcile<D: ResourceDescriptor>(
        &self,
        desired: DesiredState<D>,
        dry_run: bool,
    ) -> IpamResult<ReconcileOutcome<D::Record>> {
        let operation_id = Uuid::now_v7();
        let descriptor = D::default();
        let key = match &desired {
            Desired::Present(record) => descriptor.key(record),
            Desired::Absent(key) => key.clone(),
        };

        let span = info_span!(
            "reconcile",
            kind = %D::KIND,
            key = %key,
            %operation_id,
            dry_run
        );

        self.run(descriptor, key, desired, dry_run, operation_id)
            .instrument(span)
            .await
    }

    async fn run<D: ResourceDescriptor>(
        &self,
        descriptor: D,
        key: D::Key,
        desired: DesiredState<D>,
        dry_run: bool,
        operation_id: Uuid,
    ) -> IpamResult<ReconcileOutcome<D::Record>> {
        let store: &dyn AddressSpaceStore = self.store.as_ref();

        let observed = descriptor.observe(store, &key).await?;
        let observed_at = Utc::now();

        let target = match &desired {
            Desired::Present(record) => Some(record),
            Desired::Absent(_) => None,
        };

        let changes = diff_fields(
            observed.as_ref().map(|r| descriptor.fields(r)),
            target.map(|r| descriptor.fields(r)),
        );

        let state = if observed.is_some() {
            Presence::Present
        } else {
            Presence::Absent
        };
        let input = PresenceInput {
            desired: desired.presence(),
            drifted: observed.is_some() && target.is_some() && !changes.is_empty(),
        };
        let (_, action) = state.transition(&input)?;

        if let (true, Some(record)) = (action.needs_validation(), target) {
            descriptor.validate(store, record).await?;
        }

        if dry_run {
            debug!(%action, "dry run, nothing applied");
        } else {
            match action {
                Action::Create => {
                    if let Some(record) = target {
                        descriptor.create(store, record).await?;
                    }
                }
                Action::Update => {
                    if let Some(record) = target {
                        descriptor.update(store, record).await?;
                    }
                }
                Action::Delete => descriptor.delete(store, &key).await?,
                Action::Noop => {}
            }
        }

        if action.mutates() {
            info!(%action, changed_fields = changes.len(), "resource reconciled");
        } else {
            debug!("resource already in desired state");
        }

        let after = match action {
            Action::Create | Action::Update => target.cloned(),
            Action::Delete => None,
            Action::Noop => observed.clone(),
        };
        let changes = if action.mutates() { changes } else { Vec::new() };

        Ok(ReconcileOutcome {
            operation_id,
            kind: D::KIND,
            key: key.to_string(),
            action,
            changed: action.mutates(),
            dry_run,
            before: observed,
            after,
            changes,
            observed_at,
        })
    }
}
