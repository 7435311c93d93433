// Copyright (c) 2025 - Cowboy AI, Inc.
//! Dynamic requests and reports
//!
//! Callers that only speak JSON name the resource kind and desired state in
//! the request; the attributes are decoded into the matching typed record.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{AllocationKey, Link, PortKey};
use crate::errors::{IpamError, IpamResult};
use crate::reconcile::{
    Desired, DesiredState, FieldChange, ReconcileOutcome, ResourceDescriptor, ResourceKind,
};
use crate::state_machine::{Action, Presence};

fn default_state() -> Presence {
    Presence::Present
}

/// A reconcile request for any resource kind
///
/// ```json
/// {"kind": "port", "state": "present", "object": "h1", "name": "eth0",
///  "l2_address": "de:ad:be:ef:12:34"}
/// ```
///
/// `state` defaults to `present`. For `absent`, only the natural-key
/// attributes are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub kind: ResourceKind,

    #[serde(default = "default_state")]
    pub state: Presence,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Deserialize)]
struct ObjectName {
    name: String,
}

impl ReconcileRequest {
    pub fn new(kind: ResourceKind, state: Presence, attributes: Value) -> IpamResult<Self> {
        match attributes {
            Value::Object(attributes) => Ok(Self {
                kind,
                state,
                dry_run: false,
                attributes,
            }),
            other => Err(IpamError::Validation(format!(
                "{} attributes must be an object, got {}",
                kind, other
            ))),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn decode<T: DeserializeOwned>(&self) -> IpamResult<T> {
        serde_json::from_value(Value::Object(self.attributes.clone())).map_err(|e| {
            IpamError::Validation(format!("invalid {} attributes: {}", self.kind, e))
        })
    }

    /// Typed desired state for descriptor `D`
    ///
    /// `absent_key` decodes the natural key when nothing should exist.
    pub(crate) fn desired<D, F>(&self, absent_key: F) -> IpamResult<DesiredState<D>>
    where
        D: ResourceDescriptor,
        D::Record: DeserializeOwned,
        F: FnOnce(&Self) -> IpamResult<D::Key>,
    {
        if self.kind != D::KIND {
            return Err(IpamError::Validation(format!(
                "request for {} routed to {} reconciler",
                self.kind,
                D::KIND
            )));
        }
        match self.state {
            Presence::Present => Ok(Desired::Present(self.decode()?)),
            Presence::Absent => Ok(Desired::Absent(absent_key(self)?)),
        }
    }

    pub(crate) fn object_key(&self) -> IpamResult<String> {
        self.decode::<ObjectName>().map(|n| n.name)
    }

    pub(crate) fn port_key(&self) -> IpamResult<PortKey> {
        self.decode()
    }

    pub(crate) fn link_key(&self) -> IpamResult<Link> {
        self.decode()
    }

    pub(crate) fn allocation_key(&self) -> IpamResult<AllocationKey> {
        self.decode()
    }
}

/// A reconcile outcome with records rendered as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub operation_id: Uuid,
    pub kind: ResourceKind,
    pub key: String,
    pub action: Action,
    pub changed: bool,
    pub dry_run: bool,
    pub before: Value,
    pub after: Value,
    pub changes: Vec<FieldChange>,
    pub observed_at: DateTime<Utc>,
}

impl<R: Serialize> ReconcileOutcome<R> {
    pub fn into_report(self) -> IpamResult<ReconcileReport> {
        Ok(ReconcileReport {
            operation_id: self.operation_id,
            kind: self.kind,
            key: self.key,
            action: self.action,
            changed: self.changed,
            dry_run: self.dry_run,
            before: serde_json::to_value(&self.before)?,
            after: serde_json::to_value(&self.after)?,
            changes: self.changes,
            observed_at: self.observed_at,
        })
    }
}
