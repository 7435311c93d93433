// Copyright (c) 2025 - Cowboy AI, Inc.
//! JSON request/response protocol for automation hosts
//!
//! One request in, one JSON document out:
//!
//! ```json
//! {"operation": "allocate_next_free", "tags": ["LAB1", "trust"]}
//! {"operation": "reconcile", "dry_run": true, "resource": {"kind": "object", "name": "h1"}}
//! {"operation": "list_networks", "tags": ["LAB1"]}
//! {"operation": "list_vlans", "domain": "default"}
//! {"operation": "describe_object", "name": "h1"}
//! ```
//!
//! Failures render as [`ErrorReport`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::ipam::AddressManagement;
use super::request::ReconcileRequest;
use crate::errors::{IpamError, IpamResult};

/// One caller request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Request {
    AllocateNextFree {
        tags: Vec<String>,
    },
    Reconcile {
        resource: ReconcileRequest,
        #[serde(default)]
        dry_run: bool,
    },
    ListNetworks {
        tags: Vec<String>,
    },
    ListVlans {
        domain: String,
    },
    DescribeObject {
        name: String,
    },
}

impl Request {
    pub fn operation(&self) -> &'static str {
        match self {
            Request::AllocateNextFree { .. } => "allocate_next_free",
            Request::Reconcile { .. } => "reconcile",
            Request::ListNetworks { .. } => "list_networks",
            Request::ListVlans { .. } => "list_vlans",
            Request::DescribeObject { .. } => "describe_object",
        }
    }
}

/// Failure record written in place of a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub failed: bool,
    pub kind: String,
    pub msg: String,
}

impl From<&IpamError> for ErrorReport {
    fn from(err: &IpamError) -> Self {
        Self {
            failed: true,
            kind: err.kind().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Execute one request and render its result as JSON
pub async fn dispatch(service: &dyn AddressManagement, request: Request) -> IpamResult<Value> {
    let operation = request.operation();
    let result = match request {
        Request::AllocateNextFree { tags } => {
            serde_json::to_value(service.allocate_next_free(&tags).await?)?
        }
        Request::Reconcile { resource, dry_run } => {
            let dry_run = resource.dry_run || dry_run;
            serde_json::to_value(service.reconcile(resource.dry_run(dry_run)).await?)?
        }
        Request::ListNetworks { tags } => {
            serde_json::to_value(service.list_networks(&tags).await?)?
        }
        Request::ListVlans { domain } => serde_json::to_value(service.list_vlans(&domain).await?)?,
        Request::DescribeObject { name } => {
            serde_json::to_value(service.describe_object(&name).await?)?
        }
    };
    info!(operation, "request completed");
    Ok(result)
}
