// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for allocation and reconciliation operations

use std::net::Ipv4Addr;

use thiserror::Error;

use crate::domain::NetworkError;
use crate::state_machine::TransitionError;
use crate::store::StoreError;

/// Errors surfaced by the allocation and reconciliation engine
///
/// Every variant is a distinct, inspectable failure. Nothing in this crate
/// retries on any of them.
#[derive(Debug, Error)]
pub enum IpamError {
    /// Invalid engine input or an inconsistent provisioning state
    /// (no tags supplied, matched network without a VLAN, missing settings)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A pool or referenced entity does not exist
    #[error("Not found: {entity} '{key}'")]
    NotFound { entity: &'static str, key: String },

    /// Desired state violates a compatibility rule or value invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// The store and the observable world disagree, or a natural key is ambiguous
    #[error("Integrity conflict on {key}: {reason}")]
    IntegrityConflict { key: String, reason: String },

    /// Backing store unavailable or failed to execute a statement
    #[error("Store error: {0}")]
    Store(String),

    /// Every candidate network was scanned without finding a free address
    #[error("No free address in any pool tagged {tags:?}; provision a new network carrying these tags")]
    Exhausted { tags: Vec<String> },

    /// The liveness probe could not reach a verdict for an address
    #[error("Liveness probe for {address} was inconclusive: {reason}")]
    ProbeInconclusive { address: Ipv4Addr, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for engine operations
pub type IpamResult<T> = Result<T, IpamError>;

impl IpamError {
    /// Short machine-readable kind, used in result records
    pub fn kind(&self) -> &'static str {
        match self {
            IpamError::Configuration(_) => "configuration",
            IpamError::NotFound { .. } => "not_found",
            IpamError::Validation(_) => "validation",
            IpamError::IntegrityConflict { .. } => "integrity_conflict",
            IpamError::Store(_) => "store",
            IpamError::Exhausted { .. } => "exhausted",
            IpamError::ProbeInconclusive { .. } => "probe_inconclusive",
            IpamError::Serialization(_) => "serialization",
        }
    }

    /// Shorthand for [`IpamError::NotFound`]
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        IpamError::NotFound {
            entity,
            key: key.into(),
        }
    }
}

impl From<StoreError> for IpamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { key, reason } => IpamError::IntegrityConflict { key, reason },
            StoreError::Duplicate { key, count } => IpamError::IntegrityConflict {
                key,
                reason: format!("natural key matched {} records", count),
            },
            StoreError::Missing { entity, key } => IpamError::NotFound { entity, key },
            other => IpamError::Store(other.to_string()),
        }
    }
}

impl From<NetworkError> for IpamError {
    fn from(err: NetworkError) -> Self {
        IpamError::Validation(err.to_string())
    }
}

impl From<TransitionError> for IpamError {
    fn from(err: TransitionError) -> Self {
        IpamError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for IpamError {
    fn from(err: serde_json::Error) -> Self {
        IpamError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflict_becomes_integrity_conflict() {
        let err: IpamError = StoreError::Conflict {
            key: "object h1".to_string(),
            reason: "duplicate entry".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "integrity_conflict");
    }

    #[test]
    fn test_store_duplicate_reports_count() {
        let err: IpamError = StoreError::Duplicate {
            key: "port h1/eth0".to_string(),
            count: 2,
        }
        .into();
        assert!(err.to_string().contains("matched 2 records"));
    }

    #[test]
    fn test_store_unavailable_stays_store_error() {
        let err: IpamError = StoreError::Unavailable("connection refused".to_string()).into();
        assert_eq!(err.kind(), "store");
    }

    #[test]
    fn test_exhausted_names_tags() {
        let err = IpamError::Exhausted {
            tags: vec!["LAB1".to_string(), "trust".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("LAB1"));
        assert!(msg.contains("trust"));
    }
}
