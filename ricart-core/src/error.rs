//! Error types surfaced by the coordinator and its collaborators.

use thiserror::Error;

use crate::types::{ClientId, ResourceName};

/// Failures reported by a `ResourceStore`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The named resource does not exist in the store.
    #[error("resource '{0}' not found")]
    NotFound(ResourceName),

    /// The backing medium rejected the operation.
    #[error("I/O failure on '{name}': {message}")]
    Io { name: ResourceName, message: String },
}

/// Errors returned by acquire/release and the access operations built on them.
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The client broke the single-request protocol (second concurrent
    /// request, or release of a resource it does not hold).
    #[error("protocol violation by client {client} on '{resource}': {reason}")]
    ProtocolViolation {
        client: ClientId,
        resource: ResourceName,
        reason: String,
    },

    /// The store could not open the resource. Nothing was broadcast.
    #[error("resource '{resource}' is unavailable: {source}")]
    ResourceUnavailable {
        resource: ResourceName,
        #[source]
        source: StoreError,
    },

    /// The store operation failed inside the critical section. The
    /// resource was released and deferred replies were sent.
    #[error("I/O failure on '{resource}' after acquiring exclusion: {source}")]
    IoFailure {
        resource: ResourceName,
        #[source]
        source: StoreError,
    },

    /// Invalid simulation or CLI configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoordinatorError {
    pub(crate) fn violation(
        client: ClientId,
        resource: &ResourceName,
        reason: impl Into<String>,
    ) -> Self {
        CoordinatorError::ProtocolViolation {
            client,
            resource: resource.clone(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
