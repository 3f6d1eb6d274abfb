use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Identifier of a participating client. Lower ids win timestamp ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u32);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar Lamport timestamp
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a shared file (e.g. "file1.txt")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// What a client does inside the critical section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// Client reads the current content
    Read,
    /// Client replaces the content
    Write,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Access::Read => write!(f, "Read"),
            Access::Write => write!(f, "Write"),
        }
    }
}

/// A timestamped request for exclusive access to one resource.
///
/// Requests are totally ordered by `(timestamp, requester)`. Two requests
/// carrying the same timestamp are ordered by requester id ascending, so
/// every client reaches the same verdict about which one goes first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub requester: ClientId,
    pub resource: ResourceName,
    pub timestamp: Timestamp,
}

impl ResourceRequest {
    pub fn new(requester: ClientId, resource: ResourceName, timestamp: Timestamp) -> Self {
        Self {
            requester,
            resource,
            timestamp,
        }
    }

    /// The `(timestamp, requester)` pair the total order is defined on
    pub fn priority(&self) -> (Timestamp, ClientId) {
        (self.timestamp, self.requester)
    }
}

impl Ord for ResourceRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .cmp(&other.priority())
            .then_with(|| self.resource.cmp(&other.resource))
    }
}

impl PartialOrd for ResourceRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per (client, resource) protocol state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PendingState {
    /// No outstanding request
    #[default]
    Idle,
    /// Request broadcast, waiting for acknowledgments
    Requesting,
    /// Every peer acknowledged; inside the critical section
    Holding,
}
