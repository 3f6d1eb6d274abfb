use crate::error::StoreError;
use crate::types::{Access, ClientId, Message, ResourceName, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Collaborators the coordinator drives. They are synchronous and must not
// block: the coordinator calls `Transport::send` while holding its state lock.

/// Point-to-point delivery of protocol messages.
///
/// Implementations must be reliable and FIFO per pair of clients, and
/// `send` must return as soon as the message is queued.
pub trait Transport: Send + Sync {
    fn send(&self, to: ClientId, message: Message);
}

/// Owner of the shared file contents. Only called inside the critical section.
pub trait ResourceStore: Send + Sync {
    /// Check that `name` exists and return its content
    fn open(&self, name: &ResourceName) -> Result<String, StoreError>;

    fn read(&self, name: &ResourceName) -> Result<String, StoreError>;

    fn write(&self, name: &ResourceName, content: &str) -> Result<(), StoreError>;
}

/// Fire-and-forget record of completed accesses. Implementations handle
/// their own failures.
pub trait AccessLog: Send + Sync {
    fn record(&self, client: ClientId, access: Access, resource: &ResourceName, timestamp: Timestamp);
}

/// One line of the access log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub client: ClientId,
    pub access: Access,
    pub resource: ResourceName,
    pub timestamp: Timestamp,
}

impl std::fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Client {} {} file {} at timestamp {}",
            self.client, self.access, self.resource, self.timestamp
        )
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, to: ClientId, message: Message) {
        (**self).send(to, message)
    }
}

impl<S: ResourceStore + ?Sized> ResourceStore for Arc<S> {
    fn open(&self, name: &ResourceName) -> Result<String, StoreError> {
        (**self).open(name)
    }

    fn read(&self, name: &ResourceName) -> Result<String, StoreError> {
        (**self).read(name)
    }

    fn write(&self, name: &ResourceName, content: &str) -> Result<(), StoreError> {
        (**self).write(name, content)
    }
}

impl<L: AccessLog + ?Sized> AccessLog for Arc<L> {
    fn record(&self, client: ClientId, access: Access, resource: &ResourceName, timestamp: Timestamp) {
        (**self).record(client, access, resource, timestamp)
    }
}
