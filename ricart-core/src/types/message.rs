use serde::{Deserialize, Serialize};

use super::{ClientId, ResourceName, ResourceRequest, Timestamp};

/// The two message kinds exchanged between clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Permission request for a resource
    Request {
        from: ClientId,
        resource: ResourceName,
        timestamp: Timestamp,
    },
    /// Permission granted for the sender's view of `resource`
    Acknowledge {
        from: ClientId,
        resource: ResourceName,
    },
}

impl Message {
    pub fn request(request: &ResourceRequest) -> Self {
        Message::Request {
            from: request.requester,
            resource: request.resource.clone(),
            timestamp: request.timestamp,
        }
    }

    pub fn acknowledge(from: ClientId, resource: ResourceName) -> Self {
        Message::Acknowledge { from, resource }
    }

    pub fn sender(&self) -> ClientId {
        match self {
            Message::Request { from, .. } | Message::Acknowledge { from, .. } => *from,
        }
    }
}

/// An outbound message together with its destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub to: ClientId,
    pub message: Message,
}

impl Envelope {
    pub fn new(to: ClientId, message: Message) -> Self {
        Self { to, message }
    }
}
