mod message;
mod primitives;

pub use message::{Envelope, Message};
pub use primitives::{Access, ClientId, PendingState, ResourceName, ResourceRequest, Timestamp};
