use crate::types::{ClientId, ResourceName};
use serde::{Deserialize, Serialize};

/// A withheld acknowledgment, sent when the local client releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredReply {
    pub from: ClientId,
    pub resource: ResourceName,
}

/// Requests this client chose not to acknowledge yet, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct DeferralQueue {
    entries: Vec<DeferredReply>,
}

impl DeferralQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, from: ClientId, resource: ResourceName) {
        self.entries.push(DeferredReply { from, resource });
    }

    /// Take every deferred reply. The queue is empty once this returns;
    /// the returned iterator yields the entries in insertion order once.
    pub fn flush(&mut self) -> DeferredFlush {
        DeferredFlush {
            inner: std::mem::take(&mut self.entries).into_iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One-shot drain of a `DeferralQueue`.
#[derive(Debug)]
pub struct DeferredFlush {
    inner: std::vec::IntoIter<DeferredReply>,
}

impl Iterator for DeferredFlush {
    type Item = DeferredReply;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DeferredFlush {}
