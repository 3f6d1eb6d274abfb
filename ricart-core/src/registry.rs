use crate::error::{CoordinatorError, Result};
use crate::types::{ClientId, PendingState, ResourceName, ResourceRequest};
use std::collections::{BTreeSet, HashMap};

/// Set of peers that acknowledged one outstanding request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckCounter {
    acked: BTreeSet<ClientId>,
}

impl AckCounter {
    /// Returns false if `from` had already acknowledged.
    pub fn record(&mut self, from: ClientId) -> bool {
        self.acked.insert(from)
    }

    /// True once every id in `peers` has acknowledged.
    pub fn covers(&self, peers: &BTreeSet<ClientId>) -> bool {
        peers.is_subset(&self.acked)
    }

    pub fn len(&self) -> usize {
        self.acked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acked.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    request: ResourceRequest,
    state: PendingState,
    acks: AckCounter,
}

/// Outstanding and held requests of one client, keyed by resource.
///
/// Keyed by name so the single-request constraint can be lifted later;
/// today `register` refuses a second entry of any resource.
#[derive(Debug, Clone)]
pub struct RequestRegistry {
    owner: ClientId,
    peers: BTreeSet<ClientId>,
    entries: HashMap<ResourceName, Entry>,
}

impl RequestRegistry {
    /// `peers` may include `owner`; it is dropped from the quorum.
    pub fn new(owner: ClientId, peers: impl IntoIterator<Item = ClientId>) -> Self {
        let peers = peers.into_iter().filter(|p| *p != owner).collect();
        Self {
            owner,
            peers,
            entries: HashMap::new(),
        }
    }

    pub fn peers(&self) -> &BTreeSet<ClientId> {
        &self.peers
    }

    /// Store a new request in `Requesting` state.
    pub fn register(&mut self, request: ResourceRequest) -> Result<()> {
        if let Some((busy, entry)) = self.entries.iter().next() {
            return Err(CoordinatorError::violation(
                self.owner,
                &request.resource,
                format!("already {:?} '{}'", entry.state, busy),
            ));
        }

        self.entries.insert(
            request.resource.clone(),
            Entry {
                request,
                state: PendingState::Requesting,
                acks: AckCounter::default(),
            },
        );
        Ok(())
    }

    /// Record an acknowledgment. Returns true if the request for
    /// `resource` is satisfied afterwards.
    ///
    /// Acknowledgments from non-peers, or for a resource that is not
    /// `Requesting`, are ignored.
    pub fn acknowledge(&mut self, from: ClientId, resource: &ResourceName) -> bool {
        if !self.peers.contains(&from) {
            return false;
        }
        match self.entries.get_mut(resource) {
            Some(entry) if entry.state == PendingState::Requesting => {
                entry.acks.record(from);
                entry.acks.covers(&self.peers)
            }
            _ => false,
        }
    }

    pub fn is_satisfied(&self, resource: &ResourceName) -> bool {
        self.entries
            .get(resource)
            .is_some_and(|entry| entry.acks.covers(&self.peers))
    }

    /// `Requesting -> Holding`. Returns false if there was nothing to promote.
    pub fn mark_holding(&mut self, resource: &ResourceName) -> bool {
        match self.entries.get_mut(resource) {
            Some(entry) if entry.state == PendingState::Requesting => {
                entry.state = PendingState::Holding;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, resource: &ResourceName) -> PendingState {
        self.entries
            .get(resource)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    pub fn pending(&self, resource: &ResourceName) -> Option<&ResourceRequest> {
        self.entries.get(resource).map(|entry| &entry.request)
    }

    /// The request this client is currently `Requesting` or `Holding`, if any.
    pub fn busy(&self) -> Option<&ResourceRequest> {
        self.entries.values().next().map(|entry| &entry.request)
    }

    pub fn ack_count(&self, resource: &ResourceName) -> usize {
        self.entries
            .get(resource)
            .map(|entry| entry.acks.len())
            .unwrap_or(0)
    }

    /// Drop the request and its counter, returning the resource to `Idle`.
    pub fn clear(&mut self, resource: &ResourceName) -> Result<ResourceRequest> {
        self.entries
            .remove(resource)
            .map(|entry| entry.request)
            .ok_or_else(|| CoordinatorError::violation(self.owner, resource, "already Idle"))
    }
}
