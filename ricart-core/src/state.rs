//! Pure per-client protocol state machine.
//!
//! `ClientState` performs no I/O: every transition returns the envelopes
//! the caller must hand to the transport. The async coordinator wraps it
//! in a mutex so the acquire driver and the inbound handler are serialized.

use crate::clock::LogicalClock;
use crate::deferral::DeferralQueue;
use crate::error::{CoordinatorError, Result};
use crate::registry::RequestRegistry;
use crate::scheduler::{ReplyScheduler, VerdictStatus};
use crate::types::{
    ClientId, Envelope, Message, PendingState, ResourceName, ResourceRequest, Timestamp,
};
use std::collections::BTreeSet;

/// Outcome of handling one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Received {
    /// Acknowledgments to send right away
    pub replies: Vec<Envelope>,
    /// Set when this message completed the quorum for our own request
    pub granted: Option<ResourceName>,
}

#[derive(Debug, Clone)]
pub struct ClientState {
    id: ClientId,
    clock: LogicalClock,
    registry: RequestRegistry,
    deferred: DeferralQueue,
    /// Outstanding request nobody is waiting for any more
    abandoned: Option<ResourceName>,
}

impl ClientState {
    pub fn new(id: ClientId, peers: impl IntoIterator<Item = ClientId>) -> Self {
        Self::with_clock(id, peers, LogicalClock::new())
    }

    pub fn with_clock(
        id: ClientId,
        peers: impl IntoIterator<Item = ClientId>,
        clock: LogicalClock,
    ) -> Self {
        Self {
            id,
            clock,
            registry: RequestRegistry::new(id, peers),
            deferred: DeferralQueue::new(),
            abandoned: None,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn peers(&self) -> &BTreeSet<ClientId> {
        self.registry.peers()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn state(&self, resource: &ResourceName) -> PendingState {
        self.registry.state(resource)
    }

    pub fn pending(&self, resource: &ResourceName) -> Option<&ResourceRequest> {
        self.registry.pending(resource)
    }

    pub fn ack_count(&self, resource: &ResourceName) -> usize {
        self.registry.ack_count(resource)
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn is_abandoned(&self, resource: &ResourceName) -> bool {
        self.abandoned.as_ref() == Some(resource)
    }

    /// Issue a request: tick, register, and address one `Request` to
    /// every peer. With no peers the request is held immediately.
    ///
    /// If an abandoned request for the same resource is still outstanding
    /// it is taken over instead: no tick, nothing to send.
    pub fn begin(&mut self, resource: ResourceName) -> Result<(ResourceRequest, Vec<Envelope>)> {
        if self.is_abandoned(&resource) {
            if let Some(request) = self.registry.pending(&resource).cloned() {
                self.abandoned = None;
                tracing::debug!(client = %self.id, resource = %resource, "Abandoned request resumed");
                return Ok((request, Vec::new()));
            }
        }
        self.ensure_idle(&resource)?;

        let timestamp = self.clock.tick();
        let request = ResourceRequest::new(self.id, resource, timestamp);
        self.registry.register(request.clone())?;

        if self.registry.is_satisfied(&request.resource) {
            self.registry.mark_holding(&request.resource);
        }

        let message = Message::request(&request);
        let envelopes = self
            .registry
            .peers()
            .iter()
            .map(|peer| Envelope::new(*peer, message.clone()))
            .collect();

        tracing::debug!(
            client = %self.id,
            resource = %request.resource,
            timestamp = %timestamp,
            "Request issued"
        );

        Ok((request, envelopes))
    }

    /// Message-receipt protocol.
    pub fn receive(&mut self, message: &Message) -> Received {
        let mut received = Received::default();

        if !self.registry.peers().contains(&message.sender()) {
            tracing::warn!(client = %self.id, from = %message.sender(), "Message from unknown peer ignored");
            return received;
        }

        match message {
            Message::Request {
                from,
                resource,
                timestamp,
            } => {
                self.clock.observe(*timestamp);

                let incoming = ResourceRequest::new(*from, resource.clone(), *timestamp);
                let verdict = ReplyScheduler::decide(
                    self.registry.state(resource),
                    self.registry.pending(resource),
                    &incoming,
                );

                tracing::debug!(
                    client = %self.id,
                    from = %from,
                    resource = %resource,
                    verdict = ?verdict.status,
                    reason = %verdict.reason,
                    "Request received"
                );

                match verdict.status {
                    VerdictStatus::Acknowledge => received.replies.push(Envelope::new(
                        *from,
                        Message::acknowledge(self.id, resource.clone()),
                    )),
                    VerdictStatus::Defer => self.deferred.defer(*from, resource.clone()),
                }
            }
            Message::Acknowledge { from, resource } => {
                if self.registry.acknowledge(*from, resource) {
                    self.registry.mark_holding(resource);
                    if self.is_abandoned(resource) {
                        // Nobody will use the grant; hand it straight back
                        self.abandoned = None;
                        received.replies.extend(self.release(resource).unwrap_or_default());
                    } else {
                        received.granted = Some(resource.clone());
                    }
                } else if self.registry.state(resource) != PendingState::Requesting {
                    tracing::warn!(
                        client = %self.id,
                        from = %from,
                        resource = %resource,
                        "Acknowledgment without outstanding request ignored"
                    );
                }
            }
        }

        received
    }

    /// Leave the critical section and produce the deferred acknowledgments.
    pub fn release(&mut self, resource: &ResourceName) -> Result<Vec<Envelope>> {
        let state = self.registry.state(resource);
        if state != PendingState::Holding {
            return Err(CoordinatorError::violation(
                self.id,
                resource,
                format!("release while {:?}", state),
            ));
        }

        self.registry.clear(resource)?;

        let id = self.id;
        let replies: Vec<Envelope> = self
            .deferred
            .flush()
            .map(|reply| Envelope::new(reply.from, Message::acknowledge(id, reply.resource)))
            .collect();

        tracing::debug!(
            client = %self.id,
            resource = %resource,
            deferred = replies.len(),
            "Released"
        );

        Ok(replies)
    }

    /// The caller stopped waiting for `resource`.
    ///
    /// A held resource is released right away. A request still collecting
    /// acknowledgments stays outstanding, since peers have already ordered
    /// it, and is released as soon as its last acknowledgment arrives.
    pub fn abandon(&mut self, resource: &ResourceName) -> Vec<Envelope> {
        match self.registry.state(resource) {
            PendingState::Holding => self.release(resource).unwrap_or_default(),
            PendingState::Requesting => {
                self.abandoned = Some(resource.clone());
                tracing::debug!(client = %self.id, resource = %resource, "Request abandoned");
                Vec::new()
            }
            PendingState::Idle => Vec::new(),
        }
    }

    fn ensure_idle(&self, resource: &ResourceName) -> Result<()> {
        if let Some(pending) = self.registry.busy() {
            return Err(CoordinatorError::violation(
                self.id,
                resource,
                format!(
                    "already {:?} '{}'",
                    self.registry.state(&pending.resource),
                    pending.resource
                ),
            ));
        }
        Ok(())
    }
}
