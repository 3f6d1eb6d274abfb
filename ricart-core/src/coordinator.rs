//! Async driver around [`ClientState`].
//!
//! One coordinator per client. The acquire path and the inbound handler
//! share the client's state through a single mutex which is never held
//! across an `.await`; waiting for the quorum happens on a `Notify` so
//! inbound messages keep flowing while a request is outstanding.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::error::{CoordinatorError, Result};
use crate::infrastructure::{AccessLog, ResourceStore, Transport};
use crate::infrastructure_in_memory::Inbox;
use crate::state::ClientState;
use crate::types::{Access, ClientId, Envelope, Message, PendingState, ResourceName, ResourceRequest};

pub struct MutualExclusionCoordinator<T, S, L> {
    id: ClientId,
    state: Mutex<ClientState>,
    granted: Notify,
    transport: T,
    store: S,
    log: L,
}

impl<T, S, L> MutualExclusionCoordinator<T, S, L>
where
    T: Transport,
    S: ResourceStore,
    L: AccessLog,
{
    pub fn new(
        id: ClientId,
        peers: impl IntoIterator<Item = ClientId>,
        transport: T,
        store: S,
        log: L,
    ) -> Self {
        Self::with_state(ClientState::new(id, peers), transport, store, log)
    }

    /// Start from an existing state machine (e.g. one with a preset clock).
    pub fn with_state(state: ClientState, transport: T, store: S, log: L) -> Self {
        Self {
            id: state.id(),
            state: Mutex::new(state),
            granted: Notify::new(),
            transport,
            store,
            log,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn peers(&self) -> BTreeSet<ClientId> {
        self.lock().peers().clone()
    }

    pub fn state(&self, resource: &ResourceName) -> PendingState {
        self.lock().state(resource)
    }

    pub fn ack_count(&self, resource: &ResourceName) -> usize {
        self.lock().ack_count(resource)
    }

    pub fn deferred_len(&self) -> usize {
        self.lock().deferred_len()
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    // Sends happen under the state lock so per-peer order matches the
    // order of state transitions. `Transport::send` never blocks.
    fn dispatch(&self, envelopes: Vec<Envelope>) {
        for envelope in envelopes {
            self.transport.send(envelope.to, envelope.message);
        }
    }

    /// Broadcast a request for `resource` and wait until every peer has
    /// acknowledged it. On return the client is `Holding` the resource.
    ///
    /// # Cancel safety
    ///
    /// Dropping the future while it waits (for example under
    /// `tokio::time::timeout`) abandons the request. Peers have already
    /// ordered it, so it stays outstanding until its last acknowledgment
    /// arrives and is then released at once, flushing deferred replies.
    /// A later `acquire` of the same resource takes the abandoned request
    /// over instead of issuing a new one; any other resource is refused
    /// with `ProtocolViolation` until the abandoned request completes.
    pub async fn acquire(&self, resource: impl Into<ResourceName>) -> Result<ResourceRequest> {
        let resource = resource.into();

        self.store
            .open(&resource)
            .map_err(|source| CoordinatorError::ResourceUnavailable {
                resource: resource.clone(),
                source,
            })?;

        let request = {
            let mut state = self.lock();
            let (request, envelopes) = state.begin(resource)?;
            self.dispatch(envelopes);
            request
        };

        let mut guard = AbandonOnDrop {
            coordinator: self,
            resource: request.resource.clone(),
            armed: true,
        };
        self.wait_for_grant(&request.resource).await;
        guard.armed = false;

        tracing::info!(
            client = %self.id,
            resource = %request.resource,
            timestamp = %request.timestamp,
            "Entered critical section"
        );

        Ok(request)
    }

    async fn wait_for_grant(&self, resource: &ResourceName) {
        loop {
            let notified = self.granted.notified();
            let holding = self.lock().state(resource) == PendingState::Holding;
            if holding {
                return;
            }
            notified.await;
        }
    }

    fn abandon(&self, resource: &ResourceName) {
        let mut state = self.lock();
        let replies = state.abandon(resource);
        self.dispatch(replies);
        drop(state);

        tracing::info!(client = %self.id, resource = %resource, "Acquire cancelled");
    }

    /// Leave the critical section and send every deferred acknowledgment.
    pub fn release(&self, resource: &ResourceName) -> Result<()> {
        let mut state = self.lock();
        let replies = state.release(resource)?;
        let deferred = replies.len();
        self.dispatch(replies);
        drop(state);

        tracing::info!(
            client = %self.id,
            resource = %resource,
            deferred,
            "Left critical section"
        );
        Ok(())
    }

    /// Exclusive read. The resource is always released before returning.
    ///
    /// Cancel safe: see [`acquire`](Self::acquire). Nothing awaits between
    /// entering the critical section and releasing it.
    pub async fn read(&self, resource: impl Into<ResourceName>) -> Result<String> {
        let request = self.acquire(resource).await?;
        let outcome = self.store.read(&request.resource);
        if outcome.is_ok() {
            self.log
                .record(self.id, Access::Read, &request.resource, request.timestamp);
        }
        self.finish(&request, outcome)
    }

    /// Exclusive write. The resource is always released before returning.
    ///
    /// Cancel safe in the same way as [`read`](Self::read).
    pub async fn write(&self, resource: impl Into<ResourceName>, content: &str) -> Result<()> {
        let request = self.acquire(resource).await?;
        let outcome = self.store.write(&request.resource, content);
        if outcome.is_ok() {
            self.log
                .record(self.id, Access::Write, &request.resource, request.timestamp);
        }
        self.finish(&request, outcome)
    }

    fn finish<V>(
        &self,
        request: &ResourceRequest,
        outcome: std::result::Result<V, crate::error::StoreError>,
    ) -> Result<V> {
        self.release(&request.resource)?;
        outcome.map_err(|source| {
            tracing::warn!(
                client = %self.id,
                resource = %request.resource,
                error = %source,
                "Store operation failed inside critical section"
            );
            CoordinatorError::IoFailure {
                resource: request.resource.clone(),
                source,
            }
        })
    }

    /// Inbound handler for one message.
    pub fn handle(&self, message: Message) {
        let mut state = self.lock();
        let received = state.receive(&message);
        self.dispatch(received.replies);
        drop(state);

        if let Some(resource) = received.granted {
            tracing::debug!(client = %self.id, resource = %resource, "Quorum reached");
            self.granted.notify_one();
        }
    }

    /// Consume `inbox` until every sender is dropped.
    pub async fn serve(&self, mut inbox: Inbox) {
        while let Some(message) = inbox.recv().await {
            self.handle(message);
        }
        tracing::debug!(client = %self.id, "Inbox closed");
    }
}

/// Abandons the pending request if `acquire` is dropped mid-wait.
struct AbandonOnDrop<'a, T, S, L>
where
    T: Transport,
    S: ResourceStore,
    L: AccessLog,
{
    coordinator: &'a MutualExclusionCoordinator<T, S, L>,
    resource: ResourceName,
    armed: bool,
}

impl<T, S, L> Drop for AbandonOnDrop<'_, T, S, L>
where
    T: Transport,
    S: ResourceStore,
    L: AccessLog,
{
    fn drop(&mut self) {
        if self.armed {
            self.coordinator.abandon(&self.resource);
        }
    }
}
