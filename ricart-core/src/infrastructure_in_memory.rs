use crate::error::StoreError;
use crate::infrastructure::{AccessLog, AccessRecord, ResourceStore, Transport};
use crate::types::{Access, ClientId, Envelope, Message, ResourceName, Timestamp};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}

// ─── Transport ──────────────────────────────────────────────────────────────

/// A fully connected set of in-process mailboxes, one per client.
///
/// Each mailbox is an unbounded mpsc channel, so delivery is FIFO per
/// sender and sending never blocks.
pub struct ChannelNetwork {
    senders: Arc<HashMap<ClientId, UnboundedSender<Message>>>,
    inboxes: HashMap<ClientId, Inbox>,
}

impl ChannelNetwork {
    pub fn new(ids: impl IntoIterator<Item = ClientId>) -> Self {
        let mut senders = HashMap::new();
        let mut inboxes = HashMap::new();
        for id in ids {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(id, tx);
            inboxes.insert(id, Inbox { rx });
        }
        Self {
            senders: Arc::new(senders),
            inboxes,
        }
    }

    /// Sorted ids of every participant
    pub fn ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.senders.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Hand out the transport and mailbox of `id`. Each mailbox can be
    /// taken once; later calls return `None`.
    pub fn connect(&mut self, id: ClientId) -> Option<(ChannelTransport, Inbox)> {
        let inbox = self.inboxes.remove(&id)?;
        let transport = ChannelTransport {
            from: id,
            senders: Arc::clone(&self.senders),
        };
        Some((transport, inbox))
    }
}

#[derive(Clone)]
pub struct ChannelTransport {
    from: ClientId,
    senders: Arc<HashMap<ClientId, UnboundedSender<Message>>>,
}

impl Transport for ChannelTransport {
    fn send(&self, to: ClientId, message: Message) {
        match self.senders.get(&to) {
            Some(tx) => {
                if tx.send(message).is_err() {
                    tracing::warn!(from = %self.from, to = %to, "Mailbox closed, message dropped");
                }
            }
            None => tracing::warn!(from = %self.from, to = %to, "Unknown destination, message dropped"),
        }
    }
}

/// Receiving end of a client's mailbox
pub struct Inbox {
    rx: UnboundedReceiver<Message>,
}

impl Inbox {
    /// Next message, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}

/// Transport that only remembers what was sent. Used to inspect a single
/// client's output without a network.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Envelope>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Envelope> {
        lock(&self.sent).clone()
    }

    pub fn take(&self) -> Vec<Envelope> {
        std::mem::take(&mut *lock(&self.sent))
    }
}

impl Transport for RecordingTransport {
    fn send(&self, to: ClientId, message: Message) {
        lock(&self.sent).push(Envelope::new(to, message));
    }
}

// ─── Resource store ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StoredResource {
    content: String,
    history: Vec<String>,
}

/// Shared in-memory file contents. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryResourceStore {
    resources: Arc<Mutex<HashMap<ResourceName, StoredResource>>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(name: impl Into<ResourceName>, content: impl Into<String>) -> Self {
        let store = Self::new();
        store.insert(name, content);
        store
    }

    /// Create or overwrite a resource outside the protocol (bootstrap only)
    pub fn insert(&self, name: impl Into<ResourceName>, content: impl Into<String>) {
        lock(&self.resources).insert(
            name.into(),
            StoredResource {
                content: content.into(),
                history: Vec::new(),
            },
        );
    }

    /// Every content written through `write`, oldest first
    pub fn history(&self, name: &ResourceName) -> Vec<String> {
        lock(&self.resources)
            .get(name)
            .map(|r| r.history.clone())
            .unwrap_or_default()
    }
}

impl ResourceStore for InMemoryResourceStore {
    fn open(&self, name: &ResourceName) -> Result<String, StoreError> {
        self.read(name)
    }

    fn read(&self, name: &ResourceName) -> Result<String, StoreError> {
        lock(&self.resources)
            .get(name)
            .map(|r| r.content.clone())
            .ok_or_else(|| StoreError::NotFound(name.clone()))
    }

    fn write(&self, name: &ResourceName, content: &str) -> Result<(), StoreError> {
        let mut resources = lock(&self.resources);
        let resource = resources.entry(name.clone()).or_default();
        resource.content = content.to_string();
        resource.history.push(content.to_string());
        Ok(())
    }
}

// ─── Access logs ────────────────────────────────────────────────────────────

/// Emits each access as a structured `tracing` event.
#[derive(Clone, Copy, Default)]
pub struct TracingAccessLog;

impl AccessLog for TracingAccessLog {
    fn record(&self, client: ClientId, access: Access, resource: &ResourceName, timestamp: Timestamp) {
        tracing::info!(
            client = %client,
            access = %access,
            resource = %resource,
            timestamp = %timestamp,
            "Access recorded"
        );
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemoryAccessLog {
    records: Arc<Mutex<Vec<AccessRecord>>>,
}

impl MemoryAccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AccessRecord> {
        lock(&self.records).clone()
    }
}

impl AccessLog for MemoryAccessLog {
    fn record(&self, client: ClientId, access: Access, resource: &ResourceName, timestamp: Timestamp) {
        lock(&self.records).push(AccessRecord {
            client,
            access,
            resource: resource.clone(),
            timestamp,
        });
    }
}
