use crate::types::Timestamp;

/// Lamport scalar clock owned by a single client.
#[derive(Debug, Clone, Default)]
pub struct LogicalClock {
    counter: u64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose next `tick` returns `start + 1`.
    pub fn starting_at(start: Timestamp) -> Self {
        Self { counter: start.0 }
    }

    /// Advance for a locally issued request and return the new value.
    ///
    /// Saturates at `u64::MAX`.
    pub fn tick(&mut self) -> Timestamp {
        self.counter = self.counter.saturating_add(1);
        Timestamp(self.counter)
    }

    /// Lamport receive rule: `max(local, remote) + 1`, saturating at `u64::MAX`.
    pub fn observe(&mut self, remote: Timestamp) {
        self.counter = self.counter.max(remote.0).saturating_add(1);
    }

    pub fn now(&self) -> Timestamp {
        Timestamp(self.counter)
    }
}
