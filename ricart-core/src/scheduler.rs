use crate::types::{PendingState, ResourceRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    /// Reply to the requester now
    Acknowledge,
    /// Withhold the reply until the local client releases
    Defer,
}

#[derive(Debug, Clone)]
pub struct ReplyVerdict {
    pub status: VerdictStatus,
    pub reason: String,
}

/// Decides whether an incoming request is acknowledged immediately.
pub struct ReplyScheduler;

impl ReplyScheduler {
    /// `local_state` and `local_pending` describe this client's view of
    /// the resource named in `incoming`.
    pub fn decide(
        local_state: PendingState,
        local_pending: Option<&ResourceRequest>,
        incoming: &ResourceRequest,
    ) -> ReplyVerdict {
        match (local_state, local_pending) {
            (PendingState::Idle, _) | (PendingState::Requesting, None) => ReplyVerdict {
                status: VerdictStatus::Acknowledge,
                reason: "not competing for the resource".into(),
            },
            (PendingState::Holding, _) => ReplyVerdict {
                status: VerdictStatus::Defer,
                reason: "resource is held locally".into(),
            },
            (PendingState::Requesting, Some(own)) => {
                if incoming.priority() < own.priority() {
                    // Remote request is earlier (or wins the id tie-break)
                    ReplyVerdict {
                        status: VerdictStatus::Acknowledge,
                        reason: format!(
                            "remote ({}, {}) precedes local ({}, {})",
                            incoming.timestamp, incoming.requester, own.timestamp, own.requester
                        ),
                    }
                } else {
                    ReplyVerdict {
                        status: VerdictStatus::Defer,
                        reason: format!(
                            "local ({}, {}) precedes remote ({}, {})",
                            own.timestamp, own.requester, incoming.timestamp, incoming.requester
                        ),
                    }
                }
            }
        }
    }
}
