//! In-process multi-client run: every client writes its own line to one
//! shared resource and reads it back, each access under mutual exclusion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::coordinator::MutualExclusionCoordinator;
use crate::error::{CoordinatorError, Result, StoreError};
use crate::infrastructure::{AccessLog, ResourceStore};
use crate::infrastructure_in_memory::ChannelNetwork;
use crate::types::{ClientId, ResourceName};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of participating clients, ids `1..=clients`
    pub clients: u32,
    pub resource: ResourceName,
    /// Initial content written if the resource does not exist yet
    pub seed: Option<String>,
}

impl SimulationConfig {
    pub fn new(clients: u32, resource: impl Into<ResourceName>) -> Self {
        Self {
            clients,
            resource: resource.into(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.clients == 0 {
            return Err(CoordinatorError::Config("clients must be greater than 0".into()));
        }
        if self.resource.as_str().is_empty() {
            return Err(CoordinatorError::Config("resource is required".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOutcome {
    pub client: ClientId,
    pub wrote: Option<String>,
    pub read: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: String,
    pub resource: ResourceName,
    /// Number of clients the run was started with
    pub clients: u32,
    pub outcomes: Vec<ClientOutcome>,
    pub final_content: Option<String>,
}

impl SimulationReport {
    /// True when every started client reported back without an error.
    pub fn succeeded(&self) -> bool {
        self.outcomes.len() == self.clients as usize
            && self.outcomes.iter().all(|o| o.error.is_none())
    }
}

pub fn client_content(client: ClientId) -> String {
    format!("Content written by Client {}", client)
}

pub struct Simulation<S, L> {
    store: S,
    log: L,
}

impl<S, L> Simulation<S, L>
where
    S: ResourceStore + Clone + 'static,
    L: AccessLog + Clone + 'static,
{
    pub fn new(store: S, log: L) -> Self {
        Self { store, log }
    }

    pub async fn run(&self, config: &SimulationConfig) -> Result<SimulationReport> {
        config.validate()?;

        let run_id = nanoid::nanoid!(10);
        let resource = config.resource.clone();

        if let Some(seed) = &config.seed {
            if let Err(StoreError::NotFound(_)) = self.store.open(&resource) {
                // Bootstrap before any client exists, outside the protocol
                self.store
                    .write(&resource, seed)
                    .map_err(|source| CoordinatorError::IoFailure {
                        resource: resource.clone(),
                        source,
                    })?;
            }
        }

        tracing::info!(run_id = %run_id, clients = config.clients, resource = %resource, "Simulation starting");

        let ids: Vec<ClientId> = (1..=config.clients).map(ClientId).collect();
        let mut network = ChannelNetwork::new(ids.iter().copied());

        let mut inbound = JoinSet::new();
        let mut workloads = JoinSet::new();

        for id in &ids {
            let Some((transport, inbox)) = network.connect(*id) else {
                continue;
            };
            let coordinator = Arc::new(MutualExclusionCoordinator::new(
                *id,
                ids.iter().copied(),
                transport,
                self.store.clone(),
                self.log.clone(),
            ));

            let server = Arc::clone(&coordinator);
            inbound.spawn(async move { server.serve(inbox).await });

            let resource = resource.clone();
            workloads.spawn(async move { run_client(&coordinator, resource).await });
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        while let Some(joined) = workloads.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!(run_id = %run_id, error = %e, "Client task failed"),
            }
        }
        record_missing(&mut outcomes, &ids);
        // Inbound loops never see their channels close: every transport
        // keeps a sender to every mailbox.
        inbound.abort_all();

        let final_content = self.store.read(&resource).ok();

        tracing::info!(run_id = %run_id, completed = outcomes.len(), "Simulation finished");

        Ok(SimulationReport {
            run_id,
            resource,
            clients: config.clients,
            outcomes,
            final_content,
        })
    }
}

/// Add a failed outcome for every client that never reported, then sort
/// by client id.
pub(crate) fn record_missing(outcomes: &mut Vec<ClientOutcome>, ids: &[ClientId]) {
    for id in ids {
        if !outcomes.iter().any(|o| o.client == *id) {
            outcomes.push(ClientOutcome {
                client: *id,
                wrote: None,
                read: None,
                error: Some("client task did not complete".to_string()),
            });
        }
    }
    outcomes.sort_by_key(|o| o.client);
}

async fn run_client<T, S, L>(
    coordinator: &MutualExclusionCoordinator<T, S, L>,
    resource: ResourceName,
) -> ClientOutcome
where
    T: crate::infrastructure::Transport,
    S: ResourceStore,
    L: AccessLog,
{
    let client = coordinator.id();
    let content = client_content(client);
    let mut outcome = ClientOutcome {
        client,
        wrote: None,
        read: None,
        error: None,
    };

    if let Err(e) = coordinator.write(resource.clone(), &content).await {
        tracing::warn!(client = %client, error = %e, "Write failed");
        outcome.error = Some(e.to_string());
        return outcome;
    }
    outcome.wrote = Some(content);

    match coordinator.read(resource).await {
        Ok(read) => outcome.read = Some(read),
        Err(e) => {
            tracing::warn!(client = %client, error = %e, "Read failed");
            outcome.error = Some(e.to_string());
        }
    }

    outcome
}
