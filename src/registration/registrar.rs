//! Registration state and the two transitions that mutate it.
//!
//! A single async mutex guards the registered path and is held across every
//! coordination call of a transition, so a registration and a retraction can
//! never interleave. Coordination failures are logged and swallowed here;
//! the next election event is the retry.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

use super::metrics::RegistrationMetrics;
use super::payload::{MemberPayload, ServiceEndpoint};
use crate::config::RegistrarConfig;
use crate::coordination::{CoordinationClient, CreateMode, Version};
use crate::Result;

#[derive(Debug, Default)]
struct RegistrationState {
    registered_path: Option<String>,
    /// Set by the last transition requested, registration or retraction
    wants_registration: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationSnapshot {
    pub registered_path: Option<String>,
    pub wants_registration: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum RegisterOutcome {
    AlreadyRegistered,
    Registered { path: String, stale: Option<String> },
}

pub struct Registrar {
    client: Option<Arc<dyn CoordinationClient>>,
    base_path: String,
    member_prefix: String,
    endpoint: ServiceEndpoint,
    state: Mutex<RegistrationState>,
    metrics: Arc<RegistrationMetrics>,
}

impl Registrar {
    pub fn new(config: &RegistrarConfig, client: Option<Arc<dyn CoordinationClient>>) -> Self {
        Self {
            client,
            base_path: config.base_path.clone(),
            member_prefix: config.member_prefix(),
            endpoint: ServiceEndpoint {
                host: config.host.clone(),
                port: config.port,
            },
            state: Mutex::new(RegistrationState::default()),
            metrics: Arc::new(RegistrationMetrics::new()),
        }
    }

    /// False when no coordination service is configured; every transition is
    /// then a no-op.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn metrics(&self) -> &Arc<RegistrationMetrics> {
        &self.metrics
    }

    pub async fn registered_path(&self) -> Option<String> {
        self.state.lock().await.registered_path.clone()
    }

    pub async fn snapshot(&self) -> RegistrationSnapshot {
        let state = self.state.lock().await;
        RegistrationSnapshot {
            registered_path: state.registered_path.clone(),
            wants_registration: state.wants_registration,
        }
    }

    /// Publish this process as master. Idempotent while the held node still
    /// exists; replaces a registration whose node has disappeared.
    #[instrument(skip(self), fields(base_path = %self.base_path, endpoint = %self.endpoint))]
    pub async fn register_master(&self) {
        let Some(client) = self.client.as_deref() else {
            return;
        };

        let mut state = self.state.lock().await;
        state.wants_registration = true;

        match self.try_register(client, &state).await {
            Ok(RegisterOutcome::AlreadyRegistered) => {
                tracing::debug!(path = ?state.registered_path, "Already registered");
            }
            Ok(RegisterOutcome::Registered { path, stale }) => {
                if let Some(stale) = stale {
                    tracing::warn!(stale = %stale, "Registered node vanished, replacing it");
                }
                tracing::info!(path = %path, "Registered master");
                state.registered_path = Some(path);
                self.metrics.inc_registrations();
            }
            Err(e) => {
                self.metrics.inc_failures();
                tracing::error!(
                    registered_path = ?state.registered_path,
                    error = %e,
                    "Failed to register master"
                );
            }
        }
    }

    async fn try_register(
        &self,
        client: &dyn CoordinationClient,
        state: &RegistrationState,
    ) -> Result<RegisterOutcome> {
        client.ensure_path(&self.base_path).await?;

        let stale = state.registered_path.clone();
        if let Some(path) = &stale {
            if client.exists(path).await? {
                return Ok(RegisterOutcome::AlreadyRegistered);
            }
        }

        let data = MemberPayload::alive(&self.endpoint).to_bytes()?;
        let path = client
            .create(&self.member_prefix, &data, CreateMode::EphemeralSequential)
            .await?;

        Ok(RegisterOutcome::Registered { path, stale })
    }

    /// Retract the registration, if any. On failure the path is kept so a
    /// later retraction or registration can reconcile it.
    #[instrument(skip(self), fields(base_path = %self.base_path, endpoint = %self.endpoint))]
    pub async fn deregister_master(&self) {
        let Some(client) = self.client.as_deref() else {
            return;
        };

        let mut state = self.state.lock().await;
        state.wants_registration = false;

        let Some(path) = state.registered_path.clone() else {
            tracing::debug!("Master not registered, nothing to deregister");
            return;
        };

        match client.delete(&path, Version::Any).await {
            Ok(()) => {
                tracing::info!(path = %path, "Master deregistered");
                state.registered_path = None;
                self.metrics.inc_deregistrations();
            }
            Err(e) => {
                self.metrics.inc_failures();
                tracing::error!(path = %path, error = %e, "Failed to deregister master");
            }
        }
    }
}
