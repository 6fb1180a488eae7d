use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::registrar::Registrar;
use super::runner::{EventRunner, EventWriter, Stimulus};
use crate::config::RegistrarConfig;
use crate::coordination::CoordinationClient;
use crate::lifecycle::{Component, ComponentHealth, ShutdownPriority, ShutdownResult};
use crate::Result;

/// Composition root for master registration: the shared [`Registrar`], the
/// inbound queue and the control task consuming it.
pub struct RegistrationManager {
    registrar: Arc<Registrar>,
    queue: mpsc::UnboundedSender<Stimulus>,
    handle: Mutex<Option<JoinHandle<usize>>>,
}

impl RegistrationManager {
    /// Build the manager and its runner without spawning anything. A `None`
    /// client puts the manager in permanent no-op mode.
    pub fn new(
        config: &RegistrarConfig,
        client: Option<Arc<dyn CoordinationClient>>,
    ) -> Result<(Self, EventRunner)> {
        config.validate()?;

        let registrar = Arc::new(Registrar::new(config, client));
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let runner = EventRunner::new(queue_rx, registrar.clone());

        Ok((
            Self {
                registrar,
                queue,
                handle: Mutex::new(None),
            },
            runner,
        ))
    }

    /// Build the manager and spawn its control task.
    pub fn start(
        config: &RegistrarConfig,
        client: Option<Arc<dyn CoordinationClient>>,
    ) -> Result<Self> {
        let (mut manager, runner) = Self::new(config, client)?;
        *manager.handle.get_mut() = Some(tokio::spawn(runner.run()));
        Ok(manager)
    }

    pub fn event_writer(&self) -> EventWriter {
        EventWriter::new(self.queue.clone())
    }

    pub fn registrar(&self) -> &Arc<Registrar> {
        &self.registrar
    }

    /// Ask the control task to retract and exit. Returns false if it has
    /// already gone.
    pub fn stop(&self) -> bool {
        self.queue.send(Stimulus::Stop).is_ok()
    }

    /// Wait for the spawned control task, if any, returning the number of
    /// events it handled.
    pub async fn wait(&self) -> Option<usize> {
        let handle = self.handle.lock().await.take()?;
        match handle.await {
            Ok(processed) => Some(processed),
            Err(e) => {
                tracing::error!("Registration event runner failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Component for RegistrationManager {
    fn name(&self) -> &'static str {
        "master_registration"
    }

    fn shutdown_priority(&self) -> ShutdownPriority {
        ShutdownPriority::First
    }

    async fn health(&self) -> ComponentHealth {
        if !self.registrar.is_enabled() {
            return ComponentHealth::default();
        }

        let runner_gone = self
            .handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| h.is_finished());
        if runner_gone {
            return ComponentHealth::unhealthy("registration event runner is not running");
        }

        let snapshot = self.registrar.snapshot().await;
        if snapshot.wants_registration && snapshot.registered_path.is_none() {
            return ComponentHealth::degraded(format!(
                "elected master {} is not registered under {}",
                self.registrar.endpoint(),
                self.registrar.base_path()
            ));
        }

        ComponentHealth::default()
    }

    async fn shutdown(&self, timeout: Duration) -> ShutdownResult {
        self.stop();

        {
            let mut slot = self.handle.lock().await;
            let joined = match slot.as_mut() {
                Some(handle) => Some(tokio::time::timeout(timeout, handle).await),
                None => None,
            };
            match joined {
                Some(Ok(Ok(processed))) => {
                    *slot = None;
                    return ShutdownResult::Complete {
                        events_processed: processed,
                    };
                }
                Some(Ok(Err(e))) => {
                    *slot = None;
                    tracing::error!("Registration event runner failed: {}", e);
                }
                Some(Err(_)) => {
                    // left in the slot so force_stop can still abort it
                    tracing::warn!("Registration event runner did not stop in time");
                }
                None => {}
            }
        }

        // Runner is gone or stuck: retract from the teardown path.
        self.registrar.deregister_master().await;

        match self.registrar.registered_path().await {
            Some(path) => ShutdownResult::Error(format!("master still registered at {}", path)),
            None => ShutdownResult::Complete {
                events_processed: self.registrar.metrics().snapshot().events_received as usize,
            },
        }
    }

    async fn force_stop(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            tracing::warn!("Force stopping registration event runner");
            handle.abort();
        }
    }
}
