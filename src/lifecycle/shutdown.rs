use super::{Component, ShutdownResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    Stopping,
    Complete,
}

/// Stops registered components in priority order, each bounded by a timeout.
pub struct ShutdownCoordinator {
    components: RwLock<Vec<Arc<dyn Component>>>,
    phase_tx: watch::Sender<ShutdownPhase>,
    phase_rx: watch::Receiver<ShutdownPhase>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (phase_tx, phase_rx) = watch::channel(ShutdownPhase::Running);
        Self {
            components: RwLock::new(Vec::new()),
            phase_tx,
            phase_rx,
        }
    }

    pub async fn register(&self, component: Arc<dyn Component>) {
        tracing::info!(name = component.name(), "Registering component");
        self.components.write().await.push(component);
    }

    pub async fn count(&self) -> usize {
        self.components.read().await.len()
    }

    pub fn phase_receiver(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase_rx.clone()
    }

    /// Components get `timeout` to stop on their own and the same again as
    /// grace before they are force stopped.
    pub async fn shutdown(&self, timeout: Duration) -> Vec<(&'static str, ShutdownResult)> {
        let mut components = self.components.read().await.clone();
        components.sort_by_key(|c| c.shutdown_priority());

        let _ = self.phase_tx.send(ShutdownPhase::Stopping);
        let mut results = Vec::with_capacity(components.len());

        for component in &components {
            let name = component.name();
            tracing::info!(name, "Shutting down component");

            let result = match tokio::time::timeout(timeout * 2, component.shutdown(timeout)).await
            {
                Ok(r) => r,
                Err(_) => {
                    tracing::warn!(name, "Component shutdown timed out, force stopping");
                    component.force_stop().await;
                    ShutdownResult::TimedOut
                }
            };

            results.push((name, result));
        }

        let _ = self.phase_tx.send(ShutdownPhase::Complete);
        tracing::info!("Shutdown complete");

        results
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
