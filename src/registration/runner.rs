use std::sync::Arc;

use tokio::sync::mpsc;

use super::registrar::Registrar;
use crate::types::{Event, EventKind, RegistrarError, Result};

/// Everything the control loop reacts to, in one FIFO queue.
#[derive(Debug)]
pub enum Stimulus {
    Event(Event),
    Stop,
}

/// Sink handed to the election component. Unbounded, so senders never wait
/// on a slow registration.
#[derive(Clone)]
pub struct EventWriter {
    sender: mpsc::UnboundedSender<Stimulus>,
}

impl EventWriter {
    pub(crate) fn new(sender: mpsc::UnboundedSender<Stimulus>) -> Self {
        Self { sender }
    }

    pub fn send(&self, event: Event) -> Result<()> {
        self.sender
            .send(Stimulus::Event(event))
            .map_err(|_| RegistrarError::Internal("Registration event queue closed".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

pub struct EventRunner {
    queue: mpsc::UnboundedReceiver<Stimulus>,
    registrar: Arc<Registrar>,
}

impl EventRunner {
    pub fn new(queue: mpsc::UnboundedReceiver<Stimulus>, registrar: Arc<Registrar>) -> Self {
        Self { queue, registrar }
    }

    /// Consume stimuli one at a time until a stop arrives or every sender is
    /// gone, then retract the registration. Returns the number of election
    /// events handled.
    pub async fn run(mut self) -> usize {
        tracing::info!(
            enabled = self.registrar.is_enabled(),
            base_path = self.registrar.base_path(),
            "Registration event runner started"
        );
        let mut processed = 0;

        loop {
            match self.queue.recv().await {
                Some(Stimulus::Event(event)) => {
                    self.dispatch(&event).await;
                    processed += 1;
                }
                Some(Stimulus::Stop) => {
                    tracing::info!("Shutting down registration event runner");
                    break;
                }
                None => {
                    tracing::info!("Registration event queue closed, shutting down");
                    break;
                }
            }
        }

        self.queue.close();
        self.registrar.deregister_master().await;
        tracing::info!(processed, "Registration event runner stopped");
        processed
    }

    async fn dispatch(&self, event: &Event) {
        self.registrar.metrics().inc_events();
        let state = event.redis_state();
        tracing::debug!(role = %state.role, info = %state.info, kind = %event.kind(), "Election event");

        match event.kind() {
            EventKind::MasterElected => {
                tracing::info!(redis_addr = %self.registrar.endpoint(), "Elected as master");
                self.registrar.register_master().await;
            }
            EventKind::MasterNotElected => {
                self.registrar.deregister_master().await;
            }
        }
    }
}
