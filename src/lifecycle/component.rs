use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ShutdownPriority {
    First = 0,
    #[default]
    Normal = 50,
    Last = 100,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded { reason: String },
    Unhealthy { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHealth {
    pub status: HealthStatus,
}

impl ComponentHealth {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Degraded {
                reason: reason.into(),
            },
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy {
                reason: reason.into(),
            },
        }
    }
}

impl Default for ComponentHealth {
    fn default() -> Self {
        Self {
            status: HealthStatus::Healthy,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ShutdownResult {
    Complete { events_processed: usize },
    TimedOut,
    Error(String),
}

#[async_trait]
pub trait Component: Send + Sync {
    fn name(&self) -> &'static str;

    fn shutdown_priority(&self) -> ShutdownPriority {
        ShutdownPriority::Normal
    }

    async fn health(&self) -> ComponentHealth {
        ComponentHealth::default()
    }

    async fn shutdown(&self, timeout: Duration) -> ShutdownResult;

    async fn force_stop(&self);
}
