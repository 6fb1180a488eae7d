mod component;
mod shutdown;

pub use component::{Component, ComponentHealth, HealthStatus, ShutdownPriority, ShutdownResult};
pub use shutdown::{ShutdownCoordinator, ShutdownPhase};
