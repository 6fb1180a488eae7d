mod manager;
mod metrics;
mod payload;
mod registrar;
mod runner;

pub use manager::RegistrationManager;
pub use metrics::{MetricsSnapshot, RegistrationMetrics};
pub use payload::{MemberPayload, ServiceEndpoint, STATUS_ALIVE};
pub use registrar::{Registrar, RegistrationSnapshot};
pub use runner::{EventRunner, EventWriter, Stimulus};
