pub mod config;
pub mod coordination;
pub mod lifecycle;
pub mod registration;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use config::RegistrarConfig;
pub use registration::{EventWriter, RegistrationManager};
pub use types::error::{RegistrarError, Result};
pub use types::{Event, EventKind, RedisState};
