pub mod error;
pub mod event;

pub use error::{RegistrarError, Result};
pub use event::{Event, EventKind, RedisState};
