use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MasterElected,
    MasterNotElected,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MasterElected => write!(f, "master_elected"),
            Self::MasterNotElected => write!(f, "master_not_elected"),
        }
    }
}

/// Snapshot of the datastore as seen by the election component.
///
/// Only ever logged; nothing in the registration path interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisState {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    kind: EventKind,
    #[serde(default)]
    redis_state: RedisState,
}

impl Event {
    pub fn new(kind: EventKind, redis_state: RedisState) -> Self {
        Self { kind, redis_state }
    }

    pub fn master_elected(redis_state: RedisState) -> Self {
        Self::new(EventKind::MasterElected, redis_state)
    }

    pub fn master_not_elected(redis_state: RedisState) -> Self {
        Self::new(EventKind::MasterNotElected, redis_state)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn redis_state(&self) -> &RedisState {
        &self.redis_state
    }
}
