//! Coordination service client trait
//!
//! The minimal surface the registration path needs from a hierarchical
//! coordination service (ZooKeeper-style). Session handling, watches and
//! transport retries belong to the implementation, not to callers.

use async_trait::async_trait;

use crate::Result;

/// Node lifetime and naming semantics requested on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    Persistent,
    Ephemeral,
    PersistentSequential,
    EphemeralSequential,
}

impl CreateMode {
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral | Self::EphemeralSequential)
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Self::PersistentSequential | Self::EphemeralSequential)
    }
}

/// Expected version for conditional operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Any,
    Exact(i32),
}

#[async_trait]
pub trait CoordinationClient: Send + Sync {
    /// Create `path` and any missing ancestors as persistent, empty nodes.
    /// Succeeds if the path already exists.
    async fn ensure_path(&self, path: &str) -> Result<()>;

    /// Whether a node currently exists at `path`.
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Create a world-readable, world-writable node and return its full
    /// path. For sequential modes the service appends a monotonically
    /// increasing suffix to `path`.
    async fn create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<String>;

    /// Delete the node at `path` if its version matches.
    async fn delete(&self, path: &str, version: Version) -> Result<()>;
}
