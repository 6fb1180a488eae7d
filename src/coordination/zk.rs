//! ZooKeeper-backed coordination client.
//!
//! The `zookeeper` crate exposes a blocking API; every call is moved onto
//! tokio's blocking pool so the control task never stalls a runtime worker.
//! Session timeouts and reconnects are owned by the crate.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use zookeeper::{Acl, WatchedEvent, Watcher, ZkError, ZooKeeper};

use super::traits::{CoordinationClient, CreateMode, Version};
use crate::types::{RegistrarError, Result};

struct SessionWatcher;

impl Watcher for SessionWatcher {
    fn handle(&self, event: WatchedEvent) {
        tracing::debug!(?event, "ZooKeeper session event");
    }
}

pub struct ZkCoordinator {
    zk: Arc<ZooKeeper>,
}

impl ZkCoordinator {
    /// Connect to a comma-separated `host:port` list, optionally followed by
    /// a chroot (`zk1:2181,zk2:2181/app`).
    pub async fn connect(servers: &str, session_timeout: Duration) -> Result<Self> {
        let connect_string = servers.to_string();
        let zk = tokio::task::spawn_blocking(move || {
            ZooKeeper::connect(&connect_string, session_timeout, SessionWatcher)
        })
        .await
        .map_err(|e| RegistrarError::Internal(format!("ZooKeeper connect task failed: {}", e)))?
        .map_err(|e| {
            RegistrarError::Coordination(format!("failed to connect to {}: {:?}", servers, e))
        })?;

        tracing::info!(servers, "Connected to ZooKeeper");
        Ok(Self { zk: Arc::new(zk) })
    }

    async fn call<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&ZooKeeper) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let zk = self.zk.clone();
        tokio::task::spawn_blocking(move || op(&zk))
            .await
            .map_err(|e| RegistrarError::Internal(format!("ZooKeeper call failed: {}", e)))?
    }
}

#[async_trait]
impl CoordinationClient for ZkCoordinator {
    async fn ensure_path(&self, path: &str) -> Result<()> {
        let path = path.to_string();
        self.call(move |zk| {
            let mut current = String::new();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                current.push('/');
                current.push_str(segment);
                match zk.create(
                    &current,
                    Vec::new(),
                    Acl::open_unsafe().clone(),
                    zookeeper::CreateMode::Persistent,
                ) {
                    Ok(_) | Err(ZkError::NodeExists) => {}
                    Err(e) => return Err(map_error(&current, e)),
                }
            }
            Ok(())
        })
        .await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = path.to_string();
        self.call(move |zk| {
            zk.exists(&path, false)
                .map(|stat| stat.is_some())
                .map_err(|e| map_error(&path, e))
        })
        .await
    }

    async fn create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<String> {
        let path = path.to_string();
        let data = data.to_vec();
        self.call(move |zk| {
            zk.create(&path, data, Acl::open_unsafe().clone(), zk_mode(mode))
                .map_err(|e| map_error(&path, e))
        })
        .await
    }

    async fn delete(&self, path: &str, version: Version) -> Result<()> {
        let path = path.to_string();
        self.call(move |zk| {
            zk.delete(&path, zk_version(version))
                .map_err(|e| map_error(&path, e))
        })
        .await
    }
}

fn zk_mode(mode: CreateMode) -> zookeeper::CreateMode {
    match mode {
        CreateMode::Persistent => zookeeper::CreateMode::Persistent,
        CreateMode::Ephemeral => zookeeper::CreateMode::Ephemeral,
        CreateMode::PersistentSequential => zookeeper::CreateMode::PersistentSequential,
        CreateMode::EphemeralSequential => zookeeper::CreateMode::EphemeralSequential,
    }
}

fn zk_version(version: Version) -> Option<i32> {
    match version {
        Version::Any => None,
        Version::Exact(v) => Some(v),
    }
}

fn map_error(path: &str, e: ZkError) -> RegistrarError {
    match e {
        ZkError::NoNode => RegistrarError::NoNode(path.to_string()),
        ZkError::NodeExists => RegistrarError::NodeExists(path.to_string()),
        ZkError::NotEmpty => RegistrarError::NotEmpty(path.to_string()),
        ZkError::BadVersion => RegistrarError::BadVersion(path.to_string()),
        other => RegistrarError::Coordination(format!("{:?} on {}", other, path)),
    }
}
