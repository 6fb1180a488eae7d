use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::coordination::{CoordinationClient, CreateMode, Version};
use crate::types::{RegistrarError, Result};

#[derive(Default)]
struct Tree {
    /// path -> (data, owning session for ephemerals)
    nodes: BTreeMap<String, (Vec<u8>, Option<u64>)>,
    /// per-parent sequence counters
    sequences: BTreeMap<String, u64>,
    next_session: u64,
}

/// Namespace shared by every session opened from it. Sequential children are
/// numbered per parent starting at 1; ephemerals vanish on `expire_session`.
pub struct MemoryCoordinator {
    tree: Arc<Mutex<Tree>>,
    session_id: u64,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self {
            tree: Arc::new(Mutex::new(Tree::default())),
            session_id: 0,
        }
    }

    pub fn session(&self) -> Self {
        let mut tree = self.lock();
        tree.next_session += 1;
        Self {
            tree: self.tree.clone(),
            session_id: tree.next_session,
        }
    }

    pub fn expire_session(&self) -> Vec<String> {
        let mut tree = self.lock();
        let owned: Vec<String> = tree
            .nodes
            .iter()
            .filter(|(_, (_, owner))| *owner == Some(self.session_id))
            .map(|(path, _)| path.clone())
            .collect();
        for path in &owned {
            tree.nodes.remove(path);
        }
        owned
    }

    pub fn get_data(&self, path: &str) -> Result<Vec<u8>> {
        self.lock()
            .nodes
            .get(path)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| RegistrarError::NoNode(path.to_string()))
    }

    /// Child names of `path`, sorted.
    pub fn children(&self, path: &str) -> Result<Vec<String>> {
        let tree = self.lock();
        if !tree.nodes.contains_key(path) {
            return Err(RegistrarError::NoNode(path.to_string()));
        }
        let prefix = format!("{}/", path);
        Ok(tree
            .nodes
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CoordinationClient for MemoryCoordinator {
    async fn ensure_path(&self, path: &str) -> Result<()> {
        let mut tree = self.lock();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            tree.nodes
                .entry(current.clone())
                .or_insert_with(|| (Vec::new(), None));
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.lock().nodes.contains_key(path))
    }

    async fn create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<String> {
        let mut tree = self.lock();
        let parent = match path.rfind('/') {
            Some(0) | None => String::new(),
            Some(idx) => path[..idx].to_string(),
        };
        if !parent.is_empty() && !tree.nodes.contains_key(&parent) {
            return Err(RegistrarError::NoNode(parent));
        }

        let full_path = if mode.is_sequential() {
            let seq = tree.sequences.entry(parent).or_insert(0);
            *seq += 1;
            format!("{}{:010}", path, seq)
        } else {
            path.to_string()
        };
        if tree.nodes.contains_key(&full_path) {
            return Err(RegistrarError::NodeExists(full_path));
        }

        let owner = mode.is_ephemeral().then_some(self.session_id);
        tree.nodes.insert(full_path.clone(), (data.to_vec(), owner));
        Ok(full_path)
    }

    async fn delete(&self, path: &str, _version: Version) -> Result<()> {
        let mut tree = self.lock();
        let prefix = format!("{}/", path);
        if tree.nodes.keys().any(|k| k.starts_with(&prefix)) {
            return Err(RegistrarError::NotEmpty(path.to_string()));
        }
        tree.nodes
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RegistrarError::NoNode(path.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    EnsurePath = 0,
    Exists = 1,
    Create = 2,
    Delete = 3,
}

/// Coordination client over a [`MemoryCoordinator`] that counts calls per
/// operation, can fail any operation on demand and can add latency to every
/// call.
pub struct ScriptedCoordinator {
    inner: MemoryCoordinator,
    calls: [AtomicUsize; 4],
    failing: [AtomicBool; 4],
    latency: Option<Duration>,
}

impl ScriptedCoordinator {
    pub fn new() -> Self {
        Self {
            inner: MemoryCoordinator::new(),
            calls: Default::default(),
            failing: Default::default(),
            latency: None,
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::new()
        }
    }

    pub fn inner(&self) -> &MemoryCoordinator {
        &self.inner
    }

    pub fn fail(&self, op: Op) {
        self.failing[op as usize].store(true, Ordering::SeqCst);
    }

    pub fn recover(&self, op: Op) {
        self.failing[op as usize].store(false, Ordering::SeqCst);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls[op as usize].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    async fn enter(&self, op: Op) -> Result<()> {
        self.calls[op as usize].fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing[op as usize].load(Ordering::SeqCst) {
            return Err(RegistrarError::Coordination(format!(
                "injected {:?} failure",
                op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationClient for ScriptedCoordinator {
    async fn ensure_path(&self, path: &str) -> Result<()> {
        self.enter(Op::EnsurePath).await?;
        self.inner.ensure_path(path).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.enter(Op::Exists).await?;
        self.inner.exists(path).await
    }

    async fn create(&self, path: &str, data: &[u8], mode: CreateMode) -> Result<String> {
        self.enter(Op::Create).await?;
        self.inner.create(path, data, mode).await
    }

    async fn delete(&self, path: &str, version: Version) -> Result<()> {
        self.enter(Op::Delete).await?;
        self.inner.delete(path, version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_per_parent_not_reused() {
        let zk = MemoryCoordinator::new();
        zk.ensure_path("/svc").await.unwrap();

        let first = zk
            .create("/svc/member_", b"a", CreateMode::EphemeralSequential)
            .await
            .unwrap();
        zk.delete(&first, Version::Any).await.unwrap();
        let second = zk
            .create("/svc/member_", b"b", CreateMode::EphemeralSequential)
            .await
            .unwrap();

        assert_eq!(first, "/svc/member_0000000001");
        assert_eq!(second, "/svc/member_0000000002");
        assert_eq!(zk.children("/svc").unwrap(), vec!["member_0000000002"]);
    }

    #[tokio::test]
    async fn test_expire_session_removes_only_own_ephemerals() {
        let zk = MemoryCoordinator::new();
        let other = zk.session();
        zk.ensure_path("/svc").await.unwrap();

        let mine = zk
            .create("/svc/member_", b"", CreateMode::EphemeralSequential)
            .await
            .unwrap();
        let theirs = other
            .create("/svc/member_", b"", CreateMode::EphemeralSequential)
            .await
            .unwrap();

        assert_eq!(zk.expire_session(), vec![mine.clone()]);
        assert!(!other.exists(&mine).await.unwrap());
        assert!(other.exists(&theirs).await.unwrap());
        assert!(zk.exists("/svc").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_requires_parent() {
        let zk = MemoryCoordinator::new();
        let err = zk
            .create("/missing/member_", b"", CreateMode::EphemeralSequential)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::NoNode(p) if p == "/missing"));
    }
}
