//! In-process mirror backend
//!
//! Behaves like the remote store (ordered keys, 1-based windows) and can be
//! told to fail or stall, which is how the sync worker's failure paths are
//! exercised.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{MirrorError, MirrorRange, MirrorStore};

pub struct MemoryMirror {
    entries: Mutex<BTreeMap<String, String>>,
    fail: AtomicBool,
    delay_ms: AtomicUsize,
    put_count: AtomicUsize,
    delete_count: AtomicUsize,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            fail: AtomicBool::new(false),
            delay_ms: AtomicUsize::new(0),
            put_count: AtomicUsize::new(0),
            delete_count: AtomicUsize::new(0),
        }
    }

    /// Make every call fail with `SyncFailure`
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Stall every call by `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    pub fn get(&self, tag: &str) -> Option<String> {
        self.lock().ok()?.get(tag).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), MirrorError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MirrorError::SyncFailure("memory mirror set to fail".into()));
        }
        Ok(())
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, MirrorError> {
        self.entries
            .lock()
            .map_err(|_| MirrorError::SyncFailure("memory mirror lock poisoned".into()))
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MirrorStore for MemoryMirror {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, tag: &str, value: &str) -> Result<(), MirrorError> {
        self.enter().await?;
        self.lock()?.insert(tag.to_string(), value.to_string());
        self.put_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_range(&self, range: MirrorRange) -> Result<Vec<(String, String)>, MirrorError> {
        self.enter().await?;
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .skip(range.no.saturating_sub(1))
            .take(range.count)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn delete(&self, tag: &str) -> Result<(), MirrorError> {
        self.enter().await?;
        self.lock()?.remove(tag);
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
