//! In-memory slot store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::SlotStore;
use crate::Result;

/// Slot map living for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotStore for MemorySlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        let mut slots = self.slots.write().await;
        if slots.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

/// Memory slots that yield to the scheduler before every operation, so
/// concurrent callers interleave at each await point
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct YieldingSlots {
    inner: MemorySlots,
}

#[cfg(test)]
#[async_trait]
impl SlotStore for YieldingSlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.put(key, value).await
    }

    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.compare_and_put(key, expected, value).await
    }
}
