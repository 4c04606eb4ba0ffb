//! Record store
//!
//! Collections are persisted as whole JSON arrays in named slots of a
//! key-value [`SlotStore`]. Every save overwrites the entire slot in one
//! write. There is no transaction spanning several collections: a caller
//! that saves two collections in a row can observe the first save without
//! the second.
//!
//! Read-modify-write cycles go through [`RecordStore::update`], which holds
//! the collection's lock for the whole cycle and writes back with a
//! compare-and-swap against the slot contents it read. A writer outside this
//! process that changed the slot in between turns the write into
//! `StaleWrite`.
//!
//! A slot that is not a JSON array is treated as an empty collection. Inside
//! an array, entries that do not decode or validate are skipped one by one.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::{Collection, Record};
use crate::{Error, Result};

mod memory;
mod sqlite;

pub use memory::MemorySlots;
#[cfg(test)]
pub(crate) use memory::YieldingSlots;
pub use sqlite::SqliteSlots;

/// Process-local persistent key-value slots
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Read a slot; `None` when it was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace a slot's value
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Replace a slot's value only if it still holds `expected`
    ///
    /// `expected == None` means the slot must not exist yet. Returns `false`
    /// without writing when the current contents differ.
    async fn compare_and_put(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool>;
}

/// One write lock per collection
#[derive(Default)]
struct CollectionLocks {
    profiles: Mutex<()>,
    doctors: Mutex<()>,
    consultations: Mutex<()>,
}

impl CollectionLocks {
    fn get(&self, collection: Collection) -> &Mutex<()> {
        match collection {
            Collection::Profiles => &self.profiles,
            Collection::Doctors => &self.doctors,
            Collection::Consultations => &self.consultations,
        }
    }
}

/// Typed load/save of collections over a slot store
#[derive(Clone)]
pub struct RecordStore {
    slots: Arc<dyn SlotStore>,
    locks: Arc<CollectionLocks>,
}

impl RecordStore {
    pub fn new(slots: Arc<dyn SlotStore>) -> Self {
        Self {
            slots,
            locks: Arc::new(CollectionLocks::default()),
        }
    }

    /// Store backed by a fresh in-memory slot map
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySlots::new()))
    }

    /// Load a collection, degrading to empty on a missing or corrupt slot
    pub async fn load<T: Record>(&self) -> Result<Vec<T>> {
        let collection = T::COLLECTION;
        let raw = self.slots.get(collection.slot_key()).await?;
        Ok(decode_slot(collection, raw.as_deref()))
    }

    /// Overwrite a collection with `entities`, in order
    pub async fn save<T: Record>(&self, entities: &[T]) -> Result<()> {
        let collection = T::COLLECTION;
        let _lock = self.locks.get(collection).lock().await;
        let raw = serde_json::to_string(entities)?;
        self.slots.put(collection.slot_key(), &raw).await?;
        debug!(%collection, count = entities.len(), bytes = raw.len(), "Collection saved");
        Ok(())
    }

    /// Load, apply `change`, and write back atomically with respect to
    /// other writers of the same collection
    ///
    /// Nothing is written when `change` returns an error or leaves the
    /// collection as it was.
    pub async fn update<T, F, R>(&self, change: F) -> Result<R>
    where
        T: Record,
        F: FnOnce(&mut Vec<T>) -> Result<R> + Send,
        R: Send,
    {
        let collection = T::COLLECTION;
        let _lock = self.locks.get(collection).lock().await;

        let before = self.slots.get(collection.slot_key()).await?;
        let mut entities = decode_slot::<T>(collection, before.as_deref());
        let outcome = change(&mut entities)?;

        let raw = serde_json::to_string(&entities)?;
        let unchanged = match before.as_deref() {
            Some(before) => before == raw,
            None => entities.is_empty(),
        };
        if unchanged {
            return Ok(outcome);
        }

        let written = self
            .slots
            .compare_and_put(collection.slot_key(), before.as_deref(), &raw)
            .await?;
        if !written {
            warn!(%collection, "Slot changed by another writer, update refused");
            return Err(Error::StaleWrite {
                id: collection.slot_key().to_string(),
                reason: "collection changed by another writer".to_string(),
            });
        }

        debug!(%collection, count = entities.len(), bytes = raw.len(), "Collection updated");
        Ok(outcome)
    }

    /// Append a new entity, refusing a duplicate identifier
    pub async fn insert<T: Record>(&self, entity: T) -> Result<T> {
        self.insert_with(move |_: &[T]| Ok(entity)).await
    }

    /// Build an entity from the current collection and append it, all
    /// under the collection lock
    ///
    /// `build` sees the stored entities, so it can pick a free identifier or
    /// refuse a taken username without another writer slipping in between.
    pub async fn insert_with<T, F>(&self, build: F) -> Result<T>
    where
        T: Record,
        F: FnOnce(&[T]) -> Result<T> + Send,
    {
        let entity = self
            .update(move |entities: &mut Vec<T>| {
                let entity = build(entities.as_slice())?;
                entity.validate().map_err(Error::InvalidInput)?;
                if entities.iter().any(|e| e.id() == entity.id()) {
                    return Err(Error::InvalidInput(format!(
                        "{} already contains {}",
                        T::COLLECTION,
                        entity.id()
                    )));
                }
                entities.push(entity.clone());
                Ok(entity)
            })
            .await?;

        info!(collection = %T::COLLECTION, id = entity.id(), "Entity inserted");
        Ok(entity)
    }

    /// Raw slot contents, for before/after comparisons
    pub async fn snapshot(&self, collection: Collection) -> Result<Option<String>> {
        self.slots.get(collection.slot_key()).await
    }

    /// Number of entities currently stored
    pub async fn count<T: Record>(&self) -> Result<usize> {
        Ok(self.load::<T>().await?.len())
    }
}

fn decode_slot<T: Record>(collection: Collection, raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw else {
        debug!(%collection, "Slot empty, loading empty collection");
        return Vec::new();
    };

    let values: Vec<Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(
                %collection,
                error = %e,
                "Stored collection is corrupt, treating as empty"
            );
            return Vec::new();
        }
    };

    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let entity = match serde_json::from_value::<T>(value) {
                Ok(entity) => entity,
                Err(e) => {
                    warn!(%collection, index, error = %e, "Skipping undecodable stored entity");
                    return None;
                }
            };
            match entity.validate() {
                Ok(()) => Some(entity),
                Err(reason) => {
                    warn!(%collection, index, %reason, "Skipping invalid stored entity");
                    None
                }
            }
        })
        .collect()
}
