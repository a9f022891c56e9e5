//! Entity store boundary
//!
//! The engine treats persistence as a key-value store keyed by entity id.
//! `MemoryStore` is the embedded default; production deployments adapt
//! their own backend behind the trait.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::EntityRiskRecord;
use crate::error::StoreError;

pub trait EntityStore: Send + Sync {
    fn get(&self, entity_id: &str) -> Result<Option<EntityRiskRecord>, StoreError>;
    fn upsert(&self, record: &EntityRiskRecord) -> Result<(), StoreError>;
}

/// In-process store. Last-write-wins under concurrent updates, which is the
/// consistency model the engine accepts for monitoring data.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, EntityRiskRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl EntityStore for MemoryStore {
    fn get(&self, entity_id: &str) -> Result<Option<EntityRiskRecord>, StoreError> {
        Ok(self.records.read().get(entity_id).cloned())
    }

    fn upsert(&self, record: &EntityRiskRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .insert(record.entity_id.clone(), record.clone());
        Ok(())
    }
}
