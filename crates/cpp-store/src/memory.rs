//! In-memory product store
//!
//! Holds products without file I/O; used by tests and by callers that
//! already have their products in hand.

use crate::error::{StoreError, StoreResult};
use crate::product::ProductStore;
use cpp_core::{DataId, Document};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Key = (String, String, DataId);

/// In-memory product store
///
/// Lookup follows the same rules as the directory store: collections in
/// order, then progressively coarser data ids.
#[derive(Clone, Default)]
pub struct MemoryProductStore {
    products: Arc<RwLock<HashMap<Key, Document>>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a product, replacing any previous one with the same key
    pub fn insert(
        &self,
        collection: impl Into<String>,
        product_type: impl Into<String>,
        data_id: DataId,
        document: Document,
    ) {
        self.write()
            .insert((collection.into(), product_type.into(), data_id), document);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(
        self,
        collection: impl Into<String>,
        product_type: impl Into<String>,
        data_id: DataId,
        document: Document,
    ) -> Self {
        self.insert(collection, product_type, data_id, document);
        self
    }

    pub fn remove(
        &self,
        collection: &str,
        product_type: &str,
        data_id: &DataId,
    ) -> Option<Document> {
        self.write()
            .remove(&(collection.to_string(), product_type.to_string(), data_id.clone()))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still usable.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Key, Document>> {
        self.products.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Key, Document>> {
        self.products.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProductStore for MemoryProductStore {
    fn get(
        &self,
        product_type: &str,
        data_id: &DataId,
        collections: &[String],
    ) -> StoreResult<Document> {
        let products = self.read();
        for collection in collections {
            for candidate in data_id.lookup_chain() {
                let key = (collection.clone(), product_type.to_string(), candidate);
                if let Some(document) = products.get(&key) {
                    return Ok(document.clone());
                }
            }
        }

        Err(StoreError::NotFound {
            product_type: product_type.to_string(),
            data_id: data_id.clone(),
            collections: collections.to_vec(),
        })
    }
}
