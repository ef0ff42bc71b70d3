use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Collection, DocumentStore, StoreError};

#[derive(Default)]
struct Table {
    documents: BTreeMap<String, String>,
    keys: HashMap<String, String>,
    /// id to the key it currently holds
    owners: HashMap<String, String>,
}

impl Table {
    fn release(&mut self, id: &str) {
        if let Some(key) = self.owners.remove(id) {
            if self.keys.get(&key).is_some_and(|owner| owner == id) {
                self.keys.remove(&key);
            }
        }
    }
}

/// Process-local store used when no Redis URL is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Collection, Table>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<String>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .get(&collection)
            .and_then(|table| table.documents.get(id))
            .cloned())
    }

    async fn get_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables.get(&collection).and_then(|table| {
            table
                .keys
                .get(key)
                .and_then(|id| table.documents.get(id))
                .cloned()
        }))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .get(&collection)
            .map(|table| table.documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        key: Option<&str>,
        body: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(collection).or_default();

        if let Some(key) = key {
            if table.keys.get(key).is_some_and(|owner| owner != id) {
                return Err(StoreError::Duplicate {
                    collection: collection.name(),
                    key: key.to_string(),
                });
            }
        }

        if table.owners.get(id).map(String::as_str) != key {
            table.release(id);
            if let Some(key) = key {
                table.keys.insert(key.to_string(), id.to_string());
                table.owners.insert(id.to_string(), key.to_string());
            }
        }
        table.documents.insert(id.to_string(), body.to_string());

        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(table) = tables.get_mut(&collection) else {
            return Ok(false);
        };

        table.release(id);

        Ok(table.documents.remove(id).is_some())
    }
}
