//! # Document Store
//!
//! Four collections: users, vendors, meters, installations. Every document is
//! stored as one JSON string under its id. A collection may also keep a unique
//! index (username, vendor name, meter serial) mapping the key to the id.
//!
//! ## Redis Layout
//!
//! - `{prefix}:{collection}`: hash of id to JSON document
//! - `{prefix}:{collection}:keys`: hash of unique key to id
//! - `{prefix}:{collection}:owners`: hash of id to the key it holds
//! - A write claims its key, releases the old one and stores the document in
//!   a single Lua script, so two concurrent writes of the same key cannot both
//!   succeed and a failed write leaves no stray claim
//!
//! ## Consistency
//!
//! There are no multi-document transactions. Writes that touch two documents
//! (meters plus the vendor counter, an installation plus its meter) are two
//! separate writes and the second one may be lost.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod memory;
pub mod redis_backend;

pub use memory::MemoryStore;
pub use redis_backend::{RedisStore, init_redis};

use models::{Installation, Meter, User, Vendor};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Vendors,
    Meters,
    Installations,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Vendors => "vendors",
            Collection::Meters => "meters",
            Collection::Installations => "installations",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate {collection} key: {key}")]
    Duplicate {
        collection: &'static str,
        key: String,
    },

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt document: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Raw collection access. Implementations only deal in ids, unique keys and
/// JSON strings; [`Database`] does the typing.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<String>, StoreError>;

    async fn get_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<String>, StoreError>;

    async fn list(&self, collection: Collection) -> Result<Vec<String>, StoreError>;

    /// Writes the document and moves its unique key to `key`, releasing the
    /// key the stored document held before. Fails with
    /// [`StoreError::Duplicate`] when `key` belongs to another id, leaving
    /// everything untouched.
    async fn put(
        &self,
        collection: Collection,
        id: &str,
        key: Option<&str>,
        body: &str,
    ) -> Result<(), StoreError>;

    /// Deletes the document and frees its unique key.
    async fn remove(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;
}

pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn unique_key(&self) -> Option<&str> {
        None
    }
}

/// Stored user: the public [`User`] plus its bcrypt hash.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

impl Document for UserRecord {
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &str {
        &self.user.id
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.user.username)
    }
}

impl Document for Vendor {
    const COLLECTION: Collection = Collection::Vendors;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Document for Meter {
    const COLLECTION: Collection = Collection::Meters;

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.serial_number)
    }
}

impl Document for Installation {
    const COLLECTION: Collection = Collection::Installations;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
}

impl Database {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn backend_tag(&self) -> &'static str {
        self.store.backend_tag()
    }

    pub async fn get<T: Document>(&self, id: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(|body| serde_json::from_str(&body))
            .transpose()
            .map_err(StoreError::from)
    }

    pub async fn find_by_key<T: Document>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.store
            .get_by_key(T::COLLECTION, key)
            .await?
            .map(|body| serde_json::from_str(&body))
            .transpose()
            .map_err(StoreError::from)
    }

    pub async fn list<T: Document>(&self) -> Result<Vec<T>, StoreError> {
        self.store
            .list(T::COLLECTION)
            .await?
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    pub async fn insert<T: Document>(&self, document: &T) -> Result<(), StoreError> {
        let body = serde_json::to_string(document)?;

        self.store
            .put(T::COLLECTION, document.id(), document.unique_key(), &body)
            .await
    }

    /// Overwrites the stored copy. The key index follows whatever the store
    /// holds, not the caller's view of the previous document.
    pub async fn replace<T: Document>(&self, document: &T) -> Result<(), StoreError> {
        self.insert(document).await
    }

    pub async fn remove<T: Document>(&self, document: &T) -> Result<bool, StoreError> {
        self.store.remove(T::COLLECTION, document.id()).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use models::{MeterStatus, Role};

    use super::*;

    fn database() -> Database {
        Database::new(Arc::new(MemoryStore::default()))
    }

    fn vendor(id: &str, name: &str) -> Vendor {
        Vendor {
            id: id.to_string(),
            name: name.to_string(),
            contact_number: String::new(),
            email: String::new(),
            assigned_meters_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = database();
        db.insert(&vendor("v1", "PowerGrid Corp")).await.unwrap();

        let by_id: Vendor = db.get("v1").await.unwrap().unwrap();
        let by_key: Vendor = db.find_by_key("PowerGrid Corp").await.unwrap().unwrap();

        assert_eq!(by_id, by_key);
        assert!(db.get::<Vendor>("v2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let db = database();
        db.insert(&vendor("v1", "PowerGrid Corp")).await.unwrap();

        let err = db
            .insert(&vendor("v2", "PowerGrid Corp"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Duplicate { key, .. } if key == "PowerGrid Corp"));
        assert_eq!(db.list::<Vendor>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_moves_key() {
        let db = database();
        let old = vendor("v1", "PowerGrid Corp");
        db.insert(&old).await.unwrap();
        db.insert(&vendor("v2", "Energy Plus")).await.unwrap();

        let renamed = vendor("v1", "Metro Supply");
        db.replace(&renamed).await.unwrap();

        assert!(db.find_by_key::<Vendor>("PowerGrid Corp").await.unwrap().is_none());
        assert!(db.find_by_key::<Vendor>("Metro Supply").await.unwrap().is_some());

        let clash = vendor("v1", "Energy Plus");
        assert!(matches!(
            db.replace(&clash).await,
            Err(StoreError::Duplicate { .. })
        ));
        assert!(db.find_by_key::<Vendor>("Metro Supply").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_repeated_renames_free_every_old_name() {
        let db = database();
        let loaded = vendor("v1", "PowerGrid Corp");
        db.insert(&loaded).await.unwrap();

        // Two admins rename the same vendor from the same stale copy.
        db.replace(&vendor("v1", "Energy Plus")).await.unwrap();
        db.replace(&vendor("v1", "Metro Supply")).await.unwrap();

        db.insert(&vendor("v2", "Energy Plus")).await.unwrap();
        db.insert(&vendor("v3", "PowerGrid Corp")).await.unwrap();

        let current: Vendor = db.get("v1").await.unwrap().unwrap();
        assert_eq!(current.name, "Metro Supply");
        assert_eq!(
            db.find_by_key::<Vendor>("Energy Plus").await.unwrap().unwrap().id,
            "v2"
        );
    }

    #[tokio::test]
    async fn test_remove_frees_key() {
        let db = database();
        let doc = vendor("v1", "PowerGrid Corp");
        db.insert(&doc).await.unwrap();

        assert!(db.remove(&doc).await.unwrap());
        assert!(!db.remove(&doc).await.unwrap());

        db.insert(&vendor("v2", "PowerGrid Corp")).await.unwrap();
    }

    #[tokio::test]
    async fn test_user_record_round_trip() {
        let db = database();
        let record = UserRecord {
            user: User {
                id: "u1".to_string(),
                username: "admin".to_string(),
                name: "Admin User".to_string(),
                role: Role::Admin,
                vendor_id: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            password_hash: "$2b$04$hash".to_string(),
        };
        db.insert(&record).await.unwrap();

        let found: UserRecord = db.find_by_key("admin").await.unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_meter_serial_index() {
        let db = database();
        let meter = Meter {
            id: "m1".to_string(),
            serial_number: "MTR-00001".to_string(),
            vendor_id: None,
            vendor_name: None,
            status: MeterStatus::Available,
            assigned_by: None,
            assigned_date: None,
            installer_id: None,
            installation_id: None,
            created_at: Utc::now(),
        };
        db.insert(&meter).await.unwrap();

        let found: Meter = db.find_by_key("MTR-00001").await.unwrap().unwrap();
        assert_eq!(found.id, "m1");
    }
}
