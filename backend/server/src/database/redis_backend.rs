use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use super::{Collection, DocumentStore, StoreError};

pub const KEY_PREFIX: &str = "meters";

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

// KEYS: documents, keys, owners. ARGV: id, key ("" for none), body.
// Returns 0 when another id owns the key.
const PUT_SCRIPT: &str = r"
local id, key, body = ARGV[1], ARGV[2], ARGV[3]
if key ~= '' then
    local owner = redis.call('HGET', KEYS[2], key)
    if owner and owner ~= id then
        return 0
    end
end
local held = redis.call('HGET', KEYS[3], id)
if held ~= key then
    if held and redis.call('HGET', KEYS[2], held) == id then
        redis.call('HDEL', KEYS[2], held)
    end
    if key == '' then
        redis.call('HDEL', KEYS[3], id)
    else
        redis.call('HSET', KEYS[2], key, id)
        redis.call('HSET', KEYS[3], id, key)
    end
end
redis.call('HSET', KEYS[1], id, body)
return 1
";

// KEYS: documents, keys, owners. ARGV: id. Returns the number of documents removed.
const REMOVE_SCRIPT: &str = r"
local id = ARGV[1]
local held = redis.call('HGET', KEYS[3], id)
if held then
    if redis.call('HGET', KEYS[2], held) == id then
        redis.call('HDEL', KEYS[2], held)
    end
    redis.call('HDEL', KEYS[3], id)
end
return redis.call('HDEL', KEYS[1], id)
";

static PUT: LazyLock<Script> = LazyLock::new(|| Script::new(PUT_SCRIPT));
static REMOVE: LazyLock<Script> = LazyLock::new(|| Script::new(REMOVE_SCRIPT));

pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self::with_prefix(connection, KEY_PREFIX)
    }

    pub fn with_prefix(connection: ConnectionManager, prefix: &str) -> Self {
        Self {
            connection,
            prefix: prefix.to_string(),
        }
    }

    fn documents(&self, collection: Collection) -> String {
        format!("{}:{}", self.prefix, collection.name())
    }

    fn keys(&self, collection: Collection) -> String {
        format!("{}:{}:keys", self.prefix, collection.name())
    }

    fn owners(&self, collection: Collection) -> String {
        format!("{}:{}:owners", self.prefix, collection.name())
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    fn backend_tag(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        let body: Option<String> = connection.hget(self.documents(collection), id).await?;

        Ok(body)
    }

    async fn get_by_key(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        let id: Option<String> = connection.hget(self.keys(collection), key).await?;

        match id {
            Some(id) => self.get(collection, &id).await,
            None => Ok(None),
        }
    }

    async fn list(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();
        let bodies: Vec<String> = connection.hvals(self.documents(collection)).await?;

        Ok(bodies)
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        key: Option<&str>,
        body: &str,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let written: i64 = PUT
            .key(self.documents(collection))
            .key(self.keys(collection))
            .key(self.owners(collection))
            .arg(id)
            .arg(key.unwrap_or_default())
            .arg(body)
            .invoke_async(&mut connection)
            .await?;

        if written == 0 {
            return Err(StoreError::Duplicate {
                collection: collection.name(),
                key: key.unwrap_or_default().to_string(),
            });
        }

        Ok(())
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let removed: i64 = REMOVE
            .key(self.documents(collection))
            .key(self.keys(collection))
            .key(self.owners(collection))
            .arg(id)
            .invoke_async(&mut connection)
            .await?;

        Ok(removed > 0)
    }
}
