use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use redis::aio::ConnectionManager;

use crate::search::key::CacheKey;
use crate::search::paginate::FetchedListings;

/// How long startup waits for Redis before falling back to the in-process map.
const STARTUP_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache lock poisoned")]
    Poisoned,

    #[error("codec: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Storage behind the search cache. Errors are reported to `CacheStore`,
/// which turns them into misses and dropped writes.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Unexpired results for `key`, if any.
    async fn load(&self, key: &CacheKey) -> Result<Option<FetchedListings>, CacheError>;

    /// Overwrite the entry for `key` with a fresh timestamp.
    async fn store(&self, key: &CacheKey, results: &FetchedListings) -> Result<(), CacheError>;
}

/// The search cache as the façade sees it. Never fails: an unreachable backend
/// reads as a miss and swallows writes.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<FetchedListings> {
        match self.backend.load(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    "Cache read failed, treating as miss: {e}"
                );
                None
            }
        }
    }

    pub async fn set(&self, key: &CacheKey, results: &FetchedListings) {
        if let Err(e) = self.backend.store(key, results).await {
            tracing::warn!(backend = self.backend.name(), "Cache write dropped: {e}");
        }
    }
}

/// Results stored under one key and when they were stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: FetchedListings,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.stored_at >= ttl
    }
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-process map with lazy wall-clock expiry.
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: TimeDelta,
    clock: Clock,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(Utc::now))
    }

    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: TimeDelta::seconds(ttl.as_secs() as i64),
            clock,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<FetchedListings>, CacheError> {
        let now = (self.clock)();
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;

        match entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                return Ok(Some(entry.results.clone()));
            }
            Some(_) => {}
        }
        entries.remove(key);
        Ok(None)
    }

    async fn store(&self, key: &CacheKey, results: &FetchedListings) -> Result<(), CacheError> {
        let entry = CacheEntry {
            results: results.clone(),
            stored_at: (self.clock)(),
        };
        self.entries
            .lock()
            .map_err(|_| CacheError::Poisoned)?
            .insert(key.clone(), entry);
        Ok(())
    }
}

/// Redis-backed cache. Expiry is delegated to `SET .. EX`; values are JSON.
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Duration,
    op_timeout: Duration,
}

impl RedisCache {
    pub async fn connect(url: &str, ttl: Duration, op_timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(STARTUP_PROBE_TIMEOUT, client.get_connection_manager())
            .await
            .map_err(|_| CacheError::Timeout(STARTUP_PROBE_TIMEOUT))??;
        Ok(Self {
            conn,
            ttl,
            op_timeout,
        })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn load(&self, key: &CacheKey) -> Result<Option<FetchedListings>, CacheError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key.storage_key());
        let get = cmd.query_async::<_, Option<String>>(&mut conn);

        let payload = tokio::time::timeout(self.op_timeout, get)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))??;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, key: &CacheKey, results: &FetchedListings) -> Result<(), CacheError> {
        let payload = serde_json::to_string(results)?;
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key.storage_key())
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1));
        let set = cmd.query_async::<_, ()>(&mut conn);

        tokio::time::timeout(self.op_timeout, set)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout))??;
        Ok(())
    }
}

/// Pick the backend once at startup: Redis when configured and reachable,
/// otherwise the in-process map.
pub async fn connect(redis_url: Option<&str>, ttl: Duration, op_timeout: Duration) -> CacheStore {
    let backend: Arc<dyn CacheBackend> = match redis_url {
        Some(url) => match RedisCache::connect(url, ttl, op_timeout).await {
            Ok(redis) => {
                tracing::info!("Search cache using Redis");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Redis unavailable ({e}), falling back to in-memory search cache");
                Arc::new(MemoryCache::new(ttl))
            }
        },
        None => {
            tracing::info!("Search cache using in-process memory");
            Arc::new(MemoryCache::new(ttl))
        }
    };
    CacheStore::new(backend)
}
