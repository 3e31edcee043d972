//! Persistent TTL cache for upstream feed responses
//!
//! Every feed call is memoized here with a per-feed time-to-live. Entries
//! past their expiry are treated as absent and removed on read. There is no
//! other eviction policy; the only bulk operation is the user-triggered
//! `clear`, which drops every entry at once.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;
use tokio::task;

static GLOBAL_CACHE: OnceCell<PersistentCache> = OnceCell::const_new();

/// Registry of live cache keys, kept so `clear` can drop everything without
/// a keyspace scan. Prefixed with NUL so it can never collide with a feed key.
const REGISTRY_KEY: &[u8] = b"\0registry";

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct PersistentCache {
    store: Keyspace,
    registry_lock: Arc<Mutex<()>>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn insert_with_registry(
    store: Keyspace,
    registry_lock: Arc<Mutex<()>>,
    key: Vec<u8>,
    bytes: Vec<u8>,
) -> anyhow::Result<()> {
    // The registry read-modify-write must not interleave with another put
    // or a clear, or a key drops out of the registry and survives clear.
    let _guard = registry_lock
        .lock()
        .map_err(|_| anyhow!("Registry lock poisoned"))?;

    store.insert(key.clone(), bytes)?;

    let mut keys: Vec<Vec<u8>> = match store.get(REGISTRY_KEY.to_vec())? {
        Some(raw) => postcard::from_bytes(&raw.to_vec())?,
        None => Vec::new(),
    };
    if !keys.contains(&key) {
        keys.push(key);
        store.insert(REGISTRY_KEY.to_vec(), postcard::to_stdvec(&keys)?)?;
    }
    Ok(())
}

fn clear_store(store: Keyspace, registry_lock: Arc<Mutex<()>>) -> anyhow::Result<usize> {
    let _guard = registry_lock
        .lock()
        .map_err(|_| anyhow!("Registry lock poisoned"))?;

    let keys: Vec<Vec<u8>> = match store.get(REGISTRY_KEY.to_vec())? {
        Some(raw) => postcard::from_bytes(&raw.to_vec())?,
        None => Vec::new(),
    };
    let count = keys.len();
    for key in keys {
        store.remove(key)?;
    }
    store.remove(REGISTRY_KEY.to_vec())?;
    Ok(count)
}

impl PersistentCache {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache {
            store: items,
            registry_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        // Calculate expiry time
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;
        let registry_lock = self.registry_lock.clone();

        task::spawn_blocking(move || insert_with_registry(store, registry_lock, key, bytes))
            .await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        if let Some(bytes) = maybe_bytes {
            let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
            let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

            if now < entry.expires_at {
                tracing::debug!("Key found and still fresh");
                // Fresh
                Ok(Some(entry.value))
            } else {
                tracing::debug!("Key found but expired");
                self.remove(key).await?;
                Ok(None)
            }
        } else {
            tracing::debug!("Key not found");
            // Key not found
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        let _ = task::spawn_blocking(move || store.remove(key)).await?;
        Ok(())
    }

    /// Removes every cached entry. Returns the number of keys dropped.
    #[tracing::instrument(name = "clear_cache", level = "info", skip(self))]
    pub async fn clear(&self) -> Result<usize> {
        let store = self.store.clone();
        let registry_lock = self.registry_lock.clone();
        let count = task::spawn_blocking(move || clear_store(store, registry_lock)).await??;
        tracing::info!("Cleared {} cached entries", count);
        Ok(count)
    }
}

/// Initializes the global persistent cache. **Must be called once before use.**
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    let cache = PersistentCache::new(path)?;
    GLOBAL_CACHE
        .set(cache)
        .map_err(|_| anyhow!("Cache already initialized"))?;
    Ok(())
}

/// Returns a reference to the globally initialized cache.
/// # Panics
/// Panics if the cache has not been initialized by calling `cache::init()` first.
fn get_cache() -> &'static PersistentCache {
    GLOBAL_CACHE
        .get()
        .expect("Cache not initialized. Call cache::init() first.")
}

// Public, ergonomic API endpoints that use the global cache.
pub async fn put<T: Serialize + Send + Debug + 'static>(
    key: &str,
    value: T,
    ttl: Duration,
) -> Result<()> {
    get_cache().put(key, value, ttl).await
}

pub async fn get<T: DeserializeOwned + Send + 'static>(key: &str) -> Result<Option<T>> {
    get_cache().get(key).await
}

pub async fn remove(key: &str) -> Result<()> {
    get_cache().remove(key).await
}

pub async fn clear() -> Result<usize> {
    get_cache().clear().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::new(dir.path().join("cache")).unwrap();

        cache
            .put("key", "value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let hit: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(hit.as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_miss_returns_none() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::new(dir.path().join("cache")).unwrap();

        let miss: Option<String> = cache.get("absent").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::new(dir.path().join("cache")).unwrap();

        // Zero TTL expires immediately
        cache
            .put("key", 42u64, Duration::from_secs(0))
            .await
            .unwrap();

        let miss: Option<u64> = cache.get("key").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::new(dir.path().join("cache")).unwrap();

        cache
            .put("a", 1u32, Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .put("b", 2u32, Duration::from_secs(60))
            .await
            .unwrap();

        let cleared = cache.clear().await.unwrap();
        assert_eq!(cleared, 2);

        let a: Option<u32> = cache.get("a").await.unwrap();
        let b: Option<u32> = cache.get("b").await.unwrap();
        assert!(a.is_none());
        assert!(b.is_none());

        // Clearing an empty cache is a no-op
        assert_eq!(cache.clear().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_clear_drops_everything_after_concurrent_puts() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(PersistentCache::new(dir.path().join("cache")).unwrap());

        let mut handles = Vec::new();
        for i in 0..64u32 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .put(&format!("key-{i}"), i, Duration::from_secs(60))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Every key must be registered, so every key must be cleared
        assert_eq!(cache.clear().await.unwrap(), 64);
        for i in 0..64u32 {
            let miss: Option<u32> = cache.get(&format!("key-{i}")).await.unwrap();
            assert!(miss.is_none(), "key-{i} survived clear");
        }
    }

    #[tokio::test]
    async fn test_overwrite_does_not_duplicate_registry_entry() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::new(dir.path().join("cache")).unwrap();

        cache
            .put("key", 1u32, Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .put("key", 2u32, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.clear().await.unwrap(), 1);
    }
}
