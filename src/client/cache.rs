//! Local stores for the stale-on-error fallback.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value storage for the last good response body of each query.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, body: &str) -> Result<()>;
}

// ============================================================================
// In-memory LRU
// ============================================================================

struct Entry {
    body: String,
    stored_at: DateTime<Utc>,
    last_used: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    tick: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// Bounded in-process store: least recently used entries are evicted past
/// `capacity`, and entries older than `ttl` (when set) read as misses.
///
/// Eviction scans every entry, so an overflowing `put` is O(capacity). Sized
/// for a few hundred entries; large capacities belong in [`RedisStore`].
pub struct MemoryStore {
    capacity: usize,
    ttl: Option<Duration>,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        self.ttl.map(|ttl| now - entry.stored_at > ttl).unwrap_or(false)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        let tick = inner.next_tick();
        let now = Utc::now();

        let expired = match inner.entries.get(key) {
            None => return Ok(None),
            Some(entry) => self.expired(entry, now),
        };
        if expired {
            inner.entries.remove(key);
            return Ok(None);
        }

        Ok(inner.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.body.clone()
        }))
    }

    async fn put(&self, key: &str, body: &str) -> Result<()> {
        let mut inner = self.inner.lock().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
        let tick = inner.next_tick();
        inner.entries.insert(
            key.to_string(),
            Entry {
                body: body.to_string(),
                stored_at: Utc::now(),
                last_used: tick,
            },
        );

        while inner.entries.len() > self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    tracing::debug!(key = %k, "evicting least recently used cache entry");
                    inner.entries.remove(&k);
                }
                None => break,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Redis
// ============================================================================

/// Persistent store backed by Redis. Entries expire after `ttl_secs` when set.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
    ttl_secs: Option<u64>,
}

impl RedisStore {
    pub async fn new(redis_url: &str, ttl_secs: Option<u64>) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;

        let mut conn = client.get_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("response cache connected to redis");

        Ok(Self {
            client,
            prefix: "aggregator:cache:".to_string(),
            ttl_secs,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_async_connection().await?;
        let value: Option<String> = redis::cmd("GET").arg(self.key(key)).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, body: &str) -> Result<()> {
        let mut conn = self.client.get_async_connection().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.key(key)).arg(body);
        if let Some(ttl) = self.ttl_secs {
            cmd.arg("EX").arg(ttl);
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }
}
