use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Best-effort read cache for computed dashboard results.
/// A miss only means the caller recomputes.
#[async_trait]
pub trait QueryCache<V: Send + 'static>: Send + Sync {
    async fn get(&self, key: &str) -> Option<V>;

    async fn set(&self, key: String, value: V);
}

/// In-process cache with a fixed TTL and a bounded number of entries
pub struct TtlCache<V> {
    ttl: Duration,
    max_entries: usize,
    entries: RwLock<HashMap<String, (Instant, V)>>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl<V> QueryCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    async fn set(&self, key: String, value: V) {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, (stored_at, _))| *stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(key, (Instant::now(), value));
    }
}

/// Cache that never stores anything
pub struct NoCache;

#[async_trait]
impl<V: Send + 'static> QueryCache<V> for NoCache {
    async fn get(&self, _key: &str) -> Option<V> {
        None
    }

    async fn set(&self, _key: String, _value: V) {}
}
