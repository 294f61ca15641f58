use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::cache::KeyValueCollection;
use crate::core::record::Record;
use crate::core::source::{RecordQuery, RecordSource};

/// Serves dataset rows from a key-value collection for `ttl` before asking
/// the wrapped source again. Failures are never cached.
pub struct CachingRecordSource<T: RecordSource> {
    inner: T,
    collection: Arc<dyn KeyValueCollection>,
    ttl: Option<Duration>,
}

impl<T: RecordSource> CachingRecordSource<T> {
    pub fn new(inner: T, collection: Arc<dyn KeyValueCollection>, ttl: Option<Duration>) -> Self {
        Self {
            inner,
            collection,
            ttl,
        }
    }
}

#[async_trait]
impl<T: RecordSource> RecordSource for CachingRecordSource<T> {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        let key = query.cache_key();
        if let Some(bytes) = self.collection.get(key.as_bytes()).await {
            match serde_json::from_slice::<Vec<Record>>(&bytes) {
                Ok(records) => {
                    debug!("Cache hit for records: {}", key);
                    return Ok(records);
                }
                Err(e) => {
                    warn!("Dropping unreadable cache entry {}: {}", key, e);
                    self.collection.remove(key.as_bytes()).await;
                }
            }
        }

        debug!("Cache miss for records: {}", key);
        let records = self.inner.fetch_records(query).await?;
        match serde_json::to_vec(&records) {
            Ok(bytes) => self.collection.put(key.as_bytes(), &bytes, self.ttl).await,
            Err(e) => warn!("Failed to cache records for {}: {}", key, e),
        }
        Ok(records)
    }
}
