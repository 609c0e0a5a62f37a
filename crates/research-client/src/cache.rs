//! Time-keyed cache for research responses. Qualitative research is the
//! expensive call in the pipeline (multi-step web research, minutes per
//! symbol), so responses are held for 24 hours within the running process.
//! Never persisted; a restart starts cold.
//!
//! Deliberately not a module-level singleton: the orchestrator constructs
//! one and passes it by reference, and the only operations are
//! `get_or_fetch` and `invalidate`.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::future::Future;
use valuation_core::ResearchResponse;

use crate::error::ResearchResult;

const DEFAULT_TTL_HOURS: i64 = 24;

struct CacheEntry {
    data: ResearchResponse,
    cached_at: DateTime<Utc>,
}

pub struct ResearchCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::hours(DEFAULT_TTL_HOURS))
    }

    /// Cache key for a research request: symbol plus the sorted criterion-id
    /// list, so the same id set always hits the same entry regardless of
    /// caller ordering.
    pub fn key(symbol: &str, criterion_ids: &[u8]) -> String {
        let mut ids = criterion_ids.to_vec();
        ids.sort_unstable();
        let ids: Vec<String> = ids.iter().map(u8::to_string).collect();
        format!("{}-{}", symbol, ids.join(","))
    }

    /// Return the cached response when fresh, otherwise run the fetcher and
    /// cache its result. Errors are not cached; the next call retries.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        fetcher: F,
    ) -> ResearchResult<ResearchResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResearchResult<ResearchResponse>>,
    {
        if let Some(entry) = self.entries.get(key) {
            if Utc::now() - entry.cached_at < self.ttl {
                tracing::debug!(key, "research cache hit");
                return Ok(entry.data.clone());
            }
        }

        let data = fetcher().await?;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                data: data.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(data)
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }
}
