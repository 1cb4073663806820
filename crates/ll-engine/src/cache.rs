//! Filter list cache.
//!
//! Owns the single persisted `FilterCache` entry. Reads refetch the list when
//! the entry is missing or older than the TTL; refreshes replace the entry
//! wholesale. Fetch failures are never papered over with stale data.

use std::sync::Arc;

use ll_compiler::parse_filter_list;
use ll_core::config::FILTER_CACHE_KEY;
use ll_core::{DomainToken, EngineConfig, EngineResult, FilterCache};

use crate::ports::{Clock, KeyValueStore, ListFetcher};

pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn ListFetcher>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl CacheStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn ListFetcher>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
            ttl_ms: config.cache_ttl_ms,
        }
    }

    /// The persisted cache as-is. An entry that no longer decodes is
    /// reported as absent so the next read replaces it.
    pub async fn read(&self) -> EngineResult<Option<FilterCache>> {
        let Some(value) = self.store.get(FILTER_CACHE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(cache) => Ok(Some(cache)),
            Err(e) => {
                log::warn!("discarding undecodable filter cache: {}", e);
                Ok(None)
            }
        }
    }

    pub fn is_fresh(&self, cache: &FilterCache) -> bool {
        cache.is_fresh(self.clock.now_millis(), self.ttl_ms)
    }

    /// Cached domains, refetched first if the cache is missing or stale.
    pub async fn get_domains(&self) -> EngineResult<Vec<DomainToken>> {
        if let Some(cache) = self.read().await? {
            if self.is_fresh(&cache) {
                return Ok(cache.domains);
            }
            log::debug!("filter cache from {} is stale", cache.fetched_at);
        }

        Ok(self.force_refresh().await?.domains)
    }

    /// Fetch, parse and persist the list regardless of the cache's age.
    pub async fn force_refresh(&self) -> EngineResult<FilterCache> {
        let raw = self.fetcher.fetch_list().await?;
        let domains = parse_filter_list(&raw);

        let cache = FilterCache {
            fetched_at: self.clock.now_millis(),
            domains,
        };
        self.store
            .set(FILTER_CACHE_KEY, serde_json::to_value(&cache)?)
            .await?;

        log::info!("filter list refreshed: {} domains", cache.domains.len());
        Ok(cache)
    }
}
