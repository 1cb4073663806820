//! Typed repositories over the shared key-value store.

use std::sync::Arc;

use ll_core::config::{STATE_KEY, STATS_KEY};
use ll_core::{EngineResult, State, Stats};
use serde::{Deserialize, Serialize};

use crate::ports::KeyValueStore;

/// The user's filtering mode.
#[derive(Clone)]
pub struct StateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StateRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> EngineResult<Option<State>> {
        match self.store.get(STATE_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stored state, or the default (`low`) when nothing was saved yet.
    pub async fn get(&self) -> EngineResult<State> {
        Ok(self.load().await?.unwrap_or_default())
    }

    pub async fn save(&self, state: State) -> EngineResult<()> {
        self.store.set(STATE_KEY, serde_json::to_value(state)?).await
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredStats {
    alltime: Stats,
}

/// Cumulative blocked-request counters.
#[derive(Clone)]
pub struct StatsRepository {
    store: Arc<dyn KeyValueStore>,
}

impl StatsRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load_all_time(&self) -> EngineResult<Option<Stats>> {
        match self.store.get(STATS_KEY).await? {
            Some(value) => {
                let stored: StoredStats = serde_json::from_value(value)?;
                Ok(Some(stored.alltime))
            }
            None => Ok(None),
        }
    }

    pub async fn save_all_time(&self, stats: Stats) -> EngineResult<()> {
        let stored = StoredStats { alltime: stats };
        self.store.set(STATS_KEY, serde_json::to_value(&stored)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use ll_core::{EngineError, Mode};
    use serde_json::json;

    #[tokio::test]
    async fn state_defaults_to_low_when_absent() {
        let repo = StateRepository::new(Arc::new(MemoryStore::new()));
        assert_eq!(repo.load().await.unwrap(), None);
        assert_eq!(repo.get().await.unwrap(), State { mode: Mode::Low });
    }

    #[tokio::test]
    async fn state_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let repo = StateRepository::new(store.clone());
        repo.save(State { mode: Mode::Extreme }).await.unwrap();

        assert_eq!(
            store.get(STATE_KEY).await.unwrap(),
            Some(json!({ "mode": "extreme" }))
        );
        assert_eq!(repo.get().await.unwrap().mode, Mode::Extreme);
    }

    #[tokio::test]
    async fn unknown_stored_mode_is_a_storage_error() {
        let store = Arc::new(MemoryStore::new());
        store.set(STATE_KEY, json!({ "mode": "turbo" })).await.unwrap();

        let err = StateRepository::new(store).get().await.unwrap_err();
        assert!(matches!(err, EngineError::Storage(_)));
    }

    #[tokio::test]
    async fn stats_use_alltime_envelope() {
        let store = Arc::new(MemoryStore::new());
        let repo = StatsRepository::new(store.clone());
        assert_eq!(repo.load_all_time().await.unwrap(), None);

        repo.save_all_time(Stats::from_count(2, 30_000)).await.unwrap();
        assert_eq!(
            store.get(STATS_KEY).await.unwrap(),
            Some(json!({ "alltime": { "blockedRequests": 2, "estimatedBytesSaved": 60000 } }))
        );
        assert_eq!(
            repo.load_all_time().await.unwrap(),
            Some(Stats::from_count(2, 30_000))
        );
    }
}
