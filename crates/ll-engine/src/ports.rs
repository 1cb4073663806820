//! Host capabilities the engine is written against.

use async_trait::async_trait;
use ll_core::{EngineResult, MatchScope, Rule, RuleId, State, TabId};
use serde_json::Value;

/// Retrieves the raw filter list text. No retries.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    async fn fetch_list(&self) -> EngineResult<String>;
}

/// Persistent key-value store. `Ok(None)` means the key is absent.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> EngineResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> EngineResult<()>;
}

/// The host's request filtering surface.
#[async_trait]
pub trait EnforcementSurface: Send + Sync {
    async fn active_rule_ids(&self) -> EngineResult<Vec<RuleId>>;

    /// Remove `remove_ids` and add `add_rules` in one call. Either the whole
    /// update lands or the surface reports `EngineError::Enforcement` and
    /// keeps its previous rules.
    async fn replace(&self, remove_ids: &[RuleId], add_rules: &[Rule]) -> EngineResult<()>;

    /// Number of rule match events recorded for `scope`.
    async fn matched_count(&self, scope: MatchScope) -> EngineResult<u64>;
}

/// Pushes state updates to content scripts.
#[async_trait]
pub trait TabNotifier: Send + Sync {
    async fn notify_tab(&self, tab_id: TabId, state: State) -> Result<(), String>;
    async fn notify_active_tab(&self, state: State) -> Result<(), String>;
}

pub trait Clock: Send + Sync {
    /// Unix time in milliseconds.
    fn now_millis(&self) -> i64;
}
