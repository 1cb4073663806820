#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ll_core::{EngineConfig, EngineError, EngineResult, MatchScope, Rule, RuleId, State, TabId};
use ll_engine::{
    Controller, EnforcementSurface, HostPorts, KeyValueStore, ListFetcher, ManualClock,
    MemoryStore, MemorySurface, TabNotifier,
};
use serde_json::Value;
use tokio::sync::RwLock;

pub const NOW: i64 = 1_700_000_000_000;
pub const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

pub const SAMPLE_LIST: &str = "\
[Adblock Plus 2.0]
! Title: Sample
||ads.example.com^
||tracker.example.net^$third-party
@@||allowed.example.org^
example.com##.banner
||cdn.example.io/pixel.gif
||metrics.example.co^$script
";

pub struct MockFetcher {
    text: RwLock<String>,
    call_count: AtomicU64,
    should_fail: RwLock<bool>,
}

impl MockFetcher {
    pub fn new(text: &str) -> Self {
        Self {
            text: RwLock::new(text.to_string()),
            call_count: AtomicU64::new(0),
            should_fail: RwLock::new(false),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn set_text(&self, text: &str) {
        *self.text.write().await = text.to_string();
    }

    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write().await = fail;
    }
}

#[async_trait]
impl ListFetcher for MockFetcher {
    async fn fetch_list(&self) -> EngineResult<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if *self.should_fail.read().await {
            return Err(EngineError::Fetch("HTTP 503 for mock".to_string()));
        }
        Ok(self.text.read().await.clone())
    }
}

/// Memory store whose writes to one key can be made to fail.
pub struct FlakyStore {
    inner: MemoryStore,
    failing_key: RwLock<Option<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            failing_key: RwLock::new(None),
        }
    }

    pub async fn fail_writes_to(&self, key: Option<&str>) {
        *self.failing_key.write().await = key.map(str::to_string);
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> EngineResult<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> EngineResult<()> {
        if self.failing_key.read().await.as_deref() == Some(key) {
            return Err(EngineError::Storage(format!("write to {} refused", key)));
        }
        self.inner.set(key, value).await
    }
}

/// Surface that yields between reading active IDs and returning them, to
/// widen the window for interleaved synchronizations.
pub struct SlowSurface {
    pub inner: MemorySurface,
    delay: Duration,
}

impl SlowSurface {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemorySurface::new(),
            delay,
        }
    }
}

#[async_trait]
impl EnforcementSurface for SlowSurface {
    async fn active_rule_ids(&self) -> EngineResult<Vec<RuleId>> {
        let ids = self.inner.active_rule_ids().await?;
        tokio::time::sleep(self.delay).await;
        Ok(ids)
    }

    async fn replace(&self, remove_ids: &[RuleId], add_rules: &[Rule]) -> EngineResult<()> {
        self.inner.replace(remove_ids, add_rules).await
    }

    async fn matched_count(&self, scope: MatchScope) -> EngineResult<u64> {
        self.inner.matched_count(scope).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Tab(TabId, State),
    ActiveTab(State),
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<Notification>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl TabNotifier for RecordingNotifier {
    async fn notify_tab(&self, tab_id: TabId, state: State) -> Result<(), String> {
        self.sent.write().await.push(Notification::Tab(tab_id, state));
        Ok(())
    }

    async fn notify_active_tab(&self, state: State) -> Result<(), String> {
        self.sent.write().await.push(Notification::ActiveTab(state));
        Err("no content script in active tab".to_string())
    }
}

pub struct Harness {
    pub controller: Arc<Controller>,
    pub fetcher: Arc<MockFetcher>,
    pub store: Arc<FlakyStore>,
    pub surface: Arc<MemorySurface>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default(), MemorySurface::new())
    }

    pub fn with_config(config: EngineConfig, surface: MemorySurface) -> Self {
        let fetcher = Arc::new(MockFetcher::new(SAMPLE_LIST));
        let store = Arc::new(FlakyStore::new());
        let surface = Arc::new(surface);
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::new(NOW));

        let ports = HostPorts {
            fetcher: fetcher.clone(),
            store: store.clone(),
            surface: surface.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        };

        Self {
            controller: Arc::new(Controller::new(&config, ports)),
            fetcher,
            store,
            surface,
            notifier,
            clock,
        }
    }

    pub async fn rule_ids(&self) -> Vec<RuleId> {
        self.surface.active_rule_ids().await.unwrap()
    }
}

/// `count` distinct `||host^` lines.
pub fn list_of(count: usize) -> String {
    (0..count)
        .map(|i| format!("||host{}.example^\n", i))
        .collect()
}
