//! Command surface and lifecycle hooks.
//!
//! The presentation layer talks to the engine through JSON messages tagged
//! by `type`; the host drives it through the install, startup and refresh
//! hooks. Every path that touches the filtering surface goes through the
//! synchronizer.

use std::sync::Arc;

use ll_compiler::RuleCompiler;
use ll_core::{EngineConfig, EngineResult, Mode, State, StatsReport, TabId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::cache::CacheStore;
use crate::ports::{Clock, EnforcementSurface, KeyValueStore, ListFetcher, TabNotifier};
use crate::repository::{StateRepository, StatsRepository};
use crate::stats::StatsAggregator;
use crate::sync::{RuleSynchronizer, SyncReport};

/// Host capabilities handed to the controller.
#[derive(Clone)]
pub struct HostPorts {
    pub fetcher: Arc<dyn ListFetcher>,
    pub store: Arc<dyn KeyValueStore>,
    pub surface: Arc<dyn EnforcementSurface>,
    pub notifier: Arc<dyn TabNotifier>,
    pub clock: Arc<dyn Clock>,
}

/// Request from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    GetState,
    SetMode {
        mode: Mode,
    },
    ApplyToTab {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    GetStats {
        #[serde(rename = "tabId", default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
    },
}

impl Command {
    /// Every message `type` the controller understands.
    pub const TYPES: [&'static str; 4] = ["GET_STATE", "SET_MODE", "APPLY_TO_TAB", "GET_STATS"];
}

/// Successful command outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    State(State),
    Applied,
    Stats(StatsReport),
}

impl Reply {
    pub fn to_json(&self) -> Value {
        match self {
            Reply::State(state) => json!({ "ok": true, "state": state }),
            Reply::Applied => json!({ "ok": true }),
            Reply::Stats(stats) => json!({ "ok": true, "stats": stats }),
        }
    }
}

fn error_json(message: impl Into<String>) -> Value {
    json!({ "ok": false, "error": message.into() })
}

pub struct Controller {
    states: StateRepository,
    cache: Arc<CacheStore>,
    synchronizer: Arc<RuleSynchronizer>,
    stats: StatsAggregator,
    notifier: Arc<dyn TabNotifier>,
    mode_lock: Mutex<()>,
}

impl Controller {
    pub fn new(config: &EngineConfig, ports: HostPorts) -> Self {
        let cache = Arc::new(CacheStore::new(
            ports.store.clone(),
            ports.fetcher,
            ports.clock,
            config,
        ));
        let synchronizer = Arc::new(RuleSynchronizer::new(
            ports.surface.clone(),
            cache.clone(),
            RuleCompiler::from_config(config),
        ));
        let stats = StatsAggregator::new(
            ports.surface,
            StatsRepository::new(ports.store.clone()),
            config,
        );

        Self {
            states: StateRepository::new(ports.store),
            cache,
            synchronizer,
            stats,
            notifier: ports.notifier,
            mode_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub async fn handle(&self, command: Command) -> EngineResult<Reply> {
        match command {
            Command::GetState => Ok(Reply::State(self.states.get().await?)),
            Command::SetMode { mode } => Ok(Reply::State(self.set_mode(mode).await?)),
            Command::ApplyToTab { tab_id } => {
                let state = self.states.get().await?;
                if let Err(e) = self.notifier.notify_tab(tab_id, state).await {
                    log::debug!("tab {} not notified: {}", tab_id, e);
                }
                Ok(Reply::Applied)
            }
            Command::GetStats { tab_id } => Ok(Reply::Stats(self.stats.report(tab_id).await?)),
        }
    }

    /// Handle a raw JSON message and build the JSON reply.
    pub async fn handle_message(&self, message: Value) -> Value {
        let known = message
            .get("type")
            .and_then(Value::as_str)
            .map_or(false, |ty| Command::TYPES.iter().any(|known| *known == ty));
        if !known {
            return error_json("Unknown message type");
        }

        let command: Command = match serde_json::from_value(message) {
            Ok(command) => command,
            Err(e) => return error_json(format!("Invalid message: {}", e)),
        };

        match self.handle(command).await {
            Ok(reply) => reply.to_json(),
            Err(e) => error_json(e.to_string()),
        }
    }

    /// Switch to `mode`.
    ///
    /// Rules are applied before the new state is persisted. If persisting
    /// fails the previous mode's rules are put back and the storage error is
    /// returned. Selecting the current mode touches nothing.
    pub async fn set_mode(&self, mode: Mode) -> EngineResult<State> {
        let _guard = self.mode_lock.lock().await;

        let current = self.states.get().await?;
        if current.mode == mode {
            return Ok(current);
        }

        self.synchronizer.apply_rules_for_mode(mode).await?;

        let next = State { mode };
        if let Err(e) = self.states.save(next).await {
            log::warn!("failed to persist mode {}, restoring {}: {}", mode, current.mode, e);
            if let Err(rollback) = self.synchronizer.apply_rules_for_mode(current.mode).await {
                log::error!("failed to restore rules for mode {}: {}", current.mode, rollback);
            }
            return Err(e);
        }

        log::info!("mode changed from {} to {}", current.mode, mode);
        if let Err(e) = self.notifier.notify_active_tab(next).await {
            log::debug!("active tab not notified: {}", e);
        }
        Ok(next)
    }

    /// First install: fetch the list and apply the stored mode.
    pub async fn on_installed(&self) -> EngineResult<SyncReport> {
        self.cache.force_refresh().await?;
        self.apply_stored_mode().await
    }

    /// Browser startup: fold the previous session into the all-time stats,
    /// then re-apply the stored mode.
    pub async fn on_startup(&self) -> EngineResult<SyncReport> {
        self.stats.roll_session_into_all_time().await?;
        self.apply_stored_mode().await
    }

    /// Scheduled maintenance. A failed fetch leaves the existing cache and
    /// rules in place.
    pub async fn on_refresh_alarm(&self) -> EngineResult<SyncReport> {
        self.cache.force_refresh().await?;
        self.apply_stored_mode().await
    }

    async fn apply_stored_mode(&self) -> EngineResult<SyncReport> {
        let _guard = self.mode_lock.lock().await;
        let state = self.states.get().await?;
        self.synchronizer.apply_rules_for_mode(state.mode).await
    }
}
