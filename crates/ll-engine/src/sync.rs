//! Rule synchronizer.
//!
//! Reconciles the filtering surface with a mode by full replacement: every
//! active rule is removed and the mode's rule set is added in one call. Runs
//! are serialized so two triggers never interleave their read and replace.

use std::sync::Arc;

use ll_compiler::RuleCompiler;
use ll_core::{EngineResult, Mode};
use tokio::sync::Mutex;

use crate::cache::CacheStore;
use crate::ports::EnforcementSurface;

/// Outcome of one synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: Mode,
    pub removed: usize,
    pub added: usize,
}

pub struct RuleSynchronizer {
    surface: Arc<dyn EnforcementSurface>,
    cache: Arc<CacheStore>,
    compiler: RuleCompiler,
    in_flight: Mutex<()>,
}

impl RuleSynchronizer {
    pub fn new(
        surface: Arc<dyn EnforcementSurface>,
        cache: Arc<CacheStore>,
        compiler: RuleCompiler,
    ) -> Self {
        Self {
            surface,
            cache,
            compiler,
            in_flight: Mutex::new(()),
        }
    }

    /// Replace the active rules with the rule set for `mode`.
    ///
    /// Callers queue behind any synchronization already running. On error
    /// the surface keeps whatever rules it had before this call.
    pub async fn apply_rules_for_mode(&self, mode: Mode) -> EngineResult<SyncReport> {
        let _in_flight = self.in_flight.lock().await;

        let existing = self.surface.active_rule_ids().await?;
        let domains = if mode.uses_filter_list() {
            self.cache.get_domains().await?
        } else {
            Vec::new()
        };
        let rules = self.compiler.compile_for_mode(mode, &domains);

        self.surface.replace(&existing, &rules).await?;

        log::info!(
            "applied mode {}: removed {} rules, added {}",
            mode,
            existing.len(),
            rules.len()
        );

        Ok(SyncReport {
            mode,
            removed: existing.len(),
            added: rules.len(),
        })
    }
}
