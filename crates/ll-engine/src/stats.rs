//! Blocked request stats.
//!
//! Tab and session figures are read live from the surface's match counters.
//! All-time figures are persisted and only grow through
//! [`StatsAggregator::roll_session_into_all_time`].

use std::sync::Arc;

use ll_core::{EngineConfig, EngineResult, MatchScope, Stats, StatsReport, TabId};

use crate::ports::EnforcementSurface;
use crate::repository::StatsRepository;

pub struct StatsAggregator {
    surface: Arc<dyn EnforcementSurface>,
    repository: StatsRepository,
    avg_bytes_per_request: u64,
}

impl StatsAggregator {
    pub fn new(
        surface: Arc<dyn EnforcementSurface>,
        repository: StatsRepository,
        config: &EngineConfig,
    ) -> Self {
        Self {
            surface,
            repository,
            avg_bytes_per_request: config.avg_bytes_per_request,
        }
    }

    pub async fn tab_stats(&self, tab_id: TabId) -> EngineResult<Stats> {
        self.scoped(MatchScope::Tab(tab_id)).await
    }

    pub async fn session_stats(&self) -> EngineResult<Stats> {
        self.scoped(MatchScope::Session).await
    }

    pub async fn all_time_stats(&self) -> EngineResult<Stats> {
        Ok(self.repository.load_all_time().await?.unwrap_or(Stats::ZERO))
    }

    /// Add the current session counters onto the all-time totals.
    ///
    /// The surface's counters are left untouched, so calling this twice in
    /// one session counts that session twice. Call it once per session
    /// boundary.
    pub async fn roll_session_into_all_time(&self) -> EngineResult<Stats> {
        let session = self.session_stats().await?;
        let current = self.all_time_stats().await?;
        let updated = current.saturating_add(session);

        self.repository.save_all_time(updated).await?;
        log::info!(
            "checkpointed {} blocked requests, {} all time",
            session.blocked_requests,
            updated.blocked_requests
        );
        Ok(updated)
    }

    /// Stats for every horizon. Without a tab the tab figures are zero; tab
    /// 0 counts as no tab.
    pub async fn report(&self, tab_id: Option<TabId>) -> EngineResult<StatsReport> {
        let current_tab = match tab_id.filter(|&tab_id| tab_id != 0) {
            Some(tab_id) => self.tab_stats(tab_id).await?,
            None => Stats::ZERO,
        };

        Ok(StatsReport {
            current_tab,
            session: self.session_stats().await?,
            all_time: self.all_time_stats().await?,
        })
    }

    async fn scoped(&self, scope: MatchScope) -> EngineResult<Stats> {
        let count = self.surface.matched_count(scope).await?;
        Ok(Stats::from_count(count, self.avg_bytes_per_request))
    }
}

/// Human readable byte count: `B` below 1 KiB, then one decimal `KB`/`MB`.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
