//! In-memory request filtering surface.
//!
//! Mirrors the host's contract closely enough to drive the engine outside a
//! browser: replaces are validated up front and applied all-or-nothing, and
//! match events are counted per tab.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use ll_core::{EngineError, EngineResult, MatchScope, Rule, RuleId, State, TabId};
use tokio::sync::Mutex;

use crate::ports::{EnforcementSurface, TabNotifier};

/// Dynamic rule quota of the host.
pub const DEFAULT_RULE_QUOTA: usize = 5000;

#[derive(Debug, Default)]
struct SurfaceState {
    rules: BTreeMap<RuleId, Rule>,
    tab_matches: BTreeMap<Option<TabId>, u64>,
    session_matches: u64,
    replace_count: u64,
}

#[derive(Debug)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
    rule_quota: usize,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::with_quota(DEFAULT_RULE_QUOTA)
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(rule_quota: usize) -> Self {
        Self {
            state: Mutex::new(SurfaceState::default()),
            rule_quota,
        }
    }

    /// Active rules ordered by ID.
    pub async fn rules(&self) -> Vec<Rule> {
        self.state.lock().await.rules.values().cloned().collect()
    }

    pub async fn replace_count(&self) -> u64 {
        self.state.lock().await.replace_count
    }

    /// Record that `rule_id` matched a request, optionally inside a tab.
    pub async fn record_match(&self, rule_id: RuleId, tab_id: Option<TabId>) {
        log::trace!("rule {} matched in tab {:?}", rule_id, tab_id);
        let mut state = self.state.lock().await;
        *state.tab_matches.entry(tab_id).or_insert(0) += 1;
        state.session_matches += 1;
    }

    /// Drop all recorded matches, as a browser restart does.
    pub async fn reset_matches(&self) {
        let mut state = self.state.lock().await;
        state.tab_matches.clear();
        state.session_matches = 0;
    }
}

#[async_trait]
impl EnforcementSurface for MemorySurface {
    async fn active_rule_ids(&self) -> EngineResult<Vec<RuleId>> {
        Ok(self.state.lock().await.rules.keys().copied().collect())
    }

    async fn replace(&self, remove_ids: &[RuleId], add_rules: &[Rule]) -> EngineResult<()> {
        let mut state = self.state.lock().await;

        let removed: HashSet<RuleId> = remove_ids.iter().copied().collect();
        let mut remaining: HashSet<RuleId> = state
            .rules
            .keys()
            .copied()
            .filter(|id| !removed.contains(id))
            .collect();

        for rule in add_rules {
            if rule.condition.is_empty() {
                return Err(EngineError::Enforcement(format!(
                    "Rule with id {} has an empty condition",
                    rule.id
                )));
            }
            if !remaining.insert(rule.id) {
                return Err(EngineError::Enforcement(format!(
                    "Rule with id {} does not have a unique ID",
                    rule.id
                )));
            }
        }

        if remaining.len() > self.rule_quota {
            return Err(EngineError::Enforcement(format!(
                "{} rules exceed the dynamic rule quota of {}",
                remaining.len(),
                self.rule_quota
            )));
        }

        state.rules.retain(|id, _| !removed.contains(id));
        for rule in add_rules {
            state.rules.insert(rule.id, rule.clone());
        }
        state.replace_count += 1;

        Ok(())
    }

    async fn matched_count(&self, scope: MatchScope) -> EngineResult<u64> {
        let state = self.state.lock().await;
        let count = match scope {
            MatchScope::Session => state.session_matches,
            MatchScope::Tab(tab) => state.tab_matches.get(&Some(tab)).copied().unwrap_or(0),
        };
        Ok(count)
    }
}

/// Notifier for hosts without content scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl TabNotifier for NoopNotifier {
    async fn notify_tab(&self, _tab_id: TabId, _state: State) -> Result<(), String> {
        Ok(())
    }

    async fn notify_active_tab(&self, _state: State) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ll_core::{ResourceType, RuleCondition};

    fn rule(id: RuleId) -> Rule {
        Rule::block(
            id,
            RuleCondition {
                url_filter: Some(format!("||r{}.test^", id)),
                resource_types: None,
            },
        )
    }

    #[tokio::test]
    async fn replace_removes_then_adds() {
        let surface = MemorySurface::new();
        surface.replace(&[], &[rule(1), rule(2)]).await.unwrap();
        surface.replace(&[1, 2], &[rule(2), rule(3)]).await.unwrap();

        assert_eq!(surface.active_rule_ids().await.unwrap(), vec![2, 3]);
        assert_eq!(surface.replace_count().await, 2);
    }

    #[tokio::test]
    async fn unknown_remove_ids_are_ignored() {
        let surface = MemorySurface::new();
        surface.replace(&[42], &[rule(1)]).await.unwrap();
        assert_eq!(surface.active_rule_ids().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn id_collision_rejects_whole_update() {
        let surface = MemorySurface::new();
        surface.replace(&[], &[rule(1)]).await.unwrap();

        let err = surface.replace(&[], &[rule(5), rule(1)]).await.unwrap_err();
        assert!(matches!(err, EngineError::Enforcement(_)));
        assert_eq!(surface.active_rule_ids().await.unwrap(), vec![1]);

        let err = surface.replace(&[1], &[rule(7), rule(7)]).await.unwrap_err();
        assert!(matches!(err, EngineError::Enforcement(_)));
        assert_eq!(surface.active_rule_ids().await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn empty_condition_is_rejected() {
        let surface = MemorySurface::new();
        let bad = Rule::block(9, RuleCondition::default());
        assert!(surface.replace(&[], &[bad]).await.is_err());

        let ok = Rule::block(
            9,
            RuleCondition {
                url_filter: None,
                resource_types: Some(vec![ResourceType::Font]),
            },
        );
        assert!(surface.replace(&[], &[ok]).await.is_ok());
    }

    #[tokio::test]
    async fn quota_is_enforced_after_removal() {
        let surface = MemorySurface::with_quota(2);
        surface.replace(&[], &[rule(1), rule(2)]).await.unwrap();
        assert!(surface.replace(&[], &[rule(3)]).await.is_err());
        assert!(surface.replace(&[1], &[rule(3)]).await.is_ok());
    }

    #[tokio::test]
    async fn counts_matches_by_scope() {
        let surface = MemorySurface::new();
        surface.record_match(100, Some(7)).await;
        surface.record_match(101, Some(7)).await;
        surface.record_match(100, Some(8)).await;
        surface.record_match(102, None).await;

        assert_eq!(surface.matched_count(MatchScope::Tab(7)).await.unwrap(), 2);
        assert_eq!(surface.matched_count(MatchScope::Tab(9)).await.unwrap(), 0);
        assert_eq!(surface.matched_count(MatchScope::Session).await.unwrap(), 4);

        surface.reset_matches().await;
        assert_eq!(surface.matched_count(MatchScope::Session).await.unwrap(), 0);
        assert_eq!(surface.matched_count(MatchScope::Tab(7)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn repeated_matches_are_counted_not_stored() {
        let surface = MemorySurface::new();
        for i in 0..10_000u32 {
            surface.record_match(100 + i % 3, Some((i % 2) as TabId)).await;
        }

        assert_eq!(surface.matched_count(MatchScope::Tab(0)).await.unwrap(), 5_000);
        assert_eq!(surface.matched_count(MatchScope::Tab(1)).await.unwrap(), 5_000);
        assert_eq!(surface.matched_count(MatchScope::Session).await.unwrap(), 10_000);
        assert_eq!(surface.state.lock().await.tab_matches.len(), 2);
    }
}
