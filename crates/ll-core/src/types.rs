//! Core type definitions for LeanLoad
//!
//! The rule types serialize to the same JSON shape the browser's declarative
//! request filtering API consumes, so a compiled rule set can be handed to
//! the host as-is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rule identifier, unique within the active rule set.
pub type RuleId = u32;

/// Browser tab identifier.
pub type TabId = i32;

// =============================================================================
// Domain Tokens
// =============================================================================

/// A domain extracted from a `||domain^` filter line.
///
/// Never empty and never contains `/` or `^`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainToken(String);

impl DomainToken {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() || value.contains('/') || value.contains('^') {
            return None;
        }
        Some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value.clone()).ok_or_else(|| format!("invalid domain token: {:?}", value))
    }
}

impl From<DomainToken> for String {
    fn from(token: DomainToken) -> Self {
        token.0
    }
}

// =============================================================================
// Rule Actions
// =============================================================================

/// Action to take for a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleAction {
    /// Cancels the request
    Block,
}

// =============================================================================
// Resource Types
// =============================================================================

/// Request resource category as named by the filtering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    SubFrame,
    Stylesheet,
    Script,
    Image,
    Font,
    Xmlhttprequest,
    Ping,
    Media,
    Other,
}

impl ResourceType {
    /// Types covered by every domain rule, in emission order.
    pub const DOMAIN_RULE_TYPES: [ResourceType; 9] = [
        Self::Script,
        Self::Image,
        Self::Xmlhttprequest,
        Self::SubFrame,
        Self::Stylesheet,
        Self::Font,
        Self::Media,
        Self::Ping,
        Self::Other,
    ];
}

// =============================================================================
// Rules
// =============================================================================

/// Match condition of a rule. At least one field is set on every rule the
/// compiler emits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<ResourceType>>,
}

impl RuleCondition {
    pub fn is_empty(&self) -> bool {
        self.url_filter.is_none()
            && self.resource_types.as_ref().map_or(true, |types| types.is_empty())
    }
}

/// A declarative blocking rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: RuleId,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

impl Rule {
    /// Priority assigned to every compiled rule.
    pub const DEFAULT_PRIORITY: u32 = 1;

    pub fn block(id: RuleId, condition: RuleCondition) -> Self {
        Self {
            id,
            priority: Self::DEFAULT_PRIORITY,
            action: RuleAction::Block,
            condition,
        }
    }
}

// =============================================================================
// Mode and State
// =============================================================================

/// User selected filtering intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Off,
    #[default]
    Low,
    Medium,
    High,
    Extreme,
}

impl Mode {
    pub const ALL: [Mode; 5] = [Self::Off, Self::Low, Self::Medium, Self::High, Self::Extreme];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }

    /// Whether compiling this mode consults the filter list at all.
    pub fn uses_filter_list(self) -> bool {
        self != Self::Off
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("Unknown mode '{}'", s))
    }
}

/// The persisted user configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct State {
    pub mode: Mode,
}

// =============================================================================
// Filter Cache
// =============================================================================

/// Parsed filter list as persisted by the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCache {
    /// Unix timestamp in milliseconds
    pub fetched_at: i64,
    pub domains: Vec<DomainToken>,
}

impl FilterCache {
    /// A cache is fresh while its age is strictly below `ttl_ms`.
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: u64) -> bool {
        let age = now_ms.saturating_sub(self.fetched_at);
        age < 0 || (age as u64) < ttl_ms
    }
}

// =============================================================================
// Stats
// =============================================================================

/// Which match events to count on the filtering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchScope {
    Tab(TabId),
    Session,
}

/// Blocked-request figures for one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub blocked_requests: u64,
    pub estimated_bytes_saved: u64,
}

impl Stats {
    pub const ZERO: Stats = Stats {
        blocked_requests: 0,
        estimated_bytes_saved: 0,
    };

    pub fn from_count(blocked_requests: u64, avg_bytes_per_request: u64) -> Self {
        Self {
            blocked_requests,
            estimated_bytes_saved: blocked_requests.saturating_mul(avg_bytes_per_request),
        }
    }

    pub fn saturating_add(self, other: Stats) -> Self {
        Self {
            blocked_requests: self.blocked_requests.saturating_add(other.blocked_requests),
            estimated_bytes_saved: self
                .estimated_bytes_saved
                .saturating_add(other.estimated_bytes_saved),
        }
    }
}

/// Stats for every horizon, as returned to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub current_tab: Stats,
    pub session: Stats,
    pub all_time: Stats,
}
