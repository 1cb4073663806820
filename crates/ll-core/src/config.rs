//! Engine configuration.
//!
//! Every limit the engine applies is a named default here and can be
//! overridden from a JSON config file. Missing fields keep their default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Remote filter list source.
pub const DEFAULT_LIST_URL: &str = "https://easylist.to/easylist/easylist.txt";
/// Cached lists older than this are refetched on read.
pub const DEFAULT_CACHE_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1000;
/// Domain rules beyond this count are dropped. Leaves headroom under the
/// host's dynamic rule quota for the resource-type rules.
pub const DEFAULT_MAX_DOMAIN_RULES: usize = 4990;
/// ID of the first domain rule.
pub const DOMAIN_RULE_BASE_ID: u32 = 100;
/// Average size of a blocked request, used to estimate bytes saved.
pub const AVG_BYTES_PER_REQUEST: u64 = 30_000;
/// Period of the scheduled list refresh.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Storage key of the parsed filter list.
pub const FILTER_CACHE_KEY: &str = "filter_list_cache_v1";
/// Storage key of the user's mode.
pub const STATE_KEY: &str = "mode_state_v1";
/// Storage key of the cumulative stats.
pub const STATS_KEY: &str = "stats_v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub list_url: String,
    pub cache_ttl_ms: u64,
    pub max_domain_rules: usize,
    pub domain_rule_base_id: u32,
    pub avg_bytes_per_request: u64,
    pub refresh_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_LIST_URL.to_string(),
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_domain_rules: DEFAULT_MAX_DOMAIN_RULES,
            domain_rule_base_id: DOMAIN_RULE_BASE_ID,
            avg_bytes_per_request: AVG_BYTES_PER_REQUEST,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            user_agent: concat!("LeanLoad/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Rules extreme mode appends above the highest domain rule ID.
const EXTRA_RULE_IDS: u64 = 3;

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| EngineError::Storage(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Storage(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if self.refresh_interval_secs == 0 {
            return Err(invalid("refresh_interval_secs must be greater than zero"));
        }
        if self.cache_ttl_ms == 0 {
            return Err(invalid("cache_ttl_ms must be greater than zero"));
        }

        let highest_id = u64::from(self.domain_rule_base_id)
            .checked_add(self.max_domain_rules as u64)
            .and_then(|id| id.checked_add(EXTRA_RULE_IDS));
        match highest_id {
            Some(id) if id <= u64::from(u32::MAX) => Ok(()),
            _ => Err(invalid(format!(
                "domain_rule_base_id {} with max_domain_rules {} overflows the rule ID range",
                self.domain_rule_base_id, self.max_domain_rules
            ))),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> EngineError {
    EngineError::Storage(format!("Invalid config: {}", message))
}
