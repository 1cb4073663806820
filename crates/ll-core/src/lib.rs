//! LeanLoad Core Library
//!
//! Shared vocabulary for the LeanLoad filter rule engine: the declarative
//! rule shape handed to the browser's request filtering surface, the user
//! selected filtering mode, cached filter list data and blocking stats.
//!
//! # Modules
//!
//! - `types`: Rule, mode, cache and stats definitions
//! - `config`: Engine configuration and its named defaults
//! - `error`: The engine's error kinds

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use types::{
    DomainToken, FilterCache, MatchScope, Mode, ResourceType, Rule, RuleAction, RuleCondition,
    RuleId, State, Stats, StatsReport, TabId,
};
