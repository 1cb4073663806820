//! LeanLoad Filter List Compiler
//!
//! This crate turns ABP-style filter lists into declarative blocking rules
//! for the browser's request filtering surface. Everything here is pure:
//! malformed lines are dropped and oversized lists are truncated, nothing
//! returns an error.

pub mod parser;
pub mod policy;
pub mod rules;

pub use parser::{parse_filter_list, parse_filter_list_with_stats, ParseStats};
pub use policy::{apply_mode_policy, compile_for_mode, EXTREME_RESOURCE_TYPES};
pub use rules::{compile_domain_rules, RuleCompiler};
