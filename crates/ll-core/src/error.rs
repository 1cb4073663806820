//! Error kinds surfaced by the engine.
//!
//! Parsing and compilation never fail, so only I/O facing operations
//! return these.

/// Error type for engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Transport failure or non-success status while fetching the list
    #[error("Failed to fetch filter list: {0}")]
    Fetch(String),
    /// Persistent key-value store read or write failure
    #[error("Storage error: {0}")]
    Storage(String),
    /// The request filtering surface rejected a rule replace
    #[error("Rule update rejected: {0}")]
    Enforcement(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
