//! LeanLoad Rule Engine
//!
//! Keeps the browser's request filtering surface in line with the user's
//! filtering mode. The engine is written against a handful of host ports so
//! it can run inside an extension host or against in-memory stand-ins.
//!
//! # Architecture
//!
//! A trigger (install, startup, scheduled refresh, mode change) goes through
//! the [`Controller`]. The [`CacheStore`] hands out the parsed filter list,
//! refetching it when stale; the [`RuleSynchronizer`] compiles rules for the
//! mode and replaces the active set on the surface, one replace at a time.
//! The [`StatsAggregator`] turns the surface's match counters into stats.
//!
//! # Modules
//!
//! - `ports`: Host capabilities the engine depends on
//! - `fetcher`: HTTP and file backed list fetchers
//! - `storage`: Key-value store implementations
//! - `repository`: Typed state and stats repositories
//! - `cache`: Filter list cache with TTL based refresh
//! - `surface`: In-memory request filtering surface
//! - `sync`: Single-flight rule synchronizer
//! - `stats`: Blocked request stats and the all-time checkpoint
//! - `controller`: Command surface and lifecycle hooks
//! - `job`: Scheduled list refresh

pub mod cache;
pub mod clock;
pub mod controller;
pub mod fetcher;
pub mod job;
pub mod ports;
pub mod repository;
pub mod stats;
pub mod storage;
pub mod surface;
pub mod sync;

// Re-export commonly used types
pub use cache::CacheStore;
pub use clock::{ManualClock, SystemClock};
pub use controller::{Command, Controller, HostPorts, Reply};
pub use fetcher::{FileListFetcher, HttpListFetcher};
pub use job::RefreshJob;
pub use ports::{Clock, EnforcementSurface, KeyValueStore, ListFetcher, TabNotifier};
pub use repository::{StateRepository, StatsRepository};
pub use stats::{format_bytes, StatsAggregator};
pub use storage::{JsonFileStore, MemoryStore};
pub use surface::{MemorySurface, NoopNotifier};
pub use sync::{RuleSynchronizer, SyncReport};
