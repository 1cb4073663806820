use std::path::Path;
use std::sync::Arc;

use ll_core::EngineConfig;
use ll_engine::{
    Controller, FileListFetcher, HostPorts, HttpListFetcher, JsonFileStore, ListFetcher,
    MemorySurface, NoopNotifier, SystemClock,
};

/// A host simulated on the local machine: state lives in a JSON file, the
/// list comes from the network or a local file, rules land in memory.
pub struct LocalHost {
    pub controller: Controller,
    pub surface: Arc<MemorySurface>,
}

pub fn list_fetcher(
    config: &EngineConfig,
    input: Option<&str>,
) -> Result<Arc<dyn ListFetcher>, String> {
    match input {
        Some(path) => Ok(Arc::new(FileListFetcher::new(path))),
        None => HttpListFetcher::new(config)
            .map(|fetcher| Arc::new(fetcher) as Arc<dyn ListFetcher>)
            .map_err(|e| e.to_string()),
    }
}

pub fn local_host(
    config: &EngineConfig,
    store: &Path,
    input: Option<&str>,
) -> Result<LocalHost, String> {
    let surface = Arc::new(MemorySurface::new());
    let ports = HostPorts {
        fetcher: list_fetcher(config, input)?,
        store: Arc::new(JsonFileStore::new(store)),
        surface: surface.clone(),
        notifier: Arc::new(NoopNotifier),
        clock: Arc::new(SystemClock),
    };

    Ok(LocalHost {
        controller: Controller::new(config, ports),
        surface,
    })
}
