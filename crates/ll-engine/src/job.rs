use std::sync::Arc;
use std::time::Duration;

use ll_core::EngineConfig;
use tokio_util::sync::CancellationToken;

use crate::controller::Controller;

/// Background job that periodically force-refreshes the filter list and
/// re-applies the stored mode.
///
/// The first interval tick is consumed immediately, so nothing runs at
/// start; install and startup hooks already cover that. A failed run is
/// logged and the job waits for the next tick. A zero interval is logged
/// and the job exits without running.
pub struct RefreshJob {
    controller: Arc<Controller>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl RefreshJob {
    pub fn new(controller: Arc<Controller>, config: &EngineConfig) -> Self {
        Self {
            controller,
            interval: Duration::from_secs(config.refresh_interval_secs),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        log::info!("starting filter list refresh job every {:?}", self.interval);

        tokio::spawn(async move {
            if self.interval.is_zero() {
                log::error!("filter list refresh job not started: interval must be non-zero");
                return;
            }

            let mut interval = tokio::time::interval(self.interval);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        log::info!("filter list refresh job stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        match self.controller.on_refresh_alarm().await {
                            Ok(report) => log::info!(
                                "scheduled refresh applied {} rules for mode {}",
                                report.added,
                                report.mode
                            ),
                            Err(e) => log::error!("scheduled refresh failed: {}", e),
                        }
                    }
                }
            }
        })
    }
}
