//! Background TTL sweep.
//!
//! Expired messages are also discarded lazily whenever the buffer front is
//! read, so the reaper only bounds how long dead entries occupy capacity.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::handoff::Shared;

/// Periodic sweeper removing expired buffer entries.
pub(crate) struct TtlReaper {
    shared: Weak<Shared>,
    interval: Duration,
    token: CancellationToken,
}

impl TtlReaper {
    pub(crate) fn new(shared: &Arc<Shared>, interval: Duration) -> Self {
        Self {
            shared: Arc::downgrade(shared),
            interval,
            token: shared.reaper.clone(),
        }
    }

    /// Spawn on the current tokio runtime. Returns `None` outside a runtime,
    /// in which case expiry stays lazy.
    pub(crate) fn spawn(self) -> Option<JoinHandle<()>> {
        match Handle::try_current() {
            Ok(handle) => Some(handle.spawn(self.run())),
            Err(_) => {
                warn!("no tokio runtime available; TTL reaper not started, expiry stays lazy");
                None
            }
        }
    }

    async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!("Starting TTL reaper with interval: {:?}", self.interval);

        loop {
            tokio::select! {
                () = self.token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(shared) = self.shared.upgrade() else {
                        break;
                    };
                    let reaped = shared.reap_expired();
                    if reaped > 0 {
                        info!("Reaped {} expired messages", reaped);
                    } else {
                        debug!("No expired messages found");
                    }
                }
            }
        }

        debug!("TTL reaper stopped");
    }
}
