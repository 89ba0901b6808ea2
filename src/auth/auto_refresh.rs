/// Background token checks
///
/// Keeps the session warm for as long as the process runs: one check right
/// away, then one every `period`. Every tick runs on its own task, so a slow
/// refresh never delays the ticks after it.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::auth::session::SessionManager;

/// Default period between two checks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Shorter periods are raised to this
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Handle on the running checks. Dropping it stops them.
pub struct BackgroundChecks {
    handle: JoinHandle<()>,
}

impl BackgroundChecks {
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for BackgroundChecks {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl SessionManager {
    /// Check the token now, then every `period`.
    pub fn start_background_checks(self: &Arc<Self>, period: Duration) -> BackgroundChecks {
        let period = if period < MIN_CHECK_INTERVAL {
            tracing::warn!(
                requested_ms = period.as_millis() as u64,
                "Background check period too short, using the minimum"
            );
            MIN_CHECK_INTERVAL
        } else {
            period
        };
        let session = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // The first tick completes immediately.
                ticker.tick().await;

                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    let valid = session.ensure_valid_token().await;
                    tracing::debug!(valid = valid, "Background token check");
                });
            }
        });

        tracing::info!(period_secs = period.as_secs(), "Background token checks started");
        BackgroundChecks { handle }
    }
}
