use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::dashboard::DashboardEvent;
use crate::retry::SharedRetryDelay;

#[derive(Debug, Clone, Copy)]
pub struct HistorySettings {
    pub poll_interval: Duration,
    pub window: Duration,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            window: Duration::from_secs(6 * 60 * 60),
        }
    }
}

/// Polls temperature history for one thermostat until `events` is closed.
///
/// A successful fetch resets `retry` and waits the regular poll interval.
/// A failed fetch waits `retry.next_delay()` before trying again. `retry` is
/// shared by the pollers of every thermostat.
pub async fn poll_history(
    api: ApiClient,
    id: String,
    settings: HistorySettings,
    retry: SharedRetryDelay,
    events: mpsc::Sender<DashboardEvent>,
) {
    let window = chrono::Duration::from_std(settings.window).unwrap_or(chrono::Duration::hours(6));

    loop {
        let to = Utc::now();
        let from = to - window;

        let (event, wait) = match api.temperature_history(&id, from, to).await {
            Ok(history) => {
                debug!(thermostat = %id, samples = history.temperatures.len(), "history refreshed");
                retry.reset();
                (
                    DashboardEvent::History {
                        id: id.clone(),
                        history,
                    },
                    settings.poll_interval,
                )
            }
            Err(err) => {
                let retry_in = retry.next_delay();
                warn!(
                    thermostat = %id,
                    retry_in_ms = retry_in.as_millis(),
                    error = %err,
                    "history request failed; retrying"
                );
                (
                    DashboardEvent::HistoryFailed {
                        id: id.clone(),
                        retry_in,
                    },
                    retry_in,
                )
            }
        };

        if events.send(event).await.is_err() {
            info!(thermostat = %id, "dashboard closed, stopping history polling");
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = events.closed() => {
                info!(thermostat = %id, "dashboard closed, stopping history polling");
                return;
            }
        }
    }
}
