use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::dashboard::DashboardEvent;
use crate::model::Thermostat;
use crate::retry::SharedRetryDelay;

/// Why a stream session stopped.
enum SessionEnd {
    Disconnected(anyhow::Error),
    DashboardClosed,
}

/// Listens for live updates of one thermostat until `events` is closed.
///
/// Every parsed update resets `retry`, which the subscribers of all
/// thermostats share. When the connection fails or closes, the subscriber
/// waits `retry.next_delay()` and reconnects.
pub async fn subscribe_to_updates(
    url: Url,
    id: String,
    retry: SharedRetryDelay,
    events: mpsc::Sender<DashboardEvent>,
) {
    loop {
        let reason = match run_session(&url, &id, &retry, &events).await {
            SessionEnd::DashboardClosed => {
                info!(thermostat = %id, "dashboard closed, stopping update stream");
                return;
            }
            SessionEnd::Disconnected(reason) => reason,
        };

        let retry_in = retry.next_delay();
        warn!(
            thermostat = %id,
            retry_in_ms = retry_in.as_millis(),
            reason = %format!("{reason:#}"),
            "update stream lost; reconnecting"
        );

        let lost = DashboardEvent::StreamLost {
            id: id.clone(),
            retry_in,
        };
        if events.send(lost).await.is_err() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(retry_in) => {}
            _ = events.closed() => return,
        }
    }
}

async fn run_session(
    url: &Url,
    id: &str,
    retry: &SharedRetryDelay,
    events: &mpsc::Sender<DashboardEvent>,
) -> SessionEnd {
    let (mut socket, _) = match connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect to {url}"))
    {
        Ok(connected) => connected,
        Err(err) => return SessionEnd::Disconnected(err),
    };

    info!(thermostat = %id, url = %url, "update stream connected");
    let connected = DashboardEvent::StreamConnected { id: id.to_string() };
    if events.send(connected).await.is_err() {
        return SessionEnd::DashboardClosed;
    }

    let result: Result<()> = async {
        loop {
            let message = tokio::select! {
                message = socket.next() => message,
                _ = events.closed() => return Ok(()),
            };
            let Some(message) = message else {
                anyhow::bail!("server ended the stream");
            };

            match message.context("update stream error")? {
                Message::Text(text) => {
                    let Some(thermostat) = parse_update(id, &text) else {
                        continue;
                    };
                    if events.send(DashboardEvent::Update(thermostat)).await.is_err() {
                        return Ok(());
                    }
                    retry.reset();
                }
                Message::Close(frame) => {
                    anyhow::bail!("server closed the stream: {frame:?}");
                }
                _ => {}
            }
        }
    }
    .await;

    match result {
        Ok(()) => SessionEnd::DashboardClosed,
        Err(err) => SessionEnd::Disconnected(err),
    }
}

fn parse_update(id: &str, text: &str) -> Option<Thermostat> {
    match serde_json::from_str::<Thermostat>(text) {
        Ok(thermostat) => {
            debug!(thermostat = %thermostat.id, "update received");
            Some(thermostat)
        }
        Err(err) => {
            warn!(thermostat = %id, error = %err, "skipping malformed update");
            None
        }
    }
}
