use std::io::Write;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::cli::WatchConfig;
use crate::controls::{CONTROLS_HELP, ControlCommand, spawn_control_listener};
use crate::dashboard::{Dashboard, DashboardEvent};
use crate::display::selectable_temperature;
use crate::error::RuntimeError;
use crate::history::poll_history;
use crate::retry::SharedRetryDelay;
use crate::updates::subscribe_to_updates;

const EVENT_BUFFER: usize = 64;

/// Runs the live dashboard until Ctrl-C, which surfaces as
/// [`RuntimeError::ShutdownRequested`].
///
/// Each thermostat gets a history poller and an update subscriber. All
/// history pollers share one retry delay and all subscribers share another,
/// so a success on any thermostat resets the delay for the rest.
pub async fn run_dashboard(api: ApiClient, config: WatchConfig) -> Result<()> {
    let thermostats = api
        .list_thermostats()
        .await
        .context("failed to list thermostats")?;
    info!(count = thermostats.len(), "loaded thermostats");

    let mut dashboard = Dashboard::new(&thermostats);
    let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
    let mut tasks = JoinSet::new();
    let mut pending = PendingChanges::default();
    let history_retry = SharedRetryDelay::new(config.history_retry);
    let update_retry = SharedRetryDelay::new(config.update_retry);

    for thermostat in &thermostats {
        let updates_url = api
            .updates_url(&thermostat.id)
            .with_context(|| format!("cannot subscribe to thermostat `{}`", thermostat.id))?;

        tasks.spawn(poll_history(
            api.clone(),
            thermostat.id.clone(),
            config.history,
            history_retry.clone(),
            events_tx.clone(),
        ));
        tasks.spawn(subscribe_to_updates(
            updates_url,
            thermostat.id.clone(),
            update_retry.clone(),
            events_tx.clone(),
        ));
    }

    let mut control_rx = spawn_control_listener();
    let mut controls_open = true;
    draw(&dashboard)?;
    info!("{CONTROLS_HELP}");

    let outcome: Result<()> = loop {
        pending.reap();
        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else { break Ok(()) };
                if dashboard.apply(event) {
                    draw(&dashboard)?;
                }
            }
            command = control_rx.recv(), if controls_open => {
                match command {
                    Some(ControlCommand::Set { target, temperature }) => {
                        request_change(&api, &dashboard, &mut pending, &events_tx, &target, temperature);
                    }
                    Some(ControlCommand::Redraw) => draw(&dashboard)?,
                    Some(ControlCommand::Help) => info!("{CONTROLS_HELP}"),
                    None => controls_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break Err(RuntimeError::ShutdownRequested.into());
            }
        }
    };

    drop(events_rx);
    pending.tasks.shutdown().await;
    tasks.shutdown().await;
    outcome
}

/// In-flight desired temperature changes.
#[derive(Default)]
struct PendingChanges {
    tasks: JoinSet<()>,
}

impl PendingChanges {
    fn spawn<F>(&mut self, change: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(change);
    }

    /// Drops finished changes so the set only holds requests still in flight.
    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(err) = joined {
                if err.is_panic() {
                    warn!(error = %err, "desired temperature change panicked");
                }
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tasks.len()
    }
}

fn request_change(
    api: &ApiClient,
    dashboard: &Dashboard,
    pending: &mut PendingChanges,
    events: &mpsc::Sender<DashboardEvent>,
    target: &str,
    temperature: f32,
) {
    let Some(card) = dashboard.resolve(target) else {
        warn!(target, "no thermostat matches");
        return;
    };
    if card.select_disabled {
        warn!(thermostat = %card.id, "remote updates are disabled on this thermostat");
        return;
    }
    let Some(temperature) = selectable_temperature(temperature) else {
        warn!(temperature, "desired temperature must be 4.0 to 33.0 in 0.5 steps");
        return;
    };

    let api = api.clone();
    let id = card.id.clone();
    let events = events.clone();
    pending.spawn(async move {
        match api.set_desired_temperature(&id, temperature).await {
            Ok(thermostat) => {
                info!(thermostat = %id, temperature, "desired temperature changed");
                let _ = events.send(DashboardEvent::Update(thermostat)).await;
            }
            Err(err) => {
                warn!(thermostat = %id, error = %err, "failed to change desired temperature");
            }
        }
    });
}

fn draw(dashboard: &Dashboard) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "\x1b[2J\x1b[H{}", dashboard.render()).context("failed to draw dashboard")?;
    stdout.flush().context("failed to draw dashboard")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::PendingChanges;

    #[tokio::test]
    async fn reaps_finished_changes() {
        let mut pending = PendingChanges::default();
        for _ in 0..3 {
            pending.spawn(async {});
        }
        pending.spawn(tokio::time::sleep(Duration::from_secs(60)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        pending.reap();

        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn reaping_an_empty_set_is_a_no_op() {
        let mut pending = PendingChanges::default();
        pending.reap();
        assert_eq!(pending.len(), 0);
    }
}
