use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use thermostat_dashboard::api::ApiClient;
use thermostat_dashboard::cli::{Action, CliArgs};
use thermostat_dashboard::dashboard::Dashboard;
use thermostat_dashboard::display::{ThermostatCard, format_temperature};
use thermostat_dashboard::error::RuntimeError;
use thermostat_dashboard::watch::run_dashboard;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let config = args.into_config()?;
    let api = ApiClient::new(config.base_url.clone(), config.request_timeout)?;
    info!(api = %config.base_url, "using thermostat API");

    match config.action {
        Action::Watch(watch) => match run_dashboard(api, watch).await {
            Err(err) if is_shutdown_error(&err) => {
                info!("shutdown requested, exiting");
                std::process::exit(0);
            }
            result => result,
        },
        Action::List => {
            let thermostats = api
                .list_thermostats()
                .await
                .context("failed to list thermostats")?;
            println!("{}", Dashboard::new(&thermostats).render());
            Ok(())
        }
        Action::Show { id } => {
            let thermostat = api
                .get_thermostat(&id)
                .await
                .with_context(|| format!("failed to get thermostat `{id}`"))?;
            println!("{}", ThermostatCard::from_thermostat(&thermostat).render());
            Ok(())
        }
        Action::Set { id, temperature } => {
            let thermostat = api
                .set_desired_temperature(&id, temperature)
                .await
                .with_context(|| format!("failed to set desired temperature on `{id}`"))?;
            println!("{}", ThermostatCard::from_thermostat(&thermostat).render());
            Ok(())
        }
        Action::History { id, window } => print_history(&api, &id, window).await,
        Action::Create { label, port } => {
            let thermostat = api
                .create_thermostat(&label, &port)
                .await
                .with_context(|| format!("failed to create thermostat `{label}` on `{port}`"))?;
            println!("{}", ThermostatCard::from_thermostat(&thermostat).render());
            Ok(())
        }
        Action::Delete { id } => {
            api.delete_thermostat(&id)
                .await
                .with_context(|| format!("failed to delete thermostat `{id}`"))?;
            println!("deleted thermostat {id}");
            Ok(())
        }
        Action::Ports => {
            let ports = api
                .available_ports()
                .await
                .context("failed to list available ports")?;
            if ports.is_empty() {
                println!("No ports available.");
            }
            for port in ports {
                println!("{}\t{}", port.port, port.label);
            }
            Ok(())
        }
    }
}

async fn print_history(api: &ApiClient, id: &str, window: std::time::Duration) -> Result<()> {
    let thermostat = api
        .get_thermostat(id)
        .await
        .with_context(|| format!("failed to get thermostat `{id}`"))?;
    let to = Utc::now();
    let from = to - chrono::Duration::from_std(window).context("history window too large")?;
    let history = api
        .temperature_history(id, from, to)
        .await
        .with_context(|| format!("failed to get temperature history for `{id}`"))?;

    for (at, temperature) in history.points() {
        println!(
            "{}\t{}",
            at.with_timezone(&chrono::Local).format("%Y-%m-%d %-I:%M %p"),
            format_temperature(temperature as f32)
        );
    }

    let mut card = ThermostatCard::from_thermostat(&thermostat);
    card.attach_history(history);
    println!("\n{}", card.render());
    Ok(())
}

fn is_shutdown_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RuntimeError>()
        .is_some_and(|runtime| matches!(runtime, RuntimeError::ShutdownRequested))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("info,thermostat_dashboard=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
