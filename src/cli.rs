use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::display::selectable_temperature;
use crate::endpoint::parse_base_url;
use crate::error::ConfigError;
use crate::history::HistorySettings;
use crate::retry::RetryDelay;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "thermostat-dashboard",
    version,
    about = "Monitor and control thermostats from the terminal"
)]
pub struct CliArgs {
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    pub url: String,

    #[arg(long, global = true, default_value_t = 10000)]
    pub request_timeout_ms: u64,

    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Live dashboard of every configured thermostat (default)
    Watch(WatchArgs),
    /// Print the configured thermostats once
    List,
    /// Print one thermostat
    Show { id: String },
    /// Change a thermostat's desired temperature
    Set { id: String, temperature: f32 },
    /// Print a thermostat's temperature history
    History {
        id: String,
        #[arg(long, default_value_t = 360)]
        window_mins: u64,
    },
    /// Attach a thermostat on a serial port
    Create {
        #[arg(long)]
        label: String,
        #[arg(long)]
        port: String,
    },
    /// Disconnect a thermostat and discard its configuration
    Delete { id: String },
    /// List serial ports available for new thermostats
    Ports,
}

#[derive(Debug, Args, Clone)]
pub struct WatchArgs {
    #[arg(long, default_value_t = 60000)]
    pub poll_interval_ms: u64,

    #[arg(long, default_value_t = 360)]
    pub history_window_mins: u64,

    #[arg(long, default_value_t = 100)]
    pub history_retry_initial_ms: u64,

    #[arg(long, default_value_t = 60000)]
    pub history_retry_max_ms: u64,

    #[arg(long, default_value_t = 2.0)]
    pub history_retry_factor: f64,

    #[arg(long, default_value_t = 100)]
    pub update_retry_initial_ms: u64,

    #[arg(long, default_value_t = 60000)]
    pub update_retry_max_ms: u64,

    #[arg(long, default_value_t = 1.5)]
    pub update_retry_factor: f64,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            poll_interval_ms: 60000,
            history_window_mins: 360,
            history_retry_initial_ms: 100,
            history_retry_max_ms: 60000,
            history_retry_factor: 2.0,
            update_retry_initial_ms: 100,
            update_retry_max_ms: 60000,
            update_retry_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub verbose: bool,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub enum Action {
    Watch(WatchConfig),
    List,
    Show { id: String },
    Set { id: String, temperature: f32 },
    History { id: String, window: Duration },
    Create { label: String, port: String },
    Delete { id: String },
    Ports,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub history: HistorySettings,
    pub history_retry: RetryDelay,
    pub update_retry: RetryDelay,
}

impl CliArgs {
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        validate_range("request-timeout-ms", self.request_timeout_ms, 100, 600_000)?;
        let base_url = parse_base_url(&self.url)?;

        let action = match self.command.unwrap_or(Command::Watch(WatchArgs::default())) {
            Command::Watch(args) => Action::Watch(args.into_config()?),
            Command::List => Action::List,
            Command::Show { id } => Action::Show {
                id: non_empty("id", id)?,
            },
            Command::Set { id, temperature } => {
                let temperature = selectable_temperature(temperature)
                    .ok_or(ConfigError::UnselectableTemperature(temperature))?;
                Action::Set {
                    id: non_empty("id", id)?,
                    temperature,
                }
            }
            Command::History { id, window_mins } => {
                validate_range("window-mins", window_mins, 1, 10_080)?;
                Action::History {
                    id: non_empty("id", id)?,
                    window: Duration::from_secs(window_mins * 60),
                }
            }
            Command::Create { label, port } => Action::Create {
                label: non_empty("label", label)?,
                port: non_empty("port", port)?,
            },
            Command::Delete { id } => Action::Delete {
                id: non_empty("id", id)?,
            },
            Command::Ports => Action::Ports,
        };

        Ok(AppConfig {
            base_url,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            verbose: self.verbose,
            action,
        })
    }
}

impl WatchArgs {
    pub fn into_config(self) -> Result<WatchConfig, ConfigError> {
        validate_range("poll-interval-ms", self.poll_interval_ms, 1000, u64::MAX)?;
        validate_range("history-window-mins", self.history_window_mins, 1, 10_080)?;

        let history_retry = RetryDelay::from_millis(
            self.history_retry_initial_ms,
            self.history_retry_max_ms,
            self.history_retry_factor,
        )
        .map_err(|source| ConfigError::Retry {
            site: "history",
            source,
        })?;
        let update_retry = RetryDelay::from_millis(
            self.update_retry_initial_ms,
            self.update_retry_max_ms,
            self.update_retry_factor,
        )
        .map_err(|source| ConfigError::Retry {
            site: "update stream",
            source,
        })?;

        Ok(WatchConfig {
            history: HistorySettings {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                window: Duration::from_secs(self.history_window_mins * 60),
            },
            history_retry,
            update_retry,
        })
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(field));
    }
    Ok(trimmed.to_string())
}

fn validate_range(field: &'static str, actual: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if actual < min || actual > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}
