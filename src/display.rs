use std::fmt;
use std::time::Duration;

use chrono::Local;

use crate::model::{TemperatureHistory, Thermostat};

pub const MIN_SELECTABLE_TEMPERATURE: f32 = 4.0;
pub const MAX_SELECTABLE_TEMPERATURE: f32 = 33.0;
pub const TEMPERATURE_STEP: f32 = 0.5;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Truncates to the tenth of a degree, e.g. `25.34375` -> `25.3° C`.
pub fn format_temperature(temperature: f32) -> String {
    let truncated = (f64::from(temperature) * 10.0).floor() / 10.0;
    format!("{truncated:.1}° C")
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureOption {
    pub value: f32,
    pub label: String,
    pub selected: bool,
}

/// Desired temperature choices from 4.0 through 33.0 in half degree steps.
pub fn temperature_options(selected: Option<f32>) -> Vec<TemperatureOption> {
    let selected = selected.map(|temp| format!("{temp:.1}"));
    selectable_temperatures()
        .map(|value| {
            let key = format!("{value:.1}");
            TemperatureOption {
                value,
                label: format!("{key}°"),
                selected: selected.as_deref() == Some(key.as_str()),
            }
        })
        .collect()
}

/// The dropdown value `temperature` selects, e.g. `21.96` -> `22.0`.
pub fn selectable_temperature(temperature: f32) -> Option<f32> {
    let key = format!("{temperature:.1}");
    selectable_temperatures().find(|value| format!("{value:.1}") == key)
}

pub fn is_selectable_temperature(temperature: f32) -> bool {
    selectable_temperature(temperature).is_some()
}

fn selectable_temperatures() -> impl Iterator<Item = f32> {
    let steps = ((MAX_SELECTABLE_TEMPERATURE - MIN_SELECTABLE_TEMPERATURE) / TEMPERATURE_STEP) as u16;
    (0..=steps).map(|step| MIN_SELECTABLE_TEMPERATURE + f32::from(step) * TEMPERATURE_STEP)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterBadge {
    Heat,
    Off,
}

impl HeaterBadge {
    pub fn for_heater(heater_on: bool) -> Self {
        if heater_on { Self::Heat } else { Self::Off }
    }
}

impl fmt::Display for HeaterBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heat => f.write_str("HEAT"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockIcon {
    Locked,
    Unlocked,
}

impl LockIcon {
    pub fn for_remote_update_disabled(disabled: bool) -> Self {
        if disabled { Self::Locked } else { Self::Unlocked }
    }
}

impl fmt::Display for LockIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => f.write_str("locked"),
            Self::Unlocked => f.write_str("unlocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryPanel {
    Loading,
    Ready(TemperatureHistory),
    Unavailable { retry_in: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamStatus {
    Connecting,
    Live,
    Reconnecting { retry_in: Duration },
}

/// Everything shown for one thermostat.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatCard {
    pub id: String,
    pub label: String,
    pub badge: HeaterBadge,
    pub ambient: String,
    pub desired_temperature: Option<f32>,
    pub options: Vec<TemperatureOption>,
    pub lock: LockIcon,
    pub select_disabled: bool,
    pub history: HistoryPanel,
    pub stream: StreamStatus,
}

impl ThermostatCard {
    pub fn from_thermostat(thermostat: &Thermostat) -> Self {
        let mut card = Self {
            id: thermostat.id.clone(),
            label: thermostat.label.clone(),
            badge: HeaterBadge::Off,
            ambient: String::new(),
            desired_temperature: None,
            options: Vec::new(),
            lock: LockIcon::Unlocked,
            select_disabled: false,
            history: HistoryPanel::Loading,
            stream: StreamStatus::Connecting,
        };
        card.apply_update(thermostat);
        card
    }

    pub fn apply_update(&mut self, thermostat: &Thermostat) {
        if !thermostat.label.is_empty() {
            self.label = thermostat.label.clone();
        }
        self.badge = HeaterBadge::for_heater(thermostat.is_heating());
        self.ambient = thermostat
            .ambient_temperature
            .map(format_temperature)
            .unwrap_or_else(|| "--.-° C".to_string());
        self.desired_temperature = thermostat.desired_temperature;
        self.options = temperature_options(thermostat.desired_temperature);
        self.lock = LockIcon::for_remote_update_disabled(thermostat.is_locked());
        self.select_disabled = thermostat.is_locked();
    }

    pub fn attach_history(&mut self, history: TemperatureHistory) {
        self.history = HistoryPanel::Ready(history);
    }

    pub fn history_unavailable(&mut self, retry_in: Duration) {
        self.history = HistoryPanel::Unavailable { retry_in };
    }

    pub fn selected_option(&self) -> Option<&TemperatureOption> {
        self.options.iter().find(|option| option.selected)
    }

    pub fn render(&self) -> String {
        let desired = self
            .selected_option()
            .map(|option| option.label.clone())
            .unwrap_or_else(|| "--".to_string());
        let mut lines = vec![
            format!("[{}] {}  ({})", self.badge, self.label, self.id),
            format!("    {}", self.ambient),
            format!(
                "    Desired Temperature: {desired} [{}{}]",
                self.lock,
                if self.select_disabled { ", read-only" } else { "" }
            ),
        ];

        lines.push(match &self.history {
            HistoryPanel::Loading => "    History: loading".to_string(),
            HistoryPanel::Unavailable { retry_in } => {
                format!("    History: unavailable, retrying in {}", format_wait(*retry_in))
            }
            HistoryPanel::Ready(history) => render_history(history),
        });

        lines.push(match self.stream {
            StreamStatus::Connecting => "    Updates: connecting".to_string(),
            StreamStatus::Live => "    Updates: live".to_string(),
            StreamStatus::Reconnecting { retry_in } => {
                format!("    Updates: disconnected, reconnecting in {}", format_wait(retry_in))
            }
        });

        lines.join("\n")
    }
}

fn render_history(history: &TemperatureHistory) -> String {
    let (Some(min), Some(max), Some((at, latest))) = (history.min(), history.max(), history.latest())
    else {
        return "    History: no samples".to_string();
    };

    format!(
        "    History: {} {} .. {}, latest {} at {}",
        sparkline(history),
        format_temperature(min as f32),
        format_temperature(max as f32),
        format_temperature(latest as f32),
        at.with_timezone(&Local).format("%-I:%M %p"),
    )
}

/// One block character per sample, scaled between the window's min and max.
pub fn sparkline(history: &TemperatureHistory) -> String {
    let (Some(min), Some(max)) = (history.min(), history.max()) else {
        return String::new();
    };
    let span = max - min;
    let top = (SPARK_LEVELS.len() - 1) as f64;

    history
        .points()
        .map(|(_, temperature)| {
            let level = if span > 0.0 {
                ((temperature - min) / span * top).round() as usize
            } else {
                0
            };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn format_wait(wait: Duration) -> String {
    if wait < Duration::from_secs(1) {
        format!("{}ms", wait.as_millis())
    } else {
        format!("{:.1}s", wait.as_secs_f64())
    }
}
