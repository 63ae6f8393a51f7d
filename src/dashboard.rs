use std::time::Duration;

use tracing::debug;

use crate::display::{StreamStatus, ThermostatCard};
use crate::model::{TemperatureHistory, Thermostat};

/// Messages the background pollers and subscribers send to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Update(Thermostat),
    History {
        id: String,
        history: TemperatureHistory,
    },
    HistoryFailed {
        id: String,
        retry_in: Duration,
    },
    StreamConnected {
        id: String,
    },
    StreamLost {
        id: String,
        retry_in: Duration,
    },
}

impl DashboardEvent {
    pub fn thermostat_id(&self) -> &str {
        match self {
            Self::Update(thermostat) => &thermostat.id,
            Self::History { id, .. }
            | Self::HistoryFailed { id, .. }
            | Self::StreamConnected { id }
            | Self::StreamLost { id, .. } => id,
        }
    }
}

/// Cards in the order the server listed the thermostats.
#[derive(Debug, Default)]
pub struct Dashboard {
    cards: Vec<ThermostatCard>,
}

impl Dashboard {
    pub fn new(thermostats: &[Thermostat]) -> Self {
        Self {
            cards: thermostats.iter().map(ThermostatCard::from_thermostat).collect(),
        }
    }

    pub fn cards(&self) -> &[ThermostatCard] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&ThermostatCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Looks a card up by its 1-based position or by thermostat id.
    pub fn resolve(&self, target: &str) -> Option<&ThermostatCard> {
        let target = target.trim();
        match target.parse::<usize>() {
            Ok(position) if position >= 1 && position <= self.cards.len() => {
                self.cards.get(position - 1)
            }
            _ => self.card(target),
        }
    }

    /// Returns `true` when the event changed what is displayed.
    pub fn apply(&mut self, event: DashboardEvent) -> bool {
        let Some(card) = self
            .cards
            .iter_mut()
            .find(|card| card.id == event.thermostat_id())
        else {
            debug!(thermostat = event.thermostat_id(), "ignoring event for unknown thermostat");
            return false;
        };

        let before = card.clone();
        match event {
            DashboardEvent::Update(thermostat) => card.apply_update(&thermostat),
            DashboardEvent::History { history, .. } => card.attach_history(history),
            DashboardEvent::HistoryFailed { retry_in, .. } => card.history_unavailable(retry_in),
            DashboardEvent::StreamConnected { .. } => card.stream = StreamStatus::Live,
            DashboardEvent::StreamLost { retry_in, .. } => {
                card.stream = StreamStatus::Reconnecting { retry_in }
            }
        }
        *card != before
    }

    pub fn render(&self) -> String {
        if self.cards.is_empty() {
            return "No thermostats configured.".to_string();
        }
        self.cards
            .iter()
            .map(ThermostatCard::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
