use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thermostat state as reported by the API and the update stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thermostat {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heater_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_update_disabled: Option<bool>,
}

impl Thermostat {
    pub fn is_heating(&self) -> bool {
        self.heater_on.unwrap_or(false)
    }

    pub fn is_locked(&self) -> bool {
        self.remote_update_disabled.unwrap_or(false)
    }
}

/// Averaged temperature samples over a time window, ready for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureHistory {
    #[serde(with = "epoch_millis")]
    pub timestamps: Vec<DateTime<Utc>>,
    pub temperatures: Vec<f64>,
}

impl TemperatureHistory {
    pub fn points(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.temperatures.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.points().next().is_none()
    }

    pub fn latest(&self) -> Option<(DateTime<Utc>, f64)> {
        self.points().last()
    }

    pub fn min(&self) -> Option<f64> {
        self.points().map(|(_, t)| t).reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.points().map(|(_, t)| t).reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThermostatRequest {
    pub desired_temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateThermostatRequest {
    pub label: String,
    pub port: String,
}

/// A serial port the server could attach a new thermostat to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailablePort {
    pub label: String,
    pub port: String,
}

mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(values: &[DateTime<Utc>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(values.iter().map(DateTime::timestamp_millis))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<i64>::deserialize(deserializer)?
            .into_iter()
            .map(|millis| {
                DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| D::Error::custom(format!("timestamp {millis} out of range")))
            })
            .collect()
    }
}
