use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::endpoint::{self, EndpointError};
use crate::error::ApiError;
use crate::model::{
    AvailablePort, CreateThermostatRequest, TemperatureHistory, Thermostat,
    UpdateThermostatRequest,
};

/// REST client for the thermostat API rooted at `base_url`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn updates_url(&self, id: &str) -> Result<Url, EndpointError> {
        endpoint::updates_url(&self.base_url, id)
    }

    pub async fn list_thermostats(&self) -> Result<Vec<Thermostat>, ApiError> {
        let url = endpoint::api_url(&self.base_url, &["api", "thermostats"])?;
        self.fetch_json(self.http.get(url.clone()), &url).await
    }

    pub async fn get_thermostat(&self, id: &str) -> Result<Thermostat, ApiError> {
        let url = endpoint::thermostat_url(&self.base_url, id, &[])?;
        self.fetch_json(self.http.get(url.clone()), &url).await
    }

    /// Registers a thermostat on `port`; the server redirects to the new resource.
    pub async fn create_thermostat(&self, label: &str, port: &str) -> Result<Thermostat, ApiError> {
        let url = endpoint::api_url(&self.base_url, &["api", "thermostats"])?;
        let body = CreateThermostatRequest {
            label: label.to_string(),
            port: port.to_string(),
        };
        self.fetch_json(self.http.post(url.clone()).json(&body), &url)
            .await
    }

    pub async fn set_desired_temperature(
        &self,
        id: &str,
        desired_temperature: f32,
    ) -> Result<Thermostat, ApiError> {
        let url = endpoint::thermostat_url(&self.base_url, id, &[])?;
        let body = UpdateThermostatRequest {
            desired_temperature,
        };
        debug!(thermostat = id, desired_temperature, "posting desired temperature");
        self.fetch_json(self.http.post(url.clone()).json(&body), &url)
            .await
    }

    pub async fn delete_thermostat(&self, id: &str) -> Result<(), ApiError> {
        let url = endpoint::thermostat_url(&self.base_url, id, &[])?;
        self.send(self.http.delete(url.clone()), &url).await?;
        Ok(())
    }

    pub async fn temperature_history(
        &self,
        id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<TemperatureHistory, ApiError> {
        let mut url = endpoint::thermostat_url(&self.base_url, id, &["temperature", "history"])?;
        url.query_pairs_mut()
            .append_pair("from", &iso_timestamp(from))
            .append_pair("to", &iso_timestamp(to));
        self.fetch_json(self.http.get(url.clone()), &url).await
    }

    pub async fn available_ports(&self) -> Result<Vec<AvailablePort>, ApiError> {
        let url = endpoint::api_url(&self.base_url, &["api", "available-ports"])?;
        self.fetch_json(self.http.get(url.clone()), &url).await
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let response = self.send(request, url).await?;
        response.json().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        debug!(url = %url, status = %response.status(), "API response");

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, url, message))
    }
}

fn classify_status(status: StatusCode, url: &Url, message: String) -> ApiError {
    let url = url.to_string();
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { url },
        StatusCode::FORBIDDEN => ApiError::RemoteUpdateDisabled { url },
        StatusCode::GATEWAY_TIMEOUT => ApiError::ThermostatTimeout { url },
        StatusCode::CONFLICT => ApiError::Conflict { message },
        StatusCode::BAD_REQUEST => ApiError::BadRequest { message },
        other => ApiError::Status {
            url,
            status: other.as_u16(),
            message,
        },
    }
}

/// `2021-10-16T01:20:27.747Z`, the format the history endpoint expects.
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
