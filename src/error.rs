use thiserror::Error;

use crate::endpoint::EndpointError;
use crate::retry::RetryConfigError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("`{field}` out of range: got {actual}, expected {min}..={max}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        actual: u64,
    },
    #[error("invalid {site} retry settings: {source}")]
    Retry {
        site: &'static str,
        #[source]
        source: RetryConfigError,
    },
    #[error("desired temperature {0} is not one of the selectable values (4.0 to 33.0 in 0.5 steps)")]
    UnselectableTemperature(f32),
    #[error("`{0}` cannot be empty")]
    Empty(&'static str),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` not found")]
    NotFound { url: String },
    #[error("remote updates are disabled on the thermostat at `{url}`")]
    RemoteUpdateDisabled { url: String },
    #[error("thermostat at `{url}` did not confirm the update in time")]
    ThermostatTimeout { url: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("`{url}` returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("shutdown requested")]
    ShutdownRequested,
}
