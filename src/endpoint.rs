use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq)]
pub enum EndpointError {
    #[error("invalid API base URL `{0}`")]
    InvalidBaseUrl(String),
    #[error("API base URL scheme must be `http` or `https`, got `{0}`")]
    UnsupportedScheme(String),
    #[error("thermostat id cannot be empty")]
    EmptyThermostatId,
    #[error("thermostat id `{0}` contains characters that are not allowed in a path segment")]
    InvalidThermostatId(String),
}

pub fn parse_base_url(raw: &str) -> Result<Url, EndpointError> {
    let trimmed = raw.trim();
    let mut parsed =
        Url::parse(trimmed).map_err(|_| EndpointError::InvalidBaseUrl(trimmed.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    }
    if parsed.cannot_be_a_base() {
        return Err(EndpointError::InvalidBaseUrl(trimmed.to_string()));
    }

    parsed.set_query(None);
    parsed.set_fragment(None);
    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    Ok(parsed)
}

/// Appends `segments` below the base URL's path.
pub fn api_url(base: &Url, segments: &[&str]) -> Result<Url, EndpointError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| EndpointError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub fn thermostat_url(base: &Url, id: &str, rest: &[&str]) -> Result<Url, EndpointError> {
    let id = normalize_thermostat_id(id)?;
    let mut segments = vec!["api", "thermostats", id];
    segments.extend_from_slice(rest);
    api_url(base, &segments)
}

/// WebSocket URL that streams live updates for one thermostat.
pub fn updates_url(base: &Url, id: &str) -> Result<Url, EndpointError> {
    let mut url = thermostat_url(base, id, &["updates"])?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| EndpointError::UnsupportedScheme(scheme.to_string()))?;
    Ok(url)
}

fn normalize_thermostat_id(raw: &str) -> Result<&str, EndpointError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(EndpointError::EmptyThermostatId);
    }
    if id.contains(['/', '?', '#']) || id == "." || id == ".." {
        return Err(EndpointError::InvalidThermostatId(id.to_string()));
    }
    Ok(id)
}
