use std::time::Duration;

use assert_matches::assert_matches;
use clap::Parser;

use thermostat_dashboard::cli::{Action, CliArgs};
use thermostat_dashboard::endpoint::EndpointError;
use thermostat_dashboard::error::ConfigError;
use thermostat_dashboard::retry::RetryConfigError;

#[test]
fn defaults_to_watch_with_standard_retry_settings() {
    let args = CliArgs::try_parse_from(["thermostat-dashboard"]).expect("cli parse should succeed");

    let config = args.into_config().expect("config should validate");

    assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert!(!config.verbose);

    let Action::Watch(mut watch) = config.action else {
        panic!("expected watch action");
    };
    assert_eq!(watch.history.poll_interval, Duration::from_secs(60));
    assert_eq!(watch.history.window, Duration::from_secs(6 * 60 * 60));

    assert_eq!(watch.history_retry.initial(), Duration::from_millis(100));
    assert_eq!(watch.history_retry.max(), Duration::from_millis(60_000));
    assert_eq!(watch.history_retry.factor(), 2.0);
    assert_eq!(watch.update_retry.factor(), 1.5);

    watch.update_retry.next_delay();
    assert_eq!(watch.update_retry.next_delay(), Duration::from_millis(150));
}

#[test]
fn parses_watch_overrides() {
    let args = CliArgs::try_parse_from([
        "thermostat-dashboard",
        "--url",
        "https://home.example.com/thermo",
        "watch",
        "--poll-interval-ms",
        "5000",
        "--update-retry-factor",
        "3",
    ])
    .expect("cli parse should succeed");

    let config = args.into_config().expect("config should validate");
    assert_eq!(config.base_url.as_str(), "https://home.example.com/thermo/");
    assert_matches!(
        config.action,
        Action::Watch(watch)
            if watch.history.poll_interval == Duration::from_secs(5)
                && watch.update_retry.factor() == 3.0
    );
}

#[test]
fn rejects_inverted_retry_bounds() {
    let args = CliArgs::try_parse_from([
        "thermostat-dashboard",
        "watch",
        "--history-retry-initial-ms",
        "5000",
        "--history-retry-max-ms",
        "1000",
    ])
    .expect("cli parse should succeed");

    let err = args.into_config().expect_err("validation should fail");
    assert_matches!(
        err,
        ConfigError::Retry {
            site: "history",
            source: RetryConfigError::InitialExceedsMax { .. }
        }
    );
}

#[test]
fn rejects_zero_update_retry_delay() {
    let args = CliArgs::try_parse_from([
        "thermostat-dashboard",
        "watch",
        "--update-retry-initial-ms",
        "0",
    ])
    .expect("cli parse should succeed");

    let err = args.into_config().expect_err("validation should fail");
    assert_matches!(
        err,
        ConfigError::Retry {
            site: "update stream",
            source: RetryConfigError::ZeroInitialDelay
        }
    );
}

#[test]
fn rejects_non_http_base_url() {
    let args = CliArgs::try_parse_from(["thermostat-dashboard", "--url", "file:///tmp/api", "list"])
        .expect("cli parse should succeed");

    let err = args.into_config().expect_err("validation should fail");
    assert_matches!(err, ConfigError::Endpoint(EndpointError::UnsupportedScheme(s)) if s == "file");
}

#[test]
fn rejects_out_of_range_poll_interval() {
    let args = CliArgs::try_parse_from([
        "thermostat-dashboard",
        "watch",
        "--poll-interval-ms",
        "500",
    ])
    .expect("cli parse should succeed");

    let err = args.into_config().expect_err("validation should fail");
    assert_matches!(
        err,
        ConfigError::OutOfRange {
            field,
            min: 1000,
            max,
            actual: 500
        } if field == "poll-interval-ms" && max == u64::MAX
    );
}

#[test]
fn set_accepts_selectable_temperature() {
    let args = CliArgs::try_parse_from(["thermostat-dashboard", "set", "abc123", "22.5"])
        .expect("cli parse should succeed");

    let config = args.into_config().expect("config should validate");
    assert_matches!(
        config.action,
        Action::Set { id, temperature } if id == "abc123" && temperature == 22.5
    );
}

#[test]
fn set_posts_the_matching_option_value() {
    let args = CliArgs::try_parse_from(["thermostat-dashboard", "set", "abc123", "21.96"])
        .expect("cli parse should succeed");

    let config = args.into_config().expect("config should validate");
    assert_matches!(
        config.action,
        Action::Set { temperature, .. } if temperature == 22.0
    );
}

#[test]
fn set_rejects_temperature_outside_dropdown() {
    for raw in ["3.5", "33.5", "21.3"] {
        let args = CliArgs::try_parse_from(["thermostat-dashboard", "set", "abc123", raw])
            .expect("cli parse should succeed");

        let err = args.into_config().expect_err("validation should fail");
        assert_matches!(err, ConfigError::UnselectableTemperature(_));
    }
}

#[test]
fn history_window_is_converted_to_duration() {
    let args = CliArgs::try_parse_from([
        "thermostat-dashboard",
        "history",
        "abc123",
        "--window-mins",
        "90",
    ])
    .expect("cli parse should succeed");

    let config = args.into_config().expect("config should validate");
    assert_matches!(
        config.action,
        Action::History { id, window } if id == "abc123" && window == Duration::from_secs(5400)
    );
}

#[test]
fn create_requires_non_blank_label() {
    let args = CliArgs::try_parse_from([
        "thermostat-dashboard",
        "create",
        "--label",
        "  ",
        "--port",
        "ttyACM0",
    ])
    .expect("cli parse should succeed");

    let err = args.into_config().expect_err("validation should fail");
    assert_matches!(err, ConfigError::Empty("label"));
}
