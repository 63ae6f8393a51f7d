use std::time::Duration;

use assert_matches::assert_matches;

use thermostat_dashboard::retry::{RetryConfigError, RetryDelay, SharedRetryDelay};

fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}

#[test]
fn doubles_until_clamped_at_max() {
    let mut delay = RetryDelay::from_millis(100, 60_000, 2.0).expect("valid settings");

    let observed: Vec<Duration> = (0..13).map(|_| delay.next_delay()).collect();

    assert_eq!(
        observed,
        ms(&[
            100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200, 60000, 60000, 60000
        ])
    );
}

#[test]
fn scales_by_fractional_factor() {
    let mut delay = RetryDelay::from_millis(100, 60_000, 1.5).expect("valid settings");

    assert_eq!(delay.next_delay(), Duration::from_millis(100));
    assert_eq!(delay.next_delay(), Duration::from_millis(150));
    assert_eq!(delay.next_delay(), Duration::from_millis(225));
    assert_eq!(delay.next_delay(), Duration::from_micros(337_500));
    assert_eq!(delay.next_delay(), Duration::from_micros(506_250));
}

#[test]
fn sequence_is_non_decreasing_and_saturates() {
    for factor in [1.1, 1.5, 2.0, 3.7, 10.0] {
        let mut delay = RetryDelay::from_millis(250, 30_000, factor).expect("valid settings");
        let max = Duration::from_millis(30_000);

        let mut previous = delay.next_delay();
        assert_eq!(previous, Duration::from_millis(250));

        for _ in 0..200 {
            let next = delay.next_delay();
            assert!(next >= previous, "factor {factor}: {next:?} < {previous:?}");
            assert!(next <= max, "factor {factor}: {next:?} exceeds max");
            previous = next;
        }

        assert_eq!(previous, max, "factor {factor} never reached max");
        assert_eq!(delay.next_delay(), max);
    }
}

#[test]
fn reset_restarts_from_initial_delay() {
    let mut delay = RetryDelay::from_millis(100, 60_000, 2.0).expect("valid settings");
    for _ in 0..20 {
        delay.next_delay();
    }
    assert_eq!(delay.current(), Duration::from_millis(60_000));

    delay.reset();

    assert_eq!(delay.next_delay(), Duration::from_millis(100));
    assert_eq!(delay.next_delay(), Duration::from_millis(200));
}

#[test]
fn reset_before_any_query_is_harmless() {
    let mut delay = RetryDelay::from_millis(100, 60_000, 1.5).expect("valid settings");
    delay.reset();
    assert_eq!(delay.next_delay(), Duration::from_millis(100));
}

#[test]
fn factor_of_one_or_less_is_constant() {
    for factor in [1.0, 0.5, 0.0, -2.0] {
        let mut delay = RetryDelay::from_millis(100, 60_000, factor).expect("valid settings");
        for _ in 0..50 {
            assert_eq!(delay.next_delay(), Duration::from_millis(100));
        }
    }
}

#[test]
fn initial_equal_to_max_is_constant() {
    let mut delay = RetryDelay::from_millis(5_000, 5_000, 2.0).expect("valid settings");
    assert_eq!(delay.next_delay(), Duration::from_millis(5_000));
    assert_eq!(delay.next_delay(), Duration::from_millis(5_000));
}

#[test]
fn rejects_zero_initial_delay() {
    let err = RetryDelay::from_millis(0, 60_000, 2.0).expect_err("should fail");
    assert_matches!(err, RetryConfigError::ZeroInitialDelay);
}

#[test]
fn rejects_initial_above_max() {
    let err = RetryDelay::from_millis(2_000, 1_000, 2.0).expect_err("should fail");
    assert_matches!(
        err,
        RetryConfigError::InitialExceedsMax { initial, max }
            if initial == Duration::from_secs(2) && max == Duration::from_secs(1)
    );
}

#[test]
fn rejects_non_finite_factor() {
    let err = RetryDelay::from_millis(100, 1_000, f64::NAN).expect_err("should fail");
    assert_matches!(err, RetryConfigError::NonFiniteFactor(_));

    let err = RetryDelay::from_millis(100, 1_000, f64::INFINITY).expect_err("should fail");
    assert_matches!(err, RetryConfigError::NonFiniteFactor(f) if f.is_infinite());
}

#[test]
fn keeps_sub_microsecond_precision() {
    let mut delay = RetryDelay::new(Duration::from_nanos(500), Duration::from_micros(10), 2.0)
        .expect("valid settings");

    assert_eq!(delay.initial(), Duration::from_nanos(500));
    assert_eq!(delay.next_delay(), Duration::from_nanos(500));
    assert_eq!(delay.next_delay(), Duration::from_nanos(1000));
    assert_eq!(delay.next_delay(), Duration::from_nanos(2000));
}

#[test]
fn shared_handles_observe_one_sequence() {
    let first = SharedRetryDelay::new(RetryDelay::from_millis(100, 60_000, 2.0).expect("valid settings"));
    let second = first.clone();

    assert_eq!(first.next_delay(), Duration::from_millis(100));
    assert_eq!(second.next_delay(), Duration::from_millis(200));
    assert_eq!(first.current(), Duration::from_millis(400));

    second.reset();
    assert_eq!(first.current(), Duration::from_millis(100));
    assert_eq!(first.next_delay(), Duration::from_millis(100));
}
