//! Tests for the retry and limit subcommands.

use super::parse;
use crate::cli::CliCommand;
use pacer_core::FailureKind;

#[test]
fn cli_parse_retry_defaults() {
    match parse(&["pacer", "retry"]) {
        CliCommand::Retry {
            fail_times,
            kind,
            attempts,
            delay,
            retry_on,
            dry_run,
            events,
            ..
        } => {
            assert_eq!(fail_times, 2);
            assert_eq!(kind, FailureKind::Timeout);
            assert!(attempts.is_none());
            assert!(delay.is_none());
            assert!(retry_on.is_empty());
            assert!(!dry_run);
            assert!(!events);
        }
        _ => panic!("expected Retry"),
    }
}

#[test]
fn cli_parse_retry_overrides() {
    match parse(&[
        "pacer",
        "retry",
        "--fail-times",
        "4",
        "--kind",
        "server",
        "--attempts",
        "6",
        "--delay",
        "0.1",
        "--multiplier",
        "1.5",
        "--max-delay",
        "2",
        "--retry-on",
        "server,timeout",
        "--dry-run",
        "--events",
    ]) {
        CliCommand::Retry {
            fail_times,
            kind,
            attempts,
            delay,
            multiplier,
            max_delay,
            retry_on,
            dry_run,
            events,
        } => {
            assert_eq!(fail_times, 4);
            assert_eq!(kind, FailureKind::Server);
            assert_eq!(attempts, Some(6));
            assert_eq!(delay, Some(0.1));
            assert_eq!(multiplier, Some(1.5));
            assert_eq!(max_delay, Some(2.0));
            assert_eq!(retry_on, vec![FailureKind::Server, FailureKind::Timeout]);
            assert!(dry_run);
            assert!(events);
        }
        _ => panic!("expected Retry"),
    }
}

#[test]
fn cli_parse_retry_rejects_unknown_kind() {
    use crate::cli::Cli;
    use clap::Parser;
    assert!(Cli::try_parse_from(["pacer", "retry", "--kind", "gremlins"]).is_err());
}

#[test]
fn cli_parse_limit() {
    match parse(&[
        "pacer",
        "limit",
        "--requests",
        "8",
        "--capacity",
        "5",
        "--period",
        "5",
        "--interval-ms",
        "250",
    ]) {
        CliCommand::Limit {
            requests,
            capacity,
            period,
            interval_ms,
            events,
        } => {
            assert_eq!(requests, 8);
            assert_eq!(capacity, Some(5.0));
            assert_eq!(period, Some(5.0));
            assert_eq!(interval_ms, 250);
            assert!(!events);
        }
        _ => panic!("expected Limit"),
    }
}
