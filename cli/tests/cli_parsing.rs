#![allow(clippy::unwrap_used, clippy::expect_used)]

use clap::Parser;
use pagecheck_cli::Cli;
use pagecheck_harness::Outcome;
use pagecheck_harness::SettleStrategy;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::Duration;

const URL: &str = "http://localhost:5174";

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["pagecheck"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

#[test]
fn defaults_cover_the_start_button_flow() {
    let config = parse(&[URL]).into_run_config(URL.to_string());

    assert_eq!(config.target.role, "button");
    assert_eq!(config.target.name, "START");
    assert_eq!(config.readiness_timeout, Duration::from_secs(5));
    assert_eq!(
        config.settle,
        SettleStrategy::FixedDelay {
            duration: Duration::from_secs(3)
        }
    );
    assert_eq!(
        config.artifacts.before_screenshot,
        Some(PathBuf::from("before_start.png"))
    );
    assert_eq!(
        config.artifacts.after_screenshot,
        Some(PathBuf::from("after_start.png"))
    );
    assert_eq!(
        config.artifacts.failure_screenshot,
        PathBuf::from("error_state.png")
    );
    assert!(config.artifacts.dom_dump.is_none());
    assert!(config.artifacts.report.is_none());
    assert!(!config.artifacts.full_page);
    assert!(config.browser.headless);
    assert!(config.storage_seed.is_empty());
}

#[test]
fn seeds_collect_into_a_sorted_map() {
    let config = parse(&[
        URL,
        "--seed",
        "openai_api_key=dummy-key",
        "--seed",
        "ai_provider=openai",
    ])
    .into_run_config(URL.to_string());

    let entries: Vec<_> = config
        .storage_seed
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![("ai_provider", "openai"), ("openai_api_key", "dummy-key")]
    );
}

#[test]
fn malformed_seed_entries_are_rejected_at_parse_time() {
    assert!(Cli::try_parse_from(["pagecheck", URL, "--seed", "missing-equals"]).is_err());
    assert!(Cli::try_parse_from(["pagecheck", URL, "--seed", "=value"]).is_err());
}

#[test]
fn screenshots_can_be_disabled_with_none() {
    let config = parse(&[URL, "--before", "none"]).into_run_config(URL.to_string());
    assert!(config.artifacts.before_screenshot.is_none());
    assert_eq!(
        config.artifacts.after_screenshot,
        Some(PathBuf::from("after_start.png"))
    );
}

#[test]
fn viewport_settle_and_browser_flags_parse() {
    let config = parse(&[
        URL,
        "--viewport",
        "800x600",
        "--settle",
        "network-idle",
        "--headed",
        "--full-page",
        "--timeout",
        "10s",
    ])
    .into_run_config(URL.to_string());

    assert_eq!(config.browser.viewport.width, 800);
    assert_eq!(config.browser.viewport.height, 600);
    assert!(!config.browser.headless);
    assert!(config.artifacts.full_page);
    assert_eq!(config.readiness_timeout, Duration::from_secs(10));
    assert!(matches!(config.settle, SettleStrategy::NetworkIdle { .. }));
}

#[test]
fn bad_viewports_and_durations_are_rejected() {
    assert!(Cli::try_parse_from(["pagecheck", URL, "--viewport", "800"]).is_err());
    assert!(Cli::try_parse_from(["pagecheck", URL, "--viewport", "0x600"]).is_err());
    assert!(Cli::try_parse_from(["pagecheck", URL, "--timeout", "soon"]).is_err());
    assert!(Cli::try_parse_from(["pagecheck", URL, "--settle", "whenever"]).is_err());
}

#[test]
fn long_fixed_settles_for_animation_runs_are_accepted() {
    let config = parse(&[URL, "--settle", "fixed:15s"]).into_run_config(URL.to_string());
    assert_eq!(
        config.settle,
        SettleStrategy::FixedDelay {
            duration: Duration::from_secs(15)
        }
    );
}

// Outcome is re-exported for callers that embed the harness; make sure the
// variants stay matchable from outside the crate.
#[test]
fn outcome_variants_are_public_api() {
    let outcome = Outcome::NotReady {
        waited: Duration::from_secs(5),
    };
    match outcome {
        Outcome::Completed => panic!("unexpected"),
        Outcome::NotReady { waited } => assert_eq!(waited, Duration::from_secs(5)),
    }
}
