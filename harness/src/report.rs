use crate::capture::CaptureArtifact;
use crate::capture::CaptureFailure;
use crate::config::RunConfig;
use crate::readiness::ElementDescriptor;
use crate::run::Outcome;
use crate::run::RunSummary;
use pagecheck_browser::ConsoleEntry;
use pagecheck_browser::PageError;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use tracing::warn;

/// Machine-readable record of one run, written when the artifact plan names
/// a report path.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub url: &'a str,
    pub target: &'a ElementDescriptor,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waited_ms: Option<u128>,
    pub elapsed_ms: u128,
    pub artifacts: &'a [CaptureArtifact],
    pub capture_failures: &'a [CaptureFailure],
    pub console: &'a [ConsoleEntry],
    pub page_errors: &'a [PageError],
}

pub fn build<'a>(config: &'a RunConfig, summary: &'a RunSummary) -> RunReport<'a> {
    let (outcome, waited_ms) = match summary.outcome {
        Outcome::Completed => ("completed", None),
        Outcome::NotReady { waited } => ("not-ready", Some(waited.as_millis())),
    };
    RunReport {
        url: &config.url,
        target: &config.target,
        outcome,
        waited_ms,
        elapsed_ms: summary.elapsed.as_millis(),
        artifacts: &summary.artifacts,
        capture_failures: &summary.capture_failures,
        console: &summary.console,
        page_errors: &summary.page_errors,
    }
}

/// Report writing follows the capture-failure policy: log and move on,
/// never mask the run's result.
pub async fn write(path: &Path, config: &RunConfig, summary: &RunSummary) {
    let report = build(config, summary);
    let json = match serde_json::to_vec_pretty(&report) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize run report: {e}");
            return;
        }
    };
    match tokio::fs::write(path, &json).await {
        Ok(()) => info!("wrote report to {}", path.display()),
        Err(e) => warn!("failed to write run report {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::ArtifactPlan;
    use crate::settle::SettleStrategy;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn config() -> RunConfig {
        RunConfig {
            url: "http://localhost:5174".to_string(),
            storage_seed: BTreeMap::new(),
            seed_mode: crate::config::SeedMode::InitScript,
            target: ElementDescriptor::new("button", "START"),
            readiness_timeout: Duration::from_secs(5),
            settle: SettleStrategy::default(),
            artifacts: ArtifactPlan::default(),
            browser: pagecheck_browser::BrowserConfig::default(),
        }
    }

    #[test]
    fn completed_report_has_no_waited_field() {
        let config = config();
        let summary = RunSummary {
            outcome: Outcome::Completed,
            artifacts: vec![CaptureArtifact::Screenshot {
                path: "after_start.png".into(),
            }],
            capture_failures: Vec::new(),
            console: Vec::new(),
            page_errors: Vec::new(),
            elapsed: Duration::from_millis(4200),
        };

        let value = serde_json::to_value(build(&config, &summary)).unwrap();
        assert_eq!(value["outcome"], "completed");
        assert_eq!(value["elapsed_ms"], 4200);
        assert_eq!(value["url"], "http://localhost:5174");
        assert_eq!(value["target"]["role"], "button");
        assert_eq!(value["target"]["name"], "START");
        assert_eq!(value["artifacts"][0]["kind"], "screenshot");
        assert!(value.get("waited_ms").is_none());
    }

    #[test]
    fn not_ready_report_records_how_long_was_waited() {
        let config = config();
        let summary = RunSummary {
            outcome: Outcome::NotReady {
                waited: Duration::from_secs(5),
            },
            artifacts: Vec::new(),
            capture_failures: Vec::new(),
            console: Vec::new(),
            page_errors: Vec::new(),
            elapsed: Duration::from_millis(5600),
        };

        let value = serde_json::to_value(build(&config, &summary)).unwrap();
        assert_eq!(value["outcome"], "not-ready");
        assert_eq!(value["waited_ms"], 5000);
    }
}
