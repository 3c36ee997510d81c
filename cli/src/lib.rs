pub mod cli;

pub use cli::Cli;

use pagecheck_harness::CaptureArtifact;
use pagecheck_harness::Outcome;
use pagecheck_harness::RunSummary;

/// Environment variable consulted when no URL argument is given.
pub const URL_ENV_VAR: &str = "PAGECHECK_URL";

/// An explicit argument wins over the environment; blank values count as
/// unset.
pub fn resolve_target_url(arg: Option<&str>, env: Option<&str>) -> Option<String> {
    arg.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}

/// Human-readable outcome on stdout. Console entries keep their severity
/// tags so transcript lines stay greppable.
pub fn print_summary(summary: &RunSummary, quiet_console: bool) {
    if !quiet_console {
        for entry in &summary.console {
            println!("CONSOLE[{}]: {}", entry.level, entry.text);
        }
        for error in &summary.page_errors {
            println!("PAGE ERROR: {}", error.text);
        }
    }
    for artifact in &summary.artifacts {
        match artifact {
            CaptureArtifact::Screenshot { path } => println!("captured {}", path.display()),
            CaptureArtifact::DomSnapshot { path } => println!("dumped DOM to {}", path.display()),
        }
    }
    for failure in &summary.capture_failures {
        println!("capture failed: {} ({})", failure.artifact, failure.reason);
    }
    match &summary.outcome {
        Outcome::Completed => println!(
            "verification completed in {:.1}s",
            summary.elapsed.as_secs_f64()
        ),
        Outcome::NotReady { waited } => println!(
            "target not ready after {:.1}s; diagnostics captured",
            waited.as_secs_f64()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_argument_wins_over_environment() {
        assert_eq!(
            resolve_target_url(Some("http://localhost:5174"), Some("http://other")),
            Some("http://localhost:5174".to_string())
        );
        assert_eq!(
            resolve_target_url(None, Some("http://other")),
            Some("http://other".to_string())
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        assert_eq!(resolve_target_url(Some("  "), None), None);
        assert_eq!(resolve_target_url(None, Some("")), None);
        assert_eq!(resolve_target_url(None, None), None);
    }
}
