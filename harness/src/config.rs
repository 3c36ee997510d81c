use crate::readiness::ElementDescriptor;
use crate::settle::SettleStrategy;
use pagecheck_browser::BrowserConfig;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Immutable input for one verification run. Constructed once at the CLI
/// boundary; the harness itself never reads the environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub url: String,
    /// Session-storage entries applied before the readiness check.
    pub storage_seed: BTreeMap<String, String>,
    pub seed_mode: SeedMode,
    pub target: ElementDescriptor,
    pub readiness_timeout: Duration,
    pub settle: SettleStrategy,
    pub artifacts: ArtifactPlan,
    pub browser: BrowserConfig,
}

/// How the storage seed reaches the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedMode {
    /// Inject before any page script executes, via a pre-navigation init
    /// hook. Survives reloads.
    #[default]
    InitScript,
    /// Navigate first to establish the storage origin, evaluate the seed,
    /// then reload so the application re-reads storage during its normal
    /// startup path.
    EvaluateAndReload,
}

impl FromStr for SeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init-script" => Ok(SeedMode::InitScript),
            "reload" | "evaluate-and-reload" => Ok(SeedMode::EvaluateAndReload),
            other => Err(format!(
                "unknown seed mode `{other}` (expected `init-script` or `reload`)"
            )),
        }
    }
}

/// Which artifacts a run should produce and where they go.
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    pub before_screenshot: Option<PathBuf>,
    pub after_screenshot: Option<PathBuf>,
    /// Screenshot taken when the readiness gate times out.
    pub failure_screenshot: PathBuf,
    /// Where the DOM dump goes on readiness timeout; stdout when unset.
    pub dom_dump: Option<PathBuf>,
    pub full_page: bool,
    /// Machine-readable JSON run report.
    pub report: Option<PathBuf>,
}

impl Default for ArtifactPlan {
    fn default() -> Self {
        Self {
            before_screenshot: Some(PathBuf::from("before_start.png")),
            after_screenshot: Some(PathBuf::from("after_start.png")),
            failure_screenshot: PathBuf::from("error_state.png"),
            dom_dump: None,
            full_page: false,
            report: None,
        }
    }
}

/// Parse one `KEY=VALUE` storage seed entry.
pub fn parse_seed_entry(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid seed entry `{s}` (expected KEY=VALUE)")),
    }
}

/// Script applying every seed entry to session storage. Entries are emitted
/// in sorted key order so repeated runs stay structurally equivalent.
pub fn seed_script(seed: &BTreeMap<String, String>) -> String {
    let mut script = String::new();
    for (key, value) in seed {
        // JSON string encoding doubles as JS string escaping.
        let key = serde_json::Value::String(key.clone());
        let value = serde_json::Value::String(value.clone());
        let _ = writeln!(script, "sessionStorage.setItem({key}, {value});");
    }
    script
}
