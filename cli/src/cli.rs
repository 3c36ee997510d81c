use clap::Parser;
use pagecheck_browser::BrowserConfig;
use pagecheck_browser::ViewportConfig;
use pagecheck_harness::ArtifactPlan;
use pagecheck_harness::ElementDescriptor;
use pagecheck_harness::RunConfig;
use pagecheck_harness::SeedMode;
use pagecheck_harness::SettleStrategy;
use pagecheck_harness::config::parse_seed_entry;
use pagecheck_harness::settle::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

/// Drive a headless browser against a locally served single-page app: seed
/// client-side storage, wait for a named control by accessible role and
/// name, click it once, and record screenshots, console output and page
/// errors.
#[derive(Debug, Parser)]
#[command(name = "pagecheck", version)]
pub struct Cli {
    /// Target URL. Falls back to the PAGECHECK_URL environment variable;
    /// when neither is set the run is skipped.
    pub url: Option<String>,

    /// Session-storage entry applied before the readiness check
    /// (repeatable), e.g. `openai_api_key=dummy-key`.
    #[arg(long = "seed", value_name = "KEY=VALUE", value_parser = parse_seed_entry)]
    pub seed: Vec<(String, String)>,

    /// How the storage seed reaches the page: `init-script` injects before
    /// any page script runs; `reload` evaluates after first load and
    /// reloads.
    #[arg(long = "seed-mode", default_value = "init-script")]
    pub seed_mode: SeedMode,

    /// Accessible role of the element to wait for.
    #[arg(long, default_value = "button")]
    pub role: String,

    /// Accessible name of the element to wait for.
    #[arg(long, default_value = "START")]
    pub name: String,

    /// Bound on the readiness wait.
    #[arg(long, value_name = "DURATION", default_value = "5s", value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Settle policy after the click: `fixed:<duration>` or `network-idle`.
    #[arg(long, default_value = "fixed:3s")]
    pub settle: SettleStrategy,

    /// Screenshot taken before the click; `none` to skip.
    #[arg(long, value_name = "PATH", default_value = "before_start.png")]
    pub before: String,

    /// Screenshot taken after the settle; `none` to skip.
    #[arg(long, value_name = "PATH", default_value = "after_start.png")]
    pub after: String,

    /// Screenshot taken when the readiness gate times out.
    #[arg(
        long = "failure-screenshot",
        value_name = "PATH",
        default_value = "error_state.png"
    )]
    pub failure_screenshot: PathBuf,

    /// Write the readiness-timeout DOM dump to this file instead of stdout.
    #[arg(long = "dom-dump", value_name = "PATH")]
    pub dom_dump: Option<PathBuf>,

    /// Capture whole-document screenshots instead of the viewport.
    #[arg(long = "full-page", default_value_t = false)]
    pub full_page: bool,

    /// Write a machine-readable JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Run with a visible browser window.
    #[arg(long, default_value_t = false)]
    pub headed: bool,

    /// Viewport size as WIDTHxHEIGHT.
    #[arg(long, value_name = "WxH", default_value = "1280x720", value_parser = parse_viewport_arg)]
    pub viewport: (u32, u32),

    /// Suppress the console transcript on stdout.
    #[arg(long = "quiet-console", default_value_t = false)]
    pub quiet_console: bool,
}

impl Cli {
    /// Convert the parsed flags into the harness's explicit run
    /// configuration. The URL is resolved separately so the env-var
    /// fallback stays at the binary boundary.
    pub fn into_run_config(self, url: String) -> RunConfig {
        let browser = BrowserConfig {
            headless: !self.headed,
            viewport: ViewportConfig {
                width: self.viewport.0,
                height: self.viewport.1,
                ..ViewportConfig::default()
            },
            ..BrowserConfig::default()
        };

        RunConfig {
            url,
            storage_seed: self.seed.into_iter().collect(),
            seed_mode: self.seed_mode,
            target: ElementDescriptor::new(self.role, self.name),
            readiness_timeout: self.timeout,
            settle: self.settle,
            artifacts: ArtifactPlan {
                before_screenshot: screenshot_path(&self.before),
                after_screenshot: screenshot_path(&self.after),
                failure_screenshot: self.failure_screenshot,
                dom_dump: self.dom_dump,
                full_page: self.full_page,
                report: self.report,
            },
            browser,
        }
    }
}

fn screenshot_path(s: &str) -> Option<PathBuf> {
    (s != "none").then(|| PathBuf::from(s))
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration `{s}` (expected e.g. `5s` or `750ms`)"))
}

fn parse_viewport_arg(s: &str) -> Result<(u32, u32), String> {
    let err = || format!("invalid viewport `{s}` (expected WIDTHxHEIGHT)");
    let (w, h) = s.split_once('x').ok_or_else(err)?;
    let width = w.parse().map_err(|_| err())?;
    let height = h.parse().map_err(|_| err())?;
    if width == 0 || height == 0 {
        return Err(err());
    }
    Ok((width, height))
}
