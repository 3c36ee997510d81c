use crate::RunError;
use crate::capture::CaptureArtifact;
use crate::capture::CaptureFailure;
use crate::capture::Captures;
use crate::config::RunConfig;
use crate::config::SeedMode;
use crate::config::seed_script;
use crate::readiness;
use crate::readiness::ReadinessTimeout;
use crate::report;
use crate::settle;
use pagecheck_browser::ConsoleEntry;
use pagecheck_browser::ConsoleRecorder;
use pagecheck_browser::PageError;
use pagecheck_browser::Session;
use std::time::Duration;
use std::time::Instant;
use tracing::info;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The element was found, clicked, and the requested artifacts captured.
    Completed,
    /// The element never became visible; diagnostics were captured instead.
    NotReady { waited: Duration },
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub artifacts: Vec<CaptureArtifact>,
    pub capture_failures: Vec<CaptureFailure>,
    pub console: Vec<ConsoleEntry>,
    pub page_errors: Vec<PageError>,
    pub elapsed: Duration,
}

/// Completed runs, readiness timeouts and interaction failures all exit
/// cleanly; an unreachable target is the one condition that must fail
/// loudly.
pub fn exit_code(result: &Result<RunSummary, RunError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(RunError::Interaction(_)) => 0,
        Err(RunError::Navigation { .. }) => 2,
        Err(RunError::Browser(_)) => 1,
    }
}

/// Drive one verification run: bootstrap the session, gate on the target
/// element, interact and capture. The browser session is released on every
/// exit path.
pub async fn run(config: &RunConfig) -> Result<RunSummary, RunError> {
    let started = Instant::now();
    info!("starting verification run against {}", config.url);

    let session = Session::launch(&config.browser).await?;
    let result = drive(&session, config, started).await;

    if let Err(e) = session.close().await {
        warn!("browser session did not close cleanly: {e}");
    }

    if let Ok(summary) = &result
        && let Some(path) = &config.artifacts.report
    {
        report::write(path, config, summary).await;
    }

    result
}

async fn drive(
    session: &Session,
    config: &RunConfig,
    started: Instant,
) -> Result<RunSummary, RunError> {
    let page = session.page();

    // Attached before navigation so errors thrown at any point of the run,
    // including asynchronously after the click, are recorded.
    let recorder = ConsoleRecorder::attach(page).await?;

    // Stage 1: session bootstrap.
    if config.seed_mode == SeedMode::InitScript && !config.storage_seed.is_empty() {
        page.add_init_script(&seed_script(&config.storage_seed)).await?;
    }

    page.goto(&config.url)
        .await
        .map_err(|source| RunError::Navigation { source })?;

    if config.seed_mode == SeedMode::EvaluateAndReload && !config.storage_seed.is_empty() {
        page.evaluate(&seed_script(&config.storage_seed)).await?;
        page.reload()
            .await
            .map_err(|source| RunError::Navigation { source })?;
        // Let the reloaded page finish fetching its resources before the
        // readiness clock starts.
        page.wait_for_network_idle(
            settle::DEFAULT_IDLE_QUIET,
            Duration::from_millis(config.browser.nav_timeout_ms),
        )
        .await?;
    }

    // Stage 2: readiness gate.
    let mut captures = Captures::new();
    let handle = match readiness::await_interactive_element(
        page,
        &config.target,
        config.readiness_timeout,
    )
    .await
    {
        Ok(handle) => handle,
        Err(timeout) => {
            return not_ready(page, config, recorder, captures, timeout, started).await;
        }
    };
    info!(
        "found {} at ({:.0}, {:.0})",
        handle.descriptor, handle.x, handle.y
    );

    // Stage 3: interaction & capture.
    if let Some(path) = &config.artifacts.before_screenshot {
        captures.screenshot(page, path, config.artifacts.full_page).await;
    }

    // Re-probe right before the click: the element may have detached since
    // the gate resolved it.
    match readiness::resolve_once(page, &config.target).await {
        Some(fresh) => page
            .click(fresh.x, fresh.y)
            .await
            .map_err(|e| RunError::Interaction(e.to_string()))?,
        None => {
            return Err(RunError::Interaction(format!(
                "{} disappeared before it could be clicked",
                config.target
            )));
        }
    }

    settle::apply(page, &config.settle).await?;

    if let Some(path) = &config.artifacts.after_screenshot {
        captures.screenshot(page, path, config.artifacts.full_page).await;
    }

    let (console, page_errors) = recorder.finish().await;
    Ok(RunSummary {
        outcome: Outcome::Completed,
        artifacts: captures.artifacts,
        capture_failures: captures.failures,
        console,
        page_errors,
        elapsed: started.elapsed(),
    })
}

/// Readiness timeout path: capture diagnostics explaining what the page
/// looked like, then exit cleanly with a reportable outcome.
async fn not_ready(
    page: &pagecheck_browser::Page,
    config: &RunConfig,
    recorder: ConsoleRecorder,
    mut captures: Captures,
    timeout: ReadinessTimeout,
    started: Instant,
) -> Result<RunSummary, RunError> {
    warn!("{timeout}; capturing diagnostics");

    captures
        .dom_snapshot(page, config.artifacts.dom_dump.as_deref())
        .await;
    captures
        .screenshot(page, &config.artifacts.failure_screenshot, config.artifacts.full_page)
        .await;

    let (console, page_errors) = recorder.finish().await;
    Ok(RunSummary {
        outcome: Outcome::NotReady {
            waited: timeout.waited,
        },
        artifacts: captures.artifacts,
        capture_failures: captures.failures,
        console,
        page_errors,
        elapsed: started.elapsed(),
    })
}
