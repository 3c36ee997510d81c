use pagecheck_browser::BrowserError;
use pagecheck_browser::Page;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureArtifact {
    Screenshot { path: PathBuf },
    DomSnapshot { path: PathBuf },
}

/// An artifact that could not be produced. Recorded and logged; never fatal
/// and never masks the run's primary result.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureFailure {
    pub artifact: String,
    pub reason: String,
}

/// Append-only artifact ledger for one run.
#[derive(Debug, Default)]
pub struct Captures {
    pub artifacts: Vec<CaptureArtifact>,
    pub failures: Vec<CaptureFailure>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn screenshot(&mut self, page: &Page, path: &Path, full_page: bool) {
        let outcome = async {
            let png = page.screenshot_png(full_page).await?;
            tokio::fs::write(path, &png).await?;
            Ok::<(), BrowserError>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                info!("captured {}", path.display());
                self.artifacts.push(CaptureArtifact::Screenshot {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => self.record_failure(format!("screenshot {}", path.display()), e),
        }
    }

    /// Write the page markup to `dest`, or to stdout when no path was given.
    pub async fn dom_snapshot(&mut self, page: &Page, dest: Option<&Path>) {
        let markup = match page.content().await {
            Ok(markup) => markup,
            Err(e) => {
                self.record_failure("dom snapshot".to_string(), e);
                return;
            }
        };
        match dest {
            Some(path) => match tokio::fs::write(path, &markup).await {
                Ok(()) => {
                    info!("captured {}", path.display());
                    self.artifacts.push(CaptureArtifact::DomSnapshot {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) => {
                    self.record_failure(format!("dom snapshot {}", path.display()), e.into());
                }
            },
            None => println!("{markup}"),
        }
    }

    fn record_failure(&mut self, artifact: String, error: BrowserError) {
        warn!("failed to capture {artifact}: {error}");
        self.failures.push(CaptureFailure {
            artifact,
            reason: error.to_string(),
        });
    }
}
