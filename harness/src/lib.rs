pub mod capture;
pub mod config;
pub mod readiness;
pub mod report;
pub mod run;
pub mod settle;

pub use capture::CaptureArtifact;
pub use capture::CaptureFailure;
pub use config::ArtifactPlan;
pub use config::RunConfig;
pub use config::SeedMode;
pub use readiness::ElementDescriptor;
pub use readiness::ElementHandle;
pub use readiness::ReadinessTimeout;
pub use run::Outcome;
pub use run::RunSummary;
pub use run::exit_code;
pub use run::run;
pub use settle::SettleStrategy;

use pagecheck_browser::BrowserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    /// The target was unreachable or never produced a load event. Fatal to
    /// the run.
    #[error("navigation failed: {source}")]
    Navigation {
        #[source]
        source: BrowserError,
    },

    /// The resolved element could not be acted upon, e.g. it detached from
    /// the document between resolution and the click. Reported; the run
    /// still exits cleanly with whatever artifacts were captured.
    #[error("interaction failed: {0}")]
    Interaction(String),

    /// Unexpected browser-level fault outside the navigation stage.
    #[error(transparent)]
    Browser(#[from] BrowserError),
}
