pub mod config;
pub mod console;
pub mod page;
pub mod session;

pub use config::BrowserConfig;
pub use config::ViewportConfig;
pub use console::ConsoleEntry;
pub use console::ConsoleLevel;
pub use console::ConsoleRecorder;
pub use console::PageError;
pub use page::Page;
pub use session::Session;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("screenshot failed: {0}")]
    Screenshot(String),
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
