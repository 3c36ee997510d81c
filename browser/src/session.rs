use crate::BrowserError;
use crate::Result;
use crate::config::BrowserConfig;
use crate::page::Page;
use chromiumoxide::Browser;
use chromiumoxide::browser::BrowserConfig as CdpConfig;
use chromiumoxide::browser::HeadlessMode;
use futures::StreamExt;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::info;

/// An isolated browsing context: one browser process, one fresh profile, one
/// page. A harness run owns exactly one `Session`; [`Session::close`]
/// consumes it, so teardown can happen only once.
pub struct Session {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
    // Temp profile directory; removed from disk when the session is closed.
    _profile: Option<TempDir>,
}

impl Session {
    pub async fn launch(config: &BrowserConfig) -> Result<Session> {
        info!("launching browser (headless: {})", config.headless);

        let mut builder = CdpConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .arg("--disable-blink-features=AutomationControlled");

        if config.headless {
            builder = builder.headless_mode(HeadlessMode::New);
        } else {
            builder = builder.with_head();
        }

        let profile = match &config.user_data_dir {
            Some(dir) => {
                builder = builder.user_data_dir(dir);
                None
            }
            None => {
                let tmp = TempDir::with_prefix("pagecheck-profile-")?;
                builder = builder.user_data_dir(tmp.path());
                Some(tmp)
            }
        };

        let cdp_config = builder.build().map_err(BrowserError::Launch)?;
        let (browser, mut handler) = Browser::launch(cdp_config).await?;

        // The handler stream must be drained for the browser to function.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("browser event: {event:?}");
            }
        });

        let cdp_page = browser.new_page("about:blank").await?;
        let page = Page::new(
            cdp_page,
            config.viewport.clone(),
            Duration::from_millis(config.nav_timeout_ms),
        );

        Ok(Session {
            browser,
            handler_task,
            page,
            _profile: profile,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Tear down the browser process and drop the temporary profile.
    pub async fn close(mut self) -> Result<()> {
        info!("closing browser session");
        let result = self.browser.close().await;
        self.handler_task.abort();
        result?;
        Ok(())
    }
}
