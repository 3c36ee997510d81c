use crate::BrowserError;
use crate::Result;
use crate::config::ViewportConfig;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::input::DispatchMouseEventParams;
use chromiumoxide::cdp::browser_protocol::input::DispatchMouseEventType;
use chromiumoxide::cdp::browser_protocol::input::MouseButton;
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::cdp::browser_protocol::network::EventLoadingFailed;
use chromiumoxide::cdp::browser_protocol::network::EventLoadingFinished;
use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParamsBuilder;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotReturns;
use chromiumoxide::cdp::browser_protocol::page::ReloadParams;
use chromiumoxide::cdp::browser_protocol::page::Viewport;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// One live document view inside a [`crate::Session`]. All waits are bounded:
/// navigation and reload by the configured navigation timeout, network-idle
/// by an explicit limit.
pub struct Page {
    cdp: CdpPage,
    viewport: ViewportConfig,
    nav_timeout: Duration,
}

impl Page {
    pub(crate) fn new(cdp: CdpPage, viewport: ViewportConfig, nav_timeout: Duration) -> Self {
        Self {
            cdp,
            viewport,
            nav_timeout,
        }
    }

    /// Navigate to `url` and wait for the load event, bounded by the
    /// navigation timeout.
    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("navigating to {url}");

        let nav = async {
            self.cdp.goto(url).await?;
            self.cdp.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(self.nav_timeout, nav).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("no load event within {}ms", self.nav_timeout.as_millis()),
            }),
        }
    }

    /// Full reload so the application re-reads client-side storage during its
    /// normal startup path. Bounded like [`Self::goto`].
    pub async fn reload(&self) -> Result<()> {
        let url = self.current_url().await.unwrap_or_else(|| "about:blank".to_string());
        debug!("reloading {url}");

        let nav = async {
            self.cdp.execute(ReloadParams::default()).await?;
            self.cdp.wait_for_navigation().await?;
            Ok::<(), chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(self.nav_timeout, nav).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url,
                reason: format!("reload failed: {e}"),
            }),
            Err(_) => Err(BrowserError::Navigation {
                url,
                reason: format!("reload did not finish within {}ms", self.nav_timeout.as_millis()),
            }),
        }
    }

    /// Register a script that runs before any page script on every
    /// subsequent load, including reloads.
    pub async fn add_init_script(&self, source: &str) -> Result<()> {
        let params = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(source)
            .build()
            .map_err(BrowserError::Cdp)?;
        self.cdp.execute(params).await?;
        Ok(())
    }

    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.cdp.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Current page markup, for diagnostic DOM dumps.
    pub async fn content(&self) -> Result<String> {
        Ok(self.cdp.content().await?)
    }

    pub async fn current_url(&self) -> Option<String> {
        self.cdp.url().await.ok().flatten()
    }

    /// Dispatch a trusted click at viewport coordinates.
    pub async fn click(&self, x: f64, y: f64) -> Result<()> {
        debug!("clicking at ({x}, {y})");

        let move_params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y)
            .build()
            .map_err(BrowserError::Cdp)?;
        self.cdp.execute(move_params).await?;

        let down_params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(BrowserError::Cdp)?;
        self.cdp.execute(down_params).await?;

        let up_params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(BrowserError::Cdp)?;
        self.cdp.execute(up_params).await?;

        Ok(())
    }

    /// Capture a PNG of the viewport, or of the whole document when
    /// `full_page` is set.
    pub async fn screenshot_png(&self, full_page: bool) -> Result<Vec<u8>> {
        let clip = if full_page {
            self.document_clip().await?
        } else {
            self.viewport_clip().await?
        };
        debug!(
            "capturing {}x{} screenshot",
            clip.width as u32, clip.height as u32
        );

        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .capture_beyond_viewport(true)
            .clip(clip);

        let resp = self.capture_with_retry(params).await?;
        let data_b64: &str = resp.data.as_ref();
        base64::engine::general_purpose::STANDARD
            .decode(data_b64.as_bytes())
            .map_err(|e| BrowserError::Screenshot(format!("base64 decode failed: {e}")))
    }

    /// `from_surface(false)` avoids flashing but fails when the window is not
    /// visible, so retry with `from_surface(true)`.
    async fn capture_with_retry(
        &self,
        params: CaptureScreenshotParamsBuilder,
    ) -> Result<CaptureScreenshotReturns> {
        let first = params.clone().from_surface(false).build();
        match self.cdp.execute(first).await {
            Ok(resp) => Ok(resp.result),
            Err(e) => {
                debug!("screenshot with from_surface(false) failed: {e}; retrying with from_surface(true)");
                let retry = params.from_surface(true).build();
                Ok(self.cdp.execute(retry).await?.result)
            }
        }
    }

    async fn viewport_clip(&self) -> Result<Viewport> {
        // Probe the CSS viewport rather than trusting device metrics; fall
        // back to the configured viewport if the probe returns nothing.
        let probe = self
            .evaluate(
                "(() => ({ w: (document.documentElement.clientWidth|0), h: (document.documentElement.clientHeight|0) }))()",
            )
            .await
            .unwrap_or(serde_json::Value::Null);

        let doc_w = probe.get("w").and_then(serde_json::Value::as_u64).unwrap_or(0) as u32;
        let doc_h = probe.get("h").and_then(serde_json::Value::as_u64).unwrap_or(0) as u32;

        let width = if doc_w > 0 { doc_w } else { self.viewport.width };
        let height = if doc_h > 0 { doc_h } else { self.viewport.height };

        Ok(Viewport {
            x: 0.0,
            y: 0.0,
            width: width as f64,
            height: height as f64,
            scale: 1.0,
        })
    }

    async fn document_clip(&self) -> Result<Viewport> {
        let lm = self.cdp.layout_metrics().await?;
        let content = lm.css_content_size;
        Ok(Viewport {
            x: 0.0,
            y: 0.0,
            width: content.width.ceil(),
            height: content.height.ceil(),
            scale: 1.0,
        })
    }

    /// Suspend until no network activity has been observed for `quiet`, or
    /// until `limit` elapses. Returns whether quiescence was reached.
    pub async fn wait_for_network_idle(&self, quiet: Duration, limit: Duration) -> Result<bool> {
        self.cdp.execute(network::EnableParams::default()).await?;

        let requests = self.cdp.event_listener::<EventRequestWillBeSent>().await?;
        let finished = self.cdp.event_listener::<EventLoadingFinished>().await?;
        let failed = self.cdp.event_listener::<EventLoadingFailed>().await?;
        let mut activity = futures::stream::select_all(vec![
            requests.map(|_| ()).boxed(),
            finished.map(|_| ()).boxed(),
            failed.map(|_| ()).boxed(),
        ]);

        let deadline = Instant::now() + limit;
        let mut last_activity = Instant::now();

        loop {
            let quiet_deadline = last_activity + quiet;
            let now = Instant::now();
            if now >= quiet_deadline {
                return Ok(true);
            }
            if now >= deadline {
                warn!(
                    "network did not go idle within {}ms; continuing anyway",
                    limit.as_millis()
                );
                return Ok(false);
            }

            tokio::select! {
                event = activity.next() => {
                    match event {
                        Some(()) => last_activity = Instant::now(),
                        // No listeners left means the target is shutting
                        // down; nothing further can arrive.
                        None => return Ok(true),
                    }
                }
                _ = tokio::time::sleep_until(quiet_deadline.min(deadline)) => {}
            }
        }
    }

    pub(crate) fn cdp(&self) -> &CdpPage {
        &self.cdp
    }
}
