//! Headless-browser printing: intermediate HTML → PDF via Chromium.
//!
//! One run owns one browser process and one page. Every DevTools call is
//! awaited before the next is issued:
//!
//! ```text
//! launch (--no-sandbox) → new page → subscribe lifecycle events
//!   → goto file://… → wait for networkIdle → typeset (best effort)
//!   → Page.printToPDF → close browser
//! ```
//!
//! The DevTools [`Handler`](chromiumoxide::Handler) must be polled for any
//! of this to make progress; it runs as a spawned task that ends once the
//! browser connection closes.

use crate::config::{ConversionConfig, PaperFormat};
use crate::error::Md2PdfError;
use crate::pipeline::typeset::{self, TypesetOutcome};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, PrintToPdfParams};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle event name Chromium emits once no network connections remain.
const NETWORK_IDLE: &str = "networkIdle";

/// Everything the renderer needs for one page.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Standalone HTML produced by pandoc.
    pub html: PathBuf,
    /// Destination PDF.
    pub output: PathBuf,
    pub paper: PaperFormat,
    /// Uniform page margin; `None` keeps the browser default.
    pub margin_inches: Option<f64>,
    /// Evaluated after network idle; failures are swallowed.
    pub typeset_script: Option<String>,
}

impl RenderJob {
    pub fn from_config(html: &Path, output: &Path, config: &ConversionConfig) -> Self {
        let margin_inches = config.options.margin_inches();
        if margin_inches.is_none() {
            debug!(
                "Margin '{}' is not an absolute CSS length; using browser default",
                config.options.margin
            );
        }
        Self {
            html: html.to_path_buf(),
            output: output.to_path_buf(),
            paper: config.paper,
            margin_inches,
            typeset_script: config.typeset_script().map(str::to_string),
        }
    }

    /// DevTools print parameters for this job.
    pub fn print_params(&self) -> PrintToPdfParams {
        let (width, height) = self.paper.size_inches();
        let mut builder = PrintToPdfParams::builder()
            .print_background(true)
            .paper_width(width)
            .paper_height(height);
        if let Some(m) = self.margin_inches {
            builder = builder
                .margin_top(m)
                .margin_bottom(m)
                .margin_left(m)
                .margin_right(m);
        }
        builder.build()
    }
}

/// Anything that can print an HTML file to PDF.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, job: &RenderJob) -> Result<TypesetOutcome, Md2PdfError>;
}

/// Prints through a freshly launched headless Chromium.
#[derive(Debug, Clone, Default)]
pub struct ChromiumRenderer {
    executable: Option<PathBuf>,
    load_timeout: Option<Duration>,
}

impl ChromiumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the configured executable, else whatever [`tool_probe`] finds.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let executable = config
            .browser_executable
            .clone()
            .or_else(|| match tool_probe::locate_browser() {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("Browser probe: {}", e);
                    None
                }
            });
        Self {
            executable,
            load_timeout: config.load_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }

    fn browser_config(&self) -> Result<BrowserConfig, Md2PdfError> {
        let mut builder = BrowserConfig::builder().no_sandbox();
        if let Some(ref exe) = self.executable {
            builder = builder.chrome_executable(exe);
        }
        builder.build().map_err(Md2PdfError::BrowserLaunch)
    }

    /// Navigate, wait, typeset and print on an already-open page.
    async fn print_page(&self, page: &Page, job: &RenderJob) -> Result<TypesetOutcome, Md2PdfError> {
        let url = Url::from_file_path(&job.html)
            .map_err(|_| Md2PdfError::Navigation {
                url: job.html.display().to_string(),
                detail: "not an absolute path".into(),
            })?
            .to_string();
        let nav_err = |e: chromiumoxide::error::CdpError| Md2PdfError::Navigation {
            url: url.clone(),
            detail: e.to_string(),
        };

        // Subscribe before navigating so the idle event cannot be missed.
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(nav_err)?;
        let main_frame = page.mainframe().await.map_err(nav_err)?;

        debug!("Navigating to {}", url);
        page.goto(url.as_str()).await.map_err(nav_err)?;

        let wait_idle = async {
            let mut navigated = false;
            while let Some(event) = lifecycle.next().await {
                if main_frame.as_ref().is_some_and(|f| *f != event.frame_id) {
                    continue;
                }
                match event.name.as_str() {
                    "init" => navigated = true,
                    NETWORK_IDLE if navigated => return true,
                    _ => {}
                }
            }
            false
        };

        let idle = match self.load_timeout {
            Some(limit) => tokio::time::timeout(limit, wait_idle).await.map_err(|_| {
                Md2PdfError::LoadTimeout {
                    url: url.clone(),
                    secs: limit.as_secs(),
                }
            })?,
            None => wait_idle.await,
        };
        if !idle {
            return Err(Md2PdfError::Navigation {
                url,
                detail: "event stream closed before the page became idle".into(),
            });
        }
        debug!("Page reached network idle");

        let outcome = match job.typeset_script.as_deref() {
            Some(script) => typeset::attempt(page.evaluate(script)).await,
            None => TypesetOutcome::Skipped,
        };

        page.save_pdf(job.print_params(), &job.output)
            .await
            .map_err(|e| Md2PdfError::PrintFailed {
                path: job.output.clone(),
                detail: e.to_string(),
            })?;

        Ok(outcome)
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, job: &RenderJob) -> Result<TypesetOutcome, Md2PdfError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))?;
        info!("Headless browser launched");

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools handler: {}", e);
                }
            }
        });

        let result = match browser.new_page("about:blank").await {
            Ok(page) => self.print_page(&page, job).await,
            Err(e) => Err(Md2PdfError::BrowserLaunch(format!("could not open a page: {e}"))),
        };

        if let Err(e) = browser.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Waiting for browser exit failed: {}", e);
        }
        if let Err(e) = handler_task.await {
            warn!("DevTools handler task ended abnormally: {}", e);
        }

        if result.is_ok() {
            info!("PDF printed to {}", job.output.display());
        }
        result
    }
}
