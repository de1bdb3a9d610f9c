//! Progress-callback trait for stage-level conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to hear
//! about each pipeline stage as it starts and finishes. The CLI uses this
//! to print its `Generating PDF...` line and drive a terminal spinner; the
//! library itself never writes to stdout.
//!
//! # Example
//!
//! ```rust
//! use markdown2pdf::{ConversionProgressCallback, ConversionConfig, Stage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl ConversionProgressCallback for StageLogger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// pandoc turns Markdown into HTML or PDF.
    Convert,
    /// Chromium prints the intermediate HTML (browser backend only).
    Render,
    /// The intermediate HTML file is removed.
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Convert => f.write_str("convert"),
            Stage::Render => f.write_str("render"),
            Stage::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive sequentially from a single task.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, before pandoc is started.
    fn on_conversion_start(&self, input: &Path, output: &Path) {
        let _ = (input, output);
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes successfully.
    ///
    /// # Arguments
    /// * `stage`      — the stage that finished
    /// * `elapsed_ms` — wall-clock time spent in it
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }

    /// Called when the typesetting script fails; the run continues.
    fn on_typeset_failed(&self, error: &str) {
        let _ = error;
    }

    /// Called once after the PDF has been written.
    fn on_conversion_complete(&self, output: &Path) {
        let _ = output;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
