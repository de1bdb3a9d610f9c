//! Error types for the markdown2pdf library.
//!
//! Every variant of [`Md2PdfError`] is fatal: the run stops at the first
//! one, after the intermediate HTML file has been removed. Failure of the
//! in-page math typesetting step is deliberately absent here; it is
//! reported as [`crate::pipeline::typeset::TypesetOutcome::Failed`]
//! and the PDF is still produced.
//!
//! The CLI maps errors to process exit codes through
//! [`Md2PdfError::exit_code`]: pandoc's own non-zero code is forwarded
//! verbatim, everything else exits with `1`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the markdown2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Converter errors ──────────────────────────────────────────────────
    /// pandoc could not be started at all.
    #[error("Failed to run '{program}': {source}\nIs pandoc installed? Set PANDOC_PATH or pass --pandoc.")]
    ConverterSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pandoc ran but exited non-zero (or was killed by a signal, reported as code 1).
    #[error("Pandoc failed with exit code {code}")]
    ConverterFailed {
        code: i32,
        stdout: String,
        stderr: String,
    },

    // ── Intermediate artifact ─────────────────────────────────────────────
    /// The temporary HTML file could not be created.
    #[error("Failed to create intermediate HTML file in '{dir}': {source}")]
    ArtifactCreate {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Browser errors ────────────────────────────────────────────────────
    /// Chromium could not be launched or the DevTools connection failed.
    #[error("Failed to launch headless browser: {0}\nSet CHROME_PATH or pass --browser.")]
    BrowserLaunch(String),

    /// The page could not be opened or navigated to the intermediate file.
    #[error("Failed to load '{url}' in the browser: {detail}")]
    Navigation { url: String, detail: String },

    /// The page did not reach network idle within the configured timeout.
    #[error("Page '{url}' did not become idle within {secs}s\nIncrease --load-timeout.")]
    LoadTimeout { url: String, secs: u64 },

    /// Printing the page to PDF failed.
    #[error("Failed to print PDF to '{path}': {detail}")]
    PrintFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or options-file validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Md2PdfError::ConverterFailed { code, .. } => *code,
            _ => 1,
        }
    }
}
