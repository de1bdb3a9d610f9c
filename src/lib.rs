//! # markdown2pdf
//!
//! Convert Markdown documents to PDF by driving two external tools:
//! [pandoc](https://pandoc.org) for Markdown → HTML (or straight to PDF
//! through a LaTeX/CSS engine) and headless Chromium for HTML → PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Command  build pandoc's argv (GFM + $math$ + raw HTML, css, margins)
//!  ├─ 2. Convert  run pandoc, capture stdout/stderr/exit code
//!  ├─ 3. Render   Chromium: file:// → network idle → typeset → print (browser backend)
//!  ├─ 4. Cleanup  remove the intermediate *.tmp.html
//!  └─ 5. Report   output path, pandoc output, typeset outcome
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use markdown2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().fontsize("12pt").build()?;
//!     let report = convert("notes.md", "notes.pdf", &config).await?;
//!     println!("PDF generated: {}", report.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! | Backend   | Tools               | Notes |
//! |-----------|---------------------|-------|
//! | `browser` | pandoc + Chromium   | Default. KaTeX/MathJax math, CSS styling |
//! | `engine`  | pandoc + PDF engine | `xelatex` by default; no browser needed |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `markdown2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Backend, ConversionConfig, ConversionConfigBuilder, ConversionOptions, MathRenderer,
    PaperFormat, Typeset,
};
pub use convert::{convert, convert_sync, ConversionReport, Pipeline};
pub use error::Md2PdfError;
pub use pipeline::browser::{ChromiumRenderer, PdfRenderer, RenderJob};
pub use pipeline::converter::{
    ConverterInvocation, ConverterOutput, DocumentConverter, PandocConverter,
};
pub use pipeline::typeset::TypesetOutcome;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
