//! Conversion entry points.
//!
//! [`Pipeline`] runs one Markdown → PDF conversion:
//!
//! ```text
//! build command → pandoc → [Chromium print] → remove temp HTML → report
//! ```
//!
//! The first failure ends the run; nothing is retried. The intermediate
//! HTML file is removed on every path out, including errors from the
//! browser step.

use crate::config::{Backend, ConversionConfig};
use crate::error::Md2PdfError;
use crate::pipeline::artifact::IntermediateArtifact;
use crate::pipeline::browser::{ChromiumRenderer, PdfRenderer, RenderJob};
use crate::pipeline::command;
use crate::pipeline::converter::{
    ConverterInvocation, ConverterOutput, DocumentConverter, PandocConverter,
};
use crate::pipeline::typeset::TypesetOutcome;
use crate::progress::Stage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// What a successful run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Absolute input path.
    pub input: PathBuf,
    /// Absolute path of the written PDF.
    pub output: PathBuf,
    pub backend: Backend,
    /// pandoc's captured output; forward it to the user.
    pub converter: ConverterOutput,
    /// Outcome of the in-page typesetting step.
    pub typeset: TypesetOutcome,
    pub duration_ms: u64,
}

/// A configured converter/renderer pair.
pub struct Pipeline {
    config: ConversionConfig,
    converter: Box<dyn DocumentConverter>,
    renderer: Box<dyn PdfRenderer>,
}

impl Pipeline {
    /// pandoc from `config.pandoc`, Chromium from `config.browser_executable`
    /// (or whatever is installed).
    pub fn new(config: ConversionConfig) -> Self {
        let converter = PandocConverter::new(&config.pandoc);
        let renderer = ChromiumRenderer::from_config(&config);
        Self {
            config,
            converter: Box::new(converter),
            renderer: Box::new(renderer),
        }
    }

    /// Replace the document converter.
    pub fn with_converter(mut self, converter: impl DocumentConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Replace the PDF renderer used by the browser backend.
    pub fn with_renderer(mut self, renderer: impl PdfRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert `input` (Markdown) into `output` (PDF).
    ///
    /// # Errors
    /// * [`Md2PdfError::ConverterFailed`] — pandoc exited non-zero; the
    ///   browser step was not attempted and no PDF was written by us.
    /// * [`Md2PdfError::ConverterSpawn`] — pandoc could not be started.
    /// * browser variants — launching, loading or printing failed.
    pub async fn run(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<ConversionReport, Md2PdfError> {
        let start = Instant::now();
        let cb = self.config.progress_callback.as_ref();

        let cwd = std::env::current_dir()
            .map_err(|e| Md2PdfError::Internal(format!("working directory: {e}")))?;
        let input = absolute(input.as_ref())?;
        let output = absolute(output.as_ref())?;
        info!(
            "Converting {} → {} ({} backend)",
            input.display(),
            output.display(),
            self.config.backend
        );
        if let Some(cb) = cb {
            cb.on_conversion_start(&input, &output);
        }

        // ── Build command ────────────────────────────────────────────────
        let artifact = match self.config.backend {
            Backend::Browser => Some(IntermediateArtifact::create_beside(&input)?),
            Backend::Engine => None,
        };
        let target = artifact
            .as_ref()
            .map(|a| a.path().to_path_buf())
            .unwrap_or_else(|| output.clone());

        let stylesheet = command::resolve_stylesheet(&self.config, &cwd);
        let invocation = ConverterInvocation {
            args: command::build_pandoc_args(&input, &target, stylesheet.as_deref(), &self.config)?,
            working_dir: working_dir(&input, &cwd),
            target,
        };

        // ── Run converter ────────────────────────────────────────────────
        let converter = self
            .timed(Stage::Convert, self.converter.run(&invocation))
            .await?
            .into_result()?;

        // ── Render (browser backend) ─────────────────────────────────────
        let typeset = match artifact {
            Some(artifact) => {
                let job = RenderJob::from_config(artifact.path(), &output, &self.config);
                let rendered = self.timed(Stage::Render, self.renderer.render(&job)).await;

                // ── Cleanup ──────────────────────────────────────────────
                if let Some(cb) = cb {
                    cb.on_stage_start(Stage::Cleanup);
                }
                let cleanup_start = Instant::now();
                match artifact.remove() {
                    Ok(path) => debug!("Removed {}", path.display()),
                    Err(e) => debug!("Intermediate file cleanup: {}", e),
                }
                if let Some(cb) = cb {
                    cb.on_stage_complete(Stage::Cleanup, elapsed_ms(cleanup_start));
                }

                let typeset = rendered?;
                if let (TypesetOutcome::Failed(msg), Some(cb)) = (&typeset, cb) {
                    cb.on_typeset_failed(msg);
                }
                typeset
            }
            None => TypesetOutcome::Skipped,
        };

        // ── Report ───────────────────────────────────────────────────────
        let report = ConversionReport {
            input,
            output,
            backend: self.config.backend,
            converter,
            typeset,
            duration_ms: elapsed_ms(start),
        };
        info!(
            "PDF written to {} in {}ms",
            report.output.display(),
            report.duration_ms
        );
        if let Some(cb) = cb {
            cb.on_conversion_complete(&report.output);
        }
        Ok(report)
    }

    /// Await `fut` as `stage`, firing progress events around it.
    async fn timed<T>(
        &self,
        stage: Stage,
        fut: impl std::future::Future<Output = Result<T, Md2PdfError>>,
    ) -> Result<T, Md2PdfError> {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();
        let result = fut.await;
        if let (Ok(_), Some(cb)) = (&result, cb) {
            cb.on_stage_complete(stage, elapsed_ms(start));
        }
        result
    }
}

/// Convert a Markdown file to PDF with the default collaborators.
///
/// # Example
/// ```rust,no_run
/// use markdown2pdf::{convert, ConversionConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let report = convert("README.md", "README.pdf", &ConversionConfig::default()).await?;
///     println!("PDF generated: {}", report.output.display());
///     Ok(())
/// }
/// ```
pub async fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, Md2PdfError> {
    Pipeline::new(config.clone()).run(input, output).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary single-threaded tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, Md2PdfError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, output, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn absolute(path: &Path) -> Result<PathBuf, Md2PdfError> {
    std::path::absolute(path)
        .map_err(|e| Md2PdfError::InvalidConfig(format!("path '{}': {e}", path.display())))
}

/// pandoc runs in the input's directory when it exists, else in `cwd`.
fn working_dir(input: &Path, cwd: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if dir.is_dir() => dir.to_path_buf(),
        _ => cwd.to_path_buf(),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_invalid() {
        assert!(matches!(
            absolute(Path::new("")),
            Err(Md2PdfError::InvalidConfig(_))
        ));
    }

    #[test]
    fn working_dir_falls_back_to_cwd() {
        let cwd = Path::new("/");
        let wd = working_dir(Path::new("/definitely/not/here/a.md"), cwd);
        assert_eq!(wd, PathBuf::from("/"));
    }

    #[test]
    fn working_dir_is_input_parent() {
        let dir = tempfile::tempdir().unwrap();
        let wd = working_dir(&dir.path().join("a.md"), Path::new("/"));
        assert_eq!(wd, dir.path());
    }
}
