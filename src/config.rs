//! Configuration types for Markdown-to-PDF conversion.
//!
//! Two layers:
//!
//! * [`ConversionOptions`] — the flat layout options (`margin`, `fontsize`,
//!   `engine`) handed to pandoc. Deserialisable from JSON; unknown keys are
//!   ignored and missing keys take their defaults.
//! * [`ConversionConfig`] — everything else that shapes a run: backend,
//!   stylesheet, math renderer, paper size, tool paths. Built via
//!   [`ConversionConfigBuilder`].

use crate::error::Md2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// KaTeX distribution pandoc links into the generated HTML.
pub const DEFAULT_KATEX_URL: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/";

/// Stylesheet looked up in the working directory when none is given.
pub const DEFAULT_STYLESHEET: &str = "style.css";

/// Layout options passed to pandoc as template variables.
///
/// Values are opaque strings: `"1in"`, `"2cm"`, `"12pt"`. Nothing is
/// validated here; pandoc and the PDF engine decide what they accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Page margin (`-V geometry:margin=…`). Default: `"1in"`.
    pub margin: String,
    /// Base font size (`-V fontsize=…`). Default: `"11pt"`.
    pub fontsize: String,
    /// PDF engine for the engine backend (`--pdf-engine=…`). Default: `"xelatex"`.
    pub engine: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            margin: "1in".to_string(),
            fontsize: "11pt".to_string(),
            engine: "xelatex".to_string(),
        }
    }
}

impl ConversionOptions {
    /// Parse options from a JSON object.
    ///
    /// ```rust
    /// use markdown2pdf::ConversionOptions;
    ///
    /// let opts = ConversionOptions::from_json_str(r#"{"fontsize": "12pt", "colour": "red"}"#).unwrap();
    /// assert_eq!(opts.fontsize, "12pt");
    /// assert_eq!(opts.margin, "1in");
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, Md2PdfError> {
        serde_json::from_str(json)
            .map_err(|e| Md2PdfError::InvalidConfig(format!("options: {e}")))
    }

    /// The margin in inches, if it is a plain CSS length (`in`, `cm`, `mm`, `pt`, `px`).
    pub fn margin_inches(&self) -> Option<f64> {
        css_length_inches(&self.margin)
    }
}

/// Convert a CSS absolute length such as `"2.5cm"` to inches.
pub fn css_length_inches(value: &str) -> Option<f64> {
    let value = value.trim();
    let split = value
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.trim().parse().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }

    let per_inch = match unit.trim().to_ascii_lowercase().as_str() {
        "in" => 1.0,
        "cm" => 2.54,
        "mm" => 25.4,
        "pt" => 72.0,
        "pc" => 6.0,
        "px" => 96.0,
        _ => return None,
    };
    Some(number / per_inch)
}

/// Configuration for a Markdown-to-PDF conversion.
///
/// # Example
/// ```rust
/// use markdown2pdf::{Backend, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .backend(Backend::Engine)
///     .engine("lualatex")
///     .fontsize("12pt")
///     .build()
///     .unwrap();
/// assert_eq!(config.options.engine, "lualatex");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Layout options forwarded to pandoc.
    pub options: ConversionOptions,

    /// How the PDF is produced. Default: [`Backend::Browser`].
    pub backend: Backend,

    /// pandoc executable. Default: `"pandoc"` (resolved on `PATH` by the OS).
    pub pandoc: PathBuf,

    /// Stylesheet handed to pandoc via `--css`. Relative paths resolve
    /// against the working directory. `None` disables styling.
    /// Default: `style.css`.
    pub stylesheet: Option<PathBuf>,

    /// Math rendering library linked into the HTML. Default: KaTeX.
    pub math: MathRenderer,

    /// In-page typesetting step. Default: [`Typeset::Auto`].
    pub typeset: Typeset,

    /// Paper size used when the browser prints. Default: A4.
    pub paper: PaperFormat,

    /// Chromium executable. `None` lets the browser layer pick one.
    pub browser_executable: Option<PathBuf>,

    /// Upper bound on waiting for network idle. `None` waits forever.
    pub load_timeout_secs: Option<u64>,

    /// Optional stage-level progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            options: ConversionOptions::default(),
            backend: Backend::default(),
            pandoc: PathBuf::from("pandoc"),
            stylesheet: Some(PathBuf::from(DEFAULT_STYLESHEET)),
            math: MathRenderer::default(),
            typeset: Typeset::default(),
            paper: PaperFormat::default(),
            browser_executable: None,
            load_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("options", &self.options)
            .field("backend", &self.backend)
            .field("pandoc", &self.pandoc)
            .field("stylesheet", &self.stylesheet)
            .field("math", &self.math)
            .field("typeset", &self.typeset)
            .field("paper", &self.paper)
            .field("browser_executable", &self.browser_executable)
            .field("load_timeout_secs", &self.load_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The script to evaluate in the page after load, if any.
    pub fn typeset_script(&self) -> Option<&str> {
        match &self.typeset {
            Typeset::Auto => self.math.default_typeset_script(),
            Typeset::Script(js) => Some(js.as_str()),
            Typeset::Off => None,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.config.options = options;
        self
    }

    pub fn margin(mut self, margin: impl Into<String>) -> Self {
        self.config.options.margin = margin.into();
        self
    }

    pub fn fontsize(mut self, fontsize: impl Into<String>) -> Self {
        self.config.options.fontsize = fontsize.into();
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.config.options.engine = engine.into();
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn pandoc(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.pandoc = program.into();
        self
    }

    pub fn stylesheet(mut self, path: Option<PathBuf>) -> Self {
        self.config.stylesheet = path;
        self
    }

    pub fn math(mut self, math: MathRenderer) -> Self {
        self.config.math = math;
        self
    }

    pub fn typeset(mut self, typeset: Typeset) -> Self {
        self.config.typeset = typeset;
        self
    }

    pub fn paper(mut self, paper: PaperFormat) -> Self {
        self.config.paper = paper;
        self
    }

    pub fn browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_executable = Some(path.into());
        self
    }

    pub fn load_timeout_secs(mut self, secs: u64) -> Self {
        self.config.load_timeout_secs = Some(secs);
        self
    }

    /// Attach a progress callback to receive stage events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if c.pandoc.as_os_str().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "pandoc program must not be empty".into(),
            ));
        }
        if c.load_timeout_secs == Some(0) {
            return Err(Md2PdfError::InvalidConfig(
                "load timeout must be ≥ 1 second".into(),
            ));
        }
        if let Typeset::Script(js) = &c.typeset {
            if js.trim().is_empty() {
                return Err(Md2PdfError::InvalidConfig(
                    "typeset script must not be empty".into(),
                ));
            }
        }
        if c.backend == Backend::Engine && c.options.engine.trim().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "engine backend needs a PDF engine name".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where the PDF comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// pandoc → standalone HTML → headless Chromium prints the PDF. (default)
    #[default]
    Browser,
    /// pandoc writes the PDF itself through `--pdf-engine`.
    Engine,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Browser => f.write_str("browser"),
            Backend::Engine => f.write_str("engine"),
        }
    }
}

/// Math library pandoc links into HTML output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathRenderer {
    /// `--katex=<url>`; renders itself on page load.
    Katex(String),
    /// `--mathjax[=<url>]`; typeset explicitly after load.
    MathJax(Option<String>),
}

impl Default for MathRenderer {
    fn default() -> Self {
        MathRenderer::Katex(DEFAULT_KATEX_URL.to_string())
    }
}

impl MathRenderer {
    /// The pandoc flag selecting this renderer.
    pub fn pandoc_flag(&self) -> String {
        match self {
            MathRenderer::Katex(url) => format!("--katex={url}"),
            MathRenderer::MathJax(Some(url)) => format!("--mathjax={url}"),
            MathRenderer::MathJax(None) => "--mathjax".to_string(),
        }
    }

    /// Script that typesets math once the page is idle.
    pub fn default_typeset_script(&self) -> Option<&'static str> {
        match self {
            MathRenderer::Katex(_) => None,
            MathRenderer::MathJax(_) => Some("MathJax.typesetPromise()"),
        }
    }
}

/// What to run in the page before printing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Typeset {
    /// Whatever the math renderer needs. (default)
    #[default]
    Auto,
    /// A custom JavaScript expression; promises are awaited.
    Script(String),
    /// Skip the step.
    Off,
}

/// Paper sizes understood by the browser print step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl PaperFormat {
    /// `(width, height)` in inches, portrait.
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PaperFormat::A3 => (11.69, 16.54),
            PaperFormat::A4 => (8.27, 11.69),
            PaperFormat::A5 => (5.83, 8.27),
            PaperFormat::Letter => (8.5, 11.0),
            PaperFormat::Legal => (8.5, 14.0),
            PaperFormat::Tabloid => (11.0, 17.0),
        }
    }
}
