//! CLI binary for markdown2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, prints progress, and forwards pandoc's
//! output and exit code.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use markdown2pdf::{
    convert, Backend, ConversionConfig, ConversionOptions, ConversionProgressCallback,
    Md2PdfError, MathRenderer, PaperFormat, ProgressCallback, Stage, Typeset,
};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback ────────────────────────────────────────────────────

/// Prints the `Generating PDF...` line and, on a terminal, a spinner on
/// stderr naming the current stage.
struct CliProgressCallback {
    bar: Option<ProgressBar>,
}

impl CliProgressCallback {
    fn new(spinner: bool) -> Arc<Self> {
        let bar = spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar
        });
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, _input: &Path, _output: &Path) {
        println!("Generating PDF...");
        // Flushed so the line precedes anything pandoc or the browser prints.
        io::stdout().flush().ok();
    }

    fn on_stage_start(&self, stage: Stage) {
        if let Some(ref bar) = self.bar {
            let msg = match stage {
                Stage::Convert => "running pandoc…",
                Stage::Render => "printing in headless browser…",
                Stage::Cleanup => "removing temporary files…",
            };
            bar.set_prefix(stage.to_string());
            bar.set_message(msg);
            bar.enable_steady_tick(Duration::from_millis(80));
        }
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        if let Some(ref bar) = self.bar {
            bar.println(dim(&format!(
                "  {stage:<8} {:.1}s",
                elapsed_ms as f64 / 1000.0
            )));
        }
    }

    fn on_typeset_failed(&self, error: &str) {
        let line = format!("Math typesetting failed; PDF may contain raw TeX: {error}");
        match self.bar {
            Some(ref bar) => bar.println(red(&line)),
            None => eprintln!("{line}"),
        }
    }

    fn on_conversion_complete(&self, _output: &Path) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

// A failed run never reaches on_conversion_complete; clear the spinner anyway.
impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert to ./output.pdf using pandoc + headless Chromium
  markdown2pdf README.md

  # Explicit output path (positional or -o)
  markdown2pdf notes.md notes.pdf
  markdown2pdf notes.md -o notes.pdf

  # Let pandoc build the PDF through LaTeX (no browser)
  markdown2pdf --backend engine --engine lualatex --fontsize 12pt paper.md -o paper.pdf

  # MathJax instead of KaTeX, US Letter paper
  markdown2pdf --math mathjax --paper letter notes.md

  # Options from a JSON file ({"margin": "2cm", "fontsize": "12pt"})
  markdown2pdf --options layout.json notes.md

  # Check that pandoc and a browser can be found
  markdown2pdf --check

EXIT CODES:
  0   PDF generated
  N   pandoc failed with exit code N (forwarded verbatim)
  1   usage error or any other failure

ENVIRONMENT VARIABLES:
  PANDOC_PATH          Path to the pandoc executable
  CHROME_PATH          Path to a Chromium / Chrome executable
  MARKDOWN2PDF_*       Defaults for the corresponding flags (see --help)
  RUST_LOG             Log filter, overrides -v / -q
"#;

/// Convert Markdown files to PDF with pandoc and headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "markdown2pdf",
    version,
    about = "Convert Markdown files to PDF with pandoc and headless Chromium",
    long_about = "Convert a Markdown document to PDF. pandoc turns the Markdown (GitHub-flavoured, \
with $…$ math and raw HTML) into standalone HTML, which headless Chromium prints to PDF. \
With --backend engine, pandoc produces the PDF itself through a LaTeX/CSS engine.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    #[arg(required_unless_present = "check")]
    input: Option<PathBuf>,

    /// Output PDF path; takes precedence over -o. Default: output.pdf in the working directory.
    #[arg(value_name = "OUTPUT")]
    output_pos: Option<PathBuf>,

    /// Output PDF path.
    #[arg(short, long, env = "MARKDOWN2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Page margin passed to pandoc (and to the browser when it is a CSS length). Default: 1in.
    #[arg(long, env = "MARKDOWN2PDF_MARGIN")]
    margin: Option<String>,

    /// Base font size. Default: 11pt.
    #[arg(long, env = "MARKDOWN2PDF_FONTSIZE")]
    fontsize: Option<String>,

    /// PDF engine for --backend engine. Default: xelatex.
    #[arg(long, env = "MARKDOWN2PDF_ENGINE")]
    engine: Option<String>,

    /// JSON file with margin/fontsize/engine; flags override it.
    #[arg(long, env = "MARKDOWN2PDF_OPTIONS")]
    options: Option<PathBuf>,

    /// How the PDF is produced.
    #[arg(long, env = "MARKDOWN2PDF_BACKEND", value_enum, default_value = "browser")]
    backend: BackendArg,

    /// Stylesheet passed to pandoc.
    #[arg(long, env = "MARKDOWN2PDF_CSS", default_value = "style.css")]
    css: PathBuf,

    /// Do not pass any stylesheet (overrides --css).
    #[arg(long)]
    no_css: bool,

    /// Math library linked into the HTML.
    #[arg(long, env = "MARKDOWN2PDF_MATH", value_enum, default_value = "katex")]
    math: MathArg,

    /// Override the math library URL.
    #[arg(long, env = "MARKDOWN2PDF_MATH_URL")]
    math_url: Option<String>,

    /// JavaScript evaluated in the page before printing (failures are ignored).
    #[arg(long, env = "MARKDOWN2PDF_TYPESET_SCRIPT")]
    typeset_script: Option<String>,

    /// Skip the in-page typesetting step (overrides --typeset-script).
    #[arg(long)]
    no_typeset: bool,

    /// Paper size for the browser backend.
    #[arg(long, env = "MARKDOWN2PDF_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Give up if the page is not idle after this many seconds. Default: wait forever.
    #[arg(long, env = "MARKDOWN2PDF_LOAD_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    load_timeout: Option<u64>,

    /// pandoc executable.
    #[arg(long, env = "PANDOC_PATH")]
    pandoc: Option<PathBuf>,

    /// Chromium / Chrome executable.
    #[arg(long, env = "CHROME_PATH")]
    browser: Option<PathBuf>,

    /// Report where pandoc and the browser were found, then exit.
    #[arg(long)]
    check: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MARKDOWN2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress progress output except errors (overrides -v).
    #[arg(short, long, env = "MARKDOWN2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Browser,
    Engine,
}

impl From<BackendArg> for Backend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Browser => Backend::Browser,
            BackendArg::Engine => Backend::Engine,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum MathArg {
    Katex,
    Mathjax,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl From<PaperArg> for PaperFormat {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A3 => PaperFormat::A3,
            PaperArg::A4 => PaperFormat::A4,
            PaperArg::A5 => PaperFormat::A5,
            PaperArg::Letter => PaperFormat::Letter,
            PaperArg::Legal => PaperFormat::Legal,
            PaperArg::Tabloid => PaperFormat::Tabloid,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version are successes; every usage error exits 1.
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            err.print().ok();
            process::exit(code);
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} failed to start async runtime: {e}", red("Error:"));
            process::exit(1);
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(err) => report_error(&err),
    };
    drop(runtime);
    process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    if cli.check {
        return Ok(check_tools(&cli));
    }

    let input = cli
        .input
        .clone()
        .context("missing <INPUT> argument")?;
    let output = cli
        .output_pos
        .clone()
        .or_else(|| cli.output.clone())
        .unwrap_or_else(|| PathBuf::from("output.pdf"));

    if matches!(cli.backend, BackendArg::Engine)
        && !output
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    {
        tracing::warn!(
            "pandoc picks its output format from the extension; '{}' does not end in .pdf",
            output.display()
        );
    }

    let show_spinner = !cli.quiet && io::stderr().is_terminal();
    let progress: Option<ProgressCallback> = if cli.quiet {
        None
    } else {
        Some(CliProgressCallback::new(show_spinner) as Arc<dyn ConversionProgressCallback>)
    };

    let config = build_config(&cli, progress).await?;

    // On failure report_error forwards pandoc's streams instead.
    let report = convert(&input, &output, &config).await?;
    forward_streams(&report.converter.stdout, &report.converter.stderr);

    if !cli.quiet {
        println!("PDF generated: {}", report.output.display());
    }
    Ok(0)
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut options = match cli.options {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read options from {:?}", path))?;
            ConversionOptions::from_json_str(&json)
                .with_context(|| format!("Invalid options file {:?}", path))?
        }
        None => ConversionOptions::default(),
    };
    if let Some(ref margin) = cli.margin {
        options.margin = margin.clone();
    }
    if let Some(ref fontsize) = cli.fontsize {
        options.fontsize = fontsize.clone();
    }
    if let Some(ref engine) = cli.engine {
        options.engine = engine.clone();
    }

    let math = match cli.math {
        MathArg::Katex => MathRenderer::Katex(
            cli.math_url
                .clone()
                .unwrap_or_else(|| markdown2pdf::config::DEFAULT_KATEX_URL.to_string()),
        ),
        MathArg::Mathjax => MathRenderer::MathJax(cli.math_url.clone()),
    };

    let typeset = if cli.no_typeset {
        Typeset::Off
    } else if let Some(ref js) = cli.typeset_script {
        Typeset::Script(js.clone())
    } else {
        Typeset::Auto
    };

    let stylesheet = (!cli.no_css).then(|| cli.css.clone());

    let mut builder = ConversionConfig::builder()
        .options(options)
        .backend(cli.backend.into())
        .stylesheet(stylesheet)
        .math(math)
        .typeset(typeset)
        .paper(cli.paper.into());

    if let Some(ref pandoc) = cli.pandoc {
        builder = builder.pandoc(pandoc);
    }
    if let Some(ref browser) = cli.browser {
        builder = builder.browser_executable(browser);
    }
    if let Some(secs) = cli.load_timeout {
        builder = builder.load_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `--check`: report tool locations; exit 1 when pandoc is missing.
fn check_tools(cli: &Cli) -> i32 {
    let pandoc = match cli.pandoc {
        Some(ref p) => Ok(p.clone()),
        None => tool_probe::locate_pandoc(),
    };
    let browser = match cli.browser {
        Some(ref p) => Ok(p.clone()),
        None => tool_probe::locate_browser(),
    };

    let mut code = 0;
    match pandoc {
        Ok(path) => {
            let version = tool_probe::program_version(&path).unwrap_or_else(|| "?".into());
            println!("pandoc:   {}  ({})", path.display(), version);
        }
        Err(e) => {
            println!("pandoc:   {}", red("not found"));
            eprintln!("{e}");
            code = 1;
        }
    }
    match browser {
        Ok(path) => {
            let version = tool_probe::program_version(&path).unwrap_or_else(|| "?".into());
            println!("browser:  {}  ({})", path.display(), version);
        }
        Err(e) => {
            println!("browser:  {}  (only --backend engine will work)", red("not found"));
            eprintln!("{e}");
        }
    }
    code
}

fn forward_streams(stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        println!("{}", stdout.trim_end());
    }
    if !stderr.is_empty() {
        eprintln!("{}", stderr.trim_end());
    }
}

/// Print `err` and return the process exit code.
fn report_error(err: &anyhow::Error) -> i32 {
    if let Some(Md2PdfError::ConverterFailed {
        code,
        stdout,
        stderr,
    }) = err.downcast_ref::<Md2PdfError>()
    {
        forward_streams(stdout, stderr);
        println!("Pandoc failed with exit code {code}");
        return *code;
    }

    eprintln!("{} {err:#}", red("Error:"));
    err.downcast_ref::<Md2PdfError>()
        .map(Md2PdfError::exit_code)
        .unwrap_or(1)
}
