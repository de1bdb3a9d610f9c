//! pandoc argument-vector construction.
//!
//! Pure functions only: given the resolved paths and the configuration,
//! produce the exact `argv` (minus the program) pandoc is started with.
//! Tests assert on this vector directly.

use crate::config::{Backend, ConversionConfig, DEFAULT_STYLESHEET};
use crate::error::Md2PdfError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use url::Url;

/// Markdown dialect pandoc reads: GitHub-flavoured, `$…$` math, raw HTML passthrough.
pub const INPUT_FORMAT: &str = "gfm+tex_math_dollars+raw_html";

/// Build pandoc's arguments for converting `input` into `target`.
///
/// `stylesheet` must already be resolved and known to exist; pass `None`
/// to omit `--css`.
pub fn build_pandoc_args(
    input: &Path,
    target: &Path,
    stylesheet: Option<&Path>,
    config: &ConversionConfig,
) -> Result<Vec<OsString>, Md2PdfError> {
    let input_dir = input.parent().unwrap_or_else(|| Path::new("/"));
    let base_url = Url::from_directory_path(input_dir).map_err(|_| {
        Md2PdfError::InvalidConfig(format!(
            "cannot build a file:// URL for '{}'",
            input_dir.display()
        ))
    })?;

    let mut args: Vec<OsString> = vec![
        input.into(),
        format!("--from={INPUT_FORMAT}").into(),
        "--standalone".into(),
    ];

    match config.backend {
        Backend::Browser => {
            args.push("--to=html5".into());
            args.push(config.math.pandoc_flag().into());
        }
        Backend::Engine => {
            args.push(format!("--pdf-engine={}", config.options.engine).into());
        }
    }

    args.push(format!("--metadata=base_url={base_url}").into());
    args.push(prefixed("--resource-path=", input_dir));

    if let Some(css) = stylesheet {
        args.push(prefixed("--css=", css));
    }

    args.push("-V".into());
    args.push(format!("geometry:margin={}", config.options.margin).into());
    args.push("-V".into());
    args.push(format!("fontsize={}", config.options.fontsize).into());
    args.push("-o".into());
    args.push(target.into());

    Ok(args)
}

/// Resolve the configured stylesheet against `cwd`, dropping it if missing.
///
/// A missing default `style.css` is routine and only logged at debug level.
pub fn resolve_stylesheet(config: &ConversionConfig, cwd: &Path) -> Option<PathBuf> {
    let configured = config.stylesheet.as_ref()?;
    let css = if configured.is_absolute() {
        configured.clone()
    } else {
        cwd.join(configured)
    };

    if css.is_file() {
        return Some(css);
    }
    if configured.as_path() == Path::new(DEFAULT_STYLESHEET) {
        tracing::debug!(
            "No {} in {}, continuing without a stylesheet",
            DEFAULT_STYLESHEET,
            cwd.display()
        );
    } else {
        tracing::warn!("Stylesheet not found, continuing without it: {}", css.display());
    }
    None
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MathRenderer, DEFAULT_KATEX_URL};
    use std::io;
    use std::sync::{Arc, Mutex};

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[cfg(unix)]
    #[test]
    fn browser_backend_args() {
        let config = ConversionConfig::default();
        let args = build_pandoc_args(
            Path::new("/docs/guide.md"),
            Path::new("/docs/guide.x1.tmp.html"),
            Some(Path::new("/work/style.css")),
            &config,
        )
        .unwrap();

        assert_eq!(
            strings(&args),
            vec![
                "/docs/guide.md".to_string(),
                "--from=gfm+tex_math_dollars+raw_html".into(),
                "--standalone".into(),
                "--to=html5".into(),
                format!("--katex={DEFAULT_KATEX_URL}"),
                "--metadata=base_url=file:///docs/".into(),
                "--resource-path=/docs".into(),
                "--css=/work/style.css".into(),
                "-V".into(),
                "geometry:margin=1in".into(),
                "-V".into(),
                "fontsize=11pt".into(),
                "-o".into(),
                "/docs/guide.x1.tmp.html".into(),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn engine_backend_uses_pdf_engine_and_no_math_flag() {
        let config = ConversionConfig::builder()
            .backend(Backend::Engine)
            .engine("lualatex")
            .margin("2cm")
            .fontsize("12pt")
            .build()
            .unwrap();
        let args = strings(
            &build_pandoc_args(Path::new("/d/a.md"), Path::new("/out/a.pdf"), None, &config)
                .unwrap(),
        );

        assert!(args.contains(&"--pdf-engine=lualatex".to_string()));
        assert!(args.contains(&"geometry:margin=2cm".to_string()));
        assert!(args.contains(&"fontsize=12pt".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--to=")));
        assert!(!args.iter().any(|a| a.starts_with("--katex")));
        assert!(!args.iter().any(|a| a.starts_with("--css")));
        assert_eq!(args[args.len() - 2..], ["-o", "/out/a.pdf"]);
    }

    #[cfg(unix)]
    #[test]
    fn mathjax_flag() {
        let config = ConversionConfig::builder()
            .math(MathRenderer::MathJax(None))
            .build()
            .unwrap();
        let args = strings(
            &build_pandoc_args(Path::new("/d/a.md"), Path::new("/d/a.html"), None, &config)
                .unwrap(),
        );
        assert!(args.contains(&"--mathjax".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn base_url_escapes_spaces() {
        let config = ConversionConfig::default();
        let args = strings(
            &build_pandoc_args(
                Path::new("/my docs/a.md"),
                Path::new("/my docs/a.html"),
                None,
                &config,
            )
            .unwrap(),
        );
        assert!(args.contains(&"--metadata=base_url=file:///my%20docs/".to_string()));
        assert!(args.contains(&"--resource-path=/my docs".to_string()));
    }

    #[test]
    fn missing_stylesheet_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::default();
        assert_eq!(resolve_stylesheet(&config, dir.path()), None);
    }

    #[test]
    fn relative_stylesheet_resolves_against_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
        let config = ConversionConfig::default();
        assert_eq!(
            resolve_stylesheet(&config, dir.path()),
            Some(dir.path().join("style.css"))
        );
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logs_while(f: impl FnOnce()) -> String {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn missing_default_stylesheet_logs_at_debug() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::default();
        let logs = logs_while(|| assert_eq!(resolve_stylesheet(&config, dir.path()), None));
        assert!(logs.contains("DEBUG"), "logs: {logs}");
        assert!(!logs.contains("WARN"), "logs: {logs}");
    }

    #[test]
    fn missing_explicit_stylesheet_warns() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .stylesheet(Some(PathBuf::from("print.css")))
            .build()
            .unwrap();
        let logs = logs_while(|| assert_eq!(resolve_stylesheet(&config, dir.path()), None));
        assert!(logs.contains("WARN"), "logs: {logs}");
        assert!(logs.contains("print.css"), "logs: {logs}");
    }

    #[test]
    fn disabled_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();
        let config = ConversionConfig::builder().stylesheet(None).build().unwrap();
        assert_eq!(resolve_stylesheet(&config, dir.path()), None);
    }
}
