//! # tool-probe
//!
//! Locate the external programs `markdown2pdf` drives — [pandoc](https://pandoc.org)
//! and a Chromium-family browser — without making users hard-code paths.
//!
//! ## How it works
//!
//! On a call to [`locate_pandoc`] or [`locate_browser`]:
//!
//! 1. An environment override (`PANDOC_PATH` / `CHROME_PATH`) wins when it
//!    points at an existing file.
//! 2. Otherwise each candidate name is looked up in every `PATH` directory,
//!    with the platform executable suffix appended (`.exe` on Windows).
//! 3. For browsers, well-known application bundle paths are tried last.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tool_probe::{locate_pandoc, program_version};
//!
//! let pandoc = locate_pandoc().expect("pandoc not installed");
//! if let Some(v) = program_version(&pandoc) {
//!     println!("using {v}");
//! }
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PANDOC_PATH` — path to the pandoc executable.
//! - `CHROME_PATH` — path to a Chromium / Chrome executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable overriding the pandoc executable.
pub const PANDOC_ENV: &str = "PANDOC_PATH";

/// Environment variable overriding the browser executable.
pub const BROWSER_ENV: &str = "CHROME_PATH";

/// Browser executable names tried on `PATH`, in order.
pub const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Installed application bundles checked when nothing is on `PATH`.
const BROWSER_BUNDLES: &[&str] = &[
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by tool-probe lookups.
#[derive(Error, Debug)]
pub enum ToolProbeError {
    /// The environment override is set but names a file that does not exist.
    #[error("{var} points to '{path}', which does not exist")]
    BadOverride { var: &'static str, path: PathBuf },

    /// No candidate was found on `PATH` or in the well-known locations.
    #[error("Could not find {tool} on PATH (tried: {tried})\nSet {var} to its full path.")]
    NotFound {
        tool: &'static str,
        tried: String,
        var: &'static str,
    },
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Find the pandoc executable.
pub fn locate_pandoc() -> Result<PathBuf, ToolProbeError> {
    if let Some(path) = env_override(PANDOC_ENV)? {
        return Ok(path);
    }
    search_path_env("pandoc").ok_or(ToolProbeError::NotFound {
        tool: "pandoc",
        tried: "pandoc".to_string(),
        var: PANDOC_ENV,
    })
}

/// Find a Chromium-family browser executable.
pub fn locate_browser() -> Result<PathBuf, ToolProbeError> {
    if let Some(path) = env_override(BROWSER_ENV)? {
        return Ok(path);
    }

    for name in BROWSER_CANDIDATES {
        if let Some(found) = search_path_env(name) {
            return Ok(found);
        }
    }

    if let Some(bundle) = BROWSER_BUNDLES.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Ok(bundle);
    }

    Err(ToolProbeError::NotFound {
        tool: "a Chromium browser",
        tried: BROWSER_CANDIDATES.join(", "),
        var: BROWSER_ENV,
    })
}

/// Look `name` up in each of `dirs`, returning the first existing file.
///
/// The platform executable suffix is appended when `name` has none, so
/// `search_path("pandoc", ..)` finds `pandoc.exe` on Windows.
pub fn search_path<I, P>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let file_name = executable_name(name);
    dirs.into_iter()
        .map(|dir| dir.as_ref().join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// Run `<program> --version` and return the first line of its stdout.
///
/// Returns `None` if the program cannot be spawned, exits non-zero, or
/// prints nothing.
pub fn program_version(program: impl AsRef<OsStr>) -> Option<String> {
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn env_override(var: &'static str) -> Result<Option<PathBuf>, ToolProbeError> {
    match std::env::var_os(var) {
        Some(value) if !value.is_empty() => {
            let path = PathBuf::from(value);
            if path.is_file() {
                Ok(Some(path))
            } else {
                Err(ToolProbeError::BadOverride { var, path })
            }
        }
        _ => Ok(None),
    }
}

fn search_path_env(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    search_path(name, std::env::split_paths(&path))
}

fn executable_name(name: &str) -> String {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() || name.ends_with(suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_path_finds_first_match() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let name = executable_name("pandoc");
        std::fs::write(second.path().join(&name), b"").unwrap();

        let found = search_path("pandoc", [first.path(), second.path()]);
        assert_eq!(found, Some(second.path().join(&name)));
    }

    #[test]
    fn search_path_prefers_earlier_dirs() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let name = executable_name("chromium");
        std::fs::write(first.path().join(&name), b"").unwrap();
        std::fs::write(second.path().join(&name), b"").unwrap();

        let found = search_path("chromium", [first.path(), second.path()]);
        assert_eq!(found, Some(first.path().join(&name)));
    }

    #[test]
    fn search_path_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(executable_name("pandoc"))).unwrap();
        assert_eq!(search_path("pandoc", [dir.path()]), None);
    }

    #[test]
    fn search_path_empty_dirs() {
        assert_eq!(search_path("pandoc", Vec::<PathBuf>::new()), None);
    }

    #[test]
    fn program_version_missing_program() {
        assert_eq!(program_version("/definitely/not/a/real/program"), None);
    }

    #[test]
    fn not_found_display_names_override_var() {
        let e = ToolProbeError::NotFound {
            tool: "pandoc",
            tried: "pandoc".into(),
            var: PANDOC_ENV,
        };
        let msg = e.to_string();
        assert!(msg.contains("PANDOC_PATH"), "got: {msg}");
    }
}
