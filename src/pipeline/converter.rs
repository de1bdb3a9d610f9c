//! Running the external document converter.
//!
//! [`DocumentConverter`] is the seam between the pipeline and pandoc. The
//! production implementation, [`PandocConverter`], starts pandoc as a child
//! process, waits for it to exit, and hands back whatever it printed along
//! with its exit status. Interpreting that status is the caller's job.

use crate::error::Md2PdfError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// One converter run: arguments, working directory, and the file it must produce.
#[derive(Debug, Clone)]
pub struct ConverterInvocation {
    /// Arguments after the program name.
    pub args: Vec<OsString>,
    /// Directory the converter runs in (the input document's directory).
    pub working_dir: PathBuf,
    /// The `-o` target, duplicated here for converters that don't parse `args`.
    pub target: PathBuf,
}

/// What the converter printed and how it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ConverterOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`Md2PdfError::ConverterFailed`].
    pub fn into_result(self) -> Result<Self, Md2PdfError> {
        if self.success() {
            return Ok(self);
        }
        Err(Md2PdfError::ConverterFailed {
            code: self.code.unwrap_or(1),
            stdout: self.stdout,
            stderr: self.stderr,
        })
    }
}

/// Anything that can turn a Markdown file into the invocation's target.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Run to completion. Only failure to *start* is an `Err`; a non-zero
    /// exit is reported through [`ConverterOutput::code`].
    async fn run(&self, invocation: &ConverterInvocation) -> Result<ConverterOutput, Md2PdfError>;
}

/// Runs pandoc (or a wrapper around it) as a child process.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before pandoc's own, for launchers such as
    /// `docker run --rm -v … pandoc/core` or `sh -c <script> pandoc`.
    pub fn leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    async fn run(&self, invocation: &ConverterInvocation) -> Result<ConverterOutput, Md2PdfError> {
        info!("Running {}", self.program.display());
        debug!("pandoc args: {:?}", invocation.args);

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| Md2PdfError::ConverterSpawn {
                program: self.program.clone(),
                source,
            })?;

        let result = ConverterOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("pandoc exited with {:?}", result.code);
        Ok(result)
    }
}
