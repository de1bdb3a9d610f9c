//! The intermediate HTML file handed from pandoc to the browser.
//!
//! The file lives beside the input document so relative image and
//! stylesheet references in the generated HTML resolve the same way they do
//! in the Markdown. It is named `<stem>.<random>.tmp.html`; the random part
//! keeps concurrent runs on the same document apart.
//!
//! Removal is tied to [`tempfile::TempPath`]: dropping the artifact deletes
//! the file, so every early return and `?` in the pipeline cleans up.
//! [`IntermediateArtifact::remove`] does the same explicitly and reports
//! the outcome.

use crate::error::Md2PdfError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Temporary HTML file, deleted on drop.
#[derive(Debug)]
pub struct IntermediateArtifact {
    path: TempPath,
}

impl IntermediateArtifact {
    /// Create an empty artifact next to `input`.
    ///
    /// Falls back to the system temp directory when the input's directory
    /// does not exist, so that pandoc still gets to report the missing input.
    pub fn create_beside(input: &Path) -> Result<Self, Md2PdfError> {
        let dir = match input.parent() {
            Some(parent) if parent.is_dir() => parent.to_path_buf(),
            _ => std::env::temp_dir(),
        };
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let file = tempfile::Builder::new()
            .prefix(&format!("{stem}."))
            .suffix(".tmp.html")
            .tempfile_in(&dir)
            .map_err(|source| Md2PdfError::ArtifactCreate {
                dir: dir.clone(),
                source,
            })?;

        let path = file.into_temp_path();
        debug!("Intermediate HTML: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A file that is already gone counts as removed.
    pub fn remove(self) -> io::Result<PathBuf> {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(path),
            Err(e) => {
                warn!("Could not remove {}: {}", path.display(), e);
                Err(e)
            }
        }
    }
}
