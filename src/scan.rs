//! Directory scanning and format classification.
//!
//! Walks the input tree once and produces an inventory of every supported
//! image file, plus a count per normalized format. The walk is sequential.
//!
//! ## Classification
//!
//! ```text
//! input/
//! ├── a.JPEG            → jpg
//! ├── b.jpg             → jpg
//! ├── scans/
//! │   └── c.tiff        → tiff
//! ├── notes.txt         (ignored: not an image format)
//! ├── README            (ignored: no extension)
//! └── link.png -> …     (ignored: symlinks are not followed or classified)
//! ```
//!
//! ## Errors
//!
//! Only a failure to start the walk is returned to the caller (missing root,
//! root is a file). Unreadable entries further down are logged and skipped.

use crate::formats::{ImageFormat, Inventory, split_extension};
use crate::types::FileDescriptor;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Everything discovered under a scan root.
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub files: Vec<FileDescriptor>,
    pub inventory: Inventory,
}

impl ScanOutput {
    /// The files of one format, in walk order.
    pub fn files_of(&self, format: ImageFormat) -> Vec<FileDescriptor> {
        self.files
            .iter()
            .filter(|f| f.format == format)
            .cloned()
            .collect()
    }
}

pub fn scan(root: &Path) -> Result<ScanOutput, ScanError> {
    let meta = fs::metadata(root).map_err(|source| ScanError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut output = ScanOutput::default();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err.path().map(|p| p.display().to_string());
                tracing::warn!(path = path.as_deref().unwrap_or("?"), "skip: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(format) = classify(entry.path()) else {
            continue;
        };

        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(path = %entry.path().display(), "can't stat: {err}");
                continue;
            }
        };
        let modified = modified_or_epoch(entry.path(), meta.modified());

        output.inventory.record(format);
        output.files.push(FileDescriptor {
            path: entry.into_path(),
            modified,
            format,
            size: meta.len(),
        });
    }

    tracing::debug!(
        root = %root.display(),
        files = output.files.len(),
        "scan complete"
    );
    Ok(output)
}

/// The file's mtime, or the Unix epoch when the platform can't report one.
fn modified_or_epoch(path: &Path, modified: io::Result<SystemTime>) -> SystemTime {
    modified.unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), "no modification time, using epoch: {err}");
        UNIX_EPOCH
    })
}

/// Normalized format of a path, or `None` for unsupported or missing extensions.
fn classify(path: &Path) -> Option<ImageFormat> {
    let (_, ext) = split_extension(path.file_name()?);
    ImageFormat::from_extension(ext?.to_str()?)
}
