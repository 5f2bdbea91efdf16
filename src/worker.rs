//! Per-job conversion: name, encode to a temp file, then move into place.
//!
//! ```text
//! Queued → NamingResolved → TempWritten → EncodeAttempted → Committed
//!               │                │               │              │
//!               └────────────────┴───────────────┴──────────────┴──→ Failed
//! ```
//!
//! The temp file lives in the same directory as the destination so the final
//! move is a same-filesystem rename whenever possible. It is held as a
//! [`TempPath`], which deletes the file when dropped; a successful rename is
//! the only way it survives. Every exit path, including a copy fallback or
//! any failure, therefore leaves no temp file behind.

use crate::encoder::{EncodeError, Encoder};
use crate::naming::{self, NamingOptions};
use crate::types::{ConversionJob, ConversionResult, Converted};
use crate::unique_path::{UniquePathError, unique_path};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, PathPersistError, TempPath};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("unique output path fail: {0}")]
    UniqueName(#[from] UniquePathError),
    #[error("create temp file in {dir}: {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("encoding {destination} failed: {source}")]
    Encode {
        destination: PathBuf,
        #[source]
        source: EncodeError,
    },
    #[error("save output {destination} failed: rename: {rename}, copy: {copy}")]
    Save {
        destination: PathBuf,
        rename: io::Error,
        copy: io::Error,
    },
    #[error("stat output {destination} failed: {source}")]
    Stat {
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Prefix of in-progress temp files for a given output extension.
pub fn temp_prefix(target_ext: &str) -> String {
    format!("{target_ext}_tmp_")
}

/// Whether `file_name` looks like one of this crate's temp files.
pub fn is_temp_file(file_name: &str, target_ext: &str) -> bool {
    file_name.starts_with(&temp_prefix(target_ext)) && file_name.ends_with(&format!(".{target_ext}"))
}

/// Name the job's output and resolve it against existing files.
///
/// Shared by the worker and the dry-run preview; does not write anything.
pub fn planned_destination(
    job: &ConversionJob,
    output_dir: &Path,
    naming: &NamingOptions,
    target_ext: &str,
) -> Result<PathBuf, UniquePathError> {
    let name = naming::output_filename(job, naming, target_ext);
    unique_path(&output_dir.join(name))
}

/// Everything a worker needs to run jobs. Holds no per-job state.
pub struct Worker<'a, E: Encoder + ?Sized> {
    encoder: &'a E,
    output_dir: &'a Path,
    naming: &'a NamingOptions,
    target_ext: &'a str,
}

impl<'a, E: Encoder + ?Sized> Worker<'a, E> {
    pub fn new(
        encoder: &'a E,
        output_dir: &'a Path,
        naming: &'a NamingOptions,
        target_ext: &'a str,
    ) -> Self {
        Self {
            encoder,
            output_dir,
            naming,
            target_ext,
        }
    }

    /// Run one job to completion. Always yields exactly one result.
    pub fn run(&self, job: ConversionJob) -> ConversionResult {
        tracing::debug!(source = %job.path.display(), "job started");
        let outcome = self.convert(&job);
        match &outcome {
            Ok(done) => tracing::debug!(
                source = %job.path.display(),
                destination = %done.destination.display(),
                bytes = done.converted_bytes,
                "job committed"
            ),
            Err(err) => tracing::warn!(source = %job.path.display(), "job failed: {err}"),
        }
        ConversionResult {
            source: job.path,
            original_bytes: job.size,
            outcome,
        }
    }

    fn convert(&self, job: &ConversionJob) -> Result<Converted, JobError> {
        let destination = planned_destination(job, self.output_dir, self.naming, self.target_ext)?;

        let dir = destination.parent().unwrap_or(self.output_dir);
        let temp = create_temp(dir, self.target_ext)?;

        self.encoder
            .encode(&job.path, &temp)
            .map_err(|source| JobError::Encode {
                destination: destination.clone(),
                source,
            })?;

        place_output(temp, &destination)?;
        let converted_bytes = output_size(&destination)?;

        Ok(Converted {
            destination,
            converted_bytes,
        })
    }
}

fn create_temp(dir: &Path, target_ext: &str) -> Result<TempPath, JobError> {
    tempfile::Builder::new()
        .prefix(&temp_prefix(target_ext))
        .suffix(&format!(".{target_ext}"))
        .tempfile_in(dir)
        .map(NamedTempFile::into_temp_path)
        .map_err(|source| JobError::TempFile {
            dir: dir.to_path_buf(),
            source,
        })
}

/// Move `temp` to `destination`: rename first, byte copy if that fails.
///
/// `temp` is consumed; if it was not renamed away it is deleted on return.
fn place_output(temp: TempPath, destination: &Path) -> Result<(), JobError> {
    let PathPersistError {
        error: rename,
        path: temp,
    } = match temp.persist(destination) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    tracing::debug!(
        destination = %destination.display(),
        "rename failed ({rename}), falling back to copy"
    );
    match copy_file(&temp, destination) {
        Ok(_) => Ok(()),
        Err(copy) => Err(JobError::Save {
            destination: destination.to_path_buf(),
            rename,
            copy,
        }),
    }
}

fn output_size(destination: &Path) -> Result<u64, JobError> {
    fs::metadata(destination)
        .map(|meta| meta.len())
        .map_err(|source| JobError::Stat {
            destination: destination.to_path_buf(),
            source,
        })
}

/// Copy `src` to a new file at `dst`, synced to disk before returning.
///
/// Never overwrites: `dst` must not exist. A partially written `dst` is removed.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut output = OpenOptions::new().write(true).create_new(true).open(dst)?;

    let result = io::copy(&mut input, &mut output).and_then(|n| output.sync_all().map(|()| n));
    if result.is_err() {
        drop(output);
        let _ = fs::remove_file(dst);
    }
    result
}
