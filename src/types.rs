//! Types passed between the scan, worker, and summary stages.
//!
//! A [`FileDescriptor`] is created by the scanner and never mutated. The job
//! list handed to the pool is a filtered `Vec` of them ([`ConversionJob`]),
//! and every job comes back as exactly one [`ConversionResult`].

use crate::formats::ImageFormat;
use crate::worker::JobError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One discovered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub format: ImageFormat,
    /// Size in bytes at scan time.
    pub size: u64,
}

/// A file selected for conversion.
pub type ConversionJob = FileDescriptor;

/// Placement details of a committed conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub destination: PathBuf,
    pub converted_bytes: u64,
}

/// Outcome of one job.
///
/// The destination and the converted size live together in [`Converted`],
/// so a result has either both or neither.
#[derive(Debug)]
pub struct ConversionResult {
    pub source: PathBuf,
    pub original_bytes: u64,
    pub outcome: Result<Converted, JobError>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn destination(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(|c| c.destination.as_path())
    }

    pub fn converted_bytes(&self) -> Option<u64> {
        self.outcome.as_ref().ok().map(|c| c.converted_bytes)
    }
}
