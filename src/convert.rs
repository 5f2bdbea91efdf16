//! Whole-batch conversion: preconditions, planning, and the pool run.
//!
//! ```text
//! scan(input) ──→ plan (jobs of one format) ──→ preview   (dry run, no writes)
//!                                           └─→ execute   (encoder + pool + summary)
//! ```
//!
//! Fatal conditions abort before any worker starts:
//!
//! | Condition | Error |
//! |---|---|
//! | input missing or not a directory | [`ConvertError::Scan`] |
//! | no files of the requested format | [`ConvertError::NoMatchingFiles`] |
//! | encoder not runnable | [`ConvertError::Encoder`] |
//! | output directory cannot be created | [`ConvertError::OutputDir`] |
//!
//! Everything after that is contained in per-job results.

use crate::encoder::{EncodeError, Encoder};
use crate::formats::{ImageFormat, Inventory};
use crate::naming::NamingOptions;
use crate::pool::{self, PoolError};
use crate::scan::{self, ScanError, ScanOutput};
use crate::summary::Summary;
use crate::types::{ConversionJob, ConversionResult};
use crate::unique_path::UniquePathError;
use crate::worker::{Worker, planned_destination};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("No .{format} files found in directory {input}")]
    NoMatchingFiles { format: ImageFormat, input: PathBuf },
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Encoder(#[from] EncodeError),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// What to convert and where.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input: PathBuf,
    /// Defaults to `input` when `None`.
    pub output: Option<PathBuf>,
    pub format: ImageFormat,
    pub naming: NamingOptions,
    pub workers: i64,
    /// Extension of produced files, without the dot.
    pub target_ext: String,
}

impl BatchRequest {
    pub fn output_dir(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// The selected jobs of a batch, before anything is written.
#[derive(Debug)]
pub struct BatchPlan {
    pub inventory: Inventory,
    pub jobs: Vec<ConversionJob>,
}

/// One dry-run line: where a source would be written.
#[derive(Debug)]
pub struct PlannedConversion {
    pub source: PathBuf,
    pub original_bytes: u64,
    pub destination: Result<PathBuf, UniquePathError>,
}

/// Scan the input and select the requested format.
pub fn plan(request: &BatchRequest) -> Result<BatchPlan, ConvertError> {
    let scanned = scan::scan(&request.input)?;
    plan_from_scan(request, scanned)
}

/// Select the requested format from an existing scan.
pub fn plan_from_scan(request: &BatchRequest, scanned: ScanOutput) -> Result<BatchPlan, ConvertError> {
    if !scanned.inventory.contains(request.format) {
        return Err(ConvertError::NoMatchingFiles {
            format: request.format,
            input: request.input.clone(),
        });
    }
    let jobs = scanned.files_of(request.format);
    Ok(BatchPlan {
        inventory: scanned.inventory,
        jobs,
    })
}

/// Resolve every job's destination without writing anything.
///
/// Names are synthesized and uniquified against the current output directory
/// exactly as a real run would, so timestamped names differ between calls.
pub fn preview(plan: &BatchPlan, request: &BatchRequest) -> Vec<PlannedConversion> {
    let output_dir = request.output_dir();
    plan.jobs
        .iter()
        .map(|job| PlannedConversion {
            source: job.path.clone(),
            original_bytes: job.size,
            destination: planned_destination(job, output_dir, &request.naming, &request.target_ext),
        })
        .collect()
}

/// Convert every planned job and return the totals.
///
/// `on_result` is called on the calling thread for each result as it arrives.
pub fn execute<E: Encoder + ?Sized>(
    plan: BatchPlan,
    request: &BatchRequest,
    encoder: &E,
    on_result: impl FnMut(&ConversionResult),
) -> Result<Summary, ConvertError> {
    encoder.check_available()?;

    let output_dir = request.output_dir();
    fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let workers = pool::effective_workers(request.workers);
    tracing::info!(
        jobs = plan.jobs.len(),
        format = %request.format,
        workers,
        output = %output_dir.display(),
        "starting conversion"
    );

    let worker = Worker::new(encoder, output_dir, &request.naming, &request.target_ext);
    let (tx, rx) = mpsc::channel();

    let (summary, dispatched) = std::thread::scope(|s| {
        let handle = s.spawn(|| pool::dispatch(plan.jobs, workers, &worker, tx));
        let summary = Summary::collect(rx, on_result);
        let dispatched = handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (summary, dispatched)
    });
    dispatched?;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "conversion finished"
    );
    Ok(summary)
}

/// [`plan`] then [`execute`].
pub fn convert<E: Encoder + ?Sized>(
    request: &BatchRequest,
    encoder: &E,
    on_result: impl FnMut(&ConversionResult),
) -> Result<Summary, ConvertError> {
    let plan = plan(request)?;
    execute(plan, request, encoder, on_result)
}
