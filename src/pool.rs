//! Worker pool: fan jobs out to N threads, fan results back over a channel.
//!
//! Each batch gets its own rayon thread pool sized to the requested worker
//! count, so a slow encoder process only ever blocks its own thread. Jobs
//! are handed out by rayon's work distribution, which gives every job to
//! exactly one thread exactly once. Results go to an `mpsc` channel; the
//! receiving side sees the end of the stream once [`dispatch`] has returned
//! and dropped its sender, i.e. after the last job has finished.
//!
//! Completion order is unspecified.

use crate::encoder::Encoder;
use crate::types::{ConversionJob, ConversionResult};
use crate::worker::Worker;
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("failed to start worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
}

/// Worker count actually used for a requested value: at least one.
pub fn effective_workers(requested: i64) -> usize {
    usize::try_from(requested).unwrap_or(0).max(1)
}

/// Run every job on a pool of `workers` threads, sending each result to `results`.
///
/// Blocks until all jobs are done. A closed receiver is not an error: the
/// remaining jobs still run, their results are dropped.
pub fn dispatch<E: Encoder + ?Sized>(
    jobs: Vec<ConversionJob>,
    workers: usize,
    worker: &Worker<'_, E>,
    results: Sender<ConversionResult>,
) -> Result<(), PoolError> {
    let threads = workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("convert-worker-{i}"))
        .build()?;

    tracing::debug!(jobs = jobs.len(), workers = threads, "dispatching jobs");

    pool.install(|| {
        jobs.into_par_iter()
            .with_max_len(1)
            .for_each_with(results, |tx, job| {
                let _ = tx.send(worker.run(job));
            });
    });
    Ok(())
}
