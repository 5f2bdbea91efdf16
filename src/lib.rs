//! # avif-batch
//!
//! Batch-convert a directory of images of one source format to AVIF, running
//! several `avifenc` processes in parallel without ever overwriting an
//! existing file.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      input/   →  files + per-format inventory
//! 2. Plan      inventory →  jobs (files of the requested format)
//! 3. Convert   jobs     →  N workers → results → summary
//! ```
//!
//! Each job is handled end to end by one worker: name the output, resolve a
//! free path, encode into a temp file beside it, then rename (or copy) the
//! temp file into place and stat it. Results stream back over a channel to a
//! single aggregator on the calling thread.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the input tree, classifies files, builds the [`formats::Inventory`] |
//! | [`formats`] | Normalized source formats (`jpeg` → `jpg`) and the inventory type |
//! | [`naming`] | Output filename synthesis: keep-name or `{date}_{random}` |
//! | [`unique_path`] | Finds a free destination by appending `-1`, `-2`, … |
//! | [`encoder`] | The [`encoder::Encoder`] seam and the `avifenc` subprocess implementation |
//! | [`worker`] | Per-job state machine with guaranteed temp-file cleanup |
//! | [`pool`] | Fixed-size worker pool and result channel |
//! | [`summary`] | Success/failure and byte tallies |
//! | [`convert`] | Batch preconditions, dry-run preview, and the full run |
//! | [`config`] | `avif-batch.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting and the JSON report |
//! | [`types`] | Descriptors and results shared between stages |
//!
//! # Design Decisions
//!
//! ## The Encoder Is a Black Box
//!
//! Pixel work is delegated to `avifenc`. The pipeline only relies on its exit
//! status and on the file it leaves at the destination path; anything it
//! prints is kept as the diagnostic for a failed job.
//!
//! ## Temp File, Then Rename
//!
//! A final output name never points at a half-written file. The encoder
//! writes to a temp file in the destination directory, which is then renamed
//! over. If the rename fails, the bytes are copied and synced instead. The
//! temp file is removed on every path out of a job.
//!
//! ## No Overwrites
//!
//! Destinations are checked against existing files and suffixed when taken,
//! so running the same batch twice produces a second set of files next to the
//! first. The check is best-effort between concurrent workers; see
//! [`unique_path`].

pub mod config;
pub mod convert;
pub mod encoder;
pub mod formats;
pub mod naming;
pub mod output;
pub mod pool;
pub mod scan;
pub mod summary;
pub mod types;
pub mod unique_path;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
