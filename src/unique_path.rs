//! Collision-free destination paths.
//!
//! If the preferred path is free it is used as is; otherwise numeric
//! suffixes are tried before the extension: `a.avif`, `a-1.avif`, `a-2.avif`…
//!
//! The check is a plain existence test. Two workers resolving the same
//! candidate at the same moment can both see it as free; the later rename
//! then replaces the earlier file.

use crate::formats::split_extension;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest numeric suffix tried before giving up.
pub const MAX_SUFFIX: u32 = 999;

#[derive(Error, Debug)]
pub enum UniquePathError {
    #[error("cannot allocate unique name for {0} after {max} attempts", max = MAX_SUFFIX)]
    Exhausted(PathBuf),
}

pub fn unique_path(candidate: &Path) -> Result<PathBuf, UniquePathError> {
    if !exists(candidate) {
        return Ok(candidate.to_path_buf());
    }

    let (stem, ext) = candidate.file_name().map(split_extension).unwrap_or_default();

    for n in 1..=MAX_SUFFIX {
        let mut name = stem.to_os_string();
        name.push(format!("-{n}"));
        if let Some(ext) = ext {
            name.push(".");
            name.push(ext);
        }
        let path = candidate.with_file_name(name);
        if !exists(&path) {
            return Ok(path);
        }
    }

    Err(UniquePathError::Exhausted(candidate.to_path_buf()))
}

/// Existence without following symlinks, so a dangling link still occupies its name.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
