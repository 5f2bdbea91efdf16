//! Shared test utilities: fixture files and directory inspection.

use crate::formats::ImageFormat;
use crate::types::FileDescriptor;
use crate::worker::is_temp_file;
use std::fs;
use std::path::{Path, PathBuf};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a file of `size` bytes at `dir/rel`, creating parent directories.
pub fn write_sized(dir: &Path, rel: &str, size: u64) -> PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, vec![7u8; size as usize]).unwrap();
    path
}

/// Build a descriptor for an existing file, the way the scanner would.
pub fn descriptor(path: &Path) -> FileDescriptor {
    let meta = fs::metadata(path).unwrap();
    let ext = path.extension().unwrap().to_str().unwrap();
    FileDescriptor {
        path: path.to_path_buf(),
        modified: meta.modified().unwrap(),
        format: ImageFormat::from_extension(ext)
            .unwrap_or_else(|| panic!("not an image extension: {ext}")),
        size: meta.len(),
    }
}

// =========================================================================
// Directory inspection
// =========================================================================

/// Sorted file names directly inside `dir`; empty if it does not exist.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Leftover temp files in `dir` for the given output extension.
pub fn temp_files(dir: &Path, target_ext: &str) -> Vec<String> {
    dir_entries(dir)
        .into_iter()
        .filter(|n| is_temp_file(n, target_ext))
        .collect()
}
