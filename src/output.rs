//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! === Found file types ===
//! jpg: 12
//! png: 3
//!
//! Converting 12 .jpg files to AVIF (workers=4)
//! OK: IMG_0001.jpg -> 20240309_a1b2c3.avif (4.12 MB -> 0.87 MB, 78.9% reduction)
//! ERROR: /photos/broken.jpg -> encoding /photos/broken.avif failed: ...
//!
//! Summary: 11 successful, 1 failed
//! Total size: 45.30 MB -> 9.80 MB (78.4% reduction)
//! ```
//!
//! Each section has a `format_*` function (pure, returns lines) and a
//! `print_*` wrapper. Error lines go to stderr, everything else to stdout.
//!
//! [`Report`] is the machine-readable counterpart written by `--report`.

use crate::convert::PlannedConversion;
use crate::formats::{ImageFormat, Inventory};
use crate::summary::{Summary, reduction_percent};
use crate::types::ConversionResult;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

fn mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Inventory
// ============================================================================

pub fn format_inventory(inventory: &Inventory) -> Vec<String> {
    let mut lines = vec!["=== Found file types ===".to_string()];
    lines.extend(inventory.iter().map(|(format, n)| format!("{format}: {n}")));
    lines
}

pub fn print_inventory(inventory: &Inventory) {
    for line in format_inventory(inventory) {
        println!("{line}");
    }
}

// ============================================================================
// Conversion run
// ============================================================================

pub fn format_batch_header(jobs: usize, format: ImageFormat, target_ext: &str, workers: usize) -> String {
    format!(
        "Converting {jobs} .{format} files to {} (workers={workers})",
        target_ext.to_uppercase()
    )
}

/// One line per result: `OK: …` on success, `ERROR: …` with the diagnostic on failure.
pub fn format_result(result: &ConversionResult) -> String {
    match &result.outcome {
        Ok(done) => format!(
            "OK: {} -> {} ({:.2} MB -> {:.2} MB, {:.1}% reduction)",
            file_name(&result.source),
            file_name(&done.destination),
            mb(result.original_bytes),
            mb(done.converted_bytes),
            reduction_percent(result.original_bytes, done.converted_bytes),
        ),
        Err(err) => format!("ERROR: {} -> {}", result.source.display(), err),
    }
}

pub fn print_result(result: &ConversionResult) {
    let line = format_result(result);
    if result.is_success() {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
}

/// Final tally. The size line appears only when something was converted.
pub fn format_summary(summary: &Summary) -> Vec<String> {
    let mut lines = vec![format!(
        "Summary: {} successful, {} failed",
        summary.succeeded, summary.failed
    )];
    if summary.succeeded > 0 && summary.original_bytes > 0 {
        lines.push(format!(
            "Total size: {:.2} MB -> {:.2} MB ({:.1}% reduction)",
            mb(summary.original_bytes),
            mb(summary.converted_bytes),
            summary.reduction_percent(),
        ));
    }
    lines
}

pub fn print_summary(summary: &Summary) {
    println!();
    for line in format_summary(summary) {
        println!("{line}");
    }
}

// ============================================================================
// Dry run
// ============================================================================

pub fn format_preview(planned: &[PlannedConversion]) -> Vec<String> {
    let mut lines = vec!["DRY RUN - no conversion will be performed".to_string()];
    for p in planned {
        lines.push(match &p.destination {
            Ok(dest) => format!(
                "{} -> {} ({:.2} MB)",
                p.source.display(),
                dest.display(),
                mb(p.original_bytes)
            ),
            Err(err) => format!("{} -> ERROR: {}", p.source.display(), err),
        });
    }
    lines
}

pub fn print_preview(planned: &[PlannedConversion]) {
    for line in format_preview(planned) {
        println!("{line}");
    }
}

// ============================================================================
// JSON report
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub reduction_percent: f64,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Serialize)]
pub struct ReportItem {
    pub source: PathBuf,
    pub original_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ConversionResult> for ReportItem {
    fn from(result: &ConversionResult) -> Self {
        Self {
            source: result.source.clone(),
            original_bytes: result.original_bytes,
            destination: result.destination().map(Path::to_path_buf),
            converted_bytes: result.converted_bytes(),
            error: result.outcome.as_ref().err().map(|e| e.to_string()),
        }
    }
}

impl Report {
    pub fn new(summary: Summary, items: Vec<ReportItem>) -> Self {
        Self {
            summary,
            reduction_percent: summary.reduction_percent(),
            items,
        }
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
