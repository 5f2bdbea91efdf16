//! Batch totals.
//!
//! Byte totals count successful conversions only, so the reduction
//! percentage compares like with like.

use crate::types::ConversionResult;
use serde::Serialize;
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub converted_bytes: u64,
}

impl Summary {
    pub fn record(&mut self, result: &ConversionResult) {
        match &result.outcome {
            Ok(done) => {
                self.succeeded += 1;
                self.original_bytes += result.original_bytes;
                self.converted_bytes += done.converted_bytes;
            }
            Err(_) => self.failed += 1,
        }
    }

    /// Drain `results` until every sender is gone, tallying as results arrive.
    ///
    /// `on_result` sees each result once, in arrival order, before it is dropped.
    pub fn collect(
        results: Receiver<ConversionResult>,
        mut on_result: impl FnMut(&ConversionResult),
    ) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(&result);
            on_result(&result);
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_bytes, self.converted_bytes)
    }
}

/// `(1 - converted / original) * 100`, or 0 when `original` is 0.
///
/// Negative when the output grew.
pub fn reduction_percent(original: u64, converted: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - converted as f64 / original as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Converted;
    use crate::worker::JobError;
    use std::path::PathBuf;
    use std::sync::mpsc;

    fn ok(original: u64, converted: u64) -> ConversionResult {
        ConversionResult {
            source: PathBuf::from("src.png"),
            original_bytes: original,
            outcome: Ok(Converted {
                destination: PathBuf::from("dst.avif"),
                converted_bytes: converted,
            }),
        }
    }

    fn failed(original: u64) -> ConversionResult {
        ConversionResult {
            source: PathBuf::from("bad.png"),
            original_bytes: original,
            outcome: Err(JobError::Stat {
                destination: PathBuf::from("bad.avif"),
                source: std::io::Error::other("gone"),
            }),
        }
    }

    #[test]
    fn reduction_zero_when_nothing_original() {
        assert_eq!(reduction_percent(0, 0), 0.0);
        assert_eq!(reduction_percent(0, 50), 0.0);
        assert_eq!(Summary::default().reduction_percent(), 0.0);
    }

    #[test]
    fn reduction_formula() {
        assert_eq!(reduction_percent(600, 300), 50.0);
        assert_eq!(reduction_percent(100, 100), 0.0);
        assert_eq!(reduction_percent(100, 150), -50.0);
    }

    #[test]
    fn failures_excluded_from_byte_totals() {
        let mut s = Summary::default();
        s.record(&ok(100, 40));
        s.record(&failed(900));
        assert_eq!(s.succeeded, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.original_bytes, 100);
        assert_eq!(s.converted_bytes, 40);
        assert_eq!(s.reduction_percent(), 60.0);
    }

    #[test]
    fn only_failures_reduce_nothing() {
        let mut s = Summary::default();
        s.record(&failed(500));
        s.record(&failed(500));
        assert_eq!(s.total(), 2);
        assert_eq!(s.reduction_percent(), 0.0);
    }

    #[test]
    fn collect_drains_until_closed() {
        let (tx, rx) = mpsc::channel();
        let producer = std::thread::spawn(move || {
            tx.send(ok(100, 50)).unwrap();
            tx.send(failed(10)).unwrap();
            tx.send(ok(200, 100)).unwrap();
        });

        let mut seen = 0;
        let summary = Summary::collect(rx, |_| seen += 1);
        producer.join().unwrap();

        assert_eq!(seen, 3);
        assert_eq!(
            summary,
            Summary {
                succeeded: 2,
                failed: 1,
                original_bytes: 300,
                converted_bytes: 150,
            }
        );
    }
}
