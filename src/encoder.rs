//! External encoder boundary.
//!
//! The [`Encoder`] trait is the single point where the pipeline hands work to
//! an outside program. The production implementation is [`AvifEnc`], which
//! shells out to `avifenc`:
//!
//! ```text
//! avifenc --min 0 --max 20 --depth 10 <source> <destination>
//! ```
//!
//! Contract: on success the destination holds a complete encoded file and
//! the exit status is zero. On failure the destination is garbage or absent
//! and the caller discards it; stdout and stderr are returned as the
//! diagnostic.

use crate::config::EncoderConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("{program} not found in PATH: {source}")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed: {status}; output: {output}")]
    Failed {
        program: String,
        status: ExitStatus,
        output: String,
    },
}

/// Something that turns a source file into an encoded destination file.
///
/// Implementations are shared by every worker thread.
pub trait Encoder: Sync {
    /// Verify the encoder can run at all. Called once per batch, before any work.
    fn check_available(&self) -> Result<(), EncodeError>;

    /// Encode `source` into `destination`, which already exists as an empty file.
    fn encode(&self, source: &Path, destination: &Path) -> Result<(), EncodeError>;
}

/// `avifenc` subprocess encoder.
#[derive(Debug, Clone)]
pub struct AvifEnc {
    program: PathBuf,
    min_quantizer: u8,
    max_quantizer: u8,
    depth: u8,
}

impl AvifEnc {
    pub fn from_config(config: &EncoderConfig) -> Self {
        Self {
            program: PathBuf::from(&config.program),
            min_quantizer: config.min_quantizer,
            max_quantizer: config.max_quantizer,
            depth: config.depth,
        }
    }

    /// Quality and depth arguments, without the two file paths.
    pub fn fixed_args(&self) -> Vec<String> {
        vec![
            "--min".to_string(),
            self.min_quantizer.to_string(),
            "--max".to_string(),
            self.max_quantizer.to_string(),
            "--depth".to_string(),
            self.depth.to_string(),
        ]
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Default for AvifEnc {
    fn default() -> Self {
        Self::from_config(&EncoderConfig::default())
    }
}

impl Encoder for AvifEnc {
    fn check_available(&self) -> Result<(), EncodeError> {
        let resolved = which::which(&self.program).map_err(|source| EncodeError::NotFound {
            program: self.program_name(),
            source,
        })?;
        tracing::debug!(encoder = %resolved.display(), "encoder resolved");
        Ok(())
    }

    fn encode(&self, source: &Path, destination: &Path) -> Result<(), EncodeError> {
        let output = Command::new(&self.program)
            .args(self.fixed_args())
            .arg(source)
            .arg(destination)
            .output()
            .map_err(|err| EncodeError::Spawn {
                program: self.program_name(),
                source: err,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(EncodeError::Failed {
            program: self.program_name(),
            status: output.status,
            output: combined.trim_end().to_string(),
        })
    }
}
