//! Batch configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Stock defaults ([`BatchConfig::default`])
//! 2. An optional `avif-batch.toml` passed with `--config`
//! 3. Command-line flags (applied by `main`)
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [encoder]
//! program = "avifenc"       # Looked up on PATH unless it contains a separator
//! min_quantizer = 0         # --min (0 = lossless end of the range)
//! max_quantizer = 20        # --max
//! depth = 10                # --depth (8, 10 or 12 bits)
//! extension = "avif"        # Extension given to output files
//!
//! [naming]
//! prefix = ""               # Output names become {prefix}_...
//! keep_name = false         # Keep source stem instead of {date}_{random}
//!
//! [processing]
//! workers = 4               # Parallel encoder processes (values < 1 mean 1)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub encoder: EncoderConfig,
    pub naming: NamingConfig,
    pub processing: ProcessingConfig,
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let enc = &self.encoder;
        if enc.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "encoder.program must not be empty".into(),
            ));
        }
        if enc.max_quantizer > 63 || enc.min_quantizer > 63 {
            return Err(ConfigError::Validation(
                "encoder quantizers must be 0-63".into(),
            ));
        }
        if enc.min_quantizer > enc.max_quantizer {
            return Err(ConfigError::Validation(
                "encoder.min_quantizer must not exceed encoder.max_quantizer".into(),
            ));
        }
        if ![8, 10, 12].contains(&enc.depth) {
            return Err(ConfigError::Validation(
                "encoder.depth must be 8, 10 or 12".into(),
            ));
        }
        if enc.extension.is_empty() || !enc.extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(
                "encoder.extension must be non-empty and alphanumeric (no dot)".into(),
            ));
        }
        Ok(())
    }
}

/// External encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncoderConfig {
    /// Encoder executable name or path.
    pub program: String,
    /// Lower bound of the quantizer range (`--min`).
    pub min_quantizer: u8,
    /// Upper bound of the quantizer range (`--max`).
    pub max_quantizer: u8,
    /// Output bit depth (`--depth`).
    pub depth: u8,
    /// Extension of produced files, without the dot.
    pub extension: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "avifenc".to_string(),
            min_quantizer: 0,
            max_quantizer: 20,
            depth: 10,
            extension: "avif".to_string(),
        }
    }
}

/// Output naming settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub prefix: String,
    pub keep_name: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Number of encoder workers. Values below 1 run a single worker.
    pub workers: i64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BatchConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the batch config.
///
/// `None` yields the validated stock defaults. An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<BatchConfig, ConfigError> {
    let overlay = match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `avif-batch.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# avif-batch configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# External encoder
# ---------------------------------------------------------------------------
[encoder]
# Executable name (looked up on PATH) or path to the encoder.
program = "avifenc"

# Quantizer range passed as --min / --max (0-63, lower = higher quality).
min_quantizer = 0
max_quantizer = 20

# Output bit depth passed as --depth: 8, 10 or 12.
depth = 10

# Extension given to output files.
extension = "avif"

# ---------------------------------------------------------------------------
# Output naming
# ---------------------------------------------------------------------------
[naming]
# Optional prefix: output names become {prefix}_{name}.
prefix = ""

# Keep the source file name (only the extension changes).
# When false, names are {date}_{random}, e.g. 20240309_a1b2c3.avif.
keep_name = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Number of encoder processes run in parallel.
workers = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_matches_avifenc_settings() {
        let config = BatchConfig::default();
        assert_eq!(config.encoder.program, "avifenc");
        assert_eq!(config.encoder.min_quantizer, 0);
        assert_eq!(config.encoder.max_quantizer, 20);
        assert_eq!(config.encoder.depth, 10);
        assert_eq!(config.encoder.extension, "avif");
        assert_eq!(config.processing.workers, 4);
        assert!(!config.naming.keep_name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[naming]
prefix = "trip"
"#;
        let config: BatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.naming.prefix, "trip");
        // Default values preserved
        assert_eq!(config.encoder.depth, 10);
        assert_eq!(config.processing.workers, 4);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r#"
[encoder]
qualty = 50
"#;
        let result: Result<BatchConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn merge_overrides_only_given_keys() {
        let overlay: toml::Value = toml::from_str("[encoder]\nmax_quantizer = 30\n").unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.encoder.max_quantizer, 30);
        assert_eq!(config.encoder.min_quantizer, 0);
        assert_eq!(config.encoder.program, "avifenc");
    }

    #[test]
    fn merge_toml_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n[b]\nz = 4\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
        assert_eq!(merged["b"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn validate_rejects_inverted_quantizers() {
        let mut config = BatchConfig::default();
        config.encoder.min_quantizer = 30;
        config.encoder.max_quantizer = 10;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_quantizer() {
        let mut config = BatchConfig::default();
        config.encoder.max_quantizer = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_depth() {
        let mut config = BatchConfig::default();
        config.encoder.depth = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_dotted_extension() {
        let mut config = BatchConfig::default();
        config.encoder.extension = ".avif".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_program() {
        let mut config = BatchConfig::default();
        config.encoder.program = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_none_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.encoder.extension, "avif");
    }

    #[test]
    fn load_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("avif-batch.toml");
        fs::write(&path, "[processing]\nworkers = 2\n[naming]\nkeep_name = true\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.processing.workers, 2);
        assert!(config.naming.keep_name);
    }

    #[test]
    fn load_config_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("missing.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_values_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("avif-batch.toml");
        fs::write(&path, "[encoder]\ndepth = 16\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let config: BatchConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = BatchConfig::default();
        assert_eq!(config.encoder.program, defaults.encoder.program);
        assert_eq!(config.encoder.max_quantizer, defaults.encoder.max_quantizer);
        assert_eq!(config.processing.workers, defaults.processing.workers);
        assert_eq!(config.naming.prefix, defaults.naming.prefix);
    }
}
