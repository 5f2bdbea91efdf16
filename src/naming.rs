//! Output filename synthesis.
//!
//! Two modes, selected by [`NamingOptions::keep_name`]:
//!
//! | Mode | Without prefix | With prefix `trip` |
//! |---|---|---|
//! | keep name | `IMG_0042.avif` | `trip_IMG_0042.avif` |
//! | timestamped | `20240309_a1b2c3.avif` | `trip_20240309_a1b2c3.avif` |
//!
//! The timestamped form uses the source's modification date (local calendar
//! day) and six hex characters from the OS random generator. If the OS
//! generator fails, the token is derived from the wall clock instead: weaker
//! collision resistance, never an error.
//!
//! Nothing here touches the filesystem; collisions with existing files are
//! resolved later by [`unique_path`](crate::unique_path::unique_path).

use crate::formats::split_extension;
use crate::types::FileDescriptor;
use chrono::{DateTime, Local};
use rand::RngCore;
use rand::rngs::OsRng;
use std::ffi::OsString;
use std::time::{SystemTime, UNIX_EPOCH};

/// How output names are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingOptions {
    /// Prepended as `{prefix}_`. Empty strings count as no prefix.
    pub prefix: Option<String>,
    /// Keep the source stem instead of `{date}_{random}`.
    pub keep_name: bool,
}

impl NamingOptions {
    pub fn new(prefix: Option<String>, keep_name: bool) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
            keep_name,
        }
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

/// Build the output base filename for `file`, ending in `.{target_ext}`.
///
/// Kept names are built from the raw source stem, so non-UTF-8 names survive.
pub fn output_filename(file: &FileDescriptor, options: &NamingOptions, target_ext: &str) -> OsString {
    output_filename_with(file, options, target_ext, &mut OsRng)
}

/// [`output_filename`] with an explicit entropy source.
pub fn output_filename_with(
    file: &FileDescriptor,
    options: &NamingOptions,
    target_ext: &str,
    rng: &mut impl RngCore,
) -> OsString {
    let mut name = OsString::new();
    if let Some(prefix) = options.prefix() {
        name.push(prefix);
        name.push("_");
    }
    if options.keep_name {
        name.push(source_stem(file));
    } else {
        name.push(format!("{}_{}", date_stamp(file.modified), random_token(rng)));
    }
    name.push(".");
    name.push(target_ext);
    name
}

/// Six lowercase hex characters.
///
/// Three bytes from `rng`; if the generator reports failure, the low 24 bits
/// of the current nanosecond clock.
pub fn random_token(rng: &mut impl RngCore) -> String {
    let mut bytes = [0u8; 3];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => format!("{:02x}{:02x}{:02x}", bytes[0], bytes[1], bytes[2]),
        Err(err) => {
            tracing::debug!("random source unavailable, using clock fallback: {err}");
            clock_token()
        }
    }
}

fn clock_token() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{:06x}", nanos & 0xff_ffff)
}

/// `YYYYMMDD` in local time.
fn date_stamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%Y%m%d").to_string()
}

/// Base filename with the final extension removed.
///
/// `IMG_0042.JPG` → `IMG_0042`, `archive.tar.png` → `archive.tar`, `.png` → empty.
fn source_stem(file: &FileDescriptor) -> OsString {
    file.path
        .file_name()
        .map(|name| split_extension(name).0.to_os_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ImageFormat;
    use chrono::TimeZone;
    use std::path::PathBuf;

    /// Generator that always fails, to exercise the clock fallback.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("no entropy")))
        }
    }

    /// Generator producing a fixed byte pattern.
    struct FixedRng(u8);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            u32::from(self.0)
        }
        fn next_u64(&mut self) -> u64 {
            u64::from(self.0)
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for (i, b) in dest.iter_mut().enumerate() {
                *b = self.0.wrapping_add(i as u8);
            }
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn descriptor(path: &str) -> FileDescriptor {
        let modified = Local.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap();
        FileDescriptor {
            path: PathBuf::from(path),
            modified: SystemTime::from(modified),
            format: ImageFormat::Jpg,
            size: 100,
        }
    }

    fn is_hex_token(s: &str) -> bool {
        s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    #[test]
    fn keep_name_without_prefix() {
        let opts = NamingOptions::new(None, true);
        assert_eq!(
            output_filename(&descriptor("/in/IMG_0042.JPG"), &opts, "avif"),
            "IMG_0042.avif"
        );
    }

    #[test]
    fn keep_name_with_prefix() {
        let opts = NamingOptions::new(Some("trip".into()), true);
        assert_eq!(
            output_filename(&descriptor("/in/IMG_0042.jpg"), &opts, "avif"),
            "trip_IMG_0042.avif"
        );
    }

    #[test]
    fn keep_name_strips_only_final_extension() {
        let opts = NamingOptions::new(None, true);
        assert_eq!(
            output_filename(&descriptor("/in/archive.tar.png"), &opts, "avif"),
            "archive.tar.avif"
        );
    }

    #[test]
    fn keep_name_of_dot_named_file_has_empty_stem() {
        let opts = NamingOptions::new(None, true);
        assert_eq!(
            output_filename(&descriptor("/in/.png"), &opts, "avif"),
            ".avif"
        );
    }

    #[cfg(unix)]
    #[test]
    fn keep_name_preserves_non_utf8_stem() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let mut file = descriptor("/in/x.png");
        file.path = PathBuf::from("/in").join(OsStr::from_bytes(b"caf\xe9.png"));
        let opts = NamingOptions::new(Some("trip".into()), true);

        let name = output_filename(&file, &opts, "avif");
        assert_eq!(name.into_vec(), b"trip_caf\xe9.avif".to_vec());
    }

    #[test]
    fn empty_prefix_is_no_prefix() {
        let opts = NamingOptions::new(Some(String::new()), true);
        assert_eq!(opts.prefix, None);
        assert_eq!(
            output_filename(&descriptor("/in/a.png"), &opts, "avif"),
            "a.avif"
        );
    }

    #[test]
    fn timestamped_uses_mtime_date_and_token() {
        let opts = NamingOptions::new(None, false);
        let name = output_filename_with(&descriptor("/in/a.jpg"), &opts, "avif", &mut FixedRng(0xa1));
        assert_eq!(name, "20240309_a1a2a3.avif");
    }

    #[test]
    fn timestamped_with_prefix() {
        let opts = NamingOptions::new(Some("trip".into()), false);
        let name = output_filename_with(&descriptor("/in/a.jpg"), &opts, "avif", &mut FixedRng(0));
        assert_eq!(name, "trip_20240309_000102.avif");
    }

    #[test]
    fn timestamped_with_os_rng_has_valid_shape() {
        let opts = NamingOptions::default();
        let name = output_filename(&descriptor("/in/a.jpg"), &opts, "avif");
        let name = name.to_str().unwrap();
        let stem = name.strip_suffix(".avif").unwrap();
        let (date, token) = stem.split_once('_').unwrap();
        assert_eq!(date, "20240309");
        assert!(is_hex_token(token), "bad token in {name}");
    }

    #[test]
    fn broken_rng_falls_back_to_clock_token() {
        let token = random_token(&mut BrokenRng);
        assert!(is_hex_token(&token), "bad fallback token {token}");

        let opts = NamingOptions::default();
        let name = output_filename_with(&descriptor("/in/a.jpg"), &opts, "avif", &mut BrokenRng);
        let name = name.to_str().unwrap();
        assert!(name.starts_with("20240309_"));
        assert!(name.ends_with(".avif"));
    }

    #[test]
    fn target_extension_is_configurable() {
        let opts = NamingOptions::new(None, true);
        assert_eq!(
            output_filename(&descriptor("/in/a.png"), &opts, "jxl"),
            "a.jxl"
        );
    }
}
