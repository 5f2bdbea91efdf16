//! Source image formats and the per-format inventory.
//!
//! Extensions are normalized exactly once, when a file is classified: the
//! text after the final `.` is lowercased and `jpeg` folds into `jpg`.
//! Anything outside the allow-set has no [`ImageFormat`] and is ignored by
//! the scanner.
//!
//! | Extension(s) | Format |
//! |---|---|
//! | `jpg`, `jpeg` | [`ImageFormat::Jpg`] |
//! | `png` | [`ImageFormat::Png`] |
//! | `bmp` | [`ImageFormat::Bmp`] |
//! | `tiff` | [`ImageFormat::Tiff`] |
//! | `webp` | [`ImageFormat::Webp`] |
//! | `heic` | [`ImageFormat::Heic`] |

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported image format '{0}' (expected one of: jpg, jpeg, png, bmp, tiff, webp, heic)")]
pub struct UnknownFormat(pub String);

/// A normalized source image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
    Jpg,
    Png,
    Bmp,
    Tiff,
    Webp,
    Heic,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 6] = [
        ImageFormat::Jpg,
        ImageFormat::Png,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Webp,
        ImageFormat::Heic,
    ];

    /// Classify a raw extension. Case-insensitive; a leading dot is accepted.
    ///
    /// - `"JPEG"` → `Some(Jpg)`
    /// - `".png"` → `Some(Png)`
    /// - `"tif"`, `"gif"`, `""` → `None`
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "bmp" => Some(Self::Bmp),
            "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::Webp),
            "heic" => Some(Self::Heic),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Webp => "webp",
            Self::Heic => "heic",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Split a file name at its final `.` into stem and extension.
///
/// A leading dot starts an extension too: `.png` → (`""`, `png`).
/// `a.tar.png` → (`a.tar`, `png`), `README` → (`README`, none).
pub fn split_extension(file_name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(file_name);
    if let (Some(stem), Some(ext)) = (path.file_stem(), path.extension()) {
        return (stem, Some(ext));
    }
    // Only a leading dot, or none at all. Non-UTF-8 dotfiles keep the whole name as stem.
    match file_name.to_str().and_then(|s| s.strip_prefix('.')) {
        Some(ext) => (OsStr::new(""), Some(OsStr::new(ext))),
        None => (file_name, None),
    }
}

/// Count of discovered files per normalized format.
///
/// Built by [`scan`](crate::scan::scan) and handed to the caller; iteration
/// order is the declaration order of [`ImageFormat`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    counts: BTreeMap<ImageFormat, usize>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, format: ImageFormat) {
        *self.counts.entry(format).or_insert(0) += 1;
    }

    /// Number of files of `format`; zero when none were found.
    pub fn count(&self, format: ImageFormat) -> usize {
        self.counts.get(&format).copied().unwrap_or(0)
    }

    pub fn contains(&self, format: ImageFormat) -> bool {
        self.count(format) > 0
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageFormat, usize)> + '_ {
        self.counts.iter().map(|(f, n)| (*f, *n))
    }
}
