//! Unique naming for keep-both downloads
//!
//! Generates sibling names following the pattern `stem (N).ext`.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::Utc;

/// Highest numbered suffix tried before falling back to a timestamp
const MAX_SUFFIX: u32 = 9999;

/// Generates non-colliding file names
pub struct UniqueNamer;

impl UniqueNamer {
    /// Builds the `N`th candidate for a name
    ///
    /// Given "report.pdf" and 2, produces "report (2).pdf". Leading-dot names
    /// such as ".bashrc" are treated as having no extension.
    pub fn numbered(original_name: &str, n: impl Display) -> String {
        match original_name.rfind('.') {
            Some(dot_pos) if dot_pos > 0 => {
                let stem = &original_name[..dot_pos];
                let ext = &original_name[dot_pos..];
                format!("{stem} ({n}){ext}")
            }
            _ => format!("{original_name} ({n})"),
        }
    }

    /// Returns the first candidate for which `exists` is false
    pub fn generate_unique<F>(original_name: &str, mut exists: F) -> String
    where
        F: FnMut(&str) -> bool,
    {
        for n in 1..=MAX_SUFFIX {
            let candidate = Self::numbered(original_name, n);
            if !exists(&candidate) {
                return candidate;
            }
        }

        // Last resort: millisecond timestamp
        Self::numbered(original_name, Utc::now().timestamp_millis())
    }

    /// Picks a free sibling path for `path` on the local filesystem
    pub fn unique_local_path(path: &Path) -> PathBuf {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return path.to_path_buf();
        };
        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        let unique = Self::generate_unique(name, |candidate| parent.join(candidate).exists());
        parent.join(unique)
    }
}
