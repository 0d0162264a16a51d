// src/pipeline/peaks.rs

//! Peak file validation.

use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::fs::FileSystem;

/// Written into empty peak files so downstream tools never see empty input.
pub const PLACEHOLDER_INTERVAL: &str = "chr21\t1\t2\n";

/// Replace an empty (or whitespace-only) peak file with a single
/// placeholder interval. Returns `true` if the file was patched.
pub fn validate_peak_file(fs: &dyn FileSystem, path: &Path) -> Result<bool> {
    let contents = fs.read_to_string(path)?;
    if !contents.trim().is_empty() {
        return Ok(false);
    }

    warn!(
        path = %path.display(),
        "peak file is empty; writing placeholder interval"
    );
    fs.write(path, PLACEHOLDER_INTERVAL.as_bytes())?;
    Ok(true)
}
