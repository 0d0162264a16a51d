// src/fs/mod.rs

//! Filesystem access used by in-process actions and freshness checks.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write `contents`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Copy a file, creating parent directories of `to` as needed.
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove a file or a whole directory tree. A missing path is not an error.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Last modification time, `None` if the path does not exist.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::write(path, contents).with_context(|| format!("writing to file {:?}", path))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::copy(from, to).with_context(|| format!("copying {:?} to {:?}", from, to))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_context(|| format!("inspecting {:?}", path)),
        };
        if meta.is_dir() {
            fs::remove_dir_all(path).with_context(|| format!("removing dir {:?}", path))
        } else {
            fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
        }
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Whether a task with these inputs and outputs can be skipped.
///
/// True when the task has outputs, every output exists, and no output is
/// older than any input. Inputs that don't exist are ignored here; their
/// producers run first and a missing source fails the command itself.
pub fn is_up_to_date<P: AsRef<Path>>(fs: &dyn FileSystem, inputs: &[P], outputs: &[P]) -> bool {
    if outputs.is_empty() {
        return false;
    }

    let mut oldest_output: Option<SystemTime> = None;
    for output in outputs {
        match fs.modified(output.as_ref()) {
            Some(t) => {
                oldest_output = Some(oldest_output.map_or(t, |o| o.min(t)));
            }
            None => return false,
        }
    }

    let newest_input = inputs
        .iter()
        .filter_map(|input| fs.modified(input.as_ref()))
        .max();

    match (oldest_output, newest_input) {
        (Some(out), Some(inp)) => out >= inp,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
