// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

#[derive(Debug, Clone)]
struct MockFile {
    content: Vec<u8>,
    modified: SystemTime,
}

/// In-memory filesystem for tests. Directories are implicit.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockFile>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_at(path, content, SystemTime::now());
    }

    pub fn add_file_at(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        let mut files = self.files.lock().unwrap();
        files.insert(
            path.as_ref().to_path_buf(),
            MockFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Raw contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files.get(path.as_ref()).map(|f| f.content.clone())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let files = self.files.lock().unwrap();
        let mut paths: Vec<PathBuf> = files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        let file = files
            .get(path)
            .ok_or_else(|| anyhow!("file not found: {:?}", path))?;
        String::from_utf8(file.content.clone()).map_err(|e| anyhow!(e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self
            .contents(from)
            .ok_or_else(|| anyhow!("file not found: {:?}", from))?;
        self.add_file(to, content);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files.lock().unwrap().get(path).map(|f| f.modified)
    }
}
