//! In-memory mock filesystem for testing the reader without a real `/proc`.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// In-memory filesystem for testing.
///
/// Clones share the same backing store, so a test can keep a handle and
/// rewrite `/proc/stat` while a scheduler thread owns another clone.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files_mut()
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Removes a file, simulating an unreadable source.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files_mut().remove(path.as_ref());
    }

    /// Returns true if the path holds a file.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files
            .read()
            .map(|files| files.contains_key(path.as_ref()))
            .unwrap_or(false)
    }

    fn files_mut(&mut self) -> std::sync::RwLockWriteGuard<'_, HashMap<PathBuf, String>> {
        self.files.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }
}
