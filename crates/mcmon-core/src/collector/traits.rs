//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the counter reader work against the real `/proc`
//! filesystem on Linux and against in-memory fixtures in tests.

use std::io;
use std::path::Path;

/// Abstraction for reading kernel counter files.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents as a string, or an I/O error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual `/proc` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat");
        fs::write(&path, "cpu  1 2 3 4 5 6 7 8 9 10\n").unwrap();

        let content = RealFs::new().read_to_string(&path).unwrap();
        assert!(content.starts_with("cpu "));
    }

    #[test]
    fn test_real_fs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RealFs::new()
            .read_to_string(&dir.path().join("meminfo"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
