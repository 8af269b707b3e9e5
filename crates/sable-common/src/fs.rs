//! The filesystem capability.
//!
//! The module loader never touches `std::fs` directly: everything it needs
//! from the outside world is three questions, expressed as the
//! [`FileSystem`] trait. The CLI passes [`OsFs`]; tests pass [`MemoryFs`]
//! and never create files on disk.

use std::io;
use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashMap;

/// What the module loader is allowed to ask of the outside world.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn is_directory(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory filesystem for tests.
///
/// Directories are implied: any proper ancestor of a stored file path is a
/// directory.
#[derive(Debug, Default, Clone)]
pub struct MemoryFs {
    files: FxHashMap<PathBuf, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file. The path is normalized, so `/a/./b.sab` and `/a/b.sab`
    /// are the same entry.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(normalize(&path.into()), contents.into());
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.files.contains_key(&path) || self.is_directory(&path)
    }

    fn is_directory(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.files
            .keys()
            .any(|file| file != &path && file.starts_with(&path))
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Lexically normalize a path: resolve `.` and `..` components without
/// consulting the filesystem.
///
/// Import specifiers are resolved against module directories before the
/// loader knows whether the result exists, and `MemoryFs` has nothing to
/// canonicalize against, so normalization has to be purely lexical.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_and_dotdot() {
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/nested/.")), PathBuf::from("/a/nested"));
    }

    #[test]
    fn memory_fs_read_and_exists() {
        let mut fs = MemoryFs::new();
        fs.insert("/a/index.sab", "const x = 1");
        assert!(fs.exists(Path::new("/a/index.sab")));
        assert!(fs.exists(Path::new("/a/./index.sab")));
        assert_eq!(fs.read(Path::new("/a/index.sab")).unwrap(), "const x = 1");
        assert!(fs.read(Path::new("/a/missing.sab")).is_err());
    }

    #[test]
    fn memory_fs_implied_directories() {
        let mut fs = MemoryFs::new();
        fs.insert("/a/nested/n.sab", "");
        assert!(fs.is_directory(Path::new("/a")));
        assert!(fs.is_directory(Path::new("/a/nested")));
        assert!(!fs.is_directory(Path::new("/a/nested/n.sab")));
        assert!(!fs.is_directory(Path::new("/b")));
        assert!(fs.exists(Path::new("/a/nested")));
    }
}
