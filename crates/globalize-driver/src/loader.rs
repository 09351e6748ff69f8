//! Loading source text for modules discovered through imports

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::BundleError;
use crate::resolver::{normalize, ModuleKey};

/// An input module: where it lives and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub contents: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn read(path: impl Into<PathBuf>) -> Result<Self, BundleError> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(|source| BundleError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, contents })
    }
}

/// Supplies the text of modules that were not passed in as inputs.
pub trait SourceLoader: Send + Sync {
    fn load(&self, key: &ModuleKey) -> io::Result<String>;
}

/// Reads modules from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, key: &ModuleKey) -> io::Result<String> {
        fs::read_to_string(key.path())
    }
}

/// Serves modules from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), contents.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, key: &ModuleKey) -> io::Result<String> {
        self.files.get(key.path()).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no module at {}", key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_file("/src/./a.js", "export default 1;");
        assert_eq!(loader.load(&ModuleKey::new("/src/a", "js")).unwrap(), "export default 1;");

        let err = loader.load(&ModuleKey::new("/src/b.js", "js")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_fs_loader_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.js");
        fs::write(&present, "let x;").unwrap();

        assert_eq!(FsLoader.load(&ModuleKey::new(&present, "js")).unwrap(), "let x;");
        assert!(FsLoader.load(&ModuleKey::new(dir.path().join("absent"), "js")).is_err());
    }
}
