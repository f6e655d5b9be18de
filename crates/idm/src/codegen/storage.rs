//! Output storage
//!
//! Where generated files end up. The driver asks for the current content
//! first and only writes when it differs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{IdlError, Result};

pub trait GeneratorStorage {
    /// Current content of `path`, `None` when it does not exist yet
    fn get_existing(&self, path: &str) -> Result<Option<String>>;

    /// Replace the content of `path`
    fn write_new(&mut self, path: &str, content: &str) -> Result<()>;
}

/// Files under an output directory
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl GeneratorStorage for FileSystemStorage {
    fn get_existing(&self, path: &str) -> Result<Option<String>> {
        let full = self.resolve(path);
        match fs::read_to_string(&full) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IdlError::storage(full, e)),
        }
    }

    fn write_new(&mut self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| IdlError::storage(parent, e))?;
        }
        fs::write(&full, content).map_err(|e| IdlError::storage(&full, e))?;
        info!(path = %full.display(), bytes = content.len(), "wrote output");
        Ok(())
    }
}

/// Outputs kept in memory, for tests and dry comparisons
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    files: BTreeMap<String, String>,
    writes: usize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing file; does not count as a write
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Number of `write_new` calls so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl GeneratorStorage for InMemoryStorage {
    fn get_existing(&self, path: &str) -> Result<Option<String>> {
        Ok(self.files.get(path).cloned())
    }

    fn write_new(&mut self, path: &str, content: &str) -> Result<()> {
        debug!(path, bytes = content.len(), "stored output in memory");
        self.files.insert(path.to_string(), content.to_string());
        self.writes += 1;
        Ok(())
    }
}
