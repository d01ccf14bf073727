//! Where `curre` gets script text from.

use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

pub trait ScriptLoader {
    /// Returns the source text of the script called `name`.
    fn load(&self, name: &str) -> io::Result<String>;
}

/// Reads scripts from disk, relative to `base` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    base: Option<PathBuf>,
}

impl FsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }
}

impl ScriptLoader for FsLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        match &self.base {
            Some(base) => fs::read_to_string(base.join(name)),
            None => fs::read_to_string(name),
        }
    }
}

/// Scripts held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    scripts: FxHashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.scripts.insert(name.into(), source.into());
        self
    }
}

impl ScriptLoader for MemoryLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        self.scripts.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no script named {name}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_loader_finds_registered_scripts() {
        let loader = MemoryLoader::new().with_script("lib.qr", "x = 1");
        assert_eq!(loader.load("lib.qr").unwrap(), "x = 1");
        assert_eq!(
            loader.load("missing.qr").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn fs_loader_reports_missing_files() {
        let loader = FsLoader::with_base("/nonexistent-quirinus-dir");
        assert!(loader.load("script.qr").is_err());
    }
}
