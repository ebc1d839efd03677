//! Key-value persistence media for the history blob

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Durable string storage addressed by key
pub trait KeyValueMedium {
    /// `Ok(None)` when nothing is stored under `key`
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Open a medium rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(?dir, "Opened file medium");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueMedium for FileMedium {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes a sibling temp file and renames it over the target
    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        debug!(?path, bytes = value.len(), "set: written");
        Ok(())
    }
}

/// In-process medium for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    entries: HashMap<String, String>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. a legacy or corrupted blob
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueMedium for MemoryMedium {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
