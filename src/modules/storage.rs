// Persistence layer: where the serialized document lives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

/// Backing store for the serialized document.
///
/// `load` returning `Ok(None)` means nothing has been saved yet; callers
/// start from an empty document.
pub trait Storage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, json: &str) -> Result<()>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// In-process storage that remembers the last save and counts saves.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(json: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(json.into())),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, json: &str) -> Result<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(json.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
