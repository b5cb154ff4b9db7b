//! In-memory storage for tests and for configurations that never touch disk.
//!
//! Records every write in order, making it easy to assert which persistence
//! roots a save actually reached. Clones share the same state.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::storage::Storage;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    readonly: BTreeSet<PathBuf>,
    writes: Vec<PathBuf>,
}

impl State {
    fn is_directory(&self, path: &Path) -> bool {
        self.dirs.contains(path)
            || self
                .files
                .keys()
                .chain(self.dirs.iter())
                .any(|entry| entry != path && entry.starts_with(path))
    }

    fn add_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// A storage double backed by a shared in-memory file table.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pre-load a file.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        {
            let mut state = self.lock();
            let path = path.into();
            state.add_parents(&path);
            state.files.insert(path, contents.to_string());
        }
        self
    }

    /// Pre-create an empty directory.
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        {
            let mut state = self.lock();
            let path = path.into();
            state.add_parents(&path);
            state.dirs.insert(path);
        }
        self
    }

    /// Mark a path as not writable.
    pub fn set_readonly(&self, path: impl Into<PathBuf>) {
        self.lock().readonly.insert(path.into());
    }

    /// Current contents of a file.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    /// Every path written so far, in order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    /// Forget recorded writes, keeping file contents.
    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.is_directory(path)
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.lock().is_directory(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        let state = self.lock();
        let exists = state.files.contains_key(path) || state.is_directory(path);
        exists && !state.readonly.contains(path)
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        self.lock().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, data: &str) -> io::Result<()> {
        let mut state = self.lock();
        if state.readonly.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read-only: {}", path.display()),
            ));
        }
        state.add_parents(path);
        state.files.insert(path.to_path_buf(), data.to_string());
        state.writes.push(path.to_path_buf());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.add_parents(path);
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn enumerate(&self, path: &Path) -> io::Result<Vec<String>> {
        let state = self.lock();
        if !state.is_directory(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path.display()),
            ));
        }
        let names: BTreeSet<String> = state
            .files
            .keys()
            .chain(state.dirs.iter())
            .filter(|entry| entry.parent() == Some(path))
            .filter_map(|entry| entry.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        Ok(names.into_iter().collect())
    }
}
