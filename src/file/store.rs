//! Persistence bindings for map nodes.

use std::path::{Path, PathBuf};

use crate::format::Format;

/// Default name of the file holding a directory's own properties.
pub const DEFAULT_DIRFILE: &str = ".conf";

/// Whether a store is a single file or a directory with a dirfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    File,
    /// A directory whose own properties live in the named dirfile.
    Directory { dirfile: String },
}

/// The file or directory backing a persistence root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    path: PathBuf,
    kind: StoreKind,
    format: Format,
}

impl Store {
    pub fn file(path: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            path: path.into(),
            kind: StoreKind::File,
            format,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, format: Format, dirfile: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: StoreKind::Directory {
                dirfile: dirfile.into(),
            },
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &StoreKind {
        &self.kind
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, StoreKind::Directory { .. })
    }

    /// The dirfile name for directories, `None` for files.
    pub fn dirfile(&self) -> Option<&str> {
        match &self.kind {
            StoreKind::Directory { dirfile } => Some(dirfile),
            StoreKind::File => None,
        }
    }

    /// The file that actually holds this store's serialized data.
    pub fn data_path(&self) -> PathBuf {
        match &self.kind {
            StoreKind::File => self.path.clone(),
            StoreKind::Directory { dirfile } => self.path.join(dirfile),
        }
    }

    /// Directory that nested stores are created in.
    pub fn base_dir(&self) -> PathBuf {
        match &self.kind {
            StoreKind::Directory { .. } => self.path.clone(),
            StoreKind::File => self
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_paths() {
        let store = Store::file("/etc/app/main.json", Format::Json);
        assert!(!store.is_directory());
        assert_eq!(store.dirfile(), None);
        assert_eq!(store.data_path(), PathBuf::from("/etc/app/main.json"));
        assert_eq!(store.base_dir(), PathBuf::from("/etc/app"));
    }

    #[test]
    fn test_directory_store_paths() {
        let store = Store::directory("/etc/app", Format::Yaml, DEFAULT_DIRFILE);
        assert!(store.is_directory());
        assert_eq!(store.dirfile(), Some(".conf"));
        assert_eq!(store.data_path(), PathBuf::from("/etc/app/.conf"));
        assert_eq!(store.base_dir(), PathBuf::from("/etc/app"));
    }
}
