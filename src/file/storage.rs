//! Storage adapter used by persistence roots.
//!
//! The [`Storage`] trait is the narrow I/O surface the configuration tree
//! depends on. [`FsStorage`] is the production implementation;
//! [`MemoryStorage`](super::memory::MemoryStorage) is an in-memory double.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Suffix of the copy made before a file is overwritten.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Suffix of the scratch file an atomic write renames into place.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Whether `name` is a backup or a leftover scratch file rather than data.
pub fn is_scratch_file(name: &str) -> bool {
    name.ends_with(BACKUP_SUFFIX) || name.ends_with(TEMP_SUFFIX)
}

/// File and directory primitives needed to load and save configurations.
pub trait Storage: fmt::Debug {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a directory.
    fn is_directory(&self, path: &Path) -> bool;

    /// Whether [`write`](Self::write) may replace `path`, or create files
    /// inside it when it is a directory. False if `path` does not exist.
    fn is_writable(&self, path: &Path) -> bool;

    /// Reads the whole file at `path` as UTF-8 text.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Replaces the file at `path` with `data`, creating parent directories.
    fn write(&self, path: &Path, data: &str) -> io::Result<()>;

    /// Creates `path` and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Names of the entries directly inside the directory at `path`, sorted.
    fn enumerate(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Local filesystem storage.
///
/// Files whose name ends in `.gz` are transparently gzip-decompressed on read
/// and compressed on write. Writes are atomic: data goes to a temp file that
/// is then renamed over the target.
#[derive(Debug, Clone, Default)]
pub struct FsStorage {
    create_backup: bool,
}

impl FsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy an existing file to `<name>.bak` before overwriting it.
    pub fn with_backup(mut self, create_backup: bool) -> Self {
        self.create_backup = create_backup;
        self
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}

/// Reads and decompresses a gzipped file.
fn read_gzipped_file(path: &Path) -> io::Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder.read_to_string(&mut content)?;
    Ok(content)
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup(path: &Path) -> io::Result<()> {
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid file name"))?;
    backup_path.set_file_name(format!("{}{}", original_name, BACKUP_SUFFIX));
    fs::copy(path, backup_path)?;
    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
fn write_file_atomic(path: &Path, data: &[u8], compress: bool) -> io::Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Invalid file name"))?;
    temp_name.push(TEMP_SUFFIX);
    let temp_path = path.with_file_name(temp_name);

    if compress {
        let file = fs::File::create(&temp_path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(data)?;
        encoder.finish()?;
    } else {
        fs::write(&temp_path, data)?;
    }

    fs::rename(&temp_path, path)
}

#[cfg(unix)]
fn has_write_access(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn has_write_access(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

impl Storage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory(&self, path: &Path) -> bool {
        fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
    }

    /// Files are replaced by renaming a scratch file next to them, so what
    /// counts is write access to the containing directory, not the file mode.
    fn is_writable(&self, path: &Path) -> bool {
        if !path.exists() {
            return false;
        }
        if self.is_directory(path) {
            return has_write_access(path);
        }
        match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            Some(parent) => has_write_access(parent),
            None => has_write_access(Path::new(".")),
        }
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        if is_gzipped(path) {
            read_gzipped_file(path)
        } else {
            fs::read_to_string(path)
        }
    }

    fn write(&self, path: &Path, data: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if self.create_backup && path.exists() {
            create_backup(path)?;
        }
        write_file_atomic(path, data.as_bytes(), is_gzipped(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn enumerate(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path)? {
            let name = entry?.file_name();
            match name.into_string() {
                Ok(name) => names.push(name),
                Err(name) => tracing::warn!(?name, "skipping entry with non UTF-8 name"),
            }
        }
        names.sort();
        Ok(names)
    }
}
