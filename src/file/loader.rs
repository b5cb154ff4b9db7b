//! Configuration loading.
//!
//! A path is either a single file, decoded with its format, or a directory.
//! A directory's own properties live in its dirfile (an absent dirfile reads
//! as an empty map); every other entry that passes the name filters is loaded
//! recursively and attached under its file stem. Backups (`*.bak`) and
//! scratch files left by an interrupted write (`*.tmp`) are skipped. Each
//! file and directory becomes a persistence root of its own.

use std::path::Path;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::Options;
use crate::document::node::{NodeId, Property};
use crate::document::tree::ConfTree;
use crate::error::{ConfError, Result};
use crate::file::storage::is_scratch_file;
use crate::file::store::Store;
use crate::format::Format;

/// Result of loading a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    /// The persistence root for the loaded path.
    pub root: NodeId,
    /// Persistence roots created from `$dir`/`$file` defaults. They are not
    /// on disk yet.
    pub created: Vec<NodeId>,
}

/// Loads `path` into `tree` and merges `options.defaults` into it.
///
/// # Errors
///
/// - [`ConfError::Io`] if the path does not exist or cannot be read
/// - [`ConfError::Unwritable`] if `options.writable` is set and the path is read-only
/// - [`ConfError::Codec`] if a file does not decode
/// - [`ConfError::InvalidFilter`] if `options.filter` is not a valid regex
/// - [`ConfError::Conflict`] if the defaults collide with loaded data
pub fn load(tree: &mut ConfTree, path: &Path, options: &Options) -> Result<Loaded> {
    let filter = options.filter_regex()?;
    let root = load_node(tree, path, options, filter.as_ref())?;

    let base_path = tree.store(root).map(Store::base_dir);
    let created = match &options.defaults {
        Some(defaults) => tree.assign_defaults(root, defaults, base_path.as_deref())?,
        None => Vec::new(),
    };

    debug!(
        path = %path.display(),
        nodes = tree.len(),
        created = created.len(),
        "loaded configuration"
    );
    Ok(Loaded { root, created })
}

fn load_node(
    tree: &mut ConfTree,
    path: &Path,
    options: &Options,
    filter: Option<&Regex>,
) -> Result<NodeId> {
    let storage = tree.storage();
    if !storage.exists(path) {
        return Err(ConfError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        ));
    }
    if options.writable && !storage.is_writable(path) {
        return Err(ConfError::Unwritable {
            path: path.to_path_buf(),
        });
    }

    if storage.is_directory(path) {
        load_directory(tree, path, options, filter)
    } else {
        load_file(tree, path, options)
    }
}

fn load_file(tree: &mut ConfTree, path: &Path, options: &Options) -> Result<NodeId> {
    let format = options
        .format
        .or_else(|| Format::from_path(path))
        .unwrap_or_default();
    let text = tree
        .storage()
        .read(path)
        .map_err(|source| ConfError::io(path, source))?;
    let data = format
        .parse(&text)
        .map_err(|source| ConfError::codec(path, source))?;

    debug!(path = %path.display(), ?format, "loaded file");
    Ok(tree.build(&data, Some(Store::file(path, format))))
}

fn load_directory(
    tree: &mut ConfTree,
    path: &Path,
    options: &Options,
    filter: Option<&Regex>,
) -> Result<NodeId> {
    let dirfile = options.dirfile();
    let format = options
        .format
        .or_else(|| dirfile_format(dirfile))
        .unwrap_or_default();
    let store = Store::directory(path, format, dirfile);

    let storage = tree.storage();
    let data_path = store.data_path();
    let data = if storage.exists(&data_path) {
        let text = storage
            .read(&data_path)
            .map_err(|source| ConfError::io(&data_path, source))?;
        format
            .parse(&text)
            .map_err(|source| ConfError::codec(&data_path, source))?
    } else {
        Default::default()
    };
    let entries = storage
        .enumerate(path)
        .map_err(|source| ConfError::io(path, source))?;

    let id = tree.build(&data, Some(store));

    for entry in entries {
        if entry == dirfile {
            continue;
        }
        if filter.is_some_and(|regex| !regex.is_match(&entry)) {
            debug!(entry, "filtered out");
            continue;
        }
        let child_path = path.join(&entry);
        let is_directory = tree.storage().is_directory(&child_path);
        if !is_directory && is_scratch_file(&entry) {
            debug!(entry, "skipping backup or scratch file");
            continue;
        }
        if let Some(extension) = &options.extension {
            if !is_directory && !entry.ends_with(extension.as_str()) {
                continue;
            }
        }

        let key = if is_directory {
            entry.clone()
        } else {
            file_stem(&entry).to_string()
        };
        if tree.get_property(id, &key).is_some() {
            warn!(entry, key, "entry shadows a key already defined in the directory");
        }

        let child = load_node(tree, &child_path, options, filter)?;
        tree.set_property(id, &key, Some(Property::Map(child)), false)?;
    }

    debug!(path = %path.display(), "loaded directory");
    Ok(id)
}

/// Guesses a directory's format from its dirfile, e.g. `.yaml` or `_index.toml`.
fn dirfile_format(dirfile: &str) -> Option<Format> {
    Format::from_path(dirfile).or_else(|| dirfile.strip_prefix('.').and_then(Format::from_name))
}

/// `app.json` → `app`, `app.json.gz` → `app`, `.hidden` → `.hidden`.
fn file_stem(name: &str) -> &str {
    let base = name.strip_suffix(".gz").unwrap_or(name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}
