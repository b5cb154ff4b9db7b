//! Merging default values into a loaded tree.
//!
//! Defaults only fill gaps: a key that already exists keeps its value at every
//! depth. A defaults object may also describe where a missing child should be
//! persisted, by carrying one of these marker fields:
//!
//! - `"$dir"`: the child becomes a directory root. The value names the
//!   subdirectory, or is `true` for the key itself.
//! - `"$file"`: the child becomes a file root. The value names the file, or is
//!   `true` for `<key>.<extension>`.
//! - `"$format"`: optional codec for the new root (`json`, `yaml`, `toml`).
//!
//! Every other field of a marked entry is a default for the new child.
//!
//! ```
//! use confquill::document::tree::ConfTree;
//! use serde_json::json;
//!
//! let mut tree = ConfTree::new();
//! let root = tree.build(json!({"a": {"x": 1}}).as_object().unwrap(), None);
//! tree.assign_defaults(root, &json!({"a": {"x": 0, "y": 2}, "b": 3}), None)
//!     .unwrap();
//! assert_eq!(tree.eject(root), json!({"a": {"x": 1, "y": 2}, "b": 3}));
//! ```

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::node::{NodeId, Property};
use super::tree::ConfTree;
use crate::error::{ConfError, Result};
use crate::file::store::{Store, DEFAULT_DIRFILE};
use crate::format::Format;

pub const DIR_MARKER: &str = "$dir";
pub const FILE_MARKER: &str = "$file";
pub const FORMAT_MARKER: &str = "$format";

fn is_marker_key(key: &str) -> bool {
    matches!(key, DIR_MARKER | FILE_MARKER | FORMAT_MARKER)
}

/// Returns a defaults object without its marker fields.
pub fn strip_markers(defaults: &Map<String, Value>) -> Map<String, Value> {
    defaults
        .iter()
        .filter(|(key, _)| !is_marker_key(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    Directory,
    File,
}

/// Persistence description carried by a defaults entry.
#[derive(Debug)]
struct Marker {
    kind: MarkerKind,
    name: Option<String>,
    format: Option<Format>,
}

fn conflict(key: &str, reason: impl Into<String>) -> ConfError {
    ConfError::Conflict {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn marker_name(key: &str, marker: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Bool(true) => Ok(None),
        Value::String(name) if !name.is_empty() => Ok(Some(name.clone())),
        _ => Err(conflict(
            key,
            format!("'{}' must be a non-empty string or true", marker),
        )),
    }
}

fn read_marker(key: &str, entry: &Map<String, Value>) -> Result<Option<Marker>> {
    let format = match entry.get(FORMAT_MARKER) {
        None => None,
        Some(Value::String(name)) => Some(
            Format::from_name(name)
                .ok_or_else(|| conflict(key, format!("unknown format '{}'", name)))?,
        ),
        Some(_) => return Err(conflict(key, "'$format' must be a string")),
    };

    let marker = match (entry.get(DIR_MARKER), entry.get(FILE_MARKER)) {
        (None, None) => return Ok(None),
        (Some(_), Some(_)) => return Err(conflict(key, "both '$dir' and '$file' are set")),
        (Some(value), None) => Marker {
            kind: MarkerKind::Directory,
            name: marker_name(key, DIR_MARKER, value)?,
            format,
        },
        (None, Some(value)) => Marker {
            kind: MarkerKind::File,
            name: marker_name(key, FILE_MARKER, value)?,
            format,
        },
    };
    Ok(Some(marker))
}

impl ConfTree {
    /// Merges `defaults` into the map `id` without overwriting existing data.
    ///
    /// `base_path` is the directory that `$dir`/`$file` markers resolve
    /// against; without one, marked entries become plain inline maps.
    ///
    /// Returns the persistence roots created from markers, outermost first.
    /// They exist only in memory until saved.
    ///
    /// # Errors
    ///
    /// Returns [`ConfError::Conflict`] when a marked entry targets a key that
    /// already holds a non-map value, or when a marker is malformed.
    pub fn assign_defaults(
        &mut self,
        id: NodeId,
        defaults: &Value,
        base_path: Option<&Path>,
    ) -> Result<Vec<NodeId>> {
        let mut created = Vec::new();
        if let Value::Object(defaults) = defaults {
            // Nothing is touched unless the whole structure merges cleanly.
            self.check_defaults(Some(id), defaults)?;
            self.merge_defaults(id, defaults, base_path, &mut created)?;
        }
        Ok(created)
    }

    /// Walks `defaults` alongside the map `id` (or alongside nothing, for a
    /// subtree that does not exist yet) and reports the first malformed
    /// marker or marker that collides with a non-map value.
    fn check_defaults(&self, id: Option<NodeId>, defaults: &Map<String, Value>) -> Result<()> {
        for (key, entry) in defaults {
            if is_marker_key(key) {
                continue;
            }
            let Value::Object(entry) = entry else {
                continue;
            };
            let marker = read_marker(key, entry)?;
            match id.and_then(|id| self.get_property(id, key)) {
                Some(Property::Map(child)) => self.check_defaults(Some(*child), entry)?,
                Some(Property::Value(_)) => {
                    if marker.is_some() {
                        return Err(conflict(
                            key,
                            "a directory/file default collides with an existing non-map value",
                        ));
                    }
                }
                None => self.check_defaults(None, entry)?,
            }
        }
        Ok(())
    }

    fn merge_defaults(
        &mut self,
        id: NodeId,
        defaults: &Map<String, Value>,
        base_path: Option<&Path>,
        created: &mut Vec<NodeId>,
    ) -> Result<()> {
        // Existing properties win; only recurse into maps.
        let existing: Vec<(String, Property)> = self
            .node(id)
            .properties()
            .iter()
            .map(|(key, property)| (key.clone(), property.clone()))
            .collect();

        for (key, property) in existing {
            if is_marker_key(&key) {
                continue;
            }
            let Some(Value::Object(entry)) = defaults.get(&key) else {
                continue;
            };
            if let Property::Map(child) = property {
                let child_base = self
                    .store(child)
                    .map(Store::base_dir)
                    .or_else(|| base_path.map(Path::to_path_buf));
                self.merge_defaults(child, &strip_markers(entry), child_base.as_deref(), created)?;
            }
        }

        // Fill the gaps.
        for (key, entry) in defaults {
            if is_marker_key(key) || self.get_property(id, key).is_some() {
                continue;
            }
            let Value::Object(entry) = entry else {
                self.set_property(id, key, Some(entry.clone().into()), false)?;
                continue;
            };

            match (read_marker(key, entry)?, base_path) {
                (Some(marker), Some(base)) => {
                    let store = self.marker_store(id, key, &marker, base);
                    let child_base = store.base_dir();
                    debug!(key, path = %store.path().display(), "creating persistence root from defaults");
                    let child = self.create_root(Some(store));
                    self.set_property(id, key, Some(Property::Map(child)), false)?;
                    created.push(child);
                    self.merge_defaults(child, &strip_markers(entry), Some(&child_base), created)?;
                }
                (marker, base) => {
                    if marker.is_some() {
                        warn!(key, "no base path for directory/file default, keeping it inline");
                    }
                    let child = self.create_root(None);
                    self.set_property(id, key, Some(Property::Map(child)), false)?;
                    self.merge_defaults(child, &strip_markers(entry), base, created)?;
                }
            }
        }
        Ok(())
    }

    /// Resolves a marker into a store, inheriting format and dirfile from the
    /// persistence root that encloses `id`.
    fn marker_store(&self, id: NodeId, key: &str, marker: &Marker, base: &Path) -> Store {
        let enclosing = self.persistence_root(id).and_then(|root| self.store(root));
        let inherited_format = enclosing.map(Store::format).unwrap_or_default();

        match marker.kind {
            MarkerKind::Directory => {
                let name = marker.name.clone().unwrap_or_else(|| key.to_string());
                let dirfile = enclosing
                    .and_then(Store::dirfile)
                    .unwrap_or(DEFAULT_DIRFILE);
                Store::directory(
                    base.join(name),
                    marker.format.unwrap_or(inherited_format),
                    dirfile,
                )
            }
            MarkerKind::File => {
                let (name, format) = match &marker.name {
                    Some(name) => {
                        let format = marker
                            .format
                            .or_else(|| Format::from_path(name))
                            .unwrap_or(inherited_format);
                        (name.clone(), format)
                    }
                    None => {
                        let format = marker.format.unwrap_or(inherited_format);
                        (format!("{}.{}", key, format.extension()), format)
                    }
                };
                Store::file(base.join(name), format)
            }
        }
    }
}
