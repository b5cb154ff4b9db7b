//! Configuration saving.
//!
//! Writes a persistence root through the tree's [`Storage`](super::storage::Storage).
//! Child persistence roots are saved first, each into its own file or
//! directory; the root then writes only its own serializable data.

use tracing::debug;

use crate::document::node::NodeId;
use crate::document::tree::ConfTree;
use crate::error::{ConfError, Result};

/// Saves the persistence root `root` and every persistence root below it.
///
/// A directory root whose own map holds nothing but child roots does not
/// write its dirfile, but the directory itself is created.
///
/// Calling this on a node without a store does nothing.
pub fn save_root(tree: &ConfTree, root: NodeId) -> Result<()> {
    let Some(store) = tree.store(root) else {
        return Ok(());
    };
    let storage = tree.storage();

    for child in tree.child_roots(root) {
        save_root(tree, child)?;
    }

    if store.is_directory() {
        storage
            .create_dir_all(store.path())
            .map_err(|source| ConfError::io(store.path(), source))?;
        if tree.serializable_keys(root).is_empty() {
            debug!(path = %store.path().display(), "directory has no own data, skipping dirfile");
            return Ok(());
        }
    }

    let data_path = store.data_path();
    let text = store
        .format()
        .stringify(&tree.eject(root))
        .map_err(|source| ConfError::codec(&data_path, source))?;

    debug!(path = %data_path.display(), "writing config");
    storage
        .write(&data_path, &text)
        .map_err(|source| ConfError::io(&data_path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::Property;
    use crate::file::memory::MemoryStorage;
    use crate::file::store::{Store, DEFAULT_DIRFILE};
    use crate::format::Format;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn read_json(storage: &MemoryStorage, path: &str) -> Value {
        serde_json::from_str(&storage.contents(path).unwrap()).unwrap()
    }

    #[test]
    fn test_save_file_root() {
        let storage = MemoryStorage::new();
        let mut tree = ConfTree::with_storage(storage.clone());
        let root = tree.build(
            json!({"a": 1, "b": {"c": [1, 2]}}).as_object().unwrap(),
            Some(Store::file("/cfg/app.json", Format::Json)),
        );

        save_root(&tree, root).unwrap();

        assert_eq!(read_json(&storage, "/cfg/app.json"), json!({"a": 1, "b": {"c": [1, 2]}}));
    }

    #[test]
    fn test_save_directory_writes_children_then_dirfile() {
        let storage = MemoryStorage::new();
        let mut tree = ConfTree::with_storage(storage.clone());
        let root = tree.build(
            json!({"own": true}).as_object().unwrap(),
            Some(Store::directory("/cfg", Format::Json, DEFAULT_DIRFILE)),
        );
        let child = tree.build(
            json!({"x": 1}).as_object().unwrap(),
            Some(Store::file("/cfg/db.json", Format::Json)),
        );
        tree.set_property(root, "db", Some(Property::Map(child)), false)
            .unwrap();

        save_root(&tree, root).unwrap();

        assert_eq!(
            storage.writes(),
            vec![PathBuf::from("/cfg/db.json"), PathBuf::from("/cfg/.conf")]
        );
        assert_eq!(read_json(&storage, "/cfg/.conf"), json!({"own": true}));
        assert_eq!(read_json(&storage, "/cfg/db.json"), json!({"x": 1}));
    }

    #[test]
    fn test_directory_without_own_data_skips_dirfile() {
        let storage = MemoryStorage::new();
        let mut tree = ConfTree::with_storage(storage.clone());
        let root = tree.create_root(Some(Store::directory("/cfg", Format::Json, ".conf")));
        let child = tree.build(
            json!({"x": 1}).as_object().unwrap(),
            Some(Store::file("/cfg/db.json", Format::Json)),
        );
        tree.set_property(root, "db", Some(Property::Map(child)), false)
            .unwrap();

        save_root(&tree, root).unwrap();

        assert_eq!(storage.writes(), vec![PathBuf::from("/cfg/db.json")]);
        assert!(storage.contents("/cfg/.conf").is_none());
    }

    #[test]
    fn test_save_uses_store_format() {
        let storage = MemoryStorage::new();
        let mut tree = ConfTree::with_storage(storage.clone());
        let root = tree.build(
            json!({"name": "demo"}).as_object().unwrap(),
            Some(Store::file("/cfg/app.yaml", Format::Yaml)),
        );

        save_root(&tree, root).unwrap();

        assert_eq!(storage.contents("/cfg/app.yaml").unwrap(), "name: demo\n");
    }

    #[test]
    fn test_write_failure_names_path() {
        let storage = MemoryStorage::new().with_file("/cfg/app.json", "{}");
        storage.set_readonly("/cfg/app.json");
        let mut tree = ConfTree::with_storage(storage);
        let root = tree.create_root(Some(Store::file("/cfg/app.json", Format::Json)));

        let err = save_root(&tree, root).unwrap_err();
        match err {
            ConfError::Io { path, .. } => assert_eq!(path, PathBuf::from("/cfg/app.json")),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
