//! Arena-backed configuration tree.
//!
//! `ConfTree` owns every map node of a loaded configuration. Nodes refer to
//! each other through [`NodeId`] handles: a parent holds `Property::Map(child)`
//! under some key and the child keeps a back-reference to that parent. A child
//! has exactly one owner at a time; replacing or removing the owning key clears
//! the child's back-reference, after which the child still exists in the arena
//! but can no longer reach a persistence root.
//!
//! # Example
//!
//! ```
//! use confquill::document::tree::ConfTree;
//! use serde_json::json;
//!
//! let mut tree = ConfTree::new();
//! let data = json!({"server": {"port": 8080}, "tags": ["a", "b"]});
//! let root = tree.build(data.as_object().unwrap(), None);
//!
//! let server = tree.get_property(root, "server").unwrap().as_map().unwrap();
//! assert_eq!(tree.parent(server), Some(root));
//! assert_eq!(tree.eject(root), data);
//! ```

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use super::node::{MapNode, NodeId, Property};
use crate::error::{ConfError, Result};
use crate::file::saver;
use crate::file::storage::{FsStorage, Storage};
use crate::file::store::Store;

/// An arena of map nodes plus the storage adapter used by persistence roots.
#[derive(Debug)]
pub struct ConfTree {
    nodes: Vec<MapNode>,
    storage: Box<dyn Storage>,
    auto_save: bool,
}

impl Default for ConfTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfTree {
    /// Creates an empty tree that persists to the local filesystem.
    pub fn new() -> Self {
        Self::with_storage(FsStorage::default())
    }

    /// Creates an empty tree that persists through the given storage.
    pub fn with_storage<S: Storage + 'static>(storage: S) -> Self {
        Self {
            nodes: Vec::new(),
            storage: Box::new(storage),
            auto_save: false,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Whether writes made through [`set_property`](Self::set_property) with
    /// `propagate_save` trigger a save of the owning persistence root.
    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
    }

    /// Number of nodes ever allocated, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a new, parentless map node.
    pub fn create_root(&mut self, store: Option<Store>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(MapNode::new(store));
        id
    }

    /// Builds a parentless map from plain data. Nested objects become child
    /// maps; arrays and scalars are stored as they are.
    pub fn build(&mut self, data: &Map<String, Value>, store: Option<Store>) -> NodeId {
        let id = self.create_root(store);
        for (key, value) in data {
            let property = match value {
                Value::Object(object) => {
                    let child = self.build(object, None);
                    self.nodes[child.0].parent = Some(id);
                    Property::Map(child)
                }
                other => Property::Value(other.clone()),
            };
            self.nodes[id.0].properties.insert(key.clone(), property);
        }
        id
    }

    /// Returns the node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different tree.
    pub fn node(&self, id: NodeId) -> &MapNode {
        &self.nodes[id.0]
    }

    /// Reads a property of `id` itself, without descending into children.
    pub fn get_property(&self, id: NodeId, key: &str) -> Option<&Property> {
        self.nodes[id.0].properties.get(key)
    }

    pub fn keys(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.nodes[id.0].properties.keys().map(String::as_str)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn store(&self, id: NodeId) -> Option<&Store> {
        self.nodes[id.0].store.as_ref()
    }

    pub fn set_store(&mut self, id: NodeId, store: Option<Store>) {
        self.nodes[id.0].store = store;
    }

    pub fn is_persistence_root(&self, id: NodeId) -> bool {
        self.nodes[id.0].store.is_some()
    }

    /// Iterates `id` and then each of its owners up to the top of the tree.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |node| self.nodes[node.0].parent)
    }

    /// The nearest node at or above `id` that is backed by a store.
    pub fn persistence_root(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|node| self.is_persistence_root(*node))
    }

    /// Directory that relative store paths under `id` resolve against.
    pub fn base_path(&self, id: NodeId) -> Option<PathBuf> {
        self.persistence_root(id)
            .and_then(|root| self.store(root))
            .map(Store::base_dir)
    }

    /// Sets, replaces or deletes (`value == None`) a single property of `id`.
    ///
    /// A plain object value is wrapped into a new child map owned by `id`. An
    /// existing map is re-parented to `id`, leaving its previous slot. Whatever
    /// map previously sat under `key` is detached.
    ///
    /// With `propagate_save`, the write is followed by an auto-save request,
    /// whose failure is returned to the caller.
    pub fn set_property(
        &mut self,
        id: NodeId,
        key: &str,
        value: Option<Property>,
        propagate_save: bool,
    ) -> Result<()> {
        let property = match value {
            None => None,
            Some(Property::Value(Value::Object(object))) => {
                let child = self.build(&object, None);
                self.nodes[child.0].parent = Some(id);
                Some(Property::Map(child))
            }
            Some(Property::Map(child)) => {
                self.adopt(id, key, child)?;
                Some(Property::Map(child))
            }
            Some(other) => Some(other),
        };

        let adopted = property.as_ref().and_then(Property::as_map);
        let previous = match property {
            Some(property) => self.nodes[id.0].properties.insert(key.to_string(), property),
            None => self.nodes[id.0].properties.shift_remove(key),
        };

        if let Some(Property::Map(old)) = previous {
            if Some(old) != adopted {
                debug!(key, node = old.0, "detaching replaced map");
                self.nodes[old.0].parent = None;
            }
        }

        if propagate_save {
            self.request_auto_save(id)?;
        }
        Ok(())
    }

    /// Moves `child` under `id`, vacating the slot of its current owner.
    fn adopt(&mut self, id: NodeId, key: &str, child: NodeId) -> Result<()> {
        if self.ancestors(id).any(|node| node == child) {
            return Err(ConfError::Cycle {
                key: key.to_string(),
            });
        }

        if let Some(owner) = self.nodes[child.0].parent {
            let slot = self.nodes[owner.0]
                .properties
                .iter()
                .find(|(_, property)| property.as_map() == Some(child))
                .map(|(slot, _)| slot.clone());
            if let Some(slot) = slot {
                if owner != id || slot != key {
                    self.nodes[owner.0].properties.shift_remove(&slot);
                }
            }
        }

        self.nodes[child.0].parent = Some(id);
        Ok(())
    }

    /// Converts `id` into plain nested data, leaving out child maps that are
    /// persistence roots of their own.
    pub fn eject(&self, id: NodeId) -> Value {
        self.eject_with(id, false)
    }

    /// Converts `id` into plain nested data, including child persistence roots.
    pub fn eject_all(&self, id: NodeId) -> Value {
        self.eject_with(id, true)
    }

    fn eject_with(&self, id: NodeId, include_roots: bool) -> Value {
        let mut object = Map::new();
        for (key, property) in &self.nodes[id.0].properties {
            match property {
                Property::Value(value) => {
                    object.insert(key.clone(), value.clone());
                }
                Property::Map(child) => {
                    if include_roots || !self.is_persistence_root(*child) {
                        object.insert(key.clone(), self.eject_with(*child, include_roots));
                    }
                }
            }
        }
        Value::Object(object)
    }

    /// Keys of `id` that end up in its own serialized data.
    pub fn serializable_keys(&self, id: NodeId) -> Vec<&str> {
        self.nodes[id.0]
            .properties
            .iter()
            .filter(|(_, property)| match property {
                Property::Map(child) => !self.is_persistence_root(*child),
                Property::Value(_) => true,
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Direct children of `id` that are persistence roots of their own.
    pub fn child_roots(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .properties
            .values()
            .filter_map(Property::as_map)
            .filter(|child| self.is_persistence_root(*child))
            .collect()
    }

    /// Saves the persistence root that owns `id`.
    ///
    /// Intermediate maps forward to their owner. A node that reaches no
    /// persistence root (an in-memory tree, or a detached map) saves nothing.
    pub fn save(&self, id: NodeId) -> Result<()> {
        match self.persistence_root(id) {
            Some(root) => saver::save_root(self, root),
            None => {
                debug!(node = id.0, "no persistence root, nothing to save");
                Ok(())
            }
        }
    }

    /// Saves the owning persistence root if auto-save is enabled.
    pub fn request_auto_save(&self, id: NodeId) -> Result<()> {
        if self.auto_save {
            self.save(id)
        } else {
            Ok(())
        }
    }
}
