//! Map node representation.
//!
//! A configuration tree is made of map nodes stored in a [`ConfTree`] arena.
//! Each node maps string keys to [`Property`] values, which are either plain
//! data (scalars and arrays) or an owning reference to a child map.
//!
//! # Example
//!
//! ```
//! use confquill::document::node::Property;
//! use serde_json::json;
//!
//! let scalar = Property::from(json!(42));
//! assert!(!scalar.is_map());
//! assert_eq!(scalar.as_value(), Some(&json!(42)));
//! ```
//!
//! [`ConfTree`]: super::tree::ConfTree

use indexmap::IndexMap;
use serde_json::Value;

use crate::file::store::Store;

/// Handle to a map node inside a [`ConfTree`](super::tree::ConfTree).
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena slot of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A value held under a key of a map node.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Scalar or array data. Arrays are never wrapped into maps, even when
    /// they contain objects.
    Value(Value),
    /// An owned child map.
    Map(NodeId),
}

impl Property {
    /// Returns true if this property is a child map.
    pub fn is_map(&self) -> bool {
        matches!(self, Property::Map(_))
    }

    /// Returns the child map handle, if this property is a map.
    pub fn as_map(&self) -> Option<NodeId> {
        match self {
            Property::Map(id) => Some(*id),
            Property::Value(_) => None,
        }
    }

    /// Returns the plain value, if this property is not a map.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Property::Value(value) => Some(value),
            Property::Map(_) => None,
        }
    }
}

impl From<Value> for Property {
    fn from(value: Value) -> Self {
        Property::Value(value)
    }
}

impl From<NodeId> for Property {
    fn from(id: NodeId) -> Self {
        Property::Map(id)
    }
}

/// A single map node.
///
/// `parent` points back at the node that currently holds this one under some
/// key, and is only used to find the persistence root. `store` is set on
/// persistence roots only.
#[derive(Debug, Clone, Default)]
pub struct MapNode {
    pub(crate) properties: IndexMap<String, Property>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) store: Option<Store>,
}

impl MapNode {
    pub(crate) fn new(store: Option<Store>) -> Self {
        Self {
            properties: IndexMap::new(),
            parent: None,
            store,
        }
    }

    /// Properties in insertion order.
    pub fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The backing store, present only on persistence roots.
    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }
}
