//! Evaluation of parsed path queries against a [`ConfTree`].
//!
//! Reads (`travel`) are best effort and yield `None` on any dead end. Writes
//! (`assign`) walk every component but the last with forced traversal
//! (`reach`), materializing missing intermediate maps, and then set or delete
//! the leaf key.
//!
//! Alternation is asymmetric on purpose: a read returns the first alternative
//! that resolves, while a write always targets the first alternative.

use super::ast::{Path, PathComponent, Step, Switch};
use crate::document::node::{NodeId, Property};
use crate::document::tree::ConfTree;
use crate::error::{ConfError, Result};

impl Step {
    /// Looks up this step's key on `map` itself.
    pub fn travel<'t>(&self, tree: &'t ConfTree, map: NodeId) -> Option<&'t Property> {
        tree.get_property(map, self.id())
    }

    /// Returns the child map under this key, creating an empty one if absent.
    pub fn reach(&self, tree: &mut ConfTree, map: NodeId) -> Result<NodeId> {
        match tree.get_property(map, self.id()) {
            Some(Property::Map(child)) => Ok(*child),
            Some(Property::Value(_)) => Err(ConfError::Traversal {
                key: self.id().to_string(),
            }),
            None => {
                let child = tree.create_root(None);
                tree.set_property(map, self.id(), Some(Property::Map(child)), false)?;
                Ok(child)
            }
        }
    }

    /// Sets the key on `map`, or deletes it when `value` is `None`.
    pub fn assign(&self, tree: &mut ConfTree, map: NodeId, value: Option<Property>) -> Result<()> {
        tree.set_property(map, self.id(), value, true)
    }
}

impl Path {
    /// Follows every component in order, stopping at the first dead end.
    pub fn travel<'t>(&self, tree: &'t ConfTree, map: NodeId) -> Option<&'t Property> {
        let (first, rest) = self.components().split_first()?;
        let mut current = first.travel(tree, map)?;
        for component in rest {
            let node = current.as_map()?;
            current = component.travel(tree, node)?;
        }
        Some(current)
    }

    /// Forced traversal: every component must end at a map, created if missing.
    pub fn reach(&self, tree: &mut ConfTree, map: NodeId) -> Result<NodeId> {
        let mut node = map;
        for component in self.components() {
            node = component.reach(tree, node)?;
        }
        Ok(node)
    }

    /// Creates the waypoints leading to the last component, then assigns it.
    pub fn assign(&self, tree: &mut ConfTree, map: NodeId, value: Option<Property>) -> Result<()> {
        let (last, waypoints) = self.components().split_last().ok_or(ConfError::EmptyPath)?;
        let mut node = map;
        for component in waypoints {
            node = component.reach(tree, node)?;
        }
        last.assign(tree, node, value)
    }
}

impl Switch {
    /// Returns the result of the first alternative that resolves.
    pub fn travel<'t>(&self, tree: &'t ConfTree, map: NodeId) -> Option<&'t Property> {
        self.paths().iter().find_map(|path| path.travel(tree, map))
    }

    /// Forced traversal follows the first alternative only.
    pub fn reach(&self, tree: &mut ConfTree, map: NodeId) -> Result<NodeId> {
        self.paths()
            .first()
            .ok_or(ConfError::EmptyPath)?
            .reach(tree, map)
    }

    /// Writes always target the first alternative, whether or not another
    /// alternative currently resolves.
    pub fn assign(&self, tree: &mut ConfTree, map: NodeId, value: Option<Property>) -> Result<()> {
        self.paths()
            .first()
            .ok_or(ConfError::EmptyPath)?
            .assign(tree, map, value)
    }
}

impl PathComponent {
    pub fn travel<'t>(&self, tree: &'t ConfTree, map: NodeId) -> Option<&'t Property> {
        match self {
            PathComponent::Step(step) => step.travel(tree, map),
            PathComponent::Path(path) => path.travel(tree, map),
            PathComponent::Switch(switch) => switch.travel(tree, map),
        }
    }

    pub fn reach(&self, tree: &mut ConfTree, map: NodeId) -> Result<NodeId> {
        match self {
            PathComponent::Step(step) => step.reach(tree, map),
            PathComponent::Path(path) => path.reach(tree, map),
            PathComponent::Switch(switch) => switch.reach(tree, map),
        }
    }

    pub fn assign(&self, tree: &mut ConfTree, map: NodeId, value: Option<Property>) -> Result<()> {
        match self {
            PathComponent::Step(step) => step.assign(tree, map, value),
            PathComponent::Path(path) => path.assign(tree, map, value),
            PathComponent::Switch(switch) => switch.assign(tree, map, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Parser;
    use serde_json::{json, Value};

    fn make_test_tree(data: Value) -> (ConfTree, NodeId) {
        let mut tree = ConfTree::new();
        let root = tree.build(data.as_object().unwrap(), None);
        (tree, root)
    }

    fn get(tree: &ConfTree, root: NodeId, query: &str) -> Option<Property> {
        Parser::parse(query).unwrap().travel(tree, root).cloned()
    }

    fn put(tree: &mut ConfTree, root: NodeId, query: &str, value: Value) -> Result<()> {
        Parser::parse(query)
            .unwrap()
            .assign(tree, root, Some(value.into()))
    }

    #[test]
    fn test_evaluate_dotted_path() {
        let (tree, root) = make_test_tree(json!({"a": {"b": 1}}));
        assert_eq!(get(&tree, root, "a.b"), Some(json!(1).into()));
        assert_eq!(get(&tree, root, "a.c"), None);
        assert_eq!(get(&tree, root, "x.b"), None);
    }

    #[test]
    fn test_evaluate_returns_maps() {
        let (tree, root) = make_test_tree(json!({"a": {"b": {"c": true}}}));
        let b = get(&tree, root, "a.b").unwrap().as_map().unwrap();
        assert_eq!(tree.eject(b), json!({"c": true}));
    }

    #[test]
    fn test_evaluate_through_scalar_is_absent() {
        let (tree, root) = make_test_tree(json!({"a": 5, "arr": [1, 2]}));
        assert_eq!(get(&tree, root, "a.b"), None);
        assert_eq!(get(&tree, root, "arr.0"), None);
    }

    #[test]
    fn test_explicit_null_is_not_absent() {
        let (tree, root) = make_test_tree(json!({"a": null, "b": 2}));
        assert_eq!(get(&tree, root, "a|b"), Some(json!(null).into()));
    }

    #[test]
    fn test_alternation_first_match_wins() {
        let (tree, root) = make_test_tree(json!({"a": {"x": 1}, "b": {"x": 2}}));
        assert_eq!(get(&tree, root, "[a|b].x"), Some(json!(1).into()));
        assert_eq!(get(&tree, root, "[b|a].x"), Some(json!(2).into()));
    }

    #[test]
    fn test_alternation_falls_back() {
        let (tree, root) = make_test_tree(json!({"a": {"y": 1}, "b": {"x": 2}}));
        assert_eq!(get(&tree, root, "[a|b].x"), Some(json!(2).into()));
        assert_eq!(get(&tree, root, "a.x|b.x"), Some(json!(2).into()));
        assert_eq!(get(&tree, root, "[a|b].z"), None);
    }

    #[test]
    fn test_nested_switch_inside_path() {
        let (tree, root) = make_test_tree(json!({"a": {"c": {"d": "found"}}}));
        assert_eq!(get(&tree, root, "a.[b|c].d"), Some(json!("found").into()));
        assert_eq!(get(&tree, root, "a[b|c].d"), Some(json!("found").into()));
    }

    #[test]
    fn test_empty_key_step() {
        let (tree, root) = make_test_tree(json!({"a": {"": {"b": 3}}}));
        assert_eq!(get(&tree, root, "a..b"), Some(json!(3).into()));
    }

    #[test]
    fn test_assign_targets_first_alternative() {
        let (mut tree, root) = make_test_tree(json!({"b": {"x": 2}}));
        put(&mut tree, root, "[a|b].x", json!(9)).unwrap();
        assert_eq!(tree.eject(root), json!({"b": {"x": 2}, "a": {"x": 9}}));
    }

    #[test]
    fn test_assign_materializes_intermediate_maps() {
        let mut tree = ConfTree::new();
        let root = tree.create_root(None);
        put(&mut tree, root, "p.q.r", json!("leaf")).unwrap();

        let p = get(&tree, root, "p").unwrap();
        let q = get(&tree, root, "p.q").unwrap();
        assert!(p.is_map());
        assert!(q.is_map());
        assert_eq!(tree.parent(q.as_map().unwrap()), p.as_map());
        assert_eq!(get(&tree, root, "p.q.r"), Some(json!("leaf").into()));
    }

    #[test]
    fn test_assign_through_scalar_fails() {
        let (mut tree, root) = make_test_tree(json!({"a": 1}));
        let err = put(&mut tree, root, "a.b", json!(2)).unwrap_err();
        assert!(matches!(err, ConfError::Traversal { ref key } if key == "a"));
        assert_eq!(tree.eject(root), json!({"a": 1}));
    }

    #[test]
    fn test_assign_through_array_fails() {
        let (mut tree, root) = make_test_tree(json!({"list": [1]}));
        let err = put(&mut tree, root, "list.0", json!(2)).unwrap_err();
        assert!(matches!(err, ConfError::Traversal { .. }));
    }

    #[test]
    fn test_assign_none_deletes() {
        let (mut tree, root) = make_test_tree(json!({"a": {"b": 1, "c": 2}}));
        Parser::parse("a.b")
            .unwrap()
            .assign(&mut tree, root, None)
            .unwrap();
        assert_eq!(tree.eject(root), json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_assign_object_value_becomes_map() {
        let mut tree = ConfTree::new();
        let root = tree.create_root(None);
        put(&mut tree, root, "server", json!({"port": 80})).unwrap();
        assert!(get(&tree, root, "server").unwrap().is_map());
        assert_eq!(get(&tree, root, "server.port"), Some(json!(80).into()));
    }

    #[test]
    fn test_assign_with_nested_switch_waypoint() {
        let mut tree = ConfTree::new();
        let root = tree.create_root(None);
        put(&mut tree, root, "a.[b|c].d", json!(1)).unwrap();
        assert_eq!(tree.eject(root), json!({"a": {"b": {"d": 1}}}));
    }

    #[test]
    fn test_assign_to_trailing_switch_uses_first() {
        let (mut tree, root) = make_test_tree(json!({"a": {"c": 1}}));
        put(&mut tree, root, "a.[b|c]", json!(2)).unwrap();
        assert_eq!(tree.eject(root), json!({"a": {"c": 1, "b": 2}}));
    }

    #[test]
    fn test_empty_structures() {
        let mut tree = ConfTree::new();
        let root = tree.create_root(None);
        assert!(Path::default().travel(&tree, root).is_none());
        assert!(Switch::default().travel(&tree, root).is_none());
        assert!(matches!(
            Path::default().assign(&mut tree, root, None),
            Err(ConfError::EmptyPath)
        ));
        assert!(matches!(
            Switch::default().assign(&mut tree, root, None),
            Err(ConfError::EmptyPath)
        ));
        assert_eq!(Path::default().reach(&mut tree, root).unwrap(), root);
    }
}
