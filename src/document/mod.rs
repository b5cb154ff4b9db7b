//! The in-memory configuration tree.

pub mod defaults;
pub mod node;
pub mod tree;
