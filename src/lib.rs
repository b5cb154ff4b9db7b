//! ConfQuill - hierarchical file/directory configuration.
//!
//! A configuration is loaded from a single file or from a directory tree,
//! where every file and directory becomes a persistence root that saves
//! itself. Values are read and written with a compact path query language:
//!
//! - `a.b` - property `b` of map `a`
//! - `a|b` - `a`, or `b` if `a` is absent
//! - `a.[b|c].d` - `a.b.d`, or `a.c.d` if the former is absent
//!
//! Writes always target the first alternative of a query and create any
//! missing intermediate maps.

pub mod conf;
pub mod config;
pub mod document;
pub mod error;
pub mod file;
pub mod format;
pub mod query;

pub use conf::{Conf, ConfCache};
pub use config::Options;
pub use error::{ConfError, Result};
pub use format::Format;
