//! Path queries for reading and writing configuration values.
//!
//! # Syntax
//!
//! - `name` - A property of the current map. Any character other than
//!   `.`, `|`, `[` and `]` is part of the name
//! - `a.b` - Property `b` of map `a`
//! - `a|b` - Alternatives, tried in order when reading
//! - `[a|b]` - A bracketed group of alternatives used as a single step
//!
//! Consecutive delimiters are not collapsed: `a..b` reads the property with
//! the empty name between `a` and `b`.
//!
//! # Examples
//!
//! ```
//! use confquill::query::Parser;
//!
//! let query = Parser::parse("server.[primary|fallback].port").unwrap();
//! assert_eq!(query.to_string(), "server.[primary|fallback].port");
//! assert_eq!(query.len(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{Path, PathComponent, Step, Switch};
pub use error::SyntaxError;
pub use parser::Parser;
