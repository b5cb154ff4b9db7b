//! Persistence: where configuration data lives and how it is read and written.
//!
//! Files are written atomically, optionally with a `.bak` backup, and files
//! ending in `.gz` are gzip-compressed.

pub mod loader;
pub mod memory;
pub mod saver;
pub mod storage;
pub mod store;
