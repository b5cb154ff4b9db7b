//! Opening configurations and working with them through path queries.
//!
//! # Example
//!
//! ```
//! use confquill::Conf;
//! use serde_json::json;
//!
//! let data = json!({"server": {"port": 8080}});
//! let defaults = json!({"server": {"host": "localhost"}});
//! let mut conf = Conf::from_map(data.as_object().unwrap(), Some(&defaults)).unwrap();
//!
//! assert_eq!(conf.get("server.port").unwrap(), Some(json!(8080)));
//! assert_eq!(conf.get("server.host").unwrap(), Some(json!("localhost")));
//! assert_eq!(conf.get("client.port|server.port").unwrap(), Some(json!(8080)));
//!
//! conf.put("client.retries", json!(3)).unwrap();
//! assert_eq!(conf.get("client").unwrap(), Some(json!({"retries": 3})));
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Options;
use crate::document::node::{NodeId, Property};
use crate::document::tree::ConfTree;
use crate::error::{ConfError, Result};
use crate::file::loader;
use crate::file::storage::{FsStorage, Storage};
use crate::file::store::Store;
use crate::format::Format;
use crate::query::{Parser, Switch};

/// A loaded configuration: a tree plus the root map that queries start from.
#[derive(Debug)]
pub struct Conf {
    tree: ConfTree,
    root: NodeId,
}

impl Conf {
    /// Opens the first of `paths` that exists, on the local filesystem.
    ///
    /// When none exists, `options.defaults` is required: a new file root is
    /// created at the first path and filled with the defaults. It is written
    /// to disk only with `options.create`.
    pub fn open<P: AsRef<Path>>(paths: &[P], options: &Options) -> Result<Self> {
        let storage = FsStorage::new().with_backup(options.create_backup);
        Self::open_with(storage, paths, options)
    }

    /// Like [`open`](Self::open), through the given storage.
    pub fn open_with<S, P>(storage: S, paths: &[P], options: &Options) -> Result<Self>
    where
        S: Storage + 'static,
        P: AsRef<Path>,
    {
        let mut tree = ConfTree::with_storage(storage);
        let paths: Vec<PathBuf> = paths.iter().map(|path| path.as_ref().to_path_buf()).collect();

        let existing = paths.iter().find(|path| tree.storage().exists(path)).cloned();
        let root = match existing {
            Some(path) => {
                let loaded = loader::load(&mut tree, &path, options)?;
                if options.save_on_load {
                    tree.save(loaded.root)?;
                } else if options.create {
                    for created in &loaded.created {
                        tree.save(*created)?;
                    }
                }
                loaded.root
            }
            None => {
                let (Some(path), Some(defaults)) = (paths.first().cloned(), &options.defaults)
                else {
                    return Err(ConfError::NotFound { paths });
                };
                let format = options
                    .format
                    .or_else(|| Format::from_path(&path))
                    .unwrap_or_default();
                let store = Store::file(&path, format);
                let base_path = store.base_dir();

                debug!(path = %path.display(), "creating configuration from defaults");
                let root = tree.create_root(Some(store));
                tree.assign_defaults(root, defaults, Some(&base_path))?;
                if options.create || options.save_on_load {
                    tree.save(root)?;
                }
                root
            }
        };

        tree.set_auto_save(options.autosave);
        Ok(Self { tree, root })
    }

    /// Creates a configuration that lives only in memory. Saving it does
    /// nothing.
    pub fn from_map(data: &Map<String, Value>, defaults: Option<&Value>) -> Result<Self> {
        let mut tree = ConfTree::new();
        let root = tree.build(data, None);
        if let Some(defaults) = defaults {
            tree.assign_defaults(root, defaults, None)?;
        }
        Ok(Self { tree, root })
    }

    /// Reads the value at `query`. Maps come back as plain nested data.
    ///
    /// Returns `Ok(None)` when nothing is found; fails only if the query does
    /// not parse.
    pub fn get(&self, query: &str) -> Result<Option<Value>> {
        let query = Parser::parse(query)?;
        Ok(self.lookup(&query))
    }

    /// Reads the value at an already parsed query.
    pub fn lookup(&self, query: &Switch) -> Option<Value> {
        query
            .travel(&self.tree, self.root)
            .map(|property| match property {
                Property::Value(value) => value.clone(),
                Property::Map(id) => self.tree.eject_all(*id),
            })
    }

    /// Writes `value` at `query`, creating intermediate maps as needed.
    ///
    /// With auto-save on, the owning file is saved before this returns and a
    /// failed save is reported here.
    pub fn put(&mut self, query: &str, value: Value) -> Result<()> {
        Parser::parse(query)?.assign(&mut self.tree, self.root, Some(value.into()))
    }

    /// Deletes the key at `query`.
    pub fn remove(&mut self, query: &str) -> Result<()> {
        Parser::parse(query)?.assign(&mut self.tree, self.root, None)
    }

    /// Saves the whole configuration.
    pub fn save(&self) -> Result<()> {
        self.tree.save(self.root)
    }

    /// The whole configuration as plain nested data.
    pub fn eject(&self) -> Value {
        self.tree.eject_all(self.root)
    }

    pub fn tree(&self) -> &ConfTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ConfTree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}

/// Configurations opened so far, keyed by path.
///
/// Opening any path of an already opened configuration returns the cached
/// instance; every path given to [`open`](Self::open) becomes an alias for it.
/// When those paths were aliases of different instances, the first one found
/// takes them all and an instance left without aliases is dropped.
/// `options.reload` loads again and replaces the cached instance.
#[derive(Debug, Default)]
pub struct ConfCache {
    entries: HashMap<usize, Conf>,
    index: HashMap<PathBuf, usize>,
    next_slot: usize,
}

impl ConfCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open<P: AsRef<Path>>(&mut self, paths: &[P], options: &Options) -> Result<&mut Conf> {
        let keys: Vec<PathBuf> = paths.iter().map(|path| cache_key(path.as_ref())).collect();
        let cached = keys
            .iter()
            .find_map(|key| self.index.get(key).copied())
            .filter(|slot| self.entries.contains_key(slot));

        let fresh = match cached {
            Some(slot) if !options.reload => {
                debug!(slot, "configuration served from cache");
                None
            }
            _ => Some(Conf::open(paths, options)?),
        };
        let slot = cached.unwrap_or_else(|| {
            self.next_slot += 1;
            self.next_slot - 1
        });

        for key in keys {
            self.index.insert(key, slot);
        }
        let live: HashSet<usize> = self.index.values().copied().collect();
        self.entries.retain(|slot, _| {
            let keep = live.contains(slot);
            if !keep {
                debug!(slot, "dropping configuration without aliases");
            }
            keep
        });

        Ok(match self.entries.entry(slot) {
            Entry::Occupied(mut entry) => {
                if let Some(conf) = fresh {
                    entry.insert(conf);
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => match fresh {
                Some(conf) => entry.insert(conf),
                None => entry.insert(Conf::open(paths, options)?),
            },
        })
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&Conf> {
        let slot = self.index.get(&cache_key(path.as_ref()))?;
        self.entries.get(slot)
    }

    /// Number of distinct configurations held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
