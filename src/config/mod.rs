//! Options controlling how a configuration is opened and persisted.
//!
//! Options can be built in code, deserialized from any serde source, or
//! loaded from the user's options file and then overridden by command-line
//! flags.
//!
//! # Example
//!
//! ```
//! use confquill::config::Options;
//!
//! let options = Options::default();
//! assert!(!options.autosave);
//! assert_eq!(options.dirfile(), ".conf");
//!
//! let yaml = Options {
//!     extension: Some(".yaml".to_string()),
//!     ..Options::default()
//! };
//! assert_eq!(yaml.dirfile(), ".yaml");
//! ```

use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfError, Result};
use crate::file::store::DEFAULT_DIRFILE;
use crate::format::Format;

/// How to open a configuration.
///
/// # Fields
///
/// * `create` - Write the configuration to disk when it does not exist yet (default: false)
/// * `format` - Codec for every file; inferred from the file extension when unset
/// * `reload` - Bypass the cache and load again (default: false)
/// * `autosave` - Save the owning file after every write (default: false)
/// * `save_on_load` - Save right after loading, persisting merged defaults (default: false)
/// * `writable` - Fail unless the configuration can be written (default: false)
/// * `dirfile` - Name of the file holding a directory's own properties
/// * `extension` - Only load directory entries ending in this suffix
/// * `filter` - Only load directory entries whose full name matches this regex
/// * `create_backup` - Copy files to `<name>.bak` before overwriting (default: false)
/// * `defaults` - Values merged into whatever is loaded (default: none)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub create: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    pub reload: bool,

    pub autosave: bool,

    pub save_on_load: bool,

    pub writable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirfile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    pub create_backup: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Value>,
}

impl Options {
    /// Effective dirfile name: `dirfile`, else `extension`, else `.conf`.
    pub fn dirfile(&self) -> &str {
        self.dirfile
            .as_deref()
            .or(self.extension.as_deref())
            .unwrap_or(DEFAULT_DIRFILE)
    }

    /// Compiles `filter` so that it must match a whole entry name.
    pub fn filter_regex(&self) -> Result<Option<Regex>> {
        let Some(pattern) = &self.filter else {
            return Ok(None);
        };
        Regex::new(&format!("^(?:{})$", pattern))
            .map(Some)
            .map_err(|source| ConfError::InvalidFilter {
                pattern: pattern.clone(),
                source,
            })
    }

    /// Returns the path to the options file.
    ///
    /// Uses `~/.config/confquill/options.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("confquill");
            path.push("options.toml");
            path
        })
    }

    /// Loads options from the default options file.
    ///
    /// Returns the default options if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %config_path.display(), %err, "ignoring malformed options file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
