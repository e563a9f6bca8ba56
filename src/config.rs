//! # Pipeline Configuration
//!
//! This module defines the `sourcepipe.yaml` file: the ordered lists of
//! enabled addons, analyses and joins, plus a free-form option map that is
//! handed read-only to every plugin.
//!
//! ```yaml
//! addons:
//!   - ignore-patterns
//! analyses:
//!   - file-stats
//!   - commit-count
//! joins:
//!   - summary
//! options:
//!   ignore: ["*.lock", "vendor/**"]
//! ```
//!
//! Order matters: plugins are instantiated and run in the order listed here,
//! and each identifier may appear at most once per list.
//!
//! [`ConfigStore`] owns the file on disk and persists after every mutation.
//! A mutation whose result cannot be written is reported as an error and
//! leaves the in-memory copy untouched.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plugin::PluginKind;
use crate::workspace::write_atomic;

/// Free-form option values.
pub type Options = BTreeMap<String, serde_yaml::Value>;

/// Process-wide pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub addons: Vec<String>,
    #[serde(default)]
    pub analyses: Vec<String>,
    #[serde(default)]
    pub joins: Vec<String>,
    #[serde(default)]
    pub options: Options,
}

impl Config {
    /// Parse a configuration from YAML, rejecting duplicate identifiers.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| Error::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Atomically write the configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        write_atomic(path, &yaml)
    }

    /// Enabled identifiers of one plugin kind, in registration order.
    pub fn plugins(&self, kind: PluginKind) -> &[String] {
        match kind {
            PluginKind::Addon => &self.addons,
            PluginKind::Analysis => &self.analyses,
            PluginKind::Join => &self.joins,
        }
    }

    fn plugins_mut(&mut self, kind: PluginKind) -> &mut Vec<String> {
        match kind {
            PluginKind::Addon => &mut self.addons,
            PluginKind::Analysis => &mut self.analyses,
            PluginKind::Join => &mut self.joins,
        }
    }

    /// Append a plugin identifier to the list for `kind`.
    pub fn add_plugin(&mut self, kind: PluginKind, id: &str) -> Result<()> {
        let list = self.plugins_mut(kind);
        if list.iter().any(|existing| existing == id) {
            return Err(Error::DuplicatePlugin {
                kind,
                id: id.to_string(),
            });
        }
        list.push(id.to_string());
        Ok(())
    }

    /// Remove a plugin identifier from the list for `kind`.
    pub fn remove_plugin(&mut self, kind: PluginKind, id: &str) -> Result<()> {
        let list = self.plugins_mut(kind);
        let position =
            list.iter()
                .position(|existing| existing == id)
                .ok_or_else(|| Error::PluginNotEnabled {
                    kind,
                    id: id.to_string(),
                })?;
        list.remove(position);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for kind in PluginKind::ALL {
            let mut seen = HashSet::new();
            for id in self.plugins(kind) {
                if !seen.insert(id.as_str()) {
                    return Err(Error::Config {
                        message: format!("{} '{}' is listed more than once", kind, id),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The configuration file together with its loaded contents.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Load the configuration stored at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            config: Config::load(path)?,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn add_plugin(&mut self, kind: PluginKind, id: &str) -> Result<()> {
        self.mutate(|config| config.add_plugin(kind, id))
    }

    pub fn remove_plugin(&mut self, kind: PluginKind, id: &str) -> Result<()> {
        self.mutate(|config| config.remove_plugin(kind, id))
    }

    pub fn set_option(&mut self, name: &str, value: serde_yaml::Value) -> Result<()> {
        self.mutate(|config| {
            config.options.insert(name.to_string(), value);
            Ok(())
        })
    }

    /// Remove an option, returning its previous value if it was set.
    pub fn unset_option(&mut self, name: &str) -> Result<Option<serde_yaml::Value>> {
        let mut previous = None;
        self.mutate(|config| {
            previous = config.options.remove(name);
            Ok(())
        })?;
        Ok(previous)
    }

    /// Apply a change to a copy, persist it, then commit it in memory.
    fn mutate<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Config) -> Result<()>,
    {
        let mut updated = self.config.clone();
        change(&mut updated)?;
        updated.save(&self.path)?;
        self.config = updated;
        Ok(())
    }
}
