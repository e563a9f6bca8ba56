//! The `ignore-patterns` addon.

use std::any::Any;
use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::config::Options;
use crate::error::{Error, Result};
use crate::plugin::Addon;

pub const ID: &str = "ignore-patterns";

/// Option holding the patterns, a string or a list of strings.
pub const OPTION: &str = "ignore";

/// Glob patterns matched against paths relative to a source's folder.
#[derive(Debug, Clone, Default)]
pub struct IgnorePatterns {
    patterns: Vec<Pattern>,
}

impl IgnorePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Build from the `ignore` option. A missing option means no patterns.
    pub fn from_options(options: &Options) -> Result<Self> {
        match options.get(OPTION) {
            None | Some(serde_yaml::Value::Null) => Ok(Self::default()),
            Some(serde_yaml::Value::String(pattern)) => Self::new(&[pattern]),
            Some(serde_yaml::Value::Sequence(items)) => {
                let patterns = items
                    .iter()
                    .map(|item| {
                        item.as_str().ok_or_else(|| Error::Config {
                            message: format!("'{}' entries must be strings", OPTION),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::new(patterns.as_slice())
            }
            Some(_) => Err(Error::Config {
                message: format!("'{}' must be a string or a list of strings", OPTION),
            }),
        }
    }

    /// True if `relative` or its file name matches any pattern.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        let name = relative.file_name().map(Path::new);
        self.patterns.iter().any(|pattern| {
            pattern.matches_path_with(relative, options)
                || name.is_some_and(|name| pattern.matches_path_with(name, options))
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Addon for IgnorePatterns {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
