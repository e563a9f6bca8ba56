//! # Source Records
//!
//! A [`Source`] is one tracked repository. Its lifecycle is tracked by
//! [`SourceState`], which only moves forward (`New -> Cloned -> Finished`)
//! except through an explicit clean, which takes a `Finished` source back to
//! `Cloned`.
//!
//! The `error` field is independent of `state`: a failed analysis leaves the
//! source `Cloned` with an error attached, so it can be retried without
//! cloning again.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::REPOS_DIRNAME;
use crate::error::{Error, Result};

/// Stable identifier of a source, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pipeline lifecycle state of a source.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    /// Registered but not yet cloned.
    #[default]
    New,
    /// A working clone exists.
    Cloned,
    /// Every active analysis completed on the most recent run.
    Finished,
}

impl SourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceState::New => "new",
            SourceState::Cloned => "cloned",
            SourceState::Finished => "finished",
        }
    }
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(SourceState::New),
            "cloned" => Ok(SourceState::Cloned),
            "finished" => Ok(SourceState::Finished),
            other => Err(Error::Store {
                message: format!("unknown source state '{}'", other),
            }),
        }
    }
}

/// The recorded fault of the most recent failed operation on a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    /// Fault kind, as returned by [`Error::kind`].
    pub kind: String,
    /// Display message of the fault.
    pub message: String,
    /// Messages of the underlying causes, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<String>,
}

impl SourceError {
    /// Capture an error, walking its `source()` chain for the trace.
    pub fn from_error(error: &Error) -> Self {
        let mut trace = Vec::new();
        let mut cause = std::error::Error::source(error);
        while let Some(inner) = cause {
            trace.push(inner.to_string());
            cause = inner.source();
        }

        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            trace,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// One tracked repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub url: String,
    /// Working directory, relative to the workspace root.
    pub folder: PathBuf,
    pub state: SourceState,
    /// Analyses completed by the most recent analyze run.
    pub performed_analyses: Vec<String>,
    pub error: Option<SourceError>,
}

impl Source {
    /// Create a fresh `New` record.
    pub fn new(id: SourceId, url: impl Into<String>, folder: PathBuf) -> Self {
        Self {
            id,
            url: url.into(),
            folder,
            state: SourceState::New,
            performed_analyses: Vec::new(),
            error: None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Record a failure without touching `state`.
    pub fn fail(&mut self, error: &Error) {
        self.error = Some(SourceError::from_error(error));
    }
}

/// A reference to a source, either by identifier or by URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceDef {
    Id(SourceId),
    Url(String),
}

impl SourceDef {
    /// Parse user input. Anything that is a plain integer is treated as an id.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<u64>() {
            Ok(id) => SourceDef::Id(SourceId(id)),
            Err(_) => SourceDef::Url(input.trim().to_string()),
        }
    }

    pub fn matches(&self, source: &Source) -> bool {
        match self {
            SourceDef::Id(id) => source.id == *id,
            SourceDef::Url(url) => source.url == *url,
        }
    }
}

impl From<SourceId> for SourceDef {
    fn from(id: SourceId) -> Self {
        SourceDef::Id(id)
    }
}

impl From<&str> for SourceDef {
    fn from(input: &str) -> Self {
        SourceDef::parse(input)
    }
}

impl From<String> for SourceDef {
    fn from(input: String) -> Self {
        SourceDef::parse(&input)
    }
}

impl fmt::Display for SourceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDef::Id(id) => write!(f, "{}", id),
            SourceDef::Url(url) => f.write_str(url),
        }
    }
}

/// Predicate used to select sources. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceFilter {
    pub state: Option<SourceState>,
    pub has_error: Option<bool>,
}

impl SourceFilter {
    /// A filter that matches every source.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn state(state: SourceState) -> Self {
        Self {
            state: Some(state),
            has_error: None,
        }
    }

    pub fn with_error(mut self, has_error: bool) -> Self {
        self.has_error = Some(has_error);
        self
    }

    pub fn matches(&self, source: &Source) -> bool {
        self.state.is_none_or(|state| source.state == state)
            && self
                .has_error
                .is_none_or(|has_error| source.has_error() == has_error)
    }
}

/// Derive the working folder for a URL, relative to the workspace root.
///
/// The folder name is built from the host and path of the URL. Scp-style
/// remotes (`git@host:org/repo.git`) and local paths are supported.
pub fn folder_for_url(url: &str) -> PathBuf {
    PathBuf::from(REPOS_DIRNAME).join(slug_for_url(url))
}

fn slug_for_url(url: &str) -> String {
    let raw = match url::Url::parse(url) {
        Ok(parsed) if parsed.host_str().is_some() => {
            format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path())
        }
        Ok(parsed) => parsed.path().to_string(),
        // No scheme: either scp-style `user@host:path` or a plain path.
        Err(_) => match url.split_once(':') {
            Some((host, path)) if !host.contains('/') => {
                let host = host.rsplit('@').next().unwrap_or(host);
                format!("{}/{}", host, path)
            }
            _ => url.to_string(),
        },
    };

    let trimmed = raw.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let mut slug = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let slug = slug.trim_matches(|c| c == '_' || c == '.').to_string();
    if slug.is_empty() {
        "source".to_string()
    } else {
        slug
    }
}
