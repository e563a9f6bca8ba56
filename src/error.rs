//! # Error Handling
//!
//! This module defines the centralized error type for `sourcepipe`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! failure the pipeline can hit, from store lookups to plugin faults.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (URL,
//!   plugin identifier, path) to produce a useful message on its own.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Errors raised while processing a single source are not always propagated.
//! The clone and analyze phases capture them into a [`SourceError`] record
//! with [`SourceError::from_error`], which uses [`Error::kind`] and the
//! `source()` chain to fill the persisted `{kind, message, trace}` fields.
//!
//! [`SourceError`]: crate::source::SourceError
//! [`SourceError::from_error`]: crate::source::SourceError::from_error

use thiserror::Error;

use crate::plugin::PluginKind;

/// Main error type for sourcepipe operations
#[derive(Error, Debug)]
pub enum Error {
    /// A source with this URL is already registered.
    #[error("Source already registered: {url}")]
    DuplicateSource { url: String },

    /// No source matches the given identifier or URL.
    #[error("Source not found: {source_def}")]
    SourceNotFound { source_def: String },

    /// The plugin namespace has no implementation under this identifier.
    #[error("Plugin not found: {kind} '{id}'")]
    PluginNotFound { kind: PluginKind, id: String },

    /// The identifier resolved, but to a different capability.
    #[error("Plugin type mismatch: '{id}' is a {actual} plugin, expected {expected}")]
    PluginTypeMismatch {
        id: String,
        expected: PluginKind,
        actual: PluginKind,
    },

    /// The plugin is already enabled for this kind.
    #[error("Plugin already enabled: {kind} '{id}'")]
    DuplicatePlugin { kind: PluginKind, id: String },

    /// The plugin is not in the enabled list for this kind.
    #[error("Plugin not enabled: {kind} '{id}'")]
    PluginNotEnabled { kind: PluginKind, id: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}: {message}")]
    GitClone { url: String, message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {path}: {command} - {stderr}")]
    GitCommand {
        command: String,
        path: String,
        stderr: String,
    },

    /// The path exists but is not a Git working tree.
    #[error("Not a git repository: {path}")]
    RepositoryNotFound { path: String },

    /// A fault raised by a specific analysis.
    #[error("Analysis '{analysis}' failed: {message}")]
    Analysis { analysis: String, message: String },

    /// A fault raised by a specific join.
    #[error("Join '{join}' failed: {message}")]
    Join { join: String, message: String },

    /// The directory does not contain an initialized workspace.
    #[error("Not a sourcepipe workspace: {path}")]
    NotInitialized { path: String },

    /// `init` was called on a directory that is already a workspace.
    #[error("Workspace already initialized: {path}")]
    AlreadyInitialized { path: String },

    /// The workspace was created by an incompatible version.
    #[error("Workspace version {found} is incompatible with {expected}")]
    IncompatibleWorkspace { found: String, expected: String },

    /// The persisted source store is inconsistent.
    #[error("Source store error: {message}")]
    Store { message: String },

    /// The configuration file is invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Stable name of the fault kind, persisted in a source's error record.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::DuplicateSource { .. } => "DuplicateSource",
            Error::SourceNotFound { .. } | Error::PluginNotFound { .. } => "NotFound",
            Error::PluginTypeMismatch { .. } => "PluginTypeMismatch",
            Error::DuplicatePlugin { .. } => "DuplicatePlugin",
            Error::PluginNotEnabled { .. } => "PluginNotEnabled",
            Error::GitClone { .. } => "CloneFault",
            Error::GitCommand { .. } => "GitCommand",
            Error::RepositoryNotFound { .. } => "RepositoryNotFound",
            Error::Analysis { .. } => "AnalysisFault",
            Error::Join { .. } => "JoinFault",
            Error::NotInitialized { .. } => "NotInitialized",
            Error::AlreadyInitialized { .. } => "AlreadyInitialized",
            Error::IncompatibleWorkspace { .. } => "IncompatibleWorkspace",
            Error::Store { .. } => "Store",
            Error::Config { .. } => "Config",
            Error::Io(_) => "Io",
            Error::Yaml(_) => "Yaml",
            Error::Json(_) => "Json",
            Error::Semver(_) => "Semver",
            Error::Glob(_) => "Glob",
            Error::Walk(_) => "Walk",
        }
    }

    /// Wrap an arbitrary message as a fault of the named analysis.
    pub fn analysis(analysis: &str, message: impl Into<String>) -> Self {
        Error::Analysis {
            analysis: analysis.to_string(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary message as a fault of the named join.
    pub fn join(join: &str, message: impl Into<String>) -> Self {
        Error::Join {
            join: join.to_string(),
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
