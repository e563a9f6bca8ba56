//! # sourcepipe
//!
//! This library tracks a collection of git repositories ("sources") and drives
//! each of them through a small lifecycle: `New` → `Cloned` → `Finished`.
//! Work is done by plugins registered in a [`plugin::PluginRegistry`]. It
//! backs the `sourcepipe` command-line tool but can be embedded directly.
//!
//! ## Quick Example
//!
//! ```
//! use sourcepipe::context::ExecutionContext;
//! use sourcepipe::source::{SourceDef, SourceFilter, SourceState};
//!
//! // Source definitions accept ids or URLs
//! assert_eq!(SourceDef::parse("3"), SourceDef::Id(sourcepipe::source::SourceId(3)));
//! assert!(matches!(SourceDef::parse("https://example.com/a.git"), SourceDef::Url(_)));
//!
//! // The sources a join runs over
//! let eligible = SourceFilter::state(SourceState::Finished).with_error(false);
//! assert_eq!(eligible.state, Some(SourceState::Finished));
//!
//! // Plugins of one run share a key/value bag
//! let mut globs = ExecutionContext::new();
//! globs.insert("file-stats.1", serde_json::json!({"files": 12}));
//! assert!(globs.contains_key("file-stats.1"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Workspace (`workspace`)**: the directory holding the marker file, the
//!   source list, the source log and the configuration.
//! - **Sources (`source`, `store`)**: the tracked repositories and the store
//!   that persists every change to them immediately.
//! - **Configuration (`config`)**: the ordered lists of enabled addons,
//!   analyses and joins, plus free-form plugin options.
//! - **Plugins (`plugin`, `builtin`)**: the three plugin traits, the registry
//!   that type-checks them, and the plugins shipped with the crate.
//! - **Phases (`phases`)**: the clone, analyze, join and clean operations.
//! - **Pipeline (`pipeline`)**: the facade a front end binds to.
//!
//! ## Failure Isolation
//!
//! Clone, analyze and clean record a fault on the failing source and move on
//! to the next one; a later run retries only what is left. Join faults and
//! store write failures are returned to the caller.

pub mod builtin;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod git;
pub mod output;
pub mod phases;
pub mod pipeline;
pub mod plugin;
pub mod repository;
pub mod source;
pub mod store;
pub mod suggestions;
pub mod workdir;
pub mod workspace;

#[cfg(test)]
mod store_proptest;
