//! Default file names and locations inside a sourcepipe workspace.
//!
//! This module centralizes the layout of the four persisted artifacts so the
//! workspace, store and config modules agree on where things live.

use std::path::PathBuf;

/// Marker file that identifies an initialized workspace.
pub const MARKER_FILENAME: &str = ".sourcepipe";

/// Plain-text source list, one URL per line in insertion order.
pub const SOURCES_FILENAME: &str = "sources.txt";

/// Structured log keyed by source id.
pub const SOURCE_LOG_FILENAME: &str = "sources.yaml";

/// Pipeline configuration file.
pub const CONFIG_FILENAME: &str = "sourcepipe.yaml";

/// Directory, relative to the workspace root, that holds working clones.
pub const REPOS_DIRNAME: &str = "repos";

/// Directory, relative to the workspace root, where built-in plugins write results.
pub const RESULTS_DIRNAME: &str = "results";

/// Environment variable that overrides the workspace root for the CLI.
pub const ROOT_ENV_VAR: &str = "SOURCEPIPE_ROOT";

/// Returns the default workspace root.
///
/// Falls back to `.` if the current directory cannot be determined.
pub fn default_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
