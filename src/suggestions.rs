//! # Error Suggestions
//!
//! Helpers that turn library errors into messages telling the user what went
//! wrong and what to try next. The CLI routes every library error through
//! [`explain`] before returning it.
//!
//! ```rust,ignore
//! let pipeline = Pipeline::open(&root).map_err(|e| suggestions::explain(e, &root, &registry))?;
//! ```

use std::path::Path;

use crate::error::Error;
use crate::plugin::{PluginKind, PluginRegistry};

/// Attach hints to a library error where a useful one exists.
pub fn explain(error: Error, root: &Path, registry: &PluginRegistry) -> anyhow::Error {
    match error {
        Error::NotInitialized { .. } => not_initialized(root),
        Error::AlreadyInitialized { .. } => already_initialized(root),
        Error::PluginNotFound { kind, id } => {
            let available: Vec<&str> = registry
                .available()
                .into_iter()
                .filter(|(_, k)| *k == kind)
                .map(|(id, _)| id)
                .collect();
            plugin_not_found(kind, &id, &available)
        }
        Error::SourceNotFound { source_def } => source_not_found(&source_def),
        other => other.into(),
    }
}

/// The directory has no workspace marker.
pub fn not_initialized(root: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Not a sourcepipe workspace: {root}\n\n\
         hint: Run 'sourcepipe init' to create one here\n\
         hint: Use --root or SOURCEPIPE_ROOT to point at an existing workspace",
        root = root.display()
    )
}

/// `init` on a directory that already holds a workspace.
pub fn already_initialized(root: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Workspace already initialized: {root}\n\n\
         hint: Use 'sourcepipe add <url>' to track more repositories",
        root = root.display()
    )
}

/// An identifier that does not name a plugin of the requested kind.
pub fn plugin_not_found(kind: PluginKind, id: &str, available: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(id, available)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let listing = if available.is_empty() {
        format!("No {kind} plugins are available")
    } else {
        format!("Available {kind} plugins: {}", available.join(", "))
    };

    anyhow::anyhow!(
        "Plugin not found: {kind} '{id}'{did_you_mean}\n\n\
         {listing}\n\
         hint: Run 'sourcepipe plugin list' to see every plugin"
    )
}

/// A source definition that matched nothing.
pub fn source_not_found(def: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Source not found: {def}\n\n\
         hint: Refer to a source by its id or its exact URL\n\
         hint: Run 'sourcepipe ls' to list tracked sources"
    )
}

/// A run that completed with per-source failures.
pub fn run_failed(operation: &str, failed: usize, missing: usize) -> anyhow::Error {
    let mut parts = Vec::new();
    if failed > 0 {
        parts.push(format!("{failed} source(s) failed"));
    }
    if missing > 0 {
        parts.push(format!("{missing} source definition(s) did not match"));
    }

    anyhow::anyhow!(
        "{operation}: {summary}\n\n\
         hint: Run 'sourcepipe ls --errors' to see the recorded faults\n\
         hint: Fix the cause and rerun '{operation}' to retry only what is left",
        summary = parts.join(", ")
    )
}

/// Closest candidate within an edit distance of 2.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, edit_distance(input, candidate)))
        .filter(|&(_, distance)| distance <= 2 && distance < input.len())
        .min_by_key(|&(_, distance)| distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, one row at a time.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != *cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }

    row[b.len()]
}
