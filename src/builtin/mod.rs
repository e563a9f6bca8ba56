//! Plugins shipped with sourcepipe.
//!
//! | id                | kind     | result                              |
//! |-------------------|----------|-------------------------------------|
//! | `ignore-patterns` | addon    | shared matcher built from `ignore`  |
//! | `file-stats`      | analysis | `results/<id>/file-stats.yaml`      |
//! | `commit-count`    | analysis | `results/<id>/commit-count.yaml`    |
//! | `summary`         | join     | `results/summary.yaml`              |
//!
//! Every analysis writes at most one YAML document named after itself into
//! the source's results directory. The `summary` join relies on that layout.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::plugin::PluginRegistry;
use crate::workspace::write_atomic;

pub mod commit_count;
pub mod file_stats;
pub mod ignore;
pub mod summary;

pub use commit_count::CommitCount;
pub use file_stats::FileStats;
pub use ignore::IgnorePatterns;
pub use summary::Summary;

/// Register every built-in plugin.
pub fn register(registry: &mut PluginRegistry) {
    registry.register_addon(ignore::ID, |init, globs| {
        let patterns = IgnorePatterns::from_options(init.options)?;
        globs.insert_as(format!("{}.count", ignore::ID), &patterns.len())?;
        Ok(Box::new(patterns))
    });
    registry.register_analysis(file_stats::ID, |init| Ok(Box::new(FileStats::new(init))));
    registry.register_analysis(commit_count::ID, |init| {
        Ok(Box::new(CommitCount::new(init)))
    });
    registry.register_join(summary::ID, |init| Ok(Box::new(Summary::new(init))));
}

/// Serialize `value` as YAML into `dir/<name>.yaml`.
fn write_result<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value)?;
    write_atomic(&dir.join(format!("{}.yaml", name)), &yaml)
}

/// Remove `dir/<name>.yaml`, then `dir` itself once it is empty.
fn remove_result(dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(format!("{}.yaml", name));
    if path.exists() {
        fs::remove_file(&path)?;
    }
    if dir.is_dir() && fs::read_dir(dir)?.next().is_none() {
        fs::remove_dir(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginKind;
    use tempfile::TempDir;

    #[test]
    fn test_register_builtins() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(
            registry.available(),
            vec![
                ("commit-count", PluginKind::Analysis),
                ("file-stats", PluginKind::Analysis),
                ("ignore-patterns", PluginKind::Addon),
                ("summary", PluginKind::Join),
            ]
        );
    }

    #[test]
    fn test_remove_result_prunes_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("1");
        write_result(&dir, "one", &1u32).unwrap();
        write_result(&dir, "two", &2u32).unwrap();

        remove_result(&dir, "one").unwrap();
        assert!(dir.is_dir());
        remove_result(&dir, "two").unwrap();
        assert!(!dir.exists());

        // Removing again is a no-op.
        remove_result(&dir, "two").unwrap();
    }
}
