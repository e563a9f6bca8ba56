//! The `file-stats` analysis: file counts and sizes per extension.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::ignore::{self, IgnorePatterns};
use super::{remove_result, write_result};
use crate::error::Result;
use crate::plugin::{Analysis, AnalysisInit, RunContext};
use crate::source::SourceId;

pub const ID: &str = "file-stats";

/// Extension bucket for files without one.
const NO_EXTENSION: &str = "(none)";

/// Counts for one group of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub files: u64,
    pub bytes: u64,
}

impl Tally {
    fn add(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

/// The result document written per source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub total: Tally,
    pub ignored: u64,
    pub extensions: BTreeMap<String, Tally>,
}

pub struct FileStats {
    source: SourceId,
    folder: PathBuf,
    results_dir: PathBuf,
}

impl FileStats {
    pub fn new(init: &AnalysisInit<'_>) -> Self {
        Self {
            source: init.source.id,
            folder: init.folder.to_path_buf(),
            results_dir: init.results_dir.clone(),
        }
    }
}

/// Walk `folder`, skipping `.git` and anything matched by `ignore`.
pub fn collect(folder: &Path, ignore: Option<&IgnorePatterns>) -> Result<Report> {
    let mut report = Report::default();
    let is_ignored = |path: &Path| {
        let relative = path.strip_prefix(folder).unwrap_or(path);
        ignore.is_some_and(|patterns| patterns.is_ignored(relative))
    };

    let mut walker = WalkDir::new(folder).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        if entry.file_type().is_dir() {
            if entry.file_name() == ".git" || is_ignored(entry.path()) {
                walker.skip_current_dir();
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        if is_ignored(entry.path()) {
            report.ignored += 1;
            continue;
        }

        let bytes = entry.metadata()?.len();
        let extension = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        report.total.add(bytes);
        report.extensions.entry(extension).or_default().add(bytes);
    }

    Ok(report)
}

impl Analysis for FileStats {
    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        let ignore = ctx.addons.get_as::<IgnorePatterns>(ignore::ID);
        let report = collect(&self.folder, ignore)?;
        debug!(
            "{}: {} files, {} bytes in {}",
            ID,
            report.total.files,
            report.total.bytes,
            self.folder.display()
        );

        write_result(&self.results_dir, ID, &report)?;
        ctx.globs
            .insert_as(format!("{}.{}", ID, self.source), &report.total)?;
        Ok(())
    }

    fn clean(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        ctx.globs.remove(&format!("{}.{}", ID, self.source));
        remove_result(&self.results_dir, ID)
    }
}
