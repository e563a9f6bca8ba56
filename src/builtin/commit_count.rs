//! The `commit-count` analysis.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{remove_result, write_result};
use crate::error::Result;
use crate::git;
use crate::plugin::{Analysis, AnalysisInit, RunContext};

pub const ID: &str = "commit-count";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub commits: u64,
    pub head: Option<String>,
}

pub struct CommitCount {
    folder: PathBuf,
    head: Option<String>,
    results_dir: PathBuf,
}

impl CommitCount {
    pub fn new(init: &AnalysisInit<'_>) -> Self {
        Self {
            folder: init.folder.to_path_buf(),
            head: init.repository.head().map(str::to_string),
            results_dir: init.results_dir.clone(),
        }
    }
}

impl Analysis for CommitCount {
    fn run(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        // An unborn HEAD has no commits to count.
        let commits = match self.head {
            Some(_) => git::commit_count(&self.folder)?,
            None => 0,
        };
        let report = Report {
            commits,
            head: self.head.clone(),
        };
        write_result(&self.results_dir, ID, &report)
    }

    fn clean(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        remove_result(&self.results_dir, ID)
    }
}
