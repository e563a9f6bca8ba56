//! The `summary` join: one document gathering every source's results.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use super::write_result;
use crate::error::Result;
use crate::plugin::{Join, JoinInit, RunContext};
use crate::source::{Source, SourceId};

pub const ID: &str = "summary";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: SourceId,
    pub url: String,
    pub analyses: Vec<String>,
    /// Result documents keyed by the analysis that wrote them.
    pub results: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub sources: Vec<Entry>,
}

pub struct Summary {
    sources: Vec<Source>,
    results_dir: PathBuf,
}

impl Summary {
    pub fn new(init: &JoinInit<'_>) -> Self {
        Self {
            sources: init.sources.to_vec(),
            results_dir: init.results_dir.clone(),
        }
    }

    fn path(&self) -> PathBuf {
        self.results_dir.join(format!("{}.yaml", ID))
    }

    fn entry(&self, source: &Source) -> Result<Entry> {
        let mut results = BTreeMap::new();
        let dir = self.results_dir.join(source.id.to_string());
        if dir.is_dir() {
            let pattern = dir.join("*.yaml");
            for path in glob::glob(&pattern.to_string_lossy())? {
                let path = path.map_err(|e| e.into_error())?;
                let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                let value = serde_yaml::from_str(&fs::read_to_string(&path)?)?;
                results.insert(name, value);
            }
        }

        Ok(Entry {
            id: source.id,
            url: source.url.clone(),
            analyses: source.performed_analyses.clone(),
            results,
        })
    }
}

impl Join for Summary {
    fn run(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        let sources = self
            .sources
            .iter()
            .map(|source| self.entry(source))
            .collect::<Result<Vec<_>>>()?;
        debug!("{}: {} sources", ID, sources.len());
        write_result(&self.results_dir, ID, &Document { sources })
    }

    fn clean(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
