//! Implementation of the pipeline operations.
//!
//! ## Overview
//!
//! Sources move through the pipeline one operation at a time:
//! 1. Clone - `New` sources get a working tree and become `Cloned`
//! 2. Analyze - every enabled analysis runs on each `Cloned` source, which
//!    becomes `Finished` once all of them complete
//! 3. Join - every enabled join runs once over all `Finished` sources without
//!    an error
//! 4. Clean - analysis clean hooks run on `Finished` sources, which go back to
//!    `Cloned`; join clean hooks run once over the aggregate
//!
//! Clone, analyze and clean isolate failures per source: a fault is recorded
//! on the source, logged, and the batch moves on. Join does not isolate: the
//! first failing join stops the run and the error is returned.
//!
//! Every per-source result is written through the [`SourceStore`] before the
//! next source starts. A store write failure aborts the operation.

use std::fmt;

use log::warn;

use crate::config::Config;
use crate::error::Error;
use crate::plugin::{PluginKind, PluginRegistry};
use crate::repository::VcsProvider;
use crate::source::{Source, SourceDef, SourceError, SourceFilter, SourceId, SourceState};
use crate::store::{Selection, SourceStore};
use crate::workspace::Workspace;

pub mod analyze;
pub mod clean;
pub mod clone;
pub mod join;
pub mod orchestrator;

/// Read-only collaborators shared by every phase.
pub struct PhaseEnv<'a> {
    pub workspace: &'a Workspace,
    pub config: &'a Config,
    pub registry: &'a PluginRegistry,
    pub vcs: &'a dyn VcsProvider,
}

/// The pipeline operation a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Clone,
    Analyze,
    Join,
    Clean,
    JoinClean,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Clone => "clone",
            Operation::Analyze => "analyze",
            Operation::Join => "join",
            Operation::Clean => "clean",
            Operation::JoinClean => "join-clean",
        })
    }
}

/// What happened to one source during an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub id: SourceId,
    pub url: String,
    /// State after the operation was committed.
    pub state: SourceState,
    pub error: Option<SourceError>,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl From<&Source> for SourceOutcome {
    fn from(source: &Source) -> Self {
        Self {
            id: source.id,
            url: source.url.clone(),
            state: source.state,
            error: source.error.clone(),
        }
    }
}

/// Structured result of one pipeline operation, for a presentation layer
/// to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub operation: Operation,
    pub outcomes: Vec<SourceOutcome>,
    /// Source definitions that did not match any registered source.
    pub missing: Vec<SourceDef>,
}

impl RunReport {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            outcomes: Vec::new(),
            missing: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True when every processed source succeeded and every definition resolved.
    pub fn is_success(&self) -> bool {
        self.missing.is_empty() && self.outcomes.iter().all(SourceOutcome::is_success)
    }
}

/// Select sources for a per-source phase, logging unresolved definitions.
fn select(
    store: &SourceStore,
    defs: &[SourceDef],
    required: SourceState,
    report: &mut RunReport,
) -> Vec<Source> {
    let Selection { sources, missing } = store.get_all(defs, SourceFilter::state(required));
    for def in &missing {
        warn!("{}: no source matches '{}'", report.operation, def);
    }
    report.missing = missing;
    sources
}

/// Attribute a plugin failure to the plugin that raised it.
fn attribute(error: Error, kind: PluginKind, id: &str) -> Error {
    match (kind, error) {
        (_, error @ (Error::Analysis { .. } | Error::Join { .. })) => error,
        (PluginKind::Join, error) => Error::join(id, error.to_string()),
        (_, error) => Error::analysis(id, error.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the phase tests.

    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use super::*;
    use crate::error::Result;
    use crate::plugin::{Analysis, Join, RunContext};
    use crate::repository::RepositoryHandle;

    /// A provider that "clones" by creating a directory, failing for chosen URLs.
    #[derive(Default)]
    pub struct FakeVcs {
        pub failing: Mutex<HashSet<String>>,
        pub clones: Mutex<Vec<String>>,
    }

    impl FakeVcs {
        pub fn failing(urls: &[&str]) -> Self {
            let vcs = Self::default();
            vcs.fail(urls);
            vcs
        }

        pub fn fail(&self, urls: &[&str]) {
            let mut failing = self.failing.lock().unwrap();
            failing.clear();
            failing.extend(urls.iter().map(|u| u.to_string()));
        }
    }

    impl VcsProvider for FakeVcs {
        fn open(&self, path: &Path) -> Result<RepositoryHandle> {
            if path.is_dir() {
                Ok(RepositoryHandle::new(path, Some("0000000".to_string())))
            } else {
                Err(Error::RepositoryNotFound {
                    path: path.display().to_string(),
                })
            }
        }

        fn clone_into(&self, url: &str, path: &Path) -> Result<RepositoryHandle> {
            self.clones.lock().unwrap().push(url.to_string());
            if self.failing.lock().unwrap().contains(url) {
                return Err(Error::GitClone {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                });
            }
            std::fs::create_dir_all(path)?;
            self.open(path)
        }
    }

    /// Shared log of plugin calls, `"<id>:<event>:<detail>"`.
    pub type Calls = Arc<Mutex<Vec<String>>>;

    /// An analysis that records its calls and optionally fails.
    pub struct Recording {
        pub id: String,
        pub url: String,
        pub calls: Calls,
        pub fail_run: bool,
        pub fail_clean: bool,
    }

    impl Analysis for Recording {
        fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:run:{}", self.id, self.url));
            ctx.globs
                .insert(format!("seen.{}", self.id), serde_json::json!(self.url));
            if self.fail_run {
                return Err(Error::analysis(&self.id, "induced failure"));
            }
            Ok(())
        }

        fn clean(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:clean:{}", self.id, self.url));
            if self.fail_clean {
                return Err(Error::analysis(&self.id, "induced clean failure"));
            }
            Ok(())
        }
    }

    /// A join that records the sources it saw.
    pub struct RecordingJoin {
        pub id: String,
        pub urls: Vec<String>,
        pub calls: Calls,
        pub fail: bool,
    }

    impl Join for RecordingJoin {
        fn run(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:run:{}", self.id, self.urls.join(",")));
            if self.fail {
                return Err(Error::join(&self.id, "induced failure"));
            }
            Ok(())
        }

        fn clean(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
            self.calls.lock().unwrap().push(format!("{}:clean", self.id));
            Ok(())
        }
    }

    /// Register a recording analysis. Failing sources are matched by URL.
    pub fn register_analysis(
        registry: &mut PluginRegistry,
        id: &str,
        calls: &Calls,
        fail_run_for: &[&str],
        fail_clean_for: &[&str],
    ) {
        let id_owned = id.to_string();
        let calls = Arc::clone(calls);
        let fail_run_for: Vec<String> = fail_run_for.iter().map(|s| s.to_string()).collect();
        let fail_clean_for: Vec<String> = fail_clean_for.iter().map(|s| s.to_string()).collect();
        registry.register_analysis(id, move |init| {
            let url = init.source.url.clone();
            Ok(Box::new(Recording {
                id: id_owned.clone(),
                fail_run: fail_run_for.contains(&url),
                fail_clean: fail_clean_for.contains(&url),
                url,
                calls: Arc::clone(&calls),
            }))
        });
    }

    pub fn register_join(registry: &mut PluginRegistry, id: &str, calls: &Calls, fail: bool) {
        let id_owned = id.to_string();
        let calls = Arc::clone(calls);
        registry.register_join(id, move |init| {
            Ok(Box::new(RecordingJoin {
                id: id_owned.clone(),
                urls: init.sources.iter().map(|s| s.url.clone()).collect(),
                calls: Arc::clone(&calls),
                fail,
            }))
        });
    }

    /// A fresh workspace with an opened store.
    pub fn workspace() -> (TempDir, Workspace, SourceStore) {
        let temp_dir = TempDir::new().unwrap();
        let workspace = Workspace::init(temp_dir.path()).unwrap();
        let store = SourceStore::open(&workspace).unwrap();
        (temp_dir, workspace, store)
    }

    pub fn config(analyses: &[&str], joins: &[&str]) -> Config {
        Config {
            analyses: analyses.iter().map(|s| s.to_string()).collect(),
            joins: joins.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        }
    }
}
