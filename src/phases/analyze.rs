//! Analyze: run every enabled analysis on each selected `Cloned` source.
//!
//! Addons are loaded once for the whole operation and a single
//! [`ExecutionContext`] is shared by every plugin of the run. For each source
//! the process working directory is switched to the source's folder for the
//! duration of its analyses, and restored before the next source starts.
//!
//! When an analysis fails, the source keeps its `Cloned` state, records the
//! fault, and `performed_analyses` lists the analyses that completed before
//! the failing one.

use log::{debug, info, warn};

use super::{attribute, select, Operation, PhaseEnv, RunReport, SourceOutcome};
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::plugin::{AddonInit, Addons, AnalysisInit, PluginKind, RunContext};
use crate::source::{Source, SourceDef, SourceState};
use crate::store::SourceStore;
use crate::workdir::WorkingDirGuard;

/// Analyze the selected sources (all `Cloned` sources if `defs` is empty).
pub fn execute(
    env: &PhaseEnv<'_>,
    store: &mut SourceStore,
    defs: &[SourceDef],
) -> Result<RunReport> {
    let config = env.config;
    env.registry.check(&config.addons, PluginKind::Addon)?;
    env.registry.check(&config.analyses, PluginKind::Analysis)?;

    let mut report = RunReport::new(Operation::Analyze);
    let sources = select(store, defs, SourceState::Cloned, &mut report);
    if sources.is_empty() {
        debug!("No cloned sources to analyze");
        return Ok(report);
    }

    let mut globs = ExecutionContext::new();
    let addons = env.registry.load_addons(
        &config.addons,
        &AddonInit {
            root: env.workspace.root(),
            options: &config.options,
        },
        &mut globs,
    )?;

    for mut source in sources {
        match analyze_one(env, &source, &addons, &mut globs) {
            Ok(performed) => {
                info!(
                    "Analyzed {} ({} analyses)",
                    source.url,
                    performed.len()
                );
                source.performed_analyses = performed;
                source.state = SourceState::Finished;
                source.error = None;
            }
            Err(failure) => {
                warn!("Analysis of {} failed: {}", source.url, failure.error);
                source.performed_analyses = failure.completed;
                source.fail(&failure.error);
            }
        }

        store.update(&source)?;
        report.outcomes.push(SourceOutcome::from(&source));
    }

    Ok(report)
}

/// A fault during one source's analysis, with the analyses completed before it.
struct Failure {
    completed: Vec<String>,
    error: Error,
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self {
            completed: Vec::new(),
            error,
        }
    }
}

fn analyze_one(
    env: &PhaseEnv<'_>,
    source: &Source,
    addons: &Addons,
    globs: &mut ExecutionContext,
) -> std::result::Result<Vec<String>, Failure> {
    let folder = env.workspace.resolve(&source.folder);
    let _guard = WorkingDirGuard::enter(&folder)?;

    let repository = env.vcs.open(&folder)?;
    let init = AnalysisInit {
        source,
        folder: &folder,
        repository: &repository,
        results_dir: env.workspace.results_dir().join(source.id.to_string()),
        options: &env.config.options,
    };
    let mut analyses = env.registry.load_analyses(&env.config.analyses, &init)?;

    let mut ctx = RunContext {
        addons,
        options: &env.config.options,
        globs,
    };
    let mut completed = Vec::with_capacity(analyses.len());
    for (id, analysis) in analyses.iter_mut() {
        debug!("Running analysis '{}' on {}", id, source.url);
        if let Err(e) = analysis.run(&mut ctx) {
            return Err(Failure {
                completed,
                error: attribute(e, PluginKind::Analysis, id),
            });
        }
        completed.push(id.clone());
    }

    Ok(completed)
}
