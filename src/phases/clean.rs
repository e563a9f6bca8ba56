//! Clean: release analysis artifacts and send `Finished` sources back to `Cloned`.
//!
//! Clean hooks run in reverse of the run order, inside the source's folder.
//! If a hook fails the fault is recorded, the source stays `Finished` and
//! its `performed_analyses` are kept so the clean can be retried.

use log::{debug, info, warn};

use super::{attribute, select, Operation, PhaseEnv, RunReport, SourceOutcome};
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::plugin::{AddonInit, Addons, AnalysisInit, PluginKind, RunContext};
use crate::source::{Source, SourceDef, SourceState};
use crate::store::SourceStore;
use crate::workdir::WorkingDirGuard;

/// Clean the selected sources (all `Finished` sources if `defs` is empty).
pub fn execute(
    env: &PhaseEnv<'_>,
    store: &mut SourceStore,
    defs: &[SourceDef],
) -> Result<RunReport> {
    let config = env.config;
    env.registry.check(&config.addons, PluginKind::Addon)?;
    env.registry.check(&config.analyses, PluginKind::Analysis)?;

    let mut report = RunReport::new(Operation::Clean);
    let sources = select(store, defs, SourceState::Finished, &mut report);
    if sources.is_empty() {
        debug!("No finished sources to clean");
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
        match clean_one(env, &source, &addons, &mut globs) {
            Ok(()) => {
                info!("Cleaned {}", source.url);
                source.state = SourceState::Cloned;
                source.performed_analyses.clear();
                source.error = None;
            }
            Err(e) => {
                warn!("Clean of {} failed: {}", source.url, e);
                source.fail(&e);
            }
        }

        store.update(&source)?;
        report.outcomes.push(SourceOutcome::from(&source));
    }

    Ok(report)
}

fn clean_one(
    env: &PhaseEnv<'_>,
    source: &Source,
    addons: &Addons,
    globs: &mut ExecutionContext,
) -> Result<()> {
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
    for (id, analysis) in analyses.iter_mut().rev() {
        debug!("Cleaning analysis '{}' on {}", id, source.url);
        analysis
            .clean(&mut ctx)
            .map_err(|e| attribute(e, PluginKind::Analysis, id))?;
    }

    Ok(())
}
