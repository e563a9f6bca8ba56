//! Join: run every enabled join once over the finished, error-free sources.
//!
//! Joins see the aggregate, so failures are not isolated. The first failing
//! join stops the run and its error is returned to the caller. Source records
//! are never modified by this phase.

use log::{debug, info};

use super::{attribute, Operation, PhaseEnv, RunReport, SourceOutcome};
use crate::context::ExecutionContext;
use crate::error::Result;
use crate::plugin::{AddonInit, Join, JoinInit, PluginKind, RunContext};
use crate::source::{Source, SourceFilter, SourceState};
use crate::store::SourceStore;

/// The sources a join operates on.
pub fn eligible(store: &SourceStore) -> Vec<Source> {
    store
        .get_all(
            &[],
            SourceFilter::state(SourceState::Finished).with_error(false),
        )
        .sources
}

/// Run every enabled join over the eligible sources.
pub fn execute(env: &PhaseEnv<'_>, store: &SourceStore) -> Result<RunReport> {
    with_joins(env, store, Operation::Join, |joins, ctx| {
        for (id, join) in joins.iter_mut() {
            debug!("Running join '{}'", id);
            join.run(ctx).map_err(|e| attribute(e, PluginKind::Join, id))?;
        }
        Ok(())
    })
}

/// Run the clean hook of every enabled join, in reverse order.
///
/// Unlike [`execute`], this runs even when no source is eligible, since the
/// aggregate a join wrote may remain after its sources were cleaned.
pub fn clean(env: &PhaseEnv<'_>, store: &SourceStore) -> Result<RunReport> {
    with_joins(env, store, Operation::JoinClean, |joins, ctx| {
        for (id, join) in joins.iter_mut().rev() {
            debug!("Cleaning join '{}'", id);
            join.clean(ctx).map_err(|e| attribute(e, PluginKind::Join, id))?;
        }
        Ok(())
    })
}

type Joins = Vec<(String, Box<dyn Join>)>;

/// Resolve, instantiate and hand the enabled joins to `body`.
fn with_joins<F>(
    env: &PhaseEnv<'_>,
    store: &SourceStore,
    operation: Operation,
    body: F,
) -> Result<RunReport>
where
    F: FnOnce(&mut Joins, &mut RunContext<'_>) -> Result<()>,
{
    let config = env.config;
    env.registry.check(&config.addons, PluginKind::Addon)?;
    env.registry.check(&config.joins, PluginKind::Join)?;

    let mut report = RunReport::new(operation);
    let sources = eligible(store);
    // Join artifacts outlive the source states, so join-clean always runs.
    if sources.is_empty() && operation == Operation::Join {
        debug!("{}: no finished sources without errors", operation);
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
    let init = JoinInit {
        root: env.workspace.root(),
        sources: &sources,
        results_dir: env.workspace.results_dir(),
        options: &config.options,
    };
    let mut joins = env.registry.load_joins(&config.joins, &init)?;

    let mut ctx = RunContext {
        addons: &addons,
        options: &config.options,
        globs: &mut globs,
    };
    body(&mut joins, &mut ctx)?;

    info!(
        "{}: {} joins over {} sources",
        operation,
        joins.len(),
        sources.len()
    );
    report.outcomes = sources.iter().map(SourceOutcome::from).collect();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::super::testing::{config, register_join, workspace, Calls, FakeVcs};
    use super::*;
    use crate::error::Error;
    use crate::plugin::PluginRegistry;
    use crate::source::{SourceDef, SourceError};

    const URL_A: &str = "https://example.com/a.git";
    const URL_B: &str = "https://example.com/b.git";
    const URL_C: &str = "https://example.com/c.git";

    fn finish(store: &mut SourceStore, url: &str, error: bool) {
        let mut source = store.add(url).unwrap();
        source.state = SourceState::Finished;
        if error {
            source.error = Some(SourceError {
                kind: "AnalysisFault".to_string(),
                message: "earlier failure".to_string(),
                trace: Vec::new(),
            });
        }
        store.update(&source).unwrap();
    }

    #[test]
    fn test_join_sees_only_finished_error_free_sources() {
        let (_temp, workspace, mut store) = workspace();
        finish(&mut store, URL_A, false);
        finish(&mut store, URL_B, true);
        store.add(URL_C).unwrap();

        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        register_join(&mut registry, "j", &calls, false);
        let config = config(&[], &["j"]);
        let vcs = FakeVcs::default();
        let env = PhaseEnv {
            workspace: &workspace,
            config: &config,
            registry: &registry,
            vcs: &vcs,
        };

        let report = execute(&env, &store).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(*calls.lock().unwrap(), [format!("j:run:{}", URL_A)]);
    }

    #[test]
    fn test_join_with_no_eligible_sources_invokes_nothing() {
        let (_temp, workspace, mut store) = workspace();
        store.add(URL_A).unwrap();

        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        register_join(&mut registry, "j", &calls, false);
        let config = config(&[], &["j"]);
        let vcs = FakeVcs::default();
        let env = PhaseEnv {
            workspace: &workspace,
            config: &config,
            registry: &registry,
            vcs: &vcs,
        };

        let report = execute(&env, &store).unwrap();
        assert!(report.outcomes.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_first_failing_join_aborts() {
        let (_temp, workspace, mut store) = workspace();
        finish(&mut store, URL_A, false);

        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        register_join(&mut registry, "first", &calls, true);
        register_join(&mut registry, "second", &calls, false);
        let config = config(&[], &["first", "second"]);
        let vcs = FakeVcs::default();
        let env = PhaseEnv {
            workspace: &workspace,
            config: &config,
            registry: &registry,
            vcs: &vcs,
        };

        let err = execute(&env, &store).unwrap_err();
        assert_eq!(err.kind(), "JoinFault");
        assert!(err.to_string().contains("'first'"));
        assert_eq!(*calls.lock().unwrap(), [format!("first:run:{}", URL_A)]);

        // Source records are untouched.
        let a = store.get(&SourceDef::parse(URL_A)).unwrap();
        assert_eq!(a.state, SourceState::Finished);
        assert!(a.error.is_none());
    }

    #[test]
    fn test_join_clean_runs_in_reverse_order() {
        let (_temp, workspace, mut store) = workspace();
        finish(&mut store, URL_A, false);

        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        register_join(&mut registry, "first", &calls, false);
        register_join(&mut registry, "second", &calls, false);
        let config = config(&[], &["first", "second"]);
        let vcs = FakeVcs::default();
        let env = PhaseEnv {
            workspace: &workspace,
            config: &config,
            registry: &registry,
            vcs: &vcs,
        };

        let report = clean(&env, &store).unwrap();
        assert_eq!(report.operation, Operation::JoinClean);
        assert_eq!(*calls.lock().unwrap(), ["second:clean", "first:clean"]);
    }

    #[test]
    fn test_join_clean_runs_after_sources_were_cleaned() {
        let (_temp, workspace, mut store) = workspace();
        finish(&mut store, URL_A, false);

        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        register_join(&mut registry, "j", &calls, false);
        let config = config(&[], &["j"]);
        let vcs = FakeVcs::default();
        let env = PhaseEnv {
            workspace: &workspace,
            config: &config,
            registry: &registry,
            vcs: &vcs,
        };
        execute(&env, &store).unwrap();

        // The source went back to Cloned, as after an analysis clean.
        let mut a = store.get(&SourceDef::parse(URL_A)).unwrap();
        a.state = SourceState::Cloned;
        store.update(&a).unwrap();
        assert!(eligible(&store).is_empty());

        let report = clean(&env, &store).unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(
            *calls.lock().unwrap(),
            [format!("j:run:{}", URL_A), "j:clean".to_string()]
        );
    }

    #[test]
    fn test_join_rejects_analysis_registered_under_join_id() {
        let (_temp, workspace, mut store) = workspace();
        finish(&mut store, URL_A, false);

        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PluginRegistry::new();
        super::super::testing::register_analysis(&mut registry, "stats", &calls, &[], &[]);
        let config = config(&[], &["stats"]);
        let vcs = FakeVcs::default();
        let env = PhaseEnv {
            workspace: &workspace,
            config: &config,
            registry: &registry,
            vcs: &vcs,
        };

        let err = execute(&env, &store).unwrap_err();
        assert!(matches!(err, Error::PluginTypeMismatch { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }
}
