//! Orchestrator for a complete pipeline pass
//!
//! Chains the per-source phases and the join into one call, the way a
//! scheduled batch runs the pipeline end to end.

use super::{analyze, clone, join, PhaseEnv, RunReport};
use crate::error::Result;
use crate::source::SourceDef;
use crate::store::SourceStore;

/// Execute clone, analyze and join in sequence
///
/// 1. Clone the selected `New` sources
/// 2. Analyze the selected `Cloned` sources, including those cloned in step 1
/// 3. Join over every finished, error-free source
///
/// Per-source faults in steps 1 and 2 are recorded and do not stop the pass.
/// A join fault or a store write failure is returned as an error.
pub fn execute_all(
    env: &PhaseEnv<'_>,
    store: &mut SourceStore,
    defs: &[SourceDef],
) -> Result<Vec<RunReport>> {
    let cloned = clone::execute(env, store, defs)?;
    let analyzed = analyze::execute(env, store, defs)?;
    let joined = join::execute(env, store)?;

    Ok(vec![cloned, analyzed, joined])
}
