//! Clone: give every selected `New` source a working tree.
//!
//! A folder left behind by an interrupted earlier run is opened instead of
//! cloned again. Faults are recorded on the source and the batch continues.

use std::path::Path;

use log::{info, warn};

use super::{select, Operation, PhaseEnv, RunReport, SourceOutcome};
use crate::error::{Error, Result};
use crate::repository::{RepositoryHandle, VcsProvider};
use crate::source::{SourceDef, SourceState};
use crate::store::SourceStore;

/// Clone the selected sources (all `New` sources if `defs` is empty).
pub fn execute(
    env: &PhaseEnv<'_>,
    store: &mut SourceStore,
    defs: &[SourceDef],
) -> Result<RunReport> {
    let mut report = RunReport::new(Operation::Clone);

    for mut source in select(store, defs, SourceState::New, &mut report) {
        let folder = env.workspace.resolve(&source.folder);

        match clone_or_open(env.vcs, &source.url, &folder) {
            Ok(handle) => {
                info!(
                    "Cloned {} into {} ({})",
                    source.url,
                    source.folder.display(),
                    handle.head().unwrap_or("no commits")
                );
                source.state = SourceState::Cloned;
                source.error = None;
            }
            Err(e) => {
                warn!("Clone of {} failed: {}", source.url, e);
                source.fail(&e);
            }
        }

        store.update(&source)?;
        report.outcomes.push(SourceOutcome::from(&source));
    }

    Ok(report)
}

fn clone_or_open(vcs: &dyn VcsProvider, url: &str, folder: &Path) -> Result<RepositoryHandle> {
    if !folder.exists() {
        return vcs.clone_into(url, folder);
    }
    vcs.open(folder).map_err(|e| Error::GitClone {
        url: url.to_string(),
        message: format!("{} exists but cannot be used: {}", folder.display(), e),
    })
}
