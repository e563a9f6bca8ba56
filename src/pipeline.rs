//! # Pipeline
//!
//! [`Pipeline`] ties an opened [`Workspace`] to its [`ConfigStore`],
//! [`SourceStore`], [`PluginRegistry`] and [`VcsProvider`], and exposes the
//! entry points a front end binds to: source management, plugin management
//! and the pipeline operations.
//!
//! ```no_run
//! use sourcepipe::pipeline::Pipeline;
//! use sourcepipe::plugin::PluginKind;
//! use std::path::Path;
//!
//! let mut pipeline = Pipeline::init(Path::new("work"))?;
//! pipeline.add("https://github.com/rust-lang/log.git")?;
//! pipeline.add_plugin(PluginKind::Analysis, "file-stats")?;
//!
//! let cloned = pipeline.run_clone(&[])?;
//! let analyzed = pipeline.run_analyze(&[])?;
//! assert!(cloned.is_success() && analyzed.is_success());
//! # Ok::<(), sourcepipe::error::Error>(())
//! ```

use std::fs;
use std::path::Path;

use log::info;

use crate::config::{Config, ConfigStore};
use crate::error::Result;
use crate::phases::{self, PhaseEnv, RunReport};
use crate::plugin::{PluginKind, PluginRegistry};
use crate::repository::{GitProvider, VcsProvider};
use crate::source::{Source, SourceDef, SourceFilter};
use crate::store::{Selection, SourceStore};
use crate::workspace::Workspace;

pub struct Pipeline {
    workspace: Workspace,
    config: ConfigStore,
    store: SourceStore,
    registry: PluginRegistry,
    vcs: Box<dyn VcsProvider>,
}

impl Pipeline {
    /// Initialize a workspace at `root` and open it.
    pub fn init(root: &Path) -> Result<Self> {
        let workspace = Workspace::init(root)?;
        info!("Initialized workspace in {}", workspace.root().display());
        Self::from_workspace(workspace)
    }

    /// Open an initialized workspace with the built-in plugins and git.
    pub fn open(root: &Path) -> Result<Self> {
        Self::from_workspace(Workspace::open(root)?)
    }

    fn from_workspace(workspace: Workspace) -> Result<Self> {
        let config = ConfigStore::open(&workspace.config_path())?;
        let store = SourceStore::open(&workspace)?;
        Ok(Self {
            workspace,
            config,
            store,
            registry: PluginRegistry::with_builtins(),
            vcs: Box::new(GitProvider),
        })
    }

    /// Replace the plugin namespace.
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the version-control provider.
    pub fn with_vcs(mut self, vcs: impl VcsProvider + 'static) -> Self {
        self.vcs = Box::new(vcs);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &Config {
        self.config.config()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    // Sources

    pub fn add(&mut self, url: &str) -> Result<Source> {
        let source = self.store.add(url)?;
        info!("Added source {}: {}", source.id, source.url);
        Ok(source)
    }

    /// Unregister a source. With `purge`, its working tree and result files
    /// are deleted too.
    pub fn remove(&mut self, def: &SourceDef, purge: bool) -> Result<Source> {
        let source = self.store.remove(def)?;
        info!("Removed source {}: {}", source.id, source.url);

        if purge {
            let folder = self.workspace.resolve(&source.folder);
            let results = self.workspace.results_dir().join(source.id.to_string());
            for dir in [folder, results] {
                if dir.exists() {
                    fs::remove_dir_all(&dir)?;
                    info!("Deleted {}", dir.display());
                }
            }
        }
        Ok(source)
    }

    pub fn list_sources(&self) -> &[Source] {
        self.store.list()
    }

    pub fn get(&self, def: &SourceDef) -> Result<Source> {
        self.store.get(def)
    }

    pub fn select(&self, defs: &[SourceDef], filter: SourceFilter) -> Selection {
        self.store.get_all(defs, filter)
    }

    // Plugins

    /// Enable a plugin. The identifier must resolve to the requested kind.
    pub fn add_plugin(&mut self, kind: PluginKind, id: &str) -> Result<()> {
        self.registry.resolve(id, kind)?;
        self.config.add_plugin(kind, id)?;
        info!("Enabled {} '{}'", kind, id);
        Ok(())
    }

    pub fn remove_plugin(&mut self, kind: PluginKind, id: &str) -> Result<()> {
        self.config.remove_plugin(kind, id)?;
        info!("Disabled {} '{}'", kind, id);
        Ok(())
    }

    /// Enabled plugins of `kind`, in run order.
    pub fn list_plugins(&self, kind: PluginKind) -> &[String] {
        self.config.config().plugins(kind)
    }

    /// Every plugin the registry can provide.
    pub fn available_plugins(&self) -> Vec<(&str, PluginKind)> {
        self.registry.available()
    }

    pub fn set_option(&mut self, name: &str, value: serde_yaml::Value) -> Result<()> {
        self.config.set_option(name, value)
    }

    pub fn unset_option(&mut self, name: &str) -> Result<Option<serde_yaml::Value>> {
        self.config.unset_option(name)
    }

    // Operations

    pub fn run_clone(&mut self, defs: &[SourceDef]) -> Result<RunReport> {
        let (env, store) = self.parts();
        phases::clone::execute(&env, store, defs)
    }

    pub fn run_analyze(&mut self, defs: &[SourceDef]) -> Result<RunReport> {
        let (env, store) = self.parts();
        phases::analyze::execute(&env, store, defs)
    }

    pub fn run_join(&mut self) -> Result<RunReport> {
        let (env, store) = self.parts();
        phases::join::execute(&env, store)
    }

    pub fn run_clean(&mut self, defs: &[SourceDef]) -> Result<RunReport> {
        let (env, store) = self.parts();
        phases::clean::execute(&env, store, defs)
    }

    pub fn run_join_clean(&mut self) -> Result<RunReport> {
        let (env, store) = self.parts();
        phases::join::clean(&env, store)
    }

    /// Clone, analyze and join in one pass.
    pub fn run_all(&mut self, defs: &[SourceDef]) -> Result<Vec<RunReport>> {
        let (env, store) = self.parts();
        phases::orchestrator::execute_all(&env, store, defs)
    }

    fn parts(&mut self) -> (PhaseEnv<'_>, &mut SourceStore) {
        (
            PhaseEnv {
                workspace: &self.workspace,
                config: self.config.config(),
                registry: &self.registry,
                vcs: self.vcs.as_ref(),
            },
            &mut self.store,
        )
    }
}
