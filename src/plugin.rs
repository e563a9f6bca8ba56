//! # Plugins
//!
//! Work is done by three kinds of plugins, each with its own trait:
//!
//! - **[`Addon`]**: instantiated once per run and handed to every analysis
//!   and join of that run. Addons do not process sources themselves; they
//!   provide shared capability objects (a compiled ignore list, a cache,
//!   credentials) that analyses and joins look up through [`Addons`].
//! - **[`Analysis`]**: instantiated per source during analyze and clean, and
//!   run against that source's working tree.
//! - **[`Join`]**: instantiated once per join run and run over the whole set
//!   of finished, error-free sources.
//!
//! The [`PluginRegistry`] maps identifiers to constructors. Each constructor
//! is registered under exactly one [`PluginKind`], so resolving an
//! identifier against the wrong kind fails with
//! [`Error::PluginTypeMismatch`] before any run starts. Plugins are never
//! reused across runs: every load calls the constructors again.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::config::Options;
use crate::context::ExecutionContext;
use crate::error::{Error, Result};
use crate::repository::RepositoryHandle;
use crate::source::Source;

/// The capability a plugin provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluginKind {
    Addon,
    Analysis,
    Join,
}

impl PluginKind {
    pub const ALL: [PluginKind; 3] = [PluginKind::Addon, PluginKind::Analysis, PluginKind::Join];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Addon => "addon",
            PluginKind::Analysis => "analysis",
            PluginKind::Join => "join",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "addon" | "addons" => Ok(PluginKind::Addon),
            "analysis" | "analyses" => Ok(PluginKind::Analysis),
            "join" | "joins" => Ok(PluginKind::Join),
            other => Err(Error::Config {
                message: format!("unknown plugin kind '{}'", other),
            }),
        }
    }
}

/// A shared capability object available to every analysis and join in a run.
pub trait Addon: Any {
    /// Downcasting hook used by [`Addons::get_as`].
    fn as_any(&self) -> &dyn Any;
}

/// Work executed against a single source.
pub trait Analysis {
    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()>;

    /// Release whatever `run` produced. The default does nothing.
    fn clean(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Work executed once over the aggregate of finished sources.
pub trait Join {
    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()>;

    /// Release whatever `run` produced. The default does nothing.
    fn clean(&mut self, _ctx: &mut RunContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Constructor arguments for addons.
#[derive(Debug, Clone, Copy)]
pub struct AddonInit<'a> {
    pub root: &'a Path,
    pub options: &'a Options,
}

/// Constructor arguments for analyses.
#[derive(Debug, Clone)]
pub struct AnalysisInit<'a> {
    pub source: &'a Source,
    /// Absolute path of the source's working tree.
    pub folder: &'a Path,
    pub repository: &'a RepositoryHandle,
    /// Absolute directory reserved for this source's result files.
    pub results_dir: PathBuf,
    pub options: &'a Options,
}

/// Constructor arguments for joins.
#[derive(Debug, Clone)]
pub struct JoinInit<'a> {
    pub root: &'a Path,
    pub sources: &'a [Source],
    /// Absolute directory shared by all result files.
    pub results_dir: PathBuf,
    pub options: &'a Options,
}

/// What a running plugin can see besides its own state.
pub struct RunContext<'a> {
    pub addons: &'a Addons,
    pub options: &'a Options,
    pub globs: &'a mut ExecutionContext,
}

/// The addons instantiated for one run, in registration order.
#[derive(Default)]
pub struct Addons {
    entries: Vec<(String, Box<dyn Addon>)>,
}

impl Addons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>, addon: Box<dyn Addon>) {
        self.entries.push((id.into(), addon));
    }

    pub fn get(&self, id: &str) -> Option<&dyn Addon> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, addon)| addon.as_ref())
    }

    /// Look up an addon and downcast it to its concrete type.
    pub fn get_as<T: Addon>(&self, id: &str) -> Option<&T> {
        self.get(id).and_then(|addon| addon.as_any().downcast_ref::<T>())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Addons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

pub type AddonFactory =
    Box<dyn Fn(&AddonInit<'_>, &mut ExecutionContext) -> Result<Box<dyn Addon>> + Send + Sync>;
pub type AnalysisFactory =
    Box<dyn Fn(&AnalysisInit<'_>) -> Result<Box<dyn Analysis>> + Send + Sync>;
pub type JoinFactory = Box<dyn Fn(&JoinInit<'_>) -> Result<Box<dyn Join>> + Send + Sync>;

/// A registered constructor, tagged with the capability it provides.
pub enum Plugin {
    Addon(AddonFactory),
    Analysis(AnalysisFactory),
    Join(JoinFactory),
}

impl Plugin {
    pub fn kind(&self) -> PluginKind {
        match self {
            Plugin::Addon(_) => PluginKind::Addon,
            Plugin::Analysis(_) => PluginKind::Analysis,
            Plugin::Join(_) => PluginKind::Join,
        }
    }

    pub fn satisfies(&self, kind: PluginKind) -> bool {
        self.kind() == kind
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugin::{:?}", self.kind())
    }
}

/// The process-wide plugin namespace.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Plugin>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the plugins shipped in [`crate::builtin`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::register(&mut registry);
        registry
    }

    /// Register a plugin, replacing any previous one with the same id.
    pub fn register(&mut self, id: impl Into<String>, plugin: Plugin) {
        let id = id.into();
        debug!("Registering {} plugin '{}'", plugin.kind(), id);
        self.plugins.insert(id, plugin);
    }

    pub fn register_addon<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&AddonInit<'_>, &mut ExecutionContext) -> Result<Box<dyn Addon>>
            + Send
            + Sync
            + 'static,
    {
        self.register(id, Plugin::Addon(Box::new(factory)));
    }

    pub fn register_analysis<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&AnalysisInit<'_>) -> Result<Box<dyn Analysis>> + Send + Sync + 'static,
    {
        self.register(id, Plugin::Analysis(Box::new(factory)));
    }

    pub fn register_join<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&JoinInit<'_>) -> Result<Box<dyn Join>> + Send + Sync + 'static,
    {
        self.register(id, Plugin::Join(Box::new(factory)));
    }

    /// Resolve `id` and check that it provides `kind`.
    pub fn resolve(&self, id: &str, kind: PluginKind) -> Result<&Plugin> {
        let plugin = self.plugins.get(id).ok_or_else(|| Error::PluginNotFound {
            kind,
            id: id.to_string(),
        })?;
        if !plugin.satisfies(kind) {
            return Err(mismatch(id, kind, plugin));
        }
        Ok(plugin)
    }

    /// Resolve every id in `ids`, failing on the first that does not resolve.
    pub fn check(&self, ids: &[String], kind: PluginKind) -> Result<()> {
        for id in ids {
            self.resolve(id, kind)?;
        }
        Ok(())
    }

    /// Every registered id with its capability, sorted by id.
    pub fn available(&self) -> Vec<(&str, PluginKind)> {
        self.plugins
            .iter()
            .map(|(id, plugin)| (id.as_str(), plugin.kind()))
            .collect()
    }

    /// Instantiate the given addons in order.
    pub fn load_addons(
        &self,
        ids: &[String],
        init: &AddonInit<'_>,
        globs: &mut ExecutionContext,
    ) -> Result<Addons> {
        let mut addons = Addons::new();
        for id in ids {
            match self.resolve(id, PluginKind::Addon)? {
                Plugin::Addon(factory) => {
                    debug!("Instantiating addon '{}'", id);
                    addons.push(id.clone(), factory(init, globs)?);
                }
                other => return Err(mismatch(id, PluginKind::Addon, other)),
            }
        }
        Ok(addons)
    }

    /// Instantiate the given analyses in order.
    pub fn load_analyses(
        &self,
        ids: &[String],
        init: &AnalysisInit<'_>,
    ) -> Result<Vec<(String, Box<dyn Analysis>)>> {
        let mut analyses = Vec::with_capacity(ids.len());
        for id in ids {
            match self.resolve(id, PluginKind::Analysis)? {
                Plugin::Analysis(factory) => {
                    debug!("Instantiating analysis '{}' for {}", id, init.source.url);
                    analyses.push((id.clone(), factory(init)?));
                }
                other => return Err(mismatch(id, PluginKind::Analysis, other)),
            }
        }
        Ok(analyses)
    }

    /// Instantiate the given joins in order.
    pub fn load_joins(
        &self,
        ids: &[String],
        init: &JoinInit<'_>,
    ) -> Result<Vec<(String, Box<dyn Join>)>> {
        let mut joins = Vec::with_capacity(ids.len());
        for id in ids {
            match self.resolve(id, PluginKind::Join)? {
                Plugin::Join(factory) => {
                    debug!("Instantiating join '{}'", id);
                    joins.push((id.clone(), factory(init)?));
                }
                other => return Err(mismatch(id, PluginKind::Join, other)),
            }
        }
        Ok(joins)
    }
}

fn mismatch(id: &str, expected: PluginKind, found: &Plugin) -> Error {
    Error::PluginTypeMismatch {
        id: id.to_string(),
        expected,
        actual: found.kind(),
    }
}
