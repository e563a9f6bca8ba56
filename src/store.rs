//! # Source Store
//!
//! The [`SourceStore`] owns the canonical collection of [`Source`] records
//! and is the only component that writes them to disk.
//!
//! Two artifacts back the store:
//!
//! - `sources.txt` lists one URL per line, in insertion order. Blank lines
//!   and `#` comments are ignored, and a URL appended by hand is picked up as
//!   a fresh `New` source on the next load.
//! - `sources.yaml` holds the structured record of every source, keyed by id,
//!   along with the next id to hand out so ids are never reused.
//!
//! Every mutation is flushed immediately. A crash during a batch run
//! therefore loses at most the in-flight source's latest attempt.
//!
//! The list is authoritative for membership and is written first. A log
//! entry whose URL is missing from the list is dropped on load, and a listed
//! URL without a log entry comes back as `New` under the next free id. A
//! crash between the two writes thus resolves to the completed change.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::{
    folder_for_url, Source, SourceDef, SourceError, SourceFilter, SourceId, SourceState,
};
use crate::workspace::{write_atomic, Workspace};

/// On-disk shape of one entry in the structured log.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogEntry {
    url: String,
    folder: PathBuf,
    state: SourceState,
    #[serde(default)]
    performed_analyses: Vec<String>,
    #[serde(default)]
    error: Option<SourceError>,
}

/// On-disk shape of the structured log file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SourceLog {
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default)]
    sources: BTreeMap<SourceId, LogEntry>,
}

fn first_id() -> u64 {
    1
}

/// Result of a selection: the matching sources plus any definitions that
/// did not resolve.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub sources: Vec<Source>,
    pub missing: Vec<SourceDef>,
}

impl Selection {
    /// One `SourceNotFound` error per unresolved definition.
    pub fn errors(&self) -> Vec<Error> {
        self.missing
            .iter()
            .map(|def| Error::SourceNotFound {
                source_def: def.to_string(),
            })
            .collect()
    }
}

/// The persistent collection of sources.
#[derive(Debug)]
pub struct SourceStore {
    sources_path: PathBuf,
    log_path: PathBuf,
    sources: Vec<Source>,
    next_id: u64,
}

impl SourceStore {
    /// Load the store of an initialized workspace.
    pub fn open(workspace: &Workspace) -> Result<Self> {
        let sources_path = workspace.sources_path();
        let log_path = workspace.source_log_path();

        let list = fs::read_to_string(&sources_path)?;
        let log_yaml = fs::read_to_string(&log_path)?;
        let mut log: SourceLog = if log_yaml.trim().is_empty() {
            SourceLog::default()
        } else {
            serde_yaml::from_str(&log_yaml).map_err(|e| Error::Store {
                message: format!("{}: {}", log_path.display(), e),
            })?
        };
        if log.next_id == 0 {
            log.next_id = first_id();
        }

        let mut by_url: BTreeMap<String, (SourceId, LogEntry)> = log
            .sources
            .into_iter()
            .map(|(id, entry)| (entry.url.clone(), (id, entry)))
            .collect();

        let mut store = Self {
            sources_path,
            log_path,
            sources: Vec::new(),
            next_id: log.next_id,
        };

        for url in parse_source_list(&list) {
            if store.find_url(&url).is_some() {
                warn!("Ignoring duplicate entry for {} in source list", url);
                continue;
            }

            let source = match by_url.remove(&url) {
                Some((id, entry)) => {
                    store.next_id = store.next_id.max(id.0 + 1);
                    Source {
                        id,
                        url: entry.url,
                        folder: entry.folder,
                        state: entry.state,
                        performed_analyses: entry.performed_analyses,
                        error: entry.error,
                    }
                }
                None => {
                    let id = store.allocate_id();
                    let folder = store.folder_for(&url, id);
                    debug!("Registering {} from source list as {}", url, id);
                    Source::new(id, url, folder)
                }
            };
            store.sources.push(source);
        }

        for (url, (id, _)) in by_url {
            debug!("Dropping log entry {} for {}: not in source list", id, url);
        }

        Ok(store)
    }

    /// All sources in insertion order.
    pub fn list(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Register a new URL as a `New` source.
    pub fn add(&mut self, url: &str) -> Result<Source> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Store {
                message: "source URL must not be empty".to_string(),
            });
        }
        if url.parse::<u64>().is_ok() {
            return Err(Error::Store {
                message: format!(
                    "source URL '{}' is a plain integer and would be read as an id",
                    url
                ),
            });
        }
        if self.find_url(url).is_some() {
            return Err(Error::DuplicateSource {
                url: url.to_string(),
            });
        }

        let id = SourceId(self.next_id);
        let source = Source::new(id, url, self.folder_for(url, id));

        let mut sources = self.sources.clone();
        sources.push(source.clone());
        self.commit(sources, self.next_id + 1)?;

        debug!("Added source {} ({})", source.id, source.url);
        Ok(source)
    }

    /// Remove a source by id or URL, returning the removed record.
    pub fn remove(&mut self, def: &SourceDef) -> Result<Source> {
        let index = self.position(def)?;
        let mut sources = self.sources.clone();
        let removed = sources.remove(index);
        self.commit(sources, self.next_id)?;

        debug!("Removed source {} ({})", removed.id, removed.url);
        Ok(removed)
    }

    /// Look up a single source by id or URL.
    pub fn get(&self, def: &SourceDef) -> Result<Source> {
        self.position(def).map(|index| self.sources[index].clone())
    }

    /// Select sources matching `filter`.
    ///
    /// With no definitions every source is considered. Otherwise only the named
    /// ones are, in the order given; definitions that do not resolve are
    /// collected in [`Selection::missing`] instead of aborting the selection.
    pub fn get_all(&self, defs: &[SourceDef], filter: SourceFilter) -> Selection {
        if defs.is_empty() {
            return Selection {
                sources: self
                    .sources
                    .iter()
                    .filter(|source| filter.matches(source))
                    .cloned()
                    .collect(),
                missing: Vec::new(),
            };
        }

        let mut selection = Selection::default();
        let mut seen = HashSet::new();
        for def in defs {
            match self.sources.iter().find(|source| def.matches(source)) {
                Some(source) => {
                    if seen.insert(source.id) && filter.matches(source) {
                        selection.sources.push(source.clone());
                    }
                }
                None => selection.missing.push(def.clone()),
            }
        }
        selection
    }

    /// Replace the stored record with the same id and persist immediately.
    pub fn update(&mut self, source: &Source) -> Result<()> {
        let index = self.position(&SourceDef::Id(source.id))?;
        let mut sources = self.sources.clone();
        sources[index] = source.clone();
        self.commit(sources, self.next_id)
    }

    fn position(&self, def: &SourceDef) -> Result<usize> {
        self.sources
            .iter()
            .position(|source| def.matches(source))
            .ok_or_else(|| Error::SourceNotFound {
                source_def: def.to_string(),
            })
    }

    fn find_url(&self, url: &str) -> Option<&Source> {
        self.sources.iter().find(|source| source.url == url)
    }

    fn allocate_id(&mut self) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Derived folder, suffixed with the id if another source already uses it.
    fn folder_for(&self, url: &str, id: SourceId) -> PathBuf {
        let folder = folder_for_url(url);
        if self.sources.iter().any(|source| source.folder == folder) {
            let mut name = folder.into_os_string();
            name.push(format!("-{}", id));
            PathBuf::from(name)
        } else {
            folder
        }
    }

    /// Write both artifacts, then adopt the new state in memory.
    fn commit(&mut self, sources: Vec<Source>, next_id: u64) -> Result<()> {
        let log = SourceLog {
            next_id,
            sources: sources
                .iter()
                .map(|source| {
                    (
                        source.id,
                        LogEntry {
                            url: source.url.clone(),
                            folder: source.folder.clone(),
                            state: source.state,
                            performed_analyses: source.performed_analyses.clone(),
                            error: source.error.clone(),
                        },
                    )
                })
                .collect(),
        };
        let mut list = String::new();
        for source in &sources {
            list.push_str(&source.url);
            list.push('\n');
        }
        // The list goes first: it decides membership, the log only state.
        write_atomic(&self.sources_path, &list)?;
        write_atomic(&self.log_path, &serde_yaml::to_string(&log)?)?;

        self.sources = sources;
        self.next_id = next_id;
        Ok(())
    }
}

fn parse_source_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Workspace) {
        let temp_dir = TempDir::new().unwrap();
        let workspace = Workspace::init(temp_dir.path()).unwrap();
        (temp_dir, workspace)
    }

    #[test]
    fn test_add_assigns_ids_in_order() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();

        let a = store.add("https://example.com/a.git").unwrap();
        let b = store.add("https://example.com/b.git").unwrap();

        assert_eq!(a.id, SourceId(1));
        assert_eq!(b.id, SourceId(2));
        assert_eq!(a.state, SourceState::New);
        assert!(a.error.is_none());
        assert_eq!(a.folder, PathBuf::from("repos/example.com_a"));
    }

    #[test]
    fn test_add_duplicate_url_fails() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();

        store.add("https://example.com/a.git").unwrap();
        let err = store.add("https://example.com/a.git").unwrap_err();
        assert!(matches!(err, Error::DuplicateSource { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_integer_url_fails() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();

        let err = store.add("42").unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert!(err.to_string().contains("'42'"));
        assert!(store.is_empty());

        // A path that merely contains digits is fine.
        store.add("./42").unwrap();
        assert!(store.get(&SourceDef::parse("./42")).is_ok());
    }

    #[test]
    fn test_interrupted_remove_keeps_source_removed() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();
        store.add("https://example.com/b.git").unwrap();
        let log_before = fs::read_to_string(workspace.source_log_path()).unwrap();

        // Crash after the list was replaced but before the log was.
        store
            .remove(&SourceDef::parse("https://example.com/a.git"))
            .unwrap();
        fs::write(workspace.source_log_path(), &log_before).unwrap();

        let reopened = SourceStore::open(&workspace).unwrap();
        let entries: Vec<(u64, &str)> = reopened
            .list()
            .iter()
            .map(|s| (s.id.0, s.url.as_str()))
            .collect();
        assert_eq!(entries, [(2, "https://example.com/b.git")]);
    }

    #[test]
    fn test_interrupted_add_keeps_source_added() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();
        let log_before = fs::read_to_string(workspace.source_log_path()).unwrap();

        store.add("https://example.com/b.git").unwrap();
        fs::write(workspace.source_log_path(), &log_before).unwrap();

        let reopened = SourceStore::open(&workspace).unwrap();
        let b = reopened
            .get(&SourceDef::parse("https://example.com/b.git"))
            .unwrap();
        assert_eq!(b.id, SourceId(2));
        assert_eq!(b.state, SourceState::New);
    }

    #[test]
    fn test_add_empty_url_fails() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        assert!(store.add("   ").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_colliding_folders_are_suffixed() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();

        let a = store.add("https://example.com/a").unwrap();
        let b = store.add("http://example.com/a.git").unwrap();
        assert_ne!(a.folder, b.folder);
        assert_eq!(b.folder, PathBuf::from("repos/example.com_a-2"));
    }

    #[test]
    fn test_get_by_id_and_url() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        let a = store.add("https://example.com/a.git").unwrap();

        assert_eq!(store.get(&SourceDef::parse("1")).unwrap(), a);
        assert_eq!(
            store.get(&SourceDef::parse("https://example.com/a.git")).unwrap(),
            a
        );
        let err = store.get(&SourceDef::parse("9")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn test_remove_by_url_and_missing() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();

        let removed = store
            .remove(&SourceDef::parse("https://example.com/a.git"))
            .unwrap();
        assert_eq!(removed.id, SourceId(1));
        assert!(store.is_empty());

        let err = store.remove(&SourceDef::parse("1")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();
        let b = store.add("https://example.com/b.git").unwrap();
        store.remove(&SourceDef::Id(b.id)).unwrap();

        let mut store = SourceStore::open(&workspace).unwrap();
        let c = store.add("https://example.com/c.git").unwrap();
        assert_eq!(c.id, SourceId(3));
    }

    #[test]
    fn test_get_all_filters_and_accumulates_missing() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        let mut a = store.add("https://example.com/a.git").unwrap();
        store.add("https://example.com/b.git").unwrap();
        a.state = SourceState::Cloned;
        store.update(&a).unwrap();

        let all_new = store.get_all(&[], SourceFilter::state(SourceState::New));
        assert_eq!(all_new.sources.len(), 1);
        assert_eq!(all_new.sources[0].url, "https://example.com/b.git");

        let defs = vec![
            SourceDef::parse("42"),
            SourceDef::parse("1"),
            SourceDef::parse("https://nowhere.example/x"),
            SourceDef::parse("2"),
        ];
        let selection = store.get_all(&defs, SourceFilter::any());
        assert_eq!(selection.sources.len(), 2);
        assert_eq!(selection.sources[0].id, SourceId(1));
        assert_eq!(selection.missing.len(), 2);
        assert_eq!(selection.errors().len(), 2);

        let cloned_only = store.get_all(&defs, SourceFilter::state(SourceState::Cloned));
        assert_eq!(cloned_only.sources.len(), 1);
        assert_eq!(cloned_only.sources[0].id, SourceId(1));
    }

    #[test]
    fn test_get_all_deduplicates_definitions() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();

        let defs = vec![
            SourceDef::parse("1"),
            SourceDef::parse("https://example.com/a.git"),
        ];
        assert_eq!(store.get_all(&defs, SourceFilter::any()).sources.len(), 1);
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        let a = store.add("https://example.com/a.git").unwrap();
        store.remove(&SourceDef::Id(a.id)).unwrap();

        let err = store.update(&a).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn test_round_trip_preserves_records_and_order() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/z.git").unwrap();
        let mut a = store.add("https://example.com/a.git").unwrap();
        a.state = SourceState::Finished;
        a.performed_analyses = vec!["file-stats".to_string()];
        store.update(&a).unwrap();
        let mut m = store.add("https://example.com/m.git").unwrap();
        m.fail(&Error::GitClone {
            url: m.url.clone(),
            message: "offline".to_string(),
        });
        store.update(&m).unwrap();

        let reloaded = SourceStore::open(&workspace).unwrap();
        assert_eq!(reloaded.list(), store.list());
        let urls: Vec<_> = reloaded.list().iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://example.com/z.git",
                "https://example.com/a.git",
                "https://example.com/m.git"
            ]
        );
    }

    #[test]
    fn test_hand_edited_source_list() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();

        let mut list = fs::read_to_string(workspace.sources_path()).unwrap();
        list.push_str("\n# added by hand\nhttps://example.com/b.git\nhttps://example.com/a.git\n");
        fs::write(workspace.sources_path(), list).unwrap();

        let reloaded = SourceStore::open(&workspace).unwrap();
        assert_eq!(reloaded.len(), 2);
        let b = reloaded
            .get(&SourceDef::parse("https://example.com/b.git"))
            .unwrap();
        assert_eq!(b.id, SourceId(2));
        assert_eq!(b.state, SourceState::New);
    }

    #[test]
    fn test_entries_missing_from_list_are_dropped() {
        let (_temp, workspace) = setup();
        let mut store = SourceStore::open(&workspace).unwrap();
        store.add("https://example.com/a.git").unwrap();
        store.add("https://example.com/b.git").unwrap();

        fs::write(workspace.sources_path(), "https://example.com/b.git\n").unwrap();

        let reloaded = SourceStore::open(&workspace).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.list()[0].id, SourceId(2));
    }

    #[test]
    fn test_corrupt_log_is_reported() {
        let (_temp, workspace) = setup();
        fs::write(workspace.source_log_path(), "sources: [unclosed").unwrap();
        let err = SourceStore::open(&workspace).unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }
}
