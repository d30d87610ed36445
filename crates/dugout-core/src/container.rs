// DataStoreContainer: one DataStore bound to one file on disk.
//
// Saving over the bound file first copies the existing file into a backup
// folder under a timestamped name. That copy is the only durability guarantee:
// there is no journal, so a bad write is recovered by restoring a backup.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{DataStore, GameClass};

// ---------------------------------------------------------------------------
// Aggregate counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StoreCounts {
    pub leagues: usize,
    pub scheduled_games: usize,
    pub played_games: usize,
    pub cancelled_games: usize,
    pub forfeited_games: usize,
    pub unplayed_games: usize,
    pub teams: usize,
    pub players: usize,
}

impl StoreCounts {
    pub fn compute(store: &DataStore) -> Self {
        let mut counts = StoreCounts {
            leagues: store.league_schedules.len(),
            ..StoreCounts::default()
        };
        let mut teams: HashSet<&str> = HashSet::new();
        let mut players: HashSet<&str> = HashSet::new();

        for game in store.games() {
            counts.scheduled_games += 1;
            teams.insert(game.visitor.as_str());
            teams.insert(game.home.as_str());
            match game.classify() {
                GameClass::Played => counts.played_games += 1,
                GameClass::Cancelled => counts.cancelled_games += 1,
                GameClass::Forfeited => counts.forfeited_games += 1,
                GameClass::Unplayed => counts.unplayed_games += 1,
            }
            if let Some(box_score) = game.box_score() {
                for team in box_score {
                    players.extend(team.batters().map(|p| p.name.as_str()));
                }
            }
        }

        counts.teams = teams.len();
        counts.players = players.len();
        counts
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Result of a [`DataStoreContainer::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub path: PathBuf,
    /// Backup copy written before the overwrite, if any.
    pub backup: Option<PathBuf>,
}

/// Owned handle to a DataStore and the file it is bound to.
///
/// Not shareable between writers: the owner serializes all mutation.
#[derive(Debug)]
pub struct DataStoreContainer {
    path: Option<PathBuf>,
    store: DataStore,
    counts: OnceLock<StoreCounts>,
}

impl DataStoreContainer {
    /// Wrap a freshly built store that has no file yet.
    pub fn new(store: DataStore) -> Self {
        Self {
            path: None,
            store,
            counts: OnceLock::new(),
        }
    }

    /// Deserialize the store at `path` and bind to it.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::io(path, e)
            }
        })?;
        let store: DataStore =
            serde_json::from_str(&raw).map_err(|source| StoreError::DataIntegrity {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            path = %path.display(),
            leagues = store.league_schedules.len(),
            "loaded data store"
        );
        Ok(Self {
            path: Some(path.to_path_buf()),
            store,
            counts: OnceLock::new(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Mutable access. Drops the memoized counts.
    pub fn store_mut(&mut self) -> &mut DataStore {
        self.counts = OnceLock::new();
        &mut self.store
    }

    /// Swap in a new store (the result of a completed pass).
    pub fn replace_store(&mut self, store: DataStore) {
        self.counts = OnceLock::new();
        self.store = store;
    }

    /// Aggregate counts, computed on first use and cached until the store is
    /// mutated or replaced.
    pub fn counts(&self) -> &StoreCounts {
        self.counts.get_or_init(|| StoreCounts::compute(&self.store))
    }

    /// Persist the store.
    ///
    /// - `path` different from the bound path (or nothing bound yet): create
    ///   parent directories, write, and rebind to `path`.
    /// - `path` absent or equal to the bound path: when `backup` is set and
    ///   the file exists, copy it into `backup_dir` with a timestamp suffix,
    ///   then refresh the build timestamp and overwrite.
    pub fn save(
        &mut self,
        path: Option<&Path>,
        backup: bool,
        backup_dir: &Path,
    ) -> Result<SaveOutcome, StoreError> {
        let target = match (path, self.path.as_deref()) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(bound)) => bound.to_path_buf(),
            (None, None) => return Err(StoreError::Unbound),
        };
        let overwrite = self.path.as_deref() == Some(target.as_path());

        if !overwrite {
            if let Some(parent) = target.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
                }
            }
            write_store(&target, &self.store)?;
            info!(path = %target.display(), "saved data store to new path");
            self.path = Some(target.clone());
            return Ok(SaveOutcome {
                path: target,
                backup: None,
            });
        }

        let backup_path = if backup && target.exists() {
            Some(backup_file(&target, backup_dir)?)
        } else {
            None
        };

        self.store.touch();
        write_store(&target, &self.store)?;
        info!(
            path = %target.display(),
            backup = ?backup_path.as_ref().map(|p| p.display().to_string()),
            "saved data store"
        );
        Ok(SaveOutcome {
            path: target,
            backup: backup_path,
        })
    }
}

// ---------------------------------------------------------------------------
// ContainerSlot
// ---------------------------------------------------------------------------

/// Caller-owned cache of at most one container.
///
/// `instance(path)` hands back the cached container when it is already bound
/// to `path`, and otherwise loads `path` fresh and caches that instead.
#[derive(Debug, Default)]
pub struct ContainerSlot {
    current: Option<DataStoreContainer>,
}

impl ContainerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&mut self, path: &Path) -> Result<&mut DataStoreContainer, StoreError> {
        let bound = self
            .current
            .as_ref()
            .is_some_and(|c| c.path() == Some(path));
        if !bound {
            let loaded = DataStoreContainer::load(path)?;
            return Ok(self.current.insert(loaded));
        }
        self.current.as_mut().ok_or(StoreError::Unbound)
    }

    /// Cache a container built in memory (the build pass).
    pub fn install(&mut self, container: DataStoreContainer) -> &mut DataStoreContainer {
        self.current.insert(container)
    }

    pub fn current(&self) -> Option<&DataStoreContainer> {
        self.current.as_ref()
    }

    /// Drop the cached container and its memoized counts.
    pub fn reset(&mut self) {
        self.current = None;
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn write_store(path: &Path, store: &DataStore) -> Result<(), StoreError> {
    let json =
        serde_json::to_string_pretty(store).map_err(|source| StoreError::Serialize { source })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
    debug!(path = %path.display(), "wrote store file");
    Ok(())
}

/// Copy `source` into `backup_dir` as `<stem>_<timestamp>.<ext>`.
fn backup_file(source: &Path, backup_dir: &Path) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(backup_dir).map_err(|e| StoreError::io(backup_dir, e))?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("store");
    let ext = source.extension().and_then(|s| s.to_str()).unwrap_or("json");
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");

    let mut candidate = backup_dir.join(format!("{stem}_{stamp}.{ext}"));
    let mut n = 1;
    while candidate.exists() {
        candidate = backup_dir.join(format!("{stem}_{stamp}-{n}.{ext}"));
        n += 1;
    }

    fs::copy(source, &candidate).map_err(|e| StoreError::io(&candidate, e))?;
    Ok(candidate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
