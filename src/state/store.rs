//! Commit Store
//!
//! Linear, file-backed history of project snapshots with a movable head.
//!
//! Each commit is written synchronously to `<root>/<timestamp>-<slug>.json`
//! before it becomes visible in memory, so a commit that could not be
//! persisted is never reported as succeeded. Only `clean` deletes files:
//! otherwise the on-disk directory is an append-only record and `fetch` rebuilds linear
//! history from it in filename (chronological) order.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use super::commit::{Commit, LogEntry};
use crate::error::{Result, VaultError};
use crate::identity::CommitId;
use crate::model::{Machines, Project};

/// History of project snapshots rooted at a directory.
#[derive(Debug)]
pub struct CommitStore {
    root: PathBuf,
    machines: Machines,
    commits: Vec<Commit>,
    head: Option<usize>,
    redo_stack: Vec<Commit>,
}

impl CommitStore {
    /// Create an empty store. Nothing is read until `fetch`.
    ///
    /// `machines` is consulted when loading documents that predate the
    /// explicit track kind.
    pub fn new(root: impl Into<PathBuf>, machines: Machines) -> Self {
        Self {
            root: root.into(),
            machines,
            commits: Vec::new(),
            head: None,
            redo_stack: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True iff there is no head.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn head(&self) -> Option<&Commit> {
        self.head.and_then(|i| self.commits.get(i))
    }

    pub fn head_index(&self) -> Option<usize> {
        self.head
    }

    /// Head, or `EmptyHistory`.
    pub fn require_head(&self) -> Result<&Commit> {
        self.head().ok_or(VaultError::EmptyHistory)
    }

    /// Every commit in sequence order, including any beyond head.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record `content` as a new head.
    ///
    /// Entries beyond head are discarded and the redo buffer is cleared.
    pub fn commit(&mut self, content: Project) -> Result<CommitId> {
        let id = CommitId::generate_after(self.latest_id());
        let commit = Commit::new(id.clone(), content);
        self.persist(&commit)?;
        self.append(commit);
        self.redo_stack.clear();
        info!("HEAD is {}", id);
        Ok(id)
    }

    /// Copy the commit named by `key` into a brand-new head entry.
    ///
    /// An unknown key leaves the store untouched and yields
    /// `CommitNotFound`.
    pub fn checkout(&mut self, key: &str) -> Result<CommitId> {
        let content = match self.commits.iter().rev().find(|c| c.matches(key)) {
            Some(commit) => commit.content().clone(),
            None => {
                warn!("commit {} not found", key);
                return Err(VaultError::CommitNotFound {
                    id: key.to_string(),
                });
            }
        };
        self.commit(content)
    }

    /// Move head back one entry, stashing the current head for `redo`.
    pub fn undo(&mut self) -> Result<&Commit> {
        let index = match self.head {
            Some(i) if i > 0 => i,
            _ => {
                info!("nothing to undo");
                return Err(VaultError::NothingToUndo);
            }
        };

        self.redo_stack.push(self.commits[index].clone());
        self.head = Some(index - 1);
        let head = &self.commits[index - 1];
        info!("HEAD is {}", head.id());
        Ok(head)
    }

    /// Re-append the most recently undone commit and advance head to it.
    pub fn redo(&mut self) -> Result<&Commit> {
        let Some(commit) = self.redo_stack.pop() else {
            info!("nothing to redo");
            return Err(VaultError::NothingToRedo);
        };

        self.append(commit);
        let head = self.require_head()?;
        info!("HEAD is {}", head.id());
        Ok(head)
    }

    /// Commits with their position and whether each is head.
    pub fn log(&self) -> Vec<LogEntry> {
        self.commits
            .iter()
            .enumerate()
            .map(|(index, commit)| LogEntry {
                index,
                id: commit.id().clone(),
                patches: commit.content().len(),
                is_head: Some(index) == self.head,
            })
            .collect()
    }

    /// Write every commit in the sequence whose file is missing.
    ///
    /// Returns the number of files written.
    pub fn push(&self) -> Result<usize> {
        let mut written = 0;
        for commit in &self.commits {
            if !self.path_for(commit.id()).exists() {
                self.persist(commit)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Load all persisted commits, replacing in-memory state.
    ///
    /// Head is set to the last loaded commit. A missing directory is
    /// created and yields an empty store. Returns the number loaded.
    /// On error the in-memory state is left as it was.
    pub fn fetch(&mut self) -> Result<usize> {
        if !self.root.exists() {
            self.create_root()?;
            self.commits.clear();
            self.redo_stack.clear();
            self.head = None;
            return Ok(0);
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.root.as_path()).to_path_buf();
                VaultError::FileReadError {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Ok(id) = CommitId::parse_from_storage_name(&name) else {
                warn!("skipping {}: not a commit file", name);
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|e| VaultError::FileReadError {
                path: path.clone(),
                source: e,
            })?;
            let project = Project::from_json(&content, &self.machines)?;
            debug!("fetched {}", name);
            loaded.push(Commit::new(id, project));
        }

        self.redo_stack.clear();
        self.head = loaded.len().checked_sub(1);
        self.commits = loaded;

        if let Some(head) = self.head() {
            info!("HEAD is {}", head.id());
        }
        Ok(self.commits.len())
    }

    /// Delete every commit file and reset history to empty.
    ///
    /// Returns the number of files removed.
    pub fn clean(&mut self) -> Result<usize> {
        let removed = clear_directory(&self.root)?;
        self.commits.clear();
        self.redo_stack.clear();
        self.head = None;
        info!("cleaned {} ({} files)", self.root.display(), removed);
        Ok(removed)
    }

    fn latest_id(&self) -> Option<&CommitId> {
        self.commits.iter().map(|c| c.id()).max_by_key(|id| id.timestamp)
    }

    fn append(&mut self, commit: Commit) {
        let keep = self.head.map_or(0, |i| i + 1);
        self.commits.truncate(keep);
        self.commits.push(commit);
        self.head = Some(self.commits.len() - 1);
    }

    fn path_for(&self, id: &CommitId) -> PathBuf {
        self.root.join(id.storage_name())
    }

    fn create_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| VaultError::DirectoryCreateError {
            path: self.root.clone(),
            source: e,
        })
    }

    fn persist(&self, commit: &Commit) -> Result<()> {
        if !self.root.exists() {
            self.create_root()?;
        }

        let path = self.path_for(commit.id());
        let content = commit.content().to_json()?;
        fs::write(&path, content).map_err(|e| VaultError::FileWriteError { path, source: e })
    }
}

/// Remove the regular files directly under `dir`.
///
/// A missing directory counts as already clean. Subdirectories are kept.
pub fn clear_directory(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| VaultError::FileReadError {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        fs::remove_file(entry.path()).map_err(|e| VaultError::FileWriteError {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        debug!("removed {}", entry.path().display());
        removed += 1;
    }
    Ok(removed)
}
