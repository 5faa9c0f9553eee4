//! Commits: immutable (identity, snapshot) pairs.

use crate::identity::CommitId;
use crate::model::Project;

/// A single history entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    id: CommitId,
    content: Project,
}

impl Commit {
    pub fn new(id: CommitId, content: Project) -> Self {
        Self { id, content }
    }

    pub fn id(&self) -> &CommitId {
        &self.id
    }

    /// The snapshot. Callers clone it to obtain a working copy.
    pub fn content(&self) -> &Project {
        &self.content
    }

    /// Whether `key` names this commit by full name, slug or short name.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.strip_suffix(".json").unwrap_or(key);
        self.id.to_string() == key || self.id.slug == key || self.id.short_name() == key
    }
}

/// One row of `CommitStore::log`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub index: usize,
    pub id: CommitId,
    pub patches: usize,
    pub is_head: bool,
}
