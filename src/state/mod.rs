//! History Management Module
//!
//! Immutable commits of project snapshots and the linear, file-backed
//! store that orders them.

pub mod commit;
pub mod store;

pub use commit::{Commit, LogEntry};
pub use store::CommitStore;
