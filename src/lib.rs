//! Rhythmvault - Versioned Generative State Engine
//!
//! Generates, mutates and version-controls parametric descriptions of
//! drum arrangements ("projects") that an external audio engine renders.
//!
//! # Architecture
//!
//! - `model`: Project → Patch → Track hierarchy with seeded synthesis and
//!   single-attribute mutation
//! - `state`: linear, file-backed commit history with undo/redo
//! - `render`: bridge from projects to audio-engine containers
//! - `session`: the operation surface a shell drives

pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod render;
pub mod session;
pub mod state;

pub use config::EngineConfig;
pub use error::{Result, VaultError};
pub use identity::CommitId;
pub use model::{Attribute, Patch, Project, Track};
pub use session::Session;
pub use state::{Commit, CommitStore};
