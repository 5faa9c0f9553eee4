//! Error handling for Rhythmvault
//!
//! History and mutation errors are locally recoverable; persistence
//! failures are not, since a commit that was never written must not be
//! reported as succeeded.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Rhythmvault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Main error type for Rhythmvault operations
#[derive(Error, Debug)]
pub enum VaultError {
    // History Errors
    #[error("History is empty: create a commit first")]
    EmptyHistory,

    #[error("No tracks found to mutate ({attr})")]
    NoMatchingTracks { attr: String },

    #[error("Commit not found: {id}")]
    CommitNotFound { id: String },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Invalid commit name: {name}")]
    InvalidCommitName { name: String },

    // File Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Model Errors
    #[error("Unknown machine: {machine}")]
    UnknownMachine { machine: String },

    #[error("Unknown pattern function: {key}")]
    UnknownPattern { key: String },

    #[error("Invalid pattern args: {pulses} pulses in {steps} steps")]
    InvalidPatternArgs { pulses: u32, steps: u32 },

    #[error("Unknown groove function: {key}")]
    UnknownGroove { key: String },

    #[error("Tag '{tag}' matched {found} samples, {needed} needed")]
    InsufficientSamples {
        tag: String,
        needed: usize,
        found: usize,
    },

    #[error("Attribute '{attr}' is not supported by track '{track}'")]
    UnsupportedAttribute { attr: String, track: String },

    #[error("Unknown attribute: {attr}")]
    UnknownAttribute { attr: String },

    #[error("Patch index {index} out of range for {len} patches")]
    PatchIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid patch indices: {reason}")]
    InvalidIndices { reason: String },

    #[error("Unknown tag '{tag}' for track '{track}'")]
    UnknownTag { track: String, tag: String },

    #[error("Invalid track document: {reason}")]
    InvalidDocument { reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Render Errors
    #[error("Render failed: {reason}")]
    Render { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            VaultError::EmptyHistory => "EMPTY_HISTORY",
            VaultError::NoMatchingTracks { .. } => "NO_MATCHING_TRACKS",
            VaultError::CommitNotFound { .. } => "COMMIT_NOT_FOUND",
            VaultError::NothingToUndo => "EMPTY_UNDO",
            VaultError::NothingToRedo => "EMPTY_REDO",
            VaultError::InvalidCommitName { .. } => "INVALID_COMMIT_NAME",
            VaultError::FileReadError { .. } => "FILE_READ_ERROR",
            VaultError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            VaultError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            VaultError::UnknownMachine { .. } => "UNKNOWN_MACHINE",
            VaultError::UnknownPattern { .. } => "UNKNOWN_PATTERN",
            VaultError::InvalidPatternArgs { .. } => "INVALID_PATTERN_ARGS",
            VaultError::UnknownGroove { .. } => "UNKNOWN_GROOVE",
            VaultError::InsufficientSamples { .. } => "INSUFFICIENT_SAMPLES",
            VaultError::UnsupportedAttribute { .. } => "UNSUPPORTED_ATTRIBUTE",
            VaultError::UnknownAttribute { .. } => "UNKNOWN_ATTRIBUTE",
            VaultError::PatchIndexOutOfRange { .. } => "PATCH_INDEX_OUT_OF_RANGE",
            VaultError::InvalidIndices { .. } => "INVALID_INDICES",
            VaultError::UnknownTag { .. } => "UNKNOWN_TAG",
            VaultError::InvalidDocument { .. } => "INVALID_DOCUMENT",
            VaultError::InvalidConfig { .. } => "INVALID_CONFIG",
            VaultError::Render { .. } => "RENDER_ERROR",
            VaultError::Io(_) => "IO_ERROR",
            VaultError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error can be reported and skipped without aborting
    ///
    /// Persistence failures are the one fatal class: the current operation
    /// must not be reported as succeeded.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            VaultError::FileReadError { .. }
                | VaultError::FileWriteError { .. }
                | VaultError::DirectoryCreateError { .. }
                | VaultError::Io(_)
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            VaultError::EmptyHistory => Some("Run 'randomize' to create the first commit."),
            VaultError::NoMatchingTracks { .. } => {
                Some("No track in an unfrozen patch supports this attribute.")
            }
            VaultError::CommitNotFound { .. } => Some("Use 'log' to list known commit ids."),
            VaultError::NothingToUndo => Some("There are no commits to undo."),
            VaultError::NothingToRedo => Some("There are no undone commits to redo."),
            VaultError::InsufficientSamples { .. } => {
                Some("Pick another tag or add samples to the manifest.")
            }
            VaultError::PatchIndexOutOfRange { .. } => {
                Some("Indices are hex digits into the patches at HEAD.")
            }
            VaultError::FileWriteError { .. } | VaultError::DirectoryCreateError { .. } => {
                Some("Check that the store directory is writable and the disk is not full.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = VaultError::CommitNotFound {
            id: "nope".to_string(),
        };
        assert_eq!(err.error_code(), "COMMIT_NOT_FOUND");
        assert_eq!(VaultError::NothingToUndo.error_code(), "EMPTY_UNDO");
    }

    #[test]
    fn test_history_errors_are_recoverable() {
        assert!(VaultError::EmptyHistory.is_recoverable());
        assert!(VaultError::NothingToRedo.is_recoverable());
        assert!(VaultError::NoMatchingTracks {
            attr: "sounds".to_string()
        }
        .is_recoverable());
    }

    #[test]
    fn test_persistence_errors_are_fatal() {
        let err = VaultError::FileWriteError {
            path: PathBuf::from("/readonly/x.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }
}
