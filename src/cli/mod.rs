//! CLI Module
//!
//! Command-line interface for the rhythmvault engine.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::EngineConfig;
use crate::error::Result;

/// Rhythmvault - versioned generative drum patterns
#[derive(Parser, Debug)]
#[command(name = "rhythmvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the commit store directory
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Override the number of patches per project
    #[arg(long, global = true)]
    pub n_patches: Option<usize>,

    /// Override the sample cutoff
    #[arg(long, global = true)]
    pub cutoff: Option<f64>,

    /// Seed the session rng
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Configuration file (or defaults) with flag overrides applied.
    pub fn load_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(store) = &self.store {
            config.store_dir = store.clone();
        }
        if let Some(n_patches) = self.n_patches {
            config.n_patches = n_patches;
        }
        if let Some(cutoff) = self.cutoff {
            config.cutoff = cutoff;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Commit a freshly randomized project
    #[command(name = "randomize", alias = "rand")]
    Randomize,

    /// Mutate one attribute of unfrozen patches
    #[command(name = "mutate")]
    Mutate {
        /// pattern, groove, seeds, temperature, density or sounds
        attr: String,

        /// Mutations per unfrozen patch
        #[arg(default_value_t = 1)]
        count: usize,
    },

    /// Keep only the given patches (hex digits, e.g. 03a)
    #[command(name = "select")]
    Select { indices: String },

    /// Fill the project with clones of the given patches
    #[command(name = "clone")]
    ClonePatches { indices: String },

    /// Arrange the given patches into phrases
    #[command(name = "arrange")]
    Arrange { indices: String },

    /// Freeze the first n patches
    #[command(name = "freeze")]
    Freeze { n: usize },

    /// Re-commit the current head
    #[command(name = "commit")]
    Commit,

    /// Show the current head
    #[command(name = "head")]
    Head,

    /// List commits
    #[command(name = "log")]
    Log,

    /// Copy a commit to a new head
    #[command(name = "checkout")]
    Checkout {
        /// Full name, slug or short name
        id: String,
    },

    /// Move head back one commit
    #[command(name = "undo")]
    Undo,

    /// Re-apply the last undone commit
    #[command(name = "redo")]
    Redo,

    /// Show track tags
    #[command(name = "tags")]
    Tags,

    /// Randomise track tags
    #[command(name = "rand-tags")]
    RandTags,

    /// Reset every track tag to its name
    #[command(name = "reset-tags")]
    ResetTags,

    /// Delete all commits and rendered files
    #[command(name = "clean")]
    Clean {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Interactive shell keeping one session
    #[command(name = "shell")]
    Shell,
}

/// A single shell line, parsed with the same grammar as the subcommands.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "rhythmvault")]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mutate() {
        let cli = Cli::parse_from(["rhythmvault", "mutate", "seeds", "3"]);
        assert_eq!(
            cli.command,
            Some(Commands::Mutate {
                attr: "seeds".to_string(),
                count: 3
            })
        );
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "rhythmvault",
            "--store",
            "/tmp/elsewhere",
            "--n-patches",
            "8",
            "--seed",
            "5",
            "log",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.n_patches, 8);
        assert_eq!(config.seed, Some(5));
    }

    #[test]
    fn test_invalid_override() {
        let cli = Cli::parse_from(["rhythmvault", "--cutoff", "0", "log"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn test_shell_line() {
        let line = ShellLine::try_parse_from("clone 03".split_whitespace()).unwrap();
        assert_eq!(
            line.command,
            Commands::ClonePatches {
                indices: "03".to_string()
            }
        );
        assert!(ShellLine::try_parse_from("bogus".split_whitespace()).is_err());
    }

    #[test]
    fn test_parse_clean() {
        let line = ShellLine::try_parse_from("clean".split_whitespace()).unwrap();
        assert_eq!(line.command, Commands::Clean { yes: false });
        let cli = Cli::parse_from(["rhythmvault", "clean", "--yes"]);
        assert_eq!(cli.command, Some(Commands::Clean { yes: true }));
    }
}
