//! CLI Command Implementations
//!
//! Runs parsed commands against a session and prints their outcome.

use std::io::{self, BufRead, Write};

use clap::Parser;
use log::{info, warn};

use super::{Commands, ShellLine};
use crate::error::{Result, VaultError};
use crate::identity::CommitId;
use crate::model::{parse_indices, Attribute};
use crate::session::Session;

const PROMPT: &str = ">>> ";

/// Run one command, reporting recoverable errors instead of failing.
pub fn run(session: &mut Session, command: &Commands) -> Result<()> {
    match execute(session, command) {
        Err(e) if e.is_recoverable() => {
            report(&e);
            Ok(())
        }
        result => result,
    }
}

/// Run one command.
pub fn execute(session: &mut Session, command: &Commands) -> Result<()> {
    match command {
        Commands::Randomize => print_head(session.randomize_project()?),
        Commands::Mutate { attr, count } => {
            let attr: Attribute = attr.parse()?;
            print_head(session.mutate(attr, *count)?)
        }
        Commands::Select { indices } => {
            print_head(session.select_patches(&parse_indices(indices)?)?)
        }
        Commands::ClonePatches { indices } => {
            print_head(session.clone_patches(&parse_indices(indices)?)?)
        }
        Commands::Arrange { indices } => {
            print_head(session.arrange(&parse_indices(indices)?)?)
        }
        Commands::Freeze { n } => print_head(session.freeze(*n)?),
        Commands::Commit => print_head(session.commit_head()?),
        Commands::Head => {
            let head = session.head()?;
            println!(
                "{} ({}) {} patches, {} frozen",
                head.id(),
                head.id().short_name(),
                head.content().len(),
                head.content().frozen_count()
            );
        }
        Commands::Log => show_log(session),
        Commands::Checkout { id } => print_head(session.checkout(id)?),
        Commands::Undo => print_head(session.undo()?),
        Commands::Redo => print_head(session.redo()?),
        Commands::Tags => println!("{}", session.show_tags()),
        Commands::RandTags => println!("{}", session.randomise_tags()?),
        Commands::ResetTags => println!("{}", session.reset_tags()),
        Commands::Clean { yes: false } => {
            println!("clean deletes every commit and render; pass --yes to confirm")
        }
        Commands::Clean { yes: true } => {
            let removed = session.clean()?;
            println!("removed {} files", removed);
        }
        Commands::Shell => println!("already in the shell"),
    }
    Ok(())
}

/// Read commands from stdin until `exit`, `quit` or end of input.
///
/// Recoverable errors are reported and the loop continues; persistence
/// failures end the shell.
pub fn run_shell(session: &mut Session) -> Result<()> {
    println!("rhythmvault {} - type 'help' for commands", env!("CARGO_PKG_VERSION"));
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        match ShellLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => run(session, &parsed.command)?,
            Err(e) => println!("{}", e),
        }
    }

    info!("exiting");
    Ok(())
}

fn print_head(id: CommitId) {
    println!("HEAD is {} ({})", id, id.short_name());
}

fn show_log(session: &Session) {
    let log = session.log();
    if log.is_empty() {
        println!("No commits.");
        return;
    }

    println!("{:-<60}", "");
    for entry in &log {
        let marker = if entry.is_head { ">>> " } else { "    " };
        println!(
            "{}{:>3} {} ({}) {} patches",
            marker,
            entry.index,
            entry.id,
            entry.id.short_name(),
            entry.patches
        );
    }
    println!("{:-<60}", "");
    println!(
        "Commits: {} | Redo stack: {}",
        log.len(),
        session.store().redo_count()
    );
}

fn report(e: &VaultError) {
    warn!("{}", e);
    if let Some(suggestion) = e.recovery_suggestion() {
        println!("{}", suggestion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::TempDir;

    fn session(dir: &TempDir) -> Session {
        Session::open(EngineConfig {
            store_dir: dir.path().join("git"),
            render_dir: None,
            n_patches: 2,
            seed: Some(3),
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_clean_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        execute(&mut session, &Commands::Randomize).unwrap();

        execute(&mut session, &Commands::Clean { yes: false }).unwrap();
        assert_eq!(session.log().len(), 1);

        execute(&mut session, &Commands::Clean { yes: true }).unwrap();
        assert!(session.log().is_empty());
    }

    #[test]
    fn test_recoverable_errors_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir);
        assert!(run(&mut session, &Commands::Undo).is_ok());
        assert!(execute(&mut session, &Commands::Undo).is_err());
    }
}
