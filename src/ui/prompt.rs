//! Directory selection

use crate::types::CopyCatError;
use console::Term;
use dialoguer::Input;
use std::fmt;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which directory is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRole {
    Source,
    Destination,
}

impl fmt::Display for DirectoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryRole::Source => write!(f, "Source directory"),
            DirectoryRole::Destination => write!(f, "Destination directory"),
        }
    }
}

/// Picks a directory, or reports that the user cancelled (`Ok(None)`).
pub trait DirectoryChooser {
    fn choose_directory(&self, role: DirectoryRole) -> Result<Option<PathBuf>, CopyCatError>;
}

/// Validate a chosen path for `role` and make it absolute.
///
/// * Source: must be an existing directory
/// * Destination: must be a directory or not exist yet
///
/// Any other lookup failure (permissions, a file in the middle of the path)
/// is an `InvalidDirectory` error for both roles.
pub fn resolve_directory(path: &Path, role: DirectoryRole) -> Result<PathBuf, CopyCatError> {
    let invalid = |reason: &str| CopyCatError::InvalidDirectory {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(fs::canonicalize(path)?),
        Ok(_) => Err(invalid("not a directory")),
        Err(e) if e.kind() == io::ErrorKind::NotFound => match role {
            DirectoryRole::Source => Err(invalid("does not exist")),
            DirectoryRole::Destination if path.is_absolute() => Ok(path.to_path_buf()),
            DirectoryRole::Destination => Ok(std::env::current_dir()?.join(path)),
        },
        Err(e) => Err(invalid(&format!("not accessible: {}", e))),
    }
}

/// Uses paths given on the command line, prompting for any that are missing.
///
/// An empty answer cancels. Without a terminal on stdin, a missing path
/// counts as cancelled.
#[derive(Debug, Clone, Default)]
pub struct TerminalChooser {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
}

impl TerminalChooser {
    pub fn new(source: Option<PathBuf>, destination: Option<PathBuf>) -> Self {
        Self {
            source,
            destination,
        }
    }

    fn preset(&self, role: DirectoryRole) -> Option<&Path> {
        match role {
            DirectoryRole::Source => self.source.as_deref(),
            DirectoryRole::Destination => self.destination.as_deref(),
        }
    }

    fn prompt(&self, role: DirectoryRole) -> Result<Option<PathBuf>, CopyCatError> {
        if !std::io::stdin().is_terminal() || !Term::stderr().is_term() {
            info!("{} not given and no terminal to ask on", role);
            return Ok(None);
        }

        loop {
            let answer: String = Input::new()
                .with_prompt(format!("{} (empty to cancel)", role))
                .allow_empty(true)
                .interact_text()
                .map_err(|e| CopyCatError::Io(std::io::Error::other(e.to_string())))?;

            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(None);
            }

            match resolve_directory(Path::new(answer), role) {
                Ok(path) => return Ok(Some(path)),
                Err(e) => warn!("{}", e),
            }
        }
    }
}

impl DirectoryChooser for TerminalChooser {
    fn choose_directory(&self, role: DirectoryRole) -> Result<Option<PathBuf>, CopyCatError> {
        match self.preset(role) {
            Some(path) => resolve_directory(path, role).map(Some),
            None => self.prompt(role),
        }
    }
}
