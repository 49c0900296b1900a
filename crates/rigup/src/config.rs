//! Persisted selection: what the user chose last run, reloaded as prompt defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::install::Manager;

/// The three things a run can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Install,
    Configure,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Install => write!(f, "install"),
            Operation::Configure => write!(f, "configure"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// The user's choices for one run.
///
/// One explicit schema: every field defaults, so an older or hand-edited file
/// on disk collapses to sensible blanks instead of failing the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub operation: Option<Operation>,

    #[serde(default)]
    pub package_manager: Option<Manager>,

    /// Output files to generate, in the order they were selected.
    #[serde(default)]
    pub build_files: Vec<String>,

    /// Selected package identifiers.
    #[serde(default)]
    pub packages: Vec<String>,

    #[serde(default)]
    pub git_name: String,
    #[serde(default)]
    pub git_email: String,
    #[serde(default)]
    pub git_branch: String,
}

impl Selection {
    /// Load the persisted selection, falling back to defaults.
    ///
    /// A missing file is the common first-run case. A file that exists but
    /// cannot be read or parsed yields defaults with a warning — the wizard
    /// re-prompts for everything anyway.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                eprintln!("warning: could not read {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(selection) => selection,
            Err(e) => {
                eprintln!(
                    "warning: {} is malformed ({}), starting from defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("failed to serialize selection")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Merge a completed run into the saved state, touching only the fields
    /// the chosen operation actually used.
    pub fn merge_from(&mut self, chosen: &Selection) {
        self.operation = chosen.operation;
        match chosen.operation {
            Some(Operation::Install) => {
                self.package_manager = chosen.package_manager;
            }
            Some(Operation::Configure) => {
                self.build_files = chosen.build_files.clone();
                if chosen.build_files.iter().any(|f| f == ".zshrc") {
                    self.packages = chosen.packages.clone();
                }
                if chosen.build_files.iter().any(|f| f == ".gitconfig") {
                    self.git_name = chosen.git_name.clone();
                    self.git_email = chosen.git_email.clone();
                    self.git_branch = chosen.git_branch.clone();
                }
            }
            Some(Operation::Delete) | None => {}
        }
    }
}

/// Config directory: `~/.config/rigup`. Holds the saved selection and backups.
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("could not determine home directory")?
        .join(".config")
        .join("rigup"))
}

/// Where the selection is persisted between runs.
pub fn selection_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}
