//! Remove the installed binary, with manual-cleanup hints on failure.

use anyhow::{Context, Result};
use console::style;
use dialoguer::Confirm;
use std::path::Path;

use crate::runner::{self, SudoGate};

const INSTALL_PATH: &str = "/usr/local/bin/rigup";

pub fn run() -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt("Remove rigup from this machine?")
        .default(false)
        .interact()?;
    if !confirmed {
        println!("{}", style("[aborted] rigup remains installed").yellow());
        return Ok(());
    }

    if let Err(e) = remove_binary(Path::new(INSTALL_PATH)) {
        eprintln!("{} {e:#}", style("error:").red().bold());
        eprintln!("To finish the cleanup, remove these manually:");
        eprintln!("  {}", style(INSTALL_PATH).cyan());
        eprintln!("  {}", style("~/.config/rigup").cyan());
        anyhow::bail!("failed to remove {INSTALL_PATH}");
    }

    println!("{} rigup has been removed", style("done").green().bold());
    println!(
        "Backups and the saved selection remain in {}",
        style("~/.config/rigup").cyan()
    );
    Ok(())
}

fn remove_binary(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        // already gone — nothing to do
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            let mut gate = SudoGate::default();
            gate.ensure()?;
            runner::run_shell(&format!("sudo rm -f {}", path.display()))
        }
        Err(e) => {
            Err(e).with_context(|| format!("failed to remove {}", path.display()))
        }
    }
}
