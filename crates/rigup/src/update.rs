//! Self-update: look up the latest release and re-run the install script.

use anyhow::{Context, Result};
use console::style;
use dialoguer::Confirm;
use serde::Deserialize;

use crate::runner::{self, SudoGate};

const RELEASE_URL: &str = "https://api.github.com/repos/rigup-sh/rigup/releases/latest";
const INSTALL_SCRIPT_URL: &str = "https://raw.githubusercontent.com/rigup-sh/rigup/main/install.sh";

#[derive(Deserialize)]
struct Release {
    tag_name: String,
}

/// Latest published version tag, or the current version when the lookup
/// fails (offline updates degrade to a reinstall of the same version).
pub fn latest_version() -> String {
    fetch_latest().unwrap_or_else(|_| concat!("v", env!("CARGO_PKG_VERSION")).to_string())
}

fn fetch_latest() -> Result<String> {
    let release: Release = crate::http_client()?
        .get(RELEASE_URL)
        .header("Accept", "application/vnd.github+json")
        .send()?
        .error_for_status()?
        .json()?;
    Ok(release.tag_name)
}

pub fn run(force: bool) -> Result<()> {
    let latest = latest_version();

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Update to version {}?", style(&latest).cyan().bold()))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("[aborted] rigup remains as installed").yellow());
            return Ok(());
        }
    }

    let mut gate = SudoGate::default();
    gate.ensure()
        .context("root privileges are required to update rigup")?;

    let sp = crate::spinner(&format!("Updating to {latest}..."));
    let mut command = format!("curl -sSL {INSTALL_SCRIPT_URL} | bash -s --");
    if force {
        command.push_str(" --force");
    }
    let result = runner::run_shell(&command);
    sp.finish_and_clear();

    match result {
        Ok(()) => {
            println!("{} updated to {latest}", style("done").green().bold());
            Ok(())
        }
        Err(e) => Err(e).context("failed to update rigup"),
    }
}
