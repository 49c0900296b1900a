//! rigup — bootstrap a new machine: install packages and generate shell config.
//! Re-exports all modules and drives the selected operation end to end.

pub(crate) mod assemble;
pub(crate) mod assets;
pub mod cli;
pub mod config;
pub(crate) mod install;
pub(crate) mod platform;
pub(crate) mod runner;
pub(crate) mod uninstall;
pub(crate) mod update;
pub(crate) mod wizard;
pub(crate) mod writer;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use assets::EmbeddedStore;
use cli::{Cli, Command};
use config::{Operation, Selection};
use platform::Platform;

/// Create a spinner with a consistent style.
fn spinner(msg: &str) -> ProgressBar {
    let sp = ProgressBar::new_spinner();
    sp.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    sp.set_message(msg.to_string());
    sp.enable_steady_tick(Duration::from_millis(80));
    sp
}

/// Shared blocking HTTP client for release metadata lookups.
pub(crate) fn http_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(concat!("rigup/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")
}

/// Run the CLI with parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Version) => {
            println!("rigup v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(Command::Uninstall) => return uninstall::run(),
        Some(Command::Update { force }) => return update::run(force),
        None => {}
    }
    if cli.uninstall {
        return uninstall::run();
    }

    let platform = Platform::detect();
    let saved = Selection::load(&config::selection_path()?);

    let Some(selection) = wizard::run(&saved, &platform, cli.dry_run)? else {
        return Ok(());
    };

    execute(&selection, &platform, cli.dry_run)?;

    if !cli.dry_run {
        let mut merged = saved;
        merged.merge_from(&selection);
        merged.save(&config::selection_path()?)?;
    }
    Ok(())
}

/// Dispatch the confirmed selection to its operation.
fn execute(selection: &Selection, platform: &Platform, dry_run: bool) -> Result<()> {
    if dry_run {
        eprintln!(
            "{}",
            style("[dry-run] no changes will be made").yellow().bold()
        );
    }
    match selection.operation {
        Some(Operation::Install) => run_install_op(selection, platform, dry_run),
        Some(Operation::Configure) => run_configure_op(selection, platform, dry_run),
        Some(Operation::Delete) => run_delete_op(dry_run),
        None => Ok(()),
    }
}

fn run_install_op(selection: &Selection, platform: &Platform, dry_run: bool) -> Result<()> {
    if selection.packages.is_empty() {
        println!("{}", style("No packages selected to install.").yellow());
        return Ok(());
    }
    let manager = selection
        .package_manager
        .context("no package manager selected")?;

    let report = install::run_install(&selection.packages, manager, platform, dry_run)?;

    println!();
    println!(
        "{}",
        style(format!("{} item(s) of work attempted", report.attempted)).dim()
    );
    if !report.succeeded.is_empty() {
        println!(
            "{} {} package(s): {}",
            style("installed").green().bold(),
            report.succeeded.len(),
            report.succeeded.join(", ")
        );
    }
    if !report.failed.is_empty() {
        println!(
            "{} {} item(s): {}",
            style("failed").red().bold(),
            report.failed.len(),
            report.failed.join(", ")
        );
    }
    Ok(())
}

fn run_configure_op(selection: &Selection, platform: &Platform, dry_run: bool) -> Result<()> {
    if selection.build_files.is_empty() {
        println!("{}", style("No files selected to configure.").yellow());
        return Ok(());
    }

    let home = dirs::home_dir().context("could not determine home directory")?;
    let backup_dir = config::config_dir()?;
    let store = EmbeddedStore;

    let mut created: Vec<String> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();

    for file in &selection.build_files {
        let content = match file.as_str() {
            ".zshrc" => {
                let sp = spinner("Assembling .zshrc...");
                let build = assemble::build_zshrc(&store, platform, &selection.packages);
                for warning in &build.warnings {
                    sp.println(format!("warning: {warning}"));
                }
                for path in &build.included {
                    sp.println(format!("  {} {path}", style("include").dim()));
                }
                sp.finish_and_clear();
                Some(build.content)
            }
            ".zprofile" => assemble::find_zprofile(&store, platform).map(|(_, data)| data),
            ".gitconfig" => {
                let identity = assemble::GitIdentity {
                    name: selection.git_name.clone(),
                    email: selection.git_email.clone(),
                    branch: if selection.git_branch.is_empty() {
                        "main".to_string()
                    } else {
                        selection.git_branch.clone()
                    },
                };
                let gh_present = which::which("gh").is_ok();
                Some(assemble::render_gitconfig(&identity, gh_present).into_bytes())
            }
            ".gitignore" => assemble::bundled_gitignore(&store),
            other => {
                eprintln!("warning: unknown build file {other}");
                None
            }
        };

        let Some(content) = content else {
            println!("{} {file} (no template for this platform)", style("skipped").yellow());
            skipped.push(file.clone());
            continue;
        };

        match writer::write_home_file(&home, &backup_dir, file, &content, dry_run) {
            Ok(outcome) => {
                if let writer::WriteOutcome::Written {
                    backup: Some(backup),
                    ..
                } = &outcome
                {
                    println!(
                        "{} existing file moved to {}",
                        style("backed up").cyan(),
                        backup.display()
                    );
                }
                println!("{} {}", style("created").green(), outcome.display_name());
                created.push(outcome.display_name());
            }
            Err(e) => {
                eprintln!("warning: {e:#}");
                skipped.push(file.clone());
            }
        }
    }

    println!();
    println!(
        "{} {} file(s) created, {} skipped",
        style("done").green().bold(),
        created.len(),
        skipped.len()
    );
    if !created.is_empty() {
        println!(
            "Created in your home directory: {}",
            style(created.join(", ")).cyan()
        );
    }
    Ok(())
}

fn run_delete_op(dry_run: bool) -> Result<()> {
    let backup_dir = config::config_dir()?;
    let report = writer::delete_backups(&backup_dir, dry_run)?;

    if report.is_empty() {
        println!("No backup files found.");
        return Ok(());
    }

    for name in &report.deleted {
        if dry_run {
            println!("{} would delete: {name}", style("[dry-run]").yellow());
        } else {
            println!("{} {name}", style("deleted").green());
        }
    }
    for failure in &report.failed {
        eprintln!("warning: could not delete {failure}");
    }
    println!(
        "{} {} deleted, {} failed",
        style("done").green().bold(),
        report.deleted.len(),
        report.failed.len()
    );
    Ok(())
}
