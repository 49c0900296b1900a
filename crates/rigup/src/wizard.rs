//! Interactive setup wizard using dialoguer: pick an operation, then the
//! packages, build files, and git identity it needs.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::config::{Operation, Selection};
use crate::install::Manager;
use crate::platform::{HostOs, Platform};

const BANNER: &str = r#"
        _
   _ __(_) __ _ _   _ _ __
  | '__| |/ _` | | | | '_ \
  | |  | | (_| | |_| | |_) |
  |_|  |_|\__, |\__,_| .__/
          |___/      |_|
"#;

pub const CLI_TOOLS: &[&str] = &[
    "bat", "fastfetch", "fd", "ffmpeg", "gh", "git", "jq", "just", "tree",
];
pub const EXPORT_TOOLS: &[&str] = &["bun", "docker", "go", "nvm", "pipx", "pnpm"];
pub const PLUGIN_TOOLS: &[&str] = &["fzf", "zsh-autosuggestions", "zsh-syntax-highlighting"];
pub const BUILD_FILES: &[&str] = &[".zshrc", ".zprofile", ".gitconfig", ".gitignore"];

enum SummaryOutcome {
    Proceed,
    StartOver,
    Abort,
}

/// Run the wizard. Returns `None` when the user aborts.
pub fn run(saved: &Selection, platform: &Platform, dry_run: bool) -> Result<Option<Selection>> {
    intro(dry_run);

    loop {
        let operation = select_operation(saved)?;
        let mut selection = Selection {
            operation: Some(operation),
            ..Selection::default()
        };

        match operation {
            Operation::Delete => {
                let confirmed = Confirm::new()
                    .with_prompt("Delete all backup files under ~/.config/rigup?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    return abort();
                }
                return Ok(Some(selection));
            }
            Operation::Install => {
                selection.package_manager = Some(select_manager(saved, platform)?);
                selection.packages = select_packages(saved, platform, true)?;
            }
            Operation::Configure => {
                selection.build_files = select_build_files(saved)?;
                if selection.build_files.iter().any(|f| f == ".gitconfig") {
                    configure_git_identity(saved, &mut selection)?;
                }
                if selection.build_files.iter().any(|f| f == ".zshrc") {
                    selection.packages = select_packages(saved, platform, false)?;
                }
            }
        }

        match confirm_summary(&selection)? {
            SummaryOutcome::Proceed => return Ok(Some(selection)),
            SummaryOutcome::StartOver => continue,
            SummaryOutcome::Abort => return abort(),
        }
    }
}

fn abort() -> Result<Option<Selection>> {
    println!("{}", style("[aborted] no actions performed").yellow());
    Ok(None)
}

fn intro(dry_run: bool) {
    println!("{}", style(BANNER).cyan());
    let mut title = format!(
        "Welcome to rigup {}",
        style(concat!("v", env!("CARGO_PKG_VERSION"))).green()
    );
    if dry_run {
        title.push_str(&format!(" {}", style("[dry-run]").yellow().bold()));
    }
    println!("{title}");
    println!(
        "{}",
        style("Install packages and generate shell configuration for this machine.").dim()
    );
    println!();
}

fn select_operation(saved: &Selection) -> Result<Operation> {
    const OPERATIONS: [Operation; 3] =
        [Operation::Configure, Operation::Install, Operation::Delete];
    let labels = [
        "Configure shell (.zshrc, .zprofile, .gitconfig, .gitignore)",
        "Install packages (using your package manager)",
        "Delete backup files (~/.config/rigup/bak*)",
    ];

    let default = saved
        .operation
        .and_then(|op| OPERATIONS.iter().position(|&o| o == op))
        .unwrap_or(0);
    let choice = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(OPERATIONS[choice])
}

fn select_manager(saved: &Selection, platform: &Platform) -> Result<Manager> {
    let preferred = saved.package_manager.or_else(|| Manager::detect(platform.os));
    let labels: Vec<String> = Manager::ALL
        .iter()
        .map(|m| format!("{} ({})", m.id(), m.hint()))
        .collect();
    let default = preferred
        .and_then(|m| Manager::ALL.iter().position(|&x| x == m))
        .unwrap_or(0);

    let choice = Select::new()
        .with_prompt("Select your package manager")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(Manager::ALL[choice])
}

fn select_build_files(saved: &Selection) -> Result<Vec<String>> {
    loop {
        let defaults: Vec<bool> = BUILD_FILES
            .iter()
            .map(|f| saved.build_files.iter().any(|s| s == f))
            .collect();
        let picks = MultiSelect::new()
            .with_prompt("Which files should be generated?\n  (space to toggle, enter to confirm)")
            .items(BUILD_FILES)
            .defaults(&defaults)
            .interact()?;

        if picks.is_empty() {
            println!("{}", style("Select at least one file.").yellow());
            continue;
        }
        return Ok(picks.into_iter().map(|i| BUILD_FILES[i].to_string()).collect());
    }
}

fn configure_git_identity(saved: &Selection, selection: &mut Selection) -> Result<()> {
    let mut name = Input::<String>::new().with_prompt("Git name");
    if !saved.git_name.is_empty() {
        name = name.default(saved.git_name.clone());
    }
    selection.git_name = name
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("name is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let mut email = Input::<String>::new().with_prompt("Git email");
    if !saved.git_email.is_empty() {
        email = email.default(saved.git_email.clone());
    }
    selection.git_email = email
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("email is required")
            } else if !input.contains('@') || !input.contains('.') {
                Err("email is invalid")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let branch_default = if saved.git_branch.is_empty() {
        "main".to_string()
    } else {
        saved.git_branch.clone()
    };
    selection.git_branch = Input::new()
        .with_prompt("Default branch")
        .default(branch_default)
        .interact_text()?;
    Ok(())
}

fn select_packages(
    saved: &Selection,
    platform: &Platform,
    include_cli_tools: bool,
) -> Result<Vec<String>> {
    let mut exports: Vec<&str> = EXPORT_TOOLS.to_vec();
    if platform.os == HostOs::MacOs {
        exports.push("java-android-studio");
        exports.sort();
    }

    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    if include_cli_tools {
        groups.push(("CLI tools", CLI_TOOLS.to_vec()));
    }
    groups.push(("Exports", exports));
    groups.push(("Plugins", PLUGIN_TOOLS.to_vec()));

    let mut packages = Vec::new();
    for (label, items) in groups {
        let defaults: Vec<bool> = items
            .iter()
            .map(|p| saved.packages.iter().any(|s| s == p))
            .collect();
        let picks = MultiSelect::new()
            .with_prompt(format!(
                "Select {label}\n  (space to toggle, enter to confirm)"
            ))
            .items(&items)
            .defaults(&defaults)
            .interact()?;
        packages.extend(picks.into_iter().map(|i| items[i].to_string()));
    }
    Ok(packages)
}

fn confirm_summary(selection: &Selection) -> Result<SummaryOutcome> {
    let needs_packages = matches!(selection.operation, Some(Operation::Install))
        || selection.build_files.iter().any(|f| f == ".zshrc");

    if needs_packages && selection.packages.is_empty() {
        let again = Confirm::new()
            .with_prompt("No packages selected — start over?")
            .default(true)
            .interact()?;
        return Ok(if again {
            SummaryOutcome::StartOver
        } else {
            SummaryOutcome::Abort
        });
    }

    print_summary(selection);

    let confirmed = Confirm::new()
        .with_prompt("Proceed?")
        .default(false)
        .interact()?;
    Ok(if confirmed {
        SummaryOutcome::Proceed
    } else {
        SummaryOutcome::Abort
    })
}

fn print_summary(selection: &Selection) {
    use tabled::settings::{Modify, Style, object::Rows};

    let mut rows: Vec<[String; 2]> = vec![["SUMMARY".to_string(), String::new()]];
    if let Some(op) = selection.operation {
        rows.push(["Operation".to_string(), op.to_string()]);
    }
    if let Some(manager) = selection.package_manager {
        rows.push(["Installing with".to_string(), manager.to_string()]);
    }
    if !selection.build_files.is_empty() {
        rows.push(["Build files".to_string(), selection.build_files.join(", ")]);
    }
    if !selection.packages.is_empty() {
        rows.push(["Packages".to_string(), selection.packages.join(", ")]);
    }

    let table = tabled::Table::from_iter(rows)
        .with(Style::blank())
        .with(
            Modify::new(Rows::first()).with(tabled::settings::Format::content(|s| {
                style(s).bold().to_string()
            })),
        )
        .to_string();

    println!();
    println!("{table}");
    println!();
}
