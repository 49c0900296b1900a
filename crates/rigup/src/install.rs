//! Resolves each selected package to an install action and drives the
//! sequential install loop, tolerating per-unit failures.

use anyhow::{Context, Result, anyhow};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::platform::{HostOs, Platform};
use crate::runner::{self, SudoGate};

/// Supported native package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Manager {
    Apt,
    Dnf,
    Homebrew,
    Macports,
    Pacman,
}

impl Manager {
    pub const ALL: [Manager; 5] = [
        Manager::Apt,
        Manager::Dnf,
        Manager::Homebrew,
        Manager::Macports,
        Manager::Pacman,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Manager::Apt => "apt",
            Manager::Dnf => "dnf",
            Manager::Homebrew => "homebrew",
            Manager::Macports => "macports",
            Manager::Pacman => "pacman",
        }
    }

    /// Short hint shown next to the id in the wizard.
    pub fn hint(self) -> &'static str {
        match self {
            Manager::Apt => "Debian, Ubuntu",
            Manager::Dnf => "Fedora, RHEL, AlmaLinux",
            Manager::Homebrew => "macOS",
            Manager::Macports => "macOS",
            Manager::Pacman => "Arch Linux",
        }
    }

    /// Binary probed to detect this manager on the host.
    fn binary(self) -> &'static str {
        match self {
            Manager::Apt => "apt-get",
            Manager::Dnf => "dnf",
            Manager::Homebrew => "brew",
            Manager::Macports => "port",
            Manager::Pacman => "pacman",
        }
    }

    /// First manager whose binary is on PATH, scoped to the host OS.
    pub fn detect(os: HostOs) -> Option<Manager> {
        let candidates: &[Manager] = match os {
            HostOs::MacOs => &[Manager::Homebrew, Manager::Macports],
            HostOs::Linux => &[Manager::Apt, Manager::Pacman, Manager::Dnf],
        };
        candidates
            .iter()
            .copied()
            .find(|m| which::which(m.binary()).is_ok())
    }

    /// Shell command installing `package` through this manager.
    fn install_command(self, package: &str) -> String {
        match self {
            Manager::Apt => format!("sudo apt install -y {package}"),
            Manager::Dnf => format!("sudo dnf install -y {package}"),
            Manager::Homebrew => format!("brew install {package}"),
            Manager::Macports => format!("sudo port install {package}"),
            Manager::Pacman => format!("sudo pacman -S --noconfirm {package}"),
        }
    }
}

impl std::fmt::Display for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Packages whose manager-side name differs from the display identifier.
fn manager_name(manager: Manager, package: &str) -> &str {
    match (package, manager) {
        ("fd", Manager::Apt | Manager::Dnf) => "fd-find",
        ("java-android-studio", Manager::Homebrew) => "--cask zulu@17",
        ("java-android-studio", Manager::Macports) => "openjdk17-zulu",
        _ => package,
    }
}

/// Plugin packages that imply the shell itself on Linux.
const ZSH_PLUGINS: &[&str] = &["zsh-autosuggestions", "zsh-syntax-highlighting"];

const HOMEBREW_INSTALL: &str =
    r#"/bin/bash -c "$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)""#;

/// Pinned fallback when the upstream version probe is unavailable.
const DEFAULT_GO_VERSION: &str = "1.25.5";

/// How one unit of work gets installed. Resolved once, before the loop, so
/// the loop itself is a uniform execute-and-record iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallAction {
    /// Manager command template with the resolved package name.
    Manager { command: String },
    /// Vendor install script piped to a shell.
    Script { command: String },
    /// Versioned toolchain archive; the URL is computed at execution time
    /// from the upstream version probe.
    GoToolchain,
    /// Clone a plugin repository where the manager does not package it.
    CloneRepo { url: String, dest: String },
    /// Platform bootstrap that must run before the packages.
    Bootstrap(Prereq),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prereq {
    XcodeTools,
    Homebrew,
    Macports,
}

/// One unit of installable work.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub name: String,
    pub action: InstallAction,
    /// Follow-up command after a successful install; failure is a warning.
    pub post_install: Option<String>,
}

/// End-of-run accounting.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub attempted: usize,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Add implicitly required companion packages: a zsh plugin without zsh is
/// useless, so a plugin selection on Linux pulls the shell in.
pub fn with_companions(packages: &[String], os: HostOs) -> Vec<String> {
    let mut out = packages.to_vec();
    if os == HostOs::Linux
        && out.iter().any(|p| ZSH_PLUGINS.contains(&p.as_str()))
        && !out.iter().any(|p| p == "zsh")
    {
        out.push("zsh".to_string());
    }
    out
}

/// Map a package identifier to its install action.
pub fn resolve_action(package: &str, manager: Manager, platform: &Platform) -> InstallAction {
    match package {
        "bun" => InstallAction::Script {
            command: "curl -fsSL https://bun.com/install | bash".to_string(),
        },
        "nvm" => InstallAction::Script {
            command:
                "curl -o- https://raw.githubusercontent.com/nvm-sh/nvm/v0.40.2/install.sh | bash"
                    .to_string(),
        },
        "pnpm" => InstallAction::Script {
            command: "curl -fsSL https://get.pnpm.io/install.sh | sh -".to_string(),
        },
        "docker" if platform.os == HostOs::Linux => InstallAction::Script {
            command: "curl -fsSL https://get.docker.com | sudo sh".to_string(),
        },
        "go" => InstallAction::GoToolchain,
        p if ZSH_PLUGINS.contains(&p) && manager == Manager::Macports => InstallAction::CloneRepo {
            url: format!("https://github.com/zsh-users/{p}"),
            dest: format!("~/.zsh/{p}"),
        },
        _ => InstallAction::Manager {
            command: manager.install_command(manager_name(manager, package)),
        },
    }
}

/// Follow-up command for packages that need post-install wiring on Linux.
fn post_install(package: &str, os: HostOs) -> Option<String> {
    if os != HostOs::Linux {
        return None;
    }
    match package {
        "zsh" => Some("sudo chsh -s $(which zsh) $(whoami)".to_string()),
        "bat" => Some(
            "if command -v batcat &>/dev/null && ! command -v bat &>/dev/null; then sudo update-alternatives --install /usr/local/bin/bat bat /usr/bin/batcat 1; fi"
                .to_string(),
        ),
        _ => None,
    }
}

/// Bootstrap items that must run before the main loop on macOS.
pub fn prerequisites(manager: Manager, platform: &Platform) -> Vec<WorkItem> {
    if platform.os != HostOs::MacOs {
        return Vec::new();
    }
    let mut items = Vec::new();
    if which::which("xcode-select").is_err() {
        items.push(WorkItem {
            name: "xcode command line tools".to_string(),
            action: InstallAction::Bootstrap(Prereq::XcodeTools),
            post_install: None,
        });
    }
    match manager {
        Manager::Homebrew if which::which("brew").is_err() => items.push(WorkItem {
            name: "homebrew".to_string(),
            action: InstallAction::Bootstrap(Prereq::Homebrew),
            post_install: None,
        }),
        Manager::Macports if which::which("port").is_err() => items.push(WorkItem {
            name: "macports".to_string(),
            action: InstallAction::Bootstrap(Prereq::Macports),
            post_install: None,
        }),
        _ => {}
    }
    items
}

/// Attempt every selected package once, in order, tolerating failures.
pub fn run_install(
    packages: &[String],
    manager: Manager,
    platform: &Platform,
    dry_run: bool,
) -> Result<InstallReport> {
    let selection = with_companions(packages, platform.os);

    let mut items = prerequisites(manager, platform);
    for pkg in &selection {
        items.push(WorkItem {
            name: pkg.clone(),
            action: resolve_action(pkg, manager, platform),
            post_install: post_install(pkg, platform.os),
        });
    }

    let bar = progress_bar(items.len() as u64);
    let mut gate = SudoGate::default();

    // Warm the credential cache up front when anything in the plan needs it,
    // so the password prompt lands before the bar starts moving. Failure is
    // not fatal: the affected units fail individually, the rest still run.
    if !dry_run && items.iter().any(|i| action_needs_sudo(&i.action)) {
        bar.suspend(|| {
            if let Err(e) = gate.ensure() {
                eprintln!("warning: {e:#}; privileged installs will fail");
            }
        });
    }

    let mut failed = Vec::new();
    for item in &items {
        bar.set_message(item.name.clone());
        if let Err(e) = execute(item, &mut gate, platform, dry_run, &bar) {
            bar.println(format!("{} {}: {e:#}", style("x").red(), item.name));
            failed.push(item.name.clone());
        }
        bar.inc(1);
    }
    bar.finish_with_message("done");

    let succeeded = partition_succeeded(&selection, &failed);
    Ok(InstallReport {
        attempted: items.len(),
        succeeded,
        failed,
    })
}

/// The selection minus whatever failed. Prerequisite items appear only in
/// the failed list; they were never part of the selection.
fn partition_succeeded(selection: &[String], failed: &[String]) -> Vec<String> {
    selection
        .iter()
        .filter(|p| !failed.contains(p))
        .cloned()
        .collect()
}

fn execute(
    item: &WorkItem,
    gate: &mut SudoGate,
    platform: &Platform,
    dry_run: bool,
    bar: &ProgressBar,
) -> Result<()> {
    let command = match &item.action {
        InstallAction::Manager { command } | InstallAction::Script { command } => command.clone(),
        InstallAction::GoToolchain => go_install_command(platform, dry_run),
        InstallAction::CloneRepo { url, dest } => {
            format!("git clone --depth 1 {url} {dest}")
        }
        InstallAction::Bootstrap(prereq) => return bootstrap(*prereq, gate, dry_run, bar),
    };

    run_command(&command, gate, dry_run, bar)?;

    if let Some(post) = &item.post_install {
        if let Err(e) = run_command(post, gate, dry_run, bar) {
            bar.println(format!(
                "warning: post-install step for {} failed: {e:#}",
                item.name
            ));
        }
    }
    Ok(())
}

fn run_command(command: &str, gate: &mut SudoGate, dry_run: bool, bar: &ProgressBar) -> Result<()> {
    if dry_run {
        bar.println(format!(
            "{} would execute: {command}",
            style("[dry-run]").yellow()
        ));
        return Ok(());
    }
    if runner::needs_sudo(command) {
        bar.suspend(|| gate.ensure())?;
    }
    bar.println(format!("{} {command}", style("running").dim()));
    runner::run_shell(command)
}

fn action_needs_sudo(action: &InstallAction) -> bool {
    match action {
        InstallAction::Manager { command } | InstallAction::Script { command } => {
            runner::needs_sudo(command)
        }
        InstallAction::GoToolchain => true,
        InstallAction::CloneRepo { .. } => false,
        InstallAction::Bootstrap(Prereq::Macports) => true,
        InstallAction::Bootstrap(_) => false,
    }
}

fn bootstrap(prereq: Prereq, gate: &mut SudoGate, dry_run: bool, bar: &ProgressBar) -> Result<()> {
    match prereq {
        Prereq::XcodeTools => run_command("xcode-select --install", gate, dry_run, bar),
        Prereq::Homebrew => run_command(HOMEBREW_INSTALL, gate, dry_run, bar),
        Prereq::Macports => install_macports(gate, dry_run, bar),
    }
}

fn go_install_command(platform: &Platform, dry_run: bool) -> String {
    let version = if dry_run {
        DEFAULT_GO_VERSION.to_string()
    } else {
        fetch_go_version().unwrap_or_else(|_| DEFAULT_GO_VERSION.to_string())
    };
    let arch = platform.go_arch();
    match platform.os {
        HostOs::MacOs => format!(
            "curl -LO https://go.dev/dl/go{version}.darwin-{arch}.pkg && sudo installer -pkg go{version}.darwin-{arch}.pkg -target / && rm -f go{version}.darwin-{arch}.pkg"
        ),
        HostOs::Linux => format!(
            "curl -L https://go.dev/dl/go{version}.linux-{arch}.tar.gz | sudo tar -C /usr/local -xzf -"
        ),
    }
}

/// Probe the upstream version marker; the first line looks like `go1.25.5`.
fn fetch_go_version() -> Result<String> {
    let text = crate::http_client()?
        .get("https://go.dev/VERSION?m=text")
        .send()?
        .error_for_status()?
        .text()?;
    let first = text.lines().next().unwrap_or_default().trim();
    let version = first.strip_prefix("go").unwrap_or(first);
    anyhow::ensure!(!version.is_empty(), "empty version response");
    Ok(version.to_string())
}

#[derive(Deserialize)]
struct Release {
    assets: Vec<ReleaseAsset>,
}

#[derive(Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

fn install_macports(gate: &mut SudoGate, dry_run: bool, bar: &ProgressBar) -> Result<()> {
    let version = macos_version()?;
    let os_name = macports_release_name(&version)
        .ok_or_else(|| anyhow!("macOS {version} is not in the auto-install list"))?;

    if dry_run {
        bar.println(format!(
            "{} would download the MacPorts installer for {os_name}",
            style("[dry-run]").yellow()
        ));
        return Ok(());
    }

    let (pkg_name, url) = macports_asset(os_name).unwrap_or_else(|_| {
        let name = "MacPorts-Latest.pkg".to_string();
        let url = format!("https://distfiles.macports.org/MacPorts/{name}");
        (name, url)
    });

    bar.println(format!("downloading MacPorts {pkg_name} for {os_name}"));
    run_command(&format!("curl -LO {url}"), gate, dry_run, bar)?;
    let result = run_command(
        &format!("sudo installer -pkg {pkg_name} -target /"),
        gate,
        dry_run,
        bar,
    );
    let _ = std::fs::remove_file(&pkg_name);
    result
}

fn macos_version() -> Result<String> {
    let output = std::process::Command::new("sw_vers")
        .arg("-productVersion")
        .output()
        .context("failed to run sw_vers")?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn macports_release_name(version: &str) -> Option<&'static str> {
    const NAMES: &[(&str, &str)] = &[
        ("26", "26-Tahoe"),
        ("15", "15-Sequoia"),
        ("14", "14-Sonoma"),
        ("13", "13-Ventura"),
        ("12", "12-Monterey"),
        ("11", "11-BigSur"),
    ];
    NAMES
        .iter()
        .find(|(prefix, _)| version.starts_with(prefix))
        .map(|(_, name)| *name)
}

/// Latest MacPorts installer asset for the given macOS release name.
fn macports_asset(os_name: &str) -> Result<(String, String)> {
    let release: Release = crate::http_client()?
        .get("https://api.github.com/repos/macports/macports-base/releases/latest")
        .header("Accept", "application/vnd.github+json")
        .send()?
        .error_for_status()?
        .json()?;
    release
        .assets
        .into_iter()
        .find(|a| a.name.contains(os_name) && a.name.ends_with(".pkg"))
        .map(|a| (a.name, a.browser_download_url))
        .ok_or_else(|| anyhow!("no installer asset for {os_name}"))
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/238} {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("━╸─"),
    );
    bar
}
