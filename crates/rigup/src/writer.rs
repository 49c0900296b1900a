//! Writes generated files under the home directory with backup semantics.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Prefix for dry-run sibling files.
const DRY_RUN_PREFIX: &str = "test_";

/// Prefix for backup files inside the backup directory.
pub const BACKUP_PREFIX: &str = "bak";

/// Where a write actually landed.
#[derive(Debug)]
pub enum WriteOutcome {
    Written {
        path: PathBuf,
        backup: Option<PathBuf>,
    },
    DryRun {
        path: PathBuf,
    },
}

impl WriteOutcome {
    /// File name as it should appear in the end-of-run summary.
    pub fn display_name(&self) -> String {
        let path = match self {
            WriteOutcome::Written { path, .. } | WriteOutcome::DryRun { path } => path,
        };
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// Persist `content` as `home/<name>`.
///
/// Dry runs write a `test_`-prefixed sibling and never touch the real
/// target. Live runs move an existing target into the backup directory
/// first; a failed backup is a warning, not a reason to skip the write.
pub fn write_home_file(
    home: &Path,
    backup_dir: &Path,
    name: &str,
    content: &[u8],
    dry_run: bool,
) -> Result<WriteOutcome> {
    if dry_run {
        let path = home.join(format!("{DRY_RUN_PREFIX}{name}"));
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        return Ok(WriteOutcome::DryRun { path });
    }

    let target = home.join(name);
    let mut backup = None;
    if target.exists() {
        match back_up(&target, backup_dir, name) {
            Ok(path) => backup = Some(path),
            Err(e) => eprintln!("warning: could not back up {}: {e:#}", target.display()),
        }
    }

    std::fs::write(&target, content)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(WriteOutcome::Written { path: target, backup })
}

/// Move `target` into the backup directory under a timestamped name.
fn back_up(target: &Path, backup_dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(backup_dir)
        .with_context(|| format!("failed to create {}", backup_dir.display()))?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = backup_dir.join(format!("{BACKUP_PREFIX}_{stamp}_{name}"));
    std::fs::rename(target, &backup_path).with_context(|| {
        format!(
            "failed to move {} to {}",
            target.display(),
            backup_path.display()
        )
    })?;
    Ok(backup_path)
}

/// Outcome of the backup-deletion operation.
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

impl DeleteReport {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.failed.is_empty()
    }
}

/// Remove (or, in dry run, list) every `bak*` file in the backup directory.
pub fn delete_backups(backup_dir: &Path, dry_run: bool) -> Result<DeleteReport> {
    let mut report = DeleteReport::default();
    let pattern = backup_dir.join(format!("{BACKUP_PREFIX}*"));
    let matches =
        glob::glob(&pattern.to_string_lossy()).context("invalid backup glob pattern")?;

    for entry in matches {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                report.failed.push(e.to_string());
                continue;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if dry_run {
            report.deleted.push(name);
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => report.deleted.push(name),
            Err(e) => report.failed.push(format!("{name} ({e})")),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dry_run_writes_test_sibling_only() {
        let home = TempDir::new().unwrap();
        let backups = home.path().join("backups");

        let outcome =
            write_home_file(home.path(), &backups, ".zshrc", b"content", true).unwrap();

        assert!(matches!(outcome, WriteOutcome::DryRun { .. }));
        assert_eq!(outcome.display_name(), "test_.zshrc");
        assert!(home.path().join("test_.zshrc").exists());
        assert!(!home.path().join(".zshrc").exists());
        assert!(!backups.exists());
    }

    #[test]
    fn dry_run_leaves_existing_target_untouched() {
        let home = TempDir::new().unwrap();
        let backups = home.path().join("backups");
        std::fs::write(home.path().join(".zshrc"), "old").unwrap();

        write_home_file(home.path(), &backups, ".zshrc", b"new", true).unwrap();

        let real = std::fs::read_to_string(home.path().join(".zshrc")).unwrap();
        assert_eq!(real, "old");
    }

    #[test]
    fn live_write_without_existing_target_makes_no_backup() {
        let home = TempDir::new().unwrap();
        let backups = home.path().join("backups");

        let outcome =
            write_home_file(home.path(), &backups, ".zshrc", b"fresh", false).unwrap();

        match outcome {
            WriteOutcome::Written { backup, .. } => assert!(backup.is_none()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!backups.exists());
        let written = std::fs::read_to_string(home.path().join(".zshrc")).unwrap();
        assert_eq!(written, "fresh");
    }

    #[test]
    fn live_write_backs_up_existing_target() {
        let home = TempDir::new().unwrap();
        let backups = home.path().join("backups");
        std::fs::write(home.path().join(".zshrc"), "old contents").unwrap();

        let outcome =
            write_home_file(home.path(), &backups, ".zshrc", b"new contents", false).unwrap();

        let backup = match outcome {
            WriteOutcome::Written { backup, .. } => backup.expect("backup expected"),
            other => panic!("unexpected outcome: {other:?}"),
        };
        let backup_name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(backup_name.starts_with("bak_"), "got: {backup_name}");
        assert!(backup_name.ends_with("_.zshrc"), "got: {backup_name}");

        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old contents");
        let target = std::fs::read_to_string(home.path().join(".zshrc")).unwrap();
        assert_eq!(target, "new contents");
    }

    #[test]
    fn delete_on_empty_dir_reports_nothing_twice() {
        let dir = TempDir::new().unwrap();
        let report = delete_backups(dir.path(), false).unwrap();
        assert!(report.is_empty());
        // and again — still no crash, still empty
        let report = delete_backups(dir.path(), false).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn delete_on_missing_dir_reports_nothing() {
        let report = delete_backups(Path::new("/nonexistent/rigup"), false).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn delete_removes_only_backup_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bak_20240101_000000_.zshrc"), "a").unwrap();
        std::fs::write(dir.path().join("bak_20240102_000000_.gitconfig"), "b").unwrap();
        std::fs::write(dir.path().join("config.json"), "{}").unwrap();

        let report = delete_backups(dir.path(), false).unwrap();
        assert_eq!(report.deleted.len(), 2);
        assert!(report.failed.is_empty());
        assert!(!dir.path().join("bak_20240101_000000_.zshrc").exists());
        assert!(dir.path().join("config.json").exists());
    }

    #[test]
    fn delete_dry_run_keeps_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bak_20240101_000000_.zshrc"), "a").unwrap();

        let report = delete_backups(dir.path(), true).unwrap();
        assert_eq!(report.deleted, vec!["bak_20240101_000000_.zshrc".to_string()]);
        assert!(dir.path().join("bak_20240101_000000_.zshrc").exists());
    }
}
