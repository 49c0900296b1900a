//! Shell command execution with a bounded wait, plus sudo credential handling.

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Password;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Upper bound on any single external command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// Run a shell command line via `sh -c`, failing on non-zero exit or timeout.
///
/// stdin is closed so commands that would prompt fail fast instead of
/// hanging. On failure the error carries the last non-empty line of the
/// combined output, truncated for display.
pub fn run_shell(command: &str) -> Result<()> {
    run_shell_with_timeout(command, COMMAND_TIMEOUT)
}

pub(crate) fn run_shell_with_timeout(command: &str, timeout: Duration) -> Result<()> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to spawn `{command}`"))?;

    // Reader threads keep the pipes drained so a chatty command cannot fill
    // its buffers and stall while we poll for exit.
    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");
    let out_reader = std::thread::spawn(move || drain(stdout));
    let err_reader = std::thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait().context("failed to poll child process")? {
            Some(status) => break Some(status),
            None if Instant::now() >= deadline => break None,
            None => std::thread::sleep(Duration::from_millis(100)),
        }
    };

    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        bail!("`{command}` timed out after {}s", timeout.as_secs());
    };

    let mut output = out_reader.join().unwrap_or_default();
    let err_output = err_reader.join().unwrap_or_default();
    if !output.is_empty() && !err_output.is_empty() {
        output.push('\n');
    }
    output.push_str(&err_output);

    if !status.success() {
        bail!("`{command}` failed: {}", output_tail(&output));
    }
    Ok(())
}

fn drain(mut stream: impl Read) -> String {
    let mut buf = String::new();
    let _ = stream.read_to_string(&mut buf);
    buf
}

/// Last non-empty line of the combined output, truncated for display.
fn output_tail(output: &str) -> String {
    let line = output
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("(no output)")
        .trim();
    if line.chars().count() > 100 {
        let mut short: String = line.chars().take(97).collect();
        short.push_str("...");
        short
    } else {
        line.to_string()
    }
}

/// Whether a resolved command line needs elevated privileges.
pub fn needs_sudo(command: &str) -> bool {
    command.trim_start().starts_with("sudo ") || command.contains("| sudo ")
}

/// Cached sudo credential state for one run.
///
/// Authentication is attempted at most once; later callers reuse the result
/// so a failed password prompt is not repeated for every package.
#[derive(Debug, Default)]
pub struct SudoGate {
    state: Option<bool>,
}

impl SudoGate {
    pub fn ensure(&mut self) -> Result<()> {
        match self.state {
            Some(true) => return Ok(()),
            Some(false) => bail!("sudo authentication already failed this run"),
            None => {}
        }
        let ok = acquire();
        self.state = Some(ok);
        if ok {
            Ok(())
        } else {
            bail!("sudo authentication failed after {MAX_PASSWORD_ATTEMPTS} attempts")
        }
    }
}

/// `sudo -n true` succeeds only when credentials are already cached.
fn credentials_cached() -> bool {
    Command::new("sudo")
        .args(["-n", "true"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn acquire() -> bool {
    if credentials_cached() {
        return true;
    }
    println!("{}", style("Root privileges are required.").yellow());
    for attempt in 1..=MAX_PASSWORD_ATTEMPTS {
        let password = match Password::new().with_prompt("Enter sudo password").interact() {
            Ok(p) => p,
            Err(_) => return false,
        };
        if validate_password(&password) {
            return true;
        }
        if attempt < MAX_PASSWORD_ATTEMPTS {
            eprintln!("{}", style("Invalid password, try again.").yellow());
        }
    }
    false
}

/// Validate via `sudo -S -v`, feeding the password to the child's stdin from
/// a writer thread while the main flow waits on completion.
fn validate_password(password: &str) -> bool {
    let mut child = match Command::new("sudo")
        .args(["-S", "-v"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(_) => return false,
    };

    if let Some(mut stdin) = child.stdin.take() {
        let line = format!("{password}\n");
        std::thread::spawn(move || {
            let _ = stdin.write_all(line.as_bytes());
        });
    }

    match child.wait() {
        Ok(status) if status.success() => true,
        // sudo can exit non-zero on a redundant -v even with valid
        // credentials; the cache check settles it
        _ => credentials_cached(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_shell_succeeds_on_zero_exit() {
        run_shell("exit 0").unwrap();
    }

    #[test]
    fn run_shell_fails_on_nonzero_exit() {
        let err = run_shell("exit 3").unwrap_err();
        assert!(err.to_string().contains("failed"), "got: {err}");
    }

    #[test]
    fn run_shell_error_carries_last_output_line() {
        let err = run_shell("echo first; echo second >&2; exit 1").unwrap_err();
        assert!(err.to_string().contains("second"), "got: {err}");
    }

    #[test]
    fn run_shell_times_out() {
        let err = run_shell_with_timeout("sleep 5", Duration::from_millis(200)).unwrap_err();
        assert!(err.to_string().contains("timed out"), "got: {err}");
    }

    #[test]
    fn output_tail_skips_trailing_blank_lines() {
        assert_eq!(output_tail("a\nb\n\n\n"), "b");
        assert_eq!(output_tail(""), "(no output)");
    }

    #[test]
    fn output_tail_truncates_long_lines() {
        let long = "x".repeat(300);
        let tail = output_tail(&long);
        assert_eq!(tail.chars().count(), 100);
        assert!(tail.ends_with("..."));
    }

    #[test]
    fn needs_sudo_detects_prefix_and_pipeline() {
        assert!(needs_sudo("sudo apt install -y jq"));
        assert!(needs_sudo("curl -fsSL https://get.docker.com | sudo sh"));
        assert!(!needs_sudo("brew install jq"));
        assert!(!needs_sudo("echo sudoku"));
    }

    #[test]
    fn poisoned_gate_fails_fast() {
        let mut gate = SudoGate { state: Some(false) };
        assert!(gate.ensure().is_err());
        let mut gate = SudoGate { state: Some(true) };
        assert!(gate.ensure().is_ok());
    }
}
