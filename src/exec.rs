//! External command execution
//!
//! All mutating commands go through [`Runner`] so a single dry-run flag can
//! turn every one of them into a printed preview. Read-only captures used by
//! detection bypass the runner and execute even in dry-run, which keeps the
//! preview output realistic.

use crate::BootstrapError;
use tracing::{debug, info, warn};

/// Dry-run aware runner for mutating commands.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    dry_run: bool,
}

impl Runner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a mutating command and fail on non-zero exit.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<(), BootstrapError> {
        if self.dry_run {
            info!("[dry-run] {} {}", program, args.join(" "));
            return Ok(());
        }

        debug!("exec: {} {}", program, args.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .await
            .map_err(|e| BootstrapError::Command(format!("{program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BootstrapError::Command(format!(
                "{} {} exited with {}: {}",
                program,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Best-effort variant: log a warning on failure and keep going.
    /// Returns whether the command succeeded.
    pub async fn run_soft(&self, program: &str, args: &[&str]) -> bool {
        match self.run(program, args).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Like [`run_soft`](Self::run_soft) but treats the listed exit codes as
    /// a legitimate no-op (growpart exits 1 when the partition is already at
    /// maximum size).
    pub async fn run_soft_allow(&self, program: &str, args: &[&str], ok_codes: &[i32]) -> bool {
        if self.dry_run {
            info!("[dry-run] {} {}", program, args.join(" "));
            return true;
        }

        debug!("exec: {} {}", program, args.join(" "));
        let output = match tokio::process::Command::new(program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("{program}: {e}");
                return false;
            }
        };

        if output.status.success() {
            return true;
        }
        if output.status.code().is_some_and(|c| ok_codes.contains(&c)) {
            debug!("{} {}: no change", program, args.join(" "));
            return true;
        }
        warn!(
            "{} {} exited with {}: {}",
            program,
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        false
    }
}

/// Capture stdout of a read-only command. Missing tools and non-zero exits
/// both yield `None`; detection callers fall back instead of failing.
pub async fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() { None } else { Some(stdout) }
}

/// Check if a command exists on PATH.
pub async fn command_exists(cmd: &str) -> bool {
    tokio::process::Command::new("which")
        .arg(cmd)
        .output()
        .await
        .is_ok_and(|o| o.status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_skips_execution() {
        let runner = Runner::new(true);
        // A command that would fail for real succeeds as a preview.
        assert!(runner.run("false", &[]).await.is_ok());
        assert!(runner.run_soft("definitely-not-a-command", &[]).await);
    }

    #[tokio::test]
    async fn test_run_reports_failure() {
        let runner = Runner::new(false);
        assert!(runner.run("false", &[]).await.is_err());
        assert!(!runner.run_soft("false", &[]).await);
    }

    #[tokio::test]
    async fn test_capture() {
        assert_eq!(capture("echo", &["hello"]).await.as_deref(), Some("hello"));
        assert!(capture("false", &[]).await.is_none());
        assert!(capture("definitely-not-a-command", &[]).await.is_none());
    }
}
