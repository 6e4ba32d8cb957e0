//! Sysprep cleanup step
//!
//! Strips per-host residue (histories, login records, temp files, caches,
//! logs, random seed) so each clone starts generic. Temp-file deletion has
//! a self-protection check: when the running binary itself lives under a
//! temp directory that sub-step is skipped so we do not delete ourselves.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::apply::{remove_dir_contents, remove_file_if_exists, truncate_file};
use crate::exec::Runner;
use crate::state::is_under_temp_dir;

/// Step 10 (conditional): run every cleanup action in order.
pub async fn run(runner: &Runner) {
    info!("Running sysprep cleanup");
    clean_shell_history(runner).await;
    truncate_login_records(runner).await;
    clean_temp_dirs(runner).await;
    clean_package_caches(runner).await;
    rotate_logs(runner, Path::new("/var/log")).await;
    runner.run_soft("faillock", &["--reset"]).await;
    // A shared random seed would make clones converge on the same entropy;
    // deleting it forces a fresh one on next boot.
    remove_file_if_exists(runner, Path::new("/var/lib/systemd/random-seed")).await;
}

async fn clean_shell_history(runner: &Runner) {
    let mut histories: Vec<PathBuf> = vec![PathBuf::from("/root/.bash_history")];
    if let Ok(mut entries) = tokio::fs::read_dir("/home").await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            histories.push(entry.path().join(".bash_history"));
        }
    }
    for path in histories {
        remove_file_if_exists(runner, &path).await;
    }
}

/// Truncated rather than deleted so running log writers keep their handles.
async fn truncate_login_records(runner: &Runner) {
    for record in ["/var/log/wtmp", "/var/log/btmp", "/var/log/lastlog"] {
        truncate_file(runner, Path::new(record)).await;
    }
}

async fn clean_temp_dirs(runner: &Runner) {
    match current_exe_canonical() {
        Some(exe) if is_under_temp_dir(&exe) => {
            warn!(
                "Running from {}; skipping temp cleanup. Move the binary to a \
                 permanent location and re-run sysprep if needed",
                exe.display()
            );
            return;
        }
        None => {
            warn!("Could not resolve our own path; skipping temp cleanup");
            return;
        }
        Some(_) => {}
    }
    for dir in ["/tmp", "/var/tmp"] {
        remove_dir_contents(runner, Path::new(dir)).await;
    }
}

fn current_exe_canonical() -> Option<PathBuf> {
    std::env::current_exe()
        .and_then(std::fs::canonicalize)
        .ok()
}

async fn clean_package_caches(runner: &Runner) {
    runner.run_soft("apt-get", &["clean"]).await;
    remove_dir_contents(runner, Path::new("/var/lib/apt/lists")).await;
}

/// What to do with an entry under /var/log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    /// Active log: truncate in place.
    Truncate,
    /// Compressed or numbered rotation: delete.
    Delete,
    /// Anything else stays.
    Keep,
}

/// Classify a /var/log entry by name.
pub fn classify_log_entry(name: &str) -> LogAction {
    if name.ends_with(".gz") || name.ends_with(".xz") || name.ends_with(".old") {
        return LogAction::Delete;
    }
    // Numbered rotations: syslog.1, kern.log.2 ...
    if let Some((_, suffix)) = name.rsplit_once('.') {
        if suffix.parse::<u32>().is_ok() {
            return LogAction::Delete;
        }
    }
    if name.ends_with(".log") {
        return LogAction::Truncate;
    }
    LogAction::Keep
}

async fn rotate_logs(runner: &Runner, log_dir: &Path) {
    let mut entries = match tokio::fs::read_dir(log_dir).await {
        Ok(entries) => entries,
        Err(_) => return,
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        match classify_log_entry(&name) {
            LogAction::Truncate => truncate_file(runner, &path).await,
            LogAction::Delete => remove_file_if_exists(runner, &path).await,
            LogAction::Keep => {}
        }
    }
}
