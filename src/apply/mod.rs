//! Apply executor
//!
//! Runs the mutation catalog in a fixed order with elevated privilege. Every
//! step is best-effort (warn and continue) except static IP configuration,
//! which rolls back and aborts on a bad netplan, and the marker write, which
//! is the record of success. The sequence ends in a reboot unless dry-run.

pub mod cloud;
pub mod disk;
pub mod hostname;
pub mod identity;
pub mod netplan;
pub mod packages;
pub mod report;
pub mod ssh;
pub mod sysprep;

use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tracing::{info, warn};

use crate::BootstrapError;
use crate::exec::Runner;
use crate::plan::ProvisionPlan;
use crate::state::BootstrapPaths;

/// Seconds between the final report and the reboot.
const REBOOT_GRACE_SECS: u64 = 10;

/// Run the apply catalog against a frozen, already-validated plan.
pub async fn run(plan: &ProvisionPlan, paths: &BootstrapPaths) -> Result<(), BootstrapError> {
    let runner = Runner::new(plan.dry_run);
    if plan.dry_run {
        info!("Dry run: mutating commands will be printed, not executed");
    }
    info!("Starting apply phase (run {})", plan.stamp);

    packages::refresh_system(&runner).await;
    ssh::regenerate_host_keys(&runner).await;
    identity::reset_machine_id(&runner, paths).await;
    identity::vacuum_journal(&runner).await;

    if plan.clean_cloud_init {
        cloud::reset_cloud_init(&runner).await;
    }
    if plan.remove_credentials {
        cloud::remove_credentials(&runner).await;
    }
    if let Some(new_hostname) = &plan.hostname {
        hostname::apply(&runner, paths, new_hostname).await;
    }
    if let Some(ip) = &plan.static_ip {
        // The one fatal step: a broken netplan left in place could make the
        // next boot unreachable.
        let validator = netplan::SystemValidator;
        netplan::configure_static_ip(&runner, paths, &plan.stamp, ip, &validator).await?;
    }
    if plan.expand_disk {
        disk::expand_root(&runner).await;
    }
    if plan.sysprep {
        sysprep::run(&runner).await;
    }

    report::finish(plan, paths).await?;

    reboot(&runner).await;
    Ok(())
}

async fn reboot(runner: &Runner) {
    if runner.dry_run() {
        info!("[dry-run] systemctl reboot");
        return;
    }
    info!("Rebooting in {} seconds", REBOOT_GRACE_SECS);
    tokio::time::sleep(Duration::from_secs(REBOOT_GRACE_SECS)).await;
    runner.run_soft("systemctl", &["reboot"]).await;
}

// Shared dry-run aware filesystem helpers. Missing paths are silent no-ops;
// real failures only warn, matching the best-effort step policy.

pub(crate) async fn remove_file_if_exists(runner: &Runner, path: &Path) {
    if !path.exists() {
        return;
    }
    if runner.dry_run() {
        info!("[dry-run] rm {}", path.display());
        return;
    }
    if let Err(e) = fs::remove_file(path).await {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}

pub(crate) async fn remove_dir_if_exists(runner: &Runner, path: &Path) {
    if !path.exists() {
        return;
    }
    if runner.dry_run() {
        info!("[dry-run] rm -r {}", path.display());
        return;
    }
    if let Err(e) = fs::remove_dir_all(path).await {
        warn!("Could not remove {}: {}", path.display(), e);
    }
}

/// Delete everything inside `dir` while keeping the directory itself.
pub(crate) async fn remove_dir_contents(runner: &Runner, dir: &Path) {
    if runner.dry_run() {
        info!("[dry-run] rm -r {}/*", dir.display());
        return;
    }
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return,
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        if let Err(e) = result {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Truncate a file in place, preserving its identity for running writers.
pub(crate) async fn truncate_file(runner: &Runner, path: &Path) {
    if !path.exists() {
        return;
    }
    if runner.dry_run() {
        info!("[dry-run] truncate {}", path.display());
        return;
    }
    if let Err(e) = fs::write(path, b"").await {
        warn!("Could not truncate {}: {}", path.display(), e);
    }
}
