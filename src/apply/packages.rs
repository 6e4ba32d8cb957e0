//! Package maintenance step
//!
//! Update, upgrade and clean up via the detected package manager
//! (apt, dnf, yum, zypper, apk). Entirely best-effort: a package manager
//! hiccup must not stop the rest of the bootstrap.

use crate::exec::{Runner, command_exists};
use tracing::{info, warn};

/// Detected package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Zypper,
    Apk,
}

impl PackageManager {
    /// Detect the system's package manager
    pub async fn detect() -> Option<Self> {
        // Check in order of preference
        if command_exists("apt-get").await {
            return Some(Self::Apt);
        }
        if command_exists("dnf").await {
            return Some(Self::Dnf);
        }
        if command_exists("yum").await {
            return Some(Self::Yum);
        }
        if command_exists("zypper").await {
            return Some(Self::Zypper);
        }
        if command_exists("apk").await {
            return Some(Self::Apk);
        }
        None
    }

    /// The refresh command plus the exit codes that mean "updates are
    /// available" rather than failure (dnf/yum exit 100 in that case).
    fn update_command(&self) -> (&'static str, Vec<&'static str>, &'static [i32]) {
        match self {
            Self::Apt => ("apt-get", vec!["update"], &[]),
            Self::Dnf => ("dnf", vec!["check-update"], &[100]),
            Self::Yum => ("yum", vec!["check-update"], &[100]),
            Self::Zypper => ("zypper", vec!["--non-interactive", "refresh"], &[]),
            Self::Apk => ("apk", vec!["update"], &[]),
        }
    }

    fn upgrade_command(&self) -> (&'static str, Vec<&'static str>) {
        match self {
            Self::Apt => ("apt-get", vec!["upgrade", "-y"]),
            Self::Dnf => ("dnf", vec!["upgrade", "-y"]),
            Self::Yum => ("yum", vec!["update", "-y"]),
            Self::Zypper => ("zypper", vec!["--non-interactive", "update"]),
            Self::Apk => ("apk", vec!["upgrade"]),
        }
    }

    fn cleanup_command(&self) -> (&'static str, Vec<&'static str>) {
        match self {
            Self::Apt => ("apt-get", vec!["autoremove", "-y"]),
            Self::Dnf => ("dnf", vec!["autoremove", "-y"]),
            Self::Yum => ("yum", vec!["autoremove", "-y"]),
            Self::Zypper => ("zypper", vec!["--non-interactive", "clean"]),
            Self::Apk => ("apk", vec!["cache", "clean"]),
        }
    }
}

/// Step 1 of the apply catalog: update, upgrade, clean up.
pub async fn refresh_system(runner: &Runner) {
    let Some(pm) = PackageManager::detect().await else {
        warn!("No supported package manager found; skipping system update");
        return;
    };

    info!("Updating system packages using {:?}", pm);
    let (cmd, args, ok_codes) = pm.update_command();
    runner.run_soft_allow(cmd, &args, ok_codes).await;

    let (cmd, args) = pm.upgrade_command();
    runner.run_soft(cmd, &args).await;

    let (cmd, args) = pm.cleanup_command();
    runner.run_soft(cmd, &args).await;
}
