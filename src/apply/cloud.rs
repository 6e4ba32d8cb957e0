//! Cloud-init reset and cloud credential removal

use std::path::Path;

use tracing::{info, warn};

use crate::apply::{remove_dir_if_exists, remove_file_if_exists};
use crate::exec::{Runner, command_exists};

/// Step 5 (conditional): wipe cloud-init state so it treats the next boot
/// as a first boot.
pub async fn reset_cloud_init(runner: &Runner) {
    if !command_exists("cloud-init").await {
        warn!("cloud-init cleanup requested but the tool is not installed");
        return;
    }
    info!("Resetting cloud-init state");
    runner.run_soft("cloud-init", &["clean", "--logs"]).await;
}

/// Credential locations left behind by provisioning pipelines.
const CREDENTIAL_DIRS: &[&str] = &[
    "/root/.aws",
    "/root/.azure",
    "/root/.config/gcloud",
];

const CREDENTIAL_FILES: &[&str] = &["/root/.ssh/authorized_keys"];

/// Step 6 (conditional, double-confirmed): delete provider credentials.
/// Irreversible; the collector guarantees this was explicitly requested.
pub async fn remove_credentials(runner: &Runner) {
    info!("Removing cloud provider credentials");
    for dir in CREDENTIAL_DIRS {
        remove_dir_if_exists(runner, Path::new(dir)).await;
    }
    for file in CREDENTIAL_FILES {
        remove_file_if_exists(runner, Path::new(file)).await;
    }
}
