//! SSH host key regeneration step
//!
//! Cloned templates share host keys; every clone must get fresh ones.

use std::path::Path;

use tracing::{info, warn};

use crate::apply::remove_file_if_exists;
use crate::exec::{Runner, command_exists};

const SSH_DIR: &str = "/etc/ssh";

/// Step 2 of the apply catalog: delete host keys, regenerate, restart sshd.
pub async fn regenerate_host_keys(runner: &Runner) {
    info!("Regenerating SSH host keys");
    delete_host_keys(runner, Path::new(SSH_DIR)).await;

    // Debian regenerates keys through package reconfiguration; elsewhere
    // ssh-keygen -A fills in any missing key types.
    if command_exists("dpkg-reconfigure").await {
        runner.run_soft("dpkg-reconfigure", &["openssh-server"]).await;
    } else {
        runner.run_soft("ssh-keygen", &["-A"]).await;
    }

    // Service name differs across distros.
    if !runner.run_soft("systemctl", &["restart", "ssh"]).await {
        runner.run_soft("systemctl", &["restart", "sshd"]).await;
    }
}

async fn delete_host_keys(runner: &Runner, ssh_dir: &Path) {
    let mut entries = match tokio::fs::read_dir(ssh_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not read {}: {}", ssh_dir.display(), e);
            return;
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("ssh_host_") {
            remove_file_if_exists(runner, &entry.path()).await;
        }
    }
}

/// Count host keys for the final report (public halves only).
pub async fn host_key_count() -> usize {
    let mut count = 0;
    if let Ok(mut entries) = tokio::fs::read_dir(SSH_DIR).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("ssh_host_") && name.ends_with(".pub") {
                count += 1;
            }
        }
    }
    count
}
