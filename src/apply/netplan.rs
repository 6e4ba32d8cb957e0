//! Static IP configuration
//!
//! Back up, generate, validate, then commit or roll back. This is the one
//! apply step where failure is fatal: a netplan file that fails validation
//! is rolled back from the backup and the whole run aborts, because a
//! broken network config left in place could make the next boot
//! unreachable. On success the file is left for apply-on-next-boot rather
//! than applied live, so the current remote session is never severed.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::BootstrapError;
use crate::exec::Runner;
use crate::plan::StaticIp;
use crate::state::BootstrapPaths;

/// Seam for the netplan syntax/semantic check, so tests can fake the
/// outcome without a netplan binary.
#[async_trait]
pub trait NetplanValidator: Send + Sync {
    /// Run a generate-only check without applying. Err carries the
    /// compiler's complaint.
    async fn validate(&self) -> Result<(), String>;
}

/// Real validator: `netplan generate` compiles the config without applying.
pub struct SystemValidator;

#[async_trait]
impl NetplanValidator for SystemValidator {
    async fn validate(&self) -> Result<(), String> {
        let output = tokio::process::Command::new("netplan")
            .arg("generate")
            .output()
            .await
            .map_err(|e| format!("netplan: {e}"))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

#[derive(Serialize)]
struct NetplanDoc {
    network: Network,
}

#[derive(Serialize)]
struct Network {
    version: u8,
    ethernets: BTreeMap<String, Ethernet>,
}

#[derive(Serialize)]
struct Ethernet {
    dhcp4: bool,
    addresses: Vec<String>,
    routes: Vec<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nameservers: Option<Nameservers>,
}

#[derive(Serialize)]
struct Route {
    to: String,
    via: String,
}

#[derive(Serialize)]
struct Nameservers {
    addresses: Vec<String>,
}

/// Render the netplan YAML for a static IP request. The nameservers block
/// is only emitted when a DNS override was supplied.
pub fn render_netplan(ip: &StaticIp) -> Result<String, BootstrapError> {
    let mut ethernets = BTreeMap::new();
    ethernets.insert(
        ip.interface.clone(),
        Ethernet {
            dhcp4: false,
            addresses: vec![ip.cidr.clone()],
            routes: vec![Route {
                to: "default".to_string(),
                via: ip.gateway.clone(),
            }],
            nameservers: if ip.dns.is_empty() {
                None
            } else {
                Some(Nameservers {
                    addresses: ip.dns.clone(),
                })
            },
        },
    );

    let doc = NetplanDoc {
        network: Network {
            version: 2,
            ethernets,
        },
    };
    Ok(serde_yaml::to_string(&doc)?)
}

/// Step 8 (conditional, fatal on failure): back up, generate, validate,
/// commit or roll back.
pub async fn configure_static_ip(
    runner: &Runner,
    paths: &BootstrapPaths,
    stamp: &str,
    ip: &StaticIp,
    validator: &dyn NetplanValidator,
) -> Result<(), BootstrapError> {
    let content = render_netplan(ip)?;
    let target = paths.netplan_file();

    if runner.dry_run() {
        info!("[dry-run] write {} with:\n{}", target.display(), content);
        info!("[dry-run] netplan generate");
        return Ok(());
    }

    let backup_dir = paths.netplan_backup_dir(stamp);
    info!("Backing up {} to {}", paths.netplan.display(), backup_dir.display());
    copy_dir_files(&paths.netplan, &backup_dir).await?;

    info!("Writing static IP config to {}", target.display());
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, &content).await?;

    match validator.validate().await {
        Ok(()) => {
            info!(
                "Netplan validated; {} takes effect on next boot (not applied live)",
                target.display()
            );
            Ok(())
        }
        Err(reason) => {
            warn!("Netplan validation failed: {}", reason);
            rollback(paths, &backup_dir).await;
            Err(BootstrapError::NetplanValidation(reason))
        }
    }
}

/// Restore every backed-up file over the config directory and delete the
/// file we generated.
async fn rollback(paths: &BootstrapPaths, backup_dir: &Path) {
    let target = paths.netplan_file();
    if let Err(e) = tokio::fs::remove_file(&target).await {
        warn!("Could not remove {}: {}", target.display(), e);
    }
    if let Err(e) = copy_dir_files(backup_dir, &paths.netplan).await {
        warn!(
            "Rollback restore from {} failed: {}",
            backup_dir.display(),
            e
        );
    } else {
        info!("Restored previous netplan config from {}", backup_dir.display());
    }
}

/// Copy the regular files of `from` into `to` (netplan directories are flat).
async fn copy_dir_files(from: &Path, to: &Path) -> Result<(), BootstrapError> {
    tokio::fs::create_dir_all(to).await?;
    let mut entries = match tokio::fs::read_dir(from).await {
        Ok(entries) => entries,
        // A missing netplan dir backs up as empty.
        Err(_) => return Ok(()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() {
            let dest = to.join(entry.file_name());
            tokio::fs::copy(&path, &dest).await?;
        }
    }
    Ok(())
}
