//! Hostname change step
//!
//! Sets the live hostname via hostnamectl and keeps the loopback alias in
//! /etc/hosts in sync without duplicating it across re-runs.

use tracing::{info, warn};

use crate::exec::Runner;
use crate::state::BootstrapPaths;

/// Loopback alias address conventionally used for the local hostname.
const LOOPBACK_ALIAS: &str = "127.0.1.1";

/// Step 7 (conditional): set the hostname and update /etc/hosts.
pub async fn apply(runner: &Runner, paths: &BootstrapPaths, hostname: &str) {
    info!("Setting hostname to '{}'", hostname);
    runner.run_soft("hostnamectl", &["set-hostname", hostname]).await;

    let hosts_path = paths.hosts();
    if runner.dry_run() {
        info!(
            "[dry-run] update {} with '{} {}'",
            hosts_path.display(),
            LOOPBACK_ALIAS,
            hostname
        );
        return;
    }

    let content = match tokio::fs::read_to_string(&hosts_path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Could not read {}: {}", hosts_path.display(), e);
            return;
        }
    };
    let updated = rewrite_hosts(&content, hostname);
    if updated != content {
        if let Err(e) = tokio::fs::write(&hosts_path, updated).await {
            warn!("Could not update {}: {}", hosts_path.display(), e);
        }
    }
}

/// Replace the existing 127.0.1.1 alias line or append one. Idempotent:
/// running twice with the same hostname changes nothing.
pub fn rewrite_hosts(content: &str, hostname: &str) -> String {
    let alias_line = format!("{LOOPBACK_ALIAS}\t{hostname}");
    let mut lines: Vec<String> = Vec::new();
    let mut replaced = false;

    for line in content.lines() {
        // Match the address token exactly; 127.0.1.10 is a different host.
        if line.split_whitespace().next() == Some(LOOPBACK_ALIAS) && !replaced {
            lines.push(alias_line.clone());
            replaced = true;
        } else {
            lines.push(line.to_string());
        }
    }
    if !replaced {
        lines.push(alias_line);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_hosts_replaces_existing_alias() {
        let content = "127.0.0.1\tlocalhost\n127.0.1.1\told-name\n";
        let updated = rewrite_hosts(content, "web-01");
        assert!(updated.contains("127.0.1.1\tweb-01"));
        assert!(!updated.contains("old-name"));
        assert!(updated.contains("127.0.0.1\tlocalhost"));
    }

    #[test]
    fn test_rewrite_hosts_appends_when_missing() {
        let content = "127.0.0.1\tlocalhost\n";
        let updated = rewrite_hosts(content, "web-01");
        assert!(updated.ends_with("127.0.1.1\tweb-01\n"));
    }

    #[test]
    fn test_rewrite_hosts_leaves_longer_addresses_alone() {
        let content = "127.0.0.1\tlocalhost\n127.0.1.10\tother-box\n";
        let updated = rewrite_hosts(content, "web-01");
        assert!(updated.contains("127.0.1.10\tother-box"));
        assert!(updated.ends_with("127.0.1.1\tweb-01\n"));
    }

    #[test]
    fn test_rewrite_hosts_is_idempotent() {
        let once = rewrite_hosts("127.0.0.1\tlocalhost\n", "web-01");
        let twice = rewrite_hosts(&once, "web-01");
        assert_eq!(once, twice);
        assert_eq!(twice.matches("web-01").count(), 1);
    }
}
