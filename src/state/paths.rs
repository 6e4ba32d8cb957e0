//! Standard vm-bootstrap paths
//!
//! Defines where the marker, logs, reports and netplan artifacts live.

use std::path::{Path, PathBuf};

/// Base directory for bootstrap state
pub const STATE_DIR: &str = "/var/lib/vm-bootstrap";

/// Log directory
pub const LOG_DIR: &str = "/var/log/vm-bootstrap";

/// Netplan configuration directory
pub const NETPLAN_DIR: &str = "/etc/netplan";

/// File name of the generated netplan config. The 99- prefix sorts it after
/// the distro/template defaults so it wins.
pub const NETPLAN_FILE: &str = "99-vm-bootstrap.yaml";

/// Standard vm-bootstrap paths
#[derive(Debug, Clone)]
pub struct BootstrapPaths {
    /// State directory (default: /var/lib/vm-bootstrap)
    pub state: PathBuf,
    /// Log directory (default: /var/log/vm-bootstrap)
    pub logs: PathBuf,
    /// Netplan directory (default: /etc/netplan)
    pub netplan: PathBuf,
    /// System /etc (hosts file, machine-id)
    pub etc: PathBuf,
}

impl Default for BootstrapPaths {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapPaths {
    /// Create with default system paths
    pub fn new() -> Self {
        Self {
            state: PathBuf::from(STATE_DIR),
            logs: PathBuf::from(LOG_DIR),
            netplan: PathBuf::from(NETPLAN_DIR),
            etc: PathBuf::from("/etc"),
        }
    }

    /// Re-root every directory under `root` (useful for testing)
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            state: root.join("var/lib/vm-bootstrap"),
            logs: root.join("var/log/vm-bootstrap"),
            netplan: root.join("etc/netplan"),
            etc: root.join("etc"),
        }
    }

    /// The singleton completion marker
    pub fn marker(&self) -> PathBuf {
        self.state.join("bootstrap-done")
    }

    /// Per-run log file
    pub fn log_file(&self, stamp: &str) -> PathBuf {
        self.logs.join(format!("bootstrap-{stamp}.log"))
    }

    /// Per-run human-readable report
    pub fn report_file(&self, stamp: &str) -> PathBuf {
        self.state.join(format!("report-{stamp}.txt"))
    }

    /// Per-run netplan backup directory
    pub fn netplan_backup_dir(&self, stamp: &str) -> PathBuf {
        self.state.join(format!("netplan-backup-{stamp}"))
    }

    /// The generated high-priority netplan file
    pub fn netplan_file(&self) -> PathBuf {
        self.netplan.join(NETPLAN_FILE)
    }

    /// /etc/hosts
    pub fn hosts(&self) -> PathBuf {
        self.etc.join("hosts")
    }

    /// /etc/machine-id
    pub fn machine_id(&self) -> PathBuf {
        self.etc.join("machine-id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = BootstrapPaths::new();
        assert_eq!(
            paths.marker(),
            PathBuf::from("/var/lib/vm-bootstrap/bootstrap-done")
        );
        assert_eq!(
            paths.netplan_file(),
            PathBuf::from("/etc/netplan/99-vm-bootstrap.yaml")
        );
        assert_eq!(paths.hosts(), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn test_stamped_paths() {
        let paths = BootstrapPaths::new();
        assert_eq!(
            paths.log_file("20260830-141502"),
            PathBuf::from("/var/log/vm-bootstrap/bootstrap-20260830-141502.log")
        );
        assert_eq!(
            paths.report_file("20260830-141502"),
            PathBuf::from("/var/lib/vm-bootstrap/report-20260830-141502.txt")
        );
        assert_eq!(
            paths.netplan_backup_dir("20260830-141502"),
            PathBuf::from("/var/lib/vm-bootstrap/netplan-backup-20260830-141502")
        );
    }

    #[test]
    fn test_with_root() {
        let paths = BootstrapPaths::with_root("/tmp/fake");
        assert_eq!(
            paths.marker(),
            PathBuf::from("/tmp/fake/var/lib/vm-bootstrap/bootstrap-done")
        );
        assert_eq!(paths.hosts(), PathBuf::from("/tmp/fake/etc/hosts"));
    }
}
