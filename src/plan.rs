//! The provision plan (decision set)
//!
//! Built by the interactive collector, frozen at confirmation, then either
//! handed to the apply phase in-process or serialized as a versioned JSON
//! payload in a single environment variable across the sudo re-exec.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::BootstrapError;

/// Env var carrying the serialized plan across the elevation boundary.
pub const PLAN_ENV: &str = "VM_BOOTSTRAP_PLAN";

/// Env var alias of the hidden `--apply` flag. The sudo re-exec passes the
/// flag on the command line; the alias exists for the env-var interface.
pub const APPLY_ENV: &str = "VM_BOOTSTRAP_APPLY";

/// Bumped whenever the payload shape changes; both sides of the re-exec are
/// the same binary, so a mismatch means someone hand-crafted the env var.
pub const PAYLOAD_VERSION: u32 = 1;

/// Static IP request collected from the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticIp {
    /// Interface the address is bound to, e.g. `ens33`.
    pub interface: String,
    /// Address in CIDR form, e.g. `10.0.5.20/24`.
    pub cidr: String,
    /// Default-route gateway.
    pub gateway: String,
    /// Nameservers; empty means "keep whatever the template had".
    #[serde(default)]
    pub dns: Vec<String>,
}

impl StaticIp {
    /// Address portion of the CIDR, for the marker and report.
    pub fn address(&self) -> &str {
        self.cidr.split('/').next().unwrap_or(&self.cidr)
    }
}

/// Everything the apply phase needs. All fields are validated before the
/// plan is frozen; apply never re-prompts or re-derives them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionPlan {
    pub payload_version: u32,

    /// New hostname; `None` means leave unchanged.
    pub hostname: Option<String>,
    /// Static IP request; `None` means keep DHCP/template networking.
    pub static_ip: Option<StaticIp>,
    pub clean_cloud_init: bool,
    /// Destructive credential removal; only ever true after the collector's
    /// double confirmation.
    pub remove_credentials: bool,
    pub expand_disk: bool,
    pub sysprep: bool,

    pub dry_run: bool,
    pub assume_yes: bool,
    pub force_rerun: bool,

    /// Filesystem-safe run stamp, e.g. `20260830-141502`. Shared by the log
    /// file, report and netplan backup so one run's artifacts correlate.
    pub stamp: String,
    /// ISO-8601 start time, recorded in the marker.
    pub started_at: String,
    /// Log file both phases append to.
    pub log_file: PathBuf,
}

impl ProvisionPlan {
    /// Serialize for the elevation hand-off.
    pub fn to_env_payload(&self) -> Result<String, BootstrapError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize the plan in the elevated process.
    pub fn from_env() -> Result<Self, BootstrapError> {
        let payload = std::env::var(PLAN_ENV).map_err(|_| {
            BootstrapError::InvalidInput(format!("{PLAN_ENV} is not set or not unicode"))
        })?;
        Self::from_payload(&payload)
    }

    pub fn from_payload(payload: &str) -> Result<Self, BootstrapError> {
        let plan: Self = serde_json::from_str(payload)?;
        if plan.payload_version != PAYLOAD_VERSION {
            return Err(BootstrapError::InvalidInput(format!(
                "unsupported plan payload version {} (expected {})",
                plan.payload_version, PAYLOAD_VERSION
            )));
        }
        Ok(plan)
    }

    /// True when any mutation at all was requested. A plan with nothing set
    /// still runs the unconditional steps, so this only drives messaging.
    pub fn has_conditional_work(&self) -> bool {
        self.hostname.is_some()
            || self.static_ip.is_some()
            || self.clean_cloud_init
            || self.remove_credentials
            || self.expand_disk
            || self.sysprep
    }
}

/// Split a validated comma-separated DNS string into trimmed tokens.
pub fn split_dns_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value
        .split(',')
        .map(|token| token.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> ProvisionPlan {
        ProvisionPlan {
            payload_version: PAYLOAD_VERSION,
            hostname: Some("web-01".to_string()),
            static_ip: Some(StaticIp {
                interface: "ens33".to_string(),
                cidr: "10.0.5.20/24".to_string(),
                gateway: "10.0.5.1".to_string(),
                dns: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
            }),
            clean_cloud_init: true,
            remove_credentials: false,
            expand_disk: true,
            sysprep: false,
            dry_run: false,
            assume_yes: false,
            force_rerun: false,
            stamp: "20260830-141502".to_string(),
            started_at: "2026-08-30T14:15:02+00:00".to_string(),
            log_file: PathBuf::from("/var/log/vm-bootstrap/bootstrap-20260830-141502.log"),
        }
    }

    #[test]
    fn test_payload_roundtrip() {
        let plan = sample_plan();
        let payload = plan.to_env_payload().unwrap();
        let parsed = ProvisionPlan::from_payload(&payload).unwrap();
        assert_eq!(parsed, plan);
    }

    #[test]
    fn test_payload_version_mismatch_rejected() {
        let mut plan = sample_plan();
        plan.payload_version = 99;
        let payload = plan.to_env_payload().unwrap();
        assert!(ProvisionPlan::from_payload(&payload).is_err());
    }

    #[test]
    fn test_static_ip_address() {
        let ip = StaticIp {
            interface: "eth0".to_string(),
            cidr: "192.168.1.10/24".to_string(),
            gateway: "192.168.1.1".to_string(),
            dns: vec![],
        };
        assert_eq!(ip.address(), "192.168.1.10");
    }

    #[test]
    fn test_split_dns_list() {
        assert!(split_dns_list("").is_empty());
        assert_eq!(split_dns_list("8.8.8.8"), vec!["8.8.8.8"]);
        assert_eq!(
            split_dns_list("8.8.8.8, 1.1.1.1"),
            vec!["8.8.8.8", "1.1.1.1"]
        );
    }
}
