//! Virtualization platform detection
//!
//! Prefers systemd-detect-virt; falls back to DMI vendor/product strings
//! matched against a fixed table. Inconclusive results mean "physical".

use crate::exec::capture;
use tracing::debug;

/// Known hypervisor/cloud signatures, matched case-insensitively as
/// substrings of the DMI vendor and product strings.
const VENDOR_TABLE: &[(&str, &str)] = &[
    ("vmware", "vmware"),
    ("virtualbox", "virtualbox"),
    ("innotek", "virtualbox"),
    ("kvm", "kvm"),
    ("qemu", "kvm"),
    ("microsoft", "hyperv"),
    ("xen", "xen"),
    ("amazon", "aws"),
    ("google", "gce"),
    ("openstack", "openstack"),
    ("parallels", "parallels"),
    ("nutanix", "nutanix"),
];

/// Match DMI identification text against the vendor table.
pub fn match_vendor(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    VENDOR_TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, platform)| *platform)
}

/// Detect the virtualization platform, defaulting to "physical".
pub async fn platform() -> String {
    // systemd-detect-virt exits non-zero on bare metal, which capture()
    // already maps to None.
    if let Some(virt) = capture("systemd-detect-virt", &[]).await {
        if virt != "none" {
            debug!("systemd-detect-virt reported: {}", virt);
            return virt;
        }
        return "physical".to_string();
    }

    for dmi in ["/sys/class/dmi/id/sys_vendor", "/sys/class/dmi/id/product_name"] {
        if let Ok(content) = tokio::fs::read_to_string(dmi).await {
            if let Some(platform) = match_vendor(&content) {
                debug!("DMI {} matched platform: {}", dmi, platform);
                return platform.to_string();
            }
        }
    }

    "physical".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_vendor_case_insensitive() {
        assert_eq!(match_vendor("VMware, Inc."), Some("vmware"));
        assert_eq!(match_vendor("innotek GmbH"), Some("virtualbox"));
        assert_eq!(match_vendor("QEMU Standard PC"), Some("kvm"));
        assert_eq!(match_vendor("Microsoft Corporation"), Some("hyperv"));
        assert_eq!(match_vendor("Amazon EC2"), Some("aws"));
        assert_eq!(match_vendor("Google Compute Engine"), Some("gce"));
    }

    #[test]
    fn test_match_vendor_unknown() {
        assert_eq!(match_vendor("Dell Inc."), None);
        assert_eq!(match_vendor(""), None);
    }
}
