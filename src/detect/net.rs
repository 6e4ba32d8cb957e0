//! Network fact probes
//!
//! Reads the live routing/address tables and resolver configuration. Results
//! pre-fill collector prompts as defaults; they are never used to validate.

use crate::exec::capture;
use crate::validate::is_valid_ipv4;
use tracing::debug;

/// Snapshot of the current network configuration for the primary interface.
#[derive(Debug, Clone, Default)]
pub struct NetFacts {
    /// Interface carrying the default route, if any.
    pub interface: Option<String>,
    /// Current IPv4 address in CIDR form.
    pub cidr: Option<String>,
    /// Default-route gateway.
    pub gateway: Option<String>,
    /// Currently configured nameservers.
    pub dns: Vec<String>,
}

impl NetFacts {
    /// Probe everything, degrading field by field.
    pub async fn probe() -> Self {
        let mut facts = Self::default();

        if let Some(route) = capture("ip", &["route", "show", "default"]).await {
            if let Some((gateway, interface)) = parse_default_route(&route) {
                facts.gateway = Some(gateway);
                facts.interface = Some(interface);
            }
        }

        if facts.interface.is_none() {
            facts.interface = first_non_loopback_interface().await;
        }

        if let Some(iface) = &facts.interface {
            if let Some(out) = capture("ip", &["-4", "addr", "show", "dev", iface]).await {
                facts.cidr = parse_inet_cidr(&out);
            }
            facts.dns = probe_dns(iface).await;
        }

        debug!(
            "Detected network facts: iface={:?} cidr={:?} gw={:?} dns={:?}",
            facts.interface, facts.cidr, facts.gateway, facts.dns
        );
        facts
    }
}

/// Parse `ip route show default` output: `default via 10.0.5.1 dev ens33 ...`.
/// Returns (gateway, interface).
pub fn parse_default_route(output: &str) -> Option<(String, String)> {
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() != Some(&"default") {
            continue;
        }
        let gateway = tokens
            .windows(2)
            .find(|w| w[0] == "via")
            .map(|w| w[1].to_string())?;
        let interface = tokens
            .windows(2)
            .find(|w| w[0] == "dev")
            .map(|w| w[1].to_string())?;
        return Some((gateway, interface));
    }
    None
}

/// Pull the first non-loopback `inet a.b.c.d/p` out of `ip -4 addr show`.
pub fn parse_inet_cidr(output: &str) -> Option<String> {
    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let Some(cidr) = tokens.windows(2).find(|w| w[0] == "inet").map(|w| w[1]) {
            if !cidr.starts_with("127.") {
                return Some(cidr.to_string());
            }
        }
    }
    None
}

/// Extract nameserver addresses from `resolvectl dns <iface>` or
/// `resolvectl status` style output. Any IPv4-looking token counts.
pub fn parse_resolvectl(output: &str) -> Vec<String> {
    output
        .split_whitespace()
        .filter(|token| is_valid_ipv4(token))
        .map(str::to_string)
        .collect()
}

/// Extract `nameserver` entries from a static resolv.conf.
pub fn parse_resolv_conf(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("nameserver"))
        .map(str::trim)
        .filter(|addr| is_valid_ipv4(addr))
        .map(str::to_string)
        .collect()
}

async fn probe_dns(interface: &str) -> Vec<String> {
    // Prefer the systemd resolver, fall back to the static file.
    if let Some(out) = capture("resolvectl", &["dns", interface]).await {
        let servers = parse_resolvectl(&out);
        if !servers.is_empty() {
            return servers;
        }
    }
    match tokio::fs::read_to_string("/etc/resolv.conf").await {
        Ok(content) => parse_resolv_conf(&content),
        Err(_) => Vec::new(),
    }
}

/// Fallback when no default route exists: first interface under
/// /sys/class/net that is not `lo`.
async fn first_non_loopback_interface() -> Option<String> {
    let mut entries = tokio::fs::read_dir("/sys/class/net").await.ok()?;
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name != "lo" {
            names.push(name);
        }
    }
    names.sort();
    names.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_route() {
        let out = "default via 10.0.5.1 dev ens33 proto dhcp src 10.0.5.20 metric 100";
        assert_eq!(
            parse_default_route(out),
            Some(("10.0.5.1".to_string(), "ens33".to_string()))
        );
    }

    #[test]
    fn test_parse_default_route_ignores_other_routes() {
        let out = "10.0.5.0/24 dev ens33 proto kernel scope link src 10.0.5.20";
        assert_eq!(parse_default_route(out), None);
        assert_eq!(parse_default_route(""), None);
    }

    #[test]
    fn test_parse_inet_cidr() {
        let out = "\
2: ens33: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc fq_codel state UP
    inet 10.0.5.20/24 brd 10.0.5.255 scope global dynamic ens33
       valid_lft 85817sec preferred_lft 85817sec";
        assert_eq!(parse_inet_cidr(out), Some("10.0.5.20/24".to_string()));
    }

    #[test]
    fn test_parse_inet_cidr_skips_loopback() {
        let out = "    inet 127.0.0.1/8 scope host lo";
        assert_eq!(parse_inet_cidr(out), None);
    }

    #[test]
    fn test_parse_resolvectl() {
        let out = "Link 2 (ens33): 8.8.8.8 1.1.1.1";
        assert_eq!(parse_resolvectl(out), vec!["8.8.8.8", "1.1.1.1"]);
        assert!(parse_resolvectl("Link 2 (ens33):").is_empty());
    }

    #[test]
    fn test_parse_resolv_conf() {
        let content = "\
# This is /run/systemd/resolve/stub-resolv.conf
nameserver 127.0.0.53
nameserver 8.8.8.8
options edns0 trust-ad
search example.internal";
        assert_eq!(parse_resolv_conf(content), vec!["127.0.0.53", "8.8.8.8"]);
    }
}
