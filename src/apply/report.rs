//! Final report and completion marker
//!
//! Step 11: render a human-readable summary of the finished host, write it
//! to the run-stamped report file and persist the completion marker. The
//! marker write is fatal on failure; it is the record of success.

use minijinja::{Environment, context};
use tracing::{info, warn};

use crate::BootstrapError;
use crate::apply::ssh;
use crate::detect::{NetFacts, virt};
use crate::exec::capture;
use crate::plan::ProvisionPlan;
use crate::state::{BootstrapPaths, Marker, write_marker};

const REPORT_TEMPLATE: &str = "\
==========================================
 vm-bootstrap report
==========================================
Started:         {{ started }}
Completed:       {{ completed }}
Platform:        {{ platform }}
Hostname:        {{ hostname }}
Primary IP:      {{ ip }}
Gateway:         {{ gateway }}
DNS:             {{ dns }}
Root filesystem: {{ rootfs }}
Memory:          {{ memory }}
SSH host keys:   {{ ssh_keys }}
Machine ID:      {{ machine_id }}
Log file:        {{ log_file }}
Marker:          {{ marker }}
==========================================
";

/// Gather facts, render the report, write it and the marker.
pub async fn finish(plan: &ProvisionPlan, paths: &BootstrapPaths) -> Result<(), BootstrapError> {
    let completed_at = chrono::Local::now().to_rfc3339();
    let facts = NetFacts::probe().await;
    let platform = virt::platform().await;

    let hostname = match &plan.hostname {
        Some(name) => name.clone(),
        None => capture("hostname", &[]).await.unwrap_or_else(|| "unknown".to_string()),
    };
    let ip = match &plan.static_ip {
        Some(static_ip) => static_ip.address().to_string(),
        None => facts
            .cidr
            .as_deref()
            .and_then(|cidr| cidr.split('/').next())
            .unwrap_or("unknown")
            .to_string(),
    };
    let gateway = match &plan.static_ip {
        Some(static_ip) => static_ip.gateway.clone(),
        None => facts.gateway.clone().unwrap_or_else(|| "unknown".to_string()),
    };
    let dns = match &plan.static_ip {
        Some(static_ip) if !static_ip.dns.is_empty() => static_ip.dns.join(", "),
        _ => {
            if facts.dns.is_empty() {
                "unknown".to_string()
            } else {
                facts.dns.join(", ")
            }
        }
    };

    let rootfs = capture("df", &["-h", "/"])
        .await
        .map(|out| second_line(&out))
        .unwrap_or_else(|| "unknown".to_string());
    let memory = capture("free", &["-h"])
        .await
        .and_then(|out| mem_line(&out))
        .unwrap_or_else(|| "unknown".to_string());
    let machine_id = match tokio::fs::read_to_string(paths.machine_id()).await {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        _ => "(reset, regenerated on next boot)".to_string(),
    };
    let ssh_keys = ssh::host_key_count().await;

    let mut env = Environment::new();
    env.add_template("report", REPORT_TEMPLATE)?;
    let report = env.get_template("report")?.render(context! {
        started => plan.started_at.clone(),
        completed => completed_at.clone(),
        platform => platform,
        hostname => hostname.clone(),
        ip => ip.clone(),
        gateway => gateway,
        dns => dns,
        rootfs => rootfs,
        memory => memory,
        ssh_keys => ssh_keys,
        machine_id => machine_id,
        log_file => plan.log_file.display().to_string(),
        marker => paths.marker().display().to_string(),
    })?;

    println!("{report}");

    let report_path = paths.report_file(&plan.stamp);
    if plan.dry_run {
        info!("[dry-run] write report to {}", report_path.display());
        info!("[dry-run] write marker to {}", paths.marker().display());
        return Ok(());
    }

    if let Some(parent) = report_path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            warn!("Could not create {}: {}", parent.display(), e);
        }
    }
    if let Err(e) = tokio::fs::write(&report_path, &report).await {
        // The marker is the record of success, the report is a courtesy.
        warn!("Could not write report to {}: {}", report_path.display(), e);
    } else {
        info!("Report written to {}", report_path.display());
    }

    let marker = Marker {
        completed_at: Some(completed_at),
        hostname: Some(hostname),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        primary_ip: Some(ip),
        log_file: Some(plan.log_file.display().to_string()),
    };
    write_marker(paths, &marker).await
}

/// Second line of tabular tool output (df header + one data row).
fn second_line(output: &str) -> String {
    output
        .lines()
        .nth(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|| "unknown".to_string())
}

/// The `Mem:` row of `free -h`.
fn mem_line(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.starts_with("Mem:"))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_shows_run_window() {
        let mut env = Environment::new();
        env.add_template("report", REPORT_TEMPLATE).unwrap();
        let out = env
            .get_template("report")
            .unwrap()
            .render(context! {
                started => "2026-08-30T12:00:00+00:00",
                completed => "2026-08-30T12:03:40+00:00",
                platform => "vmware",
                hostname => "web-01",
                ip => "10.0.5.20",
                gateway => "10.0.5.1",
                dns => "8.8.8.8",
                rootfs => "/dev/sda2 40G 8.2G 30G 22% /",
                memory => "Mem: 3.8Gi 612Mi 2.4Gi",
                ssh_keys => 8,
                machine_id => "(reset, regenerated on next boot)",
                log_file => "/var/log/vm-bootstrap/bootstrap-x.log",
                marker => "/var/lib/vm-bootstrap/bootstrap-done",
            })
            .unwrap();
        // The plan's start time and the completion time are both reported.
        assert!(out.contains("Started:         2026-08-30T12:00:00+00:00"));
        assert!(out.contains("Completed:       2026-08-30T12:03:40+00:00"));
        assert!(out.contains("Platform:        vmware"));
    }

    #[test]
    fn test_second_line() {
        let df = "\
Filesystem      Size  Used Avail Use% Mounted on
/dev/sda2        40G  8.2G   30G  22% /";
        assert_eq!(second_line(df), "/dev/sda2 40G 8.2G 30G 22% /");
        assert_eq!(second_line("only-header"), "unknown");
    }

    #[test]
    fn test_mem_line() {
        let free = "\
               total        used        free      shared  buff/cache   available
Mem:           3.8Gi       612Mi       2.4Gi        10Mi       845Mi       3.0Gi
Swap:          2.0Gi          0B       2.0Gi";
        assert_eq!(
            mem_line(free).unwrap(),
            "Mem: 3.8Gi 612Mi 2.4Gi 10Mi 845Mi 3.0Gi"
        );
        assert!(mem_line("no memory row").is_none());
    }
}
