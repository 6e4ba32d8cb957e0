//! Interactive collector
//!
//! Gathers every decision for a run, validates answers, and freezes them
//! into a [`ProvisionPlan`]. Prompt order is fixed; conditional prompts are
//! only offered when the matching capability was detected. Invalid input at
//! a validated prompt aborts immediately instead of re-prompting.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use crate::detect::{NetFacts, virt};
use crate::exec::command_exists;
use crate::plan::{PAYLOAD_VERSION, ProvisionPlan, StaticIp, split_dns_list};
use crate::state::{BootstrapPaths, Marker, load_marker};
use crate::validate::{is_valid_cidr, is_valid_dns_list, is_valid_hostname, is_valid_ipv4};
use crate::BootstrapError;

/// Invocation options that shape collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    pub dry_run: bool,
    /// Skip prompts, accepting each one's stated default.
    pub assume_yes: bool,
    /// Bypass the idempotency guard.
    pub force_rerun: bool,
}

/// Run the full collection flow and return the frozen plan.
pub async fn collect(
    paths: &BootstrapPaths,
    opts: CollectOptions,
) -> Result<ProvisionPlan, BootstrapError> {
    guard_against_rerun(paths, opts).await?;

    let now = chrono::Local::now();
    let stamp = now.format("%Y%m%d-%H%M%S").to_string();
    let started_at = now.to_rfc3339();

    let facts = NetFacts::probe().await;
    let platform = virt::platform().await;
    info!("Detected platform: {}", platform);
    match &facts.interface {
        Some(iface) => info!("Primary interface: {}", iface),
        None => warn!("No primary network interface detected; static IP will not be offered"),
    }

    let mut prompter = Prompter::new(opts.assume_yes);

    let hostname = prompt_hostname(&mut prompter).await?;
    let static_ip = prompt_static_ip(&mut prompter, &facts).await?;
    let clean_cloud_init = prompt_cloud_init(&mut prompter).await?;
    let remove_credentials = prompt_credentials(&mut prompter).await?;
    let expand_disk = prompter
        .confirm("Expand the root filesystem to fill the disk?", true)
        .await?;
    let sysprep = prompter
        .confirm("Run sysprep cleanup (histories, logs, temp files)?", false)
        .await?;

    let plan = ProvisionPlan {
        payload_version: PAYLOAD_VERSION,
        hostname,
        static_ip,
        clean_cloud_init,
        remove_credentials,
        expand_disk,
        sysprep,
        dry_run: opts.dry_run,
        assume_yes: opts.assume_yes,
        force_rerun: opts.force_rerun,
        log_file: paths.log_file(&stamp),
        stamp,
        started_at,
    };

    if !plan.has_conditional_work() {
        info!("No host-specific changes requested; only the unconditional refresh steps will run");
    }

    println!("{}", render_summary(&plan, &platform));
    let confirmed = prompter
        .confirm("Apply these changes? The host will reboot when done.", true)
        .await?;
    if !confirmed {
        return Err(BootstrapError::Aborted(
            "final confirmation declined".to_string(),
        ));
    }

    Ok(plan)
}

/// Idempotency guard: a marker blocks the run unless explicitly overridden.
async fn guard_against_rerun(
    paths: &BootstrapPaths,
    opts: CollectOptions,
) -> Result<(), BootstrapError> {
    let Some(marker) = load_marker(paths).await else {
        return Ok(());
    };

    if opts.force_rerun {
        warn!(
            "Host already bootstrapped ({} as '{}'); continuing due to force-rerun",
            marker.completed_at_display(),
            marker.hostname_display()
        );
        return Ok(());
    }

    println!(
        "This host was already bootstrapped on {} as '{}'.",
        marker.completed_at_display(),
        marker.hostname_display()
    );

    if opts.assume_yes {
        // Non-interactive runs may not silently redo a completed bootstrap.
        return Err(blocked(&marker));
    }

    let mut prompter = Prompter::new(false);
    if prompter.confirm("Run the bootstrap again anyway?", false).await? {
        Ok(())
    } else {
        Err(blocked(&marker))
    }
}

fn blocked(marker: &Marker) -> BootstrapError {
    BootstrapError::Aborted(format!(
        "already bootstrapped ({} as '{}'); pass --force-rerun to override",
        marker.completed_at_display(),
        marker.hostname_display()
    ))
}

async fn prompt_hostname(prompter: &mut Prompter) -> Result<Option<String>, BootstrapError> {
    let answer = prompter
        .text("New hostname (empty keeps the current one)", "")
        .await?;
    if answer.is_empty() {
        return Ok(None);
    }
    if !is_valid_hostname(&answer) {
        return Err(BootstrapError::InvalidInput(format!(
            "invalid hostname '{answer}'"
        )));
    }
    Ok(Some(answer))
}

/// Offered only when a primary interface was detected; pre-filled with the
/// current live values.
async fn prompt_static_ip(
    prompter: &mut Prompter,
    facts: &NetFacts,
) -> Result<Option<StaticIp>, BootstrapError> {
    let Some(interface) = &facts.interface else {
        return Ok(None);
    };

    let wanted = prompter
        .confirm(&format!("Configure a static IP on {interface}?"), false)
        .await?;
    if !wanted {
        return Ok(None);
    }

    let cidr = prompter
        .text("Address (CIDR)", facts.cidr.as_deref().unwrap_or(""))
        .await?;
    if !is_valid_cidr(&cidr) {
        return Err(BootstrapError::InvalidInput(format!(
            "invalid CIDR address '{cidr}'"
        )));
    }

    let gateway = prompter
        .text("Gateway", facts.gateway.as_deref().unwrap_or(""))
        .await?;
    if !is_valid_ipv4(&gateway) {
        return Err(BootstrapError::InvalidInput(format!(
            "invalid gateway address '{gateway}'"
        )));
    }

    let dns_default = facts.dns.join(",");
    let dns = prompter
        .text("DNS servers (comma-separated, empty keeps current)", &dns_default)
        .await?;
    if !is_valid_dns_list(&dns) {
        return Err(BootstrapError::InvalidInput(format!(
            "invalid DNS list '{dns}'"
        )));
    }

    Ok(Some(StaticIp {
        interface: interface.clone(),
        cidr,
        gateway,
        dns: split_dns_list(&dns),
    }))
}

/// Offered only when cloud-init is installed.
async fn prompt_cloud_init(prompter: &mut Prompter) -> Result<bool, BootstrapError> {
    if !command_exists("cloud-init").await {
        return Ok(false);
    }
    prompter
        .confirm("Reset cloud-init state so it re-runs on next boot?", true)
        .await
}

/// Offered only when this host carries cloud instance metadata, i.e. it is
/// a provisioned clone. Destructive, so it takes two distinct confirmations
/// and is never auto-accepted.
async fn prompt_credentials(prompter: &mut Prompter) -> Result<bool, BootstrapError> {
    if !has_cloud_instance_state().await {
        return Ok(false);
    }
    let wanted = prompter
        .confirm("Remove cloud provider credentials (AWS/Azure/GCP)?", false)
        .await?;
    if !wanted {
        return Ok(false);
    }
    prompter
        .confirm(
            "Credential removal is irreversible. Really delete them?",
            false,
        )
        .await
}

async fn has_cloud_instance_state() -> bool {
    match tokio::fs::read_dir("/var/lib/cloud/instances").await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

/// Human-readable summary shown before the final confirmation.
pub fn render_summary(plan: &ProvisionPlan, platform: &str) -> String {
    let mut out = String::new();
    out.push_str("\n==== Bootstrap summary ====\n");
    out.push_str(&format!("Platform:            {platform}\n"));
    out.push_str(&format!(
        "Hostname:            {}\n",
        plan.hostname.as_deref().unwrap_or("(unchanged)")
    ));
    match &plan.static_ip {
        Some(ip) => {
            out.push_str(&format!(
                "Static IP:           {} on {} via {}\n",
                ip.cidr, ip.interface, ip.gateway
            ));
            out.push_str(&format!(
                "DNS:                 {}\n",
                if ip.dns.is_empty() {
                    "(unchanged)".to_string()
                } else {
                    ip.dns.join(", ")
                }
            ));
        }
        None => out.push_str("Static IP:           no (keep current networking)\n"),
    }
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    out.push_str(&format!("Cloud-init reset:    {}\n", yes_no(plan.clean_cloud_init)));
    out.push_str(&format!("Credential removal:  {}\n", yes_no(plan.remove_credentials)));
    out.push_str(&format!("Disk expansion:      {}\n", yes_no(plan.expand_disk)));
    out.push_str(&format!("Sysprep cleanup:     {}\n", yes_no(plan.sysprep)));
    if plan.dry_run {
        out.push_str("Mode:                DRY RUN (no changes will be made)\n");
    }
    out.push_str(&format!("Log file:            {}\n", plan.log_file.display()));
    out.push_str("===========================\n");
    out
}

/// Interpret a yes/no answer. Empty picks the default; anything that is not
/// a recognizable yes or no is an error (collection is validate-after-input,
/// not per-keystroke).
pub fn parse_yes_no(input: &str, default: bool) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Stdin-backed prompter. With assume-yes it answers every prompt with its
/// stated default without touching stdin.
struct Prompter {
    assume_yes: bool,
    lines: Lines<BufReader<Stdin>>,
}

impl Prompter {
    fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn text(&mut self, question: &str, default: &str) -> Result<String, BootstrapError> {
        if self.assume_yes {
            return Ok(default.to_string());
        }
        if default.is_empty() {
            print!("{question}: ");
        } else {
            print!("{question} [{default}]: ");
        }
        std::io::stdout().flush()?;
        let answer = self.read_line().await?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    async fn confirm(&mut self, question: &str, default: bool) -> Result<bool, BootstrapError> {
        if self.assume_yes {
            return Ok(default);
        }
        let hint = if default { "Y/n" } else { "y/N" };
        print!("{question} [{hint}]: ");
        std::io::stdout().flush()?;
        let answer = self.read_line().await?;
        parse_yes_no(&answer, default).ok_or_else(|| {
            BootstrapError::InvalidInput(format!("expected yes or no, got '{answer}'"))
        })
    }

    async fn read_line(&mut self) -> Result<String, BootstrapError> {
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            // EOF on stdin counts as declining to answer.
            None => Err(BootstrapError::Aborted("input closed".to_string())),
        }
    }
}
