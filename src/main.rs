//! vm-bootstrap - turn a cloned VM template into a uniquely identified host
//!
//! Single entry point, no subcommands; every flag also reads from an
//! environment variable so automation can drive it non-interactively.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::FalseyValueParser;
use tracing::{error, info, warn};

use vm_bootstrap::collect::{CollectOptions, collect};
use vm_bootstrap::logging::{self, TeeWriter};
use vm_bootstrap::plan::{APPLY_ENV, ProvisionPlan};
use vm_bootstrap::state::BootstrapPaths;
use vm_bootstrap::{BootstrapError, apply, elevate};

// Bool flags take FalseyValueParser so env values like `1` or `yes` count
// as set instead of failing clap's strict true/false parse.
#[derive(Parser)]
#[command(name = "vm-bootstrap")]
#[command(author, version, about = "One-shot provisioning for cloned VM templates", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print mutating commands instead of executing them
    #[arg(long, env = "VM_BOOTSTRAP_DRY_RUN", action = clap::ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    dry_run: bool,

    /// Skip prompts, accepting each one's stated default
    #[arg(short = 'y', long = "yes", env = "VM_BOOTSTRAP_YES", action = clap::ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    assume_yes: bool,

    /// Proceed even when the completion marker says this host is done
    #[arg(long, env = "VM_BOOTSTRAP_FORCE_RERUN", action = clap::ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    force_rerun: bool,

    /// Run the apply phase from a serialized plan (passed by the elevation
    /// re-exec, not meant for direct use)
    #[arg(long, env = APPLY_ENV, hide = true, action = clap::ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    apply: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let tee = logging::init(cli.verbose);

    if let Err(e) = run(cli, tee).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, tee: TeeWriter) -> Result<(), BootstrapError> {
    let paths = BootstrapPaths::new();

    if cli.apply {
        // Elevated re-invocation: the plan arrives fully validated.
        let plan = ProvisionPlan::from_env()?;
        start_apply(&tee, &plan);
        return apply::run(&plan, &paths).await;
    }

    let opts = CollectOptions {
        dry_run: cli.dry_run,
        assume_yes: cli.assume_yes,
        force_rerun: cli.force_rerun,
    };
    let plan = collect(&paths, opts).await?;

    if elevate::is_root() {
        info!("Already privileged; running apply in-process");
        start_apply(&tee, &plan);
        apply::run(&plan, &paths).await
    } else {
        info!("Re-executing under sudo for the apply phase");
        match elevate::reexec_elevated(&plan) {
            Ok(never) => match never {},
            Err(e) => Err(e),
        }
    }
}

/// Attach the shared log file and the interrupt reporter before mutating.
fn start_apply(tee: &TeeWriter, plan: &ProvisionPlan) {
    if let Err(e) = tee.attach_file(&plan.log_file) {
        warn!("Could not open log file {}: {}", plan.log_file.display(), e);
    } else {
        info!("Logging to {}", plan.log_file.display());
    }
    spawn_interrupt_reporter(plan.log_file.clone());
}

/// On ctrl-c, report where the partial transcript lives and exit 130.
/// No rollback happens here; only netplan validation rolls back, on its own.
fn spawn_interrupt_reporter(log_file: PathBuf) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "vm-bootstrap: interrupted; partial transcript at {}",
                log_file.display()
            );
            std::process::exit(130);
        }
    });
}
