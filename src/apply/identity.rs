//! Machine identity reset and journal vacuum
//!
//! Clones must not share a machine-id: systemd regenerates a fresh one on
//! boot when the file is present but empty. The D-Bus copy is relinked so
//! both identities stay in sync.

use tracing::{info, warn};

use crate::exec::Runner;
use crate::state::BootstrapPaths;

const DBUS_MACHINE_ID: &str = "/var/lib/dbus/machine-id";

/// Step 3: truncate /etc/machine-id and relink the D-Bus copy at it.
pub async fn reset_machine_id(runner: &Runner, paths: &BootstrapPaths) {
    let machine_id = paths.machine_id();
    info!("Resetting machine identity ({})", machine_id.display());

    if runner.dry_run() {
        info!("[dry-run] truncate {}", machine_id.display());
    } else if let Err(e) = tokio::fs::write(&machine_id, b"").await {
        warn!("Could not truncate {}: {}", machine_id.display(), e);
    }

    runner.run_soft("ln", &["-sf", "/etc/machine-id", DBUS_MACHINE_ID]).await;
}

/// Step 4: rotate and vacuum the system journal so the clone starts with an
/// empty history.
pub async fn vacuum_journal(runner: &Runner) {
    info!("Vacuuming system journal");
    runner.run_soft("journalctl", &["--rotate"]).await;
    runner.run_soft("journalctl", &["--vacuum-time=1s"]).await;
}
