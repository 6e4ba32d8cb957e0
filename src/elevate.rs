//! Privilege elevation
//!
//! When the collector already runs as root the apply phase is invoked
//! in-process with the typed plan. Otherwise the plan is serialized into a
//! single env var and the same binary is re-executed under sudo with the
//! apply flag on its command line; exec() replaces the process image, so
//! the two phases never run concurrently.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;

use crate::BootstrapError;
use crate::plan::{PLAN_ENV, ProvisionPlan};

/// True when the effective uid is root.
pub fn is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

/// Build the sudo invocation for the apply phase. Apply mode travels as a
/// plain command-line flag; only the plan payload goes through the
/// environment, so sudo's env filtering has exactly one var to preserve.
fn elevated_command(exe: &Path, payload: &str) -> Command {
    let mut cmd = Command::new("sudo");
    cmd.arg(format!("--preserve-env={PLAN_ENV}"))
        .arg(exe)
        .arg("--apply")
        .env(PLAN_ENV, payload);
    cmd
}

/// Re-execute this binary under sudo in apply mode. On success this call
/// never returns; the Err is only reached when exec itself failed (sudo
/// missing, not executable, ...), which is fatal.
pub fn reexec_elevated(plan: &ProvisionPlan) -> Result<std::convert::Infallible, BootstrapError> {
    let exe = std::env::current_exe()?;
    let payload = plan.to_env_payload()?;

    let err = elevated_command(&exe, &payload).exec();

    Err(BootstrapError::Privilege(format!(
        "could not re-execute under sudo: {err}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_elevated_command_selects_apply_via_argv() {
        let cmd = elevated_command(Path::new("/usr/bin/vm-bootstrap"), "{\"payload_version\":1}");
        assert_eq!(cmd.get_program(), "sudo");

        let args: Vec<&OsStr> = cmd.get_args().collect();
        // The re-executed binary must land in apply mode through its own
        // CLI, not through an env var that sudo may strip or the flag
        // parser may reject.
        assert_eq!(args.last().copied(), Some(OsStr::new("--apply")));
        let preserve = format!("--preserve-env={PLAN_ENV}");
        assert_eq!(args.first().copied(), Some(OsStr::new(preserve.as_str())));

        let plan_env = cmd
            .get_envs()
            .find(|(key, _)| *key == OsStr::new(PLAN_ENV))
            .and_then(|(_, value)| value);
        assert_eq!(plan_env, Some(OsStr::new("{\"payload_version\":1}")));
    }
}
