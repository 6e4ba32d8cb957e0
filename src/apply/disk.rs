//! Root filesystem expansion step
//!
//! Branches on the root device topology: LVM-backed roots grow the whole
//! stack (partition -> PV -> LV -> filesystem); plain partitions grow the
//! partition and the filesystem directly. Every sub-step that can be a
//! legitimate no-op (partition already at maximum size) is tolerated.

use tracing::{info, warn};

use crate::detect::disk::{RootDevice, split_partition};
use crate::exec::{Runner, capture};

/// growpart exits 1 with NOCHANGE when there is nothing to grow.
const GROWPART_NOCHANGE: &[i32] = &[1];

/// Step 9 (conditional): expand the root filesystem to fill the disk.
pub async fn expand_root(runner: &Runner) {
    let Some(root) = RootDevice::probe().await else {
        warn!("Could not determine the root device; skipping disk expansion");
        return;
    };
    info!(
        "Expanding root filesystem on {} ({})",
        root.source, root.fstype
    );

    if root.is_lvm() {
        expand_lvm(runner, &root).await;
    } else {
        expand_partition(runner, &root).await;
    }
}

async fn expand_lvm(runner: &Runner, root: &RootDevice) {
    let Some(out) = capture(
        "lvs",
        &["--noheadings", "-o", "vg_name,lv_name", &root.source],
    )
    .await
    else {
        warn!("Could not resolve LVM names for {}", root.source);
        return;
    };
    let Some((vg, lv)) = parse_lvs(&out) else {
        warn!("Unexpected lvs output: '{}'", out.trim());
        return;
    };
    info!("LVM topology: VG '{}', LV '{}'", vg, lv);

    let Some(pv) = capture(
        "pvs",
        &[
            "--noheadings",
            "-o",
            "pv_name",
            "--select",
            &format!("vg_name={vg}"),
        ],
    )
    .await
    .map(|s| s.trim().to_string())
    else {
        warn!("Could not locate the physical volume for VG '{}'", vg);
        return;
    };

    if let Some((disk, number)) = split_partition(&pv) {
        runner
            .run_soft_allow("growpart", &[&disk, &number], GROWPART_NOCHANGE)
            .await;
    }
    runner.run_soft("pvresize", &[&pv]).await;
    runner
        .run_soft("lvextend", &["-l", "+100%FREE", &root.source])
        .await;

    resize_filesystem(runner, root).await;
}

async fn expand_partition(runner: &Runner, root: &RootDevice) {
    if !is_ext_family(&root.fstype) {
        warn!(
            "Unsupported filesystem '{}' on plain partition {}; skipping expansion",
            root.fstype, root.source
        );
        return;
    }
    let Some((disk, number)) = split_partition(&root.source) else {
        warn!("Could not split {} into disk and partition", root.source);
        return;
    };
    runner
        .run_soft_allow("growpart", &[&disk, &number], GROWPART_NOCHANGE)
        .await;
    runner.run_soft("resize2fs", &[&root.source]).await;
}

async fn resize_filesystem(runner: &Runner, root: &RootDevice) {
    if is_ext_family(&root.fstype) {
        runner.run_soft("resize2fs", &[&root.source]).await;
    } else if root.fstype == "xfs" {
        // xfs grows by mountpoint, not device
        runner.run_soft("xfs_growfs", &["/"]).await;
    } else {
        warn!(
            "Unsupported filesystem '{}'; leaving it at its current size",
            root.fstype
        );
    }
}

fn is_ext_family(fstype: &str) -> bool {
    matches!(fstype, "ext2" | "ext3" | "ext4")
}

/// Parse `lvs --noheadings -o vg_name,lv_name` output: `  ubuntu-vg ubuntu-lv`.
pub fn parse_lvs(output: &str) -> Option<(String, String)> {
    let mut tokens = output.split_whitespace();
    let vg = tokens.next()?.to_string();
    let lv = tokens.next()?.to_string();
    Some((vg, lv))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lvs() {
        assert_eq!(
            parse_lvs("  ubuntu-vg ubuntu-lv\n"),
            Some(("ubuntu-vg".to_string(), "ubuntu-lv".to_string()))
        );
        assert_eq!(parse_lvs(""), None);
        assert_eq!(parse_lvs("  only-vg"), None);
    }

    #[test]
    fn test_ext_family() {
        assert!(is_ext_family("ext4"));
        assert!(is_ext_family("ext2"));
        assert!(!is_ext_family("xfs"));
        assert!(!is_ext_family("btrfs"));
    }
}
