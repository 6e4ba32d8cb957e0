//! Dry-run apply tests
//!
//! A dry-run apply pass over a fake root must leave the hosts file, the
//! machine-id, the netplan directory and the marker untouched while still
//! completing the full catalog.

use tempfile::TempDir;

use vm_bootstrap::apply;
use vm_bootstrap::plan::{PAYLOAD_VERSION, ProvisionPlan, StaticIp};
use vm_bootstrap::state::{BootstrapPaths, load_marker};

fn dry_run_plan(paths: &BootstrapPaths) -> ProvisionPlan {
    ProvisionPlan {
        payload_version: PAYLOAD_VERSION,
        hostname: Some("web-01".to_string()),
        static_ip: Some(StaticIp {
            interface: "ens33".to_string(),
            cidr: "10.0.5.20/24".to_string(),
            gateway: "10.0.5.1".to_string(),
            dns: vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()],
        }),
        clean_cloud_init: false,
        remove_credentials: false,
        expand_disk: true,
        sysprep: false,
        dry_run: true,
        assume_yes: true,
        force_rerun: false,
        stamp: "20260830-120000".to_string(),
        started_at: "2026-08-30T12:00:00+00:00".to_string(),
        log_file: paths.log_file("20260830-120000"),
    }
}

#[tokio::test]
async fn dry_run_apply_mutates_nothing() {
    let temp = TempDir::new().unwrap();
    let paths = BootstrapPaths::with_root(temp.path());

    std::fs::create_dir_all(&paths.etc).unwrap();
    std::fs::create_dir_all(&paths.netplan).unwrap();
    let hosts_before = "127.0.0.1\tlocalhost\n127.0.1.1\ttemplate\n";
    std::fs::write(paths.hosts(), hosts_before).unwrap();
    std::fs::write(paths.machine_id(), "0123456789abcdef0123456789abcdef\n").unwrap();
    let netplan_before = "network:\n  version: 2\n";
    std::fs::write(paths.netplan.join("50-cloud-init.yaml"), netplan_before).unwrap();

    let plan = dry_run_plan(&paths);
    apply::run(&plan, &paths).await.unwrap();

    // Everything the run would normally touch is still pristine.
    assert_eq!(std::fs::read_to_string(paths.hosts()).unwrap(), hosts_before);
    assert_eq!(
        std::fs::read_to_string(paths.machine_id()).unwrap(),
        "0123456789abcdef0123456789abcdef\n"
    );
    assert!(!paths.netplan_file().exists());
    assert_eq!(
        std::fs::read_to_string(paths.netplan.join("50-cloud-init.yaml")).unwrap(),
        netplan_before
    );
    assert!(!paths.netplan_backup_dir(&plan.stamp).exists());
    assert!(load_marker(&paths).await.is_none());
    assert!(!paths.report_file(&plan.stamp).exists());
}
