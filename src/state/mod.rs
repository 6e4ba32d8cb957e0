//! Bootstrap completion state
//!
//! The marker file is the sole record that a host has been provisioned.
//! It is a flat `key: value` text file so operators can cat it; parsing is
//! deliberately lenient because a mangled marker must still block a re-run
//! (present-but-unknown), never crash the guard.

pub mod paths;

pub use paths::BootstrapPaths;

use crate::BootstrapError;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Parsed completion marker. Every field is optional; only the file's
/// existence carries meaning for the idempotency guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marker {
    pub completed_at: Option<String>,
    pub hostname: Option<String>,
    pub version: Option<String>,
    pub primary_ip: Option<String>,
    pub log_file: Option<String>,
}

impl Marker {
    /// Parse marker text. Unknown lines are ignored, missing fields stay
    /// `None`; this never fails.
    pub fn parse(content: &str) -> Self {
        let mut marker = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                "completed_at" => marker.completed_at = Some(value),
                "hostname" => marker.hostname = Some(value),
                "version" => marker.version = Some(value),
                "primary_ip" => marker.primary_ip = Some(value),
                "log_file" => marker.log_file = Some(value),
                _ => {}
            }
        }
        marker
    }

    /// Render marker text.
    pub fn render(&self) -> String {
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        format!(
            "completed_at: {}\nhostname: {}\nversion: {}\nprimary_ip: {}\nlog_file: {}\n",
            field(&self.completed_at),
            field(&self.hostname),
            field(&self.version),
            field(&self.primary_ip),
            field(&self.log_file),
        )
    }

    pub fn completed_at_display(&self) -> &str {
        self.completed_at.as_deref().unwrap_or("unknown time")
    }

    pub fn hostname_display(&self) -> &str {
        self.hostname.as_deref().unwrap_or("unknown host")
    }
}

/// Read the marker if one exists. IO errors on an existing file count as
/// present-but-unknown so the guard still blocks.
pub async fn load_marker(paths: &BootstrapPaths) -> Option<Marker> {
    let path = paths.marker();
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(&path).await {
        Ok(content) => Some(Marker::parse(&content)),
        Err(e) => {
            debug!("Marker at {} unreadable ({}): treating as present", path.display(), e);
            Some(Marker::default())
        }
    }
}

/// Write the marker. This is the record of success, so failure here is the
/// one fatal outcome of the reporting step.
pub async fn write_marker(paths: &BootstrapPaths, marker: &Marker) -> Result<(), BootstrapError> {
    let path = paths.marker();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| BootstrapError::Marker(format!("{}: {}", parent.display(), e)))?;
    }
    fs::write(&path, marker.render())
        .await
        .map_err(|e| BootstrapError::Marker(format!("{}: {}", path.display(), e)))?;
    info!("Wrote completion marker to {}", path.display());
    Ok(())
}

/// True when `path` looks like it lives under a temp directory. Used by
/// sysprep's self-protection check.
pub fn is_under_temp_dir(path: &Path) -> bool {
    path.starts_with("/tmp") || path.starts_with("/var/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_marker_roundtrip() {
        let marker = Marker {
            completed_at: Some("2026-08-30T14:15:02+00:00".to_string()),
            hostname: Some("web-01".to_string()),
            version: Some("0.3.1".to_string()),
            primary_ip: Some("10.0.5.20".to_string()),
            log_file: Some("/var/log/vm-bootstrap/bootstrap-x.log".to_string()),
        };
        let parsed = Marker::parse(&marker.render());
        assert_eq!(parsed, marker);
    }

    #[test]
    fn test_marker_parse_is_lenient() {
        let marker = Marker::parse("garbage\nhostname web-01\n:::\ncompleted_at: ");
        assert_eq!(marker, Marker::default());

        let partial = Marker::parse("hostname: db-02\nnot a field\nbogus: 1");
        assert_eq!(partial.hostname.as_deref(), Some("db-02"));
        assert!(partial.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_load_marker_absent() {
        let temp = TempDir::new().unwrap();
        let paths = BootstrapPaths::with_root(temp.path());
        assert!(load_marker(&paths).await.is_none());
    }

    #[tokio::test]
    async fn test_write_then_load_marker() {
        let temp = TempDir::new().unwrap();
        let paths = BootstrapPaths::with_root(temp.path());

        let marker = Marker {
            hostname: Some("web-01".to_string()),
            ..Default::default()
        };
        write_marker(&paths, &marker).await.unwrap();

        let loaded = load_marker(&paths).await.unwrap();
        assert_eq!(loaded.hostname.as_deref(), Some("web-01"));
    }

    #[tokio::test]
    async fn test_garbled_marker_still_blocks() {
        let temp = TempDir::new().unwrap();
        let paths = BootstrapPaths::with_root(temp.path());
        std::fs::create_dir_all(paths.state.clone()).unwrap();
        std::fs::write(paths.marker(), "\x00\x01 completely bogus").unwrap();

        let marker = load_marker(&paths).await;
        assert!(marker.is_some());
        assert_eq!(marker.unwrap().hostname_display(), "unknown host");
    }

    #[test]
    fn test_is_under_temp_dir() {
        assert!(is_under_temp_dir(Path::new("/tmp/vm-bootstrap")));
        assert!(is_under_temp_dir(Path::new("/var/tmp/x")));
        assert!(!is_under_temp_dir(Path::new("/usr/local/bin/vm-bootstrap")));
    }
}
