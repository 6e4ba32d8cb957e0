//! Root device and filesystem detection
//!
//! Reads the live mount table for `/` and classifies the backing device so
//! disk expansion can branch between LVM and plain-partition topologies.

use crate::exec::capture;

/// The device and filesystem backing `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootDevice {
    /// e.g. `/dev/sda2` or `/dev/mapper/ubuntu--vg-ubuntu--lv`
    pub source: String,
    /// e.g. `ext4`, `xfs`
    pub fstype: String,
}

impl RootDevice {
    /// Probe via findmnt. None when the tool is missing or output is odd.
    pub async fn probe() -> Option<Self> {
        let out = capture("findmnt", &["-n", "-o", "SOURCE,FSTYPE", "/"]).await?;
        parse_findmnt(&out)
    }

    /// Device-mapper paths indicate an LVM-backed root.
    pub fn is_lvm(&self) -> bool {
        self.source.starts_with("/dev/mapper/") || self.source.starts_with("/dev/dm-")
    }
}

/// Parse `findmnt -n -o SOURCE,FSTYPE /` output.
pub fn parse_findmnt(output: &str) -> Option<RootDevice> {
    let mut tokens = output.split_whitespace();
    let source = tokens.next()?.to_string();
    let fstype = tokens.next()?.to_string();
    Some(RootDevice { source, fstype })
}

/// Split a partition device into (disk, partition number).
///
/// `/dev/sda3` -> `("/dev/sda", "3")`, `/dev/nvme0n1p2` -> `("/dev/nvme0n1", "2")`.
pub fn split_partition(device: &str) -> Option<(String, String)> {
    let digits_at = device.rfind(|c: char| !c.is_ascii_digit())? + 1;
    if digits_at >= device.len() {
        return None; // no trailing partition number
    }
    let number = device[digits_at..].to_string();
    let mut disk = &device[..digits_at];
    // nvme/mmcblk style: partition suffix is pN on a disk name ending in a digit
    if let Some(stripped) = disk.strip_suffix('p') {
        if stripped.ends_with(|c: char| c.is_ascii_digit()) {
            disk = stripped;
        }
    }
    Some((disk.to_string(), number))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_findmnt() {
        let dev = parse_findmnt("/dev/sda2 ext4").unwrap();
        assert_eq!(dev.source, "/dev/sda2");
        assert_eq!(dev.fstype, "ext4");
        assert!(!dev.is_lvm());

        assert!(parse_findmnt("").is_none());
        assert!(parse_findmnt("/dev/sda2").is_none());
    }

    #[test]
    fn test_lvm_detection() {
        let dev = parse_findmnt("/dev/mapper/ubuntu--vg-ubuntu--lv ext4").unwrap();
        assert!(dev.is_lvm());
        let dev = parse_findmnt("/dev/dm-0 xfs").unwrap();
        assert!(dev.is_lvm());
    }

    #[test]
    fn test_split_partition() {
        assert_eq!(
            split_partition("/dev/sda3"),
            Some(("/dev/sda".to_string(), "3".to_string()))
        );
        assert_eq!(
            split_partition("/dev/vda1"),
            Some(("/dev/vda".to_string(), "1".to_string()))
        );
        assert_eq!(
            split_partition("/dev/nvme0n1p2"),
            Some(("/dev/nvme0n1".to_string(), "2".to_string()))
        );
        assert_eq!(
            split_partition("/dev/mmcblk0p1"),
            Some(("/dev/mmcblk0".to_string(), "1".to_string()))
        );
        assert_eq!(split_partition("/dev/sda"), None);
    }
}
