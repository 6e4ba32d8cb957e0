//! Input validation predicates
//!
//! Pure string checks used by the collector. The collector treats a failed
//! check on confirmed input as fatal; nothing here performs IO or prompts.

/// `a.b.c.d` with each segment an integer in 0..=255.
///
/// No leading-zero normalization and no IPv6.
pub fn is_valid_ipv4(value: &str) -> bool {
    let segments: Vec<&str> = value.split('.').collect();
    if segments.len() != 4 {
        return false;
    }
    segments
        .iter()
        .all(|seg| !seg.is_empty() && seg.parse::<u32>().is_ok_and(|n| n <= 255))
}

/// IPv4 address plus `/prefix` with prefix in 0..=32.
pub fn is_valid_cidr(value: &str) -> bool {
    match value.split_once('/') {
        Some((addr, prefix)) => {
            is_valid_ipv4(addr) && prefix.parse::<u32>().is_ok_and(|n| n <= 32)
        }
        None => false,
    }
}

/// Comma-separated IPv4 list. Empty means "no DNS override" and is valid;
/// otherwise every trimmed token must be a valid address.
pub fn is_valid_dns_list(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    value.split(',').all(|token| is_valid_ipv4(token.trim()))
}

/// RFC-1123 host label: 1-63 alphanumeric-or-hyphen characters, no leading
/// or trailing hyphen.
pub fn is_valid_hostname(value: &str) -> bool {
    if value.is_empty() || value.len() > 63 {
        return false;
    }
    if value.starts_with('-') || value.ends_with('-') {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
