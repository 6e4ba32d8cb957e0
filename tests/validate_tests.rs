//! Validator property tests
//!
//! Exhaustive-ish checks of the collector's input predicates beyond the
//! per-module unit tests.

use vm_bootstrap::validate::{
    is_valid_cidr, is_valid_dns_list, is_valid_hostname, is_valid_ipv4,
};

/// Every accepted IPv4 string has exactly four segments and each parses to
/// an integer in 0..=255.
#[test]
fn accepted_ipv4_strings_have_four_bounded_segments() {
    let candidates = [
        "0.0.0.0",
        "10.0.5.20",
        "255.255.255.255",
        "001.2.3.4", // leading zeros are tolerated, not normalized
        "192.168.1.1",
    ];
    for candidate in candidates {
        assert!(is_valid_ipv4(candidate), "{candidate} should be accepted");
        let segments: Vec<&str> = candidate.split('.').collect();
        assert_eq!(segments.len(), 4);
        for seg in segments {
            let n: u32 = seg.parse().unwrap();
            assert!(n <= 255);
        }
    }
}

/// Every accepted CIDR's address passes the IPv4 validator and its prefix
/// is in 0..=32.
#[test]
fn accepted_cidr_strings_decompose_cleanly() {
    for candidate in ["10.0.5.20/24", "0.0.0.0/0", "255.255.255.255/32"] {
        assert!(is_valid_cidr(candidate));
        let (addr, prefix) = candidate.split_once('/').unwrap();
        assert!(is_valid_ipv4(addr));
        let prefix: u32 = prefix.parse().unwrap();
        assert!(prefix <= 32);
    }
}

/// Boundary sweep over prefix lengths.
#[test]
fn cidr_prefix_boundaries() {
    for prefix in 0..=32 {
        assert!(is_valid_cidr(&format!("10.0.0.1/{prefix}")));
    }
    assert!(!is_valid_cidr("10.0.0.1/33"));
    assert!(!is_valid_cidr("10.0.0.1/-1"));
}

/// The empty string is the only DNS input that bypasses per-token checks.
#[test]
fn dns_list_empty_vs_malformed() {
    assert!(is_valid_dns_list(""));
    assert!(!is_valid_dns_list(" "));
    assert!(is_valid_dns_list("8.8.8.8 , 1.1.1.1"));
    assert!(!is_valid_dns_list("8.8.8.8,1.1.1.1,"));
    assert!(!is_valid_dns_list("8.8.8.8,bogus,1.1.1.1"));
}

/// RFC-1123 label boundaries.
#[test]
fn hostname_boundaries() {
    assert!(is_valid_hostname("a"));
    assert!(is_valid_hostname("0"));
    assert!(!is_valid_hostname("-a"));
    assert!(!is_valid_hostname("a-"));
    assert!(is_valid_hostname(&"a".repeat(63)));
    assert!(!is_valid_hostname(&"a".repeat(64)));
}
