//! Syntactic IP address validation.
//!
//! Validation is purely textual. A string accepted here is then parsed by
//! [`parse_address`], which also accepts the zero-padded dotted quads the IPv4
//! pattern allows and the standard library does not.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

const IPV4_PATTERN: &str =
    r"^(([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])\.){3}([01]?[0-9][0-9]?|2[0-4][0-9]|25[0-5])$";
const IPV6_STD_PATTERN: &str = r"^([0-9a-f]{1,4}:){7}[0-9a-f]{1,4}$";
const IPV6_HEX_COMPRESSED_PATTERN: &str =
    r"^((?:[0-9a-f]{1,4}(?::[0-9a-f]{1,4})*)?)::((?:[0-9a-f]{1,4}(?::[0-9a-f]{1,4})*)?)$";

fn case_insensitive(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by tests
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in address pattern {pattern}: {e}"))
}

static IPV4: LazyLock<Regex> = LazyLock::new(|| case_insensitive(IPV4_PATTERN));
static IPV6_STD: LazyLock<Regex> = LazyLock::new(|| case_insensitive(IPV6_STD_PATTERN));
static IPV6_HEX_COMPRESSED: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(IPV6_HEX_COMPRESSED_PATTERN));

/// Returns true if `candidate` is a dotted-quad IPv4 address.
pub fn is_ipv4(candidate: &str) -> bool {
    IPV4.is_match(candidate)
}

/// Returns true if `candidate` is an IPv6 address in full or `::`-compressed form.
pub fn is_ipv6(candidate: &str) -> bool {
    IPV6_STD.is_match(candidate) || IPV6_HEX_COMPRESSED.is_match(candidate)
}

/// Returns true if `candidate` is syntactically an IPv4 or IPv6 address.
///
/// Hostnames, empty strings, zone-scoped IPv6 and out-of-range octets are rejected.
pub fn is_valid(candidate: &str) -> bool {
    is_ipv4(candidate) || is_ipv6(candidate)
}

/// Parses a string that already passed [`is_valid`].
///
/// Returns `None` when the text is valid by pattern but not a real address,
/// e.g. a compressed IPv6 form with more than eight groups.
pub fn parse_address(candidate: &str) -> Option<IpAddr> {
    if let Ok(addr) = candidate.parse::<IpAddr>() {
        return Some(addr);
    }
    if is_ipv4(candidate) {
        // Zero-padded octets such as "010.001.002.003"
        let mut octets = [0u8; 4];
        for (slot, part) in octets.iter_mut().zip(candidate.split('.')) {
            *slot = part.parse().ok()?;
        }
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    None
}
