//! Hostname helpers: base domain and cookie candidate domains.
//!
//! [`get_base_domain`] is a heuristic over a small fixed set of multi-part TLDs,
//! not a public suffix list lookup. Results must stay stable for stored
//! selections and cookie lookups to keep matching, so the set is fixed.

use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashSet};

/// Two-label suffixes treated as a single top-level domain.
pub const MULTI_PART_TLDS: [&str; 8] = [
    "com.tr", "co.uk", "org.uk", "gov.uk", "co.jp", "com.au", "com.br", "com.mx",
];

lazy_static! {
    static ref MULTI_PART_TLD_SET: HashSet<&'static str> = MULTI_PART_TLDS.iter().copied().collect();
}

/// Returns true for `d.d.d.d` where every `d` is a non-empty run of ASCII digits.
fn is_dotted_quad(hostname: &str) -> bool {
    let parts: Vec<&str> = hostname.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Computes the base (registrable-ish) domain of `hostname`.
///
/// ```
/// use domain_cleaner::get_base_domain;
/// assert_eq!(get_base_domain("www.example.co.uk"), "example.co.uk");
/// assert_eq!(get_base_domain("a.b.example.com"), "example.com");
/// ```
pub fn get_base_domain(hostname: &str) -> String {
    if hostname == "localhost" || is_dotted_quad(hostname) {
        return hostname.to_string();
    }

    let parts: Vec<&str> = hostname.split('.').filter(|p| !p.is_empty()).collect();
    if parts.len() <= 2 {
        return hostname.to_string();
    }

    let tail = parts[parts.len() - 2..].join(".");
    if MULTI_PART_TLD_SET.contains(tail.as_str()) && parts.len() >= 3 {
        return parts[parts.len() - 3..].join(".");
    }

    tail
}

/// Enumerates the domains to query when looking for cookies that apply to `hostname`.
///
/// Every suffix starting at a label boundary is included except the final single
/// label, so `a.b.c` yields `{"a.b.c", "b.c"}`. The hostname itself is always
/// present, even for single-label hosts.
pub fn get_cookie_candidate_domains(hostname: &str) -> BTreeSet<String> {
    let labels: Vec<&str> = hostname.split('.').collect();
    let mut domains = BTreeSet::new();

    for i in 0..labels.len().saturating_sub(1) {
        domains.insert(labels[i..].join("."));
    }

    domains.insert(hostname.to_string());
    domains
}
