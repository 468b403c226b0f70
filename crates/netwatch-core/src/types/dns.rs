//! DNS resolver records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Role of a curated resolver.
///
/// Drives the recursion-desired flag on probes: strictly authoritative
/// servers are queried without RD so a REFUSED answer still counts as a
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Authoritative,
    Recursive,
    #[default]
    Both,
}

impl ResolverKind {
    /// Whether probe questions should request recursion.
    #[must_use]
    pub const fn recursion_desired(self) -> bool {
        !matches!(self, Self::Authoritative)
    }
}

/// Composite map key for resolver records.
///
/// Curation intentionally lists the same address under multiple display
/// names (same IP, different role labels), so the address alone is not a
/// key. Liveness, on the other hand, is a property of the address; the
/// publish path reconciles across keys sharing one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DnsKey {
    pub address: String,
    pub name: String,
}

impl DnsKey {
    #[must_use]
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DnsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.name)
    }
}

/// Probe status of one curated resolver entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Resolver IP address (no port)
    pub address: String,
    /// Display name from curation
    pub name: String,
    /// Role tag from curation
    #[serde(default)]
    pub kind: ResolverKind,
    /// Whether the last probe round found the address responsive
    pub alive: bool,
    /// Round-trip time of the last probe attempt
    pub response_time: Duration,
    /// When this entry was last probed
    pub last_check: Option<DateTime<Utc>>,
    /// Last probe error, empty when the probe succeeded cleanly
    #[serde(default)]
    pub last_error: String,
}

impl DnsRecord {
    /// Create a never-checked record for a curated entry.
    #[must_use]
    pub fn new(address: impl Into<String>, name: impl Into<String>, kind: ResolverKind) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            kind,
            alive: false,
            response_time: Duration::ZERO,
            last_check: None,
            last_error: String::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> DnsKey {
        DnsKey::new(self.address.clone(), self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_desired_by_kind() {
        assert!(!ResolverKind::Authoritative.recursion_desired());
        assert!(ResolverKind::Recursive.recursion_desired());
        assert!(ResolverKind::Both.recursion_desired());
    }

    #[test]
    fn kind_parses_lowercase() {
        assert_eq!(
            serde_json::from_str::<ResolverKind>("\"authoritative\"").unwrap(),
            ResolverKind::Authoritative
        );
        assert_eq!(
            serde_json::from_str::<ResolverKind>("\"recursive\"").unwrap(),
            ResolverKind::Recursive
        );
    }

    #[test]
    fn same_address_different_names_are_distinct_keys() {
        let x = DnsKey::new("8.8.8.8", "X");
        let y = DnsKey::new("8.8.8.8", "Y");
        assert_ne!(x, y);
    }
}
