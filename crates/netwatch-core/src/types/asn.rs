//! Per-ASN connectivity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strip the textual `AS` prefix from a canonical ASN string.
///
/// The RIS Live wire format carries bare decimal numbers while curation
/// uses the canonical `ASnnnn` form; comparisons always happen on the
/// decimal part.
#[must_use]
pub fn asn_number(asn: &str) -> &str {
    asn.strip_prefix("AS").unwrap_or(asn)
}

/// Connectivity status of one monitored Autonomous System.
///
/// One record exists per curated ASN for the whole process lifetime,
/// whether or not an update has ever been observed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnRecord {
    /// Canonical ASN string, e.g. `AS12880`
    pub asn: String,
    /// Display name from curation, if known
    pub name: Option<String>,
    /// Provisional flag stamped during ingestion. The authoritative value
    /// is recomputed from `last_seen` when a snapshot is exported.
    pub connected: bool,
    /// Timestamp of the most recent UPDATE observed at or through this ASN
    pub last_seen: Option<DateTime<Utc>>,
    /// When this record was last written
    pub last_update: Option<DateTime<Utc>>,
}

impl AsnRecord {
    /// Create a never-seen record for a curated ASN.
    #[must_use]
    pub fn new(asn: impl Into<String>, name: Option<String>) -> Self {
        Self {
            asn: asn.into(),
            name,
            connected: false,
            last_seen: None,
            last_update: None,
        }
    }

    /// The decimal ASN number without the `AS` prefix.
    #[must_use]
    pub fn number(&self) -> &str {
        asn_number(&self.asn)
    }

    /// Whether `last_seen` falls within `window` of `now`.
    ///
    /// This is the derivation the snapshot export applies; the stored
    /// `connected` field is never consulted for it.
    #[must_use]
    pub fn connected_at(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        match self.last_seen {
            Some(seen) => now.signed_duration_since(seen) < window,
            None => false,
        }
    }
}
