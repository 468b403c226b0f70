//! Country-level and per-ASN traffic samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Categorical traffic status derived from the current-to-baseline ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficStatus {
    Normal,
    Degraded,
    Throttled,
    Shutdown,
}

impl TrafficStatus {
    /// Classify the ratio `current / baseline` into a status band.
    ///
    /// Bands are open at the lower edge: a ratio of exactly 0.7 is
    /// `Degraded`, exactly 0.3 is `Throttled`, exactly 0.1 is `Shutdown`.
    #[must_use]
    pub fn classify(current: f64, baseline: f64) -> Self {
        let ratio = current / baseline;
        if ratio > 0.7 {
            Self::Normal
        } else if ratio > 0.3 {
            Self::Degraded
        } else if ratio > 0.1 {
            Self::Throttled
        } else {
            Self::Shutdown
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Degraded => "Degraded",
            Self::Throttled => "Throttled",
            Self::Shutdown => "Shutdown",
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Normal => "\u{1f7e2}",
            Self::Degraded => "\u{1f7e1}",
            Self::Throttled => "\u{1f7e0}",
            Self::Shutdown => "\u{1f534}",
        }
    }
}

/// One observed country-level traffic sample.
///
/// Immutable once produced; the Radar client publishes a whole new sample
/// on every successful fetch. `trend` holds up to 24 hourly values
/// normalized to percent-of-window-max, `timestamps` is always the same
/// length as `trend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSample {
    /// Latest trend value, percent of window max
    pub current_level: f64,
    /// Normalized hourly values in `[0, 100]`
    pub trend: Vec<f64>,
    /// Hourly timestamps parallel to `trend`
    pub timestamps: Vec<DateTime<Utc>>,
    /// Mean of the oldest 12 trend entries, or 100 with 12 or fewer entries
    pub baseline_percent: f64,
    /// `(current - baseline) / baseline * 100`
    pub change_percent: f64,
    pub status: TrafficStatus,
    /// When this sample was fetched
    pub fetched_at: DateTime<Utc>,
}

/// Relative weight of one ASN in the per-ASN traffic sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsnTrafficTier {
    High,
    Medium,
    Low,
    VeryLow,
}

impl AsnTrafficTier {
    /// Tier by share of total traffic, percent.
    #[must_use]
    pub fn classify(share_percent: f64) -> Self {
        if share_percent >= 5.0 {
            Self::High
        } else if share_percent >= 1.0 {
            Self::Medium
        } else if share_percent >= 0.1 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::High => "\u{1f7e2}",
            Self::Medium => "\u{1f7e1}",
            Self::Low => "\u{1f7e0}",
            Self::VeryLow => "\u{26aa}",
        }
    }
}

/// Best-effort per-ASN traffic share entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsnTraffic {
    /// Canonical ASN string
    pub asn: String,
    /// Display name (upstream name preferred, curation fallback)
    pub name: String,
    /// Absolute value as reported upstream
    pub volume: f64,
    /// Share of the total across the reported set, percent
    pub share_percent: f64,
    pub tier: AsnTrafficTier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bands_at_thresholds() {
        // Inclusive edges land in the lower band.
        assert_eq!(TrafficStatus::classify(71.0, 100.0), TrafficStatus::Normal);
        assert_eq!(TrafficStatus::classify(70.0, 100.0), TrafficStatus::Degraded);
        assert_eq!(TrafficStatus::classify(31.0, 100.0), TrafficStatus::Degraded);
        assert_eq!(TrafficStatus::classify(30.0, 100.0), TrafficStatus::Throttled);
        assert_eq!(TrafficStatus::classify(11.0, 100.0), TrafficStatus::Throttled);
        assert_eq!(TrafficStatus::classify(10.0, 100.0), TrafficStatus::Shutdown);
        assert_eq!(TrafficStatus::classify(0.0, 100.0), TrafficStatus::Shutdown);
    }

    #[test]
    fn asn_tier_bands() {
        assert_eq!(AsnTrafficTier::classify(5.0), AsnTrafficTier::High);
        assert_eq!(AsnTrafficTier::classify(4.99), AsnTrafficTier::Medium);
        assert_eq!(AsnTrafficTier::classify(1.0), AsnTrafficTier::Medium);
        assert_eq!(AsnTrafficTier::classify(0.5), AsnTrafficTier::Low);
        assert_eq!(AsnTrafficTier::classify(0.05), AsnTrafficTier::VeryLow);
    }
}
