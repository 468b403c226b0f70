//! netwatch-radar: country-level traffic from the external Radar service.
//!
//! A single HTTP client polls the Radar timeseries endpoint, normalizes
//! whatever response shape the service happens to return this week, and
//! caches the resulting [`TrafficSample`](netwatch_core::types::TrafficSample)
//! for five minutes. A secondary, best-effort endpoint family yields
//! per-ASN traffic shares; its absence is tolerated everywhere.

mod asn_traffic;
mod client;
mod error;
mod sample;
mod series;

pub use client::{RadarAuth, RadarClient, RadarClientBuilder};
pub use error::RadarError;
pub use sample::build_sample;
pub use series::{extract_series, RawSeries};

/// Result type for Radar operations.
pub type Result<T> = std::result::Result<T, RadarError>;
