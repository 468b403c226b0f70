//! Configuration: a JSON document with environment overrides.
//!
//! A missing file yields the built-in defaults (curated ASN and resolver
//! lists, the public RIS Live endpoint, 5-minute cadence). Durations are
//! Go-style strings such as `"5m"` or `"1h30m"` on the wire.

pub mod curation;

use crate::error::CoreError;
use crate::types::ResolverKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default RIS Live WebSocket endpoint.
pub const DEFAULT_RIS_URL: &str = "wss://ris-live.ripe.net/v1/ws/?client=netwatch";

/// One curated resolver entry as it appears in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsServerEntry {
    pub address: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ResolverKind,
}

impl DnsServerEntry {
    #[must_use]
    pub fn new(address: &str, name: &str, kind: ResolverKind) -> Self {
        Self {
            address: address.to_string(),
            name: name.to_string(),
            kind,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat-platform bot token
    #[serde(default, alias = "telegram_token", skip_serializing_if = "Option::is_none")]
    pub chat_token: Option<String>,

    /// Channel handle (`@name` or numeric chat id) for periodic publication
    #[serde(default, alias = "telegram_channel", skip_serializing_if = "Option::is_none")]
    pub chat_channel: Option<String>,

    /// Base cadence for DNS rounds and the BGP consistency sweep
    #[serde(with = "duration_string", default = "default_interval")]
    pub interval: Duration,

    /// RIS Live WebSocket URL
    #[serde(default = "default_ris_url")]
    pub ris_live_url: String,

    /// Curated resolvers to probe
    #[serde(default)]
    pub dns_servers: Vec<DnsServerEntry>,

    /// Curated ASNs to subscribe to, canonical `ASnnnn` form
    #[serde(rename = "iran_asns", default)]
    pub asns: Vec<String>,

    /// Radar API token (preferred auth)
    #[serde(default, alias = "cloudflare_token", skip_serializing_if = "Option::is_none")]
    pub radar_token: Option<String>,

    /// Legacy Radar auth: account email
    #[serde(default, alias = "cloudflare_email", skip_serializing_if = "Option::is_none")]
    pub radar_email: Option<String>,

    /// Legacy Radar auth: API key
    #[serde(default, alias = "cloudflare_key", skip_serializing_if = "Option::is_none")]
    pub radar_key: Option<String>,

    /// ISO2 location code for the Radar timeseries
    #[serde(default = "default_location")]
    pub location: String,

    /// ISO3 fallback tried once when the primary location yields no series
    #[serde(default = "default_location_fallback")]
    pub location_fallback: String,

    /// An ASN is "connected" when seen within this window
    #[serde(with = "duration_string", default = "default_connected_window")]
    pub connected_window: Duration,

    /// Per-attempt DNS probe deadline; values below 8s are raised to 8s
    #[serde(with = "duration_string", default = "default_probe_timeout")]
    pub probe_timeout: Duration,

    /// Keep an alive resolver entry alive when a later round fails only
    /// that key (the reference behavior). Disable to let every round
    /// overwrite unconditionally after address reconciliation.
    #[serde(default = "default_true")]
    pub sticky_dns_alive: bool,

    /// Attempt the per-ASN traffic endpoints (no stable upstream contract)
    #[serde(default = "default_true")]
    pub asn_traffic_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat_token: None,
            chat_channel: None,
            interval: default_interval(),
            ris_live_url: default_ris_url(),
            dns_servers: curation::default_dns_servers(),
            asns: curation::default_asns(),
            radar_token: None,
            radar_email: None,
            radar_key: None,
            location: default_location(),
            location_fallback: default_location_fallback(),
            connected_window: default_connected_window(),
            probe_timeout: default_probe_timeout(),
            sticky_dns_alive: true,
            asn_traffic_enabled: true,
        }
    }
}

impl Config {
    /// Load from a JSON file, falling back to defaults when absent, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<Self>(&content)?
        } else {
            Self::default()
        };

        // Empty lists in an explicit file still mean "use curation".
        if config.dns_servers.is_empty() {
            config.dns_servers = curation::default_dns_servers();
        }
        if config.asns.is_empty() {
            config.asns = curation::default_asns();
        }

        config.apply_env_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Persist to a JSON file (pretty-printed).
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides through an injected lookup.
    pub fn apply_env_from(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("NETWATCH_CHAT_TOKEN") {
            self.chat_token = Some(v);
        }
        if let Some(v) = get("NETWATCH_CHAT_CHANNEL") {
            self.chat_channel = Some(v);
        }
        if let Some(v) = get("NETWATCH_RADAR_TOKEN") {
            self.radar_token = Some(v);
        }
        if let Some(v) = get("NETWATCH_RADAR_EMAIL") {
            self.radar_email = Some(v);
        }
        if let Some(v) = get("NETWATCH_RADAR_KEY") {
            self.radar_key = Some(v);
        }
        if let Some(v) = get("NETWATCH_RIS_URL") {
            self.ris_live_url = v;
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.interval < Duration::from_secs(1) {
            return Err(CoreError::Config(format!(
                "interval {:?} is below the 1s floor",
                self.interval
            )));
        }
        if self.ris_live_url.is_empty() {
            return Err(CoreError::Config("ris_live_url is empty".into()));
        }
        Ok(())
    }

    /// Effective per-attempt probe deadline (8s floor).
    #[must_use]
    pub fn effective_probe_timeout(&self) -> Duration {
        self.probe_timeout.max(Duration::from_secs(8))
    }
}

const fn default_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

const fn default_connected_window() -> Duration {
    Duration::from_secs(30 * 60)
}

const fn default_probe_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_ris_url() -> String {
    String::from(DEFAULT_RIS_URL)
}

fn default_location() -> String {
    String::from("IR")
}

fn default_location_fallback() -> String {
    String::from("IRN")
}

const fn default_true() -> bool {
    true
}

/// Parse a Go-style duration string: one or more `<number><unit>` groups
/// with units `ns`, `us`, `ms`, `s`, `m`, `h`.
pub fn parse_duration(s: &str) -> crate::Result<Duration> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidDuration(s.to_string()));
    }

    let mut total = 0.0f64;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| CoreError::InvalidDuration(s.to_string()))?;
        if digits_end == 0 {
            return Err(CoreError::InvalidDuration(s.to_string()));
        }
        let value: f64 = rest[..digits_end]
            .parse()
            .map_err(|_| CoreError::InvalidDuration(s.to_string()))?;
        rest = &rest[digits_end..];

        let (unit_secs, unit_len) = if rest.starts_with("ns") {
            (1e-9, 2)
        } else if rest.starts_with("us") {
            (1e-6, 2)
        } else if rest.starts_with("ms") {
            (1e-3, 2)
        } else if rest.starts_with('s') {
            (1.0, 1)
        } else if rest.starts_with('m') {
            (60.0, 1)
        } else if rest.starts_with('h') {
            (3600.0, 1)
        } else {
            return Err(CoreError::InvalidDuration(s.to_string()));
        };
        total += value * unit_secs;
        rest = &rest[unit_len..];
    }

    if !total.is_finite() || total < 0.0 {
        return Err(CoreError::InvalidDuration(s.to_string()));
    }
    Ok(Duration::from_secs_f64(total))
}

/// Format a duration compactly in `h`/`m`/`s`/`ms` groups.
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms == 0 {
        return String::from("0s");
    }

    let mut out = String::new();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    out
}

/// Serde adapter for `Duration` as a Go-style string.
mod duration_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&super::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(de)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
