//! Adapter seams for the external collaborators.
//!
//! The chat transport and the chart renderer are deployment concerns;
//! the engine only depends on these traits. The transport owns message
//! chunking (texts over 4096 characters) — the core never splits.

use crate::Result;
use async_trait::async_trait;
use netwatch_core::types::{AsnTraffic, TrafficSample};
use std::fmt;

/// Destination for outbound messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    /// Numeric chat identifier
    Chat(i64),
    /// Channel handle, normalized to `@name`
    Channel(String),
}

impl ChatTarget {
    /// Normalize a configured channel reference: `t.me/x` and bare
    /// names become `@x`; a leading `-` means a numeric chat id.
    #[must_use]
    pub fn channel(handle: &str) -> Self {
        let handle = handle.trim();
        if let Some(rest) = handle.strip_prefix("t.me/") {
            return Self::Channel(format!("@{rest}"));
        }
        if handle.starts_with('-') {
            if let Ok(id) = handle.parse::<i64>() {
                return Self::Chat(id);
            }
        }
        if handle.starts_with('@') {
            Self::Channel(handle.to_string())
        } else {
            Self::Channel(format!("@{handle}"))
        }
    }
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat(id) => write!(f, "{id}"),
            Self::Channel(handle) => f.write_str(handle),
        }
    }
}

/// Outbound chat transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, target: &ChatTarget, text: &str) -> Result<()>;

    async fn send_photo(&self, target: &ChatTarget, png: &[u8], caption: &str) -> Result<()>;
}

/// Chart rendering: pure functions from a sample to PNG bytes.
///
/// `None` means "no chart available" and the publication simply omits
/// the photo.
pub trait ChartRenderer: Send + Sync {
    fn render_traffic(&self, sample: &TrafficSample) -> Option<Vec<u8>>;

    fn render_asn_traffic(&self, entries: &[AsnTraffic]) -> Option<Vec<u8>>;
}

/// Renderer for deployments without chart support.
pub struct NoopRenderer;

impl ChartRenderer for NoopRenderer {
    fn render_traffic(&self, _sample: &TrafficSample) -> Option<Vec<u8>> {
        None
    }

    fn render_asn_traffic(&self, _entries: &[AsnTraffic]) -> Option<Vec<u8>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_handle_normalization() {
        assert_eq!(
            ChatTarget::channel("t.me/watchers"),
            ChatTarget::Channel(String::from("@watchers"))
        );
        assert_eq!(
            ChatTarget::channel("@watchers"),
            ChatTarget::Channel(String::from("@watchers"))
        );
        assert_eq!(
            ChatTarget::channel("watchers"),
            ChatTarget::Channel(String::from("@watchers"))
        );
        assert_eq!(
            ChatTarget::channel("-1001234567890"),
            ChatTarget::Chat(-1_001_234_567_890)
        );
    }
}
