//! Radar HTTP client with a freshness-bounded cache.

use crate::error::RadarError;
use crate::sample::build_sample;
use crate::series::extract_series;
use crate::Result;
use chrono::Utc;
use netwatch_core::types::{AsnTraffic, TrafficSample};
use netwatch_core::Config;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Radar API base URL.
const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cached samples younger than this are served without a fetch.
const FRESH_TTL: Duration = Duration::from_secs(5 * 60);

/// Background refresh cadence.
const REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Authentication material for the Radar API.
///
/// Bearer tokens are preferred; the email/key pair is the legacy scheme.
#[derive(Debug, Clone)]
pub enum RadarAuth {
    Bearer(String),
    Legacy { email: String, key: String },
    Anonymous,
}

impl RadarAuth {
    /// Pick the strongest scheme the config provides.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        if let Some(token) = config.radar_token.as_deref().filter(|t| !t.is_empty()) {
            return Self::Bearer(token.to_string());
        }
        if let (Some(email), Some(key)) = (config.radar_email.as_deref(), config.radar_key.as_deref())
        {
            if !email.is_empty() && !key.is_empty() {
                return Self::Legacy {
                    email: email.to_string(),
                    key: key.to_string(),
                };
            }
        }
        Self::Anonymous
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Bearer(token) => request.bearer_auth(token),
            Self::Legacy { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
            Self::Anonymous => request,
        }
    }
}

/// Standard Radar response envelope.
#[derive(Debug, Deserialize)]
struct RadarEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

struct CacheEntry {
    sample: TrafficSample,
    fetched: Instant,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: String,
    auth: RadarAuth,
    location: String,
    location_fallback: String,
    cache: RwLock<Option<CacheEntry>>,
}

/// Client for the Radar country-traffic timeseries.
#[derive(Clone)]
pub struct RadarClient {
    inner: Arc<ClientInner>,
}

impl RadarClient {
    /// Create a builder.
    #[must_use]
    pub fn builder(auth: RadarAuth) -> RadarClientBuilder {
        RadarClientBuilder::new(auth)
    }

    /// Build a client from application config.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        RadarClientBuilder::new(RadarAuth::from_config(config))
            .location(&config.location, &config.location_fallback)
            .build()
    }

    /// Fetch a fresh sample from the timeseries endpoint.
    ///
    /// An empty series for the primary location is retried once with the
    /// fallback location before reporting [`RadarError::EmptySeries`].
    /// The cache is only updated on success.
    pub async fn fetch(&self) -> Result<TrafficSample> {
        let sample = match self.fetch_location(&self.inner.location).await {
            Ok(sample) => sample,
            Err(RadarError::EmptySeries) => {
                debug!(
                    fallback = %self.inner.location_fallback,
                    "empty series for primary location, retrying fallback"
                );
                self.fetch_location(&self.inner.location_fallback).await?
            }
            Err(e) => return Err(e),
        };

        *self.inner.cache.write() = Some(CacheEntry {
            sample: sample.clone(),
            fetched: Instant::now(),
        });
        Ok(sample)
    }

    /// Return the cached sample if fresh, otherwise fetch.
    pub async fn get(&self) -> Result<TrafficSample> {
        if let Some(entry) = self.inner.cache.read().as_ref() {
            if entry.fetched.elapsed() < FRESH_TTL {
                return Ok(entry.sample.clone());
            }
        }
        self.fetch().await
    }

    /// The cached sample regardless of freshness, if any.
    #[must_use]
    pub fn cached(&self) -> Option<TrafficSample> {
        self.inner.cache.read().as_ref().map(|e| e.sample.clone())
    }

    /// Background refresh loop.
    ///
    /// Does nothing on entry (the boot sequence performs the eager first
    /// fetch), then refreshes every ten minutes until cancelled. Fetch
    /// errors are logged and dropped; the stale cache remains visible.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
        // A tokio interval fires immediately; consume that tick so the
        // first refresh lands one full period after boot.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = token.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(e) = self.fetch().await {
                        warn!(error = %e, "periodic radar refresh failed");
                    }
                }
            }
        }
    }

    /// Best-effort per-ASN traffic shares; see [`crate::asn_traffic`].
    pub async fn fetch_asn_traffic(&self, monitored: &[String]) -> Result<Vec<AsnTraffic>> {
        crate::asn_traffic::fetch(self, monitored).await
    }

    /// Primary location code for query strings.
    pub(crate) fn location_query(&self) -> &str {
        &self.inner.location
    }

    /// One GET against a Radar path; returns the decoded envelope result.
    pub(crate) async fn get_result(&self, path_and_query: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.inner.base_url, path_and_query);
        debug!(url = %url, "radar GET");

        let request = self.inner.auth.apply(self.inner.http.get(&url));
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<RadarEnvelope>(&body)
                .ok()
                .and_then(|env| env.errors.into_iter().next())
                .map(|e| format!("{} (code {})", e.message, e.code))
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(RadarError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let envelope: RadarEnvelope = serde_json::from_str(&body)?;
        if !envelope.success {
            let detail = envelope
                .errors
                .first()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .unwrap_or_else(|| String::from("no error detail"));
            return Err(RadarError::Api(detail));
        }
        Ok(envelope.result)
    }

    async fn fetch_location(&self, location: &str) -> Result<TrafficSample> {
        let path = format!(
            "/radar/http/timeseries?location={location}&dateRange=7d&aggInterval=1h&format=json"
        );
        let result = self.get_result(&path).await?;

        let mut series = extract_series(&result).ok_or(RadarError::EmptySeries)?;
        // The 7-day range maximizes upstream availability; the published
        // window is the trailing 24 hours.
        series.truncate_to_last(24);

        build_sample(&series, Utc::now()).ok_or(RadarError::EmptySeries)
    }
}

/// Builder for [`RadarClient`].
pub struct RadarClientBuilder {
    auth: RadarAuth,
    base_url: String,
    timeout: Duration,
    location: String,
    location_fallback: String,
}

impl RadarClientBuilder {
    #[must_use]
    pub fn new(auth: RadarAuth) -> Self {
        Self {
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            location: String::from("IR"),
            location_fallback: String::from("IRN"),
        }
    }

    /// Set the base URL (useful for testing).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the primary and fallback location codes.
    #[must_use]
    pub fn location(mut self, primary: &str, fallback: &str) -> Self {
        self.location = primary.to_string();
        self.location_fallback = fallback.to_string();
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> RadarClient {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("netwatch/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client");

        RadarClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.base_url,
                auth: self.auth,
                location: self.location,
                location_fallback: self.location_fallback,
                cache: RwLock::new(None),
            }),
        }
    }
}
