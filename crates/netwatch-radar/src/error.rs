use thiserror::Error;

/// Errors from the Radar client.
#[derive(Error, Debug)]
pub enum RadarError {
    /// HTTP transport failure (connect, timeout, body read)
    #[error("radar request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-200 response
    #[error("radar API status {code}: {message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Error detail extracted from the response body, if any
        message: String,
    },

    /// 200 response with `success = false`
    #[error("radar API reported failure: {0}")]
    Api(String),

    /// Response parsed but contained no usable series, after the
    /// alternate-location retry
    #[error("no traffic series in radar response")]
    EmptySeries,

    /// Response body was not the expected JSON envelope
    #[error("radar decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
