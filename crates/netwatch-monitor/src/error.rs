use thiserror::Error;

/// Errors raised by the monitoring engine.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// WebSocket dial or stream failure
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The WebSocket handshake did not complete in time
    #[error("websocket handshake timed out after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// A subscribe frame could not be encoded
    #[error("subscribe frame encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A chat or chart adapter failed
    #[error("adapter error: {0}")]
    Adapter(String),

    /// Startup could not complete
    #[error("boot error: {0}")]
    Boot(String),
}
