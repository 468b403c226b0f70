use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reading or writing the config file failed
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A duration string could not be parsed
    #[error("invalid duration {0:?}: expected Go-style duration such as \"5m\" or \"90s\"")]
    InvalidDuration(String),

    /// A config value is out of range or inconsistent
    #[error("configuration error: {0}")]
    Config(String),
}
