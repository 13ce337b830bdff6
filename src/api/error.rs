use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Network unreachable, connection refused, timeout or a broken body stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status or a body that is not JSON.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON decoded but a consumed field is missing or has the wrong type.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("display error: {0}")]
    Display(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The wake alarm could not be armed.
    #[error("wake alarm error: {0}")]
    Alarm(String),
}

impl Error {
    /// Transport and protocol failures are worth another attempt; the upstream
    /// contract breaking (schema) or the panel failing is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Protocol(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
