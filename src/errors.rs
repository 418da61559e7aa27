use thiserror::Error;

/// Errors that escape a monitoring component.
///
/// Probe, channel and source failures never show up here: they are folded
/// into status fields at the point where they happen.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Invalid or missing configuration detected at startup or on `run()`
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Persisted collection could not be read or written
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
    /// Anything that should never happen in a well-formed deployment
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised by a [`crate::store::PersistenceStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record in {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Malformed {
            path: path.into(),
            source,
        }
    }
}

/// Failure of one probe call. Converted into a `down` check result.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timeout after {0} ms")]
    Timeout(u64),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("probe task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Connection(format!("request timeout: {}", err))
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Failure of one metric source. The category is left empty for the cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("timeout after {0} ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidPayload(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

/// Delivery failure of one alert channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Provider answered with a non-success status
    #[error("HTTP error: {0}")]
    Http(String),
    /// Provider unreachable or timed out
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// Provider rejected our credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Nobody to deliver to
    #[error("no recipients: {0}")]
    NoRecipients(String),
    /// Message body could not be rendered
    #[error("template error: {0}")]
    Template(String),
}

impl From<reqwest::Error> for ChannelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unavailable(format!("request timeout: {}", err))
        } else if err.is_connect() {
            Self::Unavailable(format!("connection failed: {}", err))
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl ChannelError {
    /// Map a provider status code onto a channel error.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Unauthorized(format!("{}: {}", status, body)),
            502..=504 => Self::Unavailable(format!("{}: {}", status, body)),
            _ => Self::Http(format!("{}: {}", status, body)),
        }
    }
}
