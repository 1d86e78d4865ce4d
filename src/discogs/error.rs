use thiserror::Error;

/// Errors surfaced by the request gate and the catalog client.
#[derive(Debug, Error)]
pub enum DiscogsError {
    /// Non-success HTTP status, after any retries were exhausted.
    #[error("Discogs API error (status {status}, rate limit remaining {rate_limit_remaining})")]
    Http {
        status: u16,
        rate_limit_remaining: u32,
    },

    /// The request never produced a response (connection refused, timeout...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl DiscogsError {
    pub fn status(&self) -> Option<u16> {
        match self {
            DiscogsError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failure to obtain any HTTP response at all.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}
