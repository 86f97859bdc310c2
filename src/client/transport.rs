//! Transport boundary: issue a GET, return the body.

use async_trait::async_trait;
use std::time::Duration;

use super::WorldCatError;

/// Literal token the service uses when it rejects a request's key
const UNAUTHENTICATED_TOKEN: &str = "unauthenticated";

/// Failure reported by a [`Transport`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Whether the remote service rejected the request as unauthenticated.
    ///
    /// Only a received response counts; a connection failure whose text
    /// happens to mention the token is still a transport failure.
    pub fn is_unauthenticated(&self) -> bool {
        self.status.is_some() && self.message.to_lowercase().contains(UNAUTHENTICATED_TOKEN)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.without_url().to_string(),
        }
    }
}

impl From<TransportError> for WorldCatError {
    fn from(err: TransportError) -> Self {
        if err.is_unauthenticated() {
            WorldCatError::AuthenticationFailure(err.message)
        } else {
            WorldCatError::TransportFailure(err.message)
        }
    }
}

/// Issues GET requests for the client.
///
/// Implementations return the full body of a 2xx response and a
/// [`TransportError`] for anything else; the error message must carry the
/// response text so authentication failures can be recognised.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Fetch `url`, giving up after `timeout` when one is set
    async fn get(&self, url: &str, timeout: Option<Duration>) -> Result<String, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_becomes_auth_failure() {
        let err = TransportError::with_status(407, "407 Unauthenticated Request");
        assert!(err.is_unauthenticated());
        assert!(matches!(
            WorldCatError::from(err),
            WorldCatError::AuthenticationFailure(msg) if msg == "407 Unauthenticated Request"
        ));
    }

    #[test]
    fn test_other_errors_become_transport_failure() {
        let err = TransportError::with_status(500, "500 Internal Server Error");
        assert!(matches!(
            WorldCatError::from(err),
            WorldCatError::TransportFailure(msg) if msg.starts_with("500")
        ));

        let err = TransportError::new("connection refused");
        assert!(matches!(
            WorldCatError::from(err),
            WorldCatError::TransportFailure(_)
        ));
    }

    #[test]
    fn test_token_without_response_is_transport_failure() {
        let err = TransportError::new(
            "error sending request for url (http://host/search?q=unauthenticated)",
        );
        assert!(!err.is_unauthenticated());
        assert!(matches!(
            WorldCatError::from(err),
            WorldCatError::TransportFailure(_)
        ));
    }
}
