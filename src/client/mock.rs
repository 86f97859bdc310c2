//! Mock transport for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{Transport, TransportError};

/// A transport that returns a predefined response and records requested URLs.
#[derive(Debug, Default)]
pub struct MockTransport {
    response: Mutex<Option<Result<String, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create a mock that answers every request with an empty body
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers with `body`
    pub fn with_body(body: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.set_body(body);
        mock
    }

    /// Set the body to return.
    pub fn set_body(&self, body: impl Into<String>) {
        let mut guard = self.response.lock().unwrap();
        *guard = Some(Ok(body.into()));
    }

    /// Set the error to return.
    pub fn set_error(&self, error: TransportError) {
        let mut guard = self.response.lock().unwrap();
        *guard = Some(Err(error));
    }

    /// URLs requested so far, oldest first
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, _timeout: Option<Duration>) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        let guard = self.response.lock().unwrap();
        match &*guard {
            Some(response) => response.clone(),
            None => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_requests() {
        let mock = MockTransport::with_body("<ok/>");
        let body = tokio_test::block_on(mock.get("http://h/a?wskey=k", None)).unwrap();

        assert_eq!(body, "<ok/>");
        assert_eq!(mock.requests(), vec!["http://h/a?wskey=k".to_string()]);
    }

    #[test]
    fn test_mock_returns_error() {
        let mock = MockTransport::new();
        mock.set_error(TransportError::with_status(500, "500 boom"));

        let err = tokio_test::block_on(mock.get("http://h/b", None)).unwrap_err();
        assert_eq!(err.status, Some(500));
    }
}
