//! WorldCat Search API client.
//!
//! Every operation follows the same pipeline:
//!
//! 1. the option bag is normalized (aliases folded into canonical keys) and,
//!    for SRU searches, the CQL query is compiled;
//! 2. the API key is merged in and the request URL is built;
//! 3. the [`Transport`] fetches the body;
//! 4. the body is checked for an embedded service diagnostic;
//! 5. the body is decoded into the operation's result type.
//!
//! Each call returns a [`Response`] holding both the decoded value and the
//! [`Transcript`] (request URL and raw body), so the client itself carries no
//! per-call state.

pub mod diagnostics;
mod materialize;
pub mod mock;
mod transport;

pub use diagnostics::Diagnostic;
pub use mock::MockTransport;
pub use transport::{Transport, TransportError};

use feed_rs::model::Feed;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::cql::CqlError;
use crate::models::{
    CatalogUrlOptions, CitationOptions, LibraryLocationsOptions, LibraryResult, OpenSearchOptions,
    OperationOptions, Record, Response, SingleRecordOptions, SruResult, SruSearchOptions,
    Transcript,
};
use crate::utils::HttpClient;

/// Base URL of the WorldCat Search API
pub const DEFAULT_BASE_URL: &str = "http://www.worldcat.org/webservices/catalog/";

/// Errors raised by client operations
#[derive(Debug, thiserror::Error)]
pub enum WorldCatError {
    /// No API key, or the key was rejected by the service
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Network or HTTP error other than an authentication failure
    #[error("Transport error: {0}")]
    TransportFailure(String),

    /// The service reported a diagnostic; `message` is the service's text verbatim
    #[error("{message}")]
    ServiceDiagnostic {
        details: Option<String>,
        message: String,
    },

    /// The CQL query could not be compiled; no request was sent
    #[error("Query syntax error: {0}")]
    QuerySyntax(#[from] CqlError),

    /// The response could not be decoded in the expected format
    #[error("Decode error: {0}")]
    Decode(String),

    /// The option bag was rejected before any request was sent
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Client for the WorldCat Search API
#[derive(Debug, Clone)]
pub struct WorldCatClient {
    api_key: Option<String>,
    base_url: String,
    timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
}

impl WorldCatClient {
    /// Create a client using the default HTTP transport
    pub fn new(api_key: Option<String>) -> Result<Self, WorldCatError> {
        let http = HttpClient::new()?;
        Ok(Self::with_transport(api_key, Arc::new(http)))
    }

    /// Create with a custom transport (for testing)
    pub fn with_transport(api_key: Option<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            transport,
        }
    }

    /// Create from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, WorldCatError> {
        let client = Self::new(config.api.key.clone())?
            .with_base_url(config.api.base_url.clone())
            .with_timeout(Duration::from_secs(config.api.timeout_secs));
        Ok(client)
    }

    /// Point the client at a different service root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Deadline passed to the transport for every request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the stored API key
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Keyword search; returns the parsed Atom/RSS feed
    pub async fn open_search(
        &self,
        options: &OpenSearchOptions,
    ) -> Result<Response<Feed>, WorldCatError> {
        let transcript = self.execute(options).await?;
        let feed = materialize::feed(&transcript.body)?;
        Ok(Response::new(feed, transcript))
    }

    /// CQL search; MARC records by default, a generic document for other schemas
    pub async fn sru_search(
        &self,
        options: &SruSearchOptions,
    ) -> Result<Response<SruResult>, WorldCatError> {
        let transcript = self.execute(options).await?;
        let result = materialize::sru(&transcript.body, options.wants_marc())?;
        Ok(Response::new(result, transcript))
    }

    /// Libraries holding a record
    pub async fn library_locations(
        &self,
        options: &LibraryLocationsOptions,
    ) -> Result<Response<LibraryResult>, WorldCatError> {
        let transcript = self.execute(options).await?;
        let result = materialize::library(&transcript.body, options.shape())?;
        Ok(Response::new(result, transcript))
    }

    /// One bibliographic record
    pub async fn single_record(
        &self,
        options: &SingleRecordOptions,
    ) -> Result<Response<Record>, WorldCatError> {
        let transcript = self.execute(options).await?;
        let record = materialize::single_record(&transcript.body)?;
        Ok(Response::new(record, transcript))
    }

    /// Catalog URLs of the given libraries for a record
    pub async fn library_catalog_url(
        &self,
        options: &CatalogUrlOptions,
    ) -> Result<Response<LibraryResult>, WorldCatError> {
        let transcript = self.execute(options).await?;
        let result = materialize::library(&transcript.body, options.shape())?;
        Ok(Response::new(result, transcript))
    }

    /// Formatted citation, returned verbatim (HTML)
    pub async fn formatted_citations(
        &self,
        options: &CitationOptions,
    ) -> Result<Response<String>, WorldCatError> {
        let transcript = self.execute(options).await?;
        let citation = transcript.body.clone();
        Ok(Response::new(citation, transcript))
    }

    /// Build, issue and validate one request
    async fn execute<O: OperationOptions>(&self, options: &O) -> Result<Transcript, WorldCatError> {
        let request = options.to_request()?;

        let api_key = options
            .api_key()
            .or(self.api_key.as_deref())
            .ok_or_else(|| {
                WorldCatError::AuthenticationFailure("no API key configured".to_string())
            })?;

        let url = request.with_api_key(api_key).to_url(&self.base_url);
        tracing::debug!("GET {}", redact_key(&url));

        let body = self.transport.get(&url, self.timeout).await?;
        tracing::trace!("Received {} bytes", body.len());

        diagnostics::inspect(&body, options.shape())?;

        Ok(Transcript { url, body })
    }
}

/// Hide the `wskey` value when logging a URL
fn redact_key(url: &str) -> String {
    match url.find("wskey=") {
        Some(start) => {
            let value_start = start + "wskey=".len();
            let value_end = url[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[value_end..])
        }
        None => url.to_string(),
    }
}
