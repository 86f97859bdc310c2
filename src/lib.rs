//! # WorldCat Search
//!
//! Client for the WorldCat Search API: keyword (OpenSearch) and CQL (SRU)
//! searches, library holdings, single bibliographic records, library catalog
//! URLs and formatted citations.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`client`]: [`WorldCatClient`], the transport boundary and diagnostic detection
//! - [`cql`]: CQL query parser and canonical compiler
//! - [`models`]: Option bags, canonical requests, MARC records and results
//! - [`utils`]: HTTP transport
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```rust,no_run
//! use worldcat_search::{RecordHelpers, SruSearchOptions, WorldCatClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WorldCatClient::new(Some("my-wskey".to_string()))?;
//! let response = client
//!     .sru_search(&SruSearchOptions::new("srw.ti = \"civil war\"").maximum_records(5))
//!     .await?;
//!
//! for record in response.value.records().unwrap_or_default() {
//!     println!("{}", record.title().unwrap_or("(untitled)"));
//! }
//! println!("requested {}", response.transcript.url);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod cql;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use client::{WorldCatClient, WorldCatError};
pub use models::{
    CatalogUrlOptions, CitationOptions, LibraryLocationsOptions, LibraryResult, OpenSearchOptions,
    Record, RecordHelpers, Response, SingleRecordOptions, SruResult, SruSearchOptions, Transcript,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
