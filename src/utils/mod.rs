//! Utility modules.
//!
//! - [`HttpClient`]: reqwest-backed [`Transport`](crate::client::Transport) used by
//!   [`WorldCatClient::new`](crate::client::WorldCatClient::new)

mod http;

pub use http::HttpClient;
