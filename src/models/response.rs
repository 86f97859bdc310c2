//! Operation results.

use serde::Serialize;

use super::document::XmlDocument;
use mrrc::Record;

/// The exact request URL and raw body of one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    /// Escaped request URL, API key included
    pub url: String,
    /// Response body as received
    pub body: String,
}

/// Decoded value together with the transcript that produced it
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub value: T,
    pub transcript: Transcript,
}

impl<T> Response<T> {
    pub fn new(value: T, transcript: Transcript) -> Self {
        Self { value, transcript }
    }
}

/// Result of an SRU search
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum SruResult {
    /// MARC XML records, in response order
    Records(Vec<Record>),
    /// Any other record schema (e.g. Dublin Core)
    Document(XmlDocument),
}

impl SruResult {
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            SruResult::Records(records) => Some(records),
            SruResult::Document(_) => None,
        }
    }

    pub fn document(&self) -> Option<&XmlDocument> {
        match self {
            SruResult::Document(doc) => Some(doc),
            SruResult::Records(_) => None,
        }
    }
}

/// Result of a holdings or catalog URL lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum LibraryResult {
    Xml(XmlDocument),
    Json(serde_json::Map<String, serde_json::Value>),
}

impl LibraryResult {
    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match self {
            LibraryResult::Xml(doc) => Some(doc),
            LibraryResult::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        match self {
            LibraryResult::Json(map) => Some(map),
            LibraryResult::Xml(_) => None,
        }
    }
}
