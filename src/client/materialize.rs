//! Conversion of validated response bodies into typed results.

use feed_rs::model::Feed;

use super::WorldCatError;
use crate::models::{
    records_from_document, LibraryResult, Record, ResponseShape, SruResult, XmlDocument,
};

/// Parse an Atom or RSS feed
pub fn feed(body: &str) -> Result<Feed, WorldCatError> {
    feed_rs::parser::parse(body.as_bytes())
        .map_err(|e| WorldCatError::Decode(format!("Failed to parse feed: {}", e)))
}

/// SRU response: MARC records when MARC XML was requested, otherwise the raw document
pub fn sru(body: &str, marc: bool) -> Result<SruResult, WorldCatError> {
    let doc = XmlDocument::parse(body)?;
    if marc {
        Ok(SruResult::Records(records_from_document(&doc)?))
    } else {
        Ok(SruResult::Document(doc))
    }
}

/// Holdings or catalog URL response, XML or JSON depending on the requested format
pub fn library(body: &str, shape: ResponseShape) -> Result<LibraryResult, WorldCatError> {
    match shape {
        ResponseShape::Json => serde_json::from_str(body)
            .map(LibraryResult::Json)
            .map_err(|e| WorldCatError::Decode(format!("JSON: {}", e))),
        ResponseShape::Xml | ResponseShape::PlainText => {
            XmlDocument::parse(body).map(LibraryResult::Xml)
        }
    }
}

/// The one record of a single-record lookup
pub fn single_record(body: &str) -> Result<Record, WorldCatError> {
    let doc = XmlDocument::parse(body)?;
    records_from_document(&doc)?
        .into_iter()
        .next()
        .ok_or_else(|| WorldCatError::Decode("response contains no MARC record".to_string()))
}
