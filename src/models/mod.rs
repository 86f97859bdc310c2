//! Core data models: option bags, canonical requests, and decoded results.

mod document;
mod options;
mod params;
mod record;
mod response;

pub use document::{XmlDocument, XmlElement};
pub use options::{
    CatalogUrlOptions, CitationOptions, LibraryLocationsOptions, LibraryType, OpenSearchOptions,
    OperationOptions, ResponseShape, SingleRecordOptions, SruSearchOptions, DUBLIN_CORE_SCHEMA,
    MARCXML_SCHEMA,
};
pub use params::{camelize, CanonicalRequest, ParamValue, RecordId, Scalar};
pub use mrrc::{Field, Leader, Record, RecordHelpers, Subfield};
pub use record::{marc_record, records_from_document};
pub use response::{LibraryResult, Response, SruResult, Transcript};
