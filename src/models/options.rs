//! Per-operation option bags.
//!
//! Every operation takes its own options struct. Each struct carries an
//! explicit field for every canonical parameter *and* for every alias the
//! operation accepts, so a loosely typed bag such as
//! `{"query": "Civil War", "max": 5}` can be deserialized without losing
//! information. Unknown keys are rejected.
//!
//! [`OperationOptions::normalize`] folds aliases into their canonical fields.
//! When both an alias and its canonical key are present the alias wins; the
//! values are never merged.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::str::FromStr;

use super::params::{CanonicalRequest, ParamValue, RecordId};
use crate::client::WorldCatError;
use crate::cql;

/// Record schema URI for MARC XML
pub const MARCXML_SCHEMA: &str = "info:srw/schema/1/marcxml";
/// Record schema URI for Dublin Core
pub const DUBLIN_CORE_SCHEMA: &str = "info:srw/schema/1/dc";

/// Payload shape a response is expected to have, chosen from the operation
/// and requested format. Selects which diagnostic detector runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Xml,
    Json,
    PlainText,
}

/// Common behaviour of every operation's option bag
pub trait OperationOptions: DeserializeOwned + Clone {
    /// Fold aliases into canonical fields. Pure and idempotent.
    fn normalize(self) -> Self;

    /// Build the canonical request (sub-path and ordered parameters), without the API key
    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError>;

    /// Per-call API key override
    fn api_key(&self) -> Option<&str>;

    /// Shape of the response body this request will produce
    fn shape(&self) -> ResponseShape;

    /// Deserialize an option bag from a loosely typed JSON object
    fn from_bag(bag: serde_json::Value) -> Result<Self, WorldCatError> {
        serde_json::from_value(bag).map_err(|e| WorldCatError::InvalidOptions(e.to_string()))
    }
}

fn fold<T>(canonical: &mut Option<T>, alias: Option<T>) {
    if let Some(value) = alias {
        *canonical = Some(value);
    }
}

/// Map the `format` alias onto a record schema URI
fn schema_alias(format: &str) -> String {
    if format.contains("marc") {
        MARCXML_SCHEMA.to_string()
    } else if format.contains("dublin") {
        DUBLIN_CORE_SCHEMA.to_string()
    } else {
        format.to_string()
    }
}

/// Whether a (normalized) record schema selects MARC XML; none means the service default, MARC XML
fn is_marc_schema(schema: Option<&str>) -> bool {
    match schema {
        None => true,
        Some(schema) => schema == MARCXML_SCHEMA || schema.contains("marc"),
    }
}

/// Text fields that callers commonly give as JSON numbers (OCLC numbers,
/// ISBNs, postal codes) are accepted in either form.
fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Unsigned(n) => n.to_string(),
        Raw::Signed(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
    }))
}

fn json_shape(format: Option<&str>) -> ResponseShape {
    match format {
        Some(f) if f.eq_ignore_ascii_case("json") => ResponseShape::Json,
        _ => ResponseShape::Xml,
    }
}

/// Library type filter for location lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    Academic,
    Public,
    Government,
    Other,
}

impl LibraryType {
    /// Numeric code expected by the service
    pub fn code(self) -> u32 {
        match self {
            LibraryType::Academic => 1,
            LibraryType::Public => 2,
            LibraryType::Government => 3,
            LibraryType::Other => 4,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(LibraryType::Academic),
            2 => Some(LibraryType::Public),
            3 => Some(LibraryType::Government),
            4 => Some(LibraryType::Other),
            _ => None,
        }
    }
}

impl FromStr for LibraryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Ok(code) = s.parse::<u32>() {
            return Self::from_code(code).ok_or_else(|| format!("unknown library type code {}", code));
        }
        match s.as_str() {
            "academic" => Ok(LibraryType::Academic),
            "public" => Ok(LibraryType::Public),
            "government" => Ok(LibraryType::Government),
            "other" => Ok(LibraryType::Other),
            _ => Err(format!("unknown library type '{}'", s)),
        }
    }
}

impl<'de> Deserialize<'de> for LibraryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u32),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => LibraryType::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown library type code {}", code))),
            Raw::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

// ===== OpenSearch =====

/// Keyword search returning an Atom or RSS feed.
///
/// Aliases: `query` → `q`, `max` → `count`, `citation_format` → `cformat`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenSearchOptions {
    #[serde(default, deserialize_with = "string_or_number")]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub query: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub start: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default)]
    pub cformat: Option<String>,
    #[serde(default)]
    pub citation_format: Option<String>,
    #[serde(default, alias = "service_level")]
    pub servicelevel: Option<String>,
    #[serde(default, alias = "frbrGrouping")]
    pub frbr_grouping: Option<String>,
    #[serde(default)]
    pub wskey: Option<String>,
}

impl OpenSearchOptions {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    /// Feed format, `atom` (default) or `rss`
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Citation format embedded in each entry (e.g. `mla`, `apa`)
    pub fn cformat(mut self, cformat: impl Into<String>) -> Self {
        self.cformat = Some(cformat.into());
        self
    }

    pub fn wskey(mut self, key: impl Into<String>) -> Self {
        self.wskey = Some(key.into());
        self
    }
}

impl OperationOptions for OpenSearchOptions {
    fn normalize(mut self) -> Self {
        fold(&mut self.q, self.query.take());
        fold(&mut self.count, self.max.take());
        fold(&mut self.cformat, self.citation_format.take());
        self
    }

    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError> {
        let opts = self.clone().normalize();
        Ok(CanonicalRequest::new("search/opensearch")
            .param("q", opts.q)
            .param("format", opts.format)
            .param("start", opts.start)
            .param("count", opts.count)
            .param("cformat", opts.cformat)
            .param("servicelevel", opts.servicelevel)
            .param("frbr_grouping", opts.frbr_grouping))
    }

    fn api_key(&self) -> Option<&str> {
        self.wskey.as_deref()
    }

    fn shape(&self) -> ResponseShape {
        ResponseShape::Xml
    }
}

// ===== SRU =====

/// Structured (CQL) search.
///
/// Aliases: `q` → `query`, `count`/`max` → `maximum_records` (`max` applied
/// last), `citation_format` → `cformat`, `start` → `start_record`, and
/// `format` → `record_schema` where a value containing `marc` or `dublin`
/// is mapped to the matching schema URI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SruSearchOptions {
    #[serde(default, deserialize_with = "string_or_number")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub q: Option<String>,
    #[serde(default, alias = "recordSchema")]
    pub record_schema: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "startRecord")]
    pub start_record: Option<u32>,
    #[serde(default)]
    pub start: Option<u32>,
    #[serde(default, alias = "maximumRecords")]
    pub maximum_records: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default, alias = "sortKeys")]
    pub sort_keys: Option<String>,
    #[serde(default, alias = "service_level")]
    pub servicelevel: Option<String>,
    #[serde(default, alias = "frbrGrouping")]
    pub frbr_grouping: Option<String>,
    #[serde(default)]
    pub cformat: Option<String>,
    #[serde(default)]
    pub citation_format: Option<String>,
    #[serde(default)]
    pub wskey: Option<String>,
}

impl SruSearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Schema alias (`marc`, `dublincore`) or exact schema URI
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn start_record(mut self, start: u32) -> Self {
        self.start_record = Some(start);
        self
    }

    pub fn maximum_records(mut self, max: u32) -> Self {
        self.maximum_records = Some(max);
        self
    }

    pub fn sort_keys(mut self, keys: impl Into<String>) -> Self {
        self.sort_keys = Some(keys.into());
        self
    }

    pub fn wskey(mut self, key: impl Into<String>) -> Self {
        self.wskey = Some(key.into());
        self
    }

    /// Whether the response will carry MARC XML records.
    ///
    /// The service answers in MARC XML when no schema is requested.
    pub fn wants_marc(&self) -> bool {
        is_marc_schema(self.clone().normalize().record_schema.as_deref())
    }
}

impl OperationOptions for SruSearchOptions {
    fn normalize(mut self) -> Self {
        fold(&mut self.query, self.q.take());
        fold(&mut self.maximum_records, self.count.take());
        fold(&mut self.maximum_records, self.max.take());
        fold(&mut self.cformat, self.citation_format.take());
        fold(&mut self.start_record, self.start.take());
        if let Some(format) = self.format.take() {
            self.record_schema = Some(schema_alias(&format));
        }
        self
    }

    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError> {
        let opts = self.clone().normalize();
        let query = opts.query.as_deref().map(cql::compile).transpose()?;
        Ok(CanonicalRequest::new("search/sru")
            .param("query", query)
            .param("record_schema", opts.record_schema)
            .param("start_record", opts.start_record)
            .param("maximum_records", opts.maximum_records)
            .param("sort_keys", opts.sort_keys)
            .param("servicelevel", opts.servicelevel)
            .param("frbr_grouping", opts.frbr_grouping)
            .param("cformat", opts.cformat))
    }

    fn api_key(&self) -> Option<&str> {
        self.wskey.as_deref()
    }

    fn shape(&self) -> ResponseShape {
        ResponseShape::Xml
    }
}

// ===== Library locations =====

/// Holdings lookup: libraries that own a record, optionally near a location.
///
/// Aliases: `start` → `start_library`, `count`/`max` → `maximum_libraries`,
/// `lib_type` → `libtype`. Library types may be given as text
/// (`academic`, `public`, `government`, `other`) or as their numeric code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryLocationsOptions {
    #[serde(default, alias = "oclcnumber", deserialize_with = "string_or_number")]
    pub oclc_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub location: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default, alias = "startLibrary")]
    pub start_library: Option<u32>,
    #[serde(default)]
    pub start: Option<u32>,
    #[serde(default, alias = "maximumLibraries")]
    pub maximum_libraries: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub max: Option<u32>,
    #[serde(default)]
    pub libtype: Option<LibraryType>,
    #[serde(default, alias = "library_type")]
    pub lib_type: Option<LibraryType>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "service_level")]
    pub servicelevel: Option<String>,
    #[serde(default, alias = "frbrGrouping")]
    pub frbr_grouping: Option<String>,
    #[serde(default)]
    pub wskey: Option<String>,
}

impl LibraryLocationsOptions {
    pub fn oclc(number: impl Into<String>) -> Self {
        Self {
            oclc_number: Some(number.into()),
            ..Default::default()
        }
    }

    pub fn isbn(isbn: impl Into<String>) -> Self {
        Self {
            isbn: Some(isbn.into()),
            ..Default::default()
        }
    }

    /// Postal code, city or country used to sort libraries by distance
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn library_type(mut self, libtype: LibraryType) -> Self {
        self.libtype = Some(libtype);
        self
    }

    pub fn maximum_libraries(mut self, max: u32) -> Self {
        self.maximum_libraries = Some(max);
        self
    }

    /// Response format; `json` switches the response to a JSON mapping
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn wskey(mut self, key: impl Into<String>) -> Self {
        self.wskey = Some(key.into());
        self
    }
}

impl OperationOptions for LibraryLocationsOptions {
    fn normalize(mut self) -> Self {
        fold(&mut self.start_library, self.start.take());
        fold(&mut self.maximum_libraries, self.count.take());
        fold(&mut self.maximum_libraries, self.max.take());
        fold(&mut self.libtype, self.lib_type.take());
        self
    }

    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError> {
        let opts = self.clone().normalize();
        let id = RecordId::exactly_one(vec![
            opts.oclc_number.map(RecordId::Oclc),
            opts.isbn.map(RecordId::Isbn),
        ])?;
        Ok(CanonicalRequest::new("content/libraries")
            .record_id(&id)
            .param("location", opts.location)
            .param("lat", opts.lat.map(ParamValue::Float))
            .param("lon", opts.lon.map(ParamValue::Float))
            .param("start_library", opts.start_library)
            .param("maximum_libraries", opts.maximum_libraries)
            .param("libtype", opts.libtype.map(LibraryType::code))
            .param("format", opts.format)
            .param("servicelevel", opts.servicelevel)
            .param("frbr_grouping", opts.frbr_grouping))
    }

    fn api_key(&self) -> Option<&str> {
        self.wskey.as_deref()
    }

    fn shape(&self) -> ResponseShape {
        json_shape(self.format.as_deref())
    }
}

// ===== Single record =====

/// Fetch one bibliographic record by OCLC number, ISBN, ISSN or standard number.
///
/// Alias: `format` → `record_schema` (same mapping as SRU search). The
/// result is always a MARC record, so only the MARC XML schema may be
/// requested; any other schema is rejected before a request is sent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleRecordOptions {
    #[serde(default, alias = "oclcnumber", deserialize_with = "string_or_number")]
    pub oclc_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub issn: Option<String>,
    #[serde(default, alias = "standard_number", deserialize_with = "string_or_number")]
    pub sn: Option<String>,
    #[serde(default, alias = "recordSchema")]
    pub record_schema: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "service_level")]
    pub servicelevel: Option<String>,
    #[serde(default)]
    pub wskey: Option<String>,
}

impl SingleRecordOptions {
    pub fn oclc(number: impl Into<String>) -> Self {
        Self {
            oclc_number: Some(number.into()),
            ..Default::default()
        }
    }

    pub fn isbn(isbn: impl Into<String>) -> Self {
        Self {
            isbn: Some(isbn.into()),
            ..Default::default()
        }
    }

    pub fn issn(issn: impl Into<String>) -> Self {
        Self {
            issn: Some(issn.into()),
            ..Default::default()
        }
    }

    pub fn wskey(mut self, key: impl Into<String>) -> Self {
        self.wskey = Some(key.into());
        self
    }
}

impl OperationOptions for SingleRecordOptions {
    fn normalize(mut self) -> Self {
        if let Some(format) = self.format.take() {
            self.record_schema = Some(schema_alias(&format));
        }
        self
    }

    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError> {
        let opts = self.clone().normalize();
        let id = RecordId::exactly_one(vec![
            opts.oclc_number.map(RecordId::Oclc),
            opts.isbn.map(RecordId::Isbn),
            opts.issn.map(RecordId::Issn),
            opts.sn.map(RecordId::StandardNumber),
        ])?;
        if !is_marc_schema(opts.record_schema.as_deref()) {
            return Err(WorldCatError::InvalidOptions(format!(
                "single record lookups return MARC records; schema '{}' is not supported",
                opts.record_schema.unwrap_or_default()
            )));
        }
        Ok(CanonicalRequest::new("content")
            .record_id(&id)
            .param("record_schema", opts.record_schema)
            .param("servicelevel", opts.servicelevel))
    }

    fn api_key(&self) -> Option<&str> {
        self.wskey.as_deref()
    }

    fn shape(&self) -> ResponseShape {
        ResponseShape::Xml
    }
}

// ===== Library catalog URL =====

/// Catalog URLs of specific libraries (by OCLC symbol) for a record.
///
/// Aliases: `symbols` / `oclc_symbol` → `oclcsymbol`. Symbols may be a
/// list; they are sent comma-joined in the order given.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogUrlOptions {
    #[serde(default, alias = "oclcnumber", deserialize_with = "string_or_number")]
    pub oclc_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub isbn: Option<String>,
    #[serde(default)]
    pub oclcsymbol: Option<ParamValue>,
    #[serde(default)]
    pub oclc_symbol: Option<ParamValue>,
    #[serde(default)]
    pub symbols: Option<ParamValue>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "service_level")]
    pub servicelevel: Option<String>,
    #[serde(default, alias = "frbrGrouping")]
    pub frbr_grouping: Option<String>,
    #[serde(default)]
    pub wskey: Option<String>,
}

impl CatalogUrlOptions {
    pub fn oclc(number: impl Into<String>) -> Self {
        Self {
            oclc_number: Some(number.into()),
            ..Default::default()
        }
    }

    pub fn isbn(isbn: impl Into<String>) -> Self {
        Self {
            isbn: Some(isbn.into()),
            ..Default::default()
        }
    }

    pub fn symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        self.oclcsymbol = Some(ParamValue::from(symbols));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn wskey(mut self, key: impl Into<String>) -> Self {
        self.wskey = Some(key.into());
        self
    }
}

impl OperationOptions for CatalogUrlOptions {
    fn normalize(mut self) -> Self {
        fold(&mut self.oclcsymbol, self.oclc_symbol.take());
        fold(&mut self.oclcsymbol, self.symbols.take());
        self
    }

    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError> {
        let opts = self.clone().normalize();
        let id = RecordId::exactly_one(vec![
            opts.oclc_number.map(RecordId::Oclc),
            opts.isbn.map(RecordId::Isbn),
        ])?;
        Ok(CanonicalRequest::new("content/libraries")
            .record_id(&id)
            .param("oclcsymbol", opts.oclcsymbol)
            .param("format", opts.format)
            .param("servicelevel", opts.servicelevel)
            .param("frbr_grouping", opts.frbr_grouping))
    }

    fn api_key(&self) -> Option<&str> {
        self.wskey.as_deref()
    }

    fn shape(&self) -> ResponseShape {
        json_shape(self.format.as_deref())
    }
}

// ===== Citations =====

/// Formatted citation (HTML) for one OCLC number.
///
/// Alias: `citation_format` → `cformat`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CitationOptions {
    #[serde(default, alias = "oclcnumber", deserialize_with = "string_or_number")]
    pub oclc_number: Option<String>,
    #[serde(default)]
    pub cformat: Option<String>,
    #[serde(default)]
    pub citation_format: Option<String>,
    #[serde(default)]
    pub wskey: Option<String>,
}

impl CitationOptions {
    pub fn oclc(number: impl Into<String>) -> Self {
        Self {
            oclc_number: Some(number.into()),
            ..Default::default()
        }
    }

    /// Citation style: `apa`, `chicago`, `harvard`, `mla`, `turabian` or `all`
    pub fn cformat(mut self, cformat: impl Into<String>) -> Self {
        self.cformat = Some(cformat.into());
        self
    }

    pub fn wskey(mut self, key: impl Into<String>) -> Self {
        self.wskey = Some(key.into());
        self
    }
}

impl OperationOptions for CitationOptions {
    fn normalize(mut self) -> Self {
        fold(&mut self.cformat, self.citation_format.take());
        self
    }

    fn to_request(&self) -> Result<CanonicalRequest, WorldCatError> {
        let opts = self.clone().normalize();
        let id = RecordId::exactly_one(vec![opts.oclc_number.map(RecordId::Oclc)])?;
        Ok(CanonicalRequest::new("content/citations")
            .record_id(&id)
            .param("cformat", opts.cformat))
    }

    fn api_key(&self) -> Option<&str> {
        self.wskey.as_deref()
    }

    fn shape(&self) -> ResponseShape {
        ResponseShape::PlainText
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_and_canonical_produce_same_request() {
        let aliased = OpenSearchOptions::from_bag(json!({"query": "Civil War", "max": 5})).unwrap();
        let canonical = OpenSearchOptions::from_bag(json!({"q": "Civil War", "count": 5})).unwrap();

        assert_eq!(aliased.to_request().unwrap(), canonical.to_request().unwrap());
    }

    #[test]
    fn test_alias_wins_over_canonical() {
        let opts = OpenSearchOptions::from_bag(json!({"q": "ignored", "query": "Civil War"})).unwrap();
        let req = opts.to_request().unwrap();
        assert_eq!(req.get("q").as_deref(), Some("Civil War"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let opts = SruSearchOptions::from_bag(json!({
            "q": "srw.kw=dogs",
            "format": "marc",
            "start": 3,
            "count": 10,
        }))
        .unwrap();

        let once = opts.normalize();
        let twice = once.clone().normalize();
        assert_eq!(once, twice);
        assert_eq!(once.record_schema.as_deref(), Some(MARCXML_SCHEMA));
        assert_eq!(once.start_record, Some(3));
        assert_eq!(once.maximum_records, Some(10));
        assert!(once.q.is_none());
        assert!(once.format.is_none());
    }

    #[test]
    fn test_sru_max_applied_after_count() {
        let opts = SruSearchOptions::from_bag(json!({"count": 10, "max": 3})).unwrap();
        assert_eq!(opts.normalize().maximum_records, Some(3));
    }

    #[test]
    fn test_sru_schema_aliases() {
        let dc = SruSearchOptions::new("srw.ti=dogs").format("dublincore");
        assert_eq!(dc.clone().normalize().record_schema.as_deref(), Some(DUBLIN_CORE_SCHEMA));
        assert!(!dc.wants_marc());

        let exact = SruSearchOptions::new("srw.ti=dogs").format("info:srw/schema/1/mods");
        assert_eq!(
            exact.normalize().record_schema.as_deref(),
            Some("info:srw/schema/1/mods")
        );

        assert!(SruSearchOptions::new("srw.ti=dogs").wants_marc());
    }

    #[test]
    fn test_sru_camel_case_keys_accepted() {
        let opts = SruSearchOptions::from_bag(json!({
            "query": "srw.kw=dogs",
            "startRecord": 11,
            "maximumRecords": 5,
        }))
        .unwrap();
        let req = opts.to_request().unwrap();
        assert_eq!(req.get("start_record").as_deref(), Some("11"));
        assert_eq!(req.get("maximum_records").as_deref(), Some("5"));
    }

    #[test]
    fn test_sru_query_is_compiled() {
        let req = SruSearchOptions::new("srw.kw=\"civil war\" AND srw.au=hemingway")
            .to_request()
            .unwrap();
        assert_eq!(
            req.get("query").as_deref(),
            Some("srw.kw = \"civil war\" and srw.au = hemingway")
        );
    }

    #[test]
    fn test_sru_query_syntax_error() {
        let err = SruSearchOptions::new("srw.kw = (dogs").to_request().unwrap_err();
        assert!(matches!(err, WorldCatError::QuerySyntax(_)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = OpenSearchOptions::from_bag(json!({"q": "x", "bogus": 1})).unwrap_err();
        assert!(matches!(err, WorldCatError::InvalidOptions(_)));
    }

    #[test]
    fn test_library_type_mapping() {
        for (name, code) in [("academic", 1), ("public", 2), ("government", 3), ("other", 4)] {
            let opts =
                LibraryLocationsOptions::from_bag(json!({"oclc_number": "15550774", "lib_type": name}))
                    .unwrap();
            let req = opts.to_request().unwrap();
            assert_eq!(req.get("libtype"), Some(code.to_string()));
        }

        let numeric =
            LibraryLocationsOptions::from_bag(json!({"oclc_number": "1", "libtype": 2})).unwrap();
        assert_eq!(numeric.libtype, Some(LibraryType::Public));

        assert!(
            LibraryLocationsOptions::from_bag(json!({"oclc_number": "1", "libtype": "museum"}))
                .is_err()
        );
    }

    #[test]
    fn test_library_locations_path_and_params() {
        let opts = LibraryLocationsOptions::from_bag(json!({
            "isbn": "0596000278",
            "location": "Columbus, OH",
            "start": 2,
            "max": 5,
            "format": "json",
        }))
        .unwrap();
        let req = opts.to_request().unwrap();

        assert_eq!(req.path, "content/libraries/isbn/0596000278");
        assert!(!req.params.contains_key("isbn"));
        assert_eq!(req.get("start_library").as_deref(), Some("2"));
        assert_eq!(req.get("maximum_libraries").as_deref(), Some("5"));
        assert_eq!(opts.shape(), ResponseShape::Json);
    }

    #[test]
    fn test_single_record_identifiers() {
        let req = SingleRecordOptions::issn("0028-0836").to_request().unwrap();
        assert_eq!(req.path, "content/issn/0028-0836");

        let both = SingleRecordOptions::from_bag(json!({"oclc_number": "1", "isbn": "2"})).unwrap();
        assert!(matches!(both.to_request(), Err(WorldCatError::InvalidOptions(_))));

        let none = SingleRecordOptions::default();
        assert!(matches!(none.to_request(), Err(WorldCatError::InvalidOptions(_))));
    }

    #[test]
    fn test_single_record_schema_must_be_marc() {
        let marc = SingleRecordOptions::from_bag(json!({"oclc_number": "1030018", "format": "marc"}))
            .unwrap()
            .to_request()
            .unwrap();
        assert_eq!(marc.get("record_schema").as_deref(), Some(MARCXML_SCHEMA));

        for schema in ["dublincore", "info:srw/schema/1/mods"] {
            let opts =
                SingleRecordOptions::from_bag(json!({"oclc_number": "1030018", "format": schema}))
                    .unwrap();
            assert!(matches!(opts.to_request(), Err(WorldCatError::InvalidOptions(_))));
        }

        let dc = SingleRecordOptions::from_bag(json!({
            "isbn": "0684803356",
            "recordSchema": DUBLIN_CORE_SCHEMA,
        }))
        .unwrap();
        assert!(matches!(dc.to_request(), Err(WorldCatError::InvalidOptions(_))));
    }

    #[test]
    fn test_numeric_identifiers_accepted() {
        let record = SingleRecordOptions::from_bag(json!({"oclc_number": 1030018})).unwrap();
        assert_eq!(record.to_request().unwrap().path, "content/1030018");

        let isbn = SingleRecordOptions::from_bag(json!({"isbn": 9780684803357u64})).unwrap();
        assert_eq!(isbn.to_request().unwrap().path, "content/isbn/9780684803357");

        let holdings = LibraryLocationsOptions::from_bag(json!({
            "oclcnumber": 15550774,
            "location": 43210,
        }))
        .unwrap();
        let req = holdings.to_request().unwrap();
        assert_eq!(req.path, "content/libraries/15550774");
        assert_eq!(req.get("location").as_deref(), Some("43210"));

        let citation = CitationOptions::from_bag(json!({"oclc_number": 15550774})).unwrap();
        assert_eq!(citation.oclc_number.as_deref(), Some("15550774"));

        let search = OpenSearchOptions::from_bag(json!({"q": 1984})).unwrap();
        assert_eq!(search.to_request().unwrap().get("q").as_deref(), Some("1984"));

        let absent = SingleRecordOptions::from_bag(json!({"isbn": "0684803356"})).unwrap();
        assert!(absent.oclc_number.is_none());

        assert!(SingleRecordOptions::from_bag(json!({"oclc_number": [1, 2]})).is_err());
    }

    #[test]
    fn test_catalog_symbols_joined() {
        let opts = CatalogUrlOptions::from_bag(json!({
            "oclc_number": "15550774",
            "symbols": ["OSU", "STF"],
        }))
        .unwrap();
        let req = opts.to_request().unwrap();
        assert_eq!(req.get("oclcsymbol").as_deref(), Some("OSU,STF"));
        assert_eq!(
            req.to_url("http://host/"),
            "http://host/content/libraries/15550774?oclcsymbol=OSU%2CSTF"
        );
    }

    #[test]
    fn test_citation_request() {
        let opts =
            CitationOptions::from_bag(json!({"oclc_number": "15550774", "citation_format": "mla"}))
                .unwrap();
        let req = opts.to_request().unwrap();
        assert_eq!(req.path, "content/citations/15550774");
        assert_eq!(req.get("cformat").as_deref(), Some("mla"));
        assert_eq!(opts.shape(), ResponseShape::PlainText);
    }
}
