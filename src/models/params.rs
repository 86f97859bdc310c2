//! Canonical request parameters and their wire encoding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::WorldCatError;

/// A single parameter value as supplied by the caller.
///
/// Lists are sent as comma-joined scalars, everything else as its string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    List(Vec<Scalar>),
}

/// Element of a list-valued parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(items) => {
                let joined = items
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                f.write_str(&joined)
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Number(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(|v| Scalar::Text(v.to_string())).collect())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values.into_iter().map(Scalar::Text).collect())
    }
}

/// Record identifier that is sent as a path segment rather than a query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordId {
    Oclc(String),
    Isbn(String),
    Issn(String),
    StandardNumber(String),
}

impl RecordId {
    /// Path segment(s) for this identifier, e.g. `isbn/0743273567`
    pub fn path_segment(&self) -> String {
        match self {
            RecordId::Oclc(n) => urlencoding::encode(n).into_owned(),
            RecordId::Isbn(v) => format!("isbn/{}", urlencoding::encode(v)),
            RecordId::Issn(v) => format!("issn/{}", urlencoding::encode(v)),
            RecordId::StandardNumber(v) => format!("sn/{}", urlencoding::encode(v)),
        }
    }

    /// Pick exactly one identifier out of the optional candidates.
    ///
    /// More than one present is rejected; callers must name a single record.
    pub fn exactly_one(candidates: Vec<Option<RecordId>>) -> Result<RecordId, WorldCatError> {
        let mut present = candidates.into_iter().flatten();
        let first = present.next().ok_or_else(|| {
            WorldCatError::InvalidOptions("a record identifier is required".to_string())
        })?;
        if present.next().is_some() {
            return Err(WorldCatError::InvalidOptions(
                "only one record identifier may be supplied".to_string(),
            ));
        }
        Ok(first)
    }
}

/// Operation request in canonical form: sub-path plus ordered parameters.
///
/// Keys are the canonical underscore names; they are camelized only when
/// the URL is assembled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalRequest {
    pub path: String,
    pub params: IndexMap<String, ParamValue>,
}

impl CanonicalRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: IndexMap::new(),
        }
    }

    /// Insert a parameter when a value is present
    pub fn param<V: Into<ParamValue>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.params.insert(key.to_string(), value.into());
        }
        self
    }

    /// Append an identifier path segment
    pub fn record_id(mut self, id: &RecordId) -> Self {
        self.path = format!("{}/{}", self.path.trim_end_matches('/'), id.path_segment());
        self
    }

    /// Value of a canonical parameter as it would appear on the wire (before escaping)
    pub fn get(&self, key: &str) -> Option<String> {
        self.params.get(key).map(|v| v.to_string())
    }

    /// Merge the API key in front of the other parameters.
    ///
    /// The key is always the first parameter; an existing `wskey` entry is replaced.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.params.shift_remove("wskey");
        let mut params = IndexMap::with_capacity(self.params.len() + 1);
        params.insert("wskey".to_string(), ParamValue::Text(key.to_string()));
        params.extend(self.params);
        self.params = params;
        self
    }

    /// Build the escaped request URL below `base`
    pub fn to_url(&self, base: &str) -> String {
        let mut url = format!("{}/{}", base.trim_end_matches('/'), self.path);
        if self.params.is_empty() {
            return url;
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", camelize(k), encode_component(&v.to_string())))
            .collect::<Vec<_>>()
            .join("&");
        url.push('?');
        url.push_str(&query);
        url
    }
}

/// Convert an underscore key to the service's medial-capital form.
///
/// `start_record` becomes `startRecord`; single words are unchanged.
pub fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
