//! Detection of service diagnostics embedded in otherwise normal responses.
//!
//! The service reports failures in three ways, depending on the operation
//! and requested format:
//!
//! - XML: a `diagnostics` element, either as the document root or as a
//!   direct child of it (older and newer service versions differ).
//! - JSON: a top-level `diagnostic` key holding a list of entries.
//! - Plain text: a body of the form `info:srw/diagnostic/1/65Record does not exist`.
//!
//! Exactly one detector runs per response, chosen by [`ResponseShape`].

use regex::Regex;
use std::sync::OnceLock;

use super::WorldCatError;
use crate::models::{ResponseShape, XmlDocument, XmlElement};

/// A diagnostic reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub details: Option<String>,
    pub message: String,
}

impl From<Diagnostic> for WorldCatError {
    fn from(d: Diagnostic) -> Self {
        WorldCatError::ServiceDiagnostic {
            details: d.details,
            message: d.message,
        }
    }
}

static TEXT_DIAGNOSTIC: OnceLock<Regex> = OnceLock::new();

fn text_pattern() -> &'static Regex {
    TEXT_DIAGNOSTIC.get_or_init(|| {
        Regex::new(r"(?s)^\s*info:srw/diagnostic/(?:\d+/)?\d+(.*)$")
            .expect("diagnostic pattern is valid")
    })
}

/// Fail with [`WorldCatError::ServiceDiagnostic`] if `body` carries a diagnostic
pub fn inspect(body: &str, shape: ResponseShape) -> Result<(), WorldCatError> {
    let diagnostic = match shape {
        ResponseShape::Xml => xml_diagnostic(&XmlDocument::parse(body)?),
        ResponseShape::Json => json_diagnostic(body)?,
        ResponseShape::PlainText => text_diagnostic(body),
    };

    match diagnostic {
        Some(d) => {
            tracing::warn!(
                "WorldCat diagnostic: {} ({})",
                d.message,
                d.details.as_deref().unwrap_or("no details")
            );
            Err(d.into())
        }
        None => Ok(()),
    }
}

/// Diagnostic in an XML document, at the root or one level below it
pub fn xml_diagnostic(doc: &XmlDocument) -> Option<Diagnostic> {
    let diagnostics = if doc.root.name == "diagnostics" {
        &doc.root
    } else {
        doc.root.child("diagnostics")?
    };

    let entry = diagnostics.children.first()?;
    Some(Diagnostic {
        details: non_empty(entry.child_text("details")),
        message: message_of(entry),
    })
}

fn message_of(entry: &XmlElement) -> String {
    entry
        .child_text("message")
        .or_else(|| entry.child_text("uri"))
        .unwrap_or("unknown diagnostic")
        .to_string()
}

/// Diagnostic in a JSON body (`{"diagnostic": [{"details": ..., "message": ...}]}`)
pub fn json_diagnostic(body: &str) -> Result<Option<Diagnostic>, WorldCatError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| WorldCatError::Decode(format!("JSON: {}", e)))?;

    let entry = match value.get("diagnostic") {
        Some(serde_json::Value::Array(entries)) => entries.first(),
        Some(single @ serde_json::Value::Object(_)) => Some(single),
        _ => None,
    };

    Ok(entry.map(|entry| {
        let field = |name: &str| entry.get(name).and_then(|v| v.as_str());
        Diagnostic {
            details: non_empty(field("details")),
            message: field("message")
                .or_else(|| field("uri"))
                .unwrap_or("unknown diagnostic")
                .to_string(),
        }
    }))
}

/// Diagnostic sentinel in a plain text body
pub fn text_diagnostic(body: &str) -> Option<Diagnostic> {
    text_pattern().captures(body).map(|caps| Diagnostic {
        details: None,
        message: caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    })
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_string)
}
