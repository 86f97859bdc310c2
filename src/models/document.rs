//! Generic XML document tree.
//!
//! Responses that are neither feeds nor MARC records (Dublin Core search
//! results, library holdings) are handed back as an [`XmlDocument`]. Element
//! and attribute names are stored without their namespace prefix, and
//! namespace declarations are dropped.
//!
//! Text content is kept as received, whitespace included; formatting
//! whitespace between child elements ends up in the parent's `text` and is
//! ignored by [`XmlElement::trimmed_text`] and [`XmlElement::child_text`].

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;

use crate::client::WorldCatError;

/// A parsed XML element
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct XmlElement {
    /// Local name (prefix stripped)
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<XmlElement>,
    /// Concatenated direct text and CDATA content, untrimmed
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content without leading and trailing whitespace
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Trimmed text of the first direct child with the given name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::trimmed_text)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First descendant (depth first, self excluded) with the given name
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect(name, found);
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, WorldCatError> {
        let mut element = XmlElement::new(String::from_utf8_lossy(start.local_name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| WorldCatError::Decode(format!("XML attribute: {}", e)))?;
            let key = attr.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| WorldCatError::Decode(format!("XML attribute value: {}", e)))?;
            element.attributes.insert(
                String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned(),
                value.into_owned(),
            );
        }
        Ok(element)
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse a complete document.
    ///
    /// Fails on malformed XML, mismatched end tags, more than one root
    /// element, or a document without any element.
    pub fn parse(xml: &str) -> Result<Self, WorldCatError> {
        let mut reader = Reader::from_str(xml);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(XmlElement::from_start(&e)?),
                Ok(Event::Empty(e)) => {
                    let element = XmlElement::from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        WorldCatError::Decode("XML: unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| WorldCatError::Decode(format!("XML text: {}", e)))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(WorldCatError::Decode(format!(
                        "XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(WorldCatError::Decode(format!(
                "XML: element <{}> is not closed",
                open.name
            )));
        }

        root.map(|root| XmlDocument { root })
            .ok_or_else(|| WorldCatError::Decode("XML: document has no root element".to_string()))
    }

    /// First element with the given name, the root included
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.root.name == name {
            Some(&self.root)
        } else {
            self.root.find(name)
        }
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), WorldCatError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(WorldCatError::Decode(
            "XML: more than one root element".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<holdings xmlns="http://www.loc.gov/standards/iso20775/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <holding>
    <institutionIdentifier>
      <value>OSU</value>
      <typeOrSource><text>OCLC Symbol</text></typeOrSource>
    </institutionIdentifier>
    <physicalLocation>Ohio State University Libraries</physicalLocation>
    <electronicAddress><text>http://library.ohio-state.edu/search/?q=15550774</text></electronicAddress>
    <holdingSimple><copiesSummary><copiesCount>1</copiesCount></copiesSummary></holdingSimple>
  </holding>
  <holding>
    <physicalLocation>Stanford &amp; Co</physicalLocation>
  </holding>
</holdings>"#;

    #[test]
    fn test_parse_tree() {
        let doc = XmlDocument::parse(HOLDINGS).unwrap();
        assert_eq!(doc.root.name, "holdings");
        assert!(doc.root.attributes.is_empty());
        assert_eq!(doc.root.children_named("holding").count(), 2);

        let first = doc.root.child("holding").unwrap();
        assert_eq!(
            first.child_text("physicalLocation"),
            Some("Ohio State University Libraries")
        );
        assert_eq!(doc.find("copiesCount").map(|e| e.text.as_str()), Some("1"));

        let locations: Vec<&str> = doc
            .root
            .find_all("physicalLocation")
            .into_iter()
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(locations, vec!["Ohio State University Libraries", "Stanford & Co"]);
    }

    #[test]
    fn test_prefixes_stripped_attributes_kept() {
        let doc = XmlDocument::parse(
            r#"<srw:root xmlns:srw="urn:x"><srw:item code="a" srw:kind="b"/></srw:root>"#,
        )
        .unwrap();
        assert_eq!(doc.root.name, "root");
        let item = doc.root.child("item").unwrap();
        assert_eq!(item.attr("code"), Some("a"));
        assert_eq!(item.attr("kind"), Some("b"));
    }

    #[test]
    fn test_text_kept_verbatim() {
        let doc = XmlDocument::parse("<a>a <b/> c</a>").unwrap();
        assert_eq!(doc.root.text, "a  c");
        assert_eq!(doc.root.children.len(), 1);

        let doc = XmlDocument::parse("<r><v>  padded value </v></r>").unwrap();
        assert_eq!(doc.root.child("v").unwrap().text, "  padded value ");
        assert_eq!(doc.root.child_text("v"), Some("padded value"));
    }

    #[test]
    fn test_formatting_whitespace_trimmed_by_accessors() {
        let doc = XmlDocument::parse(HOLDINGS).unwrap();
        assert!(!doc.root.text.is_empty());
        assert_eq!(doc.root.trimmed_text(), "");
    }

    #[test]
    fn test_cdata_text() {
        let doc = XmlDocument::parse("<a><![CDATA[x < y]]></a>").unwrap();
        assert_eq!(doc.root.text, "x < y");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlDocument::parse("<a><b></a>").is_err());
        assert!(XmlDocument::parse("<a>").is_err());
        assert!(XmlDocument::parse("").is_err());
        assert!(XmlDocument::parse("<a/><b/>").is_err());
        assert!(XmlDocument::parse("info:srw/diagnostic/1/65Record does not exist").is_err());
    }
}
