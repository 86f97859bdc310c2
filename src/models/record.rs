//! MARC bibliographic records decoded from MARCXML.
//!
//! Records are decoded from an already parsed [`XmlDocument`], so any
//! MARCXML `record` element is found wherever the service wraps it: at the
//! document root (single record lookups), inside a `collection`, or inside
//! SRU `recordData` envelopes. Decoded records are [`mrrc::Record`] values,
//! so the whole `mrrc` query API (`RecordHelpers`, field queries) applies.

use mrrc::{Field, Leader, Record};

use super::document::{XmlDocument, XmlElement};
use crate::client::WorldCatError;

/// Build a record from a MARCXML `record` element.
///
/// The leader is required; indicators default to a blank.
pub fn marc_record(element: &XmlElement) -> Result<Record, WorldCatError> {
    let leader = element
        .child("leader")
        .ok_or_else(|| WorldCatError::Decode("MARC: record without leader".to_string()))?;
    let leader = Leader::from_bytes(leader.text.as_bytes())
        .map_err(|e| WorldCatError::Decode(format!("MARC leader: {}", e)))?;
    let mut record = Record::new(leader);

    for child in &element.children {
        match child.name.as_str() {
            "controlfield" => {
                let tag = required_attr(child, "tag")?;
                record.add_control_field(tag, child.text.clone());
            }
            "datafield" => {
                let tag = required_attr(child, "tag")?;
                let mut field = Field::new(tag, indicator(child, "ind1"), indicator(child, "ind2"));
                for sub in child.children_named("subfield") {
                    let code = sub
                        .attr("code")
                        .and_then(|c| c.chars().next())
                        .ok_or_else(|| {
                            WorldCatError::Decode(format!(
                                "MARC: subfield without code in field {}",
                                field.tag
                            ))
                        })?;
                    field.add_subfield(code, sub.text.clone());
                }
                record.add_field(field);
            }
            _ => {}
        }
    }

    Ok(record)
}

fn required_attr(element: &XmlElement, name: &str) -> Result<String, WorldCatError> {
    element.attr(name).map(str::to_string).ok_or_else(|| {
        WorldCatError::Decode(format!("MARC: <{}> without {} attribute", element.name, name))
    })
}

fn indicator(element: &XmlElement, name: &str) -> char {
    element
        .attr(name)
        .and_then(|v| v.chars().next())
        .unwrap_or(' ')
}

fn is_marc_record(element: &XmlElement) -> bool {
    element.name == "record"
        && element
            .children
            .iter()
            .any(|c| matches!(c.name.as_str(), "leader" | "controlfield" | "datafield"))
}

fn collect_records<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    if is_marc_record(element) {
        out.push(element);
        return;
    }
    for child in &element.children {
        collect_records(child, out);
    }
}

/// Decode every MARC record in the document, in document order.
///
/// SRU envelopes also use `record` elements; only those holding a leader or
/// MARC fields are decoded. The result is fully materialized.
pub fn records_from_document(doc: &XmlDocument) -> Result<Vec<Record>, WorldCatError> {
    let mut elements = Vec::new();
    collect_records(&doc.root, &mut elements);
    elements.into_iter().map(marc_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrrc::RecordHelpers;

    const SINGLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<record xmlns="http://www.loc.gov/MARC21/slim">
  <leader>00000cam a2200000 a 4500</leader>
  <controlfield tag="001">1030018</controlfield>
  <controlfield tag="008">731203s1940    nyu           000 1 eng  </controlfield>
  <datafield tag="020" ind1=" " ind2=" ">
    <subfield code="a">0684803356</subfield>
  </datafield>
  <datafield tag="020" ind1=" " ind2=" ">
    <subfield code="a">9780684803357</subfield>
  </datafield>
  <datafield tag="100" ind1="1" ind2=" ">
    <subfield code="a">Hemingway, Ernest,</subfield>
    <subfield code="d">1899-1961.</subfield>
  </datafield>
  <datafield tag="245" ind1="1" ind2="0">
    <subfield code="a">For whom the bell tolls,</subfield>
    <subfield code="c">by Ernest Hemingway. </subfield>
  </datafield>
</record>"#;

    const LEADER: &str = "00000cam a2200000 a 4500";

    #[test]
    fn test_decode_single_record() {
        let doc = XmlDocument::parse(SINGLE).unwrap();
        let records = records_from_document(&doc).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.leader.record_status, 'c');
        assert_eq!(record.leader.record_type, 'a');
        assert_eq!(record.leader.bibliographic_level, 'm');
        assert_eq!(record.control_number(), Some("1030018"));
        assert_eq!(record.title(), Some("For whom the bell tolls,"));
        assert_eq!(record.author(), Some("Hemingway, Ernest,"));
        assert_eq!(record.isbns(), vec!["0684803356", "9780684803357"]);

        let title = record.get_field("245").unwrap();
        assert_eq!(title.indicator1, '1');
        assert_eq!(title.indicator2, '0');
        assert_eq!(title.get_subfield('c'), Some("by Ernest Hemingway. "));
    }

    #[test]
    fn test_subfield_whitespace_preserved() {
        let xml = format!(
            r#"<record><leader>{}</leader><datafield tag="500" ind1=" " ind2=" "><subfield code="a">  Includes index. </subfield></datafield></record>"#,
            LEADER
        );
        let doc = XmlDocument::parse(&xml).unwrap();
        let records = records_from_document(&doc).unwrap();
        assert_eq!(
            records[0].get_field("500").and_then(|f| f.get_subfield('a')),
            Some("  Includes index. ")
        );
    }

    #[test]
    fn test_envelope_records_skipped() {
        let xml = format!(
            r#"<searchRetrieveResponse>
  <records>
    <record>
      <recordSchema>info:srw/schema/1/marcxml</recordSchema>
      <recordData>
        <record><leader>{leader}</leader><datafield tag="245" ind1="0" ind2="0"><subfield code="a">One</subfield></datafield></record>
      </recordData>
    </record>
    <record>
      <recordData>
        <record><leader>{leader}</leader><datafield tag="245" ind1="0" ind2="0"><subfield code="a">Two</subfield></datafield></record>
      </recordData>
    </record>
  </records>
</searchRetrieveResponse>"#,
            leader = LEADER
        );
        let doc = XmlDocument::parse(&xml).unwrap();
        let titles: Vec<String> = records_from_document(&doc)
            .unwrap()
            .iter()
            .filter_map(|r| r.title().map(str::to_string))
            .collect();
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[test]
    fn test_missing_tag_is_error() {
        let xml = format!(
            "<record><leader>{}</leader><datafield ind1=\" \"/></record>",
            LEADER
        );
        let doc = XmlDocument::parse(&xml).unwrap();
        assert!(matches!(
            records_from_document(&doc),
            Err(WorldCatError::Decode(_))
        ));
    }

    #[test]
    fn test_bad_or_missing_leader_is_error() {
        let short = XmlDocument::parse("<record><leader>x</leader></record>").unwrap();
        assert!(matches!(
            records_from_document(&short),
            Err(WorldCatError::Decode(_))
        ));

        let missing = XmlDocument::parse(
            r#"<record><controlfield tag="001">1</controlfield></record>"#,
        )
        .unwrap();
        assert!(matches!(
            records_from_document(&missing),
            Err(WorldCatError::Decode(_))
        ));
    }
}
