//! Owned XML element trees and record collection.
//!
//! Registry responses are small (tens to a few thousand records), so the
//! whole document is materialized into an owned tree. Lookup mirrors
//! DOM `getElementsByTagName` semantics: a named lookup searches the
//! entire subtree in document order, not just direct children.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::XmlError;

/// One element of an upstream document: tag name, accumulated direct
/// text, and child elements in document order. Attributes are not part
/// of the record model — no upstream field is attribute-carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Create an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// The element's tag name, exactly as it appeared in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element's direct text content, untrimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First descendant element with the given tag, in document order.
    ///
    /// Searches the whole subtree below this node (pre-order), so a
    /// field nested one level down is still found. Returns `None` when
    /// no such element exists.
    pub fn descendant(&self, name: &str) -> Option<&Node> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendant elements with the given tag, in document order.
    pub fn descendants(&self, name: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_into(name, &mut out);
        out
    }

    /// Whether at least one descendant with the given tag exists.
    pub fn has_descendant(&self, name: &str) -> bool {
        self.descendant(name).is_some()
    }

    fn collect_into<'a>(&'a self, name: &str, out: &mut Vec<&'a Node>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_into(name, out);
        }
    }
}

/// Parse a complete XML document into a synthetic `#document` root node.
pub fn parse_document(xml: &str) -> Result<Node, XmlError> {
    let mut reader = Reader::from_str(xml);
    // Self-closing elements become Start/End pairs so the loop below
    // only has three event shapes to care about.
    reader.config_mut().expand_empty_elements = true;

    let mut root = Node::new("#document");
    let mut stack: Vec<Node> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                stack.push(Node::new(name));
            }
            Event::End(_) => {
                let Some(done) = stack.pop() else {
                    return Err(XmlError::Unbalanced);
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => root.children.push(done),
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            // Declarations, comments and processing instructions carry
            // no record data.
            _ => {}
        }
    }

    Ok(root)
}

/// Parse a document and return every element named `tag`, in document
/// order. This is the record collection for one registry query.
pub fn collect_records(xml: &str, tag: &str) -> Result<Vec<Node>, XmlError> {
    let root = parse_document(xml)?;
    Ok(root.descendants(tag).into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT_XML: &str = r#"<results>
<SERVICE_ENDPOINT PRIMARY_KEY="368G0">
<HOSTNAME>node05-02.imi.renam.md</HOSTNAME>
<SERVICE_TYPE>APEL</SERVICE_TYPE>
<SITENAME>MD-02-IMI</SITENAME>
<COUNTRY_NAME>CRETE</COUNTRY_NAME>
<URL/>
<SCOPES><SCOPE>EGI</SCOPE></SCOPES>
<HOSTDN> ALEX TSELOS </HOSTDN>
</SERVICE_ENDPOINT>
</results>"#;

    #[test]
    fn collects_records_by_tag() {
        let records = collect_records(ENDPOINT_XML, "SERVICE_ENDPOINT").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "SERVICE_ENDPOINT");
    }

    #[test]
    fn descendant_finds_direct_child() {
        let records = collect_records(ENDPOINT_XML, "SERVICE_ENDPOINT").unwrap();
        let site = records[0].descendant("SITENAME").unwrap();
        assert_eq!(site.text(), "MD-02-IMI");
    }

    #[test]
    fn descendant_searches_nested_levels() {
        let records = collect_records(ENDPOINT_XML, "SERVICE_ENDPOINT").unwrap();
        // SCOPE sits one level down inside SCOPES.
        assert_eq!(records[0].descendant("SCOPE").unwrap().text(), "EGI");
    }

    #[test]
    fn descendant_picks_first_in_document_order() {
        let xml = "<r><F>first</F><nested><F>second</F></nested><F>third</F></r>";
        let root = parse_document(xml).unwrap();
        let record = &root.children()[0];
        assert_eq!(record.descendant("F").unwrap().text(), "first");
        let all: Vec<&str> = record.descendants("F").iter().map(|n| n.text()).collect();
        assert_eq!(all, vec!["first", "second", "third"]);
    }

    #[test]
    fn self_closing_element_is_present_and_empty() {
        let records = collect_records(ENDPOINT_XML, "SERVICE_ENDPOINT").unwrap();
        let url = records[0].descendant("URL").unwrap();
        assert_eq!(url.text(), "");
    }

    #[test]
    fn text_is_kept_untrimmed() {
        let records = collect_records(ENDPOINT_XML, "SERVICE_ENDPOINT").unwrap();
        assert_eq!(records[0].descendant("HOSTDN").unwrap().text(), " ALEX TSELOS ");
    }

    #[test]
    fn entities_are_unescaped() {
        let root = parse_document("<r><NAME>A &amp; B</NAME></r>").unwrap();
        assert_eq!(root.descendant("NAME").unwrap().text(), "A & B");
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_document("<r><SITE></r>").is_err());
    }

    #[test]
    fn missing_tag_collects_nothing() {
        let records = collect_records(ENDPOINT_XML, "NO_SUCH_TAG").unwrap();
        assert!(records.is_empty());
    }
}
