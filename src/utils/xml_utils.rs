//! XML utility types
//!
//! A small owned element tree used as the host document for transform state.
//! Reading and writing go through quick-xml.

use std::fmt::Display;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::crs::errors::{CrsError, CrsResult};

/// An XML element with attributes, text content and child elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Element name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an empty element
    pub fn new(name: &str) -> Self {
        XmlNode {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Create an element holding only text
    pub fn with_text(name: &str, text: &str) -> Self {
        XmlNode {
            name: name.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Trimmed text of the first child with the given name, if it has any
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|c| c.text.trim())
            .filter(|text| !text.is_empty())
    }

    /// Append a child and return a reference to it
    pub fn append_child(&mut self, child: XmlNode) -> &mut XmlNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Replace the first child with the same name, or append when there is none
    pub fn replace_child(&mut self, child: XmlNode) -> &mut XmlNode {
        match self.children.iter().position(|c| c.name == child.name) {
            Some(index) => {
                self.children[index] = child;
                &mut self.children[index]
            },
            None => self.append_child(child),
        }
    }

    /// Set the text of a named child, creating it when missing
    pub fn set_child_text(&mut self, name: &str, text: &str) {
        match self.child_mut(name) {
            Some(child) => child.text = text.to_string(),
            None => {
                self.append_child(XmlNode::with_text(name, text));
            },
        }
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> CrsResult<XmlNode> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Self::from_start(&start)?),
                Ok(Event::Empty(start)) => {
                    let node = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, node)?;
                },
                Ok(Event::End(_)) => {
                    let node = stack.pop()
                        .ok_or_else(|| CrsError::Xml("Unexpected closing tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, node)?;
                },
                Ok(Event::Text(text)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape().map_err(xml_error)?);
                    }
                },
                Ok(Event::CData(data)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                },
                Ok(Event::Eof) => break,
                // Declarations, comments, processing instructions and doctypes carry no state
                Ok(_) => {},
                Err(e) => return Err(CrsError::Xml(format!(
                    "Parse error at position {}: {}", reader.buffer_position(), e))),
            }
        }

        if let Some(open) = stack.last() {
            return Err(CrsError::Xml(format!("Unclosed element <{}>", open.name)));
        }
        root.ok_or_else(|| CrsError::Xml("Document has no root element".to_string()))
    }

    fn from_start(start: &BytesStart) -> CrsResult<XmlNode> {
        let mut node = XmlNode::new(&String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            node.attributes.push((key, value));
        }
        Ok(node)
    }

    fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> CrsResult<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None if root.is_none() => *root = Some(node),
            None => return Err(CrsError::Xml("Document has more than one root element".to_string())),
        }
        Ok(())
    }

    /// Serialize this element and its children as indented XML
    pub fn to_xml_string(&self) -> CrsResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write_to(&mut writer)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| CrsError::Xml(format!("Serialized XML is not UTF-8: {}", e)))
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> CrsResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            writer.write_event(Event::Empty(start)).map_err(xml_error)?;
            return Ok(());
        }

        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        if !self.text.is_empty() {
            writer.write_event(Event::Text(BytesText::new(&self.text))).map_err(xml_error)?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str()))).map_err(xml_error)?;
        Ok(())
    }
}

fn xml_error<E: Display>(e: E) -> CrsError {
    CrsError::Xml(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let xml = r#"<?xml version="1.0"?>
            <maplayer type="vector">
              <!-- layer state -->
              <id>roads</id>
              <flags/>
              <note>a &amp; b</note>
            </maplayer>"#;

        let root = XmlNode::parse(xml).unwrap();
        assert_eq!(root.name, "maplayer");
        assert_eq!(root.attribute("type"), Some("vector"));
        assert_eq!(root.child_text("id"), Some("roads"));
        assert_eq!(root.child_text("note"), Some("a & b"));
        assert!(root.child("flags").is_some());
        assert_eq!(root.child_text("flags"), None);
    }

    #[test]
    fn test_write_escapes_and_reparses() {
        let mut root = XmlNode::new("state");
        root.set_attribute("version", "1");
        root.set_child_text("wkt", r#"GEOGCS["WGS 84",UNIT["degree",0.0174532925199433]]"#);
        root.set_child_text("expr", "x < 3 && y > 2");
        root.append_child(XmlNode::new("empty"));

        let xml = root.to_xml_string().unwrap();
        assert!(xml.contains("&lt;"));
        assert_eq!(XmlNode::parse(&xml).unwrap(), root);
    }

    #[test]
    fn test_replace_child() {
        let mut root = XmlNode::new("root");
        root.append_child(XmlNode::with_text("a", "1"));
        root.replace_child(XmlNode::with_text("a", "2"));
        root.replace_child(XmlNode::with_text("b", "3"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child_text("a"), Some("2"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlNode::parse("<a><b></a>").is_err());
        assert!(XmlNode::parse("<a>").is_err());
        assert!(XmlNode::parse("").is_err());
        assert!(XmlNode::parse("<a/><b/>").is_err());
    }
}
