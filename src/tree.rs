//! Owned XML element tree read and written with quick-xml.
//!
//! Only elements, attributes, namespace bindings and direct text survive;
//! comments and processing instructions are dropped. Input in a non-UTF-8
//! encoding is transcoded according to its XML declaration.

use std::io::Write;

use std::borrow::Cow;

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesDecl, BytesEnd, BytesRef, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Writer};

use crate::error::GpxError;

type Result<T> = std::result::Result<T, GpxError>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    /// Local name, without prefix.
    pub name: String,
    /// Resolved namespace URI of the element, if bound.
    pub namespace: Option<String>,
    /// Attributes by local name, in document order. Namespace declarations are not kept.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    /// Concatenated text and CDATA directly inside this element.
    pub text: String,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_child(&mut self, child: XmlNode) {
        self.children.push(child);
    }
}

/// Parse an XML document and return its root element.
///
/// The bytes are decoded in the encoding named by the XML declaration,
/// UTF-8 when there is none.
pub fn parse_tree(xml: &[u8]) -> Result<XmlNode> {
    read_tree(NsReader::from_reader(xml))
}

/// Parse already decoded text. Any encoding in the declaration is ignored.
pub fn parse_tree_str(xml: &str) -> Result<XmlNode> {
    read_tree(NsReader::from_str(xml))
}

fn read_tree(mut reader: NsReader<&[u8]>) -> Result<XmlNode> {
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        // The decoder switches encoding once the declaration has been read.
        let decoder = reader.decoder();
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => stack.push(element_node(decoder, ns, &e)?),
            Ok((ns, Event::Empty(e))) => {
                let node = element_node(decoder, ns, &e)?;
                attach(&mut stack, &mut root, node);
            }
            Ok((_, Event::End(_))) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok((_, Event::Text(e))) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&decode(decoder, e.as_ref())?);
                }
            }
            Ok((_, Event::CData(e))) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&decode(decoder, e.as_ref())?);
                }
            }
            Ok((_, Event::GeneralRef(e))) => {
                if let Some(current) = stack.last_mut() {
                    push_reference(decoder, &mut current.text, &e)?;
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(GpxError::XmlParse(e)),
            _ => {}
        }
    }

    // Unclosed elements at end of input are closed implicitly.
    while let Some(node) = stack.pop() {
        attach(&mut stack, &mut root, node);
    }

    root.ok_or(GpxError::EmptyDocument)
}

fn decode<'b>(decoder: Decoder, bytes: &'b [u8]) -> Result<Cow<'b, str>> {
    decoder
        .decode(bytes)
        .map_err(|e| GpxError::XmlParse(e.into()))
}

fn element_node(
    decoder: Decoder,
    ns: ResolveResult<'_>,
    start: &BytesStart<'_>,
) -> Result<XmlNode> {
    let mut node = XmlNode::new(decode(decoder, start.local_name().as_ref())?);
    if let ResolveResult::Bound(Namespace(uri)) = ns {
        node.namespace = Some(decode(decoder, uri)?.into_owned());
    }

    for attr_result in start.attributes() {
        let attr = attr_result.map_err(|e| GpxError::XmlParse(e.into()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = decode(decoder, attr.key.local_name().as_ref())?.into_owned();
        let raw = decode(decoder, &attr.value)?;
        let value = quick_xml::escape::unescape(&raw)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        node.attributes.push((key, value));
    }

    Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

/// Resolve character references (&#60; &#x3C;) and the predefined XML entities.
fn push_reference(decoder: Decoder, text: &mut String, reference: &BytesRef<'_>) -> Result<()> {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        text.push(ch);
        return Ok(());
    }
    match decode(decoder, reference.as_ref())?.as_ref() {
        "amp" => text.push('&'),
        "lt" => text.push('<'),
        "gt" => text.push('>'),
        "quot" => text.push('"'),
        "apos" => text.push('\''),
        _ => {} // Unknown entity, skip
    }
    Ok(())
}

/// Write a tree as a UTF-8 document with an XML declaration.
///
/// `indent` is the number of spaces per nesting level; 0 writes no line breaks.
pub fn write_tree(root: &XmlNode, indent: usize) -> Result<Vec<u8>> {
    let mut writer = if indent > 0 {
        Writer::new_with_indent(Vec::new(), b' ', indent)
    } else {
        Writer::new(Vec::new())
    };

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| GpxError::XmlWrite(e.to_string()))?;
    write_node(&mut writer, root, None)?;

    Ok(writer.into_inner())
}

fn write_node<W: Write>(
    writer: &mut Writer<W>,
    node: &XmlNode,
    parent_ns: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    let ns = node.namespace.as_deref();
    if let Some(uri) = ns {
        if parent_ns != Some(uri) {
            start.push_attribute(("xmlns", uri));
        }
    }
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| GpxError::XmlWrite(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| GpxError::XmlWrite(e.to_string()))?;
    if !node.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&node.text)))
            .map_err(|e| GpxError::XmlWrite(e.to_string()))?;
    }
    let inherited = ns.or(parent_ns);
    for child in &node.children {
        write_node(writer, child, inherited)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(|e| GpxError::XmlWrite(e.to_string()))?;

    Ok(())
}
