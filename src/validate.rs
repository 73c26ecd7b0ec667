//! Schema validation seam.
//!
//! Any `Fn(&[u8]) -> bool` can stand in for an XSD engine. [`Gpx11Validator`]
//! is a structural checker for hosts that have none.

use log::warn;

use crate::options::GPX_NAMESPACE;
use crate::tags::{ATTR_CREATOR, ATTR_LAT, ATTR_LON, ATTR_VERSION, Tag};
use crate::tree::{XmlNode, parse_tree};

/// Decides whether a serialized document is acceptable.
pub trait SchemaValidator {
    fn validate(&self, document: &[u8]) -> bool;
}

impl<F> SchemaValidator for F
where
    F: Fn(&[u8]) -> bool,
{
    fn validate(&self, document: &[u8]) -> bool {
        self(document)
    }
}

/// Checks the parts of the GPX 1.1 schema this crate reads and writes: the
/// root element and its required attributes, point coordinates, the
/// wpt/rte/trk ordering and where point elements may appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gpx11Validator;

impl Gpx11Validator {
    /// Every problem found, empty when the document is valid.
    pub fn check(&self, document: &[u8]) -> Vec<String> {
        let root = match parse_tree(document) {
            Ok(root) => root,
            Err(e) => return vec![e.to_string()],
        };

        let mut problems = Vec::new();
        if root.name != Tag::Gpx.as_str() {
            problems.push(format!("root element is <{}>, expected <gpx>", root.name));
            return problems;
        }
        if root.namespace.as_deref() != Some(GPX_NAMESPACE) {
            problems.push(format!(
                "root namespace is {:?}, expected {GPX_NAMESPACE}",
                root.namespace.as_deref().unwrap_or("")
            ));
        }
        match root.attribute(ATTR_VERSION) {
            Some("1.1") => {}
            Some(other) => problems.push(format!("version is '{other}', expected '1.1'")),
            None => problems.push("missing required attribute 'version' on <gpx>".to_string()),
        }
        if root.attribute(ATTR_CREATOR).is_none() {
            problems.push("missing required attribute 'creator' on <gpx>".to_string());
        }

        check_entity_order(&root, &mut problems);
        for child in &root.children {
            check_node(child, Some(Tag::Gpx), &mut problems);
        }
        problems
    }
}

impl SchemaValidator for Gpx11Validator {
    fn validate(&self, document: &[u8]) -> bool {
        let problems = self.check(document);
        for problem in &problems {
            warn!("GPX validation: {problem}");
        }
        problems.is_empty()
    }
}

fn check_entity_order(root: &XmlNode, problems: &mut Vec<String>) {
    let rank = |tag: Option<Tag>| match tag {
        Some(Tag::Wpt) => Some(0),
        Some(Tag::Rte) => Some(1),
        Some(Tag::Trk) => Some(2),
        _ => None,
    };

    let mut highest = 0;
    for child in &root.children {
        if let Some(r) = rank(Tag::from_name(&child.name)) {
            if r < highest {
                problems.push(format!("<{}> appears after a later entity kind", child.name));
            }
            highest = highest.max(r);
        }
    }
}

fn check_node(node: &XmlNode, parent: Option<Tag>, problems: &mut Vec<String>) {
    let tag = Tag::from_name(&node.name);
    let expected_parent = match tag {
        Some(Tag::Wpt) => Some(Tag::Gpx),
        Some(Tag::Rtept) => Some(Tag::Rte),
        Some(Tag::Trkseg) => Some(Tag::Trk),
        Some(Tag::Trkpt) => Some(Tag::Trkseg),
        _ => None,
    };
    if let Some(expected) = expected_parent {
        if parent != Some(expected) {
            problems.push(format!(
                "<{}> must be a child of <{}>",
                node.name,
                expected.as_str()
            ));
        }
    }

    if matches!(tag, Some(Tag::Wpt | Tag::Rtept | Tag::Trkpt)) {
        check_coordinate(node, ATTR_LAT, 90.0, problems);
        check_coordinate(node, ATTR_LON, 180.0, problems);
    }

    for child in &node.children {
        check_node(child, tag, problems);
    }
}

fn check_coordinate(node: &XmlNode, attribute: &str, limit: f64, problems: &mut Vec<String>) {
    match node.attribute(attribute).map(|v| v.trim().parse::<f64>()) {
        None => problems.push(format!("<{}> is missing '{attribute}'", node.name)),
        Some(Err(_)) => problems.push(format!("<{}> has a non-numeric '{attribute}'", node.name)),
        Some(Ok(v)) if !(-limit..=limit).contains(&v) => {
            problems.push(format!("<{}> '{attribute}' {v} is out of range", node.name))
        }
        Some(Ok(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="test">
  <wpt lat="43.5" lon="-80.2"><name>A</name></wpt>
  <rte><name>R</name><rtept lat="1" lon="2"/></rte>
  <trk><trkseg><trkpt lat="1" lon="2"/></trkseg></trk>
</gpx>"#;

    #[test]
    fn test_valid_document() {
        assert!(Gpx11Validator.check(VALID.as_bytes()).is_empty());
        assert!(Gpx11Validator.validate(VALID.as_bytes()));
    }

    #[test]
    fn test_missing_creator_and_version() {
        let xml = r#"<gpx xmlns="http://www.topografix.com/GPX/1/1"/>"#;
        let problems = Gpx11Validator.check(xml.as_bytes());
        assert_eq!(problems.len(), 2);
        assert!(!Gpx11Validator.validate(xml.as_bytes()));
    }

    #[test]
    fn test_wrong_namespace_and_root() {
        let xml = r#"<gpx xmlns="http://www.topografix.com/GPX/1/0" version="1.1" creator="x"/>"#;
        assert_eq!(Gpx11Validator.check(xml.as_bytes()).len(), 1);

        let xml = r#"<kml/>"#;
        assert!(!Gpx11Validator.validate(xml.as_bytes()));
        assert!(!Gpx11Validator.validate(b"not xml <"));
    }

    #[test]
    fn test_coordinates_checked() {
        let xml = r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="x">
  <wpt lat="91" lon="0"/>
  <wpt lon="0"/>
  <wpt lat="1" lon="east"/>
</gpx>"#;
        assert_eq!(Gpx11Validator.check(xml.as_bytes()).len(), 3);
    }

    #[test]
    fn test_entity_order_and_placement() {
        let xml = r#"<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="x">
  <trk><trkpt lat="1" lon="1"/></trk>
  <wpt lat="1" lon="1"/>
  <rtept lat="1" lon="1"/>
</gpx>"#;
        let problems = Gpx11Validator.check(xml.as_bytes());
        // wpt after trk, trkpt outside trkseg, rtept outside rte
        assert_eq!(problems.len(), 3);
    }

    #[test]
    fn test_closure_is_a_validator() {
        let accept_all = |_: &[u8]| true;
        let reject_all = |_: &[u8]| false;
        assert!(accept_all.validate(b""));
        assert!(!reject_all.validate(VALID.as_bytes()));
    }
}
