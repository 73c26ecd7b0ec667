use std::path::Path;

use log::debug;

use crate::error::GpxError;
use crate::gpx_types::*;
use crate::options::GpxOptions;
use crate::parser::check_gpx_extension;
use crate::tags::{ATTR_CREATOR, ATTR_LAT, ATTR_LON, ATTR_VERSION, Tag};
use crate::tree::{XmlNode, write_tree};
use crate::validate::SchemaValidator;

type Result<T> = std::result::Result<T, GpxError>;

/// Build the element tree for a document.
///
/// Waypoints come first, then routes, then tracks, whatever order they had in
/// the source document.
pub fn to_tree(doc: &GpxDoc) -> XmlNode {
    let mut root = XmlNode::new(Tag::Gpx.as_str());
    root.namespace = Some(doc.namespace.clone());
    if let Some(version) = doc.version {
        root.set_attribute(ATTR_VERSION, format!("{version:.1}"));
    }
    if let Some(creator) = &doc.creator {
        root.set_attribute(ATTR_CREATOR, creator.as_str());
    }

    for wpt in &doc.waypoints {
        root.push_child(point_node(Tag::Wpt, wpt));
    }
    for rte in &doc.routes {
        root.push_child(route_node(rte));
    }
    for trk in &doc.tracks {
        root.push_child(track_node(trk));
    }

    root
}

fn point_node(tag: Tag, pt: &Waypoint) -> XmlNode {
    let mut node = XmlNode::new(tag.as_str());
    if let Some(lat) = pt.lat {
        node.set_attribute(ATTR_LAT, lat.to_string());
    }
    if let Some(lon) = pt.lon {
        node.set_attribute(ATTR_LON, lon.to_string());
    }
    push_name(&mut node, &pt.name);
    push_extensions(&mut node, &pt.extensions);
    node
}

fn route_node(rte: &Route) -> XmlNode {
    let mut node = XmlNode::new(Tag::Rte.as_str());
    push_name(&mut node, &rte.name);
    push_extensions(&mut node, &rte.extensions);
    for pt in &rte.waypoints {
        node.push_child(point_node(Tag::Rtept, pt));
    }
    node
}

fn track_node(trk: &Track) -> XmlNode {
    let mut node = XmlNode::new(Tag::Trk.as_str());
    push_name(&mut node, &trk.name);
    push_extensions(&mut node, &trk.extensions);
    for seg in &trk.segments {
        let mut seg_node = XmlNode::new(Tag::Trkseg.as_str());
        for pt in &seg.waypoints {
            seg_node.push_child(point_node(Tag::Trkpt, pt));
        }
        node.push_child(seg_node);
    }
    node
}

fn push_name(node: &mut XmlNode, name: &Option<String>) {
    if let Some(name) = name {
        node.push_child(XmlNode::with_text(Tag::Name.as_str(), name.as_str()));
    }
}

fn push_extensions(node: &mut XmlNode, extensions: &Extensions) {
    for ext in extensions {
        node.push_child(XmlNode::with_text(ext.name.as_str(), ext.value.as_str()));
    }
}

/// Serialize a document to GPX bytes (UTF-8, with an XML declaration).
pub fn to_gpx_bytes(doc: &GpxDoc, opts: &GpxOptions) -> Result<Vec<u8>> {
    let bytes = write_tree(&to_tree(doc), opts.indent)?;
    debug!(
        "serialized GPX document: {} waypoints, {} routes, {} tracks, {} bytes",
        doc.num_waypoints(),
        doc.num_routes(),
        doc.num_tracks(),
        bytes.len()
    );
    Ok(bytes)
}

pub fn to_gpx_string(doc: &GpxDoc, opts: &GpxOptions) -> Result<String> {
    Ok(String::from_utf8(to_gpx_bytes(doc, opts)?)?)
}

/// Serialize `doc` and write it to a `.gpx` file.
pub fn write_gpx_file(doc: &GpxDoc, path: impl AsRef<Path>, opts: &GpxOptions) -> Result<()> {
    let path = path.as_ref();
    check_gpx_extension(path)?;
    let bytes = to_gpx_bytes(doc, opts)?;
    std::fs::write(path, bytes)?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Serialize `doc` and run the result through `validator`.
///
/// A document that cannot be serialized is reported as invalid.
pub fn validate_doc(doc: &GpxDoc, validator: &impl SchemaValidator, opts: &GpxOptions) -> bool {
    match to_gpx_bytes(doc, opts) {
        Ok(bytes) => validator.validate(&bytes),
        Err(e) => {
            log::warn!("could not serialize document for validation: {e}");
            false
        }
    }
}
