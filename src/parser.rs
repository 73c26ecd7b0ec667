use std::path::Path;

use log::{debug, warn};

use crate::error::GpxError;
use crate::gpx_types::*;
use crate::tags::{ATTR_CREATOR, ATTR_LAT, ATTR_LON, ATTR_VERSION, Tag, TagKind, classify};
use crate::tree::{XmlNode, parse_tree, parse_tree_str};
use crate::validate::SchemaValidator;

type Result<T> = std::result::Result<T, GpxError>;

/// Parse a GPX XML string into a GpxDoc.
pub fn parse_gpx(xml: &str) -> Result<GpxDoc> {
    let root = parse_tree_str(xml)?;
    build(&root)
}

/// Parse raw GPX bytes, honouring the encoding in the XML declaration.
pub fn parse_gpx_bytes(xml: &[u8]) -> Result<GpxDoc> {
    let root = parse_tree(xml)?;
    build(&root)
}

/// Load a `.gpx` file.
pub fn load_gpx_file(path: impl AsRef<Path>) -> Result<GpxDoc> {
    let path = path.as_ref();
    check_gpx_extension(path)?;
    let bytes = std::fs::read(path)?;
    parse_gpx_bytes(&bytes)
}

/// Load a `.gpx` file, building nothing unless `validator` accepts its bytes.
pub fn load_valid_gpx_file(
    path: impl AsRef<Path>,
    validator: &impl SchemaValidator,
) -> Result<GpxDoc> {
    let path = path.as_ref();
    check_gpx_extension(path)?;
    let bytes = std::fs::read(path)?;
    if !validator.validate(&bytes) {
        warn!("{} failed schema validation", path.display());
        return Err(GpxError::SchemaInvalid);
    }
    parse_gpx_bytes(&bytes)
}

pub(crate) fn check_gpx_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("gpx") => Ok(()),
        _ => Err(GpxError::InvalidExtension(path.display().to_string())),
    }
}

/// Build a document from the root element of a parsed tree.
pub fn build(root: &XmlNode) -> Result<GpxDoc> {
    if Tag::from_name(&root.name) != Some(Tag::Gpx) {
        return Err(GpxError::NotGpx(root.name.clone()));
    }
    let namespace = root
        .namespace
        .clone()
        .filter(|ns| !ns.is_empty())
        .ok_or(GpxError::MissingNamespace)?;

    let mut doc = GpxDoc::new(namespace);
    doc.version = root
        .attribute(ATTR_VERSION)
        .map(|v| lenient_number("gpx", ATTR_VERSION, v));
    doc.creator = root.attribute(ATTR_CREATOR).map(str::to_string);

    for child in &root.children {
        fill_doc(child, &mut doc);
    }

    debug!(
        "built GPX document: {} waypoints, {} routes, {} tracks",
        doc.waypoints.len(),
        doc.routes.len(),
        doc.tracks.len()
    );
    Ok(doc)
}

/// Depth-first walk collecting entities wherever they appear below the root.
fn fill_doc(node: &XmlNode, doc: &mut GpxDoc) {
    match Tag::from_name(&node.name) {
        Some(Tag::Wpt) => doc.waypoints.push(build_point(node)),
        Some(Tag::Rte) => doc.routes.push(build_route(node)),
        Some(Tag::Trk) => doc.tracks.push(build_track(node)),
        _ => {}
    }
    for child in &node.children {
        fill_doc(child, doc);
    }
}

/// Fill a point from a wpt, rtept or trkpt element.
fn build_point(node: &XmlNode) -> Waypoint {
    let mut point = Waypoint {
        lat: node
            .attribute(ATTR_LAT)
            .map(|v| lenient_number(&node.name, ATTR_LAT, v)),
        lon: node
            .attribute(ATTR_LON)
            .map(|v| lenient_number(&node.name, ATTR_LON, v)),
        ..Default::default()
    };

    for child in &node.children {
        match classify(&child.name) {
            Some((Tag::Name, _)) => point.name = Some(child.text.clone()),
            Some((_, TagKind::Extension)) => {
                point.extensions.push(child.name.as_str(), child.text.trim());
            }
            _ => {}
        }
    }

    point
}

fn build_route(node: &XmlNode) -> Route {
    let mut route = Route::default();

    for child in &node.children {
        match classify(&child.name) {
            Some((Tag::Name, _)) => route.name = Some(child.text.clone()),
            Some((Tag::Rtept, _)) => route.waypoints.push(build_point(child)),
            Some((_, TagKind::Extension)) => {
                route.extensions.push(child.name.as_str(), child.text.trim());
            }
            _ => {}
        }
    }

    route
}

fn build_track(node: &XmlNode) -> Track {
    let mut track = Track::default();

    for child in &node.children {
        match classify(&child.name) {
            Some((Tag::Name, _)) => track.name = Some(child.text.clone()),
            Some((Tag::Trkseg, _)) => track.segments.push(build_segment(child)),
            Some((_, TagKind::Extension)) => {
                track.extensions.push(child.name.as_str(), child.text.trim());
            }
            _ => {}
        }
    }

    track
}

fn build_segment(node: &XmlNode) -> TrackSegment {
    TrackSegment {
        waypoints: node
            .children
            .iter()
            .filter(|child| Tag::from_name(&child.name) == Some(Tag::Trkpt))
            .map(build_point)
            .collect(),
    }
}

fn lenient_number(element: &str, attribute: &str, text: &str) -> f64 {
    let value = parse_lenient_f64(text);
    if text.trim().parse::<f64>().is_err() {
        warn!("malformed number '{text}' for '{attribute}' on <{element}>, using {value}");
    }
    value
}

/// Parse the longest leading decimal number in `text`, or 0.0 when there is none.
///
/// `"12.5"` → 12.5, `" 7abc"` → 7.0, `"abc"` → 0.0.
pub fn parse_lenient_f64(text: &str) -> f64 {
    let text = text.trim_start();
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}
