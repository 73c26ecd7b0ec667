use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::gpx_types::*;
use crate::json::{PathSummary, route_summary, track_summary};
use crate::options::GpxOptions;

/// Convert a document to a GeoJSON FeatureCollection for map display.
pub fn to_feature_collection(doc: &GpxDoc, opts: &GpxOptions) -> FeatureCollection {
    let mut features = Vec::new();

    for wpt in &doc.waypoints {
        if let Some(coords) = point_coords(wpt) {
            let mut props = base_props("waypoint", wpt.name.as_deref(), &wpt.extensions);
            insert_coordinate_times(&mut props, [wpt]);
            features.push(feature(Value::Point(coords), props));
        }
    }

    for rte in &doc.routes {
        features.extend(route_to_feature(rte, opts));
    }

    for trk in &doc.tracks {
        features.extend(track_to_feature(trk, opts));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn route_to_feature(rte: &Route, opts: &GpxOptions) -> Option<Feature> {
    let positioned: Vec<&Waypoint> = rte.points().filter(|pt| point_coords(pt).is_some()).collect();
    let coords: Vec<Vec<f64>> = positioned.iter().filter_map(|pt| point_coords(pt)).collect();

    let mut props = base_props("route", rte.name.as_deref(), &rte.extensions);
    insert_summary(&mut props, &route_summary(rte, opts));
    insert_coordinate_times(&mut props, positioned.iter().copied());

    let geometry = match coords.len() {
        0 => return None,
        // a lone point has no line to draw
        1 => Value::Point(coords.into_iter().next()?),
        _ => Value::LineString(coords),
    };
    Some(feature(geometry, props))
}

fn track_to_feature(trk: &Track, opts: &GpxOptions) -> Option<Feature> {
    let segments: Vec<Vec<&Waypoint>> = trk
        .segments
        .iter()
        .map(|seg| seg.points().filter(|pt| point_coords(pt).is_some()).collect::<Vec<_>>())
        .filter(|points| !points.is_empty())
        .collect();

    let mut props = base_props("track", trk.name.as_deref(), &trk.extensions);
    insert_summary(&mut props, &track_summary(trk, opts));

    // Single positioned point across all segments → Point Feature
    let total_points: usize = segments.iter().map(Vec::len).sum();
    if total_points == 1 {
        let pt = segments.first()?.first()?;
        insert_coordinate_times(&mut props, [*pt]);
        return Some(feature(Value::Point(point_coords(pt)?), props));
    }

    let lines: Vec<&Vec<&Waypoint>> = segments.iter().filter(|points| points.len() >= 2).collect();
    if lines.is_empty() {
        return None;
    }

    let line_strings: Vec<Vec<Vec<f64>>> = lines
        .iter()
        .map(|points| points.iter().filter_map(|pt| point_coords(pt)).collect())
        .collect();

    let all_times: Vec<JsonValue> = lines
        .iter()
        .map(|points| JsonValue::Array(points.iter().map(|pt| point_time(pt)).collect()))
        .collect();
    if all_times
        .iter()
        .filter_map(JsonValue::as_array)
        .any(|times| times.iter().any(|t| !t.is_null()))
    {
        let mut coord_props = Map::new();
        coord_props.insert("times".to_string(), JsonValue::Array(all_times));
        props.insert(
            "coordinateProperties".to_string(),
            JsonValue::Object(coord_props),
        );
    }

    Some(feature(Value::MultiLineString(line_strings), props))
}

fn feature(value: Value, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

fn base_props(
    gpx_type: &str,
    name: Option<&str>,
    extensions: &Extensions,
) -> Map<String, JsonValue> {
    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String(gpx_type.to_string()),
    );
    if let Some(name) = name {
        props.insert("name".to_string(), JsonValue::String(name.to_string()));
    }
    // first entry wins for repeated names
    for ext in extensions {
        props
            .entry(ext.name.clone())
            .or_insert_with(|| JsonValue::String(ext.value.clone()));
    }
    props
}

fn insert_summary(props: &mut Map<String, JsonValue>, summary: &PathSummary<'_>) {
    props.insert("numPoints".to_string(), summary.num_points.into());
    props.insert("len".to_string(), summary.len.into());
    props.insert("loop".to_string(), summary.is_loop.into());
}

/// Build [lon, lat] or [lon, lat, ele]; `None` when a coordinate is missing.
fn point_coords(pt: &Waypoint) -> Option<Vec<f64>> {
    let (lat, lon) = (pt.lat?, pt.lon?);
    let ele = pt
        .extensions
        .get("ele")
        .and_then(|ele| ele.trim().parse::<f64>().ok());
    Some(match ele {
        Some(ele) => vec![lon, lat, ele],
        None => vec![lon, lat],
    })
}

fn point_time(pt: &Waypoint) -> JsonValue {
    match pt.extensions.get("time") {
        Some(t) => JsonValue::String(t.to_string()),
        None => JsonValue::Null,
    }
}

fn insert_coordinate_times<'a>(
    props: &mut Map<String, JsonValue>,
    points: impl IntoIterator<Item = &'a Waypoint>,
) {
    let times: Vec<JsonValue> = points.into_iter().map(point_time).collect();

    // Only include if at least one time is present
    if times.iter().any(|t| !t.is_null()) {
        let mut coord_props = Map::new();
        coord_props.insert("times".to_string(), JsonValue::Array(times));
        props.insert(
            "coordinateProperties".to_string(),
            JsonValue::Object(coord_props),
        );
    }
}
