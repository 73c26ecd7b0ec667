pub mod converter;
pub mod error;
pub mod geo;
pub mod gpx_types;
pub mod json;
pub mod options;
pub mod parser;
pub mod tags;
pub mod tree;
pub mod validate;
pub mod writer;

use wasm_bindgen::prelude::*;

use crate::error::GpxError;
use crate::geo::LatLon;
use crate::options::GpxOptions;
use crate::validate::Gpx11Validator;

pub use crate::gpx_types::{GpxDoc, Route, Track, TrackSegment, Waypoint};
pub use crate::parser::{load_gpx_file, load_valid_gpx_file, parse_gpx};
pub use crate::writer::{to_gpx_bytes, write_gpx_file};

/// Summary of a GPX string: version, creator and entity counts.
#[wasm_bindgen(js_name = gpxToJson)]
pub fn gpx_to_json(gpx_string: &str) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let doc = parser::parse_gpx(gpx_string)?;
    Ok(json::gpx_to_json(&doc)?)
}

/// Route and track summaries plus their extension data.
#[wasm_bindgen(js_name = gpxViewToJson)]
pub fn gpx_view_to_json(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let doc = parser::parse_gpx(gpx_string)?;
    Ok(json::gpx_view_json(&doc, &opts)?)
}

/// Routes and tracks that start near the source and end near the destination.
#[wasm_bindgen(js_name = findPathToJson)]
pub fn find_path_to_json(
    gpx_string: &str,
    source_lat: f64,
    source_lon: f64,
    dest_lat: f64,
    dest_lon: f64,
    delta: f64,
    options: JsValue,
) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let doc = parser::parse_gpx(gpx_string)?;
    let src = LatLon::new(source_lat, source_lon);
    let dst = LatLon::new(dest_lat, dest_lon);
    Ok(json::find_path_json(&doc, src, dst, delta, &opts)?)
}

/// Build a new GPX document from `{"version":..,"creator":..}`; fails unless it is valid GPX 1.1.
#[wasm_bindgen(js_name = createGpx)]
pub fn create_gpx(json_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let bytes = json::create_gpx(json_string, &Gpx11Validator, &opts)?;
    Ok(String::from_utf8(bytes).map_err(GpxError::from)?)
}

/// Append a route (`{"name":..}` plus an array of `{"lat":..,"lon":..}`) and return the new GPX.
#[wasm_bindgen(js_name = addRoute)]
pub fn add_route(
    gpx_string: &str,
    route_json: &str,
    waypoints_json: &str,
    options: JsValue,
) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let mut doc = parser::parse_gpx(gpx_string)?;
    json::add_route_json(&mut doc, route_json, waypoints_json)?;
    Ok(writer::to_gpx_string(&doc, &opts)?)
}

/// Convert a GPX string to GeoJSON, returned as a JS object.
#[wasm_bindgen(js_name = gpxToGeoJson)]
pub fn gpx_to_geojson(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let doc = parser::parse_gpx(gpx_string)?;
    let fc = converter::to_feature_collection(&doc, &opts);
    serde_wasm_bindgen::to_value(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> Result<GpxOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(GpxOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
