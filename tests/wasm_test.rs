#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

const ROUTE_GPX: &str = r#"<?xml version="1.0"?>
<gpx xmlns="http://www.topografix.com/GPX/1/1" version="1.1" creator="wasm">
  <rte>
    <name>A</name>
    <rtept lat="0" lon="0"/>
    <rtept lat="0" lon="0.001"/>
    <rtept lat="0" lon="0"/>
  </rte>
</gpx>"#;

#[wasm_bindgen_test]
fn gpx_to_json_summary() {
    let json = gpxview_wasm::gpx_to_json(ROUTE_GPX).unwrap();
    assert_eq!(
        json,
        r#"{"version":1.1,"creator":"wasm","numWaypoints":0,"numRoutes":1,"numTracks":0}"#
    );
}

#[wasm_bindgen_test]
fn view_and_find_path() {
    let view = gpxview_wasm::gpx_view_to_json(ROUTE_GPX, JsValue::UNDEFINED).unwrap();
    assert!(view.contains(r#"{"name":"A","numPoints":3,"len":220.0,"loop":false}"#));

    let found =
        gpxview_wasm::find_path_to_json(ROUTE_GPX, 0.0, 0.0, 0.0, 0.0, 1.0, JsValue::NULL).unwrap();
    assert!(found.starts_with(r#"{"routes":[{"name":"A""#));
}

#[wasm_bindgen_test]
fn create_then_add_route() {
    let gpx =
        gpxview_wasm::create_gpx(r#"{"version":1.1,"creator":"wasm"}"#, JsValue::UNDEFINED)
            .unwrap();
    let extended = gpxview_wasm::add_route(
        &gpx,
        r#"{"name":"New"}"#,
        r#"[{"lat":1,"lon":2}]"#,
        JsValue::UNDEFINED,
    )
    .unwrap();
    let summary = gpxview_wasm::gpx_to_json(&extended).unwrap();
    assert!(summary.contains(r#""numRoutes":1"#));
}

#[wasm_bindgen_test]
fn errors_become_js_values() {
    assert!(gpxview_wasm::gpx_to_json("<kml/>").is_err());
    assert!(gpxview_wasm::create_gpx(r#"{"version":1.1}"#, JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn geojson_export() {
    let fc = gpxview_wasm::gpx_to_geojson(ROUTE_GPX, JsValue::UNDEFINED).unwrap();
    assert!(fc.is_object());
}
