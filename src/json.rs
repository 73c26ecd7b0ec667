//! JSON views of a document and decoding of the small JSON objects a front end sends back.
//!
//! Encoding goes through `Serialize` structs so key order is fixed by field
//! order. Decoding parses with `serde_json` first and then projects the few
//! keys the model uses; anything else in the object is ignored.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GpxError;
use crate::geo::{self, LatLon};
use crate::gpx_types::*;
use crate::options::GpxOptions;
use crate::parser::{load_gpx_file, parse_lenient_f64};
use crate::validate::SchemaValidator;
use crate::writer::{to_gpx_bytes, write_gpx_file};

type Result<T> = std::result::Result<T, GpxError>;

/// Header and entity counts of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocSummary<'a> {
    pub version: f64,
    pub creator: &'a str,
    pub num_waypoints: usize,
    pub num_routes: usize,
    pub num_tracks: usize,
}

/// Name, size, rounded length and loop flag of a route or track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSummary<'a> {
    pub name: &'a str,
    pub num_points: usize,
    pub len: f64,
    #[serde(rename = "loop")]
    pub is_loop: bool,
}

/// Everything a file view shows: summaries plus per-entity extension data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxView<'a> {
    pub routes: Vec<PathSummary<'a>>,
    pub tracks: Vec<PathSummary<'a>>,
    pub route_data: Vec<&'a Extensions>,
    pub track_data: Vec<&'a Extensions>,
}

/// Routes and tracks found by an endpoint search. Empty lists when nothing matched.
#[derive(Debug, Clone, Serialize)]
pub struct PathMatches<'a> {
    pub routes: Vec<PathSummary<'a>>,
    pub tracks: Vec<PathSummary<'a>>,
}

pub fn doc_summary(doc: &GpxDoc) -> DocSummary<'_> {
    DocSummary {
        version: doc.version.map_or(0.0, |v| (v * 10.0).round() / 10.0),
        creator: doc.creator.as_deref().unwrap_or(""),
        num_waypoints: doc.num_waypoints(),
        num_routes: doc.num_routes(),
        num_tracks: doc.num_tracks(),
    }
}

pub fn route_summary<'a>(rte: &'a Route, opts: &GpxOptions) -> PathSummary<'a> {
    PathSummary {
        name: rte.name.as_deref().unwrap_or(""),
        num_points: rte.num_points(),
        len: geo::round10(geo::route_len(rte)),
        is_loop: geo::is_loop_route(rte, opts.loop_delta),
    }
}

pub fn track_summary<'a>(trk: &'a Track, opts: &GpxOptions) -> PathSummary<'a> {
    PathSummary {
        name: trk.name.as_deref().unwrap_or(""),
        num_points: trk.num_points(),
        len: geo::round10(geo::track_len(trk)),
        is_loop: geo::is_loop_track(trk, opts.loop_delta),
    }
}

pub fn gpx_to_json(doc: &GpxDoc) -> Result<String> {
    Ok(serde_json::to_string(&doc_summary(doc))?)
}

pub fn route_to_json(rte: &Route, opts: &GpxOptions) -> Result<String> {
    Ok(serde_json::to_string(&route_summary(rte, opts))?)
}

pub fn track_to_json(trk: &Track, opts: &GpxOptions) -> Result<String> {
    Ok(serde_json::to_string(&track_summary(trk, opts))?)
}

/// Accepts a document's route list or the [`Matches`] of a search.
pub fn route_list_to_json<'a>(
    routes: impl IntoIterator<Item = &'a Route>,
    opts: &GpxOptions,
) -> Result<String> {
    let list: Vec<_> = routes.into_iter().map(|r| route_summary(r, opts)).collect();
    Ok(serde_json::to_string(&list)?)
}

pub fn track_list_to_json<'a>(
    tracks: impl IntoIterator<Item = &'a Track>,
    opts: &GpxOptions,
) -> Result<String> {
    let list: Vec<_> = tracks.into_iter().map(|t| track_summary(t, opts)).collect();
    Ok(serde_json::to_string(&list)?)
}

pub fn extensions_to_json(extensions: &Extensions) -> Result<String> {
    Ok(serde_json::to_string(extensions)?)
}

/// One extension array per route.
pub fn route_data_to_json<'a>(routes: impl IntoIterator<Item = &'a Route>) -> Result<String> {
    let data: Vec<&Extensions> = routes.into_iter().map(|r| &r.extensions).collect();
    Ok(serde_json::to_string(&data)?)
}

/// One extension array per track.
pub fn track_data_to_json<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Result<String> {
    let data: Vec<&Extensions> = tracks.into_iter().map(|t| &t.extensions).collect();
    Ok(serde_json::to_string(&data)?)
}

pub fn gpx_view<'a>(doc: &'a GpxDoc, opts: &GpxOptions) -> GpxView<'a> {
    GpxView {
        routes: doc.routes.iter().map(|r| route_summary(r, opts)).collect(),
        tracks: doc.tracks.iter().map(|t| track_summary(t, opts)).collect(),
        route_data: doc.routes.iter().map(|r| &r.extensions).collect(),
        track_data: doc.tracks.iter().map(|t| &t.extensions).collect(),
    }
}

pub fn gpx_view_json(doc: &GpxDoc, opts: &GpxOptions) -> Result<String> {
    Ok(serde_json::to_string(&gpx_view(doc, opts))?)
}

pub fn find_path<'a>(
    doc: &'a GpxDoc,
    src: LatLon,
    dst: LatLon,
    delta: f64,
    opts: &GpxOptions,
) -> PathMatches<'a> {
    PathMatches {
        routes: geo::routes_between(doc, src, dst, delta)
            .map(|found| found.iter().map(|r| route_summary(r, opts)).collect())
            .unwrap_or_default(),
        tracks: geo::tracks_between(doc, src, dst, delta)
            .map(|found| found.iter().map(|t| track_summary(t, opts)).collect())
            .unwrap_or_default(),
    }
}

pub fn find_path_json(
    doc: &GpxDoc,
    src: LatLon,
    dst: LatLon,
    delta: f64,
    opts: &GpxOptions,
) -> Result<String> {
    Ok(serde_json::to_string(&find_path(doc, src, dst, delta, opts))?)
}

/// Summary JSON of a `.gpx` file.
pub fn file_to_json(path: impl AsRef<Path>) -> Result<String> {
    gpx_to_json(&load_gpx_file(path)?)
}

// ---- decoding ----

/// A flat JSON value: numbers and strings are interchangeable, strings are parsed leniently.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn as_f64(&self) -> f64 {
        match self {
            Scalar::Number(n) => *n,
            Scalar::Text(text) => parse_lenient_f64(text),
        }
    }

    fn into_text(self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocFields {
    version: Option<Scalar>,
    creator: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct WaypointFields {
    lat: Option<Scalar>,
    lon: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct RouteFields {
    name: Option<Scalar>,
}

fn parse_object(json: &str, key: &'static str) -> Result<Value> {
    let value: Value = serde_json::from_str(json)?;
    expect_object(value, key)
}

fn expect_object(value: Value, key: &'static str) -> Result<Value> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(GpxError::InvalidJson {
            key,
            reason: format!("expected an object, got {value}"),
        })
    }
}

/// Decode a document header; `version` and `creator` are read, the namespace comes from `opts`.
pub fn json_to_gpx(json: &str, opts: &GpxOptions) -> Result<GpxDoc> {
    if opts.namespace.is_empty() {
        return Err(GpxError::InvalidJson {
            key: "namespace",
            reason: "the document namespace must not be empty".to_string(),
        });
    }
    let fields: DocFields = serde_json::from_value(parse_object(json, "document")?)?;
    let mut doc = GpxDoc::new(opts.namespace.as_str());
    doc.version = fields.version.map(|v| v.as_f64());
    doc.creator = fields.creator.map(Scalar::into_text);
    Ok(doc)
}

/// Decode a waypoint from `lat` and `lon`.
pub fn json_to_waypoint(json: &str) -> Result<Waypoint> {
    waypoint_from_value(parse_object(json, "waypoint")?)
}

fn waypoint_from_value(value: Value) -> Result<Waypoint> {
    let fields: WaypointFields = serde_json::from_value(value)?;
    Ok(Waypoint {
        lat: fields.lat.map(|v| v.as_f64()),
        lon: fields.lon.map(|v| v.as_f64()),
        ..Default::default()
    })
}

/// Decode a route from `name`. The route has no points.
pub fn json_to_route(json: &str) -> Result<Route> {
    let fields: RouteFields = serde_json::from_value(parse_object(json, "route")?)?;
    Ok(Route {
        name: fields.name.map(Scalar::into_text),
        ..Default::default()
    })
}

/// Decode a route and its points, `waypoints_json` being an array of waypoint objects.
pub fn json_to_route_with_waypoints(route_json: &str, waypoints_json: &str) -> Result<Route> {
    let mut route = json_to_route(route_json)?;
    let Value::Array(items) = serde_json::from_str::<Value>(waypoints_json)? else {
        return Err(GpxError::InvalidJson {
            key: "waypoints",
            reason: "expected an array of waypoint objects".to_string(),
        });
    };
    for item in items {
        route.add_waypoint(waypoint_from_value(expect_object(item, "waypoints")?)?);
    }
    Ok(route)
}

/// Decode a route with its points and append it to `doc`.
pub fn add_route_json(doc: &mut GpxDoc, route_json: &str, waypoints_json: &str) -> Result<()> {
    let route = json_to_route_with_waypoints(route_json, waypoints_json)?;
    debug!(
        "adding route {:?} with {} points",
        route.name.as_deref().unwrap_or(""),
        route.num_points()
    );
    doc.add_route(route);
    Ok(())
}

/// Load a `.gpx` file, append a route decoded from JSON and write the file back.
pub fn add_route_to_file(
    path: impl AsRef<Path>,
    route_json: &str,
    waypoints_json: &str,
    opts: &GpxOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut doc = load_gpx_file(path)?;
    add_route_json(&mut doc, route_json, waypoints_json)?;
    write_gpx_file(&doc, path, opts)
}

/// Decode a document header from JSON and serialize it, provided `validator` accepts the result.
pub fn create_gpx(
    json: &str,
    validator: &impl SchemaValidator,
    opts: &GpxOptions,
) -> Result<Vec<u8>> {
    let doc = json_to_gpx(json, opts)?;
    let bytes = to_gpx_bytes(&doc, opts)?;
    if !validator.validate(&bytes) {
        return Err(GpxError::SchemaInvalid);
    }
    Ok(bytes)
}

/// [`create_gpx`], writing the document to a `.gpx` file. Nothing is written when validation fails.
pub fn create_gpx_file(
    path: impl AsRef<Path>,
    json: &str,
    validator: &impl SchemaValidator,
    opts: &GpxOptions,
) -> Result<()> {
    let path = path.as_ref();
    crate::parser::check_gpx_extension(path)?;
    let bytes = create_gpx(json, validator, opts)?;
    std::fs::write(path, bytes)?;
    debug!("created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GPX_NAMESPACE;
    use crate::validate::Gpx11Validator;

    fn opts() -> GpxOptions {
        GpxOptions::default()
    }

    #[test]
    fn test_empty_document_summary() {
        let doc = GpxDoc::new(GPX_NAMESPACE);
        assert_eq!(
            gpx_to_json(&doc).unwrap(),
            r#"{"version":0.0,"creator":"","numWaypoints":0,"numRoutes":0,"numTracks":0}"#
        );
    }

    #[test]
    fn test_document_summary() {
        let mut doc = GpxDoc::new(GPX_NAMESPACE);
        doc.version = Some(1.1);
        doc.creator = Some("Garmin \"Edge\"".to_string());
        doc.waypoints.push(Waypoint::new(1.0, 1.0));
        assert_eq!(
            gpx_to_json(&doc).unwrap(),
            r#"{"version":1.1,"creator":"Garmin \"Edge\"","numWaypoints":1,"numRoutes":0,"numTracks":0}"#
        );
    }

    #[test]
    fn test_three_point_route_summary() {
        let mut rte = Route {
            name: Some("A".to_string()),
            ..Default::default()
        };
        rte.add_waypoint(Waypoint::new(0.0, 0.0));
        rte.add_waypoint(Waypoint::new(0.0, 0.001));
        rte.add_waypoint(Waypoint::new(0.0, 0.0));
        // 2 x 111.19 m
        assert_eq!(
            route_to_json(&rte, &opts()).unwrap(),
            r#"{"name":"A","numPoints":3,"len":220.0,"loop":false}"#
        );
    }

    #[test]
    fn test_square_track_is_loop() {
        let trk = Track {
            name: Some("Square".to_string()),
            segments: vec![TrackSegment {
                waypoints: vec![
                    Waypoint::new(0.0, 0.0),
                    Waypoint::new(0.0, 1.0),
                    Waypoint::new(1.0, 1.0),
                    Waypoint::new(0.000005, 0.0),
                ],
            }],
            ..Default::default()
        };
        let summary = track_summary(&trk, &opts());
        assert!(summary.is_loop);
        assert_eq!(summary.num_points, 4);
        let json = track_to_json(&trk, &opts()).unwrap();
        assert!(json.ends_with(r#""loop":true}"#), "{json}");
    }

    #[test]
    fn test_loop_delta_from_options() {
        let rte = Route {
            waypoints: vec![
                Waypoint::new(0.0, 0.0),
                Waypoint::new(0.0, 0.001),
                Waypoint::new(0.001, 0.001),
                Waypoint::new(0.0002, 0.0),
            ],
            ..Default::default()
        };
        // start and end are about 22 m apart
        assert!(!route_summary(&rte, &opts()).is_loop);
        let wide = GpxOptions {
            loop_delta: 50.0,
            ..Default::default()
        };
        assert!(route_summary(&rte, &wide).is_loop);
    }

    #[test]
    fn test_unnamed_route_and_lists() {
        let doc = GpxDoc {
            routes: vec![Route::default()],
            ..Default::default()
        };
        assert_eq!(
            route_list_to_json(&doc.routes, &opts()).unwrap(),
            r#"[{"name":"","numPoints":0,"len":0.0,"loop":false}]"#
        );
        assert_eq!(track_list_to_json(&doc.tracks, &opts()).unwrap(), "[]");
    }

    #[test]
    fn test_extension_data() {
        let mut rte = Route::default();
        rte.extensions.push("desc", "Hill");
        rte.extensions.push("desc", "Repeat");
        assert_eq!(
            extensions_to_json(&rte.extensions).unwrap(),
            r#"[{"name":"desc","value":"Hill"},{"name":"desc","value":"Repeat"}]"#
        );
        let routes = [rte, Route::default()];
        assert_eq!(
            route_data_to_json(&routes).unwrap(),
            r#"[[{"name":"desc","value":"Hill"},{"name":"desc","value":"Repeat"}],[]]"#
        );
        assert_eq!(track_data_to_json(&Vec::<Track>::new()).unwrap(), "[]");
    }

    #[test]
    fn test_view_and_find_path() {
        let mut doc = GpxDoc::new(GPX_NAMESPACE);
        let mut rte = Route {
            name: Some("Out".to_string()),
            ..Default::default()
        };
        rte.extensions.push("desc", "x");
        rte.add_waypoint(Waypoint::new(0.0, 0.0));
        rte.add_waypoint(Waypoint::new(0.0, 0.001));
        doc.add_route(rte);

        assert_eq!(
            gpx_view_json(&doc, &opts()).unwrap(),
            r#"{"routes":[{"name":"Out","numPoints":2,"len":110.0,"loop":false}],"tracks":[],"routeData":[[{"name":"desc","value":"x"}]],"trackData":[]}"#
        );

        let src = LatLon::new(0.0, 0.0);
        let dst = LatLon::new(0.0, 0.001);
        assert_eq!(
            find_path_json(&doc, src, dst, 1.0, &opts()).unwrap(),
            r#"{"routes":[{"name":"Out","numPoints":2,"len":110.0,"loop":false}],"tracks":[]}"#
        );
        assert_eq!(
            find_path_json(&doc, dst, src, 1.0, &opts()).unwrap(),
            r#"{"routes":[],"tracks":[]}"#
        );
    }

    #[test]
    fn test_matches_as_list() {
        let mut doc = GpxDoc::new(GPX_NAMESPACE);
        doc.add_route(Route {
            name: Some("Solo".to_string()),
            waypoints: vec![Waypoint::new(1.0, 1.0)],
            ..Default::default()
        });
        let here = LatLon::new(1.0, 1.0);
        let found = geo::routes_between(&doc, here, here, 0.0).unwrap();
        assert_eq!(
            route_list_to_json(found, &opts()).unwrap(),
            r#"[{"name":"Solo","numPoints":1,"len":0.0,"loop":false}]"#
        );
    }

    #[test]
    fn test_json_to_gpx() {
        let doc = json_to_gpx(
            r#"{"version":1.1,"creator":"web","extra":{"ignored":[1,2]}}"#,
            &opts(),
        )
        .unwrap();
        assert_eq!(doc.version, Some(1.1));
        assert_eq!(doc.creator.as_deref(), Some("web"));
        assert_eq!(doc.namespace, GPX_NAMESPACE);
        assert!(doc.waypoints.is_empty() && doc.routes.is_empty() && doc.tracks.is_empty());

        let doc = json_to_gpx(r#"{"version":"1.1abc"}"#, &opts()).unwrap();
        assert_eq!(doc.version, Some(1.1));
        assert!(doc.creator.is_none());
    }

    #[test]
    fn test_json_decode_rejects_bad_shapes() {
        assert!(matches!(
            json_to_gpx("[1,2]", &opts()),
            Err(GpxError::InvalidJson { key: "document", .. })
        ));
        assert!(matches!(
            json_to_waypoint(r#"{"lat":{"deg":1}}"#),
            Err(GpxError::Json(_))
        ));
        assert!(matches!(json_to_route("{"), Err(GpxError::Json(_))));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let no_ns = GpxOptions {
            namespace: String::new(),
            ..Default::default()
        };
        let header = r#"{"version":1.1,"creator":"web"}"#;
        assert!(matches!(
            json_to_gpx(header, &no_ns),
            Err(GpxError::InvalidJson { key: "namespace", .. })
        ));
        // nothing reaches the serializer or validator
        let accept = |_: &[u8]| true;
        assert!(matches!(
            create_gpx(header, &accept, &no_ns),
            Err(GpxError::InvalidJson { key: "namespace", .. })
        ));
    }

    #[test]
    fn test_json_to_waypoint_and_route() {
        let pt = json_to_waypoint(r#"{"lat":"43.5","lon":-80.25,"name":"ignored"}"#).unwrap();
        assert_eq!(pt.lat, Some(43.5));
        assert_eq!(pt.lon, Some(-80.25));
        assert!(pt.name.is_none());

        let rte = json_to_route(r#"{"name":"Evening"}"#).unwrap();
        assert_eq!(rte.name.as_deref(), Some("Evening"));
        assert!(rte.waypoints.is_empty());

        let numbered = json_to_route(r#"{"name":7}"#).unwrap();
        assert_eq!(numbered.name.as_deref(), Some("7"));
    }

    #[test]
    fn test_add_route_json() {
        let mut doc = GpxDoc::new(GPX_NAMESPACE);
        add_route_json(
            &mut doc,
            r#"{"name":"New"}"#,
            r#"[{"lat":1,"lon":2},{"lat":3,"lon":4}]"#,
        )
        .unwrap();
        let rte = doc.route("New").unwrap();
        assert_eq!(rte.num_points(), 2);
        assert_eq!(rte.waypoints[1].lat_lon(), (3.0, 4.0));

        assert!(matches!(
            add_route_json(&mut doc, r#"{"name":"Bad"}"#, r#"{"lat":1}"#),
            Err(GpxError::InvalidJson { key: "waypoints", .. })
        ));
        assert!(add_route_json(&mut doc, r#"{"name":"Bad"}"#, r#"[1]"#).is_err());
        assert_eq!(doc.num_routes(), 1);
    }

    #[test]
    fn test_create_gpx() {
        let bytes =
            create_gpx(r#"{"version":1.1,"creator":"web"}"#, &Gpx11Validator, &opts()).unwrap();
        let doc = crate::parser::parse_gpx_bytes(&bytes).unwrap();
        assert_eq!(doc.creator.as_deref(), Some("web"));
        assert_eq!(doc.version, Some(1.1));

        // no creator: the structural validator refuses it
        assert!(matches!(
            create_gpx(r#"{"version":1.1}"#, &Gpx11Validator, &opts()),
            Err(GpxError::SchemaInvalid)
        ));
    }

    #[test]
    fn test_create_and_extend_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.gpx");

        let header = r#"{"version":1.1,"creator":"web"}"#;
        let reject = |_: &[u8]| false;
        assert!(create_gpx_file(&path, header, &reject, &opts()).is_err());
        assert!(!path.exists());

        create_gpx_file(&path, header, &Gpx11Validator, &opts()).unwrap();
        assert_eq!(
            file_to_json(&path).unwrap(),
            r#"{"version":1.1,"creator":"web","numWaypoints":0,"numRoutes":0,"numTracks":0}"#
        );

        add_route_to_file(&path, r#"{"name":"R"}"#, r#"[{"lat":1,"lon":1}]"#, &opts()).unwrap();
        let doc = load_gpx_file(&path).unwrap();
        assert_eq!(doc.routes[0].name.as_deref(), Some("R"));
        assert_eq!(doc.routes[0].num_points(), 1);
    }
}
