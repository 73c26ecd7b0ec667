//! Distances, lengths and endpoint queries over routes and tracks.
//!
//! All distances are great-circle distances in meters on a sphere of radius
//! [`EARTH_RADIUS_M`]. Points with a missing coordinate are treated as 0.0.

use crate::gpx_types::*;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum number of points before a path can count as a loop.
pub const MIN_LOOP_POINTS: usize = 4;

/// A query position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn distance_to(&self, other: &LatLon) -> f64 {
        haversine(self.lat, self.lon, other.lat, other.lon)
    }
}

impl From<&Waypoint> for LatLon {
    fn from(pt: &Waypoint) -> Self {
        let (lat, lon) = pt.lat_lon();
        Self { lat, lon }
    }
}

/// Great-circle distance in meters between two points given in degrees.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // rounding can push `a` just past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn distance(a: &Waypoint, b: &Waypoint) -> f64 {
    LatLon::from(a).distance_to(&LatLon::from(b))
}

/// Sum of the distances between consecutive points.
pub fn path_length<'a>(points: impl IntoIterator<Item = &'a Waypoint>) -> f64 {
    let mut total = 0.0;
    let mut prev: Option<&Waypoint> = None;
    for pt in points {
        if let Some(p) = prev {
            total += distance(p, pt);
        }
        prev = Some(pt);
    }
    total
}

pub fn route_len(rte: &Route) -> f64 {
    path_length(rte.points())
}

/// Length of all segments joined end to end, including the gaps between segments.
pub fn track_len(trk: &Track) -> f64 {
    path_length(trk.points())
}

/// At least [`MIN_LOOP_POINTS`] points, with the last within `delta` meters of the first.
pub fn is_loop<'a>(points: impl IntoIterator<Item = &'a Waypoint>, delta: f64) -> bool {
    if delta < 0.0 {
        return false;
    }
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return false;
    };
    let mut count = 1;
    let mut last = first;
    for pt in iter {
        count += 1;
        last = pt;
    }
    count >= MIN_LOOP_POINTS && distance(first, last) <= delta
}

pub fn is_loop_route(rte: &Route, delta: f64) -> bool {
    is_loop(rte.points(), delta)
}

pub fn is_loop_track(trk: &Track, delta: f64) -> bool {
    is_loop(trk.points(), delta)
}

/// Round to the nearest multiple of ten, halves away from zero.
pub fn round10(len: f64) -> f64 {
    (len / 10.0).round() * 10.0
}

fn endpoints<P: Points>(entity: &P) -> Option<(LatLon, LatLon)> {
    let mut points = entity.points();
    let first = points.next()?;
    let last = points.last().unwrap_or(first);
    Some((first.into(), last.into()))
}

fn between<'a, T: Points>(
    items: &'a [T],
    src: LatLon,
    dst: LatLon,
    delta: f64,
) -> Option<Matches<'a, T>> {
    if delta < 0.0 {
        return None;
    }
    let found = items
        .iter()
        .filter(|item| {
            endpoints(*item).is_some_and(|(first, last)| {
                first.distance_to(&src) <= delta && last.distance_to(&dst) <= delta
            })
        })
        .collect();
    Matches::non_empty(found)
}

/// Routes starting within `delta` of `src` and ending within `delta` of `dst`.
pub fn routes_between(
    doc: &GpxDoc,
    src: LatLon,
    dst: LatLon,
    delta: f64,
) -> Option<Matches<'_, Route>> {
    between(&doc.routes, src, dst, delta)
}

/// Tracks starting within `delta` of `src` and ending within `delta` of `dst`.
pub fn tracks_between(
    doc: &GpxDoc,
    src: LatLon,
    dst: LatLon,
    delta: f64,
) -> Option<Matches<'_, Track>> {
    between(&doc.tracks, src, dst, delta)
}

pub fn num_routes_with_length(doc: &GpxDoc, len: f64, delta: f64) -> usize {
    count_with_length(doc.routes.iter().map(route_len), len, delta)
}

pub fn num_tracks_with_length(doc: &GpxDoc, len: f64, delta: f64) -> usize {
    count_with_length(doc.tracks.iter().map(track_len), len, delta)
}

fn count_with_length(lengths: impl Iterator<Item = f64>, len: f64, delta: f64) -> usize {
    if len < 0.0 || delta < 0.0 {
        return 0;
    }
    lengths.filter(|l| (l - len).abs() <= delta).count()
}
