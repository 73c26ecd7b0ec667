use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// An opaque child element kept by name: its tag and trimmed text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub name: String,
    pub value: String,
}

/// Ordered store of extension entries. Repeated names are kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Extensions(Vec<Extension>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Extension {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extension> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the first entry with this name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|ext| ext.name == name)
            .map(|ext| ext.value.as_str())
    }

    /// Values of every entry with this name, in document order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .filter(move |ext| ext.name == name)
            .map(|ext| ext.value.as_str())
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = &'a Extension;
    type IntoIter = std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Extension> for Extensions {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A parsed GPX document: header plus every waypoint, route and track it owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxDoc {
    pub namespace: String,
    pub version: Option<f64>,
    pub creator: Option<String>,
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<Route>,
    pub tracks: Vec<Track>,
}

impl GpxDoc {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn num_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Segments across all tracks.
    pub fn num_segments(&self) -> usize {
        self.tracks.iter().map(|trk| trk.segments.len()).sum()
    }

    /// Every present name plus every extension entry, on every entity and nested point.
    pub fn num_data(&self) -> usize {
        let waypoints: usize = self.waypoints.iter().map(Waypoint::num_data).sum();
        let routes: usize = self
            .routes
            .iter()
            .map(|rte| {
                name_count(&rte.name)
                    + rte.extensions.len()
                    + rte.waypoints.iter().map(Waypoint::num_data).sum::<usize>()
            })
            .sum();
        let tracks: usize = self
            .tracks
            .iter()
            .map(|trk| {
                name_count(&trk.name)
                    + trk.extensions.len()
                    + trk.points().map(Waypoint::num_data).sum::<usize>()
            })
            .sum();
        waypoints + routes + tracks
    }

    /// First waypoint with this name.
    pub fn waypoint(&self, name: &str) -> Option<&Waypoint> {
        find_named(&self.waypoints, name)
    }

    /// First route with this name.
    pub fn route(&self, name: &str) -> Option<&Route> {
        find_named(&self.routes, name)
    }

    /// First track with this name.
    pub fn track(&self, name: &str) -> Option<&Track> {
        find_named(&self.tracks, name)
    }
}

/// A single GPX point (used for wpt, rtept, trkpt).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waypoint {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub extensions: Extensions,
}

impl Waypoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
            ..Default::default()
        }
    }

    /// Coordinates for analysis; a missing value counts as 0.0.
    pub fn lat_lon(&self) -> (f64, f64) {
        (self.lat.unwrap_or(0.0), self.lon.unwrap_or(0.0))
    }

    fn num_data(&self) -> usize {
        name_count(&self.name) + self.extensions.len()
    }
}

/// A GPX route (<rte>).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub name: Option<String>,
    pub waypoints: Vec<Waypoint>,
    pub extensions: Extensions,
}

impl Route {
    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    pub fn num_points(&self) -> usize {
        self.waypoints.len()
    }
}

/// A GPX track (<trk>).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub segments: Vec<TrackSegment>,
    pub extensions: Extensions,
}

impl Track {
    /// Points across all segments.
    pub fn num_points(&self) -> usize {
        self.segments.iter().map(|seg| seg.waypoints.len()).sum()
    }
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSegment {
    pub waypoints: Vec<Waypoint>,
}

/// Entities that carry an optional name.
pub trait Named {
    fn name(&self) -> Option<&str>;

    /// Orders by name, an absent name sorting like an empty one.
    fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name().unwrap_or("").cmp(other.name().unwrap_or(""))
    }
}

impl Named for Waypoint {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Named for Route {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Named for Track {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Entities made of an ordered run of points. Tracks flatten their segments.
pub trait Points {
    fn points(&self) -> impl Iterator<Item = &Waypoint>;
}

impl Points for Route {
    fn points(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }
}

impl Points for Track {
    fn points(&self) -> impl Iterator<Item = &Waypoint> {
        self.segments.iter().flat_map(|seg| seg.waypoints.iter())
    }
}

impl Points for TrackSegment {
    fn points(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }
}

/// Entities selected from a document by a query.
///
/// Holds borrowed references only: the document keeps ownership, and dropping
/// the view leaves every entity in place.
#[derive(Debug)]
pub struct Matches<'a, T> {
    items: Vec<&'a T>,
}

impl<'a, T> Matches<'a, T> {
    /// `None` when nothing matched.
    pub(crate) fn non_empty(items: Vec<&'a T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.items.iter().copied()
    }
}

impl<'a, T> IntoIterator for Matches<'a, T> {
    type Item = &'a T;
    type IntoIter = std::vec::IntoIter<&'a T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, 'm, T> IntoIterator for &'m Matches<'a, T> {
    type Item = &'a T;
    type IntoIter = std::iter::Copied<std::slice::Iter<'m, &'a T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().copied()
    }
}

fn find_named<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == Some(name))
}

fn name_count(name: &Option<String>) -> usize {
    usize::from(name.is_some())
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "Name: {name}")?;
        }
        if let Some(lat) = self.lat {
            writeln!(f, "Latitude: {lat}")?;
        }
        if let Some(lon) = self.lon {
            writeln!(f, "Longitude: {lon}")?;
        }
        for ext in &self.extensions {
            writeln!(f, "{ext}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "Name: {name}")?;
        }
        for ext in &self.extensions {
            writeln!(f, "{ext}")?;
        }
        for (i, pt) in self.waypoints.iter().enumerate() {
            writeln!(f, "-- Point {i}")?;
            write!(f, "{pt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TrackSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pt) in self.waypoints.iter().enumerate() {
            writeln!(f, "-- Point {i}")?;
            write!(f, "{pt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "Name: {name}")?;
        }
        for ext in &self.extensions {
            writeln!(f, "{ext}")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            writeln!(f, "-- Segment {i}")?;
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl fmt::Display for GpxDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(version) = self.version {
            writeln!(f, "Version: {version:.1}")?;
        }
        if let Some(creator) = &self.creator {
            writeln!(f, "Creator: {creator}")?;
        }
        writeln!(f, "Namespace: {}", self.namespace)?;
        writeln!(f, "----<Waypoints>----")?;
        for wpt in &self.waypoints {
            write!(f, "{wpt}")?;
        }
        writeln!(f, "----<Routes>----")?;
        for rte in &self.routes {
            write!(f, "{rte}")?;
        }
        writeln!(f, "----<Tracks>----")?;
        for trk in &self.tracks {
            write!(f, "{trk}")?;
        }
        Ok(())
    }
}
