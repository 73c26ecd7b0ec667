//! Element vocabulary shared by the builder, the serializer and the validator.
//!
//! Every tag the model understands is listed once in [`TAGS`]; the builder
//! only extracts what this table names, and the serializer only emits names
//! taken from it (plus the stored names of extension entries).

pub const ATTR_LAT: &str = "lat";
pub const ATTR_LON: &str = "lon";
pub const ATTR_VERSION: &str = "version";
pub const ATTR_CREATOR: &str = "creator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Gpx,
    Wpt,
    Rte,
    Trk,
    Name,
    Desc,
    Ele,
    Time,
    Rtept,
    Trkseg,
    Trkpt,
}

/// How a tag maps onto the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Document root or a top-level entity.
    Entity,
    /// Typed field of its parent.
    Field,
    /// Captured verbatim into the parent's extension store.
    Extension,
    /// Nested container or point.
    Structure,
}

const TAGS: [(&str, Tag, TagKind); 11] = [
    ("gpx", Tag::Gpx, TagKind::Entity),
    ("wpt", Tag::Wpt, TagKind::Entity),
    ("rte", Tag::Rte, TagKind::Entity),
    ("trk", Tag::Trk, TagKind::Entity),
    ("name", Tag::Name, TagKind::Field),
    ("desc", Tag::Desc, TagKind::Extension),
    ("ele", Tag::Ele, TagKind::Extension),
    ("time", Tag::Time, TagKind::Extension),
    ("rtept", Tag::Rtept, TagKind::Structure),
    ("trkseg", Tag::Trkseg, TagKind::Structure),
    ("trkpt", Tag::Trkpt, TagKind::Structure),
];

impl Tag {
    pub fn from_name(name: &str) -> Option<Tag> {
        TAGS.iter()
            .find(|(tag_name, _, _)| *tag_name == name)
            .map(|(_, tag, _)| *tag)
    }

    pub fn as_str(self) -> &'static str {
        TAGS.iter()
            .find(|(_, tag, _)| *tag == self)
            .map(|(name, _, _)| *name)
            .unwrap_or_default()
    }

    pub fn kind(self) -> TagKind {
        TAGS.iter()
            .find(|(_, tag, _)| *tag == self)
            .map(|(_, _, kind)| *kind)
            .unwrap_or(TagKind::Structure)
    }

    /// Tag names whose text is kept as extension data.
    pub fn extension_names() -> impl Iterator<Item = &'static str> {
        TAGS.iter()
            .filter(|(_, _, kind)| *kind == TagKind::Extension)
            .map(|(name, _, _)| *name)
    }
}

/// Classify an element name, `None` for names outside the vocabulary.
pub fn classify(name: &str) -> Option<(Tag, TagKind)> {
    Tag::from_name(name).map(|tag| (tag, tag.kind()))
}
