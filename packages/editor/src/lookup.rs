//! Lookup ids and the marker channel names shared by the three editors.
//!
//! Ids are handed to the render host embedded in marker constructs and come
//! back from rendered nodes; they stay opaque strings everywhere outside
//! this crate.

use crc32fast::Hasher;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Literal attribute carrying an element's id on rendered markup.
pub const MARKUP_MARKER_ATTR: &str = "data-easel-lookup";
/// Short-lived attribute tagging elements created in the current revision.
pub const MARKUP_RECENT_ATTR: &str = "data-easel-lookup-new";
/// Custom-property name prefix for tagged-template markers.
pub const STYLED_MARKER_PREFIX: &str = "--easel-styled-lookup-";
/// Custom-property name prefix for stylesheet rule markers.
pub const SHEET_MARKER_PREFIX: &str = "--easel-sheet-lookup-";

/// Construct class a marker belongs to. Each class counts its own ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerClass {
    Element,
    Styled,
    Sheet,
}

impl MarkerClass {
    pub fn tag(&self) -> &'static str {
        match self {
            MarkerClass::Element => "el",
            MarkerClass::Styled => "st",
            MarkerClass::Sheet => "ss",
        }
    }

    fn from_tag(tag: &str) -> Option<MarkerClass> {
        match tag {
            "el" => Some(MarkerClass::Element),
            "st" => Some(MarkerClass::Styled),
            "ss" => Some(MarkerClass::Sheet),
            _ => None,
        }
    }
}

/// Id of one tracked construct: `"{unit:08x}-{class}-{ordinal}"`.
///
/// `unit` is the crc32 of the unit path, so ids from different files never
/// collide. `ordinal` is the construct's position in deterministic
/// document-order traversal; re-parsing identical text reproduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupId {
    pub unit: u32,
    pub class: MarkerClass,
    pub ordinal: usize,
}

impl LookupId {
    pub fn new(unit: u32, class: MarkerClass, ordinal: usize) -> Self {
        Self {
            unit,
            class,
            ordinal,
        }
    }

    /// Parses the wire form back into its three fields.
    pub fn parse(text: &str) -> Option<LookupId> {
        let unit_part = text.get(0..8)?;
        let unit = u32::from_str_radix(unit_part, 16).ok()?;
        let rest = text.get(8..)?.strip_prefix('-')?;
        let (tag, ordinal_part) = rest.split_once('-')?;
        let class = MarkerClass::from_tag(tag)?;
        let ordinal = ordinal_part.parse::<usize>().ok()?;
        Some(LookupId {
            unit,
            class,
            ordinal,
        })
    }
}

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}-{}-{}", self.unit, self.class.tag(), self.ordinal)
    }
}

impl Serialize for LookupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LookupId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        LookupId::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("malformed lookup id: {text:?}")))
    }
}

/// Unit prefix for a file path.
pub fn unit_hash(path: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(path.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_round_trips() {
        let id = LookupId::new(0x00a1b2c3, MarkerClass::Styled, 7);
        assert_eq!(id.to_string(), "00a1b2c3-st-7");
        assert_eq!(LookupId::parse("00a1b2c3-st-7"), Some(id));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert_eq!(LookupId::parse(""), None);
        assert_eq!(LookupId::parse("a1b2c3-el-0"), None);
        assert_eq!(LookupId::parse("00a1b2c3-xx-0"), None);
        assert_eq!(LookupId::parse("00a1b2c3-el-"), None);
        assert_eq!(LookupId::parse("00a1b2c3-el-twelve"), None);
    }

    #[test]
    fn serializes_as_an_opaque_string() {
        let id = LookupId::new(0xdeadbeef, MarkerClass::Element, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"deadbeef-el-3\"");
        let back: LookupId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn unit_hash_separates_paths() {
        assert_ne!(unit_hash("src/App.tsx"), unit_hash("src/Other.tsx"));
        assert_eq!(unit_hash("src/App.tsx"), unit_hash("src/App.tsx"));
    }
}
