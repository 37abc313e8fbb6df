//! Style patches: ordered property edits applied atomically to one styled
//! construct.

use serde::{Deserialize, Serialize};

/// One property edit. `None` removes the property if present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchEntry {
    pub property: String,
    pub value: Option<String>,
}

/// Ordered list of property edits. A matching property is replaced in
/// place; a missing one is appended; entries apply in list order, so later
/// entries win on duplicate properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylePatch {
    pub entries: Vec<PatchEntry>,
}

impl StylePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(PatchEntry {
            property: property.into(),
            value: Some(value.into()),
        });
        self
    }

    pub fn unset(mut self, property: impl Into<String>) -> Self {
        self.entries.push(PatchEntry {
            property: property.into(),
            value: None,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Property name in stylesheet form. Camel-case names are hyphenated;
/// custom properties and already-hyphenated names pass through.
pub fn hyphenate(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenate_handles_camel_case() {
        assert_eq!(hyphenate("flexDirection"), "flex-direction");
        assert_eq!(hyphenate("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(hyphenate("display"), "display");
        assert_eq!(hyphenate("flex-direction"), "flex-direction");
        assert_eq!(hyphenate("--easel-probe"), "--easel-probe");
    }

    #[test]
    fn builder_keeps_entry_order() {
        let patch = StylePatch::new()
            .set("display", "flex")
            .set("padding", "10px")
            .unset("color");
        let names: Vec<&str> = patch.entries.iter().map(|e| e.property.as_str()).collect();
        assert_eq!(names, ["display", "padding", "color"]);
        assert_eq!(patch.entries[2].value, None);
    }
}
