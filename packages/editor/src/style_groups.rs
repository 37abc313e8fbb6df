//! Style-group resolution.
//!
//! A rendered element can draw its presentation from several tracked
//! constructs at once: its own inline style, styled templates whose class
//! landed on it, and stylesheet rules that matched it. This module asks
//! each editor which of its markers the element carries and flattens the
//! answers into one ranked list for the GUI.

use crate::capabilities::MarkerInjector;
use crate::element::ElementEditor;
use crate::lookup::{LookupId, SHEET_MARKER_PREFIX};
use crate::rendered::RenderedElement;
use crate::styled::StyledEditor;
use crate::stylesheet::StyleSheetEditor;
use serde::{Deserialize, Serialize};

/// Kind of construct a style group edits through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleCategory {
    Inline,
    Styled,
    Sheet,
}

impl StyleCategory {
    /// Heading the GUI files the group under.
    pub fn label(&self) -> &'static str {
        match self {
            StyleCategory::Inline => "Inline",
            StyleCategory::Styled => "Styled Component",
            StyleCategory::Sheet => "Style Sheet Rule",
        }
    }
}

/// One editable style construct behind a rendered element. `origin` is the
/// path of the unit whose editor recognized the marker, so the caller can
/// route the follow-up patch to the right document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleGroup {
    pub category: StyleCategory,
    pub display_name: String,
    pub lookup_id: LookupId,
    pub origin: String,
}

/// Concatenates every editor's recovered markers into one ranked list: the
/// element's inline group first, then styled templates, then stylesheet
/// rules, each in injection order. The ranking is a presentation default,
/// not a precedence claim.
pub fn collect_style_groups(
    rendered: &dyn RenderedElement,
    element: &ElementEditor,
    styled: &StyledEditor,
    sheets: &[&StyleSheetEditor],
) -> Vec<StyleGroup> {
    let mut groups = Vec::new();
    for id in element.recover_markers(rendered) {
        groups.push(StyleGroup {
            category: StyleCategory::Inline,
            display_name: "Element Style".to_string(),
            lookup_id: id,
            origin: element.path().to_string(),
        });
    }
    for id in styled.recover_markers(rendered) {
        let display_name = styled
            .display_name(&id)
            .unwrap_or("Styled Component Style")
            .to_string();
        groups.push(StyleGroup {
            category: StyleCategory::Styled,
            display_name,
            lookup_id: id,
            origin: styled.path().to_string(),
        });
    }
    for sheet in sheets {
        for id in sheet.recover_markers(rendered) {
            // the marker's computed value carries the selector text
            let display_name = rendered
                .computed_property(&format!("{SHEET_MARKER_PREFIX}{id}"))
                .or_else(|| sheet.display_name(&id).map(str::to_string))
                .unwrap_or_else(|| id.to_string());
            groups.push(StyleGroup {
                category: StyleCategory::Sheet,
                display_name,
                lookup_id: id,
                origin: sheet.path().to_string(),
            });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{MARKUP_MARKER_ATTR, STYLED_MARKER_PREFIX};
    use easel_css::Flavor;
    use std::collections::HashMap;

    const MARKUP: &str = "const Box = styled.div`\n  color: red;\n`;\n\nconst App = () => <div style={{ width: \"10px\" }} />;\n";
    const SHEET: &str = ".card {\n  color: red;\n}\n";

    #[derive(Default)]
    struct Probe {
        attributes: HashMap<String, String>,
        computed: HashMap<String, String>,
    }

    impl RenderedElement for Probe {
        fn attribute(&self, name: &str) -> Option<String> {
            self.attributes.get(name).cloned()
        }

        fn computed_property(&self, name: &str) -> Option<String> {
            self.computed.get(name).cloned()
        }
    }

    #[test]
    fn groups_rank_inline_then_styled_then_sheet() {
        let mut markup = easel_markup::parse(MARKUP).unwrap();
        let mut sheet = easel_css::parse(SHEET, Flavor::Css).unwrap();
        let mut element = ElementEditor::new("src/App.tsx");
        let mut styled = StyledEditor::new("src/App.tsx");
        let mut rules = StyleSheetEditor::new("src/theme.css");
        let el_ids = element.inject_markers(&mut markup);
        let st_ids = styled.inject_markers(&mut markup);
        let ss_ids = rules.inject_markers(&mut sheet);
        let mut probe = Probe::default();
        probe
            .attributes
            .insert(MARKUP_MARKER_ATTR.to_string(), el_ids[0].to_string());
        probe.computed.insert(
            format!("{STYLED_MARKER_PREFIX}{}", st_ids[0]),
            "1".to_string(),
        );
        probe.computed.insert(
            format!("{SHEET_MARKER_PREFIX}{}", ss_ids[0]),
            ".card".to_string(),
        );
        let groups = collect_style_groups(&probe, &element, &styled, &[&rules]);
        let categories: Vec<StyleCategory> = groups.iter().map(|g| g.category).collect();
        assert_eq!(
            categories,
            [
                StyleCategory::Inline,
                StyleCategory::Styled,
                StyleCategory::Sheet,
            ]
        );
        assert_eq!(groups[0].display_name, "Element Style");
        assert_eq!(groups[1].display_name, "Box");
        assert_eq!(groups[2].display_name, ".card");
        assert_eq!(groups[2].origin, "src/theme.css");
    }

    #[test]
    fn an_unmatched_element_yields_no_groups() {
        let element = ElementEditor::new("src/App.tsx");
        let styled = StyledEditor::new("src/App.tsx");
        let rules = StyleSheetEditor::new("src/theme.css");
        let probe = Probe::default();
        let groups = collect_style_groups(&probe, &element, &styled, &[&rules]);
        assert!(groups.is_empty());
    }

    #[test]
    fn groups_serialize_with_camel_case_keys() {
        let group = StyleGroup {
            category: StyleCategory::Sheet,
            display_name: ".card".to_string(),
            lookup_id: crate::lookup::LookupId::new(1, crate::lookup::MarkerClass::Sheet, 0),
            origin: "src/theme.css".to_string(),
        };
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["category"], "sheet");
        assert_eq!(value["displayName"], ".card");
        assert_eq!(value["lookupId"], "00000001-ss-0");
    }
}
