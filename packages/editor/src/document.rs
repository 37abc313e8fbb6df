//! Document-level entry points.
//!
//! One document wraps the editors for one source unit and walks every
//! public edit through the same lifecycle: parse the caller's text, inject
//! markers, operate, strip markers, print. No tree survives a call; the
//! caller owns the text, persists it, and decides when to hand back a newer
//! revision.

use crate::actions::{self, StylePromotion};
use crate::capabilities::{
    ComponentRef, ElementMutator, MarkerInjector, OrderingHint, StylePatcher,
};
use crate::element::{ElementEditor, SourceMetadata};
use crate::errors::EditResult;
use crate::lookup::LookupId;
use crate::patch::StylePatch;
use crate::styled::StyledEditor;
use crate::stylesheet::StyleSheetEditor;
use easel_common::PositionRange;
use easel_css::Flavor;
use easel_markup::{parse, MarkupTree};
use serde_json::{Map, Value};
use tracing::debug;

/// How a unit participates in editing, decided by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Script,
    Stylesheet,
}

/// Routes a path to the document type that can edit it, or `None` for
/// files the engine does not understand.
pub fn unit_kind(path: &str) -> Option<UnitKind> {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
    match ext.as_str() {
        "js" | "jsx" | "ts" | "tsx" => Some(UnitKind::Script),
        "css" | "scss" | "sass" | "less" => Some(UnitKind::Stylesheet),
        _ => None,
    }
}

/// Marker-injected text for the render host, plus the ids embedded in it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUnit {
    pub text: String,
    pub markers: Vec<LookupId>,
}

/// Editors for one markup/script unit.
#[derive(Debug, Clone)]
pub struct ScriptDocument {
    path: String,
    element: ElementEditor,
    styled: StyledEditor,
}

impl ScriptDocument {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            element: ElementEditor::new(path),
            styled: StyledEditor::new(path),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn element(&self) -> &ElementEditor {
        &self.element
    }

    pub fn styled(&self) -> &StyledEditor {
        &self.styled
    }

    /// Marker-injected copy of `source` for the render host. Element ids
    /// come first, then styled-template ids, each in document order.
    pub fn prepare(&mut self, source: &str) -> EditResult<PreparedUnit> {
        let mut tree = parse(source)?;
        let mut markers = self.element.inject_markers(&mut tree);
        markers.extend(self.styled.inject_markers(&mut tree));
        debug!(unit = %self.path, markers = markers.len(), "prepared script unit");
        Ok(PreparedUnit {
            text: tree.print(),
            markers,
        })
    }

    pub fn apply_inline_style_patch(
        &mut self,
        source: &str,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.apply_style_patch(tree, id, patch)
        })
    }

    pub fn apply_styled_patch(
        &mut self,
        source: &str,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.styled.apply_style_patch(tree, id, patch)
        })
    }

    pub fn insert_child(
        &mut self,
        source: &str,
        parent: &LookupId,
        template: &str,
        hint: Option<&OrderingHint>,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.insert_child(tree, parent, template, hint)
        })
    }

    pub fn set_text_content(
        &mut self,
        source: &str,
        id: &LookupId,
        text: &str,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.set_text_content(tree, id, text)
        })
    }

    pub fn set_attributes(
        &mut self,
        source: &str,
        id: &LookupId,
        values: &Map<String, Value>,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.set_attributes(tree, id, values)
        })
    }

    pub fn update_component(
        &mut self,
        source: &str,
        id: &LookupId,
        component: &ComponentRef,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.update_component(tree, id, component)
        })
    }

    /// Points the element's `backgroundImage` at an asset file, importing
    /// the asset under a generated binding.
    pub fn set_image(
        &mut self,
        source: &str,
        id: &LookupId,
        asset_path: &str,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.set_image(tree, id, asset_path)
        })
    }

    pub fn remove_element(&mut self, source: &str, id: &LookupId) -> EditResult<String> {
        self.edit(source, |doc, tree| doc.element.remove_element(tree, id))
    }

    pub fn move_element(
        &mut self,
        source: &str,
        id: &LookupId,
        new_parent: &LookupId,
        index: usize,
    ) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.move_element(tree, id, new_parent, index)
        })
    }

    /// Most specific element covering the cursor, if any.
    pub fn locate_by_text_position(
        &self,
        source: &str,
        line: u32,
        column: u32,
    ) -> EditResult<Option<LookupId>> {
        let tree = parse(source)?;
        Ok(self.element.locate_by_text_position(&tree, line, column))
    }

    /// Ids of elements still tagged from an earlier insertion.
    pub fn recently_added(&self, source: &str) -> EditResult<Vec<LookupId>> {
        let tree = parse(source)?;
        Ok(self.element.recently_added(&tree))
    }

    /// Drops the recently-added tags once the host has collected them.
    pub fn clear_recently_added(&mut self, source: &str) -> EditResult<String> {
        self.edit(source, |doc, tree| {
            doc.element.clear_recently_added(tree);
            Ok(())
        })
    }

    pub fn source_metadata(&self, source: &str, id: &LookupId) -> EditResult<SourceMetadata> {
        let tree = parse(source)?;
        self.element.source_metadata(&tree, id)
    }

    pub fn element_source_span(&self, source: &str, id: &LookupId) -> EditResult<PositionRange> {
        let tree = parse(source)?;
        self.element.element_source_span(&tree, id)
    }

    /// Local binding name for `name` from `module`, importing it when
    /// missing. Returns the new text and the name to reference.
    pub fn resolve_or_create_import(
        &self,
        source: &str,
        module: &str,
        name: &str,
        is_default: bool,
    ) -> EditResult<(String, String)> {
        let mut tree = parse(source)?;
        let local = self
            .element
            .resolve_or_create_import(&mut tree, module, name, is_default);
        Ok((tree.print(), local))
    }

    /// Ids of elements whose inline style could move to a stylesheet.
    pub fn promotable_elements(&self, source: &str) -> EditResult<Vec<LookupId>> {
        let tree = parse(source)?;
        Ok(actions::promotable_elements(&self.element, &tree))
    }

    /// Moves one element's literal inline style into the stylesheet unit.
    /// With no stylesheet available the action returns `None` and neither
    /// unit changes.
    pub fn promote_inline_style(
        &self,
        source: &str,
        stylesheet: Option<(&StylesheetDocument, &str)>,
        id: &LookupId,
    ) -> EditResult<Option<StylePromotion>> {
        let (sheet_doc, sheet_source) = match stylesheet {
            Some(pair) => pair,
            None => {
                debug!(unit = %self.path, "no stylesheet unit, promotion skipped");
                return Ok(None);
            }
        };
        let mut markup = parse(source)?;
        let mut sheet = easel_css::parse(sheet_source, sheet_doc.flavor)?;
        actions::promote_inline_style(&self.element, &mut markup, &mut sheet, id).map(Some)
    }

    fn edit<F>(&mut self, source: &str, op: F) -> EditResult<String>
    where
        F: FnOnce(&mut Self, &mut MarkupTree) -> EditResult<()>,
    {
        let mut tree = parse(source)?;
        self.element.inject_markers(&mut tree);
        self.styled.inject_markers(&mut tree);
        op(self, &mut tree)?;
        self.element.strip_markers(&mut tree);
        self.styled.strip_markers(&mut tree);
        Ok(tree.print())
    }
}

/// Editor for one free-standing stylesheet unit.
#[derive(Debug, Clone)]
pub struct StylesheetDocument {
    path: String,
    flavor: Flavor,
    editor: StyleSheetEditor,
}

impl StylesheetDocument {
    /// Unknown extensions parse with plain css conventions.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            flavor: Flavor::from_path(path).unwrap_or(Flavor::Css),
            editor: StyleSheetEditor::new(path),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn editor(&self) -> &StyleSheetEditor {
        &self.editor
    }

    /// Marker-injected copy of `source` for the render host.
    pub fn prepare(&mut self, source: &str) -> EditResult<PreparedUnit> {
        let mut tree = easel_css::parse(source, self.flavor)?;
        let markers = self.editor.inject_markers(&mut tree);
        debug!(unit = %self.path, markers = markers.len(), "prepared stylesheet unit");
        Ok(PreparedUnit {
            text: tree.print(),
            markers,
        })
    }

    pub fn apply_style_patch(
        &mut self,
        source: &str,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<String> {
        let mut tree = easel_css::parse(source, self.flavor)?;
        self.editor.inject_markers(&mut tree);
        self.editor.apply_style_patch(&mut tree, id, patch)?;
        self.editor.strip_markers(&mut tree);
        Ok(tree.print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EditError;
    use crate::lookup::{MarkerClass, MARKUP_MARKER_ATTR, STYLED_MARKER_PREFIX};

    #[test]
    fn extensions_route_to_document_kinds() {
        assert_eq!(unit_kind("src/App.tsx"), Some(UnitKind::Script));
        assert_eq!(unit_kind("src/app.js"), Some(UnitKind::Script));
        assert_eq!(unit_kind("src/theme.scss"), Some(UnitKind::Stylesheet));
        assert_eq!(unit_kind("src/theme.CSS"), Some(UnitKind::Stylesheet));
        assert_eq!(unit_kind("logo.png"), None);
        assert_eq!(unit_kind("Makefile"), None);
    }

    #[test]
    fn prepare_embeds_both_marker_channels() {
        let src = "const Box = styled.div`\n  color: red;\n`;\n\nconst App = () => <div />;\n";
        let mut doc = ScriptDocument::new("src/App.tsx");
        let prepared = doc.prepare(src).unwrap();
        assert_eq!(prepared.markers.len(), 2);
        assert!(prepared.text.contains(MARKUP_MARKER_ATTR));
        assert!(prepared.text.contains(STYLED_MARKER_PREFIX));
        assert_eq!(prepared.markers[0].class, MarkerClass::Element);
        assert_eq!(prepared.markers[1].class, MarkerClass::Styled);
    }

    #[test]
    fn edits_return_clean_text() {
        let src = "const App = () => <div style={{ display: \"block\" }} />;\n";
        let mut doc = ScriptDocument::new("src/App.tsx");
        let id = doc.locate_by_text_position(src, 0, 20).unwrap().unwrap();
        let patch = StylePatch::new().set("display", "flex");
        let updated = doc.apply_inline_style_patch(src, &id, &patch).unwrap();
        assert_eq!(
            updated,
            "const App = () => <div style={{ display: \"flex\" }} />;\n"
        );
        assert!(!updated.contains(MARKUP_MARKER_ATTR));
    }

    #[test]
    fn stylesheet_edits_run_the_same_lifecycle() {
        let src = ".card {\n  display: block;\n  color: red;\n}\n";
        let mut doc = StylesheetDocument::new("src/theme.css");
        let prepared = doc.prepare(src).unwrap();
        let patch = StylePatch::new()
            .set("display", "flex")
            .set("padding", "10px")
            .unset("color");
        let updated = doc
            .apply_style_patch(src, &prepared.markers[0], &patch)
            .unwrap();
        assert_eq!(updated, ".card {\n  display: flex;\n  padding: 10px;\n}\n");
    }

    #[test]
    fn promotion_without_a_stylesheet_returns_no_changes() {
        let src = "const App = () => <div style={{ color: \"red\" }} />;\n";
        let doc = ScriptDocument::new("src/App.tsx");
        let ids = doc.promotable_elements(src).unwrap();
        assert_eq!(ids.len(), 1);
        let outcome = doc.promote_inline_style(src, None, &ids[0]).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn promotion_with_a_stylesheet_rewrites_both_texts() {
        let src = "const App = () => <div style={{ color: \"red\" }} />;\n";
        let sheet_src = ".existing {\n  margin: 0;\n}\n";
        let doc = ScriptDocument::new("src/App.tsx");
        let sheet_doc = StylesheetDocument::new("src/theme.css");
        let ids = doc.promotable_elements(src).unwrap();
        let outcome = doc
            .promote_inline_style(src, Some((&sheet_doc, sheet_src)), &ids[0])
            .unwrap()
            .unwrap();
        assert_eq!(
            outcome.markup_text,
            "const App = () => <div className=\"st-app-div-0\" />;\n"
        );
        assert!(outcome.stylesheet_text.ends_with(".st-app-div-0 {\n  color: red;\n}\n"));
    }

    #[test]
    fn attribute_and_component_edits_return_clean_text() {
        let src = "const App = () => <button kind=\"flat\">Go</button>;\n";
        let mut doc = ScriptDocument::new("src/App.tsx");
        let id = doc.locate_by_text_position(src, 0, 20).unwrap().unwrap();

        let Value::Object(values) = serde_json::json!({ "kind": "raised" }) else {
            panic!("Expected an object");
        };
        let updated = doc.set_attributes(src, &id, &values).unwrap();
        assert_eq!(
            updated,
            "const App = () => <button kind=\"raised\">Go</button>;\n"
        );

        let component = ComponentRef::Tag {
            name: "a".to_string(),
        };
        let updated = doc.update_component(&updated, &id, &component).unwrap();
        assert_eq!(updated, "const App = () => <a kind=\"raised\">Go</a>;\n");

        let updated = doc.set_image(&updated, &id, "./bg.png").unwrap();
        assert_eq!(
            updated,
            "import AssetBg from \"./bg.png\";\nconst App = () => <a kind=\"raised\" style={{ backgroundImage: `url(${AssetBg})` }}>Go</a>;\n"
        );
    }

    #[test]
    fn parse_failures_surface_as_edit_errors() {
        let mut doc = ScriptDocument::new("src/App.tsx");
        let id = LookupId::new(doc.element().unit(), MarkerClass::Element, 0);
        let patch = StylePatch::new().set("display", "flex");
        let result = doc.apply_inline_style_patch("const App = <div", &id, &patch);
        assert!(matches!(result, Err(EditError::MarkupParse(_))));
    }
}
