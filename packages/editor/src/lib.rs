//! Lookup-id editing over parsed source trees.
//!
//! Each editor owns one marker class for one source unit: elements in
//! markup, styled-component templates, or stylesheet rules. Markers are
//! injected before rendering, recovered from rendered output, and stripped
//! before text is handed back, so saved files never carry them. The
//! document layer bundles the editors per unit and runs that lifecycle
//! around every public operation.

pub mod actions;
pub mod capabilities;
pub mod document;
pub mod element;
pub mod errors;
pub mod lookup;
pub mod patch;
pub mod rendered;
pub mod style_groups;
pub mod styled;
pub mod stylesheet;

pub use actions::{promotable_elements, promote_inline_style, StylePromotion};
pub use capabilities::{ComponentRef, ElementMutator, MarkerInjector, OrderingHint, StylePatcher};
pub use document::{unit_kind, PreparedUnit, ScriptDocument, StylesheetDocument, UnitKind};
pub use element::{ElementEditor, SourceMetadata};
pub use errors::{EditError, EditResult};
pub use lookup::{LookupId, MarkerClass};
pub use patch::{PatchEntry, StylePatch};
pub use rendered::RenderedElement;
pub use style_groups::{collect_style_groups, StyleCategory, StyleGroup};
pub use styled::StyledEditor;
pub use stylesheet::StyleSheetEditor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_script_document_round_trips_unedited_text() {
        let source = "const App = () => <div className=\"a\" />;\n";
        let mut doc = ScriptDocument::new("src/App.tsx");
        let prepared = doc.prepare(source).unwrap();
        assert_ne!(prepared.text, source);
        let cleaned = doc.clear_recently_added(source).unwrap();
        assert_eq!(cleaned, source);
    }
}
