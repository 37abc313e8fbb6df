//! Editor capabilities.
//!
//! The three editors compose from independent capabilities rather than an
//! inheritance chain: every editor injects and recovers markers, the style
//! editors also patch styles, and only the markup editor mutates element
//! structure.

use crate::errors::EditResult;
use crate::lookup::LookupId;
use crate::patch::StylePatch;
use crate::rendered::RenderedElement;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker lifecycle over one grammar's tree.
pub trait MarkerInjector {
    type Tree;

    /// Assigns ordinal ids in canonical document order and embeds their
    /// markers. Returns the ids in assignment order.
    fn inject_markers(&mut self, tree: &mut Self::Tree) -> Vec<LookupId>;

    /// Removes every marker construct this editor class injects, restoring
    /// print identity for untouched trees.
    fn strip_markers(&self, tree: &mut Self::Tree);

    /// Every id this editor instance has handed out.
    fn created_ids(&self) -> &[LookupId];

    /// Ids of this editor's constructs that produced the rendered node.
    fn recover_markers(&self, rendered: &dyn RenderedElement) -> Vec<LookupId>;
}

/// Structured style edits addressed by marker id.
pub trait StylePatcher: MarkerInjector {
    fn apply_style_patch(
        &self,
        tree: &mut Self::Tree,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<()>;
}

/// Sibling ordering rule for child insertion: the new child lands after
/// the most specific existing sibling whose `attribute` value is a prefix
/// of the new child's, else last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingHint {
    pub attribute: String,
}

/// Replacement tag for an element: an intrinsic markup tag, or a component
/// binding imported from a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentRef {
    Tag {
        name: String,
    },
    Import {
        module: String,
        name: String,
        #[serde(default)]
        is_default: bool,
    },
}

/// Structural element mutations; markup trees only.
pub trait ElementMutator: MarkerInjector {
    fn insert_child(
        &self,
        tree: &mut Self::Tree,
        parent: &LookupId,
        template: &str,
        hint: Option<&OrderingHint>,
    ) -> EditResult<()>;

    fn set_text_content(&self, tree: &mut Self::Tree, id: &LookupId, text: &str) -> EditResult<()>;

    /// Sets each named attribute to its JSON-described value; `null` makes
    /// the attribute bare. Attributes absent from `values` are untouched.
    fn set_attributes(
        &self,
        tree: &mut Self::Tree,
        id: &LookupId,
        values: &Map<String, Value>,
    ) -> EditResult<()>;

    /// Swaps the element's tag, rewriting both open and close tags.
    fn update_component(
        &self,
        tree: &mut Self::Tree,
        id: &LookupId,
        component: &ComponentRef,
    ) -> EditResult<()>;

    fn remove_element(&self, tree: &mut Self::Tree, id: &LookupId) -> EditResult<()>;

    fn move_element(
        &self,
        tree: &mut Self::Tree,
        id: &LookupId,
        new_parent: &LookupId,
        index: usize,
    ) -> EditResult<()>;
}
