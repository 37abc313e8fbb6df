//! Free-standing stylesheet editor.
//!
//! Each rule-set is tagged with a custom property inserted as its first
//! declaration. The property name embeds the rule's id and its value keeps
//! the selector text, so a render host can both match rules to ids and show
//! a human-readable name without re-reading the file.

use crate::capabilities::{MarkerInjector, StylePatcher};
use crate::errors::{EditError, EditResult};
use crate::lookup::{unit_hash, LookupId, MarkerClass, SHEET_MARKER_PREFIX};
use crate::patch::{hyphenate, StylePatch};
use crate::rendered::RenderedElement;
use easel_common::{NodeAllocator, NodeId};
use easel_css::ast::{BlockNode, CssLedger, Declaration, Ruleset};
use easel_css::visit::{traverse_rulesets, traverse_rulesets_mut};
use easel_css::StyleTree;
use std::collections::HashMap;
use tracing::debug;

/// Editor for the rule-sets of one stylesheet unit.
#[derive(Debug, Clone)]
pub struct StyleSheetEditor {
    path: String,
    unit: u32,
    created: Vec<LookupId>,
    display_names: HashMap<LookupId, String>,
}

impl StyleSheetEditor {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            unit: unit_hash(path),
            created: Vec::new(),
            display_names: HashMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    /// Selector text of the rule behind `id`, recorded at injection time.
    /// The marker declaration's value carries the same text.
    pub fn display_name(&self, id: &LookupId) -> Option<&str> {
        self.display_names.get(id).map(|name| name.as_str())
    }

    /// Node handle for a marker id. Ordinals follow the same document-order
    /// traversal that assigned them, so ids survive strip and re-parse.
    pub fn locate_by_marker(&self, tree: &StyleTree, id: &LookupId) -> EditResult<NodeId> {
        if id.unit != self.unit || id.class != MarkerClass::Sheet {
            return Err(EditError::marker_not_found(id));
        }
        let mut found = None;
        traverse_rulesets(&tree.sheet, |ordinal, rule| {
            if ordinal == id.ordinal {
                found = Some(rule.span.id);
            }
        });
        found.ok_or_else(|| EditError::marker_not_found(id))
    }
}

impl MarkerInjector for StyleSheetEditor {
    type Tree = StyleTree;

    fn inject_markers(&mut self, tree: &mut StyleTree) -> Vec<LookupId> {
        let unit = self.unit;
        let mut injected = Vec::new();
        tree.with_parts(|sheet, alloc, ledger| {
            traverse_rulesets_mut(sheet, |ordinal, rule| {
                let id = LookupId::new(unit, MarkerClass::Sheet, ordinal);
                let marker = format!("{SHEET_MARKER_PREFIX}{id}");
                let existing = rule.body.iter_mut().find_map(|node| match node {
                    BlockNode::Declaration(decl)
                        if decl.name.starts_with(SHEET_MARKER_PREFIX) =>
                    {
                        Some(decl)
                    }
                    _ => None,
                });
                match existing {
                    Some(decl) => {
                        decl.name = marker;
                        decl.value = rule.selector.clone();
                    }
                    None => rule.body.insert(
                        0,
                        BlockNode::Declaration(Declaration {
                            name: marker,
                            value: rule.selector.clone(),
                            span: alloc.synthetic_span(),
                            value_start: 0,
                            value_end: 0,
                        }),
                    ),
                }
                ledger.mark_marker(rule.span.id);
                self.display_names.insert(id, rule.selector.clone());
                injected.push(id);
            });
        });
        debug!(unit = %self.path, count = injected.len(), "injected stylesheet markers");
        for id in &injected {
            if !self.created.contains(id) {
                self.created.push(*id);
            }
        }
        injected
    }

    fn strip_markers(&self, tree: &mut StyleTree) {
        tree.with_parts(|sheet, _, ledger| {
            traverse_rulesets_mut(sheet, |_, rule| {
                rule.body.retain(|node| match node {
                    BlockNode::Declaration(decl) => !decl.name.starts_with(SHEET_MARKER_PREFIX),
                    _ => true,
                });
                ledger.unmark_marker(rule.span.id);
            });
        });
    }

    fn created_ids(&self) -> &[LookupId] {
        &self.created
    }

    fn recover_markers(&self, rendered: &dyn RenderedElement) -> Vec<LookupId> {
        self.created
            .iter()
            .filter(|id| {
                rendered
                    .computed_property(&format!("{SHEET_MARKER_PREFIX}{id}"))
                    .is_some()
            })
            .copied()
            .collect()
    }
}

impl StylePatcher for StyleSheetEditor {
    fn apply_style_patch(
        &self,
        tree: &mut StyleTree,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<()> {
        self.locate_by_marker(tree, id)?;
        debug!(unit = %self.path, id = %id, entries = patch.entries.len(), "patching stylesheet rule");
        tree.with_parts(|sheet, alloc, ledger| {
            traverse_rulesets_mut(sheet, |ordinal, rule| {
                if ordinal != id.ordinal {
                    return;
                }
                for entry in &patch.entries {
                    let name = hyphenate(&entry.property);
                    match &entry.value {
                        Some(value) => set_rule_property(rule, &name, value, alloc, ledger),
                        None => unset_rule_property(rule, &name, ledger),
                    }
                }
            });
        });
        Ok(())
    }
}

/// Rewrites the cascade-winning occurrence of the property, or appends a new
/// declaration after the rule's existing ones. A plain value change splices
/// in place; a new declaration re-emits the whole rule.
fn set_rule_property(
    rule: &mut Ruleset,
    name: &str,
    value: &str,
    alloc: &mut NodeAllocator,
    ledger: &mut CssLedger,
) {
    let mut target = None;
    for (index, node) in rule.body.iter().enumerate() {
        if let BlockNode::Declaration(decl) = node {
            if decl.name == name {
                target = Some(index);
            }
        }
    }
    match target {
        Some(index) => {
            if let BlockNode::Declaration(decl) = &mut rule.body[index] {
                if decl.value == value {
                    return;
                }
                decl.value = value.to_string();
                if decl.span.is_synthetic() {
                    ledger.mark_dirty(rule.span.id);
                } else {
                    ledger.mark_dirty(decl.span.id);
                }
            }
        }
        None => {
            let at = rule
                .body
                .iter()
                .rposition(|node| matches!(node, BlockNode::Declaration(_)))
                .map(|index| index + 1)
                .unwrap_or(0);
            rule.body.insert(
                at,
                BlockNode::Declaration(Declaration {
                    name: name.to_string(),
                    value: value.to_string(),
                    span: alloc.synthetic_span(),
                    value_start: 0,
                    value_end: 0,
                }),
            );
            ledger.mark_dirty(rule.span.id);
        }
    }
}

fn unset_rule_property(rule: &mut Ruleset, name: &str, ledger: &mut CssLedger) {
    let before = rule.body.len();
    rule.body.retain(|node| match node {
        BlockNode::Declaration(decl) => decl.name != name,
        _ => true,
    });
    if rule.body.len() != before {
        ledger.mark_dirty(rule.span.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_css::{parse, Flavor};

    const SAMPLE: &str = ".card {\n  display: block;\n  color: red;\n}\n\n@media screen {\n  .card-wide {\n    margin: 0 auto;\n  }\n}\n";

    #[test]
    fn inject_marks_every_rule_with_its_selector() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| id.class == MarkerClass::Sheet));
        assert_eq!(editor.display_name(&ids[0]), Some(".card"));
        assert_eq!(editor.display_name(&ids[1]), Some(".card-wide"));
        let printed = tree.print();
        assert!(printed.contains(&format!(
            ".card {{\n  --easel-sheet-lookup-{}: .card;\n  display: block;",
            ids[0]
        )));
        assert!(printed.contains(&format!(
            "\n  .card-wide {{\n    --easel-sheet-lookup-{}: .card-wide;\n    margin: 0 auto;",
            ids[1]
        )));
    }

    #[test]
    fn strip_restores_print_identity() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        editor.inject_markers(&mut tree);
        editor.strip_markers(&mut tree);
        assert_eq!(tree.print(), SAMPLE);
    }

    #[test]
    fn patch_sets_appends_and_removes_together() {
        let src = ".card {\n  display: block;\n  color: red;\n}\n";
        let mut tree = parse(src, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        let patch = StylePatch::new()
            .set("display", "flex")
            .set("padding", "10px")
            .unset("color");
        editor.apply_style_patch(&mut tree, &ids[0], &patch).unwrap();
        editor.strip_markers(&mut tree);
        assert_eq!(tree.print(), ".card {\n  display: flex;\n  padding: 10px;\n}\n");
    }

    #[test]
    fn value_only_changes_keep_the_original_layout() {
        let src = ".card{display:block;color:red}\n";
        let mut tree = parse(src, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        let patch = StylePatch::new().set("display", "flex");
        editor.apply_style_patch(&mut tree, &ids[0], &patch).unwrap();
        editor.strip_markers(&mut tree);
        assert_eq!(tree.print(), ".card{display:flex;color:red}\n");
    }

    #[test]
    fn nested_rules_patch_without_touching_siblings() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        let patch = StylePatch::new().set("margin", "4px");
        editor.apply_style_patch(&mut tree, &ids[1], &patch).unwrap();
        editor.strip_markers(&mut tree);
        let printed = tree.print();
        assert!(printed.contains("    margin: 4px;\n"));
        assert!(printed.contains(".card {\n  display: block;\n  color: red;\n}"));
    }

    #[test]
    fn appended_properties_reindent_nested_rules_in_place() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        let patch = StylePatch::new().set("padding", "8px");
        editor.apply_style_patch(&mut tree, &ids[1], &patch).unwrap();
        editor.strip_markers(&mut tree);
        assert_eq!(
            tree.print(),
            ".card {\n  display: block;\n  color: red;\n}\n\n@media screen {\n  .card-wide {\n    margin: 0 auto;\n    padding: 8px;\n  }\n}\n"
        );
    }

    #[test]
    fn sass_emission_has_no_terminators() {
        let src = ".card {\n  display: block\n}\n";
        let mut tree = parse(src, Flavor::Sass).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.sass");
        let ids = editor.inject_markers(&mut tree);
        let patch = StylePatch::new().set("padding", "10px");
        editor.apply_style_patch(&mut tree, &ids[0], &patch).unwrap();
        editor.strip_markers(&mut tree);
        assert_eq!(tree.print(), ".card {\n  display: block\n  padding: 10px\n}\n");
    }

    #[test]
    fn unset_of_a_missing_property_changes_nothing() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        let patch = StylePatch::new().unset("opacity");
        editor.apply_style_patch(&mut tree, &ids[0], &patch).unwrap();
        editor.strip_markers(&mut tree);
        assert_eq!(tree.print(), SAMPLE);
    }

    #[test]
    fn unknown_ordinals_are_rejected() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        editor.inject_markers(&mut tree);
        let missing = LookupId::new(editor.unit(), MarkerClass::Sheet, 9);
        let patch = StylePatch::new().set("color", "blue");
        let result = editor.apply_style_patch(&mut tree, &missing, &patch);
        assert!(matches!(result, Err(EditError::MarkerNotFound(_))));
    }

    struct ComputedProbe(String);

    impl RenderedElement for ComputedProbe {
        fn attribute(&self, _name: &str) -> Option<String> {
            None
        }

        fn computed_property(&self, name: &str) -> Option<String> {
            (name == self.0).then(|| ".card".to_string())
        }
    }

    #[test]
    fn recovery_probes_computed_properties() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        let mut editor = StyleSheetEditor::new("src/theme.css");
        let ids = editor.inject_markers(&mut tree);
        let probe = ComputedProbe(format!("{SHEET_MARKER_PREFIX}{}", ids[0]));
        assert_eq!(editor.recover_markers(&probe), vec![ids[0]]);
    }
}
