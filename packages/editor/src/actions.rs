//! Editor actions composed from the primitive editors.
//!
//! The one action offered today moves an element's literal inline style
//! into a stylesheet rule: the style object is removed, a generated class
//! lands on the element, and the stylesheet gains a matching rule. Both
//! texts are produced together; a failure on either side leaves both units
//! untouched.

use crate::element::ElementEditor;
use crate::errors::{EditError, EditResult};
use crate::lookup::{LookupId, MarkerClass};
use crate::patch::hyphenate;
use easel_css::ast::{BlockNode, CssItem, Declaration, Ruleset};
use easel_css::visit::traverse_rulesets;
use easel_css::StyleTree;
use easel_markup::ast::{AttrValue, Attribute, Element, Expr, PropValue, StringLit};
use easel_markup::visitor::{traverse_elements, traverse_elements_mut};
use easel_markup::MarkupTree;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Result of one promotion: both units' new text plus the class that now
/// ties them together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePromotion {
    pub lookup_id: LookupId,
    pub class_name: String,
    pub markup_text: String,
    pub stylesheet_text: String,
}

/// Ids of elements whose inline style can move to a stylesheet: the style
/// object must be entirely literal string pairs, and any existing class
/// attribute must be a plain string so the generated class can join it.
pub fn promotable_elements(editor: &ElementEditor, tree: &MarkupTree) -> Vec<LookupId> {
    let mut ids = Vec::new();
    let mut next = 0usize;
    traverse_elements(&tree.file, |_, element| {
        if element.name.is_fragment() {
            return;
        }
        let ordinal = next;
        next += 1;
        if literal_style_pairs(element).is_some() && class_attr_allows_promotion(element) {
            ids.push(LookupId::new(editor.unit(), MarkerClass::Element, ordinal));
        }
    });
    ids
}

/// Moves one element's literal inline style into `sheet` as a new rule.
/// Validation happens before either tree is touched, so an error leaves
/// both exactly as given.
pub fn promote_inline_style(
    editor: &ElementEditor,
    markup: &mut MarkupTree,
    sheet: &mut StyleTree,
    id: &LookupId,
) -> EditResult<StylePromotion> {
    let node = editor.locate_by_marker(markup, id)?;
    let mut pairs = None;
    let mut class_ok = false;
    let mut base = String::new();
    traverse_elements(&markup.file, |_, element| {
        if element.span.id == node {
            pairs = literal_style_pairs(element);
            class_ok = class_attr_allows_promotion(element);
            base = class_name_base(editor.path(), element, id.ordinal);
        }
    });
    let pairs = pairs
        .ok_or_else(|| EditError::invalid_structure("inline style is not a literal object"))?;
    if !class_ok {
        return Err(EditError::invalid_structure(
            "className is not a string literal",
        ));
    }
    let class_name = unique_class_name(sheet, &base);
    debug!(unit = %editor.path(), id = %id, class = %class_name, "promoting inline style");
    markup.with_parts(|file, alloc, ledger| {
        traverse_elements_mut(file, |_, element| {
            if element.span.id != node {
                return;
            }
            let index = element
                .attributes
                .iter()
                .position(|attr| attr.name == "style");
            let index = match index {
                Some(index) => {
                    element.attributes.remove(index);
                    index
                }
                None => element.attributes.len(),
            };
            match element.attribute_mut("className") {
                Some(attr) => {
                    if let Some(AttrValue::String(lit)) = attr.value.as_mut() {
                        lit.value.push(' ');
                        lit.value.push_str(&class_name);
                    }
                }
                None => element.attributes.insert(
                    index,
                    Attribute {
                        name: "className".to_string(),
                        value: Some(AttrValue::String(StringLit {
                            value: class_name.clone(),
                            span: alloc.synthetic_span(),
                        })),
                        span: alloc.synthetic_span(),
                    },
                ),
            }
            ledger.mark_open_dirty(element.span.id);
        });
    });
    sheet.with_parts(|stylesheet, alloc, _| {
        let body = pairs
            .iter()
            .map(|(name, value)| {
                BlockNode::Declaration(Declaration {
                    name: name.clone(),
                    value: value.clone(),
                    span: alloc.synthetic_span(),
                    value_start: 0,
                    value_end: 0,
                })
            })
            .collect();
        stylesheet.items.push(CssItem::Rule(Ruleset {
            selector: format!(".{class_name}"),
            body,
            span: alloc.synthetic_span(),
            block_start: 0,
        }));
    });
    Ok(StylePromotion {
        lookup_id: *id,
        class_name,
        markup_text: markup.print(),
        stylesheet_text: sheet.print(),
    })
}

/// The style attribute's pairs in stylesheet form, when every value is a
/// string literal. Numbers are refused since their rendered form depends
/// on runtime unit rules the engine cannot reproduce.
fn literal_style_pairs(element: &Element) -> Option<Vec<(String, String)>> {
    let attr = element.attribute("style")?;
    let container = match attr.value.as_ref()? {
        AttrValue::Container(container) => container,
        AttrValue::String(_) => return None,
    };
    let object = match &container.expr {
        Expr::Object(object) => object,
        Expr::Raw(_) => return None,
    };
    if object.properties.is_empty() {
        return None;
    }
    let mut pairs = Vec::with_capacity(object.properties.len());
    for prop in &object.properties {
        match &prop.value {
            PropValue::String(lit) => pairs.push((hyphenate(&prop.key), lit.value.clone())),
            _ => return None,
        }
    }
    Some(pairs)
}

fn class_attr_allows_promotion(element: &Element) -> bool {
    match element.attribute("className") {
        None => true,
        Some(attr) => matches!(attr.value, Some(AttrValue::String(_))),
    }
}

/// `st-{file stem}-{tag}-{ordinal}`, lowered and squeezed to class-safe
/// characters.
fn class_name_base(path: &str, element: &Element, ordinal: usize) -> String {
    let file = path
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    format!("st-{}-{}-{}", stem, element.name, ordinal)
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// First class name derived from `base` whose selector is not already in
/// the sheet.
fn unique_class_name(sheet: &StyleTree, base: &str) -> String {
    let mut taken = HashSet::new();
    traverse_rulesets(&sheet.sheet, |_, rule| {
        taken.insert(rule.selector.trim().to_string());
    });
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while taken.contains(&format!(".{candidate}")) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_css::Flavor;

    const SHEET: &str = ".existing {\n  margin: 0;\n}\n";

    fn editor() -> ElementEditor {
        ElementEditor::new("src/App.tsx")
    }

    fn first_id(editor: &ElementEditor) -> LookupId {
        LookupId::new(editor.unit(), MarkerClass::Element, 0)
    }

    #[test]
    fn only_literal_string_styles_are_promotable() {
        let src = "const App = () => (\n  <div style={{ display: \"block\" }}>\n    <span style={{ width: 10 }} />\n    <img style={theme.img} />\n    <p />\n  </div>\n);\n";
        let tree = easel_markup::parse(src).unwrap();
        let editor = editor();
        let ids = promotable_elements(&editor, &tree);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].ordinal, 0);
    }

    #[test]
    fn promotion_rewrites_both_units() {
        let src =
            "const App = () => <div style={{ display: \"block\", marginTop: \"4px\" }}>hi</div>;\n";
        let mut markup = easel_markup::parse(src).unwrap();
        let mut sheet = easel_css::parse(SHEET, Flavor::Css).unwrap();
        let editor = editor();
        let id = first_id(&editor);
        let promotion = promote_inline_style(&editor, &mut markup, &mut sheet, &id).unwrap();
        assert_eq!(promotion.class_name, "st-app-div-0");
        assert_eq!(
            promotion.markup_text,
            "const App = () => <div className=\"st-app-div-0\">hi</div>;\n"
        );
        assert_eq!(
            promotion.stylesheet_text,
            ".existing {\n  margin: 0;\n}\n.st-app-div-0 {\n  display: block;\n  margin-top: 4px;\n}\n"
        );
    }

    #[test]
    fn promotion_joins_an_existing_class() {
        let src = "const App = () => <div className=\"card\" style={{ color: \"red\" }} />;\n";
        let mut markup = easel_markup::parse(src).unwrap();
        let mut sheet = easel_css::parse(SHEET, Flavor::Css).unwrap();
        let editor = editor();
        let promotion =
            promote_inline_style(&editor, &mut markup, &mut sheet, &first_id(&editor)).unwrap();
        assert_eq!(
            promotion.markup_text,
            "const App = () => <div className=\"card st-app-div-0\" />;\n"
        );
        assert!(promotion.stylesheet_text.contains(".st-app-div-0 {\n  color: red;\n}"));
    }

    #[test]
    fn failed_validation_leaves_both_trees_untouched() {
        let src = "const App = () => <div style={theme.box} />;\n";
        let mut markup = easel_markup::parse(src).unwrap();
        let mut sheet = easel_css::parse(SHEET, Flavor::Css).unwrap();
        let editor = editor();
        let result = promote_inline_style(&editor, &mut markup, &mut sheet, &first_id(&editor));
        assert!(matches!(result, Err(EditError::InvalidStructure(_))));
        assert_eq!(markup.print(), src);
        assert_eq!(sheet.print(), SHEET);
    }

    #[test]
    fn generated_class_names_avoid_collisions() {
        let src = "const App = () => <div style={{ color: \"red\" }} />;\n";
        let taken = ".st-app-div-0 {\n  color: blue;\n}\n";
        let mut markup = easel_markup::parse(src).unwrap();
        let mut sheet = easel_css::parse(taken, Flavor::Css).unwrap();
        let editor = editor();
        let promotion =
            promote_inline_style(&editor, &mut markup, &mut sheet, &first_id(&editor)).unwrap();
        assert_eq!(promotion.class_name, "st-app-div-0-2");
        assert!(promotion.stylesheet_text.ends_with(".st-app-div-0-2 {\n  color: red;\n}\n"));
    }

    #[test]
    fn member_names_are_squeezed_into_class_form() {
        let src = "const App = () => <Ui.Card style={{ color: \"red\" }} />;\n";
        let mut markup = easel_markup::parse(src).unwrap();
        let mut sheet = easel_css::parse(SHEET, Flavor::Css).unwrap();
        let editor = editor();
        let promotion =
            promote_inline_style(&editor, &mut markup, &mut sheet, &first_id(&editor)).unwrap();
        assert_eq!(promotion.class_name, "st-app-ui-card-0");
    }
}
