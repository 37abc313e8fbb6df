//! Styled-template editor.
//!
//! Tagged templates render through generated class names, so element
//! attributes never reach them. This editor plants an inert custom property
//! at the top of each template's first chunk instead; the id embedded in
//! the property name surfaces in the rendered node's computed style.
//!
//! Template chunks are raw text that may stop mid-declaration at an
//! interpolation hole, so edits go through the lenient declaration scanner
//! rather than the stylesheet parser.

use crate::capabilities::{MarkerInjector, StylePatcher};
use crate::errors::{EditError, EditResult};
use crate::lookup::{unit_hash, LookupId, MarkerClass, STYLED_MARKER_PREFIX};
use crate::patch::{hyphenate, StylePatch};
use crate::rendered::RenderedElement;
use easel_css::scan::{detect_indent, remove_declaration, scan_declarations, ScannedDeclaration};
use easel_markup::ast::{Item, PrintLedger, StyledDecl, TemplateLiteral};
use easel_markup::MarkupTree;
use std::collections::HashMap;
use tracing::debug;

/// Editor for the tagged-template constructs of one markup unit.
#[derive(Debug, Clone)]
pub struct StyledEditor {
    path: String,
    unit: u32,
    created: Vec<LookupId>,
    display_names: HashMap<LookupId, String>,
}

impl StyledEditor {
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

    /// Declared binding name of the template behind `id`, recorded at
    /// injection time.
    pub fn display_name(&self, id: &LookupId) -> Option<&str> {
        self.display_names.get(id).map(|name| name.as_str())
    }
}

impl MarkerInjector for StyledEditor {
    type Tree = MarkupTree;

    fn inject_markers(&mut self, tree: &mut MarkupTree) -> Vec<LookupId> {
        let unit = self.unit;
        let mut injected = Vec::new();
        tree.with_parts(|file, _, ledger| {
            let mut next = 0usize;
            for item in &mut file.items {
                if let Item::Styled(styled) = item {
                    let id = LookupId::new(unit, MarkerClass::Styled, next);
                    next += 1;
                    let marker = marker_name(&id);
                    let indent = template_indent(&styled.template);
                    if let Some(chunk) = styled.template.chunks.first_mut() {
                        if !chunk.text.contains(&marker) {
                            let line = if chunk.text.starts_with('\n') {
                                format!("\n{indent}{marker}: 1;")
                            } else {
                                format!("{marker}: 1;")
                            };
                            chunk.text.insert_str(0, &line);
                        }
                        ledger.mark_marker(chunk.span.id);
                    }
                    self.display_names.insert(id, styled.name.clone());
                    injected.push(id);
                }
            }
        });
        debug!(unit = %self.path, count = injected.len(), "injected styled markers");
        for id in &injected {
            if !self.created.contains(id) {
                self.created.push(*id);
            }
        }
        injected
    }

    fn strip_markers(&self, tree: &mut MarkupTree) {
        tree.with_parts(|file, _, ledger| {
            for item in &mut file.items {
                if let Item::Styled(styled) = item {
                    for chunk in &mut styled.template.chunks {
                        loop {
                            let decls = scan_declarations(&chunk.text);
                            let marker = decls
                                .iter()
                                .find(|d| d.name.starts_with(STYLED_MARKER_PREFIX));
                            match marker {
                                Some(decl) => {
                                    chunk.text = remove_declaration(&chunk.text, decl)
                                }
                                None => break,
                            }
                        }
                        ledger.unmark_marker(chunk.span.id);
                    }
                }
            }
        });
    }

    fn created_ids(&self) -> &[LookupId] {
        &self.created
    }

    fn recover_markers(&self, rendered: &dyn RenderedElement) -> Vec<LookupId> {
        self.created
            .iter()
            .filter(|id| rendered.computed_property(&marker_name(id)).is_some())
            .copied()
            .collect()
    }
}

impl StylePatcher for StyledEditor {
    fn apply_style_patch(
        &self,
        tree: &mut MarkupTree,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<()> {
        if id.unit != self.unit || id.class != MarkerClass::Styled {
            return Err(EditError::marker_not_found(id));
        }
        debug!(unit = %self.path, id = %id, entries = patch.entries.len(), "patching styled template");
        tree.with_parts(|file, _, ledger| {
            let mut remaining = id.ordinal;
            for item in &mut file.items {
                if let Item::Styled(styled) = item {
                    if remaining == 0 {
                        for entry in &patch.entries {
                            let name = hyphenate(&entry.property);
                            match &entry.value {
                                Some(value) => set_property(styled, &name, value, ledger),
                                None => unset_property(styled, &name, ledger),
                            }
                        }
                        return Ok(());
                    }
                    remaining -= 1;
                }
            }
            Err(EditError::marker_not_found(id))
        })
    }
}

fn marker_name(id: &LookupId) -> String {
    format!("{STYLED_MARKER_PREFIX}{id}")
}

/// Indentation used by the template's own declarations, read across every
/// chunk so a template that opens with an interpolation still matches.
fn template_indent(template: &TemplateLiteral) -> String {
    let joined: String = template.chunks.iter().map(|c| c.text.as_str()).collect();
    detect_indent(&joined)
}

/// Whether the declaration's value is completed by the interpolation that
/// follows this chunk. Such values cannot be edited as text.
fn runs_into_hole(chunk: &str, decl: &ScannedDeclaration) -> bool {
    chunk[decl.range.end..].bytes().all(|b| matches!(b, b' ' | b'\t'))
        && !chunk[..decl.range.end].ends_with(';')
}

/// Replaces the property's value in place, editing the occurrence that wins
/// the cascade. A property the template does not declare is appended to the
/// last chunk.
fn set_property(styled: &mut StyledDecl, name: &str, value: &str, ledger: &mut PrintLedger) {
    let last = styled.template.chunks.len().saturating_sub(1);
    for (index, chunk) in styled.template.chunks.iter_mut().enumerate().rev() {
        let decls = scan_declarations(&chunk.text);
        let target = decls
            .iter()
            .rev()
            .find(|d| d.name == name && (index == last || !runs_into_hole(&chunk.text, d)));
        if let Some(decl) = target {
            if decl.value != value {
                chunk.text.replace_range(decl.value_range.clone(), value);
                ledger.mark_dirty(chunk.span.id);
            }
            return;
        }
    }
    let indent = template_indent(&styled.template);
    if let Some(chunk) = styled.template.chunks.last_mut() {
        append_declaration(&mut chunk.text, &indent, name, value);
        ledger.mark_dirty(chunk.span.id);
    }
}

/// Removes every literal occurrence of the property. Occurrences whose
/// value runs into an interpolation stay put.
fn unset_property(styled: &mut StyledDecl, name: &str, ledger: &mut PrintLedger) {
    let last = styled.template.chunks.len().saturating_sub(1);
    for (index, chunk) in styled.template.chunks.iter_mut().enumerate() {
        loop {
            let decls = scan_declarations(&chunk.text);
            let target = decls
                .iter()
                .find(|d| d.name == name && (index == last || !runs_into_hole(&chunk.text, d)));
            match target {
                Some(decl) => {
                    chunk.text = remove_declaration(&chunk.text, decl);
                    ledger.mark_dirty(chunk.span.id);
                }
                None => break,
            }
        }
    }
}

/// Appends `name: value;` at the end of the chunk, before any trailing
/// whitespace, matching the template's layout.
fn append_declaration(text: &mut String, indent: &str, name: &str, value: &str) {
    let multiline = text.contains('\n');
    let keep = text.trim_end().len();
    let tail = text.split_off(keep);
    if !text.is_empty() && !text.ends_with(';') && !text.ends_with('{') && !text.ends_with('}') {
        text.push(';');
    }
    if multiline {
        text.push('\n');
        text.push_str(indent);
    } else if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(name);
    text.push_str(": ");
    text.push_str(value);
    text.push(';');
    text.push_str(&tail);
}
