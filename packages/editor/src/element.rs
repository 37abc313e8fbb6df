//! Markup element editor.
//!
//! Owns the element marker lifecycle for one markup unit and every
//! structural edit addressed through it: inline style patches, child
//! insertion, text and attribute updates, tag swaps, removal,
//! re-parenting and import resolution. All operations re-locate their
//! target through the same deterministic traversal that assigned its id.

use crate::capabilities::{
    ComponentRef, ElementMutator, MarkerInjector, OrderingHint, StylePatcher,
};
use crate::errors::{EditError, EditResult};
use crate::lookup::{
    unit_hash, LookupId, MarkerClass, MARKUP_MARKER_ATTR, MARKUP_RECENT_ATTR,
};
use crate::patch::StylePatch;
use crate::rendered::RenderedElement;
use easel_common::{LineIndex, NodeAllocator, NodeId, Position, PositionRange};
use easel_markup::ast::*;
use easel_markup::value::{attr_value_from_json, literal_text};
use easel_markup::visitor::{traverse_elements, traverse_elements_mut};
use easel_markup::{parse_snippet, MarkupTree};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Editor for the element constructs of one markup unit.
#[derive(Debug, Clone)]
pub struct ElementEditor {
    path: String,
    unit: u32,
    created: Vec<LookupId>,
}

/// What the GUI can show about an element without re-reading the file:
/// its name and the attribute values that are statically literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub component_name: String,
    pub attributes: Map<String, Value>,
}

impl ElementEditor {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            unit: unit_hash(path),
            created: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    fn marked_id(&self, ordinal: usize) -> LookupId {
        LookupId::new(self.unit, MarkerClass::Element, ordinal)
    }

    /// Node handle for a marker id in this tree. The ordinal is matched
    /// against the same traversal that assigned it, so the id survives the
    /// strip/re-parse cycle between edits.
    pub fn locate_by_marker(&self, tree: &MarkupTree, id: &LookupId) -> EditResult<NodeId> {
        if id.unit != self.unit || id.class != MarkerClass::Element {
            return Err(EditError::marker_not_found(id));
        }
        let mut next = 0usize;
        let mut found = None;
        traverse_elements(&tree.file, |_, element| {
            if element.name.is_fragment() {
                return;
            }
            if next == id.ordinal {
                found = Some(element.span.id);
            }
            next += 1;
        });
        found.ok_or_else(|| EditError::marker_not_found(id))
    }

    /// Most specific element covering a zero-based cursor position. Ties
    /// go to the earlier element in document order.
    pub fn locate_by_text_position(
        &self,
        tree: &MarkupTree,
        line: u32,
        column: u32,
    ) -> Option<LookupId> {
        let index = LineIndex::new(&tree.source);
        let offset = index.offset(Position::new(line, column))?;
        let mut next = 0usize;
        let mut best: Option<(usize, usize)> = None;
        traverse_elements(&tree.file, |_, element| {
            if element.name.is_fragment() {
                return;
            }
            let ordinal = next;
            next += 1;
            if !element.span.contains(offset) {
                return;
            }
            let len = element.span.len();
            match best {
                Some((best_len, _)) if best_len <= len => {}
                _ => best = Some((len, ordinal)),
            }
        });
        best.map(|(_, ordinal)| self.marked_id(ordinal))
    }

    /// Ids of elements tagged by an earlier insertion and not yet cleared.
    pub fn recently_added(&self, tree: &MarkupTree) -> Vec<LookupId> {
        let mut ids = Vec::new();
        let mut next = 0usize;
        traverse_elements(&tree.file, |_, element| {
            if element.name.is_fragment() {
                return;
            }
            let ordinal = next;
            next += 1;
            if element.has_attribute(MARKUP_RECENT_ATTR) {
                ids.push(self.marked_id(ordinal));
            }
        });
        ids
    }

    /// Drops the recently-added tags, once the host has collected them.
    pub fn clear_recently_added(&self, tree: &mut MarkupTree) {
        tree.with_parts(|file, _, ledger| {
            traverse_elements_mut(file, |_, element| {
                let mut parsed_removed = false;
                element.attributes.retain(|attr| {
                    if attr.name != MARKUP_RECENT_ATTR {
                        return true;
                    }
                    if !attr.span.is_synthetic() {
                        parsed_removed = true;
                    }
                    false
                });
                if parsed_removed {
                    ledger.mark_open_dirty(element.span.id);
                }
            });
        });
    }

    /// Component or tag name plus statically-literal attribute values.
    pub fn source_metadata(&self, tree: &MarkupTree, id: &LookupId) -> EditResult<SourceMetadata> {
        let node = self.locate_by_marker(tree, id)?;
        let mut meta = None;
        traverse_elements(&tree.file, |_, element| {
            if element.span.id != node {
                return;
            }
            meta = Some(SourceMetadata {
                component_name: element.name.to_string(),
                attributes: literal_attributes(element),
            });
        });
        meta.ok_or_else(|| EditError::marker_not_found(id))
    }

    /// Line/column extent of the element's source text.
    pub fn element_source_span(
        &self,
        tree: &MarkupTree,
        id: &LookupId,
    ) -> EditResult<PositionRange> {
        let node = self.locate_by_marker(tree, id)?;
        let mut extent = None;
        traverse_elements(&tree.file, |_, element| {
            if element.span.id == node && !element.span.is_synthetic() {
                extent = Some((element.span.start, element.span.end));
            }
        });
        let (start, end) = extent.ok_or_else(|| EditError::marker_not_found(id))?;
        Ok(LineIndex::new(&tree.source).range(start, end))
    }

    /// Local binding name for `name` from `module`, importing it if
    /// needed. A conflicting local name bound elsewhere gets a numeric
    /// alias rather than an error.
    pub fn resolve_or_create_import(
        &self,
        tree: &mut MarkupTree,
        module: &str,
        name: &str,
        is_default: bool,
    ) -> String {
        for item in &tree.file.items {
            if let Item::Import(import) = item {
                if import.module != module {
                    continue;
                }
                if is_default {
                    if let Some(local) = &import.default {
                        return local.clone();
                    }
                } else if let Some(named) = import.named.iter().find(|n| n.imported == name) {
                    return named.local_name().to_string();
                }
            }
        }

        let local = available_name(&tree.file, name);
        if local != name {
            warn!(unit = %self.path, name, alias = %local, "binding name taken, aliasing import");
        }
        tree.with_parts(|file, alloc, ledger| {
            for item in &mut file.items {
                if let Item::Import(import) = item {
                    if import.module != module {
                        continue;
                    }
                    if is_default {
                        import.default = Some(local.clone());
                    } else {
                        import.named.push(NamedImport {
                            imported: name.to_string(),
                            local: (local != name).then(|| local.clone()),
                            span: alloc.synthetic_span(),
                        });
                    }
                    ledger.mark_dirty(import.span.id);
                    return;
                }
            }
            let named = if is_default {
                Vec::new()
            } else {
                vec![NamedImport {
                    imported: name.to_string(),
                    local: (local != name).then(|| local.clone()),
                    span: alloc.synthetic_span(),
                }]
            };
            let import = ImportDecl {
                module: module.to_string(),
                default: is_default.then(|| local.clone()),
                namespace: None,
                named,
                span: alloc.synthetic_span(),
            };
            let at = file
                .items
                .iter()
                .rposition(|item| matches!(item, Item::Import(_)))
                .map(|i| i + 1)
                .unwrap_or(0);
            file.items.insert(at, Item::Import(import));
        });
        local
    }

    /// Points the element's inline `backgroundImage` at an asset file,
    /// default-importing the asset and referencing it through a template
    /// literal so the bundler rewrites the URL.
    pub fn set_image(
        &self,
        tree: &mut MarkupTree,
        id: &LookupId,
        asset_path: &str,
    ) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        let binding = asset_binding_name(asset_path);
        let local = self.resolve_or_create_import(tree, asset_path, &binding, true);
        debug!(unit = %self.path, id = %id, asset = asset_path, binding = %local, "setting background image");
        let done = edit_element(tree, node, move |element, alloc, ledger| {
            let object = style_object_mut(element, alloc)?;
            let value = PropValue::Raw(RawExpr {
                text: format!("`url(${{{local}}})`"),
                span: alloc.synthetic_span(),
            });
            let existing = object
                .properties
                .iter()
                .position(|prop| prop.key == "backgroundImage");
            match existing {
                Some(i) => object.properties[i].value = value,
                None => object.properties.push(ObjectProp {
                    key: "backgroundImage".to_string(),
                    value,
                    span: alloc.synthetic_span(),
                }),
            }
            ledger.mark_open_dirty(element.span.id);
            Ok(())
        });
        match done {
            Some(result) => result,
            None => Err(EditError::marker_not_found(id)),
        }
    }
}

impl MarkerInjector for ElementEditor {
    type Tree = MarkupTree;

    fn inject_markers(&mut self, tree: &mut MarkupTree) -> Vec<LookupId> {
        let unit = self.unit;
        let mut injected = Vec::new();
        tree.with_parts(|file, alloc, ledger| {
            let mut next = 0usize;
            traverse_elements_mut(file, |_, element| {
                if element.name.is_fragment() {
                    return;
                }
                let id = LookupId::new(unit, MarkerClass::Element, next);
                next += 1;
                let value = AttrValue::String(StringLit {
                    value: id.to_string(),
                    span: alloc.synthetic_span(),
                });
                match element.attribute_mut(MARKUP_MARKER_ATTR) {
                    Some(attr) => attr.value = Some(value),
                    None => element.attributes.push(Attribute {
                        name: MARKUP_MARKER_ATTR.to_string(),
                        value: Some(value),
                        span: alloc.synthetic_span(),
                    }),
                }
                ledger.mark_marker(element.span.id);
                injected.push(id);
            });
        });
        debug!(unit = %self.path, count = injected.len(), "injected element markers");
        for id in &injected {
            if !self.created.contains(id) {
                self.created.push(*id);
            }
        }
        injected
    }

    fn strip_markers(&self, tree: &mut MarkupTree) {
        tree.with_parts(|file, _, ledger| {
            traverse_elements_mut(file, |_, element| {
                let mut parsed_removed = false;
                let mut synthetic_removed = false;
                element.attributes.retain(|attr| {
                    if attr.name != MARKUP_MARKER_ATTR {
                        return true;
                    }
                    if attr.span.is_synthetic() {
                        synthetic_removed = true;
                    } else {
                        parsed_removed = true;
                    }
                    false
                });
                if synthetic_removed {
                    ledger.unmark_marker(element.span.id);
                }
                if parsed_removed {
                    ledger.mark_open_dirty(element.span.id);
                }
            });
        });
    }

    fn created_ids(&self) -> &[LookupId] {
        &self.created
    }

    fn recover_markers(&self, rendered: &dyn RenderedElement) -> Vec<LookupId> {
        rendered
            .attribute(MARKUP_MARKER_ATTR)
            .and_then(|text| LookupId::parse(&text))
            .filter(|id| id.unit == self.unit && id.class == MarkerClass::Element)
            .map(|id| vec![id])
            .unwrap_or_default()
    }
}

impl StylePatcher for ElementEditor {
    fn apply_style_patch(
        &self,
        tree: &mut MarkupTree,
        id: &LookupId,
        patch: &StylePatch,
    ) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        debug!(unit = %self.path, id = %id, entries = patch.entries.len(), "applying inline style patch");
        match edit_element(tree, node, |element, alloc, ledger| {
            apply_inline_patch(element, patch, alloc, ledger)
        }) {
            Some(result) => result,
            None => Err(EditError::marker_not_found(id)),
        }
    }
}

impl ElementMutator for ElementEditor {
    fn insert_child(
        &self,
        tree: &mut MarkupTree,
        parent: &LookupId,
        template: &str,
        hint: Option<&OrderingHint>,
    ) -> EditResult<()> {
        let node = self.locate_by_marker(tree, parent)?;
        let child = parse_snippet(template)?;
        debug!(unit = %self.path, parent = %parent, child = %child.name, "inserting child element");
        let hint_attr = hint.map(|h| h.attribute.as_str());
        let placed = edit_element(tree, node, move |element, alloc, ledger| {
            let mut child = child;
            reallocate_spans(&mut child, alloc);
            tag_recent(&mut child, alloc);
            if element.self_closing {
                element.self_closing = false;
                ledger.mark_open_dirty(element.span.id);
            }
            let at = insertion_index(element, &child, hint_attr);
            place_child(element, at, false, child, alloc);
        });
        placed.ok_or_else(|| EditError::marker_not_found(parent))
    }

    fn set_text_content(&self, tree: &mut MarkupTree, id: &LookupId, text: &str) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        let content = text.to_string();
        let done = edit_element(tree, node, move |element, alloc, ledger| {
            if element.self_closing {
                element.self_closing = false;
                ledger.mark_open_dirty(element.span.id);
            }
            replace_text_runs(element, content, alloc);
            ledger.mark_children_dirty(element.span.id);
        });
        done.ok_or_else(|| EditError::marker_not_found(id))
    }

    fn set_attributes(
        &self,
        tree: &mut MarkupTree,
        id: &LookupId,
        values: &Map<String, Value>,
    ) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        debug!(unit = %self.path, id = %id, count = values.len(), "setting attributes");
        let done = edit_element(tree, node, |element, alloc, ledger| {
            let mut changed = false;
            for (name, value) in values {
                // the marker channel belongs to the injector
                if name == MARKUP_MARKER_ATTR || name == MARKUP_RECENT_ATTR {
                    continue;
                }
                let value = attr_value_from_json(alloc, value);
                match element.attribute_mut(name) {
                    Some(attr) => {
                        if !attr_value_matches(&attr.value, &value) {
                            attr.value = value;
                            changed = true;
                        }
                    }
                    None => {
                        element.attributes.push(Attribute {
                            name: name.clone(),
                            value,
                            span: alloc.synthetic_span(),
                        });
                        changed = true;
                    }
                }
            }
            if changed {
                ledger.mark_open_dirty(element.span.id);
            }
        });
        done.ok_or_else(|| EditError::marker_not_found(id))
    }

    fn update_component(
        &self,
        tree: &mut MarkupTree,
        id: &LookupId,
        component: &ComponentRef,
    ) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        let local = match component {
            ComponentRef::Tag { name } => name.clone(),
            ComponentRef::Import {
                module,
                name,
                is_default,
            } => self.resolve_or_create_import(tree, module, name, *is_default),
        };
        debug!(unit = %self.path, id = %id, tag = %local, "swapping element tag");
        let name = tag_name(&local);
        let done = edit_element(tree, node, move |element, _, ledger| {
            if element.name == name {
                return;
            }
            element.name = name;
            ledger.mark_open_dirty(element.span.id);
            if !element.self_closing {
                ledger.mark_close_dirty(element.span.id);
            }
        });
        done.ok_or_else(|| EditError::marker_not_found(id))
    }

    fn remove_element(&self, tree: &mut MarkupTree, id: &LookupId) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        let mut outcome = Removal::Missing;
        tree.with_parts(|file, _, ledger| {
            outcome = remove_node(file, node);
            if let Removal::Removed(_, parent) = &outcome {
                ledger.mark_children_dirty(*parent);
            }
        });
        match outcome {
            Removal::Removed(..) => Ok(()),
            Removal::Refused => Err(EditError::invalid_structure(
                "element's parent is not an element",
            )),
            Removal::Missing => Err(EditError::marker_not_found(id)),
        }
    }

    fn move_element(
        &self,
        tree: &mut MarkupTree,
        id: &LookupId,
        new_parent: &LookupId,
        index: usize,
    ) -> EditResult<()> {
        let node = self.locate_by_marker(tree, id)?;
        let parent_node = self.locate_by_marker(tree, new_parent)?;
        if node == parent_node || subtree_contains(tree, node, parent_node) {
            return Err(EditError::CycleDetected);
        }
        let mut removed = None;
        let mut refused = false;
        tree.with_parts(|file, _, ledger| match remove_node(file, node) {
            Removal::Removed(el, old_parent) => {
                ledger.mark_children_dirty(old_parent);
                removed = Some(el);
            }
            Removal::Refused => refused = true,
            Removal::Missing => {}
        });
        if refused {
            return Err(EditError::invalid_structure(
                "element's parent is not an element",
            ));
        }
        let el = removed.ok_or_else(|| EditError::marker_not_found(id))?;
        let placed = edit_element(tree, parent_node, move |parent, alloc, ledger| {
            let mut el = el;
            reallocate_spans(&mut el, alloc);
            if parent.self_closing {
                parent.self_closing = false;
                ledger.mark_open_dirty(parent.span.id);
            }
            match nth_element_index(parent, index) {
                Some(at) => place_child(parent, at, true, el, alloc),
                None => place_child(parent, append_index(parent), false, el, alloc),
            }
        });
        placed.ok_or_else(|| EditError::marker_not_found(new_parent))
    }
}

/// Runs `f` on the element with the given node id, with the allocator and
/// ledger alongside.
fn edit_element<R>(
    tree: &mut MarkupTree,
    node: NodeId,
    f: impl FnOnce(&mut Element, &mut NodeAllocator, &mut PrintLedger) -> R,
) -> Option<R> {
    let mut f = Some(f);
    let mut result = None;
    tree.with_parts(|file, alloc, ledger| {
        traverse_elements_mut(file, |_, element| {
            if element.span.id == node {
                if let Some(f) = f.take() {
                    result = Some(f(element, alloc, ledger));
                }
            }
        });
    });
    result
}

/// Find-or-create the `style={{...}}` attribute and apply the entries in
/// order. Inline object keys keep the camel-case form the patch uses.
fn apply_inline_patch(
    element: &mut Element,
    patch: &StylePatch,
    alloc: &mut NodeAllocator,
    ledger: &mut PrintLedger,
) -> EditResult<()> {
    if patch.is_empty() {
        return Ok(());
    }
    let has_sets = patch.entries.iter().any(|e| e.value.is_some());
    if element.attribute("style").is_none() && !has_sets {
        return Ok(());
    }
    let object = style_object_mut(element, alloc)?;
    let mut changed = false;
    for entry in &patch.entries {
        let existing = object
            .properties
            .iter()
            .position(|prop| prop.key == entry.property);
        match (&entry.value, existing) {
            (Some(value), Some(i)) => {
                let prop = &mut object.properties[i];
                if literal_text(&prop.value).as_deref() != Some(value.as_str()) {
                    prop.value = PropValue::String(StringLit {
                        value: value.clone(),
                        span: alloc.synthetic_span(),
                    });
                    changed = true;
                }
            }
            (Some(value), None) => {
                object.properties.push(ObjectProp {
                    key: entry.property.clone(),
                    value: PropValue::String(StringLit {
                        value: value.clone(),
                        span: alloc.synthetic_span(),
                    }),
                    span: alloc.synthetic_span(),
                });
                changed = true;
            }
            (None, Some(i)) => {
                object.properties.remove(i);
                changed = true;
            }
            (None, None) => {}
        }
    }
    if changed {
        ledger.mark_open_dirty(element.span.id);
    }
    Ok(())
}

/// Find-or-create the element's `style={{...}}` attribute and hand out its
/// object literal. Errors when the attribute holds anything but an inline
/// object.
fn style_object_mut<'el>(
    element: &'el mut Element,
    alloc: &mut NodeAllocator,
) -> EditResult<&'el mut ObjectLit> {
    if element.attribute("style").is_none() {
        element.attributes.push(Attribute {
            name: "style".to_string(),
            value: Some(AttrValue::Container(ExprContainer {
                expr: Expr::Object(ObjectLit {
                    properties: Vec::new(),
                    span: alloc.synthetic_span(),
                }),
                span: alloc.synthetic_span(),
            })),
            span: alloc.synthetic_span(),
        });
    }
    let attr = element
        .attribute_mut("style")
        .ok_or_else(|| EditError::invalid_structure("style attribute is not an object literal"))?;
    match &mut attr.value {
        Some(AttrValue::Container(container)) => match &mut container.expr {
            Expr::Object(object) => Ok(object),
            Expr::Raw(_) => Err(EditError::invalid_structure(
                "style attribute is not an object literal",
            )),
        },
        _ => Err(EditError::invalid_structure(
            "style attribute is not an object literal",
        )),
    }
}

/// Whether an attribute already holds the requested value; only bare and
/// string forms compare, containers always count as changed.
fn attr_value_matches(current: &Option<AttrValue>, next: &Option<AttrValue>) -> bool {
    match (current, next) {
        (None, None) => true,
        (Some(AttrValue::String(a)), Some(AttrValue::String(b))) => a.value == b.value,
        _ => false,
    }
}

fn literal_attributes(element: &Element) -> Map<String, Value> {
    let mut out = Map::new();
    for attr in &element.attributes {
        if attr.name == MARKUP_MARKER_ATTR || attr.name == MARKUP_RECENT_ATTR {
            continue;
        }
        let value = match &attr.value {
            None => Value::Bool(true),
            Some(AttrValue::String(lit)) => Value::String(lit.value.clone()),
            Some(AttrValue::Container(container)) => match &container.expr {
                Expr::Object(obj) => match object_to_json(obj) {
                    Some(value) => value,
                    None => continue,
                },
                Expr::Raw(_) => continue,
            },
        };
        out.insert(attr.name.clone(), value);
    }
    out
}

fn object_to_json(obj: &ObjectLit) -> Option<Value> {
    let mut map = Map::new();
    for prop in &obj.properties {
        let value = match &prop.value {
            PropValue::String(lit) => Value::String(lit.value.clone()),
            PropValue::Number(num) => num
                .raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)?,
            PropValue::Bool { value, .. } => Value::Bool(*value),
            PropValue::Raw(_) => return None,
        };
        map.insert(prop.key.clone(), value);
    }
    Some(Value::Object(map))
}

/// First binding name free at the top level: `name`, then `name2`, ...
fn available_name(file: &SourceFile, name: &str) -> String {
    if !binding_taken(file, name) {
        return name.to_string();
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{name}{n}");
        if !binding_taken(file, &candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn binding_taken(file: &SourceFile, name: &str) -> bool {
    for item in &file.items {
        match item {
            Item::Import(import) => {
                if import.default.as_deref() == Some(name)
                    || import.namespace.as_deref() == Some(name)
                    || import.named.iter().any(|n| n.local_name() == name)
                {
                    return true;
                }
            }
            Item::Function(func) => {
                if func.name.as_deref() == Some(name) {
                    return true;
                }
            }
            Item::Styled(styled) => {
                if styled.name == name {
                    return true;
                }
            }
            Item::Raw(_) => {}
        }
    }
    false
}

/// Tag name for a local binding; a dotted name becomes a member tag.
fn tag_name(text: &str) -> JsxName {
    match text.rsplit_once('.') {
        Some((object, property)) => JsxName::Member {
            object: object.to_string(),
            property: property.to_string(),
        },
        None => JsxName::Ident {
            name: text.to_string(),
        },
    }
}

/// `Asset` plus the pascal-cased stem of the file name:
/// `./icons/logo-small.png` becomes `AssetLogoSmall`.
fn asset_binding_name(path: &str) -> String {
    let file = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    let stem = file.split('.').next().unwrap_or(file);
    let mut name = String::from("Asset");
    let mut boundary = true;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if boundary {
                name.extend(c.to_uppercase());
            } else {
                name.push(c);
            }
            boundary = false;
        } else {
            boundary = true;
        }
    }
    name
}

// --- subtree surgery ---

enum Removal {
    Removed(Element, NodeId),
    Refused,
    Missing,
}

fn remove_node(file: &mut SourceFile, target: NodeId) -> Removal {
    for item in &mut file.items {
        if let Item::Function(func) = item {
            let result = match &mut func.body {
                FunctionBody::Block { statements, .. } => {
                    let mut result = Removal::Missing;
                    for stmt in statements {
                        if let Stmt::Return(ret) = stmt {
                            if let Some(value) = &mut ret.value {
                                result = remove_in_value(value, target);
                                if !matches!(result, Removal::Missing) {
                                    break;
                                }
                            }
                        }
                    }
                    result
                }
                FunctionBody::Expr { value, .. } => remove_in_value(value, target),
            };
            if !matches!(result, Removal::Missing) {
                return result;
            }
        }
    }
    Removal::Missing
}

fn remove_in_value(value: &mut ReturnValue, target: NodeId) -> Removal {
    match value {
        ReturnValue::Element(el) => {
            if el.span.id == target {
                // root of a return; its parent is not an element
                return Removal::Refused;
            }
            remove_in_children(&mut el.children, Some(el.span.id), target)
        }
        ReturnValue::Fragment(frag) => remove_in_children(&mut frag.children, None, target),
        ReturnValue::Raw(_) => Removal::Missing,
    }
}

fn remove_in_children(
    children: &mut Vec<JsxChild>,
    owner: Option<NodeId>,
    target: NodeId,
) -> Removal {
    let mut index = None;
    for (i, child) in children.iter().enumerate() {
        if let JsxChild::Element(el) = child {
            if el.span.id == target {
                index = Some(i);
                break;
            }
        }
    }
    if let Some(i) = index {
        let owner = match owner {
            Some(owner) => owner,
            None => return Removal::Refused,
        };
        let removed = match children.remove(i) {
            JsxChild::Element(el) => el,
            _ => return Removal::Missing,
        };
        // take the indentation run that preceded it off with it
        if i > 0 {
            if let Some(JsxChild::Text(text)) = children.get(i - 1) {
                if text.text.trim().is_empty() {
                    children.remove(i - 1);
                }
            }
        }
        return Removal::Removed(removed, owner);
    }
    for child in children {
        let result = match child {
            JsxChild::Element(el) => {
                remove_in_children(&mut el.children, Some(el.span.id), target)
            }
            JsxChild::Fragment(frag) => remove_in_children(&mut frag.children, None, target),
            _ => Removal::Missing,
        };
        if !matches!(result, Removal::Missing) {
            return result;
        }
    }
    Removal::Missing
}

/// Whether `needle` sits inside the subtree rooted at `root`.
fn subtree_contains(tree: &MarkupTree, root: NodeId, needle: NodeId) -> bool {
    let mut inside = false;
    traverse_elements(&tree.file, |_, element| {
        if element.span.id == root {
            inside = element_subtree_has(element, needle);
        }
    });
    inside
}

fn element_subtree_has(element: &Element, needle: NodeId) -> bool {
    element.children.iter().any(|child| match child {
        JsxChild::Element(el) => el.span.id == needle || element_subtree_has(el, needle),
        JsxChild::Fragment(frag) => frag.children.iter().any(|c| match c {
            JsxChild::Element(el) => el.span.id == needle || element_subtree_has(el, needle),
            _ => false,
        }),
        _ => false,
    })
}

// --- child placement ---

/// Vec index where a new element goes. With a hint attribute, the child
/// lands after the most specific sibling whose value prefixes the new
/// child's; otherwise (or with no match) it lands last.
fn insertion_index(parent: &Element, child: &Element, hint_attr: Option<&str>) -> usize {
    if let Some(attr) = hint_attr {
        if let Some(child_value) = child.string_attribute(attr) {
            let mut best: Option<(usize, usize)> = None;
            for (i, sibling) in parent.children.iter().enumerate() {
                if let JsxChild::Element(el) = sibling {
                    if let Some(value) = el.string_attribute(attr) {
                        if child_value.starts_with(value) {
                            match best {
                                Some((best_len, _)) if best_len > value.len() => {}
                                _ => best = Some((value.len(), i)),
                            }
                        }
                    }
                }
            }
            if let Some((_, i)) = best {
                return i + 1;
            }
        }
    }
    append_index(parent)
}

/// Last sensible position: before a trailing indentation run when there is
/// one, else at the very end.
fn append_index(parent: &Element) -> usize {
    match parent.children.last() {
        Some(JsxChild::Text(text)) if text.text.trim().is_empty() && text.text.contains('\n') => {
            parent.children.len() - 1
        }
        _ => parent.children.len(),
    }
}

/// Swaps the element's content text runs for one literal run, placed where
/// the first one sat. Whitespace-only runs are layout and stay put; element
/// and expression children are untouched.
fn replace_text_runs(element: &mut Element, text: String, alloc: &mut NodeAllocator) {
    let replacement = JsxChild::Text(JsxText {
        text,
        span: alloc.synthetic_span(),
    });
    let mut at = None;
    let mut kept = 0usize;
    element.children.retain(|child| match child {
        JsxChild::Text(run) if !run.text.trim().is_empty() => {
            if at.is_none() {
                at = Some(kept);
            }
            false
        }
        _ => {
            kept += 1;
            true
        }
    });
    match at {
        Some(at) => element.children.insert(at, replacement),
        None => {
            let at = append_index(element);
            element.children.insert(at, replacement);
        }
    }
}

/// Position of the `index`-th element child in the children vec.
fn nth_element_index(parent: &Element, index: usize) -> Option<usize> {
    let mut seen = 0usize;
    for (i, child) in parent.children.iter().enumerate() {
        if matches!(child, JsxChild::Element(_)) {
            if seen == index {
                return Some(i);
            }
            seen += 1;
        }
    }
    None
}

/// Inserts an element at a vec position, adding an indentation text run
/// when the parent lays children out on their own lines. When inserting
/// before an existing sibling the run goes after the new element so both
/// stay indented.
fn place_child(
    parent: &mut Element,
    at: usize,
    before_sibling: bool,
    element: Element,
    alloc: &mut NodeAllocator,
) {
    match child_separator(parent) {
        Some(sep) if before_sibling => {
            parent.children.insert(at, JsxChild::Element(element));
            parent.children.insert(
                at + 1,
                JsxChild::Text(JsxText {
                    text: sep,
                    span: alloc.synthetic_span(),
                }),
            );
        }
        Some(sep) => {
            parent.children.insert(
                at,
                JsxChild::Text(JsxText {
                    text: sep,
                    span: alloc.synthetic_span(),
                }),
            );
            parent
                .children
                .insert(at + 1, JsxChild::Element(element));
        }
        None => parent.children.insert(at, JsxChild::Element(element)),
    }
}

/// Indentation run separating this parent's children, when it has one.
fn child_separator(parent: &Element) -> Option<String> {
    parent.children.iter().find_map(|child| match child {
        JsxChild::Text(text) if text.text.contains('\n') && text.text.trim().is_empty() => {
            Some(text.text.clone())
        }
        _ => None,
    })
}

fn tag_recent(child: &mut Element, alloc: &mut NodeAllocator) {
    child.attributes.push(Attribute {
        name: MARKUP_RECENT_ATTR.to_string(),
        value: Some(AttrValue::String(StringLit {
            value: "true".to_string(),
            span: alloc.synthetic_span(),
        })),
        span: alloc.synthetic_span(),
    });
}

// --- span reallocation ---

/// Replaces every span in a subtree with synthetic ones from this tree's
/// allocator, so nodes parsed elsewhere (or relocated) print canonically.
fn reallocate_spans(element: &mut Element, alloc: &mut NodeAllocator) {
    element.span = alloc.synthetic_span();
    element.open_end = 0;
    element.close_start = 0;
    for attr in &mut element.attributes {
        attr.span = alloc.synthetic_span();
        match &mut attr.value {
            Some(AttrValue::String(lit)) => lit.span = alloc.synthetic_span(),
            Some(AttrValue::Container(container)) => reallocate_container(container, alloc),
            None => {}
        }
    }
    for child in &mut element.children {
        reallocate_child(child, alloc);
    }
}

fn reallocate_child(child: &mut JsxChild, alloc: &mut NodeAllocator) {
    match child {
        JsxChild::Element(el) => reallocate_spans(el, alloc),
        JsxChild::Fragment(frag) => {
            frag.span = alloc.synthetic_span();
            frag.open_end = 0;
            frag.close_start = 0;
            for c in &mut frag.children {
                reallocate_child(c, alloc);
            }
        }
        JsxChild::Text(text) => text.span = alloc.synthetic_span(),
        JsxChild::Expr(container) => reallocate_container(container, alloc),
    }
}

fn reallocate_container(container: &mut ExprContainer, alloc: &mut NodeAllocator) {
    container.span = alloc.synthetic_span();
    match &mut container.expr {
        Expr::Object(obj) => {
            obj.span = alloc.synthetic_span();
            for prop in &mut obj.properties {
                prop.span = alloc.synthetic_span();
                match &mut prop.value {
                    PropValue::String(lit) => lit.span = alloc.synthetic_span(),
                    PropValue::Number(num) => num.span = alloc.synthetic_span(),
                    PropValue::Bool { span, .. } => *span = alloc.synthetic_span(),
                    PropValue::Raw(raw) => raw.span = alloc.synthetic_span(),
                }
            }
        }
        Expr::Raw(raw) => raw.span = alloc.synthetic_span(),
    }
}
