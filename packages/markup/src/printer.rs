use crate::ast::*;

/// Serializer converts AST back to source code
///
/// The canonical serializer preserves structure but reformats whitespace.
/// [`print`] is the source-faithful variant: it copies clean nodes verbatim
/// from the original text and only re-serializes nodes the ledger flags.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "  ".to_string(), // 2 spaces
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a whole file to source code.
    pub fn serialize(&mut self, file: &SourceFile) -> String {
        let mut output = String::new();
        for (i, item) in file.items.iter().enumerate() {
            if i > 0 {
                // imports stay packed together, everything else gets a blank
                // line between items
                let both_imports = matches!(item, Item::Import(_))
                    && matches!(file.items[i - 1], Item::Import(_));
                if !both_imports {
                    output.push('\n');
                }
            }
            self.serialize_item(item, &mut output);
            output.push('\n');
        }
        output
    }

    fn serialize_item(&mut self, item: &Item, output: &mut String) {
        match item {
            Item::Import(import) => write_import(import, output),
            Item::Function(func) => self.serialize_function(func, output),
            Item::Styled(styled) => write_styled(styled, output),
            Item::Raw(raw) => output.push_str(&raw.text),
        }
    }

    pub(crate) fn serialize_function(&mut self, func: &FunctionDecl, output: &mut String) {
        match func.export {
            ExportKind::Named => output.push_str("export "),
            ExportKind::Default => output.push_str("export default "),
            ExportKind::None => {}
        }
        match func.kind {
            FnKind::Declaration => {
                output.push_str("function");
                if let Some(name) = &func.name {
                    output.push(' ');
                    output.push_str(name);
                }
                output.push('(');
                output.push_str(&func.params);
                output.push_str(") ");
                self.serialize_body(&func.body, output);
            }
            FnKind::Arrow => {
                if let Some(name) = &func.name {
                    output.push_str("const ");
                    output.push_str(name);
                    output.push_str(" = ");
                }
                output.push('(');
                output.push_str(&func.params);
                output.push_str(") => ");
                self.serialize_body(&func.body, output);
                output.push(';');
            }
        }
    }

    fn serialize_body(&mut self, body: &FunctionBody, output: &mut String) {
        match body {
            FunctionBody::Block { statements, .. } => {
                output.push_str("{\n");
                self.indent_level += 1;
                for stmt in statements {
                    match stmt {
                        Stmt::Return(ret) => self.serialize_return(ret, output),
                        Stmt::Raw(raw) => {
                            self.write_indent(output);
                            output.push_str(&raw.text);
                            output.push('\n');
                        }
                    }
                }
                self.indent_level -= 1;
                self.write_indent(output);
                output.push('}');
            }
            FunctionBody::Expr { value, .. } => self.serialize_value(value, output),
        }
    }

    fn serialize_return(&mut self, ret: &ReturnStmt, output: &mut String) {
        self.write_indent(output);
        output.push_str("return");
        match &ret.value {
            None => output.push(';'),
            Some(value) => {
                output.push(' ');
                self.serialize_value(value, output);
                output.push(';');
            }
        }
        output.push('\n');
    }

    fn serialize_value(&mut self, value: &ReturnValue, output: &mut String) {
        match value {
            ReturnValue::Raw(raw) => output.push_str(&raw.text),
            ReturnValue::Element(_) | ReturnValue::Fragment(_) => {
                output.push_str("(\n");
                self.indent_level += 1;
                match value {
                    ReturnValue::Element(el) => self.serialize_element(el, output),
                    ReturnValue::Fragment(frag) => self.serialize_fragment(frag, output),
                    ReturnValue::Raw(_) => {}
                }
                self.indent_level -= 1;
                self.write_indent(output);
                output.push(')');
            }
        }
    }

    fn serialize_element(&mut self, el: &Element, output: &mut String) {
        self.write_indent(output);
        write_open_tag(el, output);
        if el.self_closing {
            output.push('\n');
            return;
        }
        if el.children.is_empty() {
            write_close_tag(el, output);
            output.push('\n');
            return;
        }
        output.push('\n');
        self.indent_level += 1;
        for child in &el.children {
            self.serialize_child(child, output);
        }
        self.indent_level -= 1;
        self.write_indent(output);
        write_close_tag(el, output);
        output.push('\n');
    }

    fn serialize_fragment(&mut self, frag: &Fragment, output: &mut String) {
        self.write_indent(output);
        output.push_str("<>\n");
        self.indent_level += 1;
        for child in &frag.children {
            self.serialize_child(child, output);
        }
        self.indent_level -= 1;
        self.write_indent(output);
        output.push_str("</>\n");
    }

    fn serialize_child(&mut self, child: &JsxChild, output: &mut String) {
        match child {
            JsxChild::Element(el) => self.serialize_element(el, output),
            JsxChild::Fragment(frag) => self.serialize_fragment(frag, output),
            JsxChild::Text(text) => {
                let trimmed = text.text.trim();
                if !trimmed.is_empty() {
                    self.write_indent(output);
                    output.push_str(trimmed);
                    output.push('\n');
                }
            }
            JsxChild::Expr(container) => {
                self.write_indent(output);
                write_container(container, output);
                output.push('\n');
            }
        }
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

// Single-line emitters shared by the canonical serializer and the
// source-faithful printer.

pub(crate) fn write_import(import: &ImportDecl, output: &mut String) {
    output.push_str("import ");
    let mut wrote_binding = false;
    if let Some(default) = &import.default {
        output.push_str(default);
        wrote_binding = true;
    }
    if let Some(namespace) = &import.namespace {
        if wrote_binding {
            output.push_str(", ");
        }
        output.push_str("* as ");
        output.push_str(namespace);
        wrote_binding = true;
    }
    if !import.named.is_empty() {
        if wrote_binding {
            output.push_str(", ");
        }
        output.push_str("{ ");
        for (i, named) in import.named.iter().enumerate() {
            if i > 0 {
                output.push_str(", ");
            }
            output.push_str(&named.imported);
            if let Some(local) = &named.local {
                output.push_str(" as ");
                output.push_str(local);
            }
        }
        output.push_str(" }");
        wrote_binding = true;
    }
    if wrote_binding {
        output.push_str(" from ");
    }
    output.push('"');
    output.push_str(&import.module);
    output.push_str("\";");
}

pub(crate) fn write_styled(styled: &StyledDecl, output: &mut String) {
    match styled.export {
        ExportKind::Named => output.push_str("export "),
        ExportKind::Default => output.push_str("export default "),
        ExportKind::None => {}
    }
    output.push_str("const ");
    output.push_str(&styled.name);
    output.push_str(" = styled");
    match &styled.target {
        StyledTarget::Tag { name } => {
            output.push('.');
            output.push_str(name);
        }
        StyledTarget::Component { expr } => {
            output.push('(');
            output.push_str(&expr.text);
            output.push(')');
        }
    }
    output.push('`');
    for (i, chunk) in styled.template.chunks.iter().enumerate() {
        if i > 0 {
            output.push_str("${");
            output.push_str(&styled.template.exprs[i - 1].text);
            output.push('}');
        }
        output.push_str(&chunk.text);
    }
    output.push_str("`;");
}

pub(crate) fn write_open_tag(el: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&el.name.to_string());
    for attr in &el.attributes {
        output.push(' ');
        write_attr(attr, output);
    }
    if el.self_closing {
        output.push_str(" />");
    } else {
        output.push('>');
    }
}

pub(crate) fn write_close_tag(el: &Element, output: &mut String) {
    output.push_str("</");
    output.push_str(&el.name.to_string());
    output.push('>');
}

pub(crate) fn write_attr(attr: &Attribute, output: &mut String) {
    output.push_str(&attr.name);
    match &attr.value {
        None => {}
        Some(AttrValue::String(lit)) => {
            output.push_str("=\"");
            output.push_str(&lit.value);
            output.push('"');
        }
        Some(AttrValue::Container(container)) => {
            output.push('=');
            write_container(container, output);
        }
    }
}

pub(crate) fn write_container(container: &ExprContainer, output: &mut String) {
    output.push('{');
    match &container.expr {
        Expr::Raw(raw) => output.push_str(&raw.text),
        Expr::Object(obj) => write_object(obj, output),
    }
    output.push('}');
}

pub(crate) fn write_object(obj: &ObjectLit, output: &mut String) {
    if obj.properties.is_empty() {
        output.push_str("{}");
        return;
    }
    output.push_str("{ ");
    for (i, prop) in obj.properties.iter().enumerate() {
        if i > 0 {
            output.push_str(", ");
        }
        if is_ident_key(&prop.key) {
            output.push_str(&prop.key);
        } else {
            output.push('"');
            output.push_str(&prop.key);
            output.push('"');
        }
        output.push_str(": ");
        write_prop_value(&prop.value, output);
    }
    output.push_str(" }");
}

pub(crate) fn write_prop_value(value: &PropValue, output: &mut String) {
    match value {
        PropValue::String(lit) => {
            output.push('"');
            output.push_str(&lit.value);
            output.push('"');
        }
        PropValue::Number(num) => output.push_str(&num.raw),
        PropValue::Bool { value, .. } => {
            output.push_str(if *value { "true" } else { "false" })
        }
        PropValue::Raw(raw) => output.push_str(&raw.text),
    }
}

/// Whole element on one line; used for nodes built after parsing, which
/// carry no source of their own.
pub(crate) fn write_element_inline(el: &Element, output: &mut String) {
    write_open_tag(el, output);
    if el.self_closing {
        return;
    }
    for child in &el.children {
        match child {
            JsxChild::Element(inner) => write_element_inline(inner, output),
            JsxChild::Fragment(frag) => {
                output.push_str("<>");
                for inner in &frag.children {
                    if let JsxChild::Element(el) = inner {
                        write_element_inline(el, output);
                    } else if let JsxChild::Text(text) = inner {
                        output.push_str(&text.text);
                    }
                }
                output.push_str("</>");
            }
            JsxChild::Text(text) => output.push_str(&text.text),
            JsxChild::Expr(container) => write_container(container, output),
        }
    }
    write_close_tag(el, output);
}

fn is_ident_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Source-faithful print. Clean subtrees come back byte-for-byte from the
/// original text; ledger-flagged nodes are re-emitted from the tree.
pub(crate) fn print(tree: &MarkupTree) -> String {
    let mut printer = Printer {
        source: &tree.source,
        ledger: tree.ledger(),
        out: String::with_capacity(tree.source.len() + 64),
        last_end: 0,
        pending_break: false,
    };
    for item in &tree.file.items {
        printer.print_item(item);
    }
    printer.finish(tree.source.len())
}

struct Printer<'a> {
    source: &'a str,
    ledger: &'a PrintLedger,
    out: String,
    /// How far into the source verbatim copying has progressed.
    last_end: usize,
    /// A synthetic item was just emitted; the next copied gap must start on
    /// a fresh line.
    pending_break: bool,
}

impl<'a> Printer<'a> {
    fn finish(mut self, source_len: usize) -> String {
        self.copy_gap(source_len);
        if self.pending_break && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    /// Copies the untouched bytes between the previous node and `to`.
    fn copy_gap(&mut self, to: usize) {
        if to < self.last_end {
            return;
        }
        let gap = &self.source[self.last_end..to];
        if self.pending_break && !gap.starts_with('\n') && !gap.starts_with("\r\n") {
            self.out.push('\n');
        }
        self.pending_break = false;
        self.out.push_str(gap);
        self.last_end = to;
    }

    fn copy_to(&mut self, to: usize) {
        self.out.push_str(&self.source[self.last_end..to]);
        self.last_end = to;
    }

    fn break_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn print_item(&mut self, item: &Item) {
        match item {
            Item::Import(import) => {
                if import.span.is_synthetic() {
                    self.break_line();
                    write_import(import, &mut self.out);
                    self.pending_break = true;
                    return;
                }
                self.copy_gap(import.span.start);
                if self.ledger.is_flagged(import.span.id) {
                    write_import(import, &mut self.out);
                    self.last_end = import.span.end;
                } else {
                    self.copy_to(import.span.end);
                }
            }
            Item::Raw(raw) => {
                if raw.span.is_synthetic() {
                    self.break_line();
                    self.out.push_str(&raw.text);
                    self.pending_break = true;
                    return;
                }
                self.copy_gap(raw.span.start);
                self.copy_to(raw.span.end);
            }
            Item::Styled(styled) => self.print_styled(styled),
            Item::Function(func) => self.print_function(func),
        }
    }

    fn print_styled(&mut self, styled: &StyledDecl) {
        if styled.span.is_synthetic() {
            self.break_line();
            write_styled(styled, &mut self.out);
            self.pending_break = true;
            return;
        }
        self.copy_gap(styled.span.start);
        if self.ledger.is_dirty(styled.span.id) {
            write_styled(styled, &mut self.out);
            self.last_end = styled.span.end;
            return;
        }
        // untouched chunks and every interpolation flow through gap copying
        for chunk in &styled.template.chunks {
            if self.ledger.is_flagged(chunk.span.id) {
                self.copy_gap(chunk.span.start);
                self.out.push_str(&chunk.text);
                self.last_end = chunk.span.end;
            }
        }
    }

    fn print_function(&mut self, func: &FunctionDecl) {
        if func.span.is_synthetic() {
            self.break_line();
            Serializer::new().serialize_function(func, &mut self.out);
            self.pending_break = true;
            return;
        }
        self.copy_gap(func.span.start);
        if self.ledger.is_dirty(func.span.id) {
            Serializer::new().serialize_function(func, &mut self.out);
            self.last_end = func.span.end;
            return;
        }
        match &func.body {
            FunctionBody::Block { statements, .. } => {
                for stmt in statements {
                    if let Stmt::Return(ret) = stmt {
                        self.print_return(ret);
                    }
                }
            }
            FunctionBody::Expr { value, .. } => self.print_value(value),
        }
    }

    fn print_return(&mut self, ret: &ReturnStmt) {
        self.copy_gap(ret.span.start);
        if let Some(value) = &ret.value {
            self.print_value(value);
        }
        self.copy_to(ret.span.end);
    }

    fn print_value(&mut self, value: &ReturnValue) {
        match value {
            ReturnValue::Element(el) => self.print_element(el),
            ReturnValue::Fragment(frag) => self.print_fragment(frag),
            ReturnValue::Raw(_) => {}
        }
    }

    fn print_element(&mut self, el: &Element) {
        if el.span.is_synthetic() {
            write_element_inline(el, &mut self.out);
            return;
        }
        if !self.element_flagged(el) {
            self.copy_gap(el.span.start);
            self.copy_to(el.span.end);
            return;
        }
        self.copy_gap(el.span.start);
        if self.ledger.is_dirty(el.span.id) {
            write_element_inline(el, &mut self.out);
            self.last_end = el.span.end;
            return;
        }
        if self.ledger.is_open_dirty(el.span.id) {
            write_open_tag(el, &mut self.out);
            self.last_end = el.open_end;
        } else {
            self.copy_to(el.open_end);
        }
        for child in &el.children {
            self.print_child(child);
        }
        if el.self_closing {
            return;
        }
        if el.close_start >= el.span.end {
            // was self-closing when parsed; the close tag exists only in
            // the tree
            write_close_tag(el, &mut self.out);
            self.last_end = el.span.end;
        } else if self.ledger.is_close_dirty(el.span.id) {
            write_close_tag(el, &mut self.out);
            self.last_end = el.span.end;
        } else {
            self.last_end = el.close_start;
            self.copy_to(el.span.end);
        }
    }

    fn print_fragment(&mut self, frag: &Fragment) {
        if frag.span.is_synthetic() {
            self.out.push_str("<>");
            for child in &frag.children {
                self.print_child(child);
            }
            self.out.push_str("</>");
            return;
        }
        if !self.fragment_flagged(frag) {
            self.copy_gap(frag.span.start);
            self.copy_to(frag.span.end);
            return;
        }
        self.copy_gap(frag.span.start);
        self.copy_to(frag.open_end);
        for child in &frag.children {
            self.print_child(child);
        }
        self.last_end = frag.close_start;
        self.copy_to(frag.span.end);
    }

    /// Children cover every byte between the open and close tags, so they
    /// are printed back to back; jumping `last_end` to each child's start
    /// drops bytes owned by children that were removed from the tree.
    fn print_child(&mut self, child: &JsxChild) {
        match child {
            JsxChild::Element(el) => {
                if !el.span.is_synthetic() {
                    self.last_end = el.span.start;
                }
                self.print_element(el);
            }
            JsxChild::Fragment(frag) => {
                if !frag.span.is_synthetic() {
                    self.last_end = frag.span.start;
                }
                self.print_fragment(frag);
            }
            JsxChild::Text(text) => {
                if text.span.is_synthetic() {
                    self.out.push_str(&text.text);
                } else if self.ledger.is_flagged(text.span.id) {
                    self.out.push_str(&text.text);
                    self.last_end = text.span.end;
                } else {
                    self.last_end = text.span.start;
                    self.copy_to(text.span.end);
                }
            }
            JsxChild::Expr(container) => {
                if container.span.is_synthetic() {
                    write_container(container, &mut self.out);
                } else {
                    self.last_end = container.span.start;
                    self.copy_to(container.span.end);
                }
            }
        }
    }

    fn element_flagged(&self, el: &Element) -> bool {
        el.span.is_synthetic()
            || self.ledger.is_flagged(el.span.id)
            || el.children.iter().any(|child| self.child_flagged(child))
    }

    fn fragment_flagged(&self, frag: &Fragment) -> bool {
        frag.span.is_synthetic()
            || self.ledger.is_flagged(frag.span.id)
            || frag.children.iter().any(|child| self.child_flagged(child))
    }

    fn child_flagged(&self, child: &JsxChild) -> bool {
        match child {
            JsxChild::Element(el) => self.element_flagged(el),
            JsxChild::Fragment(frag) => self.fragment_flagged(frag),
            JsxChild::Text(text) => {
                text.span.is_synthetic() || self.ledger.is_flagged(text.span.id)
            }
            JsxChild::Expr(container) => {
                container.span.is_synthetic() || self.ledger.is_flagged(container.span.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::visitor::traverse_elements_mut;
    use easel_common::Span;

    const SAMPLE: &str = "import React from \"react\";\n\n// main component\nconst App = () => {\n  const title = \"hi\";   // trailing comment\n  return (\n    <div className=\"app\">\n      <h1>{title}</h1>\n      <img src=\"a.png\" />\n    </div>\n  );\n};\n\nexport default App;\n";

    #[test]
    fn untouched_tree_prints_byte_identical() {
        let tree = parse(SAMPLE).unwrap();
        assert_eq!(tree.print(), SAMPLE);
    }

    #[test]
    fn untouched_styled_prints_byte_identical() {
        let src = "const Box = styled.div`\n  color: ${color};\n  display: flex;\n`;\n";
        let tree = parse(src).unwrap();
        assert_eq!(tree.print(), src);
    }

    #[test]
    fn attribute_edit_rewrites_only_the_open_tag() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, alloc, ledger| {
            traverse_elements_mut(file, |ordinal, el| {
                if ordinal == 0 {
                    el.attributes.push(Attribute {
                        name: "data-id".to_string(),
                        value: Some(AttrValue::String(StringLit {
                            value: "root".to_string(),
                            span: alloc.synthetic_span(),
                        })),
                        span: alloc.synthetic_span(),
                    });
                    ledger.mark_open_dirty(el.span.id);
                }
            });
        });
        let printed = tree.print();
        assert!(printed.contains("<div className=\"app\" data-id=\"root\">"));
        // untouched parts keep their formatting, comments included
        assert!(printed.contains("// main component"));
        assert!(printed.contains("      <h1>{title}</h1>\n"));
        assert!(printed.contains("  const title = \"hi\";   // trailing comment\n"));
    }

    #[test]
    fn clearing_marker_flags_restores_identity() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, alloc, ledger| {
            traverse_elements_mut(file, |_, el| {
                el.attributes.push(Attribute {
                    name: "data-tmp".to_string(),
                    value: None,
                    span: alloc.synthetic_span(),
                });
                ledger.mark_marker(el.span.id);
            });
        });
        tree.with_parts(|file, _, ledger| {
            traverse_elements_mut(file, |_, el| {
                el.attributes.retain(|attr| attr.name != "data-tmp");
            });
            ledger.clear_markers();
        });
        assert_eq!(tree.print(), SAMPLE);
    }

    #[test]
    fn self_closing_conversion_emits_a_close_tag() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, alloc, ledger| {
            traverse_elements_mut(file, |_, el| {
                if el.name.to_string() == "img" {
                    el.self_closing = false;
                    el.close_start = el.span.end;
                    el.children.push(JsxChild::Text(JsxText {
                        text: "photo".to_string(),
                        span: alloc.synthetic_span(),
                    }));
                    ledger.mark_open_dirty(el.span.id);
                    ledger.mark_children_dirty(el.span.id);
                }
            });
        });
        let printed = tree.print();
        assert!(printed.contains("<img src=\"a.png\">photo</img>"));
        assert!(!printed.contains("<img src=\"a.png\" />"));
    }

    #[test]
    fn renamed_elements_rewrite_both_tags() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, _, ledger| {
            traverse_elements_mut(file, |_, el| {
                if el.name.to_string() == "h1" {
                    el.name = JsxName::Ident {
                        name: "h2".to_string(),
                    };
                    ledger.mark_open_dirty(el.span.id);
                    ledger.mark_close_dirty(el.span.id);
                }
            });
        });
        let printed = tree.print();
        assert!(printed.contains("<h2>{title}</h2>"));
        assert!(!printed.contains("h1"));
    }

    #[test]
    fn removing_a_child_does_not_resurrect_its_text() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, _, ledger| {
            traverse_elements_mut(file, |ordinal, el| {
                if ordinal == 0 {
                    // drop the <img /> and the whitespace run before it
                    let img = el
                        .children
                        .iter()
                        .position(|c| {
                            matches!(c, JsxChild::Element(el) if el.name.to_string() == "img")
                        })
                        .unwrap();
                    el.children.remove(img);
                    if img > 0 {
                        if let JsxChild::Text(text) = &el.children[img - 1] {
                            if text.text.trim().is_empty() {
                                el.children.remove(img - 1);
                            }
                        }
                    }
                    ledger.mark_children_dirty(el.span.id);
                }
            });
        });
        let printed = tree.print();
        assert!(!printed.contains("img"));
        assert!(printed.contains("<h1>{title}</h1>\n    </div>"));
    }

    #[test]
    fn replacing_text_children_prints_the_new_text() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, _, ledger| {
            traverse_elements_mut(file, |_, el| {
                if el.name.to_string() == "h1" {
                    let child_id = el.children[0].span().id;
                    if let JsxChild::Expr(_) = &el.children[0] {
                        // replace the container with plain text
                        el.children[0] = JsxChild::Text(JsxText {
                            text: "Hello".to_string(),
                            span: Span::new(0, 0, child_id),
                        });
                    }
                    ledger.mark_children_dirty(el.span.id);
                }
            });
        });
        let printed = tree.print();
        assert!(printed.contains("<h1>Hello</h1>"));
    }

    #[test]
    fn synthetic_import_lands_on_its_own_line() {
        let mut tree = parse(SAMPLE).unwrap();
        tree.with_parts(|file, alloc, _| {
            file.items.insert(
                1,
                Item::Import(ImportDecl {
                    module: "./button".to_string(),
                    default: Some("Button".to_string()),
                    namespace: None,
                    named: Vec::new(),
                    span: alloc.synthetic_span(),
                }),
            );
        });
        let printed = tree.print();
        assert!(printed
            .contains("import React from \"react\";\nimport Button from \"./button\";\n"));
    }

    #[test]
    fn edited_styled_chunk_prints_the_new_text() {
        let src = "const Box = styled.div`\n  color: red;\n`;\nconst App = () => <Box />;\n";
        let mut tree = parse(src).unwrap();
        tree.with_parts(|file, _, ledger| {
            for item in &mut file.items {
                if let Item::Styled(styled) = item {
                    let chunk = &mut styled.template.chunks[0];
                    chunk.text = "\n  color: blue;\n".to_string();
                    ledger.mark_dirty(chunk.span.id);
                }
            }
        });
        let printed = tree.print();
        assert!(printed.contains("color: blue;"));
        assert!(!printed.contains("color: red;"));
        assert!(printed.contains("const App = () => <Box />;\n"));
    }

    #[test]
    fn canonical_serializer_produces_fresh_formatting() {
        let tree = parse("const App = () => (\n      <div   className=\"a\">\n   <b>x</b></div>\n);\n").unwrap();
        let canonical = tree.print_canonical();
        assert_eq!(
            canonical,
            "const App = () => (\n  <div className=\"a\">\n    <b>\n      x\n    </b>\n  </div>\n);\n"
        );
    }
}
