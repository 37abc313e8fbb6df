use crate::ast::*;

/// Visitor pattern for traversing AST nodes immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_file(&mut self, file: &SourceFile) {
        walk_file(self, file);
    }

    fn visit_import(&mut self, _import: &ImportDecl) {
        // Leaf node, no children to walk
    }

    fn visit_function(&mut self, func: &FunctionDecl) {
        walk_function(self, func);
    }

    fn visit_styled(&mut self, _styled: &StyledDecl) {
        // Template chunks and interpolations are opaque text
    }

    fn visit_raw_statement(&mut self, _raw: &RawStatement) {
        // Leaf node, no children to walk
    }

    fn visit_return(&mut self, ret: &ReturnStmt) {
        walk_return(self, ret);
    }

    fn visit_element(&mut self, element: &Element) {
        walk_element(self, element);
    }

    fn visit_fragment(&mut self, fragment: &Fragment) {
        walk_fragment(self, fragment);
    }

    fn visit_text(&mut self, _text: &JsxText) {
        // Leaf node, no children to walk
    }

    fn visit_expr_container(&mut self, _container: &ExprContainer) {
        // Contained expressions hold no further elements
    }
}

/// Mutable visitor pattern for transforming AST nodes
///
/// Similar to Visitor, but provides mutable access to nodes.
/// Use this when you need to modify the AST during traversal.
pub trait VisitorMut: Sized {
    fn visit_file_mut(&mut self, file: &mut SourceFile) {
        walk_file_mut(self, file);
    }

    fn visit_import_mut(&mut self, _import: &mut ImportDecl) {
        // Leaf node, no children to walk
    }

    fn visit_function_mut(&mut self, func: &mut FunctionDecl) {
        walk_function_mut(self, func);
    }

    fn visit_styled_mut(&mut self, _styled: &mut StyledDecl) {
        // Template chunks and interpolations are opaque text
    }

    fn visit_raw_statement_mut(&mut self, _raw: &mut RawStatement) {
        // Leaf node, no children to walk
    }

    fn visit_return_mut(&mut self, ret: &mut ReturnStmt) {
        walk_return_mut(self, ret);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);
    }

    fn visit_fragment_mut(&mut self, fragment: &mut Fragment) {
        walk_fragment_mut(self, fragment);
    }

    fn visit_text_mut(&mut self, _text: &mut JsxText) {
        // Leaf node, no children to walk
    }

    fn visit_expr_container_mut(&mut self, _container: &mut ExprContainer) {
        // Contained expressions hold no further elements
    }
}

// Default walk implementations for immutable visitor

pub fn walk_file<V: Visitor>(visitor: &mut V, file: &SourceFile) {
    for item in &file.items {
        match item {
            Item::Import(import) => visitor.visit_import(import),
            Item::Function(func) => visitor.visit_function(func),
            Item::Styled(styled) => visitor.visit_styled(styled),
            Item::Raw(raw) => visitor.visit_raw_statement(raw),
        }
    }
}

pub fn walk_function<V: Visitor>(visitor: &mut V, func: &FunctionDecl) {
    match &func.body {
        FunctionBody::Block { statements, .. } => {
            for stmt in statements {
                match stmt {
                    Stmt::Return(ret) => visitor.visit_return(ret),
                    Stmt::Raw(raw) => visitor.visit_raw_statement(raw),
                }
            }
        }
        FunctionBody::Expr { value, .. } => walk_return_value(visitor, value),
    }
}

pub fn walk_return<V: Visitor>(visitor: &mut V, ret: &ReturnStmt) {
    if let Some(value) = &ret.value {
        walk_return_value(visitor, value);
    }
}

fn walk_return_value<V: Visitor>(visitor: &mut V, value: &ReturnValue) {
    match value {
        ReturnValue::Element(el) => visitor.visit_element(el),
        ReturnValue::Fragment(frag) => visitor.visit_fragment(frag),
        ReturnValue::Raw(_) => {}
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element) {
    for attr in &element.attributes {
        if let Some(AttrValue::Container(container)) = &attr.value {
            visitor.visit_expr_container(container);
        }
    }
    walk_children(visitor, &element.children);
}

pub fn walk_fragment<V: Visitor>(visitor: &mut V, fragment: &Fragment) {
    walk_children(visitor, &fragment.children);
}

fn walk_children<V: Visitor>(visitor: &mut V, children: &[JsxChild]) {
    for child in children {
        match child {
            JsxChild::Element(el) => visitor.visit_element(el),
            JsxChild::Fragment(frag) => visitor.visit_fragment(frag),
            JsxChild::Text(text) => visitor.visit_text(text),
            JsxChild::Expr(container) => visitor.visit_expr_container(container),
        }
    }
}

// Default walk implementations for mutable visitor

pub fn walk_file_mut<V: VisitorMut>(visitor: &mut V, file: &mut SourceFile) {
    for item in &mut file.items {
        match item {
            Item::Import(import) => visitor.visit_import_mut(import),
            Item::Function(func) => visitor.visit_function_mut(func),
            Item::Styled(styled) => visitor.visit_styled_mut(styled),
            Item::Raw(raw) => visitor.visit_raw_statement_mut(raw),
        }
    }
}

pub fn walk_function_mut<V: VisitorMut>(visitor: &mut V, func: &mut FunctionDecl) {
    match &mut func.body {
        FunctionBody::Block { statements, .. } => {
            for stmt in statements {
                match stmt {
                    Stmt::Return(ret) => visitor.visit_return_mut(ret),
                    Stmt::Raw(raw) => visitor.visit_raw_statement_mut(raw),
                }
            }
        }
        FunctionBody::Expr { value, .. } => walk_return_value_mut(visitor, value),
    }
}

pub fn walk_return_mut<V: VisitorMut>(visitor: &mut V, ret: &mut ReturnStmt) {
    if let Some(value) = &mut ret.value {
        walk_return_value_mut(visitor, value);
    }
}

fn walk_return_value_mut<V: VisitorMut>(visitor: &mut V, value: &mut ReturnValue) {
    match value {
        ReturnValue::Element(el) => visitor.visit_element_mut(el),
        ReturnValue::Fragment(frag) => visitor.visit_fragment_mut(frag),
        ReturnValue::Raw(_) => {}
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Element) {
    for attr in &mut element.attributes {
        if let Some(AttrValue::Container(container)) = &mut attr.value {
            visitor.visit_expr_container_mut(container);
        }
    }
    walk_children_mut(visitor, &mut element.children);
}

pub fn walk_fragment_mut<V: VisitorMut>(visitor: &mut V, fragment: &mut Fragment) {
    walk_children_mut(visitor, &mut fragment.children);
}

fn walk_children_mut<V: VisitorMut>(visitor: &mut V, children: &mut [JsxChild]) {
    for child in children {
        match child {
            JsxChild::Element(el) => visitor.visit_element_mut(el),
            JsxChild::Fragment(frag) => visitor.visit_fragment_mut(frag),
            JsxChild::Text(text) => visitor.visit_text_mut(text),
            JsxChild::Expr(container) => visitor.visit_expr_container_mut(container),
        }
    }
}

// Ordinal traversals used by marker assignment and lookup. Ordinals are
// assigned depth-first in source order; fragments are descended through but
// never consume one.

/// Calls `f` with each element and its document-order ordinal.
pub fn traverse_elements<F>(file: &SourceFile, f: F)
where
    F: FnMut(usize, &Element),
{
    struct Each<F> {
        ordinal: usize,
        f: F,
    }
    impl<F: FnMut(usize, &Element)> Visitor for Each<F> {
        fn visit_element(&mut self, element: &Element) {
            (self.f)(self.ordinal, element);
            self.ordinal += 1;
            walk_element(self, element);
        }
    }
    Each { ordinal: 0, f }.visit_file(file);
}

/// Mutable twin of [`traverse_elements`].
pub fn traverse_elements_mut<F>(file: &mut SourceFile, f: F)
where
    F: FnMut(usize, &mut Element),
{
    struct Each<F> {
        ordinal: usize,
        f: F,
    }
    impl<F: FnMut(usize, &mut Element)> VisitorMut for Each<F> {
        fn visit_element_mut(&mut self, element: &mut Element) {
            (self.f)(self.ordinal, element);
            self.ordinal += 1;
            walk_element_mut(self, element);
        }
    }
    Each { ordinal: 0, f }.visit_file_mut(file);
}

/// Calls `f` with each top-level styled binding and its ordinal.
pub fn traverse_styled<F>(file: &SourceFile, mut f: F)
where
    F: FnMut(usize, &StyledDecl),
{
    let mut ordinal = 0;
    for item in &file.items {
        if let Item::Styled(styled) = item {
            f(ordinal, styled);
            ordinal += 1;
        }
    }
}

/// Mutable twin of [`traverse_styled`].
pub fn traverse_styled_mut<F>(file: &mut SourceFile, mut f: F)
where
    F: FnMut(usize, &mut StyledDecl),
{
    let mut ordinal = 0;
    for item in &mut file.items {
        if let Item::Styled(styled) = item {
            f(ordinal, styled);
            ordinal += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn elements_are_visited_depth_first_in_source_order() {
        let src = "const App = () => (\n  <main>\n    <nav>\n      <a href=\"/\">home</a>\n    </nav>\n    <section />\n  </main>\n);\n";
        let tree = parse(src).unwrap();
        let mut seen = Vec::new();
        traverse_elements(&tree.file, |ordinal, el| {
            seen.push((ordinal, el.name.to_string()));
        });
        assert_eq!(
            seen,
            vec![
                (0, "main".to_string()),
                (1, "nav".to_string()),
                (2, "a".to_string()),
                (3, "section".to_string()),
            ]
        );
    }

    #[test]
    fn fragments_do_not_consume_ordinals() {
        let src = "const App = () => (\n  <>\n    <div />\n    <span />\n  </>\n);\n";
        let tree = parse(src).unwrap();
        let mut seen = Vec::new();
        traverse_elements(&tree.file, |ordinal, el| {
            seen.push((ordinal, el.name.to_string()));
        });
        assert_eq!(
            seen,
            vec![(0, "div".to_string()), (1, "span".to_string())]
        );
    }

    #[test]
    fn styled_bindings_are_counted_in_declaration_order() {
        let src = "const A = styled.div`color: red;`;\nconst App = () => <A />;\nconst B = styled.span`color: blue;`;\n";
        let tree = parse(src).unwrap();
        let mut seen = Vec::new();
        traverse_styled(&tree.file, |ordinal, styled| {
            seen.push((ordinal, styled.name.clone()));
        });
        assert_eq!(seen, vec![(0, "A".to_string()), (1, "B".to_string())]);
    }

    #[test]
    fn mutable_traversal_can_rewrite_attributes() {
        let src = "const App = () => <div id=\"a\"><span id=\"b\" /></div>;\n";
        let mut tree = parse(src).unwrap();
        let mut count = 0;
        traverse_elements_mut(&mut tree.file, |_, el| {
            if let Some(attr) = el.attribute_mut("id") {
                attr.name = "data-id".to_string();
                count += 1;
            }
        });
        assert_eq!(count, 2);
        let mut names = Vec::new();
        traverse_elements(&tree.file, |_, el| {
            names.push(el.attributes[0].name.clone());
        });
        assert_eq!(names, vec!["data-id".to_string(), "data-id".to_string()]);
    }
}
