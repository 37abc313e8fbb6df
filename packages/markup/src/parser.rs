use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{preview, Tokenizer};
use easel_common::{NodeAllocator, NodeId, Span};
use std::ops::Range;

/// Parses one markup/script file into a [`MarkupTree`].
///
/// The grammar is a dialect, not full JavaScript: imports, function and
/// arrow-const declarations, styled tagged-template bindings and JSX are
/// modeled structurally; everything else is captured as raw statements and
/// printed back verbatim.
pub fn parse(source: &str) -> ParseResult<MarkupTree> {
    Parser::new(source).parse_file()
}

/// Parses a standalone element snippet, as used for insertion templates.
/// The snippet must be exactly one element; fragments and bare expressions
/// are rejected.
pub fn parse_snippet(source: &str) -> ParseResult<Element> {
    let mut parser = Parser::new(source);
    parser.tok.skip_trivia();
    let node = parser.parse_jsx_node()?;
    parser.tok.skip_trivia();
    if !parser.tok.at_end() {
        return Err(ParseError::invalid_syntax(
            parser.tok.pos(),
            "expected a single element",
        ));
    }
    match node {
        JsxChild::Element(element) => Ok(element),
        other => Err(ParseError::invalid_syntax(
            other.span().start,
            "expected an element",
        )),
    }
}

struct Parser<'src> {
    tok: Tokenizer<'src>,
    next_node: u32,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            tok: Tokenizer::new(source),
            next_node: 0,
        }
    }

    fn span(&mut self, range: Range<usize>) -> Span {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        Span::new(range.start, range.end, id)
    }

    fn text(&self, range: Range<usize>) -> String {
        self.tok.slice(range).to_string()
    }

    fn parse_file(mut self) -> ParseResult<MarkupTree> {
        let mut items = Vec::new();
        loop {
            self.tok.skip_trivia();
            if self.tok.at_end() {
                break;
            }
            items.push(self.parse_item()?);
        }
        let source = self.tok.source().to_string();
        let span = self.span(0..source.len());
        let file = SourceFile { items, span };
        Ok(MarkupTree::new(
            file,
            source,
            NodeAllocator::starting_at(self.next_node),
        ))
    }

    fn parse_item(&mut self) -> ParseResult<Item> {
        let start = self.tok.pos();

        if self.tok.peek_keyword("import") {
            return self.parse_import().map(Item::Import);
        }

        if self.tok.eat_keyword("export") {
            if self.tok.eat_keyword("default") {
                if self.tok.peek_keyword("function") {
                    return self
                        .parse_function(start, ExportKind::Default)
                        .map(Item::Function);
                }
                if let Some(item) = self.try_parse_arrow(start, ExportKind::Default, None)? {
                    return Ok(item);
                }
            } else if self.tok.peek_keyword("function") {
                return self
                    .parse_function(start, ExportKind::Named)
                    .map(Item::Function);
            } else if self.tok.peek_keyword("const") {
                if let Some(item) = self.try_parse_const(start, ExportKind::Named)? {
                    return Ok(item);
                }
            }
            // not a form we model; re-scan the whole statement as raw
            self.tok.set_pos(start);
        } else if self.tok.peek_keyword("function") {
            return self
                .parse_function(start, ExportKind::None)
                .map(Item::Function);
        } else if self.tok.peek_keyword("const") {
            if let Some(item) = self.try_parse_const(start, ExportKind::None)? {
                return Ok(item);
            }
        }

        self.parse_raw_item()
    }

    fn parse_raw_item(&mut self) -> ParseResult<Item> {
        self.tok.skip_trivia();
        let range = self.tok.scan_raw_statement()?;
        if range.is_empty() {
            return Err(ParseError::invalid_syntax(
                range.start,
                format!(
                    "unexpected `{}` at top level",
                    preview(self.tok.source(), range.start)
                ),
            ));
        }
        let text = self.text(range.clone());
        let span = self.span(range);
        Ok(Item::Raw(RawStatement { text, span }))
    }

    // --- imports ---

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        self.tok.skip_trivia();
        let start = self.tok.pos();
        self.tok.eat_keyword("import");

        // side-effect import: `import "./app.css";`
        if let Some(s) = self.tok.eat_string()? {
            let module = self.text(s.content);
            self.tok.eat_char(b';');
            let span = self.span(start..self.tok.pos());
            return Ok(ImportDecl {
                module,
                default: None,
                namespace: None,
                named: Vec::new(),
                span,
            });
        }

        let mut default = None;
        let mut namespace = None;
        let mut named = Vec::new();

        if self.tok.eat_char(b'*') {
            self.expect_keyword("as")?;
            namespace = Some(self.expect_ident()?);
        } else {
            if let Some(r) = self.tok.eat_ident() {
                default = Some(self.text(r));
                self.tok.eat_char(b',');
            }
            if self.tok.eat_char(b'{') {
                loop {
                    self.tok.skip_trivia();
                    if self.tok.eat_char(b'}') {
                        break;
                    }
                    let entry_start = self.tok.pos();
                    let imported = self.expect_ident()?;
                    let local = if self.tok.eat_keyword("as") {
                        Some(self.expect_ident()?)
                    } else {
                        None
                    };
                    let span = self.span(entry_start..self.tok.pos());
                    named.push(NamedImport {
                        imported,
                        local,
                        span,
                    });
                    self.tok.eat_char(b',');
                }
            }
        }

        self.expect_keyword("from")?;
        let module = match self.tok.eat_string()? {
            Some(s) => self.text(s.content),
            None => {
                return Err(ParseError::unexpected_token(
                    self.tok.pos(),
                    "module path string",
                    preview(self.tok.source(), self.tok.pos()),
                ))
            }
        };
        self.tok.eat_char(b';');
        let span = self.span(start..self.tok.pos());
        Ok(ImportDecl {
            module,
            default,
            namespace,
            named,
            span,
        })
    }

    // --- functions and styled bindings ---

    fn parse_function(&mut self, start: usize, export: ExportKind) -> ParseResult<FunctionDecl> {
        self.tok.eat_keyword("function");
        let name = self.tok.eat_ident().map(|r| self.text(r));
        self.expect_char(b'(')?;
        let params = self.tok.scan_delimited(b')')?;
        self.expect_char(b'{')?;
        let body_start = self.tok.pos() - 1;
        let statements = self.parse_statements()?;
        let body_span = self.span(body_start..self.tok.pos());
        let span = self.span(start..self.tok.pos());
        Ok(FunctionDecl {
            name,
            export,
            kind: FnKind::Declaration,
            params: self.text(params),
            body: FunctionBody::Block {
                statements,
                span: body_span,
            },
            span,
        })
    }

    /// `const Name = styled...` or `const Name = (...) => ...`; `None` when
    /// the statement is neither, with the cursor restored. A bare JSX
    /// initializer is parsed (so malformed markup still errors) but the
    /// statement is kept raw.
    fn try_parse_const(&mut self, start: usize, export: ExportKind) -> ParseResult<Option<Item>> {
        let save = self.tok.pos();
        self.tok.eat_keyword("const");
        let name = match self.tok.eat_ident() {
            Some(r) => self.text(r),
            None => {
                self.tok.set_pos(save);
                return Ok(None);
            }
        };
        if !self.tok.eat_char(b'=') {
            self.tok.set_pos(save);
            return Ok(None);
        }

        // `<` after `=` can only start JSX; commit to the JSX grammar
        // instead of letting the raw scanner swallow a broken tree
        if self.tok.peek_nontrivia() == Some(b'<') {
            self.parse_jsx_node()?;
            self.tok.eat_char(b';');
            let range = start..self.tok.pos();
            let text = self.text(range.clone());
            let span = self.span(range);
            return Ok(Some(Item::Raw(RawStatement { text, span })));
        }

        if self.tok.peek_keyword("styled") {
            let styled_save = self.tok.pos();
            self.tok.eat_keyword("styled");
            if self.tok.eat_char(b'.') {
                if let Some(tag) = self.tok.eat_ident() {
                    let target = StyledTarget::Tag {
                        name: self.text(tag),
                    };
                    return self.finish_styled(start, export, name, target).map(Some);
                }
                self.tok.set_pos(styled_save);
            } else if self.tok.eat_char(b'(') {
                let expr = self.tok.scan_delimited(b')')?;
                let text = self.text(expr.clone());
                let span = self.span(expr);
                let target = StyledTarget::Component {
                    expr: RawExpr { text, span },
                };
                return self.finish_styled(start, export, name, target).map(Some);
            } else {
                self.tok.set_pos(styled_save);
            }
        }

        if let Some(item) = self.try_parse_arrow(start, export, Some(name))? {
            return Ok(Some(item));
        }
        self.tok.set_pos(save);
        Ok(None)
    }

    fn finish_styled(
        &mut self,
        start: usize,
        export: ExportKind,
        name: String,
        target: StyledTarget,
    ) -> ParseResult<Item> {
        let template = self.parse_template()?;
        self.tok.eat_char(b';');
        let span = self.span(start..self.tok.pos());
        Ok(Item::Styled(StyledDecl {
            name,
            export,
            target,
            template,
            span,
        }))
    }

    fn parse_template(&mut self) -> ParseResult<TemplateLiteral> {
        let token = self.tok.scan_template()?;
        let chunks = token
            .chunks
            .into_iter()
            .map(|r| {
                let text = self.text(r.clone());
                let span = self.span(r);
                TemplateChunk { text, span }
            })
            .collect();
        let exprs = token
            .exprs
            .into_iter()
            .map(|r| {
                let text = self.text(r.clone());
                let span = self.span(r);
                RawExpr { text, span }
            })
            .collect();
        let span = self.span(token.full);
        Ok(TemplateLiteral {
            chunks,
            exprs,
            span,
        })
    }

    /// Arrow function after the `=` (or after `export default`). `None`
    /// restores the cursor.
    fn try_parse_arrow(
        &mut self,
        start: usize,
        export: ExportKind,
        name: Option<String>,
    ) -> ParseResult<Option<Item>> {
        let save = self.tok.pos();
        let params = if self.tok.eat_char(b'(') {
            match self.tok.scan_delimited(b')') {
                Ok(r) => self.text(r),
                Err(_) => {
                    self.tok.set_pos(save);
                    return Ok(None);
                }
            }
        } else if let Some(r) = self.tok.eat_ident() {
            self.text(r)
        } else {
            self.tok.set_pos(save);
            return Ok(None);
        };
        if !self.tok.eat_str("=>") {
            self.tok.set_pos(save);
            return Ok(None);
        }

        let body = if self.tok.eat_char(b'{') {
            let body_start = self.tok.pos() - 1;
            let statements = self.parse_statements()?;
            let span = self.span(body_start..self.tok.pos());
            FunctionBody::Block { statements, span }
        } else {
            self.tok.skip_trivia();
            let value_start = self.tok.pos();
            let (value, _) = self.parse_wrapped_value()?;
            let span = self.span(value_start..self.tok.pos());
            FunctionBody::Expr { value, span }
        };
        self.tok.eat_char(b';');
        let span = self.span(start..self.tok.pos());
        Ok(Some(Item::Function(FunctionDecl {
            name,
            export,
            kind: FnKind::Arrow,
            params,
            body,
            span,
        })))
    }

    // --- statements ---

    /// Body statements up to and including the closing `}`.
    fn parse_statements(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            self.tok.skip_trivia();
            if self.tok.eat_char(b'}') {
                return Ok(statements);
            }
            if self.tok.at_end() {
                return Err(ParseError::unexpected_eof(self.tok.pos()));
            }
            if self.tok.peek_keyword("return") {
                statements.push(Stmt::Return(self.parse_return()?));
            } else {
                let range = self.tok.scan_raw_statement()?;
                if range.is_empty() {
                    return Err(ParseError::invalid_syntax(
                        range.start,
                        format!(
                            "unexpected `{}` in block",
                            preview(self.tok.source(), range.start)
                        ),
                    ));
                }
                let text = self.text(range.clone());
                let span = self.span(range);
                statements.push(Stmt::Raw(RawStatement { text, span }));
            }
        }
    }

    fn parse_return(&mut self) -> ParseResult<ReturnStmt> {
        self.tok.skip_trivia();
        let start = self.tok.pos();
        self.tok.eat_keyword("return");

        let (value, parenthesized) = match self.tok.peek_nontrivia() {
            Some(b';') | Some(b'}') | None => (None, false),
            _ => {
                let (value, parenthesized) = self.parse_wrapped_value()?;
                (Some(value), parenthesized)
            }
        };
        self.tok.eat_char(b';');
        let span = self.span(start..self.tok.pos());
        Ok(ReturnStmt {
            value,
            parenthesized,
            span,
        })
    }

    /// Value after `return` or `=>`, unwrapping one layer of parens around
    /// JSX. Non-JSX parenthesized expressions stay raw, parens included.
    fn parse_wrapped_value(&mut self) -> ParseResult<(ReturnValue, bool)> {
        if self.tok.peek_nontrivia() == Some(b'(') {
            let save = self.tok.pos();
            self.tok.eat_char(b'(');
            if self.tok.peek_nontrivia() == Some(b'<') {
                let value = self.parse_return_value()?;
                self.expect_char(b')')?;
                return Ok((value, true));
            }
            self.tok.set_pos(save);
        }
        Ok((self.parse_return_value()?, false))
    }

    fn parse_return_value(&mut self) -> ParseResult<ReturnValue> {
        if self.tok.peek_nontrivia() == Some(b'<') {
            return match self.parse_jsx_node()? {
                JsxChild::Element(el) => Ok(ReturnValue::Element(el)),
                JsxChild::Fragment(frag) => Ok(ReturnValue::Fragment(frag)),
                // parse_jsx_node at `<` only yields elements or fragments
                _ => unreachable!("jsx node"),
            };
        }
        self.tok.skip_trivia();
        let range = self.tok.scan_until(&[b';'], false, true)?;
        let text = self.text(range.clone());
        let span = self.span(range);
        Ok(ReturnValue::Raw(RawExpr { text, span }))
    }

    // --- JSX ---

    /// One element or fragment; the cursor must be at `<`.
    fn parse_jsx_node(&mut self) -> ParseResult<JsxChild> {
        self.tok.skip_trivia();
        let start = self.tok.pos();
        self.expect_char(b'<')?;

        if self.tok.eat_char(b'>') {
            let open_end = self.tok.pos();
            let (children, close_start) = self.parse_children()?;
            self.expect_str("</")?;
            self.expect_char(b'>')?;
            let span = self.span(start..self.tok.pos());
            return Ok(JsxChild::Fragment(Fragment {
                children,
                span,
                open_end,
                close_start,
            }));
        }

        let name = self.parse_jsx_name()?;
        let mut attributes = Vec::new();
        loop {
            self.tok.skip_trivia();
            match self.tok.peek_raw() {
                Some(b'/') => {
                    self.expect_str("/>")?;
                    let end = self.tok.pos();
                    let span = self.span(start..end);
                    return Ok(JsxChild::Element(Element {
                        name,
                        attributes,
                        self_closing: true,
                        children: Vec::new(),
                        span,
                        open_end: end,
                        close_start: end,
                    }));
                }
                Some(b'>') => {
                    self.tok.eat_char(b'>');
                    let open_end = self.tok.pos();
                    let (children, close_start) = self.parse_children()?;
                    self.expect_str("</")?;
                    let close_name = self.parse_jsx_name()?;
                    self.expect_char(b'>')?;
                    if close_name != name {
                        return Err(ParseError::invalid_syntax(
                            close_start,
                            format!("mismatched closing tag: expected </{}>", name),
                        ));
                    }
                    let span = self.span(start..self.tok.pos());
                    return Ok(JsxChild::Element(Element {
                        name,
                        attributes,
                        self_closing: false,
                        children,
                        span,
                        open_end,
                        close_start,
                    }));
                }
                None => return Err(ParseError::unexpected_eof(self.tok.pos())),
                _ => attributes.push(self.parse_attribute()?),
            }
        }
    }

    fn parse_jsx_name(&mut self) -> ParseResult<JsxName> {
        let first = match self.tok.eat_jsx_ident() {
            Some(r) => self.text(r),
            None => {
                return Err(ParseError::unexpected_token(
                    self.tok.pos(),
                    "element name",
                    preview(self.tok.source(), self.tok.pos()),
                ))
            }
        };
        if !self.tok.eat_char(b'.') {
            return Ok(JsxName::Ident { name: first });
        }
        let mut object = first;
        loop {
            let part = match self.tok.eat_jsx_ident() {
                Some(r) => self.text(r),
                None => {
                    return Err(ParseError::unexpected_token(
                        self.tok.pos(),
                        "member name",
                        preview(self.tok.source(), self.tok.pos()),
                    ))
                }
            };
            if self.tok.eat_char(b'.') {
                object.push('.');
                object.push_str(&part);
            } else {
                return Ok(JsxName::Member {
                    object,
                    property: part,
                });
            }
        }
    }

    fn parse_attribute(&mut self) -> ParseResult<Attribute> {
        self.tok.skip_trivia();
        let start = self.tok.pos();
        let name = match self.tok.eat_jsx_ident() {
            Some(r) => self.text(r),
            None => {
                return Err(ParseError::unexpected_token(
                    start,
                    "attribute name",
                    preview(self.tok.source(), start),
                ))
            }
        };
        let value = if self.tok.eat_char(b'=') {
            if let Some(s) = self.tok.eat_string()? {
                let value = self.text(s.content);
                let span = self.span(s.full);
                Some(AttrValue::String(StringLit { value, span }))
            } else if self.tok.peek_nontrivia() == Some(b'{') {
                Some(AttrValue::Container(self.parse_expr_container()?))
            } else {
                return Err(ParseError::unexpected_token(
                    self.tok.pos(),
                    "attribute value",
                    preview(self.tok.source(), self.tok.pos()),
                ));
            }
        } else {
            None
        };
        let span = self.span(start..self.tok.pos());
        Ok(Attribute { name, value, span })
    }

    fn parse_expr_container(&mut self) -> ParseResult<ExprContainer> {
        self.tok.skip_trivia();
        let start = self.tok.pos();
        self.expect_char(b'{')?;
        let expr = if self.tok.peek_nontrivia() == Some(b'{') {
            let save = self.tok.pos();
            match self.parse_object_lit() {
                Ok(obj) => Expr::Object(obj),
                Err(_) => {
                    // shorthand/spread/computed keys: keep the whole thing raw
                    self.tok.set_pos(save);
                    self.parse_raw_braced()?
                }
            }
        } else {
            self.parse_raw_braced()?
        };
        self.expect_char(b'}')?;
        let span = self.span(start..self.tok.pos());
        Ok(ExprContainer { expr, span })
    }

    /// Raw expression up to the container's closing brace (not consumed).
    fn parse_raw_braced(&mut self) -> ParseResult<Expr> {
        self.tok.skip_trivia();
        let range = self.tok.scan_until(&[], false, false)?;
        let text = self.text(range.clone());
        let span = self.span(range);
        Ok(Expr::Raw(RawExpr { text, span }))
    }

    fn parse_object_lit(&mut self) -> ParseResult<ObjectLit> {
        self.tok.skip_trivia();
        let start = self.tok.pos();
        self.expect_char(b'{')?;
        let mut properties = Vec::new();
        loop {
            self.tok.skip_trivia();
            if self.tok.eat_char(b'}') {
                break;
            }
            if self.tok.at_end() {
                return Err(ParseError::unexpected_eof(self.tok.pos()));
            }
            let prop_start = self.tok.pos();
            let key = if let Some(s) = self.tok.eat_string()? {
                self.text(s.content)
            } else if let Some(r) = self.tok.eat_ident() {
                self.text(r)
            } else {
                return Err(ParseError::unexpected_token(
                    prop_start,
                    "property name",
                    preview(self.tok.source(), prop_start),
                ));
            };
            self.expect_char(b':')?;
            let value = self.parse_prop_value()?;
            let span = self.span(prop_start..self.tok.pos());
            properties.push(ObjectProp { key, value, span });
            self.tok.eat_char(b',');
        }
        let span = self.span(start..self.tok.pos());
        Ok(ObjectLit { properties, span })
    }

    fn parse_prop_value(&mut self) -> ParseResult<PropValue> {
        if let Some(s) = self.tok.eat_string()? {
            let value = self.text(s.content);
            let span = self.span(s.full);
            return Ok(PropValue::String(StringLit { value, span }));
        }
        if let Some(r) = self.tok.eat_number() {
            let raw = self.text(r.clone());
            let span = self.span(r);
            return Ok(PropValue::Number(NumberLit { raw, span }));
        }
        for (kw, value) in [("true", true), ("false", false)] {
            if self.tok.peek_keyword(kw) {
                let start = self.tok.pos();
                self.tok.eat_keyword(kw);
                let span = self.span(start..self.tok.pos());
                return Ok(PropValue::Bool { value, span });
            }
        }
        self.tok.skip_trivia();
        let range = self.tok.scan_until(&[b',', b'}'], false, false)?;
        let trimmed = self.tok.slice(range.clone()).trim_end().len();
        let range = range.start..range.start + trimmed;
        let text = self.text(range.clone());
        let span = self.span(range);
        Ok(PropValue::Raw(RawExpr { text, span }))
    }

    /// Children until a closing tag comes up; returns them with the offset
    /// of its `<`.
    fn parse_children(&mut self) -> ParseResult<(Vec<JsxChild>, usize)> {
        let mut children = Vec::new();
        loop {
            let text_range = self.tok.scan_jsx_text();
            if !text_range.is_empty() {
                let text = self.text(text_range.clone());
                let span = self.span(text_range);
                children.push(JsxChild::Text(JsxText { text, span }));
            }
            match self.tok.peek_raw() {
                None => return Err(ParseError::unexpected_eof(self.tok.pos())),
                Some(b'{') => children.push(JsxChild::Expr(self.parse_expr_container()?)),
                Some(_) => {
                    if self.tok.starts_with("</") {
                        return Ok((children, self.tok.pos()));
                    }
                    children.push(self.parse_jsx_node()?);
                }
            }
        }
    }

    // --- expectation helpers ---

    fn expect_char(&mut self, c: u8) -> ParseResult<()> {
        if self.tok.eat_char(c) {
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.tok.pos(),
                char::from(c),
                preview(self.tok.source(), self.tok.pos()),
            ))
        }
    }

    fn expect_str(&mut self, s: &str) -> ParseResult<()> {
        if self.tok.eat_str(s) {
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.tok.pos(),
                s,
                preview(self.tok.source(), self.tok.pos()),
            ))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> ParseResult<()> {
        if self.tok.eat_keyword(kw) {
            Ok(())
        } else {
            Err(ParseError::unexpected_token(
                self.tok.pos(),
                kw,
                preview(self.tok.source(), self.tok.pos()),
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.tok.eat_ident() {
            Some(r) => Ok(self.text(r)),
            None => Err(ParseError::unexpected_token(
                self.tok.pos(),
                "identifier",
                preview(self.tok.source(), self.tok.pos()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(tree: &MarkupTree) -> &Element {
        for item in &tree.file.items {
            if let Item::Function(func) = item {
                if let FunctionBody::Block { statements, .. } = &func.body {
                    for stmt in statements {
                        if let Stmt::Return(ret) = stmt {
                            if let Some(ReturnValue::Element(el)) = &ret.value {
                                return el;
                            }
                        }
                    }
                }
            }
        }
        panic!("Expected a returned element");
    }

    #[test]
    fn parses_import_forms() {
        let tree = parse(
            "import React from \"react\";\n\
             import { useState, useMemo as memo } from \"react\";\n\
             import * as path from \"path\";\n\
             import \"./app.css\";\n",
        )
        .unwrap();
        assert_eq!(tree.file.items.len(), 4);
        let Item::Import(first) = &tree.file.items[0] else {
            panic!("Expected an import");
        };
        assert_eq!(first.default.as_deref(), Some("React"));
        let Item::Import(second) = &tree.file.items[1] else {
            panic!("Expected an import");
        };
        assert_eq!(second.named.len(), 2);
        assert_eq!(second.named[1].local_name(), "memo");
        let Item::Import(third) = &tree.file.items[2] else {
            panic!("Expected an import");
        };
        assert_eq!(third.namespace.as_deref(), Some("path"));
        let Item::Import(fourth) = &tree.file.items[3] else {
            panic!("Expected an import");
        };
        assert_eq!(fourth.module, "./app.css");
        assert!(fourth.default.is_none() && fourth.named.is_empty());
    }

    #[test]
    fn parses_function_component_with_jsx() {
        let src = "export default function App() {\n  return (\n    <div id=\"root\">\n      <span>hi</span>\n    </div>\n  );\n}\n";
        let tree = parse(src).unwrap();
        let el = first_element(&tree);
        assert_eq!(el.name.to_string(), "div");
        assert_eq!(el.string_attribute("id"), Some("root"));
        let inner = el
            .children
            .iter()
            .find_map(|c| match c {
                JsxChild::Element(el) => Some(el),
                _ => None,
            })
            .unwrap();
        assert_eq!(inner.name.to_string(), "span");
        assert!(!inner.self_closing);
    }

    #[test]
    fn parses_arrow_component_with_expression_body() {
        let tree = parse("const App = () => <div className=\"a\" />;\n").unwrap();
        let Item::Function(func) = &tree.file.items[0] else {
            panic!("Expected a function");
        };
        assert_eq!(func.kind, FnKind::Arrow);
        let FunctionBody::Expr { value, .. } = &func.body else {
            panic!("Expected an expression body");
        };
        let ReturnValue::Element(el) = value else {
            panic!("Expected an element");
        };
        assert!(el.self_closing);
    }

    #[test]
    fn parses_styled_bindings() {
        let src = "const Box = styled.div`\n  color: red;\n`;\nconst Big = styled(Box)`\n  width: ${size}px;\n`;\n";
        let tree = parse(src).unwrap();
        let Item::Styled(first) = &tree.file.items[0] else {
            panic!("Expected a styled binding");
        };
        assert_eq!(first.name, "Box");
        assert!(matches!(&first.target, StyledTarget::Tag { name } if name == "div"));
        assert_eq!(first.template.chunks.len(), 1);
        let Item::Styled(second) = &tree.file.items[1] else {
            panic!("Expected a styled binding");
        };
        assert!(matches!(&second.target, StyledTarget::Component { expr } if expr.text == "Box"));
        assert_eq!(second.template.chunks.len(), 2);
        assert_eq!(second.template.exprs[0].text, "size");
    }

    #[test]
    fn parses_object_style_attribute() {
        let src = "const App = () => <div style={{ display: \"block\", opacity: 0.5, zIndex: 2 }} />;\n";
        let tree = parse(src).unwrap();
        let Item::Function(func) = &tree.file.items[0] else {
            panic!("Expected a function");
        };
        let FunctionBody::Expr {
            value: ReturnValue::Element(el),
            ..
        } = &func.body
        else {
            panic!("Expected an element body");
        };
        let Some(AttrValue::Container(container)) = &el.attribute("style").unwrap().value else {
            panic!("Expected a container value");
        };
        let Expr::Object(obj) = &container.expr else {
            panic!("Expected an object literal");
        };
        assert_eq!(obj.properties.len(), 3);
        assert!(matches!(
            &obj.property("display").unwrap().value,
            PropValue::String(lit) if lit.value == "block"
        ));
        assert!(matches!(
            &obj.property("opacity").unwrap().value,
            PropValue::Number(num) if num.raw == "0.5"
        ));
    }

    #[test]
    fn object_with_spread_falls_back_to_raw() {
        let src = "const App = () => <div style={{ ...base, color: \"red\" }} />;\n";
        let tree = parse(src).unwrap();
        let Item::Function(func) = &tree.file.items[0] else {
            panic!("Expected a function");
        };
        let FunctionBody::Expr {
            value: ReturnValue::Element(el),
            ..
        } = &func.body
        else {
            panic!("Expected an element body");
        };
        let Some(AttrValue::Container(container)) = &el.attribute("style").unwrap().value else {
            panic!("Expected a container value");
        };
        assert!(matches!(&container.expr, Expr::Raw(_)));
    }

    #[test]
    fn parses_fragments_and_member_names() {
        let src = "const App = () => (\n  <>\n    <React.Fragment>\n      <b>x</b>\n    </React.Fragment>\n  </>\n);\n";
        let tree = parse(src).unwrap();
        let Item::Function(func) = &tree.file.items[0] else {
            panic!("Expected a function");
        };
        let FunctionBody::Expr {
            value: ReturnValue::Fragment(frag),
            ..
        } = &func.body
        else {
            panic!("Expected a fragment body");
        };
        let inner = frag
            .children
            .iter()
            .find_map(|c| match c {
                JsxChild::Element(el) => Some(el),
                _ => None,
            })
            .unwrap();
        assert!(inner.name.is_fragment());
    }

    #[test]
    fn keeps_unmodeled_statements_raw() {
        let src = "class Store {}\nlet counter = 0;\nconst App = () => <div />;\n";
        let tree = parse(src).unwrap();
        assert!(matches!(&tree.file.items[0], Item::Raw(_)));
        assert!(matches!(&tree.file.items[1], Item::Raw(_)));
        assert!(matches!(&tree.file.items[2], Item::Function(_)));
    }

    #[test]
    fn jsx_text_spans_cover_the_gap_between_tags() {
        let src = "const App = () => <p>  hello  {name}  </p>;\n";
        let tree = parse(src).unwrap();
        let Item::Function(func) = &tree.file.items[0] else {
            panic!("Expected a function");
        };
        let FunctionBody::Expr {
            value: ReturnValue::Element(el),
            ..
        } = &func.body
        else {
            panic!("Expected an element body");
        };
        let JsxChild::Text(text) = &el.children[0] else {
            panic!("Expected leading text");
        };
        assert_eq!(text.text, "  hello  ");
        assert!(matches!(&el.children[1], JsxChild::Expr(_)));
        let JsxChild::Text(trailing) = &el.children[2] else {
            panic!("Expected trailing text");
        };
        assert_eq!(trailing.text, "  ");
    }

    #[test]
    fn rejects_mismatched_closing_tags() {
        let err = parse("const App = () => <div></span>;\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn rejects_unterminated_jsx() {
        let err = parse("const App = () => <div>;\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn jsx_const_initializers_commit_to_the_jsx_parse() {
        let err = parse("const App = <div").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));

        let tree = parse("const App = <div id=\"a\">x</div>;\n").unwrap();
        let Item::Raw(raw) = &tree.file.items[0] else {
            panic!("Expected a raw statement");
        };
        assert_eq!(raw.text, "const App = <div id=\"a\">x</div>;");
    }

    #[test]
    fn reparsing_identical_text_yields_identical_trees() {
        let src = "import React from \"react\";\nconst App = () => (\n  <div>\n    <span>a</span>\n  </div>\n);\n";
        let a = parse(src).unwrap();
        let b = parse(src).unwrap();
        assert_eq!(a.file, b.file);
    }

    #[test]
    fn snippets_parse_to_a_single_element() {
        let el = parse_snippet("<Button size=\"large\" />").unwrap();
        assert_eq!(el.name.to_string(), "Button");
        assert!(el.self_closing);
        assert_eq!(el.string_attribute("size"), Some("large"));

        assert!(parse_snippet("<></>").is_err());
        assert!(parse_snippet("<a /> <b />").is_err());
    }
}
