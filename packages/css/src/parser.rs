use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use easel_common::{NodeAllocator, NodeId, Span};
use std::ops::Range;

/// Parses stylesheet text. The grammar is deliberately forgiving: anything
/// at item position that is not a rule or at-rule is kept as a raw item and
/// printed back verbatim.
pub fn parse(source: &str, flavor: Flavor) -> ParseResult<StyleTree> {
    CssParser::new(source, flavor).parse_sheet()
}

struct CssParser<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    flavor: Flavor,
    next_node: u32,
}

impl<'src> CssParser<'src> {
    fn new(source: &'src str, flavor: Flavor) -> Self {
        Self {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            flavor,
            next_node: 0,
        }
    }

    fn span(&mut self, range: Range<usize>) -> Span {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        Span::new(range.start, range.end, id)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Skips whitespace, `/* */` and `//` comments.
    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos + 1 < self.bytes.len() && self.bytes[self.pos] == b'/' {
                match self.bytes[self.pos + 1] {
                    b'/' => {
                        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                            self.pos += 1;
                        }
                        continue;
                    }
                    b'*' => {
                        let close = self.src[self.pos + 2..].find("*/");
                        self.pos = match close {
                            Some(i) => self.pos + 2 + i + 2,
                            None => self.bytes.len(),
                        };
                        continue;
                    }
                    _ => {}
                }
            }
            break;
        }
    }

    /// Offset of the next unnested stop byte, honoring strings, block
    /// comments and paren/bracket nesting. Returns `src.len()` at EOF.
    fn scan_stop(&mut self, stops: &[u8], stop_at_newline: bool) -> usize {
        let mut pos = self.pos;
        let mut depth = 0usize;
        while pos < self.bytes.len() {
            let b = self.bytes[pos];
            match b {
                b'"' | b'\'' => {
                    let quote = b;
                    pos += 1;
                    while pos < self.bytes.len() {
                        match self.bytes[pos] {
                            b'\\' => pos += 2,
                            c if c == quote => {
                                pos += 1;
                                break;
                            }
                            _ => pos += 1,
                        }
                    }
                    continue;
                }
                b'/' if pos + 1 < self.bytes.len() && self.bytes[pos + 1] == b'*' => {
                    pos = match self.src[pos + 2..].find("*/") {
                        Some(i) => pos + 2 + i + 2,
                        None => self.bytes.len(),
                    };
                    continue;
                }
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth = depth.saturating_sub(1),
                b'\n' if stop_at_newline && depth == 0 => return pos,
                _ if depth == 0 && stops.contains(&b) => return pos,
                _ => {}
            }
            pos += 1;
        }
        pos
    }

    fn parse_sheet(mut self) -> ParseResult<StyleTree> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_end() {
                break;
            }
            if let Some(item) = self.parse_item()? {
                items.push(item);
            }
        }
        let source = self.src.to_string();
        let span = self.span(0..source.len());
        let sheet = Stylesheet { items, span };
        Ok(StyleTree::new(
            sheet,
            source,
            self.flavor,
            NodeAllocator::starting_at(self.next_node),
        ))
    }

    fn parse_item(&mut self) -> ParseResult<Option<CssItem>> {
        if self.peek() == Some(b'@') {
            return self.parse_at_rule().map(|at| Some(CssItem::AtRule(at)));
        }
        let start = self.pos;
        let stop = self.scan_stop(&[b';', b'{', b'}'], false);
        match self.bytes.get(stop) {
            Some(b'{') => {
                let selector = self.src[start..stop].trim().to_string();
                self.pos = stop + 1;
                let body = self.parse_block()?;
                let span = self.span(start..self.pos);
                Ok(Some(CssItem::Rule(Ruleset {
                    selector,
                    body,
                    span,
                    block_start: stop,
                })))
            }
            Some(b';') => {
                // scss variables, stray statements: keep them verbatim
                self.pos = stop + 1;
                let text = self.src[start..self.pos].to_string();
                if text.trim() == ";" {
                    return Ok(None);
                }
                let span = self.span(start..self.pos);
                Ok(Some(CssItem::Raw(RawItem { text, span })))
            }
            Some(b'}') => Err(ParseError::invalid_syntax(
                stop,
                "unexpected `}` outside a block",
            )),
            _ => {
                // trailing text with no structure at all
                self.pos = stop;
                let text = self.src[start..stop].trim_end().to_string();
                let span = self.span(start..start + text.len());
                Ok(Some(CssItem::Raw(RawItem { text, span })))
            }
        }
    }

    fn parse_at_rule(&mut self) -> ParseResult<AtRule> {
        let start = self.pos;
        self.pos += 1; // '@'
        let name_start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            self.pos += 1;
        }
        let name = self.src[name_start..self.pos].to_string();
        let stop = self.scan_stop(&[b';', b'{', b'}'], false);
        match self.bytes.get(stop) {
            Some(b'{') => {
                let params = self.src[self.pos..stop].trim().to_string();
                self.pos = stop + 1;
                let body = self.parse_block()?;
                let span = self.span(start..self.pos);
                Ok(AtRule {
                    name,
                    params,
                    body: Some(body),
                    span,
                    block_start: stop,
                })
            }
            Some(b';') => {
                let params = self.src[self.pos..stop].trim().to_string();
                self.pos = stop + 1;
                let span = self.span(start..self.pos);
                let block_start = span.end;
                Ok(AtRule {
                    name,
                    params,
                    body: None,
                    span,
                    block_start,
                })
            }
            _ => {
                let params = self.src[self.pos..stop].trim().to_string();
                self.pos = stop;
                let span = self.span(start..stop);
                let block_start = span.end;
                Ok(AtRule {
                    name,
                    params,
                    body: None,
                    span,
                    block_start,
                })
            }
        }
    }

    /// Block contents after the `{`, through the matching `}`.
    fn parse_block(&mut self) -> ParseResult<Vec<BlockNode>> {
        let mut body = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(ParseError::unexpected_eof(self.pos)),
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(body);
                }
                Some(b'@') => body.push(BlockNode::AtRule(self.parse_at_rule()?)),
                Some(_) => {
                    let start = self.pos;
                    let newline_ends = self.flavor == Flavor::Sass;
                    let stop = self.scan_stop(&[b';', b'{', b'}'], newline_ends);
                    if self.bytes.get(stop) == Some(&b'{') {
                        let selector = self.src[start..stop].trim().to_string();
                        self.pos = stop + 1;
                        let nested = self.parse_block()?;
                        let span = self.span(start..self.pos);
                        body.push(BlockNode::Rule(Ruleset {
                            selector,
                            body: nested,
                            span,
                            block_start: stop,
                        }));
                    } else {
                        let terminated = self.bytes.get(stop) == Some(&b';');
                        let end = if terminated { stop + 1 } else { stop };
                        if let Some(decl) = self.parse_declaration(start, stop, end) {
                            body.push(BlockNode::Declaration(decl));
                        }
                        self.pos = end;
                    }
                }
            }
        }
    }

    /// Declaration out of `src[start..stop]`; `end` includes the terminator.
    fn parse_declaration(&mut self, start: usize, stop: usize, end: usize) -> Option<Declaration> {
        let text = &self.src[start..stop];
        if text.trim().is_empty() {
            return None;
        }
        let (name, value_start, value_end) = match text.find(':') {
            Some(colon) => {
                let name = text[..colon].trim().to_string();
                let rest = &text[colon + 1..];
                let lead = rest.len() - rest.trim_start().len();
                let value_start = start + colon + 1 + lead;
                let value_end = start + colon + 1 + rest.trim_end().len();
                (name, value_start, value_end.max(value_start))
            }
            None => {
                let name = text.trim().to_string();
                let name_end = start + text.trim_end().len();
                (name, name_end, name_end)
            }
        };
        let value = self.src[value_start..value_end].to_string();
        let span_end = if end > stop { end } else { value_end };
        let span = self.span(start..span_end);
        Some(Declaration {
            name,
            value,
            span,
            value_start,
            value_end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(tree: &StyleTree, index: usize) -> &Ruleset {
        match &tree.sheet.items[index] {
            CssItem::Rule(rule) => rule,
            other => panic!("Expected a rule, got {:?}", other),
        }
    }

    #[test]
    fn parses_rules_and_declarations() {
        let src = ".card {\n  display: block;\n  color: red;\n}\n\n.card .title {\n  font-weight: bold;\n}\n";
        let tree = parse(src, Flavor::Css).unwrap();
        assert_eq!(tree.sheet.items.len(), 2);
        let first = rule(&tree, 0);
        assert_eq!(first.selector, ".card");
        let decls: Vec<_> = first.declarations().collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "display");
        assert_eq!(decls[0].value, "block");
        assert_eq!(&src[decls[0].value_start..decls[0].value_end], "block");
        assert_eq!(rule(&tree, 1).selector, ".card .title");
    }

    #[test]
    fn parses_media_queries_with_nested_rules() {
        let src = "@media (min-width: 600px) {\n  .card {\n    padding: 16px;\n  }\n}\n";
        let tree = parse(src, Flavor::Css).unwrap();
        let CssItem::AtRule(at) = &tree.sheet.items[0] else {
            panic!("Expected an at-rule");
        };
        assert_eq!(at.name, "media");
        assert_eq!(at.params, "(min-width: 600px)");
        let body = at.body.as_ref().unwrap();
        assert!(
            matches!(&body[0], BlockNode::Rule(rule) if rule.selector == ".card"),
            "nested rule expected"
        );
    }

    #[test]
    fn parses_statement_at_rules() {
        let src = "@import \"base.css\";\n@charset \"utf-8\";\n";
        let tree = parse(src, Flavor::Css).unwrap();
        let CssItem::AtRule(import) = &tree.sheet.items[0] else {
            panic!("Expected an at-rule");
        };
        assert_eq!(import.name, "import");
        assert_eq!(import.params, "\"base.css\"");
        assert!(import.body.is_none());
    }

    #[test]
    fn parses_font_face_declarations() {
        let src = "@font-face {\n  font-family: Inter;\n  src: url(\"inter.woff2\");\n}\n";
        let tree = parse(src, Flavor::Css).unwrap();
        let CssItem::AtRule(at) = &tree.sheet.items[0] else {
            panic!("Expected an at-rule");
        };
        let body = at.body.as_ref().unwrap();
        assert_eq!(body.len(), 2);
        assert!(
            matches!(&body[1], BlockNode::Declaration(decl) if decl.value == "url(\"inter.woff2\")")
        );
    }

    #[test]
    fn strings_protect_stop_bytes() {
        let src = ".a { background: url(\"semi;colon}.png\"); }\n";
        let tree = parse(src, Flavor::Css).unwrap();
        let decl = rule(&tree, 0).declarations().next().unwrap();
        assert_eq!(decl.value, "url(\"semi;colon}.png\")");
    }

    #[test]
    fn scss_nesting_and_variables() {
        let src = "$accent: #f00;\n.card {\n  color: $accent;\n  .title {\n    font-weight: bold;\n  }\n}\n";
        let tree = parse(src, Flavor::Scss).unwrap();
        assert!(matches!(&tree.sheet.items[0], CssItem::Raw(raw) if raw.text.contains("$accent")));
        let card = rule(&tree, 1);
        assert_eq!(card.declarations().count(), 1);
        assert!(
            matches!(&card.body[1], BlockNode::Rule(rule) if rule.selector == ".title"),
            "nested rule expected"
        );
    }

    #[test]
    fn sass_declarations_end_at_newlines() {
        let src = ".card {\n  display: block\n  color: red\n}\n";
        let tree = parse(src, Flavor::Sass).unwrap();
        let decls: Vec<_> = rule(&tree, 0).declarations().collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].value, "block");
        assert_eq!(decls[1].value, "red");
    }

    #[test]
    fn comments_are_skipped_between_items() {
        let src = "/* header */\n.a {\n  /* inside */\n  color: red; // eol\n}\n";
        let tree = parse(src, Flavor::Scss).unwrap();
        let decls: Vec<_> = rule(&tree, 0).declarations().collect();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].value, "red");
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = parse(".a { color: red;", Flavor::Css).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn flavor_comes_from_the_path_extension() {
        assert_eq!(Flavor::from_path("app.css"), Some(Flavor::Css));
        assert_eq!(Flavor::from_path("theme.scss"), Some(Flavor::Scss));
        assert_eq!(Flavor::from_path("legacy.Sass"), Some(Flavor::Sass));
        assert_eq!(Flavor::from_path("App.tsx"), None);
    }
}
