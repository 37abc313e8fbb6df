use crate::ast::*;

/// Canonical serializer: fresh formatting, two-space indentation.
pub fn serialize(sheet: &Stylesheet, flavor: Flavor) -> String {
    let mut out = String::new();
    for (i, item) in sheet.items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_item(item, flavor, "", "  ", &mut out);
        out.push('\n');
    }
    out
}

fn write_item(item: &CssItem, flavor: Flavor, indent: &str, unit: &str, out: &mut String) {
    match item {
        CssItem::Rule(rule) => write_rule(rule, flavor, indent, unit, out),
        CssItem::AtRule(at) => write_at_rule(at, flavor, indent, unit, out),
        CssItem::Raw(raw) => {
            out.push_str(indent);
            out.push_str(&raw.text);
        }
    }
}

/// Rule with its whole body; ends at the closing `}` without a newline.
pub(crate) fn write_rule(
    rule: &Ruleset,
    flavor: Flavor,
    indent: &str,
    unit: &str,
    out: &mut String,
) {
    out.push_str(indent);
    out.push_str(&rule.selector);
    out.push_str(" {\n");
    let inner = format!("{indent}{unit}");
    for node in &rule.body {
        write_block_node(node, flavor, &inner, unit, out);
    }
    out.push_str(indent);
    out.push('}');
}

pub(crate) fn write_at_rule(
    at: &AtRule,
    flavor: Flavor,
    indent: &str,
    unit: &str,
    out: &mut String,
) {
    out.push_str(indent);
    out.push('@');
    out.push_str(&at.name);
    if !at.params.is_empty() {
        out.push(' ');
        out.push_str(&at.params);
    }
    match &at.body {
        None => out.push_str(flavor.terminator()),
        Some(body) => {
            out.push_str(" {\n");
            let inner = format!("{indent}{unit}");
            for node in body {
                write_block_node(node, flavor, &inner, unit, out);
            }
            out.push_str(indent);
            out.push('}');
        }
    }
}

fn write_block_node(node: &BlockNode, flavor: Flavor, indent: &str, unit: &str, out: &mut String) {
    match node {
        BlockNode::Declaration(decl) => {
            out.push_str(indent);
            out.push_str(&decl.name);
            out.push_str(": ");
            out.push_str(&decl.value);
            out.push_str(flavor.terminator());
            out.push('\n');
        }
        BlockNode::Rule(rule) => {
            write_rule(rule, flavor, indent, unit, out);
            out.push('\n');
        }
        BlockNode::AtRule(at) => {
            write_at_rule(at, flavor, indent, unit, out);
            out.push('\n');
        }
    }
}

/// Source-faithful print. Flagged rules are re-emitted with their original
/// indentation; flagged declarations have just their value replaced; clean
/// text comes back verbatim, comments included.
pub(crate) fn print(tree: &StyleTree) -> String {
    let mut printer = Printer {
        source: &tree.source,
        flavor: tree.flavor,
        ledger: tree.ledger(),
        out: String::with_capacity(tree.source.len() + 64),
        last_end: 0,
        pending_break: false,
    };
    for item in &tree.sheet.items {
        printer.print_item(item);
    }
    printer.finish(tree.source.len())
}

struct Printer<'a> {
    source: &'a str,
    flavor: Flavor,
    ledger: &'a CssLedger,
    out: String,
    last_end: usize,
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

    fn print_item(&mut self, item: &CssItem) {
        match item {
            CssItem::Rule(rule) => self.print_rule(rule),
            CssItem::AtRule(at) => self.print_at_rule(at),
            CssItem::Raw(raw) => {
                if raw.span.is_synthetic() {
                    self.break_line();
                    self.out.push_str(&raw.text);
                    self.pending_break = true;
                    return;
                }
                self.copy_gap(raw.span.start);
                self.copy_to(raw.span.end);
            }
        }
    }

    fn print_rule(&mut self, rule: &Ruleset) {
        if rule.span.is_synthetic() {
            self.break_line();
            write_rule(rule, self.flavor, "", "  ", &mut self.out);
            self.pending_break = true;
            return;
        }
        if !self.rule_flagged(rule) {
            self.copy_gap(rule.span.start);
            self.copy_to(rule.span.end);
            return;
        }
        if self.ledger.is_flagged(rule.span.id) {
            // the gap stops short of the line indent; write_rule re-emits it
            let base = line_indent(self.source, rule.span.start);
            self.copy_gap(rule.span.start - base.len());
            let unit = block_unit(self.source, rule, base);
            write_rule(rule, self.flavor, base, &unit, &mut self.out);
            self.last_end = rule.span.end;
            return;
        }
        self.copy_gap(rule.span.start);
        for node in &rule.body {
            self.print_block_node(node);
        }
    }

    fn print_at_rule(&mut self, at: &AtRule) {
        if at.span.is_synthetic() {
            self.break_line();
            write_at_rule(at, self.flavor, "", "  ", &mut self.out);
            self.pending_break = true;
            return;
        }
        self.copy_gap(at.span.start);
        if let Some(body) = &at.body {
            for node in body {
                self.print_block_node(node);
            }
        }
    }

    fn print_block_node(&mut self, node: &BlockNode) {
        match node {
            BlockNode::Declaration(decl) => {
                if self.ledger.is_dirty(decl.span.id) {
                    self.copy_gap(decl.value_start);
                    self.out.push_str(&decl.value);
                    self.last_end = decl.value_end;
                }
            }
            BlockNode::Rule(rule) => self.print_rule(rule),
            BlockNode::AtRule(at) => self.print_at_rule(at),
        }
    }

    fn rule_flagged(&self, rule: &Ruleset) -> bool {
        rule.span.is_synthetic()
            || self.ledger.is_flagged(rule.span.id)
            || rule.body.iter().any(|node| self.node_flagged(node))
    }

    fn node_flagged(&self, node: &BlockNode) -> bool {
        match node {
            BlockNode::Declaration(decl) => {
                decl.span.is_synthetic() || self.ledger.is_flagged(decl.span.id)
            }
            BlockNode::Rule(rule) => self.rule_flagged(rule),
            BlockNode::AtRule(at) => {
                at.span.is_synthetic()
                    || self.ledger.is_flagged(at.span.id)
                    || at.body
                        .as_ref()
                        .is_some_and(|body| body.iter().any(|node| self.node_flagged(node)))
            }
        }
    }
}

/// Leading whitespace of the line `offset` sits on, when the offset is the
/// first non-blank thing on it.
fn line_indent(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &source[line_start..offset];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix
    } else {
        ""
    }
}

/// Indentation step used inside a rule's block, relative to `base`.
fn block_unit(source: &str, rule: &Ruleset, base: &str) -> String {
    let block = &source[rule.block_start..rule.span.end];
    for line in block.split('\n').skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let ws: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if let Some(unit) = ws.strip_prefix(base) {
            if !unit.is_empty() {
                return unit.to_string();
            }
        }
        break;
    }
    "  ".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::visit::traverse_rulesets_mut;

    const SAMPLE: &str = "/* layout */\n.card {\n  display: block;\n  color: red; /* brand */\n}\n\n@media (min-width: 600px) {\n  .card {\n    padding: 16px;\n  }\n}\n";

    #[test]
    fn untouched_sheet_prints_byte_identical() {
        let tree = parse(SAMPLE, Flavor::Css).unwrap();
        assert_eq!(tree.print(), SAMPLE);
    }

    #[test]
    fn value_splice_preserves_everything_else() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        tree.with_parts(|sheet, _, ledger| {
            traverse_rulesets_mut(sheet, |ordinal, rule| {
                if ordinal == 0 {
                    for decl in rule.declarations_mut() {
                        if decl.name == "color" {
                            decl.value = "blue".to_string();
                            ledger.mark_dirty(decl.span.id);
                        }
                    }
                }
            });
        });
        let printed = tree.print();
        assert!(printed.contains("color: blue; /* brand */"));
        assert!(printed.contains("/* layout */"));
        assert!(printed.contains("display: block;"));
    }

    #[test]
    fn structural_change_reformats_the_rule_with_its_own_indent() {
        let src = ".card {\n    display: block;\n}\n";
        let mut tree = parse(src, Flavor::Css).unwrap();
        tree.with_parts(|sheet, alloc, ledger| {
            traverse_rulesets_mut(sheet, |_, rule| {
                let span = alloc.synthetic_span();
                rule.body.push(BlockNode::Declaration(Declaration {
                    name: "padding".to_string(),
                    value: "10px".to_string(),
                    span,
                    value_start: 0,
                    value_end: 0,
                }));
                ledger.mark_dirty(rule.span.id);
            });
        });
        let printed = tree.print();
        assert_eq!(
            printed,
            ".card {\n    display: block;\n    padding: 10px;\n}\n"
        );
    }

    #[test]
    fn nested_rule_edits_only_touch_that_rule() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        tree.with_parts(|sheet, _, ledger| {
            traverse_rulesets_mut(sheet, |_, rule| {
                for decl in rule.declarations_mut() {
                    if decl.name == "padding" {
                        decl.value = "24px".to_string();
                        ledger.mark_dirty(decl.span.id);
                    }
                }
            });
        });
        let printed = tree.print();
        assert!(printed.contains("padding: 24px;"));
        assert!(printed.contains("color: red; /* brand */"));
        assert!(printed.contains("@media (min-width: 600px) {"));
    }

    #[test]
    fn marker_clear_restores_identity() {
        let mut tree = parse(SAMPLE, Flavor::Css).unwrap();
        tree.with_parts(|sheet, alloc, ledger| {
            traverse_rulesets_mut(sheet, |_, rule| {
                let span = alloc.synthetic_span();
                rule.body.insert(
                    0,
                    BlockNode::Declaration(Declaration {
                        name: "--probe".to_string(),
                        value: "1".to_string(),
                        span,
                        value_start: 0,
                        value_end: 0,
                    }),
                );
                ledger.mark_marker(rule.span.id);
            });
        });
        tree.with_parts(|sheet, _, ledger| {
            traverse_rulesets_mut(sheet, |_, rule| {
                rule.body.retain(|node| {
                    !matches!(node, BlockNode::Declaration(decl) if decl.name == "--probe")
                });
            });
            ledger.clear_markers();
        });
        assert_eq!(tree.print(), SAMPLE);
    }

    #[test]
    fn appended_synthetic_rule_lands_at_the_end() {
        let src = ".a {\n  color: red;\n}\n";
        let mut tree = parse(src, Flavor::Css).unwrap();
        tree.with_parts(|sheet, alloc, _| {
            let span = alloc.synthetic_span();
            let decl_span = alloc.synthetic_span();
            sheet.items.push(CssItem::Rule(Ruleset {
                selector: ".st-app-div-0".to_string(),
                body: vec![BlockNode::Declaration(Declaration {
                    name: "display".to_string(),
                    value: "flex".to_string(),
                    span: decl_span,
                    value_start: 0,
                    value_end: 0,
                })],
                span,
                block_start: 0,
            }));
        });
        assert_eq!(
            tree.print(),
            ".a {\n  color: red;\n}\n.st-app-div-0 {\n  display: flex;\n}\n"
        );
    }

    #[test]
    fn sass_flavor_omits_terminators_when_reformatting() {
        let src = ".card {\n  display: block\n}\n";
        let mut tree = parse(src, Flavor::Sass).unwrap();
        tree.with_parts(|sheet, alloc, ledger| {
            traverse_rulesets_mut(sheet, |_, rule| {
                let span = alloc.synthetic_span();
                rule.body.push(BlockNode::Declaration(Declaration {
                    name: "color".to_string(),
                    value: "red".to_string(),
                    span,
                    value_start: 0,
                    value_end: 0,
                }));
                ledger.mark_dirty(rule.span.id);
            });
        });
        assert_eq!(tree.print(), ".card {\n  display: block\n  color: red\n}\n");
    }

    #[test]
    fn canonical_serializer_produces_fresh_formatting() {
        let tree = parse(".a{color:red;padding:2px}\n", Flavor::Css).unwrap();
        assert_eq!(
            tree.print_canonical(),
            ".a {\n  color: red;\n  padding: 2px;\n}\n"
        );
    }
}
