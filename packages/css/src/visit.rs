use crate::ast::{AtRule, BlockNode, CssItem, Ruleset, Stylesheet};

/// Visits every rule-set in document order, handing each its ordinal.
/// Nested rules and rules inside at-rule bodies are counted; at-rules
/// themselves are not.
pub fn traverse_rulesets<F>(sheet: &Stylesheet, mut f: F)
where
    F: FnMut(usize, &Ruleset),
{
    let mut ordinal = 0;
    for item in &sheet.items {
        match item {
            CssItem::Rule(rule) => visit_rule(rule, &mut ordinal, &mut f),
            CssItem::AtRule(at) => visit_at_rule(at, &mut ordinal, &mut f),
            CssItem::Raw(_) => {}
        }
    }
}

pub fn traverse_rulesets_mut<F>(sheet: &mut Stylesheet, mut f: F)
where
    F: FnMut(usize, &mut Ruleset),
{
    let mut ordinal = 0;
    for item in &mut sheet.items {
        match item {
            CssItem::Rule(rule) => visit_rule_mut(rule, &mut ordinal, &mut f),
            CssItem::AtRule(at) => visit_at_rule_mut(at, &mut ordinal, &mut f),
            CssItem::Raw(_) => {}
        }
    }
}

fn visit_rule<F: FnMut(usize, &Ruleset)>(rule: &Ruleset, ordinal: &mut usize, f: &mut F) {
    f(*ordinal, rule);
    *ordinal += 1;
    for node in &rule.body {
        visit_node(node, ordinal, f);
    }
}

fn visit_node<F: FnMut(usize, &Ruleset)>(node: &BlockNode, ordinal: &mut usize, f: &mut F) {
    match node {
        BlockNode::Declaration(_) => {}
        BlockNode::Rule(rule) => visit_rule(rule, ordinal, f),
        BlockNode::AtRule(at) => visit_at_rule(at, ordinal, f),
    }
}

fn visit_at_rule<F: FnMut(usize, &Ruleset)>(at: &AtRule, ordinal: &mut usize, f: &mut F) {
    if let Some(body) = &at.body {
        for node in body {
            visit_node(node, ordinal, f);
        }
    }
}

fn visit_rule_mut<F: FnMut(usize, &mut Ruleset)>(rule: &mut Ruleset, ordinal: &mut usize, f: &mut F) {
    f(*ordinal, rule);
    *ordinal += 1;
    for node in &mut rule.body {
        visit_node_mut(node, ordinal, f);
    }
}

fn visit_node_mut<F: FnMut(usize, &mut Ruleset)>(node: &mut BlockNode, ordinal: &mut usize, f: &mut F) {
    match node {
        BlockNode::Declaration(_) => {}
        BlockNode::Rule(rule) => visit_rule_mut(rule, ordinal, f),
        BlockNode::AtRule(at) => visit_at_rule_mut(at, ordinal, f),
    }
}

fn visit_at_rule_mut<F: FnMut(usize, &mut Ruleset)>(at: &mut AtRule, ordinal: &mut usize, f: &mut F) {
    if let Some(body) = &mut at.body {
        for node in body {
            visit_node_mut(node, ordinal, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Flavor;
    use crate::parser::parse;

    #[test]
    fn ordinals_follow_document_order_through_at_rules() {
        let src = ".a { color: red; }\n@media screen {\n  .b { color: blue; }\n}\n.c { color: green; }\n";
        let tree = parse(src, Flavor::Css).unwrap();
        let mut seen = Vec::new();
        traverse_rulesets(&tree.sheet, |ordinal, rule| {
            seen.push((ordinal, rule.selector.clone()));
        });
        assert_eq!(
            seen,
            vec![
                (0, ".a".to_string()),
                (1, ".b".to_string()),
                (2, ".c".to_string()),
            ]
        );
    }

    #[test]
    fn nested_rules_are_counted_after_their_parent() {
        let src = ".outer {\n  color: red;\n  .inner { color: blue; }\n}\n";
        let tree = parse(src, Flavor::Scss).unwrap();
        let mut seen = Vec::new();
        traverse_rulesets(&tree.sheet, |ordinal, rule| {
            seen.push((ordinal, rule.selector.clone()));
        });
        assert_eq!(
            seen,
            vec![(0, ".outer".to_string()), (1, ".inner".to_string())]
        );
    }

    #[test]
    fn mutable_traversal_can_rewrite_values() {
        let src = ".a { color: red; }\n";
        let mut tree = parse(src, Flavor::Css).unwrap();
        traverse_rulesets_mut(&mut tree.sheet, |_, rule| {
            for decl in rule.declarations_mut() {
                decl.value = "navy".to_string();
            }
        });
        let mut values = Vec::new();
        traverse_rulesets(&tree.sheet, |_, rule| {
            values.extend(rule.declarations().map(|d| d.value.clone()));
        });
        assert_eq!(values, ["navy"]);
    }
}
