use easel_common::{NodeAllocator, NodeId, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stylesheet dialect. All three parse with the same grammar; the flavor
/// decides emission conventions when declarations are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flavor {
    Css,
    Scss,
    Sass,
}

impl Flavor {
    pub fn from_path(path: &str) -> Option<Flavor> {
        let (_, ext) = path.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Flavor::Css),
            "scss" => Some(Flavor::Scss),
            "sass" => Some(Flavor::Sass),
            _ => None,
        }
    }

    /// Terminator written after emitted declarations. Sass has none.
    pub fn terminator(&self) -> &'static str {
        match self {
            Flavor::Sass => "",
            _ => ";",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub items: Vec<CssItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CssItem {
    Rule(Ruleset),
    AtRule(AtRule),
    Raw(RawItem),
}

impl CssItem {
    pub fn span(&self) -> &Span {
        match self {
            CssItem::Rule(rule) => &rule.span,
            CssItem::AtRule(at) => &at.span,
            CssItem::Raw(raw) => &raw.span,
        }
    }
}

/// One rule-set. `block_start` is the offset of the `{`; the body keeps
/// declarations and nested rules in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub selector: String,
    pub body: Vec<BlockNode>,
    pub span: Span,
    pub block_start: usize,
}

impl Ruleset {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.body.iter().filter_map(|node| match node {
            BlockNode::Declaration(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn declarations_mut(&mut self) -> impl Iterator<Item = &mut Declaration> {
        self.body.iter_mut().filter_map(|node| match node {
            BlockNode::Declaration(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations().find(|decl| decl.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlockNode {
    Declaration(Declaration),
    Rule(Ruleset),
    AtRule(AtRule),
}

/// `name: value` pair. The span runs from the property name through the
/// terminator when one is present; `value_start`/`value_end` bound just the
/// value text for in-place replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub span: Span,
    pub value_start: usize,
    pub value_end: usize,
}

/// `@media (...) { ... }`, `@import "...";` and friends. Statement-like
/// at-rules have no body; `@font-face` style bodies hold declarations
/// directly, `@media` style bodies hold nested rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    pub body: Option<Vec<BlockNode>>,
    pub span: Span,
    pub block_start: usize,
}

/// Anything at item position the grammar does not model; kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub text: String,
    pub span: Span,
}

/// Dirty bookkeeping for the source-faithful printer. A flagged rule is
/// re-emitted canonically; a flagged declaration has only its value spliced.
/// Marker flags are kept apart so stripping restores verbatim printing.
#[derive(Debug, Clone, Default)]
pub struct CssLedger {
    dirty: HashSet<NodeId>,
    markers: HashSet<NodeId>,
}

impl CssLedger {
    pub fn mark_dirty(&mut self, id: NodeId) {
        self.dirty.insert(id);
    }

    pub fn mark_marker(&mut self, id: NodeId) {
        self.markers.insert(id);
    }

    pub fn unmark_marker(&mut self, id: NodeId) {
        self.markers.remove(&id);
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty.contains(&id)
    }

    pub fn is_flagged(&self, id: NodeId) -> bool {
        self.dirty.contains(&id) || self.markers.contains(&id)
    }

    pub fn is_clean(&self) -> bool {
        self.dirty.is_empty() && self.markers.is_empty()
    }
}

/// A parsed stylesheet together with its text, flavor and ledger. Produced
/// fresh per operation.
#[derive(Debug, Clone)]
pub struct StyleTree {
    pub sheet: Stylesheet,
    pub source: String,
    pub flavor: Flavor,
    ledger: CssLedger,
    nodes: NodeAllocator,
}

impl StyleTree {
    pub(crate) fn new(
        sheet: Stylesheet,
        source: String,
        flavor: Flavor,
        nodes: NodeAllocator,
    ) -> Self {
        Self {
            sheet,
            source,
            flavor,
            ledger: CssLedger::default(),
            nodes,
        }
    }

    pub fn ledger(&self) -> &CssLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut CssLedger {
        &mut self.ledger
    }

    /// Borrows the sheet, node allocator and ledger independently so edits
    /// can traverse while minting nodes and flagging changes.
    pub fn with_parts<R>(
        &mut self,
        f: impl FnOnce(&mut Stylesheet, &mut NodeAllocator, &mut CssLedger) -> R,
    ) -> R {
        f(&mut self.sheet, &mut self.nodes, &mut self.ledger)
    }

    /// Source-faithful print: untouched rules come back verbatim, flagged
    /// ones are re-emitted.
    pub fn print(&self) -> String {
        crate::printer::print(self)
    }

    /// Fully canonical print, ignoring the original formatting.
    pub fn print_canonical(&self) -> String {
        crate::printer::serialize(&self.sheet, self.flavor)
    }
}
