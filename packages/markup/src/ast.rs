use easel_common::{NodeAllocator, NodeId, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Root of a parsed markup/script file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub items: Vec<Item>,
    pub span: Span,
}

/// Top-level statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Item {
    Import(ImportDecl),
    Function(FunctionDecl),
    Styled(StyledDecl),
    Raw(RawStatement),
}

impl Item {
    pub fn span(&self) -> &Span {
        match self {
            Item::Import(import) => &import.span,
            Item::Function(func) => &func.span,
            Item::Styled(styled) => &styled.span,
            Item::Raw(raw) => &raw.span,
        }
    }
}

/// Import statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub module: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<NamedImport>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedImport {
    pub imported: String,
    pub local: Option<String>,
    pub span: Span,
}

impl NamedImport {
    /// Name the binding is visible under in this file.
    pub fn local_name(&self) -> &str {
        self.local.as_deref().unwrap_or(&self.imported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    None,
    Named,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FnKind {
    /// `function Name(...) { ... }`
    Declaration,
    /// `const Name = (...) => ...`
    Arrow,
}

/// Function or arrow-const declaration; component functions are the
/// interesting case, but plain helpers parse the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub export: ExportKind,
    pub kind: FnKind,
    /// Raw text of the parameter list, without the surrounding parens.
    pub params: String,
    pub body: FunctionBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FunctionBody {
    Block { statements: Vec<Stmt>, span: Span },
    /// Expression-bodied arrow: `=> <div />`
    Expr { value: ReturnValue, span: Span },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Return(ReturnStmt),
    Raw(RawStatement),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Return(ret) => &ret.span,
            Stmt::Raw(raw) => &raw.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<ReturnValue>,
    pub parenthesized: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReturnValue {
    Element(Element),
    Fragment(Fragment),
    Raw(RawExpr),
}

impl ReturnValue {
    pub fn span(&self) -> &Span {
        match self {
            ReturnValue::Element(el) => &el.span,
            ReturnValue::Fragment(frag) => &frag.span,
            ReturnValue::Raw(raw) => &raw.span,
        }
    }
}

/// Statement the grammar does not model; kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    pub text: String,
    pub span: Span,
}

/// Expression the grammar does not model; kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExpr {
    pub text: String,
    pub span: Span,
}

/// `const Name = styled.div`...`;` and `const Name = styled(Expr)`...`;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledDecl {
    pub name: String,
    pub export: ExportKind,
    pub target: StyledTarget,
    pub template: TemplateLiteral,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StyledTarget {
    Tag { name: String },
    Component { expr: RawExpr },
}

/// Template literal split at interpolations; `chunks.len() == exprs.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLiteral {
    pub chunks: Vec<TemplateChunk>,
    pub exprs: Vec<RawExpr>,
    pub span: Span,
}

/// One literal run of a template. `text` is the raw chunk text and is the
/// value edits operate on; the span only describes where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateChunk {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsxChild {
    Element(Element),
    Fragment(Fragment),
    Text(JsxText),
    Expr(ExprContainer),
}

impl JsxChild {
    pub fn span(&self) -> &Span {
        match self {
            JsxChild::Element(el) => &el.span,
            JsxChild::Fragment(frag) => &frag.span,
            JsxChild::Text(text) => &text.span,
            JsxChild::Expr(expr) => &expr.span,
        }
    }
}

/// JSX element. `open_end` is the offset just past the opening tag's `>`;
/// `close_start` is the offset of the closing `</` (equal to `span.end` for
/// self-closing elements). Both are only meaningful for parsed spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: JsxName,
    pub attributes: Vec<Attribute>,
    pub self_closing: bool,
    pub children: Vec<JsxChild>,
    pub span: Span,
    pub open_end: usize,
    pub close_start: usize,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|attr| attr.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Literal string value of an attribute, when it has one.
    pub fn string_attribute(&self, name: &str) -> Option<&str> {
        match self.attribute(name)?.value.as_ref()? {
            AttrValue::String(lit) => Some(&lit.value),
            AttrValue::Container(_) => None,
        }
    }
}

/// `<>...</>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub children: Vec<JsxChild>,
    pub span: Span,
    pub open_end: usize,
    pub close_start: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsxName {
    Ident { name: String },
    Member { object: String, property: String },
}

impl JsxName {
    /// Fragment-like names never carry marker attributes; the render side
    /// rejects unknown attributes on them.
    pub fn is_fragment(&self) -> bool {
        match self {
            JsxName::Ident { name } => name == "Fragment",
            JsxName::Member { property, .. } => property == "Fragment",
        }
    }
}

impl std::fmt::Display for JsxName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsxName::Ident { name } => write!(f, "{}", name),
            JsxName::Member { object, property } => write!(f, "{}.{}", object, property),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Option<AttrValue>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttrValue {
    String(StringLit),
    Container(ExprContainer),
}

/// String literal; `value` is the text between the quotes, unescaped only
/// for comparison purposes never for printing (it is printed as-is).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLit {
    pub value: String,
    pub span: Span,
}

/// `{ ... }` expression container; the span includes the braces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprContainer {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    Object(ObjectLit),
    Raw(RawExpr),
}

/// Object literal with statically-addressable properties. Shorthand, spread
/// and computed keys make the parser fall back to [`Expr::Raw`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLit {
    pub properties: Vec<ObjectProp>,
    pub span: Span,
}

impl ObjectLit {
    pub fn property(&self, key: &str) -> Option<&ObjectProp> {
        self.properties.iter().find(|prop| prop.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProp {
    pub key: String,
    pub value: PropValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropValue {
    String(StringLit),
    Number(NumberLit),
    Bool { value: bool, span: Span },
    Raw(RawExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberLit {
    pub raw: String,
    pub span: Span,
}

/// Text run between tags, exactly as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsxText {
    pub text: String,
    pub span: Span,
}

/// Tracks which nodes no longer match their source span, and how much of
/// them changed. The source-faithful printer re-emits flagged nodes
/// canonically and copies everything else verbatim.
#[derive(Debug, Clone, Default)]
pub struct PrintLedger {
    dirty: HashSet<NodeId>,
    open_dirty: HashSet<NodeId>,
    close_dirty: HashSet<NodeId>,
    children_dirty: HashSet<NodeId>,
    markers: HashSet<NodeId>,
}

impl PrintLedger {
    /// The whole node must be re-emitted.
    pub fn mark_dirty(&mut self, id: NodeId) {
        self.dirty.insert(id);
    }

    /// Only the element's opening tag changed (attribute edits).
    pub fn mark_open_dirty(&mut self, id: NodeId) {
        self.open_dirty.insert(id);
    }

    /// The element's closing tag changed (tag renames).
    pub fn mark_close_dirty(&mut self, id: NodeId) {
        self.close_dirty.insert(id);
    }

    /// The element's child list changed (insert/remove/reorder).
    pub fn mark_children_dirty(&mut self, id: NodeId) {
        self.children_dirty.insert(id);
    }

    /// The node carries injected marker data. Marker flags are kept apart
    /// from edit flags so stripping markers restores verbatim printing.
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

    pub fn is_open_dirty(&self, id: NodeId) -> bool {
        self.open_dirty.contains(&id) || self.markers.contains(&id)
    }

    pub fn is_close_dirty(&self, id: NodeId) -> bool {
        self.close_dirty.contains(&id)
    }

    pub fn is_children_dirty(&self, id: NodeId) -> bool {
        self.children_dirty.contains(&id)
    }

    /// True when any flag is set for the node.
    pub fn is_flagged(&self, id: NodeId) -> bool {
        self.dirty.contains(&id)
            || self.open_dirty.contains(&id)
            || self.close_dirty.contains(&id)
            || self.children_dirty.contains(&id)
            || self.markers.contains(&id)
    }

    pub fn is_clean(&self) -> bool {
        self.dirty.is_empty()
            && self.open_dirty.is_empty()
            && self.close_dirty.is_empty()
            && self.children_dirty.is_empty()
            && self.markers.is_empty()
    }
}

/// A parsed markup file together with the text it came from and the print
/// ledger. Produced fresh per operation; edits mutate it privately before
/// any text escapes to the caller.
#[derive(Debug, Clone)]
pub struct MarkupTree {
    pub file: SourceFile,
    pub source: String,
    ledger: PrintLedger,
    nodes: NodeAllocator,
}

impl MarkupTree {
    pub(crate) fn new(file: SourceFile, source: String, nodes: NodeAllocator) -> Self {
        Self {
            file,
            source,
            ledger: PrintLedger::default(),
            nodes,
        }
    }

    pub fn ledger(&self) -> &PrintLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut PrintLedger {
        &mut self.ledger
    }

    /// Borrows the file, node allocator and ledger independently so edits
    /// can traverse the tree while minting nodes and flagging changes.
    pub fn with_parts<R>(
        &mut self,
        f: impl FnOnce(&mut SourceFile, &mut NodeAllocator, &mut PrintLedger) -> R,
    ) -> R {
        f(&mut self.file, &mut self.nodes, &mut self.ledger)
    }

    /// Source-faithful print: untouched nodes are copied verbatim from the
    /// original text, flagged nodes are re-serialized.
    pub fn print(&self) -> String {
        crate::printer::print(self)
    }

    /// Fully canonical print, ignoring the original formatting.
    pub fn print_canonical(&self) -> String {
        crate::printer::Serializer::default().serialize(&self.file)
    }
}
