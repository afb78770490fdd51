//! Tagged-union AST for the accepted openCypher subset.
//!
//! Every node carries its source position (`Pos`) so semantic and schema
//! errors can point back at the query text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub parts: Vec<SinglePartQuery>,
    pub unions: Vec<UnionPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionPart {
    pub all: bool,
    pub parts: Vec<SinglePartQuery>,
}

/// One MATCH*/CREATE*/WITH-separated segment of a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SinglePartQuery {
    pub reading_clauses: Vec<ReadingClause>,
    pub updating_clauses: Vec<UpdatingClause>,
    pub with: Option<WithClause>,
    pub return_clause: Option<ReturnClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingClause {
    Match(MatchClause),
    OptionalMatch(MatchClause),
    Unwind(UnwindClause),
    Call(CallClause),
}

/// `CALL proc.name(args) YIELD item [AS alias], ...`. Procedure dispatch is
/// not part of this crate's Core API (see SPEC_FULL.md §11); the clause is
/// parsed and carried in the AST so a caller supplying its own procedure
/// registry can handle it during transform, but the built-in transform
/// rejects any `procedure_name` it does not recognize.
#[derive(Debug, Clone, PartialEq)]
pub struct CallClause {
    pub procedure_name: String,
    pub arguments: Vec<Expr>,
    pub yield_items: Option<Vec<YieldItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldItem {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdatingClause {
    Create(CreateClause),
    Merge(MergeClause),
    Set(SetClause),
    Remove(RemoveClause),
    Delete(DeleteClause),
    Foreach(ForeachClause),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub patterns: Vec<PathPattern>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnwindClause {
    pub expr: Expr,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateClause {
    pub patterns: Vec<PathPattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeClause {
    pub pattern: PathPattern,
    pub on_create: Vec<SetItem>,
    pub on_match: Vec<SetItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub items: Vec<SetItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetItem {
    Property { target: PropertyAccess, value: Expr },
    /// `n += {map}` merges a map literal into existing properties.
    MergeMap { variable: String, map: Expr },
    /// `n:Label` adds a label.
    Label { variable: String, label: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoveClause {
    pub items: Vec<RemoveItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveItem {
    Property(PropertyAccess),
    Label { variable: String, label: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteClause {
    pub detach: bool,
    pub items: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeachClause {
    pub variable: String,
    /// The parser only accepts a list literal here (see REDESIGN FLAG 4).
    pub list: Expr,
    pub updates: Vec<UpdatingClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithClause {
    pub distinct: bool,
    pub items: Vec<ProjectionItem>,
    pub where_clause: Option<Expr>,
    pub order_by: Option<Vec<OrderByItem>>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnClause {
    pub distinct: bool,
    pub items: Vec<ProjectionItem>,
    pub order_by: Option<Vec<OrderByItem>>,
    pub skip: Option<Expr>,
    pub limit: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub expr: Expr,
    pub alias: Option<String>,
    /// Original source text of `expr`, used as the default column name when
    /// no `AS` alias is given (matches the user's exact spelling/spacing).
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expr,
    pub descending: bool,
}

// ---------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PathPattern {
    pub variable: Option<String>,
    pub element: PatternElement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternElement {
    pub start: NodePattern,
    pub chain: Vec<(RelationshipPattern, NodePattern)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    pub variable: Option<String>,
    pub labels: Vec<String>,
    pub properties: Option<MapLiteral>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelDirection {
    Right, // -[...]->
    Left,  // <-[...]-
    Both,  // <-[...]->
    Either, // -[...]- (undirected)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<String>,
    pub types: Vec<String>,
    pub direction: RelDirection,
    pub properties: Option<MapLiteral>,
    pub var_length: Option<VarLengthSpec>,
    pub path_function: Option<PathFunction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFunction {
    ShortestPath,
    AllShortestPaths,
}

/// `*`, `*n`, `*n..`, `*..m`, `*n..m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarLengthSpec {
    pub min: u32,
    pub max: Option<u32>,
}

pub type MapLiteral = Vec<(String, Expr)>;

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccess {
    pub variable: String,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Xor,
    StartsWith,
    EndsWith,
    Contains,
    RegexMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Parameter(String),
    Variable(String),
    Property(Box<Expr>, String),
    Parenthesized(Box<Expr>),
    List(Vec<Expr>),
    Map(MapLiteral),
    FunctionCall { name: String, distinct: bool, args: Vec<Expr> },
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    In(Box<Expr>, Box<Expr>),
    CaseSearched { branches: Vec<(Expr, Expr)>, else_branch: Option<Box<Expr>> },
    CaseSimple { subject: Box<Expr>, branches: Vec<(Expr, Expr)>, else_branch: Option<Box<Expr>> },
    ListIndex(Box<Expr>, Box<Expr>),
    ListSlice(Box<Expr>, Option<Box<Expr>>, Option<Box<Expr>>),
    MapProjection { variable: String, items: Vec<MapProjectionItem> },
    /// Standalone `shortestPath(...)` / `allShortestPaths(...)` used as an
    /// expression (not inside a relationship chain).
    PathFunctionCall { function: PathFunction, pattern: Box<PathPattern> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapProjectionItem {
    Property(String),
    Alias { key: String, expr: Expr },
    AllProperties,
}
