//! AST types for the scripting language.
//!
//! Nodes are immutable and shared through [`Arc`]. Rewrites (see
//! [`crate::simplify`]) build new nodes only where something changed and
//! hand back the identical `Arc` otherwise, so "nothing changed" is testable
//! with [`Arc::ptr_eq`].

use crate::literal::NumericValue;
use num_bigint::BigInt;
use smol_str::SmolStr;
use source_map::Span;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared expression node.
pub type Expr = Arc<Expression>;

/// A shared statement node.
pub type Stmt = Arc<Statement>;

/// Identity stamp of an AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

/// Hands out monotonically increasing node ids.
///
/// The counter is shared by clones, so one generator can be threaded through
/// several parses (and across threads) without a process-wide singleton.
#[derive(Debug, Clone, Default)]
pub struct NodeIdGenerator {
    last: Arc<AtomicU64>,
}

impl NodeIdGenerator {
    /// Creates a generator whose first id is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.last.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Returns the most recently issued id (`0` if none was issued).
    pub fn last_id(&self) -> NodeId {
        NodeId(self.last.load(Ordering::Relaxed))
    }
}

/// Stable numeric discriminator of every node kind.
///
/// Serialized forms key on these values, so they must not be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    // === Statements ===
    EmptyStatement = 1,
    ExpressionStatement = 2,
    LetStatement = 3,
    ConstStatement = 4,
    VarStatement = 5,
    BlockStatement = 6,
    IfStatement = 7,
    ReturnStatement = 8,
    BreakStatement = 9,
    ContinueStatement = 10,
    WhileStatement = 11,
    DoWhileStatement = 12,
    ForStatement = 13,
    ForInStatement = 14,
    ForOfStatement = 15,
    ThrowStatement = 16,
    TryStatement = 17,
    SwitchStatement = 18,
    FunctionDeclaration = 19,
    ImportDeclaration = 20,

    // === Expressions ===
    UnaryExpression = 100,
    PrefixOpExpression = 101,
    PostfixOpExpression = 102,
    BinaryExpression = 103,
    SequenceExpression = 104,
    ConditionalExpression = 105,
    FunctionInvocationExpression = 106,
    MemberAccessExpression = 107,
    CalculatedMemberAccessExpression = 108,
    Identifier = 109,
    TemplateLiteralExpression = 110,
    Literal = 111,
    ArrayLiteral = 112,
    ObjectLiteral = 113,
    SpreadExpression = 114,
    AssignmentExpression = 115,
    NoArgExpression = 116,
    ArrowExpression = 117,
    NewExpression = 118,
    AwaitExpression = 119,
}

impl NodeType {
    /// Returns the numeric discriminator.
    pub fn code(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    /// Identity stamp.
    pub id: NodeId,
    /// Source range from the first to the last token of the node.
    pub span: Span,
    /// The variant-specific fields.
    pub kind: ExprKind,
}

impl Expression {
    /// Returns the stable node type of this expression.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Returns the identifier name if this is a plain identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier { name } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Returns the literal value if this is a literal.
    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match &self.kind {
            ExprKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the source text this node was parsed from.
    pub fn source_text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// The variants of [`Expression`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// `undefined`, `null`, booleans, numbers, bigints and strings.
    Literal(LiteralValue),
    /// A variable reference.
    Identifier { name: SmolStr },
    /// `` `a${b}c` ``; text parts are string literals.
    TemplateLiteral { parts: Vec<Expr> },
    /// `[a, , ...b]`; elided slots are [`ExprKind::NoArg`].
    ArrayLiteral { items: Vec<Expr> },
    /// `{ a, b: 1, [c]: 2, ...d }`
    ObjectLiteral { properties: Vec<ObjectProperty> },
    /// `+x`, `-x`, `!x`, `~x`, `typeof x`, `delete x`
    Unary { op: UnaryOp, operand: Expr },
    /// `++x`, `--x`
    Prefix { op: UpdateOp, operand: Expr },
    /// `x++`, `x--`
    Postfix { op: UpdateOp, operand: Expr },
    /// `a op b`
    Binary {
        op: BinaryOp,
        left: Expr,
        right: Expr,
    },
    /// `a, b, c`. A loose sequence contains elided slots (`a,,b`).
    Sequence { expressions: Vec<Expr>, loose: bool },
    /// `a ? b : c`
    Conditional {
        condition: Expr,
        consequent: Expr,
        alternate: Expr,
    },
    /// `f(a)`, `f?.(a)`
    Call {
        callee: Expr,
        arguments: Vec<Expr>,
        optional: bool,
    },
    /// `a.b`, `a?.b`
    Member {
        object: Expr,
        member: SmolStr,
        optional: bool,
    },
    /// `a[b]`, `a?.[b]`
    ComputedMember {
        object: Expr,
        member: Expr,
        optional: bool,
    },
    /// `...a`
    Spread { operand: Expr },
    /// `a = b`, `a += b`, ...
    Assignment {
        op: AssignmentOp,
        target: Expr,
        value: Expr,
    },
    /// An elided slot, or the empty parameter list `()`.
    NoArg,
    /// An arrow function (also used for function expressions).
    Arrow(Arc<ArrowFunction>),
    /// `new C(args)`
    New { callee: Expr, arguments: Vec<Expr> },
    /// `await x`
    Await { operand: Expr },
}

impl ExprKind {
    /// Returns the stable node type of this variant.
    pub fn node_type(&self) -> NodeType {
        match self {
            ExprKind::Literal(_) => NodeType::Literal,
            ExprKind::Identifier { .. } => NodeType::Identifier,
            ExprKind::TemplateLiteral { .. } => NodeType::TemplateLiteralExpression,
            ExprKind::ArrayLiteral { .. } => NodeType::ArrayLiteral,
            ExprKind::ObjectLiteral { .. } => NodeType::ObjectLiteral,
            ExprKind::Unary { .. } => NodeType::UnaryExpression,
            ExprKind::Prefix { .. } => NodeType::PrefixOpExpression,
            ExprKind::Postfix { .. } => NodeType::PostfixOpExpression,
            ExprKind::Binary { .. } => NodeType::BinaryExpression,
            ExprKind::Sequence { .. } => NodeType::SequenceExpression,
            ExprKind::Conditional { .. } => NodeType::ConditionalExpression,
            ExprKind::Call { .. } => NodeType::FunctionInvocationExpression,
            ExprKind::Member { .. } => NodeType::MemberAccessExpression,
            ExprKind::ComputedMember { .. } => NodeType::CalculatedMemberAccessExpression,
            ExprKind::Spread { .. } => NodeType::SpreadExpression,
            ExprKind::Assignment { .. } => NodeType::AssignmentExpression,
            ExprKind::NoArg => NodeType::NoArgExpression,
            ExprKind::Arrow(_) => NodeType::ArrowExpression,
            ExprKind::New { .. } => NodeType::NewExpression,
            ExprKind::Await { .. } => NodeType::AwaitExpression,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiteralValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
}

impl From<NumericValue> for LiteralValue {
    fn from(value: NumericValue) -> Self {
        match value {
            NumericValue::Number(n) => LiteralValue::Number(n),
            NumericValue::BigInt(b) => LiteralValue::BigInt(b),
        }
    }
}

/// A property of an object literal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectProperty {
    /// `key: value`
    KeyValue { key: PropertyKey, value: Expr },
    /// `name` (same as `name: name`)
    Shorthand { name: SmolStr, span: Span },
    /// `...expr`
    Spread(Expr),
}

/// The key of an object literal property.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyKey {
    /// An identifier, keyword, string or number key, normalized to text.
    Named(SmolStr),
    /// `[expr]`
    Computed(Expr),
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitwiseNot,
    Typeof,
    Delete,
}

impl UnaryOp {
    /// Returns the operator text.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Delete => "delete",
        }
    }
}

/// `++` or `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Exponent,
    ShiftLeft,
    SignedShiftRight,
    ShiftRight,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    In,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    LogicalAnd,
    LogicalOr,
    NullCoalesce,
}

impl BinaryOp {
    /// Returns the operator text.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Exponent => "**",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::SignedShiftRight => ">>",
            BinaryOp::ShiftRight => ">>>",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::NullCoalesce => "??",
        }
    }

    /// Returns true for the short-circuiting operators.
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullCoalesce
        )
    }
}

/// Assignment operators. `Assign` is plain `=`; the others combine a binary
/// operator with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignmentOp {
    Assign,
    Compound(BinaryOp),
}

/// An arrow function or function expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrowFunction {
    /// The function name, for named function expressions and declarations.
    pub name: Option<SmolStr>,
    /// The parameter list.
    pub params: Params,
    /// The body.
    pub body: ArrowBody,
    /// `async` was written before the function.
    pub is_async: bool,
}

/// The body of an arrow function.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrowBody {
    /// `x => expr`
    Expression(Expr),
    /// `x => { ... }`
    Block(Vec<Stmt>),
}

/// A parameter list.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    /// The positional parameters.
    pub items: Vec<Pattern>,
    /// The trailing `...rest` parameter.
    pub rest: Option<Pattern>,
}

impl Params {
    /// Returns the number of positional parameters.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no parameters at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.rest.is_none()
    }
}

/// A binding target: a name or a destructuring pattern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    /// A plain name.
    Identifier { name: SmolStr, span: Span },
    /// `[a, , [b], ...rest]`
    Array(ArrayPattern),
    /// `{ a, b: alias, c: { d }, ...rest }`
    Object(ObjectPattern),
}

impl Pattern {
    /// Returns every name bound by this pattern, in source order.
    pub fn bound_names(&self) -> Vec<SmolStr> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<SmolStr>) {
        match self {
            Pattern::Identifier { name, .. } => names.push(name.clone()),
            Pattern::Array(array) => {
                for item in array.items.iter().flatten() {
                    item.collect_names(names);
                }
                if let Some(rest) = &array.rest {
                    rest.collect_names(names);
                }
            }
            Pattern::Object(object) => {
                for prop in &object.properties {
                    prop.value.collect_names(names);
                }
                if let Some(rest) = &object.rest {
                    names.push(rest.clone());
                }
            }
        }
    }
}

/// An array destructuring pattern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayPattern {
    /// Positional items; `None` marks an elided slot.
    pub items: Vec<Option<Pattern>>,
    /// The trailing rest element.
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

/// An object destructuring pattern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectPattern {
    /// `key` or `key: target`
    pub properties: Vec<ObjectPatternProperty>,
    /// The trailing rest name.
    pub rest: Option<SmolStr>,
    pub span: Span,
}

/// One property of an object destructuring pattern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectPatternProperty {
    /// The property read from the source object.
    pub key: SmolStr,
    /// Where the value is bound (the key itself when not aliased).
    pub value: Pattern,
}

// =============================================================================
// Statements
// =============================================================================

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statement {
    /// Identity stamp.
    pub id: NodeId,
    /// Source range from the first to the last token of the node.
    pub span: Span,
    /// The variant-specific fields.
    pub kind: StmtKind,
}

impl Statement {
    /// Returns the stable node type of this statement.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

/// The variants of [`Statement`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// `;`
    Empty,
    /// `expr;`
    Expression(Expr),
    /// `let a = 1, [b] = c;`
    Let(Vec<Declarator>),
    /// `const a = 1;`
    Const(Vec<Declarator>),
    /// `var a = expr;` declares a reactive variable.
    Var(Vec<Declarator>),
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// `if (c) a else b`
    If {
        condition: Expr,
        then_branch: Stmt,
        else_branch: Option<Stmt>,
    },
    /// `return expr;`
    Return(Option<Expr>),
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `while (c) body`
    While { condition: Expr, body: Stmt },
    /// `do body while (c)`
    DoWhile { body: Stmt, condition: Expr },
    /// `for (init; condition; update) body`
    For {
        init: Option<Stmt>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Stmt,
    },
    /// `for (binding in object) body`
    ForIn(Arc<ForEachLoop>),
    /// `for (binding of iterable) body`
    ForOf(Arc<ForEachLoop>),
    /// `throw expr;`
    Throw(Expr),
    /// `try { } catch (e) { } finally { }`
    Try {
        block: Vec<Stmt>,
        catch_param: Option<Pattern>,
        catch_block: Option<Vec<Stmt>>,
        finally_block: Option<Vec<Stmt>>,
    },
    /// `switch (d) { case ...: ... }`
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    /// `function name(params) { body }`
    Function(Arc<ArrowFunction>),
    /// `import { a, b as c } from "module";`
    Import(ImportDeclaration),
}

impl StmtKind {
    /// Returns the stable node type of this variant.
    pub fn node_type(&self) -> NodeType {
        match self {
            StmtKind::Empty => NodeType::EmptyStatement,
            StmtKind::Expression(_) => NodeType::ExpressionStatement,
            StmtKind::Let(_) => NodeType::LetStatement,
            StmtKind::Const(_) => NodeType::ConstStatement,
            StmtKind::Var(_) => NodeType::VarStatement,
            StmtKind::Block(_) => NodeType::BlockStatement,
            StmtKind::If { .. } => NodeType::IfStatement,
            StmtKind::Return(_) => NodeType::ReturnStatement,
            StmtKind::Break => NodeType::BreakStatement,
            StmtKind::Continue => NodeType::ContinueStatement,
            StmtKind::While { .. } => NodeType::WhileStatement,
            StmtKind::DoWhile { .. } => NodeType::DoWhileStatement,
            StmtKind::For { .. } => NodeType::ForStatement,
            StmtKind::ForIn(_) => NodeType::ForInStatement,
            StmtKind::ForOf(_) => NodeType::ForOfStatement,
            StmtKind::Throw(_) => NodeType::ThrowStatement,
            StmtKind::Try { .. } => NodeType::TryStatement,
            StmtKind::Switch { .. } => NodeType::SwitchStatement,
            StmtKind::Function(_) => NodeType::FunctionDeclaration,
            StmtKind::Import(_) => NodeType::ImportDeclaration,
        }
    }
}

/// One declarator of a `let`/`const`/`var` statement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declarator {
    pub target: Pattern,
    pub init: Option<Expr>,
}

/// How a `for..in`/`for..of` loop binds its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopBinding {
    /// `for (x of ...)` reuses an existing variable.
    None,
    /// `for (let x of ...)`: fresh, writable per iteration.
    Let,
    /// `for (const x of ...)`: fresh per iteration, assignment is an error.
    Const,
}

/// The shared shape of `for..in` and `for..of`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForEachLoop {
    pub binding: LoopBinding,
    pub target: Pattern,
    pub source: Expr,
    pub body: Stmt,
}

/// One `case` (or `default`) clause.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// `import { a, b as c } from "module";`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportDeclaration {
    pub specifiers: Vec<ImportSpecifier>,
    pub module: String,
}

/// One imported name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportSpecifier {
    /// The exported name, `default` for a default import.
    pub imported: SmolStr,
    /// The local binding name.
    pub local: SmolStr,
}
