//! Syntax tree for scripts.
//!
//! Covers ES5 plus the later additions commonly found in page scripts:
//! `let`/`const`, arrow functions, template literals, spread, shorthand
//! properties, optional chaining and `??`.

use doclint_markup::Span;

/// A parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expression),
    VarDecl(VarDecl),
    Function(Function),
    Return(Option<Expression>),
    If {
        test: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
    },
    For {
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    /// `for (x in y)` or, with `of` set, `for (x of y)`.
    ForIn {
        left: ForInit,
        right: Expression,
        body: Box<Statement>,
        of: bool,
    },
    While {
        test: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        test: Expression,
    },
    Block(Vec<Statement>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try {
        block: Vec<Statement>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Statement>>,
    },
    Switch {
        discriminant: Expression,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: String,
        body: Box<Statement>,
    },
    Empty,
    Debugger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarations: Vec<VarDeclarator>,
}

/// `target = init`. The target is an identifier or a destructuring pattern
/// written as an object or array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub target: Expression,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Expression>,
    pub body: Vec<Statement>,
}

/// A `case` clause; `test` is `None` for `default`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
}

/// A `function` declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<Expression>,
    pub body: Vec<Statement>,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A complete expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal: `42`, `3.14`, `0xff`
    Number(f64),

    /// String literal: `"hello"`, `'world'` (escapes decoded)
    String(String),

    /// Template literal, kept as raw text between the backticks.
    Template(String),

    /// Regular expression literal: `/ab+c/gi`
    Regex { pattern: String, flags: String },

    /// Boolean literal: `true`, `false`
    Boolean(bool),

    /// Null literal
    Null,

    /// Identifier: `count`, `$`, `undefined`
    Identifier(String),

    /// `this`
    This,

    /// Array literal: `[1, 2, 3]`; `None` marks a hole as in `[1, , 3]`
    Array(Vec<Option<Expression>>),

    /// Object literal: `{ count: 0, name: 'test' }`
    Object(Vec<ObjectMember>),

    /// `function (a) { ... }`
    Function(Box<Function>),

    /// Arrow function: `(x) => x + 1`
    Arrow {
        params: Vec<Expression>,
        body: ArrowBody,
    },

    /// Unary operation: `!active`, `-count`, `typeof x`
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    /// `++x`, `x--`
    Update {
        op: UpdateOp,
        prefix: bool,
        operand: Box<Expression>,
    },

    /// Binary operation: `a + b`, `count > 0`, `a && b`
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },

    /// Assignment: `count = 5`, `count += 1`
    Assignment {
        target: Box<Expression>,
        op: AssignOp,
        value: Box<Expression>,
    },

    /// Ternary: `count > 0 ? 'yes' : 'no'`
    Ternary {
        condition: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },

    /// Member access: `user.name`, `items[0]`, `a?.b`
    ///
    /// For non-computed access `property` is an `Identifier`.
    Member {
        object: Box<Expression>,
        property: Box<Expression>,
        computed: bool,
        optional: bool,
    },

    /// Function call: `save()`, `$(el).kendoGrid({...})`
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        optional: bool,
    },

    /// `new Foo(a)`
    New {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// Comma sequence: `a, b`
    Sequence(Vec<Expression>),

    /// `...items` in calls, arrays and parameter lists
    Spread(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expression(Box<Expression>),
    Block(Vec<Statement>),
}

/// One entry of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property(ObjectProperty),
    /// `...rest`
    Spread(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub key: PropertyKey,
    pub value: Expression,
    pub kind: PropertyKind,
    pub shorthand: bool,
    /// Starts at the key.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
}

impl PropertyKey {
    /// The key as a property name, if it is static.
    pub fn name(&self) -> Option<String> {
        match self {
            PropertyKey::Identifier(s) | PropertyKey::String(s) => Some(s.clone()),
            PropertyKey::Number(n) => Some(crate::printer::format_number(*n)),
            PropertyKey::Computed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
    /// `name() { ... }`
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    Neq,
    StrictEq,
    StrictNeq,
    Lt,
    Gt,
    Lte,
    Gte,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    NullishCoalescing,
    In,
    Instanceof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}
