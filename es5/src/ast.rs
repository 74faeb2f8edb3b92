//! Syntax tree produced by [`crate::parse`].
//!
//! Nodes keep the source position of every token the printer maps back into
//! the original text. Parenthesized expressions are kept as [`Expression::Paren`]
//! so the printer reproduces grouping without re-deriving precedence.
use crate::lexer::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub body: Vec<Statement>,
}

/// Function declaration, function expression, or property accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Position of the `function`, `get` or `set` keyword.
    pub pos: Position,
    pub id: Option<Identifier>,
    pub params: Vec<Identifier>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDeclarator {
    pub id: Identifier,
    /// Position of `=` and the initializer.
    pub init: Option<(Position, Expression)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForInit {
    Var(Position, Vec<VarDeclarator>),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCase {
    /// `None` for `default`.
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    pub param: Identifier,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Block(Vec<Statement>),
    Var {
        pos: Position,
        declarations: Vec<VarDeclarator>,
    },
    Empty,
    Expression(Expression),
    If {
        pos: Position,
        test: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
    },
    DoWhile {
        pos: Position,
        body: Box<Statement>,
        test: Expression,
    },
    While {
        pos: Position,
        test: Expression,
        body: Box<Statement>,
    },
    For {
        pos: Position,
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    ForIn {
        pos: Position,
        left: ForInit,
        right: Expression,
        body: Box<Statement>,
    },
    Continue {
        pos: Position,
        label: Option<Identifier>,
    },
    Break {
        pos: Position,
        label: Option<Identifier>,
    },
    Return {
        pos: Position,
        argument: Option<Expression>,
    },
    With {
        pos: Position,
        object: Expression,
        body: Box<Statement>,
    },
    Switch {
        pos: Position,
        discriminant: Expression,
        cases: Vec<SwitchCase>,
    },
    Labeled {
        label: Identifier,
        body: Box<Statement>,
    },
    Throw {
        pos: Position,
        argument: Expression,
    },
    Try {
        pos: Position,
        block: Vec<Statement>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Statement>>,
    },
    Debugger {
        pos: Position,
    },
    Function(Function),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Null,
    Boolean,
    Number,
    String,
    Regex,
}

/// Property name as written: identifier name, string or number literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyKey {
    pub raw: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Init { key: PropertyKey, value: Expression },
    Get { key: PropertyKey, function: Function },
    Set { key: PropertyKey, function: Function },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    This(Position),
    Identifier(Identifier),
    Literal {
        kind: LiteralKind,
        raw: String,
        pos: Position,
    },
    /// `None` elements are holes.
    Array {
        pos: Position,
        elements: Vec<Option<Expression>>,
    },
    Object {
        pos: Position,
        properties: Vec<Property>,
    },
    Function(Box<Function>),
    Paren {
        pos: Position,
        expression: Box<Expression>,
    },
    Unary {
        operator: String,
        pos: Position,
        argument: Box<Expression>,
    },
    Update {
        operator: String,
        prefix: bool,
        pos: Position,
        argument: Box<Expression>,
    },
    Binary {
        operator: String,
        pos: Position,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Assign {
        operator: String,
        pos: Position,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// `arguments` is `None` for `new Foo` without an argument list.
    New {
        pos: Position,
        callee: Box<Expression>,
        arguments: Option<Vec<Expression>>,
    },
    Member {
        object: Box<Expression>,
        property: Identifier,
    },
    Index {
        object: Box<Expression>,
        property: Box<Expression>,
    },
    Sequence(Vec<Expression>),
}

impl Expression {
    /// Whether the expression may stand on the left of an assignment.
    pub fn is_reference(&self) -> bool {
        match self {
            Expression::Identifier(_) | Expression::Member { .. } | Expression::Index { .. } => {
                true
            }
            Expression::Paren { expression, .. } => expression.is_reference(),
            _ => false,
        }
    }
}
