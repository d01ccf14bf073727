//! AST definitions for the scripting language.
//!
//! Every node carries a [`Span`] so that runtime errors can point back at the
//! source. Function bodies sit behind an `Rc` because each closure created
//! from a definition shares the same read-only tree.

use std::rc::Rc;

/// A single position in the source text. `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SourceLocation {
    /// Character offset from the start of the source.
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
        }
    }
}

/// Half-open source range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Span covering `self` through `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

/// Operator of an assignment statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// Binary operator applied by a compound assignment.
    pub fn binary(&self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
        }
    }
}

/// Piece of a string literal: literal text or an interpolated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Text(String),
    Expr(AstNode),
}

/// One name on the left of `=`, with the `[index]` path to write through.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignTarget {
    pub name: String,
    pub indices: Vec<AstNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfCase {
    pub condition: AstNode,
    pub body: AstNode,
    /// Block bodies evaluate to nothing.
    pub returns_null: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseCase {
    pub body: AstNode,
    pub returns_null: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptClause {
    /// Kind to catch; `None` catches everything.
    pub name: Option<String>,
    pub name_span: Span,
    /// Binding for the error message inside the handler.
    pub as_name: Option<String>,
    pub body: AstNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<AstNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: AstNode,
    /// `=>` bodies return their value without `redi`.
    pub auto_return: bool,
    pub span: Span,
}

impl FunctionDecl {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordArg {
    pub name: String,
    pub value: AstNode,
    pub span: Span,
}

/// AST node types
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Number {
        value: f64,
        span: Span,
    },
    Numeral {
        value: f64,
        span: Span,
    },
    Str {
        parts: Vec<StringPart>,
        span: Span,
    },
    Bool {
        value: bool,
        span: Span,
    },
    List {
        elements: Vec<AstNode>,
        span: Span,
    },
    Dict {
        entries: Vec<(AstNode, AstNode)>,
        span: Span,
    },
    /// Statements of an indented block.
    Block {
        statements: Vec<AstNode>,
        span: Span,
    },
    VarAccess {
        name: String,
        indices: Vec<AstNode>,
        attrs: Vec<String>,
        span: Span,
    },
    VarAssign {
        targets: Vec<AssignTarget>,
        values: Vec<AstNode>,
        op: AssignOp,
        span: Span,
    },
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        span: Span,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<AstNode>,
        span: Span,
    },
    If {
        cases: Vec<IfCase>,
        else_case: Option<Box<ElseCase>>,
        span: Span,
    },
    Try {
        body: Box<AstNode>,
        handler: Option<Box<ExceptClause>>,
        span: Span,
    },
    For {
        var: String,
        start: Box<AstNode>,
        end: Box<AstNode>,
        step: Option<Box<AstNode>>,
        body: Box<AstNode>,
        returns_null: bool,
        span: Span,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
        returns_null: bool,
        span: Span,
    },
    FuncDef {
        decl: Rc<FunctionDecl>,
        span: Span,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        kwargs: Vec<KeywordArg>,
        span: Span,
    },
    Return {
        value: Option<Box<AstNode>>,
        span: Span,
    },
    Continue {
        span: Span,
    },
    Break {
        span: Span,
    },
}

impl AstNode {
    pub fn span(&self) -> Span {
        match self {
            AstNode::Number { span, .. }
            | AstNode::Numeral { span, .. }
            | AstNode::Str { span, .. }
            | AstNode::Bool { span, .. }
            | AstNode::List { span, .. }
            | AstNode::Dict { span, .. }
            | AstNode::Block { span, .. }
            | AstNode::VarAccess { span, .. }
            | AstNode::VarAssign { span, .. }
            | AstNode::BinaryOp { span, .. }
            | AstNode::UnaryOp { span, .. }
            | AstNode::If { span, .. }
            | AstNode::Try { span, .. }
            | AstNode::For { span, .. }
            | AstNode::While { span, .. }
            | AstNode::FuncDef { span, .. }
            | AstNode::Call { span, .. }
            | AstNode::Return { span, .. }
            | AstNode::Continue { span }
            | AstNode::Break { span } => *span,
        }
    }
}

/// A parsed script: its top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }
}
