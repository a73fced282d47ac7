use serde::Serialize;
use vc_common::Span;

use crate::semantic::types::Type;

// ============================================================================
// Program (top-level)
// ============================================================================

/// A complete VC program.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

/// Identity of a declaration, assigned by the checker when the declaration
/// enters scope. Identifier references point back at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A top-level declaration.
#[derive(Debug, Clone, Serialize)]
pub enum Declaration {
    Function(FunctionDecl),
    /// A global variable. `int a, b;` yields one entry per declarator.
    Var(VarDecl),
}

/// `type name(params) { body }`
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub name_span: Span,
    pub return_type: Type,
    pub params: Vec<ParamDecl>,
    pub body: Block,
    pub span: Span,
    pub id: Option<DeclId>,
}

/// A formal parameter: `int x` or `float a[]`.
#[derive(Debug, Clone, Serialize)]
pub struct ParamDecl {
    pub name: String,
    pub name_span: Span,
    pub ty: Type,
    pub span: Span,
    pub id: Option<DeclId>,
}

/// A variable declaration, global or local.
#[derive(Debug, Clone, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub name_span: Span,
    /// Declared type. For `int a[] = {..}` the checker fills in the size.
    pub ty: Type,
    pub initializer: Option<Initializer>,
    pub span: Span,
    pub id: Option<DeclId>,
}

/// Right-hand side of `= ...` in a variable declaration.
#[derive(Debug, Clone, Serialize)]
pub enum Initializer {
    Expr(Expr),
    Array(ArrayInit),
}

/// `{e1, e2, ...}`
#[derive(Debug, Clone, Serialize)]
pub struct ArrayInit {
    pub elements: Vec<Expr>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// `{ local-decls stmts }`
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub decls: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Break(Span),
    Continue(Span),
    Return(ReturnStmt),
    Expr(Expr),
    /// A lone `;`.
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Block(block) => &block.span,
            Stmt::If(stmt) => &stmt.span,
            Stmt::While(stmt) => &stmt.span,
            Stmt::For(stmt) => &stmt.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Empty(span) => span,
            Stmt::Return(stmt) => &stmt.span,
            Stmt::Expr(expr) => &expr.span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// `for (init; condition; update) body`; every clause may be absent.
#[derive(Debug, Clone, Serialize)]
pub struct ForStmt {
    pub init: Option<Expr>,
    pub condition: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node. `ty` is empty until the checker has visited it.
#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Option<Type>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            ty: None,
            span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum ExprKind {
    Literal(Literal),
    Var(VarRef),
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// `target = value`; the parser accepts any expression as the target.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: VarRef,
        args: Vec<Expr>,
    },
    Index {
        array: VarRef,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

/// A use of a name. `decl` links to the declaration it resolved to.
#[derive(Debug, Clone, Serialize)]
pub struct VarRef {
    pub name: String,
    pub decl: Option<DeclId>,
    pub span: Span,
}

impl VarRef {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            decl: None,
            span,
        }
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Operand representation an operator was specialized to.
/// Booleans share the integer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OpClass {
    Int,
    Float,
}

impl OpClass {
    fn prefix(self) -> &'static str {
        match self {
            OpClass::Int => "i",
            OpClass::Float => "f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    /// Widening conversion inserted by the checker.
    IntToFloat,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::IntToFloat => "i2f",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnaryOperator {
    pub op: UnaryOp,
    pub class: Option<OpClass>,
}

impl UnaryOperator {
    pub fn new(op: UnaryOp) -> Self {
        Self { op, class: None }
    }

    /// Spelling after specialization, e.g. `f-` or `i!`.
    pub fn spelling(&self) -> String {
        match (self.op, self.class) {
            (UnaryOp::IntToFloat, _) => "i2f".to_string(),
            (op, Some(class)) => format!("{}{}", class.prefix(), op.symbol()),
            (op, None) => op.symbol().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinaryOperator {
    pub op: BinaryOp,
    pub class: Option<OpClass>,
}

impl BinaryOperator {
    pub fn new(op: BinaryOp) -> Self {
        Self { op, class: None }
    }

    /// Spelling after specialization, e.g. `i+` or `f<=`.
    pub fn spelling(&self) -> String {
        match self.class {
            Some(class) => format!("{}{}", class.prefix(), self.op.symbol()),
            None => self.op.symbol().to_string(),
        }
    }
}
