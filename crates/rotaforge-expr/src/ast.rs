//! Syntax tree of a parsed program.

use rotaforge_milp::{ObjectiveSense, VarType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    List(Vec<Expr>),
    /// `target[i, j, ...]`
    Index {
        target: Box<Expr>,
        indices: Vec<Expr>,
    },
    /// Builtin call `name(args)`
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// `sum(a in A, b in B where cond: body)`
    Sum(Box<Comprehension>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    /// Height of the tree; a leaf is 1.
    pub fn depth(&self) -> usize {
        let children = match self {
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Ident(_) => 0,
            Expr::List(items) | Expr::Call { args: items, .. } => max_depth(items),
            Expr::Index { target, indices } => target.depth().max(max_depth(indices)),
            Expr::Sum(comp) => {
                let bindings = comp.bindings.iter().map(|(_, e)| e.depth()).max().unwrap_or(0);
                let filter = comp.filter.as_ref().map_or(0, Expr::depth);
                bindings.max(filter).max(comp.body.depth())
            }
            Expr::Unary(_, operand) => operand.depth(),
            Expr::Binary(_, lhs, rhs) => lhs.depth().max(rhs.depth()),
        };
        children + 1
    }
}

fn max_depth(exprs: &[Expr]) -> usize {
    exprs.iter().map(Expr::depth).max().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub bindings: Vec<(String, Expr)>,
    pub filter: Option<Expr>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = binary[dims...] in [lo, hi];`
    Declare {
        name: String,
        var_type: VarType,
        dims: Vec<Expr>,
        bounds: Option<(Expr, Expr)>,
    },
    Let {
        name: String,
        value: Expr,
    },
    For {
        var: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    /// `constrain "template": expr;`
    Constrain {
        name: Option<String>,
        expr: Expr,
    },
    Objective {
        sense: ObjectiveSense,
        expr: Expr,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// A parsed program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}
