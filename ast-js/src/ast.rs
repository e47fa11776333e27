use crate::doc::DocInfo;
use crate::ids::ExprId;
use crate::ids::FuncId;
use crate::ids::StmtId;
use diagnostics::TextRange;

/// A whole compilation input: statement, expression, and function arenas
/// plus the list of top-level statements.
#[derive(Debug, Default, Clone)]
pub struct Ast {
  pub stmts: Vec<Stmt>,
  pub exprs: Vec<Expr>,
  pub funcs: Vec<Func>,
  pub root: Vec<StmtId>,
}

impl Ast {
  pub fn stmt(&self, id: StmtId) -> &Stmt {
    &self.stmts[id.index()]
  }

  pub fn expr(&self, id: ExprId) -> &Expr {
    &self.exprs[id.index()]
  }

  pub fn func(&self, id: FuncId) -> &Func {
    &self.funcs[id.index()]
  }

  /// The dotted name of a `Name`/property-access chain, or `None` if the
  /// expression is not a pure chain (e.g. contains calls).
  pub fn qualified_name(&self, id: ExprId) -> Option<String> {
    match &self.expr(id).kind {
      ExprKind::Name(name) => Some(name.clone()),
      ExprKind::This => Some("this".to_string()),
      ExprKind::Prop { obj, name } => {
        let mut qualified = self.qualified_name(*obj)?;
        qualified.push('.');
        qualified.push_str(name);
        Some(qualified)
      }
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Stmt {
  pub kind: StmtKind,
  pub doc: Option<DocInfo>,
  pub range: TextRange,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
  /// `var a = 1, b;`; the doc on the statement covers every binding.
  Var(Vec<VarBinding>),
  /// A function declaration statement.
  Func(FuncId),
  Expr(ExprId),
  If {
    test: ExprId,
    cons: StmtId,
    alt: Option<StmtId>,
  },
  While {
    test: ExprId,
    body: StmtId,
  },
  DoWhile {
    body: StmtId,
    test: ExprId,
  },
  For {
    init: Option<ForInit>,
    test: Option<ExprId>,
    update: Option<ExprId>,
    body: StmtId,
  },
  Return(Option<ExprId>),
  Block(Vec<StmtId>),
  Break,
  Continue,
  Empty,
}

#[derive(Debug, Clone)]
pub struct VarBinding {
  pub name: String,
  pub init: Option<ExprId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
  Var(StmtId),
  Expr(ExprId),
}

#[derive(Debug, Clone)]
pub struct Expr {
  pub kind: ExprKind,
  pub doc: Option<DocInfo>,
  pub range: TextRange,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
  Name(String),
  Num(f64),
  Str(String),
  Bool(bool),
  Null,
  This,
  Object(Vec<ObjectProp>),
  Prop {
    obj: ExprId,
    name: String,
  },
  Assign {
    target: ExprId,
    value: ExprId,
  },
  Call {
    callee: ExprId,
    args: Vec<ExprId>,
  },
  New {
    callee: ExprId,
    args: Vec<ExprId>,
  },
  Bin {
    op: BinOp,
    lhs: ExprId,
    rhs: ExprId,
  },
  Un {
    op: UnOp,
    operand: ExprId,
  },
  Func(FuncId),
}

#[derive(Debug, Clone)]
pub struct ObjectProp {
  pub key: String,
  pub value: ExprId,
  pub doc: Option<DocInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  LooseEq,
  LooseNe,
  StrictEq,
  StrictNe,
  Lt,
  Le,
  Gt,
  Ge,
  And,
  Or,
  InstanceOf,
}

impl BinOp {
  /// Whether this operator produces a boolean regardless of operand types.
  pub fn is_comparison(self) -> bool {
    matches!(
      self,
      BinOp::LooseEq
        | BinOp::LooseNe
        | BinOp::StrictEq
        | BinOp::StrictNe
        | BinOp::Lt
        | BinOp::Le
        | BinOp::Gt
        | BinOp::Ge
        | BinOp::InstanceOf
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
  Not,
  TypeOf,
  Neg,
  Void,
}

/// A function literal: shared by declarations and expressions.
#[derive(Debug, Clone)]
pub struct Func {
  pub name: Option<String>,
  pub params: Vec<String>,
  pub body: Vec<StmtId>,
}
