//! Programmatic AST construction.
//!
//! Stands in for the out-of-scope parser: tests and embedders assemble
//! arenas through [`AstBuilder`] instead of parsing source text.

use crate::ast::Ast;
use crate::ast::BinOp;
use crate::ast::Expr;
use crate::ast::ExprKind;
use crate::ast::ForInit;
use crate::ast::Func;
use crate::ast::ObjectProp;
use crate::ast::Stmt;
use crate::ast::StmtKind;
use crate::ast::UnOp;
use crate::ast::VarBinding;
use crate::doc::DocInfo;
use crate::ids::ExprId;
use crate::ids::FuncId;
use crate::ids::StmtId;
use diagnostics::TextRange;

#[derive(Debug, Default)]
pub struct AstBuilder {
  ast: Ast,
}

impl AstBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Finish, marking `root` as the top-level statement list.
  pub fn script(mut self, root: Vec<StmtId>) -> Ast {
    self.ast.root = root;
    self.ast
  }

  fn push_expr(&mut self, kind: ExprKind) -> ExprId {
    self.push_expr_doc(kind, None)
  }

  fn push_expr_doc(&mut self, kind: ExprKind, doc: Option<DocInfo>) -> ExprId {
    let id = ExprId(self.ast.exprs.len() as u32);
    self.ast.exprs.push(Expr {
      kind,
      doc,
      range: TextRange::empty(),
    });
    id
  }

  fn push_stmt(&mut self, kind: StmtKind) -> StmtId {
    self.push_stmt_doc(kind, None)
  }

  fn push_stmt_doc(&mut self, kind: StmtKind, doc: Option<DocInfo>) -> StmtId {
    let id = StmtId(self.ast.stmts.len() as u32);
    self.ast.stmts.push(Stmt {
      kind,
      doc,
      range: TextRange::empty(),
    });
    id
  }

  // Expressions.

  pub fn num(&mut self, value: f64) -> ExprId {
    self.push_expr(ExprKind::Num(value))
  }

  pub fn str_(&mut self, value: impl Into<String>) -> ExprId {
    self.push_expr(ExprKind::Str(value.into()))
  }

  pub fn bool_(&mut self, value: bool) -> ExprId {
    self.push_expr(ExprKind::Bool(value))
  }

  pub fn null(&mut self) -> ExprId {
    self.push_expr(ExprKind::Null)
  }

  pub fn this(&mut self) -> ExprId {
    self.push_expr(ExprKind::This)
  }

  pub fn name(&mut self, text: impl Into<String>) -> ExprId {
    self.push_expr(ExprKind::Name(text.into()))
  }

  pub fn object(&mut self, props: Vec<(&str, ExprId)>) -> ExprId {
    let props = props
      .into_iter()
      .map(|(key, value)| ObjectProp {
        key: key.to_string(),
        value,
        doc: None,
      })
      .collect();
    self.push_expr(ExprKind::Object(props))
  }

  pub fn object_props(&mut self, props: Vec<ObjectProp>) -> ExprId {
    self.push_expr(ExprKind::Object(props))
  }

  pub fn prop(&mut self, obj: ExprId, name: impl Into<String>) -> ExprId {
    self.push_expr(ExprKind::Prop {
      obj,
      name: name.into(),
    })
  }

  /// Build a property chain from a dotted path, e.g. `"a.b.c"`.
  pub fn path(&mut self, dotted: &str) -> ExprId {
    let mut parts = dotted.split('.');
    let head = parts.next().expect("non-empty path");
    let mut expr = self.name(head);
    for part in parts {
      expr = self.prop(expr, part);
    }
    expr
  }

  pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
    self.push_expr(ExprKind::Assign { target, value })
  }

  pub fn call(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
    self.push_expr(ExprKind::Call { callee, args })
  }

  pub fn new_(&mut self, callee: ExprId, args: Vec<ExprId>) -> ExprId {
    self.push_expr(ExprKind::New { callee, args })
  }

  pub fn bin(&mut self, op: BinOp, lhs: ExprId, rhs: ExprId) -> ExprId {
    self.push_expr(ExprKind::Bin { op, lhs, rhs })
  }

  pub fn un(&mut self, op: UnOp, operand: ExprId) -> ExprId {
    self.push_expr(ExprKind::Un { op, operand })
  }

  pub fn not(&mut self, operand: ExprId) -> ExprId {
    self.un(UnOp::Not, operand)
  }

  pub fn typeof_(&mut self, operand: ExprId) -> ExprId {
    self.un(UnOp::TypeOf, operand)
  }

  pub fn func_expr(&mut self, func: FuncId) -> ExprId {
    self.push_expr(ExprKind::Func(func))
  }

  pub fn func_expr_doc(&mut self, func: FuncId, doc: DocInfo) -> ExprId {
    self.push_expr_doc(ExprKind::Func(func), Some(doc))
  }

  // Functions.

  pub fn func(
    &mut self,
    name: Option<&str>,
    params: Vec<&str>,
    body: Vec<StmtId>,
  ) -> FuncId {
    let id = FuncId(self.ast.funcs.len() as u32);
    self.ast.funcs.push(Func {
      name: name.map(|n| n.to_string()),
      params: params.into_iter().map(|p| p.to_string()).collect(),
      body,
    });
    id
  }

  // Statements.

  pub fn var_(&mut self, name: impl Into<String>, init: Option<ExprId>) -> StmtId {
    self.push_stmt(StmtKind::Var(vec![VarBinding {
      name: name.into(),
      init,
    }]))
  }

  pub fn var_doc(
    &mut self,
    doc: DocInfo,
    name: impl Into<String>,
    init: Option<ExprId>,
  ) -> StmtId {
    self.push_stmt_doc(
      StmtKind::Var(vec![VarBinding {
        name: name.into(),
        init,
      }]),
      Some(doc),
    )
  }

  pub fn var_decls(&mut self, decls: Vec<(&str, Option<ExprId>)>) -> StmtId {
    self.push_stmt(StmtKind::Var(
      decls
        .into_iter()
        .map(|(name, init)| VarBinding {
          name: name.to_string(),
          init,
        })
        .collect(),
    ))
  }

  pub fn func_decl(&mut self, func: FuncId) -> StmtId {
    self.push_stmt(StmtKind::Func(func))
  }

  pub fn func_decl_doc(&mut self, doc: DocInfo, func: FuncId) -> StmtId {
    self.push_stmt_doc(StmtKind::Func(func), Some(doc))
  }

  pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
    self.push_stmt(StmtKind::Expr(expr))
  }

  pub fn expr_stmt_doc(&mut self, doc: DocInfo, expr: ExprId) -> StmtId {
    self.push_stmt_doc(StmtKind::Expr(expr), Some(doc))
  }

  pub fn if_(&mut self, test: ExprId, cons: StmtId, alt: Option<StmtId>) -> StmtId {
    self.push_stmt(StmtKind::If { test, cons, alt })
  }

  pub fn while_(&mut self, test: ExprId, body: StmtId) -> StmtId {
    self.push_stmt(StmtKind::While { test, body })
  }

  pub fn do_while(&mut self, body: StmtId, test: ExprId) -> StmtId {
    self.push_stmt(StmtKind::DoWhile { body, test })
  }

  pub fn for_(
    &mut self,
    init: Option<ForInit>,
    test: Option<ExprId>,
    update: Option<ExprId>,
    body: StmtId,
  ) -> StmtId {
    self.push_stmt(StmtKind::For {
      init,
      test,
      update,
      body,
    })
  }

  pub fn return_(&mut self, value: Option<ExprId>) -> StmtId {
    self.push_stmt(StmtKind::Return(value))
  }

  pub fn block(&mut self, stmts: Vec<StmtId>) -> StmtId {
    self.push_stmt(StmtKind::Block(stmts))
  }

  pub fn break_(&mut self) -> StmtId {
    self.push_stmt(StmtKind::Break)
  }

  pub fn continue_(&mut self) -> StmtId {
    self.push_stmt(StmtKind::Continue)
  }

  pub fn empty(&mut self) -> StmtId {
    self.push_stmt(StmtKind::Empty)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn qualified_name_of_path() {
    let mut b = AstBuilder::new();
    let expr = b.path("a.b.c");
    let ast = b.script(vec![]);
    assert_eq!(ast.qualified_name(expr).as_deref(), Some("a.b.c"));
  }

  #[test]
  fn qualified_name_rejects_calls() {
    let mut b = AstBuilder::new();
    let callee = b.name("f");
    let call = b.call(callee, vec![]);
    let expr = b.prop(call, "x");
    let ast = b.script(vec![]);
    assert_eq!(ast.qualified_name(expr), None);
  }

  #[test]
  fn this_is_a_qualified_head() {
    let mut b = AstBuilder::new();
    let this = b.this();
    let expr = b.prop(this, "foo");
    let ast = b.script(vec![]);
    assert_eq!(ast.qualified_name(expr).as_deref(), Some("this.foo"));
  }
}
