//! Statement-level control-flow graph.
//!
//! One basic block per statement, with dedicated blocks for the moving
//! parts of `for` and `do...while` loops. Branch edges are labeled
//! true/false and carry the controlling condition so the inference engine
//! can refine the environments it propagates. Any graph honoring the
//! entry/exit/successor/predecessor contract may be supplied to the
//! engine; [`ControlFlowGraph::build`] is the canonical producer.

use ast_js::Ast;
use ast_js::ExprId;
use ast_js::ForInit;
use ast_js::StmtId;
use ast_js::StmtKind;
use std::fmt;

/// Identifier for a basic block inside a body-local CFG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct BlockId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
  Unconditional,
  OnTrue,
  OnFalse,
}

/// Directed, labeled edge to a successor block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
  pub to: BlockId,
  pub kind: EdgeKind,
}

/// Specialized actions performed by a block besides executing statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum BlockKind {
  #[default]
  Normal,
  /// `for` initializer executed once before entering the loop test.
  ForInit { init: Option<ForInit> },
  /// `for` test that branches to the body (true) or past the loop (false).
  ForTest { test: Option<ExprId> },
  /// `for` update executed at the end of each iteration.
  ForUpdate { update: Option<ExprId> },
  /// `do...while` test executed after the body.
  DoWhileTest { test: ExprId },
}

#[derive(Clone, Debug, Default)]
pub struct BasicBlock {
  pub id: BlockId,
  pub kind: BlockKind,
  pub stmts: Vec<StmtId>,
  /// The condition controlling this block's true/false edges, if any.
  pub branch: Option<ExprId>,
  pub succs: Vec<Edge>,
}

/// Control-flow graph with distinguished entry and exit blocks.
#[derive(Clone, Debug, Default)]
pub struct ControlFlowGraph {
  entry: BlockId,
  exit: BlockId,
  pub blocks: Vec<BasicBlock>,
}

impl ControlFlowGraph {
  pub fn entry(&self) -> BlockId {
    self.entry
  }

  pub fn exit(&self) -> BlockId {
    self.exit
  }

  pub fn block(&self, id: BlockId) -> &BasicBlock {
    &self.blocks[id.0]
  }

  pub fn successors(&self, id: BlockId) -> &[Edge] {
    &self.blocks[id.0].succs
  }

  pub fn predecessors(&self, id: BlockId) -> Vec<(BlockId, EdgeKind)> {
    let mut preds = Vec::new();
    for block in &self.blocks {
      for edge in &block.succs {
        if edge.to == id {
          preds.push((block.id, edge.kind));
        }
      }
    }
    preds
  }

  fn add_block(&mut self) -> BlockId {
    let id = BlockId(self.blocks.len());
    self.blocks.push(BasicBlock {
      id,
      ..Default::default()
    });
    id
  }

  fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind) {
    self.blocks[from.0].succs.push(Edge { to, kind });
  }

  /// Build the graph for a statement list (a script root or function body).
  pub fn build(ast: &Ast, stmts: &[StmtId]) -> ControlFlowGraph {
    CfgBuilder::new(ast).build(stmts)
  }
}

impl fmt::Display for ControlFlowGraph {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "CFG(entry={:?}, exit={:?}, blocks={})",
      self.entry,
      self.exit,
      self.blocks.len()
    )?;
    for block in &self.blocks {
      writeln!(
        f,
        "  {:?}: kind={:?} stmts={:?} succ={:?}",
        block.id, block.kind, block.stmts, block.succs
      )?;
    }
    Ok(())
  }
}

struct CfgBuilder<'a> {
  cfg: ControlFlowGraph,
  ast: &'a Ast,
  breakables: Vec<BreakableContext>,
}

#[derive(Default)]
struct BuildResult {
  entry: Option<BlockId>,
  exits: Vec<BlockId>,
}

#[derive(Clone, Copy, Debug)]
struct BreakableContext {
  break_target: BlockId,
  continue_target: Option<BlockId>,
}

impl<'a> CfgBuilder<'a> {
  fn new(ast: &'a Ast) -> Self {
    let mut cfg = ControlFlowGraph::default();
    let entry = cfg.add_block();
    let exit = cfg.add_block();
    cfg.entry = entry;
    cfg.exit = exit;
    Self {
      cfg,
      ast,
      breakables: Vec::new(),
    }
  }

  fn build(mut self, stmts: &[StmtId]) -> ControlFlowGraph {
    if stmts.is_empty() {
      self.cfg.add_edge(self.cfg.entry, self.cfg.exit, EdgeKind::Unconditional);
      return self.cfg;
    }
    let entry = self.cfg.entry;
    let res = self.build_stmt_list(stmts, vec![entry]);
    let exit = self.cfg.exit;
    self.connect(&res.exits, exit);
    self.cfg
  }

  fn connect(&mut self, from: &[BlockId], to: BlockId) {
    for pred in from {
      self.cfg.add_edge(*pred, to, EdgeKind::Unconditional);
    }
  }

  fn add_stmt_block(&mut self, stmt_id: StmtId) -> BlockId {
    let block = self.cfg.add_block();
    self.cfg.blocks[block.0].stmts.push(stmt_id);
    block
  }

  fn build_stmt_list(&mut self, stmts: &[StmtId], mut preds: Vec<BlockId>) -> BuildResult {
    let mut entry = None;
    for stmt in stmts {
      let res = self.build_stmt(*stmt, preds);
      if entry.is_none() {
        entry = res.entry;
      }
      preds = res.exits;
    }
    BuildResult {
      entry,
      exits: preds,
    }
  }

  fn build_stmt(&mut self, stmt_id: StmtId, preds: Vec<BlockId>) -> BuildResult {
    let stmt = self.ast.stmt(stmt_id);
    match &stmt.kind {
      StmtKind::If { test, cons, alt } => {
        self.build_if(stmt_id, *test, *cons, alt.as_ref().copied(), preds)
      }
      StmtKind::While { test, body } => self.build_while(stmt_id, *test, *body, preds),
      StmtKind::DoWhile { body, test } => self.build_do_while(*body, *test, preds),
      StmtKind::For {
        init,
        test,
        update,
        body,
      } => self.build_for(init.clone(), *test, *update, *body, preds),
      StmtKind::Block(stmts) => {
        let stmts = stmts.clone();
        if stmts.is_empty() {
          BuildResult {
            entry: None,
            exits: preds,
          }
        } else {
          self.build_stmt_list(&stmts, preds)
        }
      }
      StmtKind::Return(_) => {
        let block = self.add_stmt_block(stmt_id);
        self.connect(&preds, block);
        let exit = self.cfg.exit;
        self.cfg.add_edge(block, exit, EdgeKind::Unconditional);
        BuildResult {
          entry: Some(block),
          exits: Vec::new(),
        }
      }
      StmtKind::Break => {
        let block = self.add_stmt_block(stmt_id);
        self.connect(&preds, block);
        if let Some(ctx) = self.breakables.last().copied() {
          self.cfg.add_edge(block, ctx.break_target, EdgeKind::Unconditional);
        }
        BuildResult {
          entry: Some(block),
          exits: Vec::new(),
        }
      }
      StmtKind::Continue => {
        let block = self.add_stmt_block(stmt_id);
        self.connect(&preds, block);
        let target = self
          .breakables
          .iter()
          .rev()
          .find_map(|ctx| ctx.continue_target);
        if let Some(target) = target {
          self.cfg.add_edge(block, target, EdgeKind::Unconditional);
        }
        BuildResult {
          entry: Some(block),
          exits: Vec::new(),
        }
      }
      StmtKind::Var(_) | StmtKind::Expr(_) | StmtKind::Func(_) | StmtKind::Empty => {
        let block = self.add_stmt_block(stmt_id);
        self.connect(&preds, block);
        BuildResult {
          entry: Some(block),
          exits: vec![block],
        }
      }
    }
  }

  /// Wire a conditional edge to a sub-statement, falling through straight
  /// to `fallthrough` when the sub-statement produced no blocks.
  fn branch_into(
    &mut self,
    cond: BlockId,
    kind: EdgeKind,
    res: &BuildResult,
    fallthrough: BlockId,
  ) {
    match res.entry {
      Some(entry) => {
        self.cfg.add_edge(cond, entry, kind);
        self.connect(&res.exits, fallthrough);
      }
      None => {
        self.cfg.add_edge(cond, fallthrough, kind);
      }
    }
  }

  fn build_if(
    &mut self,
    stmt_id: StmtId,
    test: ExprId,
    cons: StmtId,
    alt: Option<StmtId>,
    preds: Vec<BlockId>,
  ) -> BuildResult {
    let cond = self.add_stmt_block(stmt_id);
    self.cfg.blocks[cond.0].branch = Some(test);
    self.connect(&preds, cond);
    let after = self.cfg.add_block();

    let then_res = self.build_stmt(cons, Vec::new());
    self.branch_into(cond, EdgeKind::OnTrue, &then_res, after);

    match alt {
      Some(alt) => {
        let else_res = self.build_stmt(alt, Vec::new());
        self.branch_into(cond, EdgeKind::OnFalse, &else_res, after);
      }
      None => {
        self.cfg.add_edge(cond, after, EdgeKind::OnFalse);
      }
    }

    BuildResult {
      entry: Some(cond),
      exits: vec![after],
    }
  }

  fn build_while(
    &mut self,
    stmt_id: StmtId,
    test: ExprId,
    body: StmtId,
    preds: Vec<BlockId>,
  ) -> BuildResult {
    let header = self.add_stmt_block(stmt_id);
    self.cfg.blocks[header.0].branch = Some(test);
    self.connect(&preds, header);
    let after = self.cfg.add_block();

    self.breakables.push(BreakableContext {
      break_target: after,
      continue_target: Some(header),
    });
    let body_res = self.build_stmt(body, Vec::new());
    self.breakables.pop();

    self.branch_into(header, EdgeKind::OnTrue, &body_res, header);
    self.cfg.add_edge(header, after, EdgeKind::OnFalse);

    BuildResult {
      entry: Some(header),
      exits: vec![after],
    }
  }

  fn build_do_while(&mut self, body: StmtId, test: ExprId, preds: Vec<BlockId>) -> BuildResult {
    let test_block = self.cfg.add_block();
    self.cfg.blocks[test_block.0].kind = BlockKind::DoWhileTest { test };
    self.cfg.blocks[test_block.0].branch = Some(test);
    let after = self.cfg.add_block();

    self.breakables.push(BreakableContext {
      break_target: after,
      continue_target: Some(test_block),
    });
    let body_res = self.build_stmt(body, preds);
    self.breakables.pop();

    self.connect(&body_res.exits, test_block);
    match body_res.entry {
      Some(entry) => self.cfg.add_edge(test_block, entry, EdgeKind::OnTrue),
      None => self.cfg.add_edge(test_block, test_block, EdgeKind::OnTrue),
    }
    self.cfg.add_edge(test_block, after, EdgeKind::OnFalse);

    BuildResult {
      entry: body_res.entry.or(Some(test_block)),
      exits: vec![after],
    }
  }

  fn build_for(
    &mut self,
    init: Option<ForInit>,
    test: Option<ExprId>,
    update: Option<ExprId>,
    body: StmtId,
    preds: Vec<BlockId>,
  ) -> BuildResult {
    let init_block = self.cfg.add_block();
    if let Some(ForInit::Var(init_stmt)) = &init {
      self.cfg.blocks[init_block.0].stmts.push(*init_stmt);
    }
    self.cfg.blocks[init_block.0].kind = BlockKind::ForInit { init };
    self.connect(&preds, init_block);

    let test_block = self.cfg.add_block();
    self.cfg.blocks[test_block.0].kind = BlockKind::ForTest { test };
    self.cfg.blocks[test_block.0].branch = test;
    self.cfg.add_edge(init_block, test_block, EdgeKind::Unconditional);

    let update_block = self.cfg.add_block();
    self.cfg.blocks[update_block.0].kind = BlockKind::ForUpdate { update };
    self.cfg.add_edge(update_block, test_block, EdgeKind::Unconditional);

    let after = self.cfg.add_block();
    self.breakables.push(BreakableContext {
      break_target: after,
      continue_target: Some(update_block),
    });
    let body_res = self.build_stmt(body, Vec::new());
    self.breakables.pop();

    let body_kind = if test.is_some() {
      EdgeKind::OnTrue
    } else {
      EdgeKind::Unconditional
    };
    match body_res.entry {
      Some(entry) => {
        self.cfg.add_edge(test_block, entry, body_kind);
        self.connect(&body_res.exits, update_block);
      }
      None => {
        self.cfg.add_edge(test_block, update_block, body_kind);
      }
    }
    if test.is_some() {
      self.cfg.add_edge(test_block, after, EdgeKind::OnFalse);
    }

    BuildResult {
      entry: Some(init_block),
      exits: vec![after],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ast_js::AstBuilder;

  #[test]
  fn empty_body_connects_entry_to_exit() {
    let b = AstBuilder::new();
    let ast = b.script(vec![]);
    let cfg = ControlFlowGraph::build(&ast, &ast.root);
    assert_eq!(cfg.successors(cfg.entry()), &[Edge {
      to: cfg.exit(),
      kind: EdgeKind::Unconditional,
    }]);
  }

  #[test]
  fn if_statement_labels_both_branches() {
    let mut b = AstBuilder::new();
    let cond = b.name("x");
    let one = b.num(1.0);
    let then_stmt = b.expr_stmt(one);
    let stmt = b.if_(cond, then_stmt, None);
    let ast = b.script(vec![stmt]);
    let cfg = ControlFlowGraph::build(&ast, &ast.root);

    let cond_block = cfg
      .blocks
      .iter()
      .find(|block| block.branch.is_some())
      .expect("condition block");
    let kinds: Vec<EdgeKind> = cond_block.succs.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EdgeKind::OnTrue));
    assert!(kinds.contains(&EdgeKind::OnFalse));
  }

  #[test]
  fn while_loop_cycles_back_to_header() {
    let mut b = AstBuilder::new();
    let cond = b.name("x");
    let body = b.empty();
    let stmt = b.while_(cond, body);
    let ast = b.script(vec![stmt]);
    let cfg = ControlFlowGraph::build(&ast, &ast.root);

    let header = cfg
      .blocks
      .iter()
      .find(|block| block.branch.is_some())
      .expect("loop header");
    // The body block loops back to the header.
    let body_block = header
      .succs
      .iter()
      .find(|edge| edge.kind == EdgeKind::OnTrue)
      .unwrap()
      .to;
    assert!(cfg
      .successors(body_block)
      .iter()
      .any(|edge| edge.to == header.id));
  }

  #[test]
  fn for_loop_has_init_test_update_blocks() {
    let mut b = AstBuilder::new();
    let three = b.num(3.0);
    let init_stmt = b.var_("y", Some(three));
    let test = b.name("x");
    let x_ref = b.name("x");
    let y_ref = b.name("y");
    let update = b.assign(y_ref, x_ref);
    let body = b.block(vec![]);
    let stmt = b.for_(Some(ForInit::Var(init_stmt)), Some(test), Some(update), body);
    let ast = b.script(vec![stmt]);
    let cfg = ControlFlowGraph::build(&ast, &ast.root);

    assert!(cfg
      .blocks
      .iter()
      .any(|block| matches!(block.kind, BlockKind::ForInit { .. })));
    assert!(cfg
      .blocks
      .iter()
      .any(|block| matches!(block.kind, BlockKind::ForTest { .. })));
    assert!(cfg
      .blocks
      .iter()
      .any(|block| matches!(block.kind, BlockKind::ForUpdate { .. })));
  }

  #[test]
  fn predecessors_mirror_successors() {
    let mut b = AstBuilder::new();
    let one = b.num(1.0);
    let stmt = b.expr_stmt(one);
    let ast = b.script(vec![stmt]);
    let cfg = ControlFlowGraph::build(&ast, &ast.root);
    for block in &cfg.blocks {
      for edge in &block.succs {
        assert!(cfg
          .predecessors(edge.to)
          .iter()
          .any(|(from, kind)| *from == block.id && *kind == edge.kind));
      }
    }
  }
}
