//! The per-compilation-unit facade: typed scope construction followed by
//! flow-sensitive inference over every scope.

use crate::cfg::ControlFlowGraph;
use crate::infer::TypeInference;
use ahash::AHashMap;
use ast_js::Ast;
use ast_js::ExprId;
use ast_js::FuncId;
use diagnostics::Diagnostic;
use diagnostics::DiagnosticSink;
use scopes_js::RootInput;
use scopes_js::ScopeCreator;
use scopes_js::ScopeId;
use scopes_js::ScopeTree;
use scopes_js::Var;
use std::sync::Arc;
use tracing::debug;
use types_js::TypeId;
use types_js::TypeRegistry;

/// Which AST root an id belongs to. Externs and sources have separate
/// arenas but share the global scope and the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Root {
  Externs,
  Source,
}

impl Root {
  fn index(self) -> usize {
    match self {
      Root::Externs => 0,
      Root::Source => 1,
    }
  }
}

/// The result of analyzing one externs + source pair: the populated scope
/// tree, the registry, per-expression type decorations, and the
/// accumulated diagnostics.
#[derive(Debug)]
pub struct Analysis {
  pub registry: Arc<TypeRegistry>,
  pub scopes: ScopeTree,
  pub global: ScopeId,
  pub func_scopes: AHashMap<(usize, FuncId), ScopeId>,
  types: AHashMap<(usize, ExprId), TypeId>,
  pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
  /// Run scope construction and inference over an externs + source pair.
  ///
  /// Order per the execution model: every scope's typed creation completes
  /// before any inference runs; scopes are then inferred outermost-first
  /// so inner functions observe finalized outer types.
  pub fn analyze(externs: &Ast, source: &Ast) -> Analysis {
    let registry = TypeRegistry::new();
    let mut sink = DiagnosticSink::new();
    let scopes = ScopeCreator::build(
      &registry,
      &[
        RootInput {
          ast: externs,
          externs: true,
        },
        RootInput {
          ast: source,
          externs: false,
        },
      ],
      &mut sink,
    );

    let mut tree = scopes.tree;
    let asts: [&Ast; 2] = [externs, source];
    let mut types: AHashMap<(usize, ExprId), TypeId> = AHashMap::new();

    for (index, &ast) in asts.iter().enumerate() {
      let cfg = ControlFlowGraph::build(ast, &ast.root);
      let inference = TypeInference::new(
        &registry,
        ast,
        index,
        &cfg,
        &mut tree,
        scopes.global,
        &scopes.func_types,
        &scopes.casts,
      );
      for (expr, ty) in inference.analyze() {
        types.insert((index, expr), ty);
      }
      debug!(root = index, "global inference finished");
    }

    for (index, func_id) in scopes.func_order.iter().copied() {
      let ast = asts[index];
      let scope = scopes.func_scopes[&(index, func_id)];
      let body = ast.func(func_id).body.clone();
      let cfg = ControlFlowGraph::build(ast, &body);
      let inference = TypeInference::new(
        &registry,
        ast,
        index,
        &cfg,
        &mut tree,
        scope,
        &scopes.func_types,
        &scopes.casts,
      );
      for (expr, ty) in inference.analyze() {
        types.insert((index, expr), ty);
      }
    }

    Analysis {
      registry,
      scopes: tree,
      global: scopes.global,
      func_scopes: scopes.func_scopes,
      types,
      diagnostics: sink.into_sorted(),
    }
  }

  /// The inferred type decoration of an expression.
  pub fn type_of(&self, root: Root, expr: ExprId) -> Option<TypeId> {
    self.types.get(&(root.index(), expr)).copied()
  }

  /// Contractual textual form of an expression's type.
  pub fn type_string(&self, root: Root, expr: ExprId) -> Option<String> {
    self
      .type_of(root, expr)
      .map(|ty| self.registry.display(ty).to_string())
  }

  pub fn global_var(&self, name: &str) -> Option<&Var> {
    self.scopes.lookup(self.global, name)
  }

  /// Contractual textual form of a global var's finalized type.
  pub fn var_type_string(&self, name: &str) -> Option<String> {
    self
      .global_var(name)
      .map(|var| self.registry.display(var.ty).to_string())
  }

  pub fn scope_of_func(&self, root: Root, func: FuncId) -> Option<ScopeId> {
    self.func_scopes.get(&(root.index(), func)).copied()
  }

  /// A var looked up from a function scope, walking outward.
  pub fn var_in_scope(&self, scope: ScopeId, name: &str) -> Option<&Var> {
    self.scopes.lookup(scope, name)
  }
}
