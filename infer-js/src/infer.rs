//! The monotone dataflow engine.
//!
//! Worklist iteration over the CFG to fixpoint. The lattice point per
//! program point is a name-to-type environment; merges join element-wise
//! with the registry's union, whose canonicalization bounds the lattice
//! height for any one program. The transfer function evaluates expressions
//! post-order, decorating each with its inferred type.

use crate::cfg::BlockKind;
use crate::cfg::BasicBlock;
use crate::cfg::BlockId;
use crate::cfg::ControlFlowGraph;
use crate::cfg::EdgeKind;
use crate::env::FlowEnv;
use crate::rai::ReverseInterpreter;
use ahash::AHashMap;
use ast_js::Ast;
use ast_js::BinOp;
use ast_js::ExprId;
use ast_js::ExprKind;
use ast_js::ForInit;
use ast_js::FuncId;
use ast_js::StmtKind;
use ast_js::UnOp;
use scopes_js::ScopeId;
use scopes_js::ScopeTree;
use std::collections::VecDeque;
use tracing::debug;
use tracing::warn;
use types_js::FunctionData;
use types_js::ObjectKind;
use types_js::TypeData;
use types_js::TypeId;
use types_js::TypeRegistry;

/// Iteration backstop. The join lattice is finite for any one program, so
/// this only trips on an internal monotonicity bug.
const MAX_FIXPOINT_STEPS: usize = 10_000;

pub struct TypeInference<'a> {
  registry: &'a TypeRegistry,
  ast: &'a Ast,
  root: usize,
  cfg: &'a ControlFlowGraph,
  tree: &'a mut ScopeTree,
  scope: ScopeId,
  func_types: &'a AHashMap<(usize, FuncId), TypeId>,
  casts: &'a AHashMap<(usize, ExprId), TypeId>,
  types: AHashMap<ExprId, TypeId>,
  /// Running join of every type assigned to each inferred var.
  assigned: AHashMap<String, TypeId>,
}

impl<'a> std::fmt::Debug for TypeInference<'a> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TypeInference")
      .field("scope", &self.scope)
      .finish_non_exhaustive()
  }
}

impl<'a> TypeInference<'a> {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    registry: &'a TypeRegistry,
    ast: &'a Ast,
    root: usize,
    cfg: &'a ControlFlowGraph,
    tree: &'a mut ScopeTree,
    scope: ScopeId,
    func_types: &'a AHashMap<(usize, FuncId), TypeId>,
    casts: &'a AHashMap<(usize, ExprId), TypeId>,
  ) -> Self {
    Self {
      registry,
      ast,
      root,
      cfg,
      tree,
      scope,
      func_types,
      casts,
      types: AHashMap::new(),
      assigned: AHashMap::new(),
    }
  }

  /// Run to fixpoint, finalize inferred var types, and return the
  /// per-expression decorations.
  pub fn analyze(mut self) -> AHashMap<ExprId, TypeId> {
    let mut in_envs: AHashMap<BlockId, FlowEnv> = AHashMap::new();
    in_envs.insert(self.cfg.entry(), FlowEnv::new());
    let mut worklist: VecDeque<BlockId> = VecDeque::new();
    worklist.push_back(self.cfg.entry());

    let mut steps = 0usize;
    while let Some(block_id) = worklist.pop_front() {
      steps += 1;
      if steps > MAX_FIXPOINT_STEPS {
        warn!("fixpoint iteration limit exceeded; results may be incomplete");
        break;
      }
      let mut env = in_envs.get(&block_id).cloned().unwrap_or_default();
      let block = self.cfg.block(block_id).clone();
      self.transfer_block(&block, &mut env);

      for edge in &block.succs {
        let out = match edge.kind {
          EdgeKind::Unconditional => env.clone(),
          EdgeKind::OnTrue => self.refined(&env, block.branch, true),
          EdgeKind::OnFalse => self.refined(&env, block.branch, false),
        };
        let changed = match in_envs.get_mut(&edge.to) {
          Some(existing) => existing.merge_from(&out, self.registry),
          None => {
            in_envs.insert(edge.to, out);
            true
          }
        };
        if changed && !worklist.contains(&edge.to) {
          worklist.push_back(edge.to);
        }
      }
    }
    debug!(steps, "inference reached fixpoint");

    self.finalize();
    self.types
  }

  /// Set every inferred var of this scope to the join over its observed
  /// assignments. Declared vars are never widened.
  fn finalize(&mut self) {
    let inferred: Vec<String> = self
      .tree
      .vars(self.scope)
      .filter(|var| !var.declared)
      .map(|var| var.name.clone())
      .collect();
    for name in inferred {
      if let Some(ty) = self.assigned.get(&name).copied() {
        self.tree.set_var_type(self.scope, &name, ty);
      }
    }
  }

  fn transfer_block(&mut self, block: &BasicBlock, env: &mut FlowEnv) {
    match &block.kind {
      BlockKind::ForInit {
        init: Some(ForInit::Expr(expr)),
      } => {
        self.eval(*expr, env);
      }
      BlockKind::ForTest { test: Some(test) } => {
        self.eval(*test, env);
      }
      BlockKind::ForUpdate {
        update: Some(update),
      } => {
        self.eval(*update, env);
      }
      BlockKind::DoWhileTest { test } => {
        self.eval(*test, env);
      }
      _ => {}
    }
    for stmt in &block.stmts {
      let kind = self.ast.stmt(*stmt).kind.clone();
      match kind {
        StmtKind::Var(decls) => {
          for binding in decls {
            if let Some(init) = binding.init {
              let ty = self.eval_var_init(&binding.name, init, env);
              self.assign_name(&binding.name, ty, env);
            }
          }
        }
        StmtKind::Expr(expr) => {
          self.eval(expr, env);
        }
        StmtKind::Return(Some(expr)) => {
          self.eval(expr, env);
        }
        StmtKind::If { test, .. } | StmtKind::While { test, .. } => {
          self.eval(test, env);
        }
        _ => {}
      }
    }
  }

  /// An initializer that is an object literal adopts the type the scope
  /// creator already materialized for the binding (namespaces, enums),
  /// instead of minting a second object.
  fn eval_var_init(&mut self, name: &str, init: ExprId, env: &mut FlowEnv) -> TypeId {
    if matches!(self.ast.expr(init).kind, ExprKind::Object(_)) {
      if let Some(var) = self.tree.lookup(self.scope, name) {
        let ty = var.ty;
        if self.registry.is_object_like(ty) {
          self.types.insert(init, ty);
          return ty;
        }
      }
    }
    self.eval(init, env)
  }

  fn assign_name(&mut self, name: &str, ty: TypeId, env: &mut FlowEnv) {
    let Some(var) = self.tree.lookup(self.scope, name) else {
      return;
    };
    // A declared var's type is fixed; assignment compatibility is a
    // checking pass's concern.
    if var.declared {
      return;
    }
    let joined = match env.get(name) {
      Some(current) => self.registry.join(current, ty),
      None => ty,
    };
    env.set(name, joined);
    let accumulated = match self.assigned.get(name) {
      Some(previous) => self.registry.join(*previous, ty),
      None => ty,
    };
    self.assigned.insert(name.to_string(), accumulated);
  }

  fn refined(&mut self, env: &FlowEnv, branch: Option<ExprId>, outcome: bool) -> FlowEnv {
    let Some(branch) = branch else {
      return env.clone();
    };
    let rai = ReverseInterpreter::new(self.registry, self.ast);
    let bindings = {
      let tree = &*self.tree;
      let scope = self.scope;
      let lookup =
        |name: &str| env.get(name).or_else(|| tree.lookup(scope, name).map(|v| v.ty));
      rai.refine(branch, outcome, &lookup)
    };
    let mut out = env.clone();
    for (name, ty) in bindings {
      out.set(&name, ty);
    }
    out
  }

  fn eval(&mut self, expr_id: ExprId, env: &mut FlowEnv) -> TypeId {
    let registry = self.registry;
    let n = registry.natives();
    let kind = self.ast.expr(expr_id).kind.clone();
    let result = match kind {
      ExprKind::Num(_) => n.number,
      ExprKind::Str(_) => n.string,
      ExprKind::Bool(_) => n.boolean,
      ExprKind::Null => n.null,
      ExprKind::This => self.tree.this_type(self.scope),
      ExprKind::Name(name) => {
        if name == "undefined" {
          n.void
        } else if let Some(ty) = env.get(&name) {
          ty
        } else if let Some(var) = self.tree.lookup(self.scope, &name) {
          var.ty
        } else {
          n.unknown
        }
      }
      ExprKind::Object(props) => {
        // Stable across fixpoint revisits: reuse the type minted on the
        // first visit so loop bodies cannot grow unions without bound.
        let obj = match self.types.get(&expr_id).copied() {
          Some(existing) if registry.is_object_like(existing) => existing,
          _ => registry.create_object(None, None),
        };
        for prop in props {
          let value_ty = self.eval(prop.value, env);
          if !registry.is_property_declared(obj, &prop.key) {
            registry.infer_property(obj, &prop.key, value_ty);
          }
        }
        obj
      }
      ExprKind::Prop { obj, name } => {
        let obj_ty = self.eval(obj, env);
        let base = registry.restrict_not_null_or_void(obj_ty);
        if name == "prototype" {
          match registry.prototype_type(base) {
            Some(prototype) => prototype,
            None => registry.find_property_type(obj_ty, &name),
          }
        } else {
          registry.find_property_type(obj_ty, &name)
        }
      }
      ExprKind::Assign { target, value } => {
        let value_ty = self.eval(value, env);
        match self.ast.expr(target).kind.clone() {
          ExprKind::Name(name) => {
            self.types.insert(target, value_ty);
            self.assign_name(&name, value_ty, env);
          }
          ExprKind::Prop { obj, name } => {
            let obj_ty = self.eval(obj, env);
            self.types.insert(target, value_ty);
            // The canonical `prototype` slot is structural, never an
            // inferred property.
            if name != "prototype" {
              if let Some(owner) = registry.dereference(obj_ty) {
                if self.owner_accepts_inferred(owner)
                  && !registry.is_property_declared(owner, &name)
                {
                  registry.infer_property(owner, &name, value_ty);
                }
              }
            }
          }
          _ => {}
        }
        value_ty
      }
      ExprKind::Call { callee, args } => {
        let callee_ty = self.eval(callee, env);
        let arg_tys: Vec<TypeId> = args.iter().map(|arg| self.eval(*arg, env)).collect();
        match registry.function_data(registry.restrict_not_null_or_void(callee_ty)) {
          Some(function) => self.call_return(&function, &arg_tys),
          None => n.unknown,
        }
      }
      ExprKind::New { callee, args } => {
        let callee_ty = self.eval(callee, env);
        for arg in args {
          self.eval(arg, env);
        }
        let callee_ty = registry.restrict_not_null_or_void(callee_ty);
        match registry.instance_type(callee_ty) {
          Some(instance) if registry.is_constructor(callee_ty) => instance,
          _ => n.unknown,
        }
      }
      ExprKind::Bin { op, lhs, rhs } => {
        let lhs_ty = self.eval(lhs, env);
        let rhs_ty = self.eval(rhs, env);
        self.binary_type(op, lhs_ty, rhs_ty)
      }
      ExprKind::Un { op, operand } => {
        self.eval(operand, env);
        match op {
          UnOp::Not => n.boolean,
          UnOp::TypeOf => n.string,
          UnOp::Neg => n.number,
          UnOp::Void => n.void,
        }
      }
      ExprKind::Func(func_id) => self
        .func_types
        .get(&(self.root, func_id))
        .copied()
        .unwrap_or(n.unknown),
    };

    let result = match self.casts.get(&(self.root, expr_id)) {
      Some(cast) => *cast,
      None => result,
    };
    self.types.insert(expr_id, result);
    result
  }

  fn binary_type(&self, op: BinOp, lhs: TypeId, rhs: TypeId) -> TypeId {
    let registry = self.registry;
    let n = registry.natives();
    if op.is_comparison() {
      return n.boolean;
    }
    match op {
      // `a && b` is `a` when falsy, `b` otherwise; dually for `||`.
      BinOp::And => registry.join(registry.restrict_by_truthy(lhs, false), rhs),
      BinOp::Or => registry.join(registry.restrict_by_truthy(lhs, true), rhs),
      BinOp::Add => {
        if self.is_unknown(lhs) || self.is_unknown(rhs) {
          n.unknown
        } else if self.is_stringish(lhs) || self.is_stringish(rhs) {
          n.string
        } else {
          n.number
        }
      }
      _ => n.number,
    }
  }

  fn is_unknown(&self, ty: TypeId) -> bool {
    matches!(
      self.registry.data(self.registry.resolve(ty)),
      TypeData::Unknown | TypeData::All | TypeData::Named(_)
    )
  }

  fn is_stringish(&self, ty: TypeId) -> bool {
    self
      .registry
      .is_subtype(ty, self.registry.natives().string_value_or_object)
  }

  fn owner_accepts_inferred(&self, owner: TypeId) -> bool {
    match self.registry.object_view(owner) {
      Some(view) => !matches!(view.kind, ObjectKind::Native),
      None => false,
    }
  }

  /// Type a call: bind each `@template` parameter to the meet of the
  /// argument types matched against it, then substitute through the
  /// declared return type.
  fn call_return(&self, function: &FunctionData, args: &[TypeId]) -> TypeId {
    if function.templates.is_empty() {
      return function.ret;
    }
    let mut bindings: AHashMap<String, TypeId> = AHashMap::new();
    for (param, arg) in function.params.iter().zip(args.iter()) {
      self.bind_template(param.ty, *arg, &mut bindings);
    }
    self.substitute(function.ret, &bindings)
  }

  fn bind_template(&self, param_ty: TypeId, arg_ty: TypeId, bindings: &mut AHashMap<String, TypeId>) {
    let registry = self.registry;
    match registry.data(param_ty) {
      TypeData::Template(name) => {
        let entry = bindings.entry(name).or_insert(arg_ty);
        *entry = registry.meet(*entry, arg_ty);
      }
      TypeData::Union(alternates) => {
        for alt in alternates {
          self.bind_template(alt, arg_ty, bindings);
        }
      }
      TypeData::Function(param_fn) => {
        if let Some(arg_fn) = registry.function_data(arg_ty) {
          if let (Some(param_this), Some(arg_this)) = (param_fn.this_ty, arg_fn.this_ty) {
            self.bind_template(param_this, arg_this, bindings);
          }
          self.bind_template(param_fn.ret, arg_fn.ret, bindings);
        }
      }
      _ => {}
    }
  }

  fn substitute(&self, ty: TypeId, bindings: &AHashMap<String, TypeId>) -> TypeId {
    let registry = self.registry;
    match registry.data(ty) {
      TypeData::Template(name) => bindings
        .get(&name)
        .copied()
        .unwrap_or(registry.natives().unknown),
      TypeData::Union(alternates) => {
        let substituted: Vec<TypeId> = alternates
          .into_iter()
          .map(|alt| self.substitute(alt, bindings))
          .collect();
        registry.create_union(substituted)
      }
      _ => ty,
    }
  }
}
