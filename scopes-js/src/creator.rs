//! Typed scope construction.
//!
//! A two-phase walk per scope: phase 1 collects the declarations of the
//! scope (without descending into nested function bodies) in two passes:
//! name declarations first, then property forms, so a stub may precede
//! the declaration it attaches to. Phase 2 recurses into nested function
//! scopes once the enclosing declarations are settled; inner functions see
//! outer declared types.

use crate::adapter::DocAdapter;
use crate::scope::ScopeId;
use crate::scope::ScopeTree;
use ahash::AHashMap;
use ahash::AHashSet;
use ast_js::Ast;
use ast_js::DocInfo;
use ast_js::ExprId;
use ast_js::ExprKind;
use ast_js::ForInit;
use ast_js::FuncId;
use ast_js::NominalKind;
use ast_js::ObjectProp;
use ast_js::StmtId;
use ast_js::StmtKind;
use diagnostics::codes::CONSTRUCTOR_EXPECTED;
use diagnostics::codes::OBJECTLIT_EXPECTED;
use diagnostics::DiagnosticSink;
use diagnostics::FileId;
use diagnostics::Span;
use std::collections::VecDeque;
use tracing::debug;
use types_js::ObjectKind;
use types_js::TypeId;
use types_js::TypeRegistry;

/// One AST root fed into scope construction. Externs come first; properties
/// declared under an externs root are flagged extern-originated.
#[derive(Debug, Clone, Copy)]
pub struct RootInput<'a> {
  pub ast: &'a Ast,
  pub externs: bool,
}

/// Everything scope construction produces for the inference engine.
#[derive(Debug)]
pub struct ScopesResult {
  pub tree: ScopeTree,
  pub global: ScopeId,
  /// Lexical scope of every function body, keyed by (root index, func).
  pub func_scopes: AHashMap<(usize, FuncId), ScopeId>,
  /// The type created for every function literal.
  pub func_types: AHashMap<(usize, FuncId), TypeId>,
  /// Function bodies in scope-creation order (outer before inner), for
  /// deterministic per-scope inference.
  pub func_order: Vec<(usize, FuncId)>,
  /// Object-literal casts: expression decorated with a forced type.
  pub casts: AHashMap<(usize, ExprId), TypeId>,
}

struct PendingFunc {
  root: usize,
  func: FuncId,
  parent: ScopeId,
  fn_ty: TypeId,
  /// `this` inside the body; `None` means the global `this`.
  this_ty: Option<TypeId>,
  /// Collect `this.x` property declarations from the body.
  collect_this_props: bool,
}

pub struct ScopeCreator<'a> {
  registry: &'a TypeRegistry,
  tree: ScopeTree,
  func_scopes: AHashMap<(usize, FuncId), ScopeId>,
  func_types: AHashMap<(usize, FuncId), TypeId>,
  func_order: Vec<(usize, FuncId)>,
  casts: AHashMap<(usize, ExprId), TypeId>,
  claimed: AHashSet<(usize, FuncId)>,
  queue: VecDeque<PendingFunc>,
}

impl<'a> std::fmt::Debug for ScopeCreator<'a> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ScopeCreator").finish_non_exhaustive()
  }
}

struct RootCtx<'a> {
  index: usize,
  ast: &'a Ast,
  externs: bool,
}

impl<'a> RootCtx<'a> {
  fn span(&self, stmt: StmtId) -> Span {
    Span::new(FileId(self.index as u32), self.ast.stmt(stmt).range)
  }
}

impl<'a> ScopeCreator<'a> {
  /// Build the scope tree for a compilation unit. `roots` is usually the
  /// externs root followed by the source root.
  pub fn build(
    registry: &'a TypeRegistry,
    roots: &[RootInput<'_>],
    sink: &mut DiagnosticSink,
  ) -> ScopesResult {
    let mut creator = ScopeCreator {
      registry,
      tree: ScopeTree::new(),
      func_scopes: AHashMap::new(),
      func_types: AHashMap::new(),
      func_order: Vec::new(),
      casts: AHashMap::new(),
      claimed: AHashSet::new(),
      queue: VecDeque::new(),
    };
    let global = creator.tree.create_root(registry.natives().global_this);

    for (index, root) in roots.iter().enumerate() {
      let ctx = RootCtx {
        index,
        ast: root.ast,
        externs: root.externs,
      };
      creator.collect_scope(&ctx, global, &root.ast.root.clone(), sink);
    }

    creator.link_global_this();

    // Phase 2: breadth-first over function bodies, so every enclosing
    // scope's declarations are settled before an inner body is walked.
    while let Some(pending) = creator.queue.pop_front() {
      let root = &roots[pending.root];
      let ctx = RootCtx {
        index: pending.root,
        ast: root.ast,
        externs: root.externs,
      };
      creator.create_function_scope(&ctx, pending, sink);
    }

    ScopesResult {
      tree: creator.tree,
      global,
      func_scopes: creator.func_scopes,
      func_types: creator.func_types,
      func_order: creator.func_order,
      casts: creator.casts,
    }
  }

  /// If a `Window` constructor was declared anywhere, the global `this`
  /// sits below its instance: a subtype carrying all its properties, but
  /// not equal to it.
  fn link_global_this(&mut self) {
    let registry = self.registry;
    if let Some(window) = registry.get("Window") {
      if let Some(instance) = registry.instance_type(window) {
        registry.set_implicit_prototype(registry.natives().global_this, Some(instance));
        debug!("global this linked below Window");
      }
    }
  }

  // Phase 1.

  fn collect_scope(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    stmts: &[StmtId],
    sink: &mut DiagnosticSink,
  ) {
    for stmt in stmts {
      self.collect_names(ctx, scope, *stmt, sink);
    }
    for stmt in stmts {
      self.collect_props(ctx, scope, *stmt, sink);
    }
  }

  /// Pass A: bindings introduced by `var` and function declarations,
  /// descending through control flow but not into function bodies.
  fn collect_names(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let stmt = ctx.ast.stmt(stmt_id).clone();
    match &stmt.kind {
      StmtKind::Var(decls) => {
        for binding in decls {
          self.declare_binding(
            ctx,
            scope,
            &binding.name,
            binding.init,
            stmt.doc.as_ref(),
            stmt_id,
            sink,
          );
        }
      }
      StmtKind::Func(func_id) => {
        let func = ctx.ast.func(*func_id).clone();
        let Some(name) = func.name.clone() else {
          return;
        };
        let span = ctx.span(stmt_id);
        let adapter = self.adapter_for(stmt.doc.as_ref());
        match stmt.doc.as_ref().and_then(|d| d.kind) {
          Some(NominalKind::Constructor) | Some(NominalKind::Interface) => {
            let doc = stmt.doc.as_ref().unwrap();
            let fn_ty = adapter.nominal_function_type(&name, doc, Some(&func), span, sink);
            self.apply_heritage(&adapter, fn_ty, doc, span, sink);
            self.declare_prototype_var(scope, &name, fn_ty, stmt_id);
            self
              .tree
              .declare(self.registry, scope, &name, fn_ty, true, Some(stmt_id));
            self.enqueue_func(ctx, *func_id, scope, fn_ty, self.registry.instance_type(fn_ty), true);
            debug!(name = %name, "declared nominal function");
          }
          _ => {
            let fn_ty = adapter.function_type(stmt.doc.as_ref(), &func, None, span, sink);
            self
              .tree
              .declare(self.registry, scope, &name, fn_ty, true, Some(stmt_id));
            self.enqueue_func(ctx, *func_id, scope, fn_ty, None, false);
          }
        }
      }
      StmtKind::If { cons, alt, .. } => {
        self.collect_names(ctx, scope, *cons, sink);
        if let Some(alt) = alt {
          self.collect_names(ctx, scope, *alt, sink);
        }
      }
      StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
        self.collect_names(ctx, scope, *body, sink);
      }
      StmtKind::For { init, body, .. } => {
        if let Some(ForInit::Var(init_stmt)) = init {
          self.collect_names(ctx, scope, *init_stmt, sink);
        }
        self.collect_names(ctx, scope, *body, sink);
      }
      StmtKind::Block(stmts) => {
        for inner in stmts.clone() {
          self.collect_names(ctx, scope, inner, sink);
        }
      }
      _ => {}
    }
  }

  /// Pass B: property declarations, prototype forms, stubs, casts, and the
  /// function expressions reachable from this scope's statements.
  fn collect_props(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let stmt = ctx.ast.stmt(stmt_id).clone();
    match &stmt.kind {
      StmtKind::Expr(expr) => {
        self.collect_expr_form(ctx, scope, *expr, stmt.doc.as_ref(), stmt_id, sink);
        self.claim_func_exprs(ctx, scope, *expr, sink);
      }
      StmtKind::Var(decls) => {
        for binding in decls {
          if let Some(init) = binding.init {
            self.claim_func_exprs(ctx, scope, init, sink);
          }
        }
      }
      StmtKind::If { test, cons, alt } => {
        self.claim_func_exprs(ctx, scope, *test, sink);
        self.collect_props(ctx, scope, *cons, sink);
        if let Some(alt) = alt {
          self.collect_props(ctx, scope, *alt, sink);
        }
      }
      StmtKind::While { test, body } | StmtKind::DoWhile { body, test } => {
        self.claim_func_exprs(ctx, scope, *test, sink);
        self.collect_props(ctx, scope, *body, sink);
      }
      StmtKind::For {
        init,
        test,
        update,
        body,
      } => {
        match init {
          Some(ForInit::Var(init_stmt)) => self.collect_props(ctx, scope, *init_stmt, sink),
          Some(ForInit::Expr(expr)) => self.claim_func_exprs(ctx, scope, *expr, sink),
          None => {}
        }
        if let Some(test) = test {
          self.claim_func_exprs(ctx, scope, *test, sink);
        }
        if let Some(update) = update {
          self.claim_func_exprs(ctx, scope, *update, sink);
        }
        self.collect_props(ctx, scope, *body, sink);
      }
      StmtKind::Block(stmts) => {
        for inner in stmts.clone() {
          self.collect_props(ctx, scope, inner, sink);
        }
      }
      StmtKind::Return(Some(expr)) => {
        self.claim_func_exprs(ctx, scope, *expr, sink);
      }
      _ => {}
    }
  }

  fn collect_expr_form(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    expr_id: ExprId,
    doc: Option<&DocInfo>,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let expr = ctx.ast.expr(expr_id).clone();
    match &expr.kind {
      ExprKind::Assign { target, value } => {
        self.collect_assignment(ctx, scope, *target, *value, doc, stmt_id, sink);
      }
      ExprKind::Prop { .. } => {
        // A bare property reference is a stub declaration.
        self.collect_stub(ctx, scope, expr_id, doc, stmt_id, sink);
      }
      ExprKind::Call { callee, args } => {
        if ctx.ast.qualified_name(*callee).as_deref() == Some("goog.reflect.object") {
          self.collect_object_cast(ctx, scope, args, stmt_id, sink);
        }
      }
      _ => {}
    }
  }

  fn collect_assignment(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    target: ExprId,
    value: ExprId,
    doc: Option<&DocInfo>,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let span = ctx.span(stmt_id);
    let Some(qualified) = ctx.ast.qualified_name(target) else {
      return;
    };
    let Some((owner_name, prop)) = qualified.rsplit_once('.') else {
      // Plain `x = e`; inference handles it.
      return;
    };

    // `F.prototype = { ... }`: the literal's anonymous object slides in as
    // the implicit prototype of the canonical FunctionPrototype, which
    // keeps owning only the members added one at a time afterwards.
    if prop == "prototype" {
      if let ExprKind::Object(props) = &ctx.ast.expr(value).kind {
        if let Some(owner_ty) = self.qualified_type(scope, owner_name) {
          let owner_ty = registry.restrict_not_null_or_void(owner_ty);
          if let (Some(prototype), instance) = (
            registry.prototype_type(owner_ty),
            registry.instance_type(owner_ty),
          ) {
            let anon = registry.create_object(None, None);
            self.attach_literal_props(ctx, scope, anon, props, instance, stmt_id, sink);
            let old_proto = registry.implicit_prototype(prototype);
            registry.set_implicit_prototype(anon, old_proto.or(Some(registry.natives().object)));
            registry.set_implicit_prototype(prototype, Some(anon));
            return;
          }
        }
      }
    }

    // Nominal definitions and aliases on a qualified name.
    if let Some(kind) = doc.and_then(|d| d.kind) {
      let doc = doc.unwrap();
      let fn_or_enum = self.declare_nominal(ctx, scope, &qualified, kind, doc, value, stmt_id, sink);
      if let Some(ty) = fn_or_enum {
        if let Some(owner_ty) = self.qualified_type(scope, owner_name) {
          if self.is_attachable(owner_ty) {
            registry.declare_property(owner_ty, prop, ty, ctx.externs);
          }
        }
        self
          .tree
          .declare(registry, scope, &qualified, ty, true, Some(stmt_id));
      }
      return;
    }

    // Declared property: explicit @type, a function-shaped doc, or a
    // function literal on the right-hand side.
    let owner_ty = self.qualified_type(scope, owner_name);
    let value_expr = ctx.ast.expr(value).clone();
    let method_this = owner_ty.and_then(|ty| self.method_this(ty));
    let declared_ty = if let Some(ty_expr) = doc.and_then(|d| d.ty.as_ref()) {
      let adapter = self.adapter_for(doc);
      Some(adapter.realize(ty_expr, span, sink))
    } else if let ExprKind::Func(func_id) = value_expr.kind {
      let adapter = self.adapter_for(doc);
      let func = ctx.ast.func(func_id).clone();
      let fn_ty = adapter.function_type(doc, &func, method_this, span, sink);
      self.enqueue_func(ctx, func_id, scope, fn_ty, method_this, false);
      Some(fn_ty)
    } else if doc.map(|d| d.declares_type()).unwrap_or(false) {
      let adapter = self.adapter_for(doc);
      Some(adapter.stub_function_type(doc.unwrap(), method_this, span, sink))
    } else {
      None
    };

    match declared_ty {
      Some(ty) => {
        if let Some(owner_ty) = owner_ty {
          if self.is_attachable(owner_ty) {
            registry.declare_property(owner_ty, prop, ty, ctx.externs);
          }
        }
        self
          .tree
          .declare(registry, scope, &qualified, ty, true, Some(stmt_id));
      }
      None => {
        // Untyped assignment: a literal value infers the property now;
        // anything else is left to the inference engine.
        if let (Some(owner_ty), Some(lit)) = (owner_ty, self.literal_type(ctx, value)) {
          if self.is_attachable(owner_ty) {
            registry.infer_property(owner_ty, prop, lit);
            if ctx.externs {
              registry.mark_property_in_externs(owner_ty, prop);
            }
          }
        }
      }
    }
  }

  fn collect_stub(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    expr_id: ExprId,
    doc: Option<&DocInfo>,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let span = ctx.span(stmt_id);
    let Some(qualified) = ctx.ast.qualified_name(expr_id) else {
      return;
    };
    let Some((owner_name, prop)) = qualified.rsplit_once('.') else {
      return;
    };
    let owner_ty = self.qualified_type(scope, owner_name);

    let typed = doc.map(|d| d.declares_type()).unwrap_or(false);
    if typed {
      let doc = doc.unwrap();
      let adapter = self.adapter_for(Some(doc));
      let ty = match doc.ty.as_ref() {
        Some(expr) => adapter.realize(expr, span, sink),
        None => {
          let method_this = owner_ty.and_then(|ty| self.method_this(ty));
          adapter.stub_function_type(doc, method_this, span, sink)
        }
      };
      if let Some(owner_ty) = owner_ty {
        registry.declare_property(owner_ty, prop, ty, ctx.externs);
      }
      self
        .tree
        .declare(registry, scope, &qualified, ty, true, Some(stmt_id));
      return;
    }

    match owner_ty {
      Some(owner_ty) if ctx.externs => {
        // Untyped extern stubs register an inferred unknown slot.
        registry.infer_property(owner_ty, prop, registry.natives().unknown);
        registry.mark_property_in_externs(owner_ty, prop);
      }
      Some(owner_ty) => {
        // Source stubs with no annotation only reach the reverse index.
        registry.register_property_reference(owner_ty, prop);
      }
      None => {}
    }
  }

  /// `goog.reflect.object(Ctor, {...})` types the literal as the
  /// constructor's instance.
  fn collect_object_cast(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    args: &[ExprId],
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let span = ctx.span(stmt_id);
    let ctor_ty = args
      .first()
      .and_then(|arg| ctx.ast.qualified_name(*arg))
      .and_then(|name| self.qualified_type(scope, &name))
      .map(|ty| registry.restrict_not_null_or_void(ty));
    let instance = ctor_ty.filter(|ty| registry.is_constructor(*ty)).and_then(|ty| registry.instance_type(ty));
    let Some(instance) = instance else {
      sink.report(CONSTRUCTOR_EXPECTED.error("object-literal cast on a non-constructor", span));
      return;
    };
    match args.get(1) {
      Some(literal) if matches!(ctx.ast.expr(*literal).kind, ExprKind::Object(_)) => {
        self.casts.insert((ctx.index, *literal), instance);
      }
      _ => {
        sink.report(OBJECTLIT_EXPECTED.error("object-literal cast needs an object literal", span));
      }
    }
  }

  /// Create (or alias) a nominal for a declaration site named `name`.
  /// Returns the type to bind, or `None` if nothing was created.
  #[allow(clippy::too_many_arguments)]
  fn declare_nominal(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    name: &str,
    kind: NominalKind,
    doc: &DocInfo,
    init: ExprId,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) -> Option<TypeId> {
    let registry = self.registry;
    let span = ctx.span(stmt_id);
    let adapter = self.adapter_for(Some(doc));

    // Alias: a bare reference to an existing nominal of the matching kind
    // shares identity instead of forking a new type.
    if let Some(rhs_name) = ctx.ast.qualified_name(init) {
      if let Some(rhs_ty) = registry.get(&rhs_name) {
        let matches_kind = match kind {
          NominalKind::Constructor => registry.is_constructor(rhs_ty),
          NominalKind::Interface => registry.is_interface(rhs_ty),
          NominalKind::Enum => registry.enum_data(rhs_ty).is_some(),
        };
        if matches_kind {
          registry.register_alias(name, rhs_ty);
          debug!(alias = %name, target = %rhs_name, "registered nominal alias");
          return Some(rhs_ty);
        }
      }
    }

    match kind {
      NominalKind::Constructor | NominalKind::Interface => {
        let func_id = match &ctx.ast.expr(init).kind {
          ExprKind::Func(func_id) => Some(*func_id),
          _ => None,
        };
        let func = func_id.map(|id| ctx.ast.func(id).clone());
        let fn_ty = adapter.nominal_function_type(name, doc, func.as_ref(), span, sink);
        self.apply_heritage(&adapter, fn_ty, doc, span, sink);
        self.declare_prototype_var(scope, name, fn_ty, stmt_id);
        if let Some(func_id) = func_id {
          self.enqueue_func(ctx, func_id, scope, fn_ty, registry.instance_type(fn_ty), true);
        }
        debug!(name = %name, "declared nominal function");
        Some(fn_ty)
      }
      NominalKind::Enum => {
        let element = match doc.enum_element.as_ref() {
          Some(expr) => adapter.realize(expr, span, sink),
          None => registry.natives().number,
        };
        let enum_ty = registry.create_enum(name, element);
        let element_ty = registry.enum_element_type(enum_ty).unwrap();
        if let ExprKind::Object(props) = &ctx.ast.expr(init).kind {
          for member in props {
            registry.declare_property(enum_ty, &member.key, element_ty, ctx.externs);
          }
        }
        debug!(name = %name, "declared enum");
        Some(enum_ty)
      }
    }
  }

  /// `var` binding declaration (phase 1, pass A).
  #[allow(clippy::too_many_arguments)]
  fn declare_binding(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    name: &str,
    init: Option<ExprId>,
    doc: Option<&DocInfo>,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let span = ctx.span(stmt_id);

    if let (Some(kind), Some(init)) = (doc.and_then(|d| d.kind), init) {
      if let Some(ty) =
        self.declare_nominal(ctx, scope, name, kind, doc.unwrap(), init, stmt_id, sink)
      {
        self.tree.declare(registry, scope, name, ty, true, Some(stmt_id));
      }
      return;
    }
    if let Some(kind) = doc.and_then(|d| d.kind) {
      // A nominal doc with no initializer still materializes the type.
      if matches!(kind, NominalKind::Constructor | NominalKind::Interface) {
        let adapter = self.adapter_for(doc);
        let fn_ty = adapter.nominal_function_type(name, doc.unwrap(), None, span, sink);
        self.apply_heritage(&adapter, fn_ty, doc.unwrap(), span, sink);
        self.declare_prototype_var(scope, name, fn_ty, stmt_id);
        self.tree.declare(registry, scope, name, fn_ty, true, Some(stmt_id));
      }
      return;
    }

    if let Some(ty_expr) = doc.and_then(|d| d.ty.as_ref()) {
      let adapter = self.adapter_for(doc);
      let ty = adapter.realize(ty_expr, span, sink);
      self.tree.declare(registry, scope, name, ty, true, Some(stmt_id));
      return;
    }

    match init.map(|id| ctx.ast.expr(id).kind.clone()) {
      Some(ExprKind::Func(func_id)) => {
        let adapter = self.adapter_for(doc);
        let func = ctx.ast.func(func_id).clone();
        let fn_ty = adapter.function_type(doc, &func, None, span, sink);
        let declared = doc.map(|d| d.declares_type()).unwrap_or(false);
        self
          .tree
          .declare(registry, scope, name, fn_ty, declared, Some(stmt_id));
        self.enqueue_func(ctx, func_id, scope, fn_ty, None, false);
      }
      Some(ExprKind::Object(props)) => {
        // A namespace-style object literal: materialize the object now so
        // later qualified declarations have something to attach to.
        let obj_ty = registry.create_object(Some(name), None);
        self.attach_literal_props(ctx, scope, obj_ty, &props, None, stmt_id, sink);
        self
          .tree
          .declare(registry, scope, name, obj_ty, false, Some(stmt_id));
      }
      _ => {
        self.tree.declare(
          registry,
          scope,
          name,
          registry.natives().unknown,
          false,
          Some(stmt_id),
        );
      }
    }
  }

  // Phase 2.

  fn create_function_scope(
    &mut self,
    ctx: &RootCtx<'_>,
    pending: PendingFunc,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let func = ctx.ast.func(pending.func).clone();
    let this_ty = pending.this_ty.unwrap_or(registry.natives().global_this);
    let scope = self.tree.create_child(pending.parent, this_ty);
    self.func_scopes.insert((ctx.index, pending.func), scope);
    self.func_order.push((ctx.index, pending.func));

    let params = registry
      .function_data(pending.fn_ty)
      .map(|f| f.params)
      .unwrap_or_default();
    for (i, param_name) in func.params.iter().enumerate() {
      let ty = params
        .get(i)
        .map(|p| p.ty)
        .unwrap_or(registry.natives().unknown);
      let declared = ty != registry.natives().unknown;
      self.tree.declare(registry, scope, param_name, ty, declared, None);
    }

    if pending.collect_this_props {
      if let Some(instance) = registry.instance_type(pending.fn_ty) {
        for stmt in &func.body {
          self.collect_this_props(ctx, scope, instance, pending.fn_ty, *stmt, sink);
        }
      }
    }

    self.collect_scope(ctx, scope, &func.body, sink);
  }

  /// `this.x = e` and annotated `this.x;` stubs inside a constructor body
  /// declare instance properties.
  #[allow(clippy::too_many_arguments)]
  fn collect_this_props(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    instance: TypeId,
    fn_ty: TypeId,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let stmt = ctx.ast.stmt(stmt_id).clone();
    let span = ctx.span(stmt_id);
    match &stmt.kind {
      StmtKind::Expr(expr_id) => {
        let expr = ctx.ast.expr(*expr_id).clone();
        let (target, value) = match expr.kind {
          ExprKind::Assign { target, value } => (target, Some(value)),
          ExprKind::Prop { .. } => (*expr_id, None),
          _ => return,
        };
        let ExprKind::Prop { obj, name } = ctx.ast.expr(target).kind.clone() else {
          return;
        };
        if !matches!(ctx.ast.expr(obj).kind, ExprKind::This) {
          return;
        }

        let doc = stmt.doc.as_ref();
        if doc.map(|d| d.declares_type()).unwrap_or(false) {
          let adapter = self.adapter_for(doc);
          let doc = doc.unwrap();
          let ty = match doc.ty.as_ref() {
            Some(expr) => adapter.realize(expr, span, sink),
            None => adapter.stub_function_type(doc, registry.instance_type(fn_ty), span, sink),
          };
          registry.declare_property(instance, &name, ty, ctx.externs);
          return;
        }
        match value.map(|v| (v, ctx.ast.expr(v).kind.clone())) {
          Some((_, ExprKind::Func(func_id))) => {
            let adapter = self.adapter_for(doc);
            let func = ctx.ast.func(func_id).clone();
            let method_ty =
              adapter.function_type(doc, &func, registry.instance_type(fn_ty), span, sink);
            registry.declare_property(instance, &name, method_ty, ctx.externs);
            self.enqueue_func(ctx, func_id, scope, method_ty, registry.instance_type(fn_ty), false);
          }
          Some((value_id, _)) => {
            let ty = self
              .literal_type(ctx, value_id)
              .unwrap_or(registry.natives().unknown);
            registry.infer_property(instance, &name, ty);
            if ctx.externs {
              registry.mark_property_in_externs(instance, &name);
            }
          }
          None => {
            // Untyped stub on `this`.
            registry.register_property_reference(instance, &name);
          }
        }
      }
      StmtKind::If { cons, alt, .. } => {
        self.collect_this_props(ctx, scope, instance, fn_ty, *cons, sink);
        if let Some(alt) = alt {
          self.collect_this_props(ctx, scope, instance, fn_ty, *alt, sink);
        }
      }
      StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
        self.collect_this_props(ctx, scope, instance, fn_ty, *body, sink);
      }
      StmtKind::For { body, .. } => {
        self.collect_this_props(ctx, scope, instance, fn_ty, *body, sink);
      }
      StmtKind::Block(stmts) => {
        for inner in stmts.clone() {
          self.collect_this_props(ctx, scope, instance, fn_ty, inner, sink);
        }
      }
      _ => {}
    }
  }

  // Helpers.

  fn adapter_for(&self, doc: Option<&DocInfo>) -> DocAdapter<'a> {
    match doc {
      Some(doc) if !doc.templates.is_empty() => {
        DocAdapter::with_templates(self.registry, doc.templates.clone())
      }
      _ => DocAdapter::new(self.registry),
    }
  }

  fn apply_heritage(
    &self,
    adapter: &DocAdapter<'_>,
    fn_ty: TypeId,
    doc: &DocInfo,
    span: Span,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    if let Some(extends) = doc.extends.as_ref() {
      let base = adapter.realize_nominal(extends, span, sink);
      if let Some(prototype) = registry.prototype_type(fn_ty) {
        registry.set_implicit_prototype(prototype, Some(base));
      }
    }
    for iface in &doc.implements {
      let iface_ty = adapter.realize_nominal(iface, span, sink);
      registry.add_implemented_interface(fn_ty, iface_ty);
    }
  }

  /// Every constructor's `prototype` is also reachable as a qualified scope
  /// entry.
  fn declare_prototype_var(&mut self, scope: ScopeId, name: &str, fn_ty: TypeId, stmt: StmtId) {
    if let Some(prototype) = self.registry.prototype_type(fn_ty) {
      self.tree.declare(
        self.registry,
        scope,
        &format!("{name}.prototype"),
        prototype,
        true,
        Some(stmt),
      );
    }
  }

  fn enqueue_func(
    &mut self,
    ctx: &RootCtx<'_>,
    func_id: FuncId,
    parent: ScopeId,
    fn_ty: TypeId,
    this_ty: Option<TypeId>,
    collect_this_props: bool,
  ) {
    self.func_types.insert((ctx.index, func_id), fn_ty);
    if !self.claimed.insert((ctx.index, func_id)) {
      return;
    }
    self.queue.push_back(PendingFunc {
      root: ctx.index,
      func: func_id,
      parent,
      fn_ty,
      this_ty,
      collect_this_props,
    });
  }

  /// Register scopes (with the default `this`) for function expressions not
  /// claimed by any declaration form, e.g. callbacks passed as arguments.
  fn claim_func_exprs(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    expr_id: ExprId,
    sink: &mut DiagnosticSink,
  ) {
    let expr = ctx.ast.expr(expr_id).clone();
    match &expr.kind {
      ExprKind::Func(func_id) => {
        if self.claimed.contains(&(ctx.index, *func_id)) {
          return;
        }
        let adapter = self.adapter_for(expr.doc.as_ref());
        let func = ctx.ast.func(*func_id).clone();
        let span = Span::new(FileId(ctx.index as u32), expr.range);
        let fn_ty = adapter.function_type(expr.doc.as_ref(), &func, None, span, sink);
        self.enqueue_func(ctx, *func_id, scope, fn_ty, None, false);
      }
      ExprKind::Assign { target, value } => {
        self.claim_func_exprs(ctx, scope, *target, sink);
        self.claim_func_exprs(ctx, scope, *value, sink);
      }
      ExprKind::Call { callee, args } | ExprKind::New { callee, args } => {
        self.claim_func_exprs(ctx, scope, *callee, sink);
        for arg in args {
          self.claim_func_exprs(ctx, scope, *arg, sink);
        }
      }
      ExprKind::Bin { lhs, rhs, .. } => {
        self.claim_func_exprs(ctx, scope, *lhs, sink);
        self.claim_func_exprs(ctx, scope, *rhs, sink);
      }
      ExprKind::Un { operand, .. } => {
        self.claim_func_exprs(ctx, scope, *operand, sink);
      }
      ExprKind::Prop { obj, .. } => {
        self.claim_func_exprs(ctx, scope, *obj, sink);
      }
      ExprKind::Object(props) => {
        for prop in props.clone() {
          self.claim_func_exprs(ctx, scope, prop.value, sink);
        }
      }
      _ => {}
    }
  }

  /// Populate an object from a literal: annotated members and function
  /// literals declare, plain value literals infer. `method_this` types the
  /// `this` of member function literals (the owner's instance for
  /// prototype literals).
  #[allow(clippy::too_many_arguments)]
  fn attach_literal_props(
    &mut self,
    ctx: &RootCtx<'_>,
    scope: ScopeId,
    obj_ty: TypeId,
    props: &[ObjectProp],
    method_this: Option<TypeId>,
    stmt_id: StmtId,
    sink: &mut DiagnosticSink,
  ) {
    let registry = self.registry;
    let span = ctx.span(stmt_id);
    for prop in props {
      let value = ctx.ast.expr(prop.value).clone();
      let doc = prop.doc.as_ref().or(value.doc.as_ref());
      if let Some(ty_expr) = doc.and_then(|d| d.ty.as_ref()) {
        let adapter = self.adapter_for(doc);
        let ty = adapter.realize(ty_expr, span, sink);
        registry.declare_property(obj_ty, &prop.key, ty, ctx.externs);
        continue;
      }
      match &value.kind {
        ExprKind::Func(func_id) => {
          let adapter = self.adapter_for(doc);
          let func = ctx.ast.func(*func_id).clone();
          let fn_ty = adapter.function_type(doc, &func, method_this, span, sink);
          registry.declare_property(obj_ty, &prop.key, fn_ty, ctx.externs);
          self.enqueue_func(ctx, *func_id, scope, fn_ty, method_this, false);
        }
        _ => {
          if let Some(lit) = self.literal_type(ctx, prop.value) {
            registry.infer_property(obj_ty, &prop.key, lit);
            if ctx.externs {
              registry.mark_property_in_externs(obj_ty, &prop.key);
            }
          }
        }
      }
    }
  }

  fn literal_type(&self, ctx: &RootCtx<'_>, expr: ExprId) -> Option<TypeId> {
    let n = self.registry.natives();
    match &ctx.ast.expr(expr).kind {
      ExprKind::Num(_) => Some(n.number),
      ExprKind::Str(_) => Some(n.string),
      ExprKind::Bool(_) => Some(n.boolean),
      ExprKind::Null => Some(n.null),
      ExprKind::Name(name) if name == "undefined" => Some(n.void),
      _ => None,
    }
  }

  /// The method `this` for properties declared on a prototype or instance.
  fn method_this(&self, owner_ty: TypeId) -> Option<TypeId> {
    let registry = self.registry;
    let owner_ty = registry.restrict_not_null_or_void(owner_ty);
    let view = registry.object_view(owner_ty)?;
    match view.kind {
      ObjectKind::FunctionPrototype | ObjectKind::Instance => {
        let ctor = view.ctor?;
        registry.instance_type(ctor)
      }
      _ => None,
    }
  }

  /// Whether qualified declarations may add slots to this owner. Natives,
  /// instances, and records only receive scope entries, except through the
  /// dedicated stub and `this` paths.
  fn is_attachable(&self, owner_ty: TypeId) -> bool {
    let owner_ty = self
      .registry
      .restrict_not_null_or_void(owner_ty);
    match self.registry.object_view(owner_ty) {
      Some(view) => !matches!(view.kind, ObjectKind::Native | ObjectKind::Instance),
      None => false,
    }
  }

  /// The static type of a dotted chain, for owner resolution during
  /// declaration collection.
  fn qualified_type(&self, scope: ScopeId, qualified: &str) -> Option<TypeId> {
    let registry = self.registry;
    if qualified == "this" {
      return Some(self.tree.this_type(scope));
    }
    if let Some(var) = self.tree.lookup(scope, qualified) {
      return Some(var.ty);
    }
    if let Some(ty) = registry.get(qualified) {
      return Some(ty);
    }
    let (head, segment) = qualified.rsplit_once('.')?;
    let base = self.qualified_type(scope, head)?;
    let base = registry.restrict_not_null_or_void(base);
    if segment == "prototype" {
      if let Some(prototype) = registry.prototype_type(base) {
        return Some(prototype);
      }
    }
    let ty = registry.find_property_type(base, segment);
    Some(ty)
  }
}
