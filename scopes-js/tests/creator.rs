use ast_js::AstBuilder;
use ast_js::DocInfo;
use ast_js::TypeExpr;
use diagnostics::DiagnosticSink;
use scopes_js::RootInput;
use scopes_js::ScopeCreator;
use scopes_js::ScopesResult;
use types_js::TypeRegistry;

fn build_one(ast: &ast_js::Ast, registry: &TypeRegistry) -> (ScopesResult, DiagnosticSink) {
  let mut sink = DiagnosticSink::new();
  let result = ScopeCreator::build(
    registry,
    &[RootInput {
      ast,
      externs: false,
    }],
    &mut sink,
  );
  (result, sink)
}

#[test]
fn constructor_declaration_creates_the_nominal_family() {
  // /** @constructor */ function Foo() {}
  let mut b = AstBuilder::new();
  let func = b.func(Some("Foo"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let ast = b.script(vec![decl]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let var = result.tree.lookup(result.global, "Foo").unwrap();
  assert!(var.declared);
  assert!(registry.is_constructor(var.ty));
  assert_eq!(registry.display(var.ty).to_string(), "function (this:Foo): ?");

  let instance = registry.instance_type(var.ty).unwrap();
  let prototype = registry.prototype_type(var.ty).unwrap();
  assert_eq!(registry.display(instance).to_string(), "Foo");
  assert_eq!(registry.display(prototype).to_string(), "Foo.prototype");
  assert_eq!(registry.implicit_prototype(instance), Some(prototype));
  assert_eq!(
    result.tree.lookup(result.global, "Foo.prototype").unwrap().ty,
    prototype
  );
}

#[test]
fn namespaced_constructor_attaches_and_registers() {
  // var goog = {}; /** @constructor */ goog.Foo = function() {};
  let mut b = AstBuilder::new();
  let ns = b.object(vec![]);
  let var_goog = b.var_("goog", Some(ns));
  let target = b.path("goog.Foo");
  let func = b.func(None, vec![], vec![]);
  let func_expr = b.func_expr(func);
  let assign = b.assign(target, func_expr);
  let stmt = b.expr_stmt_doc(DocInfo::constructor(), assign);
  let ast = b.script(vec![var_goog, stmt]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let ctor = registry.get("goog.Foo").expect("nominal registered");
  assert!(registry.is_constructor(ctor));
  assert_eq!(
    registry.display(ctor).to_string(),
    "function (this:goog.Foo): ?"
  );

  let goog = result.tree.lookup(result.global, "goog").unwrap();
  assert!(registry.has_own_property(goog.ty, "Foo"));
  assert!(registry.is_property_declared(goog.ty, "Foo"));
  assert!(registry.types_with_property("Foo").contains(&goog.ty));
  assert_eq!(
    result.tree.lookup(result.global, "goog.Foo").unwrap().ty,
    ctor
  );
}

#[test]
fn enum_literal_members_share_the_element_type() {
  // /** @enum */ var Foo = {BAR: 1};
  let mut b = AstBuilder::new();
  let one = b.num(1.0);
  let lit = b.object(vec![("BAR", one)]);
  let stmt = b.var_doc(DocInfo::enumeration(None), "Foo", Some(lit));
  let ast = b.script(vec![stmt]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let foo = result.tree.lookup(result.global, "Foo").unwrap();
  assert!(foo.declared);
  assert_eq!(registry.display(foo.ty).to_string(), "enum{Foo}");
  assert_eq!(registry.get("Foo"), Some(foo.ty));

  let bar = registry.property_type(foo.ty, "BAR");
  assert_eq!(registry.display(bar).to_string(), "Foo.<number>");
  assert!(registry.is_property_declared(foo.ty, "BAR"));
}

#[test]
fn constructor_alias_shares_identity() {
  // /** @constructor */ var Foo = function() {};
  // /** @constructor */ var FooAlias = Foo;
  let mut b = AstBuilder::new();
  let func = b.func(None, vec![], vec![]);
  let func_expr = b.func_expr(func);
  let decl = b.var_doc(DocInfo::constructor(), "Foo", Some(func_expr));
  let rhs = b.name("Foo");
  let alias = b.var_doc(DocInfo::constructor(), "FooAlias", Some(rhs));
  let ast = b.script(vec![decl, alias]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());
  assert_eq!(registry.get("FooAlias"), registry.get("Foo"));
}

#[test]
fn enum_alias_shares_identity() {
  let mut b = AstBuilder::new();
  let one = b.num(1.0);
  let lit = b.object(vec![("BAR", one)]);
  let decl = b.var_doc(DocInfo::enumeration(None), "Foo", Some(lit));
  let rhs = b.name("Foo");
  let alias = b.var_doc(DocInfo::enumeration(None), "FooAlias", Some(rhs));
  let ast = b.script(vec![decl, alias]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());
  assert_eq!(registry.get("FooAlias"), registry.get("Foo"));
}

#[test]
fn prototype_literal_splits_ownership() {
  // /** @constructor */ function A() {}
  // A.prototype = {m1: 5, m2: true};
  // A.prototype.m3 = 'x';
  let mut b = AstBuilder::new();
  let func = b.func(Some("A"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let five = b.num(5.0);
  let yes = b.bool_(true);
  let lit = b.object(vec![("m1", five), ("m2", yes)]);
  let proto_path = b.path("A.prototype");
  let assign_lit = b.assign(proto_path, lit);
  let stmt_lit = b.expr_stmt(assign_lit);
  let m3_path = b.path("A.prototype.m3");
  let x = b.str_("x");
  let assign_m3 = b.assign(m3_path, x);
  let stmt_m3 = b.expr_stmt(assign_m3);
  let ast = b.script(vec![decl, stmt_lit, stmt_m3]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let ctor = registry.get("A").unwrap();
  let instance = registry.instance_type(ctor).unwrap();
  let n = registry.natives();

  // All three reach the instance through the chain.
  assert_eq!(registry.property_type(instance, "m1"), n.number);
  assert_eq!(registry.property_type(instance, "m2"), n.boolean);
  assert_eq!(registry.property_type(instance, "m3"), n.string);
  assert!(!registry.has_own_property(instance, "m1"));
  assert!(!registry.has_own_property(instance, "m3"));

  // m3 is owned by the FunctionPrototype; m1/m2 by the anonymous literal
  // object sitting above it.
  let proto1 = registry.implicit_prototype(instance).unwrap();
  assert!(!registry.has_own_property(proto1, "m1"));
  assert!(!registry.has_own_property(proto1, "m2"));
  assert!(registry.has_own_property(proto1, "m3"));

  let proto2 = registry.implicit_prototype(proto1).unwrap();
  assert!(registry.has_own_property(proto2, "m1"));
  assert!(registry.has_own_property(proto2, "m2"));
  assert!(!registry.has_property(proto2, "m3"));
}

#[test]
fn untyped_source_stub_reaches_only_the_reverse_index() {
  // function Foo() {}; Foo.bar;
  let mut b = AstBuilder::new();
  let func = b.func(Some("Foo"), vec![], vec![]);
  let decl = b.func_decl(func);
  let stub = b.path("Foo.bar");
  let stub_stmt = b.expr_stmt(stub);
  let ast = b.script(vec![decl, stub_stmt]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let foo = result.tree.lookup(result.global, "Foo").unwrap();
  assert!(registry.function_data(foo.ty).is_some());
  assert!(!registry.has_own_property(foo.ty, "bar"));
  assert_eq!(registry.property_type(foo.ty, "bar"), registry.natives().unknown);
  assert!(registry.types_with_property("bar").contains(&foo.ty));
}

#[test]
fn typed_function_stub_declares_property_and_scope_entry() {
  // var goog = {}; /** @param {number} x */ goog.foo;
  let mut b = AstBuilder::new();
  let ns = b.object(vec![]);
  let var_goog = b.var_("goog", Some(ns));
  let stub = b.path("goog.foo");
  let doc = DocInfo::default().with_param("x", TypeExpr::name("number"));
  let stub_stmt = b.expr_stmt_doc(doc, stub);
  let ast = b.script(vec![var_goog, stub_stmt]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let goog = result.tree.lookup(result.global, "goog").unwrap();
  assert!(registry.has_own_property(goog.ty, "foo"));
  assert!(registry.is_property_declared(goog.ty, "foo"));
  let foo_ty = registry.property_type(goog.ty, "foo");
  assert_eq!(registry.display(foo_ty).to_string(), "function (number): ?");
  assert_eq!(
    result.tree.lookup(result.global, "goog.foo").unwrap().ty,
    foo_ty
  );
}

#[test]
fn extern_stubs_attach_with_the_extern_flag() {
  // Externs: /** @constructor */ function Extern() {}
  //          /** @type {Extern} */ var myExtern;
  //          /** @type {number} */ myExtern.foo;
  let mut b = AstBuilder::new();
  let func = b.func(Some("Extern"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let var_stmt = b.var_doc(DocInfo::typed(TypeExpr::name("Extern")), "myExtern", None);
  let stub = b.path("myExtern.foo");
  let stub_stmt = b.expr_stmt_doc(DocInfo::typed(TypeExpr::name("number")), stub);
  let externs = b.script(vec![decl, var_stmt, stub_stmt]);

  let registry = TypeRegistry::new();
  let mut sink = DiagnosticSink::new();
  let result = ScopeCreator::build(
    &registry,
    &[RootInput {
      ast: &externs,
      externs: true,
    }],
    &mut sink,
  );
  assert!(sink.is_empty());

  let my_extern = result.tree.lookup(result.global, "myExtern").unwrap();
  assert_eq!(registry.display(my_extern.ty).to_string(), "(Extern|null)");

  let instance = registry.restrict_not_null_or_void(my_extern.ty);
  assert!(registry.has_own_property(instance, "foo"));
  assert!(registry.is_property_declared(instance, "foo"));
  assert!(registry.is_property_in_externs(instance, "foo"));
  assert_eq!(registry.property_type(instance, "foo"), registry.natives().number);
}

#[test]
fn extern_stub_order_does_not_matter() {
  // Same as above with the stub first.
  let mut b = AstBuilder::new();
  let stub = b.path("myExtern.foo");
  let stub_stmt = b.expr_stmt_doc(DocInfo::typed(TypeExpr::name("number")), stub);
  let var_stmt = b.var_doc(DocInfo::typed(TypeExpr::name("Extern")), "myExtern", None);
  let func = b.func(Some("Extern"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let externs = b.script(vec![stub_stmt, var_stmt, decl]);

  let registry = TypeRegistry::new();
  let mut sink = DiagnosticSink::new();
  let result = ScopeCreator::build(
    &registry,
    &[RootInput {
      ast: &externs,
      externs: true,
    }],
    &mut sink,
  );
  assert!(sink.is_empty());

  let my_extern = result.tree.lookup(result.global, "myExtern").unwrap();
  assert_eq!(registry.display(my_extern.ty).to_string(), "(Extern|null)");
  let instance = registry.restrict_not_null_or_void(my_extern.ty);
  assert!(registry.has_own_property(instance, "foo"));
  assert!(registry.is_property_in_externs(instance, "foo"));
}

#[test]
fn untyped_extern_prototype_stub_is_an_inferred_unknown_slot() {
  // Externs: Extern.prototype.foo; /** @constructor */ function Extern() {}
  let mut b = AstBuilder::new();
  let stub = b.path("Extern.prototype.foo");
  let stub_stmt = b.expr_stmt(stub);
  let func = b.func(Some("Extern"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let externs = b.script(vec![stub_stmt, decl]);

  let registry = TypeRegistry::new();
  let mut sink = DiagnosticSink::new();
  let _result = ScopeCreator::build(
    &registry,
    &[RootInput {
      ast: &externs,
      externs: true,
    }],
    &mut sink,
  );
  assert!(sink.is_empty());

  let ctor = registry.get("Extern").unwrap();
  let prototype = registry.prototype_type(ctor).unwrap();
  assert!(registry.has_own_property(prototype, "foo"));
  assert!(registry.is_property_inferred(prototype, "foo"));
  assert!(registry.is_property_in_externs(prototype, "foo"));
  assert_eq!(registry.property_type(prototype, "foo"), registry.natives().unknown);
}

#[test]
fn this_properties_collect_in_constructor_bodies() {
  // /** @constructor */ function F() { /** @type {number} */ this.foo = 3; this.bar = 'y'; }
  let mut b = AstBuilder::new();
  let this1 = b.this();
  let foo_prop = b.prop(this1, "foo");
  let three = b.num(3.0);
  let assign_foo = b.assign(foo_prop, three);
  let foo_stmt = b.expr_stmt_doc(DocInfo::typed(TypeExpr::name("number")), assign_foo);
  let this2 = b.this();
  let bar_prop = b.prop(this2, "bar");
  let y = b.str_("y");
  let assign_bar = b.assign(bar_prop, y);
  let bar_stmt = b.expr_stmt(assign_bar);
  let func = b.func(Some("F"), vec![], vec![foo_stmt, bar_stmt]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let ast = b.script(vec![decl]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let ctor = registry.get("F").unwrap();
  let instance = registry.instance_type(ctor).unwrap();
  let n = registry.natives();
  assert!(registry.is_property_declared(instance, "foo"));
  assert_eq!(registry.property_type(instance, "foo"), n.number);
  assert!(registry.is_property_inferred(instance, "bar"));
  assert_eq!(registry.property_type(instance, "bar"), n.string);
}

#[test]
fn interface_prototype_carries_declared_members() {
  // /** @interface */ var I = function() {};
  // /** @type {number} */ I.prototype.bar;
  // I.prototype.baz = function() {};
  let mut b = AstBuilder::new();
  let func = b.func(None, vec![], vec![]);
  let func_expr = b.func_expr(func);
  let decl = b.var_doc(DocInfo::interface(), "I", Some(func_expr));
  let bar = b.path("I.prototype.bar");
  let bar_stmt = b.expr_stmt_doc(DocInfo::typed(TypeExpr::name("number")), bar);
  let baz_path = b.path("I.prototype.baz");
  let method = b.func(None, vec![], vec![]);
  let method_expr = b.func_expr(method);
  let assign = b.assign(baz_path, method_expr);
  let baz_stmt = b.expr_stmt(assign);
  let ast = b.script(vec![decl, bar_stmt, baz_stmt]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let i = result.tree.lookup(result.global, "I").unwrap();
  assert!(registry.is_interface(i.ty));
  let prototype = registry.prototype_type(i.ty).unwrap();
  assert_eq!(registry.display(prototype).to_string(), "I.prototype");
  assert_eq!(registry.property_type(prototype, "bar"), registry.natives().number);
  assert_eq!(
    registry
      .display(registry.property_type(prototype, "baz"))
      .to_string(),
    "function (this:I): ?"
  );
  assert_eq!(
    result.tree.lookup(result.global, "I.prototype").unwrap().ty,
    prototype
  );
}

#[test]
fn object_literal_cast_types_the_literal() {
  // /** @constructor */ A.B = function() {}; goog.reflect.object(A.B, {})
  let mut b = AstBuilder::new();
  let ab = b.path("A.B");
  let func = b.func(None, vec![], vec![]);
  let func_expr = b.func_expr(func);
  let assign = b.assign(ab, func_expr);
  let decl = b.expr_stmt_doc(DocInfo::constructor(), assign);
  let callee = b.path("goog.reflect.object");
  let arg0 = b.path("A.B");
  let lit = b.object(vec![]);
  let call = b.call(callee, vec![arg0, lit]);
  let call_stmt = b.expr_stmt(call);
  let ast = b.script(vec![decl, call_stmt]);

  let registry = TypeRegistry::new();
  let (result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let instance = result.casts.get(&(0, lit)).copied().expect("cast recorded");
  assert_eq!(registry.display(instance).to_string(), "A.B");
}

#[test]
fn object_literal_cast_on_non_constructor_is_diagnosed() {
  // goog.reflect.object(A.B, {}) with A.B undeclared.
  let mut b = AstBuilder::new();
  let callee = b.path("goog.reflect.object");
  let arg0 = b.path("A.B");
  let lit = b.object(vec![]);
  let call = b.call(callee, vec![arg0, lit]);
  let call_stmt = b.expr_stmt(call);
  let ast = b.script(vec![call_stmt]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.contains_code("CONSTRUCTOR_EXPECTED"));
}

#[test]
fn object_literal_cast_on_non_literal_is_diagnosed() {
  // /** @constructor */ function C() {}; goog.reflect.object(C, 1)
  let mut b = AstBuilder::new();
  let func = b.func(Some("C"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let callee = b.path("goog.reflect.object");
  let arg0 = b.name("C");
  let one = b.num(1.0);
  let call = b.call(callee, vec![arg0, one]);
  let call_stmt = b.expr_stmt(call);
  let ast = b.script(vec![decl, call_stmt]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.contains_code("OBJECTLIT_EXPECTED"));
}

#[test]
fn global_this_sits_below_a_declared_window() {
  // /** @constructor */ function Window() {} Window.prototype.alert = function() {};
  let mut b = AstBuilder::new();
  let func = b.func(Some("Window"), vec![], vec![]);
  let decl = b.func_decl_doc(DocInfo::constructor(), func);
  let alert_path = b.path("Window.prototype.alert");
  let alert_fn = b.func(None, vec![], vec![]);
  let alert_expr = b.func_expr(alert_fn);
  let assign = b.assign(alert_path, alert_expr);
  let stmt = b.expr_stmt(assign);
  let ast = b.script(vec![decl, stmt]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let n = registry.natives();
  let window = registry.get("Window").unwrap();
  let instance = registry.instance_type(window).unwrap();
  assert!(registry.is_subtype(n.global_this, instance));
  assert_ne!(n.global_this, instance);
  assert!(registry.has_property(n.global_this, "alert"));
  assert_eq!(registry.display(n.global_this).to_string(), "global this");
}

#[test]
fn extends_wires_the_prototype_chain() {
  // /** @constructor */ function Base() {}
  // /** @constructor @extends {Base} */ function Derived() {}
  let mut b = AstBuilder::new();
  let base_fn = b.func(Some("Base"), vec![], vec![]);
  let base_decl = b.func_decl_doc(DocInfo::constructor(), base_fn);
  let derived_fn = b.func(Some("Derived"), vec![], vec![]);
  let derived_doc = DocInfo::constructor().with_extends(TypeExpr::name("Base"));
  let derived_decl = b.func_decl_doc(derived_doc, derived_fn);
  let ast = b.script(vec![base_decl, derived_decl]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let base = registry.get("Base").unwrap();
  let derived = registry.get("Derived").unwrap();
  let base_instance = registry.instance_type(base).unwrap();
  let derived_instance = registry.instance_type(derived).unwrap();
  assert!(registry.is_subtype(derived_instance, base_instance));

  // Properties declared on the base prototype flow to derived instances.
  let base_prototype = registry.prototype_type(base).unwrap();
  registry.declare_property(base_prototype, "m", registry.natives().number, false);
  assert_eq!(
    registry.property_type(derived_instance, "m"),
    registry.natives().number
  );
}

#[test]
fn unresolved_extends_leaves_an_unknown_link() {
  // /** @constructor @extends {goog.Unknown} */ function Foo() {} Foo.prototype.bar = 1;
  let mut b = AstBuilder::new();
  let func = b.func(Some("Foo"), vec![], vec![]);
  let doc = DocInfo::constructor().with_extends(TypeExpr::name("goog.Unknown"));
  let decl = b.func_decl_doc(doc, func);
  let bar_path = b.path("Foo.prototype.bar");
  let one = b.num(1.0);
  let assign = b.assign(bar_path, one);
  let stmt = b.expr_stmt(assign);
  let ast = b.script(vec![decl, stmt]);

  let registry = TypeRegistry::new();
  let (_result, sink) = build_one(&ast, &registry);
  assert!(sink.is_empty());

  let ctor = registry.get("Foo").unwrap();
  let instance = registry.instance_type(ctor).unwrap();
  // Own declarations still register; inheritance through the unresolved
  // link reads as unknown.
  assert_eq!(registry.property_type(instance, "bar"), registry.natives().number);
  assert_eq!(
    registry.property_type(instance, "anythingElse"),
    registry.natives().unknown
  );
}
