use types_js::FunctionKind;
use types_js::NativeKind;
use types_js::TypeRegistry;

#[test]
fn native_lookup_is_total() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  assert_eq!(registry.get_native(NativeKind::Number), n.number);
  assert_eq!(registry.get_native(NativeKind::Unknown), n.unknown);
  assert_eq!(registry.get_native(NativeKind::NumberValueOrObject), n.number_value_or_object);
  assert_eq!(registry.get_native(NativeKind::GlobalThis), n.global_this);
}

#[test]
fn nominal_creation_is_idempotent() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let first = registry.create_nominal_function("Foo", vec![], n.unknown, FunctionKind::Constructor);
  let second =
    registry.create_nominal_function("Foo", vec![], n.unknown, FunctionKind::Constructor);
  assert_eq!(first, second);
  assert_eq!(registry.get("Foo"), Some(first));
}

#[test]
fn enum_creation_is_idempotent() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let first = registry.create_enum("Color", n.number);
  let second = registry.create_enum("Color", n.string);
  assert_eq!(first, second);
  let data = registry.enum_data(first).unwrap();
  assert_eq!(data.element, n.number);
}

#[test]
fn aliases_share_identity() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let foo = registry.create_nominal_function("Foo", vec![], n.unknown, FunctionKind::Constructor);
  registry.register_alias("FooAlias", foo);
  assert_eq!(registry.get("FooAlias"), registry.get("Foo"));
}

#[test]
fn union_is_canonical_under_permutation() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let a = registry.create_union([n.number, n.string, n.boolean]);
  let b = registry.create_union([n.boolean, n.number, n.string]);
  let c = registry.create_union([n.string, n.boolean, n.number, n.number]);
  assert_eq!(a, b);
  assert_eq!(a, c);
}

#[test]
fn union_flattens_absorbs_and_reduces() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let inner = registry.create_union([n.number, n.string]);
  let flattened = registry.create_union([inner, n.boolean]);
  let direct = registry.create_union([n.number, n.string, n.boolean]);
  assert_eq!(flattened, direct);

  assert_eq!(registry.create_union([n.number, n.all]), n.all);
  assert_eq!(registry.create_union([n.number, n.unknown]), n.unknown);
  assert_eq!(registry.create_union([n.number]), n.number);
  assert_eq!(registry.create_union([n.number, n.no]), n.number);
  assert_eq!(registry.create_union([]), n.no);
}

#[test]
fn records_intern_by_schema() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let a = registry.create_record(vec![("x".to_string(), n.number)]);
  let b = registry.create_record(vec![("x".to_string(), n.number)]);
  let c = registry.create_record(vec![("x".to_string(), n.string)]);
  assert_eq!(a, b);
  assert_ne!(a, c);
}

#[test]
fn named_placeholders_resolve_lazily() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let named = registry.create_named("Later");
  // Unresolved names behave as the wildcard in the lattice.
  assert!(registry.is_subtype(named, n.number));
  assert!(registry.is_subtype(n.number, named));

  let ctor = registry.create_nominal_function("Later", vec![], n.unknown, FunctionKind::Constructor);
  // A name in type position denotes the instance.
  assert_eq!(registry.resolve(named), registry.instance_type(ctor).unwrap());
}

#[test]
fn declared_property_shadows_inferred() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let obj = registry.create_object(Some("ns"), None);

  registry.infer_property(obj, "x", n.number);
  assert!(registry.is_property_inferred(obj, "x"));
  assert_eq!(registry.property_type(obj, "x"), n.number);

  registry.declare_property(obj, "x", n.string, false);
  assert!(registry.is_property_declared(obj, "x"));
  assert_eq!(registry.property_type(obj, "x"), n.string);

  // Later assignments no longer move a declared property.
  registry.infer_property(obj, "x", n.boolean);
  assert_eq!(registry.property_type(obj, "x"), n.string);
}

#[test]
fn inferred_property_joins_across_sites() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let obj = registry.create_object(Some("ns"), None);
  registry.infer_property(obj, "x", n.number);
  registry.infer_property(obj, "x", n.string);
  assert_eq!(
    registry.display(registry.property_type(obj, "x")).to_string(),
    "(number|string)"
  );
}

#[test]
fn duplicate_declarations_first_wins_and_keeps_extern_flag() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let obj = registry.create_object(Some("ns"), None);

  registry.declare_property(obj, "x", n.number, true);
  registry.declare_property(obj, "x", n.string, false);
  assert_eq!(registry.property_type(obj, "x"), n.number);
  assert!(registry.is_property_in_externs(obj, "x"));

  // Stub first, typed second: the typed declaration wins, the extern flag
  // survives the merge.
  registry.infer_property(obj, "y", n.unknown);
  registry.declare_property(obj, "y", n.number, true);
  assert_eq!(registry.property_type(obj, "y"), n.number);
  assert!(registry.is_property_declared(obj, "y"));
  assert!(registry.is_property_in_externs(obj, "y"));
}

#[test]
fn reverse_index_contains_every_declaring_type() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let a = registry.create_object(Some("A"), None);
  let b = registry.create_object(Some("B"), None);
  registry.declare_property(a, "shared", n.number, false);
  registry.infer_property(b, "shared", n.string);
  let types = registry.types_with_property("shared");
  assert!(types.contains(&a));
  assert!(types.contains(&b));
  assert!(registry.types_with_property("absent").is_empty());
}

#[test]
fn property_reference_reaches_only_the_reverse_index() {
  let registry = TypeRegistry::new();
  let foo = registry.create_nominal_function(
    "Foo",
    vec![],
    registry.natives().unknown,
    FunctionKind::Constructor,
  );
  registry.register_property_reference(foo, "bar");
  assert!(!registry.has_own_property(foo, "bar"));
  assert_eq!(registry.property_type(foo, "bar"), registry.natives().unknown);
  assert!(registry.types_with_property("bar").contains(&foo));
}

#[test]
fn property_lookup_walks_the_prototype_chain() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let ctor = registry.create_nominal_function("Foo", vec![], n.unknown, FunctionKind::Constructor);
  let prototype = registry.prototype_type(ctor).unwrap();
  let instance = registry.instance_type(ctor).unwrap();

  registry.declare_property(prototype, "m", n.number, false);
  assert!(!registry.has_own_property(instance, "m"));
  assert!(registry.has_property(instance, "m"));
  assert_eq!(registry.property_type(instance, "m"), n.number);
}

#[test]
fn lookup_through_unknown_link_is_unknown() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let ctor = registry.create_nominal_function("Sub", vec![], n.unknown, FunctionKind::Constructor);
  let prototype = registry.prototype_type(ctor).unwrap();
  // An unresolvable @extends leaves an unknown link in the chain.
  registry.set_implicit_prototype(prototype, Some(n.unknown));
  let instance = registry.instance_type(ctor).unwrap();

  registry.declare_property(prototype, "own", n.string, false);
  assert_eq!(registry.property_type(instance, "own"), n.string);
  assert_eq!(registry.property_type(instance, "inherited"), n.unknown);
}

#[test]
fn dereference_autoboxes_and_strips_null() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  assert_eq!(registry.dereference(n.number), Some(n.number_object));
  let nullable_object = registry.create_union([n.object, n.null]);
  assert_eq!(registry.dereference(nullable_object), Some(n.object));
  assert_eq!(registry.dereference(n.null), None);
}

#[test]
fn find_property_type_joins_union_alternates() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let a = registry.create_object(Some("WithX"), None);
  let b = registry.create_object(Some("AlsoX"), None);
  registry.declare_property(a, "x", n.number, false);
  registry.declare_property(b, "x", n.string, false);
  let either = registry.create_union([a, b]);
  assert_eq!(
    registry
      .display(registry.find_property_type(either, "x"))
      .to_string(),
    "(number|string)"
  );
}

#[test]
fn debug_json_is_shallow_and_stable() {
  let registry = TypeRegistry::new();
  let n = registry.natives();
  let union = registry.create_union([n.number, n.string]);
  let json = registry.debug_json(union);
  assert_eq!(json["kind"], "union");
  assert_eq!(json["members"].as_array().unwrap().len(), 2);
}
