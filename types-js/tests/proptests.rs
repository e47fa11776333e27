use proptest::prelude::*;
use std::sync::Arc;
use types_js::TypeId;
use types_js::TypeRegistry;

/// Index into the leaf pool. The pool holds mutually incomparable value
/// types (plus the endpoints), so the lattice laws hold exactly; the
/// wildcard is exercised separately because it is deliberately not
/// antisymmetric.
fn leaf_pool(registry: &TypeRegistry) -> Vec<TypeId> {
  let n = registry.natives();
  vec![n.all, n.no, n.number, n.string, n.boolean, n.null, n.void]
}

fn arb_leaf() -> impl Strategy<Value = usize> {
  0usize..7
}

#[derive(Clone, Debug)]
enum TypeShape {
  Leaf(usize),
  Union(Vec<TypeShape>),
}

fn arb_shape(depth: u32) -> impl Strategy<Value = TypeShape> {
  let leaf = arb_leaf().prop_map(TypeShape::Leaf);
  leaf.prop_recursive(depth, 24, 4, |inner| {
    prop::collection::vec(inner, 0..4).prop_map(TypeShape::Union)
  })
}

fn realize(registry: &Arc<TypeRegistry>, shape: &TypeShape) -> TypeId {
  match shape {
    TypeShape::Leaf(index) => leaf_pool(registry)[*index],
    TypeShape::Union(members) => {
      let ids: Vec<TypeId> = members.iter().map(|m| realize(registry, m)).collect();
      registry.create_union(ids)
    }
  }
}

proptest! {
  #[test]
  fn union_construction_is_permutation_invariant(members in prop::collection::vec(arb_leaf(), 0..6)) {
    let registry = TypeRegistry::new();
    let pool = leaf_pool(&registry);
    let ids: Vec<TypeId> = members.iter().map(|i| pool[*i]).collect();
    let mut reversed = ids.clone();
    reversed.reverse();
    prop_assert_eq!(registry.create_union(ids), registry.create_union(reversed));
  }

  #[test]
  fn join_is_commutative(a in arb_shape(3), b in arb_shape(3)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    prop_assert_eq!(registry.join(a, b), registry.join(b, a));
  }

  #[test]
  fn join_is_idempotent(a in arb_shape(3)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    prop_assert_eq!(registry.join(a, a), a);
  }

  #[test]
  fn join_is_associative(a in arb_shape(2), b in arb_shape(2), c in arb_shape(2)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    let c = realize(&registry, &c);
    let left = registry.join(registry.join(a, b), c);
    let right = registry.join(a, registry.join(b, c));
    prop_assert_eq!(left, right);
  }

  #[test]
  fn meet_is_commutative(a in arb_shape(3), b in arb_shape(3)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    prop_assert_eq!(registry.meet(a, b), registry.meet(b, a));
  }

  #[test]
  fn meet_is_idempotent(a in arb_shape(3)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    prop_assert_eq!(registry.meet(a, a), a);
  }

  #[test]
  fn meet_is_associative(a in arb_shape(2), b in arb_shape(2), c in arb_shape(2)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    let c = realize(&registry, &c);
    let left = registry.meet(registry.meet(a, b), c);
    let right = registry.meet(a, registry.meet(b, c));
    prop_assert_eq!(left, right);
  }

  #[test]
  fn absorption_laws(a in arb_shape(2), b in arb_shape(2)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    prop_assert_eq!(registry.join(a, registry.meet(a, b)), a);
    prop_assert_eq!(registry.meet(a, registry.join(a, b)), a);
  }

  #[test]
  fn subtype_is_reflexive_and_transitive(a in arb_shape(2), b in arb_shape(2), c in arb_shape(2)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    let c = realize(&registry, &c);
    prop_assert!(registry.is_subtype(a, a));
    if registry.is_subtype(a, b) && registry.is_subtype(b, c) {
      prop_assert!(registry.is_subtype(a, c));
    }
  }

  #[test]
  fn subtype_agrees_with_meet_and_join(a in arb_shape(3), b in arb_shape(3)) {
    let registry = TypeRegistry::new();
    let a = realize(&registry, &a);
    let b = realize(&registry, &b);
    let subtype = registry.is_subtype(a, b);
    prop_assert_eq!(subtype, registry.meet(a, b) == a);
    prop_assert_eq!(subtype, registry.join(a, b) == b);
  }
}
