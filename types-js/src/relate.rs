//! Subtyping, join, meet, and ternary equality over registry handles.
//!
//! The rules are applied in a fixed order so the relation is deterministic;
//! see the doc comments on each entry point. All operations are total.

use crate::ids::TypeId;
use crate::kind::TypeData;
use crate::signature::FunctionData;
use crate::signature::Param;
use crate::store::TypeRegistry;
use crate::ternary::Ternary;
use ahash::AHashSet;

impl TypeRegistry {
  /// `a <: b`.
  ///
  /// Rule order: wildcard/endpoint rules, identity, union fan-out (all
  /// alternates on the left, any alternate on the right), named
  /// indirection, enum elements, functions (contravariant parameters,
  /// covariant return and `this`), records structurally, then prototype
  /// chains and declared interfaces for object types.
  pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
    let mut seen = AHashSet::new();
    self.is_subtype_inner(a, b, &mut seen)
  }

  fn is_subtype_inner(&self, a: TypeId, b: TypeId, seen: &mut AHashSet<(TypeId, TypeId)>) -> bool {
    let a = self.resolve(a);
    let b = self.resolve(b);
    if a == b {
      return true;
    }
    // Coinductive: a pair already in flight holds unless something else
    // refutes it.
    if !seen.insert((a, b)) {
      return true;
    }

    let natives = self.natives();
    let a_data = self.data(a);
    let b_data = self.data(b);

    // Unresolved names and template placeholders behave as the wildcard.
    if matches!(a_data, TypeData::Named(_) | TypeData::Template(_)) {
      return true;
    }
    if matches!(b_data, TypeData::Named(_) | TypeData::Template(_)) {
      return true;
    }
    if matches!(b_data, TypeData::Unknown | TypeData::All) {
      return true;
    }
    if matches!(a_data, TypeData::Unknown | TypeData::No) {
      return true;
    }
    if matches!(a_data, TypeData::NoObject) && self.is_object_like(b) {
      return true;
    }

    if let TypeData::Union(alternates) = &a_data {
      return alternates
        .iter()
        .all(|alt| self.is_subtype_inner(*alt, b, seen));
    }
    if let TypeData::Union(alternates) = &b_data {
      return alternates
        .iter()
        .any(|alt| self.is_subtype_inner(a, *alt, seen));
    }

    if let TypeData::EnumElement(element) = &a_data {
      return self.is_subtype_inner(element.element, b, seen);
    }

    if let (TypeData::Function(fa), TypeData::Function(fb)) = (&a_data, &b_data) {
      return self.function_subtype(fa, fb, seen);
    }

    if let TypeData::Record(rb) = &b_data {
      return rb.fields.iter().all(|(name, field_ty)| {
        let a_field = match &a_data {
          TypeData::Record(ra) => ra
            .fields
            .iter()
            .find(|(a_name, _)| a_name == name)
            .map(|(_, a_ty)| *a_ty),
          _ => self.find_property(a, name).map(|prop| prop.ty),
        };
        match a_field {
          Some(a_ty) => self.is_subtype_inner(a_ty, *field_ty, seen),
          None => false,
        }
      });
    }

    // Every object, function, enum, and record value is an `Object`.
    if b == natives.object
      && matches!(
        a_data,
        TypeData::Object(_) | TypeData::Function(_) | TypeData::Enum(_) | TypeData::Record(_)
      )
    {
      return true;
    }

    if self.is_object_like(a) && self.is_object_like(b) {
      return self.object_subtype(a, b, seen);
    }

    false
  }

  /// Walk `a`'s implicit-prototype chain looking for `b`; at each nominal
  /// step, also consult the constructor's declared interfaces.
  fn object_subtype(&self, a: TypeId, b: TypeId, seen: &mut AHashSet<(TypeId, TypeId)>) -> bool {
    let b_is_interface = self
      .constructor_of(b)
      .map(|ctor| self.is_interface(ctor))
      .unwrap_or(false);

    let mut current = a;
    for _ in 0..64 {
      if current == b {
        return true;
      }
      if b_is_interface {
        if let Some(ctor) = self.constructor_of(current) {
          if let Some(function) = self.function_data(ctor) {
            for iface in function.implements {
              let iface_instance = self.instance_type(iface).unwrap_or(iface);
              if iface_instance == b || self.is_subtype_inner(iface_instance, b, seen) {
                return true;
              }
            }
          }
        }
      }
      let Some(object) = self.object_view(current) else {
        return false;
      };
      let Some(proto) = object.proto else {
        return false;
      };
      let proto = self.resolve(proto);
      if !self.is_object_like(proto) {
        return false;
      }
      current = proto;
    }
    false
  }

  fn function_subtype(
    &self,
    fa: &FunctionData,
    fb: &FunctionData,
    seen: &mut AHashSet<(TypeId, TypeId)>,
  ) -> bool {
    let arity = fa.params.len().max(fb.params.len());
    for i in 0..arity {
      let a_param = param_at(&fa.params, i);
      let b_param = param_at(&fb.params, i);
      match (a_param, b_param) {
        // Contravariant.
        (Some(ap), Some(bp)) => {
          if !self.is_subtype_inner(bp.ty, ap.ty, seen) {
            return false;
          }
        }
        (Some(ap), None) => {
          if !(ap.optional || ap.variadic) {
            return false;
          }
        }
        (None, Some(bp)) => {
          if !(bp.optional || bp.variadic) {
            return false;
          }
        }
        (None, None) => unreachable!(),
      }
    }
    if !self.is_subtype_inner(fa.ret, fb.ret, seen) {
      return false;
    }
    match (fa.this_ty, fb.this_ty) {
      (Some(a_this), Some(b_this)) => self.is_subtype_inner(a_this, b_this, seen),
      _ => true,
    }
  }

  /// Least supertype. Joining with the wildcard is the wildcard; otherwise
  /// endpoints short-circuit, subsumption collapses comparable operands
  /// (two instances of one nominal hierarchy land on the ancestor), and
  /// incomparable operands form a canonical union.
  pub fn join(&self, a: TypeId, b: TypeId) -> TypeId {
    let natives = self.natives();
    let a = self.resolve(a);
    let b = self.resolve(b);
    if a == b {
      return a;
    }
    let a_data = self.data(a);
    let b_data = self.data(b);
    if matches!(a_data, TypeData::Unknown) || matches!(b_data, TypeData::Unknown) {
      return natives.unknown;
    }
    if matches!(a_data, TypeData::All) || matches!(b_data, TypeData::All) {
      return natives.all;
    }
    if matches!(a_data, TypeData::No) {
      return b;
    }
    if matches!(b_data, TypeData::No) {
      return a;
    }
    if self.is_subtype(a, b) {
      return b;
    }
    if self.is_subtype(b, a) {
      return a;
    }
    self.create_union([a, b])
  }

  /// Greatest subtype. The wildcard is the identity; endpoints
  /// short-circuit; subsumption picks the smaller comparable operand; a
  /// union keeps the alternates comparable to the other operand; disjoint
  /// object types bottom out at the object bottom, everything else at the
  /// bottom.
  pub fn meet(&self, a: TypeId, b: TypeId) -> TypeId {
    let natives = self.natives();
    let a = self.resolve(a);
    let b = self.resolve(b);
    if a == b {
      return a;
    }
    let a_data = self.data(a);
    let b_data = self.data(b);
    if matches!(a_data, TypeData::Unknown) {
      return b;
    }
    if matches!(b_data, TypeData::Unknown) {
      return a;
    }
    if matches!(a_data, TypeData::All) {
      return b;
    }
    if matches!(b_data, TypeData::All) {
      return a;
    }
    if matches!(a_data, TypeData::No) || matches!(b_data, TypeData::No) {
      return natives.no;
    }
    if self.is_subtype(a, b) {
      return a;
    }
    if self.is_subtype(b, a) {
      return b;
    }
    if let TypeData::Union(alternates) = &a_data {
      let kept: Vec<TypeId> = alternates
        .iter()
        .filter_map(|alt| self.meet_alternate(*alt, b))
        .collect();
      return self.create_union(kept);
    }
    if let TypeData::Union(alternates) = &b_data {
      let kept: Vec<TypeId> = alternates
        .iter()
        .filter_map(|alt| self.meet_alternate(*alt, a))
        .collect();
      return self.create_union(kept);
    }
    if self.is_object_like(a) && self.is_object_like(b) {
      return natives.no_object;
    }
    natives.no
  }

  /// One alternate's contribution to a union meet: the alternate when it
  /// sits below the other operand, the other operand when it sits below
  /// the alternate, nothing when they are incomparable.
  fn meet_alternate(&self, alt: TypeId, other: TypeId) -> Option<TypeId> {
    if self.is_subtype(alt, other) {
      Some(alt)
    } else if self.is_subtype(other, alt) {
      Some(other)
    } else {
      None
    }
  }

  /// Whether values of the two types can compare equal under the language's
  /// loose equality.
  ///
  /// `True` only when the comparison must succeed (null against undefined),
  /// `False` when the types cannot coerce into a common value domain,
  /// `Unknown` otherwise. Unions fold across alternates and answer only
  /// when every alternate agrees.
  pub fn test_for_equality(&self, a: TypeId, b: TypeId) -> Ternary {
    let a = self.resolve(a);
    let b = self.resolve(b);
    let a_data = self.data(a);
    let b_data = self.data(b);

    if let TypeData::EnumElement(element) = &a_data {
      return self.test_for_equality(element.element, b);
    }
    if let TypeData::EnumElement(element) = &b_data {
      return self.test_for_equality(a, element.element);
    }
    if let TypeData::Union(alternates) = &a_data {
      return self.fold_equality(alternates, |alt| self.test_for_equality(alt, b));
    }
    if let TypeData::Union(alternates) = &b_data {
      return self.fold_equality(alternates, |alt| self.test_for_equality(a, alt));
    }

    let a_class = equality_class(&a_data);
    let b_class = equality_class(&b_data);
    match (a_class, b_class) {
      (Some(EqualityClass::NullVoid), Some(EqualityClass::NullVoid)) => Ternary::True,
      (Some(EqualityClass::NullVoid), Some(_)) | (Some(_), Some(EqualityClass::NullVoid)) => {
        Ternary::False
      }
      (Some(_), Some(_)) => Ternary::Unknown,
      _ => Ternary::Unknown,
    }
  }

  fn fold_equality(&self, alternates: &[TypeId], test: impl Fn(TypeId) -> Ternary) -> Ternary {
    let mut result: Option<Ternary> = None;
    for alt in alternates {
      let sub = test(*alt);
      match result {
        None => result = Some(sub),
        Some(prev) if prev == sub => {}
        Some(_) => return Ternary::Unknown,
      }
    }
    result.unwrap_or(Ternary::Unknown)
  }
}

fn param_at(params: &[Param], i: usize) -> Option<&Param> {
  match params.get(i) {
    Some(param) => Some(param),
    None => params.last().filter(|last| last.variadic),
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EqualityClass {
  NullVoid,
  Value,
  Object,
}

fn equality_class(data: &TypeData) -> Option<EqualityClass> {
  match data {
    TypeData::Null | TypeData::Void => Some(EqualityClass::NullVoid),
    TypeData::Number | TypeData::String | TypeData::Boolean => Some(EqualityClass::Value),
    TypeData::Object(_) | TypeData::Function(_) | TypeData::Enum(_) | TypeData::Record(_) => {
      Some(EqualityClass::Object)
    }
    _ => None,
  }
}
