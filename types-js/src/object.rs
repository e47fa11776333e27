use crate::ids::TypeId;
use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
  /// Per-property attributes. The `DECLARED` bit fixes the property's type;
  /// without it the type is the running join over assignment sites.
  /// `IN_EXTERNS` survives merges with program-side declarations.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct PropFlags: u8 {
    const DECLARED = 1 << 0;
    const IN_EXTERNS = 1 << 1;
  }
}

/// One property slot of an object-like type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prop {
  pub ty: TypeId,
  pub flags: PropFlags,
}

impl Prop {
  pub fn declared(ty: TypeId) -> Self {
    Prop {
      ty,
      flags: PropFlags::DECLARED,
    }
  }

  pub fn inferred(ty: TypeId) -> Self {
    Prop {
      ty,
      flags: PropFlags::empty(),
    }
  }

  pub fn is_declared(&self) -> bool {
    self.flags.contains(PropFlags::DECLARED)
  }

  pub fn in_externs(&self) -> bool {
    self.flags.contains(PropFlags::IN_EXTERNS)
  }
}

/// What role an object type plays. Distinguishing the roles drives display
/// (`Foo` vs `Foo.prototype` vs `global this`) and a handful of structural
/// rules; it never affects the property map itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
  /// An object literal or other unnamed object.
  Anonymous,
  /// A built-in created at registry initialization (`Object`, `Number`, ...).
  Native,
  /// The instance type of a constructor or interface.
  Instance,
  /// The distinguished `prototype` property of a function.
  FunctionPrototype,
  /// The synthetic type of the top-level `this`.
  GlobalThis,
}

/// Shared object core: a property map plus the implicit-prototype link and
/// an optional constructor back-reference. Functions and enums embed one of
/// these for their own (static) properties.
#[derive(Clone, Debug)]
pub struct ObjectData {
  pub name: Option<String>,
  pub kind: ObjectKind,
  /// Implicit prototype. May point at the unknown type when the declared
  /// base could not be resolved; property lookup through such a link yields
  /// the unknown type.
  pub proto: Option<TypeId>,
  /// Back-reference to the owning function for instances and prototypes.
  pub ctor: Option<TypeId>,
  pub props: BTreeMap<String, Prop>,
}

impl ObjectData {
  pub fn new(kind: ObjectKind) -> Self {
    ObjectData {
      name: None,
      kind,
      proto: None,
      ctor: None,
      props: BTreeMap::new(),
    }
  }

  pub fn named(kind: ObjectKind, name: impl Into<String>) -> Self {
    ObjectData {
      name: Some(name.into()),
      kind,
      proto: None,
      ctor: None,
      props: BTreeMap::new(),
    }
  }

  pub fn with_proto(mut self, proto: TypeId) -> Self {
    self.proto = Some(proto);
    self
  }

  pub fn with_ctor(mut self, ctor: TypeId) -> Self {
    self.ctor = Some(ctor);
    self
  }
}
