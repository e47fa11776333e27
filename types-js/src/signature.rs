use crate::ids::TypeId;
use crate::object::ObjectData;

/// One formal parameter of a function type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
  pub ty: TypeId,
  pub optional: bool,
  pub variadic: bool,
}

impl Param {
  pub fn required(ty: TypeId) -> Self {
    Param {
      ty,
      optional: false,
      variadic: false,
    }
  }

  pub fn optional(ty: TypeId) -> Self {
    Param {
      ty,
      optional: true,
      variadic: false,
    }
  }

  pub fn variadic(ty: TypeId) -> Self {
    Param {
      ty,
      optional: false,
      variadic: true,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
  Ordinary,
  Constructor,
  Interface,
}

/// A function type. The embedded [`ObjectData`] carries the function value's
/// own properties (statics); nominal functions additionally own their paired
/// instance and prototype types.
#[derive(Clone, Debug)]
pub struct FunctionData {
  pub object: ObjectData,
  pub params: Vec<Param>,
  pub ret: TypeId,
  /// `None` means the default global `this`; display omits it.
  pub this_ty: Option<TypeId>,
  pub kind: FunctionKind,
  /// The distinguished `prototype` property. Present exactly when the
  /// function is a constructor or interface.
  pub prototype: Option<TypeId>,
  /// The paired instance type. Present exactly when `prototype` is.
  pub instance: Option<TypeId>,
  /// Interfaces this constructor declares via `@implements`.
  pub implements: Vec<TypeId>,
  /// `@template` parameter names, substitutable at call sites.
  pub templates: Vec<String>,
}

impl FunctionData {
  pub fn is_nominal(&self) -> bool {
    !matches!(self.kind, FunctionKind::Ordinary)
  }
}
