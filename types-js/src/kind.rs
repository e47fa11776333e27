use crate::ids::TypeId;
use crate::object::ObjectData;
use crate::signature::FunctionData;

/// Every type in the lattice. The registry arena is a `Vec<TypeData>`; all
/// cross-references are [`TypeId`] handles, which is what lets constructor /
/// prototype / instance cycles exist without reference counting.
#[derive(Clone, Debug)]
pub enum TypeData {
  /// Top of the lattice, `*`.
  All,
  /// Bottom of the lattice.
  No,
  /// Bottom of the object sub-lattice.
  NoObject,
  /// The wildcard, `?`: both subtype and supertype of everything.
  Unknown,
  Number,
  String,
  Boolean,
  Null,
  Void,
  Object(ObjectData),
  Function(FunctionData),
  Enum(EnumData),
  EnumElement(EnumElementData),
  Record(RecordData),
  Named(NamedData),
  /// Canonical alternates: flattened, deduplicated, sorted by textual form,
  /// never containing `All`, `Unknown`, or another union.
  Union(Vec<TypeId>),
  /// A `@template` placeholder, substitutable at call sites.
  Template(String),
}

/// An enum declaration. The embedded object carries one property per member,
/// each typed with the enum's element type.
#[derive(Clone, Debug)]
pub struct EnumData {
  pub object: ObjectData,
  /// The underlying element type `E` of `@enum {E}`.
  pub element: TypeId,
  /// The `EnumElement<E>` handle every member shares.
  pub element_ty: TypeId,
}

/// The type of an enum's members: a branded view of the element type.
#[derive(Clone, Copy, Debug)]
pub struct EnumElementData {
  pub enum_ty: TypeId,
  pub element: TypeId,
}

/// A structural object type with a fixed, ordered schema.
#[derive(Clone, Debug)]
pub struct RecordData {
  pub fields: Vec<(String, TypeId)>,
}

/// A reference by qualified name, resolved lazily against the registry's
/// nominal name table.
#[derive(Clone, Debug)]
pub struct NamedData {
  pub name: String,
  pub referent: Option<TypeId>,
}
