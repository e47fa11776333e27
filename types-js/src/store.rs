use crate::display::TypeDisplay;
use crate::ids::TypeId;
use crate::kind::EnumData;
use crate::kind::EnumElementData;
use crate::kind::NamedData;
use crate::kind::RecordData;
use crate::kind::TypeData;
use crate::object::ObjectData;
use crate::object::ObjectKind;
use crate::object::Prop;
use crate::object::PropFlags;
use crate::signature::FunctionData;
use crate::signature::FunctionKind;
use crate::signature::Param;
use ahash::AHashMap;
use ahash::AHashSet;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

/// The built-in types every compilation unit starts from. Look-ups are
/// total; the singletons are created at registry initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeKind {
  All,
  No,
  NoObject,
  Unknown,
  Number,
  String,
  Boolean,
  Null,
  Void,
  Object,
  NumberObject,
  StringObject,
  BooleanObject,
  NumberValueOrObject,
  StringValueOrObject,
  NullOrVoid,
  GlobalThis,
}

/// Handles for the native singletons.
#[derive(Clone, Copy, Debug)]
pub struct NativeIds {
  pub all: TypeId,
  pub no: TypeId,
  pub no_object: TypeId,
  pub unknown: TypeId,
  pub number: TypeId,
  pub string: TypeId,
  pub boolean: TypeId,
  pub null: TypeId,
  pub void: TypeId,
  pub object: TypeId,
  pub number_object: TypeId,
  pub string_object: TypeId,
  pub boolean_object: TypeId,
  pub number_value_or_object: TypeId,
  pub string_value_or_object: TypeId,
  pub null_or_void: TypeId,
  pub global_this: TypeId,
}

/// The sole producer of types for a compilation unit.
///
/// All construction canonicalizes: handle equality on [`TypeId`] coincides
/// with semantic equality (named placeholders excepted, which compare
/// through their referent). The registry also maintains the reverse index
/// from property name to the set of object types declaring it.
///
/// Interior locks let `&self` construction methods compose; the core is
/// single-threaded per compilation unit, so they serialize trivially. A
/// parallel host must give each compilation unit its own registry; handles
/// must never cross registries.
#[derive(Debug)]
pub struct TypeRegistry {
  arena: RwLock<Vec<TypeData>>,
  unions: RwLock<AHashMap<Vec<TypeId>, TypeId>>,
  records: RwLock<AHashMap<Vec<(String, TypeId)>, TypeId>>,
  named: RwLock<AHashMap<String, TypeId>>,
  templates: RwLock<AHashMap<String, TypeId>>,
  by_name: RwLock<AHashMap<String, TypeId>>,
  with_property: RwLock<AHashMap<String, BTreeSet<TypeId>>>,
  natives: NativeIds,
}

impl TypeRegistry {
  pub fn new() -> Arc<Self> {
    let mut arena = Vec::new();
    let mut push = |data: TypeData| {
      let id = TypeId(arena.len() as u32);
      arena.push(data);
      id
    };

    let all = push(TypeData::All);
    let no = push(TypeData::No);
    let no_object = push(TypeData::NoObject);
    let unknown = push(TypeData::Unknown);
    let number = push(TypeData::Number);
    let string = push(TypeData::String);
    let boolean = push(TypeData::Boolean);
    let null = push(TypeData::Null);
    let void = push(TypeData::Void);
    let object = push(TypeData::Object(ObjectData::named(
      ObjectKind::Native,
      "Object",
    )));
    let number_object = push(TypeData::Object(
      ObjectData::named(ObjectKind::Native, "Number").with_proto(object),
    ));
    let string_object = push(TypeData::Object(
      ObjectData::named(ObjectKind::Native, "String").with_proto(object),
    ));
    let boolean_object = push(TypeData::Object(
      ObjectData::named(ObjectKind::Native, "Boolean").with_proto(object),
    ));
    let global_this = push(TypeData::Object(ObjectData::named(
      ObjectKind::GlobalThis,
      "global this",
    )));

    // The value-or-object pairs and (null|undefined) are unions; their
    // alternates are pre-sorted by textual form ("Number" < "number",
    // "null" < "undefined").
    let number_value_or_object = push(TypeData::Union(vec![number_object, number]));
    let string_value_or_object = push(TypeData::Union(vec![string_object, string]));
    let null_or_void = push(TypeData::Union(vec![null, void]));

    let mut unions = AHashMap::new();
    unions.insert(vec![number_object, number], number_value_or_object);
    unions.insert(vec![string_object, string], string_value_or_object);
    unions.insert(vec![null, void], null_or_void);

    let natives = NativeIds {
      all,
      no,
      no_object,
      unknown,
      number,
      string,
      boolean,
      null,
      void,
      object,
      number_object,
      string_object,
      boolean_object,
      number_value_or_object,
      string_value_or_object,
      null_or_void,
      global_this,
    };

    Arc::new(TypeRegistry {
      arena: RwLock::new(arena),
      unions: RwLock::new(unions),
      records: Default::default(),
      named: Default::default(),
      templates: Default::default(),
      by_name: Default::default(),
      with_property: Default::default(),
      natives,
    })
  }

  pub fn natives(&self) -> NativeIds {
    self.natives
  }

  pub fn get_native(&self, kind: NativeKind) -> TypeId {
    let n = self.natives;
    match kind {
      NativeKind::All => n.all,
      NativeKind::No => n.no,
      NativeKind::NoObject => n.no_object,
      NativeKind::Unknown => n.unknown,
      NativeKind::Number => n.number,
      NativeKind::String => n.string,
      NativeKind::Boolean => n.boolean,
      NativeKind::Null => n.null,
      NativeKind::Void => n.void,
      NativeKind::Object => n.object,
      NativeKind::NumberObject => n.number_object,
      NativeKind::StringObject => n.string_object,
      NativeKind::BooleanObject => n.boolean_object,
      NativeKind::NumberValueOrObject => n.number_value_or_object,
      NativeKind::StringValueOrObject => n.string_value_or_object,
      NativeKind::NullOrVoid => n.null_or_void,
      NativeKind::GlobalThis => n.global_this,
    }
  }

  /// Clone out the data for a handle. Guards are never held across
  /// recursion; every accessor copies and releases.
  pub fn data(&self, id: TypeId) -> TypeData {
    self.arena.read()[id.index()].clone()
  }

  fn push(&self, data: TypeData) -> TypeId {
    let mut arena = self.arena.write();
    let id = TypeId(arena.len() as u32);
    arena.push(data);
    id
  }

  /// Follow a named placeholder to its referent, resolving (and caching)
  /// against the nominal name table on first use. A name in type position
  /// denotes the instance of a constructor (or the member type of an
  /// enum), so resolution lands there. Identity for everything else.
  pub fn resolve(&self, id: TypeId) -> TypeId {
    let named = match &self.arena.read()[id.index()] {
      TypeData::Named(named) => named.clone(),
      _ => return id,
    };
    if let Some(referent) = named.referent {
      return referent;
    }
    let Some(target) = self.by_name.read().get(&named.name).copied() else {
      return id;
    };
    let target = match self.data(target) {
      TypeData::Function(function) => function.instance.unwrap_or(target),
      TypeData::Enum(e) => e.element_ty,
      _ => target,
    };
    if let TypeData::Named(named) = &mut self.arena.write()[id.index()] {
      named.referent = Some(target);
    }
    target
  }

  /// The object core of an object-like handle (plain object, function
  /// statics, or enum members), after name resolution.
  pub fn object_view(&self, id: TypeId) -> Option<ObjectData> {
    match self.data(self.resolve(id)) {
      TypeData::Object(object) => Some(object),
      TypeData::Function(function) => Some(function.object),
      TypeData::Enum(e) => Some(e.object),
      _ => None,
    }
  }

  pub fn is_object_like(&self, id: TypeId) -> bool {
    matches!(
      self.data(self.resolve(id)),
      TypeData::Object(_) | TypeData::Function(_) | TypeData::Enum(_) | TypeData::NoObject
    )
  }

  fn with_object_mut<R>(&self, id: TypeId, f: impl FnOnce(&mut ObjectData) -> R) -> Option<R> {
    let id = self.resolve(id);
    let mut arena = self.arena.write();
    match &mut arena[id.index()] {
      TypeData::Object(object) => Some(f(object)),
      TypeData::Function(function) => Some(f(&mut function.object)),
      TypeData::Enum(e) => Some(f(&mut e.object)),
      _ => None,
    }
  }

  // Construction.

  /// Create a fresh object type. A named object is additionally registered
  /// under its qualified name.
  pub fn create_object(&self, name: Option<&str>, proto: Option<TypeId>) -> TypeId {
    let mut object = ObjectData::new(ObjectKind::Anonymous);
    object.name = name.map(|n| n.to_string());
    object.proto = proto.or(Some(self.natives.object));
    let id = self.push(TypeData::Object(object));
    if let Some(name) = name {
      self.by_name.write().entry(name.to_string()).or_insert(id);
    }
    id
  }

  pub fn create_anonymous_object(&self) -> TypeId {
    self.create_object(None, None)
  }

  /// Create an ordinary function type. `this_ty == None` means the default
  /// global `this`.
  pub fn create_function(
    &self,
    params: Vec<Param>,
    ret: TypeId,
    this_ty: Option<TypeId>,
  ) -> TypeId {
    let mut object = ObjectData::new(ObjectKind::Anonymous);
    object.proto = Some(self.natives.object);
    self.push(TypeData::Function(FunctionData {
      object,
      params,
      ret,
      this_ty,
      kind: FunctionKind::Ordinary,
      prototype: None,
      instance: None,
      implements: Vec::new(),
      templates: Vec::new(),
    }))
  }

  /// Create a constructor or interface function together with its paired
  /// instance and prototype types. Creating the same qualified name twice
  /// returns the first creation.
  pub fn create_nominal_function(
    &self,
    name: &str,
    params: Vec<Param>,
    ret: TypeId,
    kind: FunctionKind,
  ) -> TypeId {
    debug_assert!(!matches!(kind, FunctionKind::Ordinary));
    if let Some(existing) = self.by_name.read().get(name).copied() {
      return existing;
    }

    let mut object = ObjectData::named(ObjectKind::Anonymous, name);
    object.proto = Some(self.natives.object);
    let fn_id = self.push(TypeData::Function(FunctionData {
      object,
      params,
      ret,
      this_ty: None,
      kind,
      prototype: None,
      instance: None,
      implements: Vec::new(),
      templates: Vec::new(),
    }));

    let prototype = self.push(TypeData::Object(
      ObjectData::named(ObjectKind::FunctionPrototype, format!("{name}.prototype"))
        .with_proto(self.natives.object)
        .with_ctor(fn_id),
    ));
    let instance = self.push(TypeData::Object(
      ObjectData::named(ObjectKind::Instance, name)
        .with_proto(prototype)
        .with_ctor(fn_id),
    ));

    {
      let mut arena = self.arena.write();
      if let TypeData::Function(function) = &mut arena[fn_id.index()] {
        function.prototype = Some(prototype);
        function.instance = Some(instance);
        function.this_ty = Some(instance);
      }
    }

    self.by_name.write().insert(name.to_string(), fn_id);
    fn_id
  }

  /// Create an enum type and the `EnumElement` type its members share.
  /// First creation wins for a repeated qualified name.
  pub fn create_enum(&self, name: &str, element: TypeId) -> TypeId {
    if let Some(existing) = self.by_name.read().get(name).copied() {
      return existing;
    }
    let mut object = ObjectData::named(ObjectKind::Anonymous, name);
    object.proto = Some(self.natives.object);
    let enum_id = self.push(TypeData::Enum(EnumData {
      object,
      element,
      // Patched immediately below once the element type exists.
      element_ty: TypeId(0),
    }));
    let element_ty = self.push(TypeData::EnumElement(EnumElementData {
      enum_ty: enum_id,
      element,
    }));
    if let TypeData::Enum(e) = &mut self.arena.write()[enum_id.index()] {
      e.element_ty = element_ty;
    }
    self.by_name.write().insert(name.to_string(), enum_id);
    enum_id
  }

  /// The canonical union of the given alternates. Flattens nested unions,
  /// removes duplicates and the bottom type, sorts by textual form; the top
  /// type absorbs, the wildcard dominates, and a single survivor is
  /// returned unwrapped.
  pub fn create_union(&self, members: impl IntoIterator<Item = TypeId>) -> TypeId {
    let mut flat = Vec::new();
    let mut seen = AHashSet::new();
    let mut worklist: Vec<TypeId> = members.into_iter().collect();
    worklist.reverse();
    while let Some(member) = worklist.pop() {
      match self.data(member) {
        TypeData::All => return self.natives.all,
        TypeData::Unknown => return self.natives.unknown,
        TypeData::No => {}
        TypeData::Union(inner) => {
          for alt in inner.into_iter().rev() {
            worklist.push(alt);
          }
        }
        _ => {
          if seen.insert(member) {
            flat.push(member);
          }
        }
      }
    }

    if flat.is_empty() {
      return self.natives.no;
    }
    if flat.len() == 1 {
      return flat[0];
    }

    let mut keyed: Vec<(String, TypeId)> = flat
      .into_iter()
      .map(|id| (self.display(id).to_string(), id))
      .collect();
    keyed.sort();
    let flat: Vec<TypeId> = keyed.into_iter().map(|(_, id)| id).collect();

    if let Some(existing) = self.unions.read().get(&flat).copied() {
      return existing;
    }
    let id = self.push(TypeData::Union(flat.clone()));
    self.unions.write().insert(flat, id);
    id
  }

  /// A structural record type. Field order is declaration order and is part
  /// of the type's identity.
  pub fn create_record(&self, fields: Vec<(String, TypeId)>) -> TypeId {
    if let Some(existing) = self.records.read().get(&fields).copied() {
      return existing;
    }
    let id = self.push(TypeData::Record(RecordData {
      fields: fields.clone(),
    }));
    self.records.write().insert(fields, id);
    id
  }

  /// A lazily-resolved reference by qualified name. One placeholder exists
  /// per distinct name.
  pub fn create_named(&self, name: &str) -> TypeId {
    if let Some(existing) = self.named.read().get(name).copied() {
      return existing;
    }
    let id = self.push(TypeData::Named(NamedData {
      name: name.to_string(),
      referent: None,
    }));
    self.named.write().insert(name.to_string(), id);
    id
  }

  /// A `@template` placeholder. Interned by name.
  pub fn create_template(&self, name: &str) -> TypeId {
    if let Some(existing) = self.templates.read().get(name).copied() {
      return existing;
    }
    let id = self.push(TypeData::Template(name.to_string()));
    self.templates.write().insert(name.to_string(), id);
    id
  }

  /// Register `name` as another name for an existing type. Aliases share
  /// identity; the first registration of a name wins.
  pub fn register_alias(&self, name: &str, ty: TypeId) {
    self.by_name.write().entry(name.to_string()).or_insert(ty);
  }

  /// Look up a type by qualified name.
  pub fn get(&self, name: &str) -> Option<TypeId> {
    self.by_name.read().get(name).copied()
  }

  /// Resolve a qualified name, if it has been declared yet.
  pub fn resolve_named(&self, name: &str) -> Option<TypeId> {
    self.get(name)
  }

  // Structure accessors.

  pub fn function_data(&self, id: TypeId) -> Option<FunctionData> {
    match self.data(self.resolve(id)) {
      TypeData::Function(function) => Some(function),
      _ => None,
    }
  }

  pub fn enum_data(&self, id: TypeId) -> Option<EnumData> {
    match self.data(self.resolve(id)) {
      TypeData::Enum(e) => Some(e),
      _ => None,
    }
  }

  pub fn is_constructor(&self, id: TypeId) -> bool {
    matches!(
      self.function_data(id),
      Some(FunctionData {
        kind: FunctionKind::Constructor,
        ..
      })
    )
  }

  pub fn is_interface(&self, id: TypeId) -> bool {
    matches!(
      self.function_data(id),
      Some(FunctionData {
        kind: FunctionKind::Interface,
        ..
      })
    )
  }

  /// The instance type of a constructor or interface.
  pub fn instance_type(&self, id: TypeId) -> Option<TypeId> {
    self.function_data(id).and_then(|f| f.instance)
  }

  /// The `prototype` object of a constructor or interface.
  pub fn prototype_type(&self, id: TypeId) -> Option<TypeId> {
    self.function_data(id).and_then(|f| f.prototype)
  }

  pub fn constructor_of(&self, id: TypeId) -> Option<TypeId> {
    self.object_view(id).and_then(|o| o.ctor)
  }

  /// The member type of an enum (`Foo.<number>` for `enum{Foo}`).
  pub fn enum_element_type(&self, id: TypeId) -> Option<TypeId> {
    self.enum_data(id).map(|e| e.element_ty)
  }

  pub fn implicit_prototype(&self, id: TypeId) -> Option<TypeId> {
    self.object_view(id).and_then(|o| o.proto)
  }

  /// Rewire the implicit prototype of an object-like type. Used when
  /// `@extends` resolves and when a prototype object literal is installed
  /// under an existing `FunctionPrototype`.
  pub fn set_implicit_prototype(&self, id: TypeId, proto: Option<TypeId>) -> bool {
    self.with_object_mut(id, |object| object.proto = proto).is_some()
  }

  /// Record the interfaces a constructor declares via `@implements`.
  pub fn add_implemented_interface(&self, ctor: TypeId, iface: TypeId) {
    let ctor = self.resolve(ctor);
    if let TypeData::Function(function) = &mut self.arena.write()[ctor.index()] {
      function.implements.push(iface);
    }
  }

  /// Attach `@template` parameter names to a function type.
  pub fn set_function_templates(&self, func: TypeId, templates: Vec<String>) {
    let func = self.resolve(func);
    if let TypeData::Function(function) = &mut self.arena.write()[func.index()] {
      function.templates = templates;
    }
  }

  // Properties.

  fn index_property(&self, ty: TypeId, name: &str) {
    self
      .with_property
      .write()
      .entry(name.to_string())
      .or_default()
      .insert(ty);
  }

  /// Every object type that has declared (or been referenced with) the
  /// property, in handle order.
  pub fn types_with_property(&self, name: &str) -> Vec<TypeId> {
    self
      .with_property
      .read()
      .get(name)
      .map(|set| set.iter().copied().collect())
      .unwrap_or_default()
  }

  /// Record that a property name was referenced on a type without
  /// registering a slot. Bare stubs with no annotation only reach the
  /// reverse index.
  pub fn register_property_reference(&self, ty: TypeId, name: &str) {
    let ty = self.resolve(ty);
    if self.is_object_like(ty) {
      self.index_property(ty, name);
    }
  }

  /// Declare a property with a fixed type. A second declaration of an
  /// already-declared property is ignored (first wins); the extern flag is
  /// re-asserted either way. Declared shadows inferred.
  pub fn declare_property(
    &self,
    ty: TypeId,
    name: &str,
    prop_ty: TypeId,
    in_externs: bool,
  ) -> bool {
    let target = self.resolve(ty);
    let updated = self
      .with_object_mut(target, |object| match object.props.get_mut(name) {
        Some(existing) if existing.is_declared() => {
          if in_externs {
            existing.flags |= PropFlags::IN_EXTERNS;
          }
        }
        Some(existing) => {
          let mut flags = PropFlags::DECLARED;
          if in_externs || existing.in_externs() {
            flags |= PropFlags::IN_EXTERNS;
          }
          *existing = Prop { ty: prop_ty, flags };
        }
        None => {
          let mut flags = PropFlags::DECLARED;
          if in_externs {
            flags |= PropFlags::IN_EXTERNS;
          }
          object.props.insert(name.to_string(), Prop { ty: prop_ty, flags });
        }
      })
      .is_some();
    if updated {
      self.index_property(target, name);
    }
    updated
  }

  /// Add or widen an inferred property from an assignment site. Joins with
  /// any existing inferred type; a declared property is left untouched.
  pub fn infer_property(&self, ty: TypeId, name: &str, prop_ty: TypeId) -> bool {
    let target = self.resolve(ty);
    let existing = self.own_property(target, name);
    let next = match existing {
      Some(prop) if prop.is_declared() => {
        self.index_property(target, name);
        return true;
      }
      Some(prop) => Prop {
        ty: self.join(prop.ty, prop_ty),
        flags: prop.flags,
      },
      None => Prop::inferred(prop_ty),
    };
    let updated = self
      .with_object_mut(target, |object| {
        object.props.insert(name.to_string(), next);
      })
      .is_some();
    if updated {
      self.index_property(target, name);
    }
    updated
  }

  /// Flag an existing property as extern-originated. The flag survives
  /// later merges with program-side declarations.
  pub fn mark_property_in_externs(&self, ty: TypeId, name: &str) {
    self.with_object_mut(ty, |object| {
      if let Some(prop) = object.props.get_mut(name) {
        prop.flags |= PropFlags::IN_EXTERNS;
      }
    });
  }

  pub fn own_property(&self, ty: TypeId, name: &str) -> Option<Prop> {
    self
      .object_view(ty)
      .and_then(|object| object.props.get(name).cloned())
  }

  pub fn has_own_property(&self, ty: TypeId, name: &str) -> bool {
    self.own_property(ty, name).is_some()
  }

  /// Find a property slot anywhere on the prototype chain.
  pub fn find_property(&self, ty: TypeId, name: &str) -> Option<Prop> {
    let mut current = self.resolve(ty);
    // The chain is acyclic by construction; the guard is against malformed
    // extern graphs.
    for _ in 0..64 {
      if let Some(prop) = self.own_property(current, name) {
        return Some(prop);
      }
      let object = self.object_view(current)?;
      let proto = self.resolve(object.proto?);
      if !self.is_object_like(proto) {
        return None;
      }
      current = proto;
    }
    None
  }

  pub fn has_property(&self, ty: TypeId, name: &str) -> bool {
    self.find_property(ty, name).is_some()
  }

  /// The type of a property looked up through the prototype chain. Missing
  /// properties and properties inherited through an unknown link are the
  /// unknown type.
  pub fn property_type(&self, ty: TypeId, name: &str) -> TypeId {
    let mut current = self.resolve(ty);
    for _ in 0..64 {
      if let Some(prop) = self.own_property(current, name) {
        return prop.ty;
      }
      let Some(object) = self.object_view(current) else {
        return self.natives.unknown;
      };
      let Some(proto) = object.proto else {
        return self.natives.unknown;
      };
      let proto = self.resolve(proto);
      if !self.is_object_like(proto) {
        return self.natives.unknown;
      }
      current = proto;
    }
    self.natives.unknown
  }

  pub fn is_property_declared(&self, ty: TypeId, name: &str) -> bool {
    self
      .find_property(ty, name)
      .map(|prop| prop.is_declared())
      .unwrap_or(false)
  }

  pub fn is_property_inferred(&self, ty: TypeId, name: &str) -> bool {
    self
      .find_property(ty, name)
      .map(|prop| !prop.is_declared())
      .unwrap_or(false)
  }

  pub fn is_property_in_externs(&self, ty: TypeId, name: &str) -> bool {
    self
      .find_property(ty, name)
      .map(|prop| prop.in_externs())
      .unwrap_or(false)
  }

  // Boxing.

  pub fn autoboxes_to(&self, ty: TypeId) -> Option<TypeId> {
    let n = self.natives;
    match self.data(ty) {
      TypeData::Number => Some(n.number_object),
      TypeData::String => Some(n.string_object),
      TypeData::Boolean => Some(n.boolean_object),
      _ => None,
    }
  }

  pub fn unboxes_to(&self, ty: TypeId) -> Option<TypeId> {
    let n = self.natives;
    if ty == n.number_object {
      Some(n.number)
    } else if ty == n.string_object {
      Some(n.string)
    } else if ty == n.boolean_object {
      Some(n.boolean)
    } else {
      None
    }
  }

  /// Coerce a type for property access: strip null/void, autobox a
  /// primitive, and require an object-like result.
  pub fn dereference(&self, ty: TypeId) -> Option<TypeId> {
    let restricted = self.restrict_not_null_or_void(ty);
    let target = self.autoboxes_to(restricted).unwrap_or(restricted);
    let target = self.resolve(target);
    self.is_object_like(target).then_some(target)
  }

  /// The type of `expr.name` given the type of `expr`. Total: anything that
  /// cannot carry the property is the unknown type.
  pub fn find_property_type(&self, ty: TypeId, name: &str) -> TypeId {
    let ty = self.resolve(self.restrict_not_null_or_void(ty));
    match self.data(ty) {
      TypeData::Union(members) => {
        let mut result: Option<TypeId> = None;
        for member in members {
          let member_ty = self.find_property_type(member, name);
          if member_ty != self.natives.unknown {
            result = Some(match result {
              Some(acc) => self.join(acc, member_ty),
              None => member_ty,
            });
          }
        }
        result.unwrap_or(self.natives.unknown)
      }
      TypeData::EnumElement(element) => self.find_property_type(element.element, name),
      TypeData::Record(record) => record
        .fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, field_ty)| *field_ty)
        .unwrap_or(self.natives.unknown),
      _ => match self.dereference(ty) {
        Some(object) => self.property_type(object, name),
        None => self.natives.unknown,
      },
    }
  }

  // Display and export.

  pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
    TypeDisplay::new(self, ty)
  }

  /// Export a stable, shallow JSON representation of a type (nested types
  /// are referenced by handle). Deterministic, for tooling comparisons.
  pub fn debug_json(&self, ty: TypeId) -> serde_json::Value {
    use serde_json::json;
    match self.data(ty) {
      TypeData::All => json!({ "kind": "all" }),
      TypeData::No => json!({ "kind": "no" }),
      TypeData::NoObject => json!({ "kind": "no_object" }),
      TypeData::Unknown => json!({ "kind": "unknown" }),
      TypeData::Number => json!({ "kind": "number" }),
      TypeData::String => json!({ "kind": "string" }),
      TypeData::Boolean => json!({ "kind": "boolean" }),
      TypeData::Null => json!({ "kind": "null" }),
      TypeData::Void => json!({ "kind": "void" }),
      TypeData::Object(object) => json!({
        "kind": "object",
        "name": object.name,
        "proto": object.proto.map(|p| p.0),
        "props": object
          .props
          .iter()
          .map(|(key, prop)| {
            json!({
              "name": key,
              "type": prop.ty.0,
              "declared": prop.is_declared(),
              "in_externs": prop.in_externs(),
            })
          })
          .collect::<Vec<_>>(),
      }),
      TypeData::Function(function) => json!({
        "kind": "function",
        "name": function.object.name,
        "params": function.params.iter().map(|p| p.ty.0).collect::<Vec<_>>(),
        "ret": function.ret.0,
        "this": function.this_ty.map(|t| t.0),
        "instance": function.instance.map(|t| t.0),
        "prototype": function.prototype.map(|t| t.0),
      }),
      TypeData::Enum(e) => json!({
        "kind": "enum",
        "name": e.object.name,
        "element": e.element.0,
      }),
      TypeData::EnumElement(element) => json!({
        "kind": "enum_element",
        "enum": element.enum_ty.0,
        "element": element.element.0,
      }),
      TypeData::Record(record) => json!({
        "kind": "record",
        "fields": record
          .fields
          .iter()
          .map(|(key, field_ty)| json!({ "name": key, "type": field_ty.0 }))
          .collect::<Vec<_>>(),
      }),
      TypeData::Named(named) => json!({
        "kind": "named",
        "name": named.name,
        "referent": named.referent.map(|r| r.0),
      }),
      TypeData::Union(members) => json!({
        "kind": "union",
        "members": members.iter().map(|m| m.0).collect::<Vec<_>>(),
      }),
      TypeData::Template(name) => json!({ "kind": "template", "name": name }),
    }
  }
}
