//! Structured documentation annotations.
//!
//! The comment front end (out of scope here) parses `@type`, `@param`,
//! `@return`, `@constructor`, `@interface`, `@enum`, `@extends`,
//! `@implements`, and `@template` blocks into a [`DocInfo`] attached to the
//! declaration node. Type expressions arrive as a small tree ([`TypeExpr`])
//! that the scope creator realizes against the type registry.

/// Which nominal kind a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NominalKind {
  Constructor,
  Interface,
  Enum,
}

/// Parsed annotations for one declaration site.
#[derive(Debug, Clone, Default)]
pub struct DocInfo {
  /// `@constructor` / `@interface` / `@enum`.
  pub kind: Option<NominalKind>,
  /// `@type {T}`.
  pub ty: Option<TypeExpr>,
  /// `@param {T} name`, in source order.
  pub params: Vec<DocParam>,
  /// `@return {T}`.
  pub ret: Option<TypeExpr>,
  /// `@extends {T}`.
  pub extends: Option<TypeExpr>,
  /// `@implements {T}`, in source order.
  pub implements: Vec<TypeExpr>,
  /// `@template T, U`.
  pub templates: Vec<String>,
  /// The element type of `@enum {T}`; `None` means the default (`number`).
  pub enum_element: Option<TypeExpr>,
}

impl DocInfo {
  pub fn constructor() -> Self {
    DocInfo {
      kind: Some(NominalKind::Constructor),
      ..Default::default()
    }
  }

  pub fn interface() -> Self {
    DocInfo {
      kind: Some(NominalKind::Interface),
      ..Default::default()
    }
  }

  pub fn enumeration(element: Option<TypeExpr>) -> Self {
    DocInfo {
      kind: Some(NominalKind::Enum),
      enum_element: element,
      ..Default::default()
    }
  }

  pub fn typed(ty: TypeExpr) -> Self {
    DocInfo {
      ty: Some(ty),
      ..Default::default()
    }
  }

  pub fn with_extends(mut self, base: TypeExpr) -> Self {
    self.extends = Some(base);
    self
  }

  pub fn with_param(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
    self.params.push(DocParam {
      name: name.into(),
      ty: Some(ty),
      variadic: false,
    });
    self
  }

  pub fn with_return(mut self, ty: TypeExpr) -> Self {
    self.ret = Some(ty);
    self
  }

  pub fn with_implements(mut self, iface: TypeExpr) -> Self {
    self.implements.push(iface);
    self
  }

  pub fn with_template(mut self, name: impl Into<String>) -> Self {
    self.templates.push(name.into());
    self
  }

  /// Whether any annotation supplies a type for the annotated value. Used to
  /// split declared from inferred bindings.
  pub fn declares_type(&self) -> bool {
    self.kind.is_some() || self.ty.is_some() || self.ret.is_some() || !self.params.is_empty()
  }
}

/// One `@param` entry.
#[derive(Debug, Clone)]
pub struct DocParam {
  pub name: String,
  /// `None` for a bare `@param name` with no braces.
  pub ty: Option<TypeExpr>,
  /// `@param {...T}`.
  pub variadic: bool,
}

/// A parsed type expression from a doc comment.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
  /// A possibly-qualified name: `number`, `Foo`, `ns.Bar`.
  Name(String),
  /// `?T`: adds null.
  Nullable(Box<TypeExpr>),
  /// `!T`: strips null.
  NonNullable(Box<TypeExpr>),
  /// `(A|B)`.
  Union(Vec<TypeExpr>),
  /// `function(this:T, A, ...B): R`.
  Function {
    this_ty: Option<Box<TypeExpr>>,
    params: Vec<TypeExpr>,
    variadic: bool,
    ret: Option<Box<TypeExpr>>,
  },
  /// `{k1: T1, k2: T2}`.
  Record(Vec<(String, TypeExpr)>),
  /// `*`.
  All,
  /// `?` on its own.
  Unknown,
  /// An expression the comment front end could not parse. Realizing one
  /// produces a `PARSE_ERROR` diagnostic and the unknown type.
  Error,
}

impl TypeExpr {
  pub fn name(text: impl Into<String>) -> Self {
    TypeExpr::Name(text.into())
  }

  pub fn nullable(inner: TypeExpr) -> Self {
    TypeExpr::Nullable(Box::new(inner))
  }

  pub fn non_nullable(inner: TypeExpr) -> Self {
    TypeExpr::NonNullable(Box::new(inner))
  }

  pub fn union(alternates: impl IntoIterator<Item = TypeExpr>) -> Self {
    TypeExpr::Union(alternates.into_iter().collect())
  }
}
