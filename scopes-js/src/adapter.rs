//! Doc-info adapter: realizes parsed annotation expressions against the
//! type registry.
//!
//! All doc interpretation is isolated here; the scope creator consumes the
//! typed facts this module produces and never inspects annotation syntax
//! itself. A name that does not refer to a declared type yet becomes a named
//! placeholder, resolved lazily once the declaration appears.

use ast_js::DocInfo;
use ast_js::Func;
use ast_js::TypeExpr;
use diagnostics::codes::PARSE_ERROR;
use diagnostics::DiagnosticSink;
use diagnostics::Span;
use thiserror::Error;
use types_js::FunctionKind;
use types_js::Param;
use types_js::TypeId;
use types_js::TypeRegistry;

/// Structural problems in an annotation expression. Surfaced to callers as
/// a `PARSE_ERROR` diagnostic; analysis proceeds with the unknown type.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RealizeError {
  #[error("unparseable type expression")]
  Malformed,
  #[error("union with no alternates")]
  EmptyUnion,
  #[error("empty name component")]
  EmptyName,
}

pub struct DocAdapter<'a> {
  registry: &'a TypeRegistry,
  /// Template parameter names in scope while realizing; a name matching one
  /// becomes a template placeholder instead of a nominal reference.
  templates: Vec<String>,
}

impl<'a> std::fmt::Debug for DocAdapter<'a> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DocAdapter")
      .field("templates", &self.templates)
      .finish()
  }
}

impl<'a> DocAdapter<'a> {
  pub fn new(registry: &'a TypeRegistry) -> Self {
    Self {
      registry,
      templates: Vec::new(),
    }
  }

  pub fn with_templates(registry: &'a TypeRegistry, templates: Vec<String>) -> Self {
    Self {
      registry,
      templates,
    }
  }

  /// Realize a type expression, reporting malformed input and defaulting to
  /// the unknown type.
  pub fn realize(&self, expr: &TypeExpr, span: Span, sink: &mut DiagnosticSink) -> TypeId {
    match self.realize_inner(expr) {
      Ok(ty) => ty,
      Err(error) => {
        sink.report(PARSE_ERROR.error(error.to_string(), span));
        self.registry.natives().unknown
      }
    }
  }

  /// Realize a reference that must denote a bare nominal (an `@extends` or
  /// `@implements` operand): the implicit nullability of a name reference is
  /// stripped.
  pub fn realize_nominal(&self, expr: &TypeExpr, span: Span, sink: &mut DiagnosticSink) -> TypeId {
    let ty = self.realize(expr, span, sink);
    self.registry.restrict_not_null_or_void(ty)
  }

  fn realize_inner(&self, expr: &TypeExpr) -> Result<TypeId, RealizeError> {
    let registry = self.registry;
    let n = registry.natives();
    match expr {
      TypeExpr::All => Ok(n.all),
      TypeExpr::Unknown => Ok(n.unknown),
      TypeExpr::Error => Err(RealizeError::Malformed),
      TypeExpr::Name(name) => self.realize_name(name),
      TypeExpr::Nullable(inner) => {
        let inner = self.realize_inner(inner)?;
        Ok(registry.create_union([inner, n.null]))
      }
      TypeExpr::NonNullable(inner) => {
        let inner = self.realize_inner(inner)?;
        Ok(registry.restrict_not_null_or_void(inner))
      }
      TypeExpr::Union(alternates) => {
        if alternates.is_empty() {
          return Err(RealizeError::EmptyUnion);
        }
        let mut ids = Vec::with_capacity(alternates.len());
        for alt in alternates {
          ids.push(self.realize_inner(alt)?);
        }
        Ok(registry.create_union(ids))
      }
      TypeExpr::Function {
        this_ty,
        params,
        variadic,
        ret,
      } => {
        let this_ty = match this_ty {
          Some(expr) => Some(registry.restrict_not_null_or_void(self.realize_inner(expr)?)),
          None => None,
        };
        let mut realized = Vec::with_capacity(params.len());
        let last = params.len().checked_sub(1);
        for (i, param) in params.iter().enumerate() {
          let ty = self.realize_inner(param)?;
          realized.push(Param {
            ty,
            optional: false,
            variadic: *variadic && Some(i) == last,
          });
        }
        let ret = match ret {
          Some(expr) => self.realize_inner(expr)?,
          None => n.unknown,
        };
        Ok(registry.create_function(realized, ret, this_ty))
      }
      TypeExpr::Record(fields) => {
        let mut realized = Vec::with_capacity(fields.len());
        for (name, field) in fields {
          if name.is_empty() {
            return Err(RealizeError::EmptyName);
          }
          realized.push((name.clone(), self.realize_inner(field)?));
        }
        Ok(registry.create_record(realized))
      }
    }
  }

  fn realize_name(&self, name: &str) -> Result<TypeId, RealizeError> {
    if name.is_empty() || name.split('.').any(|part| part.is_empty()) {
      return Err(RealizeError::EmptyName);
    }
    let registry = self.registry;
    let n = registry.natives();
    if self.templates.iter().any(|t| t.as_str() == name) {
      return Ok(registry.create_template(name));
    }
    Ok(match name {
      "number" => n.number,
      "string" => n.string,
      "boolean" => n.boolean,
      "null" => n.null,
      "undefined" | "void" => n.void,
      "Object" => registry.create_union([n.object, n.null]),
      "Number" => registry.create_union([n.number_object, n.null]),
      "String" => registry.create_union([n.string_object, n.null]),
      "Boolean" => registry.create_union([n.boolean_object, n.null]),
      _ => match registry.get(name) {
        // A reference to a nominal instance is nullable by default; `!T`
        // strips the null again.
        Some(ty) if registry.instance_type(ty).is_some() => {
          let instance = registry.instance_type(ty).unwrap();
          registry.create_union([instance, n.null])
        }
        Some(ty) => match registry.enum_element_type(ty) {
          Some(element) => element,
          None => ty,
        },
        None => registry.create_union([registry.create_named(name), n.null]),
      },
    })
  }

  /// The function type a declaration's annotations and literal shape
  /// describe: `@param` types positionally matched against the literal's
  /// parameter names, `@return` for the result, untyped slots unknown.
  pub fn function_type(
    &self,
    doc: Option<&DocInfo>,
    func: &Func,
    this_ty: Option<TypeId>,
    span: Span,
    sink: &mut DiagnosticSink,
  ) -> TypeId {
    let registry = self.registry;
    let n = registry.natives();
    let mut params = Vec::with_capacity(func.params.len());
    for name in &func.params {
      let mut realized = Param {
        ty: n.unknown,
        optional: false,
        variadic: false,
      };
      if let Some(doc) = doc {
        if let Some(doc_param) = doc.params.iter().find(|p| &p.name == name) {
          if let Some(expr) = &doc_param.ty {
            realized.ty = self.realize(expr, span, sink);
          }
          realized.variadic = doc_param.variadic;
        }
      }
      params.push(realized);
    }
    let ret = match doc.and_then(|d| d.ret.as_ref()) {
      Some(expr) => self.realize(expr, span, sink),
      None => n.unknown,
    };
    let func_ty = registry.create_function(params, ret, this_ty);
    if let Some(doc) = doc {
      if !doc.templates.is_empty() {
        registry.set_function_templates(func_ty, doc.templates.clone());
      }
    }
    func_ty
  }

  /// The function type described by a doc block alone (`@param`/`@return`
  /// with no function literal), as used by stub declarations.
  pub fn stub_function_type(
    &self,
    doc: &DocInfo,
    this_ty: Option<TypeId>,
    span: Span,
    sink: &mut DiagnosticSink,
  ) -> TypeId {
    let registry = self.registry;
    let n = registry.natives();
    let params = doc
      .params
      .iter()
      .map(|doc_param| Param {
        ty: match doc_param.ty.as_ref() {
          Some(expr) => self.realize(expr, span, sink),
          None => n.unknown,
        },
        optional: false,
        variadic: doc_param.variadic,
      })
      .collect();
    let ret = match doc.ret.as_ref() {
      Some(expr) => self.realize(expr, span, sink),
      None => n.unknown,
    };
    registry.create_function(params, ret, this_ty)
  }

  /// The nominal function type for a `@constructor` / `@interface`
  /// declaration site, paired with its instance and prototype.
  pub fn nominal_function_type(
    &self,
    name: &str,
    doc: &DocInfo,
    func: Option<&Func>,
    span: Span,
    sink: &mut DiagnosticSink,
  ) -> TypeId {
    let registry = self.registry;
    let n = registry.natives();
    let kind = match doc.kind {
      Some(ast_js::NominalKind::Interface) => FunctionKind::Interface,
      _ => FunctionKind::Constructor,
    };
    let mut params = Vec::new();
    if let Some(func) = func {
      for param_name in &func.params {
        let doc_param = doc.params.iter().find(|p| &p.name == param_name);
        let ty = match doc_param.and_then(|p| p.ty.as_ref()) {
          Some(expr) => self.realize(expr, span, sink),
          None => n.unknown,
        };
        params.push(Param {
          ty,
          optional: false,
          variadic: doc_param.map(|p| p.variadic).unwrap_or(false),
        });
      }
    }
    let func_ty = registry.create_nominal_function(name, params, n.unknown, kind);
    if !doc.templates.is_empty() {
      registry.set_function_templates(func_ty, doc.templates.clone());
    }
    func_ty
  }
}
