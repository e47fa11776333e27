//! Textual type forms.
//!
//! These strings are contractually stable: diagnostics and tests match on
//! them exactly. Union alternates are already stored in textual order, so
//! rendering never sorts.

use crate::ids::TypeId;
use crate::kind::TypeData;
use crate::object::ObjectData;
use crate::signature::FunctionData;
use crate::store::TypeRegistry;
use std::fmt;

#[derive(Debug)]
pub struct TypeDisplay<'a> {
  registry: &'a TypeRegistry,
  ty: TypeId,
}

impl<'a> TypeDisplay<'a> {
  pub fn new(registry: &'a TypeRegistry, ty: TypeId) -> Self {
    Self { registry, ty }
  }

  fn fmt_type(&self, ty: TypeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.registry.data(ty) {
      TypeData::All => write!(f, "*"),
      TypeData::Unknown => write!(f, "?"),
      TypeData::No => write!(f, "None"),
      TypeData::NoObject => write!(f, "NoObject"),
      TypeData::Number => write!(f, "number"),
      TypeData::String => write!(f, "string"),
      TypeData::Boolean => write!(f, "boolean"),
      TypeData::Null => write!(f, "null"),
      TypeData::Void => write!(f, "undefined"),
      TypeData::Union(alternates) => {
        write!(f, "(")?;
        let mut iter = alternates.iter().peekable();
        while let Some(alt) = iter.next() {
          self.fmt_type(*alt, f)?;
          if iter.peek().is_some() {
            write!(f, "|")?;
          }
        }
        write!(f, ")")
      }
      TypeData::Object(object) => self.fmt_object(&object, f),
      TypeData::Function(function) => self.fmt_function(&function, f),
      TypeData::Enum(e) => {
        write!(f, "enum{{{}}}", e.object.name.as_deref().unwrap_or("<anonymous>"))
      }
      TypeData::EnumElement(element) => {
        let enum_name = match self.registry.data(element.enum_ty) {
          TypeData::Enum(e) => e.object.name.unwrap_or_else(|| "<anonymous>".to_string()),
          _ => "<anonymous>".to_string(),
        };
        write!(f, "{}.<", enum_name)?;
        self.fmt_type(element.element, f)?;
        write!(f, ">")
      }
      TypeData::Record(record) => {
        write!(f, "{{")?;
        let mut iter = record.fields.iter().peekable();
        while let Some((name, field_ty)) = iter.next() {
          write!(f, " {} : ", name)?;
          self.fmt_type(*field_ty, f)?;
          if iter.peek().is_some() {
            write!(f, ",")?;
          }
        }
        write!(f, " }}")
      }
      TypeData::Named(named) => write!(f, "{}", named.name),
      TypeData::Template(name) => write!(f, "{}", name),
    }
  }

  fn fmt_object(&self, object: &ObjectData, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &object.name {
      Some(name) => write!(f, "{}", name),
      None => write!(f, "{{...}}"),
    }
  }

  fn fmt_function(&self, function: &FunctionData, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "function (")?;
    let mut wrote_any = false;
    if let Some(this_ty) = function.this_ty {
      write!(f, "this:")?;
      self.fmt_type(this_ty, f)?;
      wrote_any = true;
    }
    for param in &function.params {
      if wrote_any {
        write!(f, ", ")?;
      }
      if param.variadic {
        write!(f, "...")?;
      }
      self.fmt_type(param.ty, f)?;
      if param.optional {
        write!(f, "=")?;
      }
      wrote_any = true;
    }
    write!(f, "): ")?;
    self.fmt_type(function.ret, f)
  }
}

impl<'a> fmt::Display for TypeDisplay<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.fmt_type(self.ty, f)
  }
}
