//! Branch-sensitive type restrictions.
//!
//! These are the primitives the reverse abstract interpreter composes:
//! restriction by boolean-coercion outcome, by null/void removal, and by
//! `typeof` tag. Unions restrict alternate-wise and recanonicalize.

use crate::ids::TypeId;
use crate::kind::TypeData;
use crate::store::TypeRegistry;
use bitflags::bitflags;

bitflags! {
  /// The set of values the ToBoolean predicate can produce for a type.
  #[derive(Clone, Copy, Debug, PartialEq, Eq)]
  pub struct BoolOutcomes: u8 {
    const TRUE = 1 << 0;
    const FALSE = 1 << 1;
  }
}

impl BoolOutcomes {
  pub fn contains_outcome(self, outcome: bool) -> bool {
    if outcome {
      self.contains(BoolOutcomes::TRUE)
    } else {
      self.contains(BoolOutcomes::FALSE)
    }
  }
}

impl TypeRegistry {
  /// Which boolean values coercion of the type can produce: null and
  /// undefined only coerce to false, objects only to true, the value
  /// primitives to either. The bottom types have no values at all.
  pub fn possible_boolean_outcomes(&self, ty: TypeId) -> BoolOutcomes {
    match self.data(self.resolve(ty)) {
      TypeData::Null | TypeData::Void => BoolOutcomes::FALSE,
      TypeData::Number | TypeData::String | TypeData::Boolean => BoolOutcomes::all(),
      TypeData::Object(_) | TypeData::Function(_) | TypeData::Enum(_) | TypeData::Record(_) => {
        BoolOutcomes::TRUE
      }
      TypeData::EnumElement(element) => self.possible_boolean_outcomes(element.element),
      TypeData::Union(alternates) => alternates
        .iter()
        .fold(BoolOutcomes::empty(), |acc, alt| {
          acc | self.possible_boolean_outcomes(*alt)
        }),
      TypeData::No | TypeData::NoObject => BoolOutcomes::empty(),
      TypeData::All | TypeData::Unknown | TypeData::Named(_) | TypeData::Template(_) => {
        BoolOutcomes::all()
      }
    }
  }

  /// The subset of the type whose boolean coercion can produce `outcome`;
  /// the bottom type when no value of the type can.
  pub fn restrict_by_truthy(&self, ty: TypeId, outcome: bool) -> TypeId {
    let ty = self.resolve(ty);
    match self.data(ty) {
      TypeData::Union(alternates) => {
        let restricted: Vec<TypeId> = alternates
          .into_iter()
          .map(|alt| self.restrict_by_truthy(alt, outcome))
          .collect();
        self.create_union(restricted)
      }
      _ => {
        if self.possible_boolean_outcomes(ty).contains_outcome(outcome) {
          ty
        } else {
          self.natives().no
        }
      }
    }
  }

  /// Remove the null and undefined alternates from a union; identity for
  /// every other type.
  pub fn restrict_not_null_or_void(&self, ty: TypeId) -> TypeId {
    let ty = self.resolve(ty);
    match self.data(ty) {
      TypeData::Union(alternates) => {
        let remaining: Vec<TypeId> = alternates
          .into_iter()
          .filter(|alt| !matches!(self.data(*alt), TypeData::Null | TypeData::Void))
          .collect();
        self.create_union(remaining)
      }
      _ => ty,
    }
  }

  /// The `typeof` tag a type's values report, when every value agrees.
  pub fn typeof_tag(&self, ty: TypeId) -> Option<&'static str> {
    match self.data(self.resolve(ty)) {
      TypeData::Number => Some("number"),
      TypeData::String => Some("string"),
      TypeData::Boolean => Some("boolean"),
      TypeData::Void => Some("undefined"),
      // `typeof null` is "object".
      TypeData::Null | TypeData::Object(_) | TypeData::Enum(_) | TypeData::Record(_) => {
        Some("object")
      }
      TypeData::Function(_) => Some("function"),
      TypeData::EnumElement(element) => self.typeof_tag(element.element),
      _ => None,
    }
  }

  /// The subset of the type whose `typeof` tag comparison with `tag` has
  /// the given outcome. On a wildcard operand the true branch materializes
  /// the canonical type for the tag.
  pub fn restrict_by_typeof(&self, ty: TypeId, tag: &str, outcome: bool) -> TypeId {
    let natives = self.natives();
    let ty = self.resolve(ty);
    match self.data(ty) {
      TypeData::Union(alternates) => {
        let restricted: Vec<TypeId> = alternates
          .into_iter()
          .map(|alt| self.restrict_by_typeof(alt, tag, outcome))
          .collect();
        self.create_union(restricted)
      }
      TypeData::All | TypeData::Unknown | TypeData::Named(_) | TypeData::Template(_) => {
        if outcome {
          match tag {
            "number" => natives.number,
            "string" => natives.string,
            "boolean" => natives.boolean,
            "undefined" => natives.void,
            "object" => self.create_union([natives.object, natives.null]),
            _ => ty,
          }
        } else {
          ty
        }
      }
      _ => match self.typeof_tag(ty) {
        Some(own_tag) => {
          if (own_tag == tag) == outcome {
            ty
          } else {
            natives.no
          }
        }
        None => ty,
      },
    }
  }
}
