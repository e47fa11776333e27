//! Reverse abstract interpretation of branch conditions.
//!
//! Given a condition expression and the outcome a branch assumes, produce
//! the narrowed bindings that hold along that branch. Refinements are local
//! to the branch; the inference engine overlays them onto the propagated
//! environment.

use ast_js::Ast;
use ast_js::BinOp;
use ast_js::ExprId;
use ast_js::ExprKind;
use ast_js::UnOp;
use types_js::TypeData;
use types_js::TypeId;
use types_js::TypeRegistry;

/// A resolver for the current type of a (possibly dotted) name, combining
/// the flow environment with the scope's declared types.
pub type NameResolver<'a> = dyn Fn(&str) -> Option<TypeId> + 'a;

pub struct ReverseInterpreter<'a> {
  registry: &'a TypeRegistry,
  ast: &'a Ast,
}

impl<'a> std::fmt::Debug for ReverseInterpreter<'a> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ReverseInterpreter").finish_non_exhaustive()
  }
}

impl<'a> ReverseInterpreter<'a> {
  pub fn new(registry: &'a TypeRegistry, ast: &'a Ast) -> Self {
    Self { registry, ast }
  }

  /// The bindings that hold when `expr` evaluates to `outcome`.
  pub fn refine(
    &self,
    expr: ExprId,
    outcome: bool,
    lookup: &NameResolver<'_>,
  ) -> Vec<(String, TypeId)> {
    let registry = self.registry;
    match self.ast.expr(expr).kind.clone() {
      ExprKind::Name(name) => {
        let Some(current) = lookup(&name) else {
          return Vec::new();
        };
        vec![(name, registry.restrict_by_truthy(current, outcome))]
      }
      ExprKind::Un {
        op: UnOp::Not,
        operand,
      } => self.refine(operand, !outcome, lookup),
      ExprKind::Bin { op, lhs, rhs } => self.refine_binary(op, lhs, rhs, outcome, lookup),
      _ => Vec::new(),
    }
  }

  fn refine_binary(
    &self,
    op: BinOp,
    lhs: ExprId,
    rhs: ExprId,
    outcome: bool,
    lookup: &NameResolver<'_>,
  ) -> Vec<(String, TypeId)> {
    let registry = self.registry;
    match op {
      BinOp::And => {
        if outcome {
          // Both operands were truthy; later refinements shadow earlier.
          let mut bindings = self.refine(lhs, true, lookup);
          bindings.extend(self.refine(rhs, true, lookup));
          dedup_last_wins(bindings)
        } else {
          // Either the left was falsy, or it was truthy and the right
          // falsy; only facts common to both worlds survive, joined.
          let left = self.refine(lhs, false, lookup);
          let mut right = self.refine(lhs, true, lookup);
          right.extend(self.refine(rhs, false, lookup));
          let right = dedup_last_wins(right);
          join_common(registry, left, right)
        }
      }
      BinOp::Or => {
        if outcome {
          let left = self.refine(lhs, true, lookup);
          let mut right = self.refine(lhs, false, lookup);
          right.extend(self.refine(rhs, true, lookup));
          let right = dedup_last_wins(right);
          join_common(registry, left, right)
        } else {
          let mut bindings = self.refine(lhs, false, lookup);
          bindings.extend(self.refine(rhs, false, lookup));
          dedup_last_wins(bindings)
        }
      }
      BinOp::LooseEq | BinOp::LooseNe | BinOp::StrictEq | BinOp::StrictNe => {
        let equality = matches!(op, BinOp::LooseEq | BinOp::StrictEq);
        let strict = matches!(op, BinOp::StrictEq | BinOp::StrictNe);
        // `outcome` tells us how the comparison went; fold the operator's
        // own polarity in so `matched` means "compared equal".
        let matched = equality == outcome;

        if let Some(bindings) = self.refine_typeof(lhs, rhs, matched, lookup) {
          return bindings;
        }

        let (name_side, literal_side) = match self.name_of(lhs) {
          Some(_) => (lhs, rhs),
          None => (rhs, lhs),
        };
        let Some(name) = self.name_of(name_side) else {
          return Vec::new();
        };
        let Some(current) = lookup(&name) else {
          return Vec::new();
        };

        let narrowed = match self.null_void_kind(literal_side) {
          Some(NullVoidKind::Null) if strict => {
            if matched {
              registry.meet(current, registry.natives().null)
            } else {
              self.remove_alternate(current, NullVoidKind::Null)
            }
          }
          Some(NullVoidKind::Void) if strict => {
            if matched {
              registry.meet(current, registry.natives().void)
            } else {
              self.remove_alternate(current, NullVoidKind::Void)
            }
          }
          // Loose comparison against null or undefined narrows to (or
          // away from) the whole null/void subset.
          Some(_) => {
            if matched {
              registry.meet(current, registry.natives().null_or_void)
            } else {
              registry.restrict_not_null_or_void(current)
            }
          }
          None => return Vec::new(),
        };
        vec![(name, narrowed)]
      }
      BinOp::InstanceOf => {
        let Some(name) = self.name_of(lhs) else {
          return Vec::new();
        };
        let Some(current) = lookup(&name) else {
          return Vec::new();
        };
        let instance = self
          .name_of(rhs)
          .and_then(|ctor_name| lookup(&ctor_name))
          .map(|ty| registry.restrict_not_null_or_void(ty))
          .and_then(|ty| registry.instance_type(ty));
        let Some(instance) = instance else {
          return Vec::new();
        };
        if outcome {
          vec![(name, registry.meet(current, instance))]
        } else {
          vec![(name, self.remove_subtypes_of(current, instance))]
        }
      }
      _ => Vec::new(),
    }
  }

  /// `typeof x == "tag"` in either operand order.
  fn refine_typeof(
    &self,
    lhs: ExprId,
    rhs: ExprId,
    matched: bool,
    lookup: &NameResolver<'_>,
  ) -> Option<Vec<(String, TypeId)>> {
    let (operand, tag) = self
      .typeof_operand(lhs)
      .zip(self.string_literal(rhs))
      .or_else(|| self.typeof_operand(rhs).zip(self.string_literal(lhs)))?;
    let name = self.name_of(operand)?;
    let current = lookup(&name)?;
    Some(vec![(
      name,
      self.registry.restrict_by_typeof(current, &tag, matched),
    )])
  }

  fn typeof_operand(&self, expr: ExprId) -> Option<ExprId> {
    match self.ast.expr(expr).kind {
      ExprKind::Un {
        op: UnOp::TypeOf,
        operand,
      } => Some(operand),
      _ => None,
    }
  }

  fn string_literal(&self, expr: ExprId) -> Option<String> {
    match &self.ast.expr(expr).kind {
      ExprKind::Str(value) => Some(value.clone()),
      _ => None,
    }
  }

  fn name_of(&self, expr: ExprId) -> Option<String> {
    match &self.ast.expr(expr).kind {
      ExprKind::Name(name) if name != "undefined" => Some(name.clone()),
      _ => None,
    }
  }

  fn null_void_kind(&self, expr: ExprId) -> Option<NullVoidKind> {
    match &self.ast.expr(expr).kind {
      ExprKind::Null => Some(NullVoidKind::Null),
      ExprKind::Name(name) if name == "undefined" => Some(NullVoidKind::Void),
      ExprKind::Un {
        op: UnOp::Void, ..
      } => Some(NullVoidKind::Void),
      _ => None,
    }
  }

  /// Remove one of the null/void singletons from a union; identity
  /// elsewhere.
  fn remove_alternate(&self, ty: TypeId, which: NullVoidKind) -> TypeId {
    let registry = self.registry;
    let ty = registry.resolve(ty);
    match registry.data(ty) {
      TypeData::Union(alternates) => {
        let remaining: Vec<TypeId> = alternates
          .into_iter()
          .filter(|alt| {
            !matches!(
              (registry.data(*alt), which),
              (TypeData::Null, NullVoidKind::Null) | (TypeData::Void, NullVoidKind::Void)
            )
          })
          .collect();
        registry.create_union(remaining)
      }
      _ => ty,
    }
  }

  /// Remove the union alternates that are instances of the tested
  /// constructor; identity for non-unions.
  fn remove_subtypes_of(&self, ty: TypeId, instance: TypeId) -> TypeId {
    let registry = self.registry;
    let ty = registry.resolve(ty);
    match registry.data(ty) {
      TypeData::Union(alternates) => {
        let remaining: Vec<TypeId> = alternates
          .into_iter()
          .filter(|alt| !registry.is_subtype(*alt, instance))
          .collect();
        registry.create_union(remaining)
      }
      _ => ty,
    }
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum NullVoidKind {
  Null,
  Void,
}

fn dedup_last_wins(bindings: Vec<(String, TypeId)>) -> Vec<(String, TypeId)> {
  let mut out: Vec<(String, TypeId)> = Vec::with_capacity(bindings.len());
  for (name, ty) in bindings {
    if let Some(slot) = out.iter_mut().find(|(existing, _)| *existing == name) {
      slot.1 = ty;
    } else {
      out.push((name, ty));
    }
  }
  out
}

/// Keep only the names refined in both worlds, joining their types.
fn join_common(
  registry: &TypeRegistry,
  left: Vec<(String, TypeId)>,
  right: Vec<(String, TypeId)>,
) -> Vec<(String, TypeId)> {
  let mut out = Vec::new();
  for (name, left_ty) in left {
    if let Some((_, right_ty)) = right.iter().find(|(right_name, _)| *right_name == name) {
      out.push((name, registry.join(left_ty, *right_ty)));
    }
  }
  out
}
