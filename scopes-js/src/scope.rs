use ast_js::StmtId;
use std::collections::BTreeMap;
use types_js::TypeId;
use types_js::TypeRegistry;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ScopeId(pub u32);

impl ScopeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// A named binding in a scope. Declared vars carry an annotation-backed type
/// that inference never widens; inferred vars are finalized to the join over
/// their observed assignments.
#[derive(Clone, Debug)]
pub struct Var {
  pub name: String,
  pub ty: TypeId,
  pub declared: bool,
  pub decl_stmt: Option<StmtId>,
}

impl Var {
  pub fn is_type_inferred(&self) -> bool {
    !self.declared
  }
}

#[derive(Debug)]
pub struct ScopeData {
  pub parent: Option<ScopeId>,
  /// Keys may be dotted: a qualified name is stored as a direct entry when
  /// its head is a namespace object.
  vars: BTreeMap<String, Var>,
  /// The type of `this` inside this scope.
  pub this_ty: TypeId,
}

/// The lexical scope tree for one compilation unit. The root is the global
/// scope, shared by the externs and source roots.
#[derive(Debug, Default)]
pub struct ScopeTree {
  scopes: Vec<ScopeData>,
}

impl ScopeTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn create_root(&mut self, this_ty: TypeId) -> ScopeId {
    debug_assert!(self.scopes.is_empty());
    self.push(None, this_ty)
  }

  pub fn create_child(&mut self, parent: ScopeId, this_ty: TypeId) -> ScopeId {
    self.push(Some(parent), this_ty)
  }

  fn push(&mut self, parent: Option<ScopeId>, this_ty: TypeId) -> ScopeId {
    let id = ScopeId(self.scopes.len() as u32);
    self.scopes.push(ScopeData {
      parent,
      vars: BTreeMap::new(),
      this_ty,
    });
    id
  }

  pub fn root(&self) -> ScopeId {
    ScopeId(0)
  }

  pub fn is_global(&self, scope: ScopeId) -> bool {
    self.scopes[scope.index()].parent.is_none()
  }

  pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
    self.scopes[scope.index()].parent
  }

  pub fn this_type(&self, scope: ScopeId) -> TypeId {
    self.scopes[scope.index()].this_ty
  }

  /// Declare a name. A second declaration in the same scope does not shadow:
  /// the types join, and the var counts as declared once any declaration is
  /// annotated.
  pub fn declare(
    &mut self,
    registry: &TypeRegistry,
    scope: ScopeId,
    name: &str,
    ty: TypeId,
    declared: bool,
    decl_stmt: Option<StmtId>,
  ) {
    let vars = &mut self.scopes[scope.index()].vars;
    match vars.get_mut(name) {
      Some(existing) => {
        existing.ty = registry.join(existing.ty, ty);
        existing.declared |= declared;
      }
      None => {
        vars.insert(name.to_string(), Var {
          name: name.to_string(),
          ty,
          declared,
          decl_stmt,
        });
      }
    }
  }

  /// Look a name up, walking to the parent on a miss.
  pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Var> {
    let mut current = Some(scope);
    while let Some(id) = current {
      let data = &self.scopes[id.index()];
      if let Some(var) = data.vars.get(name) {
        return Some(var);
      }
      current = data.parent;
    }
    None
  }

  /// The scope a name resolves in, if any.
  pub fn scope_of(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
    let mut current = Some(scope);
    while let Some(id) = current {
      let data = &self.scopes[id.index()];
      if data.vars.contains_key(name) {
        return Some(id);
      }
      current = data.parent;
    }
    None
  }

  /// A var owned by this exact scope (no parent walk).
  pub fn own_var(&self, scope: ScopeId, name: &str) -> Option<&Var> {
    self.scopes[scope.index()].vars.get(name)
  }

  pub fn set_var_type(&mut self, scope: ScopeId, name: &str, ty: TypeId) {
    if let Some(var) = self.scopes[scope.index()].vars.get_mut(name) {
      var.ty = ty;
    }
  }

  pub fn vars(&self, scope: ScopeId) -> impl Iterator<Item = &Var> {
    self.scopes[scope.index()].vars.values()
  }

  pub fn len(&self) -> usize {
    self.scopes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scopes.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lookup_walks_to_parent() {
    let registry = TypeRegistry::new();
    let n = registry.natives();
    let mut tree = ScopeTree::new();
    let root = tree.create_root(n.global_this);
    let child = tree.create_child(root, n.global_this);

    tree.declare(&registry, root, "outer", n.number, true, None);
    tree.declare(&registry, child, "inner", n.string, false, None);

    assert_eq!(tree.lookup(child, "outer").unwrap().ty, n.number);
    assert_eq!(tree.lookup(child, "inner").unwrap().ty, n.string);
    assert!(tree.lookup(root, "inner").is_none());
    assert!(tree.is_global(root));
    assert!(!tree.is_global(child));
  }

  #[test]
  fn redeclaration_joins_instead_of_shadowing() {
    let registry = TypeRegistry::new();
    let n = registry.natives();
    let mut tree = ScopeTree::new();
    let root = tree.create_root(n.global_this);

    tree.declare(&registry, root, "x", n.number, false, None);
    tree.declare(&registry, root, "x", n.string, true, None);

    let var = tree.lookup(root, "x").unwrap();
    assert!(var.declared);
    assert_eq!(registry.display(var.ty).to_string(), "(number|string)");
  }
}
