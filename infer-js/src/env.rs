//! Per-program-point variable environments.

use ahash::AHashMap;
use types_js::TypeId;
use types_js::TypeRegistry;

/// The dataflow lattice point: a mapping from variable name to the type it
/// holds at a program point. Missing names fall back to their scope slot.
#[derive(Clone, Debug, Default)]
pub struct FlowEnv {
  vars: AHashMap<String, TypeId>,
}

impl FlowEnv {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<TypeId> {
    self.vars.get(name).copied()
  }

  pub fn set(&mut self, name: &str, ty: TypeId) {
    self.vars.insert(name.to_string(), ty);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeId)> {
    self.vars.iter()
  }

  /// Join another environment into this one, returning whether any mapping
  /// changed. Types merge with union to conservatively cover all reaching
  /// flows.
  pub fn merge_from(&mut self, other: &FlowEnv, registry: &TypeRegistry) -> bool {
    let mut changed = false;
    for (name, ty) in other.vars.iter() {
      match self.vars.get_mut(name) {
        Some(existing) => {
          let next = registry.join(*existing, *ty);
          if next != *existing {
            *existing = next;
            changed = true;
          }
        }
        None => {
          self.vars.insert(name.clone(), *ty);
          changed = true;
        }
      }
    }
    changed
  }
}
