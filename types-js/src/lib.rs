#![deny(missing_debug_implementations)]

//! Canonicalizing type registry and lattice for annotated JavaScript.
//!
//! [`TypeRegistry`] is the sole producer of types for a compilation unit.
//! Every type is a node in an arena addressed by [`TypeId`]; handle equality
//! is type identity, and the registry canonicalizes on construction so that
//! identity coincides with semantic equality (named placeholders excepted;
//! they compare through their referent).
//!
//! The lattice has a unique top (`*`), a unique bottom, and a wildcard (`?`)
//! that is both subtype and supertype of everything. Unions are flattened,
//! deduplicated, and kept in textual order so diagnostic strings are stable.
//!
//! # Example
//! ```
//! use types_js::TypeRegistry;
//!
//! let registry = TypeRegistry::new();
//! let n = registry.natives();
//! let ty = registry.create_union([n.string, n.number, n.boolean]);
//! assert_eq!(
//!   registry.display(ty).to_string(),
//!   "(boolean|number|string)"
//! );
//! assert!(registry.is_subtype(n.number, ty));
//! ```

mod display;
mod ids;
mod kind;
mod narrow;
mod object;
mod relate;
mod signature;
mod store;
mod ternary;

pub use display::TypeDisplay;
pub use ids::TypeId;
pub use kind::EnumData;
pub use kind::EnumElementData;
pub use kind::NamedData;
pub use kind::RecordData;
pub use kind::TypeData;
pub use narrow::BoolOutcomes;
pub use object::ObjectData;
pub use object::ObjectKind;
pub use object::Prop;
pub use object::PropFlags;
pub use signature::FunctionData;
pub use signature::FunctionKind;
pub use signature::Param;
pub use store::NativeIds;
pub use store::NativeKind;
pub use store::TypeRegistry;
pub use ternary::Ternary;
