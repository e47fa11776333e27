//! Lexical scoping and typed scope construction for annotated JavaScript.
//!
//! Three pieces, consumed by the inference engine:
//!
//! - [`ScopeTree`]: the lexical store mapping names (possibly dotted) to
//!   [`Var`] descriptors, with parent-walking lookup.
//! - [`DocAdapter`]: the only component that interprets doc annotations; it
//!   realizes parsed type expressions against the registry and surfaces
//!   typed facts.
//! - [`ScopeCreator`]: the two-phase AST walk that materializes nominal
//!   types, declares variables, and assigns property types.

mod adapter;
mod creator;
mod scope;

pub use adapter::DocAdapter;
pub use adapter::RealizeError;
pub use creator::RootInput;
pub use creator::ScopeCreator;
pub use creator::ScopesResult;
pub use scope::ScopeId;
pub use scope::ScopeTree;
pub use scope::Var;
