//! Flow-sensitive type inference for annotated JavaScript.
//!
//! Consumes the scope tree and registry produced by `scopes-js` and runs a
//! monotone dataflow analysis over a statement-level control-flow graph,
//! decorating every expression with an inferred type and finalizing the
//! types of inferred variables. Branch conditions are interpreted in
//! reverse ([`ReverseInterpreter`]) so each successor edge sees a narrowed
//! environment.
//!
//! # Example
//! ```
//! use ast_js::AstBuilder;
//! use infer_js::{Analysis, Root};
//!
//! // var x = 3; x = 'x'; x = true;
//! let mut b = AstBuilder::new();
//! let three = b.num(3.0);
//! let decl = b.var_("x", Some(three));
//! let x1 = b.name("x");
//! let s = b.str_("x");
//! let a1 = b.assign(x1, s);
//! let s1 = b.expr_stmt(a1);
//! let x2 = b.name("x");
//! let t = b.bool_(true);
//! let a2 = b.assign(x2, t);
//! let s2 = b.expr_stmt(a2);
//! let source = b.script(vec![decl, s1, s2]);
//! let externs = AstBuilder::new().script(vec![]);
//!
//! let analysis = Analysis::analyze(&externs, &source);
//! assert_eq!(
//!   analysis.var_type_string("x").as_deref(),
//!   Some("(boolean|number|string)")
//! );
//! ```

mod analysis;
mod cfg;
mod env;
mod infer;
mod rai;

pub use analysis::Analysis;
pub use analysis::Root;
pub use cfg::BasicBlock;
pub use cfg::BlockId;
pub use cfg::BlockKind;
pub use cfg::ControlFlowGraph;
pub use cfg::Edge;
pub use cfg::EdgeKind;
pub use env::FlowEnv;
pub use infer::TypeInference;
pub use rai::NameResolver;
pub use rai::ReverseInterpreter;
