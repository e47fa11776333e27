//! In-memory AST and annotation model for annotated JavaScript.
//!
//! This crate defines the inputs the analysis passes consume: an arena AST
//! (statements, expressions, and function bodies addressed by ids), plus the
//! structured documentation annotations (`@type`, `@constructor`, `@enum`,
//! ...) already parsed off comments by an external front end.
//!
//! There is no parser here. Embedders bring their own; tests construct ASTs
//! programmatically through [`build::AstBuilder`].

pub mod ast;
pub mod build;
pub mod doc;
mod ids;

pub use ast::Ast;
pub use ast::BinOp;
pub use ast::Expr;
pub use ast::ExprKind;
pub use ast::ForInit;
pub use ast::Func;
pub use ast::ObjectProp;
pub use ast::Stmt;
pub use ast::StmtKind;
pub use ast::UnOp;
pub use ast::VarBinding;
pub use build::AstBuilder;
pub use doc::DocInfo;
pub use doc::DocParam;
pub use doc::NominalKind;
pub use doc::TypeExpr;
pub use ids::ExprId;
pub use ids::FuncId;
pub use ids::StmtId;
