//! Registry of stable diagnostic codes shared by the analysis passes.
//!
//! Each [`Code`] documents the expected shape of the diagnostics a pass
//! emits: the short description, where the primary span should point, and
//! any notes that accompany the diagnostic. Tests match on `id` exactly.

use crate::Diagnostic;
use crate::Span;

/// Metadata describing a diagnostic code.
#[derive(Clone, Copy, Debug)]
pub struct Code {
  /// Stable string identifier, e.g. `PARSE_ERROR`.
  pub id: &'static str,
  /// Short description of what the diagnostic reports.
  pub description: &'static str,
  /// Guidance for where the primary span should be anchored.
  pub primary_span: &'static str,
}

impl Code {
  pub const fn new(
    id: &'static str,
    description: &'static str,
    primary_span: &'static str,
  ) -> Self {
    Code {
      id,
      description,
      primary_span,
    }
  }

  /// Identifier as a plain string (useful for comparisons in tests).
  pub const fn as_str(&self) -> &'static str {
    self.id
  }

  /// Construct an error diagnostic tagged with this code.
  pub fn error(&self, message: impl Into<String>, primary: Span) -> Diagnostic {
    Diagnostic::error(self.id, message, primary)
  }

  /// Construct a warning diagnostic tagged with this code.
  pub fn warning(&self, message: impl Into<String>, primary: Span) -> Diagnostic {
    Diagnostic::warning(self.id, message, primary)
  }
}

/// Malformed annotation or unparseable type expression. Analysis proceeds
/// with the unknown type standing in for whatever the annotation would have
/// supplied.
pub const PARSE_ERROR: Code = Code::new(
  "PARSE_ERROR",
  "malformed annotation or unparseable type expression",
  "the annotation, or the node it is attached to",
);

/// First argument of an object-literal cast was not a constructor.
pub const CONSTRUCTOR_EXPECTED: Code = Code::new(
  "CONSTRUCTOR_EXPECTED",
  "object-literal cast applied to a non-constructor",
  "the first call argument",
);

/// Second argument of an object-literal cast was not an object literal.
pub const OBJECTLIT_EXPECTED: Code = Code::new(
  "OBJECTLIT_EXPECTED",
  "object-literal cast applied to a non-literal",
  "the second call argument",
);

/// Value of one type used where an incompatible type is required. Emitted by
/// checking passes built on top of this core.
pub const TYPE_MISMATCH: Code = Code::new(
  "TYPE_MISMATCH",
  "value of one type used where an incompatible type is required",
  "the offending expression",
);
