//! Shared diagnostics model and rendering utilities.
//!
//! The data structures here are intentionally minimal and deterministic so
//! they can be reused across scope construction and type inference without
//! pulling in any heavy dependencies.
//!
//! ```
//! use diagnostics::render::{render_diagnostic, SourceProvider};
//! use diagnostics::{Diagnostic, FileId, Span, TextRange};
//!
//! struct SingleFile {
//!   name: String,
//!   text: String,
//! }
//!
//! impl SourceProvider for SingleFile {
//!   fn file_name(&self, _file: FileId) -> Option<&str> {
//!     Some(&self.name)
//!   }
//!
//!   fn file_text(&self, _file: FileId) -> Option<&str> {
//!     Some(&self.text)
//!   }
//! }
//!
//! let file = FileId(0);
//! let provider = SingleFile {
//!   name: "example.js".into(),
//!   text: "let x = 1;".into(),
//! };
//! let diag = Diagnostic::error(
//!   "TYPE0001",
//!   "an example error",
//!   Span {
//!     file,
//!     range: TextRange::new(4, 5),
//!   },
//! );
//!
//! let rendered = render_diagnostic(&provider, &diag);
//! assert!(rendered.contains("TYPE0001"));
//! assert!(rendered.contains("--> example.js:1:5"));
//! ```

pub mod codes;
pub mod render;

use std::fmt::Display;
use std::fmt::Formatter;

/// A stable identifier for a file in a compilation unit. Externs and sources
/// share one id space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A byte range in a file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TextRange {
  pub start: u32,
  pub end: u32,
}

impl TextRange {
  pub const fn new(start: u32, end: u32) -> Self {
    Self { start, end }
  }

  pub const fn empty() -> Self {
    Self { start: 0, end: 0 }
  }

  pub fn len(&self) -> u32 {
    self.end.saturating_sub(self.start)
  }

  pub fn is_empty(&self) -> bool {
    self.start >= self.end
  }
}

/// A span across a specific file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Span {
  pub file: FileId,
  pub range: TextRange,
}

impl Span {
  pub const fn new(file: FileId, range: TextRange) -> Self {
    Self { file, range }
  }

  /// A zero-width span in file 0, for facts with no useful source location.
  pub const fn detached() -> Self {
    Self {
      file: FileId(0),
      range: TextRange::empty(),
    }
  }
}

/// Diagnostic severity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum Severity {
  Error,
  Warning,
  Note,
  Help,
}

impl Severity {
  pub const fn as_str(&self) -> &'static str {
    match self {
      Severity::Error => "error",
      Severity::Warning => "warning",
      Severity::Note => "note",
      Severity::Help => "help",
    }
  }
}

impl Display for Severity {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A label attached to a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
  pub span: Span,
  pub message: String,
  pub is_primary: bool,
}

impl Label {
  pub fn new(span: Span, message: impl Into<String>, is_primary: bool) -> Self {
    Self {
      span,
      message: message.into(),
      is_primary,
    }
  }

  pub fn primary(span: Span, message: impl Into<String>) -> Self {
    Self::new(span, message, true)
  }

  pub fn secondary(span: Span, message: impl Into<String>) -> Self {
    Self::new(span, message, false)
  }
}

/// A user-facing diagnostic with optional labels and notes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub code: &'static str,
  pub severity: Severity,
  pub message: String,
  pub primary: Span,
  pub labels: Vec<Label>,
  pub notes: Vec<String>,
}

impl Diagnostic {
  pub fn new(
    severity: Severity,
    code: &'static str,
    message: impl Into<String>,
    primary: Span,
  ) -> Self {
    Self {
      code,
      severity,
      message: message.into(),
      primary,
      labels: Vec::new(),
      notes: Vec::new(),
    }
  }

  pub fn error(code: &'static str, message: impl Into<String>, primary: Span) -> Self {
    Self::new(Severity::Error, code, message, primary)
  }

  pub fn warning(code: &'static str, message: impl Into<String>, primary: Span) -> Self {
    Self::new(Severity::Warning, code, message, primary)
  }

  pub fn with_label(mut self, label: Label) -> Self {
    self.labels.push(label);
    self
  }

  pub fn with_note(mut self, note: impl Into<String>) -> Self {
    self.notes.push(note.into());
    self
  }

  pub fn push_note(&mut self, note: impl Into<String>) {
    self.notes.push(note.into());
  }
}

/// Canonicalize label ordering within a single diagnostic.
pub fn sort_labels(labels: &mut [Label]) {
  labels.sort_by(|a, b| {
    b.is_primary
      .cmp(&a.is_primary)
      .then_with(|| a.span.cmp(&b.span))
      .then_with(|| a.message.cmp(&b.message))
  });
}

/// Sort diagnostics by position, then code, then message, so output does not
/// depend on traversal order.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
  diagnostics.sort_by(|a, b| {
    a.primary
      .cmp(&b.primary)
      .then_with(|| a.code.cmp(b.code))
      .then_with(|| a.message.cmp(&b.message))
  });
}

/// Accumulator for diagnostics produced across an analysis. Non-internal
/// errors never interrupt the pass; they land here.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
  diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn report(&mut self, diagnostic: Diagnostic) {
    self.diagnostics.push(diagnostic);
  }

  pub fn is_empty(&self) -> bool {
    self.diagnostics.is_empty()
  }

  pub fn len(&self) -> usize {
    self.diagnostics.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.diagnostics.iter()
  }

  pub fn contains_code(&self, code: &str) -> bool {
    self.diagnostics.iter().any(|d| d.code == code)
  }

  /// Drain the accumulated diagnostics in deterministic order.
  pub fn into_sorted(mut self) -> Vec<Diagnostic> {
    for diagnostic in self.diagnostics.iter_mut() {
      sort_labels(&mut diagnostic.labels);
    }
    sort_diagnostics(&mut self.diagnostics);
    self.diagnostics
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::render::render_diagnostic;
  use crate::render::SourceProvider;

  #[derive(Default)]
  struct TestSource {
    name: String,
    text: String,
  }

  impl SourceProvider for TestSource {
    fn file_name(&self, _file: FileId) -> Option<&str> {
      Some(&self.name)
    }

    fn file_text(&self, _file: FileId) -> Option<&str> {
      Some(&self.text)
    }
  }

  #[test]
  fn render_single_line_span() {
    let source = TestSource {
      name: "test.js".into(),
      text: "var x = 1;".into(),
    };
    let diagnostic = Diagnostic::error("TYPE0001", "unused variable", Span {
      file: FileId(0),
      range: TextRange::new(4, 5),
    });

    let rendered = render_diagnostic(&source, &diagnostic);
    let expected =
      "error[TYPE0001]: unused variable\n --> test.js:1:5\n  |\n1 | var x = 1;\n  |     ^ unused variable\n";
    assert_eq!(rendered, expected);
  }

  #[test]
  fn sink_orders_by_position() {
    let mut sink = DiagnosticSink::new();
    let later = Span {
      file: FileId(0),
      range: TextRange::new(9, 10),
    };
    let earlier = Span {
      file: FileId(0),
      range: TextRange::new(2, 3),
    };
    sink.report(Diagnostic::error("B0002", "second", later));
    sink.report(Diagnostic::error("A0001", "first", earlier));
    let sorted = sink.into_sorted();
    assert_eq!(sorted[0].code, "A0001");
    assert_eq!(sorted[1].code, "B0002");
  }

  #[test]
  fn sink_contains_code() {
    let mut sink = DiagnosticSink::new();
    assert!(!sink.contains_code("X0001"));
    sink.report(Diagnostic::warning("X0001", "w", Span::detached()));
    assert!(sink.contains_code("X0001"));
    assert_eq!(sink.len(), 1);
  }
}
