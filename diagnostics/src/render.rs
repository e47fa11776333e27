//! Terminal rendering of diagnostics.
//!
//! A rendered diagnostic is a header line followed by one source section
//! per referenced file, in label order: a `-->` location, the covered
//! source lines with caret (primary) or dash (secondary) underlines, and
//! finally any notes. Label ordering is canonicalized here, so callers
//! never pre-sort, and each section computes its own line-number gutter.
//! Files without backing text degrade to byte-offset form instead of being
//! skipped, which matters for analyses run over programmatically built
//! ASTs.

use crate::Diagnostic;
use crate::FileId;
use crate::Label;
use std::fmt::Write;

/// Provides access to source text for rendering diagnostics.
pub trait SourceProvider {
  /// Returns the display name for a file, or `None` if the file is unknown.
  fn file_name(&self, file: FileId) -> Option<&str>;
  /// Returns the file contents, or `None` if the file is unavailable.
  fn file_text(&self, file: FileId) -> Option<&str>;
}

/// Render a diagnostic into a human-readable string.
pub fn render_diagnostic(provider: &dyn SourceProvider, diagnostic: &Diagnostic) -> String {
  let mut labels = Vec::with_capacity(diagnostic.labels.len() + 1);
  labels.push(Label::primary(diagnostic.primary, diagnostic.message.clone()));
  labels.extend(diagnostic.labels.iter().cloned());
  crate::sort_labels(&mut labels);

  let mut out = String::new();
  let _ = writeln!(
    out,
    "{}[{}]: {}",
    diagnostic.severity, diagnostic.code, diagnostic.message
  );
  for (file, group) in group_by_file(labels) {
    render_file_section(provider, &mut out, file, &group);
  }
  for note in &diagnostic.notes {
    let _ = writeln!(out, "= note: {}", note);
  }
  out
}

/// Bucket labels by file, keeping the first-appearance order (the primary
/// label's file leads).
fn group_by_file(labels: Vec<Label>) -> Vec<(FileId, Vec<Label>)> {
  let mut groups: Vec<(FileId, Vec<Label>)> = Vec::new();
  for label in labels {
    match groups.iter_mut().find(|(file, _)| *file == label.span.file) {
      Some((_, group)) => group.push(label),
      None => groups.push((label.span.file, vec![label])),
    }
  }
  groups
}

fn render_file_section(
  provider: &dyn SourceProvider,
  out: &mut String,
  file: FileId,
  labels: &[Label],
) {
  let name = provider.file_name(file).unwrap_or("<unknown>");
  let Some(text) = provider.file_text(file) else {
    let _ = writeln!(out, " --> {}", name);
    let _ = writeln!(out, "  |");
    for label in labels {
      let mut line = format!(
        "  | {} bytes {}..{}",
        marker_for(label),
        label.span.range.start,
        label.span.range.end
      );
      if !label.message.is_empty() {
        line.push(' ');
        line.push_str(&label.message);
      }
      let _ = writeln!(out, "{}", line);
    }
    return;
  };

  let index = LineIndex::new(text);
  let (line, column) = index.position(labels[0].span.range.start as usize);
  let _ = writeln!(out, " --> {}:{}:{}", name, line, column);

  // Wide enough for the last line any label in this section touches.
  let gutter = labels
    .iter()
    .map(|label| index.line_of(label.span.range.end.saturating_sub(1) as usize) + 1)
    .max()
    .unwrap_or(1)
    .to_string()
    .len();
  let _ = writeln!(out, "{:>width$} |", "", width = gutter);

  for label in labels {
    render_label(out, &index, label, gutter);
  }
}

fn render_label(out: &mut String, index: &LineIndex<'_>, label: &Label, gutter: usize) {
  let marker = marker_for(label);
  let start = (label.span.range.start as usize).min(index.len());
  let end = (label.span.range.end as usize).min(index.len());
  let first_line = index.line_of(start);
  let last_line = index.line_of(end.saturating_sub(1)).max(first_line);

  for line in first_line..=last_line {
    let (line_start, line_end) = index.bounds(line);
    let _ = writeln!(
      out,
      "{:>width$} | {}",
      line + 1,
      &index.text()[line_start..line_end],
      width = gutter
    );

    let span_start = start.clamp(line_start, line_end);
    let span_end = end.clamp(span_start, line_end);
    let pad = span_start - line_start;
    let run = (span_end - span_start).max(1);
    let mut underline = format!("{:>width$} | ", "", width = gutter);
    underline.extend(std::iter::repeat(' ').take(pad));
    underline.extend(std::iter::repeat(marker).take(run));
    if line == first_line && !label.message.is_empty() {
      underline.push(' ');
      underline.push_str(&label.message);
    }
    let _ = writeln!(out, "{}", underline);
  }
}

fn marker_for(label: &Label) -> char {
  if label.is_primary {
    '^'
  } else {
    '-'
  }
}

/// Byte-offset to line mapping for one file, computed once per section.
struct LineIndex<'t> {
  text: &'t str,
  starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
  fn new(text: &'t str) -> Self {
    let mut starts = vec![0];
    starts.extend(
      text
        .bytes()
        .enumerate()
        .filter(|(_, byte)| *byte == b'\n')
        .map(|(at, _)| at + 1),
    );
    Self { text, starts }
  }

  fn text(&self) -> &'t str {
    self.text
  }

  fn len(&self) -> usize {
    self.text.len()
  }

  /// 0-based line containing the (clamped) byte offset.
  fn line_of(&self, offset: usize) -> usize {
    let offset = offset.min(self.text.len());
    self
      .starts
      .partition_point(|start| *start <= offset)
      .saturating_sub(1)
  }

  /// Byte bounds of a line, excluding its terminator.
  fn bounds(&self, line: usize) -> (usize, usize) {
    let start = self.starts[line];
    let end = match self.starts.get(line + 1) {
      Some(next) => next - 1,
      None => self.text.len(),
    };
    (start, end)
  }

  /// 1-based line and column of a byte offset.
  fn position(&self, offset: usize) -> (usize, usize) {
    let offset = offset.min(self.text.len());
    let line = self.line_of(offset);
    (line + 1, offset - self.starts[line] + 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Severity;
  use crate::Span;
  use crate::TextRange;

  struct Sources {
    files: Vec<(Option<String>, Option<String>)>,
  }

  impl SourceProvider for Sources {
    fn file_name(&self, file: FileId) -> Option<&str> {
      self.files.get(file.0 as usize)?.0.as_deref()
    }

    fn file_text(&self, file: FileId) -> Option<&str> {
      self.files.get(file.0 as usize)?.1.as_deref()
    }
  }

  fn one_file(name: &str, text: &str) -> Sources {
    Sources {
      files: vec![(Some(name.to_string()), Some(text.to_string()))],
    }
  }

  #[test]
  fn multi_line_span_underlines_every_covered_line() {
    let sources = one_file("main.js", "function f() {\n  return 1;\n}\n");
    let text_len = sources.files[0].1.as_ref().unwrap().len() as u32;
    let diagnostic = Diagnostic::error("TYPE0002", "broken function", Span {
      file: FileId(0),
      range: TextRange::new(0, text_len),
    });

    let rendered = render_diagnostic(&sources, &diagnostic);
    let expected = concat!(
      "error[TYPE0002]: broken function\n",
      " --> main.js:1:1\n",
      "  |\n",
      "1 | function f() {\n",
      "  | ^^^^^^^^^^^^^^ broken function\n",
      "2 |   return 1;\n",
      "  | ^^^^^^^^^^^\n",
      "3 | }\n",
      "  | ^\n",
    );
    assert_eq!(rendered, expected);
  }

  #[test]
  fn secondary_labels_use_dashes() {
    let sources = one_file("a.js", "var a = 1;");
    let diagnostic = Diagnostic::warning("TYPE0003", "shadowed", Span {
      file: FileId(0),
      range: TextRange::new(4, 5),
    })
    .with_label(Label::secondary(
      Span {
        file: FileId(0),
        range: TextRange::new(8, 9),
      },
      "first assigned here",
    ));

    let rendered = render_diagnostic(&sources, &diagnostic);
    assert!(rendered.starts_with("warning[TYPE0003]: shadowed\n"));
    assert!(rendered.contains("  |     ^ shadowed\n"));
    assert!(rendered.contains("  |         - first assigned here\n"));
  }

  #[test]
  fn each_file_gets_its_own_section() {
    let sources = Sources {
      files: vec![
        (Some("a.js".into()), Some("var a = 1;".into())),
        (Some("b.js".into()), Some("var b = 2;".into())),
      ],
    };
    let diagnostic = Diagnostic::error("TYPE0004", "conflict", Span {
      file: FileId(1),
      range: TextRange::new(4, 5),
    })
    .with_label(Label::secondary(
      Span {
        file: FileId(0),
        range: TextRange::new(4, 5),
      },
      "also declared here",
    ));

    let rendered = render_diagnostic(&sources, &diagnostic);
    // The primary file's section leads.
    let b_at = rendered.find(" --> b.js:1:5").unwrap();
    let a_at = rendered.find(" --> a.js:1:5").unwrap();
    assert!(b_at < a_at);
  }

  #[test]
  fn missing_source_falls_back_to_byte_offsets() {
    let sources = Sources {
      files: vec![(Some("gone.js".into()), None)],
    };
    let diagnostic = Diagnostic::new(
      Severity::Error,
      "TYPE0005",
      "missing text",
      Span {
        file: FileId(0),
        range: TextRange::new(4, 9),
      },
    );

    let rendered = render_diagnostic(&sources, &diagnostic);
    assert!(rendered.contains(" --> gone.js\n"));
    assert!(rendered.contains("  | ^ bytes 4..9 missing text\n"));
  }

  #[test]
  fn empty_span_still_draws_one_marker() {
    let sources = one_file("e.js", "x;");
    let diagnostic = Diagnostic::error("TYPE0006", "here", Span {
      file: FileId(0),
      range: TextRange::new(1, 1),
    });

    let rendered = render_diagnostic(&sources, &diagnostic);
    assert!(rendered.contains("  |  ^ here\n"));
  }
}
