//! Source scanning and rewriting.
//!
//! A file is scanned once into a [`ScannedSource`]: the module references it
//! makes plus the edits that strip type syntax and comments. Rendering applies
//! those edits together with the caller's rewritten specifiers.

mod annotations;
mod cursor;
mod lexer;
mod scan;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use cursor::Cursor;

#[derive(Debug, Error)]
pub enum ParseError {
  #[error("cannot read {}: {source}", path.display())]
  Unreadable {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("{}:{line}: {message}", path.display())]
  Syntax { path: PathBuf, line: usize, message: String },
}

impl ParseError {
  pub(crate) fn at(src: &str, offset: usize, message: impl Into<String>) -> Self {
    let offset = offset.min(src.len());
    let line = src.as_bytes()[..offset].iter().filter(|b| **b == b'\n').count() + 1;
    ParseError::Syntax {
      path: PathBuf::new(),
      line,
      message: message.into(),
    }
  }

  /// Attach the file the error was found in.
  pub fn in_file(self, file: &Path) -> Self {
    match self {
      ParseError::Syntax { line, message, .. } => ParseError::Syntax {
        path: file.to_path_buf(),
        line,
        message,
      },
      other => other,
    }
  }
}

/// Replace `start..end` of the source with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
  pub start: usize,
  pub end: usize,
  pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
  Import,
  SideEffect,
  ReExport,
}

/// A static module reference found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
  pub specifier: String,
  pub kind: RefKind,
  /// Byte span of the quoted string literal, quotes included.
  pub literal: (usize, usize),
}

#[derive(Debug)]
pub struct ScannedSource {
  source: String,
  refs: Vec<ModuleRef>,
  edits: Vec<Edit>,
}

impl ScannedSource {
  pub fn refs(&self) -> &[ModuleRef] {
    &self.refs
  }

  /// Render the transformed source.
  ///
  /// `specifiers` maps a reference's literal start offset to its new
  /// specifier; references not in the map keep their original text.
  pub fn render(&self, specifiers: &HashMap<usize, String>) -> String {
    let mut edits: Vec<Edit> = self.edits.clone();
    for r in &self.refs {
      if let Some(new) = specifiers.get(&r.literal.0) {
        let quote = &self.source[r.literal.0..r.literal.0 + 1];
        edits.push(Edit {
          start: r.literal.0,
          end: r.literal.1,
          text: format!("{quote}{new}{quote}"),
        });
      }
    }
    edits.sort_by_key(|e| (e.start, Reverse(e.end)));

    let mut out = String::with_capacity(self.source.len());
    let mut pos = 0;
    for edit in edits {
      if edit.start < pos {
        continue;
      }
      out.push_str(&self.source[pos..edit.start]);
      out.push_str(&edit.text);
      pos = edit.end;
    }
    out.push_str(&self.source[pos..]);
    out
  }
}

/// Scan a source file for module references and type syntax.
pub fn scan(source: &str, path: &Path) -> Result<ScannedSource, ParseError> {
  let lexed = lexer::lex(source).map_err(|e| e.in_file(path))?;
  let cur = Cursor::new(source, &lexed.tokens);

  let statements = scan::scan_statements(Cursor::new(source, &lexed.tokens)).map_err(|e| e.in_file(path))?;
  let mut edits = statements.edits;
  let skip: Vec<(usize, usize)> = statements.dropped.iter().chain(&statements.clauses).copied().collect();
  edits.extend(annotations::strip_annotations(&cur, &skip).map_err(|e| e.in_file(path))?);
  edits.extend(lexed.comments.iter().map(|c| Edit {
    start: c.start,
    end: c.end,
    text: if c.multiline { "\n".to_string() } else { String::new() },
  }));

  Ok(ScannedSource {
    source: source.to_string(),
    refs: statements.refs,
    edits,
  })
}

/// Deployed file name for a source file name: `.ts` → `.js`, `.mts` → `.mjs`,
/// `.cts` → `.cjs`. Other extensions are kept.
pub fn output_extension(ext: &str) -> &str {
  match ext {
    "ts" => "js",
    "mts" => "mjs",
    "cts" => "cjs",
    other => other,
  }
}
