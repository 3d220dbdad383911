//! Statement pass: module references and type-only declarations.

use super::cursor::Cursor;
use super::lexer::TokenKind;
use super::{Edit, ModuleRef, ParseError, RefKind};

#[derive(Debug, Default)]
pub struct StatementScan {
  pub refs: Vec<ModuleRef>,
  pub edits: Vec<Edit>,
  /// Token ranges (inclusive) removed as type-only declarations.
  pub dropped: Vec<(usize, usize)>,
  /// Token ranges (inclusive) of import and export clauses, where `as`
  /// renames a binding instead of casting.
  pub clauses: Vec<(usize, usize)>,
}

struct Scanner<'a> {
  cur: Cursor<'a>,
  out: StatementScan,
}

pub fn scan_statements(cur: Cursor<'_>) -> Result<StatementScan, ParseError> {
  let mut scanner = Scanner {
    cur,
    out: StatementScan::default(),
  };
  scanner.run()?;
  Ok(scanner.out)
}

impl Scanner<'_> {
  fn run(&mut self) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < self.cur.len() {
      if self.cur.is_kind(i, TokenKind::Punct) {
        match self.cur.text(i) {
          "{" => depth += 1,
          "}" => depth = depth.saturating_sub(1),
          _ => {}
        }
      } else if self.cur.is_kind(i, TokenKind::Ident)
        && self.at_statement_start(i)
        && let Some(next) = self.statement(i, depth == 0)?
      {
        i = next;
        continue;
      }
      i += 1;
    }
    Ok(())
  }

  fn at_statement_start(&self, i: usize) -> bool {
    i == 0
      || self.cur.toks[i].newline_before
      || self.cur.is_punct(i - 1, ";")
      || self.cur.is_punct(i - 1, "}")
      || self.cur.is_punct(i - 1, "{")
  }

  /// Handle a statement starting at `i`; returns the index to resume at.
  ///
  /// Module declarations are only recognized at the top level; type
  /// declarations anywhere.
  fn statement(&mut self, i: usize, top_level: bool) -> Result<Option<usize>, ParseError> {
    let next_is_ident = self.cur.is_kind(i + 1, TokenKind::Ident);
    match self.cur.text(i) {
      "import" if top_level => self.import(i),
      "export" if top_level => self.export(i),
      "interface" if next_is_ident => self.drop_block_declaration(i).map(Some),
      "type" if next_is_ident && (self.cur.is_punct(i + 2, "=") || self.cur.is_punct(i + 2, "<")) => {
        self.drop_type_alias(i, i + 1).map(Some)
      }
      "declare" if next_is_ident => self.drop_ambient(i).map(Some),
      _ => Ok(None),
    }
  }

  fn record(&mut self, literal: usize, kind: RefKind) {
    let tok = self.cur.toks[literal];
    let raw = tok.text(self.cur.src);
    self.out.refs.push(ModuleRef {
      specifier: raw[1..raw.len() - 1].to_string(),
      kind,
      literal: (tok.start, tok.end),
    });
  }

  /// Remove tokens `first..=last` plus a directly following `;`.
  fn drop_tokens(&mut self, first: usize, last: usize) -> usize {
    let last = if self.cur.is_punct(last + 1, ";") { last + 1 } else { last };
    self.out.edits.push(self.cur.removal(first, last));
    self.out.dropped.push((first, last));
    last + 1
  }

  /// Index of the string literal after the `from` that ends a clause.
  fn from_clause(&mut self, start: usize, strip_type_specifiers: bool) -> Result<usize, ParseError> {
    let mut j = start;
    while j < self.cur.len() {
      if self.cur.is_punct(j, "{") {
        let close = self.cur.matching(j)?;
        if strip_type_specifiers {
          self.strip_type_specifiers(j, close);
        }
        j = close + 1;
        continue;
      }
      if self.cur.is_ident(j, "from") && self.cur.is_kind(j + 1, TokenKind::Str) {
        return Ok(j + 1);
      }
      if self.cur.is_kind(j, TokenKind::Str) || self.cur.is_punct(j, ";") || self.cur.is_punct(j, "=") {
        break;
      }
      j += 1;
    }
    Err(self.cur.error(start - 1, "expected 'from' clause with a module specifier"))
  }

  /// Remove `type X` / `type X as Y` entries from a `{ ... }` specifier list.
  fn strip_type_specifiers(&mut self, open: usize, close: usize) {
    let mut k = open + 1;
    while k < close {
      let entry_start = self.cur.is_punct(k - 1, "{") || self.cur.is_punct(k - 1, ",");
      if entry_start
        && self.cur.is_ident(k, "type")
        && self.cur.is_kind(k + 1, TokenKind::Ident)
        && !self.cur.is_ident(k + 1, "as")
      {
        let mut end = k + 1;
        while end < close && !self.cur.is_punct(end, ",") {
          end += 1;
        }
        let last = if end < close { end } else { end - 1 };
        self.out.edits.push(self.cur.removal(k, last));
        k = end + 1;
        continue;
      }
      k += 1;
    }
  }

  fn import(&mut self, i: usize) -> Result<Option<usize>, ParseError> {
    let next = i + 1;
    if next >= self.cur.len() {
      return Err(self.cur.error(i, "expected module specifier after 'import'"));
    }
    if self.cur.is_punct(next, "(") || self.cur.is_punct(next, ".") {
      return Ok(None);
    }
    if self.cur.is_kind(next, TokenKind::Str) {
      self.record(next, RefKind::SideEffect);
      return Ok(Some(next + 1));
    }

    let type_only = self.cur.is_ident(next, "type")
      && !(self.cur.is_ident(next + 1, "from") || self.cur.is_punct(next + 1, ",") || self.cur.is_punct(next + 1, "="));
    let literal = self.from_clause(next, !type_only)?;
    if type_only {
      return Ok(Some(self.drop_tokens(i, literal)));
    }
    self.out.clauses.push((i, literal));
    self.record(literal, RefKind::Import);
    Ok(Some(literal + 1))
  }

  fn export(&mut self, i: usize) -> Result<Option<usize>, ParseError> {
    let next = i + 1;
    if self.cur.is_punct(next, "*") {
      let literal = self.from_clause(next, false)?;
      self.out.clauses.push((i, literal));
      self.record(literal, RefKind::ReExport);
      return Ok(Some(literal + 1));
    }

    if self.cur.is_punct(next, "{") {
      let close = self.cur.matching(next)?;
      self.strip_type_specifiers(next, close);
      if self.cur.is_ident(close + 1, "from") && self.cur.is_kind(close + 2, TokenKind::Str) {
        self.out.clauses.push((i, close + 2));
        self.record(close + 2, RefKind::ReExport);
        return Ok(Some(close + 3));
      }
      self.out.clauses.push((i, close));
      return Ok(Some(close + 1));
    }

    if self.cur.is_ident(next, "type") {
      if self.cur.is_punct(next + 1, "{") {
        let close = self.cur.matching(next + 1)?;
        let last = if self.cur.is_ident(close + 1, "from") && self.cur.is_kind(close + 2, TokenKind::Str) {
          close + 2
        } else {
          close
        };
        return Ok(Some(self.drop_tokens(i, last)));
      }
      if self.cur.is_punct(next + 1, "*") {
        let literal = self.from_clause(next + 1, false)?;
        return Ok(Some(self.drop_tokens(i, literal)));
      }
      if self.cur.is_kind(next + 1, TokenKind::Ident) {
        return self.drop_type_alias(i, next + 1).map(Some);
      }
      return Ok(None);
    }

    if self.cur.is_ident(next, "interface")
      || (self.cur.is_ident(next, "default") && self.cur.is_ident(next + 1, "interface"))
    {
      return self.drop_block_declaration(i).map(Some);
    }
    if self.cur.is_ident(next, "declare") {
      return self.drop_ambient(i).map(Some);
    }
    Ok(None)
  }

  /// `interface Name<T> extends Base { ... }`
  fn drop_block_declaration(&mut self, start: usize) -> Result<usize, ParseError> {
    let mut j = start + 1;
    while j < self.cur.len() && !self.cur.is_punct(j, "{") {
      if self.cur.is_punct(j, "<") {
        j = self.cur.matching_angle(j)?;
      }
      j += 1;
    }
    if j >= self.cur.len() {
      return Err(self.cur.error(start, "expected declaration body"));
    }
    let close = self.cur.matching(j)?;
    Ok(self.drop_tokens(start, close))
  }

  /// `type Name<T> = ...` where `name` indexes the alias name.
  fn drop_type_alias(&mut self, start: usize, name: usize) -> Result<usize, ParseError> {
    let mut j = name + 1;
    if self.cur.is_punct(j, "<") {
      j = self.cur.matching_angle(j)? + 1;
    }
    if !self.cur.is_punct(j, "=") {
      return Err(self.cur.error(name, "expected '=' in type alias"));
    }
    let end = self.cur.type_end(j + 1, self.cur.len(), &[";"]);
    if end <= j {
      return Err(self.cur.error(j, "expected type after '='"));
    }
    Ok(self.drop_tokens(start, end))
  }

  /// `declare ...` statements, with or without a block body.
  fn drop_ambient(&mut self, start: usize) -> Result<usize, ParseError> {
    let mut j = start + 1;
    while j < self.cur.len() {
      if self.cur.is_punct(j, "{") {
        let close = self.cur.matching(j)?;
        return Ok(self.drop_tokens(start, close));
      }
      if self.cur.is_punct(j, "(") || self.cur.is_punct(j, "[") {
        j = self.cur.matching(j)? + 1;
        continue;
      }
      if self.cur.is_punct(j, ";") || (j > start + 1 && self.cur.toks[j].newline_before && self.ends_ambient(j)) {
        return Ok(self.drop_tokens(start, j - 1));
      }
      j += 1;
    }
    Ok(self.drop_tokens(start, self.cur.len() - 1))
  }

  fn ends_ambient(&self, j: usize) -> bool {
    !(self.cur.is_punct(j - 1, ":")
      || self.cur.is_punct(j - 1, ",")
      || self.cur.is_punct(j - 1, "|")
      || self.cur.is_punct(j, "|")
      || self.cur.is_punct(j, ":"))
  }
}
