//! Shared token-navigation helpers for the statement and annotation passes.

use super::lexer::{Token, TokenKind};
use super::{Edit, ParseError};

/// Previous token ends in a way that makes the next line part of a type.
const CONTINUES_AFTER: &[&str] = &["=", "|", "&", ",", "=>", "?", ":", "(", "[", "{", "<", "."];
const CONTINUES_AFTER_WORDS: &[&str] = &["extends", "keyof", "typeof", "infer", "is", "readonly", "unique"];
/// Next line starts with something that can only continue a type.
const CONTINUES_BEFORE: &[&str] = &["|", "&", "=>", "?", ":", ".", "?.", "[", "<"];
const CONTINUES_BEFORE_WORDS: &[&str] = &["extends", "is", "as"];

pub struct Cursor<'a> {
  pub src: &'a str,
  pub toks: &'a [Token],
}

impl<'a> Cursor<'a> {
  pub fn new(src: &'a str, toks: &'a [Token]) -> Self {
    Self { src, toks }
  }

  pub fn len(&self) -> usize {
    self.toks.len()
  }

  pub fn text(&self, i: usize) -> &'a str {
    self.toks.get(i).map_or("", |t| t.text(self.src))
  }

  pub fn is_punct(&self, i: usize, p: &str) -> bool {
    self.toks.get(i).is_some_and(|t| t.kind == TokenKind::Punct && t.text(self.src) == p)
  }

  pub fn is_ident(&self, i: usize, word: &str) -> bool {
    self.toks.get(i).is_some_and(|t| t.kind == TokenKind::Ident && t.text(self.src) == word)
  }

  pub fn is_kind(&self, i: usize, kind: TokenKind) -> bool {
    self.toks.get(i).is_some_and(|t| t.kind == kind)
  }

  pub fn error(&self, i: usize, message: impl Into<String>) -> ParseError {
    let at = self.toks.get(i).map_or(self.src.len(), |t| t.start);
    ParseError::at(self.src, at, message)
  }

  /// Index of the bracket closing the one opened at `open`.
  pub fn matching(&self, open: usize) -> Result<usize, ParseError> {
    let mut stack: Vec<&str> = Vec::new();
    for k in open..self.toks.len() {
      if self.toks[k].kind != TokenKind::Punct {
        continue;
      }
      match self.text(k) {
        "{" => stack.push("}"),
        "(" => stack.push(")"),
        "[" => stack.push("]"),
        close @ ("}" | ")" | "]") => {
          if stack.pop() != Some(close) {
            return Err(self.error(k, format!("unexpected '{}'", close)));
          }
          if stack.is_empty() {
            return Ok(k);
          }
        }
        _ => {}
      }
    }
    Err(self.error(open, format!("unclosed '{}'", self.text(open))))
  }

  /// Index of the `>` closing a generic parameter list opened at `open`.
  pub fn matching_angle(&self, open: usize) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    for k in open..self.toks.len() {
      if self.toks[k].kind != TokenKind::Punct {
        continue;
      }
      match self.text(k) {
        "<" | "(" | "[" | "{" => depth += 1,
        ">" | ")" | "]" | "}" => {
          depth = depth.saturating_sub(1);
          if depth == 0 {
            return Ok(k);
          }
        }
        _ => {}
      }
    }
    Err(self.error(open, "unclosed generic parameter list"))
  }

  fn continues_after(&self, i: usize) -> bool {
    let text = self.text(i);
    match self.toks.get(i).map(|t| t.kind) {
      Some(TokenKind::Punct) => CONTINUES_AFTER.contains(&text),
      Some(TokenKind::Ident) => CONTINUES_AFTER_WORDS.contains(&text),
      _ => false,
    }
  }

  fn continues_before(&self, i: usize) -> bool {
    let text = self.text(i);
    match self.toks.get(i).map(|t| t.kind) {
      Some(TokenKind::Punct) => CONTINUES_BEFORE.contains(&text),
      Some(TokenKind::Ident) => CONTINUES_BEFORE_WORDS.contains(&text),
      _ => false,
    }
  }

  /// Last token index of a type starting at `from`.
  ///
  /// The type ends before a punctuator in `stops` at nesting depth zero, a
  /// bracket that closes an enclosing group, `limit`, or a line break that
  /// cannot continue the type. A `{` at `from` always opens an object type.
  /// Returns `from - 1` for an empty type.
  pub fn type_end(&self, from: usize, limit: usize, stops: &[&str]) -> usize {
    let mut depth = 0usize;
    let mut last = from.wrapping_sub(1);
    let mut k = from;
    while k < limit.min(self.toks.len()) {
      let tok = self.toks[k];
      let text = tok.text(self.src);
      let punct = tok.kind == TokenKind::Punct;

      if depth == 0 {
        if punct && stops.contains(&text) && !(k == from && text == "{") {
          break;
        }
        if k > from && tok.newline_before && !self.continues_after(k - 1) && !self.continues_before(k) {
          break;
        }
        if k > from && tok.kind == TokenKind::Template {
          break;
        }
      }

      if punct {
        match text {
          "(" | "[" | "{" | "<" => depth += 1,
          ")" | "]" | "}" | ">" => {
            if depth == 0 {
              break;
            }
            depth -= 1;
          }
          _ => {}
        }
      }

      last = k;
      k += 1;
    }
    last
  }

  /// Edit removing tokens `first..=last`.
  pub fn removal(&self, first: usize, last: usize) -> Edit {
    Edit {
      start: self.toks[first].start,
      end: self.toks[last].end,
      text: String::new(),
    }
  }
}
