//! Tokenizer for module sources.
//!
//! Produces just enough structure to find module references and type
//! syntax: identifiers, string/template/regex literals, numbers and
//! punctuation, with comments reported separately so they can be removed.

use super::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Ident,
  Str,
  Template,
  Regex,
  Number,
  Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub start: usize,
  pub end: usize,
  /// A line break separates this token from the previous one.
  pub newline_before: bool,
}

impl Token {
  pub fn text<'a>(&self, src: &'a str) -> &'a str {
    &src[self.start..self.end]
  }
}

/// Byte range of a comment, and whether it spans a line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
  pub start: usize,
  pub end: usize,
  pub multiline: bool,
}

#[derive(Debug, Default)]
pub struct Lexed {
  pub tokens: Vec<Token>,
  pub comments: Vec<Comment>,
}

/// Keywords after which a `/` starts a regular expression.
const REGEX_PRECEDERS: &[&str] = &[
  "return",
  "typeof",
  "instanceof",
  "in",
  "of",
  "new",
  "delete",
  "void",
  "throw",
  "case",
  "do",
  "else",
  "yield",
  "await",
];

const MULTI_PUNCT: &[&str] = &["...", "===", "!==", "=>", "==", "!=", "&&", "||", "??", "?."];

fn is_ident_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#' || b >= 0x80
}

struct Lexer<'a> {
  src: &'a str,
  bytes: &'a [u8],
  pos: usize,
  newline_pending: bool,
  brace_depth: usize,
  /// Brace depth at each open `${` of an enclosing template literal.
  template_stack: Vec<usize>,
  out: Lexed,
}

pub fn lex(src: &str) -> Result<Lexed, ParseError> {
  let mut lexer = Lexer {
    src,
    bytes: src.as_bytes(),
    pos: 0,
    newline_pending: false,
    brace_depth: 0,
    template_stack: Vec::new(),
    out: Lexed::default(),
  };
  lexer.run()?;
  Ok(lexer.out)
}

impl<'a> Lexer<'a> {
  fn peek(&self, offset: usize) -> Option<u8> {
    self.bytes.get(self.pos + offset).copied()
  }

  fn error(&self, at: usize, message: impl Into<String>) -> ParseError {
    ParseError::at(self.src, at, message)
  }

  fn push(&mut self, kind: TokenKind, start: usize) {
    self.out.tokens.push(Token {
      kind,
      start,
      end: self.pos,
      newline_before: self.newline_pending,
    });
    self.newline_pending = false;
  }

  fn run(&mut self) -> Result<(), ParseError> {
    if self.src.starts_with("#!") {
      while let Some(b) = self.peek(0) {
        if b == b'\n' {
          break;
        }
        self.pos += 1;
      }
    }

    while let Some(b) = self.peek(0) {
      match b {
        b'\n' => {
          self.newline_pending = true;
          self.pos += 1;
        }
        b' ' | b'\t' | b'\r' | 0x0b | 0x0c => self.pos += 1,
        b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
        b'/' if self.peek(1) == Some(b'*') => self.block_comment()?,
        b'/' if self.regex_allowed() => self.regex()?,
        b'\'' | b'"' => self.string(b)?,
        b'`' => {
          let start = self.pos;
          self.pos += 1;
          self.template_chunk(start)?;
        }
        b'0'..=b'9' => {
          let start = self.pos;
          while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'.') {
            self.pos += 1;
          }
          self.push(TokenKind::Number, start);
        }
        b if is_ident_byte(b) => {
          let start = self.pos;
          while self.peek(0).is_some_and(is_ident_byte) {
            self.pos += 1;
          }
          self.push(TokenKind::Ident, start);
        }
        b'{' => {
          self.brace_depth += 1;
          self.single_punct();
        }
        b'}' => {
          if self.template_stack.last() == Some(&self.brace_depth) {
            self.template_stack.pop();
            let start = self.pos;
            self.pos += 1;
            self.template_chunk(start)?;
          } else {
            self.brace_depth = self.brace_depth.saturating_sub(1);
            self.single_punct();
          }
        }
        _ => self.punct(),
      }
    }

    if !self.template_stack.is_empty() {
      return Err(self.error(self.src.len(), "unterminated template literal"));
    }
    Ok(())
  }

  fn single_punct(&mut self) {
    let start = self.pos;
    self.pos += 1;
    self.push(TokenKind::Punct, start);
  }

  fn punct(&mut self) {
    let rest = &self.src[self.pos..];
    let start = self.pos;
    match MULTI_PUNCT.iter().find(|p| rest.starts_with(**p)) {
      Some(p) => self.pos += p.len(),
      // Advance a whole character so offsets stay on char boundaries.
      None => self.pos += rest.chars().next().map_or(1, char::len_utf8),
    }
    self.push(TokenKind::Punct, start);
  }

  fn regex_allowed(&self) -> bool {
    let Some(prev) = self.out.tokens.last() else {
      return true;
    };
    match prev.kind {
      TokenKind::Punct => !matches!(prev.text(self.src), ")" | "]" | "}"),
      TokenKind::Ident => REGEX_PRECEDERS.contains(&prev.text(self.src)),
      _ => false,
    }
  }

  fn line_comment(&mut self) {
    let start = self.pos;
    while let Some(b) = self.peek(0) {
      if b == b'\n' {
        break;
      }
      self.pos += 1;
    }
    self.out.comments.push(Comment {
      start,
      end: self.pos,
      multiline: false,
    });
  }

  fn block_comment(&mut self) -> Result<(), ParseError> {
    let start = self.pos;
    let Some(close) = self.src[start + 2..].find("*/") else {
      return Err(self.error(start, "unterminated block comment"));
    };
    self.pos = start + 2 + close + 2;
    let multiline = self.src[start..self.pos].contains('\n');
    if multiline {
      self.newline_pending = true;
    }
    self.out.comments.push(Comment {
      start,
      end: self.pos,
      multiline,
    });
    Ok(())
  }

  fn string(&mut self, quote: u8) -> Result<(), ParseError> {
    let start = self.pos;
    self.pos += 1;
    loop {
      match self.peek(0) {
        None | Some(b'\n') => return Err(self.error(start, "unterminated string literal")),
        Some(b'\\') => self.pos += 2,
        Some(b) if b == quote => {
          self.pos += 1;
          break;
        }
        Some(_) => self.pos += 1,
      }
    }
    self.push(TokenKind::Str, start);
    Ok(())
  }

  /// Scan template text up to the closing backtick or the next `${`.
  fn template_chunk(&mut self, start: usize) -> Result<(), ParseError> {
    loop {
      match self.peek(0) {
        None => return Err(self.error(start, "unterminated template literal")),
        Some(b'\\') => self.pos += 2,
        Some(b'`') => {
          self.pos += 1;
          break;
        }
        Some(b'$') if self.peek(1) == Some(b'{') => {
          self.pos += 2;
          self.template_stack.push(self.brace_depth);
          break;
        }
        Some(_) => self.pos += 1,
      }
    }
    self.push(TokenKind::Template, start);
    Ok(())
  }

  fn regex(&mut self) -> Result<(), ParseError> {
    let start = self.pos;
    self.pos += 1;
    let mut in_class = false;
    loop {
      match self.peek(0) {
        None | Some(b'\n') => return Err(self.error(start, "unterminated regular expression")),
        Some(b'\\') => self.pos += 2,
        Some(b'[') => {
          in_class = true;
          self.pos += 1;
        }
        Some(b']') => {
          in_class = false;
          self.pos += 1;
        }
        Some(b'/') if !in_class => {
          self.pos += 1;
          break;
        }
        Some(_) => self.pos += 1,
      }
    }
    while self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
      self.pos += 1;
    }
    self.push(TokenKind::Regex, start);
    Ok(())
  }
}
