//! Annotation pass: strips type syntax that is interleaved with runtime code.
//!
//! Handles binding and parameter annotations, return types, generic
//! parameter and argument lists, `as`/`satisfies` casts, non-null
//! assertions, class member modifiers and bodiless signatures. Constructs
//! that have runtime semantics of their own (enums, namespaces, parameter
//! properties, angle-bracket casts) are rejected.

use super::cursor::Cursor;
use super::lexer::TokenKind;
use super::{Edit, ParseError};

/// Words that may precede a parenthesized arrow parameter list.
const ARROW_PRECEDERS: &[&str] = &[
  "async", "return", "await", "yield", "typeof", "in", "of", "case", "default", "else", "export",
];

/// Keywords that never end an expression.
const NON_VALUE_WORDS: &[&str] = &[
  "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do", "else", "yield",
  "await", "const", "let", "var", "export", "import", "default", "extends", "async", "static", "as", "satisfies",
  "keyof", "readonly",
];

/// Words followed by a parenthesized group that is not a parameter list.
const NON_METHOD_WORDS: &[&str] = &[
  "if", "while", "for", "switch", "catch", "with", "function", "return", "typeof", "await", "yield", "new", "in",
  "of", "do", "else", "case", "void", "delete", "throw", "super", "import",
];

/// Class member modifiers without runtime meaning.
const TS_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "declare", "abstract", "override"];

/// Class member prefixes that stay in the emitted class.
const JS_MODIFIERS: &[&str] = &["static", "async", "get", "set", "accessor"];

/// Parameter prefixes that turn a constructor parameter into a field.
const PARAMETER_PROPERTY_WORDS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Operators that end the type of an `as` cast.
const CAST_STOPS: &[&str] = &[
  ";", ",", "=", "==", "===", "!=", "!==", "&&", "||", "??", "?", ":", "=>", "+", "-", "*", "/", "%",
];

/// Punctuation allowed inside a generic argument list.
const TYPE_ARG_PUNCT: &[&str] = &[
  ",", ".", "[", "]", "|", "&", "<", ">", "{", "}", ":", ";", "?", "=>", "(", ")", "=",
];

pub fn strip_annotations(cur: &Cursor<'_>, skip: &[(usize, usize)]) -> Result<Vec<Edit>, ParseError> {
  let mut edits = Vec::new();
  let mut i = 0;
  while i < cur.len() {
    if let Some(&(_, last)) = skip.iter().find(|(first, last)| (*first..=*last).contains(&i)) {
      i = last + 1;
      continue;
    }
    let next = match cur.toks[i].kind {
      TokenKind::Ident if !after_dot(cur, i) => match cur.text(i) {
        "let" | "const" | "var" => binding(cur, i, &mut edits)?,
        "function" => function(cur, i, &mut edits)?,
        "class" => class(cur, i, &mut edits)?,
        "enum" if cur.is_kind(i + 1, TokenKind::Ident) => return Err(cur.error(i, "enums are not supported")),
        "namespace" | "module" if cur.is_kind(i + 1, TokenKind::Ident) && cur.is_punct(i + 2, "{") => {
          return Err(cur.error(i, "namespaces are not supported"));
        }
        "as" | "satisfies" if is_cast(cur, i) => cast(cur, i, &mut edits)?,
        _ => None,
      },
      TokenKind::Punct => match cur.text(i) {
        "(" if arrow_allowed(cur, i) => arrow(cur, i, &mut edits)?,
        "(" => method(cur, i, &mut edits)?,
        "<" => angle(cur, i, &mut edits)?,
        "!" if is_non_null(cur, i) => {
          edits.push(cur.removal(i, i));
          Some(i + 1)
        }
        _ => None,
      },
      _ => None,
    };
    i = next.unwrap_or(i + 1);
  }
  Ok(edits)
}

fn after_dot(cur: &Cursor<'_>, i: usize) -> bool {
  i > 0 && (cur.is_punct(i - 1, ".") || cur.is_punct(i - 1, "?."))
}

fn ends_expression(cur: &Cursor<'_>, k: usize) -> bool {
  match cur.toks.get(k).map(|t| t.kind) {
    Some(TokenKind::Ident) => !NON_VALUE_WORDS.contains(&cur.text(k)),
    Some(TokenKind::Template) => cur.text(k).ends_with('`'),
    Some(TokenKind::Str | TokenKind::Number | TokenKind::Regex) => true,
    Some(TokenKind::Punct) => matches!(cur.text(k), ")" | "]" | "}"),
    None => false,
  }
}

/// A line break at `k` ends the current statement.
fn statement_break(cur: &Cursor<'_>, k: usize) -> bool {
  k > 0 && cur.toks[k].newline_before && ends_expression(cur, k - 1) && !cur.is_kind(k, TokenKind::Punct)
}

/// Edit removing the word at `k` and the whitespace after it.
fn strip_word(cur: &Cursor<'_>, k: usize) -> Edit {
  let end = cur.toks.get(k + 1).map_or(cur.toks[k].end, |t| t.start);
  Edit {
    start: cur.toks[k].start,
    end,
    text: String::new(),
  }
}

/// Closing `>` of a generic list opened at `open`, if it is one.
fn generic_close(cur: &Cursor<'_>, open: usize) -> Option<usize> {
  cur.matching_angle(open).ok().filter(|&close| cur.is_punct(close, ">"))
}

/// `let a!: A = x, { b }: B = y`
fn binding(cur: &Cursor<'_>, i: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  if cur.is_ident(i + 1, "enum") {
    return Err(cur.error(i + 1, "const enums are not supported"));
  }
  let Some(next) = declarator(cur, i + 1, edits)? else {
    return Ok(None);
  };
  later_declarators(cur, next, edits)?;
  Ok(Some(next))
}

/// One binding name or pattern plus its annotation; returns the index after it.
fn declarator(cur: &Cursor<'_>, start: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  let mut j = start;
  if cur.is_kind(j, TokenKind::Ident) {
    j += 1;
  } else if cur.is_punct(j, "{") || cur.is_punct(j, "[") {
    j = cur.matching(j)? + 1;
  } else {
    return Ok(None);
  }

  if cur.is_punct(j, "!") && cur.is_punct(j + 1, ":") {
    edits.push(cur.removal(j, j));
    j += 1;
  }
  if !cur.is_punct(j, ":") {
    return Ok(Some(j));
  }
  let end = cur.type_end(j + 1, cur.len(), &["=", ";", ","]);
  if end <= j {
    return Err(cur.error(j, "expected type annotation after ':'"));
  }
  edits.push(cur.removal(j, end));
  Ok(Some(end + 1))
}

/// Strip the annotations of every declarator after the first.
///
/// Initializers are skipped bracket-aware; the main pass still visits them.
fn later_declarators(cur: &Cursor<'_>, from: usize, edits: &mut Vec<Edit>) -> Result<(), ParseError> {
  let mut k = from;
  while k < cur.len() {
    if k > from && statement_break(cur, k) {
      break;
    }
    if cur.is_kind(k, TokenKind::Punct) {
      match cur.text(k) {
        "(" | "[" | "{" => {
          k = cur.matching(k)? + 1;
          continue;
        }
        ")" | "]" | "}" | ";" => break,
        "," => match declarator(cur, k + 1, edits)? {
          Some(next) => {
            k = next;
            continue;
          }
          None => break,
        },
        _ => {}
      }
    }
    k += 1;
  }
  Ok(())
}

/// `function* name<T>(params): Ret { ... }`, or a bodiless overload.
fn function(cur: &Cursor<'_>, i: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  let mut j = i + 1;
  if cur.is_punct(j, "*") {
    j += 1;
  }
  let named = cur.is_kind(j, TokenKind::Ident);
  if named {
    j += 1;
  }
  if cur.is_punct(j, "<") {
    let close = cur.matching_angle(j)?;
    edits.push(cur.removal(j, close));
    j = close + 1;
  }
  if !cur.is_punct(j, "(") {
    return Ok(None);
  }
  let close = strip_params(cur, j, edits)?;
  let mut next = close + 1;
  if cur.is_punct(next, ":") {
    let end = cur.type_end(next + 1, cur.len(), &["{", ";"]);
    if end <= next {
      return Err(cur.error(next, "expected return type after ':'"));
    }
    edits.push(cur.removal(next, end));
    next = end + 1;
  }
  if named && !cur.is_punct(next, "{") {
    let mut start = i;
    while start > 0 && ["async", "export", "default"].iter().any(|w| cur.is_ident(start - 1, w)) {
      start -= 1;
    }
    let last = if cur.is_punct(next, ";") { next } else { next - 1 };
    edits.push(cur.removal(start, last));
    return Ok(Some(last + 1));
  }
  Ok(Some(next))
}

fn arrow_allowed(cur: &Cursor<'_>, i: usize) -> bool {
  if i == 0 {
    return true;
  }
  let prev = cur.toks[i - 1];
  match prev.kind {
    TokenKind::Ident => ARROW_PRECEDERS.contains(&cur.text(i - 1)),
    TokenKind::Punct => !matches!(cur.text(i - 1), ")" | "]" | "}"),
    _ => false,
  }
}

/// `(params): Ret =>` where the list is followed by an arrow.
fn arrow(cur: &Cursor<'_>, open: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  let close = cur.matching(open)?;
  if cur.is_punct(close + 1, "=>") {
    strip_params(cur, open, edits)?;
    return Ok(Some(close + 2));
  }
  if !cur.is_punct(close + 1, ":") {
    return Ok(None);
  }
  let end = cur.type_end(close + 2, cur.len(), &["=>", ";"]);
  if end <= close + 1 || !cur.is_punct(end + 1, "=>") {
    // `cond ? (a) : b` and friends
    return Ok(None);
  }
  strip_params(cur, open, edits)?;
  edits.push(cur.removal(close + 1, end));
  Ok(Some(end + 2))
}

/// Object literal method `name(params): Ret { ... }`.
fn method(cur: &Cursor<'_>, open: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  let name = open.wrapping_sub(1);
  if open == 0 || !cur.is_kind(name, TokenKind::Ident) || NON_METHOD_WORDS.contains(&cur.text(name)) {
    return Ok(None);
  }
  let member_start = name == 0
    || cur.toks[name].newline_before
    || ["{", ",", ";", "}", "*"].iter().any(|p| cur.is_punct(name - 1, p))
    || ["async", "get", "set", "static"].iter().any(|w| cur.is_ident(name - 1, w));
  if !member_start {
    return Ok(None);
  }

  let close = cur.matching(open)?;
  let next = close + 1;
  if cur.is_punct(next, "{") && !cur.toks[next].newline_before {
    strip_params(cur, open, edits)?;
    return Ok(Some(next));
  }
  if !cur.is_punct(next, ":") {
    return Ok(None);
  }
  let end = cur.type_end(next + 1, cur.len(), &["{", ";"]);
  if end <= next || !cur.is_punct(end + 1, "{") {
    return Ok(None);
  }
  strip_params(cur, open, edits)?;
  edits.push(cur.removal(next, end));
  Ok(Some(end + 1))
}

/// Generic arrow parameters, type arguments of a call, or a rejected
/// angle-bracket cast.
fn angle(cur: &Cursor<'_>, i: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  if i == 0 {
    return Ok(None);
  }
  let Some(close) = generic_close(cur, i) else {
    return Ok(None);
  };
  let type_like = (i + 1..close).all(|k| match cur.toks[k].kind {
    TokenKind::Punct => TYPE_ARG_PUNCT.contains(&cur.text(k)),
    TokenKind::Ident | TokenKind::Str | TokenKind::Number => true,
    _ => false,
  });
  if !type_like {
    return Ok(None);
  }

  // `make<T>(x)` and `new Map<K, V>()`
  if cur.is_kind(i - 1, TokenKind::Ident) && cur.toks[i].start == cur.toks[i - 1].end {
    if cur.is_punct(close + 1, "(") {
      edits.push(cur.removal(i, close));
      return Ok(Some(close + 1));
    }
    return Ok(None);
  }

  if !arrow_allowed(cur, i) || ["+", "-", "!", "<", ">"].iter().any(|p| cur.is_punct(i - 1, p)) {
    return Ok(None);
  }
  if cur.is_punct(close + 1, "(")
    && let Some(next) = arrow(cur, close + 1, edits)?
  {
    edits.push(cur.removal(i, close));
    return Ok(Some(next));
  }
  let operand = close + 1;
  let starts_value = match cur.toks.get(operand).map(|t| t.kind) {
    Some(TokenKind::Punct) => matches!(cur.text(operand), "(" | "[" | "{"),
    Some(_) => true,
    None => false,
  };
  if starts_value {
    return Err(cur.error(i, "angle-bracket type assertions are not supported; use 'as'"));
  }
  Ok(None)
}

fn is_cast(cur: &Cursor<'_>, i: usize) -> bool {
  if i == 0 || !ends_expression(cur, i - 1) {
    return false;
  }
  match cur.toks.get(i + 1).map(|t| t.kind) {
    Some(TokenKind::Ident | TokenKind::Str | TokenKind::Number) => true,
    Some(TokenKind::Punct) => matches!(cur.text(i + 1), "{" | "[" | "("),
    _ => false,
  }
}

/// ` as Type` / ` satisfies Type`, with the whitespace before it.
fn cast(cur: &Cursor<'_>, i: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  let end = cur.type_end(i + 1, cur.len(), CAST_STOPS);
  if end <= i {
    return Err(cur.error(i, format!("expected type after '{}'", cur.text(i))));
  }
  edits.push(Edit {
    start: cur.toks[i - 1].end,
    end: cur.toks[end].end,
    text: String::new(),
  });
  Ok(Some(end + 1))
}

/// `value!` followed by member access, a call or the end of an operand.
fn is_non_null(cur: &Cursor<'_>, i: usize) -> bool {
  if i == 0 || cur.toks[i].newline_before || cur.toks[i].start != cur.toks[i - 1].end {
    return false;
  }
  if !ends_expression(cur, i - 1) || cur.is_punct(i - 1, "}") {
    return false;
  }
  match cur.toks.get(i + 1) {
    None => true,
    Some(next) if next.newline_before => true,
    Some(next) => {
      next.kind == TokenKind::Punct
        && matches!(cur.text(i + 1), "." | "?." | "[" | "(" | ")" | "]" | "," | ";" | "}" | ":")
    }
  }
}

/// `abstract class Name<T> extends Base<T> implements I { ... }`
///
/// Member heads are rewritten here; the main pass continues into the body
/// for initializers and method bodies.
fn class(cur: &Cursor<'_>, i: usize, edits: &mut Vec<Edit>) -> Result<Option<usize>, ParseError> {
  let mut j = i + 1;
  if cur.is_kind(j, TokenKind::Ident) && !cur.is_ident(j, "extends") && !cur.is_ident(j, "implements") {
    j += 1;
  }
  if cur.is_punct(j, "<") {
    let close = cur.matching_angle(j)?;
    edits.push(cur.removal(j, close));
    j = close + 1;
  }
  if cur.is_ident(j, "extends") {
    j += 1;
    while j < cur.len() && !cur.is_punct(j, "{") && !cur.is_ident(j, "implements") {
      if cur.is_punct(j, "(") || cur.is_punct(j, "[") {
        j = cur.matching(j)? + 1;
        continue;
      }
      if cur.is_punct(j, "<") {
        let close = cur.matching_angle(j)?;
        edits.push(cur.removal(j, close));
        j = close + 1;
        continue;
      }
      j += 1;
    }
  }
  if cur.is_ident(j, "implements") {
    let start = j;
    while j < cur.len() && !cur.is_punct(j, "{") {
      if cur.is_punct(j, "<") {
        j = cur.matching_angle(j)?;
      }
      j += 1;
    }
    edits.push(Edit {
      start: cur.toks[start - 1].end,
      end: cur.toks[j - 1].end,
      text: String::new(),
    });
  }
  if !cur.is_punct(j, "{") {
    return Ok(None);
  }
  if i > 0 && cur.is_ident(i - 1, "abstract") {
    edits.push(strip_word(cur, i - 1));
  }

  let close = cur.matching(j)?;
  let mut k = j + 1;
  while k < close {
    k = member(cur, k, close, edits)?;
  }
  Ok(Some(j + 1))
}

/// A token that can start a member name.
fn starts_member_name(cur: &Cursor<'_>, k: usize) -> bool {
  match cur.toks.get(k).map(|t| t.kind) {
    Some(TokenKind::Ident | TokenKind::Str | TokenKind::Number) => true,
    Some(TokenKind::Punct) => matches!(cur.text(k), "[" | "*"),
    _ => false,
  }
}

/// Rewrite one class member starting at `start`; returns the index after it.
fn member(cur: &Cursor<'_>, start: usize, close: usize, edits: &mut Vec<Edit>) -> Result<usize, ParseError> {
  if cur.is_punct(start, ";") {
    return Ok(start + 1);
  }
  if cur.is_ident(start, "static") && cur.is_punct(start + 1, "{") {
    return Ok(cur.matching(start + 1)? + 1);
  }

  let mut k = start;
  let mut ambient = false;
  while cur.is_kind(k, TokenKind::Ident) && starts_member_name(cur, k + 1) && !cur.toks[k + 1].newline_before {
    let word = cur.text(k);
    if TS_MODIFIERS.contains(&word) {
      ambient |= word == "declare" || word == "abstract";
      edits.push(strip_word(cur, k));
    } else if !JS_MODIFIERS.contains(&word) {
      break;
    }
    k += 1;
  }
  if cur.is_punct(k, "*") {
    k += 1;
  }

  // `[key: string]: T`
  if cur.is_punct(k, "[") && cur.is_kind(k + 1, TokenKind::Ident) && cur.is_punct(k + 2, ":") {
    let end = cur.type_end(k, close, &[";"]);
    let last = if cur.is_punct(end + 1, ";") { end + 1 } else { end };
    edits.push(cur.removal(start, last));
    return Ok(last + 1);
  }

  if cur.is_punct(k, "[") {
    k = cur.matching(k)? + 1;
  } else if starts_member_name(cur, k) {
    k += 1;
  } else {
    return Ok(k + 1);
  }
  if (cur.is_punct(k, "?") || cur.is_punct(k, "!"))
    && [":", "(", "<", ";", "="].iter().any(|p| cur.is_punct(k + 1, p))
  {
    edits.push(cur.removal(k, k));
    k += 1;
  }

  if cur.is_punct(k, "<") || cur.is_punct(k, "(") {
    if cur.is_punct(k, "<") {
      let generics = cur.matching_angle(k)?;
      edits.push(cur.removal(k, generics));
      k = generics + 1;
    }
    if !cur.is_punct(k, "(") {
      return Err(cur.error(k, "expected method parameters"));
    }
    let params = strip_params(cur, k, edits)?;
    let mut next = params + 1;
    if cur.is_punct(next, ":") {
      let end = cur.type_end(next + 1, close, &["{", ";"]);
      if end <= next {
        return Err(cur.error(next, "expected return type after ':'"));
      }
      edits.push(cur.removal(next, end));
      next = end + 1;
    }
    if cur.is_punct(next, "{") {
      return Ok(cur.matching(next)? + 1);
    }
    // overload or abstract signature
    let last = if cur.is_punct(next, ";") { next } else { next - 1 };
    edits.push(cur.removal(start, last));
    return Ok(last + 1);
  }

  if cur.is_punct(k, ":") {
    let end = cur.type_end(k + 1, close, &["=", ";"]);
    if end <= k {
      return Err(cur.error(k, "expected type annotation after ':'"));
    }
    edits.push(cur.removal(k, end));
    k = end + 1;
  }
  if cur.is_punct(k, "=") {
    k = skip_initializer(cur, k + 1, close)?;
  }
  let last = if cur.is_punct(k, ";") { k } else { k - 1 };
  if ambient {
    edits.push(cur.removal(start, last));
  }
  Ok(last + 1)
}

/// Skip a field initializer; returns the index of its `;` or the next member.
fn skip_initializer(cur: &Cursor<'_>, mut k: usize, close: usize) -> Result<usize, ParseError> {
  let from = k;
  while k < close {
    if k > from && statement_break(cur, k) {
      break;
    }
    if cur.is_punct(k, "{") || cur.is_punct(k, "[") || cur.is_punct(k, "(") {
      k = cur.matching(k)? + 1;
      continue;
    }
    if cur.is_punct(k, ";") {
      break;
    }
    k += 1;
  }
  Ok(k)
}

/// Strip annotations inside the parameter list opened at `open`.
/// Returns the index of the closing `)`.
fn strip_params(cur: &Cursor<'_>, open: usize, edits: &mut Vec<Edit>) -> Result<usize, ParseError> {
  let close = cur.matching(open)?;
  let mut k = open + 1;
  let mut param_start = true;
  while k < close {
    if param_start && cur.is_ident(k, "this") && cur.is_punct(k + 1, ":") {
      let end = cur.type_end(k + 2, close, &[","]);
      let last = if cur.is_punct(end + 1, ",") { end + 1 } else { end };
      edits.push(cur.removal(k, last));
      k = last + 1;
      continue;
    }
    if param_start
      && PARAMETER_PROPERTY_WORDS.contains(&cur.text(k))
      && cur.is_kind(k, TokenKind::Ident)
      && (cur.is_kind(k + 1, TokenKind::Ident) || cur.is_punct(k + 1, "{") || cur.is_punct(k + 1, "["))
    {
      return Err(cur.error(k, "parameter properties are not supported"));
    }
    param_start = false;

    match cur.text(k) {
      "{" | "[" | "(" if cur.is_kind(k, TokenKind::Punct) => {
        k = cur.matching(k)? + 1;
        continue;
      }
      "," if cur.is_kind(k, TokenKind::Punct) => {
        param_start = true;
      }
      "?" if cur.is_kind(k, TokenKind::Punct) && (cur.is_punct(k + 1, ":") || cur.is_punct(k + 1, ",") || k + 1 == close) => {
        edits.push(cur.removal(k, k));
      }
      ":" if cur.is_kind(k, TokenKind::Punct) => {
        let end = cur.type_end(k + 1, close, &[",", "="]);
        if end <= k {
          return Err(cur.error(k, "expected parameter type after ':'"));
        }
        edits.push(cur.removal(k, end));
        k = end + 1;
        continue;
      }
      "=" if cur.is_kind(k, TokenKind::Punct) => {
        k = skip_default(cur, k + 1, close)?;
        continue;
      }
      _ => {}
    }
    k += 1;
  }
  Ok(close)
}

/// Skip a default-value expression; returns the index of the following `,` or `)`.
fn skip_default(cur: &Cursor<'_>, mut k: usize, close: usize) -> Result<usize, ParseError> {
  while k < close {
    if cur.is_punct(k, "{") || cur.is_punct(k, "[") || cur.is_punct(k, "(") {
      k = cur.matching(k)? + 1;
      continue;
    }
    if cur.is_punct(k, ",") {
      break;
    }
    k += 1;
  }
  Ok(k)
}
