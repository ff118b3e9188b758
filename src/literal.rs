//! Literal table and rawcode codec.
//!
//! String and rawcode literals are lifted out of the text as soon as they
//! are lexed and replaced by `\0<id>\0` placeholders, so no later stage can
//! split or rename inside them.

use crate::algo::str::{Segment, Segments};

pub const PLACEHOLDER: u8 = 0;

/// Rawcode digits above this value are still legal but the literal would
/// not be shorter than its decimal form.
pub const RAWCODE_THRESHOLD: i64 = 999_999;

#[derive(Clone, Default, Debug)]
pub struct LiteralTable {
  lits: Vec<String>,
}

impl LiteralTable {
  pub fn len(&self) -> usize {
    self.lits.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lits.is_empty()
  }

  /// Registers `raw` (quotes included) and returns its placeholder.
  pub fn intern(&mut self, raw: String) -> String {
    let id = self.lits.len();
    self.lits.push(raw);
    placeholder(id)
  }

  pub fn get(&self, id: usize) -> Option<&str> {
    self.lits.get(id).map(|s| s.as_str())
  }

  pub fn get_mut(&mut self, id: usize) -> Option<&mut String> {
    self.lits.get_mut(id)
  }

  /// Resolves a placeholder segment back to its literal text.
  pub fn lookup(&self, ph: &str) -> Option<&str> {
    self.get(placeholder_id(ph)?)
  }

  /// Replaces every placeholder in `src` with its literal text.
  pub fn restore(&self, src: &str) -> String {
    let mut dst = String::with_capacity(src.len());
    for (_, seg) in Segments::new(src) {
      match seg {
        Segment::Placeholder(ph) => match self.lookup(ph) {
          Some(lit) => dst.push_str(lit),
          None => dst.push_str(ph)
        },
        _ => dst.push_str(seg.as_str())
      }
    }
    dst
  }

  /// Interns every quoted literal found in `src`, e.g. text that comes from
  /// an external substitution table rather than from the lexer.
  pub fn intern_literals(&mut self, src: &str) -> String {
    let mut dst = String::with_capacity(src.len());
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
      if c != '"' && c != '\'' {
        dst.push(c);
        continue;
      }
      let mut lit = String::new();
      lit.push(c);
      let mut closed = false;
      while let Some(d) = chars.next() {
        lit.push(d);
        if d == '\\' {
          if let Some(e) = chars.next() {
            lit.push(e);
          }
        } else if d == c {
          closed = true;
          break;
        }
      }
      if closed {
        dst.push_str(&self.intern(lit));
      } else {
        dst.push_str(&lit);
      }
    }
    dst
  }
}

pub fn placeholder(id: usize) -> String {
  format!("\u{0}{}\u{0}", id)
}

pub fn placeholder_id(ph: &str) -> Option<usize> {
  let inner = ph.strip_prefix('\u{0}')?.strip_suffix('\u{0}')?;
  inner.parse().ok()
}

pub fn is_rawcode(lit: &str) -> bool {
  lit.len() >= 2 && lit.starts_with('\'') && lit.ends_with('\'')
}

/// Packs a rawcode literal (quotes included) into its integer value,
/// reading the bytes big-endian.
pub fn rawcode_to_int(lit: &str) -> Option<i64> {
  if !is_rawcode(lit) {
    return None;
  }
  let inner = &lit.as_bytes()[1 .. lit.len() - 1];
  let mut value: i64 = 0;
  let mut n = 0;
  let mut idx = 0;
  while idx < inner.len() {
    let mut x = inner[idx];
    if x == b'\\' {
      idx += 1;
      x = match inner.get(idx) {
        Some(&b'\\') => b'\\',
        Some(&b'\'') => b'\'',
        Some(&b'"') => b'"',
        Some(&b'n') => b'\n',
        Some(&b'r') => b'\r',
        Some(&b't') => b'\t',
        Some(&b'b') => 0x08,
        Some(&b'f') => 0x0c,
        _ => return None
      };
    }
    value = value * 256 + x as i64;
    n += 1;
    idx += 1;
  }
  if n == 1 || n == 4 {
    Some(value)
  } else {
    None
  }
}

fn rawcode_digit(x: u8) -> Option<char> {
  match x {
    b'\'' | b'"' | b'\\' => None,
    0x21 ..= 0x7e => Some(x as char),
    _ => None
  }
}

/// Encodes `value` as a four-digit rawcode literal, or `None` when one of
/// its base-256 digits has no plain printable form.
pub fn int_to_rawcode(value: i64) -> Option<String> {
  if value < 0 || value > i32::MAX as i64 {
    return None;
  }
  let mut digits = [0u8; 4];
  let mut rest = value;
  for k in (0 .. 4).rev() {
    digits[k] = (rest % 256) as u8;
    rest /= 256;
  }
  let mut lit = String::with_capacity(6);
  lit.push('\'');
  for &x in digits.iter() {
    lit.push(rawcode_digit(x)?);
  }
  lit.push('\'');
  Some(lit)
}
