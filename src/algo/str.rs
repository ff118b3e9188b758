//! Word-level scanning over block text.
//!
//! Every rewriting stage works on identifier-sized "words" (maximal runs of
//! `[A-Za-z0-9_]`) and must never look inside a literal placeholder. The
//! [`Segments`] iterator is the one place that knows both rules.

use crate::literal::{PLACEHOLDER};

use std::convert::{TryInto};

pub fn safe_ascii(s: &[u8]) -> String {
  let mut buf = String::new();
  for &x in s.iter() {
    if x == 0 {
      buf.push('#');
    } else if x == b'\n' {
      buf.push('\n');
    } else if x <= 0x20 {
      buf.push(' ');
    } else if x < 0x7f {
      buf.push(x.try_into().unwrap_or('?'));
    } else {
      buf.push('?');
    }
  }
  buf
}

#[inline]
pub fn is_word_byte(x: u8) -> bool {
  x.is_ascii_alphanumeric() || x == b'_'
}

#[inline]
pub fn is_ident(s: &str) -> bool {
  match s.as_bytes().first() {
    Some(x) if x.is_ascii_alphabetic() => s.bytes().all(is_word_byte),
    _ => false
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Segment<'a> {
  Word(&'a str),
  /// A complete placeholder, delimiters included.
  Placeholder(&'a str),
  Other(&'a str),
}

impl<'a> Segment<'a> {
  pub fn as_str(&self) -> &'a str {
    match *self {
      Segment::Word(s) |
      Segment::Placeholder(s) |
      Segment::Other(s) => s
    }
  }
}

#[derive(Clone)]
pub struct Segments<'a> {
  src:  &'a str,
  pos:  usize,
}

impl<'a> Segments<'a> {
  pub fn new(src: &'a str) -> Segments<'a> {
    Segments{src, pos: 0}
  }
}

impl<'a> Iterator for Segments<'a> {
  type Item = (usize, Segment<'a>);

  fn next(&mut self) -> Option<(usize, Segment<'a>)> {
    let bytes = self.src.as_bytes();
    let start = self.pos;
    if start >= bytes.len() {
      return None;
    }
    let x = bytes[start];
    let mut end = start + 1;
    let seg = if x == PLACEHOLDER {
      while end < bytes.len() && bytes[end] != PLACEHOLDER {
        end += 1;
      }
      // NB: an unclosed placeholder swallows the tail; the lexer never
      // produces one.
      end = (end + 1).min(bytes.len());
      Segment::Placeholder(&self.src[start .. end])
    } else if is_word_byte(x) {
      while end < bytes.len() && is_word_byte(bytes[end]) {
        end += 1;
      }
      Segment::Word(&self.src[start .. end])
    } else {
      while end < bytes.len() && !is_word_byte(bytes[end]) && bytes[end] != PLACEHOLDER {
        end += 1;
      }
      // Keep char boundaries intact for non-ascii text.
      while !self.src.is_char_boundary(end) {
        end += 1;
      }
      Segment::Other(&self.src[start .. end])
    };
    self.pos = end;
    Some((start, seg))
  }
}

/// Iterates the whole words of `src`, skipping placeholders.
pub fn words(src: &str) -> impl Iterator<Item=&str> {
  Segments::new(src).filter_map(|(_, seg)| match seg {
    Segment::Word(w) => Some(w),
    _ => None
  })
}

/// Rewrites every whole word for which `f` returns a replacement.
pub fn replace_words<F: FnMut(&str) -> Option<String>>(src: &str, mut f: F) -> String {
  let mut dst = String::with_capacity(src.len());
  for (_, seg) in Segments::new(src) {
    match seg {
      Segment::Word(w) => match f(w) {
        Some(r) => dst.push_str(&r),
        None => dst.push_str(w)
      },
      _ => dst.push_str(seg.as_str())
    }
  }
  dst
}

/// Renames whole words through `map`; words not in the map are kept.
pub fn rename_words<V: AsRef<str>>(src: &str, map: &crate::algo::BTreeMap<crate::algo::SmolStr, V>) -> String {
  replace_words(src, |w| map.get(w).map(|v| v.as_ref().to_string()))
}

/// Given `src` starting just past an opening paren, returns the byte offset
/// of the matching closing paren.
pub fn find_close_paren(src: &str) -> Option<usize> {
  let mut depth = 0usize;
  for (off, seg) in Segments::new(src) {
    if let Segment::Other(s) = seg {
      for (k, c) in s.char_indices() {
        match c {
          '(' => depth += 1,
          ')' => {
            if depth == 0 {
              return Some(off + k);
            }
            depth -= 1;
          }
          _ => {}
        }
      }
    }
  }
  None
}

/// Splits an argument list (the text between a call's parens) at top-level
/// commas. An empty list yields no arguments.
pub fn split_args(src: &str) -> Vec<&str> {
  let mut args = Vec::new();
  if src.trim().is_empty() {
    return args;
  }
  let mut depth = 0usize;
  let mut start = 0;
  for (off, seg) in Segments::new(src) {
    if let Segment::Other(s) = seg {
      for (k, c) in s.char_indices() {
        match c {
          '(' | '[' => depth += 1,
          ')' | ']' => depth = depth.saturating_sub(1),
          ',' if depth == 0 => {
            args.push(&src[start .. off + k]);
            start = off + k + 1;
          }
          _ => {}
        }
      }
    }
  }
  args.push(&src[start .. ]);
  args
}
