//! Short identifier pools.
//!
//! A pool hands out names in ascending length. Global names always carry an
//! uppercase letter and local names never do, so the two schemes cannot
//! collide. Names never begin or end with `_`, and reserved words are
//! skipped.

use crate::algo::*;
use crate::parsing::{DATATYPES};

pub const KEYWORDS: &[&str] = &[
  "and", "array", "call", "constant", "debug", "else", "elseif", "endfunction",
  "endglobals", "endif", "endloop", "exitwhen", "extends", "false", "function",
  "globals", "if", "local", "loop", "native", "not", "nothing", "null", "or",
  "return", "returns", "set", "takes", "then", "true", "type",
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Class {
  Upper,
  Lower,
  Digit,
}

use self::Class::{Digit as D, Lower as L, Upper as U};

impl Class {
  fn chars(self) -> &'static [u8] {
    match self {
      Class::Upper => b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
      Class::Lower => b"abcdefghijklmnopqrstuvwxyz",
      Class::Digit => b"0123456789",
    }
  }
}

const GLOBAL_PATTERNS: &[&[Class]] = &[
  &[U],
  &[U, U], &[L, U], &[U, L], &[U, D],
  &[U, U, U], &[U, L, L], &[U, U, L], &[U, U, D], &[U, D, D], &[U, D, U],
  &[L, U, U], &[L, L, U], &[L, U, L], &[L, U, D],
];

const LOCAL_PATTERNS: &[&[Class]] = &[
  &[L],
  &[L, L], &[L, D],
  &[L, L, L], &[L, L, D], &[L, D, D], &[L, D, L],
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scheme {
  Global,
  Local,
}

impl Scheme {
  fn patterns(self) -> &'static [&'static [Class]] {
    match self {
      Scheme::Global => GLOBAL_PATTERNS,
      Scheme::Local => LOCAL_PATTERNS,
    }
  }

  fn fallback_first(self) -> &'static [u8] {
    match self {
      Scheme::Global => b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz",
      Scheme::Local => b"abcdefghijklmnopqrstuvwxyz",
    }
  }

  fn fallback_rest(self) -> &'static [u8] {
    match self {
      Scheme::Global => b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
      Scheme::Local => b"abcdefghijklmnopqrstuvwxyz0123456789",
    }
  }

  fn admits(self, name: &str) -> bool {
    match self {
      Scheme::Global => name.bytes().any(|b| b.is_ascii_uppercase()),
      Scheme::Local => true,
    }
  }
}

/// Decodes `counter` as a mixed-radix number over `classes`, last position
/// fastest.
fn spell(classes: &[&[u8]], mut counter: u64) -> String {
  let mut buf = vec![0u8; classes.len()];
  for (k, cs) in classes.iter().enumerate().rev() {
    let radix = cs.len() as u64;
    buf[k] = cs[(counter % radix) as usize];
    counter /= radix;
  }
  buf.into_iter().map(|b| b as char).collect()
}

fn capacity(classes: &[&[u8]]) -> u64 {
  classes.iter().fold(1u64, |acc, cs| acc.saturating_mul(cs.len() as u64))
}

#[derive(Clone, Debug)]
pub struct NamePool {
  scheme: Scheme,
  /// Index into the scheme's patterns, or the fallback length once they
  /// run out.
  stage: usize,
  counter: u64,
  reserved: HashSet<SmolStr>,
  peeked: Option<SmolStr>,
}

impl NamePool {
  pub fn new(scheme: Scheme) -> NamePool {
    let mut reserved = HashSet::new();
    for &w in KEYWORDS.iter().chain(DATATYPES.iter()) {
      reserved.insert(SmolStr::from(w));
    }
    NamePool{scheme, stage: 0, counter: 0, reserved, peeked: None}
  }

  pub fn global() -> NamePool {
    NamePool::new(Scheme::Global)
  }

  pub fn local() -> NamePool {
    NamePool::new(Scheme::Local)
  }

  /// Marks names that must never be handed out.
  pub fn reserve<I, S>(&mut self, names: I) where I: IntoIterator<Item=S>, S: AsRef<str> {
    for name in names {
      self.reserved.insert(name.as_ref().into());
    }
    if let Some(p) = self.peeked.take() {
      if !self.reserved.contains(&p) {
        self.peeked = Some(p);
      }
    }
  }

  pub fn is_reserved(&self, name: &str) -> bool {
    self.reserved.contains(name)
  }

  /// The name the next call to `next` will return.
  pub fn peek(&mut self) -> SmolStr {
    if let Some(p) = self.peeked.as_ref() {
      return p.clone();
    }
    let p = self.fresh();
    self.peeked = Some(p.clone());
    p
  }

  /// Consumes and returns the next unused name.
  pub fn next_name(&mut self) -> SmolStr {
    match self.peeked.take() {
      Some(p) => p,
      None => self.fresh()
    }
  }

  fn candidate(&mut self) -> String {
    let patterns = self.scheme.patterns();
    loop {
      if self.stage < patterns.len() {
        let classes: Vec<&[u8]> = patterns[self.stage].iter().map(|c| c.chars()).collect();
        if self.counter < capacity(&classes) {
          let name = spell(&classes, self.counter);
          self.counter += 1;
          return name;
        }
      } else {
        let len = self.stage - patterns.len() + 4;
        let mut classes: Vec<&[u8]> = vec![self.scheme.fallback_first()];
        for _ in 1 .. len {
          classes.push(self.scheme.fallback_rest());
        }
        if self.counter < capacity(&classes) {
          let name = spell(&classes, self.counter);
          self.counter += 1;
          return name;
        }
      }
      self.stage += 1;
      self.counter = 0;
    }
  }

  fn fresh(&mut self) -> SmolStr {
    loop {
      let name = self.candidate();
      if self.scheme.admits(&name) && !self.reserved.contains(name.as_str()) {
        return name.into();
      }
    }
  }
}

impl Iterator for NamePool {
  type Item = SmolStr;

  fn next(&mut self) -> Option<SmolStr> {
    Some(self.next_name())
  }
}
