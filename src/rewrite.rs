//! Boolean constant extraction and numeric literal re-encoding.

use crate::algo::str::{Segment, Segments, replace_words, words};
use crate::env::{Decl, Env};
use crate::literal::{RAWCODE_THRESHOLD, int_to_rawcode};
use crate::names::{NamePool};

use log::{debug, info};

pub const BOOLEANS: &[&str] = &["true", "false"];

fn count_word(env: &Env, word: &str) -> usize {
  let mut n = 0;
  for d in env.globals() {
    if let Some(init) = d.init.as_ref() {
      n += words(init).filter(|&w| w == word).count();
    }
  }
  for f in env.functions.iter() {
    n += words(&f.body).filter(|&w| w == word).count();
  }
  n
}

/// Whether `uses` occurrences of `lit` cost more than one constant named
/// `name` plus `uses` references to it.
pub fn worth_extracting(lit: &str, name: &str, uses: usize) -> bool {
  let decl = format!("constant boolean {}={}", name, lit);
  uses * lit.len() > uses * name.len() + decl.len()
}

/// Replaces `true`/`false` with short constants where that saves bytes.
/// Returns how many constants were introduced.
pub fn extract_booleans(env: &mut Env, pool: &mut NamePool) -> usize {
  let mut extracted = 0;
  for &lit in BOOLEANS.iter() {
    let uses = count_word(env, lit);
    if uses == 0 || !worth_extracting(lit, &pool.peek(), uses) {
      continue;
    }
    let name = pool.next_name();
    debug!("rewrite: {} ({} uses) -> constant {}", lit, uses, name);
    let subst = |w: &str| if w == lit { Some(name.to_string()) } else { None };
    for d in env.decls.iter_mut().filter(|d| !d.is_constant) {
      if let Some(init) = d.init.as_mut() {
        *init = replace_words(init, subst);
      }
    }
    for f in env.functions.iter_mut() {
      f.body = replace_words(&f.body, subst);
    }
    env.decls.insert(0, Decl{
      is_constant:  true,
      is_array:     false,
      ty:           "boolean".into(),
      name,
      init:         Some(lit.to_string()),
      uses:         uses as u32,
      folded:       false,
    });
    extracted += 1;
  }
  if extracted > 0 {
    info!("rewrite: extracted {} boolean constants", extracted);
  }
  extracted
}

fn decimal(value: i64) -> String {
  if value > RAWCODE_THRESHOLD {
    if let Some(lit) = int_to_rawcode(value) {
      return lit;
    }
  }
  value.to_string()
}

/// Rewrites hex literals (`0x1F`, `$1F`) to decimal and large decimal
/// literals to rawcodes. Digits touching a `.` belong to a real literal and
/// octal literals keep their form.
pub fn rewrite_numbers(src: &str) -> String {
  let bytes = src.as_bytes();
  let mut dst = String::with_capacity(src.len());
  for (off, seg) in Segments::new(src) {
    let w = match seg {
      Segment::Word(w) if off > 0 && bytes[off - 1] == b'$' => {
        let value = match i64::from_str_radix(w, 16) {
          Ok(v) if v <= i32::MAX as i64 => v,
          _ => {
            dst.push_str(w);
            continue;
          }
        };
        dst.pop();
        dst.push_str(&decimal(value));
        continue;
      }
      Segment::Word(w) if w.as_bytes()[0].is_ascii_digit() => w,
      _ => {
        dst.push_str(seg.as_str());
        continue;
      }
    };
    let end = off + w.len();
    let hex = w.strip_prefix("0x").or_else(|| w.strip_prefix("0X"));
    let value = if let Some(digits) = hex {
      i64::from_str_radix(digits, 16).ok().filter(|&v| v <= i32::MAX as i64)
    } else if w.len() > 1 && w.starts_with('0') {
      None
    } else if (off > 0 && bytes[off - 1] == b'.') || bytes.get(end) == Some(&b'.') {
      None
    } else {
      w.parse::<i64>().ok().filter(|&v| v > RAWCODE_THRESHOLD)
    };
    match value {
      Some(v) => dst.push_str(&decimal(v)),
      None => dst.push_str(w)
    }
  }
  dst
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::env::{Function};
  use crate::parsing::{parse_globals};

  #[test]
  fn threshold() {
    // `constant boolean A=true` is 23 bytes.
    assert!(!worth_extracting("true", "A", 7));
    assert!(worth_extracting("true", "A", 8));
    assert!(!worth_extracting("false", "A", 6));
    assert!(worth_extracting("false", "A", 7));
  }

  #[test]
  fn extracts_frequent_literals() {
    let mut env = Env::default();
    env.decls = parse_globals("boolean g=true\nconstant boolean K=true").unwrap();
    let body = vec!["set g=true"; 8].join("\n");
    env.functions.push(Function::new("main".into(), "nothing".into(), "nothing".into(), body));
    let mut pool = NamePool::global();
    assert_eq!(extract_booleans(&mut env, &mut pool), 1);
    assert_eq!(env.decls[0].render(), "constant boolean A=true");
    assert_eq!(env.decls[1].render(), "boolean g=A");
    assert_eq!(env.decls[2].render(), "constant boolean K=true");
    assert!(env.functions[0].body.lines().all(|l| l == "set g=A"));
    assert_eq!(pool.next_name(), "B");
  }

  #[test]
  fn rare_literals_stay() {
    let mut env = Env::default();
    env.functions.push(Function::new("main".into(), "nothing".into(), "nothing".into(), "set a=true\nset b=false".into()));
    assert_eq!(extract_booleans(&mut env, &mut NamePool::global()), 0);
    assert_eq!(env.functions[0].body, "set a=true\nset b=false");
  }

  #[test]
  fn numbers() {
    assert_eq!(rewrite_numbers("set x=0x10+$ff+0XA"), "set x=16+255+10");
    assert_eq!(rewrite_numbers("set x=$10+$7F-$1000"), "set x=16+127-4096");
    assert_eq!(rewrite_numbers("set x=$4840413A"), "set x='H@A:'");
    assert_eq!(rewrite_numbers("set x=1212170554"), "set x='H@A:'");
    assert_eq!(rewrite_numbers("set x=1000000"), "set x=1000000");
    assert_eq!(rewrite_numbers("set x=999999+010"), "set x=999999+010");
    assert_eq!(rewrite_numbers("set r=1234567.5"), "set r=1234567.5");
    assert_eq!(rewrite_numbers("set v=B2"), "set v=B2");
    assert_eq!(rewrite_numbers("call F(\u{0}1234567\u{0})"), "call F(\u{0}1234567\u{0})");
  }
}
