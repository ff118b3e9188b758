use crate::algo::str::{safe_ascii};
use crate::env::{Env};
use crate::rewrite::{rewrite_numbers};

use log::{trace};

/// Collapses newline runs and drops leading blank lines.
pub fn collapse_newlines(src: &str) -> String {
  let mut dst = String::with_capacity(src.len());
  for c in src.chars() {
    if c == '\n' && (dst.is_empty() || dst.ends_with('\n')) {
      continue;
    }
    dst.push(c);
  }
  dst
}

/// Assembles the program text: the globals section (when there is
/// anything to declare), the natives, then the functions.
pub fn assemble(env: &Env) -> String {
  let mut dst = String::new();
  if !env.decls.is_empty() {
    dst.push_str("globals\n");
    for d in env.decls.iter() {
      dst.push_str(&d.render());
      dst.push('\n');
    }
    dst.push_str("endglobals\n");
  }
  for n in env.natives.iter() {
    dst.push_str(&n.render());
    dst.push('\n');
  }
  for f in env.functions.iter() {
    dst.push_str(&f.render());
    dst.push('\n');
  }
  dst
}

pub fn emit(env: &Env) -> String {
  let text = collapse_newlines(&rewrite_numbers(&assemble(env)));
  trace!("emit: before literal restore:\n{}", safe_ascii(text.as_bytes()));
  env.literals.restore(&text)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::env::{Function};
  use crate::parsing::{parse_globals, parse_native};

  #[test]
  fn layout() {
    let mut env = Env::default();
    let ph = env.literals.intern("\"hi\"".into());
    env.decls = parse_globals("integer A=1212170554\ninteger C=2000000000").unwrap();
    env.natives.push(parse_native("native N takes nothing returns nothing").unwrap());
    env.functions.push(Function::new("main".into(), "nothing".into(), "nothing".into(), String::new()));
    env.functions.push(Function::new("B".into(), "nothing".into(), "nothing".into(), format!("call N()\ncall BJDebugMsg({})", ph)));
    assert_eq!(emit(&env), concat!(
        "globals\ninteger A='H@A:'\ninteger C=2000000000\nendglobals\n",
        "native N takes nothing returns nothing\n",
        "function main takes nothing returns nothing\nendfunction\n",
        "function B takes nothing returns nothing\ncall N()\ncall BJDebugMsg(\"hi\")\nendfunction\n"
    ));
  }

  #[test]
  fn empty_globals_omitted() {
    let env = Env::default();
    assert_eq!(emit(&env), "");
    assert_eq!(collapse_newlines("\n\na\n\n\nb\n"), "a\nb\n");
  }
}
