//! Frequency-ranked identifier renaming.
//!
//! Constants, globals and non-entry functions share one namespace and draw
//! from the global pool; each function's parameters and locals, and each
//! native's parameters, draw from a fresh local pool.

use crate::algo::*;
use crate::algo::str::{Segment, Segments, rename_words, words};
use crate::env::{Env, Function, Native};
use crate::literal::{LiteralTable};
use crate::names::{NamePool};
use crate::parsing::{parse_local, parse_params, render_params};
use crate::usage::{Idiom, idiom_literal_ids};

use log::{debug, info, trace, warn};

pub type RenameMap = BTreeMap<SmolStr, SmolStr>;

/// Stable by input order on ties.
fn rank(mut items: Vec<(SmolStr, i64)>) -> Vec<SmolStr> {
  items.sort_by(|a, b| b.1.cmp(&a.1));
  items.into_iter().map(|(name, _)| name).collect()
}

/// Every word the emitted program will contain, literals excluded.
fn program_words(env: &Env) -> BTreeSet<SmolStr> {
  let mut set = BTreeSet::new();
  for d in env.decls.iter() {
    set.insert(d.ty.clone());
    set.insert(d.name.clone());
    if let Some(init) = d.init.as_ref() {
      set.extend(words(init).map(SmolStr::from));
    }
  }
  for n in env.natives.iter() {
    set.insert(n.name.clone());
    set.insert(n.ret.clone());
    for (ty, name) in n.params.iter() {
      set.insert(ty.clone());
      set.insert(name.clone());
    }
  }
  for f in env.functions.iter() {
    set.insert(f.name.clone());
    set.insert(f.ret.clone());
    set.extend(words(&f.params).map(SmolStr::from));
    set.extend(words(&f.body).map(SmolStr::from));
  }
  set
}

/// Renames the identifier a callback or variable event literal names.
fn rename_literal_ident(lit: &mut String, map: &RenameMap) {
  let hit = Segments::new(lit).find_map(|(off, seg)| match seg {
    Segment::Word(w) => Some((off, w.len(), map.get(w).cloned())),
    _ => None
  });
  if let Some((off, len, Some(new))) = hit {
    lit.replace_range(off .. off + len, &new);
  }
}

fn rename_idiom_literals(env: &Env, literals: &mut LiteralTable, map: &RenameMap) {
  let mut ids = BTreeSet::new();
  for f in env.functions.iter() {
    ids.extend(idiom_literal_ids(&f.body, Idiom::ExecuteFunc));
    ids.extend(idiom_literal_ids(&f.body, Idiom::VariableEvent));
  }
  for id in ids {
    if let Some(lit) = literals.get_mut(id) {
      rename_literal_ident(lit, map);
    }
  }
}

/// Renames constants, globals and non-entry functions, drawing from `pool`.
///
/// Expects fresh usage counts. Words of the program that are not renamed
/// here are reserved in `pool`, so later draws stay collision free.
pub fn rename_globals(env: &mut Env, pool: &mut NamePool) -> RenameMap {
  let mut items = Vec::new();
  for d in env.constants().chain(env.globals()) {
    items.push((d.name.clone(), d.uses as i64));
  }
  for f in env.functions.iter().filter(|f| !f.entry) {
    items.push((f.name.clone(), f.uses as i64));
  }
  let order = rank(items);
  let renamed: BTreeSet<SmolStr> = order.iter().cloned().collect();
  pool.reserve(program_words(env).into_iter().filter(|w| !renamed.contains(w)));
  let mut map = RenameMap::new();
  for name in order.into_iter() {
    if map.contains_key(&name) {
      continue;
    }
    let new = pool.next_name();
    debug!("rename: {} -> {}", name, new);
    map.insert(name, new);
  }
  let mut literals = std::mem::take(&mut env.literals);
  rename_idiom_literals(env, &mut literals, &map);
  env.literals = literals;
  for d in env.decls.iter_mut() {
    if let Some(new) = map.get(&d.name) {
      d.name = new.clone();
    }
    if let Some(init) = d.init.as_mut() {
      *init = rename_words(init, &map);
    }
  }
  for f in env.functions.iter_mut() {
    if let Some(new) = map.get(&f.name) {
      f.name = new.clone();
    }
    let shadowed = f.scoped_names();
    if shadowed.iter().any(|s| map.contains_key(s)) {
      let visible: RenameMap = map.iter()
        .filter(|(k, _)| !shadowed.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
      f.body = rename_words(&f.body, &visible);
    } else {
      f.body = rename_words(&f.body, &map);
    }
  }
  info!("rename: {} global names", map.len());
  map
}

/// Renames one function's parameters and locals, deleting locals that are
/// never referenced past their declaration. Returns the number of deleted
/// locals.
pub fn rename_locals(f: &mut Function) -> usize {
  let params = match parse_params(&f.params) {
    Some(params) => params,
    None => {
      warn!("rename: cannot read parameters of {}, leaving its locals", f.name);
      return 0;
    }
  };
  let mut counts: BTreeMap<SmolStr, i64> = BTreeMap::new();
  let mut items = Vec::new();
  for (_, name) in params.iter() {
    counts.insert(name.clone(), 1);
    items.push(name.clone());
  }
  for name in f.body.lines().filter_map(parse_local) {
    if !counts.contains_key(&name) {
      counts.insert(name.clone(), -1);
      items.push(name);
    }
  }
  for w in words(&f.body) {
    if let Some(n) = counts.get_mut(w) {
      *n += 1;
    }
  }
  let dead: BTreeSet<SmolStr> = counts.iter()
    .filter(|&(_, &n)| n <= 0)
    .map(|(name, _)| name.clone())
    .collect();
  if !dead.is_empty() {
    let kept: Vec<&str> = f.body.lines()
      .filter(|line| match parse_local(line) {
        Some(name) => !dead.contains(&name),
        None => true
      })
      .collect();
    f.body = kept.join("\n");
    debug!("rename: {} drops unused locals {:?}", f.name, dead);
  }
  let order = rank(items.into_iter()
    .filter(|name| !dead.contains(name))
    .map(|name| {
      let n = counts.get(&name).copied().unwrap_or(0);
      (name, n)
    })
    .collect());
  let renamed: BTreeSet<SmolStr> = order.iter().cloned().collect();
  let mut pool = NamePool::local();
  pool.reserve(words(&f.body).chain(words(&f.params)).filter(|w| !renamed.contains(*w)));
  let map: RenameMap = order.iter().map(|name| (name.clone(), pool.next_name())).collect();
  trace!("rename: locals of {}: {:?}", f.name, map);
  let params: Vec<(SmolStr, SmolStr)> = params.into_iter()
    .map(|(ty, name)| {
      let name = map.get(&name).cloned().unwrap_or(name);
      (ty, name)
    })
    .collect();
  f.params = render_params(&params);
  f.body = rename_words(&f.body, &map);
  dead.len()
}

pub fn rename_native_params(n: &mut Native) {
  let mut pool = NamePool::local();
  for (_, name) in n.params.iter_mut() {
    *name = pool.next_name();
  }
}

/// Runs the local pass over every function and native.
pub fn rename_all_locals(env: &mut Env) {
  let mut dropped = 0;
  for f in env.functions.iter_mut() {
    dropped += rename_locals(f);
  }
  for n in env.natives.iter_mut() {
    rename_native_params(n);
  }
  info!("rename: dropped {} unused locals", dropped);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parsing::{parse_globals};
  use crate::usage::{count_calls, count_decl_uses};

  fn func(name: &str, params: &str, body: &str) -> Function {
    Function::new(name.into(), params.into(), "nothing".into(), body.into())
  }

  #[test]
  fn globals_by_frequency() {
    let mut env = Env::default();
    env.decls = parse_globals("constant integer RARE=1\ninteger common\ninteger Both=RARE").unwrap();
    env.functions.push(func("main", "nothing", "call Helper()\nset common=common+Both\nset common=Both"));
    env.functions.push(func("Helper", "nothing", "set common=0"));
    count_calls(&mut env);
    count_decl_uses(&mut env);
    let map = rename_globals(&mut env, &mut NamePool::global());
    assert_eq!(map["common"], "A");
    assert_eq!(map["Both"], "B");
    assert_eq!(map["RARE"], "C");
    assert_eq!(map["Helper"], "D");
    assert!(!map.contains_key("main"));
    assert_eq!(env.decls[2].render(), "integer B=C");
    assert_eq!(env.functions[0].body, "call D()\nset A=A+B\nset A=B");
    assert_eq!(env.functions[1].name, "D");
  }

  #[test]
  fn reserved_program_words_are_skipped() {
    let mut env = Env::default();
    env.decls = parse_globals("integer g").unwrap();
    env.functions.push(func("main", "nothing", "set g=A"));
    count_decl_uses(&mut env);
    let map = rename_globals(&mut env, &mut NamePool::global());
    assert_eq!(map["g"], "B");
  }

  #[test]
  fn shadowed_names_are_left_alone() {
    let mut env = Env::default();
    env.decls = parse_globals("integer x").unwrap();
    env.functions.push(func("main", "nothing", "set x=1"));
    env.functions.push(func("F", "integer x", "return x"));
    count_calls(&mut env);
    count_decl_uses(&mut env);
    rename_globals(&mut env, &mut NamePool::global());
    assert_eq!(env.functions[0].body, "set A=1");
    assert_eq!(env.functions[1].body, "return x");
  }

  #[test]
  fn callback_literals_follow() {
    let mut env = Env::default();
    let ph = env.literals.intern("\"Later\"".into());
    env.functions.push(func("main", "nothing", &format!("call ExecuteFunc({})", ph)));
    env.functions.push(func("Later", "nothing", ""));
    count_calls(&mut env);
    rename_globals(&mut env, &mut NamePool::global());
    assert_eq!(env.literals.get(0), Some("\"A\""));
    assert_eq!(env.functions[1].name, "A");
  }

  #[test]
  fn variable_event_literals_follow() {
    let mut env = Env::default();
    env.decls = parse_globals("real watched").unwrap();
    let ph = env.literals.intern("\"watched\"".into());
    env.functions.push(func("main", "nothing", &format!("call TriggerRegisterVariableEvent(t,{},EQUAL,1)", ph)));
    count_calls(&mut env);
    count_decl_uses(&mut env);
    assert_eq!(env.decls[0].uses, 1);
    let map = rename_globals(&mut env, &mut NamePool::global());
    assert_eq!(map["watched"], "A");
    assert_eq!(env.decls[0].render(), "real A");
    assert_eq!(env.literals.get(0), Some("\"A\""));
  }

  #[test]
  fn locals_ranked_and_pruned() {
    let mut f = func("F", "integer count,real scale",
        "local integer unused=5\nlocal real array acc\nset acc[0]=scale\nset acc[1]=acc[0]*acc[0]\nreturn count");
    let dropped = rename_locals(&mut f);
    assert_eq!(dropped, 1);
    // acc: 4 uses, count and scale: 2 each.
    assert_eq!(f.params, "integer b,real c");
    assert_eq!(f.body, "local real array a\nset a[0]=c\nset a[1]=a[0]*a[0]\nreturn b");
  }

  #[test]
  fn locals_avoid_body_words() {
    let mut f = func("F", "nothing", "local integer n=a(1)\nreturn n");
    rename_locals(&mut f);
    assert_eq!(f.body, "local integer b=a(1)\nreturn b");
  }

  #[test]
  fn native_params() {
    let mut n = crate::parsing::parse_native("native SetFoo takes integer whichFoo,real value returns nothing").unwrap();
    rename_native_params(&mut n);
    assert_eq!(n.render(), "native SetFoo takes integer a,real b returns nothing");
  }
}
