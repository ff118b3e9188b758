//! External substitution tables and inlining.
//!
//! A table is line oriented: `NAME REPLACEMENT`, split at the first run of
//! whitespace. Function replacements refer to call arguments as `\0`, `\1`
//! and so on.

use crate::algo::*;
use crate::algo::str::{Segment, Segments, find_close_paren, replace_words, split_args};
use crate::env::{Env};
use crate::error::{MinifyErr, MinifyResult};
use crate::literal::{LiteralTable};
use crate::normalize::{squeeze_block};

use log::{debug, info, warn};

use std::fs;
use std::io;
use std::path::{Path};

#[derive(Clone, Default, Debug)]
pub struct ExternalMap {
  map: BTreeMap<SmolStr, String>,
}

impl ExternalMap {
  pub fn parse(src: &str) -> ExternalMap {
    let mut map = BTreeMap::new();
    for line in src.lines() {
      let line = line.trim_start();
      if line.is_empty() {
        continue;
      }
      let (name, text) = match line.find(|c: char| c.is_whitespace()) {
        Some(off) => (&line[ .. off], line[off .. ].trim()),
        None => (line, "")
      };
      map.insert(name.into(), text.to_string());
    }
    ExternalMap{map}
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.map.get(name).map(|s| s.as_str())
  }

  pub fn insert<S: Into<SmolStr>>(&mut self, name: S, text: String) {
    self.map.insert(name.into(), text);
  }
}

/// Replacement texts of one table, with their literals moved into the
/// program's literal table the first time each entry is used.
pub struct Interned<'a> {
  table:  &'a ExternalMap,
  cache:  BTreeMap<SmolStr, String>,
}

impl<'a> Interned<'a> {
  pub fn new(table: &'a ExternalMap) -> Interned<'a> {
    Interned{table, cache: BTreeMap::new()}
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  /// Number of distinct entries looked up so far.
  pub fn used(&self) -> usize {
    self.cache.len()
  }

  pub fn get(&mut self, name: &str, literals: &mut LiteralTable) -> Option<String> {
    if let Some(text) = self.cache.get(name) {
      return Some(text.clone());
    }
    let text = squeeze_block(&literals.intern_literals(self.table.get(name)?));
    self.cache.insert(name.into(), text.clone());
    Some(text)
  }
}

/// Reads a table from disk; a missing file is an empty table.
pub fn load_table<P: AsRef<Path>>(path: P) -> MinifyResult<ExternalMap> {
  let path = path.as_ref();
  match fs::read_to_string(path) {
    Ok(src) => {
      let table = ExternalMap::parse(&src);
      info!("loaded {} entries from {}", table.len(), path.display());
      Ok(table)
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      info!("no table at {}, skipping", path.display());
      Ok(ExternalMap::default())
    }
    Err(source) => Err(MinifyErr::Io{path: path.to_path_buf(), source})
  }
}

/// Substitutes `\N` argument references; `None` if an index is missing.
fn expand_template(template: &str, args: &[String]) -> Option<String> {
  let mut dst = String::with_capacity(template.len());
  let bytes = template.as_bytes();
  let mut idx = 0;
  while idx < bytes.len() {
    if bytes[idx] == b'\\' && idx + 1 < bytes.len() && bytes[idx + 1].is_ascii_digit() {
      let start = idx + 1;
      let mut end = start;
      while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
      }
      let k: usize = template[start .. end].parse().ok()?;
      dst.push_str(args.get(k)?);
      idx = end;
    } else {
      let c = template[idx .. ].chars().next()?;
      dst.push(c);
      idx += c.len_utf8();
    }
  }
  Some(dst)
}

/// Inlines every call to a name in `funcs` found in `src`.
pub fn inline_calls(src: &str, funcs: &mut Interned, literals: &mut LiteralTable) -> String {
  let mut dst = String::with_capacity(src.len());
  let mut done = 0;
  for (off, seg) in Segments::new(src) {
    if off < done {
      // Only punctuation can run past a closing paren.
      let end = off + seg.as_str().len();
      if end > done {
        dst.push_str(&src[done .. end]);
        done = end;
      }
      continue;
    }
    let name = match seg {
      Segment::Word(w) => w,
      _ => {
        dst.push_str(seg.as_str());
        done = off + seg.as_str().len();
        continue;
      }
    };
    let after = off + name.len();
    let template = if src[after .. ].starts_with('(') { funcs.get(name, literals) } else { None };
    let template = match template {
      Some(t) => t,
      None => {
        dst.push_str(name);
        done = after;
        continue;
      }
    };
    let inner_start = after + 1;
    let close = match find_close_paren(&src[inner_start .. ]) {
      Some(close) => inner_start + close,
      None => {
        dst.push_str(name);
        done = after;
        continue;
      }
    };
    let args: Vec<String> = split_args(&src[inner_start .. close])
      .into_iter()
      .map(|arg| inline_calls(arg, funcs, literals))
      .collect();
    match expand_template(&template, &args) {
      Some(text) => {
        debug!("inline: {} with {} args", name, args.len());
        if text.starts_with("set ") && dst.ends_with("call ") {
          let keep = dst.len() - "call ".len();
          dst.truncate(keep);
        }
        dst.push_str(&text);
      }
      None => {
        warn!("inline: {} takes more arguments than given, leaving the call", name);
        dst.push_str(&src[off .. close + 1]);
      }
    }
    done = close + 1;
  }
  dst
}

/// Replaces every bare occurrence of a name in `consts` that is not in
/// `shadowed`.
pub fn inline_constants(src: &str, consts: &mut Interned, literals: &mut LiteralTable, shadowed: &BTreeSet<SmolStr>) -> String {
  replace_words(src, |w| if shadowed.contains(w) { None } else { consts.get(w, literals) })
}

/// Runs both inliners over the whole program.
pub fn inline_externals(env: &mut Env, funcs: &ExternalMap, consts: &ExternalMap) {
  let mut funcs = Interned::new(funcs);
  let mut consts = Interned::new(consts);
  let literals = &mut env.literals;
  for f in env.functions.iter_mut() {
    if !funcs.is_empty() {
      f.body = inline_calls(&f.body, &mut funcs, literals);
    }
    if !consts.is_empty() {
      f.body = inline_constants(&f.body, &mut consts, literals, &f.scoped_names());
    }
  }
  if !consts.is_empty() {
    let none = BTreeSet::new();
    for d in env.decls.iter_mut() {
      if let Some(init) = d.init.as_mut() {
        *init = inline_constants(init, &mut consts, literals, &none);
      }
    }
  }
  info!("inlined {} external functions and {} external constants", funcs.used(), consts.used());
}
