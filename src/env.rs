//! The pipeline context.
//!
//! [`Env`] owns everything one minification run works on: the literal
//! table, the declarations of the globals block, the natives and the
//! functions. Each stage takes `&mut Env` and leaves it ready for the next.

use crate::algo::*;
use crate::algo::str::{safe_ascii};
use crate::lexer::{Blocks};
use crate::literal::{LiteralTable};
use crate::normalize::{squeeze_block, squeeze_native};
use crate::parsing::{parse_function, parse_globals, parse_local, parse_native, parse_params, render_params};
use crate::error::{MinifyResult};

use log::{debug, trace};

use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Function names the host runtime calls directly.
pub const ENTRY_POINTS: &[&str] = &["main", "config"];

#[derive(Clone, PartialEq, Debug)]
pub struct Decl {
  pub is_constant: bool,
  pub is_array: bool,
  pub ty: SmolStr,
  pub name: SmolStr,
  pub init: Option<String>,
  pub uses: u32,
  pub folded: bool,
}

impl Decl {
  pub fn render(&self) -> String {
    let mut dst = String::new();
    if self.is_constant {
      dst.push_str("constant ");
    }
    dst.push_str(&self.ty);
    dst.push(' ');
    if self.is_array {
      dst.push_str("array ");
    }
    dst.push_str(&self.name);
    match &self.init {
      Some(init) if !init.is_empty() => {
        dst.push('=');
        dst.push_str(init);
      }
      _ => {}
    }
    dst
  }
}

#[derive(Clone)]
pub struct Function {
  pub name: SmolStr,
  pub params: String,
  pub ret: SmolStr,
  pub body: String,
  pub uses: u32,
  pub entry: bool,
}

impl Debug for Function {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    write!(f, "Function({} uses={} entry={})", self.name, self.uses, self.entry)
  }
}

impl Function {
  pub fn new(name: SmolStr, params: String, ret: SmolStr, body: String) -> Function {
    let entry = ENTRY_POINTS.contains(&name.as_str());
    Function{name, params, ret, body, uses: 0, entry}
  }

  pub fn param_names(&self) -> Vec<SmolStr> {
    parse_params(&self.params)
      .map(|ps| ps.into_iter().map(|(_, name)| name).collect())
      .unwrap_or_default()
  }

  /// Parameters and locals, which hide globals of the same name inside
  /// this function.
  pub fn scoped_names(&self) -> BTreeSet<SmolStr> {
    let mut set: BTreeSet<SmolStr> = self.param_names().into_iter().collect();
    set.extend(self.body.lines().filter_map(parse_local));
    set
  }

  pub fn render(&self) -> String {
    format!("function {} takes {} returns {}\n{}\nendfunction", self.name, self.params, self.ret, self.body)
  }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Native {
  pub name: SmolStr,
  pub params: Vec<(SmolStr, SmolStr)>,
  pub ret: SmolStr,
}

impl Native {
  pub fn render(&self) -> String {
    format!("native {} takes {} returns {}", self.name, render_params(&self.params), self.ret)
  }
}

#[derive(Clone, Default)]
pub struct Env {
  pub literals: LiteralTable,
  pub decls: Vec<Decl>,
  pub natives: Vec<Native>,
  pub functions: Vec<Function>,
}

impl Debug for Env {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    write!(f, "Env(decls={} natives={} functions={} literals={})",
        self.decls.len(), self.natives.len(), self.functions.len(), self.literals.len())
  }
}

impl Env {
  /// Normalizes and parses the split blocks.
  pub fn from_blocks(blocks: Blocks) -> MinifyResult<Env> {
    let Blocks{globals, functions, natives, literals} = blocks;
    let decls = parse_globals(&squeeze_block(&globals))?;
    let mut env = Env{literals, decls, natives: Vec::new(), functions: Vec::new()};
    for text in natives.iter() {
      env.natives.push(parse_native(&squeeze_native(text))?);
    }
    for block in functions.iter() {
      let f = parse_function(&squeeze_block(block))?;
      trace!("env: parsed {:?}:\n{}", f, safe_ascii(f.body.as_bytes()));
      env.functions.push(f);
    }
    debug!("env: parsed {:?}", env);
    Ok(env)
  }

  pub fn mark_entries<S: AsRef<str>>(&mut self, names: &[S]) {
    for f in self.functions.iter_mut() {
      if names.iter().any(|n| n.as_ref() == f.name.as_str()) {
        f.entry = true;
      }
    }
  }

  pub fn function(&self, name: &str) -> Option<&Function> {
    self.functions.iter().find(|f| f.name == name)
  }

  pub fn decl(&self, name: &str) -> Option<&Decl> {
    self.decls.iter().find(|d| d.name == name)
  }

  pub fn constants(&self) -> impl Iterator<Item=&Decl> {
    self.decls.iter().filter(|d| d.is_constant)
  }

  pub fn globals(&self) -> impl Iterator<Item=&Decl> {
    self.decls.iter().filter(|d| !d.is_constant)
  }

  pub fn function_names(&self) -> BTreeSet<SmolStr> {
    self.functions.iter().map(|f| f.name.clone()).collect()
  }

  pub fn decl_names(&self) -> BTreeSet<SmolStr> {
    self.decls.iter().map(|d| d.name.clone()).collect()
  }
}
