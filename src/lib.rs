#![forbid(unsafe_code)]

extern crate log;
extern crate miette;
extern crate smol_str;
extern crate thiserror;

use crate::dce::{DceReport};
use crate::env::{Env};
use crate::error::{MinifyResult};
use crate::external::{ExternalMap, inline_externals};
use crate::lexer::{split_blocks};
use crate::names::{NamePool};
use crate::usage::{count_calls, count_decl_uses};

use log::{info};

pub mod algo;
pub mod dce;
pub mod emit;
pub mod env;
pub mod error;
pub mod external;
pub mod fold;
pub mod lexer;
pub mod literal;
pub mod names;
pub mod normalize;
pub mod parsing;
pub mod rename;
pub mod rewrite;
pub mod usage;

#[derive(Clone, Default, Debug)]
pub struct MinifyOpts {
  /// Functions kept and left unrenamed besides `main` and `config`.
  pub entries: Vec<String>,
  pub functions: ExternalMap,
  pub constants: ExternalMap,
}

#[derive(Clone, Debug)]
pub struct Minified {
  pub text: String,
  pub report: DceReport,
}

pub fn minify_jass(src: &str, opts: &MinifyOpts) -> MinifyResult<Minified> {
  let mut env = Env::from_blocks(split_blocks(src)?)?;
  env.mark_entries(&opts.entries);
  inline_externals(&mut env, &opts.functions, &opts.constants);
  let report = dce::eliminate(&mut env);
  fold::fold_constants(&mut env);
  count_calls(&mut env);
  count_decl_uses(&mut env);
  let mut pool = NamePool::global();
  rename::rename_globals(&mut env, &mut pool);
  rename::rename_all_locals(&mut env);
  rewrite::extract_booleans(&mut env, &mut pool);
  let text = emit::emit(&env);
  info!("minified {} bytes to {} bytes", src.len(), text.len());
  Ok(Minified{text, report})
}
