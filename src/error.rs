use crate::algo::*;

use miette::{Diagnostic};
use thiserror::{Error};

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::io;
use std::path::{PathBuf};

/// Byte offsets into the input text.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CharSpan {
  pub start: u32,
  pub end: u32,
}

impl Debug for CharSpan {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    write!(f, "CharSpan({}:{})", self.start, self.end)
  }
}

impl Display for CharSpan {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    write!(f, "{}..{}", self.start, self.end)
  }
}

impl CharSpan {
  pub fn new(start: usize, end: usize) -> CharSpan {
    CharSpan{start: start as u32, end: end as u32}
  }
}

/// Lexical regions that must be closed before end of input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Region {
  String,
  Rawcode,
  BlockComment,
  Globals,
  Function,
}

impl Display for Region {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    f.write_str(match self {
      Region::String => "string literal",
      Region::Rawcode => "rawcode literal",
      Region::BlockComment => "block comment",
      Region::Globals => "globals block",
      Region::Function => "function block",
    })
  }
}

#[derive(Error, Diagnostic, Debug)]
pub enum MinifyErr {
  #[error("unterminated {region} starting at byte {}", span.start)]
  #[diagnostic(code(jass_min::unterminated), help("the input must be valid JASS source"))]
  Unterminated {
    region: Region,
    span: CharSpan,
  },
  #[error("malformed function header: `{0}`")]
  #[diagnostic(code(jass_min::bad_function), help("expected `function NAME takes PARAMS returns TYPE`"))]
  BadFunction(SmolStr),
  #[error("malformed global declaration: `{0}`")]
  #[diagnostic(code(jass_min::bad_global), help("expected `[constant] TYPE [array] NAME [= VALUE]` with a known type"))]
  BadGlobal(SmolStr),
  #[error("could not access {}", path.display())]
  #[diagnostic(code(jass_min::io))]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

pub type MinifyResult<T> = Result<T, MinifyErr>;
