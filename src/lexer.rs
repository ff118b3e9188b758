//! Block splitter.
//!
//! A single pass over the source with an explicit stack of lexical
//! contexts. Comments are dropped, literals are moved into the
//! [`LiteralTable`], and the text of the globals block, each function block
//! and each native declaration is collected for the later stages.

use crate::algo::str::{is_word_byte, safe_ascii};
use crate::error::{CharSpan, MinifyErr, MinifyResult, Region};
use crate::literal::{LiteralTable};

use log::{trace};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LexCtx {
  Default,
  LineComment,
  BlockComment(usize),
  StringLit(usize),
  CharLit(usize),
  GlobalsBlock(usize),
  FunctionBlock(usize),
  NativeDecl,
}

#[derive(Clone, Default, Debug)]
pub struct Blocks {
  /// Declaration lines between `globals` and `endglobals`, keywords
  /// excluded. Several globals blocks are concatenated.
  pub globals: String,
  /// Function blocks from just after `function` up to `endfunction`.
  pub functions: Vec<String>,
  /// Native declarations including the `native` keyword, without the
  /// trailing newline.
  pub natives: Vec<String>,
  pub literals: LiteralTable,
}

pub struct Lexer<'a> {
  src:    &'a str,
  pos:    usize,
  stack:  Vec<LexCtx>,
  /// Text of the innermost enclosing block context.
  block:  String,
  lit:    String,
  out:    Blocks,
}

impl<'a> Lexer<'a> {
  pub fn new(src: &'a str) -> Lexer<'a> {
    Lexer{
      src,
      pos:    0,
      stack:  vec![LexCtx::Default],
      block:  String::new(),
      lit:    String::new(),
      out:    Blocks::default(),
    }
  }

  fn top(&self) -> LexCtx {
    *self.stack.last().unwrap_or(&LexCtx::Default)
  }

  fn rest(&self) -> &'a str {
    &self.src[self.pos .. ]
  }

  fn push(&mut self, ctx: LexCtx) {
    trace!("lexer: push {:?} at {}", ctx, self.pos);
    self.stack.push(ctx);
  }

  fn pop(&mut self) {
    let ctx = self.stack.pop();
    trace!("lexer: pop {:?} at {}", ctx, self.pos);
  }

  /// The closest block context below the top of the stack.
  fn in_block(&self) -> bool {
    self.stack.iter().any(|ctx| match ctx {
      LexCtx::GlobalsBlock(_) | LexCtx::FunctionBlock(_) | LexCtx::NativeDecl => true,
      _ => false
    })
  }

  pub fn run(mut self) -> MinifyResult<Blocks> {
    while self.pos < self.src.len() {
      match self.top() {
        LexCtx::LineComment => self.step_line_comment(),
        LexCtx::BlockComment(_) => self.step_block_comment(),
        LexCtx::StringLit(_) => self.step_literal('"'),
        LexCtx::CharLit(_) => self.step_literal('\''),
        ctx => self.step_code(ctx),
      }
    }
    self.finish()
  }

  fn step_line_comment(&mut self) {
    // NB: the newline itself belongs to the enclosing context.
    match self.rest().find('\n') {
      Some(off) => {
        self.pos += off;
        self.pop();
      }
      None => {
        self.pos = self.src.len();
      }
    }
  }

  fn step_block_comment(&mut self) {
    match self.rest().find("*/") {
      Some(off) => {
        self.pos += off + 2;
        self.pop();
        if self.in_block() {
          self.block.push(' ');
        }
      }
      None => {
        self.pos = self.src.len();
      }
    }
  }

  fn step_literal(&mut self, quote: char) {
    let mut chars = self.rest().chars();
    let c = match chars.next() {
      Some(c) => c,
      None => return
    };
    self.pos += c.len_utf8();
    self.lit.push(c);
    if c == '\\' {
      if let Some(d) = chars.next() {
        self.pos += d.len_utf8();
        self.lit.push(d);
      }
    } else if c == quote {
      self.pop();
      let lit = std::mem::replace(&mut self.lit, String::new());
      if self.in_block() {
        let ph = self.out.literals.intern(lit);
        self.block.push_str(&ph);
      }
    }
  }

  fn step_code(&mut self, ctx: LexCtx) {
    let rest = self.rest();
    if rest.starts_with("//") {
      self.pos += 2;
      self.push(LexCtx::LineComment);
      return;
    }
    if rest.starts_with("/*") {
      let start = self.pos;
      self.pos += 2;
      self.push(LexCtx::BlockComment(start));
      return;
    }
    let x = rest.as_bytes()[0];
    if x == b'"' || x == b'\'' {
      let start = self.pos;
      self.pos += 1;
      self.lit.clear();
      self.lit.push(x as char);
      self.push(if x == b'"' { LexCtx::StringLit(start) } else { LexCtx::CharLit(start) });
      return;
    }
    if is_word_byte(x) {
      let len = rest.bytes().take_while(|&b| is_word_byte(b)).count();
      let word = &rest[ .. len];
      let start = self.pos;
      self.pos += len;
      self.word(ctx, word, start);
      return;
    }
    if x == b'\n' && ctx == LexCtx::NativeDecl {
      self.pos += 1;
      self.end_native();
      return;
    }
    let c = match rest.chars().next() {
      Some(c) => c,
      None => return
    };
    self.pos += c.len_utf8();
    if ctx != LexCtx::Default {
      self.block.push(c);
    }
  }

  fn word(&mut self, ctx: LexCtx, word: &str, start: usize) {
    match (ctx, word) {
      (LexCtx::Default, "globals") => {
        self.block.clear();
        self.push(LexCtx::GlobalsBlock(start));
      }
      // The word `function` also appears inside bodies as a code reference.
      (LexCtx::Default, "function") => {
        self.block.clear();
        self.push(LexCtx::FunctionBlock(start));
      }
      (LexCtx::Default, "native") => {
        self.block.clear();
        self.block.push_str(word);
        self.push(LexCtx::NativeDecl);
      }
      (LexCtx::GlobalsBlock(_), "endglobals") => {
        let text = std::mem::replace(&mut self.block, String::new());
        trace!("lexer: globals block:\n{}", safe_ascii(text.as_bytes()));
        if !self.out.globals.is_empty() {
          self.out.globals.push('\n');
        }
        self.out.globals.push_str(&text);
        self.pop();
      }
      (LexCtx::FunctionBlock(_), "endfunction") => {
        let text = std::mem::replace(&mut self.block, String::new());
        trace!("lexer: function block:\n{}", safe_ascii(text.as_bytes()));
        self.out.functions.push(text);
        self.pop();
      }
      (LexCtx::Default, _) => {}
      _ => {
        self.block.push_str(word);
      }
    }
  }

  fn end_native(&mut self) {
    let text = std::mem::replace(&mut self.block, String::new());
    trace!("lexer: native: {}", safe_ascii(text.as_bytes()));
    self.out.natives.push(text.trim_end().to_string());
    self.pop();
  }

  fn finish(mut self) -> MinifyResult<Blocks> {
    let end = self.src.len();
    while let Some(ctx) = self.stack.pop() {
      let (region, start) = match ctx {
        LexCtx::Default | LexCtx::LineComment => continue,
        LexCtx::NativeDecl => {
          // A native on the last line needs no newline.
          self.stack.push(ctx);
          self.end_native();
          continue;
        }
        LexCtx::BlockComment(start) => (Region::BlockComment, start),
        LexCtx::StringLit(start) => (Region::String, start),
        LexCtx::CharLit(start) => (Region::Rawcode, start),
        LexCtx::GlobalsBlock(start) => (Region::Globals, start),
        LexCtx::FunctionBlock(start) => (Region::Function, start),
      };
      return Err(MinifyErr::Unterminated{region, span: CharSpan::new(start, end)});
    }
    Ok(self.out)
  }
}

pub fn split_blocks(src: &str) -> MinifyResult<Blocks> {
  Lexer::new(src).run()
}

#[cfg(test)]
mod tests {
  use super::*;

  const SRC: &str = "\
// header comment
globals
  constant integer A = 'hfoo' // trailing
  string s = \"// not a comment\"
endglobals

native Foo takes integer a returns nothing
/* top level
   block comment */
function main takes nothing returns nothing
  local code c = function Bar
  call BJDebugMsg(\"say \\\"hi\\\"\")
endfunction
";

  #[test]
  fn splits_blocks() {
    let blocks = split_blocks(SRC).unwrap();
    assert_eq!(blocks.natives, vec!["native Foo takes integer a returns nothing"]);
    assert_eq!(blocks.functions.len(), 1);
    assert!(blocks.functions[0].starts_with(" main takes nothing returns nothing"));
    assert!(blocks.functions[0].contains("function Bar"));
    assert!(blocks.globals.contains("constant integer A = \u{0}0\u{0}"));
    assert!(!blocks.globals.contains("trailing"));
    assert_eq!(blocks.literals.len(), 3);
  }

  #[test]
  fn literals_round_trip() {
    let blocks = split_blocks(SRC).unwrap();
    assert_eq!(blocks.literals.get(0), Some("'hfoo'"));
    assert_eq!(blocks.literals.get(1), Some("\"// not a comment\""));
    assert_eq!(blocks.literals.get(2), Some("\"say \\\"hi\\\"\""));
    let restored = blocks.literals.restore(&blocks.functions[0]);
    assert!(restored.contains("call BJDebugMsg(\"say \\\"hi\\\"\")"));
  }

  #[test]
  fn top_level_literals_are_dropped() {
    let blocks = split_blocks("type x extends handle \"stray\" 'abcd'\nfunction f takes nothing returns nothing\ncall S(\"kept\")\nendfunction").unwrap();
    assert_eq!(blocks.literals.len(), 1);
    assert_eq!(blocks.literals.get(0), Some("\"kept\""));
    assert!(blocks.functions[0].contains("call S(\u{0}0\u{0})"));
  }

  #[test]
  fn block_comment_separates_tokens() {
    let blocks = split_blocks("function f takes nothing returns nothing\nset a=b/**/c\nendfunction").unwrap();
    assert!(blocks.functions[0].contains("set a=b c"));
  }

  #[test]
  fn native_at_end_of_input() {
    let blocks = split_blocks("native Bar takes nothing returns integer").unwrap();
    assert_eq!(blocks.natives, vec!["native Bar takes nothing returns integer"]);
  }

  #[test]
  fn unterminated_regions_are_fatal() {
    match split_blocks("function f takes nothing returns nothing\ncall X(\"abc)\nendfunction") {
      Err(MinifyErr::Unterminated{region: Region::String, ..}) => {}
      r => panic!("unexpected: {:?}", r.map(|b| b.functions))
    }
    match split_blocks("globals\ninteger a\n") {
      Err(MinifyErr::Unterminated{region: Region::Globals, span}) => {
        assert_eq!(span.start, 0);
      }
      r => panic!("unexpected: {:?}", r.map(|b| b.globals))
    }
    match split_blocks("/* open") {
      Err(MinifyErr::Unterminated{region: Region::BlockComment, ..}) => {}
      r => panic!("unexpected: {:?}", r.map(|b| b.globals))
    }
  }

  #[test]
  fn words_inside_identifiers_are_not_keywords() {
    let blocks = split_blocks("function f takes nothing returns nothing\nset myglobals=1\nset endfunctionx=2\nendfunction").unwrap();
    assert_eq!(blocks.functions.len(), 1);
    assert!(blocks.functions[0].contains("endfunctionx"));
  }
}
