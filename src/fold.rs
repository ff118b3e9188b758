//! Constant folding.
//!
//! Integer, real and boolean constants whose initializer is a literal
//! expression are evaluated, substituted everywhere they are named, and
//! dropped. Anything else is left alone.

use crate::algo::*;
use crate::algo::str::{is_word_byte, replace_words};
use crate::env::{Env};
use crate::literal::{LiteralTable, PLACEHOLDER, placeholder_id, rawcode_to_int};

use log::{debug, info};

use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
  Int(i32),
  Real(f32),
  Bool(bool),
}

#[derive(Clone, PartialEq, Debug)]
pub enum EvalErr {
  Token(String),
  NotConstant(SmolStr),
  Literal,
  Type,
  DivZero,
  Overflow,
  Trailing,
}

#[derive(Clone, PartialEq, Debug)]
enum Tok {
  Int(i32),
  Real(f32),
  Bool(bool),
  Op(&'static str),
  Not,
  And,
  Or,
  LParen,
  RParen,
}

const OPS: &[&str] = &["==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/"];

fn parse_int(digits: &str, radix: u32) -> Result<i32, EvalErr> {
  let n = i64::from_str_radix(&digits[ .. digits.len().min(12)], radix)
    .map_err(|_| EvalErr::Token(digits.to_string()))?;
  // Literals up to 2^32 are accepted and wrap, like the engine does for hex.
  if digits.len() > 12 || n > u32::MAX as i64 {
    return Err(EvalErr::Overflow);
  }
  Ok(n as u32 as i32)
}

fn scan<F: Fn(u8) -> bool>(bytes: &[u8], from: usize, pred: F) -> usize {
  let mut end = from;
  while end < bytes.len() && pred(bytes[end]) {
    end += 1;
  }
  end
}

fn tokenize(src: &str, literals: &LiteralTable) -> Result<Vec<Tok>, EvalErr> {
  let bytes = src.as_bytes();
  let mut toks = Vec::new();
  let mut idx = 0;
  'outer: while idx < bytes.len() {
    let x = bytes[idx];
    let next = bytes.get(idx + 1).copied().unwrap_or(b' ');
    if x == PLACEHOLDER {
      let end = scan(bytes, idx + 1, |b| b != PLACEHOLDER) + 1;
      let ph = src.get(idx .. end).ok_or(EvalErr::Literal)?;
      let lit = placeholder_id(ph).and_then(|id| literals.get(id)).ok_or(EvalErr::Literal)?;
      let n = rawcode_to_int(lit).ok_or(EvalErr::Literal)?;
      toks.push(Tok::Int(n as u32 as i32));
      idx = end;
    } else if x.is_ascii_whitespace() {
      idx += 1;
    } else if x == b'$' || (x == b'0' && (next == b'x' || next == b'X')) {
      let start = if x == b'$' { idx + 1 } else { idx + 2 };
      let end = scan(bytes, start, |b| b.is_ascii_hexdigit());
      toks.push(Tok::Int(parse_int(&src[start .. end], 16)?));
      idx = end;
    } else if x.is_ascii_digit() || (x == b'.' && next.is_ascii_digit()) {
      let int_end = scan(bytes, idx, |b| b.is_ascii_digit());
      if bytes.get(int_end) == Some(&b'.') {
        let end = scan(bytes, int_end + 1, |b| b.is_ascii_digit());
        toks.push(Tok::Real(real(&src[idx .. int_end], &src[int_end + 1 .. end])?));
        idx = end;
      } else {
        let word = &src[idx .. int_end];
        let radix = if word.len() > 1 && word.starts_with('0') { 8 } else { 10 };
        toks.push(Tok::Int(parse_int(word, radix)?));
        idx = int_end;
      }
    } else if x.is_ascii_alphabetic() || x == b'_' {
      let end = scan(bytes, idx, is_word_byte);
      toks.push(match &src[idx .. end] {
        "true" => Tok::Bool(true),
        "false" => Tok::Bool(false),
        "not" => Tok::Not,
        "and" => Tok::And,
        "or" => Tok::Or,
        w => return Err(EvalErr::NotConstant(w.into()))
      });
      idx = end;
    } else if x == b'(' {
      toks.push(Tok::LParen);
      idx += 1;
    } else if x == b')' {
      toks.push(Tok::RParen);
      idx += 1;
    } else {
      for &op in OPS.iter() {
        if src[idx .. ].starts_with(op) {
          toks.push(Tok::Op(op));
          idx += op.len();
          continue 'outer;
        }
      }
      let rest: String = src[idx .. ].chars().take(1).collect();
      return Err(EvalErr::Token(rest));
    }
  }
  Ok(toks)
}

fn real(int: &str, frac: &str) -> Result<f32, EvalErr> {
  let int = if int.is_empty() { "0" } else { int };
  format!("{}.{}0", int, frac).parse::<f32>().map_err(|_| EvalErr::Token(format!("{}.{}", int, frac)))
}

struct Eval {
  toks: Vec<Tok>,
  pos: usize,
}

impl Eval {
  fn peek(&self) -> Option<&Tok> {
    self.toks.get(self.pos)
  }

  fn bump(&mut self) -> Option<Tok> {
    let t = self.toks.get(self.pos).cloned();
    self.pos += 1;
    t
  }

  fn or_expr(&mut self) -> Result<Value, EvalErr> {
    let mut lhs = self.and_expr()?;
    while self.peek() == Some(&Tok::Or) {
      self.bump();
      let rhs = self.and_expr()?;
      lhs = Value::Bool(lhs.as_bool()? || rhs.as_bool()?);
    }
    Ok(lhs)
  }

  fn and_expr(&mut self) -> Result<Value, EvalErr> {
    let mut lhs = self.not_expr()?;
    while self.peek() == Some(&Tok::And) {
      self.bump();
      let rhs = self.not_expr()?;
      lhs = Value::Bool(lhs.as_bool()? && rhs.as_bool()?);
    }
    Ok(lhs)
  }

  fn not_expr(&mut self) -> Result<Value, EvalErr> {
    if self.peek() == Some(&Tok::Not) {
      self.bump();
      let v = self.not_expr()?;
      return Ok(Value::Bool(!v.as_bool()?));
    }
    self.cmp_expr()
  }

  fn cmp_expr(&mut self) -> Result<Value, EvalErr> {
    let lhs = self.add_expr()?;
    let op = match self.peek() {
      Some(&Tok::Op(op)) if ["==", "!=", "<=", ">=", "<", ">"].contains(&op) => op,
      _ => return Ok(lhs)
    };
    self.bump();
    let rhs = self.add_expr()?;
    compare(op, lhs, rhs)
  }

  fn add_expr(&mut self) -> Result<Value, EvalErr> {
    let mut lhs = self.mul_expr()?;
    loop {
      let op = match self.peek() {
        Some(&Tok::Op(op)) if op == "+" || op == "-" => op,
        _ => return Ok(lhs)
      };
      self.bump();
      let rhs = self.mul_expr()?;
      lhs = arith(op, lhs, rhs)?;
    }
  }

  fn mul_expr(&mut self) -> Result<Value, EvalErr> {
    let mut lhs = self.unary()?;
    loop {
      let op = match self.peek() {
        Some(&Tok::Op(op)) if op == "*" || op == "/" => op,
        _ => return Ok(lhs)
      };
      self.bump();
      let rhs = self.unary()?;
      lhs = arith(op, lhs, rhs)?;
    }
  }

  fn unary(&mut self) -> Result<Value, EvalErr> {
    match self.peek() {
      Some(&Tok::Op("-")) => {
        self.bump();
        match self.unary()? {
          Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(EvalErr::Overflow),
          Value::Real(x) => Ok(Value::Real(-x)),
          Value::Bool(_) => Err(EvalErr::Type),
        }
      }
      Some(&Tok::Op("+")) => {
        self.bump();
        self.unary()
      }
      _ => self.primary()
    }
  }

  fn primary(&mut self) -> Result<Value, EvalErr> {
    match self.bump() {
      Some(Tok::Int(n)) => Ok(Value::Int(n)),
      Some(Tok::Real(x)) => Ok(Value::Real(x)),
      Some(Tok::Bool(b)) => Ok(Value::Bool(b)),
      Some(Tok::LParen) => {
        let v = self.or_expr()?;
        match self.bump() {
          Some(Tok::RParen) => Ok(v),
          t => Err(EvalErr::Token(format!("{:?}", t)))
        }
      }
      t => Err(EvalErr::Token(format!("{:?}", t)))
    }
  }
}

impl Value {
  fn as_bool(self) -> Result<bool, EvalErr> {
    match self {
      Value::Bool(b) => Ok(b),
      _ => Err(EvalErr::Type)
    }
  }

  fn as_real(self) -> Result<f32, EvalErr> {
    match self {
      Value::Int(n) => Ok(n as f32),
      Value::Real(x) => Ok(x),
      Value::Bool(_) => Err(EvalErr::Type)
    }
  }

  /// Coerces to the declared type of a constant.
  pub fn coerce(self, ty: &str) -> Result<Value, EvalErr> {
    match (ty, self) {
      ("integer", Value::Int(_)) |
      ("boolean", Value::Bool(_)) |
      ("real", Value::Real(_)) => Ok(self),
      ("real", Value::Int(n)) => Ok(Value::Real(n as f32)),
      _ => Err(EvalErr::Type)
    }
  }
}

impl Display for Value {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    match *self {
      Value::Int(n) => write!(f, "{}", n),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Real(x) => {
        let mut s = format!("{}", x);
        if !s.contains('.') {
          s.push('.');
        }
        if let Some(rest) = s.strip_prefix("0.") {
          s = format!(".{}", rest);
        } else if let Some(rest) = s.strip_prefix("-0.") {
          s = format!("-.{}", rest);
        }
        if s == "." || s == "-." {
          s = "0.".to_string();
        }
        f.write_str(&s)
      }
    }
  }
}

fn arith(op: &str, lhs: Value, rhs: Value) -> Result<Value, EvalErr> {
  match (lhs, rhs) {
    (Value::Int(a), Value::Int(b)) => {
      let r = match op {
        "+" => a.checked_add(b),
        "-" => a.checked_sub(b),
        "*" => a.checked_mul(b),
        "/" => {
          if b == 0 {
            return Err(EvalErr::DivZero);
          }
          a.checked_div(b)
        }
        _ => None
      };
      r.map(Value::Int).ok_or(EvalErr::Overflow)
    }
    (Value::Bool(_), _) | (_, Value::Bool(_)) => Err(EvalErr::Type),
    _ => {
      let (a, b) = (lhs.as_real()?, rhs.as_real()?);
      let r = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => {
          if b == 0.0 {
            return Err(EvalErr::DivZero);
          }
          a / b
        }
        _ => return Err(EvalErr::Type)
      };
      if r.is_finite() { Ok(Value::Real(r)) } else { Err(EvalErr::Overflow) }
    }
  }
}

fn compare(op: &str, lhs: Value, rhs: Value) -> Result<Value, EvalErr> {
  let r = match (lhs, rhs) {
    (Value::Bool(a), Value::Bool(b)) => match op {
      "==" => a == b,
      "!=" => a != b,
      _ => return Err(EvalErr::Type)
    },
    (Value::Int(a), Value::Int(b)) => match op {
      "==" => a == b,
      "!=" => a != b,
      "<" => a < b,
      "<=" => a <= b,
      ">" => a > b,
      _ => a >= b,
    },
    _ => {
      let (a, b) = (lhs.as_real()?, rhs.as_real()?);
      match op {
        "==" => a == b,
        "!=" => a != b,
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        _ => a >= b,
      }
    }
  };
  Ok(Value::Bool(r))
}

/// Evaluates a literal expression; rawcode placeholders count as integers.
pub fn eval(src: &str, literals: &LiteralTable) -> Result<Value, EvalErr> {
  let toks = tokenize(src, literals)?;
  let mut e = Eval{toks, pos: 0};
  let v = e.or_expr()?;
  if e.pos < e.toks.len() {
    return Err(EvalErr::Trailing);
  }
  Ok(v)
}

pub fn is_foldable_type(ty: &str) -> bool {
  ty == "integer" || ty == "real" || ty == "boolean"
}

/// Folds what it can and returns how many constants were folded.
pub fn fold_constants(env: &mut Env) -> usize {
  let mut folded: BTreeMap<SmolStr, String> = BTreeMap::new();
  for k in 0 .. env.decls.len() {
    let d = &env.decls[k];
    if !d.is_constant || d.is_array || !is_foldable_type(&d.ty) {
      continue;
    }
    let init = match d.init.as_ref() {
      Some(init) => init,
      None => continue
    };
    let value = match eval(init, &env.literals).and_then(|v| v.coerce(&d.ty)) {
      Ok(v) => v.to_string(),
      Err(e) => {
        debug!("fold: keep {} ({:?})", d.name, e);
        continue;
      }
    };
    debug!("fold: {} = {}", d.name, value);
    let name = d.name.clone();
    for (j, other) in env.decls.iter_mut().enumerate() {
      if j == k {
        other.init = Some(value.clone());
        other.folded = true;
      } else if let Some(init) = other.init.as_mut() {
        *init = replace_words(init, |w| if w == name { Some(value.clone()) } else { None });
      }
    }
    folded.insert(name, value);
  }
  if !folded.is_empty() {
    for f in env.functions.iter_mut() {
      let shadowed = f.scoped_names();
      f.body = replace_words(&f.body, |w| match folded.get(w) {
        Some(v) if !shadowed.contains(w) => Some(v.clone()),
        _ => None
      });
    }
  }
  env.decls.retain(|d| !d.folded);
  info!("fold: folded {} constants", folded.len());
  folded.len()
}
