//! Structural parsing of normalized blocks into declarations, functions and
//! natives.

use crate::algo::*;
use crate::algo::str::{is_ident};
use crate::env::{Decl, Function, Native};
use crate::error::{MinifyErr, MinifyResult};

/// Built-in handle and primitive type names.
pub const DATATYPES: &[&str] = &[
  "integer", "real", "string", "code", "boolean", "nothing", "handle", "agent",
  "event", "eventid",
  "player", "playerstate", "playerscore", "playergameresult", "playerevent",
  "playerunitevent", "playerslotstate", "playercolor",
  "widget", "widgetevent",
  "unit", "unitpool", "unitstate", "unitevent", "unittype",
  "destructable", "item", "itempool", "itemtype", "ability", "buff", "force",
  "group", "trigger", "triggercondition", "triggeraction", "timer",
  "timerdialog", "location", "region", "rect", "boolexpr", "sound",
  "conditionfunc", "filterfunc", "race", "racepreference",
  "gamestate", "igamestate", "fgamestate", "gameevent", "gamespeed",
  "gamedifficulty", "gametype", "gamecache", "aidifficulty", "limitop",
  "dialog", "dialogevent",
  "mapflag", "mapvisibility", "mapsetting", "mapdensity", "mapcontrol",
  "volumegroup", "camerafield", "camerasetup", "placement", "startlocprio",
  "raritycontrol", "blendmode", "texmapflags", "effect", "effecttype",
  "weathereffect", "terraindeformation", "fogstate", "fogmodifier", "button",
  "quest", "questitem", "defeatcondition", "leaderboard", "multiboard",
  "multiboarditem", "trackable", "version", "texttag", "attacktype",
  "damagetype", "weapontype", "soundtype", "pathingtype", "alliancetype",
  "lightning", "image", "ubersplat", "hashtable",
  "framehandle", "originframetype", "framepointtype", "textaligntype",
  "frameeventtype", "oskeytype", "minimapicon", "commandbuttoneffect",
  "mousebuttontype", "animtype", "subanimtype",
];

pub fn is_datatype(s: &str) -> bool {
  DATATYPES.contains(&s)
}

/// Parses one declaration line of the form
/// `[constant] TYPE [array] NAME [= INIT]`.
pub fn parse_decl(line: &str) -> Option<Decl> {
  let (lhs, init) = match line.find('=') {
    Some(off) => (&line[ .. off], Some(line[off + 1 .. ].to_string())),
    None => (line, None)
  };
  let mut words: Vec<&str> = lhs.split_whitespace().collect();
  let is_constant = words.first() == Some(&"constant");
  if is_constant {
    words.remove(0);
  }
  let (ty, is_array, name) = match words.as_slice() {
    &[ty, name] => (ty, false, name),
    &[ty, "array", name] => (ty, true, name),
    _ => return None
  };
  if !is_datatype(ty) || !is_ident(name) {
    return None;
  }
  Some(Decl{
    is_constant,
    is_array,
    ty:     ty.into(),
    name:   name.into(),
    init,
    uses:   0,
    folded: false,
  })
}

pub fn parse_globals(block: &str) -> MinifyResult<Vec<Decl>> {
  let mut decls = Vec::new();
  for line in block.lines() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    match parse_decl(line) {
      Some(decl) => decls.push(decl),
      None => return Err(MinifyErr::BadGlobal(line.into()))
    }
  }
  Ok(decls)
}

/// Parses a `TYPE NAME,TYPE NAME` list; `nothing` is the empty list.
pub fn parse_params(src: &str) -> Option<Vec<(SmolStr, SmolStr)>> {
  let src = src.trim();
  let mut params = Vec::new();
  if src == "nothing" {
    return Some(params);
  }
  for param in src.split(',') {
    let mut it = param.split_whitespace();
    let (ty, name) = match (it.next(), it.next(), it.next()) {
      (Some(ty), Some(name), None) => (ty, name),
      _ => return None
    };
    if !is_ident(ty) || !is_ident(name) {
      return None;
    }
    params.push((ty.into(), name.into()));
  }
  Some(params)
}

pub fn render_params(params: &[(SmolStr, SmolStr)]) -> String {
  if params.is_empty() {
    return "nothing".to_string();
  }
  let mut dst = String::new();
  for (k, (ty, name)) in params.iter().enumerate() {
    if k > 0 {
      dst.push(',');
    }
    dst.push_str(ty);
    dst.push(' ');
    dst.push_str(name);
  }
  dst
}

/// Splits `NAME takes PARAMS returns TYPE` into its three fields.
fn parse_signature(header: &str) -> Option<(SmolStr, String, SmolStr)> {
  let (name, rest) = header.trim().split_once(" takes ")?;
  let (params, ret) = rest.rsplit_once(" returns ")?;
  let (name, ret) = (name.trim(), ret.trim());
  if !is_ident(name) || !is_ident(ret) {
    return None;
  }
  Some((name.into(), params.trim().to_string(), ret.into()))
}

/// Parses a normalized function block (the text between `function` and
/// `endfunction`).
pub fn parse_function(block: &str) -> MinifyResult<Function> {
  let block = block.trim();
  let (header, body) = match block.find('\n') {
    Some(off) => (&block[ .. off], &block[off + 1 .. ]),
    None => (block, "")
  };
  let (name, params, ret) = match parse_signature(header) {
    Some(sig) => sig,
    None => return Err(MinifyErr::BadFunction(header.into()))
  };
  Ok(Function::new(name, params, ret, body.to_string()))
}

pub fn parse_native(text: &str) -> MinifyResult<Native> {
  let sig = text.trim().strip_prefix("native").map(|s| s.trim_start());
  let (name, params, ret) = match sig.and_then(parse_signature) {
    Some(sig) => sig,
    None => return Err(MinifyErr::BadFunction(text.into()))
  };
  let params = match parse_params(&params) {
    Some(params) => params,
    None => return Err(MinifyErr::BadFunction(text.into()))
  };
  Ok(Native{name, params, ret})
}

/// A `local TYPE [array] NAME[=INIT]` line, returning the local's name.
pub fn parse_local(line: &str) -> Option<SmolStr> {
  let rest = line.trim().strip_prefix("local ")?;
  let lhs = match rest.find('=') {
    Some(off) => &rest[ .. off],
    None => rest
  };
  let words: Vec<&str> = lhs.split_whitespace().collect();
  let name = match words.as_slice() {
    &[ty, name] if is_datatype(ty) => name,
    &[ty, "array", name] if is_datatype(ty) => name,
    _ => return None
  };
  if is_ident(name) { Some(name.into()) } else { None }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decl_forms() {
    let d = parse_decl("constant integer MAX=\u{0}0\u{0}*2").unwrap();
    assert!(d.is_constant && !d.is_array);
    assert_eq!((d.ty.as_str(), d.name.as_str()), ("integer", "MAX"));
    assert_eq!(d.init.as_deref(), Some("\u{0}0\u{0}*2"));
    let d = parse_decl("unit array units").unwrap();
    assert!(d.is_array && !d.is_constant);
    assert_eq!(d.init, None);
    let d = parse_decl("boolean b=x==y").unwrap();
    assert_eq!(d.init.as_deref(), Some("x==y"));
    assert!(parse_decl("widgetz w").is_none());
  }

  #[test]
  fn bad_global_is_reported() {
    match parse_globals("integer a\nfoo bar baz") {
      Err(MinifyErr::BadGlobal(line)) => assert_eq!(line, "foo bar baz"),
      r => panic!("unexpected: {:?}", r.map(|d| d.len()))
    }
  }

  #[test]
  fn function_fields() {
    let f = parse_function("Helper takes integer a,real b returns real\nreturn a*b").unwrap();
    assert_eq!(f.name, "Helper");
    assert_eq!(f.params, "integer a,real b");
    assert_eq!(f.ret, "real");
    assert_eq!(f.body, "return a*b");
    let f = parse_function("main takes nothing returns nothing").unwrap();
    assert!(f.entry);
    assert_eq!(f.body, "");
  }

  #[test]
  fn native_fields() {
    let n = parse_native("native SetFoo takes integer whichFoo , real value returns nothing").unwrap();
    assert_eq!(n.name, "SetFoo");
    assert_eq!(n.params, vec![("integer".into(), "whichFoo".into()), ("real".into(), "value".into())]);
    assert_eq!(n.render(), "native SetFoo takes integer whichFoo,real value returns nothing");
    let n = parse_native("native GetFoo takes nothing returns integer").unwrap();
    assert!(n.params.is_empty());
  }

  #[test]
  fn locals() {
    assert_eq!(parse_local("local integer i=0").as_deref(), Some("i"));
    assert_eq!(parse_local("local unit array us").as_deref(), Some("us"));
    assert_eq!(parse_local("set i=0"), None);
  }
}
