extern crate jass_min;

use jass_min::{MinifyOpts, minify_jass};
use jass_min::algo::*;
use jass_min::dce::{DceReport};
use jass_min::env::{Env};
use jass_min::external::{ExternalMap};
use jass_min::lexer::{split_blocks};
use jass_min::names::{NamePool};
use jass_min::rename::{rename_globals};
use jass_min::usage::{count_decl_uses};

const SCENARIO: &str = "\
globals
    constant integer UNUSED = 3
    integer counter = 0
endglobals

function Helper takes integer n returns integer
    return n * 2
endfunction

function Dead takes nothing returns nothing
    call Helper(1)
endfunction

function main takes nothing returns nothing
    set counter = Helper(1) + Helper(2)
endfunction

function config takes nothing returns nothing
endfunction
";

const SCENARIO_MIN: &str = "\
globals
integer B=0
endglobals
function A takes integer a returns integer
return a*2
endfunction
function main takes nothing returns nothing
set B=A(1)+A(2)
endfunction
function config takes nothing returns nothing
endfunction
";

#[test]
fn end_to_end() {
  let out = minify_jass(SCENARIO, &MinifyOpts::default()).unwrap();
  assert_eq!(out.report, DceReport{functions: 1, constants: 1, globals: 0});
  assert_eq!(out.text, SCENARIO_MIN);
  assert!(!out.text.contains("Dead"));
  assert!(!out.text.contains("UNUSED"));
}

#[test]
fn second_run_is_a_fixed_point() {
  let first = minify_jass(SCENARIO, &MinifyOpts::default()).unwrap();
  let second = minify_jass(&first.text, &MinifyOpts::default()).unwrap();
  assert_eq!(second.report, DceReport::default());
  assert_eq!(second.text, first.text);
}

#[test]
fn literals_survive_byte_for_byte() {
  let src = "\
function main takes nothing returns nothing
    // call BJDebugMsg(\"gone\")
    call BJDebugMsg(\"a // b /* c */ \\\"d\\\"\")
    call UnitAddAbility(u, 'A000')
endfunction
";
  let out = minify_jass(src, &MinifyOpts::default()).unwrap();
  assert!(out.text.contains("call BJDebugMsg(\"a // b /* c */ \\\"d\\\"\")"));
  assert!(out.text.contains("call UnitAddAbility(u,'A000')"));
  assert!(!out.text.contains("gone"));
}

#[test]
fn externals_are_inlined() {
  let src = "\
function main takes nothing returns nothing
    call SetLife(u, UNIT_LIFE)
    call SetValue(u, 4)
endfunction
";
  let mut opts = MinifyOpts::default();
  opts.functions.insert("SetLife", "SetWidgetLife(\\0,\\1)".to_string());
  opts.functions.insert("SetValue", "set \\0=\\1".to_string());
  opts.constants = ExternalMap::parse("UNIT_LIFE 'hfoo'\n");
  let out = minify_jass(src, &opts).unwrap();
  assert!(out.text.contains("call SetWidgetLife(u,'hfoo')\nset u=4\n"));
}

#[test]
fn extra_entry_points_are_kept() {
  let src = "\
function InitTrig takes nothing returns nothing
endfunction
function main takes nothing returns nothing
endfunction
";
  let mut opts = MinifyOpts::default();
  let out = minify_jass(src, &opts).unwrap();
  assert_eq!(out.report.functions, 1);
  opts.entries.push("InitTrig".to_string());
  let out = minify_jass(src, &opts).unwrap();
  assert_eq!(out.report.functions, 0);
  assert!(out.text.starts_with("function InitTrig takes nothing returns nothing\n"));
}

#[test]
fn constants_fold_into_bodies() {
  let src = "\
globals
    constant integer BASE = 'A000'
    constant real HALF = 1 / 2.0
    constant integer LIMIT = 0x10 * 2
    integer g = LIMIT
endglobals
function main takes nothing returns nothing
    set g = BASE + LIMIT
    call F(HALF)
endfunction
";
  let out = minify_jass(src, &MinifyOpts::default()).unwrap();
  assert_eq!(out.text, "\
globals
integer A=32
endglobals
function main takes nothing returns nothing
set A='A000'+32
call F(.5)
endfunction
");
}

#[test]
fn parameters_hide_constants() {
  let src = "\
globals
    constant integer C = 6
endglobals
function Helper takes integer C returns integer
    return C * 2
endfunction
function main takes nothing returns nothing
    call Helper(C)
endfunction
";
  let out = minify_jass(src, &MinifyOpts::default()).unwrap();
  assert_eq!(out.text, "\
function A takes integer a returns integer
return a*2
endfunction
function main takes nothing returns nothing
call A(6)
endfunction
");
}

#[test]
fn frequent_booleans_become_a_constant() {
  let mut src = String::from("globals\n    boolean flag\nendglobals\nfunction main takes nothing returns nothing\n");
  for _ in 0 .. 8 {
    src.push_str("    set flag = true\n");
  }
  src.push_str("endfunction\n");
  let out = minify_jass(&src, &MinifyOpts::default()).unwrap();
  assert!(out.text.starts_with("globals\nconstant boolean B=true\nboolean A\nendglobals\n"));
  assert_eq!(out.text.matches("true").count(), 1);
  assert_eq!(out.text.matches("set A=B\n").count(), 8);
}

#[test]
fn global_names_are_injective_and_ranked() {
  let mut src = String::from("globals\n");
  for k in 0 .. 60 {
    src.push_str(&format!("    integer g{}\n", k));
  }
  src.push_str("endglobals\nfunction main takes nothing returns nothing\n");
  for k in 0 .. 60 {
    for _ in 0 .. (k % 7) + 1 {
      src.push_str(&format!("    set g{}=0\n", k));
    }
  }
  src.push_str("endfunction\n");
  let mut env = Env::from_blocks(split_blocks(&src).unwrap()).unwrap();
  count_decl_uses(&mut env);
  let uses: BTreeMap<SmolStr, u32> = env.decls.iter().map(|d| (d.name.clone(), d.uses)).collect();
  let map = rename_globals(&mut env, &mut NamePool::global());
  assert_eq!(map.len(), 60);
  let fresh: BTreeSet<&SmolStr> = map.values().collect();
  assert_eq!(fresh.len(), 60);
  for (a, na) in map.iter() {
    for (b, nb) in map.iter() {
      if uses[a] > uses[b] {
        assert!(na.len() <= nb.len(), "{} ({}) vs {} ({})", a, na, b, nb);
      }
    }
  }
}

#[test]
fn malformed_input_is_an_error() {
  assert!(minify_jass("function main takes nothing returns nothing\n", &MinifyOpts::default()).is_err());
  assert!(minify_jass("globals\n    widgetz w\nendglobals\n", &MinifyOpts::default()).is_err());
  let out = minify_jass("", &MinifyOpts::default()).unwrap();
  assert_eq!(out.text, "");
}
