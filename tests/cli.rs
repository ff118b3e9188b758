use assert_cmd::Command;
use tempfile::{TempDir};

use std::fs;
use std::path::{PathBuf};

const SRC: &str = "\
globals
    constant integer UNUSED = 3
endglobals
function Helper takes nothing returns nothing
    call SetLife(u, UNIT_LIFE)
endfunction
function Dead takes nothing returns nothing
endfunction
function main takes nothing returns nothing
    call Helper()
endfunction
";

fn minify_cmd() -> Command {
  let mut cmd = Command::cargo_bin("minify_jass").unwrap();
  cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
  cmd
}

struct Workspace {
  dir: TempDir,
}

impl Workspace {
  fn new(src: &str) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("war3map.j"), src).unwrap();
    Workspace{dir}
  }

  fn path(&self, name: &str) -> PathBuf {
    self.dir.path().join(name)
  }

  /// Runs with both tables pointed into the workspace.
  fn cmd(&self) -> Command {
    let mut cmd = minify_cmd();
    cmd.arg(self.path("war3map.j"))
      .arg(self.path("out.j"))
      .arg("--constants").arg(self.path("constants.j"))
      .arg("--functions").arg(self.path("functions.j"));
    cmd
  }

  fn output(&self) -> String {
    fs::read_to_string(self.path("out.j")).unwrap()
  }
}

#[test]
fn reports_removals() {
  let ws = Workspace::new(SRC);
  ws.cmd().assert()
    .success()
    .stdout("Removed 1 functions\nRemoved 1 constants\nRemoved 0 globals\n");
  let out = ws.output();
  assert!(out.starts_with("function A takes nothing returns nothing\ncall SetLife(u,UNIT_LIFE)\n"));
  assert!(out.contains("call A()"));
}

#[test]
fn uses_external_tables() {
  let ws = Workspace::new(SRC);
  fs::write(ws.path("functions.j"), "SetLife SetWidgetLife(\\0,\\1)\n").unwrap();
  fs::write(ws.path("constants.j"), "UNIT_LIFE    'hfoo'\n").unwrap();
  ws.cmd().assert().success();
  assert!(ws.output().contains("call SetWidgetLife(u,'hfoo')"));
}

#[test]
fn keeps_named_functions() {
  let ws = Workspace::new(SRC);
  ws.cmd().arg("--keep").arg("Dead").assert()
    .success()
    .stdout("Removed 0 functions\nRemoved 1 constants\nRemoved 0 globals\n");
  assert!(ws.output().contains("function Dead takes nothing returns nothing"));
}

#[test]
fn missing_input_fails() {
  let ws = Workspace::new(SRC);
  minify_cmd()
    .arg(ws.path("nope.j"))
    .arg(ws.path("out.j"))
    .assert()
    .failure();
  assert!(!ws.path("out.j").exists());
}

#[test]
fn malformed_input_fails() {
  let ws = Workspace::new("function main takes nothing returns nothing\n    call X(\"open)\nendfunction\n");
  let out = ws.cmd().output().unwrap();
  assert!(!out.status.success());
  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("unterminated string literal"), "{}", stderr);
}
