//! Call graph reachability and declaration usage counts.

use crate::algo::*;
use crate::algo::str::{Segment, Segments, words};
use crate::env::{Env};
use crate::literal::{LiteralTable, placeholder_id};

use log::{debug, trace};

/// Engine calls that name a function or a variable inside a string.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Idiom {
  /// `ExecuteFunc("Name")`
  ExecuteFunc,
  /// `TriggerRegisterVariableEvent(t,"Name",...)`
  VariableEvent,
}

impl Idiom {
  pub fn callee(self) -> &'static str {
    match self {
      Idiom::ExecuteFunc => "ExecuteFunc",
      Idiom::VariableEvent => "TriggerRegisterVariableEvent",
    }
  }
}

/// Literal ids wrapped by `idiom` in `body`.
///
/// `ExecuteFunc` must take the literal as its whole argument; the variable
/// event form takes the first literal that follows on the same line.
pub fn idiom_literal_ids(body: &str, idiom: Idiom) -> Vec<usize> {
  let segs: Vec<Segment> = Segments::new(body).map(|(_, seg)| seg).collect();
  let mut ids = Vec::new();
  for (k, seg) in segs.iter().enumerate() {
    if *seg != Segment::Word(idiom.callee()) {
      continue;
    }
    match idiom {
      Idiom::ExecuteFunc => {
        match (segs.get(k + 1), segs.get(k + 2), segs.get(k + 3)) {
          (Some(Segment::Other("(")), Some(Segment::Placeholder(ph)), Some(Segment::Other(close)))
              if close.starts_with(')') => {
            ids.extend(placeholder_id(ph));
          }
          _ => {}
        }
      }
      Idiom::VariableEvent => {
        match segs.get(k + 1) {
          Some(Segment::Other(open)) if open.starts_with('(') => {}
          _ => continue
        }
        for next in segs[k + 1 .. ].iter() {
          match next {
            Segment::Placeholder(ph) => {
              ids.extend(placeholder_id(ph));
              break;
            }
            Segment::Other(s) if s.contains('\n') => break,
            _ => {}
          }
        }
      }
    }
  }
  ids
}

/// The identifier named by a string literal: its first word.
pub fn literal_ident(lit: &str) -> Option<&str> {
  words(lit).next()
}

pub fn idiom_names<'a>(body: &str, idiom: Idiom, literals: &'a LiteralTable) -> Vec<&'a str> {
  idiom_literal_ids(body, idiom).into_iter()
    .filter_map(|id| literals.get(id))
    .filter_map(literal_ident)
    .collect()
}

/// Nodes are functions; each edge is one call site, so a callee appears
/// once per occurrence in the caller's body.
#[derive(Clone, Default, Debug)]
pub struct CallGraph {
  names:  Vec<SmolStr>,
  index:  BTreeMap<SmolStr, usize>,
  edges:  Vec<Vec<usize>>,
}

impl CallGraph {
  pub fn build(env: &Env) -> CallGraph {
    let mut graph = CallGraph::default();
    for f in env.functions.iter() {
      let node = graph.names.len();
      graph.names.push(f.name.clone());
      graph.index.entry(f.name.clone()).or_insert(node);
    }
    for f in env.functions.iter() {
      let mut sites = Vec::new();
      for w in words(&f.body) {
        if let Some(&callee) = graph.index.get(w) {
          sites.push(callee);
        }
      }
      for name in idiom_names(&f.body, Idiom::ExecuteFunc, &env.literals) {
        if let Some(&callee) = graph.index.get(name) {
          sites.push(callee);
        }
      }
      graph.edges.push(sites);
    }
    graph
  }

  pub fn node(&self, name: &str) -> Option<usize> {
    self.index.get(name).copied()
  }

  /// Counts call sites over everything reachable from `roots`.
  ///
  /// Every call site in an expanded function bumps its callee, but a
  /// function is expanded at most once, so the counts are total call-site
  /// occurrences across the reachable set.
  pub fn reach(&self, roots: &[usize]) -> Vec<u32> {
    let mut counts = vec![0u32; self.names.len()];
    let mut expanded = vec![false; self.names.len()];
    let mut stack = Vec::new();
    for &root in roots.iter() {
      if !expanded[root] {
        expanded[root] = true;
        stack.push(root);
      }
    }
    while let Some(node) = stack.pop() {
      trace!("reach: expand {}", self.names[node]);
      for &callee in self.edges[node].iter() {
        counts[callee] += 1;
        if !expanded[callee] {
          expanded[callee] = true;
          stack.push(callee);
        }
      }
    }
    counts
  }
}

/// Sets every function's usage counter from reachability.
pub fn count_calls(env: &mut Env) {
  let graph = CallGraph::build(env);
  let roots: Vec<usize> = env.functions.iter().enumerate()
    .filter(|(_, f)| f.entry)
    .filter_map(|(k, f)| graph.node(&f.name).filter(|&n| n == k))
    .collect();
  let counts = graph.reach(&roots);
  for (k, f) in env.functions.iter_mut().enumerate() {
    f.uses = counts[k] + if f.entry { 1 } else { 0 };
    trace!("reach: {} used {} times", f.name, f.uses);
  }
  debug!("reach: {} of {} functions reachable",
      env.functions.iter().filter(|f| f.uses > 0).count(), env.functions.len());
}

/// Counts whole-word references to every declaration from function bodies,
/// from variable event registrations, and from the other declarations'
/// initializers.
pub fn count_decl_uses(env: &mut Env) {
  let index: BTreeMap<SmolStr, usize> = env.decls.iter().enumerate()
    .map(|(k, d)| (d.name.clone(), k))
    .collect();
  let mut counts = vec![0u32; env.decls.len()];
  for f in env.functions.iter() {
    let shadowed = f.scoped_names();
    for w in words(&f.body) {
      match index.get(w) {
        Some(&k) if !shadowed.contains(w) => counts[k] += 1,
        _ => {}
      }
    }
    for name in idiom_names(&f.body, Idiom::VariableEvent, &env.literals) {
      if let Some(&k) = index.get(name) {
        counts[k] += 1;
      }
    }
  }
  for (j, d) in env.decls.iter().enumerate() {
    if let Some(init) = d.init.as_ref() {
      for w in words(init) {
        match index.get(w) {
          Some(&k) if k != j => counts[k] += 1,
          _ => {}
        }
      }
    }
  }
  for (d, n) in env.decls.iter_mut().zip(counts.into_iter()) {
    d.uses = n;
  }
}
