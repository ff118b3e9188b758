use crate::env::{Env};
use crate::usage::{count_calls, count_decl_uses};

use log::{debug, info};

use std::fmt::{Display, Formatter, Result as FmtResult};

/// How many items a dead code pass removed.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct DceReport {
  pub functions: usize,
  pub constants: usize,
  pub globals: usize,
}

impl Display for DceReport {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    writeln!(f, "Removed {} functions", self.functions)?;
    writeln!(f, "Removed {} constants", self.constants)?;
    write!(f, "Removed {} globals", self.globals)
  }
}

pub fn remove_dead_functions(env: &mut Env) -> usize {
  let before = env.functions.len();
  env.functions.retain(|f| {
    let keep = f.entry || f.uses > 0;
    if !keep {
      debug!("dce: drop function {}", f.name);
    }
    keep
  });
  before - env.functions.len()
}

/// Returns the number of constants and globals removed.
pub fn remove_dead_decls(env: &mut Env) -> (usize, usize) {
  let mut constants = 0;
  let mut globals = 0;
  env.decls.retain(|d| {
    if d.uses > 0 {
      return true;
    }
    debug!("dce: drop {} {}", if d.is_constant { "constant" } else { "global" }, d.name);
    if d.is_constant {
      constants += 1;
    } else {
      globals += 1;
    }
    false
  });
  (constants, globals)
}

/// One pass of reachability, function removal, declaration counting and
/// declaration removal. Items that only become dead through this pass's own
/// removals survive.
pub fn eliminate(env: &mut Env) -> DceReport {
  count_calls(env);
  let functions = remove_dead_functions(env);
  count_decl_uses(env);
  let (constants, globals) = remove_dead_decls(env);
  let report = DceReport{functions, constants, globals};
  info!("dce: removed {} functions, {} constants, {} globals", functions, constants, globals);
  report
}
