/// Characters that never need surrounding whitespace.
pub const TIGHT_CHARS: &[char] = &['=', '*', ',', '+', '/', '>', '<', '[', ']', '(', ')', '-', '!'];

#[inline]
fn is_hspace(c: char) -> bool {
  c == ' ' || c == '\t' || c == '\r'
}

/// Collapses one line to single spaces and drops spaces next to
/// [`TIGHT_CHARS`].
fn squeeze_line(line: &str, dst: &mut String) {
  let mut pending = false;
  for c in line.chars() {
    if is_hspace(c) {
      pending = true;
      continue;
    }
    if pending {
      let prev_tight = dst.chars().last().map_or(true, |p| p == '\n' || TIGHT_CHARS.contains(&p));
      if !prev_tight && !TIGHT_CHARS.contains(&c) {
        dst.push(' ');
      }
      pending = false;
    }
    dst.push(c);
  }
}

/// Normalizes the whitespace of a globals or function block.
///
/// Placeholders contain no whitespace and no tight characters, so literal
/// content is untouched.
pub fn squeeze_block(src: &str) -> String {
  let mut dst = String::with_capacity(src.len());
  for line in src.split('\n') {
    let mark = dst.len();
    squeeze_line(line, &mut dst);
    if dst.len() > mark {
      dst.push('\n');
    }
  }
  while dst.ends_with('\n') {
    dst.pop();
  }
  dst
}

/// Natives keep their line layout and only lose repeated blanks.
pub fn squeeze_native(src: &str) -> String {
  let mut dst = String::with_capacity(src.len());
  let mut pending = false;
  for c in src.trim().chars() {
    if is_hspace(c) {
      pending = true;
      continue;
    }
    if pending {
      dst.push(' ');
      pending = false;
    }
    dst.push(c);
  }
  dst
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collapses_and_tightens() {
    let src = "\n\n   local integer  a = 5 * ( b + c )\n\n\n\tcall   Foo( a , - b )\r\n   if not  x then\n";
    assert_eq!(squeeze_block(src), "local integer a=5*(b+c)\ncall Foo(a,-b)\nif not x then");
  }

  #[test]
  fn keeps_placeholders_intact() {
    let src = "call  X( \u{0}12\u{0} , y )";
    assert_eq!(squeeze_block(src), "call X(\u{0}12\u{0},y)");
  }

  #[test]
  fn native_runs() {
    assert_eq!(squeeze_native("native  Foo   takes integer a ,\treal b returns  nothing "), "native Foo takes integer a , real b returns nothing");
  }
}
