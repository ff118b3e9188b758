pub use smol_str::{SmolStr};
pub use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub mod str;
