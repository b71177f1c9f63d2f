mod arena;
mod handle;
mod node;
mod raw_ordered_set;

pub(crate) use arena::Arena;
pub(crate) use handle::{Handle, Key};
pub(crate) use raw_ordered_set::{Path, RawOrderedSet};
