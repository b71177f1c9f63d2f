/// A zero-based rank into the sorted order of an [`OrderedSet`](crate::OrderedSet).
///
/// # Examples
///
/// ```
/// use wabi_monitor::{OrderedSet, Rank};
///
/// let set: OrderedSet<_> = ["b", "a"].into_iter().collect();
/// assert_eq!(set[Rank(0)], "a");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(pub usize);
