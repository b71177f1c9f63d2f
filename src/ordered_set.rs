//! An ordered set with order-statistic queries.
//!
//! [`OrderedSet`] is a weight-balanced binary search tree whose nodes carry subtree sizes.
//! Besides the usual insert/remove/find in O(log n) it answers "how many elements lie below
//! or above this bound" in O(log n) and extracts a contiguous range in O(log n + m).

use core::cmp::Ordering::Less;
use core::fmt;
use core::iter::FusedIterator;

use crate::comparator::{Comparator, Natural};
use crate::error::{Error, Result};
use crate::raw::{Key, Path, RawOrderedSet};

mod capacity;
mod order_statistic;

/// An ordered set based on a weight-balanced tree with subtree-size augmentation.
///
/// Elements are ordered by the set's [`Comparator`]; no two stored elements compare equal.
/// The comparator may accept probes of another type `Q`, so a set of records can be searched
/// by a partial key.
///
/// Whether the set owns its elements is decided by `T`: an `OrderedSet<Record>` drops
/// records it removes, an `OrderedSet<&Record>` only ever holds views and never frees
/// anything.
///
/// It is a logic error for an element to be modified in such a way that its ordering
/// relative to any other element changes while it is in the set. The behavior resulting
/// from such a logic error is not specified, but will be encapsulated to the `OrderedSet`
/// that observed it and not result in undefined behavior.
///
/// # Examples
///
/// ```
/// use wabi_monitor::OrderedSet;
///
/// let mut set = OrderedSet::new();
/// for v in [40, 10, 30, 20, 50] {
///     set.insert(v);
/// }
///
/// assert_eq!(set.count_less_than(&30), 2);
/// assert_eq!(set.count_greater_than(&30), 2);
/// assert_eq!(set.return_from_to(Some(&15), Some(&40)), [&20, &30, &40]);
///
/// // Cursor-style traversal with node handles.
/// let first = set.first().unwrap();
/// let second = set.next(first).unwrap();
/// assert_eq!(set.node_value(second), Some(&20));
/// ```
#[derive(Clone)]
pub struct OrderedSet<T, C = Natural> {
    raw: RawOrderedSet<T>,
    comparator: C,
}

/// A handle to one element of an [`OrderedSet`].
///
/// Handles are cheap to copy and stay valid until their element is removed (by any
/// operation, including [`clear`](OrderedSet::clear)). A stale handle, or one issued by a
/// different set, is detected: lookups return `None`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SetNode(Key);

/// An iterator over the elements of an [`OrderedSet`], in ascending order.
///
/// This `struct` is created by the [`iter`](OrderedSet::iter) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T> {
    raw: &'a RawOrderedSet<T>,
    path: Path,
    remaining: usize,
}

/// An iterator over a closed interval of an [`OrderedSet`].
///
/// This `struct` is created by the [`range`](OrderedSet::range) method.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Range<'a, T, C, Q: ?Sized> {
    raw: &'a RawOrderedSet<T>,
    comparator: &'a C,
    path: Path,
    to: Option<&'a Q>,
}

impl<T> OrderedSet<T> {
    /// Makes a new, empty `OrderedSet` ordered by [`Ord`].
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_monitor::OrderedSet;
    ///
    /// let set: OrderedSet<i32> = OrderedSet::new();
    /// assert!(set.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> OrderedSet<T> {
        OrderedSet::with_comparator(Natural)
    }
}

impl<T, C> OrderedSet<T, C> {
    /// Makes a new, empty `OrderedSet` ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        OrderedSet {
            raw: RawOrderedSet::new(),
            comparator,
        }
    }

    /// Returns the comparator this set orders by.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of elements in the set.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the set contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Clears the set, removing all elements. Every outstanding [`SetNode`] becomes stale.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the node holding the smallest element, or `None` if the set is empty.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn first(&self) -> Option<SetNode> {
        self.raw.first().map(|h| SetNode(self.raw.key(h)))
    }

    /// Returns the node holding the largest element, or `None` if the set is empty.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn last(&self) -> Option<SetNode> {
        self.raw.last().map(|h| SetNode(self.raw.key(h)))
    }

    /// Returns the smallest element.
    #[must_use]
    pub fn first_value(&self) -> Option<&T> {
        self.raw.first().map(|h| self.raw.value(h))
    }

    /// Returns the largest element.
    #[must_use]
    pub fn last_value(&self) -> Option<&T> {
        self.raw.last().map(|h| self.raw.value(h))
    }

    /// Returns the element behind `node`, or `None` if the handle is stale.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn node_value(&self, node: SetNode) -> Option<&T> {
        self.raw.resolve(node.0).map(|h| self.raw.value(h))
    }

    /// Calls `visit` on every element in ascending order.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn visit<F: FnMut(&T)>(&self, mut visit: F) {
        self.raw.visit(&mut visit);
    }

    /// Gets an iterator that visits the elements in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_monitor::OrderedSet;
    ///
    /// let set: OrderedSet<_> = [3, 1, 2].into_iter().collect();
    /// let mut iter = set.iter();
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), Some(&3));
    /// assert_eq!(iter.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            raw: &self.raw,
            path: self.raw.leftmost_path(),
            remaining: self.raw.len(),
        }
    }
}

impl<T, C: Comparator<T>> OrderedSet<T, C> {
    /// Adds `value` to the set, replacing the existing element that compares equal to it.
    ///
    /// Returns `true` if an element was replaced, `false` if the set grew. The replaced
    /// element is dropped; use [`replace`](Self::replace) to get it back.
    ///
    /// # Complexity
    ///
    /// O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_monitor::OrderedSet;
    ///
    /// let mut set = OrderedSet::new();
    /// assert!(!set.insert(2));
    /// assert!(set.insert(2));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Adds `value` to the set, returning the element it replaced, if any.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let (_, old) = self.raw.insert(&self.comparator, value);
        old
    }

    /// Adds `value` and returns the node now holding it, together with the replaced element.
    ///
    /// A replacement keeps the node, so handles to the old element now see the new one.
    pub fn insert_node(&mut self, value: T) -> (SetNode, Option<T>) {
        let (h, old) = self.raw.insert(&self.comparator, value);
        (SetNode(self.raw.key(h)), old)
    }

    /// Returns the node after `node` in ascending order.
    ///
    /// Returns `None` when `node` holds the largest element or is stale.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn next(&self, node: SetNode) -> Option<SetNode> {
        let h = self.raw.resolve(node.0)?;
        self.raw.next(&self.comparator, h).map(|h| SetNode(self.raw.key(h)))
    }

    /// Returns the node before `node` in ascending order.
    ///
    /// Returns `None` when `node` holds the smallest element or is stale.
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn previous(&self, node: SetNode) -> Option<SetNode> {
        let h = self.raw.resolve(node.0)?;
        self.raw.previous(&self.comparator, h).map(|h| SetNode(self.raw.key(h)))
    }

    /// Removes the element behind `node` and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if the node is no longer in this set.
    pub fn remove_node(&mut self, node: SetNode) -> Result<T> {
        let h = self.raw.resolve(node.0).ok_or(Error::stale(node.0))?;
        Ok(self.raw.remove_node(&self.comparator, h))
    }
}

impl<T, C> OrderedSet<T, C> {
    /// Removes the element that compares equal to `value`. Returns whether one was found.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the element that compares equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.remove(&self.comparator, value)
    }

    /// Returns the stored element that compares equal to `value`.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn find<Q>(&self, value: &Q) -> Option<&T>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.find(&self.comparator, value).map(|h| self.raw.value(h))
    }

    /// Returns the node of the stored element that compares equal to `value`.
    pub fn find_node<Q>(&self, value: &Q) -> Option<SetNode>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.find(&self.comparator, value).map(|h| SetNode(self.raw.key(h)))
    }

    /// Returns `true` if the set holds an element equal to `value`.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.find(&self.comparator, value).is_some()
    }

    /// Returns, in ascending order, every element `e` with `from <= e <= to`.
    ///
    /// A `None` bound leaves that side unbounded. When both bounds are `None` the type of the
    /// probe cannot be inferred and must be spelled out, e.g.
    /// `set.return_from_to::<i32>(None, None)`.
    ///
    /// # Complexity
    ///
    /// O(log n + m) for m returned elements: one descent locates `from`, then the walk
    /// follows tree links and stops at the first element past `to`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_monitor::OrderedSet;
    ///
    /// let set: OrderedSet<_> = (1..=9).collect();
    /// assert_eq!(set.return_from_to(Some(&3), Some(&5)), [&3, &4, &5]);
    /// assert_eq!(set.return_from_to(None, Some(&2)), [&1, &2]);
    /// assert_eq!(set.return_from_to::<i32>(None, None).len(), 9);
    /// ```
    pub fn return_from_to<Q>(&self, from: Option<&Q>, to: Option<&Q>) -> Vec<&T>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let mut path = self.raw.lower_bound_path(&self.comparator, from);
        let mut elements = Vec::new();
        while let Some(h) = self.raw.advance(&mut path) {
            let value = self.raw.value(h);
            if to.is_some_and(|to| self.comparator.compare(to, value) == Less) {
                break;
            }
            elements.push(value);
        }
        elements
    }

    /// Lazy form of [`return_from_to`](Self::return_from_to).
    pub fn range<'a, Q>(&'a self, from: Option<&Q>, to: Option<&'a Q>) -> Range<'a, T, C, Q>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        Range {
            raw: &self.raw,
            comparator: &self.comparator,
            path: self.raw.lower_bound_path(&self.comparator, from),
            to,
        }
    }
}

impl<T, C: Default> Default for OrderedSet<T, C> {
    fn default() -> Self {
        OrderedSet::with_comparator(C::default())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for OrderedSet<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C: Comparator<T> + Default> FromIterator<T> for OrderedSet<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::default();
        set.extend(iter);
        set
    }
}

impl<T, C: Comparator<T>> Extend<T> for OrderedSet<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, C> IntoIterator for &'a OrderedSet<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let h = self.raw.advance(&mut self.path)?;
        self.remaining -= 1;
        Some(self.raw.value(h))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T, C, Q> Iterator for Range<'a, T, C, Q>
where
    Q: ?Sized,
    C: Comparator<T, Q>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let h = self.raw.advance(&mut self.path)?;
        let value = self.raw.value(h);
        if self.to.is_some_and(|to| self.comparator.compare(to, value) == Less) {
            self.path.clear();
            return None;
        }
        Some(value)
    }
}

impl<T, C, Q> FusedIterator for Range<'_, T, C, Q>
where
    Q: ?Sized,
    C: Comparator<T, Q>,
{
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stale_node_is_detected() {
        let mut set: OrderedSet<i32> = (0..10).collect();
        let node = set.find_node(&4).unwrap();
        assert!(set.remove(&4));
        assert_eq!(set.node_value(node), None);
        assert_eq!(set.next(node), None);
        assert_eq!(set.remove_node(node), Err(Error::stale(node.0)));

        set.insert(4);
        assert_eq!(set.node_value(node), None, "reused slot must not revive the handle");
        set.raw.check_invariants(&Natural);
    }

    #[test]
    fn handle_from_another_set_is_rejected() {
        let a: OrderedSet<i32> = (0..3).collect();
        let b: OrderedSet<i32> = (0..3).collect();
        let node = a.first().unwrap();
        assert_eq!(b.node_value(node), None);
        assert_eq!(b.clone().node_value(b.first().unwrap()), None);
    }

    #[test]
    fn remove_node_keeps_other_handles() {
        let mut set: OrderedSet<i32> = (0..64).collect();
        let nodes: Vec<_> = (0..64).map(|v| set.find_node(&v).unwrap()).collect();
        for v in (0..64).step_by(3) {
            assert_eq!(set.remove_node(nodes[v as usize]), Ok(v));
            set.raw.check_invariants(&Natural);
        }
        for v in 0..64 {
            let expected = (v % 3 != 0).then_some(&v);
            assert_eq!(set.node_value(nodes[v as usize]), expected);
        }
    }

    #[test]
    fn replacing_insert_keeps_node() {
        let by_first = |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0);
        let mut set = OrderedSet::with_comparator(by_first);
        let (node, old) = set.insert_node((1, 'a'));
        assert_eq!(old, None);
        assert!(set.insert((1, 'b')));
        assert_eq!(set.node_value(node), Some(&(1, 'b')));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_set_has_no_first_or_last() {
        let set: OrderedSet<u8> = OrderedSet::new();
        assert_eq!(set.first(), None);
        assert_eq!(set.last(), None);
        assert_eq!(set.first_value(), None);
        assert!(set.return_from_to::<u8>(None, None).is_empty());
        assert_eq!(set.count_less_than(&5), 0);
    }

    #[test]
    fn range_stops_after_upper_bound() {
        let set: OrderedSet<i32> = (0..100).map(|v| v * 2).collect();
        let hits: Vec<_> = set.range(Some(&11), Some(&19)).copied().collect();
        assert_eq!(hits, [12, 14, 16, 18]);
        assert!(set.return_from_to(Some(&50), Some(&10)).is_empty());
    }
}
