use core::ops::Index;

use super::OrderedSet;
use crate::Rank;
use crate::comparator::Comparator;

impl<T, C> OrderedSet<T, C> {
    /// Returns the number of elements strictly less than `bound`.
    ///
    /// `bound` need not be in the set. The count is assembled from subtree sizes along a
    /// single root-to-leaf descent, never by visiting the counted elements.
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
    /// let set: OrderedSet<_> = [10, 20, 30].into_iter().collect();
    /// assert_eq!(set.count_less_than(&20), 1);
    /// assert_eq!(set.count_less_than(&25), 2);
    /// assert_eq!(set.count_less_than(&5), 0);
    /// ```
    pub fn count_less_than<Q>(&self, bound: &Q) -> usize
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.count_less_than(&self.comparator, bound)
    }

    /// Returns the number of elements strictly greater than `bound`.
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
    /// let set: OrderedSet<_> = [10, 20, 30].into_iter().collect();
    /// assert_eq!(set.count_greater_than(&20), 1);
    /// assert_eq!(set.count_greater_than(&15), 2);
    /// assert_eq!(set.count_greater_than(&30), 0);
    /// ```
    pub fn count_greater_than<Q>(&self, bound: &Q) -> usize
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.count_greater_than(&self.comparator, bound)
    }

    /// Returns the zero-based rank of `value` in sorted order, or `None` if the value is
    /// not present.
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
    /// let set: OrderedSet<_> = [10, 20].into_iter().collect();
    /// assert_eq!(set.rank_of(&20), Some(1));
    /// assert_eq!(set.rank_of(&15), None);
    /// ```
    pub fn rank_of<Q>(&self, value: &Q) -> Option<usize>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        self.raw.rank_of(&self.comparator, value)
    }

    /// Returns the value at position `rank` in sorted order.
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
    /// let set: OrderedSet<_> = [10, 20, 30].into_iter().collect();
    /// assert_eq!(set.get_by_rank(1), Some(&20));
    /// assert!(set.get_by_rank(3).is_none());
    /// ```
    #[must_use]
    pub fn get_by_rank(&self, rank: usize) -> Option<&T> {
        self.raw.get_by_rank(rank).map(|h| self.raw.value(h))
    }
}

/// Indexes into the set by rank.
///
/// # Panics
///
/// Panics if `rank` is out of bounds.
///
/// # Examples
///
/// ```
/// use wabi_monitor::{OrderedSet, Rank};
///
/// let set: OrderedSet<_> = [10, 20, 30].into_iter().collect();
/// assert_eq!(set[Rank(1)], 20);
/// ```
impl<T, C> Index<Rank> for OrderedSet<T, C> {
    type Output = T;

    fn index(&self, rank: Rank) -> &Self::Output {
        self.get_by_rank(rank.0).expect("index out of bounds")
    }
}
