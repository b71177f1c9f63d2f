use super::OrderedSet;
use crate::comparator::Natural;
use crate::raw::RawOrderedSet;

impl<T> OrderedSet<T> {
    /// Creates an empty set with room for at least `capacity` elements before reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_monitor::OrderedSet;
    ///
    /// let set: OrderedSet<i32> = OrderedSet::with_capacity(16);
    /// assert!(set.is_empty());
    /// assert!(set.capacity() >= 16);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        OrderedSet::with_capacity_and_comparator(capacity, Natural)
    }
}

impl<T, C> OrderedSet<T, C> {
    /// Creates an empty set ordered by `comparator` with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        OrderedSet {
            raw: RawOrderedSet::with_capacity(capacity),
            comparator,
        }
    }

    /// Returns the number of elements the set can hold without reallocating its node storage.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }
}
