//! A binary max-heap with stable node handles.
//!
//! [`IndexableHeap`] stores its elements in an arena and keeps the heap order in a separate
//! array of slot handles. Each element remembers its 1-based position in that array, so a
//! caller holding a [`HeapNode`] can remove or re-prioritize that element in O(log n).

use core::cmp::Ordering::Greater;
use core::fmt;

use crate::comparator::{Comparator, Natural};
use crate::error::{Error, Result};
use crate::raw::{Arena, Handle, Key};

#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    // 1-based index into `IndexableHeap::order`.
    position: usize,
}

/// A max-heap ordered by a [`Comparator`], returning a [`HeapNode`] for every insertion.
///
/// The parent of every element ranks at least as high as its children. Elements of equal
/// priority come out in no particular order.
///
/// It is a logic error to change an element's priority without telling the heap, either by
/// calling [`update_order`](Self::update_order) afterwards or by going through
/// [`update`](Self::update).
///
/// # Examples
///
/// ```
/// use wabi_monitor::IndexableHeap;
///
/// let mut heap = IndexableHeap::new();
/// let low = heap.insert(1);
/// heap.insert(5);
/// heap.insert(3);
/// assert_eq!(heap.max(), Some(&5));
///
/// // Promote an element that is buried in the heap.
/// heap.update(low, |v| *v = 10).unwrap();
/// assert_eq!(heap.max(), Some(&10));
/// assert_eq!(heap.top_k(2), [&10, &5]);
/// ```
#[derive(Clone)]
pub struct IndexableHeap<T, C = Natural> {
    entries: Arena<Entry<T>>,
    order: Vec<Handle>,
    comparator: C,
}

/// A handle to one element of an [`IndexableHeap`].
///
/// Valid until that element leaves the heap. Stale and foreign handles are detected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HeapNode(Key);

impl<T> IndexableHeap<T> {
    /// Makes a new, empty heap ordered by [`Ord`].
    #[must_use]
    pub fn new() -> Self {
        IndexableHeap::with_comparator(Natural)
    }

    /// Makes a new, empty heap ordered by [`Ord`] with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        IndexableHeap::with_capacity_and_comparator(capacity, Natural)
    }
}

impl<T, C> IndexableHeap<T, C> {
    /// Makes a new, empty heap ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        IndexableHeap {
            entries: Arena::new(),
            order: Vec::new(),
            comparator,
        }
    }

    /// Makes a new, empty heap ordered by `comparator` with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity_and_comparator(capacity: usize, comparator: C) -> Self {
        IndexableHeap {
            entries: Arena::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            comparator,
        }
    }

    /// Returns the number of elements in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the heap holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Removes every element. Every outstanding [`HeapNode`] becomes stale.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Returns the highest-priority element, or `None` if the heap is empty.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn max(&self) -> Option<&T> {
        self.order.first().map(|&h| &self.entries.get(h).value)
    }

    /// Returns the node of the highest-priority element.
    #[must_use]
    pub fn max_node(&self) -> Option<HeapNode> {
        self.order.first().map(|&h| HeapNode(self.entries.key(h)))
    }

    /// Returns `true` if `node` still refers to an element of this heap.
    #[must_use]
    pub fn contains(&self, node: HeapNode) -> bool {
        self.entries.resolve(node.0).is_some()
    }

    /// Returns the element behind `node`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, node: HeapNode) -> Option<&T> {
        self.entries.resolve(node.0).map(|h| &self.entries.get(h).value)
    }

    /// Returns the element behind `node` for mutation.
    ///
    /// Changing the element's priority through this reference must be followed by
    /// [`update_order`](Self::update_order).
    pub fn get_mut(&mut self, node: HeapNode) -> Option<&mut T> {
        let h = self.entries.resolve(node.0)?;
        Some(&mut self.entries.get_mut(h).value)
    }

    /// Gets an iterator over the elements in internal array order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.order.iter().map(|&h| &self.entries.get(h).value)
    }

    fn value_at(&self, position: usize) -> &T {
        &self.entries.get(self.order[position - 1]).value
    }

    fn resolve(&self, node: HeapNode) -> Result<Handle> {
        self.entries.resolve(node.0).ok_or(Error::stale(node.0))
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.order.swap(a - 1, b - 1);
        let (ha, hb) = (self.order[a - 1], self.order[b - 1]);
        self.entries.get_mut(ha).position = a;
        self.entries.get_mut(hb).position = b;
    }
}

impl<T, C: Comparator<T>> IndexableHeap<T, C> {
    /// Builds a heap from `values` in O(n) and returns the node of every value, in input
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use wabi_monitor::{IndexableHeap, Natural};
    ///
    /// let (heap, nodes) = IndexableHeap::from_values(Natural, [4, 9, 1]);
    /// assert_eq!(heap.max(), Some(&9));
    /// assert_eq!(heap.get(nodes[2]), Some(&1));
    /// ```
    pub fn from_values<I: IntoIterator<Item = T>>(comparator: C, values: I) -> (Self, Vec<HeapNode>) {
        let values = values.into_iter();
        let mut heap = IndexableHeap::with_capacity_and_comparator(values.size_hint().0, comparator);
        let mut nodes = Vec::with_capacity(values.size_hint().0);
        for value in values {
            let position = heap.order.len() + 1;
            let h = heap.entries.alloc(Entry { value, position });
            heap.order.push(h);
            nodes.push(HeapNode(heap.entries.key(h)));
        }
        for position in (1..=heap.len() / 2).rev() {
            heap.sift_down(position);
        }
        (heap, nodes)
    }

    /// Adds `value` and returns its node.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, value: T) -> HeapNode {
        let h = self.entries.alloc(Entry { value, position: 0 });
        self.attach(h);
        HeapNode(self.entries.key(h))
    }

    /// Removes and returns the highest-priority element, or `None` if the heap is empty.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_max(&mut self) -> Option<T> {
        let &h = self.order.first()?;
        self.detach(h);
        Some(self.entries.take(h).value)
    }

    /// Removes the element behind `node` from any position and returns it.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if `node` is not in this heap.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_node(&mut self, node: HeapNode) -> Result<T> {
        let h = self.resolve(node)?;
        self.detach(h);
        Ok(self.entries.take(h).value)
    }

    /// Moves the element behind `node` to its correct position after its priority changed.
    ///
    /// The node is taken out of the heap order and inserted again; its handle stays valid.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if `node` is not in this heap.
    pub fn update_order(&mut self, node: HeapNode) -> Result<()> {
        let h = self.resolve(node)?;
        self.detach(h);
        self.attach(h);
        Ok(())
    }

    /// Applies `f` to the element behind `node`, then restores the heap order.
    ///
    /// # Errors
    ///
    /// [`Error::StaleHandle`] if `node` is not in this heap.
    pub fn update<F: FnOnce(&mut T)>(&mut self, node: HeapNode, f: F) -> Result<()> {
        let h = self.resolve(node)?;
        f(&mut self.entries.get_mut(h).value);
        self.detach(h);
        self.attach(h);
        Ok(())
    }

    /// Returns up to `k` elements in descending priority order.
    ///
    /// The heap is only read: a second heap of array positions holds the frontier of
    /// candidates, starting at the root and growing by the two children of every element
    /// taken. `k >= len()` returns every element.
    ///
    /// # Complexity
    ///
    /// O(k log k)
    pub fn top_k(&self, k: usize) -> Vec<&T> {
        let k = k.min(self.len());
        let mut top = Vec::with_capacity(k);
        if k == 0 {
            return top;
        }

        let by_priority = |a: &usize, b: &usize| self.comparator.compare(self.value_at(*a), self.value_at(*b));
        let mut frontier = IndexableHeap::with_capacity_and_comparator(k + 1, by_priority);
        frontier.insert(1);
        while top.len() < k {
            let Some(position) = frontier.remove_max() else {
                break;
            };
            top.push(self.value_at(position));
            for child in [2 * position, 2 * position + 1] {
                if child <= self.len() {
                    frontier.insert(child);
                }
            }
        }
        top
    }

    fn ranks_above(&self, a: usize, b: usize) -> bool {
        self.comparator.compare(self.value_at(a), self.value_at(b)) == Greater
    }

    /// Appends a detached entry and bubbles it up.
    fn attach(&mut self, h: Handle) {
        self.order.push(h);
        let position = self.order.len();
        self.entries.get_mut(h).position = position;
        self.sift_up(position);
    }

    /// Takes an entry out of the heap order without freeing it.
    fn detach(&mut self, h: Handle) {
        let position = self.entries.get(h).position;
        let last = self.order.len();
        self.swap(position, last);
        self.order.pop();
        if position < last {
            // The relocated element moves in at most one direction.
            if self.sift_up(position) == position {
                self.sift_down(position);
            }
        }
    }

    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 1 {
            let parent = position / 2;
            if !self.ranks_above(position, parent) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position;
            if left > self.len() {
                break;
            }
            let child = if left < self.len() && self.ranks_above(left + 1, left) {
                left + 1
            } else {
                left
            };
            if !self.ranks_above(child, position) {
                break;
            }
            self.swap(position, child);
            position = child;
        }
    }
}

impl<T, C: Default> Default for IndexableHeap<T, C> {
    fn default() -> Self {
        IndexableHeap::with_comparator(C::default())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for IndexableHeap<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<T, C: Comparator<T>> IndexableHeap<T, C> {
    /// Asserts heap order and that every entry knows its own position.
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.entries.len(), self.order.len(), "arena holds detached entries");
        for (index, &h) in self.order.iter().enumerate() {
            let position = index + 1;
            assert_eq!(self.entries.get(h).position, position, "stale position field");
            for child in [2 * position, 2 * position + 1] {
                if child <= self.len() {
                    assert!(!self.ranks_above(child, position), "child at {child} outranks its parent");
                }
            }
        }
    }
}
