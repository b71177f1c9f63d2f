use core::cmp::Ordering::{Equal, Greater, Less};

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::{Handle, Key};
use super::node::Node;
use crate::comparator::Comparator;

/// Imbalance bound: a subtree may weigh at most `DELTA` times its sibling.
const DELTA: usize = 3;
/// Rotation choice: single rotation when the inner grandchild weighs less than `RATIO` times
/// the outer one, double rotation otherwise.
const RATIO: usize = 2;

/// Stack of ancestors still to be visited during an in-order walk.
///
/// A weight-balanced tree with `DELTA = 3` is at most ~2.41·log2(n) deep, so 64 inline
/// slots cover around a hundred million elements before spilling.
pub(crate) type Path = SmallVec<[Handle; 64]>;

/// The weight-balanced tree backing `OrderedSet`.
///
/// Weights are `size + 1`. Every structural change goes through [`balance`](Self::balance),
/// which also refreshes the subtree size of the node it is given, so sizes are repaired on
/// the whole path from the modification point back to the root.
#[derive(Clone, Debug)]
pub(crate) struct RawOrderedSet<T> {
    nodes: Arena<Node<T>>,
    root: Option<Handle>,
}

impl<T> RawOrderedSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.size(self.root)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn value(&self, handle: Handle) -> &T {
        self.nodes.get(handle).value()
    }

    pub(crate) fn key(&self, handle: Handle) -> Key {
        self.nodes.key(handle)
    }

    pub(crate) fn resolve(&self, key: Key) -> Option<Handle> {
        self.nodes.resolve(key)
    }

    #[inline]
    fn size(&self, link: Option<Handle>) -> usize {
        link.map_or(0, |h| self.nodes.get(h).size())
    }

    #[inline]
    fn weight(&self, link: Option<Handle>) -> usize {
        self.size(link) + 1
    }

    fn update_size(&mut self, handle: Handle) {
        let node = self.nodes.get(handle);
        let size = 1 + self.size(node.left()) + self.size(node.right());
        self.nodes.get_mut(handle).set_size(size);
    }

    /// Lifts the right child of `handle` into its place. Returns the new subtree root.
    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let pivot = self.nodes.get(handle).right().expect("`rotate_left()` - no right child!");
        let inner = self.nodes.get(pivot).left();
        self.nodes.get_mut(handle).set_right(inner);
        self.update_size(handle);
        self.nodes.get_mut(pivot).set_left(Some(handle));
        self.update_size(pivot);
        pivot
    }

    /// Lifts the left child of `handle` into its place. Returns the new subtree root.
    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let pivot = self.nodes.get(handle).left().expect("`rotate_right()` - no left child!");
        let inner = self.nodes.get(pivot).right();
        self.nodes.get_mut(handle).set_left(inner);
        self.update_size(handle);
        self.nodes.get_mut(pivot).set_right(Some(handle));
        self.update_size(pivot);
        pivot
    }

    /// Restores the weight invariant at `handle` after one of its subtrees gained or lost a
    /// single element, and recomputes sizes. Returns the root of the repaired subtree.
    fn balance(&mut self, handle: Handle) -> Handle {
        let node = self.nodes.get(handle);
        let (left, right) = (node.left(), node.right());
        let (wl, wr) = (self.weight(left), self.weight(right));

        if wr > DELTA * wl {
            let r = right.expect("`balance()` - right-heavy node has no right child!");
            let r_node = self.nodes.get(r);
            if self.weight(r_node.left()) >= RATIO * self.weight(r_node.right()) {
                let r = self.rotate_right(r);
                self.nodes.get_mut(handle).set_right(Some(r));
            }
            self.rotate_left(handle)
        } else if wl > DELTA * wr {
            let l = left.expect("`balance()` - left-heavy node has no left child!");
            let l_node = self.nodes.get(l);
            if self.weight(l_node.right()) >= RATIO * self.weight(l_node.left()) {
                let l = self.rotate_left(l);
                self.nodes.get_mut(handle).set_left(Some(l));
            }
            self.rotate_right(handle)
        } else {
            self.update_size(handle);
            handle
        }
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        let mut current = self.root?;
        while let Some(left) = self.nodes.get(current).left() {
            current = left;
        }
        Some(current)
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        let mut current = self.root?;
        while let Some(right) = self.nodes.get(current).right() {
            current = right;
        }
        Some(current)
    }

    /// Pushes `link` and its chain of left descendants.
    pub(crate) fn push_left_spine(&self, path: &mut Path, mut link: Option<Handle>) {
        while let Some(h) = link {
            path.push(h);
            link = self.nodes.get(h).left();
        }
    }

    /// Path positioned before the smallest element.
    pub(crate) fn leftmost_path(&self) -> Path {
        let mut path = Path::new();
        self.push_left_spine(&mut path, self.root);
        path
    }

    /// Pops the next node of an in-order walk and queues its successors.
    pub(crate) fn advance(&self, path: &mut Path) -> Option<Handle> {
        let handle = path.pop()?;
        self.push_left_spine(path, self.nodes.get(handle).right());
        Some(handle)
    }

    /// Returns the element at zero-based position `rank`.
    pub(crate) fn get_by_rank(&self, mut rank: usize) -> Option<Handle> {
        if rank >= self.len() {
            return None;
        }
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            let left = self.size(node.left());
            match rank.cmp(&left) {
                Less => link = node.left(),
                Equal => return Some(h),
                Greater => {
                    rank -= left + 1;
                    link = node.right();
                }
            }
        }
        debug_assert!(false, "get_by_rank: tree size invariant violated - rank not found");
        None
    }

    /// Calls `f` on every element in order.
    pub(crate) fn visit(&self, f: &mut impl FnMut(&T)) {
        let mut path = self.leftmost_path();
        while let Some(h) = self.advance(&mut path) {
            f(self.value(h));
        }
    }
}

impl<T> RawOrderedSet<T> {
    /// Inserts `value`, replacing an equal element in place.
    ///
    /// Returns the handle of the node now holding `value` and the replaced element, if any.
    pub(crate) fn insert<C: Comparator<T>>(&mut self, cmp: &C, value: T) -> (Handle, Option<T>) {
        let (root, at, old) = self.insert_at(cmp, self.root, value);
        self.root = Some(root);
        (at, old)
    }

    fn insert_at<C: Comparator<T>>(&mut self, cmp: &C, link: Option<Handle>, value: T) -> (Handle, Handle, Option<T>) {
        let Some(h) = link else {
            let h = self.nodes.alloc(Node::leaf(value));
            return (h, h, None);
        };

        let node = self.nodes.get(h);
        let (left, right) = (node.left(), node.right());
        match cmp.compare(&value, node.value()) {
            Equal => {
                // Same position in the order, so sizes and shape are untouched.
                let old = core::mem::replace(self.nodes.get_mut(h).value_mut(), value);
                (h, h, Some(old))
            }
            Less => {
                let (child, at, old) = self.insert_at(cmp, left, value);
                self.nodes.get_mut(h).set_left(Some(child));
                let root = if old.is_some() { h } else { self.balance(h) };
                (root, at, old)
            }
            Greater => {
                let (child, at, old) = self.insert_at(cmp, right, value);
                self.nodes.get_mut(h).set_right(Some(child));
                let root = if old.is_some() { h } else { self.balance(h) };
                (root, at, old)
            }
        }
    }

    /// Removes the element equal to `probe`, returning it.
    pub(crate) fn remove<Q, C>(&mut self, cmp: &C, probe: &Q) -> Option<T>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let (root, removed) = self.remove_at(cmp, self.root, probe);
        let removed = removed?;
        self.root = root;
        Some(self.nodes.take(removed).into_value())
    }

    /// Unlinks `handle`, which must be a live node of this tree.
    pub(crate) fn remove_node<C: Comparator<T>>(&mut self, cmp: &C, handle: Handle) -> T {
        let (root, removed) = self.remove_exact(cmp, self.root, handle);
        assert_eq!(removed, Some(handle), "`remove_node()` - node is not reachable from the root!");
        self.root = root;
        self.nodes.take(handle).into_value()
    }

    fn remove_at<Q, C>(&mut self, cmp: &C, link: Option<Handle>, probe: &Q) -> (Option<Handle>, Option<Handle>)
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let Some(h) = link else {
            return (None, None);
        };

        let node = self.nodes.get(h);
        let (left, right) = (node.left(), node.right());
        match cmp.compare(probe, node.value()) {
            Equal => (self.unlink(h), Some(h)),
            Less => {
                let (child, removed) = self.remove_at(cmp, left, probe);
                if removed.is_none() {
                    return (Some(h), None);
                }
                self.nodes.get_mut(h).set_left(child);
                (Some(self.balance(h)), removed)
            }
            Greater => {
                let (child, removed) = self.remove_at(cmp, right, probe);
                if removed.is_none() {
                    return (Some(h), None);
                }
                self.nodes.get_mut(h).set_right(child);
                (Some(self.balance(h)), removed)
            }
        }
    }

    // Same descent as `remove_at`, keyed by the target node's own element.
    fn remove_exact<C: Comparator<T>>(
        &mut self,
        cmp: &C,
        link: Option<Handle>,
        target: Handle,
    ) -> (Option<Handle>, Option<Handle>) {
        let Some(h) = link else {
            return (None, None);
        };
        if h == target {
            return (self.unlink(h), Some(h));
        }

        let node = self.nodes.get(h);
        let (left, right) = (node.left(), node.right());
        match cmp.compare(self.nodes.get(target).value(), node.value()) {
            Equal => (Some(h), None),
            Less => {
                let (child, removed) = self.remove_exact(cmp, left, target);
                if removed.is_none() {
                    return (Some(h), None);
                }
                self.nodes.get_mut(h).set_left(child);
                (Some(self.balance(h)), removed)
            }
            Greater => {
                let (child, removed) = self.remove_exact(cmp, right, target);
                if removed.is_none() {
                    return (Some(h), None);
                }
                self.nodes.get_mut(h).set_right(child);
                (Some(self.balance(h)), removed)
            }
        }
    }

    /// Detaches `handle` from its children and returns the subtree that replaces it.
    ///
    /// With two children the in-order successor node itself is spliced into the vacated
    /// position, so no element changes slots.
    fn unlink(&mut self, handle: Handle) -> Option<Handle> {
        let node = self.nodes.get(handle);
        match (node.left(), node.right()) {
            (None, right) => right,
            (left, None) => left,
            (Some(left), Some(right)) => {
                let (rest, min) = self.detach_min(right);
                let successor = self.nodes.get_mut(min);
                successor.set_left(Some(left));
                successor.set_right(rest);
                Some(self.balance(min))
            }
        }
    }

    /// Removes the leftmost node of the subtree at `handle` without freeing it.
    fn detach_min(&mut self, handle: Handle) -> (Option<Handle>, Handle) {
        let node = self.nodes.get(handle);
        match node.left() {
            None => (node.right(), handle),
            Some(left) => {
                let (rest, min) = self.detach_min(left);
                self.nodes.get_mut(handle).set_left(rest);
                (Some(self.balance(handle)), min)
            }
        }
    }

    pub(crate) fn find<Q, C>(&self, cmp: &C, probe: &Q) -> Option<Handle>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            link = match cmp.compare(probe, node.value()) {
                Equal => return Some(h),
                Less => node.left(),
                Greater => node.right(),
            };
        }
        None
    }

    /// In-order successor of a live node, found by descending from the root.
    pub(crate) fn next<C: Comparator<T>>(&self, cmp: &C, handle: Handle) -> Option<Handle> {
        let value = self.value(handle);
        let mut candidate = None;
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            if cmp.compare(value, node.value()) == Less {
                candidate = Some(h);
                link = node.left();
            } else {
                link = node.right();
            }
        }
        candidate
    }

    /// In-order predecessor of a live node, found by descending from the root.
    pub(crate) fn previous<C: Comparator<T>>(&self, cmp: &C, handle: Handle) -> Option<Handle> {
        let value = self.value(handle);
        let mut candidate = None;
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            if cmp.compare(value, node.value()) == Greater {
                candidate = Some(h);
                link = node.right();
            } else {
                link = node.left();
            }
        }
        candidate
    }

    /// Path positioned before the first element not less than `from`.
    pub(crate) fn lower_bound_path<Q, C>(&self, cmp: &C, from: Option<&Q>) -> Path
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let Some(from) = from else {
            return self.leftmost_path();
        };
        let mut path = Path::new();
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            if cmp.compare(from, node.value()) == Greater {
                link = node.right();
            } else {
                path.push(h);
                link = node.left();
            }
        }
        path
    }

    /// Number of elements strictly less than `probe`.
    pub(crate) fn count_less_than<Q, C>(&self, cmp: &C, probe: &Q) -> usize
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let mut count = 0;
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            if cmp.compare(probe, node.value()) == Greater {
                count += self.size(node.left()) + 1;
                link = node.right();
            } else {
                link = node.left();
            }
        }
        count
    }

    /// Number of elements strictly greater than `probe`.
    pub(crate) fn count_greater_than<Q, C>(&self, cmp: &C, probe: &Q) -> usize
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let mut count = 0;
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            if cmp.compare(probe, node.value()) == Less {
                count += self.size(node.right()) + 1;
                link = node.left();
            } else {
                link = node.right();
            }
        }
        count
    }

    /// Zero-based position of the element equal to `probe`.
    pub(crate) fn rank_of<Q, C>(&self, cmp: &C, probe: &Q) -> Option<usize>
    where
        Q: ?Sized,
        C: Comparator<T, Q>,
    {
        let mut rank = 0;
        let mut link = self.root;
        while let Some(h) = link {
            let node = self.nodes.get(h);
            match cmp.compare(probe, node.value()) {
                Equal => return Some(rank + self.size(node.left())),
                Less => link = node.left(),
                Greater => {
                    rank += self.size(node.left()) + 1;
                    link = node.right();
                }
            }
        }
        None
    }
}

#[cfg(test)]
impl<T> RawOrderedSet<T> {
    /// Walks the whole tree checking sizes, weight balance and ordering. Returns the height.
    pub(crate) fn check_invariants<C: Comparator<T>>(&self, cmp: &C) -> usize {
        fn walk<T, C: Comparator<T>>(
            tree: &RawOrderedSet<T>,
            cmp: &C,
            link: Option<Handle>,
            low: Option<&T>,
            high: Option<&T>,
        ) -> (usize, usize) {
            let Some(h) = link else {
                return (0, 0);
            };
            let node = tree.nodes.get(h);
            if let Some(low) = low {
                assert_eq!(cmp.compare(node.value(), low), Greater, "order violated on the left bound");
            }
            if let Some(high) = high {
                assert_eq!(cmp.compare(node.value(), high), Less, "order violated on the right bound");
            }
            let (ls, lh) = walk(tree, cmp, node.left(), low, Some(node.value()));
            let (rs, rh) = walk(tree, cmp, node.right(), Some(node.value()), high);
            assert_eq!(node.size(), ls + rs + 1, "subtree size out of date");
            assert!(DELTA * (ls + 1) >= rs + 1, "right subtree too heavy ({ls} vs {rs})");
            assert!(DELTA * (rs + 1) >= ls + 1, "left subtree too heavy ({ls} vs {rs})");
            (node.size(), 1 + lh.max(rh))
        }

        let (size, height) = walk(self, cmp, self.root, None, None);
        assert_eq!(size, self.nodes.len(), "arena holds unreachable nodes");
        height
    }
}
