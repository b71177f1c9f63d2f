use super::handle::Handle;

/// A node of the weight-balanced tree.
///
/// Nodes never move between arena slots; rotations only rewrite links. That keeps a
/// [`SetNode`](crate::SetNode) pointing at the same element for as long as it is stored.
#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    value: T,
    left: Option<Handle>,
    right: Option<Handle>,
    // Number of elements in the subtree rooted here, this node included.
    size: usize,
}

impl<T> Node<T> {
    /// Creates a detached node holding `value`.
    pub(crate) fn leaf(value: T) -> Self {
        Self {
            value,
            left: None,
            right: None,
            size: 1,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub(crate) fn into_value(self) -> T {
        self.value
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<Handle> {
        self.left
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<Handle> {
        self.right
    }

    pub(crate) fn set_left(&mut self, left: Option<Handle>) {
        self.left = left;
    }

    pub(crate) fn set_right(&mut self, right: Option<Handle>) {
        self.right = right;
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.size = size;
    }
}
