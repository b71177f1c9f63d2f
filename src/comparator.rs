//! Per-container ordering.
//!
//! Every ordered container in this crate is parameterised by a [`Comparator`] chosen when the
//! container is built. The comparator is part of the container's type, so two sets over the
//! same element type but different orders cannot be confused.

use core::borrow::Borrow;
use core::cmp::Ordering;

/// A total order over `T`, optionally able to place a probe of type `Q` within that order.
///
/// `compare(probe, element)` returns where `probe` falls relative to `element`. With `Q = T`
/// this is an ordinary three-way comparison. A separate `Q` lets a container be searched by a
/// partial key (for example a date bound) without building a full element.
///
/// The order must be total and must not change while any element is stored. The probe order
/// must be consistent with the element order: if `probe < a` and `a <= b` then `probe < b`.
///
/// # Examples
///
/// ```
/// use core::cmp::Ordering;
/// use wabi_monitor::{Comparator, OrderedSet};
///
/// // Closures work as comparators.
/// let mut set = OrderedSet::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// set.insert(1);
/// set.insert(3);
/// set.insert(2);
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [3, 2, 1]);
/// ```
pub trait Comparator<T: ?Sized, Q: ?Sized = T> {
    /// Orders `probe` relative to `element`.
    fn compare(&self, probe: &Q, element: &T) -> Ordering;
}

/// The order given by [`Ord`].
///
/// Like the standard collections, a container using `Natural` can be searched by any `Q`
/// that its elements [`Borrow`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Natural;

impl<T, Q> Comparator<T, Q> for Natural
where
    T: Borrow<Q> + ?Sized,
    Q: Ord + ?Sized,
{
    #[inline]
    fn compare(&self, probe: &Q, element: &T) -> Ordering {
        probe.cmp(element.borrow())
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, probe: &T, element: &T) -> Ordering {
        self(probe, element)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn natural_borrows() {
        let s = String::from("b");
        assert_eq!(Comparator::<String, str>::compare(&Natural, "a", &s), Ordering::Less);
        assert_eq!(Comparator::<String, str>::compare(&Natural, "b", &s), Ordering::Equal);
    }

    #[test]
    fn closure_comparator() {
        let reverse = |a: &u8, b: &u8| b.cmp(a);
        assert_eq!(reverse.compare(&1, &2), Ordering::Greater);
    }
}
