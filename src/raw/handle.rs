use core::num::NonZero;
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Index of a slot inside an [`Arena`](super::arena::Arena).
///
/// Stored with a `+1` bias so that `Option<Handle>` costs nothing extra; tree links are
/// `Option<Handle>` everywhere.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        // `index + 1` cannot be zero and cannot overflow.
        #[allow(clippy::cast_possible_truncation)]
        Self(NonZero::new((index + 1) as RawHandle).unwrap())
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Identifies the arena a handle was issued by.
///
/// Every arena draws a fresh id at construction, so a handle presented to the wrong
/// container is rejected instead of aliasing an unrelated slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct ArenaId(NonZero<u32>);

static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(1);

impl ArenaId {
    pub(crate) fn fresh() -> Self {
        let id = NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed);
        // Wrapping past `u32::MAX` restarts at 1; ids only need to differ between live arenas.
        Self(NonZero::new(id).unwrap_or(NonZero::<u32>::MIN))
    }
}

/// A slot index qualified by the generation it was allocated in and the arena that owns it.
///
/// This is what the public node handles wrap. A `Key` stays valid until its slot is freed;
/// after that the slot's generation moves on and the key no longer resolves.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Key {
    pub(crate) arena: ArenaId,
    pub(crate) handle: Handle,
    pub(crate) generation: u32,
}
