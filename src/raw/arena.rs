use super::handle::{ArenaId, Handle, Key};

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    element: Option<T>,
}

/// Slot storage with free-list reuse and per-slot generations.
///
/// Internal links use bare [`Handle`]s and panic on a dead slot, because a dead link is a
/// bug in the owning structure. Caller-facing lookups go through [`Key`] and return `None`
/// instead.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    id: ArenaId,
    slots: Vec<Slot<T>>,
    free: Vec<Handle>,
}

// A clone is a different container: keys issued by `self` must not resolve in it.
impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        Self {
            id: ArenaId::fresh(),
            slots: self.slots.clone(),
            free: self.free.clone(),
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            id: ArenaId::fresh(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            id: ArenaId::fresh(),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            let slot = &mut self.slots[h.to_index()];
            debug_assert!(slot.element.is_none(), "`Arena::alloc()` - free slot is occupied!");
            slot.element = Some(element);
            h
        } else {
            assert!(
                self.slots.len() <= Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX + 1
            );
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            Handle::from_index(self.slots.len() - 1)
        }
    }

    /// Qualifies a live handle with its current generation.
    pub(crate) fn key(&self, handle: Handle) -> Key {
        let slot = &self.slots[handle.to_index()];
        debug_assert!(slot.element.is_some(), "`Arena::key()` - `handle` is invalid!");
        Key {
            arena: self.id,
            handle,
            generation: slot.generation,
        }
    }

    /// Resolves a key back to its handle if the slot still holds the same allocation.
    pub(crate) fn resolve(&self, key: Key) -> Option<Handle> {
        if key.arena != self.id {
            return None;
        }
        let slot = self.slots.get(key.handle.to_index())?;
        (slot.generation == key.generation && slot.element.is_some()).then_some(key.handle)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].element.as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].element.as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let slot = &mut self.slots[handle.to_index()];
        let element = slot.element.take().expect("`Arena::take()` - `handle` is invalid!");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle);
        element
    }

    /// Drops every element. Outstanding keys are invalidated because the id changes.
    pub(crate) fn clear(&mut self) {
        self.id = ArenaId::fresh();
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: Arena<u32> = Arena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    #[test]
    fn freed_key_is_stale_after_reuse() {
        let mut arena = Arena::new();
        let first = arena.alloc(1u32);
        let key = arena.key(first);
        assert_eq!(arena.take(first), 1);

        let second = arena.alloc(2u32);
        assert_eq!(first, second, "slot should be reused");
        assert_eq!(arena.resolve(key), None);
        assert_eq!(arena.resolve(arena.key(second)), Some(second));
    }

    #[test]
    fn foreign_key_is_rejected() {
        let mut a = Arena::new();
        let mut b = Arena::new();
        let ha = a.alloc(1u32);
        let _ = b.alloc(1u32);
        assert_eq!(b.resolve(a.key(ha)), None);
    }

    #[test]
    fn clear_invalidates_keys() {
        let mut arena = Arena::new();
        let h = arena.alloc(7u32);
        let key = arena.key(h);
        arena.clear();
        let h = arena.alloc(8u32);
        assert_eq!(arena.resolve(key), None);
        assert_eq!(*arena.get(h), 8);
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Key, u32)> = Vec::new();
            let mut dead: Vec<Key> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let handle = arena.alloc(value);
                        model.push((arena.key(handle), value));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = arena.resolve(model[index].0).unwrap();
                        *arena.get_mut(handle) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let (key, expected) = model.swap_remove(index);
                        let handle = arena.resolve(key).unwrap();
                        prop_assert_eq!(arena.take(handle), expected);
                        dead.push(key);
                    }
                    Operation::Clear => {
                        arena.clear();
                        dead.extend(model.drain(..).map(|(key, _)| key));
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(key, value) in &model {
                    let handle = arena.resolve(key);
                    prop_assert!(handle.is_some());
                    prop_assert_eq!(*arena.get(handle.unwrap()), value);
                }
                for &key in &dead {
                    prop_assert_eq!(arena.resolve(key), None);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        GetMut(usize, u32),
        Take(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            10 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}
