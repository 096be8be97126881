use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage for tree nodes. Freed slots are recycled before the vector grows.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Number of live elements.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() < Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({})",
                Handle::MAX
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Borrows two distinct live elements mutably at once.
    pub(crate) fn get_pair_mut(&mut self, a: Handle, b: Handle) -> (&mut T, &mut T) {
        let (i, j) = (a.to_index(), b.to_index());
        assert_ne!(i, j, "`Arena::get_pair_mut()` - handles must differ!");
        let (first, second) = if i < j {
            let (lo, hi) = self.slots.split_at_mut(j);
            (&mut lo[i], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(i);
            (&mut hi[0], &mut lo[j])
        };
        (
            first.as_mut().expect("`Arena::get_pair_mut()` - `a` is invalid!"),
            second.as_mut().expect("`Arena::get_pair_mut()` - `b` is invalid!"),
        )
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    pub(crate) fn clear(&mut self) {
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
    fn arena_reuses_freed_slots() {
        let mut arena: Arena<&str> = Arena::with_capacity(4);
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        arena.free(a);
        assert_eq!(arena.len(), 1);
        let c = arena.alloc("c");
        assert_eq!(c, a);
        assert_eq!(*arena.get(b), "b");
        assert_eq!(*arena.get(c), "c");
    }

    #[test]
    fn pair_mut_swaps_in_both_orders() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);

        let (x, y) = arena.get_pair_mut(a, b);
        core::mem::swap(x, y);
        assert_eq!((*arena.get(a), *arena.get(b)), (2, 1));

        let (y, x) = arena.get_pair_mut(b, a);
        *y += 10;
        *x += 20;
        assert_eq!((*arena.get(a), *arena.get(b)), (22, 11));
    }

    #[test]
    #[should_panic(expected = "`Arena::get_pair_mut()` - handles must differ!")]
    fn pair_mut_rejects_aliasing() {
        let mut arena: Arena<u32> = Arena::new();
        let a = arena.alloc(1);
        let _ = arena.get_pair_mut(a, a);
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let handle = arena.alloc(value);
                        model.push((handle, value));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        *arena.get_mut(model[index].0) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let value = arena.take(model[index].0);
                        let (_, expected) = model.swap_remove(index);
                        prop_assert_eq!(value, expected);
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, value) in &model {
                    prop_assert_eq!(*arena.get(handle), value);
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
            5 => any::<usize>().prop_map(Operation::Take),
            1 => Just(Operation::Clear),
        ]
    }
}
