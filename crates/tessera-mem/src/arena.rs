//! Typed, append-only arenas addressed by 32-bit indices.
//!
//! An [`Arena<T>`] owns every `T` allocated into it; callers hold [`Idx<T>`]
//! handles instead of references, which keeps graphs of types, variables and
//! lifetimes free of borrow entanglement. Nothing is freed individually: the
//! whole arena is dropped with its owner.
//!
//! ```
//! use tessera_mem::Arena;
//!
//! let mut arena = Arena::new();
//! let a = arena.alloc("first");
//! let b = arena.alloc("second");
//!
//! assert_eq!(arena[a], "first");
//! assert_eq!(arena[b], "second");
//! assert_eq!(arena.len(), 2);
//! ```
//!
//! Running out of index space is unrecoverable: [`Arena::alloc`] logs and
//! aborts the process, like a failed heap allocation would.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Allocation failure: the arena's 32-bit index space is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaAllocError;

impl fmt::Display for ArenaAllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "arena allocation failed: index space exhausted")
    }
}

impl std::error::Error for ArenaAllocError {}

/// Handle to a value stored in an [`Arena<T>`].
pub struct Idx<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    /// Builds a handle from a raw index. Only meaningful for the arena that issued it.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Raw index.
    #[must_use]
    pub const fn into_raw(self) -> u32 {
        self.raw
    }

    /// Raw index as `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

// Manual impls: derives would add `T: Clone` etc. bounds.
impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> PartialOrd for Idx<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Idx<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for Idx<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        write!(f, "Idx::<{short}>({})", self.raw)
    }
}

/// Append-only typed storage.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates an empty arena with room for `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Stores `value`, or reports that the index space is exhausted.
    pub fn try_alloc(&mut self, value: T) -> Result<Idx<T>, ArenaAllocError> {
        let raw = u32::try_from(self.items.len()).map_err(|_| ArenaAllocError)?;
        if raw == u32::MAX {
            return Err(ArenaAllocError);
        }
        self.items.push(value);
        Ok(Idx::from_raw(raw))
    }

    /// Stores `value` and returns its handle.
    ///
    /// Exhausting the arena is fatal: the failure is logged and the process aborts.
    pub fn alloc(&mut self, value: T) -> Idx<T> {
        match self.try_alloc(value) {
            Ok(idx) => idx,
            Err(err) => {
                tessera_log::error!("{err} ({} items)", self.items.len());
                std::process::abort()
            }
        }
    }

    /// Shared access, `None` for a foreign handle.
    #[must_use]
    pub fn get(&self, idx: Idx<T>) -> Option<&T> {
        self.items.get(idx.index())
    }

    /// Mutable access, `None` for a foreign handle.
    pub fn get_mut(&mut self, idx: Idx<T>) -> Option<&mut T> {
        self.items.get_mut(idx.index())
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle that the next allocation will receive.
    #[must_use]
    pub fn next_idx(&self) -> Idx<T> {
        Idx::from_raw(self.items.len() as u32)
    }

    /// Iterates `(handle, value)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Idx<T>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Idx::from_raw(i as u32), item))
    }

    /// Drops every item allocated at or after `len`.
    ///
    /// Used to discard speculative allocations; handles issued past `len`
    /// become dangling and must not be used again.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Idx<T>> for Arena<T> {
    type Output = T;

    fn index(&self, idx: Idx<T>) -> &T {
        &self.items[idx.index()]
    }
}

impl<T> IndexMut<Idx<T>> for Arena<T> {
    fn index_mut(&mut self, idx: Idx<T>) -> &mut T {
        &mut self.items[idx.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_index() {
        let mut arena = Arena::new();
        let a = arena.alloc(1u32);
        let b = arena.alloc(2u32);

        assert_eq!(a.into_raw(), 0);
        assert_eq!(b.into_raw(), 1);
        assert_eq!(arena[a], 1);
        assert_eq!(arena[b], 2);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = Arena::new();
        let a = arena.alloc(String::from("x"));
        arena.get_mut(a).unwrap().push('y');
        assert_eq!(arena[a], "xy");
    }

    #[test]
    fn test_foreign_handle() {
        let arena: Arena<u8> = Arena::new();
        assert!(arena.get(Idx::from_raw(5)).is_none());
    }

    #[test]
    fn test_iter_order() {
        let mut arena = Arena::with_capacity(3);
        for v in ["a", "b", "c"] {
            arena.alloc(v);
        }
        let collected: Vec<_> = arena.iter().map(|(i, v)| (i.index(), *v)).collect();
        assert_eq!(collected, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_truncate_and_next_idx() {
        let mut arena = Arena::new();
        arena.alloc(10);
        let mark = arena.len();
        arena.alloc(20);
        arena.alloc(30);
        arena.truncate(mark);

        assert_eq!(arena.len(), 1);
        assert_eq!(arena.next_idx().index(), 1);
    }

    #[test]
    fn test_idx_is_copy_without_t_copy() {
        struct NotCopy;
        let mut arena = Arena::new();
        let idx = arena.alloc(NotCopy);
        let copy = idx;
        assert_eq!(idx, copy);
        assert!(format!("{idx:?}").contains("NotCopy"));
    }
}
