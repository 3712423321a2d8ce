//! Scope-bounded in-memory cache slot.
//!
//! The slot holds a value only while at least one scope is open. Scopes are
//! opened and closed by guard types (`MatrixCacheScope`, `ModelCacheScope`)
//! whose `Drop` closes the scope, so the slot is emptied on every exit path,
//! including early `?` returns and panics.
//!
//! Not `Sync`: a store with an open scope must not be shared across threads.

use std::cell::{Cell, RefCell};

#[derive(Debug)]
pub(crate) struct ScopedCache<T> {
    depth: Cell<usize>,
    slot: RefCell<Option<T>>,
}

impl<T: Default> ScopedCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            depth: Cell::new(0),
            slot: RefCell::new(None),
        }
    }

    pub(crate) fn open(&self) {
        if self.depth.get() == 0 {
            *self.slot.borrow_mut() = Some(T::default());
        }
        self.depth.set(self.depth.get() + 1);
    }

    /// Close one scope; the outermost close drops the cached value.
    pub(crate) fn close(&self) {
        let depth = self.depth.get().saturating_sub(1);
        self.depth.set(depth);
        if depth == 0 {
            *self.slot.borrow_mut() = None;
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.depth.get() > 0
    }

    /// Read from the slot. `None` when no scope is open.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.slot.borrow().as_ref().map(f)
    }

    /// Mutate the slot. No-op when no scope is open.
    pub(crate) fn update(&self, f: impl FnOnce(&mut T)) {
        if let Some(value) = self.slot.borrow_mut().as_mut() {
            f(value);
        }
    }

    /// Empty the slot without closing the scope.
    pub(crate) fn reset(&self) {
        self.update(|value| *value = T::default());
    }
}
