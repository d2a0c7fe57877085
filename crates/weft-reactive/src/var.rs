#![forbid(unsafe_code)]

//! Reactive cells with dependency registration on read.
//!
//! [`ReactiveVar<T>`] holds one value in shared, reference-counted storage.
//! Reading it inside a computation registers that computation as a dependent;
//! writing a *different* value invalidates every dependent. Equality is the
//! cell's notification gate: writing an equal value is a complete no-op.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Setting a value equal to the current value is a no-op (no version
//!    bump, no invalidations).
//! 3. `get`/`with` register the current computation; `get_untracked` never
//!    does.
//! 4. Cloning a handle shares the same cell.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::dependency::Dependency;

struct VarInner<T> {
    value: RefCell<T>,
    /// Monotonically increasing, bumped on each value-changing set.
    version: Cell<u64>,
    dep: Dependency,
}

/// A shared reactive cell.
///
/// Cloning a `ReactiveVar` creates a new handle to the **same** cell.
pub struct ReactiveVar<T> {
    inner: Rc<VarInner<T>>,
}

impl<T> Clone for ReactiveVar<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveVar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveVar")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReactiveVar<T> {
    /// Create a cell holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(VarInner {
                value: RefCell::new(initial),
                version: Cell::new(0),
                dep: Dependency::new(),
            }),
        }
    }

    /// Read the value, registering the current computation as a dependent.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.dep.depend();
        self.inner.value.borrow().clone()
    }

    /// Read the value without registering anything.
    #[must_use]
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the value by reference without cloning. Registers a dependent.
    ///
    /// # Panics
    ///
    /// Panics if the closure writes this same cell (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.dep.depend();
        f(&self.inner.value.borrow())
    }

    /// Write a value. Invalidates dependents only when it differs from the
    /// current one under `PartialEq`.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
            self.inner.version.set(self.inner.version.get() + 1);
        }
        // The borrow is released before notifying: dependents rerun
        // synchronously and will read this cell.
        self.inner.dep.changed();
    }

    /// Mutate a copy of the value and write it back through [`set`](Self::set),
    /// so the equality gate still applies.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get_untracked();
        f(&mut next);
        self.set(next);
    }

    /// Number of value-changing sets so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether any live computation currently depends on this cell.
    #[must_use]
    pub fn has_dependents(&self) -> bool {
        self.inner.dep.has_dependents()
    }
}
