#![forbid(unsafe_code)]

//! Lazily recomputed values derived from the cells their closure reads.
//!
//! [`Derived<T>`] wraps a compute function and its cached result in shared,
//! reference-counted storage. Dependencies are discovered implicitly: each
//! refresh runs the closure under tracking, so whatever
//! [`ReactiveVar`](crate::ReactiveVar)s (or other `Derived`s) it reads become
//! sources. When any source changes, the cached value is marked dirty and the
//! derived value's own dependents are invalidated; the next read recomputes.
//!
//! # Invariants
//!
//! 1. The compute function runs at most once per dirty cycle (memoization).
//! 2. If no source has changed, `get()` returns the cached value without
//!    recomputing.
//! 3. Version increments by exactly 1 per recomputation.
//! 4. Reading a `Derived` inside a computation registers that computation on
//!    the derived value itself, not on its sources.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::dependency::Dependency;
use crate::tracker::{Computation, autorun};

struct DerivedInner<T> {
    compute: RefCell<Box<dyn FnMut() -> T>>,
    /// Cached result (`None` only before the first refresh).
    cached: RefCell<Option<T>>,
    dirty: Cell<bool>,
    /// Bumped once per recomputation.
    version: Cell<u64>,
    /// Downstream dependents of this derived value.
    dep: Dependency,
    /// One-shot computation watching the sources of the last refresh.
    watcher: RefCell<Option<Computation>>,
}

/// A lazily-evaluated, memoized value derived from reactive cells.
///
/// Cloning a `Derived` creates a new handle to the **same** inner state.
pub struct Derived<T> {
    inner: Rc<DerivedInner<T>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("cached", &self.inner.cached.borrow())
            .field("dirty", &self.inner.dirty.get())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone + 'static> Derived<T> {
    /// Create a derived value. The closure runs lazily, on first read.
    #[must_use]
    pub fn new(compute: impl FnMut() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(DerivedInner {
                compute: RefCell::new(Box::new(compute)),
                cached: RefCell::new(None),
                dirty: Cell::new(true),
                version: Cell::new(0),
                dep: Dependency::new(),
                watcher: RefCell::new(None),
            }),
        }
    }

    /// Current value, recomputing first if any source changed.
    ///
    /// Registers the current computation as a dependent of this derived
    /// value.
    ///
    /// # Panics
    ///
    /// Panics if the compute closure reads this same `Derived` (re-entrant
    /// borrow).
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.dep.depend();
        self.refresh_if_dirty();
        self.inner
            .cached
            .borrow()
            .as_ref()
            .expect("cached is always Some after refresh")
            .clone()
    }

    /// Access the current value by reference without cloning. Refreshes and
    /// registers a dependent like [`get`](Self::get).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.dep.depend();
        self.refresh_if_dirty();
        f(self
            .inner
            .cached
            .borrow()
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    /// Whether the cached value is stale.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Force the next read to recompute. Does not notify dependents.
    pub fn invalidate(&self) {
        self.inner.dirty.set(true);
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    fn refresh_if_dirty(&self) {
        if !self.inner.dirty.get() && self.inner.cached.borrow().is_some() {
            return;
        }
        if let Some(previous) = self.inner.watcher.borrow_mut().take() {
            previous.stop();
        }
        // A one-shot watcher: the first run computes under tracking; the
        // rerun (some source changed) marks dirty, notifies downstream, and
        // retires itself. The next read builds a fresh watcher.
        let weak = Rc::downgrade(&self.inner);
        let watcher = autorun(move |comp| {
            let Some(inner) = weak.upgrade() else {
                comp.stop();
                return;
            };
            if comp.first_run() {
                let value = {
                    let mut compute = inner.compute.borrow_mut();
                    (*compute)()
                };
                *inner.cached.borrow_mut() = Some(value);
                inner.dirty.set(false);
                inner.version.set(inner.version.get() + 1);
            } else {
                inner.dirty.set(true);
                comp.stop();
                inner.dep.changed();
            }
        });
        *self.inner.watcher.borrow_mut() = Some(watcher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReactiveVar;

    #[test]
    fn lazy_first_computation() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let source = ReactiveVar::new(10);
        let source_clone = source.clone();
        let derived = Derived::new(move || {
            count_clone.set(count_clone.get() + 1);
            source_clone.get() * 2
        });

        // Not computed until first read.
        assert_eq!(count.get(), 0);
        assert_eq!(derived.version(), 0);

        assert_eq!(derived.get(), 20);
        assert_eq!(count.get(), 1);
        assert_eq!(derived.version(), 1);
    }

    #[test]
    fn memoized_between_changes() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let source = ReactiveVar::new(10);
        let source_clone = source.clone();
        let derived = Derived::new(move || {
            count_clone.set(count_clone.get() + 1);
            source_clone.get() * 2
        });

        assert_eq!(derived.get(), 20);
        assert_eq!(derived.get(), 20);
        assert_eq!(count.get(), 1);

        source.set(5);
        assert!(derived.is_dirty());
        assert_eq!(derived.get(), 10);
        assert_eq!(count.get(), 2);
        assert_eq!(derived.version(), 2);
    }

    #[test]
    fn equal_source_set_keeps_cache_clean() {
        let source = ReactiveVar::new(3);
        let source_clone = source.clone();
        let derived = Derived::new(move || source_clone.get() + 1);
        assert_eq!(derived.get(), 4);

        source.set(3);
        assert!(!derived.is_dirty());
        assert_eq!(derived.version(), 1);
    }

    #[test]
    fn multiple_sources() {
        let width = ReactiveVar::new(10);
        let height = ReactiveVar::new(20);
        let width_clone = width.clone();
        let height_clone = height.clone();
        let area = Derived::new(move || width_clone.get() * height_clone.get());

        assert_eq!(area.get(), 200);
        width.set(5);
        assert_eq!(area.get(), 100);
        height.set(30);
        assert_eq!(area.get(), 150);
    }

    #[test]
    fn dirtying_notifies_downstream_computations() {
        let source = ReactiveVar::new(1);
        let source_clone = source.clone();
        let derived = Derived::new(move || source_clone.get() * 10);
        let derived_clone = derived.clone();
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let comp = crate::autorun(move |_| {
            seen_clone.set(derived_clone.get());
        });
        assert_eq!(seen.get(), 10);

        source.set(2);
        assert_eq!(seen.get(), 20);
        assert_eq!(comp.run_count(), 2);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let derived = Derived::new(move || {
            count_clone.set(count_clone.get() + 1);
            7
        });
        assert_eq!(derived.get(), 7);
        derived.invalidate();
        assert!(derived.is_dirty());
        assert_eq!(derived.get(), 7);
        assert_eq!(count.get(), 2);
        assert_eq!(derived.version(), 2);
    }

    #[test]
    fn clone_shares_state() {
        let source = ReactiveVar::new(10);
        let source_clone = source.clone();
        let a = Derived::new(move || source_clone.get() + 1);
        let b = a.clone();
        assert_eq!(a.get(), 11);
        assert_eq!(b.get(), 11);
        assert_eq!(b.version(), 1);

        source.set(20);
        assert_eq!(b.get(), 21);
        assert_eq!(a.version(), 2);
    }

    #[test]
    fn chained_derived_values() {
        let base = ReactiveVar::new(2);
        let base_clone = base.clone();
        let doubled = Derived::new(move || base_clone.get() * 2);
        let doubled_clone = doubled.clone();
        let quadrupled = Derived::new(move || doubled_clone.get() * 2);

        assert_eq!(quadrupled.get(), 8);
        base.set(3);
        assert_eq!(quadrupled.get(), 12);
    }

    #[test]
    fn survives_source_drop() {
        let derived;
        {
            let source = ReactiveVar::new(42);
            let source_clone = source.clone();
            derived = Derived::new(move || source_clone.get());
            assert_eq!(derived.get(), 42);
        }
        // The closure keeps its captured handle alive; the value persists.
        assert_eq!(derived.get(), 42);
        assert!(!derived.is_dirty());
    }

    #[test]
    fn with_avoids_clone() {
        let source = ReactiveVar::new(vec![1, 2, 3]);
        let source_clone = source.clone();
        let derived = Derived::new(move || source_clone.with(|v| v.iter().sum::<i32>()));
        assert_eq!(derived.with(|sum| *sum), 6);
    }

    #[test]
    fn debug_format() {
        let derived = Derived::new(|| 42);
        let _ = derived.get();
        let rendered = format!("{derived:?}");
        assert!(rendered.contains("Derived"));
        assert!(rendered.contains("42"));
    }
}
