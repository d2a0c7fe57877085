#![forbid(unsafe_code)]

//! Dependency sets linking reactive cells to the computations that read them.
//!
//! A [`Dependency`] is the notification half of a reactive cell: reads call
//! [`depend`](Dependency::depend) to register the current computation, writes
//! call [`changed`](Dependency::changed) to invalidate every registered one.
//!
//! Dependents are stored as weak references keyed by computation id, and each
//! registration unlinks itself through the computation's next invalidation
//! hook, so a rerun rebuilds the set from the reads it actually performs.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use crate::tracker::{Computation, ComputationInner, current_computation};

type DependentMap = AHashMap<u64, Weak<ComputationInner>>;

/// A set of computations to invalidate when the owning value changes.
pub struct Dependency {
    dependents: Rc<RefCell<DependentMap>>,
}

impl Default for Dependency {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("dependents", &self.dependents.borrow().len())
            .finish()
    }
}

impl Dependency {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dependents: Rc::new(RefCell::new(AHashMap::new())),
        }
    }

    /// Register the innermost running computation as a dependent.
    ///
    /// Returns `true` if a computation was newly registered, `false` when no
    /// computation is running, tracking is suspended, or it was already
    /// registered this cycle. The registration removes itself when the
    /// computation is next invalidated.
    pub fn depend(&self) -> bool {
        let Some(comp) = current_computation() else {
            return false;
        };
        let id = comp.id();
        {
            let mut dependents = self.dependents.borrow_mut();
            if dependents.contains_key(&id) {
                return false;
            }
            dependents.insert(id, comp.downgrade());
        }
        let slot = Rc::downgrade(&self.dependents);
        comp.on_invalidate(move |_| {
            if let Some(dependents) = slot.upgrade() {
                dependents.borrow_mut().remove(&id);
            }
        });
        true
    }

    /// Invalidate every currently registered dependent.
    ///
    /// Operates on a snapshot: the self-unlinking triggered by each
    /// invalidation mutates the live set without disturbing the iteration.
    pub fn changed(&self) {
        let snapshot: Vec<Rc<ComputationInner>> = self
            .dependents
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .collect();
        for inner in snapshot {
            Computation::from_inner(inner).invalidate();
        }
    }

    /// Whether any live computation currently depends on this value.
    #[must_use]
    pub fn has_dependents(&self) -> bool {
        self.dependents
            .borrow()
            .values()
            .any(|weak| weak.strong_count() > 0)
    }
}
