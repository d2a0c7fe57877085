#![forbid(unsafe_code)]

//! Single-threaded reactive substrate for weft.
//!
//! This crate provides the change-tracking primitives the scoped-state layer
//! builds on:
//!
//! - [`ReactiveVar`]: a shared, version-tracked cell that registers the
//!   reading computation as a dependent and invalidates dependents on
//!   value-changing writes.
//! - [`Computation`] / [`autorun`]: a unit of reactive work that reruns when
//!   any cell it read changes.
//! - [`Derived`]: a lazily-evaluated, memoized value whose sources are
//!   discovered implicitly by running its closure under tracking.
//! - [`untrack`] / [`flush`]: escape hatches for non-reactive reads and
//!   explicit queue pumping.
//!
//! # Architecture
//!
//! Everything is `Rc`/`RefCell`/`Cell`: execution is single-threaded and
//! render-driven, so no locks exist anywhere. The tracker (current
//! computation stack, pending queue) is thread-local. Dependents are stored
//! as `Weak` references keyed by computation id and unlink themselves on
//! invalidation.
//!
//! # Invariants
//!
//! 1. A cell's version increments exactly once per value-changing write.
//! 2. Writing an equal value is a no-op: no version bump, no invalidations.
//! 3. A read inside a computation registers exactly the innermost one.
//! 4. The flush queue drains synchronously from the outermost write; writes
//!    during a rerun defer to the already-draining loop.
//! 5. `Derived::get()` recomputes at most once per dirty cycle.

pub mod dependency;
pub mod derived;
pub mod tracker;
pub mod var;

pub use dependency::Dependency;
pub use derived::Derived;
pub use tracker::{Computation, FlushError, autorun, flush, is_tracking, untrack};
pub use var::ReactiveVar;
