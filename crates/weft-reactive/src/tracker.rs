#![forbid(unsafe_code)]

//! Computation tracking and the flush cycle.
//!
//! A [`Computation`] is a unit of reactive work created by [`autorun`]. While
//! its closure runs, every [`ReactiveVar`](crate::ReactiveVar) it reads
//! registers the computation as a dependent. When any of those cells later
//! changes, the computation is invalidated and queued; the flush cycle reruns
//! it, re-establishing its dependencies from scratch.
//!
//! # Scheduling
//!
//! The queue drains synchronously from the outermost write: a `set` that
//! happens outside any computation runs every invalidated computation before
//! it returns. Writes made *during* a rerun defer to the already-draining
//! loop, so reruns never nest. Hosts that want an explicit pump can call
//! [`flush`] themselves.
//!
//! # Invariants
//!
//! 1. Exactly one computation is "current" at any point inside a running
//!    closure: the innermost one.
//! 2. Invalidation is idempotent per cycle: between two reruns, extra
//!    invalidations are no-ops.
//! 3. `on_invalidate` hooks fire exactly once per invalidation, before the
//!    rerun, and must be re-registered by the rerun if still wanted.
//! 4. A stopped computation never runs again; dropping the last handle
//!    detaches it (dependents hold only weak references).

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

// ─── Computation ID generation ───────────────────────────────────────────────

static NEXT_COMPUTATION_ID: AtomicU64 = AtomicU64::new(1);

fn next_computation_id() -> u64 {
    NEXT_COMPUTATION_ID.fetch_add(1, Ordering::Relaxed)
}

// ─── Thread-local tracker ────────────────────────────────────────────────────

thread_local! {
    static TRACKER: Tracker = Tracker::default();
}

#[derive(Default)]
struct Tracker {
    /// Stack of running computations, innermost last.
    active: RefCell<Vec<Weak<ComputationInner>>>,
    /// Invalidated computations awaiting rerun, in invalidation order.
    pending: RefCell<VecDeque<Rc<ComputationInner>>>,
    /// Whether the pending queue is currently draining.
    flushing: Cell<bool>,
    /// Depth of nested [`untrack`] calls; reads register nothing while > 0.
    suspended: Cell<u32>,
}

impl Tracker {
    fn schedule(&self, inner: Rc<ComputationInner>) {
        self.pending.borrow_mut().push_back(inner);
        if !self.flushing.get() && self.active.borrow().is_empty() {
            self.drain();
        }
    }

    fn drain(&self) {
        self.flushing.set(true);
        let mut reran = 0u64;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(inner) = next else { break };
            if inner.stopped.get() || !inner.invalidated.get() {
                continue;
            }
            Computation { inner }.run();
            reran += 1;
        }
        self.flushing.set(false);
        if reran > 0 {
            trace!(reran, "flush drained");
        }
    }
}

/// Pops the active stack (and restores the `untrack` depth) even if the
/// computation body panics.
struct ActiveGuard {
    saved_suspended: u32,
}

impl ActiveGuard {
    fn push(weak: Weak<ComputationInner>) -> Self {
        TRACKER.with(|t| {
            t.active.borrow_mut().push(weak);
            let saved_suspended = t.suspended.get();
            // A computation body tracks its reads even when the autorun call
            // itself sits inside an `untrack` block.
            t.suspended.set(0);
            Self { saved_suspended }
        })
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        TRACKER.with(|t| {
            t.active.borrow_mut().pop();
            t.suspended.set(self.saved_suspended);
        });
    }
}

// ─── Computation ─────────────────────────────────────────────────────────────

pub(crate) struct ComputationInner {
    id: u64,
    stopped: Cell<bool>,
    invalidated: Cell<bool>,
    first_run: Cell<bool>,
    run_count: Cell<u64>,
    /// The body. `None` once stopped (captures are released) or while running.
    func: RefCell<Option<Box<dyn FnMut(&Computation)>>>,
    /// Hooks fired once on the next invalidation, then drained.
    on_invalidate: RefCell<Vec<Box<dyn FnOnce(&Computation)>>>,
}

/// Handle to a reactive computation created by [`autorun`].
///
/// Cloning creates another handle to the **same** computation. The
/// computation stays live while at least one handle (or the pending queue)
/// holds it; dependents only hold weak references, so dropping the last
/// handle detaches it.
pub struct Computation {
    inner: Rc<ComputationInner>,
}

impl Clone for Computation {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("id", &self.inner.id)
            .field("stopped", &self.inner.stopped.get())
            .field("invalidated", &self.inner.invalidated.get())
            .field("run_count", &self.inner.run_count.get())
            .finish()
    }
}

impl Computation {
    pub(crate) fn from_inner(inner: Rc<ComputationInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ComputationInner> {
        Rc::downgrade(&self.inner)
    }

    /// Unique identifier (for logging and dependent bookkeeping).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Whether the computation is inside its very first run.
    #[must_use]
    pub fn first_run(&self) -> bool {
        self.inner.first_run.get()
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    /// Whether the computation is invalidated and awaiting rerun.
    #[must_use]
    pub fn invalidated(&self) -> bool {
        self.inner.invalidated.get()
    }

    /// Number of completed runs, including the first.
    #[must_use]
    pub fn run_count(&self) -> u64 {
        self.inner.run_count.get()
    }

    /// Mark the computation for rerun at the next flush.
    ///
    /// Fires (and drains) the `on_invalidate` hooks. Idempotent between
    /// reruns; a no-op enqueue on a stopped computation.
    pub fn invalidate(&self) {
        if self.inner.invalidated.get() {
            return;
        }
        self.inner.invalidated.set(true);
        self.fire_invalidate_hooks();
        if !self.inner.stopped.get() {
            trace!(comp_id = self.inner.id, "computation invalidated");
            TRACKER.with(|t| t.schedule(self.inner.clone()));
        }
    }

    /// Permanently deactivate the computation and release its closure.
    ///
    /// Pending invalidation hooks still fire so dependencies unlink.
    pub fn stop(&self) {
        if self.inner.stopped.get() {
            return;
        }
        self.inner.stopped.set(true);
        if !self.inner.invalidated.get() {
            self.inner.invalidated.set(true);
            self.fire_invalidate_hooks();
        }
        self.inner.func.borrow_mut().take();
    }

    /// Register a hook fired once at the next invalidation (or immediately,
    /// if the computation is already invalidated or stopped).
    pub fn on_invalidate(&self, hook: impl FnOnce(&Computation) + 'static) {
        if self.inner.invalidated.get() || self.inner.stopped.get() {
            hook(self);
        } else {
            self.inner.on_invalidate.borrow_mut().push(Box::new(hook));
        }
    }

    fn fire_invalidate_hooks(&self) {
        let hooks = std::mem::take(&mut *self.inner.on_invalidate.borrow_mut());
        for hook in hooks {
            hook(self);
        }
    }

    /// Run the body under tracking. The closure is taken out of its slot for
    /// the duration so a re-entrant `stop` can release it.
    fn run(&self) {
        self.inner.invalidated.set(false);
        let func = self.inner.func.borrow_mut().take();
        let Some(mut func) = func else { return };
        {
            let _active = ActiveGuard::push(Rc::downgrade(&self.inner));
            func(self);
        }
        if !self.inner.stopped.get() {
            *self.inner.func.borrow_mut() = Some(func);
        }
        self.inner.run_count.set(self.inner.run_count.get() + 1);
    }
}

// ─── Public entry points ─────────────────────────────────────────────────────

/// Run `body` now and rerun it whenever a reactive cell it read changes.
///
/// The closure receives the [`Computation`] handle, letting it observe
/// [`first_run`](Computation::first_run) or [`stop`](Computation::stop)
/// itself.
#[must_use = "dropping the last handle detaches the computation"]
pub fn autorun(body: impl FnMut(&Computation) + 'static) -> Computation {
    let comp = Computation {
        inner: Rc::new(ComputationInner {
            id: next_computation_id(),
            stopped: Cell::new(false),
            invalidated: Cell::new(false),
            first_run: Cell::new(true),
            run_count: Cell::new(0),
            func: RefCell::new(Some(Box::new(body))),
            on_invalidate: RefCell::new(Vec::new()),
        }),
    };
    comp.run();
    comp.inner.first_run.set(false);
    comp
}

/// Run `f` with dependency registration suspended.
///
/// Reads inside `f` register nothing on the current computation. Nested
/// [`autorun`] calls still track their own bodies.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    struct SuspendGuard;
    impl Drop for SuspendGuard {
        fn drop(&mut self) {
            TRACKER.with(|t| t.suspended.set(t.suspended.get() - 1));
        }
    }
    TRACKER.with(|t| t.suspended.set(t.suspended.get() + 1));
    let _guard = SuspendGuard;
    f()
}

/// The innermost running computation, unless tracking is suspended.
pub(crate) fn current_computation() -> Option<Computation> {
    TRACKER.with(|t| {
        if t.suspended.get() > 0 {
            return None;
        }
        t.active
            .borrow()
            .last()
            .and_then(Weak::upgrade)
            .map(Computation::from_inner)
    })
}

/// Whether a read at this point would register a dependency.
#[must_use]
pub fn is_tracking() -> bool {
    current_computation().is_some()
}

/// Rerun every invalidated computation now.
///
/// Hosts normally never need this (writes flush on their own); it exists for
/// event loops that batch work and for tests. Calling it from inside a
/// computation or a running flush is misuse and is reported, not honored.
pub fn flush() -> Result<(), FlushError> {
    TRACKER.with(|t| {
        if t.flushing.get() {
            warn!("flush requested while already flushing");
            return Err(FlushError::AlreadyFlushing);
        }
        if !t.active.borrow().is_empty() {
            warn!("flush requested from inside a computation");
            return Err(FlushError::InComputation);
        }
        t.drain();
        Ok(())
    })
}

// ─── FlushError ──────────────────────────────────────────────────────────────

/// Error returned when [`flush`] is called at an illegal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushError {
    /// Called from inside a running computation.
    InComputation,
    /// Called while a flush is already draining.
    AlreadyFlushing,
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InComputation => write!(f, "cannot flush inside a computation"),
            Self::AlreadyFlushing => write!(f, "flush already in progress"),
        }
    }
}

impl std::error::Error for FlushError {}

// ─── Tests ───────────────────────────────────────────────────────────────────
