#![forbid(unsafe_code)]

//! Explicitly threaded "current view" state.
//!
//! [`RenderContext`] replaces the ambient current-view pointer some host
//! frameworks expose as process-wide state: the host integration layer owns
//! one per logical render thread, pushes a view with
//! [`enter`](RenderContext::enter) around each helper/hook/event invocation,
//! and passes the context into any code that wants ambient-style access.
//! The returned [`ViewGuard`] pops on drop, so the stack cannot leak
//! entries across a panic or early return.

use std::cell::RefCell;

use tracing::trace;

use crate::view::View;

/// Stack of views currently being rendered, innermost last.
#[derive(Debug, Default)]
pub struct RenderContext {
    stack: RefCell<Vec<View>>,
}

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The innermost view being rendered, if any.
    #[must_use]
    pub fn current(&self) -> Option<View> {
        self.stack.borrow().last().cloned()
    }

    /// Nesting depth of the render stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.borrow().len()
    }

    /// Make `view` the current view until the returned guard drops.
    ///
    /// Guards nest and must drop innermost-first (the natural order for
    /// stack-local guards).
    #[must_use = "the view is only current while the guard is alive"]
    pub fn enter(&self, view: View) -> ViewGuard<'_> {
        trace!(view = %view.name(), depth = self.depth(), "entered view");
        self.stack.borrow_mut().push(view);
        ViewGuard { cx: self }
    }
}

/// RAII guard returned by [`RenderContext::enter`]; pops the view on drop.
#[derive(Debug)]
pub struct ViewGuard<'a> {
    cx: &'a RenderContext,
}

impl Drop for ViewGuard<'_> {
    fn drop(&mut self) {
        self.cx.stack.borrow_mut().pop();
    }
}
