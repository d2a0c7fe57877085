#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors reported by the scoped-state accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The ambient form was called with nothing on the render stack.
    ///
    /// Scoped state is only reachable from template helpers, hooks, or event
    /// handlers; outside those, pass a view handle to the `_in` variants.
    #[error("no current view: call from a template helper, hook, or event, or pass a view handle explicitly")]
    NoCurrentView,

    /// The key's cell was created with a different value type.
    ///
    /// The first access for a key fixes its cell's type for the lifetime of
    /// the owning view.
    #[error("scoped key {key:?} holds a {found} cell, requested {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}
