#![forbid(unsafe_code)]

//! weft: per-template reactive session state for view trees.
//!
//! Template helpers, hooks, and event handlers often need a little state
//! that belongs to one rendered template instance: which row is selected,
//! whether a panel is expanded. weft attaches a lazily created store of
//! reactive cells to the nearest enclosing template view and exposes
//! `get`/`set` accessors over it; helpers that read a key rerun
//! automatically when the key changes.
//!
//! # Example
//!
//! ```
//! use weft::prelude::*;
//!
//! let page = View::root(ViewName::template("page"));
//! let row = page.child(ViewName::Each).child(ViewName::EachItem);
//!
//! let cx = RenderContext::new();
//! let _guard = cx.enter(row);
//!
//! // Stored on the `page` template view, not on the wrapper rows.
//! weft::session::set(&cx, "selected", 3u32)?;
//! assert_eq!(weft::session::get::<u32>(&cx, "selected")?, Some(3));
//! # Ok::<(), weft::SessionError>(())
//! ```

pub mod error;
pub mod session;

pub use error::{Result, SessionError};

pub use weft_reactive as reactive;
pub use weft_view as view;

pub mod prelude {
    pub use crate::error::SessionError;
    pub use crate::session;
    pub use weft_reactive::{Derived, ReactiveVar, autorun, flush, untrack};
    pub use weft_view::{RenderContext, View, ViewName};
}
