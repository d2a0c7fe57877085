#![forbid(unsafe_code)]

//! Per-template reactive session state.
//!
//! Each template view owns a lazily created store mapping property names to
//! reactive cells. Helpers, hooks, and event handlers read and write those
//! cells through this module; a helper that read a key reruns automatically
//! when the key is written with a different value.
//!
//! Calls made from a control-flow wrapper (`#if`, `#each`, ...) resolve to
//! the nearest enclosing template view, so a helper and the event handler of
//! an item it renders share one store. Property names are free-form; the
//! `template-name->property` convention some codebases use is documentation
//! only and not enforced.
//!
//! Two calling conventions, selected at the call site:
//!
//! - [`get`] / [`set`] take the host's [`RenderContext`] and use its current
//!   view, failing with [`SessionError::NoCurrentView`] outside a render.
//! - [`get_in`] / [`set_in`] take an explicit [`View`] handle.
//!
//! State is not preserved across view teardown: the store lives and dies
//! with its owning view.

use std::any::{Any, type_name};
use std::cell::RefCell;

use ahash::AHashMap;
use tracing::trace;
use weft_reactive::ReactiveVar;
use weft_view::{RenderContext, View};

use crate::error::{Result, SessionError};

/// Slot key under which the store hangs off its owning view.
const STORE_SLOT: &str = "weft.session";

/// Property name → typed reactive cell.
#[derive(Default)]
struct ScopedStore {
    cells: RefCell<AHashMap<String, StoredCell>>,
}

struct StoredCell {
    /// Value type the cell was created with, for mismatch reporting.
    value_type: &'static str,
    /// A `ReactiveVar<Option<T>>` behind `Any`.
    cell: Box<dyn Any>,
}

/// Resolve the owning template view and the named cell, creating store and
/// cell on first use.
///
/// The cell is seeded with `seed` only when it does not exist yet: `None` on
/// the read path, the written value on the write path (so creation never
/// notifies anyone).
fn cell_for<T: Clone + PartialEq + 'static>(
    view: &View,
    key: &str,
    seed: Option<T>,
) -> Result<ReactiveVar<Option<T>>> {
    let owner = view.nearest_template();
    let store = owner.slot_or_insert_with(STORE_SLOT, ScopedStore::default);
    let mut cells = store.cells.borrow_mut();
    if let Some(stored) = cells.get(key) {
        return stored
            .cell
            .downcast_ref::<ReactiveVar<Option<T>>>()
            .cloned()
            .ok_or_else(|| SessionError::TypeMismatch {
                key: key.to_owned(),
                expected: type_name::<T>(),
                found: stored.value_type,
            });
    }
    let cell = ReactiveVar::new(seed);
    cells.insert(
        key.to_owned(),
        StoredCell {
            value_type: type_name::<T>(),
            cell: Box::new(cell.clone()),
        },
    );
    trace!(view = %owner.name(), key, value_type = type_name::<T>(), "created scoped cell");
    Ok(cell)
}

/// Read `key` from the current view's template scope.
///
/// Registers the calling computation as a dependent of the cell. A key that
/// was never written reads as `None`.
pub fn get<T: Clone + PartialEq + 'static>(cx: &RenderContext, key: &str) -> Result<Option<T>> {
    let view = cx.current().ok_or(SessionError::NoCurrentView)?;
    get_in(&view, key)
}

/// Read `key` from the template scope enclosing `view`.
pub fn get_in<T: Clone + PartialEq + 'static>(view: &View, key: &str) -> Result<Option<T>> {
    Ok(cell_for::<T>(view, key, None)?.get())
}

/// Write `key` in the current view's template scope.
///
/// Computations that read the key rerun when the value differs from the
/// stored one.
pub fn set<T: Clone + PartialEq + 'static>(cx: &RenderContext, key: &str, value: T) -> Result<()> {
    let view = cx.current().ok_or(SessionError::NoCurrentView)?;
    set_in(&view, key, value)
}

/// Write `key` in the template scope enclosing `view`.
pub fn set_in<T: Clone + PartialEq + 'static>(view: &View, key: &str, value: T) -> Result<()> {
    let cell = cell_for(view, key, Some(value.clone()))?;
    cell.set(Some(value));
    Ok(())
}
