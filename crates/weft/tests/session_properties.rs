//! End-to-end behavior of the scoped session store.
//!
//! Covers the accessor's contract as observed by host code:
//!
//! 1. Reads are stable between writes.
//! 2. Write-then-read returns the written value.
//! 3. Keys on one view are independent.
//! 4. The same key on distinct views is independent.
//! 5. A never-written key reads `None`.
//! 6. The ambient form outside any render is a usage error.
//! 7. Wrapper views resolve to the nearest template ancestor.
//! 8. Helpers rerun on differing writes and not on equal ones.
//! 9. A key's value type is fixed by first access.

use std::cell::RefCell;
use std::rc::Rc;

use weft::prelude::*;
use weft::session;

fn template(name: &str) -> View {
    View::root(ViewName::template(name))
}

// ---------------------------------------------------------------------------
// 1-5. Plain store semantics
// ---------------------------------------------------------------------------

#[test]
fn repeated_get_is_stable() {
    let view = template("page");
    session::set_in(&view, "count", 5u32).unwrap();
    for _ in 0..3 {
        assert_eq!(session::get_in::<u32>(&view, "count").unwrap(), Some(5));
    }
}

#[test]
fn set_then_get_returns_value() {
    let view = template("page");
    session::set_in(&view, "label", String::from("ready")).unwrap();
    assert_eq!(
        session::get_in::<String>(&view, "label").unwrap(),
        Some("ready".into())
    );
}

#[test]
fn distinct_keys_are_independent() {
    let view = template("page");
    session::set_in(&view, "a", 1u32).unwrap();
    session::set_in(&view, "b", 2u32).unwrap();
    assert_eq!(session::get_in::<u32>(&view, "a").unwrap(), Some(1));
    assert_eq!(session::get_in::<u32>(&view, "b").unwrap(), Some(2));
}

#[test]
fn same_key_on_distinct_views_is_independent() {
    let first = template("first");
    let second = template("second");
    session::set_in(&first, "k", 1u32).unwrap();
    session::set_in(&second, "k", 2u32).unwrap();
    assert_eq!(session::get_in::<u32>(&first, "k").unwrap(), Some(1));
    assert_eq!(session::get_in::<u32>(&second, "k").unwrap(), Some(2));
}

#[test]
fn never_written_key_reads_none() {
    let view = template("page");
    assert_eq!(session::get_in::<u32>(&view, "ghost").unwrap(), None);
    // Still None afterwards: the read created the cell but wrote nothing.
    assert_eq!(session::get_in::<u32>(&view, "ghost").unwrap(), None);
}

// ---------------------------------------------------------------------------
// 6. Usage error outside any render
// ---------------------------------------------------------------------------

#[test]
fn ambient_call_outside_render_is_usage_error() {
    let cx = RenderContext::new();
    assert_eq!(
        session::get::<u32>(&cx, "k"),
        Err(SessionError::NoCurrentView)
    );
    assert_eq!(session::set(&cx, "k", 1u32), Err(SessionError::NoCurrentView));
}

#[test]
fn ambient_call_after_guard_drop_is_usage_error() {
    let cx = RenderContext::new();
    {
        let _guard = cx.enter(template("page"));
        assert!(session::set(&cx, "k", 1u32).is_ok());
    }
    assert_eq!(
        session::get::<u32>(&cx, "k"),
        Err(SessionError::NoCurrentView)
    );
}

// ---------------------------------------------------------------------------
// 7. Wrapper views resolve to the nearest template ancestor
// ---------------------------------------------------------------------------

#[test]
fn wrapper_write_lands_on_template_ancestor() {
    let page = template("page");
    let item = page
        .child(ViewName::If)
        .child(ViewName::Each)
        .child(ViewName::EachItem);

    let cx = RenderContext::new();
    let _guard = cx.enter(item.clone());
    session::set(&cx, "selected", 7u32).unwrap();

    // Visible through the template itself and through any other wrapper
    // under it, because they share the one store.
    assert_eq!(session::get_in::<u32>(&page, "selected").unwrap(), Some(7));
    let sibling = page.child(ViewName::With);
    assert_eq!(
        session::get_in::<u32>(&sibling, "selected").unwrap(),
        Some(7)
    );
}

#[test]
fn nested_template_shadows_outer_scope() {
    let outer = template("outer");
    let inner = outer.child(ViewName::Each).child(ViewName::template("inner"));
    let leaf = inner.child(ViewName::If);

    session::set_in(&leaf, "k", 1u32).unwrap();
    assert_eq!(session::get_in::<u32>(&inner, "k").unwrap(), Some(1));
    assert_eq!(session::get_in::<u32>(&outer, "k").unwrap(), None);
}

// ---------------------------------------------------------------------------
// 8. Reactivity: helpers rerun on differing writes
// ---------------------------------------------------------------------------

#[test]
fn reading_helper_reruns_on_set() {
    let page = template("page");
    let row = page.child(ViewName::EachItem);

    let cx = Rc::new(RenderContext::new());
    let rendered = Rc::new(RefCell::new(Vec::new()));

    let cx_helper = Rc::clone(&cx);
    let rendered_helper = Rc::clone(&rendered);
    let row_helper = row.clone();
    let helper = autorun(move |_| {
        let _guard = cx_helper.enter(row_helper.clone());
        let value = session::get::<u32>(&cx_helper, "n").unwrap();
        rendered_helper.borrow_mut().push(value);
    });

    // An event handler writes through the template view directly.
    session::set_in(&page, "n", 1u32).unwrap();
    session::set_in(&page, "n", 2u32).unwrap();

    assert_eq!(*rendered.borrow(), vec![None, Some(1), Some(2)]);
    assert_eq!(helper.run_count(), 3);
}

#[test]
fn equal_write_does_not_rerun_helper() {
    let page = template("page");
    session::set_in(&page, "n", 1u32).unwrap();

    let page_helper = page.clone();
    let helper = autorun(move |_| {
        let _ = session::get_in::<u32>(&page_helper, "n").unwrap();
    });

    session::set_in(&page, "n", 1u32).unwrap();
    assert_eq!(helper.run_count(), 1);

    session::set_in(&page, "n", 2u32).unwrap();
    assert_eq!(helper.run_count(), 2);
}

#[test]
fn writes_to_other_keys_do_not_rerun_helper() {
    let page = template("page");
    let page_helper = page.clone();
    let helper = autorun(move |_| {
        let _ = session::get_in::<u32>(&page_helper, "watched").unwrap();
    });

    session::set_in(&page, "unwatched", 9u32).unwrap();
    assert_eq!(helper.run_count(), 1);
}

#[test]
fn untracked_read_does_not_subscribe_helper() {
    let page = template("page");
    let page_helper = page.clone();
    let helper = autorun(move |_| {
        untrack(|| {
            let _ = session::get_in::<u32>(&page_helper, "n").unwrap();
        });
    });

    session::set_in(&page, "n", 3u32).unwrap();
    assert_eq!(helper.run_count(), 1);
}

// ---------------------------------------------------------------------------
// 9. Typed cells
// ---------------------------------------------------------------------------

#[test]
fn value_type_is_fixed_by_first_access() {
    let view = template("page");
    assert_eq!(session::get_in::<u32>(&view, "mode").unwrap(), None);

    let err = session::set_in(&view, "mode", String::from("wide")).unwrap_err();
    match err {
        SessionError::TypeMismatch { key, .. } => assert_eq!(key, "mode"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }

    // The original cell is untouched and still usable.
    session::set_in(&view, "mode", 4u32).unwrap();
    assert_eq!(session::get_in::<u32>(&view, "mode").unwrap(), Some(4));
}
