#![forbid(unsafe_code)]

//! View-tree nodes.
//!
//! A [`View`] is one node in the host's render tree: it has a [`ViewName`],
//! an optional parent link, and a slot table through which external
//! components attach per-view state without the view knowing their types.
//! Parent links are strong and upward-only (parents never point at
//! children), so the tree cannot form reference cycles.
//!
//! Template views are distinguished from control-flow wrappers (`with`,
//! `if`, `each`, ...) statically, as [`ViewName`] variants: code that needs
//! "the template this node renders under" walks the parent chain with
//! [`View::nearest_template`] instead of probing name strings.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use tracing::trace;

// ─── View ID generation ──────────────────────────────────────────────────────

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

fn next_view_id() -> u64 {
    NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed)
}

// ─── ViewName ────────────────────────────────────────────────────────────────

/// Prefix of a fully-qualified template name in its string form.
pub const TEMPLATE_PREFIX: &str = "template.";

/// The name of a view: either a fully-qualified template or a control-flow
/// wrapper inserted by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewName {
    /// A rendered template, e.g. `template.profile_card`. Holds the bare
    /// template name (`profile_card`).
    Template(String),
    /// A `#with` data wrapper.
    With,
    /// An `#if` branch wrapper.
    If,
    /// An `#unless` branch wrapper.
    Unless,
    /// An `#each` list wrapper.
    Each,
    /// One item of an `#each` list.
    EachItem,
    /// A view the renderer did not name.
    Anonymous,
}

impl ViewName {
    /// A template name. `ViewName::template("nav")` displays as
    /// `template.nav`.
    #[must_use]
    pub fn template(name: impl Into<String>) -> Self {
        Self::Template(name.into())
    }

    /// Whether this is a fully-qualified template name (the ancestor walk's
    /// stopping condition).
    #[must_use]
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Template(_))
    }

    /// Parse a renderer-provided name string.
    ///
    /// Strings carrying the fully-qualified `template.` prefix (with a
    /// non-empty remainder) parse as [`ViewName::Template`]; the known
    /// wrapper tokens parse as their variants; anything else is
    /// [`ViewName::Anonymous`]. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "with" => Self::With,
            "if" => Self::If,
            "unless" => Self::Unless,
            "each" => Self::Each,
            "each-item" => Self::EachItem,
            _ => match raw.strip_prefix(TEMPLATE_PREFIX) {
                Some(rest) if !rest.is_empty() => Self::Template(rest.to_owned()),
                _ => Self::Anonymous,
            },
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(name) => write!(f, "{TEMPLATE_PREFIX}{name}"),
            Self::With => f.write_str("with"),
            Self::If => f.write_str("if"),
            Self::Unless => f.write_str("unless"),
            Self::Each => f.write_str("each"),
            Self::EachItem => f.write_str("each-item"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

// ─── View ────────────────────────────────────────────────────────────────────

struct ViewInner {
    id: u64,
    name: ViewName,
    parent: Option<View>,
    /// Augmentation side-table: external components hang their per-view
    /// state here, keyed by a component-owned string.
    slots: RefCell<AHashMap<&'static str, Rc<dyn Any>>>,
}

/// A node in the render tree.
///
/// Cloning a `View` creates another handle to the **same** node; use
/// [`same`](View::same) for identity comparison.
pub struct View {
    inner: Rc<ViewInner>,
}

impl Clone for View {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.inner.parent.as_ref().map(|p| p.inner.id))
            .finish()
    }
}

impl View {
    /// Create a parentless view.
    #[must_use]
    pub fn root(name: ViewName) -> Self {
        Self::build(name, None)
    }

    /// Create a child of this view.
    #[must_use]
    pub fn child(&self, name: ViewName) -> Self {
        Self::build(name, Some(self.clone()))
    }

    fn build(name: ViewName, parent: Option<View>) -> Self {
        Self {
            inner: Rc::new(ViewInner {
                id: next_view_id(),
                name,
                parent,
                slots: RefCell::new(AHashMap::new()),
            }),
        }
    }

    /// Unique identifier (for logging).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn name(&self) -> &ViewName {
        &self.inner.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&View> {
        self.inner.parent.as_ref()
    }

    /// Whether two handles refer to the same node.
    #[must_use]
    pub fn same(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The nearest enclosing template view.
    ///
    /// Walks the parent chain upward while the current view is a wrapper and
    /// a parent exists. A chain with no template ancestor resolves to its
    /// parentless root, wrapper or not.
    #[must_use]
    pub fn nearest_template(&self) -> View {
        let mut current = self.clone();
        while !current.name().is_template() {
            let Some(parent) = current.parent().cloned() else {
                break;
            };
            current = parent;
        }
        if !current.same(self) {
            trace!(from = %self.name(), to = %current.name(), "skipped wrapper views");
        }
        current
    }

    /// Fetch the component state stored under `key`, if present and of the
    /// expected type.
    #[must_use]
    pub fn slot<S: 'static>(&self, key: &'static str) -> Option<Rc<S>> {
        self.inner
            .slots
            .borrow()
            .get(key)
            .cloned()
            .and_then(|any| any.downcast::<S>().ok())
    }

    /// Fetch the component state stored under `key`, creating it with `init`
    /// on first use.
    ///
    /// A slot key is owned by one component and expected to always carry one
    /// type; an existing entry of a different type is replaced.
    pub fn slot_or_insert_with<S: 'static>(
        &self,
        key: &'static str,
        init: impl FnOnce() -> S,
    ) -> Rc<S> {
        if let Some(existing) = self.slot::<S>(key) {
            return existing;
        }
        let fresh = Rc::new(init());
        let replaced = self
            .inner
            .slots
            .borrow_mut()
            .insert(key, fresh.clone() as Rc<dyn Any>);
        if replaced.is_some() {
            trace!(view = %self.name(), key, "slot entry replaced with a different type");
        } else {
            trace!(view = %self.name(), key, "slot created");
        }
        fresh
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
