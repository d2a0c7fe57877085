#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use weft_view::{View, ViewName};

#[derive(Arbitrary, Debug, Clone, Copy)]
enum NodeKind {
    Template,
    With,
    If,
    Unless,
    Each,
    EachItem,
    Anonymous,
}

fuzz_target!(|kinds: Vec<NodeKind>| {
    // Grow an arbitrary chain and check the walk invariant at every depth:
    // the resolved owner is a template view, or the parentless root.
    let mut view = View::root(ViewName::Anonymous);
    for (depth, kind) in kinds.iter().take(64).enumerate() {
        let name = match kind {
            NodeKind::Template => ViewName::template(format!("t{depth}")),
            NodeKind::With => ViewName::With,
            NodeKind::If => ViewName::If,
            NodeKind::Unless => ViewName::Unless,
            NodeKind::Each => ViewName::Each,
            NodeKind::EachItem => ViewName::EachItem,
            NodeKind::Anonymous => ViewName::Anonymous,
        };
        view = view.child(name);
        let owner = view.nearest_template();
        assert!(owner.name().is_template() || owner.parent().is_none());
        // Resolution is stable.
        assert!(owner.same(&view.nearest_template()));
    }
});
