//! Read-only tree traversal

use crate::node::{Ast, NodeId};

/// Callbacks for [`walk`]
///
/// Leaf variants receive only [`Visitor::leaf`]; every other node receives
/// [`Visitor::enter`], its children in source order, then [`Visitor::leave`].
pub trait Visitor {
    fn enter(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>) {}

    fn leaf(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>) {}

    fn leave(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>) {}
}

/// Visit the subtree under `root` depth-first
///
/// # Panics
///
/// Panics if the subtree references an id outside `ast`.
pub fn walk(ast: &Ast, root: NodeId, visitor: &mut dyn Visitor) {
    walk_node(ast, root, None, visitor);
}

fn walk_node(ast: &Ast, id: NodeId, parent: Option<NodeId>, visitor: &mut dyn Visitor) {
    let node = ast.get(id);
    if node.is_leaf() {
        visitor.leaf(ast, id, parent);
        return;
    }
    visitor.enter(ast, id, parent);
    node.for_each_child(|child| walk_node(ast, child, Some(id), visitor));
    visitor.leave(ast, id, parent);
}

struct Collect(Vec<NodeId>);

impl Visitor for Collect {
    fn enter(&mut self, _ast: &Ast, id: NodeId, _parent: Option<NodeId>) {
        self.0.push(id);
    }

    fn leaf(&mut self, _ast: &Ast, id: NodeId, _parent: Option<NodeId>) {
        self.0.push(id);
    }
}

impl Ast {
    /// Ids of `root` and everything below it, in pre-order
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut collect = Collect(Vec::new());
        walk(self, root, &mut collect);
        collect.0
    }
}
