//! Copy-on-write tree transformation
//!
//! The arena is append-only, so a rewrite never disturbs the input tree:
//! changed nodes get fresh ids and unchanged subtrees keep theirs, along
//! with their trivia.

use crate::node::{Ast, NodeId};

/// Callbacks for [`rewrite`]
pub trait Rewriter {
    /// Called top-down, before the node's children are rewritten
    ///
    /// The children of the returned node are rewritten next.
    fn before_children(&mut self, _ast: &mut Ast, id: NodeId, _parent: Option<NodeId>) -> NodeId {
        id
    }

    /// Called bottom-up with the id the node had on entry and the id after
    /// its children were rewritten
    fn after_children(
        &mut self,
        _ast: &mut Ast,
        _original: NodeId,
        current: NodeId,
        _parent: Option<NodeId>,
    ) -> NodeId {
        current
    }
}

/// Rewrite the subtree under `root`, returning the new root
///
/// When no callback returns a different id the result is `root` itself.
pub fn rewrite(ast: &mut Ast, root: NodeId, rewriter: &mut dyn Rewriter) -> NodeId {
    rewrite_node(ast, root, None, rewriter)
}

fn rewrite_node(
    ast: &mut Ast,
    original: NodeId,
    parent: Option<NodeId>,
    rewriter: &mut dyn Rewriter,
) -> NodeId {
    let replaced = rewriter.before_children(ast, original, parent);

    let node = ast.get(replaced).clone();
    let current = if node.is_leaf() {
        replaced
    } else {
        let rebuilt = node.map_children(&mut |child| rewrite_node(ast, child, Some(replaced), rewriter));
        match rebuilt {
            Some(node) => ast.alloc(node),
            None => replaced,
        }
    };

    rewriter.after_children(ast, original, current, parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Keyword, ListKind, Node};

    struct Identity;

    impl Rewriter for Identity {}

    struct RenameA;

    impl Rewriter for RenameA {
        fn after_children(
            &mut self,
            ast: &mut Ast,
            _original: NodeId,
            current: NodeId,
            _parent: Option<NodeId>,
        ) -> NodeId {
            if ast.name_text(current) == Some("a") {
                ast.name("z")
            } else {
                current
            }
        }
    }

    /// Drops the first element of every list
    struct DropFirst;

    impl Rewriter for DropFirst {
        fn before_children(&mut self, ast: &mut Ast, id: NodeId, _parent: Option<NodeId>) -> NodeId {
            match ast.get(id) {
                Node::List { kind, elements } if !elements.is_empty() => {
                    let node = Node::List {
                        kind: *kind,
                        elements: elements[1..].to_vec(),
                    };
                    ast.alloc(node)
                }
                _ => id,
            }
        }
    }

    fn sample(ast: &mut Ast) -> NodeId {
        let lhs = ast.name("a");
        let operator = ast.keyword(Keyword::Plus);
        let rhs = ast.name("b");
        let binary = ast.alloc(Node::Binary { lhs, operator, rhs });
        let other = ast.name("c");
        ast.list(ListKind::ValueArguments, vec![binary, other])
    }

    #[test]
    fn test_identity_returns_same_root() {
        let mut ast = Ast::new();
        let root = sample(&mut ast);
        let before = ast.len();
        assert_eq!(rewrite(&mut ast, root, &mut Identity), root);
        assert_eq!(ast.len(), before);
    }

    #[test]
    fn test_change_rebuilds_path_only() {
        let mut ast = Ast::new();
        let root = sample(&mut ast);
        let new_root = rewrite(&mut ast, root, &mut RenameA);
        assert_ne!(new_root, root);

        let Node::List { elements, .. } = &ast[new_root] else {
            panic!("expected a list");
        };
        let Node::List {
            elements: old_elements,
            ..
        } = &ast[root]
        else {
            panic!("expected a list");
        };
        assert_ne!(elements[0], old_elements[0]);
        // Untouched sibling keeps its identity
        assert_eq!(elements[1], old_elements[1]);

        let Node::Binary { lhs, rhs, .. } = &ast[elements[0]] else {
            panic!("expected a binary");
        };
        assert_eq!(ast.name_text(*lhs), Some("z"));
        assert_eq!(ast.name_text(*rhs), Some("b"));

        // The input tree is unchanged
        let Node::Binary { lhs, .. } = &ast[old_elements[0]] else {
            panic!("expected a binary");
        };
        assert_eq!(ast.name_text(*lhs), Some("a"));
    }

    #[test]
    fn test_length_change_is_a_change() {
        let mut ast = Ast::new();
        let root = sample(&mut ast);
        let new_root = rewrite(&mut ast, root, &mut DropFirst);
        let Node::List { elements, .. } = &ast[new_root] else {
            panic!("expected a list");
        };
        assert_eq!(elements.len(), 1);
        assert_eq!(ast.name_text(elements[0]), Some("c"));
    }
}
