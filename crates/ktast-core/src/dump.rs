//! Indented text rendering of an AST, for debugging and snapshots
//!
//! ```text
//! PropertyDeclaration
//!   @after ["\n"]
//!   Keyword val
//!   Variable
//!     NameExpression "x"
//! ```

use std::fmt::Write;

use crate::node::{Ast, Node, NodeId};
use crate::trivia::{Trivia, TriviaStore};
use crate::walk::{Visitor, walk};

/// Render the subtree under `root`, one node per line
///
/// Non-empty trivia lists appear as `@before`, `@within` and `@after` lines
/// under the node that owns them.
pub fn dump(ast: &Ast, root: NodeId, trivia: Option<&TriviaStore>) -> String {
    let mut dumper = Dumper {
        trivia,
        depth: 0,
        out: String::new(),
    };
    walk(ast, root, &mut dumper);
    dumper.out
}

struct Dumper<'a> {
    trivia: Option<&'a TriviaStore>,
    depth: usize,
    out: String,
}

impl Dumper<'_> {
    fn line(&mut self, ast: &Ast, id: NodeId) {
        self.indent(self.depth);
        self.out.push_str(&describe(&ast[id]));
        self.out.push('\n');

        let Some(store) = self.trivia else {
            return;
        };
        for (label, list) in [
            ("@before", store.before(id)),
            ("@within", store.within(id)),
            ("@after", store.after(id)),
        ] {
            if !list.is_empty() {
                self.indent(self.depth + 1);
                self.out.push_str(label);
                self.out.push(' ');
                self.out.push_str(&texts(list));
                self.out.push('\n');
            }
        }
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }
}

impl Visitor for Dumper<'_> {
    fn enter(&mut self, ast: &Ast, id: NodeId, _parent: Option<NodeId>) {
        self.line(ast, id);
        self.depth += 1;
    }

    fn leaf(&mut self, ast: &Ast, id: NodeId, _parent: Option<NodeId>) {
        self.line(ast, id);
    }

    fn leave(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>) {
        self.depth -= 1;
    }
}

fn describe(node: &Node) -> String {
    let name = node.kind_name();
    match node {
        Node::NameExpression { text } | Node::LiteralStringEntry { text } => {
            format!("{name} {text:?}")
        }
        Node::ConstantLiteral { kind, text } => format!("{name} {kind:?} {text}"),
        Node::Keyword { keyword } => format!("{name} {}", keyword.as_str()),
        Node::Modifier { keyword } => format!("{name} {}", keyword.as_str()),
        Node::List { kind, .. } => format!("List({kind:?})"),
        Node::ImportDirective { wildcard: true, .. } => format!("{name} wildcard"),
        Node::StringLiteral { raw: true, .. } => format!("{name} raw"),
        Node::TemplateStringEntry { short: true, .. } => format!("{name} short"),
        Node::ValueArgument { spread: true, .. } => format!("{name} spread"),
        Node::TypeProjection { type_ref: None, .. } => format!("{name} star"),
        _ => name.to_string(),
    }
}

fn texts(list: &[Trivia]) -> String {
    let mut out = String::from("[");
    for (idx, trivia) in list.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{:?}", trivia.text);
    }
    out.push(']');
    out
}
