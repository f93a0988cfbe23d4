//! Side table of non-semantic source fragments
//!
//! Every node may own three ordered trivia lists: fragments written before
//! it, fragments written at its internal gap, and fragments written after
//! it. The lists are keyed by [`NodeId`], so a node keeps its trivia across
//! rewrites only while its identity survives.

use std::collections::HashMap;

use ktast_syntax::SyntaxKind;

use crate::node::NodeId;

/// Category of a trivia fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    /// An explicit `;`
    Terminator,
    /// A `,` with no element after it
    TrailingComma,
}

/// A source fragment with no AST meaning
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::Whitespace, text)
    }

    pub fn newline() -> Self {
        Self::new(TriviaKind::Newline, "\n")
    }

    pub fn line_comment(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::LineComment, text)
    }

    pub fn block_comment(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::BlockComment, text)
    }

    pub fn terminator() -> Self {
        Self::new(TriviaKind::Terminator, ";")
    }

    pub fn trailing_comma() -> Self {
        Self::new(TriviaKind::TrailingComma, ",")
    }

    /// Trivia for a front-end token, if the token kind is trivia-like
    ///
    /// `,` maps to a trailing comma; the caller decides whether a comma is
    /// structural.
    pub fn from_syntax(kind: SyntaxKind, text: &str) -> Option<Self> {
        let kind = match kind {
            SyntaxKind::Whitespace => TriviaKind::Whitespace,
            SyntaxKind::Newline => TriviaKind::Newline,
            SyntaxKind::CommentLine => TriviaKind::LineComment,
            SyntaxKind::CommentBlock => TriviaKind::BlockComment,
            SyntaxKind::Semicolon => TriviaKind::Terminator,
            SyntaxKind::Comma => TriviaKind::TrailingComma,
            _ => return None,
        };
        Some(Self::new(kind, text))
    }

    pub fn contains_newline(&self) -> bool {
        self.text.contains('\n')
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TriviaKind::LineComment | TriviaKind::BlockComment)
    }
}

/// Which of a node's three lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaPosition {
    Before,
    Within,
    After,
}

/// Trivia lists for every node of one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriviaStore {
    before: HashMap<NodeId, Vec<Trivia>>,
    within: HashMap<NodeId, Vec<Trivia>>,
    after: HashMap<NodeId, Vec<Trivia>>,
}

impl TriviaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(&self, id: NodeId) -> &[Trivia] {
        self.get(TriviaPosition::Before, id)
    }

    pub fn within(&self, id: NodeId) -> &[Trivia] {
        self.get(TriviaPosition::Within, id)
    }

    pub fn after(&self, id: NodeId) -> &[Trivia] {
        self.get(TriviaPosition::After, id)
    }

    pub fn get(&self, position: TriviaPosition, id: NodeId) -> &[Trivia] {
        self.map(position).get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn push_before(&mut self, id: NodeId, trivia: Trivia) {
        self.push(TriviaPosition::Before, id, trivia);
    }

    pub fn push_within(&mut self, id: NodeId, trivia: Trivia) {
        self.push(TriviaPosition::Within, id, trivia);
    }

    pub fn push_after(&mut self, id: NodeId, trivia: Trivia) {
        self.push(TriviaPosition::After, id, trivia);
    }

    pub fn push(&mut self, position: TriviaPosition, id: NodeId, trivia: Trivia) {
        self.map_mut(position).entry(id).or_default().push(trivia);
    }

    /// Append several fragments; empty input leaves no entry behind
    pub fn extend(&mut self, position: TriviaPosition, id: NodeId, trivia: Vec<Trivia>) {
        if trivia.is_empty() {
            return;
        }
        self.map_mut(position).entry(id).or_default().extend(trivia);
    }

    /// Replace all three lists of `to` with those of `from`, leaving `from`
    /// with none
    ///
    /// Moving a node onto itself changes nothing.
    pub fn move_trivia(&mut self, from: NodeId, to: NodeId) {
        if from == to {
            return;
        }
        for position in [
            TriviaPosition::Before,
            TriviaPosition::Within,
            TriviaPosition::After,
        ] {
            let map = self.map_mut(position);
            match map.remove(&from) {
                Some(list) => {
                    map.insert(to, list);
                }
                None => {
                    map.remove(&to);
                }
            }
        }
    }

    /// Drop every list owned by `id`
    pub fn remove(&mut self, id: NodeId) {
        self.before.remove(&id);
        self.within.remove(&id);
        self.after.remove(&id);
    }

    /// All fragments, in no particular order
    pub fn fragments(&self) -> impl Iterator<Item = &Trivia> {
        self.before
            .values()
            .chain(self.within.values())
            .chain(self.after.values())
            .flatten()
    }

    /// Total number of fragments
    pub fn len(&self) -> usize {
        self.fragments().count()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments().next().is_none()
    }

    fn map(&self, position: TriviaPosition) -> &HashMap<NodeId, Vec<Trivia>> {
        match position {
            TriviaPosition::Before => &self.before,
            TriviaPosition::Within => &self.within,
            TriviaPosition::After => &self.after,
        }
    }

    fn map_mut(&mut self, position: TriviaPosition) -> &mut HashMap<NodeId, Vec<Trivia>> {
        match position {
            TriviaPosition::Before => &mut self.before,
            TriviaPosition::Within => &mut self.within,
            TriviaPosition::After => &mut self.after,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Ast;

    fn two_nodes() -> (NodeId, NodeId) {
        let mut ast = Ast::new();
        (ast.name("a"), ast.name("b"))
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let (a, _) = two_nodes();
        let store = TriviaStore::new();
        assert!(store.before(a).is_empty());
        assert!(store.within(a).is_empty());
        assert!(store.after(a).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_move_replaces_and_clears() {
        let (a, b) = two_nodes();
        let mut store = TriviaStore::new();
        store.push_before(a, Trivia::line_comment("// doc"));
        store.push_after(a, Trivia::whitespace(" "));
        store.push_within(b, Trivia::block_comment("/* old */"));

        store.move_trivia(a, b);

        assert_eq!(store.before(b), &[Trivia::line_comment("// doc")]);
        assert_eq!(store.after(b), &[Trivia::whitespace(" ")]);
        assert!(store.within(b).is_empty());
        assert!(store.before(a).is_empty());
        assert!(store.after(a).is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_move_onto_self_is_noop() {
        let (a, _) = two_nodes();
        let mut store = TriviaStore::new();
        store.push_after(a, Trivia::terminator());
        let snapshot = store.clone();

        store.move_trivia(a, a);
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_move_there_and_back_restores() {
        let (a, b) = two_nodes();
        let mut store = TriviaStore::new();
        store.push_before(a, Trivia::newline());
        store.push_within(a, Trivia::whitespace(" "));
        let original = store.clone();

        store.move_trivia(a, b);
        assert_ne!(store, original);
        store.move_trivia(b, a);
        assert_eq!(store, original);
    }

    #[test]
    fn test_from_syntax() {
        assert_eq!(
            Trivia::from_syntax(SyntaxKind::CommentLine, "// x"),
            Some(Trivia::line_comment("// x"))
        );
        assert_eq!(
            Trivia::from_syntax(SyntaxKind::Semicolon, ";"),
            Some(Trivia::terminator())
        );
        assert_eq!(Trivia::from_syntax(SyntaxKind::Ident, "x"), None);
    }
}
