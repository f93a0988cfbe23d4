//! Construction of an AST and its trivia from a parse tree
//!
//! The walk keeps a buffer of pending trivia and remembers the most recently
//! closed node. Whitespace, newlines, comments, `;` and trailing commas are
//! buffered; structural tokens and element boundaries decide which list the
//! buffer lands in:
//!
//! - entering an element moves the buffer into the new node's *before* list;
//! - a structural token or the end of an element flushes the buffer into the
//!   *after* list of the previous child, or into the element's *within* list
//!   when the previous part was one of its own tokens;
//! - a `;` that follows a child flushes at once, so a terminator always
//!   belongs to the statement it ends.

use std::mem;

use ktast_syntax::{Parse, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, TextRange};
use rowan::NodeOrToken;

use crate::config::ConstructOptions;
use crate::error::{ConstructionError, UnsupportedShapeError};
use crate::node::{Ast, ConstantKind, Keyword, ListKind, ModifierKeyword, Node, NodeId};
use crate::result::Result;
use crate::trivia::{Trivia, TriviaPosition, TriviaStore};

/// A constructed unit: the arena, the file node and the trivia of every node
#[derive(Debug, Clone)]
pub struct Constructed {
    pub ast: Ast,
    pub root: NodeId,
    pub trivia: TriviaStore,
}

impl Constructed {
    /// Parse and construct `source` in one step
    pub fn from_source(source: &str, options: &ConstructOptions) -> Result<Self> {
        construct(&ktast_syntax::parse(source), options.strict)
    }

    /// Write the unit back with its trivia
    pub fn write(&self) -> String {
        crate::writer::write(&self.ast, self.root, Some(&self.trivia))
    }
}

/// Build the AST for a parse tree
///
/// With `strict`, a tree carrying syntax errors is refused with every
/// marker. Otherwise construction proceeds and fails only on error nodes it
/// actually meets.
pub fn construct(parse: &Parse, strict: bool) -> Result<Constructed> {
    if strict && parse.has_errors() {
        return Err(ConstructionError::ErrorMarkers {
            markers: parse.errors().to_vec(),
        }
        .into());
    }

    let mut builder = Builder::default();
    let root = builder.element(&parse.syntax())?;
    let Builder { ast, trivia, .. } = builder;

    tracing::debug!("Constructed {} nodes with {} trivia fragments", ast.len(), trivia.len());

    Ok(Constructed { ast, root, trivia })
}

#[derive(Debug)]
enum Part {
    Node { kind: SyntaxKind, id: NodeId },
    Token { kind: SyntaxKind, text: String },
}

#[derive(Default)]
struct Frame {
    parts: Vec<Part>,
    within: Vec<Trivia>,
    last_was_child: bool,
}

#[derive(Default)]
struct Builder {
    ast: Ast,
    trivia: TriviaStore,
    pending: Vec<Trivia>,
    last_closed: Option<NodeId>,
}

impl Builder {
    fn element(&mut self, node: &SyntaxNode) -> Result<NodeId> {
        match node.kind() {
            SyntaxKind::DynamicType => {
                return Err(UnsupportedShapeError::new("dynamic type", node.text_range()).into());
            }
            SyntaxKind::Error => {
                return Err(ConstructionError::unmapped("ERROR", node.text_range()).into());
            }
            _ => {}
        }

        let before = mem::take(&mut self.pending);
        let mut frame = Frame::default();

        let children: Vec<SyntaxElement> = node.children_with_tokens().collect();
        for (idx, child) in children.iter().enumerate() {
            match child {
                NodeOrToken::Node(child) => {
                    let id = self.element(child)?;
                    frame.parts.push(Part::Node {
                        kind: child.kind(),
                        id,
                    });
                    frame.last_was_child = true;
                }
                NodeOrToken::Token(token) => self.token(&mut frame, token, &children[idx + 1..])?,
            }
        }
        self.flush(&mut frame);

        let node = lower(node.kind(), &frame.parts, node.text_range())?;
        let id = self.ast.alloc(node);
        self.trivia.extend(TriviaPosition::Before, id, before);
        self.trivia.extend(TriviaPosition::Within, id, frame.within);
        self.last_closed = Some(id);
        Ok(id)
    }

    fn token(&mut self, frame: &mut Frame, token: &SyntaxToken, rest: &[SyntaxElement]) -> Result<()> {
        let kind = token.kind();
        match kind {
            _ if kind.is_trivia() => {
                if let Some(trivia) = Trivia::from_syntax(kind, token.text()) {
                    self.pending.push(trivia);
                }
            }
            SyntaxKind::Semicolon => {
                self.pending.push(Trivia::terminator());
                if frame.last_was_child {
                    self.flush(frame);
                }
            }
            SyntaxKind::Comma if is_trailing_comma(rest) => {
                self.pending.push(Trivia::trailing_comma());
            }
            SyntaxKind::ErrorToken => {
                return Err(ConstructionError::unmapped("ERROR_TOKEN", token.text_range()).into());
            }
            _ => {
                self.flush(frame);
                frame.parts.push(Part::Token {
                    kind,
                    text: token.text().to_string(),
                });
                frame.last_was_child = false;
            }
        }
        Ok(())
    }

    fn flush(&mut self, frame: &mut Frame) {
        if self.pending.is_empty() {
            return;
        }
        let pending = mem::take(&mut self.pending);
        match self.last_closed {
            Some(id) if frame.last_was_child => {
                self.trivia.extend(TriviaPosition::After, id, pending);
            }
            _ => frame.within.extend(pending),
        }
    }
}

/// A comma with no element after it: the next significant sibling closes
/// the list, or there is none
fn is_trailing_comma(rest: &[SyntaxElement]) -> bool {
    match rest.iter().find(|element| !element.kind().is_trivia()) {
        None => true,
        Some(NodeOrToken::Token(token)) => token.kind().is_closing_delimiter(),
        Some(NodeOrToken::Node(_)) => false,
    }
}

fn is_type(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::SimpleType
            | SyntaxKind::NullableType
            | SyntaxKind::ParenType
            | SyntaxKind::FunctionType
            | SyntaxKind::DynamicType
    )
}

/// Cursor-free view of an element's parts
struct Parts<'a> {
    parts: &'a [Part],
    production: SyntaxKind,
    range: TextRange,
}

impl Parts<'_> {
    fn nodes(&self) -> Vec<NodeId> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Node { id, .. } => Some(*id),
                Part::Token { .. } => None,
            })
            .collect()
    }

    fn nth_node(&self, n: usize) -> Option<NodeId> {
        self.nodes().get(n).copied()
    }

    fn find(&self, kind: SyntaxKind) -> Option<NodeId> {
        self.parts.iter().find_map(|part| match part {
            Part::Node { kind: k, id } if *k == kind => Some(*id),
            _ => None,
        })
    }

    fn find_all(&self, kind: SyntaxKind) -> Vec<NodeId> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Node { kind: k, id } if *k == kind => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn find_type(&self) -> Option<NodeId> {
        self.parts.iter().find_map(|part| match part {
            Part::Node { kind, id } if is_type(*kind) => Some(*id),
            _ => None,
        })
    }

    fn has_token(&self, kind: SyntaxKind) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Part::Token { kind: k, .. } if *k == kind))
    }

    /// First token of the element
    fn token(&self) -> Option<(SyntaxKind, &str)> {
        self.parts.iter().find_map(|part| match part {
            Part::Token { kind, text } => Some((*kind, text.as_str())),
            Part::Node { .. } => None,
        })
    }

    /// First child node following the first `token`
    fn node_after(&self, token: SyntaxKind) -> Option<NodeId> {
        self.parts
            .iter()
            .skip_while(|part| !matches!(part, Part::Token { kind, .. } if *kind == token))
            .find_map(|part| match part {
                Part::Node { id, .. } => Some(*id),
                Part::Token { .. } => None,
            })
    }

    /// Child nodes preceding the first `token`
    fn nodes_before(&self, token: SyntaxKind) -> Vec<NodeId> {
        self.parts
            .iter()
            .take_while(|part| !matches!(part, Part::Token { kind, .. } if *kind == token))
            .filter_map(|part| match part {
                Part::Node { id, .. } => Some(*id),
                Part::Token { .. } => None,
            })
            .collect()
    }

    fn require(&self, child: Option<NodeId>, name: &'static str) -> Result<NodeId> {
        child.ok_or_else(|| self.missing(name))
    }

    /// The node after `token`, required only when the token is present
    fn after(&self, token: SyntaxKind, name: &'static str) -> Result<Option<NodeId>> {
        if !self.has_token(token) {
            return Ok(None);
        }
        self.require(self.node_after(token), name).map(Some)
    }

    fn missing(&self, name: &'static str) -> crate::error::Error {
        ConstructionError::missing_child(format!("{:?}", self.production), name, self.range).into()
    }

    fn unmapped(&self) -> crate::error::Error {
        ConstructionError::unmapped(format!("{:?}", self.production), self.range).into()
    }

    fn list(&self, kind: ListKind) -> Node {
        Node::List {
            kind,
            elements: self.nodes(),
        }
    }
}

/// Map one parse-tree element, whose children are already built, to a node
fn lower(production: SyntaxKind, parts: &[Part], range: TextRange) -> Result<Node> {
    let p = Parts {
        parts,
        production,
        range,
    };

    let node = match production {
        SyntaxKind::KotlinFile => {
            let mut package = None;
            let mut imports = Vec::new();
            let mut statements = Vec::new();
            for part in parts {
                match part {
                    Part::Node {
                        kind: SyntaxKind::PackageDirective,
                        id,
                    } => package = Some(*id),
                    Part::Node {
                        kind: SyntaxKind::ImportDirective,
                        id,
                    } => imports.push(*id),
                    Part::Node { id, .. } => statements.push(*id),
                    Part::Token { .. } => return Err(p.unmapped()),
                }
            }
            Node::KotlinFile {
                package,
                imports,
                statements,
            }
        }
        SyntaxKind::PackageDirective => Node::PackageDirective {
            name: p.require(p.find(SyntaxKind::QualifiedName), "name")?,
        },
        SyntaxKind::ImportDirective => Node::ImportDirective {
            name: p.require(p.find(SyntaxKind::QualifiedName), "name")?,
            wildcard: p.has_token(SyntaxKind::Star),
            alias: p.find(SyntaxKind::Name),
        },
        SyntaxKind::QualifiedName => p.list(ListKind::QualifiedName),
        SyntaxKind::ModifierList => p.list(ListKind::Modifiers),
        SyntaxKind::Modifier => {
            let (_, text) = p.token().ok_or_else(|| p.unmapped())?;
            Node::Modifier {
                keyword: ModifierKeyword::from_text(text).ok_or_else(|| p.unmapped())?,
            }
        }
        SyntaxKind::Keyword => {
            let (kind, _) = p.token().ok_or_else(|| p.unmapped())?;
            Node::Keyword {
                keyword: Keyword::from_syntax(kind).ok_or_else(|| p.unmapped())?,
            }
        }
        SyntaxKind::Name => {
            let (_, text) = p.token().ok_or_else(|| p.unmapped())?;
            Node::NameExpression {
                text: text.to_string(),
            }
        }

        SyntaxKind::ClassDeclaration => Node::ClassDeclaration {
            modifiers: p.find(SyntaxKind::ModifierList),
            declaration_keyword: p.require(p.find(SyntaxKind::Keyword), "declaration keyword")?,
            name: p.find(SyntaxKind::Name),
            type_parameters: p.find(SyntaxKind::TypeParameterList),
            primary_constructor: p.find(SyntaxKind::ParameterList),
            supertypes: p.find(SyntaxKind::SupertypeList),
            body: p.find(SyntaxKind::ClassBody),
        },
        SyntaxKind::ClassBody => Node::ClassBody { members: p.nodes() },
        SyntaxKind::SupertypeList => p.list(ListKind::Supertypes),
        SyntaxKind::SupertypeEntry => Node::SuperTypeEntry {
            type_ref: p.require(p.find_type(), "type")?,
            arguments: p.find(SyntaxKind::ValueArgumentList),
        },
        SyntaxKind::TypeParameterList => p.list(ListKind::TypeParameters),
        SyntaxKind::TypeParameter => Node::TypeParameter {
            modifiers: p.find(SyntaxKind::ModifierList),
            name: p.require(p.find(SyntaxKind::Name), "name")?,
            bound: p.after(SyntaxKind::Colon, "bound")?,
        },
        SyntaxKind::FunctionDeclaration => lower_function(&p)?,
        SyntaxKind::Parameter => Node::FunctionParameter {
            modifiers: p.find(SyntaxKind::ModifierList),
            val_or_var: p.find(SyntaxKind::Keyword),
            name: p.require(p.find(SyntaxKind::Name), "name")?,
            type_ref: p.after(SyntaxKind::Colon, "type")?,
            default_value: p.after(SyntaxKind::Eq, "default value")?,
        },
        SyntaxKind::ParameterList => p.list(ListKind::Parameters),
        SyntaxKind::PropertyDeclaration => Node::PropertyDeclaration {
            modifiers: p.find(SyntaxKind::ModifierList),
            val_or_var: p.require(p.find(SyntaxKind::Keyword), "val or var")?,
            variable: p.require(p.find(SyntaxKind::Variable), "variable")?,
            initializer: p.after(SyntaxKind::Eq, "initializer")?,
        },
        SyntaxKind::Variable => Node::Variable {
            name: p.require(p.find(SyntaxKind::Name), "name")?,
            type_ref: p.after(SyntaxKind::Colon, "type")?,
        },
        SyntaxKind::TypealiasDeclaration => Node::TypeAlias {
            modifiers: p.find(SyntaxKind::ModifierList),
            name: p.require(p.find(SyntaxKind::Name), "name")?,
            type_parameters: p.find(SyntaxKind::TypeParameterList),
            type_ref: p.require(p.node_after(SyntaxKind::Eq), "type")?,
        },

        SyntaxKind::Block => Node::Block {
            statements: p.nodes(),
        },
        SyntaxKind::Lambda => {
            let parameters = p.find(SyntaxKind::LambdaParameterList);
            let statements = p
                .nodes()
                .into_iter()
                .filter(|id| Some(*id) != parameters)
                .collect();
            Node::Lambda {
                parameters,
                statements,
            }
        }
        SyntaxKind::LambdaParameterList => p.list(ListKind::LambdaParameters),
        SyntaxKind::IfExpr => Node::If {
            condition: p.require(p.node_after(SyntaxKind::LParen), "condition")?,
            then_branch: p.require(p.node_after(SyntaxKind::RParen), "then branch")?,
            else_branch: p.after(SyntaxKind::ElseKw, "else branch")?,
        },
        SyntaxKind::WhenExpr => Node::When {
            subject: p.node_after(SyntaxKind::LParen),
            entries: p.require(p.find(SyntaxKind::WhenEntryList), "entries")?,
        },
        SyntaxKind::WhenEntryList => p.list(ListKind::WhenEntries),
        SyntaxKind::WhenEntry => {
            let conditions = p.nodes_before(SyntaxKind::Arrow);
            if conditions.is_empty() && !p.has_token(SyntaxKind::ElseKw) {
                return Err(p.missing("condition"));
            }
            Node::WhenEntry {
                conditions,
                body: p.require(p.node_after(SyntaxKind::Arrow), "body")?,
            }
        }
        SyntaxKind::WhenCondition => {
            let operator = p.require(p.find(SyntaxKind::Keyword), "operator")?;
            let target = p.nodes().into_iter().find(|id| *id != operator);
            Node::WhenCondition {
                operator,
                target: p.require(target, "target")?,
            }
        }
        SyntaxKind::WhileExpr => Node::While {
            condition: p.require(p.node_after(SyntaxKind::LParen), "condition")?,
            body: p.require(p.node_after(SyntaxKind::RParen), "body")?,
        },
        SyntaxKind::DoWhileExpr => Node::DoWhile {
            body: p.require(p.node_after(SyntaxKind::DoKw), "body")?,
            condition: p.require(p.node_after(SyntaxKind::LParen), "condition")?,
        },
        SyntaxKind::ForExpr => Node::For {
            variable: p.require(p.find(SyntaxKind::Variable), "variable")?,
            iterable: p.require(p.node_after(SyntaxKind::InKw), "iterable")?,
            body: p.require(p.node_after(SyntaxKind::RParen), "body")?,
        },
        SyntaxKind::TryExpr => Node::Try {
            block: p.require(p.node_after(SyntaxKind::TryKw), "block")?,
            catches: p.find_all(SyntaxKind::CatchClause),
            finally_block: p.after(SyntaxKind::FinallyKw, "finally block")?,
        },
        SyntaxKind::CatchClause => Node::CatchClause {
            parameter: p.require(p.find(SyntaxKind::Variable), "parameter")?,
            block: p.require(p.find(SyntaxKind::Block), "block")?,
        },
        SyntaxKind::ReturnExpr => Node::Return {
            expression: p.nth_node(0),
        },
        SyntaxKind::ThrowExpr => Node::Throw {
            expression: p.require(p.nth_node(0), "expression")?,
        },
        SyntaxKind::BreakExpr => Node::Break,
        SyntaxKind::ContinueExpr => Node::Continue,

        SyntaxKind::CallExpr => {
            let callee = p.require(p.nth_node(0), "callee")?;
            let rest = &parts[1..];
            let rest = Parts {
                parts: rest,
                production,
                range,
            };
            Node::Call {
                callee,
                type_arguments: rest.find(SyntaxKind::TypeArgumentList),
                arguments: rest.find(SyntaxKind::ValueArgumentList),
                lambda: rest.find(SyntaxKind::Lambda),
            }
        }
        SyntaxKind::ValueArgumentList => p.list(ListKind::ValueArguments),
        SyntaxKind::ValueArgument => {
            if p.has_token(SyntaxKind::Eq) {
                Node::ValueArgument {
                    name: Some(p.require(p.find(SyntaxKind::Name), "name")?),
                    spread: p.has_token(SyntaxKind::Star),
                    value: p.require(p.node_after(SyntaxKind::Eq), "value")?,
                }
            } else {
                Node::ValueArgument {
                    name: None,
                    spread: p.has_token(SyntaxKind::Star),
                    value: p.require(p.nth_node(0), "value")?,
                }
            }
        }
        SyntaxKind::BinaryExpr => Node::Binary {
            lhs: p.require(p.nth_node(0), "left operand")?,
            operator: p.require(p.nth_node(1), "operator")?,
            rhs: p.require(p.nth_node(2), "right operand")?,
        },
        SyntaxKind::BinaryTypeExpr => Node::BinaryType {
            lhs: p.require(p.nth_node(0), "left operand")?,
            operator: p.require(p.nth_node(1), "operator")?,
            rhs: p.require(p.nth_node(2), "type")?,
        },
        SyntaxKind::PrefixExpr => Node::Prefix {
            operator: p.require(p.nth_node(0), "operator")?,
            operand: p.require(p.nth_node(1), "operand")?,
        },
        SyntaxKind::PostfixExpr => Node::Postfix {
            operand: p.require(p.nth_node(0), "operand")?,
            operator: p.require(p.nth_node(1), "operator")?,
        },
        SyntaxKind::NavigationExpr => Node::Navigation {
            receiver: p.require(p.nth_node(0), "receiver")?,
            operator: p.require(p.nth_node(1), "operator")?,
            selector: p.require(p.nth_node(2), "selector")?,
        },
        SyntaxKind::IndexExpr => Node::IndexAccess {
            receiver: p.require(p.nth_node(0), "receiver")?,
            indices: p.require(p.find(SyntaxKind::IndexList), "indices")?,
        },
        SyntaxKind::IndexList => p.list(ListKind::Indices),
        SyntaxKind::ParenExpr => Node::Parenthesized {
            inner: p.require(p.nth_node(0), "expression")?,
        },
        SyntaxKind::StringTemplate => Node::StringLiteral {
            raw: matches!(p.token(), Some((SyntaxKind::TripleQuoteOpen, _))),
            entries: p.nodes(),
        },
        SyntaxKind::LiteralStringEntry => {
            let (_, text) = p.token().ok_or_else(|| p.unmapped())?;
            Node::LiteralStringEntry {
                text: text.to_string(),
            }
        }
        SyntaxKind::ShortTemplateEntry => Node::TemplateStringEntry {
            expression: p.require(p.nth_node(0), "expression")?,
            short: true,
        },
        SyntaxKind::LongTemplateEntry => Node::TemplateStringEntry {
            expression: p.require(p.nth_node(0), "expression")?,
            short: false,
        },
        SyntaxKind::Literal => {
            let (kind, text) = p.token().ok_or_else(|| p.unmapped())?;
            let kind = match kind {
                SyntaxKind::TrueKw | SyntaxKind::FalseKw => ConstantKind::Boolean,
                SyntaxKind::CharLiteral => ConstantKind::Character,
                SyntaxKind::IntLiteral => ConstantKind::Integer,
                SyntaxKind::RealLiteral => ConstantKind::Real,
                SyntaxKind::NullKw => ConstantKind::Null,
                _ => return Err(p.unmapped()),
            };
            Node::ConstantLiteral {
                kind,
                text: text.to_string(),
            }
        }
        SyntaxKind::ThisExpr => Node::This,

        SyntaxKind::SimpleType => Node::SimpleType { pieces: p.nodes() },
        SyntaxKind::SimpleTypePiece => Node::SimpleTypePiece {
            name: p.require(p.find(SyntaxKind::Name), "name")?,
            type_arguments: p.find(SyntaxKind::TypeArgumentList),
        },
        SyntaxKind::NullableType => Node::NullableType {
            inner: p.require(p.nth_node(0), "type")?,
        },
        SyntaxKind::ParenType => Node::ParenthesizedType {
            inner: p.require(p.nth_node(0), "type")?,
        },
        SyntaxKind::FunctionType => {
            let parameters = p.require(
                p.find(SyntaxKind::FunctionTypeParameterList),
                "parameter list",
            )?;
            let receiver = p.nth_node(0).filter(|id| *id != parameters);
            Node::FunctionType {
                receiver,
                parameters,
                return_type: p.require(p.node_after(SyntaxKind::Arrow), "return type")?,
            }
        }
        SyntaxKind::FunctionTypeParameterList => p.list(ListKind::FunctionTypeParameters),
        SyntaxKind::TypeArgumentList => p.list(ListKind::TypeArguments),
        SyntaxKind::TypeProjection => {
            if p.has_token(SyntaxKind::Star) {
                Node::TypeProjection {
                    variance: None,
                    type_ref: None,
                }
            } else {
                Node::TypeProjection {
                    variance: p.find(SyntaxKind::Modifier),
                    type_ref: Some(p.require(p.find_type(), "type")?),
                }
            }
        }

        _ => return Err(p.unmapped()),
    };
    Ok(node)
}

fn lower_function(p: &Parts<'_>) -> Result<Node> {
    let mut modifiers = None;
    let mut type_parameters = None;
    let mut receiver_type = None;
    let mut name = None;
    let mut parameters = None;
    let mut return_type = None;
    let mut body = None;

    let mut after_colon = false;
    let mut after_eq = false;
    for part in p.parts {
        match part {
            Part::Token {
                kind: SyntaxKind::Colon,
                ..
            } => after_colon = true,
            Part::Token {
                kind: SyntaxKind::Eq,
                ..
            } => after_eq = true,
            Part::Token { .. } => {}
            Part::Node { kind, id } => match kind {
                _ if after_eq => body = Some(*id),
                SyntaxKind::Block => body = Some(*id),
                SyntaxKind::ModifierList => modifiers = Some(*id),
                SyntaxKind::TypeParameterList => type_parameters = Some(*id),
                SyntaxKind::Name if name.is_none() => name = Some(*id),
                SyntaxKind::ParameterList => parameters = Some(*id),
                kind if is_type(*kind) && after_colon => return_type = Some(*id),
                kind if is_type(*kind) && name.is_none() => receiver_type = Some(*id),
                _ => return Err(p.unmapped()),
            },
        }
    }

    Ok(Node::FunctionDeclaration {
        modifiers,
        type_parameters,
        receiver_type,
        name: p.require(name, "name")?,
        parameters: p.require(parameters, "parameter list")?,
        return_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::trivia::TriviaKind;

    fn build(source: &str) -> Constructed {
        construct(&ktast_syntax::parse(source), true).unwrap()
    }

    fn statements(unit: &Constructed) -> Vec<NodeId> {
        match &unit.ast[unit.root] {
            Node::KotlinFile { statements, .. } => statements.clone(),
            other => panic!("expected a file, got {other:?}"),
        }
    }

    #[test]
    fn test_property_with_trailing_comment() {
        let unit = build("val x = \"\" // x is empty");
        let [property] = statements(&unit)[..] else {
            panic!("expected one statement");
        };
        let Node::PropertyDeclaration {
            initializer: Some(value),
            ..
        } = &unit.ast[property]
        else {
            panic!("expected an initialized property");
        };
        assert!(matches!(unit.ast[*value], Node::StringLiteral { raw: false, .. }));
        assert_eq!(
            unit.trivia.after(*value),
            &[Trivia::whitespace(" "), Trivia::line_comment("// x is empty")]
        );
    }

    #[test]
    fn test_terminator_belongs_to_previous_statement() {
        let unit = build("a; b");
        let [a, b] = statements(&unit)[..] else {
            panic!("expected two statements");
        };
        assert_eq!(unit.trivia.after(a), &[Trivia::terminator()]);
        assert_eq!(unit.trivia.before(b), &[Trivia::whitespace(" ")]);
    }

    #[test]
    fn test_within_gaps() {
        let unit = build("if /* c */ (x) y");
        let [stmt] = statements(&unit)[..] else {
            panic!("expected one statement");
        };
        assert_eq!(unit.trivia.within(stmt), &[
            Trivia::whitespace(" "),
            Trivia::block_comment("/* c */"),
            Trivia::whitespace(" "),
        ]);

        let unit = build("fun f( ) {\n}");
        let [function] = statements(&unit)[..] else {
            panic!("expected one statement");
        };
        let Node::FunctionDeclaration {
            parameters,
            body: Some(body),
            ..
        } = &unit.ast[function]
        else {
            panic!("expected a function");
        };
        assert_eq!(unit.trivia.within(*parameters), &[Trivia::whitespace(" ")]);
        assert_eq!(unit.trivia.within(*body), &[Trivia::newline()]);
    }

    #[test]
    fn test_trailing_comma_is_trivia() {
        let unit = build("f(a, b,)");
        let [call] = statements(&unit)[..] else {
            panic!("expected one statement");
        };
        let Node::Call {
            arguments: Some(arguments),
            ..
        } = &unit.ast[call]
        else {
            panic!("expected a call");
        };
        let Node::List { elements, .. } = &unit.ast[*arguments] else {
            panic!("expected a list");
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(unit.trivia.after(elements[1]), &[Trivia::trailing_comma()]);
    }

    #[test]
    fn test_empty_file_keeps_trivia_within() {
        let unit = build("  // nothing\n");
        assert!(statements(&unit).is_empty());
        let kinds: Vec<TriviaKind> = unit
            .trivia
            .within(unit.root)
            .iter()
            .map(|trivia| trivia.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![TriviaKind::Whitespace, TriviaKind::LineComment, TriviaKind::Newline]
        );
    }

    #[test]
    fn test_strict_refuses_error_markers() {
        let err = construct(&ktast_syntax::parse("val = 1"), true).unwrap_err();
        assert!(matches!(
            err,
            Error::Construction(ConstructionError::ErrorMarkers { ref markers }) if !markers.is_empty()
        ));
    }

    #[test]
    fn test_lenient_meets_error_node() {
        let err = construct(&ktast_syntax::parse("val x = )"), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_dynamic_type_is_unsupported() {
        let err = construct(&ktast_syntax::parse("val x: dynamic = 1"), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedShape);
        assert!(err.is_skippable());
    }

    #[test]
    fn test_function_parts() {
        let unit = build("fun <T> List<T>.second(): T = this[1]");
        let [function] = statements(&unit)[..] else {
            panic!("expected one statement");
        };
        let Node::FunctionDeclaration {
            type_parameters,
            receiver_type,
            name,
            return_type,
            body,
            ..
        } = &unit.ast[function]
        else {
            panic!("expected a function");
        };
        assert!(type_parameters.is_some());
        assert!(matches!(unit.ast[receiver_type.unwrap()], Node::SimpleType { .. }));
        assert_eq!(unit.ast.name_text(*name), Some("second"));
        assert!(matches!(unit.ast[return_type.unwrap()], Node::SimpleType { .. }));
        assert!(matches!(unit.ast[body.unwrap()], Node::IndexAccess { .. }));
    }

    #[test]
    fn test_when_entries() {
        let unit = build("when (x) {\n    1, 2 -> a\n    is String -> b\n    else -> c\n}");
        let [when] = statements(&unit)[..] else {
            panic!("expected one statement");
        };
        let Node::When {
            subject: Some(_),
            entries,
        } = &unit.ast[when]
        else {
            panic!("expected a when with subject");
        };
        let Node::List { elements, .. } = &unit.ast[*entries] else {
            panic!("expected a list");
        };
        let counts: Vec<usize> = elements
            .iter()
            .map(|id| match &unit.ast[*id] {
                Node::WhenEntry { conditions, .. } => conditions.len(),
                other => panic!("expected an entry, got {other:?}"),
            })
            .collect();
        assert_eq!(counts, vec![2, 1, 0]);
    }
}
