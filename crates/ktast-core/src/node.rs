//! AST node model
//!
//! Nodes live in an append-only arena ([`Ast`]) and are addressed by
//! [`NodeId`]. The id is the node's identity: two structurally equal nodes
//! allocated separately have different ids, and trivia is keyed by id.
//!
//! [`Node`] is a closed enum. Each variant's fields fully determine its
//! children, and [`Node::for_each_child`] yields them in source order.

use std::fmt;
use std::ops::Index;

/// Handle of a node in an [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Append-only node arena
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its fresh identity
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        assert!(id.0 != u32::MAX, "AST arena is full");
        self.nodes.push(node);
        id
    }

    /// The node behind `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated in this arena.
    pub fn get(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.index()) {
            Some(node) => node,
            None => panic!("node {id} is outside the arena of {} nodes", self.nodes.len()),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Text of a [`Node::NameExpression`], if `id` is one
    pub fn name_text(&self, id: NodeId) -> Option<&str> {
        match self.get(id) {
            Node::NameExpression { text } => Some(text),
            _ => None,
        }
    }

    /// Allocate a [`Node::NameExpression`]
    pub fn name(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::NameExpression { text: text.into() })
    }

    /// Allocate a [`Node::Keyword`]
    pub fn keyword(&mut self, keyword: Keyword) -> NodeId {
        self.alloc(Node::Keyword { keyword })
    }

    /// Allocate a [`Node::List`]
    pub fn list(&mut self, kind: ListKind, elements: Vec<NodeId>) -> NodeId {
        self.alloc(Node::List { kind, elements })
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}

/// Bracket-like shapes of [`Node::List`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Modifiers,
    QualifiedName,
    TypeParameters,
    TypeArguments,
    Parameters,
    ValueArguments,
    LambdaParameters,
    FunctionTypeParameters,
    Supertypes,
    Indices,
    WhenEntries,
}

impl ListKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ListKind::TypeParameters | ListKind::TypeArguments => "<",
            ListKind::Parameters | ListKind::ValueArguments | ListKind::FunctionTypeParameters => {
                "("
            }
            ListKind::Supertypes => ":",
            ListKind::Indices => "[",
            ListKind::WhenEntries => "{",
            ListKind::Modifiers | ListKind::QualifiedName | ListKind::LambdaParameters => "",
        }
    }

    /// Separator token between elements; modifiers and when entries are
    /// separated by whitespace only
    pub fn separator(self) -> &'static str {
        match self {
            ListKind::QualifiedName => ".",
            ListKind::Modifiers | ListKind::WhenEntries => "",
            _ => ",",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ListKind::TypeParameters | ListKind::TypeArguments => ">",
            ListKind::Parameters | ListKind::ValueArguments | ListKind::FunctionTypeParameters => {
                ")"
            }
            ListKind::LambdaParameters => "->",
            ListKind::Indices => "]",
            ListKind::WhenEntries => "}",
            ListKind::Modifiers | ListKind::QualifiedName | ListKind::Supertypes => "",
        }
    }

    /// Lists whose elements are laid out one per line
    pub fn is_statement_like(self) -> bool {
        self == ListKind::WhenEntries
    }
}

/// Soft keywords usable as modifiers, plus the `in` variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKeyword {
    Public,
    Private,
    Protected,
    Internal,
    Abstract,
    Open,
    Final,
    Override,
    Data,
    Enum,
    Sealed,
    Inner,
    Inline,
    Suspend,
    Const,
    Lateinit,
    Companion,
    Operator,
    Infix,
    Tailrec,
    External,
    Vararg,
    Noinline,
    Crossinline,
    Reified,
    Annotation,
    Value,
    Out,
    In,
}

impl ModifierKeyword {
    const ALL: &'static [ModifierKeyword] = &[
        ModifierKeyword::Public,
        ModifierKeyword::Private,
        ModifierKeyword::Protected,
        ModifierKeyword::Internal,
        ModifierKeyword::Abstract,
        ModifierKeyword::Open,
        ModifierKeyword::Final,
        ModifierKeyword::Override,
        ModifierKeyword::Data,
        ModifierKeyword::Enum,
        ModifierKeyword::Sealed,
        ModifierKeyword::Inner,
        ModifierKeyword::Inline,
        ModifierKeyword::Suspend,
        ModifierKeyword::Const,
        ModifierKeyword::Lateinit,
        ModifierKeyword::Companion,
        ModifierKeyword::Operator,
        ModifierKeyword::Infix,
        ModifierKeyword::Tailrec,
        ModifierKeyword::External,
        ModifierKeyword::Vararg,
        ModifierKeyword::Noinline,
        ModifierKeyword::Crossinline,
        ModifierKeyword::Reified,
        ModifierKeyword::Annotation,
        ModifierKeyword::Value,
        ModifierKeyword::Out,
        ModifierKeyword::In,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModifierKeyword::Public => "public",
            ModifierKeyword::Private => "private",
            ModifierKeyword::Protected => "protected",
            ModifierKeyword::Internal => "internal",
            ModifierKeyword::Abstract => "abstract",
            ModifierKeyword::Open => "open",
            ModifierKeyword::Final => "final",
            ModifierKeyword::Override => "override",
            ModifierKeyword::Data => "data",
            ModifierKeyword::Enum => "enum",
            ModifierKeyword::Sealed => "sealed",
            ModifierKeyword::Inner => "inner",
            ModifierKeyword::Inline => "inline",
            ModifierKeyword::Suspend => "suspend",
            ModifierKeyword::Const => "const",
            ModifierKeyword::Lateinit => "lateinit",
            ModifierKeyword::Companion => "companion",
            ModifierKeyword::Operator => "operator",
            ModifierKeyword::Infix => "infix",
            ModifierKeyword::Tailrec => "tailrec",
            ModifierKeyword::External => "external",
            ModifierKeyword::Vararg => "vararg",
            ModifierKeyword::Noinline => "noinline",
            ModifierKeyword::Crossinline => "crossinline",
            ModifierKeyword::Reified => "reified",
            ModifierKeyword::Annotation => "annotation",
            ModifierKeyword::Value => "value",
            ModifierKeyword::Out => "out",
            ModifierKeyword::In => "in",
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|modifier| modifier.as_str() == text)
    }
}

/// Fixed tokens that carry meaning: declaration keywords, operators and
/// navigation tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Val,
    Var,
    Class,
    Interface,
    Object,
    Dot,
    SafeDot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Excl,
    ExclExcl,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Range,
    Elvis,
    In,
    NotIn,
    Is,
    NotIs,
    As,
    AsSafe,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Val => "val",
            Keyword::Var => "var",
            Keyword::Class => "class",
            Keyword::Interface => "interface",
            Keyword::Object => "object",
            Keyword::Dot => ".",
            Keyword::SafeDot => "?.",
            Keyword::Plus => "+",
            Keyword::Minus => "-",
            Keyword::Star => "*",
            Keyword::Slash => "/",
            Keyword::Percent => "%",
            Keyword::PlusPlus => "++",
            Keyword::MinusMinus => "--",
            Keyword::Excl => "!",
            Keyword::ExclExcl => "!!",
            Keyword::Assign => "=",
            Keyword::PlusAssign => "+=",
            Keyword::MinusAssign => "-=",
            Keyword::StarAssign => "*=",
            Keyword::SlashAssign => "/=",
            Keyword::PercentAssign => "%=",
            Keyword::EqEq => "==",
            Keyword::NotEq => "!=",
            Keyword::EqEqEq => "===",
            Keyword::NotEqEq => "!==",
            Keyword::Lt => "<",
            Keyword::Gt => ">",
            Keyword::LtEq => "<=",
            Keyword::GtEq => ">=",
            Keyword::AndAnd => "&&",
            Keyword::OrOr => "||",
            Keyword::Range => "..",
            Keyword::Elvis => "?:",
            Keyword::In => "in",
            Keyword::NotIn => "!in",
            Keyword::Is => "is",
            Keyword::NotIs => "!is",
            Keyword::As => "as",
            Keyword::AsSafe => "as?",
        }
    }

    /// Keyword for a front-end token kind
    pub fn from_syntax(kind: ktast_syntax::SyntaxKind) -> Option<Self> {
        use ktast_syntax::SyntaxKind as K;

        let keyword = match kind {
            K::ValKw => Keyword::Val,
            K::VarKw => Keyword::Var,
            K::ClassKw => Keyword::Class,
            K::InterfaceKw => Keyword::Interface,
            K::ObjectKw => Keyword::Object,
            K::Dot => Keyword::Dot,
            K::SafeDot => Keyword::SafeDot,
            K::Plus => Keyword::Plus,
            K::Minus => Keyword::Minus,
            K::Star => Keyword::Star,
            K::Slash => Keyword::Slash,
            K::Percent => Keyword::Percent,
            K::PlusPlus => Keyword::PlusPlus,
            K::MinusMinus => Keyword::MinusMinus,
            K::Excl => Keyword::Excl,
            K::ExclExcl => Keyword::ExclExcl,
            K::Eq => Keyword::Assign,
            K::PlusEq => Keyword::PlusAssign,
            K::MinusEq => Keyword::MinusAssign,
            K::StarEq => Keyword::StarAssign,
            K::SlashEq => Keyword::SlashAssign,
            K::PercentEq => Keyword::PercentAssign,
            K::EqEq => Keyword::EqEq,
            K::NotEq => Keyword::NotEq,
            K::EqEqEq => Keyword::EqEqEq,
            K::NotEqEq => Keyword::NotEqEq,
            K::Lt => Keyword::Lt,
            K::Gt => Keyword::Gt,
            K::LtEq => Keyword::LtEq,
            K::GtEq => Keyword::GtEq,
            K::AndAnd => Keyword::AndAnd,
            K::OrOr => Keyword::OrOr,
            K::Range => Keyword::Range,
            K::Elvis => Keyword::Elvis,
            K::InKw => Keyword::In,
            K::NotIn => Keyword::NotIn,
            K::IsKw => Keyword::Is,
            K::NotIs => Keyword::NotIs,
            K::AsKw => Keyword::As,
            K::AsSafe => Keyword::AsSafe,
            _ => return None,
        };
        Some(keyword)
    }

    /// Operators written without surrounding spaces in canonical output
    pub fn is_tight(self) -> bool {
        matches!(self, Keyword::Range | Keyword::Dot | Keyword::SafeDot)
    }
}

/// Kind of a [`Node::ConstantLiteral`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Boolean,
    Character,
    Integer,
    Real,
    Null,
}

/// An AST node
///
/// `Option` fields are absent syntax, `Vec` fields are plain sequences, and
/// bracketed or separated sequences are [`Node::List`] children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // File
    KotlinFile {
        package: Option<NodeId>,
        imports: Vec<NodeId>,
        statements: Vec<NodeId>,
    },
    PackageDirective {
        name: NodeId,
    },
    ImportDirective {
        name: NodeId,
        wildcard: bool,
        alias: Option<NodeId>,
    },

    // Declarations
    ClassDeclaration {
        modifiers: Option<NodeId>,
        declaration_keyword: NodeId,
        name: Option<NodeId>,
        type_parameters: Option<NodeId>,
        primary_constructor: Option<NodeId>,
        supertypes: Option<NodeId>,
        body: Option<NodeId>,
    },
    ClassBody {
        members: Vec<NodeId>,
    },
    SuperTypeEntry {
        type_ref: NodeId,
        arguments: Option<NodeId>,
    },
    FunctionDeclaration {
        modifiers: Option<NodeId>,
        type_parameters: Option<NodeId>,
        receiver_type: Option<NodeId>,
        name: NodeId,
        parameters: NodeId,
        return_type: Option<NodeId>,
        /// A [`Node::Block`] body, or the expression of an `= expr` body
        body: Option<NodeId>,
    },
    FunctionParameter {
        modifiers: Option<NodeId>,
        val_or_var: Option<NodeId>,
        name: NodeId,
        type_ref: Option<NodeId>,
        default_value: Option<NodeId>,
    },
    PropertyDeclaration {
        modifiers: Option<NodeId>,
        val_or_var: NodeId,
        variable: NodeId,
        initializer: Option<NodeId>,
    },
    Variable {
        name: NodeId,
        type_ref: Option<NodeId>,
    },
    TypeAlias {
        modifiers: Option<NodeId>,
        name: NodeId,
        type_parameters: Option<NodeId>,
        type_ref: NodeId,
    },
    TypeParameter {
        modifiers: Option<NodeId>,
        name: NodeId,
        bound: Option<NodeId>,
    },

    // Statements and control flow
    Block {
        statements: Vec<NodeId>,
    },
    Lambda {
        parameters: Option<NodeId>,
        statements: Vec<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    When {
        subject: Option<NodeId>,
        entries: NodeId,
    },
    /// `else` entries have no conditions
    WhenEntry {
        conditions: Vec<NodeId>,
        body: NodeId,
    },
    WhenCondition {
        operator: NodeId,
        target: NodeId,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    For {
        variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    Try {
        block: NodeId,
        catches: Vec<NodeId>,
        finally_block: Option<NodeId>,
    },
    CatchClause {
        parameter: NodeId,
        block: NodeId,
    },
    Return {
        expression: Option<NodeId>,
    },
    Throw {
        expression: NodeId,
    },
    Break,
    Continue,

    // Expressions
    Call {
        callee: NodeId,
        type_arguments: Option<NodeId>,
        arguments: Option<NodeId>,
        lambda: Option<NodeId>,
    },
    ValueArgument {
        name: Option<NodeId>,
        spread: bool,
        value: NodeId,
    },
    Binary {
        lhs: NodeId,
        operator: NodeId,
        rhs: NodeId,
    },
    BinaryType {
        lhs: NodeId,
        operator: NodeId,
        rhs: NodeId,
    },
    Prefix {
        operator: NodeId,
        operand: NodeId,
    },
    Postfix {
        operand: NodeId,
        operator: NodeId,
    },
    Navigation {
        receiver: NodeId,
        operator: NodeId,
        selector: NodeId,
    },
    IndexAccess {
        receiver: NodeId,
        indices: NodeId,
    },
    Parenthesized {
        inner: NodeId,
    },
    StringLiteral {
        raw: bool,
        entries: Vec<NodeId>,
    },
    /// Literal text as written, escapes included
    LiteralStringEntry {
        text: String,
    },
    TemplateStringEntry {
        expression: NodeId,
        short: bool,
    },
    ConstantLiteral {
        kind: ConstantKind,
        text: String,
    },
    /// Identifier as written, back-quotes included
    NameExpression {
        text: String,
    },
    This,

    // Types
    SimpleType {
        pieces: Vec<NodeId>,
    },
    SimpleTypePiece {
        name: NodeId,
        type_arguments: Option<NodeId>,
    },
    NullableType {
        inner: NodeId,
    },
    ParenthesizedType {
        inner: NodeId,
    },
    FunctionType {
        receiver: Option<NodeId>,
        parameters: NodeId,
        return_type: NodeId,
    },
    /// A star projection has neither variance nor type
    TypeProjection {
        variance: Option<NodeId>,
        type_ref: Option<NodeId>,
    },

    // Leaves
    Modifier {
        keyword: ModifierKeyword,
    },
    Keyword {
        keyword: Keyword,
    },

    List {
        kind: ListKind,
        elements: Vec<NodeId>,
    },
}

impl Node {
    /// Variant name, used by dumps and error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::KotlinFile { .. } => "KotlinFile",
            Node::PackageDirective { .. } => "PackageDirective",
            Node::ImportDirective { .. } => "ImportDirective",
            Node::ClassDeclaration { .. } => "ClassDeclaration",
            Node::ClassBody { .. } => "ClassBody",
            Node::SuperTypeEntry { .. } => "SuperTypeEntry",
            Node::FunctionDeclaration { .. } => "FunctionDeclaration",
            Node::FunctionParameter { .. } => "FunctionParameter",
            Node::PropertyDeclaration { .. } => "PropertyDeclaration",
            Node::Variable { .. } => "Variable",
            Node::TypeAlias { .. } => "TypeAlias",
            Node::TypeParameter { .. } => "TypeParameter",
            Node::Block { .. } => "Block",
            Node::Lambda { .. } => "Lambda",
            Node::If { .. } => "If",
            Node::When { .. } => "When",
            Node::WhenEntry { .. } => "WhenEntry",
            Node::WhenCondition { .. } => "WhenCondition",
            Node::While { .. } => "While",
            Node::DoWhile { .. } => "DoWhile",
            Node::For { .. } => "For",
            Node::Try { .. } => "Try",
            Node::CatchClause { .. } => "CatchClause",
            Node::Return { .. } => "Return",
            Node::Throw { .. } => "Throw",
            Node::Break => "Break",
            Node::Continue => "Continue",
            Node::Call { .. } => "Call",
            Node::ValueArgument { .. } => "ValueArgument",
            Node::Binary { .. } => "Binary",
            Node::BinaryType { .. } => "BinaryType",
            Node::Prefix { .. } => "Prefix",
            Node::Postfix { .. } => "Postfix",
            Node::Navigation { .. } => "Navigation",
            Node::IndexAccess { .. } => "IndexAccess",
            Node::Parenthesized { .. } => "Parenthesized",
            Node::StringLiteral { .. } => "StringLiteral",
            Node::LiteralStringEntry { .. } => "LiteralStringEntry",
            Node::TemplateStringEntry { .. } => "TemplateStringEntry",
            Node::ConstantLiteral { .. } => "ConstantLiteral",
            Node::NameExpression { .. } => "NameExpression",
            Node::This => "This",
            Node::SimpleType { .. } => "SimpleType",
            Node::SimpleTypePiece { .. } => "SimpleTypePiece",
            Node::NullableType { .. } => "NullableType",
            Node::ParenthesizedType { .. } => "ParenthesizedType",
            Node::FunctionType { .. } => "FunctionType",
            Node::TypeProjection { .. } => "TypeProjection",
            Node::Modifier { .. } => "Modifier",
            Node::Keyword { .. } => "Keyword",
            Node::List { .. } => "List",
        }
    }

    /// Variants without child fields
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::Break
                | Node::Continue
                | Node::LiteralStringEntry { .. }
                | Node::ConstantLiteral { .. }
                | Node::NameExpression { .. }
                | Node::This
                | Node::Modifier { .. }
                | Node::Keyword { .. }
        )
    }

    /// Declarations that a preceding modifier-named statement could merge into
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Node::ClassDeclaration { .. }
                | Node::FunctionDeclaration { .. }
                | Node::PropertyDeclaration { .. }
                | Node::TypeAlias { .. }
        )
    }

    /// Visit children in source order
    pub fn for_each_child(&self, mut f: impl FnMut(NodeId)) {
        let opt = |id: &Option<NodeId>, f: &mut dyn FnMut(NodeId)| {
            if let Some(id) = id {
                f(*id);
            }
        };

        match self {
            Node::KotlinFile {
                package,
                imports,
                statements,
            } => {
                opt(package, &mut f);
                imports.iter().copied().for_each(&mut f);
                statements.iter().copied().for_each(&mut f);
            }
            Node::PackageDirective { name } => f(*name),
            Node::ImportDirective { name, alias, .. } => {
                f(*name);
                opt(alias, &mut f);
            }
            Node::ClassDeclaration {
                modifiers,
                declaration_keyword,
                name,
                type_parameters,
                primary_constructor,
                supertypes,
                body,
            } => {
                opt(modifiers, &mut f);
                f(*declaration_keyword);
                opt(name, &mut f);
                opt(type_parameters, &mut f);
                opt(primary_constructor, &mut f);
                opt(supertypes, &mut f);
                opt(body, &mut f);
            }
            Node::ClassBody { members } => members.iter().copied().for_each(&mut f),
            Node::SuperTypeEntry {
                type_ref,
                arguments,
            } => {
                f(*type_ref);
                opt(arguments, &mut f);
            }
            Node::FunctionDeclaration {
                modifiers,
                type_parameters,
                receiver_type,
                name,
                parameters,
                return_type,
                body,
            } => {
                opt(modifiers, &mut f);
                opt(type_parameters, &mut f);
                opt(receiver_type, &mut f);
                f(*name);
                f(*parameters);
                opt(return_type, &mut f);
                opt(body, &mut f);
            }
            Node::FunctionParameter {
                modifiers,
                val_or_var,
                name,
                type_ref,
                default_value,
            } => {
                opt(modifiers, &mut f);
                opt(val_or_var, &mut f);
                f(*name);
                opt(type_ref, &mut f);
                opt(default_value, &mut f);
            }
            Node::PropertyDeclaration {
                modifiers,
                val_or_var,
                variable,
                initializer,
            } => {
                opt(modifiers, &mut f);
                f(*val_or_var);
                f(*variable);
                opt(initializer, &mut f);
            }
            Node::Variable { name, type_ref } => {
                f(*name);
                opt(type_ref, &mut f);
            }
            Node::TypeAlias {
                modifiers,
                name,
                type_parameters,
                type_ref,
            } => {
                opt(modifiers, &mut f);
                f(*name);
                opt(type_parameters, &mut f);
                f(*type_ref);
            }
            Node::TypeParameter {
                modifiers,
                name,
                bound,
            } => {
                opt(modifiers, &mut f);
                f(*name);
                opt(bound, &mut f);
            }
            Node::Block { statements } => statements.iter().copied().for_each(&mut f),
            Node::Lambda {
                parameters,
                statements,
            } => {
                opt(parameters, &mut f);
                statements.iter().copied().for_each(&mut f);
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                f(*condition);
                f(*then_branch);
                opt(else_branch, &mut f);
            }
            Node::When { subject, entries } => {
                opt(subject, &mut f);
                f(*entries);
            }
            Node::WhenEntry { conditions, body } => {
                conditions.iter().copied().for_each(&mut f);
                f(*body);
            }
            Node::WhenCondition { operator, target } => {
                f(*operator);
                f(*target);
            }
            Node::While { condition, body } => {
                f(*condition);
                f(*body);
            }
            Node::DoWhile { body, condition } => {
                f(*body);
                f(*condition);
            }
            Node::For {
                variable,
                iterable,
                body,
            } => {
                f(*variable);
                f(*iterable);
                f(*body);
            }
            Node::Try {
                block,
                catches,
                finally_block,
            } => {
                f(*block);
                catches.iter().copied().for_each(&mut f);
                opt(finally_block, &mut f);
            }
            Node::CatchClause { parameter, block } => {
                f(*parameter);
                f(*block);
            }
            Node::Return { expression } => opt(expression, &mut f),
            Node::Throw { expression } => f(*expression),
            Node::Call {
                callee,
                type_arguments,
                arguments,
                lambda,
            } => {
                f(*callee);
                opt(type_arguments, &mut f);
                opt(arguments, &mut f);
                opt(lambda, &mut f);
            }
            Node::ValueArgument { name, value, .. } => {
                opt(name, &mut f);
                f(*value);
            }
            Node::Binary { lhs, operator, rhs } | Node::BinaryType { lhs, operator, rhs } => {
                f(*lhs);
                f(*operator);
                f(*rhs);
            }
            Node::Prefix { operator, operand } => {
                f(*operator);
                f(*operand);
            }
            Node::Postfix { operand, operator } => {
                f(*operand);
                f(*operator);
            }
            Node::Navigation {
                receiver,
                operator,
                selector,
            } => {
                f(*receiver);
                f(*operator);
                f(*selector);
            }
            Node::IndexAccess { receiver, indices } => {
                f(*receiver);
                f(*indices);
            }
            Node::Parenthesized { inner }
            | Node::NullableType { inner }
            | Node::ParenthesizedType { inner } => f(*inner),
            Node::StringLiteral { entries, .. } => entries.iter().copied().for_each(&mut f),
            Node::TemplateStringEntry { expression, .. } => f(*expression),
            Node::SimpleType { pieces } => pieces.iter().copied().for_each(&mut f),
            Node::SimpleTypePiece {
                name,
                type_arguments,
            } => {
                f(*name);
                opt(type_arguments, &mut f);
            }
            Node::FunctionType {
                receiver,
                parameters,
                return_type,
            } => {
                opt(receiver, &mut f);
                f(*parameters);
                f(*return_type);
            }
            Node::TypeProjection { variance, type_ref } => {
                opt(variance, &mut f);
                opt(type_ref, &mut f);
            }
            Node::List { elements, .. } => elements.iter().copied().for_each(&mut f),
            Node::Break
            | Node::Continue
            | Node::LiteralStringEntry { .. }
            | Node::ConstantLiteral { .. }
            | Node::NameExpression { .. }
            | Node::This
            | Node::Modifier { .. }
            | Node::Keyword { .. } => {}
        }
    }

    /// Visit child slots in source order, allowing replacement
    pub fn for_each_child_mut(&mut self, mut f: impl FnMut(&mut NodeId)) {
        let opt = |id: &mut Option<NodeId>, f: &mut dyn FnMut(&mut NodeId)| {
            if let Some(id) = id {
                f(id);
            }
        };

        match self {
            Node::KotlinFile {
                package,
                imports,
                statements,
            } => {
                opt(package, &mut f);
                imports.iter_mut().for_each(&mut f);
                statements.iter_mut().for_each(&mut f);
            }
            Node::PackageDirective { name } => f(name),
            Node::ImportDirective { name, alias, .. } => {
                f(name);
                opt(alias, &mut f);
            }
            Node::ClassDeclaration {
                modifiers,
                declaration_keyword,
                name,
                type_parameters,
                primary_constructor,
                supertypes,
                body,
            } => {
                opt(modifiers, &mut f);
                f(declaration_keyword);
                opt(name, &mut f);
                opt(type_parameters, &mut f);
                opt(primary_constructor, &mut f);
                opt(supertypes, &mut f);
                opt(body, &mut f);
            }
            Node::ClassBody { members } => members.iter_mut().for_each(&mut f),
            Node::SuperTypeEntry {
                type_ref,
                arguments,
            } => {
                f(type_ref);
                opt(arguments, &mut f);
            }
            Node::FunctionDeclaration {
                modifiers,
                type_parameters,
                receiver_type,
                name,
                parameters,
                return_type,
                body,
            } => {
                opt(modifiers, &mut f);
                opt(type_parameters, &mut f);
                opt(receiver_type, &mut f);
                f(name);
                f(parameters);
                opt(return_type, &mut f);
                opt(body, &mut f);
            }
            Node::FunctionParameter {
                modifiers,
                val_or_var,
                name,
                type_ref,
                default_value,
            } => {
                opt(modifiers, &mut f);
                opt(val_or_var, &mut f);
                f(name);
                opt(type_ref, &mut f);
                opt(default_value, &mut f);
            }
            Node::PropertyDeclaration {
                modifiers,
                val_or_var,
                variable,
                initializer,
            } => {
                opt(modifiers, &mut f);
                f(val_or_var);
                f(variable);
                opt(initializer, &mut f);
            }
            Node::Variable { name, type_ref } => {
                f(name);
                opt(type_ref, &mut f);
            }
            Node::TypeAlias {
                modifiers,
                name,
                type_parameters,
                type_ref,
            } => {
                opt(modifiers, &mut f);
                f(name);
                opt(type_parameters, &mut f);
                f(type_ref);
            }
            Node::TypeParameter {
                modifiers,
                name,
                bound,
            } => {
                opt(modifiers, &mut f);
                f(name);
                opt(bound, &mut f);
            }
            Node::Block { statements } => statements.iter_mut().for_each(&mut f),
            Node::Lambda {
                parameters,
                statements,
            } => {
                opt(parameters, &mut f);
                statements.iter_mut().for_each(&mut f);
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                f(condition);
                f(then_branch);
                opt(else_branch, &mut f);
            }
            Node::When { subject, entries } => {
                opt(subject, &mut f);
                f(entries);
            }
            Node::WhenEntry { conditions, body } => {
                conditions.iter_mut().for_each(&mut f);
                f(body);
            }
            Node::WhenCondition { operator, target } => {
                f(operator);
                f(target);
            }
            Node::While { condition, body } => {
                f(condition);
                f(body);
            }
            Node::DoWhile { body, condition } => {
                f(body);
                f(condition);
            }
            Node::For {
                variable,
                iterable,
                body,
            } => {
                f(variable);
                f(iterable);
                f(body);
            }
            Node::Try {
                block,
                catches,
                finally_block,
            } => {
                f(block);
                catches.iter_mut().for_each(&mut f);
                opt(finally_block, &mut f);
            }
            Node::CatchClause { parameter, block } => {
                f(parameter);
                f(block);
            }
            Node::Return { expression } => opt(expression, &mut f),
            Node::Throw { expression } => f(expression),
            Node::Call {
                callee,
                type_arguments,
                arguments,
                lambda,
            } => {
                f(callee);
                opt(type_arguments, &mut f);
                opt(arguments, &mut f);
                opt(lambda, &mut f);
            }
            Node::ValueArgument { name, value, .. } => {
                opt(name, &mut f);
                f(value);
            }
            Node::Binary { lhs, operator, rhs } | Node::BinaryType { lhs, operator, rhs } => {
                f(lhs);
                f(operator);
                f(rhs);
            }
            Node::Prefix { operator, operand } => {
                f(operator);
                f(operand);
            }
            Node::Postfix { operand, operator } => {
                f(operand);
                f(operator);
            }
            Node::Navigation {
                receiver,
                operator,
                selector,
            } => {
                f(receiver);
                f(operator);
                f(selector);
            }
            Node::IndexAccess { receiver, indices } => {
                f(receiver);
                f(indices);
            }
            Node::Parenthesized { inner }
            | Node::NullableType { inner }
            | Node::ParenthesizedType { inner } => f(inner),
            Node::StringLiteral { entries, .. } => entries.iter_mut().for_each(&mut f),
            Node::TemplateStringEntry { expression, .. } => f(expression),
            Node::SimpleType { pieces } => pieces.iter_mut().for_each(&mut f),
            Node::SimpleTypePiece {
                name,
                type_arguments,
            } => {
                f(name);
                opt(type_arguments, &mut f);
            }
            Node::FunctionType {
                receiver,
                parameters,
                return_type,
            } => {
                opt(receiver, &mut f);
                f(parameters);
                f(return_type);
            }
            Node::TypeProjection { variance, type_ref } => {
                opt(variance, &mut f);
                opt(type_ref, &mut f);
            }
            Node::List { elements, .. } => elements.iter_mut().for_each(&mut f),
            Node::Break
            | Node::Continue
            | Node::LiteralStringEntry { .. }
            | Node::ConstantLiteral { .. }
            | Node::NameExpression { .. }
            | Node::This
            | Node::Modifier { .. }
            | Node::Keyword { .. } => {}
        }
    }

    /// Replace every child through `f`; returns the rebuilt node only if some
    /// child id changed
    pub fn map_children(mut self, f: &mut dyn FnMut(NodeId) -> NodeId) -> Option<Node> {
        let mut changed = false;
        self.for_each_child_mut(|slot| {
            let mapped = f(*slot);
            if mapped != *slot {
                *slot = mapped;
                changed = true;
            }
        });
        changed.then_some(self)
    }

    /// Children in source order
    pub fn children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        self.for_each_child(|id| children.push(id));
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_allocation() {
        let mut ast = Ast::new();
        let a = ast.name("x");
        let b = ast.name("x");
        assert_ne!(a, b);
        assert_eq!(ast[a], ast[b]);
        assert_eq!(ast.len(), 2);
        assert_eq!(ast.name_text(a), Some("x"));
    }

    #[test]
    #[should_panic(expected = "outside the arena")]
    fn test_foreign_id_panics() {
        let mut other = Ast::new();
        other.name("a");
        let id = other.name("b");
        let ast = Ast::new();
        let _ = ast.get(id);
    }

    #[test]
    fn test_children_in_source_order() {
        let mut ast = Ast::new();
        let lhs = ast.name("a");
        let operator = ast.keyword(Keyword::Plus);
        let rhs = ast.name("b");
        let binary = Node::Binary { lhs, operator, rhs };
        assert_eq!(binary.children(), vec![lhs, operator, rhs]);
        assert!(!binary.is_leaf());
        assert!(ast[lhs].is_leaf());
    }

    #[test]
    fn test_map_children_reports_change() {
        let mut ast = Ast::new();
        let a = ast.name("a");
        let b = ast.name("b");
        let c = ast.name("c");
        let list = Node::List {
            kind: ListKind::ValueArguments,
            elements: vec![a, b],
        };

        assert!(list.clone().map_children(&mut |id| id).is_none());

        let mapped = list
            .map_children(&mut |id| if id == b { c } else { id })
            .unwrap();
        assert_eq!(
            mapped,
            Node::List {
                kind: ListKind::ValueArguments,
                elements: vec![a, c],
            }
        );
    }

    #[test]
    fn test_list_affixes() {
        assert_eq!(ListKind::ValueArguments.prefix(), "(");
        assert_eq!(ListKind::ValueArguments.separator(), ",");
        assert_eq!(ListKind::ValueArguments.suffix(), ")");
        assert_eq!(ListKind::LambdaParameters.prefix(), "");
        assert_eq!(ListKind::LambdaParameters.suffix(), "->");
        assert_eq!(ListKind::QualifiedName.separator(), ".");
        assert_eq!(ListKind::Supertypes.prefix(), ":");
        assert!(ListKind::WhenEntries.is_statement_like());
    }

    #[test]
    fn test_keyword_tables() {
        assert_eq!(ModifierKeyword::from_text("lateinit"), Some(ModifierKeyword::Lateinit));
        assert_eq!(ModifierKeyword::from_text("in"), Some(ModifierKeyword::In));
        assert_eq!(ModifierKeyword::from_text("fun"), None);
        assert_eq!(
            Keyword::from_syntax(ktast_syntax::SyntaxKind::AsSafe),
            Some(Keyword::AsSafe)
        );
        assert_eq!(Keyword::AsSafe.as_str(), "as?");
        assert_eq!(Keyword::from_syntax(ktast_syntax::SyntaxKind::Ident), None);
    }
}
