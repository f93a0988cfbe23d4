//! Syntax kinds for the Kotlin-subset CST
//!
//! Every token and every node of the concrete tree carries one of these
//! kinds. The discriminants are dense (`0..COUNT`) so the rowan raw kind can
//! be mapped back through [`SyntaxKind::ALL`] without a giant match.

macro_rules! syntax_kinds {
    ($($(#[$meta:meta])* $kind:ident),* $(,)?) => {
        /// Token and node kinds produced by the lexer and parser
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($(#[$meta])* $kind),*
        }

        impl SyntaxKind {
            /// All kinds, indexed by discriminant
            pub const ALL: &'static [SyntaxKind] = &[$(SyntaxKind::$kind),*];
        }
    };
}

syntax_kinds! {
    // Trivia
    Whitespace,
    Newline,
    CommentLine,
    CommentBlock,

    // Punctuation
    Semicolon,
    Comma,
    Dot,
    SafeDot,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Arrow,
    Question,
    Elvis,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Excl,
    ExclExcl,
    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Range,
    NotIs,
    NotIn,
    AsSafe,

    // Literals and identifiers
    Ident,
    IntLiteral,
    RealLiteral,
    CharLiteral,
    QuoteOpen,
    QuoteClose,
    TripleQuoteOpen,
    TripleQuoteClose,
    StringContent,
    Dollar,
    DollarLBrace,

    // Hard keywords
    PackageKw,
    AsKw,
    ClassKw,
    InterfaceKw,
    ObjectKw,
    FunKw,
    ValKw,
    VarKw,
    TypealiasKw,
    IfKw,
    ElseKw,
    WhenKw,
    WhileKw,
    DoKw,
    ForKw,
    InKw,
    IsKw,
    ReturnKw,
    ThrowKw,
    BreakKw,
    ContinueKw,
    TryKw,
    CatchKw,
    FinallyKw,
    ThisKw,
    NullKw,
    TrueKw,
    FalseKw,

    /// A character the lexer could not classify
    ErrorToken,

    // Nodes
    KotlinFile,
    PackageDirective,
    ImportDirective,
    QualifiedName,
    ModifierList,
    Modifier,
    Keyword,
    Name,
    ClassDeclaration,
    ClassBody,
    SupertypeList,
    SupertypeEntry,
    TypeParameterList,
    TypeParameter,
    FunctionDeclaration,
    ParameterList,
    Parameter,
    PropertyDeclaration,
    Variable,
    TypealiasDeclaration,
    Block,
    Lambda,
    LambdaParameterList,
    IfExpr,
    WhenExpr,
    WhenEntryList,
    WhenEntry,
    WhenCondition,
    WhileExpr,
    DoWhileExpr,
    ForExpr,
    TryExpr,
    CatchClause,
    ReturnExpr,
    ThrowExpr,
    BreakExpr,
    ContinueExpr,
    ThisExpr,
    CallExpr,
    ValueArgumentList,
    ValueArgument,
    TypeArgumentList,
    TypeProjection,
    BinaryExpr,
    BinaryTypeExpr,
    PrefixExpr,
    PostfixExpr,
    NavigationExpr,
    IndexExpr,
    IndexList,
    ParenExpr,
    StringTemplate,
    LiteralStringEntry,
    ShortTemplateEntry,
    LongTemplateEntry,
    Literal,
    SimpleType,
    SimpleTypePiece,
    NullableType,
    ParenType,
    FunctionType,
    FunctionTypeParameterList,
    DynamicType,
    /// Parser recovery node wrapping unexpected input
    Error,
}

/// Words the lexer reserves; an identifier spelled like one of these must be
/// back-quoted. `super` and `typeof` are reserved by the language even though
/// this front end never produces them as keywords.
pub const HARD_KEYWORDS: &[&str] = &[
    "as", "break", "catch", "class", "continue", "do", "else", "false", "finally", "for", "fun",
    "if", "in", "interface", "is", "null", "object", "package", "return", "super", "this",
    "throw", "true", "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Soft keywords that act as modifiers when they precede a declaration
pub const MODIFIER_KEYWORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "internal",
    "abstract",
    "open",
    "final",
    "override",
    "data",
    "enum",
    "sealed",
    "inner",
    "inline",
    "suspend",
    "const",
    "lateinit",
    "companion",
    "operator",
    "infix",
    "tailrec",
    "external",
    "vararg",
    "noinline",
    "crossinline",
    "reified",
    "annotation",
    "value",
    "out",
];

/// Returns `true` if `text` is a reserved word
pub fn is_reserved_word(text: &str) -> bool {
    HARD_KEYWORDS.contains(&text)
}

/// Returns `true` if `text` is a soft keyword usable as a modifier
pub fn is_modifier_keyword(text: &str) -> bool {
    MODIFIER_KEYWORDS.contains(&text)
}

impl SyntaxKind {
    /// Number of kinds
    pub const COUNT: usize = SyntaxKind::ALL.len();

    /// Map a raw discriminant back to a kind
    pub fn from_raw(raw: u16) -> Option<SyntaxKind> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Look up the keyword kind for a word
    pub fn from_keyword(word: &str) -> Option<SyntaxKind> {
        let kind = match word {
            "package" => SyntaxKind::PackageKw,
            "as" => SyntaxKind::AsKw,
            "class" => SyntaxKind::ClassKw,
            "interface" => SyntaxKind::InterfaceKw,
            "object" => SyntaxKind::ObjectKw,
            "fun" => SyntaxKind::FunKw,
            "val" => SyntaxKind::ValKw,
            "var" => SyntaxKind::VarKw,
            "typealias" => SyntaxKind::TypealiasKw,
            "if" => SyntaxKind::IfKw,
            "else" => SyntaxKind::ElseKw,
            "when" => SyntaxKind::WhenKw,
            "while" => SyntaxKind::WhileKw,
            "do" => SyntaxKind::DoKw,
            "for" => SyntaxKind::ForKw,
            "in" => SyntaxKind::InKw,
            "is" => SyntaxKind::IsKw,
            "return" => SyntaxKind::ReturnKw,
            "throw" => SyntaxKind::ThrowKw,
            "break" => SyntaxKind::BreakKw,
            "continue" => SyntaxKind::ContinueKw,
            "try" => SyntaxKind::TryKw,
            "catch" => SyntaxKind::CatchKw,
            "finally" => SyntaxKind::FinallyKw,
            "this" => SyntaxKind::ThisKw,
            "null" => SyntaxKind::NullKw,
            "true" => SyntaxKind::TrueKw,
            "false" => SyntaxKind::FalseKw,
            _ => return None,
        };
        Some(kind)
    }

    /// Whitespace, newlines and comments
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::Whitespace
                | SyntaxKind::Newline
                | SyntaxKind::CommentLine
                | SyntaxKind::CommentBlock
        )
    }

    /// Hard keyword tokens
    pub fn is_keyword(self) -> bool {
        (SyntaxKind::PackageKw as u16..=SyntaxKind::FalseKw as u16).contains(&(self as u16))
    }

    /// Kinds that label a node rather than a token
    pub fn is_node(self) -> bool {
        self as u16 >= SyntaxKind::KotlinFile as u16
    }

    /// Tokens that start a declaration once modifiers are stripped
    pub fn is_declaration_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassKw
                | SyntaxKind::InterfaceKw
                | SyntaxKind::ObjectKw
                | SyntaxKind::FunKw
                | SyntaxKind::ValKw
                | SyntaxKind::VarKw
                | SyntaxKind::TypealiasKw
        )
    }

    /// Closing delimiters a trailing comma may precede
    pub fn is_closing_delimiter(self) -> bool {
        matches!(
            self,
            SyntaxKind::RParen | SyntaxKind::RBracket | SyntaxKind::Gt | SyntaxKind::Arrow
        )
    }

    /// Fixed spelling of punctuation, operator and keyword tokens
    pub fn fixed_text(self) -> Option<&'static str> {
        let text = match self {
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Comma => ",",
            SyntaxKind::Dot => ".",
            SyntaxKind::SafeDot => "?.",
            SyntaxKind::Colon => ":",
            SyntaxKind::LParen => "(",
            SyntaxKind::RParen => ")",
            SyntaxKind::LBrace => "{",
            SyntaxKind::RBrace => "}",
            SyntaxKind::LBracket => "[",
            SyntaxKind::RBracket => "]",
            SyntaxKind::Lt => "<",
            SyntaxKind::Gt => ">",
            SyntaxKind::Arrow => "->",
            SyntaxKind::Question => "?",
            SyntaxKind::Elvis => "?:",
            SyntaxKind::Plus => "+",
            SyntaxKind::Minus => "-",
            SyntaxKind::Star => "*",
            SyntaxKind::Slash => "/",
            SyntaxKind::Percent => "%",
            SyntaxKind::PlusPlus => "++",
            SyntaxKind::MinusMinus => "--",
            SyntaxKind::Excl => "!",
            SyntaxKind::ExclExcl => "!!",
            SyntaxKind::Eq => "=",
            SyntaxKind::PlusEq => "+=",
            SyntaxKind::MinusEq => "-=",
            SyntaxKind::StarEq => "*=",
            SyntaxKind::SlashEq => "/=",
            SyntaxKind::PercentEq => "%=",
            SyntaxKind::EqEq => "==",
            SyntaxKind::NotEq => "!=",
            SyntaxKind::EqEqEq => "===",
            SyntaxKind::NotEqEq => "!==",
            SyntaxKind::LtEq => "<=",
            SyntaxKind::GtEq => ">=",
            SyntaxKind::AndAnd => "&&",
            SyntaxKind::OrOr => "||",
            SyntaxKind::Range => "..",
            SyntaxKind::NotIs => "!is",
            SyntaxKind::NotIn => "!in",
            SyntaxKind::AsSafe => "as?",
            SyntaxKind::QuoteOpen | SyntaxKind::QuoteClose => "\"",
            SyntaxKind::TripleQuoteOpen | SyntaxKind::TripleQuoteClose => "\"\"\"",
            SyntaxKind::Dollar => "$",
            SyntaxKind::DollarLBrace => "${",
            SyntaxKind::PackageKw => "package",
            SyntaxKind::AsKw => "as",
            SyntaxKind::ClassKw => "class",
            SyntaxKind::InterfaceKw => "interface",
            SyntaxKind::ObjectKw => "object",
            SyntaxKind::FunKw => "fun",
            SyntaxKind::ValKw => "val",
            SyntaxKind::VarKw => "var",
            SyntaxKind::TypealiasKw => "typealias",
            SyntaxKind::IfKw => "if",
            SyntaxKind::ElseKw => "else",
            SyntaxKind::WhenKw => "when",
            SyntaxKind::WhileKw => "while",
            SyntaxKind::DoKw => "do",
            SyntaxKind::ForKw => "for",
            SyntaxKind::InKw => "in",
            SyntaxKind::IsKw => "is",
            SyntaxKind::ReturnKw => "return",
            SyntaxKind::ThrowKw => "throw",
            SyntaxKind::BreakKw => "break",
            SyntaxKind::ContinueKw => "continue",
            SyntaxKind::TryKw => "try",
            SyntaxKind::CatchKw => "catch",
            SyntaxKind::FinallyKw => "finally",
            SyntaxKind::ThisKw => "this",
            SyntaxKind::NullKw => "null",
            SyntaxKind::TrueKw => "true",
            SyntaxKind::FalseKw => "false",
            _ => return None,
        };
        Some(text)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        for &kind in SyntaxKind::ALL {
            assert_eq!(SyntaxKind::from_raw(kind as u16), Some(kind));
        }
        assert_eq!(SyntaxKind::from_raw(SyntaxKind::COUNT as u16), None);
    }

    #[test]
    fn test_documented_kinds_are_declared() {
        assert_eq!(SyntaxKind::ALL.last(), Some(&SyntaxKind::Error));
        assert!(SyntaxKind::ALL.contains(&SyntaxKind::ErrorToken));
        assert!(SyntaxKind::ErrorToken < SyntaxKind::KotlinFile);
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(SyntaxKind::from_keyword("fun"), Some(SyntaxKind::FunKw));
        assert_eq!(SyntaxKind::from_keyword("private"), None);
        assert!(SyntaxKind::FunKw.is_keyword());
        assert!(!SyntaxKind::Ident.is_keyword());
    }

    #[test]
    fn test_every_lexed_keyword_is_reserved() {
        for &kind in SyntaxKind::ALL.iter().filter(|k| k.is_keyword()) {
            let text = kind.fixed_text().expect("keywords have fixed text");
            assert!(is_reserved_word(text), "{text} should be reserved");
        }
    }

    #[test]
    fn test_classification() {
        assert!(SyntaxKind::CommentLine.is_trivia());
        assert!(!SyntaxKind::Semicolon.is_trivia());
        assert!(SyntaxKind::KotlinFile.is_node());
        assert!(!SyntaxKind::ErrorToken.is_node());
        assert!(is_modifier_keyword("private"));
        assert!(!is_modifier_keyword("fun"));
    }
}
