//! Kotlin-subset front end
//!
//! A trivia-preserving lexer and a recursive-descent parser that produce a
//! lossless [rowan] tree. The tree is the input of `ktast-core`, which turns
//! it into a typed AST.
//!
//! ```
//! use ktast_syntax::{SyntaxKind, parse};
//!
//! let parse = parse("val answer = 42 // the answer\n");
//! assert!(!parse.has_errors());
//!
//! let root = parse.syntax();
//! assert_eq!(root.kind(), SyntaxKind::KotlinFile);
//! assert_eq!(root.text().to_string(), "val answer = 42 // the answer\n");
//! ```

mod language;
pub mod lexer;
mod parser;
mod syntax_kind;

pub use language::{KotlinLanguage, SyntaxElement, SyntaxNode, SyntaxToken};
pub use lexer::{
    LexerError, Token, chars_would_join, is_ident_continue, is_ident_start, lex_with_trivia,
    texts_would_join,
};
pub use parser::{Parse, SyntaxError, parse};
pub use syntax_kind::{
    HARD_KEYWORDS, MODIFIER_KEYWORDS, SyntaxKind, is_modifier_keyword, is_reserved_word,
};

pub use rowan::{TextRange, TextSize};
