//! Recursive-descent parser for the Kotlin subset
//!
//! Builds a lossless rowan tree from the token stream. Every token, trivia
//! included, lands in the tree, so `parse(src).syntax().text() == src` always
//! holds.
//!
//! # Trivia placement
//!
//! Trivia is attached lazily: a token pulls the trivia that precedes it into
//! whatever node is open at that moment, and nodes are started only after the
//! pending trivia was flushed. The effect is that trivia before and after a
//! node lives in its parent, and trivia inside a node sits between two of its
//! own parts. The single exception is a line comment on the same line as the
//! end of a declaration, which is pulled into the declaration.
//!
//! Leaf tokens with meaning (names, literals, modifiers, keyword operators)
//! are each wrapped in their own node, so the tokens a production holds
//! directly are either trivia or fixed punctuation.
//!
//! # Newlines
//!
//! Newlines end expressions inside braces and at file level, and are ignored
//! inside parentheses, brackets and angle brackets. `.`, `?.`, `?:`, `&&` and
//! `||` continue an expression across a newline, and a `{` after an
//! expression is taken as a trailing lambda on the same line or the next.

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange, TextSize};

use crate::lexer::{Span, Token, lex_with_trivia};
use crate::syntax_kind::is_modifier_keyword;
use crate::{SyntaxKind, SyntaxNode};

/// A parse or lex error with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}",
            self.message,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}

/// Result of parsing one source unit
#[derive(Debug, Clone)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    /// Root of the red tree
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Error markers, ordered by position
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parse a source unit into a lossless tree
///
/// # Example
///
/// ```
/// let source = "fun main() {\n    println(\"hi\") // greet\n}\n";
/// let parse = ktast_syntax::parse(source);
/// assert!(!parse.has_errors());
/// assert_eq!(parse.syntax().text().to_string(), source);
/// ```
pub fn parse(source: &str) -> Parse {
    let (tokens, lex_errors) = lex_with_trivia(source);
    let mut parser = Parser::new(&tokens, source.len());
    parser.parse_file();
    let (green, mut errors) = parser.finish();

    errors.extend(
        lex_errors
            .into_iter()
            .map(|err| SyntaxError::new(err.message, text_range(&err.span))),
    );
    errors.sort_by_key(|err| err.range.start());

    Parse { green, errors }
}

/// Binary operator levels from loosest to tightest, with whether the operator
/// may start a new line
const BINARY_LEVELS: &[(&[SyntaxKind], bool)] = &[
    (&[SyntaxKind::OrOr], true),
    (&[SyntaxKind::AndAnd], true),
    (
        &[
            SyntaxKind::EqEq,
            SyntaxKind::NotEq,
            SyntaxKind::EqEqEq,
            SyntaxKind::NotEqEq,
        ],
        false,
    ),
    (
        &[SyntaxKind::Lt, SyntaxKind::Gt, SyntaxKind::LtEq, SyntaxKind::GtEq],
        false,
    ),
    (
        &[
            SyntaxKind::InKw,
            SyntaxKind::NotIn,
            SyntaxKind::IsKw,
            SyntaxKind::NotIs,
        ],
        false,
    ),
    (&[SyntaxKind::Elvis], true),
    (&[SyntaxKind::Range], false),
    (&[SyntaxKind::Plus, SyntaxKind::Minus], false),
    (
        &[SyntaxKind::Star, SyntaxKind::Slash, SyntaxKind::Percent],
        false,
    ),
];

const ASSIGNMENT_OPERATORS: &[SyntaxKind] = &[
    SyntaxKind::Eq,
    SyntaxKind::PlusEq,
    SyntaxKind::MinusEq,
    SyntaxKind::StarEq,
    SyntaxKind::SlashEq,
    SyntaxKind::PercentEq,
];

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [Token],
    source_len: usize,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    /// Whether newlines end expressions in the innermost bracket context
    newlines: Vec<bool>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], source_len: usize) -> Self {
        Self {
            tokens,
            source_len,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            newlines: vec![true],
        }
    }

    fn finish(self) -> (GreenNode, Vec<SyntaxError>) {
        (self.builder.finish(), self.errors)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    /// Index of the `n`-th significant token at or after `pos`
    fn nth_index(&self, n: usize) -> Option<usize> {
        self.tokens[self.pos..]
            .iter()
            .enumerate()
            .filter(|(_, token)| !token.kind.is_trivia())
            .nth(n)
            .map(|(offset, _)| self.pos + offset)
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.nth_index(n).map(|idx| self.tokens[idx].kind)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.nth_index(n)
            .map_or("", |idx| self.tokens[idx].text.as_str())
    }

    fn current(&self) -> Option<SyntaxKind> {
        self.nth(0)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == Some(kind)
    }

    fn at_end(&self) -> bool {
        self.current().is_none()
    }

    /// `true` if a newline separates the previous token from the next
    /// significant one
    fn newline_before_next(&self) -> bool {
        let end = self.nth_index(0).unwrap_or(self.tokens.len());
        self.tokens[self.pos..end]
            .iter()
            .any(|token| token.kind == SyntaxKind::Newline)
    }

    /// `true` if the next token continues the current line, or newlines are
    /// insignificant here
    fn on_same_line(&self) -> bool {
        !self.newlines.last().copied().unwrap_or(true) || !self.newline_before_next()
    }

    fn at_line(&self, kind: SyntaxKind) -> bool {
        self.at(kind) && self.on_same_line()
    }

    fn at_modifier_word(&self, n: usize) -> bool {
        self.nth(n) == Some(SyntaxKind::Ident) && is_modifier_keyword(self.nth_text(n))
    }

    /// Add the token at `pos` to the current node
    fn token(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.builder.token(token.kind.into(), &token.text);
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|token| token.kind.is_trivia())
        {
            self.token();
        }
    }

    /// Consume pending trivia and the next significant token
    fn bump(&mut self) {
        self.skip_trivia();
        self.token();
    }

    /// Consume the next significant token wrapped in a node of `kind`
    fn bump_wrapped(&mut self, kind: SyntaxKind) {
        self.start_node(kind);
        self.token();
        self.finish_node();
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(format!("expected {}", describe(kind)));
        false
    }

    fn expect_name(&mut self, what: &str) {
        if self.at(SyntaxKind::Ident) {
            self.bump_wrapped(SyntaxKind::Name);
        } else {
            self.error(format!("expected {what}"));
        }
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.skip_trivia();
        self.builder.start_node(kind.into());
    }

    fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.skip_trivia();
        self.builder.checkpoint()
    }

    /// Run `f` with newlines significant (`true`) or ignored (`false`)
    fn with_newlines<T>(&mut self, significant: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        self.newlines.push(significant);
        let result = f(self);
        self.newlines.pop();
        result
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = match self.nth_index(0) {
            Some(idx) => text_range(&self.tokens[idx].span),
            None => {
                let end = TextSize::from(self.source_len as u32);
                TextRange::empty(end)
            }
        };
        self.errors.push(SyntaxError::new(message, range));
    }

    /// Record an error and wrap the next token in an error node
    fn error_node(&mut self, message: impl Into<String>) {
        self.error(message);
        self.start_node(SyntaxKind::Error);
        self.token();
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // File and statements
    // ------------------------------------------------------------------

    fn parse_file(&mut self) {
        self.builder.start_node(SyntaxKind::KotlinFile.into());

        self.skip_separators();
        if self.at(SyntaxKind::PackageKw) {
            self.parse_package();
        }
        loop {
            self.skip_separators();
            if self.at(SyntaxKind::Ident)
                && self.nth_text(0) == "import"
                && self.nth(1) == Some(SyntaxKind::Ident)
            {
                self.parse_import();
            } else {
                break;
            }
        }
        self.parse_statements(false);

        self.skip_trivia();
        self.finish_node(); // KOTLIN_FILE
    }

    /// Consume trivia and `;` tokens at list level
    fn skip_separators(&mut self) {
        loop {
            self.skip_trivia();
            if self.at(SyntaxKind::Semicolon) {
                self.token();
            } else {
                break;
            }
        }
    }

    fn parse_package(&mut self) {
        self.start_node(SyntaxKind::PackageDirective);
        self.bump(); // package
        self.parse_qualified_name();
        self.finish_node(); // PACKAGE_DIRECTIVE
    }

    fn parse_import(&mut self) {
        self.start_node(SyntaxKind::ImportDirective);
        self.bump(); // import
        self.parse_qualified_name();
        if self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Star) {
            self.bump();
            self.bump();
        } else if self.at_line(SyntaxKind::AsKw) {
            self.bump();
            self.expect_name("an import alias");
        }
        self.finish_node(); // IMPORT_DIRECTIVE
    }

    fn parse_qualified_name(&mut self) {
        self.start_node(SyntaxKind::QualifiedName);
        self.expect_name("a name");
        while self.at_line(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Ident) {
            self.bump();
            self.bump_wrapped(SyntaxKind::Name);
        }
        self.finish_node(); // QUALIFIED_NAME
    }

    /// Statements up to the end of input, or up to `}` when `in_braces`
    fn parse_statements(&mut self, in_braces: bool) {
        loop {
            self.skip_separators();
            match self.current() {
                None => break,
                Some(SyntaxKind::RBrace) if in_braces => break,
                _ => {}
            }

            let start = self.pos;
            self.parse_statement();
            if self.pos == start {
                self.error_node("unexpected token");
                continue;
            }

            match self.current() {
                None | Some(SyntaxKind::Semicolon) => {}
                Some(SyntaxKind::RBrace) if in_braces => {}
                _ if self.newline_before_next() => {}
                _ => self.error("expected a newline or `;` between statements"),
            }
        }
    }

    fn parse_statement(&mut self) {
        if self.at_declaration() {
            self.parse_declaration();
        } else {
            self.parse_expression();
        }
    }

    /// A run of modifier words (newlines skipped, `;` not) ending in a
    /// declaration keyword
    fn at_declaration(&self) -> bool {
        let mut n = 0;
        loop {
            match self.nth(n) {
                Some(kind) if kind.is_declaration_keyword() => return true,
                Some(SyntaxKind::Ident) if is_modifier_keyword(self.nth_text(n)) => n += 1,
                _ => return false,
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_declaration(&mut self) {
        let checkpoint = self.checkpoint();

        if self.at_modifier_word(0) {
            self.start_node(SyntaxKind::ModifierList);
            while self.at_modifier_word(0) {
                self.bump_wrapped(SyntaxKind::Modifier);
            }
            self.finish_node(); // MODIFIER_LIST
        }

        match self.current() {
            Some(SyntaxKind::ClassKw | SyntaxKind::InterfaceKw | SyntaxKind::ObjectKw) => {
                self.start_node_at(checkpoint, SyntaxKind::ClassDeclaration);
                self.parse_class_rest();
            }
            Some(SyntaxKind::FunKw) => {
                self.start_node_at(checkpoint, SyntaxKind::FunctionDeclaration);
                self.parse_function_rest();
            }
            Some(SyntaxKind::ValKw | SyntaxKind::VarKw) => {
                self.start_node_at(checkpoint, SyntaxKind::PropertyDeclaration);
                self.parse_property_rest();
            }
            Some(SyntaxKind::TypealiasKw) => {
                self.start_node_at(checkpoint, SyntaxKind::TypealiasDeclaration);
                self.parse_typealias_rest();
            }
            _ => {
                self.start_node_at(checkpoint, SyntaxKind::Error);
                self.error("expected a declaration");
            }
        }

        self.eat_trailing_comment();
        self.finish_node();
    }

    /// Pull a line comment on the declaration's last line into the node
    fn eat_trailing_comment(&mut self) {
        let mut idx = self.pos;
        while self
            .tokens
            .get(idx)
            .is_some_and(|token| token.kind == SyntaxKind::Whitespace)
        {
            idx += 1;
        }
        if self
            .tokens
            .get(idx)
            .is_some_and(|token| token.kind == SyntaxKind::CommentLine)
        {
            while self.pos <= idx {
                self.token();
            }
        }
    }

    fn parse_class_rest(&mut self) {
        let is_object = self.at(SyntaxKind::ObjectKw);
        self.bump_wrapped(SyntaxKind::Keyword);

        if self.at_line(SyntaxKind::Ident) {
            self.bump_wrapped(SyntaxKind::Name);
        } else if !is_object {
            self.error("expected a class name");
        }
        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameters();
        }
        if self.at_line(SyntaxKind::LParen) {
            self.parse_parameter_list();
        }
        if self.at(SyntaxKind::Colon) {
            self.parse_supertypes();
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_braced(SyntaxKind::ClassBody);
        }
    }

    fn parse_supertypes(&mut self) {
        self.start_node(SyntaxKind::SupertypeList);
        self.bump(); // :
        loop {
            self.start_node(SyntaxKind::SupertypeEntry);
            self.parse_type();
            if self.at_line(SyntaxKind::LParen) {
                self.parse_value_arguments();
            }
            self.finish_node(); // SUPERTYPE_ENTRY
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.finish_node(); // SUPERTYPE_LIST
    }

    fn parse_type_parameters(&mut self) {
        self.start_node(SyntaxKind::TypeParameterList);
        self.with_newlines(false, |p| {
            p.bump(); // <
            while !p.at(SyntaxKind::Gt) && !p.at_end() {
                p.start_node(SyntaxKind::TypeParameter);
                p.parse_prefix_modifiers();
                p.expect_name("a type parameter name");
                if p.eat(SyntaxKind::Colon) {
                    p.parse_type();
                }
                p.finish_node(); // TYPE_PARAMETER
                if !p.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            p.expect(SyntaxKind::Gt);
        });
        self.finish_node(); // TYPE_PARAMETER_LIST
    }

    /// Modifiers in front of a parameter or type parameter name
    fn parse_prefix_modifiers(&mut self) {
        if !self.at_prefix_modifier() {
            return;
        }
        self.start_node(SyntaxKind::ModifierList);
        while self.at_prefix_modifier() {
            self.bump_wrapped(SyntaxKind::Modifier);
        }
        self.finish_node(); // MODIFIER_LIST
    }

    fn at_prefix_modifier(&self) -> bool {
        let is_modifier = self.at_modifier_word(0) || self.at(SyntaxKind::InKw);
        is_modifier
            && matches!(
                self.nth(1),
                Some(SyntaxKind::Ident | SyntaxKind::ValKw | SyntaxKind::VarKw | SyntaxKind::InKw)
            )
    }

    fn parse_function_rest(&mut self) {
        self.bump(); // fun

        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameters();
        }
        if self.at(SyntaxKind::Ident)
            && matches!(
                self.nth(1),
                Some(SyntaxKind::Dot | SyntaxKind::Lt | SyntaxKind::Question)
            )
        {
            self.parse_receiver_type();
            self.expect(SyntaxKind::Dot);
        }
        self.expect_name("a function name");

        if self.at(SyntaxKind::LParen) {
            self.parse_parameter_list();
        } else {
            self.error("expected a parameter list");
        }
        if self.eat(SyntaxKind::Colon) {
            self.parse_type();
        }
        if self.at(SyntaxKind::LBrace) {
            self.parse_braced(SyntaxKind::Block);
        } else if self.eat(SyntaxKind::Eq) {
            self.parse_expression();
        }
    }

    /// Receiver of an extension function; the final `.name` is left for the
    /// caller
    fn parse_receiver_type(&mut self) {
        let checkpoint = self.checkpoint();
        self.start_node(SyntaxKind::SimpleType);
        loop {
            self.start_node(SyntaxKind::SimpleTypePiece);
            self.bump_wrapped(SyntaxKind::Name);
            if self.at(SyntaxKind::Lt) {
                self.parse_type_arguments();
            }
            self.finish_node(); // SIMPLE_TYPE_PIECE
            if self.at(SyntaxKind::Dot)
                && self.nth(1) == Some(SyntaxKind::Ident)
                && !matches!(self.nth(2), Some(SyntaxKind::LParen | SyntaxKind::Lt))
            {
                self.bump();
            } else {
                break;
            }
        }
        self.finish_node(); // SIMPLE_TYPE
        while self.at(SyntaxKind::Question) {
            self.start_node_at(checkpoint, SyntaxKind::NullableType);
            self.bump();
            self.finish_node();
        }
    }

    fn parse_parameter_list(&mut self) {
        self.start_node(SyntaxKind::ParameterList);
        self.with_newlines(false, |p| {
            p.bump(); // (
            while !p.at(SyntaxKind::RParen) && !p.at_end() {
                p.start_node(SyntaxKind::Parameter);
                p.parse_prefix_modifiers();
                if p.at(SyntaxKind::ValKw) || p.at(SyntaxKind::VarKw) {
                    p.bump_wrapped(SyntaxKind::Keyword);
                }
                p.expect_name("a parameter name");
                if p.eat(SyntaxKind::Colon) {
                    p.parse_type();
                }
                if p.eat(SyntaxKind::Eq) {
                    p.parse_expression();
                }
                p.finish_node(); // PARAMETER
                if !p.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            p.expect(SyntaxKind::RParen);
        });
        self.finish_node(); // PARAMETER_LIST
    }

    fn parse_property_rest(&mut self) {
        self.bump_wrapped(SyntaxKind::Keyword); // val / var
        self.parse_variable();
        if self.eat(SyntaxKind::Eq) {
            self.parse_expression();
        }
    }

    fn parse_variable(&mut self) {
        self.start_node(SyntaxKind::Variable);
        self.expect_name("a variable name");
        if self.eat(SyntaxKind::Colon) {
            self.parse_type();
        }
        self.finish_node(); // VARIABLE
    }

    fn parse_typealias_rest(&mut self) {
        self.bump(); // typealias
        self.expect_name("a type alias name");
        if self.at(SyntaxKind::Lt) {
            self.parse_type_parameters();
        }
        self.expect(SyntaxKind::Eq);
        self.parse_type();
    }

    /// `{ statements }` as a block, class body or lambda-free body
    fn parse_braced(&mut self, kind: SyntaxKind) {
        self.start_node(kind);
        self.with_newlines(true, |p| {
            p.bump(); // {
            p.parse_statements(true);
            p.expect(SyntaxKind::RBrace);
        });
        self.finish_node();
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) {
        let checkpoint = self.checkpoint();
        match self.current() {
            Some(SyntaxKind::LParen) if self.at_function_type() => {
                self.start_node(SyntaxKind::FunctionType);
                self.parse_function_type_tail();
                self.finish_node(); // FUNCTION_TYPE
            }
            Some(SyntaxKind::LParen) => {
                self.start_node(SyntaxKind::ParenType);
                self.with_newlines(false, |p| {
                    p.bump(); // (
                    p.parse_type();
                    p.expect(SyntaxKind::RParen);
                });
                self.finish_node(); // PAREN_TYPE
            }
            Some(SyntaxKind::Ident)
                if self.nth_text(0) == "dynamic" && self.nth(1) != Some(SyntaxKind::Dot) =>
            {
                self.bump_wrapped(SyntaxKind::DynamicType);
            }
            Some(SyntaxKind::Ident) => self.parse_simple_type(),
            _ => {
                self.error("expected a type");
                return;
            }
        }

        // Receiver function type `A.(B) -> C`
        if self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::LParen) {
            self.start_node_at(checkpoint, SyntaxKind::FunctionType);
            self.bump(); // .
            self.parse_function_type_tail();
            self.finish_node(); // FUNCTION_TYPE
        }

        while self.at_line(SyntaxKind::Question) {
            self.start_node_at(checkpoint, SyntaxKind::NullableType);
            self.bump();
            self.finish_node(); // NULLABLE_TYPE
        }
    }

    fn parse_simple_type(&mut self) {
        self.start_node(SyntaxKind::SimpleType);
        loop {
            self.start_node(SyntaxKind::SimpleTypePiece);
            self.bump_wrapped(SyntaxKind::Name);
            if self.at_line(SyntaxKind::Lt) {
                self.parse_type_arguments();
            }
            self.finish_node(); // SIMPLE_TYPE_PIECE
            if self.at(SyntaxKind::Dot) && self.nth(1) == Some(SyntaxKind::Ident) {
                self.bump();
            } else {
                break;
            }
        }
        self.finish_node(); // SIMPLE_TYPE
    }

    /// `(params) -> result`, starting at `(`
    fn parse_function_type_tail(&mut self) {
        self.start_node(SyntaxKind::FunctionTypeParameterList);
        self.with_newlines(false, |p| {
            p.bump(); // (
            while !p.at(SyntaxKind::RParen) && !p.at_end() {
                p.parse_type();
                if !p.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            p.expect(SyntaxKind::RParen);
        });
        self.finish_node(); // FUNCTION_TYPE_PARAMETER_LIST
        self.expect(SyntaxKind::Arrow);
        self.parse_type();
    }

    /// At `(`: the matching `)` is followed by `->`
    fn at_function_type(&self) -> bool {
        let mut depth = 0usize;
        let mut n = 0;
        while let Some(kind) = self.nth(n) {
            match kind {
                SyntaxKind::LParen => depth += 1,
                SyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.nth(n + 1) == Some(SyntaxKind::Arrow);
                    }
                }
                SyntaxKind::LBrace | SyntaxKind::RBrace | SyntaxKind::Semicolon => return false,
                _ => {}
            }
            n += 1;
        }
        false
    }

    fn parse_type_arguments(&mut self) {
        self.start_node(SyntaxKind::TypeArgumentList);
        self.with_newlines(false, |p| {
            p.bump(); // <
            while !p.at(SyntaxKind::Gt) && !p.at_end() {
                p.start_node(SyntaxKind::TypeProjection);
                if p.at(SyntaxKind::Star) {
                    p.bump();
                } else {
                    let variance = p.at(SyntaxKind::InKw)
                        || (p.at(SyntaxKind::Ident) && p.nth_text(0) == "out");
                    if variance
                        && matches!(p.nth(1), Some(SyntaxKind::Ident | SyntaxKind::LParen))
                    {
                        p.bump_wrapped(SyntaxKind::Modifier);
                    }
                    p.parse_type();
                }
                p.finish_node(); // TYPE_PROJECTION
                if !p.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            p.expect(SyntaxKind::Gt);
        });
        self.finish_node(); // TYPE_ARGUMENT_LIST
    }

    /// At `<` after an expression: the bracketed run looks like type
    /// arguments and is followed by a call
    fn at_type_arguments(&self) -> bool {
        let mut angle = 0usize;
        let mut paren = 0usize;
        let mut n = 0;
        while let Some(kind) = self.nth(n) {
            match kind {
                SyntaxKind::Lt => angle += 1,
                SyntaxKind::Gt => {
                    angle -= 1;
                    if angle == 0 {
                        return matches!(
                            self.nth(n + 1),
                            Some(SyntaxKind::LParen | SyntaxKind::LBrace)
                        );
                    }
                }
                SyntaxKind::LParen => paren += 1,
                SyntaxKind::RParen if paren > 0 => paren -= 1,
                SyntaxKind::Arrow if paren > 0 => {}
                SyntaxKind::Ident
                | SyntaxKind::Comma
                | SyntaxKind::Dot
                | SyntaxKind::Question
                | SyntaxKind::Star
                | SyntaxKind::InKw => {}
                _ => return false,
            }
            n += 1;
        }
        false
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_binary(0);
        if self
            .current()
            .is_some_and(|kind| ASSIGNMENT_OPERATORS.contains(&kind))
            && self.on_same_line()
        {
            self.start_node_at(checkpoint, SyntaxKind::BinaryExpr);
            self.bump_wrapped(SyntaxKind::Keyword);
            self.parse_expression();
            self.finish_node(); // BINARY_EXPR
        }
    }

    fn parse_binary(&mut self, level: usize) {
        let Some(&(operators, crosses_newline)) = BINARY_LEVELS.get(level) else {
            self.parse_as();
            return;
        };

        let checkpoint = self.checkpoint();
        self.parse_binary(level + 1);
        while let Some(kind) = self.current() {
            if !operators.contains(&kind) || (!crosses_newline && !self.on_same_line()) {
                break;
            }
            if matches!(kind, SyntaxKind::IsKw | SyntaxKind::NotIs) {
                self.start_node_at(checkpoint, SyntaxKind::BinaryTypeExpr);
                self.bump_wrapped(SyntaxKind::Keyword);
                self.parse_type();
            } else {
                self.start_node_at(checkpoint, SyntaxKind::BinaryExpr);
                self.bump_wrapped(SyntaxKind::Keyword);
                self.parse_binary(level + 1);
            }
            self.finish_node();
        }
    }

    fn parse_as(&mut self) {
        let checkpoint = self.checkpoint();
        self.parse_prefix();
        while self.at_line(SyntaxKind::AsKw) || self.at_line(SyntaxKind::AsSafe) {
            self.start_node_at(checkpoint, SyntaxKind::BinaryTypeExpr);
            self.bump_wrapped(SyntaxKind::Keyword);
            self.parse_type();
            self.finish_node(); // BINARY_TYPE_EXPR
        }
    }

    fn parse_prefix(&mut self) {
        if matches!(
            self.current(),
            Some(
                SyntaxKind::Minus
                    | SyntaxKind::Plus
                    | SyntaxKind::Excl
                    | SyntaxKind::PlusPlus
                    | SyntaxKind::MinusMinus
            )
        ) {
            self.start_node(SyntaxKind::PrefixExpr);
            self.bump_wrapped(SyntaxKind::Keyword);
            self.parse_prefix();
            self.finish_node(); // PREFIX_EXPR
        } else {
            self.parse_postfix();
        }
    }

    fn parse_postfix(&mut self) {
        let checkpoint = self.checkpoint();
        let Some(primary) = self.parse_primary() else {
            return;
        };
        if !accepts_postfix(primary) {
            return;
        }

        loop {
            match self.current() {
                Some(SyntaxKind::LParen) if self.on_same_line() => {
                    self.start_node_at(checkpoint, SyntaxKind::CallExpr);
                    self.parse_value_arguments();
                    if self.at(SyntaxKind::LBrace) {
                        self.parse_lambda();
                    }
                    self.finish_node(); // CALL_EXPR
                }
                Some(SyntaxKind::Lt) if self.on_same_line() && self.at_type_arguments() => {
                    self.start_node_at(checkpoint, SyntaxKind::CallExpr);
                    self.parse_type_arguments();
                    if self.at_line(SyntaxKind::LParen) {
                        self.parse_value_arguments();
                    }
                    if self.at(SyntaxKind::LBrace) {
                        self.parse_lambda();
                    }
                    self.finish_node(); // CALL_EXPR
                }
                Some(SyntaxKind::LBrace) => {
                    self.start_node_at(checkpoint, SyntaxKind::CallExpr);
                    self.parse_lambda();
                    self.finish_node(); // CALL_EXPR
                }
                Some(SyntaxKind::LBracket) if self.on_same_line() => {
                    self.start_node_at(checkpoint, SyntaxKind::IndexExpr);
                    self.parse_index_list();
                    self.finish_node(); // INDEX_EXPR
                }
                Some(SyntaxKind::Dot | SyntaxKind::SafeDot) => {
                    self.start_node_at(checkpoint, SyntaxKind::NavigationExpr);
                    self.bump_wrapped(SyntaxKind::Keyword);
                    self.expect_name("a member name");
                    self.finish_node(); // NAVIGATION_EXPR
                }
                Some(SyntaxKind::PlusPlus | SyntaxKind::MinusMinus | SyntaxKind::ExclExcl)
                    if self.on_same_line() =>
                {
                    self.start_node_at(checkpoint, SyntaxKind::PostfixExpr);
                    self.bump_wrapped(SyntaxKind::Keyword);
                    self.finish_node(); // POSTFIX_EXPR
                }
                _ => break,
            }
        }
    }

    /// Parse a primary expression, returning the kind of the node produced
    fn parse_primary(&mut self) -> Option<SyntaxKind> {
        let kind = match self.current() {
            None
            | Some(
                SyntaxKind::RBrace
                | SyntaxKind::RParen
                | SyntaxKind::RBracket
                | SyntaxKind::Semicolon
                | SyntaxKind::Comma,
            ) => {
                self.error("expected an expression");
                return None;
            }
            Some(kind) => kind,
        };

        let node = match kind {
            SyntaxKind::Ident => {
                self.bump_wrapped(SyntaxKind::Name);
                SyntaxKind::Name
            }
            SyntaxKind::IntLiteral
            | SyntaxKind::RealLiteral
            | SyntaxKind::CharLiteral
            | SyntaxKind::TrueKw
            | SyntaxKind::FalseKw
            | SyntaxKind::NullKw => {
                self.bump_wrapped(SyntaxKind::Literal);
                SyntaxKind::Literal
            }
            SyntaxKind::QuoteOpen | SyntaxKind::TripleQuoteOpen => {
                self.parse_string_template();
                SyntaxKind::StringTemplate
            }
            SyntaxKind::ThisKw => {
                self.bump_wrapped(SyntaxKind::ThisExpr);
                SyntaxKind::ThisExpr
            }
            SyntaxKind::LParen => {
                self.start_node(SyntaxKind::ParenExpr);
                self.with_newlines(false, |p| {
                    p.bump(); // (
                    p.parse_expression();
                    p.expect(SyntaxKind::RParen);
                });
                self.finish_node(); // PAREN_EXPR
                SyntaxKind::ParenExpr
            }
            SyntaxKind::LBrace => {
                self.parse_lambda();
                SyntaxKind::Lambda
            }
            SyntaxKind::IfKw => {
                self.parse_if();
                SyntaxKind::IfExpr
            }
            SyntaxKind::WhenKw => {
                self.parse_when();
                SyntaxKind::WhenExpr
            }
            SyntaxKind::WhileKw => {
                self.start_node(SyntaxKind::WhileExpr);
                self.bump(); // while
                self.parse_condition();
                self.parse_control_body();
                self.finish_node(); // WHILE_EXPR
                SyntaxKind::WhileExpr
            }
            SyntaxKind::DoKw => {
                self.start_node(SyntaxKind::DoWhileExpr);
                self.bump(); // do
                self.parse_control_body();
                self.expect(SyntaxKind::WhileKw);
                self.parse_condition();
                self.finish_node(); // DO_WHILE_EXPR
                SyntaxKind::DoWhileExpr
            }
            SyntaxKind::ForKw => {
                self.parse_for();
                SyntaxKind::ForExpr
            }
            SyntaxKind::TryKw => {
                self.parse_try();
                SyntaxKind::TryExpr
            }
            SyntaxKind::ReturnKw => {
                self.start_node(SyntaxKind::ReturnExpr);
                self.bump(); // return
                if self.on_same_line() && self.at_expression_start() {
                    self.parse_expression();
                }
                self.finish_node(); // RETURN_EXPR
                SyntaxKind::ReturnExpr
            }
            SyntaxKind::ThrowKw => {
                self.start_node(SyntaxKind::ThrowExpr);
                self.bump(); // throw
                self.parse_expression();
                self.finish_node(); // THROW_EXPR
                SyntaxKind::ThrowExpr
            }
            SyntaxKind::BreakKw => {
                self.bump_wrapped(SyntaxKind::BreakExpr);
                SyntaxKind::BreakExpr
            }
            SyntaxKind::ContinueKw => {
                self.bump_wrapped(SyntaxKind::ContinueExpr);
                SyntaxKind::ContinueExpr
            }
            _ => {
                self.error_node("expected an expression");
                SyntaxKind::Error
            }
        };
        Some(node)
    }

    fn at_expression_start(&self) -> bool {
        !matches!(
            self.current(),
            None | Some(
                SyntaxKind::RBrace
                    | SyntaxKind::RParen
                    | SyntaxKind::RBracket
                    | SyntaxKind::Semicolon
                    | SyntaxKind::Comma
                    | SyntaxKind::Arrow
                    | SyntaxKind::Colon
                    | SyntaxKind::ElseKw
                    | SyntaxKind::CatchKw
                    | SyntaxKind::FinallyKw
            )
        )
    }

    /// `( expression )` after a control-flow keyword
    fn parse_condition(&mut self) {
        self.with_newlines(false, |p| {
            p.expect(SyntaxKind::LParen);
            p.parse_expression();
            p.expect(SyntaxKind::RParen);
        });
    }

    /// Branch or loop body: a block or a single expression
    fn parse_control_body(&mut self) {
        if self.at(SyntaxKind::LBrace) {
            self.parse_braced(SyntaxKind::Block);
        } else {
            self.parse_expression();
        }
    }

    fn parse_if(&mut self) {
        self.start_node(SyntaxKind::IfExpr);
        self.bump(); // if
        self.parse_condition();
        self.parse_control_body();
        if self.at(SyntaxKind::ElseKw) {
            self.bump();
            self.parse_control_body();
        }
        self.finish_node(); // IF_EXPR
    }

    fn parse_when(&mut self) {
        self.start_node(SyntaxKind::WhenExpr);
        self.bump(); // when
        if self.at_line(SyntaxKind::LParen) {
            self.parse_condition();
        }

        self.start_node(SyntaxKind::WhenEntryList);
        self.with_newlines(true, |p| {
            p.expect(SyntaxKind::LBrace);
            loop {
                p.skip_separators();
                if p.at(SyntaxKind::RBrace) || p.at_end() {
                    break;
                }
                let start = p.pos;
                p.parse_when_entry();
                if p.pos == start {
                    p.error_node("unexpected token in when entry");
                }
            }
            p.expect(SyntaxKind::RBrace);
        });
        self.finish_node(); // WHEN_ENTRY_LIST

        self.finish_node(); // WHEN_EXPR
    }

    fn parse_when_entry(&mut self) {
        self.start_node(SyntaxKind::WhenEntry);
        if self.at(SyntaxKind::ElseKw) {
            self.bump();
        } else {
            loop {
                self.parse_when_condition();
                if !self.eat(SyntaxKind::Comma) || self.at(SyntaxKind::Arrow) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::Arrow);
        self.parse_control_body();
        self.finish_node(); // WHEN_ENTRY
    }

    fn parse_when_condition(&mut self) {
        match self.current() {
            Some(SyntaxKind::IsKw | SyntaxKind::NotIs) => {
                self.start_node(SyntaxKind::WhenCondition);
                self.bump_wrapped(SyntaxKind::Keyword);
                self.parse_type();
                self.finish_node(); // WHEN_CONDITION
            }
            Some(SyntaxKind::InKw | SyntaxKind::NotIn) => {
                self.start_node(SyntaxKind::WhenCondition);
                self.bump_wrapped(SyntaxKind::Keyword);
                self.parse_expression();
                self.finish_node(); // WHEN_CONDITION
            }
            _ => self.parse_expression(),
        }
    }

    fn parse_for(&mut self) {
        self.start_node(SyntaxKind::ForExpr);
        self.bump(); // for
        self.with_newlines(false, |p| {
            p.expect(SyntaxKind::LParen);
            p.parse_variable();
            p.expect(SyntaxKind::InKw);
            p.parse_expression();
            p.expect(SyntaxKind::RParen);
        });
        self.parse_control_body();
        self.finish_node(); // FOR_EXPR
    }

    fn parse_try(&mut self) {
        self.start_node(SyntaxKind::TryExpr);
        self.bump(); // try
        self.parse_block_or_error();
        while self.at(SyntaxKind::CatchKw) {
            self.start_node(SyntaxKind::CatchClause);
            self.bump(); // catch
            self.with_newlines(false, |p| {
                p.expect(SyntaxKind::LParen);
                p.parse_variable();
                p.expect(SyntaxKind::RParen);
            });
            self.parse_block_or_error();
            self.finish_node(); // CATCH_CLAUSE
        }
        if self.eat(SyntaxKind::FinallyKw) {
            self.parse_block_or_error();
        }
        self.finish_node(); // TRY_EXPR
    }

    fn parse_block_or_error(&mut self) {
        if self.at(SyntaxKind::LBrace) {
            self.parse_braced(SyntaxKind::Block);
        } else {
            self.error("expected a block");
        }
    }

    fn parse_lambda(&mut self) {
        self.start_node(SyntaxKind::Lambda);
        self.with_newlines(true, |p| {
            p.bump(); // {
            if p.at_lambda_parameters() {
                p.start_node(SyntaxKind::LambdaParameterList);
                loop {
                    p.parse_variable();
                    if !p.eat(SyntaxKind::Comma) || p.at(SyntaxKind::Arrow) {
                        break;
                    }
                }
                p.expect(SyntaxKind::Arrow);
                p.finish_node(); // LAMBDA_PARAMETER_LIST
            }
            p.parse_statements(true);
            p.expect(SyntaxKind::RBrace);
        });
        self.finish_node(); // LAMBDA
    }

    /// After `{`: names and types up to a `->`
    fn at_lambda_parameters(&self) -> bool {
        if self.current() != Some(SyntaxKind::Ident) {
            return false;
        }
        let mut n = 1;
        while let Some(kind) = self.nth(n) {
            match kind {
                SyntaxKind::Arrow => return true,
                SyntaxKind::Ident
                | SyntaxKind::Comma
                | SyntaxKind::Colon
                | SyntaxKind::Dot
                | SyntaxKind::Question
                | SyntaxKind::Lt
                | SyntaxKind::Gt => {}
                _ => return false,
            }
            n += 1;
        }
        false
    }

    fn parse_value_arguments(&mut self) {
        self.start_node(SyntaxKind::ValueArgumentList);
        self.with_newlines(false, |p| {
            p.bump(); // (
            while !p.at(SyntaxKind::RParen) && !p.at_end() {
                p.start_node(SyntaxKind::ValueArgument);
                if p.at(SyntaxKind::Ident) && p.nth(1) == Some(SyntaxKind::Eq) {
                    p.bump_wrapped(SyntaxKind::Name);
                    p.bump(); // =
                }
                p.eat(SyntaxKind::Star);
                p.parse_expression();
                p.finish_node(); // VALUE_ARGUMENT
                if !p.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            p.expect(SyntaxKind::RParen);
        });
        self.finish_node(); // VALUE_ARGUMENT_LIST
    }

    fn parse_index_list(&mut self) {
        self.start_node(SyntaxKind::IndexList);
        self.with_newlines(false, |p| {
            p.bump(); // [
            while !p.at(SyntaxKind::RBracket) && !p.at_end() {
                p.parse_expression();
                if !p.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            p.expect(SyntaxKind::RBracket);
        });
        self.finish_node(); // INDEX_LIST
    }

    /// String literal; its inner tokens are never trivia
    fn parse_string_template(&mut self) {
        self.start_node(SyntaxKind::StringTemplate);
        let close = if self.at(SyntaxKind::TripleQuoteOpen) {
            SyntaxKind::TripleQuoteClose
        } else {
            SyntaxKind::QuoteClose
        };
        self.bump(); // opening quote

        loop {
            match self.tokens.get(self.pos).map(|token| token.kind) {
                Some(SyntaxKind::StringContent) => {
                    self.bump_wrapped(SyntaxKind::LiteralStringEntry);
                }
                Some(SyntaxKind::Dollar) => {
                    self.start_node(SyntaxKind::ShortTemplateEntry);
                    self.token(); // $
                    match self.tokens.get(self.pos).map(|token| token.kind) {
                        Some(SyntaxKind::ThisKw) => self.bump_wrapped(SyntaxKind::ThisExpr),
                        _ => self.bump_wrapped(SyntaxKind::Name),
                    }
                    self.finish_node(); // SHORT_TEMPLATE_ENTRY
                }
                Some(SyntaxKind::DollarLBrace) => {
                    self.start_node(SyntaxKind::LongTemplateEntry);
                    self.token(); // ${
                    self.with_newlines(false, |p| {
                        p.parse_expression();
                        p.expect(SyntaxKind::RBrace);
                    });
                    self.finish_node(); // LONG_TEMPLATE_ENTRY
                }
                Some(kind) if kind == close => {
                    self.token();
                    break;
                }
                _ => {
                    self.error("unterminated string literal");
                    break;
                }
            }
        }

        self.finish_node(); // STRING_TEMPLATE
    }
}

/// Primaries that may be followed by calls, navigation or indexing
fn accepts_postfix(kind: SyntaxKind) -> bool {
    !matches!(
        kind,
        SyntaxKind::IfExpr
            | SyntaxKind::WhenExpr
            | SyntaxKind::TryExpr
            | SyntaxKind::WhileExpr
            | SyntaxKind::DoWhileExpr
            | SyntaxKind::ForExpr
            | SyntaxKind::ReturnExpr
            | SyntaxKind::ThrowExpr
            | SyntaxKind::BreakExpr
            | SyntaxKind::ContinueExpr
            | SyntaxKind::Error
    )
}

fn describe(kind: SyntaxKind) -> String {
    match kind.fixed_text() {
        Some(text) => format!("`{text}`"),
        None => format!("{kind:?}"),
    }
}

fn text_range(span: &Span) -> TextRange {
    TextRange::new(
        TextSize::from(span.start as u32),
        TextSize::from(span.end as u32),
    )
}
