//! Trivia-preserving lexer
//!
//! Every byte of the input ends up in exactly one token, so concatenating
//! token texts reproduces the source. Whitespace, newlines and comments are
//! kept as trivia tokens for the parser to place in the tree.
//!
//! String literals are lexed with a mode stack: inside a string the lexer
//! produces content, `$name` and `${` tokens, and a `${` pushes a code mode
//! that is popped again by its matching `}`.

use std::ops::Range;

use crate::SyntaxKind;

/// Byte range of a token in the source
pub type Span = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: Span,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: SyntaxKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the lexer
pub type LexResult = (Vec<Token>, Vec<LexerError>);

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Ordinary code; `braces` counts unclosed `{` opened in this mode
    Code { braces: u32 },
    /// Inside a string literal
    Str { raw: bool },
}

/// Operators, longest first so the first match wins
const OPERATORS: &[(&str, SyntaxKind)] = &[
    ("===", SyntaxKind::EqEqEq),
    ("!==", SyntaxKind::NotEqEq),
    ("?.", SyntaxKind::SafeDot),
    ("?:", SyntaxKind::Elvis),
    ("->", SyntaxKind::Arrow),
    ("..", SyntaxKind::Range),
    ("++", SyntaxKind::PlusPlus),
    ("--", SyntaxKind::MinusMinus),
    ("!!", SyntaxKind::ExclExcl),
    ("==", SyntaxKind::EqEq),
    ("!=", SyntaxKind::NotEq),
    ("<=", SyntaxKind::LtEq),
    (">=", SyntaxKind::GtEq),
    ("&&", SyntaxKind::AndAnd),
    ("||", SyntaxKind::OrOr),
    ("+=", SyntaxKind::PlusEq),
    ("-=", SyntaxKind::MinusEq),
    ("*=", SyntaxKind::StarEq),
    ("/=", SyntaxKind::SlashEq),
    ("%=", SyntaxKind::PercentEq),
    (";", SyntaxKind::Semicolon),
    (",", SyntaxKind::Comma),
    (".", SyntaxKind::Dot),
    (":", SyntaxKind::Colon),
    ("(", SyntaxKind::LParen),
    (")", SyntaxKind::RParen),
    ("[", SyntaxKind::LBracket),
    ("]", SyntaxKind::RBracket),
    ("<", SyntaxKind::Lt),
    (">", SyntaxKind::Gt),
    ("?", SyntaxKind::Question),
    ("+", SyntaxKind::Plus),
    ("-", SyntaxKind::Minus),
    ("*", SyntaxKind::Star),
    ("/", SyntaxKind::Slash),
    ("%", SyntaxKind::Percent),
    ("!", SyntaxKind::Excl),
    ("=", SyntaxKind::Eq),
];

/// Lex input preserving all trivia
///
/// `tokens.iter().map(|t| t.text).collect::<String>() == input` holds for any
/// input, including malformed input.
pub fn lex_with_trivia(input: &str) -> LexResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut modes = vec![Mode::Code { braces: 0 }];

    let len = input.len();
    let mut i = 0usize;

    while i < len {
        let mode = modes.last().copied().unwrap_or(Mode::Code { braces: 0 });
        if let Mode::Str { raw } = mode {
            i = lex_string_part(input, i, raw, &mut modes, &mut tokens, &mut errors);
            continue;
        }

        let Some((current, size)) = next_char(input, i) else {
            break;
        };
        let start = i;

        match current {
            '\n' => {
                tokens.push(Token::new(SyntaxKind::Newline, "\n", span(start, i + size)));
                i += size;
            }
            '\r' => {
                let mut end = i + size;
                if let Some(('\n', nl_size)) = next_char(input, end) {
                    end += nl_size;
                }
                tokens.push(Token::new(SyntaxKind::Newline, &input[start..end], span(start, end)));
                i = end;
            }
            c if c.is_whitespace() => {
                let mut end = i + size;
                while let Some((next_ch, next_size)) = next_char(input, end) {
                    if next_ch.is_whitespace() && next_ch != '\n' && next_ch != '\r' {
                        end += next_size;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::new(SyntaxKind::Whitespace, &input[start..end], span(start, end)));
                i = end;
            }
            '/' if input[i..].starts_with("//") => {
                let end = input[i..].find(['\n', '\r']).map_or(len, |offset| i + offset);
                tokens.push(Token::new(SyntaxKind::CommentLine, &input[start..end], span(start, end)));
                i = end;
            }
            '/' if input[i..].starts_with("/*") => {
                let (end, error) = lex_block_comment(input, start);
                if let Some(err) = error {
                    errors.push(err);
                }
                tokens.push(Token::new(SyntaxKind::CommentBlock, &input[start..end], span(start, end)));
                i = end;
            }
            '"' => {
                if input[i..].starts_with("\"\"\"") {
                    let end = i + 3;
                    tokens.push(Token::new(SyntaxKind::TripleQuoteOpen, "\"\"\"", span(start, end)));
                    modes.push(Mode::Str { raw: true });
                    i = end;
                } else {
                    tokens.push(Token::new(SyntaxKind::QuoteOpen, "\"", span(start, i + size)));
                    modes.push(Mode::Str { raw: false });
                    i += size;
                }
            }
            '\'' => {
                let (end, error) = lex_char_literal(input, start);
                if let Some(err) = error {
                    errors.push(err);
                }
                tokens.push(Token::new(SyntaxKind::CharLiteral, &input[start..end], span(start, end)));
                i = end;
            }
            '`' => {
                let (end, error) = lex_backtick_ident(input, start);
                if let Some(err) = error {
                    errors.push(err);
                }
                tokens.push(Token::new(SyntaxKind::Ident, &input[start..end], span(start, end)));
                i = end;
            }
            '{' => {
                if let Some(Mode::Code { braces }) = modes.last_mut() {
                    *braces += 1;
                }
                tokens.push(Token::new(SyntaxKind::LBrace, "{", span(start, i + size)));
                i += size;
            }
            '}' => {
                let depth = modes.len();
                let closes_template = match modes.last_mut() {
                    Some(Mode::Code { braces }) if *braces > 0 => {
                        *braces -= 1;
                        false
                    }
                    // Closes a `${` template entry
                    Some(Mode::Code { .. }) => depth > 1,
                    _ => false,
                };
                if closes_template {
                    modes.pop();
                }
                tokens.push(Token::new(SyntaxKind::RBrace, "}", span(start, i + size)));
                i += size;
            }
            c if c.is_ascii_digit() => {
                let (kind, end) = lex_number(input, start);
                tokens.push(Token::new(kind, &input[start..end], span(start, end)));
                i = end;
            }
            c if is_ident_start(c) => {
                let (kind, end) = lex_word(input, start);
                tokens.push(Token::new(kind, &input[start..end], span(start, end)));
                i = end;
            }
            _ => {
                if let Some((kind, end)) = lex_operator(input, start) {
                    tokens.push(Token::new(kind, &input[start..end], span(start, end)));
                    i = end;
                } else {
                    errors.push(LexerError::new(
                        format!("Unexpected character '{current}'"),
                        span(start, i + size),
                    ));
                    tokens.push(Token::new(
                        SyntaxKind::ErrorToken,
                        &input[start..i + size],
                        span(start, i + size),
                    ));
                    i += size;
                }
            }
        }
    }

    if matches!(modes.last(), Some(Mode::Str { .. })) {
        errors.push(LexerError::new("Unterminated string literal", span(len, len)));
    }

    (tokens, errors)
}

/// Lex one piece of a string body starting at `start`, returning the new
/// position
fn lex_string_part(
    input: &str,
    start: usize,
    raw: bool,
    modes: &mut Vec<Mode>,
    tokens: &mut Vec<Token>,
    errors: &mut Vec<LexerError>,
) -> usize {
    let rest = &input[start..];

    if raw && rest.starts_with("\"\"\"") && !rest[3..].starts_with('"') {
        tokens.push(Token::new(SyntaxKind::TripleQuoteClose, "\"\"\"", span(start, start + 3)));
        modes.pop();
        return start + 3;
    }
    if !raw && rest.starts_with('"') {
        tokens.push(Token::new(SyntaxKind::QuoteClose, "\"", span(start, start + 1)));
        modes.pop();
        return start + 1;
    }
    if rest.starts_with("${") {
        tokens.push(Token::new(SyntaxKind::DollarLBrace, "${", span(start, start + 2)));
        modes.push(Mode::Code { braces: 0 });
        return start + 2;
    }
    if rest.starts_with('$')
        && let Some((c, _)) = next_char(input, start + 1)
        && is_ident_start(c)
    {
        tokens.push(Token::new(SyntaxKind::Dollar, "$", span(start, start + 1)));
        let (kind, end) = lex_word(input, start + 1);
        // `$this` stays a keyword, every other word is a name
        let kind = if kind == SyntaxKind::ThisKw { kind } else { SyntaxKind::Ident };
        tokens.push(Token::new(kind, &input[start + 1..end], span(start + 1, end)));
        return end;
    }

    let mut end = start;
    while let Some((c, size)) = next_char(input, end) {
        match c {
            '"' if raw => {
                // A quote run closes only with its final three quotes
                let run = input[end..].chars().take_while(|&q| q == '"').count();
                if run >= 3 {
                    end += run - 3;
                    break;
                }
                end += run;
            }
            '"' => break,
            '$' if input[end..].starts_with("${") => break,
            '$' if next_char(input, end + 1).is_some_and(|(n, _)| is_ident_start(n)) => break,
            '\\' if !raw => {
                end += size;
                if let Some((_, escaped)) = next_char(input, end) {
                    end += escaped;
                }
            }
            '\n' | '\r' if !raw => {
                errors.push(LexerError::new(
                    "Newline in string literal",
                    span(end, end + size),
                ));
                // Resume in code mode so the rest of the file still lexes
                modes.pop();
                break;
            }
            _ => end += size,
        }
    }

    if end == start {
        return end;
    }
    tokens.push(Token::new(SyntaxKind::StringContent, &input[start..end], span(start, end)));
    end
}

fn lex_block_comment(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let mut depth = 0usize;
    let mut i = start;
    while i < input.len() {
        let rest = &input[i..];
        if rest.starts_with("/*") {
            depth += 1;
            i += 2;
        } else if rest.starts_with("*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return (i, None);
            }
        } else {
            i += next_char(input, i).map_or(1, |(_, size)| size);
        }
    }
    (
        input.len(),
        Some(LexerError::new("Unterminated block comment", span(start, input.len()))),
    )
}

fn lex_char_literal(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let mut i = start + 1;
    while let Some((c, size)) = next_char(input, i) {
        match c {
            '\\' => {
                i += size;
                if let Some((_, escaped)) = next_char(input, i) {
                    i += escaped;
                }
            }
            '\'' => return (i + size, None),
            '\n' | '\r' => break,
            _ => i += size,
        }
    }
    (i, Some(LexerError::new("Unterminated character literal", span(start, i))))
}

fn lex_backtick_ident(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let mut i = start + 1;
    while let Some((c, size)) = next_char(input, i) {
        match c {
            '`' => return (i + size, None),
            '\n' | '\r' => break,
            _ => i += size,
        }
    }
    (i, Some(LexerError::new("Unterminated quoted identifier", span(start, i))))
}

fn lex_word(input: &str, start: usize) -> (SyntaxKind, usize) {
    let mut end = start;
    while let Some((c, size)) = next_char(input, end) {
        if is_ident_continue(c) {
            end += size;
        } else {
            break;
        }
    }

    let word = &input[start..end];
    if word == "as"
        && input[end..].starts_with('?')
        && !input[end..].starts_with("?.")
        && !input[end..].starts_with("?:")
    {
        return (SyntaxKind::AsSafe, end + 1);
    }

    (SyntaxKind::from_keyword(word).unwrap_or(SyntaxKind::Ident), end)
}

fn lex_number(input: &str, start: usize) -> (SyntaxKind, usize) {
    let bytes = input.as_bytes();
    let digits = |mut i: usize, pred: fn(u8) -> bool| {
        while i < bytes.len() && (pred(bytes[i]) || bytes[i] == b'_') {
            i += 1;
        }
        i
    };

    let rest = &input[start..];
    if rest.starts_with("0x") || rest.starts_with("0X") {
        let end = digits(start + 2, |b| b.is_ascii_hexdigit());
        return (SyntaxKind::IntLiteral, int_suffix(bytes, end));
    }
    if rest.starts_with("0b") || rest.starts_with("0B") {
        let end = digits(start + 2, |b| b == b'0' || b == b'1');
        return (SyntaxKind::IntLiteral, int_suffix(bytes, end));
    }

    let mut end = digits(start, |b| b.is_ascii_digit());
    let mut real = false;

    if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end = digits(end + 1, |b| b.is_ascii_digit());
        real = true;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            end = digits(exp, |b| b.is_ascii_digit());
            real = true;
        }
    }
    if end < bytes.len() && (bytes[end] == b'f' || bytes[end] == b'F') {
        return (SyntaxKind::RealLiteral, end + 1);
    }
    if real {
        return (SyntaxKind::RealLiteral, end);
    }
    (SyntaxKind::IntLiteral, int_suffix(bytes, end))
}

fn int_suffix(bytes: &[u8], mut end: usize) -> usize {
    if end < bytes.len() && (bytes[end] == b'u' || bytes[end] == b'U') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'L' {
        end += 1;
    }
    end
}

fn lex_operator(input: &str, start: usize) -> Option<(SyntaxKind, usize)> {
    let rest = &input[start..];

    // `!is` and `!in` only when the keyword is a whole word
    for (text, kind) in [("!is", SyntaxKind::NotIs), ("!in", SyntaxKind::NotIn)] {
        if rest.starts_with(text)
            && !next_char(input, start + text.len()).is_some_and(|(c, _)| is_ident_continue(c))
        {
            return Some((kind, start + text.len()));
        }
    }

    OPERATORS
        .iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|&(text, kind)| (kind, start + text.len()))
}

/// Returns `true` if `prev` directly followed by `next` would lex as a single
/// longer token (an operator or a comment opener)
pub fn chars_would_join(prev: char, next: char) -> bool {
    if is_ident_continue(prev) && is_ident_continue(next) {
        return true;
    }
    let mut pair = [0u8; 8];
    let prev_len = prev.encode_utf8(&mut pair).len();
    let next_len = next.encode_utf8(&mut pair[prev_len..]).len();
    let Ok(joined) = std::str::from_utf8(&pair[..prev_len + next_len]) else {
        return false;
    };
    if joined == "//" || joined == "/*" || joined == "*/" {
        return true;
    }
    OPERATORS
        .iter()
        .any(|(text, _)| text.len() > 1 && text.starts_with(joined))
}

/// Returns `true` if `prev` directly followed by `next` lexes into other
/// tokens than the two texts lexed apart
pub fn texts_would_join(prev: &str, next: &str) -> bool {
    let (joined, _) = lex_with_trivia(&format!("{prev}{next}"));
    let (left, _) = lex_with_trivia(prev);
    let (right, _) = lex_with_trivia(next);
    joined.len() != left.len() + right.len()
        || joined
            .iter()
            .zip(left.iter().chain(&right))
            .any(|(a, b)| a.kind != b.kind || a.text != b.text)
}

/// Identifier start character
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Identifier continuation character
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn next_char(input: &str, pos: usize) -> Option<(char, usize)> {
    input.get(pos..)?.chars().next().map(|c| (c, c.len_utf8()))
}

fn span(start: usize, end: usize) -> Span {
    start..end
}
