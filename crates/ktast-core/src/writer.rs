//! Serialization of an AST back to source text
//!
//! With a [`TriviaStore`] the writer runs in preserve mode: every node is
//! written as its *before* trivia, its own syntax with *within* trivia at the
//! variant's gap, then its *after* trivia. Without a store it runs in
//! canonical mode and lays the tree out with fixed spacing, one statement
//! per line.
//!
//! Both modes neutralize shapes that would reparse differently: a class
//! without a body before a `{` statement gets `{}`, a statement that would
//! merge with the next one gets `;`, identifiers that cannot be written bare
//! get back-quotes, and a `$name` template that would swallow the following
//! text is written `${name}`.

use std::collections::HashSet;

use ktast_syntax::{
    chars_would_join, is_ident_continue, is_ident_start, is_modifier_keyword, is_reserved_word,
    texts_would_join,
};

use crate::config::WriterOptions;
use crate::node::{Ast, ListKind, Node, NodeId};
use crate::trivia::{Trivia, TriviaKind, TriviaStore};

/// Write the subtree under `root`, preserving trivia when a store is given
pub fn write(ast: &Ast, root: NodeId, trivia: Option<&TriviaStore>) -> String {
    Writer::new(ast, trivia).write(root)
}

/// Stateful serializer for one subtree
pub struct Writer<'a> {
    ast: &'a Ast,
    trivia: Option<&'a TriviaStore>,
    options: WriterOptions,
    out: String,
    depth: usize,
    /// Class declarations that must be written with an explicit body
    forced_bodies: HashSet<NodeId>,
    /// A line comment was written and no newline has followed yet
    needs_line_break: bool,
    /// A newline was written since the last token
    line_broken: bool,
    /// A `;` was written since the last token
    terminated: bool,
    /// Output range of the last token written
    last_token: std::ops::Range<usize>,
}

impl<'a> Writer<'a> {
    pub fn new(ast: &'a Ast, trivia: Option<&'a TriviaStore>) -> Self {
        Self::with_options(ast, trivia, WriterOptions::default())
    }

    pub fn with_options(ast: &'a Ast, trivia: Option<&'a TriviaStore>, options: WriterOptions) -> Self {
        Self {
            ast,
            trivia,
            options,
            out: String::new(),
            depth: 0,
            forced_bodies: HashSet::new(),
            needs_line_break: false,
            line_broken: false,
            terminated: false,
            last_token: 0..0,
        }
    }

    pub fn write(mut self, root: NodeId) -> String {
        self.node(root);
        if !self.preserve() && self.options.final_newline && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    fn preserve(&self) -> bool {
        self.trivia.is_some()
    }

    fn before(&self, id: NodeId) -> &'a [Trivia] {
        match self.trivia {
            Some(store) => store.before(id),
            None => &[],
        }
    }

    fn within(&self, id: NodeId) -> &'a [Trivia] {
        match self.trivia {
            Some(store) => store.within(id),
            None => &[],
        }
    }

    fn after(&self, id: NodeId) -> &'a [Trivia] {
        match self.trivia {
            Some(store) => store.after(id),
            None => &[],
        }
    }

    // ------------------------------------------------------------------
    // Output primitives
    // ------------------------------------------------------------------

    /// A significant token, separated from the previous one if the two
    /// would lex as one
    fn token(&mut self, text: &str) {
        self.break_after_line_comment();
        self.glue(text);
        let start = self.out.len();
        self.out.push_str(text);
        self.last_token = start..self.out.len();
        self.line_broken = false;
        self.terminated = false;
    }

    /// Text inside a string literal, written as is
    fn string_text(&mut self, text: &str) {
        self.break_after_line_comment();
        self.out.push_str(text);
        self.line_broken = false;
        self.terminated = false;
    }

    fn glue(&mut self, text: &str) {
        let (Some(prev), Some(next)) = (self.out.chars().next_back(), text.chars().next()) else {
            return;
        };
        if !chars_would_join(prev, next) {
            return;
        }
        // Tokens the lexer already splits apart need no space
        let last = self.last_token.clone();
        if last.end == self.out.len()
            && !last.is_empty()
            && !texts_would_join(&self.out[last], text)
        {
            return;
        }
        self.out.push(' ');
    }

    fn break_after_line_comment(&mut self) {
        if self.needs_line_break {
            self.out.push('\n');
            self.needs_line_break = false;
            self.line_broken = true;
        }
    }

    fn trivia_list(&mut self, list: &[Trivia]) {
        for trivia in list {
            self.trivia(trivia);
        }
    }

    fn trivia(&mut self, trivia: &Trivia) {
        match trivia.kind {
            TriviaKind::Whitespace => self.out.push_str(&trivia.text),
            TriviaKind::Newline => {
                self.out.push_str(&trivia.text);
                self.needs_line_break = false;
                self.line_broken = true;
            }
            TriviaKind::LineComment => {
                self.break_after_line_comment();
                self.glue(&trivia.text);
                self.out.push_str(&trivia.text);
                self.needs_line_break = true;
            }
            TriviaKind::BlockComment => {
                self.break_after_line_comment();
                self.glue(&trivia.text);
                self.out.push_str(&trivia.text);
            }
            TriviaKind::Terminator => {
                self.break_after_line_comment();
                self.out.push_str(&trivia.text);
                self.terminated = true;
            }
            TriviaKind::TrailingComma => {
                self.break_after_line_comment();
                self.out.push_str(&trivia.text);
            }
        }
    }

    /// Trivia at a node's internal gap
    fn gap(&mut self, id: NodeId) {
        self.trivia_list(self.within(id));
    }

    /// Canonical space
    fn sp(&mut self) {
        if !self.preserve() && !self.out.is_empty() && !self.out.ends_with([' ', '\n']) {
            self.out.push(' ');
        }
    }

    /// Canonical line break at the current depth
    fn newline(&mut self) {
        if self.preserve() {
            return;
        }
        self.out.push('\n');
        for _ in 0..self.depth * self.options.indent {
            self.out.push(' ');
        }
        self.line_broken = true;
    }

    /// A space between a class header and a `{}` the writer adds
    fn space_before_forced_body(&mut self) {
        if self.preserve() && !self.out.ends_with(char::is_whitespace) {
            self.out.push(' ');
        }
    }

    fn insert_terminator(&mut self) {
        self.break_after_line_comment();
        self.out.push(';');
        self.terminated = true;
    }

    // ------------------------------------------------------------------
    // Statement lists
    // ------------------------------------------------------------------

    /// Statements in order; `required` when the grammar needs a newline or
    /// `;` between two of them
    fn statements(&mut self, statements: &[NodeId], required: bool) {
        for (idx, &statement) in statements.iter().enumerate() {
            if let Some(&next) = statements.get(idx + 1) {
                self.force_body_before(statement, next);
            }
            if idx > 0 {
                self.separate(statements[idx - 1], statement, required);
            }
            self.node(statement);
        }
    }

    /// Separate two consecutive statements, entries or directives
    ///
    /// Preserve mode adds a newline only where a separator is `required`.
    /// Directives and when entries are written as recorded.
    fn separate(&mut self, prev: NodeId, next: NodeId, required: bool) {
        let before = self.before(next);
        let terminated = self.terminated || has_kind(before, TriviaKind::Terminator);
        if !terminated && self.needs_terminator(prev, next) {
            tracing::debug!("Inserting `;` between statements {} and {}", prev, next);
            self.insert_terminator();
        }

        if self.preserve() {
            if !required {
                return;
            }
            let separated = self.line_broken
                || self.terminated
                || has_kind(before, TriviaKind::Newline)
                || has_kind(before, TriviaKind::Terminator);
            if !separated {
                self.break_after_line_comment();
                if !self.line_broken {
                    self.out.push('\n');
                    self.line_broken = true;
                }
            }
        } else {
            self.newline();
        }
    }

    /// A class without a body followed by a `{` statement would take that
    /// statement as its body
    fn force_body_before(&mut self, statement: NodeId, next: NodeId) {
        let ast = self.ast;
        let Node::ClassDeclaration { body, .. } = ast.get(statement) else {
            return;
        };
        let bodiless = body.is_none_or(|body| {
            matches!(ast.get(body), Node::ClassBody { members } if members.is_empty())
        });
        let terminated = has_kind(self.after(statement), TriviaKind::Terminator)
            || has_kind(self.before(next), TriviaKind::Terminator);
        if bodiless && !terminated && self.starts_with_brace(next) {
            tracing::debug!("Writing an explicit body for class {}", statement);
            self.forced_bodies.insert(statement);
        }
    }

    fn needs_terminator(&self, prev: NodeId, next: NodeId) -> bool {
        let modifier_before_declaration = self
            .ast
            .name_text(prev)
            .is_some_and(is_modifier_keyword)
            && self.ast.get(next).is_declaration();
        modifier_before_declaration
            || (self.absorbs_trailing_lambda(prev) && self.starts_with_brace(next))
    }

    /// Whether a `{` on the next line would be parsed as part of `id`
    fn absorbs_trailing_lambda(&self, id: NodeId) -> bool {
        match self.ast.get(id) {
            Node::NameExpression { .. }
            | Node::ConstantLiteral { .. }
            | Node::StringLiteral { .. }
            | Node::This
            | Node::Parenthesized { .. }
            | Node::Lambda { .. }
            | Node::Call { .. }
            | Node::IndexAccess { .. }
            | Node::Navigation { .. }
            | Node::Postfix { .. } => true,
            Node::Binary { rhs, .. } => self.absorbs_trailing_lambda(*rhs),
            Node::Prefix { operand, .. } => self.absorbs_trailing_lambda(*operand),
            Node::If {
                then_branch,
                else_branch,
                ..
            } => self.absorbs_trailing_lambda(else_branch.unwrap_or(*then_branch)),
            Node::While { body, .. } | Node::For { body, .. } | Node::WhenEntry { body, .. } => {
                self.absorbs_trailing_lambda(*body)
            }
            Node::Return { expression } => {
                expression.is_some_and(|expression| self.absorbs_trailing_lambda(expression))
            }
            Node::Throw { expression } => self.absorbs_trailing_lambda(*expression),
            Node::PropertyDeclaration { initializer, .. } => {
                initializer.is_some_and(|initializer| self.absorbs_trailing_lambda(initializer))
            }
            Node::FunctionDeclaration { body, .. } => match body {
                None => true,
                Some(body) if matches!(self.ast.get(*body), Node::Block { .. }) => false,
                Some(body) => self.absorbs_trailing_lambda(*body),
            },
            _ => false,
        }
    }

    /// Whether the first token written for `id` is `{`
    fn starts_with_brace(&self, id: NodeId) -> bool {
        match self.ast.get(id) {
            Node::Lambda { .. } | Node::Block { .. } | Node::ClassBody { .. } => true,
            Node::Call { callee: first, .. }
            | Node::Navigation { receiver: first, .. }
            | Node::IndexAccess { receiver: first, .. }
            | Node::Postfix { operand: first, .. }
            | Node::Binary { lhs: first, .. }
            | Node::BinaryType { lhs: first, .. } => self.starts_with_brace(*first),
            Node::WhenEntry { conditions, .. } => conditions
                .first()
                .is_some_and(|condition| self.starts_with_brace(*condition)),
            _ => false,
        }
    }

    /// `{ statements }` of a block, class body or when
    fn braced(&mut self, id: NodeId, statements: &[NodeId], required: bool) {
        self.token("{");
        if self.preserve() {
            self.statements(statements, required);
            self.gap(id);
        } else if !statements.is_empty() {
            self.depth += 1;
            self.newline();
            self.statements(statements, required);
            self.depth -= 1;
            self.newline();
        }
        self.token("}");
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    fn node(&mut self, id: NodeId) {
        self.trivia_list(self.before(id));
        self.syntax(id);
        self.trivia_list(self.after(id));
    }

    fn opt_node(&mut self, id: Option<NodeId>) {
        if let Some(id) = id {
            self.node(id);
        }
    }

    /// Modifiers followed by a canonical space
    fn modifiers(&mut self, modifiers: Option<NodeId>) {
        if let Some(modifiers) = modifiers {
            self.node(modifiers);
            self.sp();
        }
    }

    fn syntax(&mut self, id: NodeId) {
        let ast = self.ast;
        match ast.get(id) {
            Node::KotlinFile {
                package,
                imports,
                statements,
            } => {
                let mut prev = None;
                for &item in package.iter().chain(imports) {
                    if let Some(prev) = prev {
                        self.separate(prev, item, false);
                    }
                    self.node(item);
                    prev = Some(item);
                }
                if let (Some(prev), Some(&first)) = (prev, statements.first()) {
                    self.separate(prev, first, false);
                }
                self.statements(statements, true);
                self.gap(id);
            }
            Node::PackageDirective { name } => {
                self.token("package");
                self.sp();
                self.node(*name);
            }
            Node::ImportDirective {
                name,
                wildcard,
                alias,
            } => {
                self.token("import");
                self.sp();
                self.node(*name);
                if *wildcard {
                    self.token(".");
                    self.gap(id);
                    self.token("*");
                }
                if let Some(alias) = alias {
                    self.sp();
                    self.token("as");
                    self.sp();
                    self.node(*alias);
                }
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
                self.modifiers(*modifiers);
                self.node(*declaration_keyword);
                if let Some(name) = name {
                    self.sp();
                    self.node(*name);
                }
                self.opt_node(*type_parameters);
                self.opt_node(*primary_constructor);
                if let Some(supertypes) = supertypes {
                    self.sp();
                    self.node(*supertypes);
                }
                let forced = self.forced_bodies.contains(&id);
                match body {
                    Some(body) => {
                        let empty =
                            matches!(ast.get(*body), Node::ClassBody { members } if members.is_empty());
                        if self.preserve() || !empty || forced {
                            if forced && self.before(*body).is_empty() {
                                self.space_before_forced_body();
                            }
                            self.sp();
                            self.node(*body);
                        }
                    }
                    None if forced => {
                        self.space_before_forced_body();
                        self.sp();
                        self.token("{");
                        self.token("}");
                    }
                    None => {}
                }
            }
            Node::ClassBody { members } => self.braced(id, members, true),
            Node::SuperTypeEntry {
                type_ref,
                arguments,
            } => {
                self.node(*type_ref);
                self.opt_node(*arguments);
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
                self.modifiers(*modifiers);
                self.token("fun");
                if let Some(type_parameters) = type_parameters {
                    self.sp();
                    self.node(*type_parameters);
                }
                self.sp();
                if let Some(receiver_type) = receiver_type {
                    self.node(*receiver_type);
                    self.token(".");
                }
                self.node(*name);
                self.node(*parameters);
                if let Some(return_type) = return_type {
                    self.token(":");
                    self.sp();
                    self.node(*return_type);
                }
                if let Some(body) = body {
                    self.sp();
                    if !matches!(ast.get(*body), Node::Block { .. }) {
                        self.token("=");
                        self.sp();
                    }
                    self.node(*body);
                }
            }
            Node::FunctionParameter {
                modifiers,
                val_or_var,
                name,
                type_ref,
                default_value,
            } => {
                self.modifiers(*modifiers);
                if let Some(val_or_var) = val_or_var {
                    self.node(*val_or_var);
                    self.sp();
                }
                self.node(*name);
                if let Some(type_ref) = type_ref {
                    self.token(":");
                    self.sp();
                    self.node(*type_ref);
                }
                if let Some(default_value) = default_value {
                    self.sp();
                    self.token("=");
                    self.sp();
                    self.node(*default_value);
                }
            }
            Node::PropertyDeclaration {
                modifiers,
                val_or_var,
                variable,
                initializer,
            } => {
                self.modifiers(*modifiers);
                self.node(*val_or_var);
                self.sp();
                self.node(*variable);
                if let Some(initializer) = initializer {
                    self.sp();
                    self.token("=");
                    self.sp();
                    self.node(*initializer);
                }
            }
            Node::Variable { name, type_ref } => {
                self.node(*name);
                if let Some(type_ref) = type_ref {
                    self.token(":");
                    self.sp();
                    self.node(*type_ref);
                }
            }
            Node::TypeAlias {
                modifiers,
                name,
                type_parameters,
                type_ref,
            } => {
                self.modifiers(*modifiers);
                self.token("typealias");
                self.sp();
                self.node(*name);
                self.opt_node(*type_parameters);
                self.sp();
                self.token("=");
                self.sp();
                self.node(*type_ref);
            }
            Node::TypeParameter {
                modifiers,
                name,
                bound,
            } => {
                self.modifiers(*modifiers);
                self.node(*name);
                if let Some(bound) = bound {
                    self.sp();
                    self.token(":");
                    self.sp();
                    self.node(*bound);
                }
            }

            Node::Block { statements } => self.braced(id, statements, true),
            Node::Lambda {
                parameters,
                statements,
            } => self.lambda(id, *parameters, statements),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.token("if");
                self.gap(id);
                self.sp();
                self.parenthesized(*condition);
                self.sp();
                self.node(*then_branch);
                if let Some(else_branch) = else_branch {
                    self.sp();
                    self.token("else");
                    self.sp();
                    self.node(*else_branch);
                }
            }
            Node::When { subject, entries } => {
                self.token("when");
                self.gap(id);
                if let Some(subject) = subject {
                    self.sp();
                    self.parenthesized(*subject);
                }
                self.sp();
                self.node(*entries);
            }
            Node::WhenEntry { conditions, body } => {
                if conditions.is_empty() {
                    self.token("else");
                    self.gap(id);
                } else {
                    for (idx, condition) in conditions.iter().enumerate() {
                        if idx > 0 {
                            self.token(",");
                            self.sp();
                        }
                        self.node(*condition);
                    }
                }
                self.sp();
                self.token("->");
                self.sp();
                self.node(*body);
            }
            Node::WhenCondition { operator, target } => {
                self.node(*operator);
                self.sp();
                self.node(*target);
            }
            Node::While { condition, body } => {
                self.token("while");
                self.gap(id);
                self.sp();
                self.parenthesized(*condition);
                self.sp();
                self.node(*body);
            }
            Node::DoWhile { body, condition } => {
                self.token("do");
                self.sp();
                self.node(*body);
                self.sp();
                self.token("while");
                self.gap(id);
                self.sp();
                self.parenthesized(*condition);
            }
            Node::For {
                variable,
                iterable,
                body,
            } => {
                self.token("for");
                self.gap(id);
                self.sp();
                self.token("(");
                self.node(*variable);
                self.sp();
                self.token("in");
                self.sp();
                self.node(*iterable);
                self.token(")");
                self.sp();
                self.node(*body);
            }
            Node::Try {
                block,
                catches,
                finally_block,
            } => {
                self.token("try");
                self.sp();
                self.node(*block);
                for catch in catches {
                    self.sp();
                    self.node(*catch);
                }
                if let Some(finally_block) = finally_block {
                    self.sp();
                    self.token("finally");
                    self.sp();
                    self.node(*finally_block);
                }
            }
            Node::CatchClause { parameter, block } => {
                self.token("catch");
                self.gap(id);
                self.sp();
                self.parenthesized(*parameter);
                self.sp();
                self.node(*block);
            }
            Node::Return { expression } => {
                self.token("return");
                if let Some(expression) = expression {
                    self.sp();
                    self.node(*expression);
                }
                self.gap(id);
            }
            Node::Throw { expression } => {
                self.token("throw");
                self.sp();
                self.node(*expression);
                self.gap(id);
            }
            Node::Break => self.token("break"),
            Node::Continue => self.token("continue"),

            Node::Call {
                callee,
                type_arguments,
                arguments,
                lambda,
            } => {
                self.node(*callee);
                self.opt_node(*type_arguments);
                self.opt_node(*arguments);
                if let Some(lambda) = lambda {
                    self.sp();
                    self.node(*lambda);
                }
            }
            Node::ValueArgument {
                name,
                spread,
                value,
            } => {
                if let Some(name) = name {
                    self.node(*name);
                    self.sp();
                    self.token("=");
                    self.gap(id);
                    self.sp();
                }
                if *spread {
                    self.token("*");
                }
                self.node(*value);
            }
            Node::Binary { lhs, operator, rhs } => {
                let tight = matches!(
                    ast.get(*operator),
                    Node::Keyword { keyword } if keyword.is_tight()
                );
                self.node(*lhs);
                if !tight {
                    self.sp();
                }
                self.node(*operator);
                if !tight {
                    self.sp();
                }
                self.node(*rhs);
            }
            Node::BinaryType { lhs, operator, rhs } => {
                self.node(*lhs);
                self.sp();
                self.node(*operator);
                self.sp();
                self.node(*rhs);
            }
            Node::Prefix { operator, operand } => {
                self.node(*operator);
                self.node(*operand);
            }
            Node::Postfix { operand, operator } => {
                self.node(*operand);
                self.node(*operator);
            }
            Node::Navigation {
                receiver,
                operator,
                selector,
            } => {
                self.node(*receiver);
                self.node(*operator);
                self.node(*selector);
            }
            Node::IndexAccess { receiver, indices } => {
                self.node(*receiver);
                self.node(*indices);
            }
            Node::Parenthesized { inner } => self.parenthesized(*inner),
            Node::StringLiteral { raw, entries } => self.string(*raw, entries),
            Node::LiteralStringEntry { text } => self.string_text(text),
            // Outside a literal there is no following entry to collide with
            Node::TemplateStringEntry { expression, short } => self.template(*expression, *short),
            Node::ConstantLiteral { text, .. } => self.token(text),
            Node::NameExpression { text } => self.name(text),
            Node::This => self.token("this"),

            Node::SimpleType { pieces } => {
                for (idx, piece) in pieces.iter().enumerate() {
                    if idx > 0 {
                        self.token(".");
                    }
                    self.node(*piece);
                }
            }
            Node::SimpleTypePiece {
                name,
                type_arguments,
            } => {
                self.node(*name);
                self.opt_node(*type_arguments);
            }
            Node::NullableType { inner } => {
                self.node(*inner);
                self.token("?");
            }
            Node::ParenthesizedType { inner } => self.parenthesized(*inner),
            Node::FunctionType {
                receiver,
                parameters,
                return_type,
            } => {
                if let Some(receiver) = receiver {
                    self.node(*receiver);
                    self.token(".");
                }
                self.node(*parameters);
                self.sp();
                self.token("->");
                self.sp();
                self.node(*return_type);
            }
            Node::TypeProjection { variance, type_ref } => match type_ref {
                None => self.token("*"),
                Some(type_ref) => {
                    if let Some(variance) = variance {
                        self.node(*variance);
                        self.sp();
                    }
                    self.node(*type_ref);
                }
            },

            Node::Modifier { keyword } => self.token(keyword.as_str()),
            Node::Keyword { keyword } => self.token(keyword.as_str()),
            Node::List { kind, elements } => self.list(id, *kind, elements),
        }
    }

    fn parenthesized(&mut self, inner: NodeId) {
        self.token("(");
        self.node(inner);
        self.token(")");
    }

    fn lambda(&mut self, id: NodeId, parameters: Option<NodeId>, statements: &[NodeId]) {
        self.token("{");
        if self.preserve() {
            self.opt_node(parameters);
            self.statements(statements, true);
            self.gap(id);
        } else if statements.len() <= 1 {
            if let Some(parameters) = parameters {
                self.sp();
                self.node(parameters);
            }
            if let Some(&statement) = statements.first() {
                self.sp();
                self.node(statement);
            }
            if parameters.is_some() || !statements.is_empty() {
                self.sp();
            }
        } else {
            if let Some(parameters) = parameters {
                self.sp();
                self.node(parameters);
            }
            self.depth += 1;
            self.newline();
            self.statements(statements, true);
            self.depth -= 1;
            self.newline();
        }
        self.token("}");
    }

    fn list(&mut self, id: NodeId, kind: ListKind, elements: &[NodeId]) {
        if kind.is_statement_like() {
            self.braced(id, elements, false);
            return;
        }

        if !kind.prefix().is_empty() {
            self.token(kind.prefix());
            if kind == ListKind::Supertypes {
                self.sp();
            }
        }
        for (idx, &element) in elements.iter().enumerate() {
            if idx > 0 {
                match kind.separator() {
                    "" => self.sp(),
                    "." => self.token("."),
                    separator => {
                        self.token(separator);
                        self.sp();
                    }
                }
            }
            self.node(element);
        }
        self.gap(id);
        if !kind.suffix().is_empty() {
            if kind == ListKind::LambdaParameters {
                self.sp();
            }
            self.token(kind.suffix());
        }
    }

    fn name(&mut self, text: &str) {
        if needs_backticks(text) {
            tracing::debug!("Back-quoting identifier {:?}", text);
            self.token(&format!("`{text}`"));
        } else {
            self.token(text);
        }
    }

    fn string(&mut self, raw: bool, entries: &[NodeId]) {
        let ast = self.ast;
        let quote = if raw { "\"\"\"" } else { "\"" };
        self.token(quote);
        for (idx, &entry) in entries.iter().enumerate() {
            let Node::TemplateStringEntry { expression, short } = ast.get(entry) else {
                self.node(entry);
                continue;
            };
            let next = entries.get(idx + 1).copied();
            let collides = next.is_some_and(|next| {
                matches!(
                    ast.get(next),
                    Node::LiteralStringEntry { text } if text.starts_with(is_ident_continue)
                )
            });
            let as_short = *short && !collides && self.short_template(*expression).is_some();
            if *short && !as_short {
                tracing::debug!("Writing template entry {} in braces", entry);
            }
            self.trivia_list(self.before(entry));
            self.template(*expression, as_short);
            self.trivia_list(self.after(entry));
        }
        self.string_text(quote);
    }

    /// The text of `expression` as a `$name` template, if it can be one
    fn short_template(&self, expression: NodeId) -> Option<&'a str> {
        let bare = self.before(expression).is_empty() && self.after(expression).is_empty();
        match self.ast.get(expression) {
            Node::NameExpression { text } if bare && !needs_backticks(text) => Some(text),
            Node::This if bare => Some("this"),
            _ => None,
        }
    }

    fn template(&mut self, expression: NodeId, short: bool) {
        match self.short_template(expression).filter(|_| short) {
            Some(text) => {
                self.string_text("$");
                self.string_text(text);
            }
            None => {
                self.string_text("${");
                self.node(expression);
                self.string_text("}");
            }
        }
    }
}

fn has_kind(list: &[Trivia], kind: TriviaKind) -> bool {
    list.iter().any(|trivia| trivia.kind == kind)
}

/// Identifiers that must be written between back-quotes
pub fn needs_backticks(text: &str) -> bool {
    if text.starts_with('`') {
        return false;
    }
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    is_reserved_word(text)
        || text.chars().all(|c| c == '_')
        || !is_ident_start(first)
        || !chars.all(is_ident_continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ConstantKind, Keyword};

    #[test]
    fn test_needs_backticks() {
        assert!(!needs_backticks("value"));
        assert!(!needs_backticks("data"));
        assert!(!needs_backticks("`in`"));
        assert!(needs_backticks("in"));
        assert!(needs_backticks("class"));
        assert!(needs_backticks("__"));
        assert!(needs_backticks("1st"));
        assert!(needs_backticks("with space"));
        assert!(needs_backticks(""));
    }

    #[test]
    fn test_canonical_binary() {
        let mut ast = Ast::new();
        let lhs = ast.name("a");
        let operator = ast.keyword(Keyword::Plus);
        let rhs = ast.alloc(Node::ConstantLiteral {
            kind: ConstantKind::Integer,
            text: "1".to_string(),
        });
        let root = ast.alloc(Node::Binary { lhs, operator, rhs });
        assert_eq!(write(&ast, root, None), "a + 1");
    }

    #[test]
    fn test_canonical_range_is_tight() {
        let mut ast = Ast::new();
        let lhs = ast.name("a");
        let operator = ast.keyword(Keyword::Range);
        let rhs = ast.name("b");
        let root = ast.alloc(Node::Binary { lhs, operator, rhs });
        assert_eq!(write(&ast, root, None), "a..b");
    }

    #[test]
    fn test_glue_guard_in_preserve_mode() {
        let mut ast = Ast::new();
        let operator = ast.keyword(Keyword::Minus);
        let inner_operator = ast.keyword(Keyword::Minus);
        let operand = ast.name("x");
        let inner = ast.alloc(Node::Prefix {
            operator: inner_operator,
            operand,
        });
        let root = ast.alloc(Node::Prefix {
            operator,
            operand: inner,
        });
        let store = TriviaStore::new();
        assert_eq!(write(&ast, root, Some(&store)), "- -x");
    }

    #[test]
    fn test_reserved_name_is_quoted() {
        let mut ast = Ast::new();
        let root = ast.name("object");
        assert_eq!(write(&ast, root, None), "`object`");
    }

    #[test]
    fn test_line_comment_forces_break() {
        let mut ast = Ast::new();
        let callee = ast.name("f");
        let argument = ast.name("a");
        let value = ast.alloc(Node::ValueArgument {
            name: None,
            spread: false,
            value: argument,
        });
        let arguments = ast.list(ListKind::ValueArguments, vec![value]);
        let root = ast.alloc(Node::Call {
            callee,
            type_arguments: None,
            arguments: Some(arguments),
            lambda: None,
        });
        let mut store = TriviaStore::new();
        store.push_after(argument, Trivia::whitespace(" "));
        store.push_after(argument, Trivia::line_comment("// note"));
        assert_eq!(write(&ast, root, Some(&store)), "f(a // note\n)");
    }
}
