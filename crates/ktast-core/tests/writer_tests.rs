//! Writer behavior: canonical layout and the rewrites that keep edited
//! trees from reparsing differently

use ktast_core::{
    Ast, ConstructOptions, Constructed, ListKind, Node, NodeId, Rewriter, Writer, WriterOptions,
    rewrite, write,
};

fn construct(source: &str) -> Constructed {
    Constructed::from_source(source, &ConstructOptions::default())
        .unwrap_or_else(|err| panic!("failed to construct {source:?}: {err}"))
}

fn statements(ast: &Ast, root: NodeId) -> Vec<NodeId> {
    match &ast[root] {
        Node::KotlinFile { statements, .. } => statements.clone(),
        other => panic!("expected a file, got {other:?}"),
    }
}

/// Variant names of the top-level statements `source` parses to
fn statement_kinds(source: &str) -> Vec<&'static str> {
    let unit = construct(source);
    statements(&unit.ast, unit.root)
        .into_iter()
        .map(|id| unit.ast[id].kind_name())
        .collect()
}

#[test]
fn test_canonical_layout() {
    let source = r#"package demo
import a.b.*

class Box<T>(val item: T) : Base() {
  fun get(): T = item  // getter
  override fun toString() = "Box($item)"
}

fun main() {
  val box = Box(1); println(box.get())
  when (box.item) {
    1 -> println("one")
    else -> {}
  }
  listOf(1, 2, ).forEach { n -> println(n) }
}
"#;
    let unit = construct(source);
    insta::assert_snapshot!(write(&unit.ast, unit.root, None), @r#"
    package demo
    import a.b.*
    class Box<T>(val item: T) : Base() {
        fun get(): T = item
        override fun toString() = "Box($item)"
    }
    fun main() {
        val box = Box(1)
        println(box.get())
        when (box.item) {
            1 -> println("one")
            else -> {}
        }
        listOf(1, 2).forEach { n -> println(n) }
    }
    "#);
}

#[test]
fn test_canonical_options() {
    let unit = construct("fun f() { g(); h() }");
    let options = WriterOptions {
        indent: 2,
        final_newline: true,
    };
    let text = Writer::with_options(&unit.ast, None, options).write(unit.root);
    assert_eq!(text, "fun f() {\n  g()\n  h()\n}\n");
}

#[test]
fn test_canonical_elides_empty_class_body() {
    let unit = construct("class A {\n}\nclass B {}\n");
    assert_eq!(write(&unit.ast, unit.root, None), "class A\nclass B");
}

#[test]
fn test_canonical_spacing() {
    let unit = construct("val x:Int=a+b*-c\nf(a,b = 1,*c)\nx?.y?:z\n1..n\n");
    assert_eq!(
        write(&unit.ast, unit.root, None),
        "val x: Int = a + b * -c\nf(a, b = 1, *c)\nx?.y ?: z\n1..n"
    );
}

/// Replaces every class body with an empty one, or drops it
struct ClearBodies {
    drop: bool,
}

impl Rewriter for ClearBodies {
    fn before_children(&mut self, ast: &mut Ast, id: NodeId, _parent: Option<NodeId>) -> NodeId {
        let Node::ClassDeclaration { body: Some(_), .. } = ast[id] else {
            return id;
        };
        let mut node = ast[id].clone();
        if let Node::ClassDeclaration { body, .. } = &mut node {
            *body = if self.drop {
                None
            } else {
                Some(ast.alloc(Node::ClassBody { members: vec![] }))
            };
        }
        ast.alloc(node)
    }
}

const CLASS_THEN_LAMBDA: &str = "class A {\n    val x = 1\n}\n\n{ 1 }\n";

#[test]
fn test_emptied_class_body_before_lambda_is_kept() {
    assert_eq!(statement_kinds(CLASS_THEN_LAMBDA), ["ClassDeclaration", "Lambda"]);

    let mut unit = construct(CLASS_THEN_LAMBDA);
    let root = rewrite(&mut unit.ast, unit.root, &mut ClearBodies { drop: false });

    let preserved = write(&unit.ast, root, Some(&unit.trivia));
    assert_eq!(preserved, "class A {}\n\n{ 1 }\n");
    assert_eq!(statement_kinds(&preserved), ["ClassDeclaration", "Lambda"]);

    let canonical = write(&unit.ast, root, None);
    assert_eq!(canonical, "class A {}\n{ 1 }");
    assert_eq!(statement_kinds(&canonical), ["ClassDeclaration", "Lambda"]);
}

#[test]
fn test_dropped_class_body_before_lambda_is_written() {
    let mut unit = construct(CLASS_THEN_LAMBDA);
    let root = rewrite(&mut unit.ast, unit.root, &mut ClearBodies { drop: true });

    let preserved = write(&unit.ast, root, Some(&unit.trivia));
    assert_eq!(preserved, "class A {}\n\n{ 1 }\n");
    assert_eq!(statement_kinds(&preserved), ["ClassDeclaration", "Lambda"]);

    let canonical = write(&unit.ast, root, None);
    assert_eq!(canonical, "class A {}\n{ 1 }");
}

#[test]
fn test_terminated_class_keeps_no_body() {
    let unit = construct("class A;\n{ 1 }\n");
    assert_eq!(unit.write(), "class A;\n{ 1 }\n");
    assert_eq!(statement_kinds(&unit.write()), ["ClassDeclaration", "Lambda"]);
}

/// Strips the `;` after the first statement of the file
fn drop_first_terminator(unit: &mut Constructed) {
    let first = statements(&unit.ast, unit.root)[0];
    unit.trivia.remove(first);
}

#[test]
fn test_modifier_name_before_declaration_gets_terminator() {
    let source = "open;\nfun f() {}\n";
    assert_eq!(statement_kinds(source), ["NameExpression", "FunctionDeclaration"]);

    let mut unit = construct(source);
    drop_first_terminator(&mut unit);
    let preserved = unit.write();
    assert_eq!(preserved, source);
    assert_eq!(statement_kinds(&preserved), ["NameExpression", "FunctionDeclaration"]);

    let canonical = write(&unit.ast, unit.root, None);
    assert_eq!(canonical, "open;\nfun f() {}");
}

#[test]
fn test_expression_before_lambda_gets_terminator() {
    for source in ["run;\n{ 1 }\n", "f(x);\n{ 1 }\n", "fun f();\n{ 1 }\n", "a + b.c;\n{ 1 }.d\n"] {
        let expected = statement_kinds(source);
        assert_eq!(expected.len(), 2, "{source:?} should hold two statements");

        let mut unit = construct(source);
        drop_first_terminator(&mut unit);
        let preserved = unit.write();
        assert_eq!(preserved, source);

        let canonical = write(&unit.ast, unit.root, None);
        assert_eq!(statement_kinds(&canonical), expected, "canonical form {canonical:?}");
    }
}

#[test]
fn test_block_ended_statement_needs_no_terminator() {
    let unit = construct("fun f() {}\n{ 1 }\n");
    assert_eq!(write(&unit.ast, unit.root, None), "fun f() {}\n{ 1 }");
}

/// Renames the name `x` to a fixed text
struct RenameTo(&'static str);

impl Rewriter for RenameTo {
    fn after_children(
        &mut self,
        ast: &mut Ast,
        _original: NodeId,
        current: NodeId,
        _parent: Option<NodeId>,
    ) -> NodeId {
        if ast.name_text(current) == Some("x") {
            ast.name(self.0)
        } else {
            current
        }
    }
}

#[test]
fn test_names_that_need_backticks() {
    for (name, expected) in [
        ("in", "val `in` = 1"),
        ("__", "val `__` = 1"),
        ("1st", "val `1st` = 1"),
        ("my name", "val `my name` = 1"),
        ("`is`", "val `is` = 1"),
        ("plain", "val plain = 1"),
    ] {
        let mut unit = construct("val x = 1");
        let root = rewrite(&mut unit.ast, unit.root, &mut RenameTo(name));
        let canonical = write(&unit.ast, root, None);
        assert_eq!(canonical, expected);
        assert_eq!(statement_kinds(&canonical), ["PropertyDeclaration"]);
    }
}

/// Replaces the literal text `!` inside strings
struct ReplaceLiteral(&'static str);

impl Rewriter for ReplaceLiteral {
    fn after_children(
        &mut self,
        ast: &mut Ast,
        _original: NodeId,
        current: NodeId,
        _parent: Option<NodeId>,
    ) -> NodeId {
        match &ast[current] {
            Node::LiteralStringEntry { text } if text == "!" => ast.alloc(Node::LiteralStringEntry {
                text: self.0.to_string(),
            }),
            _ => current,
        }
    }
}

#[test]
fn test_short_template_before_identifier_text_gets_braces() {
    let mut unit = construct("val s = \"$a!\"\n");
    let root = rewrite(&mut unit.ast, unit.root, &mut ReplaceLiteral("bc"));
    let preserved = write(&unit.ast, root, Some(&unit.trivia));
    assert!(preserved.contains("\"${a}bc\""), "got {preserved:?}");

    let reparsed = construct(&preserved);
    let templates: Vec<bool> = reparsed
        .ast
        .descendants(reparsed.root)
        .into_iter()
        .filter_map(|id| match reparsed.ast[id] {
            Node::TemplateStringEntry { short, .. } => Some(short),
            _ => None,
        })
        .collect();
    assert_eq!(templates, [false]);
}

#[test]
fn test_short_template_before_punctuation_stays_short() {
    let mut unit = construct("val s = \"$a!\"\n");
    let root = rewrite(&mut unit.ast, unit.root, &mut ReplaceLiteral("?"));
    let preserved = write(&unit.ast, root, Some(&unit.trivia));
    assert!(preserved.contains("\"$a?\""), "got {preserved:?}");
}

#[test]
fn test_statements_without_separator_get_newline() {
    let mut ast = Ast::new();
    let a = ast.name("a");
    let b = ast.name("b");
    let root = ast.alloc(Node::KotlinFile {
        package: None,
        imports: vec![],
        statements: vec![a, b],
    });
    let trivia = ktast_core::TriviaStore::new();
    assert_eq!(write(&ast, root, Some(&trivia)), "a\nb");
}

#[test]
fn test_inserted_list_element() {
    let mut unit = construct("f(a, b)\n");
    let list = unit
        .ast
        .descendants(unit.root)
        .into_iter()
        .find(|id| matches!(unit.ast[*id], Node::List { kind: ListKind::ValueArguments, .. }))
        .unwrap();
    let Node::List { elements, .. } = unit.ast[list].clone() else {
        unreachable!()
    };

    struct Append {
        list: NodeId,
        elements: Vec<NodeId>,
    }

    impl Rewriter for Append {
        fn before_children(&mut self, ast: &mut Ast, id: NodeId, _parent: Option<NodeId>) -> NodeId {
            if id != self.list {
                return id;
            }
            let value = ast.name("c");
            let argument = ast.alloc(Node::ValueArgument {
                name: None,
                spread: false,
                value,
            });
            let mut elements = self.elements.clone();
            elements.push(argument);
            ast.list(ListKind::ValueArguments, elements)
        }
    }

    let root = rewrite(&mut unit.ast, unit.root, &mut Append { list, elements });
    assert_eq!(write(&unit.ast, root, None), "f(a, b, c)");
    assert_eq!(write(&unit.ast, root, Some(&unit.trivia)), "f(a, b,c)");
}
