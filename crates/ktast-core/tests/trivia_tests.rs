//! Trivia attachment on constructed units and explicit trivia moves

use ktast_core::{
    ConstructOptions, Constructed, Node, NodeId, Trivia, TriviaKind, TriviaStore, dump, write,
};

fn construct(source: &str) -> Constructed {
    Constructed::from_source(source, &ConstructOptions::default())
        .unwrap_or_else(|err| panic!("failed to construct {source:?}: {err}"))
}

fn first_statement(unit: &Constructed) -> NodeId {
    match &unit.ast[unit.root] {
        Node::KotlinFile { statements, .. } => statements[0],
        other => panic!("expected a file, got {other:?}"),
    }
}

#[test]
fn test_comment_after_initializer() {
    let source = "val x = \"\" // x is empty";
    let unit = construct(source);
    assert_eq!(unit.write(), source);

    let Node::PropertyDeclaration {
        initializer: Some(initializer),
        ..
    } = unit.ast[first_statement(&unit)]
    else {
        panic!("expected a property with an initializer");
    };
    assert!(matches!(unit.ast[initializer], Node::StringLiteral { .. }));
    assert_eq!(
        unit.trivia.after(initializer),
        &[Trivia::whitespace(" "), Trivia::line_comment("// x is empty")]
    );
}

#[test]
fn test_dump_shows_attachment() {
    let unit = construct("f( /* none */ )\n");
    insta::assert_snapshot!(dump(&unit.ast, unit.root, Some(&unit.trivia)), @r#"
    KotlinFile
      Call
        @after ["\n"]
        NameExpression "f"
        List(ValueArguments)
          @within [" ", "/* none */", " "]
    "#);
}

#[test]
fn test_move_onto_replacement_keeps_formatting() {
    let mut unit = construct("// the answer\nval x = 42 // exact\n");
    let statement = first_statement(&unit);

    // Substitute the literal with a fresh node carrying the old trivia
    let Node::PropertyDeclaration {
        initializer: Some(old),
        ..
    } = unit.ast[statement].clone()
    else {
        panic!("expected a property with an initializer");
    };
    let new = unit.ast.alloc(Node::ConstantLiteral {
        kind: ktast_core::ConstantKind::Integer,
        text: "43".to_string(),
    });
    let node = match unit.ast[statement].clone() {
        Node::PropertyDeclaration {
            modifiers,
            val_or_var,
            variable,
            ..
        } => Node::PropertyDeclaration {
            modifiers,
            val_or_var,
            variable,
            initializer: Some(new),
        },
        _ => unreachable!(),
    };
    let property = unit.ast.alloc(node);
    unit.trivia.move_trivia(old, new);
    unit.trivia.move_trivia(statement, property);

    let file = unit.ast.alloc(Node::KotlinFile {
        package: None,
        imports: vec![],
        statements: vec![property],
    });
    unit.trivia.move_trivia(unit.root, file);

    assert_eq!(
        write(&unit.ast, file, Some(&unit.trivia)),
        "// the answer\nval x = 43 // exact\n"
    );
    assert!(unit.trivia.after(old).is_empty());
}

#[test]
fn test_move_laws_on_constructed_store() {
    let unit = construct("val a = 1 // one\nval b = 2\n");
    let statement = first_statement(&unit);
    let ids = unit.ast.descendants(statement);
    let a = ids[ids.len() - 1];
    let b = match &unit.ast[unit.root] {
        Node::KotlinFile { statements, .. } => statements[1],
        other => panic!("expected a file, got {other:?}"),
    };
    assert!(!unit.trivia.after(a).is_empty());
    assert!(!unit.trivia.before(b).is_empty());

    let mut store = unit.trivia.clone();
    store.move_trivia(a, a);
    assert_eq!(store, unit.trivia);

    // A fresh id owns nothing, so moving there and back restores the store
    let mut fresh = unit.ast.clone();
    let empty = fresh.name("unused");
    store.move_trivia(a, empty);
    assert!(store.after(a).is_empty());
    store.move_trivia(empty, a);
    assert_eq!(store, unit.trivia);

    // Moving onto a node that owns trivia replaces it
    let mut store = unit.trivia.clone();
    store.move_trivia(a, b);
    assert_eq!(store.after(b), unit.trivia.after(a));
    assert!(store.before(b).is_empty());
}

#[test]
fn test_terminators_and_trailing_commas_are_trivia() {
    let unit = construct("f(a, b, );\n");
    let kinds: Vec<TriviaKind> = unit.trivia.fragments().map(|trivia| trivia.kind).collect();
    assert_eq!(
        kinds.iter().filter(|kind| **kind == TriviaKind::Terminator).count(),
        1
    );
    assert_eq!(
        kinds
            .iter()
            .filter(|kind| **kind == TriviaKind::TrailingComma)
            .count(),
        1
    );
    assert_eq!(unit.write(), "f(a, b, );\n");
}

#[test]
fn test_removed_trivia_is_not_written() {
    let mut unit = construct("a /* gone */\n");
    let statement = first_statement(&unit);
    unit.trivia.remove(statement);
    assert_eq!(unit.write(), "a");

    let empty = TriviaStore::new();
    assert_eq!(write(&unit.ast, unit.root, Some(&empty)), "a");
}
