mod common;

use common::child;
use phpscope_api::models::{ParsedDocument, SymbolIdentifier, SymbolKind, SymbolModifiers};
use phpscope_php::fixture::Fixture;
use phpscope_php::read_symbols;
use phpscope_php::reader::symbols::CLOSURE_NAME;

const WIDGET: &str = r#"<?php
namespace Foo;
use Bar\Baz;
/** A widget. */
class Widget extends Baz implements \Countable {
    private ?int $count = 0;
    const LIMIT = 10;
    public function count(): int { return 1; }
}
"#;

fn widget_doc() -> ParsedDocument {
    Fixture::document("file:///widget.php", WIDGET, |f| {
        vec![
            f.namespace("Foo"),
            f.use_(&["Bar\\Baz"]),
            f.doc("/** A widget. */"),
            f.class("Widget", Some("Baz"), &["\\Countable"], |f| {
                vec![
                    f.property(&["private"], Some("?int"), "$count", Some("0")),
                    f.class_const(&[], "LIMIT", "10"),
                    f.method(&["public"], "count", &[], Some("int"), |f| {
                        vec![f.return_(|f| f.int("1"))]
                    }),
                ]
            }),
        ]
    })
}

#[test]
fn given_namespaced_class_when_read_then_members_carry_resolved_names_and_types() {
    let doc = widget_doc();
    let table = read_symbols(&doc);
    let root = &table.root;

    assert!(
        root.children
            .iter()
            .any(|c| c.kind == SymbolKind::Namespace && c.name == "Foo")
    );
    let import = child(root, SymbolKind::Class, "Baz");
    assert!(import.has(SymbolModifiers::USE));
    assert_eq!(import.associated[0].name, "Bar\\Baz");

    let widget = child(root, SymbolKind::Class, "Foo\\Widget");
    assert_eq!(
        widget.associated,
        vec![
            SymbolIdentifier::new(SymbolKind::Class, "Bar\\Baz"),
            SymbolIdentifier::new(SymbolKind::Interface, "Countable"),
        ]
    );
    assert_eq!(
        widget.doc.as_ref().map(|d| d.description.as_str()),
        Some("A widget.")
    );

    let count = child(widget, SymbolKind::Property, "$count");
    assert!(count.is_private());
    assert_eq!(count.type_, "int|null");
    assert_eq!(count.scope.as_deref(), Some("Widget"));
    assert_eq!(count.value.as_deref(), Some("0"));

    let limit = child(widget, SymbolKind::ClassConstant, "LIMIT");
    assert!(limit.modifiers.contains(SymbolModifiers::STATIC | SymbolModifiers::PUBLIC));
    assert_eq!(limit.type_, "int");

    let method = child(widget, SymbolKind::Method, "count");
    assert!(method.has(SymbolModifiers::PUBLIC));
    assert_eq!(method.type_, "int");
    assert_eq!(method.scope.as_deref(), Some("Widget"));
    assert_eq!(limit.scope.as_deref(), Some("Widget"));
    assert_eq!(
        table.declaring_type(method).map(|c| c.name.clone()).as_deref(),
        Some("Foo\\Widget")
    );
}

#[test]
fn given_tree_handed_over_as_json_when_read_then_symbols_are_unchanged() {
    let doc = widget_doc();
    let json = serde_json::to_string(&doc.tree).unwrap();
    let decoded = ParsedDocument::from_json(doc.uri.clone(), WIDGET, &json).unwrap();
    assert_eq!(read_symbols(&decoded), read_symbols(&doc));
}

const FIRST: &str = r#"<?php
/**
 * @param Foo[] $items
 * @return Foo|null
 */
function first(array $items, int ...$rest) {
    $x = 1;
    $x = 2;
}
"#;

#[test]
fn given_doc_comment_when_declared_types_are_loose_then_doc_types_win() {
    let doc = Fixture::document("file:///first.php", FIRST, |f| {
        vec![
            f.doc("/**\n * @param Foo[] $items\n * @return Foo|null\n */"),
            f.function("first", &["array $items", "int ...$rest"], None, |f| {
                vec![
                    f.expr_stmt(|f| f.assign(|f| f.var("$x"), |f| f.int("1"))),
                    f.expr_stmt(|f| f.assign(|f| f.var("$x"), |f| f.int("2"))),
                ]
            }),
        ]
    });
    let table = read_symbols(&doc);
    let first = child(&table.root, SymbolKind::Function, "first");

    assert_eq!(first.type_, "Foo|null");
    assert_eq!(child(first, SymbolKind::Parameter, "$items").type_, "Foo[]");
    let rest = child(first, SymbolKind::Parameter, "$rest");
    assert!(rest.has(SymbolModifiers::VARIADIC));
    assert_eq!(rest.type_, "int[]");
    assert_eq!(
        first
            .children
            .iter()
            .filter(|c| c.kind == SymbolKind::Variable)
            .count(),
        1
    );
    assert_eq!(first.signature_string(), "(Foo[] $items, int[] ...$rest): Foo|null");
}

const CLOSURE: &str = r#"<?php
$total = 0;
$fn = function ($a) use (&$total) { $b = $a; };
"#;

#[test]
fn given_closure_when_read_then_it_is_an_anonymous_function_owning_its_use_variables() {
    let doc = Fixture::document("file:///closure.php", CLOSURE, |f| {
        vec![
            f.expr_stmt(|f| f.assign(|f| f.var("$total"), |f| f.int("0"))),
            f.expr_stmt(|f| {
                f.assign(
                    |f| f.var("$fn"),
                    |f| {
                        f.closure(false, &["$a"], &["&$total"], |f| {
                            vec![f.expr_stmt(|f| f.assign(|f| f.var("$b"), |f| f.var("$a")))]
                        })
                    },
                )
            }),
        ]
    });
    let table = read_symbols(&doc);
    let root = &table.root;

    child(root, SymbolKind::Variable, "$total");
    child(root, SymbolKind::Variable, "$fn");
    let closure = child(root, SymbolKind::Function, CLOSURE_NAME);
    assert!(closure.has(SymbolModifiers::ANONYMOUS));

    let names: Vec<&str> = closure.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["$a", "$total", "$b"]);
    let used = child(closure, SymbolKind::Variable, "$total");
    assert!(used.modifiers.contains(SymbolModifiers::USE | SymbolModifiers::REFERENCE));
}

const MAGIC: &str = r#"<?php
/**
 * @property-read string $name
 * @method static Widget make()
 */
class Widget {}
"#;

#[test]
fn given_class_doc_tags_when_read_then_magic_members_are_added() {
    let doc = Fixture::document("file:///magic.php", MAGIC, |f| {
        vec![
            f.doc("/**\n * @property-read string $name\n * @method static Widget make()\n */"),
            f.class("Widget", None, &[], |_| Vec::new()),
        ]
    });
    let table = read_symbols(&doc);
    let widget = child(&table.root, SymbolKind::Class, "Widget");

    let name = child(widget, SymbolKind::Property, "$name");
    assert!(name.modifiers.contains(SymbolModifiers::MAGIC | SymbolModifiers::READ_ONLY));
    assert_eq!(name.type_, "string");

    let make = child(widget, SymbolKind::Method, "make");
    assert!(make.modifiers.contains(SymbolModifiers::MAGIC | SymbolModifiers::STATIC));
    assert_eq!(make.type_, "Widget");
}

#[test]
fn given_define_call_with_literal_name_when_read_then_constant_is_declared() {
    let src = "<?php\ndefine('DEBUG', true);\n";
    let doc = Fixture::document("file:///define.php", src, |f| {
        vec![f.expr_stmt(|f| {
            f.call("define", |f| vec![f.string("'DEBUG'"), f.constant("true")])
        })]
    });
    let table = read_symbols(&doc);
    let debug = child(&table.root, SymbolKind::Constant, "DEBUG");
    assert_eq!(debug.type_, "bool");
    assert_eq!(debug.value.as_deref(), Some("true"));
}

const GROUPED: &str = r#"<?php
namespace A {
    use B\{C, D as E};
    class F extends E {}
}
"#;

#[test]
fn given_group_use_when_class_extends_alias_then_base_resolves_through_import() {
    let doc = Fixture::document("file:///grouped.php", GROUPED, |f| {
        vec![f.namespace_block("A", |f| {
            vec![
                f.use_group("B", &["C", "D as E"]),
                f.class("F", Some("E"), &[], |_| Vec::new()),
            ]
        })]
    });
    let table = read_symbols(&doc);
    let root = &table.root;

    assert_eq!(child(root, SymbolKind::Class, "C").associated[0].name, "B\\C");
    assert_eq!(child(root, SymbolKind::Class, "E").associated[0].name, "B\\D");
    let class = child(root, SymbolKind::Class, "A\\F");
    assert_eq!(class.associated[0].name, "B\\D");
}
