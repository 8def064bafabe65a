mod common;

use common::{index, position_of, symbol, table_of};
use phpscope_api::models::{SymbolIdentifier, SymbolKind, SymbolModifiers};
use phpscope_api::{MemberMergeStrategy, SymbolSource};
use phpscope_core::SymbolStore;
use phpscope_php::fixture::Fixture;

const A: &str = r#"<?php
class A {
    public function f(): int { return 1; }
}
"#;

const B: &str = r#"<?php
class B extends A {}
$b = new B();
$b->f();
"#;

#[test]
fn given_subclass_without_method_when_call_resolved_then_base_declaration_is_found() {
    let a = Fixture::document("file:///a.php", A, |f| {
        vec![f.class("A", None, &[], |f| {
            vec![f.method(&["public"], "f", &[], Some("int"), |f| {
                vec![f.return_(|f| f.int("1"))]
            })]
        })]
    });
    let b = Fixture::document("file:///b.php", B, |f| {
        vec![
            f.class("B", Some("A"), &[], |_| Vec::new()),
            f.expr_stmt(|f| f.assign(|f| f.var("$b"), |f| f.new_("B", |_| Vec::new()))),
            f.expr_stmt(|f| f.method_call(|f| f.var("$b"), "f", |_| Vec::new())),
        ]
    });
    let store = SymbolStore::new();
    let refs = index(&store, &[a, b]);

    let call = refs[1]
        .reference_at(position_of(B, "f()", 0))
        .expect("method reference");
    assert_eq!(call.scope, "B");
    assert_eq!(call.type_, "int");

    let found = store.find_symbols_by_reference(call, MemberMergeStrategy::Override);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "f");
    assert_eq!(found[0].scope.as_deref(), Some("A"));
    assert_eq!(found[0].type_, "int");
    assert_eq!(
        found[0].location.as_ref().map(|l| l.uri.as_str()),
        Some("file:///a.php")
    );
}

#[test]
fn given_camel_and_snake_names_when_prefix_is_inner_word_then_only_boundary_keys_match() {
    let store = SymbolStore::new();
    store.add(table_of(
        "file:///names.php",
        vec![
            symbol(SymbolKind::Function, "getUserId", "file:///names.php", 1),
            symbol(SymbolKind::Function, "get_user_id", "file:///names.php", 2),
        ],
    ));

    let names = |prefix: &str| {
        let mut names: Vec<String> = store
            .match_prefix(prefix, |_| true)
            .iter()
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names
    };
    assert_eq!(names("userid"), vec!["getUserId"]);
    assert_eq!(names("user"), vec!["getUserId", "get_user_id"]);
    assert_eq!(names("get"), vec!["getUserId", "get_user_id"]);
    assert_eq!(names("id"), vec!["getUserId", "get_user_id"]);
    assert!(store.find("userid", |_| true).is_empty());
    assert_eq!(store.find("GETUSERID", |_| true).len(), 1);
}

#[test]
fn given_two_files_when_one_is_removed_then_only_its_entries_disappear() {
    let store = SymbolStore::new();
    store.add(table_of(
        "file:///one.php",
        vec![symbol(SymbolKind::Class, "Shared\\One", "file:///one.php", 1)],
    ));
    store.add(table_of(
        "file:///two.php",
        vec![symbol(SymbolKind::Class, "Shared\\Two", "file:///two.php", 1)],
    ));
    assert_eq!(store.match_prefix("shared", |_| true).len(), 2);

    let removed = store.remove("file:///one.php").expect("table was held");
    assert_eq!(removed.uri, "file:///one.php");

    assert!(store.find("Shared\\One", |_| true).is_empty());
    assert!(store.match_prefix("one", |_| true).is_empty());
    let two = store.match_prefix("two", |_| true);
    assert_eq!(two.len(), 1);
    assert_eq!(store.table_count(), 1);
    assert!(store.remove("file:///one.php").is_none());
}

#[test]
fn given_same_uri_added_twice_when_indexed_then_replacement_wins() {
    let store = SymbolStore::new();
    store.add(table_of(
        "file:///r.php",
        vec![symbol(SymbolKind::Function, "before", "file:///r.php", 1)],
    ));
    store.add(table_of(
        "file:///r.php",
        vec![symbol(SymbolKind::Function, "after", "file:///r.php", 1)],
    ));
    assert_eq!(store.table_count(), 1);
    assert!(store.find("before", |_| true).is_empty());
    assert_eq!(store.find("after", |_| true).len(), 1);
}

#[test]
fn given_private_base_member_when_members_merged_then_it_never_shadows() {
    let uri = "file:///p.php";
    let mut secret = symbol(SymbolKind::Method, "f", uri, 2);
    secret.modifiers = SymbolModifiers::PRIVATE;
    secret.type_ = "int".into();
    secret.scope = Some("A".into());
    let mut a = symbol(SymbolKind::Class, "A", uri, 1);
    a.children = vec![secret.into()];

    let mut public = symbol(SymbolKind::Method, "f", uri, 5);
    public.modifiers = SymbolModifiers::PUBLIC;
    public.type_ = "string".into();
    public.scope = Some("B".into());
    let mut b = symbol(SymbolKind::Class, "B", uri, 4);
    b.associated = vec![SymbolIdentifier::new(SymbolKind::Class, "A")];
    b.children = vec![public.into()];

    let mut c = symbol(SymbolKind::Class, "C", uri, 7);
    c.associated = vec![SymbolIdentifier::new(SymbolKind::Class, "A")];

    let store = SymbolStore::new();
    store.add(table_of(uri, vec![a, b, c]));

    for strategy in [
        MemberMergeStrategy::None,
        MemberMergeStrategy::Override,
        MemberMergeStrategy::Base,
    ] {
        let members = store.type_members("B", strategy);
        assert_eq!(members.len(), 1, "{strategy:?}");
        assert_eq!(members[0].type_, "string");
    }
    assert!(store.type_members("C", MemberMergeStrategy::Override).is_empty());
    assert_eq!(store.type_members("A", MemberMergeStrategy::Override).len(), 1);
    let associated: Vec<_> = store.associated("b").iter().map(|s| s.name.clone()).collect();
    assert_eq!(associated, vec!["A"]);
}

#[test]
fn given_unqualified_call_in_namespace_when_resolved_then_global_function_is_fallback() {
    let g = Fixture::document("file:///g.php", "<?php\nfunction helper() {}\n", |f| {
        vec![f.function("helper", &[], None, |_| Vec::new())]
    });
    let src = "<?php\nnamespace App;\nhelper();\n";
    let ns = Fixture::document("file:///ns.php", src, |f| {
        vec![
            f.namespace("App"),
            f.expr_stmt(|f| f.call("helper", |_| Vec::new())),
        ]
    });
    let store = SymbolStore::new();
    let refs = index(&store, &[g, ns]);

    let call = refs[1]
        .reference_at(position_of(src, "helper", 0))
        .expect("call reference");
    assert_eq!(call.name, "App\\helper");
    let found = store.find_symbols_by_reference(call, MemberMergeStrategy::None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "helper");
}

const LOCAL: &str = r#"<?php
function g() {
    $x = 1;
    return $x;
}
"#;

#[test]
fn given_local_variable_use_when_resolved_then_scope_lookup_finds_declaration() {
    let doc = Fixture::document("file:///local.php", LOCAL, |f| {
        vec![f.function("g", &[], None, |f| {
            vec![
                f.expr_stmt(|f| f.assign(|f| f.var("$x"), |f| f.int("1"))),
                f.return_(|f| f.var("$x")),
            ]
        })]
    });
    let store = SymbolStore::new();
    let refs = index(&store, &[doc]);

    let used = refs[0]
        .reference_at(position_of(LOCAL, "$x", 1))
        .expect("variable reference");
    let found = store.find_symbols_by_reference(used, MemberMergeStrategy::None);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, SymbolKind::Variable);
    assert_eq!(found[0].name, "$x");
    // locals are not globally searchable
    assert!(store.find("$x", |_| true).is_empty());
}
