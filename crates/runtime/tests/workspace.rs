mod common;

use common::{A, A_URI, B, B_URI, class_doc, doc_a, doc_b, position_of, workspace_at};
use phpscope_api::Cache;
use phpscope_api::cache::{STATE_KEY, references_key, symbols_key};
use phpscope_api::models::SymbolKind;
use phpscope_api::MemberMergeStrategy;
use phpscope_php::fixture::Fixture;
use phpscope_runtime::{EngineConfig, Workspace};
use std::time::Duration;

#[tokio::test]
async fn given_inherited_call_when_finding_references_then_declaration_and_call_site_are_found() {
    let ws = Workspace::new(EngineConfig::default());
    ws.open(doc_a());
    ws.open(doc_b());

    let call = position_of(B, "f()", 0);
    let hover = ws.symbols_at(B_URI, call, MemberMergeStrategy::Override).await;
    assert_eq!(hover.len(), 1);
    assert_eq!(hover[0].scope.as_deref(), Some("A"));
    assert_eq!(hover[0].type_, "int");

    let with_decl = ws.find_references(B_URI, call, true).await;
    let uris: Vec<_> = with_decl.iter().map(|r| r.location.uri.as_str()).collect();
    assert_eq!(uris, vec![A_URI, B_URI]);

    let without = ws.find_references(B_URI, call, false).await;
    assert_eq!(without.len(), 1);
    assert_eq!(without[0].location.uri, B_URI);
    assert_eq!(without[0].scope, "B");

    let members = ws.type_members("B", MemberMergeStrategy::Override);
    assert_eq!(
        members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        vec!["f"]
    );
}

const LOCALS: &str = r#"<?php
function g($x) {
    return $x;
}
function h() {
    $x = 1;
    return $x;
}
"#;

#[tokio::test]
async fn given_same_variable_name_in_two_functions_when_finding_references_then_only_one_scope_matches() {
    let uri = "file:///locals.php";
    let doc = Fixture::document(uri, LOCALS, |f| {
        vec![
            f.function("g", &["$x"], None, |f| vec![f.return_(|f| f.var("$x"))]),
            f.function("h", &[], None, |f| {
                vec![
                    f.expr_stmt(|f| f.assign(|f| f.var("$x"), |f| f.int("1"))),
                    f.return_(|f| f.var("$x")),
                ]
            }),
        ]
    });
    let ws = Workspace::new(EngineConfig::default());
    ws.open(doc);

    let in_g = position_of(LOCALS, "$x", 1);
    let refs = ws.find_references(uri, in_g, true).await;
    let lines: Vec<u32> = refs.iter().map(|r| r.range().start.line).collect();
    assert_eq!(lines, vec![1, 2]);

    let refs = ws.find_references(uri, in_g, false).await;
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].range().start, in_g);

    let in_h = position_of(LOCALS, "$x", 3);
    let lines: Vec<u32> = ws
        .find_references(uri, in_h, true)
        .await
        .iter()
        .map(|r| r.range().start.line)
        .collect();
    assert_eq!(lines, vec![5, 6]);
}

#[tokio::test]
async fn given_closed_file_when_restored_then_tables_match_what_was_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace_at(dir.path());
    ws.open(doc_a());
    ws.open(doc_b());

    let symbols_before = ws.symbols().get(B_URI).expect("symbols");
    let references_before = ws.references().get(B_URI).expect("references");

    ws.close(B_URI).await;
    assert!(!ws.is_open(B_URI));
    assert!(ws.references().get(B_URI).is_none());
    assert!(ws.references().summary(B_URI).is_some());
    assert!(ws.cache().read(&references_key(B_URI)).await.unwrap().is_some());
    assert!(ws.cache().read(&symbols_key(B_URI)).await.unwrap().is_some());

    // a closed file still answers cross-file queries
    let decl = position_of(A, "f()", 0);
    let refs = ws.find_references(A_URI, decl, false).await;
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].location.uri, B_URI);

    assert!(ws.restore(B_URI).await);
    assert!(ws.is_open(B_URI));
    assert_eq!(*ws.symbols().get(B_URI).unwrap(), *symbols_before);
    assert_eq!(*ws.references().get(B_URI).unwrap(), *references_before);
}

#[tokio::test]
async fn given_shutdown_workspace_when_restarted_then_index_is_warm() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ws = workspace_at(dir.path());
        assert_eq!(ws.startup().await, 0);
        ws.open(doc_a());
        ws.discover(doc_b()).await;
        assert!(!ws.is_open(B_URI));
        ws.shutdown().await;
    }

    let ws = workspace_at(dir.path());
    assert_eq!(ws.startup().await, 2);
    assert_eq!(ws.known_uris(), vec![A_URI.to_string(), B_URI.to_string()]);
    assert_eq!(ws.find_symbols("A").len(), 1);
    assert_eq!(
        ws.match_symbols("b")
            .iter()
            .filter(|s| s.kind == SymbolKind::Class)
            .count(),
        1
    );

    let refs = ws
        .find_references(A_URI, position_of(A, "f()", 0), true)
        .await;
    let uris: Vec<_> = refs.iter().map(|r| r.location.uri.as_str()).collect();
    assert_eq!(uris, vec![A_URI, B_URI]);
}

#[tokio::test]
async fn given_rapid_edits_when_quiet_period_passes_then_last_version_is_indexed() {
    let uri = "file:///edit.php";
    let config = EngineConfig {
        debounce_ms: 20,
        ..EngineConfig::default()
    };
    let ws = Workspace::new(config);
    ws.open(class_doc(uri, "<?php\nclass First {}\n", "First"));

    ws.edit(class_doc(uri, "<?php\nclass Second {}\n", "Second"));
    ws.edit(class_doc(uri, "<?php\nclass Third {}\n", "Third"));
    assert_eq!(ws.symbols().find("First", |_| true).len(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(ws.symbols().find("First", |_| true).is_empty());
    assert!(ws.symbols().find("Second", |_| true).is_empty());
    assert_eq!(ws.symbols().find("Third", |_| true).len(), 1);
}

#[tokio::test]
async fn given_pending_edit_when_queried_then_query_flushes_it_first() {
    let uri = "file:///flush.php";
    let config = EngineConfig {
        debounce_ms: 60_000,
        ..EngineConfig::default()
    };
    let ws = Workspace::new(config);
    ws.open(class_doc(uri, "<?php\nclass Before {}\n", "Before"));
    ws.edit(class_doc(uri, "<?php\nclass After {}\n", "After"));

    let names: Vec<_> = ws
        .document_symbols(uri)
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(names, vec!["After"]);
    assert!(!ws.flush(uri));
}

#[tokio::test]
async fn given_forgotten_file_when_queried_then_nothing_remains() {
    let dir = tempfile::tempdir().unwrap();
    let ws = workspace_at(dir.path());
    ws.open(doc_a());
    ws.close(A_URI).await;
    ws.forget(A_URI).await;

    assert!(ws.find_symbols("A").is_empty());
    assert!(ws.references().summary(A_URI).is_none());
    assert!(ws.cache().read(&symbols_key(A_URI)).await.unwrap().is_none());
    assert!(ws.cache().read(&references_key(A_URI)).await.unwrap().is_none());
    assert!(!ws.restore(A_URI).await);
}

#[tokio::test]
async fn given_corrupt_state_or_clear_flag_when_starting_then_start_is_cold() {
    let dir = tempfile::tempdir().unwrap();
    {
        let ws = workspace_at(dir.path());
        ws.open(doc_a());
        ws.shutdown().await;
    }

    let cleared = Workspace::new(EngineConfig {
        clear_cache: true,
        ..EngineConfig::with_storage(dir.path())
    });
    assert_eq!(cleared.startup().await, 0);
    assert!(cleared.cache().read(STATE_KEY).await.unwrap().is_none());

    let ws = workspace_at(dir.path());
    ws.cache()
        .write(STATE_KEY, b"definitely not msgpack".to_vec())
        .await
        .unwrap();
    assert_eq!(ws.startup().await, 0);
    assert!(ws.known_uris().is_empty());
}

const REPO: &str = r#"<?php
namespace App;
class Repo {
    public function __construct() {}
    public function save(): bool { return true; }
}
"#;

const CLIENT: &str = r#"<?php
use App\Repo;
$r = new Repo();
$r->save();
"#;

#[tokio::test]
async fn given_namespaced_class_when_finding_member_references_then_owner_is_resolved_from_simple_scope() {
    let repo_uri = "file:///src/Repo.php";
    let client_uri = "file:///src/Client.php";
    let repo = Fixture::document(repo_uri, REPO, |f| {
        vec![
            f.namespace("App"),
            f.class("Repo", None, &[], |f| {
                vec![
                    f.method(&["public"], "__construct", &[], None, |_| Vec::new()),
                    f.method(&["public"], "save", &[], Some("bool"), |f| {
                        vec![f.return_(|f| f.constant("true"))]
                    }),
                ]
            }),
        ]
    });
    let client = Fixture::document(client_uri, CLIENT, |f| {
        vec![
            f.use_(&["App\\Repo"]),
            f.expr_stmt(|f| f.assign(|f| f.var("$r"), |f| f.new_("Repo", |_| Vec::new()))),
            f.expr_stmt(|f| f.method_call(|f| f.var("$r"), "save", |_| Vec::new())),
        ]
    });
    let ws = Workspace::new(EngineConfig::default());
    ws.open(repo);
    ws.open(client);

    let members = ws.type_members("App\\Repo", MemberMergeStrategy::Override);
    let shape: Vec<_> = members
        .iter()
        .map(|m| (m.kind, m.name.as_str(), m.scope.as_deref()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (SymbolKind::Constructor, "__construct", Some("Repo")),
            (SymbolKind::Method, "save", Some("Repo")),
        ]
    );

    let declaration = position_of(REPO, "save", 0);
    let refs = ws.find_references(repo_uri, declaration, true).await;
    let found: Vec<_> = refs
        .iter()
        .map(|r| (r.location.uri.as_str(), r.scope.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![(client_uri, "App\\Repo"), (repo_uri, "App\\Repo")]
    );
}
