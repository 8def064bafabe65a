#![allow(dead_code)]

use phpscope_api::models::{ParsedDocument, Position};
use phpscope_php::fixture::Fixture;
use phpscope_runtime::{EngineConfig, Workspace};
use std::path::Path;

pub const A_URI: &str = "file:///src/A.php";
pub const B_URI: &str = "file:///src/B.php";

pub const A: &str = r#"<?php
class A {
    public function f(): int { return 1; }
}
"#;

pub const B: &str = r#"<?php
class B extends A {}
$b = new B();
$n = $b->f();
"#;

pub fn position_of(text: &str, needle: &str, nth: usize) -> Position {
    let offset = text
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .unwrap_or_else(|| panic!("{needle:?} #{nth} not in text"));
    let before = &text[..offset];
    let line = before.matches('\n').count() as u32;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Position::new(line, before[line_start..].chars().count() as u32)
}

pub fn doc_a() -> ParsedDocument {
    Fixture::document(A_URI, A, |f| {
        vec![f.class("A", None, &[], |f| {
            vec![f.method(&["public"], "f", &[], Some("int"), |f| {
                vec![f.return_(|f| f.int("1"))]
            })]
        })]
    })
}

pub fn doc_b() -> ParsedDocument {
    Fixture::document(B_URI, B, |f| {
        vec![
            f.class("B", Some("A"), &[], |_| Vec::new()),
            f.expr_stmt(|f| f.assign(|f| f.var("$b"), |f| f.new_("B", |_| Vec::new()))),
            f.expr_stmt(|f| {
                f.assign(
                    |f| f.var("$n"),
                    |f| f.method_call(|f| f.var("$b"), "f", |_| Vec::new()),
                )
            }),
        ]
    })
}

/// A document declaring one empty class.
pub fn class_doc(uri: &str, text: &'static str, name: &str) -> ParsedDocument {
    Fixture::document(uri, text, |f| vec![f.class(name, None, &[], |_| Vec::new())])
}

pub fn workspace_at(dir: &Path) -> Workspace {
    Workspace::new(EngineConfig::with_storage(dir))
}
