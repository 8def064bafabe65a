#![allow(dead_code)]

use phpscope_api::models::{
    Location, ParsedDocument, Position, Range, Reference, ReferenceTable, Scope, ScopeChild,
    Symbol, SymbolKind, SymbolTable,
};
use phpscope_core::SymbolStore;
use std::sync::Arc;

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

/// Adds every document's symbols to `store`, then reads references against it.
pub fn index(store: &SymbolStore, docs: &[ParsedDocument]) -> Vec<ReferenceTable> {
    for doc in docs {
        store.add(phpscope_php::read_symbols(doc));
    }
    docs.iter()
        .map(|doc| {
            let table = store.get(&doc.uri).expect("symbols indexed");
            phpscope_php::read_references(doc, &table, store)
        })
        .collect()
}

pub fn location(uri: &str, line: u32, from: u32, to: u32) -> Location {
    Location::new(
        uri,
        Range::new(Position::new(line, from), Position::new(line, to)),
    )
}

pub fn symbol(kind: SymbolKind, name: &str, uri: &str, line: u32) -> Symbol {
    let mut s = Symbol::new(kind, name);
    s.location = Some(location(uri, line, 0, 40));
    s
}

pub fn table_of(uri: &str, symbols: Vec<Symbol>) -> SymbolTable {
    let mut root = Symbol::new(SymbolKind::File, uri);
    root.children = symbols.into_iter().map(Arc::new).collect();
    SymbolTable::new(uri, root)
}

/// One flat scope of references, one reference per line.
pub fn references_of(uri: &str, refs: &[(SymbolKind, &str)]) -> ReferenceTable {
    let mut root = Scope::new(location(uri, 0, 0, 0));
    root.location.range.end = Position::new(refs.len() as u32 + 1, 0);
    root.children = refs
        .iter()
        .enumerate()
        .map(|(line, (kind, name))| {
            ScopeChild::Reference(Reference::new(
                *kind,
                *name,
                location(uri, line as u32, 0, name.len() as u32),
            ))
        })
        .collect();
    ReferenceTable::new(uri, root)
}
