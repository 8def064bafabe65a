#![allow(dead_code)]

use phpscope_api::models::{
    ParsedDocument, Position, Reference, ReferenceTable, SourceText, Symbol, SymbolKind,
    SymbolTable,
};
use phpscope_core::SymbolStore;
use phpscope_php::{read_references, read_symbols};
use std::sync::Arc;

/// Position of the `nth` occurrence of `needle` in `text`.
pub fn position_of(text: &str, needle: &str, nth: usize) -> Position {
    let offset = text
        .match_indices(needle)
        .nth(nth)
        .map(|(i, _)| i)
        .expect("needle occurs in source");
    SourceText::new(text).position_at(offset)
}

/// Indexes every document's symbols in a [`SymbolStore`], then reads each
/// document's references against it.
pub fn read_all(docs: &[ParsedDocument]) -> (Vec<Arc<SymbolTable>>, Vec<ReferenceTable>) {
    let store = SymbolStore::new();
    let tables: Vec<Arc<SymbolTable>> = docs.iter().map(|d| store.add(read_symbols(d))).collect();
    let references = docs
        .iter()
        .zip(&tables)
        .map(|(doc, table)| read_references(doc, table, &store))
        .collect();
    (tables, references)
}

pub fn child<'a>(symbol: &'a Symbol, kind: SymbolKind, name: &str) -> &'a Arc<Symbol> {
    symbol
        .children
        .iter()
        .find(|c| c.kind == kind && c.name == name)
        .unwrap_or_else(|| panic!("{} {} under {}", kind.as_str(), name, symbol.name))
}

pub fn refs<'a>(table: &'a ReferenceTable, kind: SymbolKind, name: &str) -> Vec<&'a Reference> {
    table.references(|r| r.kind == kind && r.name == name)
}
