use super::position::{Location, Position, Range};
use super::symbol::SymbolKind;
use super::symbol_table::uri_hash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A use site of a name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reference {
    pub kind: SymbolKind,
    pub name: String,
    /// Type expression of the owning type for member references; may be a union.
    pub scope: String,
    /// Alternate spelling that resolves to the same symbol, such as the global
    /// fallback of an unqualified function name.
    pub alt_name: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub location: Location,
}

impl Reference {
    pub fn new(kind: SymbolKind, name: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            name: name.into(),
            scope: String::new(),
            alt_name: None,
            type_: String::new(),
            location,
        }
    }

    pub fn range(&self) -> Range {
        self.location.range
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, SymbolKind::Variable | SymbolKind::Parameter)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ScopeChild {
    Scope(Scope),
    Reference(Reference),
}

/// One lexical scope: the file, a braced namespace block, a class body, or a
/// function, method or closure body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scope {
    pub location: Location,
    pub children: Vec<ScopeChild>,
}

impl Scope {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            children: Vec::new(),
        }
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.children.iter().filter_map(|c| match c {
            ScopeChild::Scope(s) => Some(s),
            ScopeChild::Reference(_) => None,
        })
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.children.iter().filter_map(|c| match c {
            ScopeChild::Reference(r) => Some(r),
            ScopeChild::Scope(_) => None,
        })
    }

    /// Every reference in this scope and its descendants, in document order.
    pub fn collect<'a, P>(&'a self, predicate: &P, out: &mut Vec<&'a Reference>)
    where
        P: Fn(&Reference) -> bool,
    {
        for child in &self.children {
            match child {
                ScopeChild::Reference(r) => {
                    if predicate(r) {
                        out.push(r);
                    }
                }
                ScopeChild::Scope(s) => s.collect(predicate, out),
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    pub uri: String,
    pub hash: u64,
    pub root: Scope,
}

/// Identifier keys of a table that survive eviction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTableSummary {
    pub uri: String,
    pub hash: u64,
    pub identifiers: Vec<String>,
}

impl ReferenceTable {
    pub fn new(uri: impl Into<String>, root: Scope) -> Self {
        let uri = uri.into();
        Self {
            hash: uri_hash(&uri),
            uri,
            root,
        }
    }

    pub fn references<P>(&self, predicate: P) -> Vec<&Reference>
    where
        P: Fn(&Reference) -> bool,
    {
        let mut out = Vec::new();
        self.root.collect(&predicate, &mut out);
        out
    }

    /// Innermost scope containing `pos`.
    pub fn scope_at(&self, pos: Position) -> &Scope {
        let mut scope = &self.root;
        while let Some(inner) = scope.scopes().find(|s| s.location.range.contains(pos)) {
            scope = inner;
        }
        scope
    }

    /// Reference at `pos`, preferring the innermost scope.
    pub fn reference_at(&self, pos: Position) -> Option<&Reference> {
        reference_in(&self.root, pos)
    }

    /// Scope whose range matches `range` exactly, such as the body of a
    /// function symbol.
    pub fn scope_with_range(&self, range: Range) -> Option<&Scope> {
        fn search(scope: &Scope, range: Range) -> Option<&Scope> {
            if scope.location.range == range {
                return Some(scope);
            }
            scope
                .scopes()
                .filter(|s| s.location.range.contains_range(&range))
                .find_map(|s| search(s, range))
        }
        search(&self.root, range)
    }

    pub fn summary(&self) -> ReferenceTableSummary {
        let mut seen = HashSet::new();
        let mut identifiers = Vec::new();
        for r in self.references(|r| !r.is_variable()) {
            for name in std::iter::once(&r.name).chain(r.alt_name.iter()) {
                let key = name.to_lowercase();
                if !key.is_empty() && seen.insert(key.clone()) {
                    identifiers.push(key);
                }
            }
        }
        ReferenceTableSummary {
            uri: self.uri.clone(),
            hash: self.hash,
            identifiers,
        }
    }
}

fn reference_in(scope: &Scope, pos: Position) -> Option<&Reference> {
    for inner in scope.scopes() {
        if inner.location.range.contains(pos) {
            if let Some(r) = reference_in(inner, pos) {
                return Some(r);
            }
        }
    }
    scope.references().find(|r| r.location.range.contains(pos))
}
