use super::position::Position;
use super::symbol::{Symbol, SymbolIdentifier, SymbolKind, SymbolModifiers};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

pub fn uri_hash(uri: &str) -> u64 {
    xxh3_64(uri.as_bytes())
}

/// Declared symbols of one file, rooted at a synthetic File symbol.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SymbolTable {
    pub uri: String,
    pub hash: u64,
    pub root: Arc<Symbol>,
}

/// Namespace and imports in effect at a position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportContext {
    pub namespace: String,
    pub imports: Vec<Arc<Symbol>>,
}

impl SymbolTable {
    pub fn new(uri: impl Into<String>, root: Symbol) -> Self {
        let uri = uri.into();
        Self {
            hash: uri_hash(&uri),
            uri,
            root: Arc::new(root),
        }
    }

    pub fn empty(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let root = Symbol::new(SymbolKind::File, uri.clone());
        Self::new(uri, root)
    }

    /// Pre-order walk. Returning `false` from the callback skips the subtree.
    pub fn traverse<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<Symbol>, &[&Arc<Symbol>]) -> bool,
    {
        let mut spine = Vec::new();
        traverse_node(&self.root, &mut spine, &mut f);
    }

    /// Every symbol below the root in pre-order.
    pub fn symbols(&self) -> Vec<Arc<Symbol>> {
        self.filter(|_| true)
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        let mut out = Vec::new();
        self.traverse(|s, spine| {
            if !spine.is_empty() && predicate(s) {
                out.push(s.clone());
            }
            true
        });
        out
    }

    pub fn find<P>(&self, predicate: P) -> Option<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        let mut found = None;
        self.traverse(|s, spine| {
            if found.is_some() {
                return false;
            }
            if !spine.is_empty() && predicate(s) {
                found = Some(s.clone());
                return false;
            }
            true
        });
        found
    }

    pub fn contains(&self, identifier: &SymbolIdentifier) -> bool {
        self.find(|s| s.kind == identifier.kind && s.name_equals(&identifier.name))
            .is_some()
    }

    pub fn parent_of(&self, symbol: &Symbol) -> Option<Arc<Symbol>> {
        let mut parent = None;
        self.traverse(|s, spine| {
            if parent.is_some() {
                return false;
            }
            if std::ptr::eq(s.as_ref(), symbol) {
                parent = spine.last().map(|p| (*p).clone());
                return false;
            }
            true
        });
        parent
    }

    /// Class-like symbol declaring `member`. Members carry only the simple
    /// name of their type, so this is how a member's fully-qualified owner is
    /// found. Copies with a rewritten type still match by kind, name and
    /// location.
    pub fn declaring_type(&self, member: &Symbol) -> Option<Arc<Symbol>> {
        self.find(|s| {
            s.is_class_like()
                && s.children.iter().any(|c| {
                    c.kind == member.kind
                        && c.name == member.name
                        && c.location == member.location
                })
        })
    }

    /// Innermost function, method, class-like or file symbol whose range
    /// contains `pos`. Falls back to the root.
    pub fn scope_at(&self, pos: Position) -> Arc<Symbol> {
        let mut scope = self.root.clone();
        self.traverse(|s, spine| {
            if spine.is_empty() {
                return true;
            }
            let Some(range) = s.range() else {
                return false;
            };
            if !range.contains(pos) {
                return false;
            }
            if is_scope_kind(s.kind) {
                scope = s.clone();
            }
            true
        });
        scope
    }

    /// Innermost symbol with a location containing `pos`.
    pub fn symbol_at(&self, pos: Position) -> Option<Arc<Symbol>> {
        let mut found = None;
        self.traverse(|s, spine| {
            if spine.is_empty() {
                return true;
            }
            match s.range() {
                Some(range) if range.contains(pos) => {
                    found = Some(s.clone());
                    true
                }
                _ => false,
            }
        });
        found
    }

    /// Namespace and imports visible at `pos`, rebuilt from Namespace markers
    /// and `Use` symbols that precede it.
    pub fn import_context_at(&self, pos: Position) -> ImportContext {
        let mut ctx = ImportContext::default();
        for child in &self.root.children {
            let Some(range) = child.range() else {
                continue;
            };
            if range.start > pos {
                break;
            }
            if child.kind == SymbolKind::Namespace {
                ctx.namespace = child.name.clone();
                ctx.imports.clear();
            } else if child.modifiers.contains(SymbolModifiers::USE) {
                ctx.imports.push(child.clone());
            }
        }
        ctx
    }
}

pub fn is_scope_kind(kind: SymbolKind) -> bool {
    matches!(
        kind,
        SymbolKind::Function | SymbolKind::Method | SymbolKind::Constructor
    ) || kind.is_class_like()
}

fn traverse_node<'a, F>(node: &'a Arc<Symbol>, spine: &mut Vec<&'a Arc<Symbol>>, f: &mut F)
where
    F: FnMut(&Arc<Symbol>, &[&Arc<Symbol>]) -> bool,
{
    if !f(node, spine) {
        return;
    }
    spine.push(node);
    for child in &node.children {
        traverse_node(child, spine, f);
    }
    spine.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::position::{Location, Range};

    fn at(kind: SymbolKind, name: &str, from: (u32, u32), to: (u32, u32)) -> Symbol {
        let mut s = Symbol::new(kind, name);
        s.location = Some(Location::new(
            "file:///t.php",
            Range::new(Position::new(from.0, from.1), Position::new(to.0, to.1)),
        ));
        s
    }

    fn table() -> SymbolTable {
        let mut method = at(SymbolKind::Method, "run", (2, 4), (4, 5));
        method.children = vec![Arc::new(at(SymbolKind::Parameter, "$x", (2, 20), (2, 22)))];
        let mut class = at(SymbolKind::Class, "App\\Job", (1, 0), (5, 1));
        class.children = vec![Arc::new(method)];
        let mut root = Symbol::new(SymbolKind::File, "file:///t.php");
        root.children = vec![
            Arc::new(at(SymbolKind::Namespace, "App", (0, 0), (0, 14))),
            Arc::new(class),
        ];
        SymbolTable::new("file:///t.php", root)
    }

    #[test]
    fn hash_is_stable_for_uri() {
        let t = table();
        assert_eq!(t.hash, uri_hash("file:///t.php"));
    }

    #[test]
    fn scope_at_picks_innermost_function() {
        let t = table();
        assert_eq!(t.scope_at(Position::new(3, 0)).name, "run");
        assert_eq!(t.scope_at(Position::new(1, 2)).name, "App\\Job");
        assert_eq!(t.scope_at(Position::new(9, 0)).kind, SymbolKind::File);
    }

    #[test]
    fn parent_of_walks_spine() {
        let t = table();
        let param = t.find(|s| s.name == "$x").unwrap();
        assert_eq!(t.parent_of(&param).unwrap().name, "run");
    }

    #[test]
    fn declaring_type_matches_copies_of_members() {
        let t = table();
        let method = t.find(|s| s.name == "run").unwrap();
        let mut copy = (*method).clone();
        copy.type_ = "App\\Job".to_string();
        assert_eq!(t.declaring_type(&copy).unwrap().name, "App\\Job");
        let param = t.find(|s| s.name == "$x").unwrap();
        assert!(t.declaring_type(&param).is_none());
    }

    #[test]
    fn symbols_are_preorder() {
        let names: Vec<_> = table().symbols().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["App", "App\\Job", "run", "$x"]);
    }
}
