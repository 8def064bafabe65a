use crate::name_index::{Indexable, NameIndex};
use crate::type_aggregate::{ClassLookup, TypeAggregate};
use phpscope_api::models::{
    Reference, Symbol, SymbolKind, SymbolModifiers, SymbolTable, symbol_keys, uri_hash,
};
use phpscope_api::{MemberMergeStrategy, SymbolSource, type_string};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// An indexed symbol and the hash of the file that declared it.
#[derive(Debug, Clone)]
pub struct IndexedSymbol {
    pub hash: u64,
    pub symbol: Arc<Symbol>,
}

impl Indexable for IndexedSymbol {
    fn index_keys(&self) -> Vec<String> {
        symbol_keys(self.symbol.kind, &self.symbol.name)
    }
}

/// Symbols that are reachable by name from outside their file.
pub fn is_indexable(symbol: &Symbol) -> bool {
    if symbol.name.is_empty() {
        return false;
    }
    if symbol.has(SymbolModifiers::USE | SymbolModifiers::ANONYMOUS) {
        return false;
    }
    match symbol.kind {
        SymbolKind::File | SymbolKind::Parameter => false,
        SymbolKind::Variable => symbol.location.is_none(),
        _ => true,
    }
}

/// Result set that keeps one entry per symbol however many keys led to it.
#[derive(Debug, Default)]
pub struct UniqueSymbolCollection {
    symbols: Vec<Arc<Symbol>>,
    seen: HashSet<usize>,
}

impl UniqueSymbolCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, symbol: Arc<Symbol>) -> bool {
        if self.seen.insert(Arc::as_ptr(&symbol) as usize) {
            self.symbols.push(symbol);
            true
        } else {
            false
        }
    }

    pub fn extend(&mut self, symbols: impl IntoIterator<Item = Arc<Symbol>>) {
        for symbol in symbols {
            self.push(symbol);
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn into_vec(self) -> Vec<Arc<Symbol>> {
        self.symbols
    }
}

#[derive(Default)]
struct SymbolStoreInner {
    /// Tables bucketed by uri hash.
    tables: HashMap<u64, Vec<Arc<SymbolTable>>>,
    index: NameIndex<IndexedSymbol>,
}

impl SymbolStoreInner {
    fn get(&self, uri: &str) -> Option<Arc<SymbolTable>> {
        let hash = uri_hash(uri);
        self.tables
            .get(&hash)?
            .iter()
            .find(|t| t.uri == uri)
            .cloned()
    }

    fn insert(&mut self, table: Arc<SymbolTable>) {
        self.remove(&table.uri);
        let entries = indexed_symbols(&table);
        debug!("Indexing {} symbols from {}", entries.len(), table.uri);
        self.index.add_many(entries);
        self.tables.entry(table.hash).or_default().push(table);
    }

    fn remove(&mut self, uri: &str) -> Option<Arc<SymbolTable>> {
        let hash = uri_hash(uri);
        let bucket = self.tables.get_mut(&hash)?;
        let pos = bucket.iter().position(|t| t.uri == uri)?;
        let table = bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.tables.remove(&hash);
        }
        for entry in indexed_symbols(&table) {
            self.index
                .remove(&entry, |x| Arc::ptr_eq(&x.symbol, &entry.symbol));
        }
        Some(table)
    }

    fn find<P>(&self, text: &str, predicate: P) -> Vec<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        let mut out = UniqueSymbolCollection::new();
        out.extend(
            self.index
                .find(text)
                .into_iter()
                .map(|e| e.symbol)
                .filter(|s| s.name_equals(text) && predicate(s)),
        );
        out.into_vec()
    }

    fn match_prefix<P>(&self, text: &str, predicate: P) -> Vec<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        let mut out = UniqueSymbolCollection::new();
        out.extend(
            self.index
                .match_prefix(text)
                .into_iter()
                .map(|e| e.symbol)
                .filter(|s| predicate(s)),
        );
        out.into_vec()
    }

    fn find_by_reference(
        &self,
        reference: &Reference,
        strategy: MemberMergeStrategy,
    ) -> Vec<Arc<Symbol>> {
        match reference.kind {
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Trait => {
                self.find(&reference.name, |s| s.is_class_like())
            }
            SymbolKind::Function | SymbolKind::Constant | SymbolKind::Namespace => {
                let kind = reference.kind;
                let found = self.find(&reference.name, |s| s.kind == kind);
                match &reference.alt_name {
                    Some(alt) if found.is_empty() => self.find(alt, |s| s.kind == kind),
                    _ => found,
                }
            }
            SymbolKind::Method
            | SymbolKind::Constructor
            | SymbolKind::Property
            | SymbolKind::ClassConstant => {
                let kind = reference.kind;
                let mut out = UniqueSymbolCollection::new();
                for class in type_string::atomic_class_array(&reference.scope) {
                    if let Some(aggregate) = TypeAggregate::create(self, &class) {
                        out.extend(aggregate.named_members(strategy, kind, &reference.name));
                    }
                }
                out.into_vec()
            }
            SymbolKind::Variable | SymbolKind::Parameter => {
                let Some(table) = self.get(&reference.location.uri) else {
                    return Vec::new();
                };
                table
                    .scope_at(reference.range().start)
                    .children
                    .iter()
                    .filter(|c| {
                        matches!(c.kind, SymbolKind::Variable | SymbolKind::Parameter)
                            && c.name == reference.name
                    })
                    .cloned()
                    .collect()
            }
            SymbolKind::File => Vec::new(),
        }
    }
}

impl ClassLookup for SymbolStoreInner {
    fn class_like(&self, fqn: &str) -> Vec<Arc<Symbol>> {
        self.find(fqn.trim_start_matches('\\'), |s| s.is_class_like())
    }
}

fn indexed_symbols(table: &SymbolTable) -> Vec<IndexedSymbol> {
    table
        .filter(is_indexable)
        .into_iter()
        .map(|symbol| IndexedSymbol {
            hash: table.hash,
            symbol,
        })
        .collect()
}

/// Every resident symbol table plus a name index over their declarations.
#[derive(Default)]
pub struct SymbolStore {
    inner: RwLock<SymbolStoreInner>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SymbolStoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SymbolStoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `table`, replacing any table already held for its uri.
    pub fn add(&self, table: SymbolTable) -> Arc<SymbolTable> {
        let table = Arc::new(table);
        self.write().insert(table.clone());
        table
    }

    pub fn remove(&self, uri: &str) -> Option<Arc<SymbolTable>> {
        self.write().remove(uri)
    }

    pub fn get(&self, uri: &str) -> Option<Arc<SymbolTable>> {
        self.read().get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    pub fn tables(&self) -> Vec<Arc<SymbolTable>> {
        self.read().tables.values().flatten().cloned().collect()
    }

    pub fn uris(&self) -> Vec<String> {
        self.read()
            .tables
            .values()
            .flatten()
            .map(|t| t.uri.clone())
            .collect()
    }

    pub fn table_count(&self) -> usize {
        self.read().tables.values().map(Vec::len).sum()
    }

    /// Symbols whose full name equals `text`.
    pub fn find<P>(&self, text: &str, predicate: P) -> Vec<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        self.read().find(text, predicate)
    }

    /// Symbols with any search key starting with `text`.
    pub fn match_prefix<P>(&self, text: &str, predicate: P) -> Vec<Arc<Symbol>>
    where
        P: Fn(&Symbol) -> bool,
    {
        self.read().match_prefix(text, predicate)
    }

    /// Members of the class-like `fqn` and everything it inherits.
    pub fn type_members(&self, fqn: &str, strategy: MemberMergeStrategy) -> Vec<Arc<Symbol>> {
        let inner = self.read();
        TypeAggregate::create(&*inner, fqn)
            .map(|agg| agg.members(strategy, |_| true))
            .unwrap_or_default()
    }

    /// Transitive bases, interfaces and traits of `fqn`.
    pub fn associated(&self, fqn: &str) -> Vec<Arc<Symbol>> {
        let inner = self.read();
        TypeAggregate::create(&*inner, fqn)
            .map(|agg| agg.associated().to_vec())
            .unwrap_or_default()
    }

    /// Class-like declarations named `fqn`.
    pub fn class_like(&self, fqn: &str) -> Vec<Arc<Symbol>> {
        self.read().class_like(fqn)
    }

    /// Fully-qualified class-like symbol declaring `member`, looked up in the
    /// member's own file.
    pub fn declaring_type(&self, member: &Symbol) -> Option<Arc<Symbol>> {
        let location = member.location.as_ref()?;
        self.get(&location.uri)?.declaring_type(member)
    }
}

impl SymbolSource for SymbolStore {
    fn find_symbols_by_reference(
        &self,
        reference: &Reference,
        strategy: MemberMergeStrategy,
    ) -> Vec<Arc<Symbol>> {
        self.read().find_by_reference(reference, strategy)
    }
}
