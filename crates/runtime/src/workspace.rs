use crate::config::EngineConfig;
use crate::debounce::Debouncer;
use crate::state::WorkspaceState;
use dashmap::DashSet;
use futures::StreamExt;
use phpscope_api::models::{
    ParsedDocument, Position, Reference, ReferenceTable, Symbol, SymbolKind, SymbolTable,
};
use phpscope_api::{Cache, MemberMergeStrategy, SymbolSource, type_string};
use phpscope_core::cache::{codec, create_cache};
use phpscope_core::reference_store::name_matches;
use phpscope_core::{ReferenceStore, SymbolStore};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, info, warn};

/// Stores and cache shared with the debounce worker.
struct Indexer {
    cache: Arc<dyn Cache>,
    symbols: SymbolStore,
    references: ReferenceStore,
    open: DashSet<String>,
}

impl Indexer {
    fn read(&self, doc: &ParsedDocument) -> (Arc<SymbolTable>, ReferenceTable) {
        let symbols = self.symbols.add(phpscope_php::read_symbols(doc));
        let references = phpscope_php::read_references(doc, &symbols, &self.symbols);
        (symbols, references)
    }

    fn rebuild(&self, doc: &ParsedDocument) {
        let (_, references) = self.read(doc);
        self.references.add(references);
        debug!("Indexed {}", doc.uri);
    }

    /// Does `reference` resolve to the declaration at `target`'s location?
    fn resolves_to(&self, reference: &Reference, target: &Symbol) -> bool {
        self.symbols
            .find_symbols_by_reference(reference, MemberMergeStrategy::None)
            .iter()
            .any(|s| s.location == target.location)
    }

    /// Does the type expression `scope` name `class` or a subtype of it?
    fn scope_includes(&self, scope: &str, class: &str) -> bool {
        type_string::atomic_class_array(scope).iter().any(|name| {
            name.eq_ignore_ascii_case(class)
                || self
                    .symbols
                    .associated(name)
                    .iter()
                    .any(|base| base.name.eq_ignore_ascii_case(class))
        })
    }
}

/// The indexing engine: document lifecycle plus every query over the
/// resulting symbol and reference indexes.
///
/// Queries never fail; anything that goes wrong is logged and the query
/// answers with whatever it could still find.
pub struct Workspace {
    config: EngineConfig,
    inner: Arc<Indexer>,
    debouncer: Debouncer<ParsedDocument>,
}

impl Workspace {
    /// Must be called inside a tokio runtime for edits to be applied without
    /// an explicit flush.
    pub fn new(config: EngineConfig) -> Self {
        let cache = create_cache(config.storage_path.as_deref());
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: EngineConfig, cache: Arc<dyn Cache>) -> Self {
        let inner = Arc::new(Indexer {
            references: ReferenceStore::with_fetch_window(cache.clone(), config.fetch_window),
            symbols: SymbolStore::new(),
            open: DashSet::new(),
            cache,
        });
        let weak = Arc::downgrade(&inner);
        let debouncer = Debouncer::new(config.debounce(), move |doc: ParsedDocument| {
            if let Some(indexer) = weak.upgrade() {
                indexer.rebuild(&doc);
            }
        });
        Self {
            config,
            inner,
            debouncer,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolStore {
        &self.inner.symbols
    }

    pub fn references(&self) -> &ReferenceStore {
        &self.inner.references
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.inner.cache
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.inner.open.contains(uri)
    }

    /// Every uri with resident symbols or an indexed reference summary.
    pub fn known_uris(&self) -> Vec<String> {
        let mut uris: HashSet<String> = self.inner.symbols.uris().into_iter().collect();
        uris.extend(
            self.inner
                .references
                .summaries()
                .iter()
                .map(|s| s.uri.clone()),
        );
        let mut uris: Vec<String> = uris.into_iter().collect();
        uris.sort();
        uris
    }

    /// Reads and registers `doc`, replacing whatever was held for its uri.
    pub fn open(&self, doc: ParsedDocument) {
        self.debouncer.cancel(&doc.uri);
        self.inner.open.insert(doc.uri.clone());
        self.inner.rebuild(&doc);
    }

    /// Queues a re-read of `doc` after the quiet period.
    pub fn edit(&self, doc: ParsedDocument) {
        self.inner.open.insert(doc.uri.clone());
        self.debouncer.schedule(doc.uri.clone(), doc);
    }

    /// Applies a pending edit of `uri` now.
    pub fn flush(&self, uri: &str) -> bool {
        self.debouncer.flush(uri)
    }

    pub fn flush_all(&self) -> usize {
        self.debouncer.flush_all()
    }

    /// Persists and evicts the references of `uri`. Symbols stay resident.
    pub async fn close(&self, uri: &str) {
        self.flush(uri);
        self.inner.open.remove(uri);
        if let Err(e) = self.inner.references.close(uri).await {
            error!("Failed to persist references of {}: {}", uri, e);
        }
        if let Some(table) = self.inner.symbols.get(uri) {
            if let Err(e) = codec::write_symbol_table(self.inner.cache.as_ref(), &table).await {
                error!("Failed to persist symbols of {}: {}", uri, e);
            }
        }
        debug!("Closed {}", uri);
    }

    /// Brings the evicted references of a closed `uri` back from the cache.
    /// Returns whether the file is resident afterwards.
    pub async fn restore(&self, uri: &str) -> bool {
        if self.inner.references.is_open(uri) {
            self.inner.open.insert(uri.to_string());
            return true;
        }
        let cache = self.inner.cache.as_ref();
        if !self.inner.symbols.contains(uri) {
            match codec::read_symbol_table(cache, uri).await {
                Ok(Some(table)) => {
                    self.inner.symbols.add(table);
                }
                Ok(None) => return false,
                Err(e) => {
                    warn!("Failed to read cached symbols of {}: {}", uri, e);
                    return false;
                }
            }
        }
        match codec::read_reference_table(cache, uri).await {
            Ok(Some(table)) => {
                self.inner.references.add(table);
                self.inner.open.insert(uri.to_string());
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to read cached references of {}: {}", uri, e);
                false
            }
        }
    }

    /// Removes every trace of `uri`, cache entries included.
    pub async fn forget(&self, uri: &str) {
        self.debouncer.cancel(uri);
        self.inner.open.remove(uri);
        self.inner.symbols.remove(uri);
        self.inner.references.remove(uri);
        if let Err(e) = codec::delete_tables(self.inner.cache.as_ref(), uri).await {
            error!("Failed to delete cached tables of {}: {}", uri, e);
        }
        debug!("Forgot {}", uri);
    }

    /// Indexes a file that is not open: symbols stay resident, references go
    /// to the cache behind a summary. Open files are left alone.
    pub async fn discover(&self, doc: ParsedDocument) {
        if self.is_open(&doc.uri) {
            debug!("Skipping discovery of open file {}", doc.uri);
            return;
        }
        let (_, references) = self.inner.read(&doc);
        match codec::write_reference_table(self.inner.cache.as_ref(), &references).await {
            Ok(()) => self.inner.references.add_summary(references.summary()),
            Err(e) => {
                warn!(
                    "Failed to cache references of {}: {}. Keeping them in memory",
                    doc.uri, e
                );
                self.inner.references.add(references);
            }
        }
        debug!("Discovered {}", doc.uri);
    }

    /// Writes every table and the state record to the cache.
    pub async fn shutdown(&self) {
        self.flush_all();
        self.debouncer.stop();

        let limit = self.config.io_concurrency.max(1);
        let cache = self.inner.cache.as_ref();
        let failures = AtomicUsize::new(0);

        let symbol_tables = self.inner.symbols.tables();
        let symbol_count = symbol_tables.len();
        futures::stream::iter(symbol_tables)
            .for_each_concurrent(limit, |table| {
                let failures = &failures;
                async move {
                    if let Err(e) = codec::write_symbol_table(cache, &table).await {
                        error!("Failed to persist symbols of {}: {}", table.uri, e);
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;

        let reference_tables = self.inner.references.open_tables();
        let reference_count = reference_tables.len();
        futures::stream::iter(reference_tables)
            .for_each_concurrent(limit, |table| {
                let failures = &failures;
                async move {
                    if let Err(e) = codec::write_reference_table(cache, &table).await {
                        error!("Failed to persist references of {}: {}", table.uri, e);
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;

        let state = WorkspaceState::now(self.known_uris());
        if let Err(e) = state.save(cache).await {
            error!("Failed to persist workspace state: {}", e);
        }
        if let Err(e) = cache.flush().await {
            error!("Failed to flush cache: {}", e);
        }
        info!(
            "Shut down: {} symbol tables, {} reference tables, {} failures",
            symbol_count,
            reference_count,
            failures.load(Ordering::Relaxed)
        );
    }

    /// Reloads symbol tables and reference summaries of every file known at
    /// the last shutdown. Returns how many files were restored; 0 is a cold
    /// start.
    pub async fn startup(&self) -> usize {
        let cache = self.inner.cache.as_ref();
        if self.config.clear_cache {
            if let Err(e) = cache.clear().await {
                error!("Failed to clear cache: {}", e);
            }
            info!("Cache cleared, cold start");
            return 0;
        }

        let state = match WorkspaceState::load(cache).await {
            Ok(Some(state)) => state,
            Ok(None) => {
                info!("No workspace state, cold start");
                return 0;
            }
            Err(e) => {
                warn!("Unreadable workspace state, cold start: {}", e);
                return 0;
            }
        };

        let loaded = AtomicUsize::new(0);
        futures::stream::iter(state.known_uris.iter())
            .for_each_concurrent(self.config.io_concurrency.max(1), |uri| {
                let loaded = &loaded;
                async move {
                    if self.load_cached(uri).await {
                        loaded.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .await;

        let loaded = loaded.into_inner();
        info!(
            "Warm start: {} of {} files restored from cache",
            loaded,
            state.known_uris.len()
        );
        loaded
    }

    async fn load_cached(&self, uri: &str) -> bool {
        let cache = self.inner.cache.as_ref();
        let mut restored = false;
        if !self.inner.symbols.contains(uri) {
            match codec::read_symbol_table(cache, uri).await {
                Ok(Some(table)) => {
                    self.inner.symbols.add(table);
                    restored = true;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to read cached symbols of {}: {}", uri, e),
            }
        }
        if self.inner.references.summary(uri).is_none() {
            match codec::read_reference_table(cache, uri).await {
                Ok(Some(table)) => {
                    self.inner.references.add_summary(table.summary());
                    restored = true;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to read cached references of {}: {}", uri, e),
            }
        }
        restored
    }

    /// Symbols whose full name is `text`.
    pub fn find_symbols(&self, text: &str) -> Vec<Arc<Symbol>> {
        self.flush_all();
        self.inner.symbols.find(text, |_| true)
    }

    /// Workspace symbol search by name or word prefix.
    pub fn match_symbols(&self, text: &str) -> Vec<Arc<Symbol>> {
        self.flush_all();
        self.inner.symbols.match_prefix(text, |_| true)
    }

    pub fn document_symbols(&self, uri: &str) -> Vec<Arc<Symbol>> {
        self.flush(uri);
        self.inner
            .symbols
            .get(uri)
            .map(|t| t.symbols())
            .unwrap_or_default()
    }

    pub async fn reference_at(&self, uri: &str, pos: Position) -> Option<Reference> {
        self.flush(uri);
        let table = self.inner.references.fetch(uri).await?;
        table.reference_at(pos).cloned()
    }

    /// Declarations the name at `pos` refers to.
    pub async fn symbols_at(
        &self,
        uri: &str,
        pos: Position,
        strategy: MemberMergeStrategy,
    ) -> Vec<Arc<Symbol>> {
        match self.reference_at(uri, pos).await {
            Some(reference) => self
                .inner
                .symbols
                .find_symbols_by_reference(&reference, strategy),
            None => Vec::new(),
        }
    }

    /// Members of `fqn` and everything it inherits.
    pub fn type_members(&self, fqn: &str, strategy: MemberMergeStrategy) -> Vec<Arc<Symbol>> {
        self.inner.symbols.type_members(fqn, strategy)
    }

    /// Every use of the symbol the name at `pos` refers to, in uri and
    /// document order.
    pub async fn find_references(
        &self,
        uri: &str,
        pos: Position,
        include_declaration: bool,
    ) -> Vec<Reference> {
        let Some(reference) = self.reference_at(uri, pos).await else {
            return Vec::new();
        };
        let targets = self
            .inner
            .symbols
            .find_symbols_by_reference(&reference, MemberMergeStrategy::Override);

        let mut found = Vec::new();
        for target in &targets {
            let mut refs = self.references_to(target).await;
            sort_references(&mut refs);
            if !include_declaration {
                remove_declaration(&mut refs, target);
            }
            found.extend(refs);
        }

        let mut seen = HashSet::new();
        found.retain(|r| seen.insert((r.location.uri.clone(), r.range().start)));
        sort_references(&mut found);
        found
    }

    async fn references_to(&self, target: &Symbol) -> Vec<Reference> {
        let kind = target.kind;
        match kind {
            SymbolKind::Variable | SymbolKind::Parameter => self.declaring_file_references(target).await,
            _ if target.is_member() && target.is_private() => {
                self.declaring_file_references(target).await
            }
            _ if target.is_member() => {
                let class = self
                    .inner
                    .symbols
                    .declaring_type(target)
                    .map(|c| c.name.clone())
                    .or_else(|| target.scope.clone())
                    .unwrap_or_default();
                self.inner
                    .references
                    .find(&target.name, |r| {
                        r.kind == kind && self.inner.scope_includes(&r.scope, &class)
                    })
                    .await
            }
            _ if target.is_class_like() => {
                self.inner
                    .references
                    .find(&target.name, |r| r.kind.is_class_like())
                    .await
            }
            _ => {
                self.inner
                    .references
                    .find(&target.name, |r| r.kind == kind)
                    .await
            }
        }
    }

    /// Uses within the declaring file that resolve to `target` itself, so
    /// shadowed names elsewhere in the file are skipped.
    async fn declaring_file_references(&self, target: &Symbol) -> Vec<Reference> {
        let Some(location) = &target.location else {
            return Vec::new();
        };
        let Some(table) = self.inner.references.fetch(&location.uri).await else {
            return Vec::new();
        };
        let same_kind = |r: &Reference| {
            if target.is_member() {
                r.kind == target.kind
            } else {
                r.is_variable()
            }
        };
        table
            .references(|r| {
                same_kind(r) && name_matches(r, &target.name) && self.inner.resolves_to(r, target)
            })
            .into_iter()
            .cloned()
            .collect()
    }
}

fn sort_references(refs: &mut [Reference]) {
    refs.sort_by(|a, b| {
        a.location
            .uri
            .cmp(&b.location.uri)
            .then(a.range().start.cmp(&b.range().start))
    });
}

/// Drops the first use inside the declaration's own range, which is the
/// declaring name.
fn remove_declaration(refs: &mut Vec<Reference>, target: &Symbol) {
    let Some(location) = &target.location else {
        return;
    };
    let declaration = refs.iter().position(|r| {
        r.location.uri == location.uri && location.range.contains(r.range().start)
    });
    if let Some(i) = declaration {
        refs.remove(i);
    }
}
