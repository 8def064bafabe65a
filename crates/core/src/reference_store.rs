use crate::cache::codec;
use crate::error::Result;
use crate::name_index::{Indexable, NameIndex};
use futures::StreamExt;
use phpscope_api::Cache;
use phpscope_api::models::{Reference, ReferenceTable, ReferenceTableSummary, uri_hash};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

pub const DEFAULT_FETCH_WINDOW: usize = 10;

impl Indexable for Arc<ReferenceTableSummary> {
    fn index_keys(&self) -> Vec<String> {
        self.identifiers.clone()
    }
}

#[derive(Default)]
struct ReferenceStoreInner {
    open: HashMap<u64, Vec<Arc<ReferenceTable>>>,
    summaries: HashMap<u64, Vec<Arc<ReferenceTableSummary>>>,
    index: NameIndex<Arc<ReferenceTableSummary>>,
}

impl ReferenceStoreInner {
    fn open_table(&self, uri: &str) -> Option<Arc<ReferenceTable>> {
        self.open
            .get(&uri_hash(uri))?
            .iter()
            .find(|t| t.uri == uri)
            .cloned()
    }

    fn summary(&self, uri: &str) -> Option<Arc<ReferenceTableSummary>> {
        self.summaries
            .get(&uri_hash(uri))?
            .iter()
            .find(|s| s.uri == uri)
            .cloned()
    }

    fn take_open(&mut self, uri: &str) -> Option<Arc<ReferenceTable>> {
        let hash = uri_hash(uri);
        let bucket = self.open.get_mut(&hash)?;
        let pos = bucket.iter().position(|t| t.uri == uri)?;
        let table = bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.open.remove(&hash);
        }
        Some(table)
    }

    fn remove_summary(&mut self, uri: &str) -> Option<Arc<ReferenceTableSummary>> {
        let hash = uri_hash(uri);
        let bucket = self.summaries.get_mut(&hash)?;
        let pos = bucket.iter().position(|s| s.uri == uri)?;
        let summary = bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.summaries.remove(&hash);
        }
        self.index.remove(&summary, |s| s.uri == uri);
        Some(summary)
    }

    fn insert_summary(&mut self, summary: Arc<ReferenceTableSummary>) {
        self.remove_summary(&summary.uri);
        self.index.add(summary.clone());
        self.summaries
            .entry(summary.hash)
            .or_default()
            .push(summary);
    }
}

/// Reference tables of open files plus identifier summaries of every known
/// file. Closed files' tables live in the cache and are fetched on demand.
pub struct ReferenceStore {
    cache: Arc<dyn Cache>,
    fetch_window: usize,
    inner: RwLock<ReferenceStoreInner>,
}

impl ReferenceStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_fetch_window(cache, DEFAULT_FETCH_WINDOW)
    }

    pub fn with_fetch_window(cache: Arc<dyn Cache>, fetch_window: usize) -> Self {
        Self {
            cache,
            fetch_window: fetch_window.max(1),
            inner: RwLock::new(ReferenceStoreInner::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ReferenceStoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ReferenceStoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an open table and its summary, replacing both for the uri.
    pub fn add(&self, table: ReferenceTable) -> Arc<ReferenceTable> {
        let table = Arc::new(table);
        let summary = Arc::new(table.summary());
        let mut inner = self.write();
        inner.take_open(&table.uri);
        inner.insert_summary(summary);
        inner
            .open
            .entry(table.hash)
            .or_default()
            .push(table.clone());
        table
    }

    /// Registers only the summary of a table that is not resident.
    pub fn add_summary(&self, summary: ReferenceTableSummary) {
        self.write().insert_summary(Arc::new(summary));
    }

    /// Writes the open table for `uri` to the cache and drops it from memory.
    /// The summary stays indexed. Returns whether a table was evicted.
    pub async fn close(&self, uri: &str) -> Result<bool> {
        let Some(table) = self.write().take_open(uri) else {
            return Ok(false);
        };
        if let Err(e) = codec::write_reference_table(self.cache.as_ref(), &table).await {
            // keep the data reachable if it could not be persisted
            self.write().open.entry(table.hash).or_default().push(table);
            return Err(e);
        }
        debug!("Evicted references of {}", uri);
        Ok(true)
    }

    /// Forgets the open table and summary of `uri`. The cache is untouched.
    pub fn remove(&self, uri: &str) -> Option<Arc<ReferenceTableSummary>> {
        let mut inner = self.write();
        inner.take_open(uri);
        inner.remove_summary(uri)
    }

    pub fn get(&self, uri: &str) -> Option<Arc<ReferenceTable>> {
        self.read().open_table(uri)
    }

    pub fn is_open(&self, uri: &str) -> bool {
        self.get(uri).is_some()
    }

    pub fn summary(&self, uri: &str) -> Option<Arc<ReferenceTableSummary>> {
        self.read().summary(uri)
    }

    pub fn summaries(&self) -> Vec<Arc<ReferenceTableSummary>> {
        self.read().summaries.values().flatten().cloned().collect()
    }

    pub fn open_tables(&self) -> Vec<Arc<ReferenceTable>> {
        self.read().open.values().flatten().cloned().collect()
    }

    /// Open table for `uri`, or the cached one. A failed read is a miss.
    pub async fn fetch(&self, uri: &str) -> Option<Arc<ReferenceTable>> {
        if let Some(table) = self.get(uri) {
            return Some(table);
        }
        match codec::read_reference_table(self.cache.as_ref(), uri).await {
            Ok(table) => table.map(Arc::new),
            Err(e) => {
                warn!("Failed to read cached references for {}: {}", uri, e);
                None
            }
        }
    }

    /// Uris whose summary lists `name`.
    pub fn candidate_uris(&self, name: &str) -> Vec<String> {
        let mut uris: Vec<String> = self
            .read()
            .index
            .find(name)
            .into_iter()
            .map(|s| s.uri.clone())
            .collect();
        uris.sort();
        uris.dedup();
        uris
    }

    /// References named `name` that pass `predicate`, across every file whose
    /// summary mentions the name.
    pub async fn find<P>(&self, name: &str, predicate: P) -> Vec<Reference>
    where
        P: Fn(&Reference) -> bool,
    {
        let uris = self.candidate_uris(name);
        let mut tables: Vec<Arc<ReferenceTable>> = futures::stream::iter(uris)
            .map(|uri| async move { self.fetch(&uri).await })
            .buffer_unordered(self.fetch_window)
            .filter_map(|t| async move { t })
            .collect()
            .await;
        tables.sort_by(|a, b| a.uri.cmp(&b.uri));

        tables
            .iter()
            .flat_map(|t| t.references(|r| name_matches(r, name) && predicate(r)))
            .cloned()
            .collect()
    }
}

/// Name or alternate name equality, case-sensitive only for the kinds PHP
/// compares case-sensitively.
pub fn name_matches(reference: &Reference, name: &str) -> bool {
    let eq = |candidate: &str| {
        if reference.kind.is_case_sensitive() {
            candidate == name
        } else {
            candidate.eq_ignore_ascii_case(name)
        }
    };
    eq(&reference.name) || reference.alt_name.as_deref().map(eq).unwrap_or(false)
}
