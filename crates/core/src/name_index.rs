//! Sorted key index shared by the symbol and reference stores.

/// Something that can be filed under one or more case-folded keys.
pub trait Indexable {
    fn index_keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct IndexNode<T> {
    key: String,
    items: Vec<T>,
}

/// Keys kept sorted so exact lookups are a binary search and prefix lookups
/// are a contiguous range.
#[derive(Debug, Clone)]
pub struct NameIndex<T> {
    nodes: Vec<IndexNode<T>>,
}

impl<T> Default for NameIndex<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T: Indexable + Clone> NameIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, item: T) {
        for key in item.index_keys() {
            self.insert(key, item.clone());
        }
    }

    pub fn add_many(&mut self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.add(item);
        }
    }

    fn insert(&mut self, key: String, item: T) {
        match self.nodes.binary_search_by(|n| n.key.as_str().cmp(&key)) {
            Ok(i) => self.nodes[i].items.push(item),
            Err(i) => self.nodes.insert(
                i,
                IndexNode {
                    key,
                    items: vec![item],
                },
            ),
        }
    }

    /// Removes every entry of `item` for which `same` holds, under the keys
    /// `item` was filed with. Emptied keys are dropped.
    pub fn remove<F>(&mut self, item: &T, same: F)
    where
        F: Fn(&T) -> bool,
    {
        for key in item.index_keys() {
            if let Ok(i) = self.nodes.binary_search_by(|n| n.key.as_str().cmp(&key)) {
                self.nodes[i].items.retain(|x| !same(x));
                if self.nodes[i].items.is_empty() {
                    self.nodes.remove(i);
                }
            }
        }
    }

    /// Items filed under exactly `key` (case-folded before lookup).
    pub fn find(&self, key: &str) -> Vec<T> {
        let key = key.to_lowercase();
        match self.nodes.binary_search_by(|n| n.key.as_str().cmp(&key)) {
            Ok(i) => self.nodes[i].items.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Items filed under any key starting with `prefix`. An item reachable
    /// through several keys is returned once per key.
    pub fn match_prefix(&self, prefix: &str) -> Vec<T> {
        let prefix = prefix.to_lowercase();
        let start = self
            .nodes
            .partition_point(|n| n.key.as_str() < prefix.as_str());
        self.nodes[start..]
            .iter()
            .take_while(|n| n.key.starts_with(&prefix))
            .flat_map(|n| n.items.iter().cloned())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.key.as_str())
    }
}
