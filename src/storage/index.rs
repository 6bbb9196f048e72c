use crate::catalog::types::{IndexKey, RowId};
use crate::storage::key_range::KeyRange;
use im::{OrdMap, OrdSet};

/// An ordered in-memory index from key to the set of row ids holding it.
/// A unique index keeps at most one row id per key; `set` on an existing key
/// replaces the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryIndex {
    name: String,
    unique: bool,
    entries: OrdMap<IndexKey, OrdSet<RowId>>,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            unique,
            entries: OrdMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn get(&self, key: &IndexKey) -> Vec<RowId> {
        self.entries
            .get(key)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Row ids whose key falls in `range`; an absent range scans the whole
    /// index. Results come out in key order.
    pub fn get_range(&self, range: Option<&KeyRange>) -> Vec<RowId> {
        match range {
            None => self
                .entries
                .iter()
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
            Some(range) => self
                .entries
                .range(range.bounds())
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
        }
    }

    pub fn set(&mut self, key: IndexKey, row_id: RowId) {
        if self.unique {
            self.entries.insert(key, OrdSet::unit(row_id));
            return;
        }
        let mut ids = self.entries.get(&key).cloned().unwrap_or_default();
        ids.insert(row_id);
        self.entries.insert(key, ids);
    }

    pub fn remove(&mut self, key: &IndexKey, row_id: RowId) {
        let Some(mut ids) = self.entries.get(key).cloned() else {
            return;
        };
        ids.remove(&row_id);
        if ids.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.clone(), ids);
        }
    }

    pub fn contains_key(&self, key: &IndexKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
