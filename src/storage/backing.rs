use crate::catalog::types::{Row, RowId};
use crate::error::EmberError;
use crate::journal::table_diff::TableDiff;
use im::{HashMap, OrdMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consumer of a sealed journal's per-table diff map at commit time.
pub trait BackingStore {
    fn apply_diffs(&mut self, diffs: &BTreeMap<String, TableDiff>) -> Result<(), EmberError>;
}

/// In-memory backing store: one ordered row map per table. Persistent maps
/// make `snapshot` an O(1) structural-sharing clone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStore {
    tables: HashMap<String, OrdMap<RowId, Row>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, table_name: &str) -> Option<&OrdMap<RowId, Row>> {
        self.tables.get(table_name)
    }

    fn table_mut(&mut self, table_name: &str) -> &mut OrdMap<RowId, Row> {
        self.tables
            .entry(table_name.to_string())
            .or_insert_with(OrdMap::new)
    }

    pub fn row_count(&self, table_name: &str) -> usize {
        self.tables.get(table_name).map(|t| t.len()).unwrap_or(0)
    }

    pub fn snapshot(&self) -> MemoryStore {
        self.clone()
    }
}

impl BackingStore for MemoryStore {
    fn apply_diffs(&mut self, diffs: &BTreeMap<String, TableDiff>) -> Result<(), EmberError> {
        for (table_name, diff) in diffs {
            let table = self.table_mut(table_name);
            for row_id in diff.deleted().keys() {
                table.remove(row_id);
            }
            for row in diff.added().values() {
                table.insert(row.id(), row.clone());
            }
            for (_, new) in diff.modified().values() {
                table.insert(new.id(), new.clone());
            }
        }
        Ok(())
    }
}
