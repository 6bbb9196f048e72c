use crate::catalog::types::{Row, RowId};
use im::HashMap;

/// Process-wide map from row id to the latest row image. The journal is the
/// only writer; reads hand out clones so callers never hold live references
/// across a mutation.
#[derive(Debug, Clone, Default)]
pub struct RowCache {
    rows: HashMap<RowId, Row>,
}

impl RowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position-preserving lookup: the entry for an absent row id is `None`.
    pub fn get(&self, row_ids: &[RowId]) -> Vec<Option<Row>> {
        row_ids.iter().map(|id| self.rows.get(id).cloned()).collect()
    }

    pub fn get_one(&self, row_id: RowId) -> Option<&Row> {
        self.rows.get(&row_id)
    }

    pub fn set(&mut self, rows: &[Row]) {
        for row in rows {
            self.rows.insert(row.id(), row.clone());
        }
    }

    pub fn remove(&mut self, row_ids: &[RowId]) {
        for id in row_ids {
            self.rows.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
