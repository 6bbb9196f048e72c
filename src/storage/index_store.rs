use crate::catalog::schema::{TableSchema, row_id_index_name};
use crate::error::EmberError;
use crate::storage::index::MemoryIndex;
use im::HashMap;

/// Registry of every live index, keyed by normalized name. Each registered
/// table contributes one index per declared schema (primary key included)
/// plus the implicit row-id index.
#[derive(Debug, Clone, Default)]
pub struct IndexStore {
    indices: HashMap<String, MemoryIndex>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_table(&mut self, schema: &TableSchema) {
        for index in schema.indices() {
            let name = index.normalized_name();
            self.indices
                .insert(name.clone(), MemoryIndex::new(name, index.unique));
        }
        let row_id_name = schema.row_id_index_name();
        self.indices
            .insert(row_id_name.clone(), MemoryIndex::new(row_id_name, true));
    }

    pub fn get(&self, normalized_name: &str) -> Result<&MemoryIndex, EmberError> {
        self.indices
            .get(normalized_name)
            .ok_or_else(|| EmberError::IndexNotFound {
                index: normalized_name.to_string(),
            })
    }

    pub fn get_mut(&mut self, normalized_name: &str) -> Result<&mut MemoryIndex, EmberError> {
        self.indices
            .get_mut(normalized_name)
            .ok_or_else(|| EmberError::IndexNotFound {
                index: normalized_name.to_string(),
            })
    }

    pub fn row_id_index(&self, table_name: &str) -> Result<&MemoryIndex, EmberError> {
        self.get(&row_id_index_name(table_name))
    }
}
