pub mod catalog;
pub mod commit;
pub mod error;
pub mod journal;
pub mod storage;

pub use crate::commit::transaction::Transaction;
pub use crate::error::{EmberError, EmberErrorCode, ErrorKind};
pub use crate::journal::Journal;
pub use crate::journal::table_diff::TableDiff;

use crate::catalog::schema::TableSchema;
use crate::storage::backing::MemoryStore;
use crate::storage::index_store::IndexStore;
use crate::storage::row_cache::RowCache;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Engine shell wiring the shared row cache, index store and backing store
/// together. Transactions begun here borrow those shared structures; the
/// caller serializes transactions whose scopes overlap.
pub struct Database {
    tables: BTreeMap<String, TableSchema>,
    cache: Arc<RwLock<RowCache>>,
    indices: Arc<RwLock<IndexStore>>,
    store: Arc<RwLock<MemoryStore>>,
}

impl Database {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            cache: Arc::new(RwLock::new(RowCache::new())),
            indices: Arc::new(RwLock::new(IndexStore::new())),
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }

    /// Installs a table schema and materializes its indices.
    pub fn register_table(&mut self, schema: TableSchema) -> Result<(), EmberError> {
        if self.tables.contains_key(schema.name()) {
            return Err(EmberError::TableAlreadyExists {
                table: schema.name().to_string(),
            });
        }
        self.indices.write().register_table(&schema);
        info!(table = schema.name(), "table registered");
        self.tables.insert(schema.name().to_string(), schema);
        Ok(())
    }

    pub fn schema(&self, table_name: &str) -> Option<&TableSchema> {
        self.tables.get(table_name)
    }

    /// Begins a transaction whose journal may touch exactly the named tables.
    pub fn begin(&self, table_names: &[&str]) -> Result<Transaction<MemoryStore>, EmberError> {
        let mut scope = Vec::with_capacity(table_names.len());
        for name in table_names {
            let schema = self
                .tables
                .get(*name)
                .ok_or_else(|| EmberError::TableNotFound {
                    table: (*name).to_string(),
                })?;
            scope.push(schema.clone());
        }
        Ok(Transaction::new(
            scope,
            Arc::clone(&self.cache),
            Arc::clone(&self.indices),
            Arc::clone(&self.store),
        ))
    }

    /// O(1) copy-on-write snapshot of the committed state.
    pub fn store_snapshot(&self) -> MemoryStore {
        self.store.read().snapshot()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
