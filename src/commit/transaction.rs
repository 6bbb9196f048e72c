use crate::catalog::schema::TableSchema;
use crate::error::EmberError;
use crate::journal::Journal;
use crate::storage::backing::BackingStore;
use crate::storage::index_store::IndexStore;
use crate::storage::row_cache::RowCache;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Owns one journal for its whole lifetime. Both terminal calls consume the
/// transaction, so a second terminal call is unrepresentable.
#[derive(Debug)]
pub struct Transaction<S: BackingStore> {
    journal: Journal,
    store: Arc<RwLock<S>>,
}

impl<S: BackingStore> Transaction<S> {
    pub fn new(
        scope: Vec<TableSchema>,
        cache: Arc<RwLock<RowCache>>,
        indices: Arc<RwLock<IndexStore>>,
        store: Arc<RwLock<S>>,
    ) -> Self {
        Self {
            journal: Journal::new(scope, cache, indices),
            store,
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    /// Seals the journal and hands its per-table diff map to the backing
    /// store for persistence.
    pub fn commit(mut self) -> Result<(), EmberError> {
        self.journal.commit();
        let diffs = self.journal.diff();
        debug!(tables = diffs.len(), "transaction committing");
        self.store.write().apply_diffs(diffs)
    }

    /// Restores the cache and indices to their pre-transaction state. The
    /// backing store never sees anything.
    pub fn rollback(mut self) -> Result<(), EmberError> {
        self.journal.rollback()
    }
}
