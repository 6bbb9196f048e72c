pub mod table_diff;

use crate::catalog::schema::{IndexSchema, TableSchema};
use crate::catalog::types::{IndexKey, Row, RowId};
use crate::error::EmberError;
use crate::journal::table_diff::TableDiff;
use crate::storage::index_store::IndexStore;
use crate::storage::key_range::KeyRange;
use crate::storage::row_cache::RowCache;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Per-transaction buffer of pending changes. Every mutation is validated
/// against the scope and the primary-key constraint first, then applied to
/// the shared row cache and indices and folded into the accumulated per-table
/// diff. `commit` seals the diff; `rollback` applies each diff's reverse.
///
/// The outer transaction scheduler guarantees that at most one journal
/// touching a given table is active, so the locks below are the shared-
/// mutability vehicle rather than a coordination mechanism.
#[derive(Debug)]
pub struct Journal {
    scope: BTreeMap<String, TableSchema>,
    table_diffs: BTreeMap<String, TableDiff>,
    cache: Arc<RwLock<RowCache>>,
    indices: Arc<RwLock<IndexStore>>,
    terminated: bool,
}

impl Journal {
    pub fn new(
        scope: Vec<TableSchema>,
        cache: Arc<RwLock<RowCache>>,
        indices: Arc<RwLock<IndexStore>>,
    ) -> Self {
        let scope = scope
            .into_iter()
            .map(|table| (table.name().to_string(), table))
            .collect();
        Self {
            scope,
            table_diffs: BTreeMap::new(),
            cache,
            indices,
            terminated: false,
        }
    }

    /// Tables this journal may touch, keyed by name. Fixed at construction.
    pub fn scope(&self) -> &BTreeMap<String, TableSchema> {
        &self.scope
    }

    /// The accumulated per-table diffs, reflecting every applied operation.
    pub fn diff(&self) -> &BTreeMap<String, TableDiff> {
        &self.table_diffs
    }

    /// De-duplicated row ids whose key for the given index falls in any of
    /// the ranges, consulting the current journal-applied index state.
    pub fn get_index_range(
        &self,
        index_schema: &IndexSchema,
        ranges: &[KeyRange],
    ) -> Result<Vec<RowId>, EmberError> {
        let indices = self.indices.read();
        let index = indices.get(&index_schema.normalized_name())?;
        let mut row_ids = BTreeSet::new();
        for range in ranges {
            row_ids.extend(index.get_range(Some(range)));
        }
        Ok(row_ids.into_iter().collect())
    }

    /// Rows of a table by id, position-preserving with `None` holes. With no
    /// ids given, every live row of the table is fetched via the row-id index.
    pub fn get_table_rows(
        &self,
        table_name: &str,
        row_ids: Option<&[RowId]>,
    ) -> Result<Vec<Option<Row>>, EmberError> {
        let ids: Vec<RowId> = match row_ids {
            Some(ids) => ids.to_vec(),
            None => {
                let indices = self.indices.read();
                indices.row_id_index(table_name)?.get_range(None)
            }
        };
        Ok(self.cache.read().get(&ids))
    }

    /// Inserts new rows. Fails before any mutation if the table is out of
    /// scope, if two input rows share a primary key, or if a row's primary
    /// key is already visible in the transactional view.
    pub fn insert(&mut self, table_name: &str, rows: Vec<Row>) -> Result<(), EmberError> {
        self.assert_live();
        let schema = self.scoped_table(table_name)?.clone();

        if let Some(pk) = schema.constraint().primary_key() {
            let pk_name = pk.normalized_name();
            self.check_batch_unique(&schema, &pk_name, &rows)?;
            for row in &rows {
                if self.find_existing_row_id_in_pk_index(&schema, row)?.is_some() {
                    return Err(EmberError::DuplicatePrimaryKey {
                        table: schema.name().to_string(),
                        key: display_pk(row.key_of_index(&schema, &pk_name)),
                    });
                }
            }
        }

        let mut diff = TableDiff::new(schema.name());
        for row in rows {
            diff.add(row);
        }
        self.apply_table_diff(&schema, diff)
    }

    /// Replaces existing rows with new images, matched by row id. At most one
    /// row may change its primary key per call, and only to a key that is not
    /// already taken.
    pub fn update(&mut self, table_name: &str, rows: Vec<Row>) -> Result<(), EmberError> {
        self.assert_live();
        let schema = self.scoped_table(table_name)?.clone();

        let mut modifications = Vec::with_capacity(rows.len());
        {
            let cache = self.cache.read();
            for row in rows {
                let old = cache
                    .get_one(row.id())
                    .cloned()
                    .ok_or_else(|| EmberError::RowNotFound {
                        table: schema.name().to_string(),
                        row_id: row.id(),
                    })?;
                modifications.push((old, row));
            }
        }

        if let Some(pk) = schema.constraint().primary_key() {
            let pk_name = pk.normalized_name();
            let changed: Vec<&(Row, Row)> = modifications
                .iter()
                .filter(|(old, new)| {
                    old.key_of_index(&schema, &pk_name) != new.key_of_index(&schema, &pk_name)
                })
                .collect();
            match changed.as_slice() {
                [] => {}
                [single] => {
                    let new = &single.1;
                    if self.find_existing_row_id_in_pk_index(&schema, new)?.is_some() {
                        return Err(EmberError::PrimaryKeyUpdateCollision {
                            table: schema.name().to_string(),
                            key: display_pk(new.key_of_index(&schema, &pk_name)),
                        });
                    }
                }
                // The query surface only permits literal updates, so two rows
                // arriving at the same new key is definitionally a violation.
                _ => {
                    return Err(EmberError::AmbiguousPrimaryKeyUpdate {
                        table: schema.name().to_string(),
                    });
                }
            }
        }

        let mut diff = TableDiff::new(schema.name());
        for (old, new) in modifications {
            diff.modify(old, new);
        }
        self.apply_table_diff(&schema, diff)
    }

    /// Inserts rows, folding each onto the existing row with the same primary
    /// key when there is one. Collisions resolve to modifications, so no
    /// uniqueness pre-check is needed.
    pub fn insert_or_replace(
        &mut self,
        table_name: &str,
        rows: Vec<Row>,
    ) -> Result<(), EmberError> {
        self.assert_live();
        let schema = self.scoped_table(table_name)?.clone();

        let mut diff = TableDiff::new(schema.name());
        for mut row in rows {
            match self.find_existing_row_id_in_pk_index(&schema, &row)? {
                Some(existing_id) => {
                    row.set_row_id(existing_id);
                    let old = self
                        .cache
                        .read()
                        .get_one(existing_id)
                        .cloned()
                        .ok_or_else(|| EmberError::RowNotFound {
                            table: schema.name().to_string(),
                            row_id: existing_id,
                        })?;
                    diff.modify(old, row);
                }
                None => diff.add(row),
            }
        }
        self.apply_table_diff(&schema, diff)
    }

    /// Deletes the given rows.
    pub fn remove(&mut self, table_name: &str, rows: Vec<Row>) -> Result<(), EmberError> {
        self.assert_live();
        let schema = self.scoped_table(table_name)?.clone();

        let mut diff = TableDiff::new(schema.name());
        for row in rows {
            diff.delete(row);
        }
        self.apply_table_diff(&schema, diff)
    }

    /// Seals the journal. The accumulated diff stays readable through
    /// [`Journal::diff`] for the enclosing transaction to hand to the backing
    /// store; the journal itself persists nothing.
    pub fn commit(&mut self) {
        self.assert_live();
        self.terminated = true;
        debug!(tables = self.table_diffs.len(), "journal sealed");
    }

    /// Applies the reverse of every accumulated diff to the indices and the
    /// cache, restoring their pre-journal state, then seals the journal.
    pub fn rollback(&mut self) -> Result<(), EmberError> {
        self.assert_live();
        let diffs = std::mem::take(&mut self.table_diffs);
        for (table_name, diff) in diffs {
            let schema = self
                .scope
                .get(&table_name)
                .cloned()
                .ok_or_else(|| EmberError::TableNotFound {
                    table: table_name.clone(),
                })?;
            let reversed = diff.reverse();
            self.update_table_indices(&schema, &reversed)?;
            self.update_cache(&reversed);
        }
        self.terminated = true;
        debug!("journal rolled back");
        Ok(())
    }

    fn assert_live(&self) {
        assert!(!self.terminated, "journal already terminated");
    }

    fn scoped_table(&self, table_name: &str) -> Result<&TableSchema, EmberError> {
        self.scope
            .get(table_name)
            .ok_or_else(|| EmberError::OutOfScope {
                table: table_name.to_string(),
            })
    }

    fn check_batch_unique(
        &self,
        schema: &TableSchema,
        pk_name: &str,
        rows: &[Row],
    ) -> Result<(), EmberError> {
        let mut seen = BTreeSet::new();
        for row in rows {
            let Some(key) = row.key_of_index(schema, pk_name) else {
                continue;
            };
            if !seen.insert(key) {
                return Err(EmberError::DuplicateKeysInBatch {
                    table: schema.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// First row id holding this row's primary key, if any. The indices
    /// already reflect every prior operation of this journal, so this checks
    /// the current transactional view.
    fn find_existing_row_id_in_pk_index(
        &self,
        schema: &TableSchema,
        row: &Row,
    ) -> Result<Option<RowId>, EmberError> {
        let Some(pk) = schema.constraint().primary_key() else {
            return Ok(None);
        };
        let pk_name = pk.normalized_name();
        let Some(key) = row.key_of_index(schema, &pk_name) else {
            return Ok(None);
        };
        let indices = self.indices.read();
        let index = indices.get(&pk_name)?;
        Ok(index.get(&key).first().copied())
    }

    fn apply_table_diff(&mut self, schema: &TableSchema, diff: TableDiff) -> Result<(), EmberError> {
        self.update_table_indices(schema, &diff)?;
        self.update_cache(&diff);
        debug!(
            table = schema.name(),
            added = diff.added().len(),
            modified = diff.modified().len(),
            deleted = diff.deleted().len(),
            "applied table diff"
        );
        self.table_diffs
            .entry(schema.name().to_string())
            .or_insert_with(|| TableDiff::new(schema.name()))
            .merge(diff);
        Ok(())
    }

    /// Applies the diff to every index on the table, the row-id index
    /// included. An index entry only moves when the projected key actually
    /// changed between the old and new image.
    fn update_table_indices(
        &self,
        schema: &TableSchema,
        diff: &TableDiff,
    ) -> Result<(), EmberError> {
        let mut image_pairs: Vec<(Option<&Row>, Option<&Row>)> =
            Vec::with_capacity(diff.added().len() + diff.modified().len() + diff.deleted().len());
        for row in diff.deleted().values() {
            image_pairs.push((None, Some(row)));
        }
        for (old, new) in diff.modified().values() {
            image_pairs.push((Some(new), Some(old)));
        }
        for row in diff.added().values() {
            image_pairs.push((Some(row), None));
        }

        let mut index_names: Vec<String> =
            schema.indices().map(|index| index.normalized_name()).collect();
        index_names.push(schema.row_id_index_name());

        let mut indices = self.indices.write();
        for name in &index_names {
            let index = indices.get_mut(name)?;
            for &(now, then) in &image_pairs {
                let key_now = now.and_then(|row| row.key_of_index(schema, name));
                let key_then = then.and_then(|row| row.key_of_index(schema, name));
                if key_now == key_then {
                    continue;
                }
                if let (Some(key), Some(row)) = (key_then, then) {
                    index.remove(&key, row.id());
                }
                if let (Some(key), Some(row)) = (key_now, now) {
                    index.set(key, row.id());
                }
            }
        }
        Ok(())
    }

    fn update_cache(&self, diff: &TableDiff) {
        let mut cache = self.cache.write();
        let deleted_ids: Vec<RowId> = diff.deleted().keys().copied().collect();
        cache.remove(&deleted_ids);
        let added: Vec<Row> = diff.added().values().cloned().collect();
        cache.set(&added);
        let modified: Vec<Row> = diff
            .modified()
            .values()
            .map(|(_, new)| new.clone())
            .collect();
        cache.set(&modified);
    }
}

fn display_pk(key: Option<IndexKey>) -> String {
    key.map(|key| key.to_string()).unwrap_or_else(|| "null".into())
}

#[cfg(test)]
mod tests {
    use super::Journal;
    use crate::catalog::schema::{ColumnDef, IndexSchema, TableSchema};
    use crate::catalog::types::{ColumnType, IndexKey, Row, Value};
    use crate::storage::index_store::IndexStore;
    use crate::storage::key_range::KeyRange;
    use crate::storage::row_cache::RowCache;
    use parking_lot::RwLock;
    use std::sync::Arc;

    fn users_schema() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                ColumnDef {
                    name: "id".into(),
                    col_type: ColumnType::Integer,
                    nullable: false,
                },
                ColumnDef {
                    name: "name".into(),
                    col_type: ColumnType::Text,
                    nullable: false,
                },
                ColumnDef {
                    name: "age".into(),
                    col_type: ColumnType::Integer,
                    nullable: false,
                },
            ],
            vec!["id".into()],
            vec![IndexSchema::new("users", "by_age", vec!["age".into()], false)],
        )
    }

    fn user(row_id: u64, id: i64, name: &str, age: i64) -> Row {
        Row::new(
            row_id,
            vec![
                Value::Integer(id),
                Value::Text(name.into()),
                Value::Integer(age),
            ],
        )
    }

    fn journal() -> (Journal, Arc<RwLock<RowCache>>, Arc<RwLock<IndexStore>>) {
        let cache = Arc::new(RwLock::new(RowCache::new()));
        let mut store = IndexStore::new();
        store.register_table(&users_schema());
        let indices = Arc::new(RwLock::new(store));
        let journal = Journal::new(
            vec![users_schema()],
            Arc::clone(&cache),
            Arc::clone(&indices),
        );
        (journal, cache, indices)
    }

    #[test]
    fn insert_populates_cache_indices_and_diff() {
        let (mut journal, cache, indices) = journal();
        assert!(journal.scope().contains_key("users"));
        journal
            .insert("users", vec![user(1, 1, "a", 30), user(2, 2, "b", 40)])
            .expect("insert");

        assert_eq!(cache.read().len(), 2);
        let indices = indices.read();
        assert_eq!(
            indices.get("users.pk").expect("pk").get(&IndexKey::Integer(1)),
            vec![1]
        );
        assert_eq!(
            indices
                .get("users.by_age")
                .expect("by_age")
                .get(&IndexKey::Integer(40)),
            vec![2]
        );
        assert_eq!(
            indices.row_id_index("users").expect("row ids").get_range(None),
            vec![1, 2]
        );
        assert_eq!(journal.diff().get("users").expect("diff").added().len(), 2);
    }

    #[test]
    fn insert_then_remove_collapses_the_diff() {
        let (mut journal, _cache, indices) = journal();
        journal.insert("users", vec![user(1, 1, "a", 30)]).expect("insert");
        journal.remove("users", vec![user(1, 1, "a", 30)]).expect("remove");

        assert!(journal.diff().get("users").expect("diff").is_empty());
        let indices = indices.read();
        assert!(indices.get("users.pk").expect("pk").is_empty());
        assert!(indices.row_id_index("users").expect("row ids").is_empty());
    }

    #[test]
    fn update_moves_only_changed_index_keys() {
        let (mut journal, _cache, indices) = journal();
        journal.insert("users", vec![user(1, 1, "a", 30)]).expect("insert");
        journal.update("users", vec![user(1, 1, "a", 35)]).expect("update");

        let indices = indices.read();
        let by_age = indices.get("users.by_age").expect("by_age");
        assert!(by_age.get(&IndexKey::Integer(30)).is_empty());
        assert_eq!(by_age.get(&IndexKey::Integer(35)), vec![1]);
        // The primary key never moved.
        assert_eq!(
            indices.get("users.pk").expect("pk").get(&IndexKey::Integer(1)),
            vec![1]
        );
    }

    #[test]
    fn get_index_range_unions_and_dedupes() {
        let (mut journal, _cache, _indices) = journal();
        journal
            .insert(
                "users",
                vec![user(1, 1, "a", 30), user(2, 2, "b", 40), user(3, 3, "c", 50)],
            )
            .expect("insert");

        let by_age = IndexSchema::new("users", "by_age", vec!["age".into()], false);
        let row_ids = journal
            .get_index_range(
                &by_age,
                &[
                    KeyRange::at_most(IndexKey::Integer(40)),
                    KeyRange::at_least(IndexKey::Integer(40)),
                ],
            )
            .expect("range");
        assert_eq!(row_ids, vec![1, 2, 3]);
    }

    #[test]
    fn get_table_rows_preserves_positions() {
        let (mut journal, _cache, _indices) = journal();
        journal.insert("users", vec![user(1, 1, "a", 30)]).expect("insert");

        let rows = journal
            .get_table_rows("users", Some(&[7, 1]))
            .expect("rows");
        assert!(rows[0].is_none());
        assert_eq!(rows[1].as_ref().map(Row::id), Some(1));
    }

    #[test]
    #[should_panic(expected = "journal already terminated")]
    fn second_terminal_call_panics() {
        let (mut journal, _cache, _indices) = journal();
        journal.commit();
        journal.commit();
    }

    #[test]
    #[should_panic(expected = "journal already terminated")]
    fn mutation_after_commit_panics() {
        let (mut journal, _cache, _indices) = journal();
        journal.commit();
        let _ = journal.insert("users", vec![user(1, 1, "a", 30)]);
    }
}
