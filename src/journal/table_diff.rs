use crate::catalog::types::{Row, RowId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated row-level effects for one table: rows added, rows modified
/// (old and new image), rows deleted (last-known image). A row id lives in at
/// most one of the three collections at any moment; the mutators below fold
/// a new effect onto whatever is already recorded for that id, so a sequence
/// of operations collapses to its net effect. `BTreeMap` keeps iteration
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDiff {
    table_name: String,
    added: BTreeMap<RowId, Row>,
    modified: BTreeMap<RowId, (Row, Row)>,
    deleted: BTreeMap<RowId, Row>,
}

impl TableDiff {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            added: BTreeMap::new(),
            modified: BTreeMap::new(),
            deleted: BTreeMap::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn added(&self) -> &BTreeMap<RowId, Row> {
        &self.added
    }

    pub fn modified(&self) -> &BTreeMap<RowId, (Row, Row)> {
        &self.modified
    }

    pub fn deleted(&self) -> &BTreeMap<RowId, Row> {
        &self.deleted
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Records an insertion. A pending deletion of the same id folds into a
    /// modification, or cancels out entirely when the re-added image is
    /// identical to the deleted one.
    pub fn add(&mut self, row: Row) {
        let id = row.id();
        if let Some(previous) = self.deleted.remove(&id) {
            if previous != row {
                self.modified.insert(id, (previous, row));
            }
        } else {
            self.added.insert(id, row);
        }
    }

    /// Records a modification. Both images must carry the same row id. A
    /// pending addition stays an addition with the newer image; chained
    /// modifications keep the original old image.
    pub fn modify(&mut self, old: Row, new: Row) {
        debug_assert_eq!(old.id(), new.id(), "modify must keep the row id stable");
        let id = new.id();
        if self.added.contains_key(&id) {
            self.added.insert(id, new);
        } else if let Some((original, _)) = self.modified.remove(&id) {
            self.modified.insert(id, (original, new));
        } else {
            self.modified.insert(id, (old, new));
        }
    }

    /// Records a deletion of the given image. A pending addition of the same
    /// id is dropped without a trace; a pending modification deletes the
    /// original image.
    pub fn delete(&mut self, row: Row) {
        let id = row.id();
        if self.added.remove(&id).is_some() {
            return;
        }
        if let Some((original, _)) = self.modified.remove(&id) {
            self.deleted.insert(id, original);
            return;
        }
        self.deleted.insert(id, row);
    }

    /// Folds `other` into `self`; the result is the diff equivalent to
    /// applying `self` first and `other` second.
    pub fn merge(&mut self, other: TableDiff) {
        for row in other.added.into_values() {
            self.add(row);
        }
        for (old, new) in other.modified.into_values() {
            self.modify(old, new);
        }
        for row in other.deleted.into_values() {
            self.delete(row);
        }
    }

    /// The diff that, applied after this one, restores the prior state:
    /// additions and deletions swap, and each modification swaps its images.
    pub fn reverse(&self) -> TableDiff {
        TableDiff {
            table_name: self.table_name.clone(),
            added: self.deleted.clone(),
            modified: self
                .modified
                .iter()
                .map(|(id, (old, new))| (*id, (new.clone(), old.clone())))
                .collect(),
            deleted: self.added.clone(),
        }
    }
}
