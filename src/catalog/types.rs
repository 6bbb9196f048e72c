use crate::catalog::schema::TableSchema;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Stable numeric identity of a row, independent of any primary key.
pub type RowId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Text(CompactString),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(i64),
    Null,
}

impl Value {
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Integer(_) => 2,
            Value::Timestamp(_) => 3,
            Value::Float(_) => 4,
            Value::Text(_) => 5,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank_cmp = self.kind_rank().cmp(&other.kind_rank());
        if rank_cmp != Ordering::Equal {
            return rank_cmp;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Key projected out of a row for one index. The ordering is total: scalars
/// order by variant tag first, composites lexicographically by part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexKey {
    Integer(i64),
    Text(CompactString),
    Composite(Vec<IndexKey>),
}

impl IndexKey {
    /// Projects a single column value into an index key. `Null` and `Float`
    /// columns are not indexable and yield `None`, which keeps the owning row
    /// out of that index.
    pub fn from_value(value: &Value) -> Option<IndexKey> {
        match value {
            Value::Integer(v) => Some(IndexKey::Integer(*v)),
            Value::Timestamp(v) => Some(IndexKey::Integer(*v)),
            Value::Boolean(v) => Some(IndexKey::Integer(i64::from(*v))),
            Value::Text(v) => Some(IndexKey::Text(v.clone())),
            Value::Float(_) | Value::Null => None,
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Integer(v) => write!(f, "{v}"),
            IndexKey::Text(v) => write!(f, "{v}"),
            IndexKey::Composite(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Row {
    id: RowId,
    values: Vec<Value>,
}

impl Row {
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    /// Reassigns the row id. Only the insert-or-replace dispatch does this,
    /// to fold an incoming row onto the existing row with the same primary key.
    pub fn set_row_id(&mut self, id: RowId) {
        self.id = id;
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Projects this row's key for the named index. The per-table row-id
    /// index maps to the row id itself; any other name resolves through the
    /// schema. `None` means the row has no entry in that index.
    pub fn key_of_index(&self, schema: &TableSchema, index_name: &str) -> Option<IndexKey> {
        if index_name == schema.row_id_index_name() {
            return Some(IndexKey::Integer(self.id as i64));
        }
        let index = schema.index_by_name(index_name)?;
        let mut parts = Vec::with_capacity(index.columns.len());
        for column in &index.columns {
            let position = schema.column_position(column)?;
            parts.push(IndexKey::from_value(self.values.get(position)?)?);
        }
        if parts.len() == 1 {
            parts.pop()
        } else {
            Some(IndexKey::Composite(parts))
        }
    }
}
