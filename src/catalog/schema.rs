use crate::catalog::types::ColumnType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub col_type: ColumnType,
    pub nullable: bool,
}

/// Schema of one index. The normalized name (`table.index`) is the key into
/// the index store and the argument to `Row::key_of_index`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexSchema {
    pub table_name: String,
    pub index_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSchema {
    pub fn new(
        table_name: impl Into<String>,
        index_name: impl Into<String>,
        columns: Vec<String>,
        unique: bool,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: index_name.into(),
            columns,
            unique,
        }
    }

    pub fn normalized_name(&self) -> String {
        format!("{}.{}", self.table_name, self.index_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TableConstraint {
    primary_key: Option<IndexSchema>,
}

impl TableConstraint {
    pub fn primary_key(&self) -> Option<&IndexSchema> {
        self.primary_key.as_ref()
    }
}

/// Name of the always-present index enumerating live row ids of a table.
pub fn row_id_index_name(table_name: &str) -> String {
    format!("{table_name}.#")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    table_name: String,
    columns: Vec<ColumnDef>,
    constraint: TableConstraint,
    indices: Vec<IndexSchema>,
}

impl TableSchema {
    /// Builds a table schema. A non-empty `primary_key` column list
    /// materializes as a unique index named `pk` on this table.
    pub fn new(
        table_name: impl Into<String>,
        columns: Vec<ColumnDef>,
        primary_key: Vec<String>,
        indices: Vec<IndexSchema>,
    ) -> Self {
        let table_name = table_name.into();
        let constraint = TableConstraint {
            primary_key: (!primary_key.is_empty())
                .then(|| IndexSchema::new(table_name.clone(), "pk", primary_key, true)),
        };
        Self {
            table_name,
            columns,
            constraint,
            indices,
        }
    }

    pub fn name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn constraint(&self) -> &TableConstraint {
        &self.constraint
    }

    /// All declared indices on this table, primary key first. The implicit
    /// row-id index is not part of the schema; see [`row_id_index_name`].
    pub fn indices(&self) -> impl Iterator<Item = &IndexSchema> {
        self.constraint.primary_key.iter().chain(self.indices.iter())
    }

    pub fn index_by_name(&self, normalized_name: &str) -> Option<&IndexSchema> {
        self.indices()
            .find(|index| index.normalized_name() == normalized_name)
    }

    pub fn row_id_index_name(&self) -> String {
        row_id_index_name(&self.table_name)
    }

    pub fn column_position(&self, column_name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnDef, IndexSchema, TableSchema, row_id_index_name};
    use crate::catalog::types::ColumnType;

    fn schema() -> TableSchema {
        TableSchema::new(
            "jobs",
            vec![
                ColumnDef {
                    name: "id".into(),
                    col_type: ColumnType::Integer,
                    nullable: false,
                },
                ColumnDef {
                    name: "state".into(),
                    col_type: ColumnType::Text,
                    nullable: false,
                },
            ],
            vec!["id".into()],
            vec![IndexSchema::new(
                "jobs",
                "by_state",
                vec!["state".into()],
                false,
            )],
        )
    }

    #[test]
    fn primary_key_materializes_as_unique_index() {
        let schema = schema();
        let pk = schema.constraint().primary_key().expect("pk");
        assert_eq!(pk.normalized_name(), "jobs.pk");
        assert!(pk.unique);
        assert_eq!(pk.columns, vec!["id".to_string()]);
    }

    #[test]
    fn indices_iterate_pk_first() {
        let schema = schema();
        let names: Vec<String> = schema.indices().map(|i| i.normalized_name()).collect();
        assert_eq!(names, vec!["jobs.pk".to_string(), "jobs.by_state".to_string()]);
    }

    #[test]
    fn table_without_primary_key_has_no_constraint() {
        let schema = TableSchema::new("log", Vec::new(), Vec::new(), Vec::new());
        assert!(schema.constraint().primary_key().is_none());
        assert_eq!(schema.indices().count(), 0);
    }

    #[test]
    fn row_id_index_name_is_table_scoped() {
        assert_eq!(row_id_index_name("jobs"), "jobs.#");
        assert_eq!(schema().row_id_index_name(), "jobs.#");
    }
}
