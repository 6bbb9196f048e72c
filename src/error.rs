use thiserror::Error;

/// Coarse taxonomy used by callers that only care whether an operation was
/// rejected for scope or constraint reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Scope,
    Constraint,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmberErrorCode {
    OutOfScope,
    DuplicateKeysInBatch,
    DuplicatePrimaryKey,
    PrimaryKeyUpdateCollision,
    AmbiguousPrimaryKeyUpdate,
    TableAlreadyExists,
    TableNotFound,
    IndexNotFound,
    RowNotFound,
    Validation,
}

impl EmberErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            EmberErrorCode::OutOfScope => "out_of_scope",
            EmberErrorCode::DuplicateKeysInBatch => "duplicate_keys_in_batch",
            EmberErrorCode::DuplicatePrimaryKey => "duplicate_primary_key",
            EmberErrorCode::PrimaryKeyUpdateCollision => "primary_key_update_collision",
            EmberErrorCode::AmbiguousPrimaryKeyUpdate => "ambiguous_primary_key_update",
            EmberErrorCode::TableAlreadyExists => "table_already_exists",
            EmberErrorCode::TableNotFound => "table_not_found",
            EmberErrorCode::IndexNotFound => "index_not_found",
            EmberErrorCode::RowNotFound => "row_not_found",
            EmberErrorCode::Validation => "validation",
        }
    }
}

#[derive(Debug, Error)]
pub enum EmberError {
    #[error("table '{table}' is not in the journal scope")]
    OutOfScope { table: String },
    #[error("duplicate primary keys in insert batch for table '{table}'")]
    DuplicateKeysInBatch { table: String },
    #[error("duplicate primary key in table '{table}': {key}")]
    DuplicatePrimaryKey { table: String, key: String },
    #[error("primary key update on table '{table}' collides with existing key: {key}")]
    PrimaryKeyUpdateCollision { table: String, key: String },
    #[error("more than one row changes its primary key in a single update on table '{table}'")]
    AmbiguousPrimaryKeyUpdate { table: String },
    #[error("table '{table}' already exists")]
    TableAlreadyExists { table: String },
    #[error("table '{table}' does not exist")]
    TableNotFound { table: String },
    #[error("index '{index}' does not exist")]
    IndexNotFound { index: String },
    #[error("row {row_id} is not present in the cache for table '{table}'")]
    RowNotFound { table: String, row_id: u64 },
    #[error("validation error: {0}")]
    Validation(String),
}

impl EmberError {
    pub fn code(&self) -> EmberErrorCode {
        match self {
            EmberError::OutOfScope { .. } => EmberErrorCode::OutOfScope,
            EmberError::DuplicateKeysInBatch { .. } => EmberErrorCode::DuplicateKeysInBatch,
            EmberError::DuplicatePrimaryKey { .. } => EmberErrorCode::DuplicatePrimaryKey,
            EmberError::PrimaryKeyUpdateCollision { .. } => {
                EmberErrorCode::PrimaryKeyUpdateCollision
            }
            EmberError::AmbiguousPrimaryKeyUpdate { .. } => {
                EmberErrorCode::AmbiguousPrimaryKeyUpdate
            }
            EmberError::TableAlreadyExists { .. } => EmberErrorCode::TableAlreadyExists,
            EmberError::TableNotFound { .. } => EmberErrorCode::TableNotFound,
            EmberError::IndexNotFound { .. } => EmberErrorCode::IndexNotFound,
            EmberError::RowNotFound { .. } => EmberErrorCode::RowNotFound,
            EmberError::Validation(_) => EmberErrorCode::Validation,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EmberError::OutOfScope { .. } => ErrorKind::Scope,
            EmberError::DuplicateKeysInBatch { .. }
            | EmberError::DuplicatePrimaryKey { .. }
            | EmberError::PrimaryKeyUpdateCollision { .. }
            | EmberError::AmbiguousPrimaryKeyUpdate { .. } => ErrorKind::Constraint,
            EmberError::TableAlreadyExists { .. }
            | EmberError::TableNotFound { .. }
            | EmberError::IndexNotFound { .. }
            | EmberError::RowNotFound { .. }
            | EmberError::Validation(_) => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EmberError, EmberErrorCode, ErrorKind};

    #[test]
    fn error_code_strings_are_stable() {
        assert_eq!(EmberErrorCode::OutOfScope.as_str(), "out_of_scope");
        assert_eq!(
            EmberErrorCode::DuplicatePrimaryKey.as_str(),
            "duplicate_primary_key"
        );
        assert_eq!(EmberErrorCode::TableNotFound.as_str(), "table_not_found");
    }

    #[test]
    fn error_kind_matches_variant_mapping() {
        let err = EmberError::OutOfScope {
            table: "users".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Scope);
        assert_eq!(err.code_str(), "out_of_scope");

        let err = EmberError::DuplicatePrimaryKey {
            table: "users".into(),
            key: "1".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Constraint);
        assert_eq!(err.code(), EmberErrorCode::DuplicatePrimaryKey);
    }

    #[test]
    fn constraint_messages_quote_key_and_table() {
        let err = EmberError::DuplicatePrimaryKey {
            table: "users".into(),
            key: "7".into(),
        };
        let message = err.to_string();
        assert!(message.contains("users"));
        assert!(message.contains('7'));
    }
}
