use thiserror::Error;

/// Failure taxonomy of the tabular-query layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Malformed filter descriptor or identifier, caught before anything is
    /// dispatched to the backend.
    #[error("query construction failed: {0}")]
    QueryConstruction(String),

    /// Backend-reported failure (network, permission, constraint). The
    /// original message is preserved verbatim.
    #[error("remote query failed: {message}")]
    Remote { message: String },

    /// A required row is missing; the remaining steps of the operation are
    /// aborted.
    #[error("no matching row in \"{resource}\"")]
    NotFound { resource: String },
}

impl StorageError {
    pub fn remote(message: impl Into<String>) -> Self {
        StorageError::Remote { message: message.into() }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        StorageError::NotFound { resource: resource.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Remote { message: err.to_string() }
    }
}
