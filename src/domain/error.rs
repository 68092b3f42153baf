use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("reserved field: {0}")]
    ReservedField(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}
