use {
    crate::domain::error::AuditError,
    crate::domain::schema::EntitySchema,
    crate::services::unit_of_work::UnitOfWork,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    std::{env, str::FromStr},
};

const AUDIT_LOG_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS audit_log (
    id BLOB PRIMARY KEY,
    "table" TEXT NOT NULL,
    "column" TEXT NOT NULL,
    value TEXT NOT NULL,
    old_value TEXT,
    action TEXT NOT NULL CHECK (action IN ('insert', 'update', 'delete')),
    "timestamp" TEXT NOT NULL
)
"#;

fn create_table_sql(schema: &EntitySchema) -> String {
    let mut columns = vec!["id BLOB PRIMARY KEY".to_string()];
    for field in schema.fields() {
        let mut column = format!("\"{}\" {}", field.name, field.ty.sql_type());
        if field.unique {
            column.push_str(" UNIQUE");
        }
        columns.push(column);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
        schema.table(),
        columns.join(", ")
    )
}

/// The transactional persistence backend: pool ownership, schema creation
/// and session handout. Everything auditing-specific lives above it.
pub struct EntityStore {
    pool: SqlitePool,
}

impl EntityStore {
    pub async fn connect(database_url: &str) -> Result<Self, AuditError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!(url = database_url, "entity store connected");
        Ok(Self { pool })
    }

    /// Connect using `DATABASE_URL`, loading `.env` if present.
    pub async fn from_env() -> Result<Self, AuditError> {
        dotenvy::dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AuditError::Validation("DATABASE_URL must be set".to_string()))?;
        Self::connect(&database_url).await
    }

    /// Private in-memory store. Single connection — each pooled connection
    /// would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, AuditError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create the audit log table plus one table per tracked schema.
    /// Idempotent; meant to run once at startup.
    pub async fn create_schema(&self, schemas: &[EntitySchema]) -> Result<(), AuditError> {
        sqlx::query(AUDIT_LOG_DDL).execute(&self.pool).await?;
        for schema in schemas {
            let sql = create_table_sql(schema);
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Open a fresh unit of work against this store.
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(self.pool.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("entity store closed");
    }
}
