use {
    crate::domain::audit::{AuditAction, AuditRecord},
    crate::domain::error::AuditError,
    sqlx::{Row, SqlitePool},
};

pub async fn insert_audit_record(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    record: &AuditRecord,
) -> Result<(), AuditError> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, "table", "column", value, old_value, action, "timestamp")
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id)
    .bind(&record.table)
    .bind(&record.column)
    .bind(&record.value)
    .bind(&record.old_value)
    .bind(record.action.as_str())
    .bind(record.timestamp)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Every log row, oldest first. The v7 id is the chronological sort key.
/// The log is append-only: this module never updates or deletes rows.
pub async fn list_audit_records(pool: &SqlitePool) -> Result<Vec<AuditRecord>, AuditError> {
    let rows = sqlx::query(
        r#"
        SELECT id, "table", "column", value, old_value, action, "timestamp"
        FROM audit_log
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let action: String = row.try_get("action")?;
            Ok(AuditRecord {
                id: row.try_get("id")?,
                table: row.try_get("table")?,
                column: row.try_get("column")?,
                value: row.try_get("value")?,
                old_value: row.try_get("old_value")?,
                action: AuditAction::try_from(action.as_str())?,
                timestamp: row.try_get("timestamp")?,
            })
        })
        .collect()
}
