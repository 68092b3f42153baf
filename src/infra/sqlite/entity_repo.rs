use {
    crate::domain::entity::TrackedEntity,
    crate::domain::error::AuditError,
    crate::domain::field::{FieldType, FieldValue},
    crate::domain::schema::EntitySchema,
    sqlx::{Row, SqlitePool, query::Query, sqlite::SqliteArguments},
    uuid::Uuid,
};

fn bind_value<'q>(
    query: Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    value: &'q FieldValue,
) -> Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match value {
        FieldValue::Integer(n) => query.bind(*n),
        FieldValue::Text(s) => query.bind(s.as_str()),
    }
}

pub async fn insert_entity(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &str,
    id: Uuid,
    fields: &[(String, FieldValue)],
) -> Result<(), AuditError> {
    let mut columns = vec!["id".to_string()];
    columns.extend(fields.iter().map(|(name, _)| format!("\"{name}\"")));
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO \"{table}\" ({}) VALUES ({placeholders})",
        columns.join(", ")
    );

    let mut query = sqlx::query(&sql).bind(id);
    for (_, value) in fields {
        query = bind_value(query, value);
    }
    query.execute(&mut **tx).await?;

    Ok(())
}

pub async fn update_field(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &str,
    id: Uuid,
    column: &str,
    value: &FieldValue,
) -> Result<(), AuditError> {
    let sql = format!("UPDATE \"{table}\" SET \"{column}\" = ? WHERE id = ?");
    bind_value(sqlx::query(&sql), value)
        .bind(id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

pub async fn delete_entity(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &str,
    id: Uuid,
) -> Result<(), AuditError> {
    let sql = format!("DELETE FROM \"{table}\" WHERE id = ?");
    sqlx::query(&sql).bind(id).execute(&mut **tx).await?;

    Ok(())
}

/// Committed rows of one schema, rehydrated with NULL columns as unset
/// slots. Filters are equality matches on declared fields.
pub async fn query_entities(
    pool: &SqlitePool,
    schema: &EntitySchema,
    filter: &[(&str, FieldValue)],
) -> Result<Vec<TrackedEntity>, AuditError> {
    for (name, _) in filter {
        if schema.position(name).is_none() {
            return Err(AuditError::Validation(format!(
                "unknown filter field: {}.{name}",
                schema.table()
            )));
        }
    }

    let mut columns = vec!["id".to_string()];
    columns.extend(
        schema
            .fields()
            .iter()
            .map(|f| format!("\"{}\"", f.name)),
    );
    let mut sql = format!(
        "SELECT {} FROM \"{}\"",
        columns.join(", "),
        schema.table()
    );
    if !filter.is_empty() {
        let clauses = filter
            .iter()
            .map(|(name, _)| format!("\"{name}\" = ?"))
            .collect::<Vec<_>>()
            .join(" AND ");
        sql.push_str(" WHERE ");
        sql.push_str(&clauses);
    }
    sql.push_str(" ORDER BY id");

    let mut query = sqlx::query(&sql);
    for (_, value) in filter {
        query = bind_value(query, value);
    }
    let rows = query.fetch_all(pool).await?;

    rows.into_iter()
        .map(|row| {
            let id: Uuid = row.try_get("id")?;
            let mut slots = Vec::with_capacity(schema.fields().len());
            for def in schema.fields() {
                let slot = match def.ty {
                    FieldType::Integer => row
                        .try_get::<Option<i64>, _>(def.name.as_str())?
                        .map(FieldValue::Integer),
                    FieldType::Text => row
                        .try_get::<Option<String>, _>(def.name.as_str())?
                        .map(FieldValue::Text),
                };
                slots.push(slot);
            }
            Ok(TrackedEntity::hydrated(schema, id, slots))
        })
        .collect()
}
