use {
    crate::domain::audit::AuditRecord,
    crate::domain::entity::TrackedEntity,
    crate::domain::error::AuditError,
    crate::domain::field::FieldValue,
    crate::domain::schema::EntitySchema,
    crate::infra::sqlite::{audit_repo, entity_repo},
    sqlx::SqlitePool,
    std::collections::HashSet,
    uuid::Uuid,
};

/// One staged operation. Replayed in staging order inside a single
/// transaction at commit, so a delete record always lands before its row
/// removal and audit rows interleave chronologically with the mutations that
/// produced them.
enum Pending {
    Insert {
        table: String,
        id: Uuid,
        fields: Vec<(String, FieldValue)>,
    },
    Write {
        table: String,
        id: Uuid,
        column: String,
        value: FieldValue,
    },
    Delete {
        table: String,
        id: Uuid,
    },
    Audit(AuditRecord),
}

/// Transactional staging area for entity mutations and their audit records.
///
/// One unit of work per logical session; it is not synchronized and must stay
/// confined to one flow of control. Mutations and the audit records they
/// imply are staged together and commit atomically — a failed commit leaves
/// neither behind. Independent units of work may share the pool; isolation
/// between them is the database's.
pub struct UnitOfWork {
    pool: SqlitePool,
    pending: Vec<Pending>,
    staged: HashSet<(String, Uuid)>,
}

impl UnitOfWork {
    pub(crate) fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            pending: Vec::new(),
            staged: HashSet::new(),
        }
    }

    /// Stage a freshly built entity for insertion. Idempotent: staging the
    /// same entity twice before commit inserts it once.
    pub fn add(&mut self, entity: &TrackedEntity) {
        let key = (entity.table().to_string(), entity.id());
        if !self.staged.insert(key.clone()) {
            return;
        }
        // Field writes staged while the entity was being built are covered by
        // the insert snapshot; drop them so commit doesn't touch a row that
        // doesn't exist yet.
        self.pending.retain(|op| {
            !matches!(op, Pending::Write { table, id, .. } if *table == key.0 && *id == key.1)
        });
        self.pending.push(Pending::Insert {
            table: key.0,
            id: key.1,
            fields: entity.assigned_fields(),
        });
    }

    pub(crate) fn stage_audit(&mut self, record: AuditRecord) {
        self.pending.push(Pending::Audit(record));
    }

    pub(crate) fn stage_write(&mut self, table: &str, id: Uuid, column: &str, value: FieldValue) {
        self.pending.push(Pending::Write {
            table: table.to_string(),
            id,
            column: column.to_string(),
            value,
        });
    }

    pub(crate) fn stage_delete(&mut self, table: &str, id: Uuid) {
        self.pending.push(Pending::Delete {
            table: table.to_string(),
            id,
        });
    }

    /// Flush every staged operation in one transaction.
    ///
    /// On failure the transaction is dropped — rolled back — and the staged
    /// set is cleared; no partial log entries survive. Errors surface to the
    /// caller unretried.
    pub async fn commit(&mut self) -> Result<(), AuditError> {
        let ops = std::mem::take(&mut self.pending);
        self.staged.clear();
        if ops.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for op in &ops {
            match op {
                Pending::Insert { table, id, fields } => {
                    entity_repo::insert_entity(&mut tx, table, *id, fields).await?;
                }
                Pending::Write {
                    table,
                    id,
                    column,
                    value,
                } => {
                    entity_repo::update_field(&mut tx, table, *id, column, value).await?;
                }
                Pending::Delete { table, id } => {
                    entity_repo::delete_entity(&mut tx, table, *id).await?;
                }
                Pending::Audit(record) => {
                    audit_repo::insert_audit_record(&mut tx, record).await?;
                }
            }
        }
        tx.commit().await?;

        tracing::debug!(ops = ops.len(), "unit of work committed");
        Ok(())
    }

    /// Discard everything staged without persisting. Always safe.
    pub fn rollback(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(ops = self.pending.len(), "unit of work rolled back");
        }
        self.pending.clear();
        self.staged.clear();
    }

    /// End the session, discarding anything still staged.
    pub fn close(mut self) {
        self.rollback();
    }

    /// Committed entities of one schema, equality-filtered on declared
    /// fields. Reads through the pool, so staged-but-uncommitted changes are
    /// not visible.
    pub async fn query(
        &self,
        schema: &EntitySchema,
        filter: &[(&str, FieldValue)],
    ) -> Result<Vec<TrackedEntity>, AuditError> {
        entity_repo::query_entities(&self.pool, schema, filter).await
    }

    /// Committed log rows in chronological order.
    pub async fn audit_log(&self) -> Result<Vec<AuditRecord>, AuditError> {
        audit_repo::list_audit_records(&self.pool).await
    }
}
