use {
    super::audit::{AUDIT_TABLE, AuditAction, AuditRecord},
    super::error::AuditError,
    super::field::FieldValue,
    super::schema::EntitySchema,
    crate::services::unit_of_work::UnitOfWork,
    std::fmt,
    uuid::Uuid,
};

/// Names with this prefix are internal bookkeeping and bypass the tracked
/// field path entirely.
const RESERVED_PREFIX: char = '_';

/// Decide what a field write means against the current slot state.
///
/// `None` current means the field was never assigned — the write is the
/// field's first value and logs as an insert. A differing prior value logs as
/// an update. An equal prior value logs nothing.
pub fn classify(current: Option<&FieldValue>, new: &FieldValue) -> Option<AuditAction> {
    match current {
        None => Some(AuditAction::Insert),
        Some(old) if old != new => Some(AuditAction::Update),
        Some(_) => None,
    }
}

/// A domain record whose field mutations are transparently logged.
///
/// The entity holds one tri-state slot per declared field. Every write goes
/// through [`TrackedEntity::set`], which stages at most one audit record into
/// the owning unit of work before applying the value.
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    schema: EntitySchema,
    id: Uuid,
    slots: Vec<Option<FieldValue>>,
}

impl TrackedEntity {
    /// Fresh entity with all fields unset. The identity is assigned here, in
    /// Rust, so staged operations can reference the row before it exists.
    pub fn new(schema: &EntitySchema) -> Self {
        let slots = vec![None; schema.fields().len()];
        Self {
            schema: schema.clone(),
            id: Uuid::now_v7(),
            slots,
        }
    }

    /// Rehydrate an entity from stored state. Used by the query path; slots
    /// arrive already in declaration order, NULL columns as `None`.
    pub(crate) fn hydrated(schema: &EntitySchema, id: Uuid, slots: Vec<Option<FieldValue>>) -> Self {
        debug_assert_eq!(slots.len(), schema.fields().len());
        Self {
            schema: schema.clone(),
            id,
            slots,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    fn slot_index(&self, name: &str) -> Result<usize, AuditError> {
        if name.starts_with(RESERVED_PREFIX) {
            return Err(AuditError::ReservedField(name.to_string()));
        }
        self.schema.position(name).ok_or_else(|| {
            AuditError::Validation(format!("unknown field: {}.{name}", self.table()))
        })
    }

    /// Current value of a declared field; `None` means never assigned.
    pub fn get(&self, name: &str) -> Result<Option<&FieldValue>, AuditError> {
        let idx = self.slot_index(name)?;
        Ok(self.slots[idx].as_ref())
    }

    /// Write a field, staging the audit record the write implies.
    ///
    /// First assignment stages an `insert` record, a changed value stages an
    /// `update` record with the prior value, a no-op reassignment stages
    /// nothing. The slot is set in every case. Writes against the audit log's
    /// own table are applied but never audited.
    pub fn set(
        &mut self,
        uow: &mut UnitOfWork,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), AuditError> {
        let value = value.into();
        let idx = self.slot_index(name)?;
        let def = &self.schema.fields()[idx];
        if value.field_type() != def.ty {
            return Err(AuditError::Validation(format!(
                "type mismatch for {}.{name}: expected {:?}, got {:?}",
                self.table(),
                def.ty,
                value.field_type(),
            )));
        }

        if self.table() != AUDIT_TABLE {
            match classify(self.slots[idx].as_ref(), &value) {
                Some(AuditAction::Insert) => {
                    uow.stage_audit(AuditRecord::insert(self.table(), name, value.render()));
                }
                Some(AuditAction::Update) => {
                    let old = self.slots[idx]
                        .as_ref()
                        .map(FieldValue::render)
                        .unwrap_or_default();
                    uow.stage_audit(AuditRecord::update(
                        self.table(),
                        name,
                        value.render(),
                        old,
                    ));
                }
                _ => {}
            }
        }

        uow.stage_write(self.table(), self.id, name, value.clone());
        self.slots[idx] = Some(value);
        Ok(())
    }

    /// Delete the entity, logging its full rendering first.
    ///
    /// The delete record is staged before the row removal so a replay of the
    /// log always shows the delete event; the unit of work commits both or
    /// neither.
    pub fn delete(self, uow: &mut UnitOfWork) {
        if self.table() != AUDIT_TABLE {
            uow.stage_audit(AuditRecord::delete(self.table(), self.to_string()));
        }
        uow.stage_delete(self.table(), self.id);
    }

    /// Set fields as `(name, value)` pairs in declaration order, for the
    /// insert snapshot taken when the entity is staged.
    pub(crate) fn assigned_fields(&self) -> Vec<(String, FieldValue)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.slots)
            .filter_map(|(def, slot)| slot.as_ref().map(|v| (def.name.clone(), v.clone())))
            .collect()
    }
}

impl fmt::Display for TrackedEntity {
    /// Stable rendering used as the delete record payload:
    /// `User(name=Max, age=21)`, set fields in declaration order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.entity())?;
        let mut first = true;
        for (def, slot) in self.schema.fields().iter().zip(&self.slots) {
            if let Some(value) = slot {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{}={value}", def.name)?;
                first = false;
            }
        }
        write!(f, ")")
    }
}
