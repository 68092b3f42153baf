use {
    super::audit::AUDIT_TABLE,
    super::error::AuditError,
    super::field::FieldType,
    serde::{Deserialize, Serialize},
};

/// One declared column of a tracked entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub unique: bool,
}

/// Runtime description of a tracked entity type: its display name, table name
/// and declared fields in declaration order. Declaration order is also the
/// rendering order of the entity's string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    entity: String,
    table: String,
    fields: Vec<FieldDef>,
}

/// Table and column names are interpolated into SQL, so they are restricted
/// to `[A-Za-z][A-Za-z0-9_]*` at construction time.
fn valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl EntitySchema {
    pub fn new(entity: impl Into<String>, table: impl Into<String>) -> Result<Self, AuditError> {
        let entity = entity.into();
        let table = table.into();
        if !valid_identifier(&entity) || !valid_identifier(&table) {
            return Err(AuditError::Validation(format!(
                "invalid schema identifier: {entity}/{table}"
            )));
        }
        if table == AUDIT_TABLE {
            return Err(AuditError::Validation(format!(
                "{AUDIT_TABLE} cannot be declared as a tracked entity"
            )));
        }
        Ok(Self {
            entity,
            table,
            fields: Vec::new(),
        })
    }

    fn push_field(mut self, name: &str, ty: FieldType, unique: bool) -> Result<Self, AuditError> {
        if !valid_identifier(name) || name == "id" {
            return Err(AuditError::Validation(format!(
                "invalid field name: {}.{name}",
                self.table
            )));
        }
        if self.fields.iter().any(|f| f.name == name) {
            return Err(AuditError::Validation(format!(
                "duplicate field: {}.{name}",
                self.table
            )));
        }
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty,
            unique,
        });
        Ok(self)
    }

    pub fn field(self, name: &str, ty: FieldType) -> Result<Self, AuditError> {
        self.push_field(name, ty, false)
    }

    /// Declares a field backed by a UNIQUE column.
    pub fn unique_field(self, name: &str, ty: FieldType) -> Result<Self, AuditError> {
        self.push_field(name, ty, true)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declaration-order position of a field, if declared.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
