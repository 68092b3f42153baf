use {
    super::error::AuditError,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

/// Name of the append-only log table. Never a tracked entity itself.
pub const AUDIT_TABLE: &str = "audit_log";

/// Column sentinel used for whole-entity operations (deletes).
pub const ID_COLUMN: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for AuditAction {
    type Error = AuditError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(AuditError::Validation(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// One immutable log row describing a field mutation or an entity deletion.
///
/// `table` and `column` are names, not references — the row stays valid after
/// the entity it describes is gone. The id is a v7 uuid assigned when the
/// record is staged, so ordering by id is chronological.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub table: String,
    pub column: String,
    pub value: String,
    pub old_value: Option<String>,
    pub action: AuditAction,
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    fn staged(
        table: &str,
        column: &str,
        value: String,
        old_value: Option<String>,
        action: AuditAction,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            table: table.to_string(),
            column: column.to_string(),
            value,
            old_value,
            action,
            timestamp: Utc::now(),
        }
    }

    /// First assignment of a field that was never set.
    pub fn insert(table: &str, column: &str, value: String) -> Self {
        Self::staged(table, column, value, None, AuditAction::Insert)
    }

    /// Reassignment to a differing value, with the prior value captured.
    pub fn update(table: &str, column: &str, value: String, old_value: String) -> Self {
        Self::staged(table, column, value, Some(old_value), AuditAction::Update)
    }

    /// Whole-entity deletion; `rendered` is the entity's string form.
    pub fn delete(table: &str, rendered: String) -> Self {
        Self::staged(table, ID_COLUMN, rendered, None, AuditAction::Delete)
    }
}
