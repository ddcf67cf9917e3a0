//! Audit row types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What was done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Logout,
    /// A copy was lent to a reader.
    Loan,
    /// A lent copy came back.
    Return,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Loan => "loan",
            Self::Return => "return",
        }
    }
}

/// What it was done to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Library,
    Book,
    /// A physical copy of a book held by a library.
    Copy,
    Loan,
    Reader,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Book => "book",
            Self::Copy => "copy",
            Self::Loan => "loan",
            Self::Reader => "reader",
            Self::User => "user",
        }
    }
}

/// One row of the `audit_logs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub entity_type: EntityKind,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub details: Value,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        action: AuditAction,
        entity_type: EntityKind,
        entity_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Self {
        Self {
            action,
            entity_type,
            entity_id: entity_id.map(str::to_string),
            user_id: user_id.map(str::to_string),
            details: Value::Object(Map::new()),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// Top-level fields that differ between two records, as
/// `{field: {"old": .., "new": ..}}`. Removed fields have `"new": null`.
///
/// Non-object values are compared whole and reported under `"value"`.
pub fn changed_fields(before: &Value, after: &Value) -> Value {
    let mut changes = Map::new();

    match (before.as_object(), after.as_object()) {
        (Some(old), Some(new)) => {
            for (field, new_value) in new {
                let old_value = old.get(field).unwrap_or(&Value::Null);
                if old_value != new_value {
                    changes.insert(field.clone(), diff(old_value, new_value));
                }
            }
            for (field, old_value) in old {
                if !new.contains_key(field) {
                    changes.insert(field.clone(), diff(old_value, &Value::Null));
                }
            }
        }
        _ => {
            if before != after {
                changes.insert("value".to_string(), diff(before, after));
            }
        }
    }

    Value::Object(changes)
}

fn diff(old: &Value, new: &Value) -> Value {
    serde_json::json!({ "old": old, "new": new })
}
