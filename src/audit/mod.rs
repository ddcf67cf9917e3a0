//! Audit trail helpers.
//!
//! Admin actions are shaped into `AuditEntry` rows and handed to an
//! `AuditSink`, which performs the actual insert (the hosted database's REST
//! endpoint on WASM, memory in tests and for the in-app log view).
//!
//! Auditing never blocks the action being audited: `AuditLogger` logs sink
//! failures and reports them as `false`, nothing more.

mod entry;

#[cfg(target_arch = "wasm32")]
mod rest;

pub use entry::{changed_fields, AuditAction, AuditEntry, EntityKind};

#[cfg(target_arch = "wasm32")]
pub use rest::RestSink;

use serde_json::Value;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

/// Table the audit rows are written to.
pub const AUDIT_TABLE: &str = "audit_logs";

/// Errors from inserting an audit row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// The row could not be serialized.
    Serialization(String),
    /// The request could not be sent.
    Network(String),
    /// The backend rejected the insert.
    Rejected { status: u16, message: String },
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AuditError::Network(msg) => write!(f, "Network error: {}", msg),
            AuditError::Rejected { status, message } => {
                write!(f, "Insert rejected ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for AuditError {}

/// A generic row insert.
pub trait AuditSink {
    fn insert(&self, table: &str, row: &Value) -> impl Future<Output = Result<(), AuditError>>;
}

/// Writes every row to both sinks; fails if either does.
impl<A: AuditSink, B: AuditSink> AuditSink for (A, B) {
    async fn insert(&self, table: &str, row: &Value) -> Result<(), AuditError> {
        let first = self.0.insert(table, row).await;
        let second = self.1.insert(table, row).await;
        first.and(second)
    }
}

/// An optional sink; `None` accepts and drops every row.
impl<S: AuditSink> AuditSink for Option<S> {
    async fn insert(&self, table: &str, row: &Value) -> Result<(), AuditError> {
        match self {
            Some(sink) => sink.insert(table, row).await,
            None => Ok(()),
        }
    }
}

/// Keeps inserted rows in memory. Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemorySink {
    rows: Rc<RefCell<Vec<(String, Value)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows inserted into `table`, oldest first.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.rows
            .borrow()
            .iter()
            .filter(|(t, _)| t == table)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Number of rows inserted into any table.
    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    /// The newest `limit` audit entries, newest first.
    pub fn recent_entries(&self, limit: usize) -> Vec<AuditEntry> {
        self.rows
            .borrow()
            .iter()
            .rev()
            .filter(|(table, _)| table == AUDIT_TABLE)
            .filter_map(|(_, row)| serde_json::from_value(row.clone()).ok())
            .take(limit)
            .collect()
    }
}

impl AuditSink for MemorySink {
    async fn insert(&self, table: &str, row: &Value) -> Result<(), AuditError> {
        self.rows
            .borrow_mut()
            .push((table.to_string(), row.clone()));
        Ok(())
    }
}

/// Shapes admin actions into audit rows for one acting user.
#[derive(Clone)]
pub struct AuditLogger<S: AuditSink> {
    sink: S,
    user_id: Option<String>,
}

impl<S: AuditSink> AuditLogger<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            user_id: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Sets the acting admin for subsequent entries.
    pub fn set_user(&mut self, user_id: Option<String>) {
        self.user_id = user_id;
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Inserts `entry`. Returns whether the sink accepted it.
    pub async fn record(&self, entry: AuditEntry) -> bool {
        let row = match serde_json::to_value(&entry) {
            Ok(row) => row,
            Err(e) => {
                log::warn!("Failed to serialize audit entry: {}", e);
                return false;
            }
        };

        match self.sink.insert(AUDIT_TABLE, &row).await {
            Ok(()) => {
                log::debug!(
                    "Audited {} {} {}",
                    entry.action.as_str(),
                    entry.entity_type.as_str(),
                    entry.entity_id.as_deref().unwrap_or("-")
                );
                true
            }
            Err(e) => {
                log::warn!(
                    "Failed to write audit entry for {} {}: {}",
                    entry.action.as_str(),
                    entry.entity_type.as_str(),
                    e
                );
                false
            }
        }
    }

    /// Records the creation of an entity with its initial data.
    pub async fn log_create(&self, entity: EntityKind, entity_id: &str, data: Value) -> bool {
        let entry = self
            .entry(AuditAction::Create, entity, Some(entity_id))
            .with_details(data);
        self.record(entry).await
    }

    /// Records an update with only the fields that changed.
    ///
    /// Nothing is written when no field changed.
    pub async fn log_update(
        &self,
        entity: EntityKind,
        entity_id: &str,
        before: &Value,
        after: &Value,
    ) -> bool {
        let changes = changed_fields(before, after);
        if changes.as_object().is_some_and(|c| c.is_empty()) {
            log::debug!("No changes to audit for {} {}", entity.as_str(), entity_id);
            return false;
        }

        let entry = self
            .entry(AuditAction::Update, entity, Some(entity_id))
            .with_details(changes);
        self.record(entry).await
    }

    /// Records a deletion with the data that was removed.
    pub async fn log_delete(&self, entity: EntityKind, entity_id: &str, data: Value) -> bool {
        let entry = self
            .entry(AuditAction::Delete, entity, Some(entity_id))
            .with_details(data);
        self.record(entry).await
    }

    /// Records a successful sign-in.
    pub async fn log_login(&self, email: &str) -> bool {
        let entry = self
            .entry(AuditAction::Login, EntityKind::User, self.user_id.as_deref())
            .with_details(serde_json::json!({ "email": email }));
        self.record(entry).await
    }

    /// Records a sign-out.
    pub async fn log_logout(&self) -> bool {
        let entry = self.entry(AuditAction::Logout, EntityKind::User, self.user_id.as_deref());
        self.record(entry).await
    }

    fn entry(&self, action: AuditAction, entity: EntityKind, entity_id: Option<&str>) -> AuditEntry {
        AuditEntry::new(action, entity, entity_id, self.user_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use serde_json::json;

    struct RejectingSink;

    impl AuditSink for RejectingSink {
        async fn insert(&self, _table: &str, _row: &Value) -> Result<(), AuditError> {
            Err(AuditError::Rejected {
                status: 401,
                message: "JWT expired".to_string(),
            })
        }
    }

    fn logger() -> AuditLogger<MemorySink> {
        let mut logger = AuditLogger::new(MemorySink::new());
        logger.set_user(Some("admin-1".to_string()));
        logger
    }

    #[test]
    fn test_create_row_shape() {
        let logger = logger();
        let book = json!({ "title": "Dune", "isbn": "9780441013593" });

        assert!(block_on(logger.log_create(EntityKind::Book, "b-7", book.clone())));

        let rows = logger.sink().rows(AUDIT_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["action"], "create");
        assert_eq!(rows[0]["entity_type"], "book");
        assert_eq!(rows[0]["entity_id"], "b-7");
        assert_eq!(rows[0]["user_id"], "admin-1");
        assert_eq!(rows[0]["details"], book);
        assert!(rows[0]["created_at"].as_str().is_some());
    }

    #[test]
    fn test_update_records_only_changes() {
        let logger = logger();
        let before = json!({ "status": "active", "due_date": "2026-10-01", "reader_id": "r-1" });
        let after = json!({ "status": "returned", "due_date": "2026-10-01", "reader_id": "r-1" });

        assert!(block_on(logger.log_update(EntityKind::Loan, "l-3", &before, &after)));
        assert!(!block_on(logger.log_update(EntityKind::Loan, "l-3", &after, &after)));

        let rows = logger.sink().rows(AUDIT_TABLE);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0]["details"],
            json!({ "status": { "old": "active", "new": "returned" } })
        );
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let logger = AuditLogger::new(RejectingSink);
        assert!(!block_on(logger.log_delete(EntityKind::Copy, "c-1", json!({}))));
    }

    #[test]
    fn test_pair_sink_writes_both() {
        let (a, b) = (MemorySink::new(), MemorySink::new());
        let logger = AuditLogger::new((a.clone(), b.clone()));

        assert!(block_on(logger.log_logout()));
        assert_eq!(a.rows(AUDIT_TABLE).len(), 1);
        assert_eq!(b.rows(AUDIT_TABLE).len(), 1);

        let logger = AuditLogger::new((a.clone(), RejectingSink));
        assert!(!block_on(logger.log_logout()));
        assert_eq!(a.rows(AUDIT_TABLE).len(), 2);
    }

    #[test]
    fn test_missing_sink_accepts_rows() {
        let memory = MemorySink::new();
        let logger = AuditLogger::new((memory.clone(), None::<RejectingSink>));

        assert!(block_on(logger.log_login("librarian@example.org")));
        assert_eq!(memory.rows(AUDIT_TABLE).len(), 1);
    }

    #[test]
    fn test_len_tracks_inserts() {
        let memory = MemorySink::new();
        assert!(memory.is_empty());

        block_on(memory.insert("other_table", &json!({}))).unwrap();
        let logger = AuditLogger::new(memory.clone());
        block_on(logger.log_logout());

        assert_eq!(memory.len(), 2);
        assert_eq!(memory.recent_entries(10).len(), 1);
    }

    #[test]
    fn test_recent_entries_newest_first() {
        let logger = logger();
        block_on(logger.log_login("librarian@example.org"));
        block_on(logger.log_create(EntityKind::Reader, "r-9", json!({ "name": "Ada" })));
        block_on(logger.log_logout());

        let recent = logger.sink().recent_entries(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, AuditAction::Logout);
        assert_eq!(recent[1].action, AuditAction::Create);
        assert_eq!(recent[1].entity_id.as_deref(), Some("r-9"));
    }
}
